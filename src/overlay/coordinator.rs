//! The overlay state machine.
//!
//! [`OverlayCoordinator::apply`] consumes one [`OverlayEvent`] at a time and
//! decides which of the foreground raster and the detection outlines are
//! attached to the surface. The coordinator exclusively owns every handle it
//! attaches and releases each exactly once: on toggle-off, image close,
//! reload, or when the coordinator is dropped.

use crate::model::AnnotationList;
use crate::overlay::state::{LoadedImage, OverlayEvent, OverlayVisibilityState};
use crate::overlay::surface::{PolygonHandle, RenderSurface};
use crate::projection::PolygonProjector;
use crate::registration::{
    ImageDimensions, RegistrationPolicy, RegistrationState, ScaleFactor,
};

/// A registered derived raster kept ready for attachment.
#[derive(Debug)]
struct CachedRaster<I> {
    image: I,
    scale: ScaleFactor,
}

/// Per-image state, present only while an image is open.
#[derive(Debug)]
struct LoadedSession<I> {
    base: ImageDimensions,
    registration: Option<RegistrationState>,
    raster: Option<CachedRaster<I>>,
    annotations_available: bool,
}

/// Drives overlay attachment on a [`RenderSurface`].
pub struct OverlayCoordinator<S: RenderSurface> {
    surface: S,
    projector: PolygonProjector,
    policy: RegistrationPolicy,
    visibility: OverlayVisibilityState,
    session: Option<LoadedSession<S::Image>>,
    raster_attached: bool,
    polygons: Vec<PolygonHandle>,
}

impl<S: RenderSurface> OverlayCoordinator<S> {
    /// Create a coordinator in the empty state with default visibility.
    pub fn new(surface: S, projector: PolygonProjector, policy: RegistrationPolicy) -> Self {
        Self::with_visibility(surface, projector, policy, OverlayVisibilityState::new())
    }

    /// Create a coordinator with a starting visibility state.
    pub fn with_visibility(
        surface: S,
        projector: PolygonProjector,
        policy: RegistrationPolicy,
        visibility: OverlayVisibilityState,
    ) -> Self {
        Self {
            surface,
            projector,
            policy,
            visibility,
            session: None,
            raster_attached: false,
            polygons: Vec::new(),
        }
    }

    /// Apply one event. `annotations` is the list currently owned by the
    /// annotation service.
    pub fn apply(&mut self, event: OverlayEvent<S::Image>, annotations: &AnnotationList) {
        log::debug!("Overlay event {}", event.name());

        match event {
            OverlayEvent::ImageLoaded(loaded) => self.image_loaded(loaded, annotations),
            OverlayEvent::ImageClosed => self.image_closed(),
            OverlayEvent::ToggleRaster(enabled) => self.toggle_raster(enabled),
            OverlayEvent::TogglePolygons(enabled) => self.toggle_polygons(enabled, annotations),
            OverlayEvent::OpacityChanged(opacity) => self.opacity_changed(opacity),
        }
    }

    fn image_loaded(&mut self, loaded: LoadedImage<S::Image>, annotations: &AnnotationList) {
        // At most one raster and no stale outlines across reloads
        self.release_raster();
        self.release_polygons();

        let mut session = LoadedSession {
            base: loaded.base,
            registration: None,
            raster: None,
            annotations_available: loaded.annotations_available,
        };

        if let Some(derived) = loaded.derived {
            let (state, result) =
                RegistrationState::compute(loaded.base, derived.dimensions, self.policy);
            session.registration = Some(state);

            match result {
                Ok(scale) => {
                    log::info!(
                        "Registered {} derived image to {} base image at factor {}",
                        derived.dimensions,
                        loaded.base,
                        scale
                    );
                    session.raster = Some(CachedRaster {
                        image: derived.image,
                        scale,
                    });
                }
                Err(e) => {
                    log::warn!("Likelihood map not shown: {}", e);
                }
            }
        }

        if let Some(raster) = &session.raster {
            if self.visibility.raster_enabled {
                self.surface.attach_raster(&raster.image, raster.scale);
                self.raster_attached = true;
            }
            self.surface.set_opacity(self.visibility.opacity());
        }

        self.session = Some(session);

        if loaded.annotations_available && self.visibility.polygons_enabled {
            self.attach_polygons(annotations);
        }
    }

    fn image_closed(&mut self) {
        self.release_polygons();
        self.release_raster();
        // Drops the cached raster and registration as well
        self.session = None;
    }

    fn toggle_raster(&mut self, enabled: bool) {
        self.visibility.raster_enabled = enabled;

        if !enabled {
            self.surface.detach_raster();
            self.raster_attached = false;
            return;
        }

        if self.raster_attached {
            return;
        }
        match self.session.as_ref().and_then(|s| s.raster.as_ref()) {
            Some(raster) => {
                self.surface.attach_raster(&raster.image, raster.scale);
                self.raster_attached = true;
            }
            None => log::debug!("No registered likelihood map to show"),
        }
    }

    fn toggle_polygons(&mut self, enabled: bool, annotations: &AnnotationList) {
        self.visibility.polygons_enabled = enabled;

        self.release_polygons();
        if !enabled {
            return;
        }

        match self.session.as_ref().map(|s| s.annotations_available) {
            Some(true) => self.attach_polygons(annotations),
            Some(false) => log::debug!("No detections loaded for this image"),
            None => log::debug!("No image open, detections not shown"),
        }
    }

    fn opacity_changed(&mut self, opacity: f32) {
        match self.visibility.set_opacity(opacity) {
            Some(stored) => self.surface.set_opacity(stored),
            None => log::warn!("Ignoring opacity value {}", opacity),
        }
    }

    fn attach_polygons(&mut self, annotations: &AnnotationList) {
        let scale = self.surface.scene_scale();
        let outlines = self.projector.project(annotations, scale);

        self.polygons.reserve(outlines.len());
        for outline in &outlines {
            let handle = self.surface.attach_polygon(outline);
            self.polygons.push(handle);
        }
        log::debug!("Attached {} detection outlines", self.polygons.len());
    }

    fn release_polygons(&mut self) {
        if self.polygons.is_empty() {
            return;
        }
        log::debug!("Releasing {} detection outlines", self.polygons.len());
        for handle in self.polygons.drain(..) {
            self.surface.detach_polygon(handle);
        }
    }

    fn release_raster(&mut self) {
        if self.raster_attached {
            self.surface.detach_raster();
            self.raster_attached = false;
        }
    }

    /// Release every attached overlay and return to the empty state.
    ///
    /// Idempotent; also run when the coordinator is dropped.
    pub fn teardown(&mut self) {
        self.image_closed();
    }

    pub fn visibility(&self) -> &OverlayVisibilityState {
        &self.visibility
    }

    /// Whether an image is currently open.
    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Dimensions of the open base image.
    pub fn base_dimensions(&self) -> Option<ImageDimensions> {
        self.session.as_ref().map(|s| s.base)
    }

    /// Registration of the open image's likelihood map, if one was offered.
    pub fn registration(&self) -> Option<&RegistrationState> {
        self.session.as_ref()?.registration.as_ref()
    }

    /// Scale of the cached raster, if registration succeeded.
    pub fn scale_factor(&self) -> Option<ScaleFactor> {
        self.session.as_ref()?.raster.as_ref().map(|r| r.scale)
    }

    /// Whether a registered raster is cached for the open image.
    pub fn has_cached_raster(&self) -> bool {
        self.scale_factor().is_some()
    }

    pub fn is_raster_attached(&self) -> bool {
        self.raster_attached
    }

    pub fn attached_polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: RenderSurface> Drop for OverlayCoordinator<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, Point};
    use crate::overlay::surface::HeadlessSurface;

    type Surface = HeadlessSurface<&'static str>;

    fn coordinator(surface: &mut Surface) -> OverlayCoordinator<&mut Surface> {
        OverlayCoordinator::new(
            surface,
            PolygonProjector::default(),
            RegistrationPolicy::default(),
        )
    }

    fn detections(n: usize) -> AnnotationList {
        (0..n)
            .map(|i| {
                let o = i as f64 * 100.0;
                Annotation::new(
                    format!("Annotation {}", i),
                    vec![Point::new(o, o), Point::new(o + 50.0, o), Point::new(o, o + 50.0)],
                )
            })
            .collect()
    }

    fn slide(with_map: bool, with_detections: bool) -> OverlayEvent<&'static str> {
        let mut loaded = LoadedImage::bare(ImageDimensions::new(4000, 4000));
        if with_map {
            loaded = loaded.with_derived("likelihood", ImageDimensions::new(1000, 1000));
        }
        OverlayEvent::ImageLoaded(loaded.with_annotations(with_detections))
    }

    #[test]
    fn test_load_caches_raster_without_attaching() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);

        coord.apply(slide(true, false), &AnnotationList::new());

        assert!(coord.is_loaded());
        assert_eq!(coord.scale_factor().map(|s| s.get()), Some(4));
        assert!(!coord.is_raster_attached());
        assert!(coord.surface().raster().is_none());
    }

    #[test]
    fn test_toggle_raster_attaches_at_scale() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let empty = AnnotationList::new();

        coord.apply(slide(true, false), &empty);
        coord.apply(OverlayEvent::ToggleRaster(true), &empty);
        coord.apply(OverlayEvent::ToggleRaster(true), &empty);

        assert!(coord.is_raster_attached());
        assert_eq!(coord.surface().raster_attaches(), 1);
        let (image, scale) = coord.surface().raster().unwrap();
        assert_eq!((*image, scale.get()), ("likelihood", 4));

        coord.apply(OverlayEvent::ToggleRaster(false), &empty);
        assert!(!coord.is_raster_attached());
        assert!(coord.surface().raster().is_none());
        // Still cached for the next toggle
        assert!(coord.has_cached_raster());
    }

    #[test]
    fn test_toggle_raster_off_without_attachment_succeeds() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);

        coord.apply(OverlayEvent::ToggleRaster(false), &AnnotationList::new());
        assert!(!coord.is_raster_attached());
        assert_eq!(coord.surface().raster_detaches(), 1);
    }

    #[test]
    fn test_toggle_raster_without_cache_is_noop() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let empty = AnnotationList::new();

        coord.apply(slide(false, false), &empty);
        coord.apply(OverlayEvent::ToggleRaster(true), &empty);

        assert!(!coord.is_raster_attached());
        assert!(coord.visibility().raster_enabled);
        assert_eq!(coord.surface().raster_attaches(), 0);
    }

    #[test]
    fn test_unregisterable_map_is_discarded() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let empty = AnnotationList::new();

        coord.apply(OverlayEvent::ToggleRaster(true), &empty);
        let loaded = LoadedImage::bare(ImageDimensions::new(4000, 3000))
            .with_derived("likelihood", ImageDimensions::new(1000, 1000));
        coord.apply(OverlayEvent::ImageLoaded(loaded), &empty);

        assert!(coord.is_loaded(), "base image stays usable");
        assert!(!coord.has_cached_raster());
        assert!(!coord.is_raster_attached());
        assert_eq!(coord.registration().map(|r| r.is_registered()), Some(false));
    }

    #[test]
    fn test_enabled_raster_attaches_on_load() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let empty = AnnotationList::new();

        coord.apply(OverlayEvent::ToggleRaster(true), &empty);
        coord.apply(slide(true, false), &empty);

        assert!(coord.is_raster_attached());
        assert_eq!(coord.surface().raster_attaches(), 1);
    }

    #[test]
    fn test_reload_keeps_single_raster() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let empty = AnnotationList::new();

        coord.apply(OverlayEvent::ToggleRaster(true), &empty);
        for _ in 0..3 {
            coord.apply(slide(true, false), &empty);
        }

        assert!(coord.is_raster_attached());
        let surface = coord.surface();
        assert_eq!(surface.raster_attaches() - surface.raster_detaches(), 1);
    }

    #[test]
    fn test_toggle_polygons_matches_list_size() {
        let mut surface = Surface::new(0.5);
        let mut coord = coordinator(&mut surface);
        let list = detections(5);

        coord.apply(slide(false, true), &list);
        assert_eq!(coord.attached_polygon_count(), 0);

        coord.apply(OverlayEvent::TogglePolygons(true), &list);
        assert_eq!(coord.attached_polygon_count(), 5);
        assert_eq!(coord.surface().polygon_count(), 5);

        // Projected at the surface's scene scale
        let first = coord.surface().polygons().next().unwrap();
        assert_eq!(first.points, vec![(0.0, 0.0), (25.0, 0.0), (0.0, 25.0)]);

        // Re-enabling does not duplicate outlines
        coord.apply(OverlayEvent::TogglePolygons(true), &list);
        assert_eq!(coord.surface().polygon_count(), 5);

        coord.apply(OverlayEvent::TogglePolygons(false), &list);
        assert_eq!(coord.attached_polygon_count(), 0);
        assert_eq!(coord.surface().polygon_count(), 0);
    }

    #[test]
    fn test_toggle_polygons_off_when_none_attached() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);

        coord.apply(OverlayEvent::TogglePolygons(false), &detections(3));
        coord.apply(OverlayEvent::TogglePolygons(false), &detections(3));

        assert_eq!(coord.attached_polygon_count(), 0);
        assert_eq!(coord.surface().polygons_released(), 0);
    }

    #[test]
    fn test_degenerate_scene_scale_still_attaches_every_outline() {
        let mut surface = Surface::new(0.0);
        let mut coord = coordinator(&mut surface);
        let list = detections(3);

        coord.apply(slide(false, true), &list);
        coord.apply(OverlayEvent::TogglePolygons(true), &list);

        assert_eq!(coord.attached_polygon_count(), list.len());
        assert_eq!(coord.surface().polygon_count(), list.len());
    }

    #[test]
    fn test_retoggle_projects_at_current_scene_scale() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let list = detections(1);

        coord.apply(slide(false, true), &list);
        coord.apply(OverlayEvent::TogglePolygons(true), &list);
        coord.surface_mut().set_scene_scale(2.0);
        coord.apply(OverlayEvent::TogglePolygons(true), &list);

        let outline = coord.surface().polygons().next().unwrap();
        assert_eq!(outline.points, vec![(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        assert_eq!(coord.attached_polygon_count(), 1);
    }

    #[test]
    fn test_polygons_without_open_image_not_attached() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);

        coord.apply(OverlayEvent::TogglePolygons(true), &detections(3));
        assert_eq!(coord.attached_polygon_count(), 0);
        assert!(coord.visibility().polygons_enabled);
    }

    #[test]
    fn test_reload_replaces_stale_outlines() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);

        coord.apply(OverlayEvent::TogglePolygons(true), &AnnotationList::new());
        coord.apply(slide(false, true), &detections(4));
        assert_eq!(coord.attached_polygon_count(), 4);

        coord.apply(slide(false, true), &detections(2));
        assert_eq!(coord.attached_polygon_count(), 2);
        assert_eq!(coord.surface().polygon_count(), 2);
        assert_eq!(coord.surface().polygons_released(), 4);
    }

    #[test]
    fn test_close_releases_everything() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let list = detections(3);

        coord.apply(OverlayEvent::ToggleRaster(true), &list);
        coord.apply(OverlayEvent::TogglePolygons(true), &list);
        coord.apply(slide(true, true), &list);
        assert!(coord.is_raster_attached());
        assert_eq!(coord.attached_polygon_count(), 3);

        coord.apply(OverlayEvent::ImageClosed, &list);
        assert!(!coord.is_loaded());
        assert!(!coord.is_raster_attached());
        assert!(!coord.has_cached_raster());
        assert!(coord.registration().is_none());
        assert_eq!(coord.attached_polygon_count(), 0);
        assert_eq!(coord.surface().polygon_count(), 0);
        assert!(coord.surface().raster().is_none());

        // Control state survives the close
        assert!(coord.visibility().raster_enabled);
        assert!(coord.visibility().polygons_enabled);

        // Closing twice is harmless
        coord.apply(OverlayEvent::ImageClosed, &list);
        assert_eq!(coord.surface().polygons_released(), 3);
    }

    #[test]
    fn test_opacity_forwarded_and_reused() {
        let mut surface = Surface::new(1.0);
        let mut coord = coordinator(&mut surface);
        let empty = AnnotationList::new();

        coord.apply(OverlayEvent::OpacityChanged(0.3), &empty);
        assert_eq!(coord.surface().opacity(), 0.3);

        coord.apply(OverlayEvent::OpacityChanged(7.0), &empty);
        assert_eq!(coord.surface().opacity(), 1.0);

        coord.apply(OverlayEvent::OpacityChanged(f32::NAN), &empty);
        assert_eq!(coord.visibility().opacity(), 1.0);
    }

    #[test]
    fn test_drop_releases_handles() {
        let mut surface = Surface::new(1.0);
        {
            let mut coord = coordinator(&mut surface);
            let list = detections(6);
            coord.apply(OverlayEvent::ToggleRaster(true), &list);
            coord.apply(OverlayEvent::TogglePolygons(true), &list);
            coord.apply(slide(true, true), &list);
            assert_eq!(coord.surface().polygon_count(), 6);
        }

        assert_eq!(surface.polygon_count(), 0);
        assert_eq!(surface.polygons_released(), 6);
        assert!(surface.raster().is_none());
    }
}
