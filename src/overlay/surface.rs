//! The rendering surface the overlays are attached to.

use std::collections::BTreeMap;

use crate::projection::ViewPolygon;
use crate::registration::ScaleFactor;

/// Opaque reference to a polygon inserted into a surface.
///
/// Handles are move-only: detaching consumes the handle, so it cannot be
/// released twice through safe code paths.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PolygonHandle(u64);

impl PolygonHandle {
    /// Wrap a surface-specific id. Only surfaces should mint handles.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Narrow interface to the viewer's scene.
pub trait RenderSurface {
    /// Derived raster type the surface can display.
    type Image;

    /// Show `image` as the foreground raster, upsampled by `scale`.
    fn attach_raster(&mut self, image: &Self::Image, scale: ScaleFactor);

    /// Clear the foreground raster. Must succeed when nothing is attached.
    fn detach_raster(&mut self);

    /// Set the foreground raster opacity in [0, 1].
    fn set_opacity(&mut self, opacity: f32);

    /// Insert an outline and return its handle.
    fn attach_polygon(&mut self, polygon: &ViewPolygon) -> PolygonHandle;

    /// Remove a previously inserted outline.
    fn detach_polygon(&mut self, handle: PolygonHandle);

    /// Current image-to-scene scale of the viewer.
    fn scene_scale(&self) -> f32;
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    type Image = S::Image;

    fn attach_raster(&mut self, image: &Self::Image, scale: ScaleFactor) {
        (**self).attach_raster(image, scale)
    }

    fn detach_raster(&mut self) {
        (**self).detach_raster()
    }

    fn set_opacity(&mut self, opacity: f32) {
        (**self).set_opacity(opacity)
    }

    fn attach_polygon(&mut self, polygon: &ViewPolygon) -> PolygonHandle {
        (**self).attach_polygon(polygon)
    }

    fn detach_polygon(&mut self, handle: PolygonHandle) {
        (**self).detach_polygon(handle)
    }

    fn scene_scale(&self) -> f32 {
        (**self).scene_scale()
    }
}

/// In-memory surface that records what is attached.
///
/// Used for headless inspection and tests. Detaching a handle that is not
/// attached panics, since it means a handle was released twice.
#[derive(Debug)]
pub struct HeadlessSurface<I> {
    scene_scale: f32,
    raster: Option<(I, ScaleFactor)>,
    opacity: f32,
    polygons: BTreeMap<u64, ViewPolygon>,
    next_id: u64,
    raster_attaches: usize,
    raster_detaches: usize,
    polygons_released: usize,
}

impl<I> HeadlessSurface<I> {
    /// Create a surface with the given scene scale.
    pub fn new(scene_scale: f32) -> Self {
        Self {
            scene_scale,
            raster: None,
            opacity: 1.0,
            polygons: BTreeMap::new(),
            next_id: 0,
            raster_attaches: 0,
            raster_detaches: 0,
            polygons_released: 0,
        }
    }

    /// Change the scene scale, as zooming the viewer would.
    pub fn set_scene_scale(&mut self, scale: f32) {
        self.scene_scale = scale;
    }

    /// Attached raster and its scale.
    pub fn raster(&self) -> Option<(&I, ScaleFactor)> {
        self.raster.as_ref().map(|(image, scale)| (image, *scale))
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Outlines currently in the scene, in insertion order.
    pub fn polygons(&self) -> impl Iterator<Item = &ViewPolygon> {
        self.polygons.values()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Total number of raster attach calls.
    pub fn raster_attaches(&self) -> usize {
        self.raster_attaches
    }

    /// Total number of raster detach calls.
    pub fn raster_detaches(&self) -> usize {
        self.raster_detaches
    }

    /// Total number of polygons ever attached.
    pub fn polygons_attached(&self) -> u64 {
        self.next_id
    }

    /// Total number of polygons released.
    pub fn polygons_released(&self) -> usize {
        self.polygons_released
    }
}

impl<I: Clone> RenderSurface for HeadlessSurface<I> {
    type Image = I;

    fn attach_raster(&mut self, image: &I, scale: ScaleFactor) {
        self.raster = Some((image.clone(), scale));
        self.raster_attaches += 1;
    }

    fn detach_raster(&mut self) {
        self.raster = None;
        self.raster_detaches += 1;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn attach_polygon(&mut self, polygon: &ViewPolygon) -> PolygonHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.polygons.insert(id, polygon.clone());
        PolygonHandle::new(id)
    }

    fn detach_polygon(&mut self, handle: PolygonHandle) {
        if self.polygons.remove(&handle.id()).is_none() {
            panic!("polygon handle {} detached but not attached", handle.id());
        }
        self.polygons_released += 1;
    }

    fn scene_scale(&self) -> f32 {
        self.scene_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{POLYGON_Z_ORDER, PolygonStyle};

    fn outline() -> ViewPolygon {
        ViewPolygon {
            points: vec![(0.0, 0.0), (1.0, 1.0)],
            style: PolygonStyle::default(),
            z_order: POLYGON_Z_ORDER,
        }
    }

    #[test]
    fn test_polygon_attach_detach() {
        let mut surface: HeadlessSurface<()> = HeadlessSurface::new(1.0);
        let a = surface.attach_polygon(&outline());
        let b = surface.attach_polygon(&outline());
        assert_ne!(a, b);
        assert_eq!(surface.polygon_count(), 2);

        surface.detach_polygon(a);
        surface.detach_polygon(b);
        assert_eq!(surface.polygon_count(), 0);
        assert_eq!(surface.polygons_released(), 2);
    }

    #[test]
    #[should_panic(expected = "detached but not attached")]
    fn test_double_release_panics() {
        let mut surface: HeadlessSurface<()> = HeadlessSurface::new(1.0);
        let handle = surface.attach_polygon(&outline());
        let forged = PolygonHandle::new(handle.id());
        surface.detach_polygon(handle);
        surface.detach_polygon(forged);
    }

    #[test]
    fn test_detach_raster_when_empty() {
        let mut surface: HeadlessSurface<&str> = HeadlessSurface::new(1.0);
        surface.detach_raster();
        assert!(surface.raster().is_none());

        surface.attach_raster(&"map", ScaleFactor::new(8).unwrap());
        assert_eq!(surface.raster().map(|(i, s)| (*i, s.get())), Some(("map", 8)));
    }

    fn drive<S: RenderSurface>(mut surface: S) -> f32 {
        surface.set_opacity(0.25);
        let handle = surface.attach_polygon(&outline());
        surface.detach_polygon(handle);
        surface.scene_scale()
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut surface: HeadlessSurface<()> = HeadlessSurface::new(0.5);
        assert_eq!(drive(&mut surface), 0.5);
        assert_eq!(surface.opacity(), 0.25);
        assert_eq!(surface.polygons_released(), 1);
    }
}
