//! Viewer extension wiring companion discovery, the annotation service and
//! the overlay coordinator together.
//!
//! The host viewer forwards its image lifecycle and control events here.
//! Nothing in this module returns an error: missing companions are expected
//! and failures only mean an overlay is not offered.

use std::path::Path;

use crate::companion::CompanionFiles;
use crate::config::OverlayConfig;
use crate::format::{AnnotationService, FormatRegistry};
use crate::image_provider::ImageProvider;
use crate::model::AnnotationList;
use crate::overlay::{LoadedImage, OverlayCoordinator, OverlayEvent, OverlayVisibilityState};
use crate::projection::PolygonProjector;
use crate::registration::{ImageDimensions, RegistrationState};

/// Likelihood-map and detection overlays for one viewer.
pub struct VisualizationExtension<P, S>
where
    P: ImageProvider,
    S: crate::overlay::RenderSurface<Image = P::Image>,
{
    config: OverlayConfig,
    provider: P,
    service: AnnotationService,
    coordinator: OverlayCoordinator<S>,
}

impl<P, S> VisualizationExtension<P, S>
where
    P: ImageProvider,
    S: crate::overlay::RenderSurface<Image = P::Image>,
{
    /// Create the extension drawing onto `surface`.
    pub fn new(config: OverlayConfig, provider: P, surface: S) -> Self {
        let service = match FormatRegistry::new().take(&config.annotation_format) {
            Some(format) => AnnotationService::with_format(format),
            None => {
                log::warn!(
                    "Unknown annotation format '{}', using {}",
                    config.annotation_format,
                    FormatRegistry::NATIVE_ID
                );
                AnnotationService::new()
            }
        };

        let coordinator = OverlayCoordinator::with_visibility(
            surface,
            PolygonProjector::new(config.polygon_style),
            config.registration_policy,
            OverlayVisibilityState::with_opacity(config.default_opacity),
        );

        Self {
            config,
            provider,
            service,
            coordinator,
        }
    }

    /// A new base image was opened. Its dimensions are read through the
    /// provider; if that fails the image is treated as closed.
    pub fn on_new_image_loaded(&mut self, base_path: &Path) {
        let Some(base) = self.provider.open(base_path) else {
            log::warn!("Could not read base image {:?}, overlays disabled", base_path);
            self.on_image_closed();
            return;
        };
        let dimensions = self.provider.dimensions(&base);
        self.on_image_loaded_with_dimensions(base_path, dimensions);
    }

    /// A new base image of known dimensions was opened.
    pub fn on_image_loaded_with_dimensions(&mut self, base_path: &Path, base: ImageDimensions) {
        let companions = CompanionFiles::for_slide(
            base_path,
            &self.config.likelihood_suffix,
            &self.config.detections_suffix,
        );

        let mut loaded = LoadedImage::bare(base);

        match companions.existing_likelihood_map() {
            Some(path) => match self.provider.open(path) {
                Some(image) => {
                    let dimensions = self.provider.dimensions(&image);
                    loaded = loaded.with_derived(image, dimensions);
                }
                None => log::warn!("Likelihood map {:?} could not be opened", path),
            },
            None => log::debug!("No likelihood map at {:?}", companions.likelihood_map),
        }

        let annotations_available = match companions.existing_detections() {
            Some(path) => match self.service.load_repository_from_file(path) {
                Ok(count) => {
                    log::info!("Loaded {} detections from {:?}", count, path);
                    true
                }
                Err(e) => {
                    log::warn!("Detections not shown: {}", e);
                    self.service.clear();
                    false
                }
            },
            None => {
                log::debug!("No detections at {:?}", companions.detections);
                self.service.clear();
                false
            }
        };

        self.coordinator.apply(
            OverlayEvent::ImageLoaded(loaded.with_annotations(annotations_available)),
            self.service.list(),
        );
    }

    /// The base image was closed.
    pub fn on_image_closed(&mut self) {
        self.coordinator
            .apply(OverlayEvent::ImageClosed, self.service.list());
        self.service.clear();
    }

    /// The likelihood-map control was toggled.
    pub fn on_raster_toggled(&mut self, enabled: bool) {
        self.coordinator
            .apply(OverlayEvent::ToggleRaster(enabled), self.service.list());
    }

    /// The detections control was toggled.
    pub fn on_polygons_toggled(&mut self, enabled: bool) {
        self.coordinator
            .apply(OverlayEvent::TogglePolygons(enabled), self.service.list());
    }

    /// The opacity control changed.
    pub fn on_opacity_changed(&mut self, opacity: f64) {
        self.coordinator
            .apply(OverlayEvent::OpacityChanged(opacity as f32), self.service.list());
    }

    /// Whether the overlay controls should be enabled.
    pub fn is_enabled(&self) -> bool {
        self.coordinator.is_loaded()
    }

    pub fn registration(&self) -> Option<&RegistrationState> {
        self.coordinator.registration()
    }

    pub fn annotations(&self) -> &AnnotationList {
        self.service.list()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &OverlayCoordinator<S> {
        &self.coordinator
    }
}
