//! Overlay visibility state and the events that drive it.

use crate::registration::ImageDimensions;

/// User-controlled overlay settings.
///
/// Mirrors the state of the visualization controls, so it survives image
/// reloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayVisibilityState {
    pub raster_enabled: bool,
    pub polygons_enabled: bool,
    opacity: f32,
}

impl OverlayVisibilityState {
    /// Both overlays off, fully opaque.
    pub fn new() -> Self {
        Self::with_opacity(1.0)
    }

    /// Both overlays off with a starting opacity, clamped to [0, 1].
    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            raster_enabled: false,
            polygons_enabled: false,
            opacity: if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) },
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Store a new opacity, clamped to [0, 1].
    ///
    /// Returns the stored value, or None if `opacity` is NaN.
    pub fn set_opacity(&mut self, opacity: f32) -> Option<f32> {
        if opacity.is_nan() {
            return None;
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        Some(self.opacity)
    }
}

impl Default for OverlayVisibilityState {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded derived raster together with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct DerivedRaster<I> {
    pub image: I,
    pub dimensions: ImageDimensions,
}

/// Payload of [`OverlayEvent::ImageLoaded`].
#[derive(Debug, Clone)]
pub struct LoadedImage<I> {
    /// Dimensions of the base image.
    pub base: ImageDimensions,
    /// Companion likelihood map, if one was found and opened.
    pub derived: Option<DerivedRaster<I>>,
    /// Whether companion detections were loaded for this image.
    pub annotations_available: bool,
}

impl<I> LoadedImage<I> {
    /// A base image with no companions.
    pub fn bare(base: ImageDimensions) -> Self {
        Self {
            base,
            derived: None,
            annotations_available: false,
        }
    }

    pub fn with_derived(mut self, image: I, dimensions: ImageDimensions) -> Self {
        self.derived = Some(DerivedRaster { image, dimensions });
        self
    }

    pub fn with_annotations(mut self, available: bool) -> Self {
        self.annotations_available = available;
        self
    }
}

/// Discrete, totally ordered inputs to the overlay state machine.
#[derive(Debug, Clone)]
pub enum OverlayEvent<I> {
    /// A base image finished loading
    ImageLoaded(LoadedImage<I>),
    /// The base image was closed
    ImageClosed,
    /// The likelihood-map control was toggled
    ToggleRaster(bool),
    /// The detections control was toggled
    TogglePolygons(bool),
    /// The opacity control changed
    OpacityChanged(f32),
}

impl<I> OverlayEvent<I> {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            OverlayEvent::ImageLoaded(_) => "ImageLoaded",
            OverlayEvent::ImageClosed => "ImageClosed",
            OverlayEvent::ToggleRaster(_) => "ToggleRaster",
            OverlayEvent::TogglePolygons(_) => "TogglePolygons",
            OverlayEvent::OpacityChanged(_) => "OpacityChanged",
        }
    }
}
