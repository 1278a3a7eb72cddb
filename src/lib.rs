//! pathoverlay - likelihood-map and detection overlays for whole-slide images
//!
//! When a slide is opened, companion files next to it are discovered: a
//! coarse likelihood map, registered to the slide by an integer downsample
//! factor, and a set of detection polygons. Both are offered as toggleable
//! overlays on a [`overlay::RenderSurface`].

pub mod companion;
pub mod config;
pub mod constants;
pub mod extension;
pub mod format;
pub mod image_provider;
pub mod model;
pub mod overlay;
pub mod projection;
pub mod registration;


pub use config::{ConfigError, LogLevel, OverlayConfig};
pub use extension::VisualizationExtension;
pub use format::{AnnotationService, FormatError, FormatRegistry, RepositoryError};
pub use image_provider::{FileImageProvider, ImageProvider};
pub use model::{Annotation, AnnotationList};
pub use overlay::{HeadlessSurface, OverlayCoordinator, OverlayEvent, RenderSurface};
pub use registration::{ImageDimensions, RegistrationPolicy, ScaleFactor};
