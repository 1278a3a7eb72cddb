//! Overlay lifecycle: which overlays are attached to the viewer and when.

mod coordinator;
mod state;
mod surface;

pub use coordinator::OverlayCoordinator;
pub use state::{DerivedRaster, LoadedImage, OverlayEvent, OverlayVisibilityState};
pub use surface::{HeadlessSurface, PolygonHandle, RenderSurface};
