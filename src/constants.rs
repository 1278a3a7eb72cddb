//! Global constants for slide overlays.

/// Suffix appended to a slide's base name to find its likelihood map
pub const LIKELIHOOD_MAP_SUFFIX: &str = "_likelihood_map.tif";

/// Suffix appended to a slide's base name to find its detections
pub const DETECTIONS_SUFFIX: &str = "_detections.xml";

/// Foreground opacity before the user changes it
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Scene scale used when no viewer reports one
pub const DEFAULT_SCENE_SCALE: f32 = 1.0;
