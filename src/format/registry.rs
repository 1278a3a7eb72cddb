//! Format registry for discovering and accessing annotation formats.

use std::collections::HashMap;
use std::path::Path;

use crate::format::formats::{AsapXmlFormat, JsonFormat};
use crate::format::traits::AnnotationFormat;

/// Registry of available annotation formats.
///
/// All built-in formats are registered automatically on creation.
pub struct FormatRegistry {
    formats: HashMap<&'static str, Box<dyn AnnotationFormat>>,
}

impl FormatRegistry {
    /// Id of the format used for companion detection files.
    pub const NATIVE_ID: &'static str = "asap";

    /// Create a new registry with all built-in formats registered.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: HashMap::new(),
        };

        registry.register(Box::new(AsapXmlFormat));
        registry.register(Box::new(JsonFormat));

        registry
    }

    /// Register a format implementation, replacing one with the same id.
    pub fn register(&mut self, format: Box<dyn AnnotationFormat>) {
        self.formats.insert(format.id(), format);
    }

    /// Get a format by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn AnnotationFormat> {
        self.formats.get(id).map(|f| f.as_ref())
    }

    /// Remove a format from the registry and hand over ownership.
    pub fn take(&mut self, id: &str) -> Option<Box<dyn AnnotationFormat>> {
        self.formats.remove(id)
    }

    /// Find formats by file extension.
    pub fn by_extension(&self, ext: &str) -> Vec<&dyn AnnotationFormat> {
        let ext = ext.to_ascii_lowercase();
        self.formats
            .values()
            .filter(|f| f.extensions().iter().any(|e| *e == ext))
            .map(|f| f.as_ref())
            .collect()
    }

    /// Pick the format for a path from its extension.
    pub fn for_path(&self, path: &Path) -> Option<&dyn AnnotationFormat> {
        let ext = path.extension()?.to_str()?;
        let mut candidates = self.by_extension(ext);
        // Deterministic pick when several formats share an extension
        candidates.sort_by_key(|f| f.id());
        candidates.into_iter().next()
    }

    /// Get all format IDs, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.formats.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get the format used for companion detection files.
    pub fn native(&self) -> Option<&dyn AnnotationFormat> {
        self.get(Self::NATIVE_ID)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_formats() {
        let registry = FormatRegistry::new();

        assert!(registry.get("asap").is_some());
        assert!(registry.get("json").is_some());
        assert_eq!(registry.ids(), vec!["asap", "json"]);
    }

    #[test]
    fn test_native_format() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.native().map(|f| f.id()), Some("asap"));
    }

    #[test]
    fn test_format_for_path() {
        let registry = FormatRegistry::new();

        let xml = registry.for_path(Path::new("/slides/a_detections.xml"));
        assert_eq!(xml.map(|f| f.id()), Some("asap"));

        let json = registry.for_path(Path::new("/slides/A.JSON"));
        assert_eq!(json.map(|f| f.id()), Some("json"));

        assert!(registry.for_path(Path::new("/slides/a.tif")).is_none());
        assert!(registry.for_path(Path::new("/slides/noext")).is_none());
    }

    #[test]
    fn test_take_removes_format() {
        let mut registry = FormatRegistry::new();
        let json = registry.take("json");
        assert!(json.is_some());
        assert!(registry.get("json").is_none());
    }
}
