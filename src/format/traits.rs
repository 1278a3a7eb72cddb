//! Trait definitions for annotation repository formats.

use std::path::Path;

use crate::format::error::FormatError;
use crate::model::AnnotationList;

/// Capability interface for a repository file format.
///
/// Implementations convert between an [`AnnotationList`] and the bytes of an
/// external source. Decoding is all-or-nothing: an error never yields a
/// partially populated list.
pub trait AnnotationFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "asap", "json").
    fn id(&self) -> &'static str;

    /// Human-readable name for display.
    fn display_name(&self) -> &'static str;

    /// File extensions this format uses (e.g., `["xml"]`).
    fn extensions(&self) -> &[&'static str];

    /// Decode a complete list from bytes.
    fn decode(&self, bytes: &[u8]) -> Result<AnnotationList, FormatError>;

    /// Encode a list into bytes.
    fn encode(&self, list: &AnnotationList) -> Result<Vec<u8>, FormatError>;

    /// Read and decode the file at `path`.
    fn load(&self, path: &Path) -> Result<AnnotationList, FormatError> {
        log::info!("Loading {} annotations from {:?}", self.id(), path);

        let bytes = std::fs::read(path)?;
        let list = self.decode(&bytes)?;

        log::info!(
            "Loaded {} annotations ({} points, {} groups)",
            list.len(),
            list.total_points(),
            list.groups().len()
        );
        Ok(list)
    }

    /// Encode `list` and write it to `path`.
    fn save(&self, path: &Path, list: &AnnotationList) -> Result<(), FormatError> {
        log::info!("Saving {} annotations as {} to {:?}", list.len(), self.id(), path);

        let bytes = self.encode(list)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
