//! Companion files stored next to a slide.
//!
//! For a slide `X.ext` in directory `D`, the likelihood map lives at
//! `D/X_likelihood_map.tif` and the detections at `D/X_detections.xml`. Both
//! are optional.

use std::path::{Path, PathBuf};

/// File name without directory and without its last extension.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory containing `path` (empty for a bare file name).
pub fn file_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Join a file name onto a directory.
pub fn complete_path(file_name: &str, dir: &Path) -> PathBuf {
    dir.join(file_name)
}

/// Whether a regular file exists at `path`.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Expected companion locations for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionFiles {
    pub likelihood_map: PathBuf,
    pub detections: PathBuf,
}

impl CompanionFiles {
    /// Compute companion paths for `slide` using the given suffixes.
    pub fn for_slide(slide: &Path, likelihood_suffix: &str, detections_suffix: &str) -> Self {
        let base = base_name(slide);
        let dir = file_dir(slide);
        Self {
            likelihood_map: complete_path(&format!("{}{}", base, likelihood_suffix), &dir),
            detections: complete_path(&format!("{}{}", base, detections_suffix), &dir),
        }
    }

    /// Likelihood map path, if the file exists.
    pub fn existing_likelihood_map(&self) -> Option<&Path> {
        Some(self.likelihood_map.as_path()).filter(|p| file_exists(p))
    }

    /// Detections path, if the file exists.
    pub fn existing_detections(&self) -> Option<&Path> {
        Some(self.detections.as_path()).filter(|p| file_exists(p))
    }
}
