//! A format backend bound to one external source.

use std::path::{Path, PathBuf};

use crate::format::error::RepositoryError;
use crate::format::traits::AnnotationFormat;
use crate::model::AnnotationList;

/// Binds an [`AnnotationFormat`] to a single source path.
///
/// Loads and saves run to completion inside one `&self` call, and rebinding
/// takes `&mut self`, so a source can never change under a running operation.
pub struct Repository {
    format: Box<dyn AnnotationFormat>,
    source: Option<PathBuf>,
}

impl Repository {
    /// Create an unbound repository using `format`.
    pub fn new(format: Box<dyn AnnotationFormat>) -> Self {
        Self {
            format,
            source: None,
        }
    }

    /// Bind the repository to `source`, replacing any previous binding.
    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        let source = source.into();
        log::debug!("Repository ({}) bound to {:?}", self.format.id(), source);
        self.source = Some(source);
    }

    /// Currently bound source, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn format(&self) -> &dyn AnnotationFormat {
        self.format.as_ref()
    }

    /// Load a complete list from the bound source.
    pub fn load(&self) -> Result<AnnotationList, RepositoryError> {
        let source = self.source.as_ref().ok_or(RepositoryError::Unbound)?;
        self.format
            .load(source)
            .map_err(|error| RepositoryError::Load {
                source_path: source.clone(),
                error,
            })
    }

    /// Write `list` to the bound source.
    pub fn save(&self, list: &AnnotationList) -> Result<(), RepositoryError> {
        let source = self.source.as_ref().ok_or(RepositoryError::Unbound)?;
        self.format
            .save(source, list)
            .map_err(|error| RepositoryError::Save {
                source_path: source.clone(),
                error,
            })
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("format", &self.format.id())
            .field("source", &self.source)
            .finish()
    }
}
