//! Annotation service: one list, one repository, load/save as a unit of work.

use std::path::Path;

use crate::format::error::RepositoryError;
use crate::format::formats::AsapXmlFormat;
use crate::format::repository::Repository;
use crate::format::traits::AnnotationFormat;
use crate::model::AnnotationList;

/// Sole owner of an [`AnnotationList`] and the [`Repository`] that fills it.
///
/// Consumers get read-only access through [`list`](Self::list).
#[derive(Debug)]
pub struct AnnotationService {
    list: AnnotationList,
    repository: Repository,
}

impl AnnotationService {
    /// Create a service backed by the ASAP XML format.
    pub fn new() -> Self {
        Self::with_format(Box::new(AsapXmlFormat))
    }

    /// Create a service backed by `format`.
    pub fn with_format(format: Box<dyn AnnotationFormat>) -> Self {
        Self {
            list: AnnotationList::new(),
            repository: Repository::new(format),
        }
    }

    pub fn list(&self) -> &AnnotationList {
        &self.list
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Bind the repository to `source` and load it.
    ///
    /// The list is replaced only when the whole source decoded; on failure
    /// the previous contents stay untouched. Returns the number of loaded
    /// annotations.
    pub fn load_repository_from_file(
        &mut self,
        source: impl AsRef<Path>,
    ) -> Result<usize, RepositoryError> {
        self.repository.set_source(source.as_ref());
        let list = self.repository.load()?;
        self.list = list;
        Ok(self.list.len())
    }

    /// Bind the repository to `source` and save the list to it.
    pub fn save_repository_to_file(
        &mut self,
        source: impl AsRef<Path>,
    ) -> Result<(), RepositoryError> {
        self.repository.set_source(source.as_ref());
        self.repository.save(&self.list)
    }

    /// Replace the list wholesale.
    pub fn replace_list(&mut self, list: AnnotationList) {
        self.list = list;
    }

    /// Drop all annotations.
    pub fn clear(&mut self) {
        self.list.clear();
    }
}

impl Default for AnnotationService {
    fn default() -> Self {
        Self::new()
    }
}
