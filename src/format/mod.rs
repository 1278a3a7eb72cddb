//! Annotation persistence.
//!
//! This module provides a trait-based repository system for loading and
//! saving an [`AnnotationList`](crate::model::AnnotationList). New formats are
//! added by implementing the [`AnnotationFormat`] trait; the
//! [`AnnotationService`] only depends on that contract.
//!
//! ## Supported Formats
//!
//! - **ASAP XML**: markup format of `*_detections.xml` companion files
//! - **JSON**: native serde document with a version field
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathoverlay::format::AnnotationService;
//!
//! let mut service = AnnotationService::new();
//! let count = service.load_repository_from_file("slide_detections.xml")?;
//! service.save_repository_to_file("copy.xml")?;
//! ```

mod error;
pub mod formats;
mod registry;
mod repository;
mod service;
mod traits;

pub use error::{FormatError, RepositoryError};
pub use registry::FormatRegistry;
pub use repository::Repository;
pub use service::AnnotationService;
pub use traits::AnnotationFormat;
