//! Annotation format implementations.

mod asap_xml;
mod json;

#[cfg(test)]
mod tests;

pub use asap_xml::AsapXmlFormat;
pub use json::{AnnotationDocument, AnnotationEntry, GroupEntry, JsonFormat};
