//! Data models for slide annotations.

mod annotation;

pub use annotation::{
    Annotation, AnnotationGroup, AnnotationKind, AnnotationList, DEFAULT_ANNOTATION_COLOR,
    DEFAULT_GROUP_COLOR, Point,
};
