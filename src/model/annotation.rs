//! Annotation entities loaded from detection files.
//!
//! Geometry is expressed in base-image pixel coordinates and is immutable once
//! an [`Annotation`] has been constructed. The [`AnnotationList`] keeps both the
//! annotations and the groups they may belong to in insertion order.

use std::fmt;
use std::str::FromStr;

/// Default outline color used by annotation tools for new annotations.
pub const DEFAULT_ANNOTATION_COLOR: &str = "#F4FA58";

/// Default color for annotation groups.
pub const DEFAULT_GROUP_COLOR: &str = "#64FE2E";

/// A point in base-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Geometric interpretation of an annotation's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationKind {
    /// Single-point marker.
    Dot,
    /// Closed polygon.
    #[default]
    Polygon,
    /// Axis-aligned rectangle given by its four corners.
    Rectangle,
    /// Closed spline through the control points.
    Spline,
    /// Unconnected set of points.
    PointSet,
    /// Two-point ruler.
    Measurement,
}

impl AnnotationKind {
    /// Name used by the markup repository format.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationKind::Dot => "Dot",
            AnnotationKind::Polygon => "Polygon",
            AnnotationKind::Rectangle => "Rectangle",
            AnnotationKind::Spline => "Spline",
            AnnotationKind::PointSet => "PointSet",
            AnnotationKind::Measurement => "Measurement",
        }
    }

    /// All kinds, in declaration order.
    pub fn all() -> &'static [AnnotationKind] {
        &[
            AnnotationKind::Dot,
            AnnotationKind::Polygon,
            AnnotationKind::Rectangle,
            AnnotationKind::Spline,
            AnnotationKind::PointSet,
            AnnotationKind::Measurement,
        ]
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnotationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown annotation type '{}'", s))
    }
}

/// A detection or region of interest: an ordered point sequence plus a label.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    name: String,
    kind: AnnotationKind,
    group: Option<String>,
    color: String,
    coordinates: Vec<Point>,
}

impl Annotation {
    /// Create a polygon annotation with the default color and no group.
    pub fn new(name: impl Into<String>, coordinates: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            kind: AnnotationKind::Polygon,
            group: None,
            color: DEFAULT_ANNOTATION_COLOR.to_string(),
            coordinates,
        }
    }

    /// Set the annotation kind.
    pub fn with_kind(mut self, kind: AnnotationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Assign the annotation to a named group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the display color (`#RRGGBB`).
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Coordinates in base-image pixels, in drawing order.
    pub fn coordinates(&self) -> &[Point] {
        &self.coordinates
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// Check if the annotation has no points.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// A named grouping of annotations, optionally nested in a parent group.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationGroup {
    pub name: String,
    pub parent: Option<String>,
    pub color: String,
}

impl AnnotationGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            color: DEFAULT_GROUP_COLOR.to_string(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Ordered collection of annotations and groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationList {
    annotations: Vec<Annotation>,
    groups: Vec<AnnotationGroup>,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an annotation, preserving insertion order.
    pub fn push(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Append a group, preserving insertion order.
    pub fn push_group(&mut self, group: AnnotationGroup) {
        self.groups.push(group);
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn groups(&self) -> &[AnnotationGroup] {
        &self.groups
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&AnnotationGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Number of annotations (groups are not counted).
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Total number of points across all annotations.
    pub fn total_points(&self) -> usize {
        self.annotations.iter().map(Annotation::len).sum()
    }

    /// Remove all annotations and groups.
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.groups.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }
}

impl<'a> IntoIterator for &'a AnnotationList {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.annotations.iter()
    }
}

impl FromIterator<Annotation> for AnnotationList {
    fn from_iter<T: IntoIterator<Item = Annotation>>(iter: T) -> Self {
        Self {
            annotations: iter.into_iter().collect(),
            groups: Vec::new(),
        }
    }
}
