//! Native JSON format implementation.
//!
//! A serde-derived document with full fidelity for every annotation field.
//!
//! # Versioning
//!
//! The document carries a semantic version (MAJOR.MINOR.PATCH). Files with a
//! different major version are rejected; a newer minor version is read with
//! a warning.

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;
use crate::model::{Annotation, AnnotationGroup, AnnotationKind, AnnotationList, Point};

/// Serialized form of an [`AnnotationList`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Format version for compatibility checking.
    pub version: String,

    /// Annotations in list order.
    pub annotations: Vec<AnnotationEntry>,

    /// Group definitions in list order.
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

impl AnnotationDocument {
    /// Current version of the document format.
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    /// Major version number for compatibility checking.
    pub const VERSION_MAJOR: u32 = 1;

    /// Minor version number.
    pub const VERSION_MINOR: u32 = 0;

    /// Parse a version string into (major, minor, patch) components.
    ///
    /// Returns None if the version string is invalid.
    pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let major = parts[0].parse().ok()?;
        let minor = parts[1].parse().ok()?;
        let patch = parts[2].parse().ok()?;
        Some((major, minor, patch))
    }

    /// Check if a file version can be read by this build.
    pub fn is_version_readable(file_version: &str) -> bool {
        matches!(
            Self::parse_version(file_version),
            Some((major, _, _)) if major == Self::VERSION_MAJOR
        )
    }

    /// Build a document from a list.
    pub fn from_list(list: &AnnotationList) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            annotations: list.iter().map(AnnotationEntry::from).collect(),
            groups: list.groups().iter().map(GroupEntry::from).collect(),
        }
    }

    /// Convert the document into a list.
    pub fn into_list(self) -> Result<AnnotationList, FormatError> {
        let mut list = AnnotationList::new();
        for entry in self.annotations {
            list.push(entry.into_annotation()?);
        }
        for group in self.groups {
            list.push_group(group.into());
        }
        Ok(list)
    }
}

/// Serialized annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub color: String,
    /// Points as `[x, y]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

impl AnnotationEntry {
    fn into_annotation(self) -> Result<Annotation, FormatError> {
        let kind: AnnotationKind = self.kind.parse().map_err(FormatError::invalid_format)?;
        if let Some([x, y]) = self
            .coordinates
            .iter()
            .find(|[x, y]| !x.is_finite() || !y.is_finite())
        {
            return Err(FormatError::invalid_coordinates(format!(
                "Non-finite point ({}, {}) in '{}'",
                x, y, self.name
            )));
        }

        let points = self
            .coordinates
            .into_iter()
            .map(|[x, y]| Point::new(x, y))
            .collect();
        let ann = Annotation::new(self.name, points)
            .with_kind(kind)
            .with_color(self.color);
        Ok(match self.group {
            Some(group) => ann.with_group(group),
            None => ann,
        })
    }
}

impl From<&Annotation> for AnnotationEntry {
    fn from(ann: &Annotation) -> Self {
        Self {
            name: ann.name().to_string(),
            kind: ann.kind().name().to_string(),
            group: ann.group().map(str::to_string),
            color: ann.color().to_string(),
            coordinates: ann.coordinates().iter().map(|p| [p.x, p.y]).collect(),
        }
    }
}

/// Serialized group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub color: String,
}

impl From<&AnnotationGroup> for GroupEntry {
    fn from(group: &AnnotationGroup) -> Self {
        Self {
            name: group.name.clone(),
            parent: group.parent.clone(),
            color: group.color.clone(),
        }
    }
}

impl From<GroupEntry> for AnnotationGroup {
    fn from(entry: GroupEntry) -> Self {
        Self {
            name: entry.name,
            parent: entry.parent,
            color: entry.color,
        }
    }
}

/// Native JSON annotation format.
pub struct JsonFormat;

impl AnnotationFormat for JsonFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (JSON)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<AnnotationList, FormatError> {
        let doc: AnnotationDocument = serde_json::from_slice(bytes)?;

        if !AnnotationDocument::is_version_readable(&doc.version) {
            return Err(FormatError::VersionMismatch {
                expected: AnnotationDocument::CURRENT_VERSION.to_string(),
                found: doc.version,
            });
        }
        let newer_minor = matches!(
            AnnotationDocument::parse_version(&doc.version),
            Some((_, minor, _)) if minor > AnnotationDocument::VERSION_MINOR
        );
        if newer_minor {
            log::warn!(
                "Annotation file version {} is newer than {}, unknown fields are ignored",
                doc.version,
                AnnotationDocument::CURRENT_VERSION
            );
        }

        doc.into_list()
    }

    fn encode(&self, list: &AnnotationList) -> Result<Vec<u8>, FormatError> {
        let json = serde_json::to_string_pretty(&AnnotationDocument::from_list(list))?;
        Ok(json.into_bytes())
    }
}
