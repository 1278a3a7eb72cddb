//! ASAP XML format implementation.
//!
//! This is the markup encoding used for `*_detections.xml` companion files.
//! One document holds every annotation of a slide plus the group hierarchy:
//!
//! ```xml
//! <ASAP_Annotations>
//!   <Annotations>
//!     <Annotation Name="Annotation 0" Type="Polygon" PartOfGroup="None" Color="#F4FA58">
//!       <Coordinates>
//!         <Coordinate Order="0" X="10.5" Y="20" />
//!       </Coordinates>
//!     </Annotation>
//!   </Annotations>
//!   <AnnotationGroups>
//!     <Group Name="tumor" PartOfGroup="None" Color="#64FE2E"><Attributes /></Group>
//!   </AnnotationGroups>
//! </ASAP_Annotations>
//! ```

use std::collections::HashMap;
use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;
use crate::model::{
    Annotation, AnnotationGroup, AnnotationKind, AnnotationList, DEFAULT_ANNOTATION_COLOR,
    DEFAULT_GROUP_COLOR, Point,
};

const ROOT: &str = "ASAP_Annotations";

/// Value of `PartOfGroup` for ungrouped entries. It cannot be used as a
/// group name, since it would read back as "no group".
const NO_GROUP: &str = "None";

/// Reject group names that collide with the ungrouped marker.
fn check_group_name(name: &str) -> Result<&str, FormatError> {
    if name == NO_GROUP {
        return Err(FormatError::invalid_format(format!(
            "Group name '{}' is reserved for ungrouped entries",
            NO_GROUP
        )));
    }
    Ok(name)
}

/// ASAP XML annotation format.
///
/// Supports every annotation kind, group membership, colors and nested
/// groups. Coordinates are written with shortest round-trip float formatting,
/// so a save/load cycle reproduces them exactly.
pub struct AsapXmlFormat;

impl AnnotationFormat for AsapXmlFormat {
    fn id(&self) -> &'static str {
        "asap"
    }

    fn display_name(&self) -> &'static str {
        "ASAP Annotations (XML)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["xml"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<AnnotationList, FormatError> {
        let content = std::str::from_utf8(bytes)
            .map_err(|_| FormatError::invalid_format("Invalid UTF-8 in XML"))?;
        parse_document(content)
    }

    fn encode(&self, list: &AnnotationList) -> Result<Vec<u8>, FormatError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        start(&mut writer, BytesStart::new(ROOT))?;

        // <Annotations>
        start(&mut writer, BytesStart::new("Annotations"))?;
        for ann in list {
            write_annotation(&mut writer, ann)?;
        }
        end(&mut writer, "Annotations")?;

        // <AnnotationGroups>
        start(&mut writer, BytesStart::new("AnnotationGroups"))?;
        for group in list.groups() {
            let parent = match group.parent.as_deref() {
                Some(parent) => check_group_name(parent)?,
                None => NO_GROUP,
            };
            let elem = BytesStart::new("Group").with_attributes([
                ("Name", check_group_name(&group.name)?),
                ("PartOfGroup", parent),
                ("Color", group.color.as_str()),
            ]);
            start(&mut writer, elem)?;
            writer
                .write_event(Event::Empty(BytesStart::new("Attributes")))
                .map_err(|e| FormatError::Xml(e.into()))?;
            end(&mut writer, "Group")?;
        }
        end(&mut writer, "AnnotationGroups")?;

        end(&mut writer, ROOT)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn start<W: Write>(writer: &mut Writer<W>, elem: BytesStart<'_>) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(elem))
        .map_err(|e| FormatError::Xml(e.into()))
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))
}

fn write_annotation<W: Write>(writer: &mut Writer<W>, ann: &Annotation) -> Result<(), FormatError> {
    let group = match ann.group() {
        Some(group) => check_group_name(group)?,
        None => NO_GROUP,
    };
    let elem = BytesStart::new("Annotation").with_attributes([
        ("Name", ann.name()),
        ("Type", ann.kind().name()),
        ("PartOfGroup", group),
        ("Color", ann.color()),
    ]);
    start(writer, elem)?;

    start(writer, BytesStart::new("Coordinates"))?;
    for (order, point) in ann.coordinates().iter().enumerate() {
        let order = order.to_string();
        let x = point.x.to_string();
        let y = point.y.to_string();
        let coord = BytesStart::new("Coordinate").with_attributes([
            ("Order", order.as_str()),
            ("X", x.as_str()),
            ("Y", y.as_str()),
        ]);
        writer
            .write_event(Event::Empty(coord))
            .map_err(|e| FormatError::Xml(e.into()))?;
    }
    end(writer, "Coordinates")?;

    end(writer, "Annotation")
}

/// Annotation being assembled while its coordinates are read.
struct PendingAnnotation {
    name: String,
    kind: AnnotationKind,
    group: Option<String>,
    color: String,
    coordinates: Vec<(usize, Point)>,
}

impl PendingAnnotation {
    fn finish(mut self) -> Annotation {
        // Stable sort keeps document order for duplicate Order values
        self.coordinates.sort_by_key(|(order, _)| *order);
        let points = self.coordinates.into_iter().map(|(_, p)| p).collect();
        let ann = Annotation::new(self.name, points)
            .with_kind(self.kind)
            .with_color(self.color);
        match self.group {
            Some(group) => ann.with_group(group),
            None => ann,
        }
    }
}

fn parse_document(content: &str) -> Result<AnnotationList, FormatError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut list = AnnotationList::new();
    let mut saw_root = false;
    let mut pending: Option<PendingAnnotation> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    ROOT => saw_root = true,
                    "Annotation" => {
                        if pending.is_some() {
                            return Err(FormatError::invalid_format("Nested <Annotation> element"));
                        }
                        pending = Some(parse_annotation(e)?);
                    }
                    "Coordinate" => push_coordinate(&mut pending, e)?,
                    "Group" => list.push_group(parse_group(e)?),
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    ROOT => saw_root = true,
                    "Annotation" => {
                        if pending.is_some() {
                            return Err(FormatError::invalid_format("Nested <Annotation> element"));
                        }
                        list.push(parse_annotation(e)?.finish());
                    }
                    "Coordinate" => push_coordinate(&mut pending, e)?,
                    "Group" => list.push_group(parse_group(e)?),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"Annotation" {
                    let finished = pending
                        .take()
                        .ok_or_else(|| FormatError::invalid_format("Unmatched </Annotation>"))?;
                    list.push(finished.finish());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FormatError::Xml(e)),
            _ => {}
        }
    }

    if !saw_root {
        return Err(FormatError::missing_field(ROOT));
    }
    if pending.is_some() {
        return Err(FormatError::invalid_format("Unterminated <Annotation> element"));
    }

    Ok(list)
}

/// Collect the attributes of an element into a name -> value map.
fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, FormatError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FormatError::Xml(e.into()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(FormatError::Xml)?.to_string();
        map.insert(key, value);
    }
    Ok(map)
}

fn parse_annotation(e: &BytesStart<'_>) -> Result<PendingAnnotation, FormatError> {
    let attrs = attributes(e)?;

    let name = attrs.get("Name").cloned().unwrap_or_default();
    let kind = match attrs.get("Type") {
        Some(kind) => kind
            .parse::<AnnotationKind>()
            .map_err(FormatError::invalid_format)?,
        None => AnnotationKind::default(),
    };
    let color = attrs
        .get("Color")
        .cloned()
        .unwrap_or_else(|| DEFAULT_ANNOTATION_COLOR.to_string());

    let group = attrs
        .get("PartOfGroup")
        .filter(|g| g.as_str() != NO_GROUP)
        .cloned();

    Ok(PendingAnnotation {
        name,
        kind,
        group,
        color,
        coordinates: Vec::new(),
    })
}

fn push_coordinate(
    pending: &mut Option<PendingAnnotation>,
    e: &BytesStart<'_>,
) -> Result<(), FormatError> {
    let Some(current) = pending.as_mut() else {
        return Err(FormatError::invalid_format(
            "<Coordinate> outside of an <Annotation>",
        ));
    };

    let attrs = attributes(e)?;
    let x = parse_number(&attrs, "X")?;
    let y = parse_number(&attrs, "Y")?;
    let order = match attrs.get("Order") {
        Some(order) => order.trim().parse::<usize>().map_err(|_| {
            FormatError::invalid_coordinates(format!("Invalid Order value '{}'", order))
        })?,
        None => current.coordinates.len(),
    };

    current.coordinates.push((order, Point::new(x, y)));
    Ok(())
}

/// Parse a coordinate value, accepting a comma decimal separator.
fn parse_number(attrs: &HashMap<String, String>, key: &str) -> Result<f64, FormatError> {
    let raw = attrs
        .get(key)
        .ok_or_else(|| FormatError::missing_field(format!("Coordinate@{}", key)))?;
    let value: f64 = raw.trim().replace(',', ".").parse().map_err(|_| {
        FormatError::invalid_coordinates(format!("{} value '{}' is not a number", key, raw))
    })?;
    if !value.is_finite() {
        return Err(FormatError::invalid_coordinates(format!(
            "{} value '{}' is not finite",
            key, raw
        )));
    }
    Ok(value)
}

fn parse_group(e: &BytesStart<'_>) -> Result<AnnotationGroup, FormatError> {
    let attrs = attributes(e)?;
    let name = attrs
        .get("Name")
        .cloned()
        .ok_or_else(|| FormatError::missing_field("Group@Name"))?;

    let mut group = AnnotationGroup::new(name).with_color(
        attrs
            .get("Color")
            .cloned()
            .unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
    );
    if let Some(parent) = attrs.get("PartOfGroup").filter(|g| g.as_str() != NO_GROUP) {
        group = group.with_parent(parent.as_str());
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        let format = AsapXmlFormat;
        assert_eq!(format.id(), "asap");
        assert!(format.extensions().contains(&"xml"));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let result = AsapXmlFormat.decode(b"<Annotations></Annotations>");
        assert!(matches!(result, Err(FormatError::MissingField { .. })));
    }

    #[test]
    fn test_reserved_group_name_rejected_on_encode() {
        let mut list = AnnotationList::new();
        list.push(Annotation::new("a", vec![Point::new(1.0, 2.0)]).with_group(NO_GROUP));
        let result = AsapXmlFormat.encode(&list);
        assert!(matches!(result, Err(FormatError::InvalidFormat { .. })));

        let mut list = AnnotationList::new();
        list.push_group(AnnotationGroup::new(NO_GROUP));
        assert!(AsapXmlFormat.encode(&list).is_err());

        let mut list = AnnotationList::new();
        list.push_group(AnnotationGroup::new("micro").with_parent(NO_GROUP));
        assert!(AsapXmlFormat.encode(&list).is_err());
    }

    #[test]
    fn test_empty_annotation_inside_open_annotation_rejected() {
        let xml = br#"<ASAP_Annotations><Annotations>
            <Annotation Name="outer" Type="Polygon">
                <Annotation Name="inner" Type="Dot"/>
            </Annotation>
        </Annotations></ASAP_Annotations>"#;
        let result = AsapXmlFormat.decode(xml);
        assert!(matches!(result, Err(FormatError::InvalidFormat { .. })));
    }
}
