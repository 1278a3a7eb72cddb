//! Projection of annotation geometry into view space.
//!
//! The transform is a uniform scale by the viewer's scene scale: no rotation,
//! translation or clipping. Projection is pure; attaching the result to a
//! surface is the coordinator's job.

use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationList};

/// Stacking order for detection outlines: above every other scene item.
pub const POLYGON_Z_ORDER: f32 = f32::MAX;

/// Outline style for projected polygons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    /// RGB outline color
    pub color: [u8; 3],
    /// Outline width in view units
    pub line_width: f32,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            line_width: 1.0,
        }
    }
}

/// An unfilled outline in view coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPolygon {
    pub points: Vec<(f32, f32)>,
    pub style: PolygonStyle,
    pub z_order: f32,
}

/// Maps image-space annotations to view-space polygons.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonProjector {
    style: PolygonStyle,
}

impl PolygonProjector {
    pub fn new(style: PolygonStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PolygonStyle {
        self.style
    }

    /// Project a single annotation.
    pub fn project_one(&self, annotation: &Annotation, view_scale: f32) -> ViewPolygon {
        let scale = f64::from(view_scale);
        ViewPolygon {
            points: annotation
                .coordinates()
                .iter()
                .map(|p| ((p.x * scale) as f32, (p.y * scale) as f32))
                .collect(),
            style: self.style,
            z_order: POLYGON_Z_ORDER,
        }
    }

    /// Project every annotation, preserving list order.
    ///
    /// Always yields one outline per annotation, even at a degenerate scale.
    pub fn project(&self, annotations: &AnnotationList, view_scale: f32) -> Vec<ViewPolygon> {
        if !view_scale.is_finite() || view_scale <= 0.0 {
            log::warn!("Projecting annotations at degenerate scene scale {}", view_scale);
        }

        annotations
            .iter()
            .map(|ann| self.project_one(ann, view_scale))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    fn list() -> AnnotationList {
        vec![
            Annotation::new(
                "first",
                vec![Point::new(100.0, 200.0), Point::new(300.0, 200.0), Point::new(300.0, 50.0)],
            ),
            Annotation::new("second", vec![Point::new(8.0, 4.0)]),
            Annotation::new("empty", Vec::new()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_uniform_scale() {
        let polygons = PolygonProjector::default().project(&list(), 0.25);

        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0].points, vec![(25.0, 50.0), (75.0, 50.0), (75.0, 12.5)]);
        assert_eq!(polygons[1].points, vec![(2.0, 1.0)]);
        assert!(polygons[2].points.is_empty());
    }

    #[test]
    fn test_identity_scale_keeps_coordinates() {
        let polygons = PolygonProjector::default().project(&list(), 1.0);
        for (poly, ann) in polygons.iter().zip(list().iter()) {
            assert_eq!(poly.points.len(), ann.len());
            for (&(x, y), p) in poly.points.iter().zip(ann.coordinates()) {
                assert_eq!(x as f64, p.x);
                assert_eq!(y as f64, p.y);
            }
        }
    }

    #[test]
    fn test_style_and_z_order_applied() {
        let style = PolygonStyle {
            color: [0, 255, 0],
            line_width: 2.0,
        };
        let polygons = PolygonProjector::new(style).project(&list(), 2.0);
        assert!(polygons.iter().all(|p| p.style == style));
        assert!(polygons.iter().all(|p| p.z_order == POLYGON_Z_ORDER));
    }

    #[test]
    fn test_degenerate_scale_keeps_one_outline_per_annotation() {
        let projector = PolygonProjector::default();
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let polygons = projector.project(&list(), scale);
            assert_eq!(polygons.len(), 3, "scale {}", scale);
            assert_eq!(polygons[0].points.len(), 3);
        }

        let collapsed = projector.project(&list(), 0.0);
        assert!(collapsed[0].points.iter().all(|&(x, y)| x == 0.0 && y == 0.0));
        let mirrored = projector.project(&list(), -1.0);
        assert_eq!(mirrored[1].points, vec![(-8.0, -4.0)]);
    }
}
