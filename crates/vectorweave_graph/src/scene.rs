// SPDX-License-Identifier: MIT OR Apache-2.0
//! Renderable scene tree produced by evaluating a graph.

use crate::value::{Color, Point};
use serde::{Deserialize, Serialize};

/// Fill and stroke of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Fill color, `None` for no fill
    pub fill: Option<Color>,
    /// Stroke color, `None` for no stroke
    pub stroke: Option<Color>,
    /// Stroke width in user units
    pub stroke_width: f64,
}

impl Style {
    /// Filled, no stroke
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            stroke_width: 0.0,
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::filled(Color::BLACK)
    }
}

/// Affine placement of a group: scale, then rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation
    pub translate: Point,
    /// Rotation in degrees
    pub rotate: f64,
    /// Uniform scale
    pub scale: f64,
}

impl Transform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        translate: Point::ORIGIN,
        rotate: 0.0,
        scale: 1.0,
    };

    /// True if applying this transform changes nothing
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A node of the scene tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Shape {
    /// Nothing to draw
    #[default]
    Empty,
    /// Ordered children sharing a transform and opacity
    Group {
        /// Children, painted in order
        children: Vec<Shape>,
        /// Placement of the group
        transform: Transform,
        /// Group opacity in `0.0..=1.0`
        opacity: f64,
    },
    /// Circle
    Circle {
        /// Center
        center: Point,
        /// Radius
        radius: f64,
        /// Style
        style: Style,
    },
    /// Axis-aligned rectangle
    Rect {
        /// Top-left corner
        origin: Point,
        /// Width
        width: f64,
        /// Height
        height: f64,
        /// Style
        style: Style,
    },
    /// Closed polygon
    Polygon {
        /// Vertices in order
        points: Vec<Point>,
        /// Style
        style: Style,
    },
}

impl Shape {
    /// Group the given children, dropping empty ones.
    ///
    /// An all-empty group collapses to [`Shape::Empty`].
    pub fn group(children: impl IntoIterator<Item = Shape>) -> Self {
        let children: Vec<Shape> = children.into_iter().filter(|c| !c.is_empty()).collect();
        if children.is_empty() {
            return Self::Empty;
        }
        Self::Group {
            children,
            transform: Transform::IDENTITY,
            opacity: 1.0,
        }
    }

    /// Wrap this shape in a transformed group
    pub fn transformed(self, transform: Transform) -> Self {
        if self.is_empty() || transform.is_identity() {
            return self;
        }
        Self::Group {
            children: vec![self],
            transform,
            opacity: 1.0,
        }
    }

    /// True for [`Shape::Empty`] and groups without drawable content
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Group { children, .. } => children.iter().all(Shape::is_empty),
            _ => false,
        }
    }

    /// Number of drawable primitives in this subtree
    pub fn primitive_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Group { children, .. } => children.iter().map(Shape::primitive_count).sum(),
            _ => 1,
        }
    }

    /// Visit every primitive in paint order
    pub fn primitives(&self) -> Vec<&Shape> {
        let mut out = Vec::new();
        self.collect_primitives(&mut out);
        out
    }

    fn collect_primitives<'a>(&'a self, out: &mut Vec<&'a Shape>) {
        match self {
            Self::Empty => {}
            Self::Group { children, .. } => {
                for child in children {
                    child.collect_primitives(out);
                }
            }
            primitive => out.push(primitive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(x: f64) -> Shape {
        Shape::Circle {
            center: Point::new(x, 0.0),
            radius: 1.0,
            style: Style::default(),
        }
    }

    #[test]
    fn test_group_drops_empty_children() {
        let group = Shape::group([Shape::Empty, dot(1.0), Shape::group([])]);
        match &group {
            Shape::Group { children, .. } => assert_eq!(children.len(), 1),
            other => panic!("expected group, got {other:?}"),
        }
        assert!(Shape::group([Shape::Empty]).is_empty());
    }

    #[test]
    fn test_primitives_in_paint_order() {
        let tree = Shape::group([dot(1.0), Shape::group([dot(2.0), dot(3.0)])]);
        assert_eq!(tree.primitive_count(), 3);
        let xs: Vec<f64> = tree
            .primitives()
            .iter()
            .filter_map(|s| match s {
                Shape::Circle { center, .. } => Some(center.x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_identity_transform_is_transparent() {
        assert_eq!(dot(1.0).transformed(Transform::IDENTITY), dot(1.0));
    }
}
