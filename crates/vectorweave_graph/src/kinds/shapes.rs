// SPDX-License-Identifier: MIT OR Apache-2.0
//! Primitive shapes.
//!
//! Every primitive consults the active filter and renders empty when its
//! values fall below the threshold.

use crate::definition::{NodeDefinition, NodeRef};
use crate::evaluation::EvalError;
use crate::globals::Globals;
use crate::kinds::values;
use crate::node::NodeCategory;
use crate::scene::{Shape, Style};
use crate::socket::SocketType;
use crate::value::{Color, Point, Value, Values};
use std::f64::consts::TAU;

/// Fewest sides a polygon renders with
pub const MIN_POLYGON_SIDES: i64 = 3;

/// Most sides a polygon renders with
pub const MAX_POLYGON_SIDES: i64 = 1000;

crate::socket_keys! {
    /// Output of every shape-producing kind
    pub enum ShapeOutput {
        /// The rendered subtree
        Output = ("output", SocketType::SHAPE),
    }
}

crate::socket_keys! {
    /// Circle inputs
    pub enum CircleInput {
        /// Center point
        Center = ("center", SocketType::POINT),
        /// Radius
        Radius = ("radius", SocketType::NUMBER),
        /// Fill color
        Fill = ("fill", SocketType::COLOR),
        /// Stroke color
        Stroke = ("stroke", SocketType::COLOR),
        /// Stroke width
        StrokeWidth = ("stroke_width", SocketType::NUMBER),
    }
}

crate::socket_keys! {
    /// Rectangle inputs
    pub enum RectangleInput {
        /// Top-left corner
        Origin = ("origin", SocketType::POINT),
        /// Width
        Width = ("width", SocketType::NUMBER),
        /// Height
        Height = ("height", SocketType::NUMBER),
        /// Fill color
        Fill = ("fill", SocketType::COLOR),
        /// Stroke color
        Stroke = ("stroke", SocketType::COLOR),
        /// Stroke width
        StrokeWidth = ("stroke_width", SocketType::NUMBER),
    }
}

crate::socket_keys! {
    /// Regular polygon inputs
    pub enum PolygonInput {
        /// Center point
        Center = ("center", SocketType::POINT),
        /// Circumradius
        Radius = ("radius", SocketType::NUMBER),
        /// Number of sides
        Sides = ("sides", SocketType::NUMBER),
        /// Rotation in degrees
        Rotation = ("rotation", SocketType::NUMBER),
        /// Fill color
        Fill = ("fill", SocketType::COLOR),
        /// Stroke color
        Stroke = ("stroke", SocketType::COLOR),
        /// Stroke width
        StrokeWidth = ("stroke_width", SocketType::NUMBER),
    }
}

fn style_values() -> [(&'static str, Value); 2] {
    [
        ("fill", Value::Color(Color::BLACK)),
        ("stroke_width", Value::Float(0.0)),
    ]
}

fn with_style<const N: usize>(entries: [(&str, Value); N]) -> Values {
    let mut values = values(entries);
    for (key, value) in style_values() {
        values.insert(key.to_string(), value);
    }
    values
}

fn style<D: NodeDefinition>(
    node: &NodeRef<'_, D>,
    fill: D::Input,
    stroke: D::Input,
    stroke_width: D::Input,
    globals: &Globals,
) -> Result<Style, EvalError> {
    Ok(Style {
        fill: node
            .coalesce(fill, "fill", globals)?
            .and_then(|v| v.as_color()),
        stroke: node
            .coalesce(stroke, "stroke", globals)?
            .and_then(|v| v.as_color()),
        stroke_width: node.coalesce_f64(stroke_width, "stroke_width", 0.0, globals)?,
    })
}

/// Circle primitive
pub struct Circle;

impl NodeDefinition for Circle {
    const TYPE: &'static str = "circle";
    const NAME: &'static str = "Circle";
    const CATEGORY: NodeCategory = NodeCategory::Shape;

    type Input = CircleInput;
    type Output = ShapeOutput;

    fn initialize() -> Values {
        with_style([
            ("center", Value::Point(Point::ORIGIN)),
            ("radius", Value::Float(10.0)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                if !node.admitted(globals)? {
                    return Ok(Shape::Empty.into());
                }
                Ok(Shape::Circle {
                    center: node.coalesce_point(CircleInput::Center, "center", Point::ORIGIN, globals)?,
                    radius: node
                        .coalesce_f64(CircleInput::Radius, "radius", 10.0, globals)?
                        .max(0.0),
                    style: style(
                        node,
                        CircleInput::Fill,
                        CircleInput::Stroke,
                        CircleInput::StrokeWidth,
                        globals,
                    )?,
                }
                .into())
            }
        }
    }
}

/// Axis-aligned rectangle primitive
pub struct Rectangle;

impl NodeDefinition for Rectangle {
    const TYPE: &'static str = "rectangle";
    const NAME: &'static str = "Rectangle";
    const CATEGORY: NodeCategory = NodeCategory::Shape;

    type Input = RectangleInput;
    type Output = ShapeOutput;

    fn initialize() -> Values {
        with_style([
            ("origin", Value::Point(Point::ORIGIN)),
            ("width", Value::Float(20.0)),
            ("height", Value::Float(20.0)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                if !node.admitted(globals)? {
                    return Ok(Shape::Empty.into());
                }
                Ok(Shape::Rect {
                    origin: node.coalesce_point(RectangleInput::Origin, "origin", Point::ORIGIN, globals)?,
                    width: node
                        .coalesce_f64(RectangleInput::Width, "width", 20.0, globals)?
                        .max(0.0),
                    height: node
                        .coalesce_f64(RectangleInput::Height, "height", 20.0, globals)?
                        .max(0.0),
                    style: style(
                        node,
                        RectangleInput::Fill,
                        RectangleInput::Stroke,
                        RectangleInput::StrokeWidth,
                        globals,
                    )?,
                }
                .into())
            }
        }
    }
}

/// Regular polygon primitive
pub struct Polygon;

impl Polygon {
    /// Vertices of a regular polygon, first vertex pointing up before rotation
    pub fn vertices(center: Point, radius: f64, sides: i64, rotation_deg: f64) -> Vec<Point> {
        let sides = sides.clamp(MIN_POLYGON_SIDES, MAX_POLYGON_SIDES);
        let offset = rotation_deg.to_radians() - TAU / 4.0;
        (0..sides)
            .map(|k| {
                let angle = offset + TAU * k as f64 / sides as f64;
                Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
            })
            .collect()
    }
}

impl NodeDefinition for Polygon {
    const TYPE: &'static str = "polygon";
    const NAME: &'static str = "Polygon";
    const CATEGORY: NodeCategory = NodeCategory::Shape;

    type Input = PolygonInput;
    type Output = ShapeOutput;

    fn initialize() -> Values {
        with_style([
            ("center", Value::Point(Point::ORIGIN)),
            ("radius", Value::Float(10.0)),
            ("sides", Value::Int(6)),
            ("rotation", Value::Float(0.0)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                if !node.admitted(globals)? {
                    return Ok(Shape::Empty.into());
                }
                let center = node.coalesce_point(PolygonInput::Center, "center", Point::ORIGIN, globals)?;
                let radius = node.coalesce_f64(PolygonInput::Radius, "radius", 10.0, globals)?;
                let sides = node.coalesce_i64(PolygonInput::Sides, "sides", 6, globals)?;
                let rotation = node.coalesce_f64(PolygonInput::Rotation, "rotation", 0.0, globals)?;
                Ok(Shape::Polygon {
                    points: Self::vertices(center, radius.max(0.0), sides, rotation),
                    style: style(
                        node,
                        PolygonInput::Fill,
                        PolygonInput::Stroke,
                        PolygonInput::StrokeWidth,
                        globals,
                    )?,
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Evaluator;
    use crate::globals::FilterData;
    use crate::graph::Graph;
    use crate::kinds::create_default_registry;
    use crate::node::Position;

    #[test]
    fn test_circle_defaults() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();

        let shape = Evaluator::new(&graph, &registry).render(circle, "output");
        assert_eq!(
            shape,
            Shape::Circle {
                center: Point::ORIGIN,
                radius: 10.0,
                style: Style::filled(Color::BLACK),
            }
        );
    }

    #[test]
    fn test_rectangle_uses_local_values() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let rect = graph.add_node(&registry, "rectangle", Position::default()).unwrap();
        graph.set_value(rect, "width", Value::Float(40.0)).unwrap();
        graph.set_value(rect, "height", Value::Int(15)).unwrap();

        match Evaluator::new(&graph, &registry).render(rect, "output") {
            Shape::Rect { width, height, .. } => {
                assert_eq!(width, 40.0);
                assert_eq!(height, 15.0);
            }
            other => panic!("expected rect, got {other:?}"),
        }
    }

    #[test]
    fn test_polygon_vertices() {
        let points = Polygon::vertices(Point::ORIGIN, 1.0, 4, 0.0);
        assert_eq!(points.len(), 4);
        // First vertex points up
        assert!(points[0].x.abs() < 1e-9);
        assert!((points[0].y + 1.0).abs() < 1e-9);

        // Too few sides clamp to a triangle
        assert_eq!(Polygon::vertices(Point::ORIGIN, 1.0, 1, 0.0).len(), 3);
        assert_eq!(
            Polygon::vertices(Point::ORIGIN, 1.0, i64::MAX, 0.0).len() as i64,
            MAX_POLYGON_SIDES
        );
    }

    #[test]
    fn test_polygon_with_huge_side_count() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let polygon = graph.add_node(&registry, "polygon", Position::default()).unwrap();
        graph.set_value(polygon, "sides", Value::Float(1e30)).unwrap();

        match Evaluator::new(&graph, &registry).render(polygon, "output") {
            Shape::Polygon { points, .. } => assert_eq!(points.len() as i64, MAX_POLYGON_SIDES),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_filtered_primitive_renders_empty() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        graph.set_value(circle, "radius", Value::Float(2.0)).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        let globals = Globals::new().with_filter(FilterData {
            discriminator: "radius".to_string(),
            threshold: 5.0,
        });
        let value = eval.get_output(circle, "output", &globals).unwrap();
        assert_eq!(value, Value::Shape(Shape::Empty));
    }

    #[test]
    fn test_filter_reads_linked_radius() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let number = graph.add_node(&registry, "number", Position::default()).unwrap();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        graph.set_value(number, "value", Value::Float(2.0)).unwrap();
        graph.set_value(circle, "radius", Value::Float(10.0)).unwrap();
        graph.connect(&registry, number, "value", circle, "radius").unwrap();

        let eval = Evaluator::new(&graph, &registry);
        let filtered = |threshold| {
            let globals = Globals::new().with_filter(FilterData {
                discriminator: "radius".to_string(),
                threshold,
            });
            eval.get_output(circle, "output", &globals).unwrap()
        };
        assert_eq!(filtered(5.0), Value::Shape(Shape::Empty));
        assert!(matches!(
            filtered(1.0),
            Value::Shape(Shape::Circle { radius, .. }) if radius == 2.0
        ));
    }
}
