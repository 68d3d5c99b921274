// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composition nodes: layer stacks, transforms, filters and the canvas root.

use crate::definition::{NoSockets, NodeDefinition, NodeRef, VariadicSpec};
use crate::evaluation::EvalError;
use crate::globals::{FilterData, Globals};
use crate::kinds::shapes::ShapeOutput;
use crate::kinds::values;
use crate::node::NodeCategory;
use crate::scene::{Shape, Style, Transform};
use crate::socket::SocketType;
use crate::value::{Color, Point, Value, Values};

/// Default canvas edge length
pub const DEFAULT_CANVAS_SIZE: f64 = 400.0;

fn layer_metadata(n: u32) -> Values {
    values([
        ("label", Value::Text(format!("Layer {n}"))),
        ("visible", Value::Bool(true)),
        ("opacity", Value::Float(1.0)),
    ])
}

/// Ordered stack of shapes, one dynamic socket per layer
pub struct Layers;

impl NodeDefinition for Layers {
    const TYPE: &'static str = "layers";
    const NAME: &'static str = "Layers";
    const CATEGORY: NodeCategory = NodeCategory::Output;

    type Input = NoSockets;
    type Output = ShapeOutput;

    fn variadic() -> Option<VariadicSpec> {
        Some(VariadicSpec {
            prefix: "socket",
            socket_type: SocketType::SHAPE,
            initial_sockets: 2,
            metadata: layer_metadata,
        })
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                let Some(sockets) = node.instance().variadic() else {
                    return Ok(Shape::Empty.into());
                };
                let mut layers = Vec::with_capacity(sockets.len());
                for (socket, meta) in sockets.iter() {
                    if !meta.get("visible").and_then(Value::as_bool).unwrap_or(true) {
                        continue;
                    }
                    let opacity = meta
                        .get("opacity")
                        .and_then(Value::as_f64)
                        .unwrap_or(1.0)
                        .clamp(0.0, 1.0);
                    let shape = node.shape_named(socket, globals)?;
                    if opacity < 1.0 && !shape.is_empty() {
                        layers.push(Shape::Group {
                            children: vec![shape],
                            transform: Transform::IDENTITY,
                            opacity,
                        });
                    } else {
                        layers.push(shape);
                    }
                }
                Ok(Shape::group(layers).into())
            }
        }
    }
}

crate::socket_keys! {
    /// Transform inputs
    pub enum TransformInput {
        /// Shape to place
        Shape = ("shape", SocketType::SHAPE),
        /// Horizontal offset
        X = ("x", SocketType::NUMBER),
        /// Vertical offset
        Y = ("y", SocketType::NUMBER),
        /// Rotation in degrees
        Rotate = ("rotate", SocketType::NUMBER),
        /// Uniform scale
        Scale = ("scale", SocketType::NUMBER),
    }
}

/// Translate, rotate and scale a subtree
pub struct TransformNode;

impl NodeDefinition for TransformNode {
    const TYPE: &'static str = "transform";
    const NAME: &'static str = "Transform";
    const CATEGORY: NodeCategory = NodeCategory::Transform;

    type Input = TransformInput;
    type Output = ShapeOutput;

    fn initialize() -> Values {
        values([
            ("x", Value::Float(0.0)),
            ("y", Value::Float(0.0)),
            ("rotate", Value::Float(0.0)),
            ("scale", Value::Float(1.0)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                let transform = Transform {
                    translate: Point::new(
                        node.coalesce_f64(TransformInput::X, "x", 0.0, globals)?,
                        node.coalesce_f64(TransformInput::Y, "y", 0.0, globals)?,
                    ),
                    rotate: node.coalesce_f64(TransformInput::Rotate, "rotate", 0.0, globals)?,
                    scale: node.coalesce_f64(TransformInput::Scale, "scale", 1.0, globals)?,
                };
                let shape = node.shape(TransformInput::Shape, globals)?;
                Ok(shape.transformed(transform).into())
            }
        }
    }
}

crate::socket_keys! {
    /// Filter inputs
    pub enum FilterInput {
        /// Subtree to filter
        Shape = ("shape", SocketType::SHAPE),
        /// Threshold
        Threshold = ("threshold", SocketType::NUMBER),
    }
}

/// Hides primitives whose `discriminator` value is below `threshold`
pub struct Filter;

impl NodeDefinition for Filter {
    const TYPE: &'static str = "filter";
    const NAME: &'static str = "Filter";
    const CATEGORY: NodeCategory = NodeCategory::Transform;

    type Input = FilterInput;
    type Output = ShapeOutput;

    fn initialize() -> Values {
        values([
            ("discriminator", Value::from("radius")),
            ("threshold", Value::Float(0.0)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                let Some(discriminator) = node.value("discriminator").and_then(Value::as_str) else {
                    return Ok(Value::Shape(node.shape(FilterInput::Shape, globals)?));
                };
                let filter = FilterData {
                    discriminator: discriminator.to_string(),
                    threshold: node.coalesce_f64(FilterInput::Threshold, "threshold", 0.0, globals)?,
                };
                let scoped = globals.with_filter(filter);
                Ok(node.shape(FilterInput::Shape, &scoped)?.into())
            }
        }
    }
}

crate::socket_keys! {
    /// Canvas inputs
    pub enum CanvasInput {
        /// Artwork
        Shape = ("shape", SocketType::SHAPE),
        /// Background fill
        Background = ("background", SocketType::COLOR),
    }
}

/// Document root: artwork over a background rectangle
pub struct Canvas;

impl Canvas {
    /// Canvas dimensions stored on a node
    pub fn size(values: &Values) -> (f64, f64) {
        let dimension = |key: &str| {
            values
                .get(key)
                .and_then(Value::as_f64)
                .filter(|v| *v > 0.0)
                .unwrap_or(DEFAULT_CANVAS_SIZE)
        };
        (dimension("width"), dimension("height"))
    }
}

impl NodeDefinition for Canvas {
    const TYPE: &'static str = "canvas";
    const NAME: &'static str = "Canvas";
    const CATEGORY: NodeCategory = NodeCategory::Output;

    type Input = CanvasInput;
    type Output = ShapeOutput;

    fn initialize() -> Values {
        values([
            ("width", Value::Float(DEFAULT_CANVAS_SIZE)),
            ("height", Value::Float(DEFAULT_CANVAS_SIZE)),
            ("background", Value::Color(Color::WHITE)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ShapeOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ShapeOutput::Output => {
                let (width, height) = Self::size(node.instance().values());
                let background = node.coalesce_color(
                    CanvasInput::Background,
                    "background",
                    Color::WHITE,
                    globals,
                )?;
                let backdrop = Shape::Rect {
                    origin: Point::ORIGIN,
                    width,
                    height,
                    style: Style::filled(background),
                };
                let artwork = node.shape(CanvasInput::Shape, globals)?;
                Ok(Shape::group([backdrop, artwork]).into())
            }
        }
    }
}
