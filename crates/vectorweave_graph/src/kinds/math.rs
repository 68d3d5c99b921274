// SPDX-License-Identifier: MIT OR Apache-2.0
//! Numeric and point value nodes.

use crate::definition::{NoSockets, NodeDefinition, NodeRef};
use crate::evaluation::EvalError;
use crate::globals::Globals;
use crate::kinds::values;
use crate::kinds::sequence::sequence_parameter;
use crate::node::NodeCategory;
use crate::socket::SocketType;
use crate::value::{Point, Value, Values};

crate::socket_keys! {
    /// Output of the number node
    pub enum NumberOutput {
        /// The stored number
        Value = ("value", SocketType::NUMBER),
    }
}

/// Constant number
pub struct Number;

impl NodeDefinition for Number {
    const TYPE: &'static str = "number";
    const NAME: &'static str = "Number";
    const CATEGORY: NodeCategory = NodeCategory::Math;

    type Input = NoSockets;
    type Output = NumberOutput;

    fn initialize() -> Values {
        values([("value", Value::Float(0.0))])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: NumberOutput,
        _globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            NumberOutput::Value => Ok(node
                .value("value")
                .filter(|v| v.as_f64().is_some())
                .cloned()
                .unwrap_or(Value::Float(0.0))),
        }
    }
}

crate::socket_keys! {
    /// Point node inputs
    pub enum PointInput {
        /// Horizontal coordinate
        X = ("x", SocketType::NUMBER),
        /// Vertical coordinate
        Y = ("y", SocketType::NUMBER),
    }
}

crate::socket_keys! {
    /// Point node output
    pub enum PointOutput {
        /// The composed point
        Point = ("point", SocketType::POINT),
    }
}

/// Point from two numbers
pub struct PointNode;

impl NodeDefinition for PointNode {
    const TYPE: &'static str = "point";
    const NAME: &'static str = "Point";
    const CATEGORY: NodeCategory = NodeCategory::Math;

    type Input = PointInput;
    type Output = PointOutput;

    fn initialize() -> Values {
        values([("x", Value::Float(0.0)), ("y", Value::Float(0.0))])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: PointOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            PointOutput::Point => {
                let x = node.coalesce_f64(PointInput::X, "x", 0.0, globals)?;
                let y = node.coalesce_f64(PointInput::Y, "y", 0.0, globals)?;
                Ok(Point::new(x, y).into())
            }
        }
    }
}

/// Binary operation of the math node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    /// a + b
    Add,
    /// a - b
    Subtract,
    /// a * b
    Multiply,
    /// a / b, zero when b is zero
    Divide,
    /// Smaller operand
    Min,
    /// Larger operand
    Max,
    /// Euclidean remainder, zero when b is zero
    Modulo,
}

impl MathOp {
    /// Parse the persisted operator name
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "multiply" => Self::Multiply,
            "divide" => Self::Divide,
            "min" => Self::Min,
            "max" => Self::Max,
            "modulo" => Self::Modulo,
            _ => return None,
        })
    }

    /// Apply to two operands
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide if b == 0.0 => 0.0,
            Self::Divide => a / b,
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            Self::Modulo if b == 0.0 => 0.0,
            Self::Modulo => a.rem_euclid(b),
        }
    }
}

crate::socket_keys! {
    /// Math node inputs
    pub enum MathInput {
        /// Left operand
        A = ("a", SocketType::NUMBER),
        /// Right operand
        B = ("b", SocketType::NUMBER),
    }
}

crate::socket_keys! {
    /// Math node output
    pub enum MathOutput {
        /// Result
        Result = ("result", SocketType::NUMBER),
    }
}

/// Binary arithmetic
pub struct Math;

impl NodeDefinition for Math {
    const TYPE: &'static str = "math";
    const NAME: &'static str = "Math";
    const CATEGORY: NodeCategory = NodeCategory::Math;

    type Input = MathInput;
    type Output = MathOutput;

    fn initialize() -> Values {
        values([
            ("a", Value::Float(0.0)),
            ("b", Value::Float(0.0)),
            ("op", Value::from("add")),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: MathOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            MathOutput::Result => {
                let a = node.coalesce_f64(MathInput::A, "a", 0.0, globals)?;
                let b = node.coalesce_f64(MathInput::B, "b", 0.0, globals)?;
                let op = node
                    .value("op")
                    .and_then(Value::as_str)
                    .and_then(MathOp::parse)
                    .unwrap_or(MathOp::Add);
                Ok(Value::Float(op.apply(a, b)))
            }
        }
    }
}

crate::socket_keys! {
    /// Interpolate node inputs
    pub enum InterpolateInput {
        /// Drives the parameter
        Sequence = ("sequence", SocketType::SEQUENCE),
        /// Value at t = 0
        From = ("from", SocketType::NUMBER),
        /// Value at t = 1
        To = ("to", SocketType::NUMBER),
    }
}

crate::socket_keys! {
    /// Interpolate node output
    pub enum InterpolateOutput {
        /// Interpolated number
        Value = ("value", SocketType::NUMBER),
    }
}

/// Linear interpolation driven by a sequence.
///
/// Without a bound sequence the stored `t` is used.
pub struct Interpolate;

impl NodeDefinition for Interpolate {
    const TYPE: &'static str = "interpolate";
    const NAME: &'static str = "Interpolate";
    const CATEGORY: NodeCategory = NodeCategory::Math;

    type Input = InterpolateInput;
    type Output = InterpolateOutput;

    fn initialize() -> Values {
        values([
            ("from", Value::Float(0.0)),
            ("to", Value::Float(1.0)),
            ("t", Value::Float(0.0)),
            ("inclusive", Value::Bool(true)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: InterpolateOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            InterpolateOutput::Value => {
                let from = node.coalesce_f64(InterpolateInput::From, "from", 0.0, globals)?;
                let to = node.coalesce_f64(InterpolateInput::To, "to", 1.0, globals)?;
                let t = sequence_parameter(node, InterpolateInput::Sequence, "t", globals)?;
                Ok(Value::Float(from + (to - from) * t))
            }
        }
    }
}
