// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color nodes.

use crate::definition::{NoSockets, NodeDefinition, NodeRef};
use crate::evaluation::EvalError;
use crate::globals::Globals;
use crate::kinds::sequence::sequence_parameter;
use crate::kinds::values;
use crate::node::NodeCategory;
use crate::socket::SocketType;
use crate::value::{Color, Value, Values};

crate::socket_keys! {
    /// Output of color-producing kinds
    pub enum ColorOutput {
        /// The color
        Color = ("color", SocketType::COLOR),
    }
}

/// Constant color
pub struct ColorNode;

impl NodeDefinition for ColorNode {
    const TYPE: &'static str = "color";
    const NAME: &'static str = "Color";
    const CATEGORY: NodeCategory = NodeCategory::Color;

    type Input = NoSockets;
    type Output = ColorOutput;

    fn initialize() -> Values {
        values([("color", Value::Color(Color::BLACK))])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ColorOutput,
        _globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ColorOutput::Color => Ok(node
                .value("color")
                .and_then(Value::as_color)
                .unwrap_or_default()
                .into()),
        }
    }
}

crate::socket_keys! {
    /// Color mix inputs
    pub enum ColorMixInput {
        /// Color at t = 0
        A = ("a", SocketType::COLOR),
        /// Color at t = 1
        B = ("b", SocketType::COLOR),
        /// Drives the mix amount
        Sequence = ("sequence", SocketType::SEQUENCE),
    }
}

/// Blend of two colors.
///
/// The amount comes from the linked sequence when bound, else from the
/// stored `amount`.
pub struct ColorMix;

impl NodeDefinition for ColorMix {
    const TYPE: &'static str = "color_mix";
    const NAME: &'static str = "Color Mix";
    const CATEGORY: NodeCategory = NodeCategory::Color;

    type Input = ColorMixInput;
    type Output = ColorOutput;

    fn initialize() -> Values {
        values([
            ("a", Value::Color(Color::BLACK)),
            ("b", Value::Color(Color::WHITE)),
            ("amount", Value::Float(0.5)),
            ("inclusive", Value::Bool(true)),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ColorOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            ColorOutput::Color => {
                let a = node.coalesce_color(ColorMixInput::A, "a", Color::BLACK, globals)?;
                let b = node.coalesce_color(ColorMixInput::B, "b", Color::WHITE, globals)?;
                let amount = sequence_parameter(node, ColorMixInput::Sequence, "amount", globals)?;
                Ok(a.lerp(b, amount.clamp(0.0, 1.0)).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Evaluator;
    use crate::graph::Graph;
    use crate::kinds::create_default_registry;
    use crate::node::Position;

    #[test]
    fn test_color_mix_halfway() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let mix = graph.add_node(&registry, "color_mix", Position::default()).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(
            eval.evaluate(mix, "color"),
            Ok(Value::Color(Color::rgb(0.5, 0.5, 0.5)))
        );
    }

    #[test]
    fn test_linked_color_overrides_local() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let red = graph.add_node(&registry, "color", Position::default()).unwrap();
        let mix = graph.add_node(&registry, "color_mix", Position::default()).unwrap();
        graph.set_value(red, "color", Value::Color(Color::rgb(1.0, 0.0, 0.0))).unwrap();
        graph.set_value(mix, "amount", Value::Float(0.0)).unwrap();
        graph.connect(&registry, red, "color", mix, "a").unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(
            eval.evaluate(mix, "color"),
            Ok(Value::Color(Color::rgb(1.0, 0.0, 0.0)))
        );
    }
}
