// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence producers and consumers.
//!
//! A producer renders its child once per index, binding the index under its
//! own id in the globals, and emits a [`Sequence`] descriptor so consumers
//! anywhere in the child subtree can look the index up.

use crate::definition::{NodeDefinition, NodeRef};
use crate::evaluation::EvalError;
use crate::globals::{Globals, Sequence};
use crate::kinds::values;
use crate::node::NodeCategory;
use crate::scene::{Shape, Transform};
use crate::socket::SocketType;
use crate::value::{Point, Value, Values};

/// Upper bound on instances a single producer renders
pub const MAX_REPEAT: i64 = 1000;

/// Parameter of the sequence linked on `socket`, else the stored `key`.
///
/// Reads the node's `inclusive` flag to pick the denominator.
pub(crate) fn sequence_parameter<D: NodeDefinition>(
    node: &NodeRef<'_, D>,
    socket: D::Input,
    key: &str,
    globals: &Globals,
) -> Result<f64, EvalError> {
    let inclusive = node.value_bool("inclusive", false);
    let bound = node
        .sequence(socket, globals)?
        .and_then(|seq| seq.parameter(globals, inclusive));
    Ok(bound.unwrap_or_else(|| node.value_f64(key, 0.0)))
}

fn clamp_count(count: i64) -> i64 {
    count.clamp(0, MAX_REPEAT)
}

crate::socket_keys! {
    /// Repeat inputs
    pub enum RepeatInput {
        /// Child rendered per instance
        Shape = ("shape", SocketType::SHAPE),
        /// Instance count
        Count = ("count", SocketType::NUMBER),
    }
}

crate::socket_keys! {
    /// Outputs of sequence producers
    pub enum ProducerOutput {
        /// All instances, grouped
        Output = ("output", SocketType::SHAPE),
        /// Descriptor for consumers in the child subtree
        Sequence = ("sequence", SocketType::SEQUENCE),
    }
}

/// Renders its child `count` times
pub struct Repeat;

impl Repeat {
    fn produce<D: NodeDefinition>(
        node: &NodeRef<'_, D>,
        count: i64,
        output: ProducerOutput,
        child: impl Fn(i64, &Globals) -> Result<Shape, EvalError>,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        let sequence = Sequence::new(node.id(), 0, clamp_count(count));
        match output {
            ProducerOutput::Sequence => Ok(Value::Sequence(sequence)),
            ProducerOutput::Output => {
                let instances = sequence
                    .indices()
                    .map(|i| child(i, &globals.with_sequence(node.id(), i)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Shape::group(instances).into())
            }
        }
    }
}

impl NodeDefinition for Repeat {
    const TYPE: &'static str = "repeat";
    const NAME: &'static str = "Repeat";
    const CATEGORY: NodeCategory = NodeCategory::Sequence;

    type Input = RepeatInput;
    type Output = ProducerOutput;

    fn initialize() -> Values {
        values([("count", Value::Int(3))])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ProducerOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        let count = node.coalesce_i64(RepeatInput::Count, "count", 3, globals)?;
        Self::produce(
            node,
            count,
            output,
            |_, scoped| node.shape(RepeatInput::Shape, scoped),
            globals,
        )
    }
}

crate::socket_keys! {
    /// Array inputs
    pub enum ArrayInput {
        /// Child rendered per instance
        Shape = ("shape", SocketType::SHAPE),
        /// Instance count
        Count = ("count", SocketType::NUMBER),
        /// Offset between consecutive instances
        Spacing = ("spacing", SocketType::POINT),
    }
}

/// Renders its child `count` times, offsetting instance `i` by `i * spacing`
pub struct Array;

impl NodeDefinition for Array {
    const TYPE: &'static str = "array";
    const NAME: &'static str = "Array";
    const CATEGORY: NodeCategory = NodeCategory::Sequence;

    type Input = ArrayInput;
    type Output = ProducerOutput;

    fn initialize() -> Values {
        values([
            ("count", Value::Int(3)),
            ("spacing", Value::Point(Point::new(20.0, 0.0))),
        ])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: ProducerOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        let count = node.coalesce_i64(ArrayInput::Count, "count", 3, globals)?;
        let spacing = node.coalesce_point(ArrayInput::Spacing, "spacing", Point::ORIGIN, globals)?;
        Repeat::produce(
            node,
            count,
            output,
            |i, scoped| {
                let offset = Transform {
                    translate: Point::new(spacing.x * i as f64, spacing.y * i as f64),
                    ..Transform::IDENTITY
                };
                Ok(node.shape(ArrayInput::Shape, scoped)?.transformed(offset))
            },
            globals,
        )
    }
}

crate::socket_keys! {
    /// Sequence index inputs
    pub enum SequenceIndexInput {
        /// Sequence to read
        Sequence = ("sequence", SocketType::SEQUENCE),
    }
}

crate::socket_keys! {
    /// Sequence index outputs
    pub enum SequenceIndexOutput {
        /// Current index
        Index = ("index", SocketType::INTEGER),
        /// Normalized parameter
        T = ("t", SocketType::NUMBER),
    }
}

/// Exposes the current index of a linked sequence
pub struct SequenceIndex;

impl NodeDefinition for SequenceIndex {
    const TYPE: &'static str = "sequence_index";
    const NAME: &'static str = "Sequence Index";
    const CATEGORY: NodeCategory = NodeCategory::Sequence;

    type Input = SequenceIndexInput;
    type Output = SequenceIndexOutput;

    fn initialize() -> Values {
        values([("inclusive", Value::Bool(false))])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: SequenceIndexOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        let sequence = node.sequence(SequenceIndexInput::Sequence, globals)?;
        match output {
            SequenceIndexOutput::Index => Ok(Value::Int(
                sequence.and_then(|seq| seq.current(globals)).unwrap_or(0),
            )),
            SequenceIndexOutput::T => Ok(Value::Float(sequence_parameter(
                node,
                SequenceIndexInput::Sequence,
                "t",
                globals,
            )?)),
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

    /// repeat -> interpolate -> circle.radius, circle -> repeat.shape
    fn radii(count: i64, inclusive: bool) -> Vec<f64> {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let repeat = graph.add_node(&registry, "repeat", Position::default()).unwrap();
        let lerp = graph.add_node(&registry, "interpolate", Position::default()).unwrap();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();

        graph.set_value(repeat, "count", Value::Int(count)).unwrap();
        graph.set_value(lerp, "from", Value::Float(0.0)).unwrap();
        graph.set_value(lerp, "to", Value::Float(1.0)).unwrap();
        graph.set_value(lerp, "inclusive", Value::Bool(inclusive)).unwrap();
        graph.connect(&registry, repeat, "sequence", lerp, "sequence").unwrap();
        graph.connect(&registry, lerp, "value", circle, "radius").unwrap();
        graph.connect(&registry, circle, "output", repeat, "shape").unwrap();

        let shape = Evaluator::new(&graph, &registry).render(repeat, "output");
        shape
            .primitives()
            .into_iter()
            .map(|p| match p {
                Shape::Circle { radius, .. } => *radius,
                other => panic!("expected circle, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_exclusive_sequence_parameters() {
        assert_eq!(radii(4, false), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_inclusive_sequence_spans_unit_interval() {
        assert_eq!(radii(5, true), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_sequence_output_descriptor() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let repeat = graph.add_node(&registry, "repeat", Position::default()).unwrap();
        graph.set_value(repeat, "count", Value::Int(5_000)).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(
            eval.evaluate(repeat, "sequence"),
            Ok(Value::Sequence(Sequence::new(repeat, 0, MAX_REPEAT)))
        );
    }

    #[test]
    fn test_array_offsets_instances() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let array = graph.add_node(&registry, "array", Position::default()).unwrap();
        let rect = graph.add_node(&registry, "rectangle", Position::default()).unwrap();
        graph.set_value(array, "count", Value::Int(2)).unwrap();
        graph.connect(&registry, rect, "output", array, "shape").unwrap();

        let Shape::Group { children, .. } = Evaluator::new(&graph, &registry).render(array, "output")
        else {
            panic!("expected group");
        };
        assert_eq!(children.len(), 2);
        // Instance 0 has the identity offset and is not wrapped
        assert!(matches!(children[0], Shape::Rect { .. }));
        match &children[1] {
            Shape::Group { transform, .. } => {
                assert_eq!(transform.translate, Point::new(20.0, 0.0));
            }
            other => panic!("expected translated group, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_index_outside_producer() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let index = graph.add_node(&registry, "sequence_index", Position::default()).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(eval.evaluate(index, "index"), Ok(Value::Int(0)));
        assert_eq!(eval.evaluate(index, "t"), Ok(Value::Float(0.0)));
    }

    #[test]
    fn test_nested_producers_bind_independently() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let outer = graph.add_node(&registry, "repeat", Position::default()).unwrap();
        let inner = graph.add_node(&registry, "repeat", Position::default()).unwrap();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        graph.set_value(outer, "count", Value::Int(2)).unwrap();
        graph.set_value(inner, "count", Value::Int(3)).unwrap();
        graph.connect(&registry, circle, "output", inner, "shape").unwrap();
        graph.connect(&registry, inner, "output", outer, "shape").unwrap();

        let shape = Evaluator::new(&graph, &registry).render(outer, "output");
        assert_eq!(shape.primitive_count(), 6);
    }
}
