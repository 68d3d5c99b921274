// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pull-based value resolution.
//!
//! Every output is computed on demand: a node kind's `get_output` reads its
//! own fields through [`Evaluator::coalesce`], which either returns the
//! locally stored value or recursively pulls the upstream node's output.
//! Nothing is cached between calls.

use crate::definition::NodeRegistry;
use crate::globals::Globals;
use crate::graph::Graph;
use crate::node::{NodeId, NodeInstance};
use crate::scene::Shape;
use crate::socket::SocketType;
use crate::value::Value;
use std::cell::RefCell;

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// An output was requested while already being computed under the same
    /// portal binding
    #[error("Cycle detected at {node}.{socket}")]
    CycleDetected {
        /// Node re-entered
        node: NodeId,
        /// Output socket re-entered
        socket: String,
        /// Portal channel bound to the node when it was re-entered
        channel: Option<i64>,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node type is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node type has no such output
    #[error("Node type {node_type} has no output {socket:?}")]
    UnknownOutput {
        /// Node type tag
        node_type: String,
        /// Requested socket
        socket: String,
    },
}

/// One evaluation pass over a graph snapshot
pub struct Evaluator<'a> {
    /// The graph being evaluated
    graph: &'a Graph,
    /// Node kinds
    registry: &'a NodeRegistry,
    /// Outputs currently being computed, outermost first
    in_progress: RefCell<Vec<Entry>>,
}

impl<'a> Evaluator<'a> {
    /// Create a new evaluator
    pub fn new(graph: &'a Graph, registry: &'a NodeRegistry) -> Self {
        Self {
            graph,
            registry,
            in_progress: RefCell::new(Vec::new()),
        }
    }

    /// The graph being evaluated
    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    /// Node kinds used for dispatch
    pub fn registry(&self) -> &'a NodeRegistry {
        self.registry
    }

    /// Compute one output of a node.
    ///
    /// Fails with [`EvalError::CycleDetected`] if the same output is already
    /// being computed further up the call stack with the same portal channel
    /// bound to the node. The error unwinds to the frame that was re-entered;
    /// a shape output there renders empty, so only the looping subtree is
    /// lost.
    pub fn get_output(
        &self,
        node_id: NodeId,
        socket: &str,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        let node = self
            .graph
            .node(node_id)
            .ok_or(EvalError::NodeNotFound(node_id))?;
        let definition = self
            .registry
            .get(&node.node_type)
            .ok_or_else(|| EvalError::UnknownNodeType(node.node_type.clone()))?;

        let channel = globals.portal_channel(node_id);
        let result = {
            let _frame = self.enter(Entry {
                node: node_id,
                socket: socket.to_string(),
                channel,
            })?;
            definition.get_output(self, node, socket, globals)
        };

        match result {
            Err(EvalError::CycleDetected {
                node: cycle_node,
                socket: ref cycle_socket,
                channel: cycle_channel,
            }) if cycle_node == node_id
                && *cycle_socket == *socket
                && cycle_channel == channel
                && definition
                    .output_type(socket)
                    .is_some_and(|ty| ty.contains(SocketType::SHAPE)) =>
            {
                tracing::warn!(node = %node_id, socket, ?channel, "Cycle through shape output, rendering it empty");
                Ok(Shape::Empty.into())
            }
            other => other,
        }
    }

    /// Locally stored value of a node
    pub fn get_value<'n>(&self, node: &'n NodeInstance, key: &str) -> Option<&'n Value> {
        node.value(key)
    }

    /// Value arriving on an input socket.
    ///
    /// `None` if the socket is unlinked, or if the link or its upstream node
    /// no longer exists.
    pub fn get_input(
        &self,
        node: &NodeInstance,
        socket: &str,
        globals: &Globals,
    ) -> Result<Option<Value>, EvalError> {
        let Some(link_id) = node.input_link(socket) else {
            return Ok(None);
        };
        let Some(link) = self.graph.link(link_id) else {
            tracing::debug!(node = %node.id, socket, link = %link_id, "input references a missing link");
            return Ok(None);
        };
        if self.graph.node(link.from_node).is_none() {
            tracing::debug!(node = %node.id, socket, upstream = %link.from_node, "input references a missing node");
            return Ok(None);
        }

        self.get_output(link.from_node, &link.from_socket, globals)
            .map(Some)
    }

    /// Linked value if `socket` is connected, else the local value for `key`.
    ///
    /// When linked the local value is ignored, even if the upstream yields
    /// nothing.
    pub fn coalesce(
        &self,
        node: &NodeInstance,
        socket: &str,
        key: &str,
        globals: &Globals,
    ) -> Result<Option<Value>, EvalError> {
        if node.input_link(socket).is_some() {
            self.get_input(node, socket, globals)
        } else {
            Ok(self.get_value(node, key).cloned())
        }
    }

    /// Evaluate one output with fresh globals
    pub fn evaluate(&self, root: NodeId, socket: &str) -> Result<Value, EvalError> {
        self.get_output(root, socket, &Globals::new())
    }

    /// Render one output as a scene tree.
    ///
    /// Errors end the pass and render as an empty shape.
    pub fn render(&self, root: NodeId, socket: &str) -> Shape {
        match self.evaluate(root, socket) {
            Ok(Value::Shape(shape)) => shape,
            Ok(other) => {
                tracing::debug!(node = %root, socket, value = ?other.socket_type(), "root output is not a shape");
                Shape::Empty
            }
            Err(e) => {
                tracing::warn!(node = %root, socket, "Evaluation failed, rendering empty: {e}");
                Shape::Empty
            }
        }
    }

    fn enter(&self, entry: Entry) -> Result<Frame<'_>, EvalError> {
        let mut stack = self.in_progress.borrow_mut();
        if stack.contains(&entry) {
            return Err(EvalError::CycleDetected {
                node: entry.node,
                socket: entry.socket,
                channel: entry.channel,
            });
        }
        stack.push(entry);
        Ok(Frame {
            stack: &self.in_progress,
        })
    }
}

// Sequence bindings are not part of the key: a producer's outputs never
// depend on its own index, so re-entering one is always a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    node: NodeId,
    socket: String,
    channel: Option<i64>,
}

/// Pops its entry from the in-progress stack when dropped
struct Frame<'e> {
    stack: &'e RefCell<Vec<Entry>>,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::create_default_registry;
    use crate::node::Position;

    #[test]
    fn test_coalesce_unlinked_returns_local_value() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        graph.set_value(circle, "radius", Value::Float(7.0)).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        let node = graph.node(circle).unwrap();
        assert_eq!(
            eval.coalesce(node, "radius", "radius", &Globals::new()),
            Ok(eval.get_value(node, "radius").cloned())
        );
        assert_eq!(eval.get_input(node, "radius", &Globals::new()), Ok(None));
    }

    #[test]
    fn test_coalesce_linked_ignores_local_value() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let number = graph.add_node(&registry, "number", Position::default()).unwrap();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        graph.set_value(number, "value", Value::Float(3.0)).unwrap();
        graph.set_value(circle, "radius", Value::Float(7.0)).unwrap();
        graph.connect(&registry, number, "value", circle, "radius").unwrap();

        let eval = Evaluator::new(&graph, &registry);
        let node = graph.node(circle).unwrap();
        let globals = Globals::new();
        assert_eq!(
            eval.coalesce(node, "radius", "radius", &globals),
            eval.get_input(node, "radius", &globals)
        );
        assert_eq!(
            eval.coalesce(node, "radius", "radius", &globals),
            Ok(Some(Value::Float(3.0)))
        );
    }

    #[test]
    fn test_missing_upstream_resolves_to_none() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let number = graph.add_node(&registry, "number", Position::default()).unwrap();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        graph.connect(&registry, number, "value", circle, "radius").unwrap();

        // Simulate the window between node removal and link cleanup
        let mut stale = graph.clone();
        stale.nodes.shift_remove(&number);

        let eval = Evaluator::new(&stale, &registry);
        let node = stale.node(circle).unwrap();
        assert_eq!(eval.get_input(node, "radius", &Globals::new()), Ok(None));
    }

    #[test]
    fn test_cycle_renders_empty() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let a = graph.add_node(&registry, "transform", Position::default()).unwrap();
        let b = graph.add_node(&registry, "transform", Position::default()).unwrap();
        graph.connect(&registry, a, "output", b, "shape").unwrap();
        graph.connect(&registry, b, "output", a, "shape").unwrap();

        // The re-entered shape output closes the loop and renders empty
        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(eval.evaluate(a, "output"), Ok(Value::Shape(Shape::Empty)));
        assert_eq!(eval.render(a, "output"), Shape::Empty);

        // The in-progress stack unwinds after a failed pass
        assert!(eval.in_progress.borrow().is_empty());
    }

    #[test]
    fn test_numeric_cycle_fails_the_pass() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let a = graph.add_node(&registry, "math", Position::default()).unwrap();
        let b = graph.add_node(&registry, "math", Position::default()).unwrap();
        graph.connect(&registry, a, "result", b, "a").unwrap();
        graph.connect(&registry, b, "result", a, "a").unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(
            eval.evaluate(a, "result"),
            Err(EvalError::CycleDetected {
                node: a,
                socket: "result".to_string(),
                channel: None,
            })
        );
        assert!(eval.in_progress.borrow().is_empty());
    }

    #[test]
    fn test_cycle_keeps_rest_of_scene() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let canvas = graph.add_node(&registry, "canvas", Position::default()).unwrap();
        let layers = graph.add_node(&registry, "layers", Position::default()).unwrap();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        let a = graph.add_node(&registry, "transform", Position::default()).unwrap();
        let b = graph.add_node(&registry, "transform", Position::default()).unwrap();
        graph.connect(&registry, layers, "output", canvas, "shape").unwrap();
        graph.connect(&registry, circle, "output", layers, "socket1").unwrap();
        graph.connect(&registry, a, "output", layers, "socket2").unwrap();
        graph.connect(&registry, a, "output", b, "shape").unwrap();
        graph.connect(&registry, b, "output", a, "shape").unwrap();

        // Backdrop and circle survive the looping layer
        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(eval.render(canvas, "output").primitive_count(), 2);
    }

    #[test]
    fn test_same_output_reused_in_siblings() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
        let layers = graph.add_node(&registry, "layers", Position::default()).unwrap();
        graph.connect(&registry, circle, "output", layers, "socket1").unwrap();
        let transform = graph.add_node(&registry, "transform", Position::default()).unwrap();
        graph.connect(&registry, circle, "output", transform, "shape").unwrap();
        graph.connect(&registry, transform, "output", layers, "socket2").unwrap();

        // Diamond, not a cycle
        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(eval.render(layers, "output").primitive_count(), 2);
    }

    #[test]
    fn test_unknown_output() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(
            eval.evaluate(circle, "radius"),
            Err(EvalError::UnknownOutput {
                node_type: "circle".to_string(),
                socket: "radius".to_string(),
            })
        );
        let ghost = NodeId::new();
        assert_eq!(eval.evaluate(ghost, "output"), Err(EvalError::NodeNotFound(ghost)));
    }
}
