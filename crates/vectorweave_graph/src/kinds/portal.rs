// SPDX-License-Identifier: MIT OR Apache-2.0
//! Portals: non-local rendezvous by channel number.
//!
//! A broadcaster collects shapes on numbered channel sockets and hands out a
//! [`PortalBus`] naming its own renderer output. A receiver asks that
//! renderer for each of its channels in turn, binding the channel number
//! under the broadcaster's id. The broadcaster draws only the sockets whose
//! channel equals the bound number, so receivers with disjoint channel sets
//! never see each other's content.

use crate::definition::{NoSockets, NodeDefinition, NodeRef, SocketKey, VariadicSpec};
use crate::evaluation::EvalError;
use crate::globals::{Globals, PortalBus};
use crate::kinds::values;
use crate::node::NodeCategory;
use crate::scene::Shape;
use crate::socket::SocketType;
use crate::value::{Value, Values};

/// Metadata key holding a socket's channel number
pub const CHANNEL_KEY: &str = "channel";

crate::socket_keys! {
    /// Broadcaster outputs
    pub enum PortalOutOutput {
        /// Bus handle for receivers
        Portal = ("portal", SocketType::PORTAL),
        /// Channels matching the bound channel number
        Render = ("render", SocketType::SHAPE),
    }
}

fn channel_metadata(n: u32) -> Values {
    values([(CHANNEL_KEY, Value::Int(i64::from(n)))])
}

/// Broadcaster with one shape socket per channel
pub struct PortalOut;

impl NodeDefinition for PortalOut {
    const TYPE: &'static str = "portal_out";
    const NAME: &'static str = "Portal Out";
    const CATEGORY: NodeCategory = NodeCategory::Portal;

    type Input = NoSockets;
    type Output = PortalOutOutput;

    fn variadic() -> Option<VariadicSpec> {
        Some(VariadicSpec {
            prefix: "channel",
            socket_type: SocketType::SHAPE,
            initial_sockets: 1,
            metadata: channel_metadata,
        })
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: PortalOutOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            PortalOutOutput::Portal => Ok(Value::Portal(PortalBus {
                sender_id: node.id(),
                renderer: PortalOutOutput::Render.name().to_string(),
            })),
            PortalOutOutput::Render => {
                let Some(bound) = globals.portal_channel(node.id()) else {
                    return Ok(Shape::Empty.into());
                };
                let Some(sockets) = node.instance().variadic() else {
                    return Ok(Shape::Empty.into());
                };
                let mut shapes = Vec::new();
                for (socket, meta) in sockets.iter() {
                    let channel = meta.get(CHANNEL_KEY).and_then(Value::as_i64);
                    if channel == Some(bound) {
                        shapes.push(node.shape_named(socket, globals)?);
                    }
                }
                Ok(Shape::group(shapes).into())
            }
        }
    }
}

crate::socket_keys! {
    /// Receiver inputs
    pub enum PortalInInput {
        /// Bus from a broadcaster
        Portal = ("portal", SocketType::PORTAL),
    }
}

crate::socket_keys! {
    /// Receiver outputs
    pub enum PortalInOutput {
        /// Content of the requested channels, in order
        Output = ("output", SocketType::SHAPE),
    }
}

/// Receiver drawing a set of broadcaster channels
pub struct PortalIn;

impl PortalIn {
    /// Channel numbers this receiver requests
    pub fn channels(values: &Values) -> Vec<i64> {
        values
            .get("channels")
            .and_then(Value::as_list)
            .map(|list| list.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }
}

impl NodeDefinition for PortalIn {
    const TYPE: &'static str = "portal_in";
    const NAME: &'static str = "Portal In";
    const CATEGORY: NodeCategory = NodeCategory::Portal;

    type Input = PortalInInput;
    type Output = PortalInOutput;

    fn initialize() -> Values {
        values([("channels", Value::List(vec![Value::Int(1)]))])
    }

    fn get_output(
        node: &NodeRef<'_, Self>,
        output: PortalInOutput,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        match output {
            PortalInOutput::Output => {
                let Some(bus) = node
                    .input(PortalInInput::Portal, globals)?
                    .and_then(|v| v.as_portal().cloned())
                else {
                    return Ok(Shape::Empty.into());
                };
                let eval = node.evaluator();
                if eval.graph().node(bus.sender_id).is_none() {
                    tracing::debug!(node = %node.id(), sender = %bus.sender_id, "portal sender no longer exists");
                    return Ok(Shape::Empty.into());
                }

                let mut shapes = Vec::new();
                for channel in Self::channels(node.instance().values()) {
                    let scoped = globals.with_portal(bus.sender_id, channel);
                    let rendered = eval.get_output(bus.sender_id, &bus.renderer, &scoped)?;
                    shapes.extend(rendered.into_shape());
                }
                Ok(Shape::group(shapes).into())
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
    use crate::node::{NodeId, Position};
    use crate::value::Point;

    struct Fixture {
        graph: Graph,
        out: NodeId,
    }

    /// Broadcaster with three channels, each fed by a circle of radius 10 * n
    fn broadcaster() -> Fixture {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let out = graph.add_node(&registry, "portal_out", Position::default()).unwrap();
        graph.add_socket(&registry, out).unwrap();
        graph.add_socket(&registry, out).unwrap();

        for n in 1..=3 {
            let circle = graph.add_node(&registry, "circle", Position::default()).unwrap();
            graph
                .set_value(circle, "radius", Value::Float(10.0 * n as f64))
                .unwrap();
            graph
                .connect(&registry, circle, "output", out, &format!("channel{n}"))
                .unwrap();
        }
        Fixture { graph, out }
    }

    fn receiver(fixture: &mut Fixture, channels: &[i64]) -> NodeId {
        let registry = create_default_registry();
        let graph = &mut fixture.graph;
        let receiver = graph.add_node(&registry, "portal_in", Position::default()).unwrap();
        graph
            .set_value(
                receiver,
                "channels",
                Value::List(channels.iter().map(|&c| Value::Int(c)).collect()),
            )
            .unwrap();
        graph
            .connect(&registry, fixture.out, "portal", receiver, "portal")
            .unwrap();
        receiver
    }

    fn radii(shape: &Shape) -> Vec<f64> {
        shape
            .primitives()
            .into_iter()
            .filter_map(|p| match p {
                Shape::Circle { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_disjoint_receivers_do_not_share_channels() {
        let registry = create_default_registry();
        let mut fixture = broadcaster();
        let first = receiver(&mut fixture, &[1, 3]);
        let second = receiver(&mut fixture, &[2]);

        let eval = Evaluator::new(&fixture.graph, &registry);
        assert_eq!(radii(&eval.render(first, "output")), vec![10.0, 30.0]);
        assert_eq!(radii(&eval.render(second, "output")), vec![20.0]);
    }

    /// Feed a receiver of `channels` back into a new channel of the broadcaster
    fn nested_receiver(fixture: &mut Fixture, channels: &[i64]) -> i64 {
        let registry = create_default_registry();
        let inner = receiver(fixture, channels);
        let socket = fixture.graph.add_socket(&registry, fixture.out).unwrap();
        fixture
            .graph
            .connect(&registry, inner, "output", fixture.out, &socket)
            .unwrap();
        let meta = fixture.graph.node(fixture.out).unwrap().variadic().unwrap().meta(&socket);
        meta.and_then(|m| m.get(CHANNEL_KEY)).and_then(Value::as_i64).unwrap()
    }

    #[test]
    fn test_nested_receiver_on_other_channel() {
        let registry = create_default_registry();
        let mut fixture = broadcaster();
        // Channel 4 re-enters the same broadcaster for channel 2
        let channel = nested_receiver(&mut fixture, &[2]);
        assert_eq!(channel, 4);
        let outer = receiver(&mut fixture, &[4]);

        let eval = Evaluator::new(&fixture.graph, &registry);
        assert_eq!(radii(&eval.render(outer, "output")), vec![20.0]);
    }

    #[test]
    fn test_receiver_of_own_channel_renders_empty() {
        let registry = create_default_registry();
        let mut fixture = broadcaster();
        let channel = nested_receiver(&mut fixture, &[4]);
        let outer = receiver(&mut fixture, &[1, channel]);

        // Channel 4 loops back onto itself; channel 1 still renders
        let eval = Evaluator::new(&fixture.graph, &registry);
        assert_eq!(radii(&eval.render(outer, "output")), vec![10.0]);
    }

    #[test]
    fn test_unknown_channel_renders_empty() {
        let registry = create_default_registry();
        let mut fixture = broadcaster();
        let lonely = receiver(&mut fixture, &[7]);

        let eval = Evaluator::new(&fixture.graph, &registry);
        assert_eq!(eval.render(lonely, "output"), Shape::Empty);
    }

    #[test]
    fn test_unlinked_receiver_renders_empty() {
        let registry = create_default_registry();
        let mut graph = Graph::new();
        let receiver = graph.add_node(&registry, "portal_in", Position::default()).unwrap();

        let eval = Evaluator::new(&graph, &registry);
        assert_eq!(eval.render(receiver, "output"), Shape::Empty);
    }

    #[test]
    fn test_broadcaster_renders_nothing_without_binding() {
        let registry = create_default_registry();
        let fixture = broadcaster();

        let eval = Evaluator::new(&fixture.graph, &registry);
        assert_eq!(eval.render(fixture.out, "render"), Shape::Empty);
        assert_eq!(
            eval.evaluate(fixture.out, "portal"),
            Ok(Value::Portal(PortalBus {
                sender_id: fixture.out,
                renderer: "render".to_string(),
            }))
        );
    }

    #[test]
    fn test_shared_channel_number() {
        let registry = create_default_registry();
        let mut fixture = broadcaster();
        // Retag channel3 as channel 1; receivers of 1 now see both
        fixture
            .graph
            .set_socket_meta(fixture.out, "channel3", CHANNEL_KEY, Value::Int(1))
            .unwrap();
        let first = receiver(&mut fixture, &[1]);

        let eval = Evaluator::new(&fixture.graph, &registry);
        let shape = eval.render(first, "output");
        assert_eq!(radii(&shape), vec![10.0, 30.0]);
        assert!(shape.primitives().iter().all(|p| matches!(
            p,
            Shape::Circle { center, .. } if *center == Point::ORIGIN
        )));
    }
}
