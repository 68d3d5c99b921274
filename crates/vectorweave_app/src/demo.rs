// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo document.
//!
//! The demo builds a canvas with two layers: a row of circles whose radius
//! and color follow an array's sequence, and a portal receiver showing the
//! hexagon broadcast on channel 1.

use crate::error::AppError;
use std::sync::Arc;
use vectorweave_graph::{Color, Document, NodeId, NodeRegistry, Point, Position, Store, Value};

struct Builder {
    store: Store,
}

impl Builder {
    fn node(&mut self, node_type: &str, x: f32, y: f32) -> Result<NodeId, AppError> {
        self.store
            .add_node(node_type, Position::new(x, y))
            .ok_or(AppError::Demo("node kind missing from registry"))
    }

    fn set(&mut self, node: NodeId, key: &str, value: impl Into<Value>) -> Result<(), AppError> {
        if self.store.set_value(node, key, value.into()) {
            Ok(())
        } else {
            Err(AppError::Demo("value rejected"))
        }
    }

    fn link(&mut self, from: NodeId, from_socket: &str, to: NodeId, to_socket: &str) -> Result<(), AppError> {
        self.store
            .connect(from, from_socket, to, to_socket)
            .map(|_| ())
            .ok_or(AppError::Demo("link rejected"))
    }
}

/// Build the demo graph
pub fn build(registry: Arc<NodeRegistry>) -> Result<Document, AppError> {
    let mut b = Builder {
        store: Store::new(registry),
    };

    let canvas = b.node("canvas", 800.0, 200.0)?;
    let layers = b.node("layers", 600.0, 200.0)?;
    b.link(layers, "output", canvas, "shape")?;

    // Layer 1: array of circles driven by the array's sequence
    let array = b.node("array", 400.0, 100.0)?;
    let circle = b.node("circle", 200.0, 100.0)?;
    let radius = b.node("interpolate", 0.0, 50.0)?;
    let tint = b.node("color_mix", 0.0, 150.0)?;
    b.set(array, "count", 8_i64)?;
    b.set(array, "spacing", Point::new(45.0, 0.0))?;
    b.set(circle, "center", Point::new(40.0, 120.0))?;
    b.set(radius, "from", 6.0)?;
    b.set(radius, "to", 20.0)?;
    b.set(tint, "a", Color::rgb(0.15, 0.35, 0.85))?;
    b.set(tint, "b", Color::rgb(0.95, 0.45, 0.2))?;
    b.link(array, "sequence", radius, "sequence")?;
    b.link(array, "sequence", tint, "sequence")?;
    b.link(radius, "value", circle, "radius")?;
    b.link(tint, "color", circle, "fill")?;
    b.link(circle, "output", array, "shape")?;
    b.link(array, "output", layers, "socket1")?;

    // Layer 2: hexagon sent through a portal
    let hexagon = b.node("polygon", 200.0, 300.0)?;
    let portal_out = b.node("portal_out", 400.0, 300.0)?;
    let portal_in = b.node("portal_in", 500.0, 300.0)?;
    b.set(hexagon, "center", Point::new(200.0, 280.0))?;
    b.set(hexagon, "radius", 60.0)?;
    b.set(hexagon, "fill", Color::rgb(0.2, 0.7, 0.4))?;
    b.link(hexagon, "output", portal_out, "channel1")?;
    b.link(portal_out, "portal", portal_in, "portal")?;
    b.link(portal_in, "output", layers, "socket2")?;

    tracing::debug!(
        nodes = b.store.graph().node_count(),
        links = b.store.graph().link_count(),
        "Built demo graph"
    );
    Ok(Document::new(b.store.graph().clone()).with_name("Demo"))
}
