// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node kinds.
//!
//! - Shapes: circle, rectangle, polygon
//! - Math: number, point, math, interpolate
//! - Color: color, color mix
//! - Sequence: repeat, array, sequence index
//! - Portal: portal out (broadcaster), portal in (receiver)
//! - Compose: layers, transform, filter, canvas

pub mod color;
pub mod compose;
pub mod math;
pub mod portal;
pub mod sequence;
pub mod shapes;

use crate::definition::NodeRegistry;
use crate::value::{Value, Values};

/// Registry with every built-in node kind
pub fn create_default_registry() -> NodeRegistry {
    NodeRegistry::new()
        .with::<shapes::Circle>()
        .with::<shapes::Rectangle>()
        .with::<shapes::Polygon>()
        .with::<math::Number>()
        .with::<math::PointNode>()
        .with::<math::Math>()
        .with::<math::Interpolate>()
        .with::<color::ColorNode>()
        .with::<color::ColorMix>()
        .with::<sequence::Repeat>()
        .with::<sequence::Array>()
        .with::<sequence::SequenceIndex>()
        .with::<portal::PortalOut>()
        .with::<portal::PortalIn>()
        .with::<compose::Layers>()
        .with::<compose::TransformNode>()
        .with::<compose::Filter>()
        .with::<compose::Canvas>()
}

/// Build a value map from literal entries
pub(crate) fn values<const N: usize>(entries: [(&str, Value); N]) -> Values {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeCategory;

    #[test]
    fn test_default_registry() {
        let registry = create_default_registry();
        assert_eq!(registry.len(), 18);
        assert!(registry.contains("circle"));
        assert!(registry.contains("portal_in"));
        assert_eq!(registry.types_in_category(NodeCategory::Portal).count(), 2);
        assert!(registry.get("layers").and_then(|d| d.variadic()).is_some());
        assert!(registry.get("circle").and_then(|d| d.variadic()).is_none());
    }

    #[test]
    fn test_every_kind_declares_an_output() {
        let registry = create_default_registry();
        for definition in registry.types() {
            assert!(
                !definition.outputs().is_empty(),
                "{} has no outputs",
                definition.type_name()
            );
        }
    }
}
