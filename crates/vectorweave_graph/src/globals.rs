// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-pass evaluation context and the side-channel protocols that use it.
//!
//! [`Globals`] is an immutable scope threaded top-down through every
//! `get_output` call. Producers never mutate it; they derive an extended
//! copy for their own subtree:
//!
//! - a sequence producer binds its node id to the index of the instance
//!   being rendered ([`Globals::with_sequence`]),
//! - a portal receiver binds the broadcaster's node id to the channel it
//!   wants rendered ([`Globals::with_portal`]),
//! - a filter binds a [`FilterData`] for leaf primitives to consult.
//!
//! Bindings are keyed by producer node id. The innermost binding for an id
//! shadows outer ones, so nested producers never collide and a re-entered
//! producer sees its own latest index.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

/// Iteration range owned by a producer node.
///
/// The current index is not part of the value; consumers look it up in the
/// [`Globals`] under `sender_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// The producer that binds the current index
    pub sender_id: NodeId,
    /// First index (inclusive)
    pub min: i64,
    /// End index (exclusive)
    pub max: i64,
}

impl Sequence {
    /// Create a new sequence descriptor
    pub fn new(sender_id: NodeId, min: i64, max: i64) -> Self {
        Self { sender_id, min, max }
    }

    /// All indices the producer iterates over
    pub fn indices(&self) -> Range<i64> {
        self.min..self.max
    }

    /// Number of iterations
    pub fn len(&self) -> usize {
        usize::try_from(self.max.saturating_sub(self.min)).unwrap_or(0)
    }

    /// True if the producer renders no instance
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index bound for this sequence in `globals`, if any
    pub fn current(&self, globals: &Globals) -> Option<i64> {
        globals.sequence_index(self.sender_id)
    }

    /// Normalized parameter of `index`.
    ///
    /// `t = (index - min) / (max - min - (inclusive ? 1 : 0))`, and `0.0`
    /// when the denominator is not positive.
    pub fn parameter_at(&self, index: i64, inclusive: bool) -> f64 {
        let span = self.max.saturating_sub(self.min).saturating_sub(i64::from(inclusive));
        if span <= 0 {
            return 0.0;
        }
        index.saturating_sub(self.min) as f64 / span as f64
    }

    /// Normalized parameter of the index bound in `globals`
    pub fn parameter(&self, globals: &Globals, inclusive: bool) -> Option<f64> {
        self.current(globals)
            .map(|index| self.parameter_at(index, inclusive))
    }
}

/// Handle to a broadcasting node, carried over a portal link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalBus {
    /// The broadcaster
    pub sender_id: NodeId,
    /// Output socket on the broadcaster that renders the bound channel
    pub renderer: String,
}

/// Threshold filter applied by leaf primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    /// Value key compared against the threshold
    pub discriminator: String,
    /// Minimum admitted value
    pub threshold: f64,
}

impl FilterData {
    /// True if a node whose discriminator resolves to `value` should render.
    ///
    /// Nodes without a numeric value under the discriminator are admitted.
    pub fn admits(&self, value: Option<f64>) -> bool {
        value.map_or(true, |v| v >= self.threshold)
    }
}

#[derive(Debug, Clone, Copy)]
enum Binding {
    Sequence { producer: NodeId, index: i64 },
    Portal { portal: NodeId, channel: i64 },
}

#[derive(Debug)]
struct Scope {
    binding: Binding,
    parent: Option<Arc<Scope>>,
}

/// Evaluation context for one pass
#[derive(Debug, Clone, Default)]
pub struct Globals {
    scope: Option<Arc<Scope>>,
    filter: Option<Arc<FilterData>>,
}

impl Globals {
    /// Fresh context for a new top-level pass
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the `index`-th instance rendered by `producer`
    pub fn with_sequence(&self, producer: NodeId, index: i64) -> Self {
        self.bind(Binding::Sequence { producer, index })
    }

    /// Context asking the broadcaster `portal` to render `channel`
    pub fn with_portal(&self, portal: NodeId, channel: i64) -> Self {
        self.bind(Binding::Portal { portal, channel })
    }

    /// Context with `filter` replacing any outer filter
    pub fn with_filter(&self, filter: FilterData) -> Self {
        Self {
            scope: self.scope.clone(),
            filter: Some(Arc::new(filter)),
        }
    }

    /// Current index of `producer`'s sequence
    pub fn sequence_index(&self, producer: NodeId) -> Option<i64> {
        self.bindings().find_map(|b| match *b {
            Binding::Sequence { producer: p, index } if p == producer => Some(index),
            _ => None,
        })
    }

    /// Channel requested from the broadcaster `portal`
    pub fn portal_channel(&self, portal: NodeId) -> Option<i64> {
        self.bindings().find_map(|b| match *b {
            Binding::Portal { portal: p, channel } if p == portal => Some(channel),
            _ => None,
        })
    }

    /// Active filter
    pub fn filter(&self) -> Option<&FilterData> {
        self.filter.as_deref()
    }

    fn bind(&self, binding: Binding) -> Self {
        Self {
            scope: Some(Arc::new(Scope {
                binding,
                parent: self.scope.clone(),
            })),
            filter: self.filter.clone(),
        }
    }

    // Innermost binding first
    fn bindings(&self) -> impl Iterator<Item = &Binding> {
        std::iter::successors(self.scope.as_deref(), |s| s.parent.as_deref()).map(|s| &s.binding)
    }
}
