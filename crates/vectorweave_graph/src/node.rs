// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances and their socket bookkeeping.

use crate::definition::{DynDefinition, VariadicSpec};
use crate::link::LinkId;
use crate::value::{Value, Values};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Node kind category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Primitive shapes
    Shape,
    /// Shape transforms and compositing
    Transform,
    /// Numbers and points
    Math,
    /// Colors
    Color,
    /// Sequence producers and consumers
    Sequence,
    /// Portal broadcasters and receivers
    Portal,
    /// Document roots
    Output,
}

/// Editor canvas position of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X
    pub x: f32,
    /// Y
    pub y: f32,
}

impl Position {
    /// Create a new position
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Registry of dynamically added input sockets.
///
/// Socket names and per-socket metadata (channel numbers, labels, ...) live
/// in one ordered map, so adding or removing a socket updates both at once.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariadicSockets {
    entries: IndexMap<String, Values>,
    next_index: u32,
}

impl VariadicSockets {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Socket names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Sockets with their metadata, in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Values)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True if `name` is a registered socket
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Metadata of a socket
    pub fn meta(&self, name: &str) -> Option<&Values> {
        self.entries.get(name)
    }

    /// Number of sockets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no socket is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn meta_mut(&mut self, name: &str) -> Option<&mut Values> {
        self.entries.get_mut(name)
    }

    /// Allocate the next socket name and register it.
    ///
    /// `None` once the name counter is exhausted; names are never reused.
    pub(crate) fn allocate(&mut self, spec: &VariadicSpec) -> Option<String> {
        let index = self.next_index.checked_add(1)?;
        self.next_index = index;
        let name = format!("{}{}", spec.prefix, index);
        self.entries.insert(name.clone(), (spec.metadata)(index));
        Some(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Values> {
        self.entries.shift_remove(name)
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Unique instance ID
    pub id: NodeId,
    /// Registered node type tag
    pub node_type: String,
    /// Input socket to occupying link
    pub(crate) inputs: IndexMap<String, Option<LinkId>>,
    /// Output socket to fan-out links
    pub(crate) outputs: IndexMap<String, Vec<LinkId>>,
    /// Persisted type-specific fields
    pub(crate) values: Values,
    /// Dynamic input sockets, for variadic node types only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) sockets: Option<VariadicSockets>,
}

impl NodeInstance {
    /// Create an unlinked instance of a registered node type
    pub(crate) fn from_definition(id: NodeId, definition: &dyn DynDefinition) -> Self {
        let mut inputs: IndexMap<String, Option<LinkId>> = definition
            .inputs()
            .into_iter()
            .map(|socket| (socket.name, None))
            .collect();
        let outputs = definition
            .outputs()
            .into_iter()
            .map(|socket| (socket.name, Vec::new()))
            .collect();

        let sockets = definition.variadic().map(|spec| {
            let mut sockets = VariadicSockets::new();
            for _ in 0..spec.initial_sockets {
                if let Some(name) = sockets.allocate(&spec) {
                    inputs.insert(name, None);
                }
            }
            sockets
        });

        Self {
            id,
            node_type: definition.type_name().to_string(),
            inputs,
            outputs,
            values: definition.initialize(),
            sockets,
        }
    }

    /// Link occupying an input socket
    pub fn input_link(&self, socket: &str) -> Option<LinkId> {
        self.inputs.get(socket).copied().flatten()
    }

    /// Links fanning out of an output socket
    pub fn output_links(&self, socket: &str) -> &[LinkId] {
        self.outputs.get(socket).map(Vec::as_slice).unwrap_or_default()
    }

    /// Input socket names, declared and variadic
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// Output socket names
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// True if `socket` is an input of this instance
    pub fn has_input(&self, socket: &str) -> bool {
        self.inputs.contains_key(socket)
    }

    /// Locally stored value for `key`
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All locally stored values
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Variadic socket registry
    pub fn variadic(&self) -> Option<&VariadicSockets> {
        self.sockets.as_ref()
    }

    /// Every link id referenced by this node
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.inputs
            .values()
            .filter_map(|l| *l)
            .chain(self.outputs.values().flatten().copied())
    }
}
