// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes, links and editor state.
//!
//! Every mutation validates before it touches anything: it either applies
//! completely or returns a [`GraphError`] with the graph unchanged. The
//! bookkeeping invariants are
//!
//! - every link's endpoints exist and name sockets of the right direction,
//! - each link id sits in exactly one `inputs` slot and one `outputs` list,
//! - an input socket holds at most one link.

use crate::definition::NodeRegistry;
use crate::link::{LinkId, LinkInstance};
use crate::node::{NodeId, NodeInstance, Position};
use crate::socket::{LinkType, SocketDirection, SocketType};
use crate::value::{Value, Values};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Panel visibility flags of one node
pub type Toggles = IndexMap<String, bool>;

/// A node graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in the graph
    pub(crate) nodes: IndexMap<NodeId, NodeInstance>,
    /// Links between nodes
    pub(crate) links: IndexMap<LinkId, LinkInstance>,
    /// Editor canvas positions
    #[serde(default)]
    positions: IndexMap<NodeId, Position>,
    /// Editor panel toggles
    #[serde(default)]
    toggles: IndexMap<NodeId, Toggles>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate a registered node kind at `position`
    pub fn add_node(
        &mut self,
        registry: &NodeRegistry,
        node_type: &str,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let definition = registry
            .get(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;

        let id = NodeId::new();
        self.nodes
            .insert(id, NodeInstance::from_definition(id, definition));
        self.positions.insert(id, position);
        Ok(id)
    }

    /// Remove a node, every link touching it, and its editor state
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<NodeInstance, GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }

        let touching: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.involves_node(node_id))
            .map(|l| l.id)
            .collect();
        for link_id in touching {
            if let Some(link) = self.links.shift_remove(&link_id) {
                self.detach(&link);
            }
        }

        self.positions.shift_remove(&node_id);
        self.toggles.shift_remove(&node_id);
        self.nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get nodes of one type, in insertion order
    pub fn nodes_of_type<'g>(&'g self, node_type: &'g str) -> impl Iterator<Item = &'g NodeInstance> {
        self.nodes.values().filter(move |n| n.node_type == node_type)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link an output socket to an input socket
    pub fn connect(
        &mut self,
        registry: &NodeRegistry,
        from_node: NodeId,
        from_socket: &str,
        to_node: NodeId,
        to_socket: &str,
    ) -> Result<LinkId, GraphError> {
        // Validate nodes exist
        let target = self
            .nodes
            .get(&to_node)
            .ok_or(GraphError::NodeNotFound(to_node))?;
        if !self.nodes.contains_key(&from_node) {
            return Err(GraphError::NodeNotFound(from_node));
        }

        // Prevent self-loops
        if from_node == to_node {
            return Err(GraphError::SelfLoop(from_node));
        }

        // Validate sockets exist and types intersect
        let from_type = self
            .socket_type(registry, from_node, from_socket, SocketDirection::Output)
            .ok_or_else(|| GraphError::SocketNotFound {
                node: from_node,
                socket: from_socket.to_string(),
            })?;
        let to_type = self
            .socket_type(registry, to_node, to_socket, SocketDirection::Input)
            .ok_or_else(|| GraphError::SocketNotFound {
                node: to_node,
                socket: to_socket.to_string(),
            })?;
        if !from_type.intersects(to_type) {
            return Err(GraphError::TypeMismatch {
                from: from_type,
                to: to_type,
            });
        }

        // Single writer per input
        if let Some(existing) = target.input_link(to_socket) {
            return Err(GraphError::InputOccupied {
                node: to_node,
                socket: to_socket.to_string(),
                link: existing,
            });
        }

        let link = LinkInstance::new(
            from_node,
            from_socket,
            to_node,
            to_socket,
            LinkType::between(from_type, to_type),
        );
        let id = link.id;

        if let Some(source) = self.nodes.get_mut(&from_node) {
            source
                .outputs
                .entry(from_socket.to_string())
                .or_default()
                .push(id);
        }
        if let Some(target) = self.nodes.get_mut(&to_node) {
            target.inputs.insert(to_socket.to_string(), Some(id));
        }
        self.links.insert(id, link);
        Ok(id)
    }

    /// Remove a link from both endpoints
    pub fn disconnect(&mut self, link_id: LinkId) -> Result<LinkInstance, GraphError> {
        let link = self
            .links
            .shift_remove(&link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?;
        self.detach(&link);
        Ok(link)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&LinkInstance> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &LinkInstance> {
        self.links.values()
    }

    /// Get links involving a node
    pub fn links_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &LinkInstance> {
        self.links.values().filter(move |l| l.involves_node(node_id))
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Register a new dynamic input socket on a variadic node
    pub fn add_socket(&mut self, registry: &NodeRegistry, node_id: NodeId) -> Result<String, GraphError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let spec = registry
            .get(&node.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node.node_type.clone()))?
            .variadic()
            .ok_or(GraphError::NotVariadic(node_id))?;

        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let name = node
            .sockets
            .get_or_insert_with(Default::default)
            .allocate(&spec)
            .ok_or(GraphError::SocketsExhausted(node_id))?;
        node.inputs.insert(name.clone(), None);
        Ok(name)
    }

    /// Remove a dynamic input socket, disconnecting its link.
    ///
    /// Returns the socket's metadata.
    pub fn remove_socket(&mut self, node_id: NodeId, socket: &str) -> Result<Values, GraphError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let registered = node
            .sockets
            .as_ref()
            .ok_or(GraphError::NotVariadic(node_id))?;
        if !registered.contains(socket) {
            return Err(GraphError::SocketNotFound {
                node: node_id,
                socket: socket.to_string(),
            });
        }

        if let Some(link) = node.input_link(socket).and_then(|id| self.links.shift_remove(&id)) {
            self.detach(&link);
        }

        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.inputs.shift_remove(socket);
        node.sockets
            .as_mut()
            .and_then(|s| s.remove(socket))
            .ok_or_else(|| GraphError::SocketNotFound {
                node: node_id,
                socket: socket.to_string(),
            })
    }

    /// Set a persisted value, returning the previous one
    pub fn set_value(
        &mut self,
        node_id: NodeId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        Ok(node.values.insert(key.into(), value))
    }

    /// Set a metadata field of a dynamic socket
    pub fn set_socket_meta(
        &mut self,
        node_id: NodeId,
        socket: &str,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let meta = node
            .sockets
            .as_mut()
            .ok_or(GraphError::NotVariadic(node_id))?
            .meta_mut(socket)
            .ok_or_else(|| GraphError::SocketNotFound {
                node: node_id,
                socket: socket.to_string(),
            })?;
        Ok(meta.insert(key.into(), value))
    }

    /// Editor position of a node
    pub fn position(&self, node_id: NodeId) -> Option<Position> {
        self.positions.get(&node_id).copied()
    }

    /// Move a node
    pub fn set_position(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        self.positions.insert(node_id, position);
        Ok(())
    }

    /// Panel toggle of a node; panels default to closed
    pub fn toggle(&self, node_id: NodeId, panel: &str) -> bool {
        self.toggles
            .get(&node_id)
            .and_then(|t| t.get(panel))
            .copied()
            .unwrap_or(false)
    }

    /// Open or close a panel of a node
    pub fn set_toggle(&mut self, node_id: NodeId, panel: impl Into<String>, open: bool) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        self.toggles
            .entry(node_id)
            .or_default()
            .insert(panel.into(), open);
        Ok(())
    }

    /// Type of a socket on an existing node
    pub fn socket_type(
        &self,
        registry: &NodeRegistry,
        node_id: NodeId,
        socket: &str,
        direction: SocketDirection,
    ) -> Option<SocketType> {
        let node = self.nodes.get(&node_id)?;
        let definition = registry.get(&node.node_type)?;
        match direction {
            SocketDirection::Output => definition.output_type(socket),
            SocketDirection::Input => definition.input_type(socket).or_else(|| {
                node.sockets
                    .as_ref()
                    .filter(|s| s.contains(socket))
                    .and(definition.variadic())
                    .map(|spec| spec.socket_type)
            }),
        }
    }

    /// True if linking `from -> to` would close a cycle.
    ///
    /// Used by the interactive layer to refuse the gesture; [`Self::connect`]
    /// itself does not check this.
    pub fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        // The new link makes `to` depend on `from`; a cycle exists if `from`
        // already depends on `to`.
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(
                self.links
                    .values()
                    .filter(|l| l.to_node == current)
                    .map(|l| l.from_node),
            );
        }
        false
    }

    /// Get nodes in dependency order (upstream first)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError(node_id));
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit all nodes that this node depends on
        for link in self.links.values().filter(|l| l.to_node == node_id) {
            self.visit(link.from_node, visited, temp_mark, order)?;
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }

    /// Check every structural invariant, returning the violations found
    pub fn validate(&self, registry: &NodeRegistry) -> Vec<Violation> {
        let mut violations = Vec::new();

        for link in self.links.values() {
            let (Some(from), Some(to)) = (self.nodes.get(&link.from_node), self.nodes.get(&link.to_node)) else {
                violations.push(Violation::DanglingLink(link.id));
                continue;
            };
            if from.output_links(&link.from_socket).iter().filter(|l| **l == link.id).count() != 1 {
                violations.push(Violation::FanOutMismatch(link.id));
            }
            if to.input_link(&link.to_socket) != Some(link.id) {
                violations.push(Violation::InputMismatch(link.id));
            }
            if self
                .socket_type(registry, link.from_node, &link.from_socket, SocketDirection::Output)
                .is_none()
                || self
                    .socket_type(registry, link.to_node, &link.to_socket, SocketDirection::Input)
                    .is_none()
            {
                violations.push(Violation::UndeclaredSocket(link.id));
            }
        }

        for node in self.nodes.values() {
            if !registry.contains(&node.node_type) {
                violations.push(Violation::UnknownNodeType(node.id));
            }
            for link_id in node.link_ids() {
                if !self.links.contains_key(&link_id) {
                    violations.push(Violation::StaleReference {
                        node: node.id,
                        link: link_id,
                    });
                }
            }
            for socket in node.input_names() {
                if self
                    .socket_type(registry, node.id, socket, SocketDirection::Input)
                    .is_none()
                {
                    violations.push(Violation::UndeclaredInput {
                        node: node.id,
                        socket: socket.to_string(),
                    });
                }
            }
        }

        violations
    }

    // Clear a removed link from whichever endpoints still exist
    fn detach(&mut self, link: &LinkInstance) {
        if let Some(source) = self.nodes.get_mut(&link.from_node) {
            if let Some(fan_out) = source.outputs.get_mut(&link.from_socket) {
                fan_out.retain(|id| *id != link.id);
            }
        }
        if let Some(target) = self.nodes.get_mut(&link.to_node) {
            if let Some(slot) = target.inputs.get_mut(&link.to_socket) {
                if *slot == Some(link.id) {
                    *slot = None;
                }
            }
        }
    }
}

/// Error when mutating a graph; the graph is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Link not found
    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    /// Node type is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Socket not found
    #[error("Socket not found: {node}.{socket}")]
    SocketNotFound {
        /// Node
        node: NodeId,
        /// Socket name
        socket: String,
    },

    /// Node kind has no dynamic sockets
    #[error("Node has no dynamic sockets: {0}")]
    NotVariadic(NodeId),

    /// Dynamic socket names are used up
    #[error("No dynamic socket names left on node: {0}")]
    SocketsExhausted(NodeId),

    /// Input already has a writer
    #[error("Input already connected: {node}.{socket} (link {link})")]
    InputOccupied {
        /// Node
        node: NodeId,
        /// Socket name
        socket: String,
        /// Occupying link
        link: LinkId,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed: {0}")]
    SelfLoop(NodeId),

    /// Socket types do not intersect
    #[error("Incompatible socket types: {from} -> {to}")]
    TypeMismatch {
        /// Output socket type
        from: SocketType,
        /// Input socket type
        to: SocketType,
    },
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle through {0}")]
pub struct CycleError(pub NodeId);

/// A broken structural invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// Link endpoint node missing
    #[error("Link {0} references a missing node")]
    DanglingLink(LinkId),

    /// Link not listed exactly once in its source fan-out
    #[error("Link {0} is not listed exactly once in its source output")]
    FanOutMismatch(LinkId),

    /// Link not occupying its target input
    #[error("Link {0} does not occupy its target input")]
    InputMismatch(LinkId),

    /// Link endpoint socket not declared
    #[error("Link {0} uses an undeclared socket")]
    UndeclaredSocket(LinkId),

    /// Node type not registered
    #[error("Node {0} has an unknown type")]
    UnknownNodeType(NodeId),

    /// Node references a link that does not exist
    #[error("Node {node} references missing link {link}")]
    StaleReference {
        /// Node
        node: NodeId,
        /// Missing link
        link: LinkId,
    },

    /// Input map key that is neither declared nor registered
    #[error("Node {node} has undeclared input {socket:?}")]
    UndeclaredInput {
        /// Node
        node: NodeId,
        /// Socket name
        socket: String,
    },
}
