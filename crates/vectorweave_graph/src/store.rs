// SPDX-License-Identifier: MIT OR Apache-2.0
//! The single writer of graph state.
//!
//! The store publishes immutable `Arc<Graph>` snapshots. Each mutation runs
//! against a private copy and replaces the snapshot only if it succeeds, so
//! readers never observe a half-applied change. A mutation that would break
//! a graph invariant is a no-op: it is logged at debug level and the
//! snapshot, generation and history stay as they were.

use crate::definition::{NodeDefinition, NodeRef, NodeRegistry};
use crate::evaluation::{EvalError, Evaluator};
use crate::globals::Globals;
use crate::graph::{Graph, GraphError};
use crate::history::{History, HistoryError};
use crate::link::LinkId;
use crate::node::{NodeId, Position};
use crate::scene::Shape;
use crate::value::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Callback invoked with each new snapshot and its generation
pub type Subscriber = Box<dyn FnMut(&Arc<Graph>, u64) + Send>;

/// Handle for removing a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Reactive owner of the graph
pub struct Store {
    registry: Arc<NodeRegistry>,
    graph: Arc<Graph>,
    generation: u64,
    history: History,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Store {
    /// Create a store with an empty graph
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self::with_graph(registry, Graph::new())
    }

    /// Create a store around an existing graph
    pub fn with_graph(registry: Arc<NodeRegistry>, graph: Graph) -> Self {
        Self {
            registry,
            graph: Arc::new(graph),
            generation: 0,
            history: History::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Node kinds
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Current graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Shared handle to the current snapshot
    pub fn snapshot(&self) -> Arc<Graph> {
        Arc::clone(&self.graph)
    }

    /// Incremented on every applied change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Call `callback` after every applied change
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&Arc<Graph>, u64) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber; false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Add a node of a registered type
    pub fn add_node(&mut self, node_type: &str, position: Position) -> Option<NodeId> {
        self.apply("Add node", |graph, registry| {
            graph.add_node(registry, node_type, position)
        })
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, node_id: NodeId) -> bool {
        self.apply("Remove node", |graph, _| graph.remove_node(node_id))
            .is_some()
    }

    /// Link an output socket to an input socket
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_socket: &str,
        to_node: NodeId,
        to_socket: &str,
    ) -> Option<LinkId> {
        self.apply("Connect", |graph, registry| {
            graph.connect(registry, from_node, from_socket, to_node, to_socket)
        })
    }

    /// Remove a link
    pub fn disconnect(&mut self, link_id: LinkId) -> bool {
        self.apply("Disconnect", |graph, _| graph.disconnect(link_id))
            .is_some()
    }

    /// Add a dynamic socket to a variadic node
    pub fn add_socket(&mut self, node_id: NodeId) -> Option<String> {
        self.apply("Add socket", |graph, registry| {
            graph.add_socket(registry, node_id)
        })
    }

    /// Remove a dynamic socket and its link
    pub fn remove_socket(&mut self, node_id: NodeId, socket: &str) -> bool {
        self.apply("Remove socket", |graph, _| graph.remove_socket(node_id, socket))
            .is_some()
    }

    /// Set a persisted node value
    pub fn set_value(&mut self, node_id: NodeId, key: &str, value: Value) -> bool {
        self.apply("Set value", |graph, _| graph.set_value(node_id, key, value))
            .is_some()
    }

    /// Set a metadata field of a dynamic socket
    pub fn set_socket_meta(&mut self, node_id: NodeId, socket: &str, key: &str, value: Value) -> bool {
        self.apply("Set socket metadata", |graph, _| {
            graph.set_socket_meta(node_id, socket, key, value)
        })
        .is_some()
    }

    /// Move a node
    pub fn set_position(&mut self, node_id: NodeId, position: Position) -> bool {
        self.apply("Move node", |graph, _| graph.set_position(node_id, position))
            .is_some()
    }

    /// Open or close a node panel; not recorded in the history
    pub fn set_toggle(&mut self, node_id: NodeId, panel: &str, open: bool) -> bool {
        let mut next = Graph::clone(&self.graph);
        match next.set_toggle(node_id, panel, open) {
            Ok(()) => {
                self.publish(Arc::new(next));
                true
            }
            Err(e) => {
                tracing::debug!("Toggle rejected: {e}");
                false
            }
        }
    }

    /// Undo the last applied change
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let previous = self.history.undo(Arc::clone(&self.graph))?;
        self.publish(previous);
        Ok(())
    }

    /// Redo the last undone change
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let next = self.history.redo(Arc::clone(&self.graph))?;
        self.publish(next);
        Ok(())
    }

    /// Undo/redo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Render one output of the current snapshot
    pub fn render(&self, root: NodeId, socket: &str) -> Shape {
        Evaluator::new(&self.graph, &self.registry).render(root, socket)
    }

    /// Reactive accessor for a node of kind `D`.
    ///
    /// `None` if the node does not exist or is of another kind.
    pub fn accessor<D: NodeDefinition>(&self, node_id: NodeId) -> Option<LiveNode<D>> {
        let node = self.graph.node(node_id)?;
        if node.node_type != D::TYPE {
            return None;
        }
        Some(LiveNode {
            graph: self.snapshot(),
            registry: Arc::clone(&self.registry),
            node_id,
            generation: self.generation,
            _kind: PhantomData,
        })
    }

    fn apply<T>(
        &mut self,
        description: &str,
        mutation: impl FnOnce(&mut Graph, &NodeRegistry) -> Result<T, GraphError>,
    ) -> Option<T> {
        let mut next = Graph::clone(&self.graph);
        match mutation(&mut next, &self.registry) {
            Ok(result) => {
                self.history.record(description, Arc::clone(&self.graph));
                self.publish(Arc::new(next));
                Some(result)
            }
            Err(e) => {
                tracing::debug!(operation = description, "Mutation rejected: {e}");
                None
            }
        }
    }

    fn publish(&mut self, graph: Arc<Graph>) {
        self.graph = graph;
        self.generation += 1;
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.graph, self.generation);
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("generation", &self.generation)
            .field("nodes", &self.graph.node_count())
            .field("links", &self.graph.link_count())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Accessor bound to the snapshot it was taken from.
///
/// Reads are consistent with that snapshot; [`LiveNode::is_stale`] tells a
/// control when to re-read after the store has moved on.
pub struct LiveNode<D> {
    graph: Arc<Graph>,
    registry: Arc<NodeRegistry>,
    node_id: NodeId,
    generation: u64,
    _kind: PhantomData<fn() -> D>,
}

impl<D: NodeDefinition> LiveNode<D> {
    /// Node ID
    pub fn id(&self) -> NodeId {
        self.node_id
    }

    /// Store generation of the snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True if the store has changed since this snapshot
    pub fn is_stale(&self, store: &Store) -> bool {
        store.generation() != self.generation
    }

    /// Re-bind to the store's current snapshot.
    ///
    /// Returns false, leaving this accessor untouched, if the node no longer
    /// exists.
    pub fn refresh(&mut self, store: &Store) -> bool {
        if store.graph().node(self.node_id).is_none() {
            return false;
        }
        self.graph = store.snapshot();
        self.generation = store.generation();
        true
    }

    /// Run `read` against the typed accessor for this snapshot
    pub fn read<R>(&self, read: impl FnOnce(&NodeRef<'_, D>) -> R) -> Option<R> {
        let node = self.graph.node(self.node_id)?;
        let eval = Evaluator::new(&self.graph, &self.registry);
        let node_ref = NodeRef::new(&eval, node);
        Some(read(&node_ref))
    }

    /// Locally stored value
    pub fn value(&self, key: &str) -> Option<Value> {
        self.read(|node| node.value(key).cloned()).flatten()
    }

    /// Coalesced value with fresh globals
    pub fn coalesce(&self, socket: D::Input, key: &str) -> Result<Option<Value>, EvalError> {
        self.read(|node| node.coalesce(socket, key, &Globals::new()))
            .unwrap_or(Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::create_default_registry;
    use crate::kinds::shapes::{Circle, CircleInput};
    use std::sync::Mutex;

    fn store() -> Store {
        Store::new(Arc::new(create_default_registry()))
    }

    #[test]
    fn test_mutation_bumps_generation() {
        let mut store = store();
        assert_eq!(store.generation(), 0);
        let circle = store.add_node("circle", Position::default()).unwrap();
        assert_eq!(store.generation(), 1);
        assert!(store.set_value(circle, "radius", Value::Float(4.0)));
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_rejected_mutation_is_a_no_op() {
        let mut store = store();
        let circle = store.add_node("circle", Position::default()).unwrap();
        let color = store.add_node("color", Position::default()).unwrap();
        let before = store.snapshot();
        let generation = store.generation();
        let depth = store.history().undo_depth();

        assert_eq!(store.connect(color, "color", circle, "radius"), None);
        assert_eq!(store.add_node("spline", Position::default()), None);
        assert!(!store.remove_node(NodeId::new()));

        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.generation(), generation);
        assert_eq!(store.history().undo_depth(), depth);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = store();
        let circle = store.add_node("circle", Position::default()).unwrap();
        let held = store.snapshot();
        store.set_value(circle, "radius", Value::Float(99.0));

        assert_eq!(held.node(circle).unwrap().value("radius"), Some(&Value::Float(10.0)));
        assert_eq!(
            store.graph().node(circle).unwrap().value("radius"),
            Some(&Value::Float(99.0))
        );
    }

    #[test]
    fn test_undo_redo() {
        let mut store = store();
        let circle = store.add_node("circle", Position::default()).unwrap();
        let layers = store.add_node("layers", Position::default()).unwrap();
        let link = store.connect(circle, "output", layers, "socket1").unwrap();

        store.undo().unwrap();
        assert!(store.graph().link(link).is_none());
        assert_eq!(store.history().redo_description(), Some("Connect"));

        store.redo().unwrap();
        assert!(store.graph().link(link).is_some());

        store.undo().unwrap();
        store.undo().unwrap();
        store.undo().unwrap();
        assert_eq!(store.graph().node_count(), 0);
        assert_eq!(store.undo(), Err(HistoryError::NothingToUndo));
    }

    #[test]
    fn test_toggles_skip_history() {
        let mut store = store();
        let circle = store.add_node("circle", Position::default()).unwrap();
        let depth = store.history().undo_depth();

        assert!(store.set_toggle(circle, "style", true));
        assert!(store.graph().toggle(circle, "style"));
        assert_eq!(store.history().undo_depth(), depth);
        assert!(!store.set_toggle(NodeId::new(), "style", true));
    }

    #[test]
    fn test_subscribers() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |graph, generation| {
            sink.lock().unwrap().push((generation, graph.node_count()));
        });

        store.add_node("circle", Position::default());
        store.add_node("spline", Position::default());
        store.add_node("rectangle", Position::default());
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_node("polygon", Position::default());

        assert_eq!(*seen.lock().unwrap(), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_removal_scenario() {
        let mut store = store();
        let circle = store.add_node("circle", Position::default()).unwrap();
        let layers = store.add_node("layers", Position::default()).unwrap();
        store.connect(circle, "output", layers, "socket1").unwrap();

        assert!(store.remove_node(circle));

        let graph = store.graph();
        assert_eq!(graph.node(layers).unwrap().input_link("socket1"), None);
        assert!(graph.links().all(|l| !l.involves_node(circle)));
        assert!(graph.validate(store.registry()).is_empty());
        assert_eq!(store.render(layers, "output"), Shape::Empty);
    }

    #[test]
    fn test_live_node_staleness() {
        let mut store = store();
        let circle = store.add_node("circle", Position::default()).unwrap();
        let number = store.add_node("number", Position::default()).unwrap();

        assert!(store.accessor::<Circle>(number).is_none());
        let mut live = store.accessor::<Circle>(circle).unwrap();
        assert!(!live.is_stale(&store));
        assert_eq!(live.value("radius"), Some(Value::Float(10.0)));

        store.set_value(number, "value", Value::Float(2.5));
        store.connect(number, "value", circle, "radius").unwrap();
        assert!(live.is_stale(&store));
        // Reads stay consistent with the bound snapshot
        assert_eq!(live.coalesce(CircleInput::Radius, "radius"), Ok(Some(Value::Float(10.0))));

        assert!(live.refresh(&store));
        assert!(!live.is_stale(&store));
        assert_eq!(live.coalesce(CircleInput::Radius, "radius"), Ok(Some(Value::Float(2.5))));
        assert_eq!(live.read(|node| node.is_linked(CircleInput::Radius)), Some(true));

        store.remove_node(circle);
        assert!(!live.refresh(&store));
        assert_eq!(live.id(), circle);
    }
}
