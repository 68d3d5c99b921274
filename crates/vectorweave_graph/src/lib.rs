// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph engine for `VectorWeave`, a procedural vector-art editor.
//!
//! The crate provides:
//! - A typed node graph with atomic, invariant-checked mutations
//! - Pull-based value resolution ("coalesce") over immutable snapshots
//! - Sequence and portal side channels carried in an explicit context
//! - A reactive store with undo/redo and change subscribers
//! - A library of built-in node kinds producing a vector scene tree
//!
//! ## Architecture
//!
//! Node kinds implement [`NodeDefinition`] and are registered in a
//! [`NodeRegistry`]. A [`Graph`] stores node instances and links; the
//! [`Store`] owns the current snapshot and is the single writer. Rendering
//! runs an [`Evaluator`] over one snapshot, threading [`Globals`] down the
//! pull, and produces a [`Shape`] tree.

pub mod definition;
pub mod document;
pub mod evaluation;
pub mod globals;
pub mod graph;
pub mod history;
pub mod kinds;
pub mod link;
pub mod node;
pub mod scene;
pub mod socket;
pub mod store;
pub mod value;

pub use definition::{DynDefinition, NodeDefinition, NodeRef, NodeRegistry, SocketKey, VariadicSpec};
pub use document::{Document, DocumentError, DOCUMENT_VERSION};
pub use evaluation::{EvalError, Evaluator};
pub use globals::{FilterData, Globals, PortalBus, Sequence};
pub use graph::{Graph, GraphError, Violation};
pub use history::{History, HistoryError};
pub use kinds::create_default_registry;
pub use link::{LinkId, LinkInstance};
pub use node::{NodeCategory, NodeId, NodeInstance, Position, VariadicSockets};
pub use scene::{Shape, Style, Transform};
pub use socket::{LinkType, Socket, SocketDirection, SocketType};
pub use store::{LiveNode, Store, SubscriptionId};
pub use value::{Color, Point, Value, Values};
