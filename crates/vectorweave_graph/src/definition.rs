// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node kind definitions and the registry that dispatches to them.
//!
//! A node kind implements [`NodeDefinition`] once, naming its input and
//! output sockets as [`SocketKey`] enums. Inside `get_output` it reads its
//! fields through a [`NodeRef`], the typed accessor over the resolution
//! primitives of [`Evaluator`]. The [`NodeRegistry`] erases definitions into
//! [`DynDefinition`] objects so the graph and evaluator can dispatch on the
//! node type tag.

use crate::evaluation::{EvalError, Evaluator};
use crate::globals::{Globals, Sequence};
use crate::node::{NodeCategory, NodeId, NodeInstance};
use crate::scene::Shape;
use crate::socket::{Socket, SocketType};
use crate::value::{Color, Point, Value, Values};
use indexmap::IndexMap;
use std::fmt;
use std::marker::PhantomData;

/// Closed set of socket names on one side of a node kind
pub trait SocketKey: Copy + Eq + fmt::Debug + 'static {
    /// Every socket, in declaration order
    const ALL: &'static [Self];

    /// Socket name as stored on instances and links
    fn name(self) -> &'static str;

    /// Types the socket accepts or produces
    fn socket_type(self) -> SocketType;

    /// Look a socket up by name
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }
}

/// Declare a [`SocketKey`] enum.
///
/// ```ignore
/// socket_keys! {
///     /// Circle inputs
///     pub enum CircleInput {
///         /// Radius
///         Radius = ("radius", SocketType::NUMBER),
///     }
/// }
/// ```
#[macro_export]
macro_rules! socket_keys {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = ($socket:literal, $ty:expr)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
        }

        impl $crate::definition::SocketKey for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),*];

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $socket,)*
                }
            }

            fn socket_type(self) -> $crate::socket::SocketType {
                match self {
                    $(Self::$variant => $ty,)*
                }
            }
        }
    };
}

socket_keys! {
    /// Socket set of a node side without sockets
    pub enum NoSockets {}
}

/// Dynamic input sockets of a variadic node kind
#[derive(Debug, Clone, Copy)]
pub struct VariadicSpec {
    /// Name prefix; sockets are named `{prefix}{n}` with `n` from 1
    pub prefix: &'static str,
    /// Type of every dynamic socket
    pub socket_type: SocketType,
    /// Sockets allocated when the node is created
    pub initial_sockets: u32,
    /// Default metadata for the `n`-th allocated socket
    pub metadata: fn(u32) -> Values,
}

/// A node kind: default state plus output computation.
///
/// `get_output` must be a pure function of the graph snapshot and the
/// globals it receives.
pub trait NodeDefinition: Sized + 'static {
    /// Type tag stored on instances
    const TYPE: &'static str;
    /// Display name
    const NAME: &'static str;
    /// Category
    const CATEGORY: NodeCategory;

    /// Declared input sockets
    type Input: SocketKey;
    /// Output sockets
    type Output: SocketKey;

    /// Default persisted values for a new instance
    fn initialize() -> Values {
        Values::new()
    }

    /// Dynamic input sockets, for variadic kinds
    fn variadic() -> Option<VariadicSpec> {
        None
    }

    /// Compute the value of one output socket
    fn get_output(
        node: &NodeRef<'_, Self>,
        output: Self::Output,
        globals: &Globals,
    ) -> Result<Value, EvalError>;
}

/// Typed accessor for one node during an evaluation pass.
///
/// Every helper goes through the single set of resolution primitives on
/// [`Evaluator`]: unlinked sockets read the local value, linked sockets pull
/// from upstream and ignore it.
pub struct NodeRef<'a, D> {
    eval: &'a Evaluator<'a>,
    node: &'a NodeInstance,
    _kind: PhantomData<fn() -> D>,
}

impl<'a, D: NodeDefinition> NodeRef<'a, D> {
    /// Wrap an instance for typed access
    pub fn new(eval: &'a Evaluator<'a>, node: &'a NodeInstance) -> Self {
        Self {
            eval,
            node,
            _kind: PhantomData,
        }
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// The underlying instance
    pub fn instance(&self) -> &'a NodeInstance {
        self.node
    }

    /// The evaluator running this pass
    pub fn evaluator(&self) -> &'a Evaluator<'a> {
        self.eval
    }

    /// Locally stored value
    pub fn value(&self, key: &str) -> Option<&'a Value> {
        self.eval.get_value(self.node, key)
    }

    /// Locally stored number, or `default`
    pub fn value_f64(&self, key: &str, default: f64) -> f64 {
        self.value(key).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Locally stored integer, or `default`
    pub fn value_i64(&self, key: &str, default: i64) -> i64 {
        self.value(key).and_then(Value::as_i64).unwrap_or(default)
    }

    /// Locally stored boolean, or `default`
    pub fn value_bool(&self, key: &str, default: bool) -> bool {
        self.value(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// True if a link occupies `socket`
    pub fn is_linked(&self, socket: D::Input) -> bool {
        self.node.input_link(socket.name()).is_some()
    }

    /// Upstream value on `socket`, `None` when unlinked
    pub fn input(&self, socket: D::Input, globals: &Globals) -> Result<Option<Value>, EvalError> {
        self.eval.get_input(self.node, socket.name(), globals)
    }

    /// Upstream value on a dynamic socket
    pub fn input_named(&self, socket: &str, globals: &Globals) -> Result<Option<Value>, EvalError> {
        self.eval.get_input(self.node, socket, globals)
    }

    /// Linked value if `socket` is connected, else the local value for `key`
    pub fn coalesce(
        &self,
        socket: D::Input,
        key: &str,
        globals: &Globals,
    ) -> Result<Option<Value>, EvalError> {
        self.eval.coalesce(self.node, socket.name(), key, globals)
    }

    /// Coalesced number.
    ///
    /// Falls back to the local value when the upstream yields nothing
    /// numeric, then to `default`.
    pub fn coalesce_f64(
        &self,
        socket: D::Input,
        key: &str,
        default: f64,
        globals: &Globals,
    ) -> Result<f64, EvalError> {
        Ok(self
            .coalesce(socket, key, globals)?
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| self.value_f64(key, default)))
    }

    /// Coalesced integer, with the same fallbacks as [`Self::coalesce_f64`]
    pub fn coalesce_i64(
        &self,
        socket: D::Input,
        key: &str,
        default: i64,
        globals: &Globals,
    ) -> Result<i64, EvalError> {
        Ok(self
            .coalesce(socket, key, globals)?
            .and_then(|v| v.as_i64())
            .unwrap_or_else(|| self.value_i64(key, default)))
    }

    /// Coalesced color
    pub fn coalesce_color(
        &self,
        socket: D::Input,
        key: &str,
        default: Color,
        globals: &Globals,
    ) -> Result<Color, EvalError> {
        Ok(self
            .coalesce(socket, key, globals)?
            .and_then(|v| v.as_color())
            .or_else(|| self.value(key).and_then(Value::as_color))
            .unwrap_or(default))
    }

    /// Coalesced point
    pub fn coalesce_point(
        &self,
        socket: D::Input,
        key: &str,
        default: Point,
        globals: &Globals,
    ) -> Result<Point, EvalError> {
        Ok(self
            .coalesce(socket, key, globals)?
            .and_then(|v| v.as_point())
            .or_else(|| self.value(key).and_then(Value::as_point))
            .unwrap_or(default))
    }

    /// Shape on `socket`; empty when unlinked or not a shape
    pub fn shape(&self, socket: D::Input, globals: &Globals) -> Result<Shape, EvalError> {
        self.shape_named(socket.name(), globals)
    }

    /// Shape on a dynamic socket
    pub fn shape_named(&self, socket: &str, globals: &Globals) -> Result<Shape, EvalError> {
        Ok(self
            .input_named(socket, globals)?
            .and_then(Value::into_shape)
            .unwrap_or_default())
    }

    /// Sequence descriptor on `socket`
    pub fn sequence(&self, socket: D::Input, globals: &Globals) -> Result<Option<Sequence>, EvalError> {
        Ok(self
            .input(socket, globals)?
            .and_then(|v| v.as_sequence().copied()))
    }

    /// False if the active filter rejects this node.
    ///
    /// The discriminator resolves like any other field: through the input
    /// socket of the same name when the kind declares one, else from the
    /// local value.
    pub fn admitted(&self, globals: &Globals) -> Result<bool, EvalError> {
        let Some(filter) = globals.filter() else {
            return Ok(true);
        };
        let key = filter.discriminator.as_str();
        let local = || self.value(key).and_then(Value::as_f64);
        let value = match D::Input::from_name(key) {
            Some(socket) => self
                .coalesce(socket, key, globals)?
                .and_then(|v| v.as_f64())
                .or_else(local),
            None => local(),
        };
        Ok(filter.admits(value))
    }
}

/// Object-safe view of a [`NodeDefinition`]
pub trait DynDefinition: Send + Sync {
    /// Type tag
    fn type_name(&self) -> &'static str;
    /// Display name
    fn display_name(&self) -> &'static str;
    /// Category
    fn category(&self) -> NodeCategory;
    /// Declared input sockets
    fn inputs(&self) -> Vec<Socket>;
    /// Output sockets
    fn outputs(&self) -> Vec<Socket>;
    /// Type of a declared input socket
    fn input_type(&self, name: &str) -> Option<SocketType>;
    /// Type of an output socket
    fn output_type(&self, name: &str) -> Option<SocketType>;
    /// Dynamic socket specification
    fn variadic(&self) -> Option<VariadicSpec>;
    /// Default persisted values
    fn initialize(&self) -> Values;
    /// Compute one output of `node`
    fn get_output(
        &self,
        eval: &Evaluator<'_>,
        node: &NodeInstance,
        socket: &str,
        globals: &Globals,
    ) -> Result<Value, EvalError>;
}

struct Definition<D>(PhantomData<fn() -> D>);

impl<D: NodeDefinition> DynDefinition for Definition<D> {
    fn type_name(&self) -> &'static str {
        D::TYPE
    }

    fn display_name(&self) -> &'static str {
        D::NAME
    }

    fn category(&self) -> NodeCategory {
        D::CATEGORY
    }

    fn inputs(&self) -> Vec<Socket> {
        D::Input::ALL
            .iter()
            .map(|key| Socket::input(key.name(), key.socket_type()))
            .collect()
    }

    fn outputs(&self) -> Vec<Socket> {
        D::Output::ALL
            .iter()
            .map(|key| Socket::output(key.name(), key.socket_type()))
            .collect()
    }

    fn input_type(&self, name: &str) -> Option<SocketType> {
        D::Input::from_name(name).map(SocketKey::socket_type)
    }

    fn output_type(&self, name: &str) -> Option<SocketType> {
        D::Output::from_name(name).map(SocketKey::socket_type)
    }

    fn variadic(&self) -> Option<VariadicSpec> {
        D::variadic()
    }

    fn initialize(&self) -> Values {
        D::initialize()
    }

    fn get_output(
        &self,
        eval: &Evaluator<'_>,
        node: &NodeInstance,
        socket: &str,
        globals: &Globals,
    ) -> Result<Value, EvalError> {
        let output = D::Output::from_name(socket).ok_or_else(|| EvalError::UnknownOutput {
            node_type: D::TYPE.to_string(),
            socket: socket.to_string(),
        })?;
        D::get_output(&NodeRef::new(eval, node), output, globals)
    }
}

/// Registry of available node kinds
#[derive(Default)]
pub struct NodeRegistry {
    /// Registered kinds by type tag
    definitions: IndexMap<&'static str, Box<dyn DynDefinition>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node kind, replacing any kind with the same tag
    pub fn register<D: NodeDefinition>(&mut self) {
        self.definitions
            .insert(D::TYPE, Box::new(Definition::<D>(PhantomData)));
    }

    /// Builder form of [`Self::register`]
    pub fn with<D: NodeDefinition>(mut self) -> Self {
        self.register::<D>();
        self
    }

    /// Get a node kind by type tag
    pub fn get(&self, node_type: &str) -> Option<&dyn DynDefinition> {
        self.definitions.get(node_type).map(|d| d.as_ref())
    }

    /// True if `node_type` is registered
    pub fn contains(&self, node_type: &str) -> bool {
        self.definitions.contains_key(node_type)
    }

    /// Get all registered kinds
    pub fn types(&self) -> impl Iterator<Item = &dyn DynDefinition> {
        self.definitions.values().map(|d| d.as_ref())
    }

    /// Get kinds by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &dyn DynDefinition> {
        self.types().filter(move |d| d.category() == category)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.definitions.keys().collect::<Vec<_>>())
            .finish()
    }
}
