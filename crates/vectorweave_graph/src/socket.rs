// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket types, directions and link-type derivation.
//!
//! Socket types are independent bit flags. A socket may declare a union of
//! flags (`NUMBER` is `FLOAT | INTEGER`), and two sockets are compatible when
//! their flag sets intersect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Set of value kinds a socket accepts or produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketType(u32);

impl SocketType {
    /// No type; never compatible with anything
    pub const NONE: Self = Self(0);
    /// Renderable scene subtree
    pub const SHAPE: Self = Self(1 << 0);
    /// Floating point number
    pub const FLOAT: Self = Self(1 << 1);
    /// Integer number
    pub const INTEGER: Self = Self(1 << 2);
    /// Any number
    pub const NUMBER: Self = Self(Self::FLOAT.0 | Self::INTEGER.0);
    /// RGBA color
    pub const COLOR: Self = Self(1 << 3);
    /// 2D point
    pub const POINT: Self = Self(1 << 4);
    /// Boolean
    pub const BOOLEAN: Self = Self(1 << 5);
    /// Text
    pub const TEXT: Self = Self(1 << 6);
    /// Iteration range descriptor
    pub const SEQUENCE: Self = Self(1 << 7);
    /// Portal bus
    pub const PORTAL: Self = Self(1 << 8);
    /// Polyline geometry
    pub const PATH: Self = Self(1 << 9);

    const NAMES: [(Self, &'static str); 10] = [
        (Self::SHAPE, "shape"),
        (Self::FLOAT, "float"),
        (Self::INTEGER, "integer"),
        (Self::COLOR, "color"),
        (Self::POINT, "point"),
        (Self::BOOLEAN, "boolean"),
        (Self::TEXT, "text"),
        (Self::SEQUENCE, "sequence"),
        (Self::PORTAL, "portal"),
        (Self::PATH, "path"),
    ];

    /// Build from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Union of two flag sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True if the two flag sets share at least one flag
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every flag of `other` is also set here
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no flag is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SocketType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for SocketType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SocketType {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Input socket, at most one incoming link
    Input,
    /// Output socket, fans out to any number of links
    Output,
}

/// Category of a link, derived from its endpoint socket types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Shape to shape
    Shape,
    /// Carries a sequence descriptor
    Sequence,
    /// Carries a portal bus
    Portal,
    /// Path to path
    Path,
    /// Plain value link
    Other,
}

impl LinkType {
    /// Derive the link type from the two endpoint socket types.
    ///
    /// Precedence: both shape, either sequence, either portal, both path,
    /// otherwise other.
    pub fn between(from: SocketType, to: SocketType) -> Self {
        if from.contains(SocketType::SHAPE) && to.contains(SocketType::SHAPE) {
            Self::Shape
        } else if from.intersects(SocketType::SEQUENCE) || to.intersects(SocketType::SEQUENCE) {
            Self::Sequence
        } else if from.intersects(SocketType::PORTAL) || to.intersects(SocketType::PORTAL) {
            Self::Portal
        } else if from.contains(SocketType::PATH) && to.contains(SocketType::PATH) {
            Self::Path
        } else {
            Self::Other
        }
    }
}

/// A declared socket on a node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    /// Socket name, unique per node and direction
    pub name: String,
    /// Direction
    pub direction: SocketDirection,
    /// Accepted or produced types
    pub socket_type: SocketType,
}

impl Socket {
    /// Create a new input socket
    pub fn input(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            name: name.into(),
            direction: SocketDirection::Input,
            socket_type,
        }
    }

    /// Create a new output socket
    pub fn output(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            name: name.into(),
            direction: SocketDirection::Output,
            socket_type,
        }
    }

    /// Check if a link to another socket is valid
    pub fn can_connect(&self, other: &Socket) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        self.socket_type.intersects(other.socket_type)
    }
}
