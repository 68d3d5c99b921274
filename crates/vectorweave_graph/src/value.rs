// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values carried by sockets and stored on nodes.

use crate::globals::{PortalBus, Sequence};
use crate::scene::Shape;
use crate::socket::SocketType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Persisted per-node fields, keyed by field name
pub type Values = IndexMap<String, Value>;

/// 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// The origin
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// RGBA color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f64,
    /// Green
    pub g: f64,
    /// Blue
    pub b: f64,
    /// Alpha
    pub a: f64,
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Fully transparent
    pub const TRANSPARENT: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Opaque color from components
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Linear interpolation per channel
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// `#rrggbb` notation, alpha omitted
    pub fn to_hex(self) -> String {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    /// Parse `#rgb` or `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let parse = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| f64::from(v) / 255.0);
        match digits.len() {
            3 => {
                let mut channels = digits.chars().map(|c| parse(&format!("{c}{c}")));
                Some(Self::rgb(channels.next()??, channels.next()??, channels.next()??))
            }
            6 => Some(Self::rgb(
                parse(digits.get(0..2)?)?,
                parse(digits.get(2..4)?)?,
                parse(digits.get(4..6)?)?,
            )),
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A value flowing through a socket or stored in a node field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// 2D point
    Point(Point),
    /// Color
    Color(Color),
    /// Text
    Text(String),
    /// Homogeneous list (e.g. channel numbers)
    List(Vec<Value>),
    /// Scene subtree
    Shape(Shape),
    /// Polyline
    Path(Vec<Point>),
    /// Iteration range descriptor
    Sequence(Sequence),
    /// Portal bus
    Portal(PortalBus),
}

impl Value {
    /// The socket type this value satisfies
    pub fn socket_type(&self) -> SocketType {
        match self {
            Self::Bool(_) => SocketType::BOOLEAN,
            Self::Int(_) => SocketType::INTEGER,
            Self::Float(_) => SocketType::FLOAT,
            Self::Point(_) => SocketType::POINT,
            Self::Color(_) => SocketType::COLOR,
            Self::Text(_) => SocketType::TEXT,
            Self::List(_) => SocketType::NONE,
            Self::Shape(_) => SocketType::SHAPE,
            Self::Path(_) => SocketType::PATH,
            Self::Sequence(_) => SocketType::SEQUENCE,
            Self::Portal(_) => SocketType::PORTAL,
        }
    }

    /// Numeric view; integers widen, booleans are 0 or 1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view; floats are rounded
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.is_finite() => Some(v.round() as i64),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Boolean view
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Point view
    pub fn as_point(&self) -> Option<Point> {
        match self {
            Self::Point(p) => Some(*p),
            _ => None,
        }
    }

    /// Color view
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List view
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Sequence view
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Portal view
    pub fn as_portal(&self) -> Option<&PortalBus> {
        match self {
            Self::Portal(bus) => Some(bus),
            _ => None,
        }
    }

    /// Take the shape out of this value
    pub fn into_shape(self) -> Option<Shape> {
        match self {
            Self::Shape(shape) => Some(shape),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Self::Point(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Shape> for Value {
    fn from(v: Shape) -> Self {
        Self::Shape(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(2.6).as_i64(), Some(3));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
        assert_eq!(Value::Text("1".into()).as_f64(), None);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::rgb(1.0, 0.0, 0.0).to_hex(), "#ff0000");
        assert_eq!(Color::from_hex("#00ff00"), Some(Color::rgb(0.0, 1.0, 0.0)));
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_lerp() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-9);
        assert_eq!(Point::ORIGIN.lerp(Point::new(10.0, -4.0), 0.25), Point::new(2.5, -1.0));
    }
}
