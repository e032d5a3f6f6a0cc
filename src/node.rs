//! Dynamic node representation.
//!
//! A stored document is a tree of [`Node`]s. Leaves are scalars or
//! matrices; inner nodes are sequences (children addressed by position)
//! or mappings (children addressed by key).
//!
//! ## Usage Patterns
//!
//! ### Creating Nodes
//!
//! ```rust
//! use serde_fstorage::{node, Node};
//!
//! let int = Node::from(42);
//! let text = Node::from("hello");
//! let seq = Node::from(vec![1, 2, 3]);
//!
//! let map = node!({
//!     "name": "camera",
//!     "size": [640, 480]
//! });
//! assert!(map.is_map());
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use serde_fstorage::Node;
//! use std::convert::TryFrom;
//!
//! let value = Node::from(42);
//! assert_eq!(value.as_i64(), Some(42));
//! assert_eq!(i64::try_from(value).unwrap(), 42);
//! ```

use crate::{Error, Matrix, NodeMap, Result};
use std::fmt;

/// One element of a stored tree.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Node {
    /// Empty node, written as `~`
    #[default]
    None,
    Int(i64),
    Real(f64),
    Str(String),
    Seq(Vec<Node>),
    Map(NodeMap),
    Mat(Matrix),
}

/// The variant of a [`Node`], for reporting and dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    None,
    Int,
    Real,
    Str,
    Seq,
    Map,
    Mat,
}

impl NodeKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::None => "empty node",
            NodeKind::Int => "integer",
            NodeKind::Real => "real",
            NodeKind::Str => "string",
            NodeKind::Seq => "sequence",
            NodeKind::Map => "mapping",
            NodeKind::Mat => "matrix",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Node {
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Node::None => NodeKind::None,
            Node::Int(_) => NodeKind::Int,
            Node::Real(_) => NodeKind::Real,
            Node::Str(_) => NodeKind::Str,
            Node::Seq(_) => NodeKind::Seq,
            Node::Map(_) => NodeKind::Map,
            Node::Mat(_) => NodeKind::Mat,
        }
    }

    /// `true` for [`Node::None`] and for sequences or mappings without children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Node::None => true,
            Node::Seq(items) => items.is_empty(),
            Node::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// `true` for integers, reals and strings.
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Node::Int(_) | Node::Real(_) | Node::Str(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_seq(&self) -> bool {
        matches!(self, Node::Seq(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Node::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_matrix(&self) -> bool {
        matches!(self, Node::Mat(_))
    }

    /// Number of children of a sequence or mapping (a matrix counts its four
    /// stored fields), 0 otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Node::Seq(items) => items.len(),
            Node::Map(map) => map.len(),
            Node::Mat(m) => m.fields().len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Reals as-is; integers are widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Int(i) => Some(*i as f64),
            Node::Real(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&[Node]> {
        match self {
            Node::Seq(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Node::Mat(m) => Some(m),
            _ => None,
        }
    }

    /// Checks the key character set throughout this subtree.
    pub fn validate_keys(&self) -> Result<()> {
        match self {
            Node::Map(map) => map.validate(),
            Node::Seq(items) => items.iter().try_for_each(Node::validate_keys),
            _ => Ok(()),
        }
    }

    pub(crate) fn mismatch(&self, expected: &str) -> Error {
        Error::type_mismatch(expected, self.kind().name())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::None => write!(f, "~"),
            Node::Int(i) => write!(f, "{}", i),
            Node::Real(v) => write!(f, "{}", v),
            Node::Str(s) => write!(f, "{:?}", s),
            Node::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Node::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Node::Mat(m) => write!(f, "{}", m),
        }
    }
}

impl TryFrom<Node> for i64 {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        node.as_i64().ok_or_else(|| node.mismatch("integer"))
    }
}

impl TryFrom<Node> for f64 {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        node.as_f64().ok_or_else(|| node.mismatch("real"))
    }
}

impl TryFrom<Node> for String {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        match node {
            Node::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}

impl TryFrom<Node> for Matrix {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self> {
        match node {
            Node::Mat(m) => Ok(m),
            other => Err(other.mismatch("matrix")),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Node {
                fn from(value: $t) -> Self {
                    Node::Int(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, usize);

/// Booleans are stored as `0` / `1`.
impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Int(i64::from(value))
    }
}

impl From<f32> for Node {
    fn from(value: f32) -> Self {
        Node::Real(value as f64)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Real(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Str(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Str(value.to_string())
    }
}

impl From<NodeMap> for Node {
    fn from(value: NodeMap) -> Self {
        Node::Map(value)
    }
}

impl From<Matrix> for Node {
    fn from(value: Matrix) -> Self {
        Node::Mat(value)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(value: Vec<T>) -> Self {
        Node::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Depth;

    #[test]
    fn test_tryfrom_i64() {
        assert_eq!(i64::try_from(Node::Int(7)).unwrap(), 7);
        let err = i64::try_from(Node::Str("7".into())).unwrap_err();
        assert!(err.to_string().contains("expected integer, found string"));
    }

    #[test]
    fn test_tryfrom_f64_widens_integers() {
        assert_eq!(f64::try_from(Node::Int(2)).unwrap(), 2.0);
        assert_eq!(f64::try_from(Node::Real(2.5)).unwrap(), 2.5);
        assert!(f64::try_from(Node::None).is_err());
    }

    #[test]
    fn test_tryfrom_matrix() {
        let m = Matrix::zeros(2, 2, Depth::F64);
        assert_eq!(Matrix::try_from(Node::from(m.clone())).unwrap(), m);
        assert!(Matrix::try_from(Node::Seq(vec![])).is_err());
    }

    #[test]
    fn test_is_empty() {
        assert!(Node::None.is_empty());
        assert!(Node::Seq(vec![]).is_empty());
        assert!(Node::Map(NodeMap::new()).is_empty());
        assert!(!Node::Int(0).is_empty());
        assert!(!Node::Str(String::new()).is_empty());
    }

    #[test]
    fn test_from_vec_and_option() {
        assert_eq!(
            Node::from(vec![1, 2]),
            Node::Seq(vec![Node::Int(1), Node::Int(2)])
        );
        assert_eq!(Node::from(None::<i32>), Node::None);
        assert_eq!(Node::from(Some("x")), Node::Str("x".into()));
    }

    #[test]
    fn test_display() {
        let mut map = NodeMap::new();
        map.push("a", vec![1, 2]).unwrap();
        map.push("b", "x").unwrap();
        assert_eq!(Node::Map(map).to_string(), "{a: [1, 2], b: \"x\"}");
    }
}
