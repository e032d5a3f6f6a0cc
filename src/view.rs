//! Read-only views into a node tree.
//!
//! [`FileNode`] is what lookups return: a cheap, `Copy` handle that can be
//! coerced into a value, indexed further, or iterated. A view may also be
//! *empty* (the node does not exist, or holds nothing), which is what
//! custom record decoders use to fall back to defaults.
//!
//! ## Examples
//!
//! ```rust
//! use serde_fstorage::{node, Document};
//!
//! let mut doc = Document::new();
//! doc.push("seq_node", node!([0, 1, 2])).unwrap();
//! doc.push("map_node", node!({ "node_0": 0, "node_1": 1 })).unwrap();
//!
//! let root = doc.view();
//! let seq: Vec<i64> = root
//!     .get("seq_node").unwrap()
//!     .iter()
//!     .map(|n| n.as_i64().unwrap())
//!     .collect();
//! assert_eq!(seq, vec![0, 1, 2]);
//!
//! let one = root.get("map_node").unwrap().get("node_1").unwrap();
//! assert_eq!(one.as_i64().unwrap(), 1);
//!
//! assert!(root.child("missing").is_empty());
//! ```

use crate::codec::Record;
use crate::{from_node, Error, Matrix, Node, NodeKind, NodeMap, Result};
use serde::de::DeserializeOwned;

#[derive(Clone, Copy, Debug)]
enum Target<'a> {
    Missing,
    Node(&'a Node),
    Root(&'a NodeMap),
}

/// A view of one node in a parsed tree.
#[derive(Clone, Copy, Debug)]
pub struct FileNode<'a> {
    target: Target<'a>,
}

impl<'a> FileNode<'a> {
    #[must_use]
    pub fn new(node: &'a Node) -> Self {
        FileNode {
            target: Target::Node(node),
        }
    }

    /// A view of nothing.
    #[must_use]
    pub const fn empty() -> Self {
        FileNode {
            target: Target::Missing,
        }
    }

    pub(crate) fn from_map(map: &'a NodeMap) -> Self {
        FileNode {
            target: Target::Root(map),
        }
    }

    /// The underlying node, if this view points at one.
    #[must_use]
    pub fn node(&self) -> Option<&'a Node> {
        match self.target {
            Target::Node(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.target {
            Target::Missing => NodeKind::None,
            Target::Node(node) => node.kind(),
            Target::Root(_) => NodeKind::Map,
        }
    }

    /// `true` if the node does not exist, is `~`, or has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.target {
            Target::Missing => true,
            Target::Node(node) => node.is_empty(),
            Target::Root(map) => map.is_empty(),
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self.target, Target::Missing)
    }

    /// Number of children of a sequence or mapping, 0 otherwise. A matrix
    /// reads as the mapping of its `rows`, `cols`, `dt` and `data` fields.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.target {
            Target::Missing => 0,
            Target::Node(node) => node.len(),
            Target::Root(map) => map.len(),
        }
    }

    fn as_map(&self) -> Option<&'a NodeMap> {
        match self.target {
            Target::Root(map) | Target::Node(Node::Map(map)) => Some(map),
            Target::Node(Node::Mat(m)) => Some(m.fields()),
            _ => None,
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::type_mismatch(expected, self.kind().name())
    }

    /// Looks up a child of a mapping by key.
    ///
    /// # Errors
    ///
    /// [`Error::MissingKey`] if the mapping has no such child,
    /// [`Error::TypeMismatch`] if this node is not a mapping.
    pub fn get(&self, key: &str) -> Result<FileNode<'a>> {
        let map = self.as_map().ok_or_else(|| self.mismatch("mapping"))?;
        map.get(key)
            .map(FileNode::new)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    /// Like [`get`](Self::get), but yields an empty view instead of failing.
    #[must_use]
    pub fn child(&self, key: &str) -> FileNode<'a> {
        self.get(key).unwrap_or_else(|_| FileNode::empty())
    }

    /// Looks up a child of a sequence by position.
    ///
    /// # Errors
    ///
    /// [`Error::Index`] if `index` is out of range,
    /// [`Error::TypeMismatch`] if this node is not a sequence.
    pub fn at(&self, index: usize) -> Result<FileNode<'a>> {
        match self.target {
            Target::Node(Node::Seq(items)) => items.get(index).map(FileNode::new).ok_or(Error::Index {
                index,
                len: items.len(),
            }),
            _ => Err(self.mismatch("sequence")),
        }
    }

    /// Iterates over the children in stored order.
    ///
    /// Sequences yield their items and mappings their values; every other
    /// node yields nothing. Each call starts from the first child.
    #[must_use]
    pub fn iter(&self) -> Children<'a> {
        let inner = match self.target {
            Target::Node(Node::Seq(items)) => ChildrenInner::Seq(items.iter()),
            _ => match self.as_map() {
                Some(map) => ChildrenInner::Map(map.values()),
                None => ChildrenInner::Empty,
            },
        };
        Children { inner }
    }

    /// Iterates over `(key, child)` pairs of a mapping in stored order.
    #[must_use]
    pub fn entries(&self) -> Entries<'a> {
        Entries {
            inner: self.as_map().map(NodeMap::iter),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.entries().map(|(key, _)| key)
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self.target {
            Target::Node(Node::Int(i)) => Ok(*i),
            _ => Err(self.mismatch("integer")),
        }
    }

    pub fn as_i32(&self) -> Result<i32> {
        let v = self.as_i64()?;
        i32::try_from(v).map_err(|_| Error::type_mismatch("32-bit integer", &v.to_string()))
    }

    /// Reals, with integers widened.
    pub fn as_f64(&self) -> Result<f64> {
        self.node()
            .and_then(Node::as_f64)
            .ok_or_else(|| self.mismatch("real"))
    }

    pub fn as_str(&self) -> Result<&'a str> {
        self.node()
            .and_then(Node::as_str)
            .ok_or_else(|| self.mismatch("string"))
    }

    pub fn as_matrix(&self) -> Result<&'a Matrix> {
        self.node()
            .and_then(Node::as_matrix)
            .ok_or_else(|| self.mismatch("matrix"))
    }

    pub fn to_matrix(&self) -> Result<Matrix> {
        self.as_matrix().cloned()
    }

    /// Deserializes the node through Serde. A missing view reads as `~`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        match self.target {
            Target::Missing => from_node(&Node::None),
            Target::Node(node) => from_node(node),
            Target::Root(map) => from_node(&Node::Map(map.clone())),
        }
    }

    /// Decodes a user record, returning `default` unchanged when this view
    /// is empty.
    pub fn read_record_or<T: Record>(&self, default: T) -> Result<T> {
        if self.is_empty() {
            Ok(default)
        } else {
            T::decode(*self)
        }
    }
}

impl<'a> IntoIterator for FileNode<'a> {
    type Item = FileNode<'a>;
    type IntoIter = Children<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

enum ChildrenInner<'a> {
    Empty,
    Seq(std::slice::Iter<'a, Node>),
    Map(indexmap::map::Values<'a, String, Node>),
}

/// Iterator over the children of a node, see [`FileNode::iter`].
pub struct Children<'a> {
    inner: ChildrenInner<'a>,
}

impl<'a> Iterator for Children<'a> {
    type Item = FileNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            ChildrenInner::Empty => None,
            ChildrenInner::Seq(it) => it.next().map(FileNode::new),
            ChildrenInner::Map(it) => it.next().map(FileNode::new),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            ChildrenInner::Empty => (0, Some(0)),
            ChildrenInner::Seq(it) => it.size_hint(),
            ChildrenInner::Map(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Iterator over the entries of a mapping, see [`FileNode::entries`].
pub struct Entries<'a> {
    inner: Option<indexmap::map::Iter<'a, String, Node>>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a str, FileNode<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.as_mut()?.next()?;
        Some((key.as_str(), FileNode::new(value)))
    }
}
