//! The root of a stored file.

use crate::{FileNode, Node, NodeMap, Result};

/// A whole storage file: an ordered mapping of top-level keys to nodes.
///
/// # Examples
///
/// ```rust
/// use serde_fstorage::{from_str, to_string, Document};
///
/// let mut doc = Document::new();
/// doc.push("num1", 1).unwrap();
/// doc.push("num2", 2).unwrap();
///
/// let back = from_str(&to_string(&doc).unwrap()).unwrap();
/// assert_eq!(back, doc);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    root: NodeMap,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing mapping after checking every key in it.
    pub fn from_map(root: NodeMap) -> Result<Self> {
        root.validate()?;
        Ok(Document { root })
    }

    pub(crate) fn from_map_unchecked(root: NodeMap) -> Self {
        Document { root }
    }

    /// Appends a top-level entry.
    ///
    /// Fails with a key error if `key`, or any key nested inside `value`,
    /// is malformed, or if `key` is already present. Nothing is inserted on
    /// failure.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Result<()> {
        let value = value.into();
        value.validate_keys()?;
        self.root.push(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    #[must_use]
    pub fn root(&self) -> &NodeMap {
        &self.root
    }

    /// A read view of the root mapping.
    #[must_use]
    pub fn view(&self) -> FileNode<'_> {
        FileNode::from_map(&self.root)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    #[must_use]
    pub fn into_map(self) -> NodeMap {
        self.root
    }
}
