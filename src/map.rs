//! Ordered mapping type for storage nodes.
//!
//! [`NodeMap`] wraps an [`IndexMap`] so that children come back in the
//! order they were written, which is what a round trip through a file has
//! to preserve.
//!
//! ## Examples
//!
//! ```rust
//! use serde_fstorage::{Node, NodeMap};
//!
//! let mut map = NodeMap::new();
//! map.push("num1", 1).unwrap();
//! map.push("num2", 2).unwrap();
//!
//! assert!(map.push("num1", 3).is_err());
//! assert!(map.push("num1:", 3).is_err());
//! assert_eq!(map.get("num2"), Some(&Node::Int(2)));
//! ```

use crate::{Error, Node, Result};
use indexmap::IndexMap;

/// Checks that `key` only uses `[A-Za-z0-9_\- ]` and is not empty.
///
/// # Examples
///
/// ```rust
/// use serde_fstorage::validate_key;
///
/// assert!(validate_key("node_0").is_ok());
/// assert!(validate_key("my key-1").is_ok());
/// assert!(validate_key("num1:").is_err());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b' ');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

/// An insertion-ordered map of keys to nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMap(IndexMap<String, Node>);

impl NodeMap {
    #[must_use]
    pub fn new() -> Self {
        NodeMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        NodeMap(IndexMap::with_capacity(capacity))
    }

    /// Appends a child after validating the key.
    ///
    /// Fails with [`Error::InvalidKey`] or [`Error::DuplicateKey`]; the map
    /// is left untouched in both cases.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        if self.0.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.0.insert(key, value.into());
        Ok(())
    }

    /// Inserts without checking the key.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    pub fn insert(&mut self, key: String, value: Node) -> Option<Node> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    /// Returns the entry at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&String, &Node)> {
        self.0.get_index(index)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Node> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Node> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.0.iter()
    }

    /// Checks every key in this map and in all nested mappings.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in self.iter() {
            validate_key(key)?;
            value.validate_keys()?;
        }
        Ok(())
    }
}

impl IntoIterator for NodeMap {
    type Item = (String, Node);
    type IntoIter = indexmap::map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeMap {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Node)> for NodeMap {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        NodeMap(IndexMap::from_iter(iter))
    }
}
