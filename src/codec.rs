//! User-defined record types.
//!
//! A record is stored as a mapping. Types implement [`Record`] to say how
//! they turn into and out of that mapping; a [`CodecRegistry`] additionally
//! lets callers pick a codec by a string tag at runtime, for example when
//! the tag itself comes from a configuration file.
//!
//! ## Examples
//!
//! ```rust
//! use serde_fstorage::{FileNode, NodeMap, Record, Result};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Record for Point {
//!     fn encode(&self) -> Result<NodeMap> {
//!         let mut map = NodeMap::new();
//!         map.push("x", self.x)?;
//!         map.push("y", self.y)?;
//!         Ok(map)
//!     }
//!
//!     fn decode(node: FileNode<'_>) -> Result<Self> {
//!         Ok(Point {
//!             x: node.get("x")?.as_i64()?,
//!             y: node.get("y")?.as_i64()?,
//!         })
//!     }
//! }
//!
//! let fallback = Point { x: -1, y: -1 };
//! assert_eq!(FileNode::empty().read_record_or(fallback).unwrap(), Point { x: -1, y: -1 });
//! ```

use crate::{Error, FileNode, Node, NodeMap, Result};
use indexmap::IndexMap;
use std::any::{type_name, Any, TypeId};
use std::fmt;

/// A type that is stored as a mapping of named fields.
pub trait Record: Sized {
    /// Produces the fields of `self`.
    fn encode(&self) -> Result<NodeMap>;

    /// Rebuilds a value from a non-empty node.
    fn decode(node: FileNode<'_>) -> Result<Self>;
}

type EncodeFn = Box<dyn Fn(&dyn Any) -> Result<NodeMap>>;
type DecodeFn = Box<dyn for<'a> Fn(FileNode<'a>) -> Result<Box<dyn Any>>>;

struct Codec {
    type_id: TypeId,
    type_name: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Codecs looked up by tag.
///
/// Each tag is bound to exactly one Rust type. Encoding or decoding with a
/// value of a different type is a type error, and an unknown tag is a key
/// error.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: IndexMap<String, Codec>,
}

impl CodecRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `tag` to a pair of conversion functions for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if `tag` is already registered.
    pub fn register<T, E, D>(&mut self, tag: &str, encode: E, decode: D) -> Result<()>
    where
        T: 'static,
        E: Fn(&T) -> Result<NodeMap> + 'static,
        D: Fn(FileNode<'_>) -> Result<T> + 'static,
    {
        if self.codecs.contains_key(tag) {
            return Err(Error::DuplicateKey(tag.to_string()));
        }
        let type_name = type_name::<T>();
        let encode: EncodeFn = Box::new(move |value: &dyn Any| {
            let value = value
                .downcast_ref::<T>()
                .ok_or_else(|| Error::type_mismatch(type_name, "another type"))?;
            encode(value)
        });
        let decode: DecodeFn = Box::new(move |node: FileNode<'_>| {
            decode(node).map(|value| Box::new(value) as Box<dyn Any>)
        });
        self.codecs.insert(
            tag.to_string(),
            Codec {
                type_id: TypeId::of::<T>(),
                type_name,
                encode,
                decode,
            },
        );
        tracing::debug!(tag, type_name, "registered codec");
        Ok(())
    }

    /// Binds `tag` to the [`Record`] implementation of `T`.
    pub fn register_record<T: Record + 'static>(&mut self, tag: &str) -> Result<()> {
        self.register(tag, T::encode, T::decode)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.codecs.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    fn lookup<T: 'static>(&self, tag: &str) -> Result<&Codec> {
        let codec = self
            .codecs
            .get(tag)
            .ok_or_else(|| Error::UnknownCodec(tag.to_string()))?;
        if codec.type_id != TypeId::of::<T>() {
            return Err(Error::type_mismatch(codec.type_name, type_name::<T>()));
        }
        Ok(codec)
    }

    /// Encodes `value` with the codec registered under `tag`.
    pub fn encode<T: 'static>(&self, tag: &str, value: &T) -> Result<Node> {
        let codec = self.lookup::<T>(tag)?;
        (codec.encode)(value as &dyn Any).map(Node::Map)
    }

    /// Decodes `node` with the codec registered under `tag`.
    ///
    /// An empty node yields `default` unchanged; the decoder is not called.
    pub fn decode<T: 'static>(&self, tag: &str, node: FileNode<'_>, default: T) -> Result<T> {
        let codec = self.lookup::<T>(tag)?;
        if node.is_empty() {
            return Ok(default);
        }
        let value = (codec.decode)(node)?;
        value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::type_mismatch(codec.type_name, type_name::<T>()))
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.codecs.iter().map(|(tag, c)| (tag, c.type_name)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, ErrorKind};

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        a: i64,
        x: f64,
        id: String,
    }

    impl Record for Sample {
        fn encode(&self) -> Result<NodeMap> {
            let mut map = NodeMap::new();
            map.push("A", self.a)?;
            map.push("X", self.x)?;
            map.push("id", self.id.as_str())?;
            Ok(map)
        }

        fn decode(node: FileNode<'_>) -> Result<Self> {
            Ok(Sample {
                a: node.get("A")?.as_i64()?,
                x: node.get("X")?.as_f64()?,
                id: node.get("id")?.as_str()?.to_string(),
            })
        }
    }

    fn registry() -> CodecRegistry {
        let mut registry = CodecRegistry::new();
        registry.register_record::<Sample>("sample").unwrap();
        registry
    }

    #[test]
    fn test_encode_then_decode() {
        let registry = registry();
        let value = Sample {
            a: 97,
            x: 3.1415926,
            id: "mydata1234".to_string(),
        };
        let mut doc = Document::new();
        doc.push("mdata", registry.encode("sample", &value).unwrap())
            .unwrap();

        let default = Sample {
            a: 0,
            x: 0.0,
            id: String::new(),
        };
        let back = registry
            .decode("sample", doc.view().child("mdata"), default)
            .unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_empty_node_yields_default() {
        let registry = registry();
        let default = Sample {
            a: -1,
            x: -1.0,
            id: "default".to_string(),
        };
        let doc = Document::new();
        let got = registry
            .decode("sample", doc.view().child("non-existing"), default.clone())
            .unwrap();
        assert_eq!(got, default);
    }

    #[test]
    fn test_unknown_tag_and_wrong_type() {
        let registry = registry();
        let err = registry.encode("nope", &1i32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Key);
        let err = registry.encode("sample", &1i32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_duplicate_tag() {
        let mut registry = registry();
        let err = registry.register_record::<Sample>("sample").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Key);
        assert_eq!(registry.tags().count(), 1);
    }

    #[test]
    fn test_closure_codec() {
        let mut registry = CodecRegistry::new();
        registry
            .register(
                "pair",
                |v: &(i64, i64)| {
                    let mut map = NodeMap::new();
                    map.push("first", v.0)?;
                    map.push("second", v.1)?;
                    Ok(map)
                },
                |node: FileNode<'_>| Ok((node.get("first")?.as_i64()?, node.get("second")?.as_i64()?)),
            )
            .unwrap();
        let encoded = registry.encode("pair", &(3i64, 4i64)).unwrap();
        let back = registry
            .decode::<(i64, i64)>("pair", FileNode::new(&encoded), (0, 0))
            .unwrap();
        assert_eq!(back, (3, 4));
    }
}
