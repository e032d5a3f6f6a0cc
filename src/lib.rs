//! # serde_fstorage
//!
//! Persistent storage for hierarchical data in the OpenCV-compatible YAML
//! dialect (`%YAML:1.0`).
//!
//! A stored file is a tree: a root mapping of named entries whose values
//! are scalars (integers, reals, strings), sequences, nested mappings, or
//! dense numeric matrices (`!!opencv-matrix`). Keys are limited to ASCII
//! letters, digits, `_`, `-` and space.
//!
//! ## Key Features
//!
//! - **Sessions**: [`FileStorage`] opens a path for reading, writing or
//!   appending, with a begin/end stream API for nested structures
//! - **All-or-nothing writes**: nothing appears at the target path until
//!   [`FileStorage::close`] succeeds
//! - **Read views**: [`FileNode`] lookups, typed coercions and ordered
//!   iteration over a parsed tree
//! - **Records**: user types plug in through [`Record`] or a tag-keyed
//!   [`CodecRegistry`], with defaults for missing entries
//! - **Serde Compatible**: [`to_node`] / [`from_node`] bridge any
//!   `Serialize`/`Deserialize` type into the tree
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_fstorage::{from_str, node, to_string, Depth, Document, Matrix};
//!
//! let mut doc = Document::new();
//! doc.push("num1", 1).unwrap();
//! doc.push("A", Matrix::filled(4, 5, Depth::F32, 10.0)).unwrap();
//! doc.push("map_node", node!({ "node_0": 0, "node_1": 1 })).unwrap();
//!
//! let text = to_string(&doc).unwrap();
//! assert!(text.starts_with("%YAML:1.0\n---\n"));
//!
//! let back = from_str(&text).unwrap();
//! let a = back.view().get("A").unwrap().to_matrix().unwrap();
//! assert_eq!(a.data().len(), 20);
//! ```
//!
//! ### Serde
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_fstorage::{from_document, to_document};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Calibration {
//!     width: u32,
//!     height: u32,
//!     model: String,
//! }
//!
//! let cal = Calibration { width: 640, height: 480, model: "pinhole".to_string() };
//! let doc = to_document(&cal).unwrap();
//! assert_eq!(doc.len(), 3);
//! assert_eq!(from_document::<Calibration>(&doc).unwrap(), cal);
//! ```
//!
//! ## Format
//!
//! See [`format`] for the accepted and produced text.

pub mod codec;
pub mod de;
pub mod document;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod matrix;
pub mod node;
pub mod options;
pub mod ser;
pub mod storage;
pub mod view;

pub use codec::{CodecRegistry, Record};
pub use de::{from_node, Parser};
pub use document::Document;
pub use error::{Error, ErrorKind, Result};
pub use map::{validate_key, NodeMap};
pub use matrix::{Depth, Matrix};
pub use node::{Node, NodeKind};
pub use options::StorageOptions;
pub use ser::{to_node, Emitter};
pub use storage::{FileStorage, Mode};
pub use view::FileNode;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Writes a document as text with default options.
///
/// # Errors
///
/// Returns an error if a key anywhere in the tree is invalid.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(doc: &Document) -> Result<String> {
    to_string_with_options(doc, &StorageOptions::default())
}

/// Writes a document as text with custom formatting.
///
/// # Examples
///
/// ```rust
/// use serde_fstorage::{to_string_with_options, Document, StorageOptions};
///
/// let mut doc = Document::new();
/// doc.push("x", 1).unwrap();
/// let text = to_string_with_options(&doc, &StorageOptions::new().without_header()).unwrap();
/// assert_eq!(text, "x: 1\n");
/// ```
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(doc: &Document, options: &StorageOptions) -> Result<String> {
    let mut emitter = Emitter::new(options.clone());
    emitter.emit_document(doc)?;
    Ok(emitter.into_inner())
}

/// Writes a document to any writer.
///
/// # Errors
///
/// Returns an error if the document is invalid or writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, doc: &Document) -> Result<()>
where
    W: io::Write,
{
    let text = to_string(doc)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Parses a document. The `%YAML:1.0` header is required.
///
/// # Examples
///
/// ```rust
/// use serde_fstorage::from_str;
///
/// let doc = from_str("%YAML:1.0\n---\nx: 1\nname: cam\n").unwrap();
/// assert_eq!(doc.view().get("name").unwrap().as_str().unwrap(), "cam");
/// assert!(from_str("x: 1\n").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Format`] with line and column on malformed input.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<Document> {
    Parser::new(s)?.parse_document(true)
}

/// Parses a document that may omit the header.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_headerless(s: &str) -> Result<Document> {
    Parser::new(s)?.parse_document(false)
}

/// Parses a document from an I/O stream.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, or a format error as for [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R) -> Result<Document>
where
    R: io::Read,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Parses a document from bytes.
///
/// # Errors
///
/// Returns a format error if the bytes are not valid UTF-8 or not a valid document.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(v: &[u8]) -> Result<Document> {
    let s = std::str::from_utf8(v)
        .map_err(|e| Error::format(1, e.valid_up_to() + 1, &e.to_string()))?;
    from_str(s)
}

/// Serializes a struct or map into a document, one top-level entry per field.
///
/// # Errors
///
/// [`Error::TypeMismatch`] if `value` does not serialize to a mapping, or a
/// key error if a field name is not a valid key.
pub fn to_document<T>(value: &T) -> Result<Document>
where
    T: ?Sized + Serialize,
{
    match to_node(value)? {
        Node::Map(map) => Document::from_map(map),
        other => Err(other.mismatch("mapping")),
    }
}

/// Deserializes the whole root mapping of a document.
pub fn from_document<T>(doc: &Document) -> Result<T>
where
    T: DeserializeOwned,
{
    doc.view().deserialize()
}
