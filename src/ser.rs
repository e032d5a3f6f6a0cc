//! Writing storage text, and converting Rust values into nodes.
//!
//! This module provides two things:
//!
//! - [`Emitter`], which renders a [`Document`] as YAML text in the layout
//!   OpenCV's `FileStorage` produces
//! - [`NodeSerializer`], a Serde serializer turning any `T: Serialize`
//!   into a [`Node`] tree
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde_fstorage::{to_node, to_string, Document};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Camera { width: u32, height: u32 }
//!
//! let mut doc = Document::new();
//! doc.push("camera", to_node(&Camera { width: 640, height: 480 }).unwrap()).unwrap();
//!
//! let text = to_string(&doc).unwrap();
//! assert_eq!(text, "%YAML:1.0\n---\ncamera:\n   width: 640\n   height: 480\n");
//! ```

use crate::options::YAML_HEADER;
use crate::{Document, Error, Matrix, Node, NodeMap, Result, StorageOptions};
use serde::{ser, Serialize};

/// Renders documents as storage text.
pub struct Emitter {
    output: String,
    options: StorageOptions,
}

impl Emitter {
    pub fn new(options: StorageOptions) -> Self {
        Emitter {
            output: String::with_capacity(256),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Appends the whole document, preamble included.
    pub fn emit_document(&mut self, doc: &Document) -> Result<()> {
        doc.root().validate()?;
        if self.options.header {
            self.output.push_str(YAML_HEADER);
            self.output.push_str("\n---\n");
        }
        for (key, value) in doc.root() {
            self.write_entry(key, value, 0);
        }
        Ok(())
    }

    fn write_indent(&mut self, level: usize) {
        for _ in 0..level * self.options.indent {
            self.output.push(' ');
        }
    }

    fn column(&self) -> usize {
        let line_start = self.output.rfind('\n').map_or(0, |i| i + 1);
        self.output.len() - line_start
    }

    fn write_entry(&mut self, key: &str, value: &Node, level: usize) {
        self.write_indent(level);
        if key.starts_with(' ') || key.ends_with(' ') || key.starts_with('-') {
            write_quoted(&mut self.output, key);
        } else {
            self.output.push_str(key);
        }
        self.output.push(':');
        self.write_tail(value, level);
    }

    fn write_item(&mut self, value: &Node, level: usize) {
        self.write_indent(level);
        self.output.push('-');
        self.write_tail(value, level);
    }

    /// Writes what follows a `key:` or `-` marker, newline included.
    fn write_tail(&mut self, value: &Node, level: usize) {
        match value {
            Node::Seq(items) if items.is_empty() => self.output.push_str(" []\n"),
            Node::Seq(items) if self.options.flow_scalar_seqs && items.iter().all(Node::is_scalar) => {
                self.output.push(' ');
                let tokens: Vec<String> = items.iter().map(scalar_token).collect();
                self.write_flow(&tokens, level);
                self.output.push('\n');
            }
            Node::Seq(items) => {
                self.output.push('\n');
                for item in items {
                    self.write_item(item, level + 1);
                }
            }
            Node::Map(map) if map.is_empty() => self.output.push_str(" {}\n"),
            Node::Map(map) => {
                self.output.push('\n');
                for (key, value) in map {
                    self.write_entry(key, value, level + 1);
                }
            }
            Node::Mat(m) => self.write_matrix(m, level),
            scalar => {
                self.output.push(' ');
                self.output.push_str(&scalar_token(scalar));
                self.output.push('\n');
            }
        }
    }

    fn write_matrix(&mut self, m: &Matrix, level: usize) {
        self.output.push_str(" !!opencv-matrix\n");
        let inner = level + 1;
        self.write_indent(inner);
        self.output.push_str(&format!("rows: {}\n", m.rows()));
        self.write_indent(inner);
        self.output.push_str(&format!("cols: {}\n", m.cols()));
        self.write_indent(inner);
        self.output.push_str(&format!("dt: {}\n", m.dt()));
        self.write_indent(inner);
        self.output.push_str("data:");
        if m.data().is_empty() {
            self.output.push_str(" []\n");
            return;
        }
        let depth = m.depth();
        let tokens: Vec<String> = m
            .data()
            .iter()
            .map(|&v| {
                if depth.is_float() {
                    format_real(v, depth == crate::Depth::F32)
                } else {
                    (v as i64).to_string()
                }
            })
            .collect();
        self.output.push(' ');
        self.write_flow(&tokens, inner);
        self.output.push('\n');
    }

    /// `[ a, b, c ]`, wrapping onto indented continuation lines.
    fn write_flow(&mut self, tokens: &[String], level: usize) {
        let continuation = level * self.options.indent + 4;
        self.output.push_str("[ ");
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                self.output.push(',');
                if self.column() + token.len() + 2 > self.options.line_width {
                    self.output.push('\n');
                    for _ in 0..continuation {
                        self.output.push(' ');
                    }
                } else {
                    self.output.push(' ');
                }
            }
            self.output.push_str(token);
        }
        self.output.push_str(" ]");
    }
}

/// Formats a real so that it reads back as a real: `10.`, `0.5`, `.Inf`.
///
/// `single` rounds through `f32` first so that 32-bit data prints at its
/// own precision.
pub(crate) fn format_real(v: f64, single: bool) -> String {
    if v.is_nan() {
        return ".Nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { ".Inf" } else { "-.Inf" }.to_string();
    }
    let mut s = if single {
        (v as f32).to_string()
    } else {
        v.to_string()
    };
    if !s.contains(['.', 'e', 'E']) {
        s.push('.');
    }
    s
}

fn scalar_token(node: &Node) -> String {
    match node {
        Node::Int(i) => i.to_string(),
        Node::Real(v) => format_real(*v, false),
        Node::Str(s) => {
            let mut out = String::new();
            write_string(&mut out, s);
            out
        }
        _ => "~".to_string(),
    }
}

fn needs_quotes(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };
    first.is_whitespace()
        || s.ends_with(char::is_whitespace)
        || "-?!&*|>'\"%@`#".contains(first)
        || s.chars().any(|c| {
            c.is_control() || matches!(c, ':' | '#' | ',' | '[' | ']' | '{' | '}' | '"' | '\\')
        })
        || !matches!(crate::de::resolve_plain(s), Node::Str(_))
}

fn write_string(out: &mut String, s: &str) {
    if needs_quotes(s) {
        write_quoted(out, s);
    } else {
        out.push_str(s);
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Serde serializer producing [`Node`] trees.
///
/// Booleans become `0`/`1`, `None` and unit become the empty node, and
/// enum variants carrying data become single-entry mappings keyed by the
/// variant name.
pub struct NodeSerializer;

pub struct SerializeVec {
    vec: Vec<Node>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: NodeMap,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

/// Converts any `T: Serialize` into a [`Node`].
pub fn to_node<T>(value: &T) -> Result<Node>
where
    T: ?Sized + Serialize,
{
    value.serialize(NodeSerializer)
}

fn wrap_variant(variant: Option<&'static str>, node: Node) -> Node {
    match variant {
        Some(name) => {
            let mut map = NodeMap::new();
            map.insert(name.to_string(), node);
            Node::Map(map)
        }
        None => node,
    }
}

impl ser::Serializer for NodeSerializer {
    type Ok = Node;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Node> {
        Ok(Node::Int(i64::from(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Node> {
        Ok(Node::Int(v as i64))
    }

    fn serialize_i16(self, v: i16) -> Result<Node> {
        Ok(Node::Int(v as i64))
    }

    fn serialize_i32(self, v: i32) -> Result<Node> {
        Ok(Node::Int(v as i64))
    }

    fn serialize_i64(self, v: i64) -> Result<Node> {
        Ok(Node::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Node> {
        Ok(Node::Int(v as i64))
    }

    fn serialize_u16(self, v: u16) -> Result<Node> {
        Ok(Node::Int(v as i64))
    }

    fn serialize_u32(self, v: u32) -> Result<Node> {
        Ok(Node::Int(v as i64))
    }

    fn serialize_u64(self, v: u64) -> Result<Node> {
        if v <= i64::MAX as u64 {
            Ok(Node::Int(v as i64))
        } else {
            Ok(Node::Real(v as f64))
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Node> {
        Ok(Node::Real(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Node> {
        Ok(Node::Real(v))
    }

    fn serialize_char(self, v: char) -> Result<Node> {
        Ok(Node::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Node> {
        Ok(Node::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Node> {
        Ok(Node::Seq(v.iter().map(|&b| Node::Int(b as i64)).collect()))
    }

    fn serialize_none(self) -> Result<Node> {
        Ok(Node::None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node> {
        Ok(Node::None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node> {
        Ok(Node::None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node> {
        Ok(Node::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node>
    where
        T: ?Sized + Serialize,
    {
        Ok(wrap_variant(Some(variant), to_node(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_node(value)?);
        Ok(())
    }

    fn finish(self) -> Node {
        wrap_variant(self.variant, Node::Seq(self.vec))
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: NodeMap::new(),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> Node {
        wrap_variant(self.variant, Node::Map(self.map))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Node;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_node(key)? {
            Node::Str(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            Node::Int(i) => {
                self.current_key = Some(i.to_string());
                Ok(())
            }
            _ => Err(Error::custom("Map keys must be strings or integers")),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.push(key, to_node(value)?)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.push(key, to_node(value)?)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.push(key, to_node(value)?)
    }

    fn end(self) -> Result<Node> {
        Ok(self.finish())
    }
}
