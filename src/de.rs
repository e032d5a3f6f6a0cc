//! Reading storage text, and converting nodes back into Rust values.
//!
//! This module provides two things:
//!
//! - [`Parser`], which reads the YAML dialect written by [`crate::ser::Emitter`]
//!   (plus the block/flow forms hand-written files commonly use) into a
//!   [`Document`]
//! - a Serde `Deserializer` implementation on [`Node`], used by [`from_node`]
//!
//! ## Overview
//!
//! - **Line-oriented blocks**: indentation decides nesting, `- ` starts a
//!   sequence item, `key: value` a mapping entry
//! - **Flow collections**: `[ ... ]` and `{ ... }` may span several lines
//! - **Matrices**: mappings tagged `!!opencv-matrix` become [`Node::Mat`]
//! - **Error reporting**: every format error carries line and column
//!
//! ## Usage
//!
//! ```rust
//! use serde_fstorage::from_str;
//!
//! let doc = from_str("%YAML:1.0\n---\nnum1: 1\nseq: [ 1, 2, 3 ]\n").unwrap();
//! assert_eq!(doc.get("num1").and_then(|n| n.as_i64()), Some(1));
//! assert_eq!(doc.get("seq").map(|n| n.len()), Some(3));
//! ```

use crate::matrix::parse_dt;
use crate::{validate_key, Document, Error, Matrix, Node, NodeMap, Result};
use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::forward_to_deserialize_any;

const MATRIX_TAG: &str = "opencv-matrix";

#[derive(Clone, Copy, Debug)]
struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

/// Parses storage text into a [`Document`].
///
/// Created via [`Parser::new`], which splits the input into significant
/// lines; comments and blank lines are dropped up front.
pub struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

fn is_seq_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Item text that opens a block on the same line as its `- ` marker,
/// as in `- name: x` or `- - 1`.
fn starts_compact_block(text: &str) -> bool {
    if is_seq_item(text) {
        return true;
    }
    !text.starts_with(['"', '\'', '[', '{', '!', '#'])
        && (text.contains(": ") || text.ends_with(':'))
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let mut lines = Vec::new();
        for (i, raw) in input.lines().enumerate() {
            let number = i + 1;
            let raw = raw.trim_end();
            let text = raw.trim_start_matches(' ');
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let indent = raw.len() - text.len();
            if text.starts_with('\t') {
                return Err(Error::format(
                    number,
                    indent + 1,
                    "tabs are not allowed in indentation",
                ));
            }
            lines.push(Line {
                number,
                indent,
                text,
            });
        }
        Ok(Parser { lines, pos: 0 })
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// Parses the whole input. With `require_header` the first line must be
    /// a `%YAML` directive.
    pub fn parse_document(mut self, require_header: bool) -> Result<Document> {
        match self.peek() {
            Some(line) if line.text.starts_with("%YAML") => {
                let version = line.text["%YAML".len()..].trim_start_matches([':', ' ']);
                if !version.starts_with("1.") {
                    return Err(Error::format(
                        line.number,
                        1,
                        &format!("unsupported YAML version {:?}", version),
                    ));
                }
                self.pos += 1;
            }
            Some(line) if require_header => {
                return Err(Error::format(line.number, 1, "expected %YAML header"));
            }
            None if require_header => {
                return Err(Error::format(1, 1, "expected %YAML header, found empty input"));
            }
            _ => {}
        }

        if matches!(self.peek(), Some(line) if line.indent == 0 && line.text == "---") {
            self.pos += 1;
        }

        let mut root = NodeMap::new();
        if let Some(line) = self.peek() {
            if is_seq_item(line.text) {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    "top-level node must be a mapping",
                ));
            }
            if line.text != "..." {
                root = self.parse_map_block(line.indent)?;
            }
        }

        if let Some(line) = self.peek() {
            if line.text != "..." {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    "unexpected content after the document root",
                ));
            }
            self.pos += 1;
        }

        // Only one document per file
        if let Some(line) = self.peek() {
            return Err(Error::format(
                line.number,
                line.indent + 1,
                "unexpected content after the document end marker",
            ));
        }

        Ok(Document::from_map_unchecked(root))
    }

    fn parse_block(&mut self) -> Result<Node> {
        let line = match self.peek() {
            Some(line) => line,
            None => return Ok(Node::None),
        };
        if is_seq_item(line.text) {
            Ok(Node::Seq(self.parse_seq_block(line.indent)?))
        } else {
            Ok(Node::Map(self.parse_map_block(line.indent)?))
        }
    }

    fn parse_map_block(&mut self, indent: usize) -> Result<NodeMap> {
        let mut map = NodeMap::new();

        while let Some(line) = self.peek() {
            if line.indent < indent || line.text == "..." {
                break;
            }
            if line.indent > indent {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    "unexpected indentation",
                ));
            }
            if is_seq_item(line.text) {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    "expected a mapping key, found a sequence item",
                ));
            }

            let (key, rest, col) = split_key(line)?;
            if validate_key(&key).is_err() {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    &format!("invalid key {:?}", key),
                ));
            }
            if map.contains_key(&key) {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    &format!("duplicate key {:?}", key),
                ));
            }

            self.pos += 1;
            let value = self.parse_tail(rest, line, col, indent, true)?;
            map.insert(key, value);
        }

        Ok(map)
    }

    fn parse_seq_block(&mut self, indent: usize) -> Result<Vec<Node>> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent || line.text == "..." {
                break;
            }
            if line.indent > indent {
                return Err(Error::format(
                    line.number,
                    line.indent + 1,
                    "unexpected indentation",
                ));
            }
            if !is_seq_item(line.text) {
                break;
            }

            let rest = &line.text[1..];
            let trimmed = rest.trim_start_matches(' ');
            let offset = line.indent + 1 + (rest.len() - trimmed.len());

            if !trimmed.is_empty() && starts_compact_block(trimmed) {
                // Re-read the rest of this line as the first line of a nested block
                self.lines[self.pos] = Line {
                    number: line.number,
                    indent: offset,
                    text: trimmed,
                };
                items.push(self.parse_block()?);
            } else {
                self.pos += 1;
                items.push(self.parse_tail(trimmed, line, offset + 1, indent, false)?);
            }
        }

        Ok(items)
    }

    /// Parses whatever follows a `key:` or `-` marker.
    fn parse_tail(
        &mut self,
        rest: &str,
        line: Line<'a>,
        col: usize,
        parent_indent: usize,
        in_map: bool,
    ) -> Result<Node> {
        if rest.is_empty() || rest.starts_with('#') {
            return self.parse_nested(parent_indent, in_map);
        }

        if let Some(tagged) = rest.strip_prefix("!!") {
            let (tag, after) = tagged
                .split_once(' ')
                .map_or((tagged, ""), |(tag, after)| (tag, after.trim()));
            if tag != MATRIX_TAG {
                return Err(Error::format(
                    line.number,
                    col,
                    &format!("unsupported tag !!{}", tag),
                ));
            }
            let fields = if after.is_empty() || after.starts_with('#') {
                self.parse_nested(parent_indent, in_map)?
            } else if after.starts_with('{') {
                self.parse_flow(after, line, col, parent_indent)?
            } else {
                return Err(Error::format(
                    line.number,
                    col,
                    "matrix tag must be followed by a mapping",
                ));
            };
            return match fields {
                Node::Map(fields) => matrix_from_fields(&fields, line.number, col).map(Node::Mat),
                _ => Err(Error::format(
                    line.number,
                    col,
                    "matrix tag must be followed by a mapping",
                )),
            };
        }

        if rest.starts_with('[') || rest.starts_with('{') {
            return self.parse_flow(rest, line, col, parent_indent);
        }

        parse_scalar(rest, line.number, col)
    }

    /// The value of a marker with nothing after it: a deeper block, a
    /// sequence at the key's own indentation, or an empty node.
    fn parse_nested(&mut self, parent_indent: usize, in_map: bool) -> Result<Node> {
        match self.peek() {
            Some(next) if next.indent > parent_indent => self.parse_block(),
            Some(next) if in_map && next.indent == parent_indent && is_seq_item(next.text) => {
                Ok(Node::Seq(self.parse_seq_block(parent_indent)?))
            }
            _ => Ok(Node::None),
        }
    }

    /// Parses a flow collection, pulling in continuation lines until the
    /// brackets balance.
    fn parse_flow(
        &mut self,
        first: &str,
        line: Line<'a>,
        col: usize,
        parent_indent: usize,
    ) -> Result<Node> {
        let mut text = first.to_string();
        let mut scan = FlowScan::default();
        scan.feed(first);

        while scan.depth > 0 {
            match self.peek() {
                Some(next) if next.indent > parent_indent => {
                    text.push('\n');
                    text.push_str(next.text);
                    scan.feed(next.text);
                    self.pos += 1;
                }
                _ => {
                    return Err(Error::format(
                        line.number,
                        col,
                        "unterminated flow collection",
                    ))
                }
            }
        }

        let mut cursor = Cursor::new(&text, line.number, col);
        let node = cursor.parse_flow_value()?;
        cursor.skip_whitespace();
        if !cursor.at_end() && cursor.peek_char() != Some('#') {
            return Err(cursor.error("unexpected characters after flow collection"));
        }
        Ok(node)
    }
}

/// Bracket depth outside of quoted strings. Quotes only open a string at
/// the start of a token, as in [`Cursor::parse_flow_value`].
#[derive(Default)]
struct FlowScan {
    depth: usize,
    quote: Option<char>,
    escaped: bool,
    prev: Option<char>,
}

impl FlowScan {
    fn feed(&mut self, s: &str) {
        for c in s.chars() {
            if let Some(q) = self.quote {
                if self.escaped {
                    self.escaped = false;
                } else if q == '"' && c == '\\' {
                    self.escaped = true;
                } else if c == q {
                    self.quote = None;
                    self.prev = Some(c);
                }
                continue;
            }
            match c {
                '"' | '\'' if matches!(self.prev, None | Some('[' | '{' | ',' | ':')) => {
                    self.quote = Some(c)
                }
                '[' | '{' => self.depth += 1,
                ']' | '}' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
            if !c.is_whitespace() {
                self.prev = Some(c);
            }
        }
    }
}

fn split_key(line: Line<'_>) -> Result<(String, &str, usize)> {
    let text = line.text;

    let (key, after_key) = if text.starts_with(['"', '\'']) {
        let mut cursor = Cursor::new(text, line.number, line.indent + 1);
        let key = cursor.parse_quoted()?;
        let after = text[cursor.position..].trim_start_matches(' ');
        match after.strip_prefix(':') {
            Some(after) => (key, after),
            None => return Err(cursor.error("expected ':' after key")),
        }
    } else {
        let idx = text
            .char_indices()
            .find(|&(i, c)| c == ':' && matches!(text[i + 1..].chars().next(), None | Some(' ')))
            .map(|(i, _)| i)
            .ok_or_else(|| Error::format(line.number, line.indent + 1, "expected ':' after key"))?;
        (text[..idx].trim_end().to_string(), &text[idx + 1..])
    };

    let rest = after_key.trim_start_matches(' ');
    let col = line.indent + (text.len() - rest.len()) + 1;
    Ok((key, rest, col))
}

fn parse_scalar(rest: &str, line: usize, col: usize) -> Result<Node> {
    if rest.starts_with(['"', '\'']) {
        let mut cursor = Cursor::new(rest, line, col);
        let s = cursor.parse_quoted()?;
        cursor.skip_whitespace();
        if !cursor.at_end() && cursor.peek_char() != Some('#') {
            return Err(cursor.error("unexpected characters after quoted scalar"));
        }
        return Ok(Node::Str(s));
    }

    let plain = match rest.find(" #") {
        Some(i) => &rest[..i],
        None => rest,
    };
    Ok(resolve_plain(plain.trim_end()))
}

/// Decides what an unquoted scalar means.
///
/// Anything that is not empty, `~`/`null`, an integer, or a real is a string.
pub(crate) fn resolve_plain(s: &str) -> Node {
    match s {
        "" | "~" | "null" | "Null" | "NULL" => return Node::None,
        ".Inf" | ".inf" | ".INF" | "+.Inf" | "+.inf" => return Node::Real(f64::INFINITY),
        "-.Inf" | "-.inf" | "-.INF" => return Node::Real(f64::NEG_INFINITY),
        ".NaN" | ".Nan" | ".nan" | ".NAN" => return Node::Real(f64::NAN),
        _ => {}
    }

    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let Some(&first) = body.as_bytes().first() else {
        return Node::Str(s.to_string());
    };

    if body.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Node::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Node::Real(f);
        }
    }

    let numeric = (first.is_ascii_digit() || first == b'.')
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if numeric {
        if let Ok(f) = s.parse::<f64>() {
            return Node::Real(f);
        }
    }

    Node::Str(s.to_string())
}

fn matrix_from_fields(fields: &NodeMap, line: usize, col: usize) -> Result<Matrix> {
    let field = |name: &str| {
        fields.get(name).ok_or_else(|| {
            Error::format(line, col, &format!("matrix is missing the {:?} field", name))
        })
    };
    let dimension = |name: &str| -> Result<usize> {
        field(name)?
            .as_i64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                Error::format(line, col, &format!("matrix {:?} must be a non-negative integer", name))
            })
    };

    if let Some(extra) = fields
        .keys()
        .find(|k| !matches!(k.as_str(), "rows" | "cols" | "dt" | "data"))
    {
        return Err(Error::format(
            line,
            col,
            &format!("unexpected matrix field {:?}", extra),
        ));
    }

    let rows = dimension("rows")?;
    let cols = dimension("cols")?;
    let (channels, depth) = field("dt")?
        .as_str()
        .and_then(parse_dt)
        .ok_or_else(|| Error::format(line, col, "matrix \"dt\" is not a known element type"))?;
    let data = match field("data")? {
        Node::Seq(items) => items
            .iter()
            .map(|n| {
                n.as_f64()
                    .ok_or_else(|| Error::format(line, col, "matrix data must be numeric"))
            })
            .collect::<Result<Vec<f64>>>()?,
        Node::None => Vec::new(),
        _ => return Err(Error::format(line, col, "matrix data must be a sequence")),
    };

    Matrix::with_channels(rows, cols, channels, depth, data)
        .map_err(|e| Error::format(line, col, &e.to_string()))
}

/// Character cursor for inline text: quoted scalars and flow collections.
struct Cursor<'s> {
    input: &'s str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'s> Cursor<'s> {
    fn new(input: &'s str, line: usize, column: usize) -> Self {
        Cursor {
            input,
            position: 0,
            line,
            column,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t' | '\n')) {
            self.next_char();
        }
    }

    fn error(&self, msg: &str) -> Error {
        Error::format(self.line, self.column, msg)
    }

    fn parse_quoted(&mut self) -> Result<String> {
        match self.peek_char() {
            Some('"') => self.parse_double_quoted(),
            Some('\'') => self.parse_single_quoted(),
            _ => Err(self.error("expected quoted string")),
        }
    }

    fn parse_double_quoted(&mut self) -> Result<String> {
        self.next_char(); // consume opening quote
        let mut result = String::new();

        while let Some(ch) = self.next_char() {
            match ch {
                '"' => return Ok(result),
                '\\' => match self.next_char() {
                    Some('\\') => result.push('\\'),
                    Some('"') => result.push('"'),
                    Some('/') => result.push('/'),
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('0') => result.push('\0'),
                    Some('u') => {
                        let mut hex = String::new();
                        for _ in 0..4 {
                            match self.next_char() {
                                Some(ch) if ch.is_ascii_hexdigit() => hex.push(ch),
                                _ => {
                                    return Err(self.error(
                                        "invalid unicode escape sequence (expected 4 hex digits)",
                                    ))
                                }
                            }
                        }
                        let ch = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| self.error("invalid unicode code point"))?;
                        result.push(ch);
                    }
                    Some(other) => {
                        result.push('\\');
                        result.push(other);
                    }
                    None => return Err(self.error("unexpected end of input in string")),
                },
                other => result.push(other),
            }
        }

        Err(self.error("unterminated string"))
    }

    fn parse_single_quoted(&mut self) -> Result<String> {
        self.next_char(); // consume opening quote
        let mut result = String::new();

        while let Some(ch) = self.next_char() {
            if ch == '\'' {
                if self.peek_char() == Some('\'') {
                    self.next_char();
                    result.push('\'');
                } else {
                    return Ok(result);
                }
            } else {
                result.push(ch);
            }
        }

        Err(self.error("unterminated string"))
    }

    fn parse_plain(&mut self, stop_at_colon: bool) -> &'s str {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if matches!(ch, ',' | ']' | '}' | '\n') || (stop_at_colon && ch == ':') {
                break;
            }
            self.next_char();
        }
        self.input[start..self.position].trim()
    }

    fn parse_flow_value(&mut self) -> Result<Node> {
        self.skip_whitespace();
        match self.peek_char() {
            Some('[') => self.parse_flow_seq(),
            Some('{') => self.parse_flow_map(),
            Some('"') | Some('\'') => Ok(Node::Str(self.parse_quoted()?)),
            Some(_) => {
                let (line, column) = (self.line, self.column);
                let plain = self.parse_plain(false);
                if plain.is_empty() {
                    return Err(Error::format(line, column, "expected a value"));
                }
                Ok(resolve_plain(plain))
            }
            None => Err(self.error("unexpected end of flow collection")),
        }
    }

    fn parse_flow_seq(&mut self) -> Result<Node> {
        self.next_char(); // consume '['
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek_char() == Some(']') {
                self.next_char();
                break;
            }
            items.push(self.parse_flow_value()?);
            self.skip_whitespace();
            match self.next_char() {
                Some(',') => {}
                Some(']') => break,
                _ => return Err(self.error("expected ',' or ']' in flow sequence")),
            }
        }

        Ok(Node::Seq(items))
    }

    fn parse_flow_map(&mut self) -> Result<Node> {
        self.next_char(); // consume '{'
        let mut map = NodeMap::new();

        loop {
            self.skip_whitespace();
            if self.peek_char() == Some('}') {
                self.next_char();
                break;
            }

            let (line, column) = (self.line, self.column);
            let key = if matches!(self.peek_char(), Some('"' | '\'')) {
                self.parse_quoted()?
            } else {
                self.parse_plain(true).to_string()
            };
            if validate_key(&key).is_err() {
                return Err(Error::format(line, column, &format!("invalid key {:?}", key)));
            }
            if map.contains_key(&key) {
                return Err(Error::format(line, column, &format!("duplicate key {:?}", key)));
            }

            self.skip_whitespace();
            if self.next_char() != Some(':') {
                return Err(self.error("expected ':' after key in flow mapping"));
            }
            let value = self.parse_flow_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.next_char() {
                Some(',') => {}
                Some('}') => break,
                _ => return Err(self.error("expected ',' or '}' in flow mapping")),
            }
        }

        Ok(Node::Map(map))
    }
}

/// Deserializes a `T` from a node tree.
///
/// # Examples
///
/// ```rust
/// use serde_fstorage::{from_node, node};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Size { width: u32, height: u32 }
///
/// let n = node!({ "width": 640, "height": 480 });
/// let size: Size = from_node(&n).unwrap();
/// assert_eq!(size, Size { width: 640, height: 480 });
/// ```
pub fn from_node<T>(node: &Node) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(node.clone())
}

impl<'de> IntoDeserializer<'de, Error> for Node {
    type Deserializer = Node;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

impl<'de> de::Deserializer<'de> for Node {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Node::None => visitor.visit_unit(),
            Node::Int(i) => visitor.visit_i64(i),
            Node::Real(f) => visitor.visit_f64(f),
            Node::Str(s) => visitor.visit_string(s),
            Node::Seq(items) => {
                let mut seq: SeqDeserializer<_, Error> = SeqDeserializer::new(items.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            Node::Map(map) => {
                let mut access: MapDeserializer<'de, _, Error> =
                    MapDeserializer::new(map.into_iter());
                let value = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(value)
            }
            Node::Mat(m) => de::Deserializer::deserialize_any(Node::Map(m.fields().clone()), visitor),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Node::Int(i) => visitor.visit_bool(i != 0),
            Node::Str(ref s) if s == "true" => visitor.visit_bool(true),
            Node::Str(ref s) if s == "false" => visitor.visit_bool(false),
            other => Err(other.mismatch("boolean")),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Node::None => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Node::Str(s) => {
                let variant: StringDeserializer<Error> = s.into_deserializer();
                visitor.visit_enum(variant)
            }
            Node::Map(map) if map.len() == 1 => {
                let (variant, value) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::custom("empty enum mapping"))?;
                visitor.visit_enum(EnumDeserializer { variant, value })
            }
            other => Err(other.mismatch("enum variant name or single-entry mapping")),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct EnumDeserializer {
    variant: String,
    value: Node,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant: StringDeserializer<Error> = self.variant.into_deserializer();
        let variant = seed.deserialize(variant)?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Node,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Node::None => Ok(()),
            other => Err(other.mismatch("unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self.value, visitor)
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self.value, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node, Depth, ErrorKind};
    use serde::Deserialize;

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input)?.parse_document(true)
    }

    #[test]
    fn test_resolve_plain() {
        assert_eq!(resolve_plain("1"), Node::Int(1));
        assert_eq!(resolve_plain("-42"), Node::Int(-42));
        assert_eq!(resolve_plain("10."), Node::Real(10.0));
        assert_eq!(resolve_plain("-.5"), Node::Real(-0.5));
        assert_eq!(resolve_plain("1e3"), Node::Real(1000.0));
        assert_eq!(resolve_plain("~"), Node::None);
        assert_eq!(resolve_plain("-.Inf"), Node::Real(f64::NEG_INFINITY));
        assert_eq!(resolve_plain("inf"), Node::Str("inf".into()));
        assert_eq!(resolve_plain("1.2.3"), Node::Str("1.2.3".into()));
        assert_eq!(resolve_plain("-"), Node::Str("-".into()));
        assert!(matches!(resolve_plain(".nan"), Node::Real(f) if f.is_nan()));
    }

    #[test]
    fn test_opencv_sample_file() {
        let text = "%YAML:1.0\n---\nnum1: 1\nnum2: 2\nA: !!opencv-matrix\n   rows: 4\n   cols: 5\n   dt: f\n   data: [ 10., 10., 10., 10., 10., 10., 10., 10., 10., 10., 10., 10.,\n       10., 10., 10., 10., 10., 10., 10., 10. ]\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.get("num1"), Some(&Node::Int(1)));
        assert_eq!(doc.get("num2"), Some(&Node::Int(2)));
        let a = doc.get("A").and_then(Node::as_matrix).unwrap();
        assert_eq!((a.rows(), a.cols(), a.depth()), (4, 5, Depth::F32));
        assert!(a.data().iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_block_sequences_and_mappings() {
        let text = "%YAML:1.0\n---\nseq_node:\n   - 0\n   - 1\n   -\n      inner: x\nmap_node:\n   node_0: 0\n   nested:\n      deep: [ a, \"b c\" ]\n";
        let doc = parse(text).unwrap();
        assert_eq!(
            doc.get("seq_node").cloned(),
            Some(node!([0, 1, { "inner": "x" }]))
        );
        assert_eq!(
            doc.get("map_node").cloned(),
            Some(node!({ "node_0": 0, "nested": { "deep": ["a", "b c"] } }))
        );
    }

    #[test]
    fn test_sequence_at_key_indentation_and_compact_items() {
        let text = "%YAML:1.0\nlist:\n- 1\n- name: cam\n  id: 3\nafter: ~\n";
        let doc = parse(text).unwrap();
        assert_eq!(
            doc.get("list").cloned(),
            Some(node!([1, { "name": "cam", "id": 3 }]))
        );
        assert_eq!(doc.get("after"), Some(&Node::None));
    }

    #[test]
    fn test_flow_map_and_comments() {
        let text = "%YAML 1.0\n---\n# leading comment\nm: { a: 1, \"b\": [ 2, 3 ] } # trailing\ns: 'it''s' # note\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.get("m").cloned(), Some(node!({ "a": 1, "b": [2, 3] })));
        assert_eq!(doc.get("s"), Some(&Node::Str("it's".into())));
    }

    #[test]
    fn test_apostrophe_inside_plain_flow_item() {
        let text = "%YAML:1.0\n---\nnames: [ it's, 'quoted, one',\n   last ]\n";
        let doc = parse(text).unwrap();
        assert_eq!(
            doc.get("names").cloned(),
            Some(node!(["it's", "quoted, one", "last"]))
        );
    }

    #[test]
    fn test_missing_header_is_format_error() {
        let err = parse("num1: 1\n").unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));
    }

    #[test]
    fn test_format_errors_carry_position() {
        let cases = [
            ("%YAML:1.0\na: [ 1, 2\n", 2),
            ("%YAML:1.0\na: 1\n    b: 2\n", 3),
            ("%YAML:1.0\na: 1\na: 2\n", 3),
            ("%YAML:1.0\nnot a key\n", 2),
            ("%YAML:1.0\na: \"open\n", 2),
            ("%YAML:1.0\nm: !!opencv-matrix\n   rows: 2\n   cols: 2\n   dt: f\n   data: [ 1. ]\n", 2),
            ("%YAML:1.0\nm: !!binary abc\n", 2),
        ];
        for (input, line) in cases {
            match parse(input) {
                Err(Error::Format { line: l, .. }) => assert_eq!(l, line, "input {:?}", input),
                other => panic!("expected format error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_matrix_with_overflowing_dimensions_is_format_error() {
        let cases = [
            "%YAML:1.0\n---\nm: !!opencv-matrix\n   rows: 4294967296\n   cols: 4294967296\n   dt: f\n   data: []\n",
            "%YAML:1.0\n---\nm: !!opencv-matrix\n   rows: 3\n   cols: 6148914691236517206\n   dt: f\n   data: [ 1., 2. ]\n",
        ];
        for input in cases {
            match parse(input) {
                Err(err @ Error::Format { .. }) => assert_eq!(err.kind(), ErrorKind::Format),
                other => panic!("expected format error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_content_after_end_marker_is_rejected() {
        match parse("%YAML:1.0\n---\na: 1\n...\ngarbage: [\n") {
            Err(Error::Format { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected format error, got {:?}", other),
        }

        let doc = parse("%YAML:1.0\n---\na: 1\n...\n").unwrap();
        assert_eq!(doc.get("a"), Some(&Node::Int(1)));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("%YAML:1.0\n---\n").unwrap().is_empty());
        assert!(parse("").is_err());
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Mode {
        Idle,
        Scale(f64),
        Crop { x: u32, y: u32 },
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Settings {
        name: String,
        enabled: bool,
        gain: Option<f32>,
        modes: Vec<Mode>,
    }

    #[test]
    fn test_from_node_struct() {
        let n = node!({
            "name": "cam0",
            "enabled": 1,
            "gain": null,
            "modes": ["Idle", { "Scale": 0.5 }, { "Crop": { "x": 1, "y": 2 } }]
        });
        let settings: Settings = from_node(&n).unwrap();
        assert_eq!(
            settings,
            Settings {
                name: "cam0".into(),
                enabled: true,
                gain: None,
                modes: vec![Mode::Idle, Mode::Scale(0.5), Mode::Crop { x: 1, y: 2 }],
            }
        );
    }

    #[test]
    fn test_from_node_type_mismatch() {
        let result: Result<u32> = from_node(&Node::Str("x".into()));
        assert!(result.is_err());
    }
}
