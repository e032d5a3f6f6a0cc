//! Storage text format
//!
//! This module documents the YAML dialect read and written by this crate.
//! It contains no code.
//!
//! # Preamble
//!
//! Every file starts with a directive line and a document marker:
//!
//! ```text
//! %YAML:1.0
//! ---
//! ```
//!
//! Readers reject a file without the directive unless it is parsed with
//! [`crate::from_str_headerless`]. A leading UTF-8 byte order mark is
//! ignored. Tabs are not allowed in indentation.
//!
//! A file holds one document. An optional `...` line ends it, and any
//! content after that marker is a format error.
//!
//! # Root
//!
//! The body is a block mapping. Entries keep the order they were written in
//! and keys are unique at every level.
//!
//! ```text
//! num1: 1
//! name: left camera
//! ```
//!
//! ## Keys
//!
//! Keys are non-empty and use only `A-Z a-z 0-9 _ -` and space. A key that
//! starts or ends with a space, or starts with `-`, is written in double
//! quotes. Anything else is rejected on write with a key error and on read
//! with a format error.
//!
//! # Scalars
//!
//! | Kind | Written as | Example |
//! |------|------------|---------|
//! | Empty | `~` | `unset: ~` |
//! | Integer | decimal digits, optional sign | `count: -42` |
//! | Real | always has a `.` or exponent | `scale: 10.` |
//! | Special reals | `.Inf`, `-.Inf`, `.Nan` | `limit: .Inf` |
//! | String | plain, or `"quoted"` when ambiguous | `id: mydata1234` |
//!
//! Booleans are stored as `0` and `1`.
//!
//! A string is quoted when it is empty, has surrounding spaces, starts with
//! a YAML indicator, contains `: # , [ ] { }` or control characters, or
//! would otherwise read back as a number or `~`. Quoted strings use the
//! escapes `\" \\ \n \r \t \uXXXX`. Single-quoted strings are accepted on
//! read.
//!
//! # Sequences
//!
//! Sequences made only of scalars are written in flow form, wrapped at the
//! configured line width:
//!
//! ```text
//! seq_node: [ 0, 1, 2, 3, 4, 5, 6, 7, 8, 9 ]
//! ```
//!
//! Any other sequence uses block form, one `-` per item, indented one level
//! below its key:
//!
//! ```text
//! items:
//!    -
//!       a: 1
//!    - [ 2.5 ]
//! ```
//!
//! Readers also accept items at the key's own indentation and compact items
//! such as `- a: 1`.
//!
//! # Mappings
//!
//! Nested mappings are indented one level (3 spaces by default). Empty ones
//! are written `{}`. Flow mappings `{ a: 1, b: 2 }` are accepted on read.
//!
//! # Matrices
//!
//! A matrix is a tagged mapping with four fields, in this order:
//!
//! ```text
//! A: !!opencv-matrix
//!    rows: 4
//!    cols: 5
//!    dt: f
//!    data: [ 10., 10., 10., 10., 10., 10., 10., 10., 10., 10., 10., 10.,
//!        10., 10., 10., 10., 10., 10., 10., 10. ]
//! ```
//!
//! `dt` is an element depth code, optionally prefixed by a channel count
//! (`3f` is three 32-bit float channels):
//!
//! | Code | Element |
//! |------|---------|
//! | `u` | 8-bit unsigned |
//! | `c` | 8-bit signed |
//! | `w` | 16-bit unsigned |
//! | `s` | 16-bit signed |
//! | `i` | 32-bit signed |
//! | `f` | 32-bit float |
//! | `d` | 64-bit float |
//!
//! `data` holds `rows * cols * channels` values in row-major order with
//! channels interleaved. A different count is a format error.
//!
//! # Comments
//!
//! `#` at the start of a line, or after whitespace outside quotes, begins a
//! comment that runs to the end of the line.
