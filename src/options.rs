//! Configuration options for writing storage files.
//!
//! Reading accepts everything the writer can produce regardless of the
//! options used, so these only shape the output text.
//!
//! ## Examples
//!
//! ```rust
//! use serde_fstorage::{node, to_string_with_options, Document, StorageOptions};
//!
//! let mut doc = Document::new();
//! doc.push("seq", node!([1, 2, 3])).unwrap();
//!
//! let options = StorageOptions::new().with_indent(2).with_flow_scalar_seqs(false);
//! let text = to_string_with_options(&doc, &options).unwrap();
//! assert!(text.contains("seq:\n  - 1\n"));
//! ```

/// Header line written at the top of every file.
pub const YAML_HEADER: &str = "%YAML:1.0";

/// Formatting options for the text writer.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageOptions {
    /// Spaces per nesting level
    pub indent: usize,
    /// Column after which flow sequences wrap onto a new line
    pub line_width: usize,
    /// Write sequences of scalars as `[ a, b ]` instead of one `- ` line each
    pub flow_scalar_seqs: bool,
    /// Emit the `%YAML:1.0` / `---` preamble
    pub header: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        StorageOptions {
            indent: 3,
            line_width: 72,
            flow_scalar_seqs: true,
            header: true,
        }
    }
}

impl StorageOptions {
    /// Creates default options (3-space indent, 72-column flow sequences, header on).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_fstorage::StorageOptions;
    ///
    /// let options = StorageOptions::new();
    /// assert_eq!(options.indent, 3);
    /// assert!(options.header);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation size. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent.max(1);
        self
    }

    #[must_use]
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    #[must_use]
    pub fn with_flow_scalar_seqs(mut self, flow: bool) -> Self {
        self.flow_scalar_seqs = flow;
        self
    }

    /// Omits the preamble. Files written this way can only be read back
    /// with [`crate::from_str_headerless`].
    #[must_use]
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }
}
