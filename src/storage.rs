//! File sessions.
//!
//! A [`FileStorage`] is opened on a path in one of three [`Mode`]s. Read
//! sessions parse the whole file up front and hand out [`FileNode`] views.
//! Write and append sessions collect entries in memory and only touch the
//! target path when [`FileStorage::close`] succeeds: the text is written to
//! a temporary file next to the target and then moved over it, so a failed
//! or abandoned session never leaves a partial file behind.
//!
//! ## Examples
//!
//! ```rust
//! use serde_fstorage::{Depth, FileStorage, Matrix, Mode};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("test.yml");
//!
//! let mut fs = FileStorage::open(&path, Mode::Write).unwrap();
//! fs.write("num1", 1).unwrap();
//! fs.write("A", Matrix::filled(2, 2, Depth::F32, 10.0)).unwrap();
//! fs.begin_seq("seq").unwrap();
//! for i in 0..3 {
//!     fs.push(i).unwrap();
//! }
//! fs.end().unwrap();
//! fs.close().unwrap();
//!
//! let fs = FileStorage::open(&path, Mode::Read).unwrap();
//! assert_eq!(fs.get("num1").unwrap().as_i64().unwrap(), 1);
//! assert_eq!(fs.get("seq").unwrap().len(), 3);
//! ```

use crate::codec::Record;
use crate::{
    from_str, to_string_with_options, validate_key, Document, Error, FileNode, Node, NodeMap,
    Result, StorageOptions,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

/// How a file is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Parse an existing file.
    Read,
    /// Create or replace the file.
    Write,
    /// Keep the existing top-level entries and add new ones after them.
    /// A missing file behaves like [`Mode::Write`].
    Append,
}

#[derive(Debug)]
enum Frame {
    Seq { key: Option<String>, items: Vec<Node> },
    Map { key: Option<String>, entries: NodeMap },
}

impl Frame {
    fn into_parts(self) -> (Option<String>, Node) {
        match self {
            Frame::Seq { key, items } => (key, Node::Seq(items)),
            Frame::Map { key, entries } => (key, Node::Map(entries)),
        }
    }
}

/// An open storage file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    mode: Mode,
    options: StorageOptions,
    doc: Document,
    stack: Vec<Frame>,
    sink: Option<NamedTempFile>,
    open: bool,
}

impl FileStorage {
    /// Opens `path` with default formatting options.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        Self::open_with_options(path, mode, StorageOptions::default())
    }

    /// Opens `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read (read mode), or the target
    ///   location is not writable (write and append modes).
    /// - [`Error::Format`] if an existing file is not valid, in read or
    ///   append mode.
    pub fn open_with_options(
        path: impl AsRef<Path>,
        mode: Mode,
        options: StorageOptions,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (doc, sink) = match mode {
            Mode::Read => (read_document(&path)?, None),
            Mode::Write | Mode::Append => {
                check_target(&path)?;
                let doc = if mode == Mode::Append && path.exists() {
                    read_document(&path)?
                } else {
                    Document::new()
                };
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                (doc, Some(NamedTempFile::new_in(dir)?))
            }
        };
        debug!(path = %path.display(), ?mode, entries = doc.len(), "opened storage");
        Ok(FileStorage {
            path,
            mode,
            options,
            doc,
            stack: Vec::new(),
            sink,
            open: true,
        })
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of sequence or mapping contexts currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The top-level entries committed so far.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// A view of the root mapping.
    pub fn root(&self) -> Result<FileNode<'_>> {
        if !self.open {
            return Err(Error::structure("storage is closed"));
        }
        Ok(self.doc.view())
    }

    /// Looks up a top-level entry.
    pub fn get(&self, key: &str) -> Result<FileNode<'_>> {
        self.root()?.get(key)
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.open {
            return Err(Error::structure("storage is closed"));
        }
        if self.sink.is_none() {
            return Err(Error::structure("storage was opened for reading"));
        }
        Ok(())
    }

    /// Checks that a named entry may be added in the current context.
    fn check_named(&self, key: &str) -> Result<()> {
        self.ensure_writable()?;
        validate_key(key)?;
        let taken = match self.stack.last() {
            None => self.doc.contains_key(key),
            Some(Frame::Map { entries, .. }) => entries.contains_key(key),
            Some(Frame::Seq { .. }) => {
                return Err(Error::structure(
                    "named entries cannot be written inside a sequence",
                ))
            }
        };
        if taken {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        Ok(())
    }

    fn check_unnamed(&self) -> Result<()> {
        self.ensure_writable()?;
        match self.stack.last() {
            Some(Frame::Seq { .. }) => Ok(()),
            _ => Err(Error::structure(
                "unnamed values can only be pushed inside a sequence",
            )),
        }
    }

    /// Writes a named value into the current mapping context (the root if
    /// none is open).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] / [`Error::DuplicateKey`] for a bad or reused
    ///   key, including keys nested inside `value`.
    /// - [`Error::Structure`] inside a sequence, or on a closed or read-only
    ///   session.
    pub fn write(&mut self, key: &str, value: impl Into<Node>) -> Result<()> {
        let value = value.into();
        self.check_named(key)?;
        value.validate_keys()?;
        trace!(key, kind = %value.kind(), "write");
        match self.stack.last_mut() {
            Some(Frame::Map { entries, .. }) => {
                entries.insert(key.to_string(), value);
            }
            _ => self.doc.push(key, value)?,
        }
        Ok(())
    }

    /// Encodes a [`Record`] and writes it under `key`.
    pub fn write_record<T: Record>(&mut self, key: &str, value: &T) -> Result<()> {
        let fields = value.encode()?;
        self.write(key, Node::Map(fields))
    }

    /// Appends an unnamed value to the open sequence.
    pub fn push(&mut self, value: impl Into<Node>) -> Result<()> {
        let value = value.into();
        self.check_unnamed()?;
        value.validate_keys()?;
        if let Some(Frame::Seq { items, .. }) = self.stack.last_mut() {
            items.push(value);
        }
        Ok(())
    }

    /// Opens a named sequence in the current mapping context.
    pub fn begin_seq(&mut self, key: &str) -> Result<()> {
        self.check_named(key)?;
        trace!(key, depth = self.stack.len(), "begin sequence");
        self.stack.push(Frame::Seq {
            key: Some(key.to_string()),
            items: Vec::new(),
        });
        Ok(())
    }

    /// Opens a named mapping in the current mapping context.
    pub fn begin_map(&mut self, key: &str) -> Result<()> {
        self.check_named(key)?;
        trace!(key, depth = self.stack.len(), "begin mapping");
        self.stack.push(Frame::Map {
            key: Some(key.to_string()),
            entries: NodeMap::new(),
        });
        Ok(())
    }

    /// Opens an unnamed sequence as the next item of the open sequence.
    pub fn push_seq(&mut self) -> Result<()> {
        self.check_unnamed()?;
        self.stack.push(Frame::Seq {
            key: None,
            items: Vec::new(),
        });
        Ok(())
    }

    /// Opens an unnamed mapping as the next item of the open sequence.
    pub fn push_map(&mut self) -> Result<()> {
        self.check_unnamed()?;
        self.stack.push(Frame::Map {
            key: None,
            entries: NodeMap::new(),
        });
        Ok(())
    }

    /// Closes the innermost open sequence or mapping.
    ///
    /// # Errors
    ///
    /// [`Error::Structure`] if no context is open.
    pub fn end(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::structure("end() without a matching begin"))?;
        let (key, node) = frame.into_parts();
        trace!(key = ?key, depth = self.stack.len(), "end");
        match (key, self.stack.last_mut()) {
            (Some(key), None) => self.doc.push(key, node)?,
            (Some(key), Some(Frame::Map { entries, .. })) => {
                entries.insert(key, node);
            }
            (None, Some(Frame::Seq { items, .. })) => items.push(node),
            _ => return Err(Error::structure("context stack is inconsistent")),
        }
        Ok(())
    }

    /// Finishes the session.
    ///
    /// For write and append sessions this is where the file is produced.
    /// If any sequence or mapping is still open the session is closed
    /// without writing anything and [`Error::Structure`] is returned.
    /// Closing an already closed session does nothing.
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let Some(mut file) = self.sink.take() else {
            debug!(path = %self.path.display(), "closed read session");
            return Ok(());
        };
        if !self.stack.is_empty() {
            let depth = self.stack.len();
            self.stack.clear();
            warn!(path = %self.path.display(), depth, "discarding output with unclosed contexts");
            return Err(Error::Structure(format!(
                "{} sequence or mapping context(s) still open at close",
                depth
            )));
        }
        let text = to_string_with_options(&self.doc, &self.options)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        file.persist(&self.path)
            .map_err(|e| Error::io(&e.error.to_string()))?;
        debug!(path = %self.path.display(), entries = self.doc.len(), bytes = text.len(), "closed storage");
        Ok(())
    }
}

impl Drop for FileStorage {
    fn drop(&mut self) {
        if self.open && self.sink.is_some() {
            warn!(path = %self.path.display(), "storage dropped without close; output discarded");
        }
    }
}

fn read_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::io(&format!("{}: {}", path.display(), e)))?;
    from_str(&text)
}

fn check_target(path: &Path) -> Result<()> {
    if let Ok(meta) = fs::metadata(path) {
        if meta.is_dir() {
            return Err(Error::io(&format!("{} is a directory", path.display())));
        }
        if meta.permissions().readonly() {
            return Err(Error::io(&format!("{} is read-only", path.display())));
        }
    }
    Ok(())
}
