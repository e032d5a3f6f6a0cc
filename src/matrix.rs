//! Dense 2-D numeric arrays.
//!
//! A [`Matrix`] is stored in a file as a mapping tagged `!!opencv-matrix`
//! with the fields `rows`, `cols`, `dt` and `data`, where `data` holds the
//! elements in row-major order:
//!
//! ```text
//! A: !!opencv-matrix
//!    rows: 2
//!    cols: 2
//!    dt: f
//!    data: [ 1., 2., 3., 4. ]
//! ```
//!
//! `dt` is the element type code, optionally prefixed by the channel count
//! (`3f` is three 32-bit float channels per element).

use crate::{Error, Node, NodeMap, Result};
use std::fmt;
use std::sync::OnceLock;

/// Element type of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    I8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl Depth {
    /// The single-character code used in the `dt` field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_fstorage::Depth;
    ///
    /// assert_eq!(Depth::F32.code(), 'f');
    /// assert_eq!(Depth::from_code('w'), Some(Depth::U16));
    /// ```
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Depth::U8 => 'u',
            Depth::I8 => 'c',
            Depth::U16 => 'w',
            Depth::I16 => 's',
            Depth::I32 => 'i',
            Depth::F32 => 'f',
            Depth::F64 => 'd',
        }
    }

    #[must_use]
    pub const fn from_code(code: char) -> Option<Depth> {
        match code {
            'u' => Some(Depth::U8),
            'c' => Some(Depth::I8),
            'w' => Some(Depth::U16),
            's' => Some(Depth::I16),
            'i' => Some(Depth::I32),
            'f' => Some(Depth::F32),
            'd' => Some(Depth::F64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Depth::F32 | Depth::F64)
    }

    fn bounds(self) -> (f64, f64) {
        match self {
            Depth::U8 => (u8::MIN as f64, u8::MAX as f64),
            Depth::I8 => (i8::MIN as f64, i8::MAX as f64),
            Depth::U16 => (u16::MIN as f64, u16::MAX as f64),
            Depth::I16 => (i16::MIN as f64, i16::MAX as f64),
            Depth::I32 => (i32::MIN as f64, i32::MAX as f64),
            Depth::F32 | Depth::F64 => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    /// Converts `v` to the closest value this depth can hold.
    ///
    /// Integer depths round and saturate, `F32` drops precision.
    #[must_use]
    pub fn saturate(self, v: f64) -> f64 {
        match self {
            Depth::F64 => v,
            Depth::F32 => v as f32 as f64,
            _ => {
                if v.is_nan() {
                    return 0.0;
                }
                let (lo, hi) = self.bounds();
                v.round().clamp(lo, hi)
            }
        }
    }
}

/// Parses a `dt` string such as `f` or `3u` into channel count and depth.
pub(crate) fn parse_dt(dt: &str) -> Option<(usize, Depth)> {
    let code = dt.chars().last()?;
    let depth = Depth::from_code(code)?;
    let prefix = &dt[..dt.len() - code.len_utf8()];
    let channels = if prefix.is_empty() {
        1
    } else {
        prefix.parse::<usize>().ok().filter(|&c| c > 0)?
    };
    Some((channels, depth))
}

/// A dense row-major matrix of numeric elements.
///
/// # Examples
///
/// ```rust
/// use serde_fstorage::{Depth, Matrix};
///
/// let a = Matrix::filled(4, 5, Depth::F32, 10.0);
/// assert_eq!(a.data().len(), 20);
/// assert_eq!(a.get(3, 4), Some(10.0));
/// assert_eq!(a.dt(), "f");
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    channels: usize,
    depth: Depth,
    data: Vec<f64>,
    fields: OnceLock<NodeMap>,
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.channels == other.channels
            && self.depth == other.depth
            && self.data == other.data
    }
}

/// Number of values `rows x cols x channels` needs, `None` on overflow.
fn element_count(rows: usize, cols: usize, channels: usize) -> Option<usize> {
    rows.checked_mul(cols)?.checked_mul(channels)
}

impl Matrix {
    /// Builds a single-channel matrix from row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, depth: Depth, data: Vec<f64>) -> Result<Self> {
        Self::with_channels(rows, cols, 1, depth, data)
    }

    /// Builds a matrix with `channels` interleaved values per element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if `channels` is 0, if the dimensions
    /// overflow `usize`, or if `data` has the wrong length.
    pub fn with_channels(
        rows: usize,
        cols: usize,
        channels: usize,
        depth: Depth,
        data: Vec<f64>,
    ) -> Result<Self> {
        let shape_error = |expected| Error::Shape {
            rows,
            cols,
            channels,
            expected,
            found: data.len(),
        };
        let expected =
            element_count(rows, cols, channels).ok_or_else(|| shape_error(usize::MAX))?;
        if channels == 0 || data.len() != expected {
            return Err(shape_error(expected));
        }
        let data = data.into_iter().map(|v| depth.saturate(v)).collect();
        Ok(Matrix {
            rows,
            cols,
            channels,
            depth,
            data,
            fields: OnceLock::new(),
        })
    }

    /// A single-channel matrix with every element set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize` or cannot be allocated.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, depth: Depth, value: f64) -> Self {
        let len = element_count(rows, cols, 1).unwrap_or(usize::MAX);
        Matrix {
            rows,
            cols,
            channels: 1,
            depth,
            data: vec![depth.saturate(value); len],
            fields: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize, depth: Depth) -> Self {
        Self::filled(rows, cols, depth, 0.0)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// Row-major element data, channels interleaved.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// The `dt` code, e.g. `f` or `3u`.
    #[must_use]
    pub fn dt(&self) -> String {
        if self.channels == 1 {
            self.depth.code().to_string()
        } else {
            format!("{}{}", self.channels, self.depth.code())
        }
    }

    /// First channel of the element at (`row`, `col`).
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.get_channel(row, col, 0)
    }

    #[must_use]
    pub fn get_channel(&self, row: usize, col: usize, channel: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols || channel >= self.channels {
            return None;
        }
        self.data
            .get((row * self.cols + col) * self.channels + channel)
            .copied()
    }

    /// All values of one row, channels interleaved.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        let width = self.cols * self.channels;
        self.data.get(row * width..(row + 1) * width)
    }

    /// The stored form of the matrix: a mapping of `rows`, `cols`, `dt` and
    /// `data`. Built on first use and kept alongside the matrix.
    #[must_use]
    pub fn fields(&self) -> &NodeMap {
        self.fields.get_or_init(|| {
            let data = if self.depth.is_float() {
                self.data.iter().map(|&v| Node::Real(v)).collect()
            } else {
                self.data.iter().map(|&v| Node::Int(v as i64)).collect()
            };
            let mut map = NodeMap::with_capacity(4);
            map.insert("rows".to_string(), Node::Int(self.rows as i64));
            map.insert("cols".to_string(), Node::Int(self.cols as i64));
            map.insert("dt".to_string(), Node::Str(self.dt()));
            map.insert("data".to_string(), Node::Seq(data));
            map
        })
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, ";\n ")?;
            }
            let row = self.row(r).unwrap_or(&[]);
            for (i, v) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
        }
        write!(f, "]")
    }
}
