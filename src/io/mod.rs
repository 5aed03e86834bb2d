//! Reading and writing STL files.
//!
//! Reading starts with a [`Reader`], which peeks at the first bytes of the
//! input to find out whether it's an ASCII or binary file. For the common
//! case, there are the shortcuts [`read`] and [`read_file`]. Writing is done
//! with a [`Writer`] created from a [`Config`].

use std::{
    fmt,
    fs::File,
    io,
    path::Path,
    thread,
};

use log::debug;

use crate::Mesh;
use self::buf::Buffer;


pub mod ascii;
pub mod binary;
mod buf;
mod error;
pub mod num;
mod pool;
pub mod sniff;
mod write;


pub use self::{
    error::{Error, LineKind},
    sniff::detect_encoding,
    write::{Config, Writer, encode_triangle},
};


/// The two flavors of STL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Binary,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Encoding::Ascii => "ASCII",
            Encoding::Binary => "binary",
        };
        f.write_str(s)
    }
}

/// Options for reading STL files. Use `Default::default()` and the `with_*`
/// methods to create one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Number of worker threads decoding triangles. *Default*: the available
    /// hardware parallelism.
    ///
    /// Tokenizing the input always happens on the calling thread. `0` is
    /// treated like `1`.
    pub concurrency: usize,

    /// Number of triangles in one work unit of the binary decoder.
    /// *Default*: 1000. `0` is treated like `1`.
    pub triangles_per_unit: usize,

    /// If `true`, triangles of ASCII files are returned in file order.
    /// *Default*: `false`.
    ///
    /// ASCII facets are parsed in parallel and collected in the order the
    /// workers finish. Restoring the file order requires sorting all
    /// triangles afterwards. Binary files are always returned in file order
    /// and this option does not affect them.
    pub preserve_text_order: bool,
}

impl ReadOptions {
    pub fn with_concurrency(self, concurrency: usize) -> Self {
        Self { concurrency, ..self }
    }

    pub fn with_triangles_per_unit(self, triangles_per_unit: usize) -> Self {
        Self { triangles_per_unit, ..self }
    }

    pub fn with_preserved_text_order(self, preserve_text_order: bool) -> Self {
        Self { preserve_text_order, ..self }
    }

    /// `concurrency`, clamped to be at least 1.
    pub(crate) fn workers(&self) -> usize {
        self.concurrency.max(1)
    }

    /// `triangles_per_unit`, clamped to be at least 1.
    pub(crate) fn unit_size(&self) -> usize {
        self.triangles_per_unit.max(1)
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            concurrency: thread::available_parallelism().map_or(1, |n| n.get()),
            triangles_per_unit: 1000,
            preserve_text_order: false,
        }
    }
}


/// A reader able to read ASCII and binary STL files.
///
/// The encoding is detected when the reader is created and can be inspected
/// with [`Reader::encoding`] before reading everything.
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    buf: Buffer<R>,
    encoding: Encoding,
}

impl Reader<File> {
    /// Opens the file at `path` and detects its encoding.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        // We don't need a `BufReader` here, because we will use our internal
        // parse buffer anyway.
        Self::new(File::open(path)?)
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new `Reader` from the given `io::Read` instance and detects
    /// the encoding. If you want to open a file, rather use [`Reader::open`].
    ///
    /// Fails with [`Error::EmptyInput`] if the input is too short to tell
    /// the encoding.
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut buf = Buffer::new(reader);
        let encoding = sniff::sniff(&mut buf)?;

        Ok(Self { buf, encoding })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Reads the whole file.
    ///
    /// Either all triangles are returned or the first error that occurred;
    /// there are no partial results.
    pub fn read(self, options: &ReadOptions) -> Result<Mesh, Error> {
        let mesh = match self.encoding {
            Encoding::Binary => binary::read(self.buf, options)?,
            Encoding::Ascii => ascii::read(self.buf, options)?,
        };
        debug!(
            "read {} STL '{}' with {} triangles",
            self.encoding,
            mesh.header(),
            mesh.triangle_count(),
        );

        Ok(mesh)
    }
}

/// Reads an STL file of any encoding from `reader`.
pub fn read(reader: impl io::Read, options: &ReadOptions) -> Result<Mesh, Error> {
    Reader::new(reader)?.read(options)
}

/// Reads the STL file at `path`.
pub fn read_file(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Mesh, Error> {
    Reader::open(path)?.read(options)
}
