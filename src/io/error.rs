use std::{
    fmt,
    io,
    num::ParseFloatError,
};

use failure::Fail;


/// The kind of line inside an ASCII facet block. Used for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `facet normal <i> <j> <k>`
    Normal,
    /// `outer loop`
    OuterLoop,
    /// `vertex <x> <y> <z>`
    Vertex,
    /// `endloop`
    EndLoop,
    /// `endfacet`
    EndFacet,
}

impl LineKind {
    /// Number of whitespace separated fields a line of this kind has.
    pub fn field_count(&self) -> usize {
        match self {
            LineKind::Normal => 5,
            LineKind::OuterLoop => 2,
            LineKind::Vertex => 4,
            LineKind::EndLoop => 1,
            LineKind::EndFacet => 1,
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            LineKind::Normal => "unit vector",
            LineKind::OuterLoop => "outer loop",
            LineKind::Vertex => "coordinate",
            LineKind::EndLoop => "endloop",
            LineKind::EndFacet => "endfacet",
        };
        f.write_str(s)
    }
}

/// Everything that can go wrong while reading or writing STL.
///
/// A failed read never returns a partial mesh: the first error observed by
/// any part of the decode pipeline is the one returned.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(
        display = "input has no content: need at least {} bytes to detect the STL \
            encoding, but only {} are available",
        needed, available
    )]
    EmptyInput {
        needed: usize,
        available: usize,
    },

    #[fail(
        display = "binary STL is truncated: header declares {} triangles, but the input \
            ends after {} complete records and {} trailing bytes",
        expected, complete, trailing
    )]
    TruncatedInput {
        /// Number of triangles declared in the file, or 0 if the file ended
        /// before the count.
        expected: u32,
        complete: u32,
        trailing: usize,
    },

    #[fail(
        display = "ASCII STL ends in the middle of a facet block (at byte {}) without \
            'endsolid': {:?}",
        offset, fragment
    )]
    MalformedInput {
        offset: usize,
        fragment: String,
    },

    #[fail(display = "invalid input for {}: {}", kind, line)]
    FieldCount {
        kind: LineKind,
        line: String,
    },

    #[fail(
        display = "invalid input for {} {}: cannot parse {:?} as float: {}",
        kind, field, value, cause
    )]
    NumberFormat {
        kind: LineKind,
        /// One of `i`, `j`, `k` (normal) or `x`, `y`, `z` (vertex).
        field: char,
        value: String,
        #[cause]
        cause: ParseFloatError,
    },

    #[fail(
        display = "binary STL can store at most 4294967295 triangles, but the mesh has {}",
        _0
    )]
    TooManyTriangles(usize),

    #[fail(
        display = "parsing lookahead got too big (an ASCII line or block longer than {} bytes)",
        _0
    )]
    LookAheadTooBig(usize),

    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}
