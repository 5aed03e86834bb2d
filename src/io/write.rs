use std::{
    cmp,
    convert::TryFrom,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, warn};

use crate::{Mesh, Triangle};
use super::{
    Encoding, Error,
    binary::{HEADER_SIZE, TRIANGLE_SIZE},
    num::{write_f32, write_vec3_le},
    sniff::ASCII_SIGNATURE,
};


// ===============================================================================================
// ===== STL Config
// ===============================================================================================

/// Used to configure and create a [`Writer`].
///
/// The header/solid name is taken from the mesh being written.
#[derive(Clone, Debug)]
pub struct Config {
    encoding: Encoding,
}

impl Config {
    /// Creates a new builder instance from the given encoding. For
    /// convenience, you can use [`Config::binary()`] or [`Config::ascii()`]
    /// directly.
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// Creates a new builder instance for a binary STL file.
    pub fn binary() -> Self {
        Self::new(Encoding::Binary)
    }

    /// Creates a new builder instance for an ASCII STL file.
    ///
    /// **Note**: ASCII STL files are roughly five times larger than binary
    /// ones and slower to read. Only use this if you have to.
    pub fn ascii() -> Self {
        Self::new(Encoding::Ascii)
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Creates a [`Writer`] with `self` as config.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer::new(self, writer)
    }

    /// Writes the mesh to the file given by the filename. Overwrites the file
    /// if it already exists.
    pub fn write_to_file(&self, mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), Error> {
        let file = BufWriter::new(File::create(path)?);
        self.clone().into_writer(file).write(mesh)
    }

    /// Writes the mesh into a `Vec<u8>` which is returned on success.
    pub fn write_to_memory(&self, mesh: &Mesh) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.clone().into_writer(&mut out).write(mesh)?;
        Ok(out)
    }
}


// ===============================================================================================
// ===== STL Writer
// ===============================================================================================

/// A writer able to write binary and ASCII STL files.
///
/// Writing is sequential: the triangles are written in mesh order. The
/// writer does many small writes, so pass something buffered if the sink is
/// a file or socket.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    config: Config,
    writer: W,
}

impl<W: io::Write> Writer<W> {
    /// Creates a new STL writer with the given STL config which will write to
    /// the given `io::Write` instance.
    pub fn new(config: Config, writer: W) -> Self {
        Self { config, writer }
    }

    /// Writes `mesh` and flushes the underlying writer.
    pub fn write(self, mesh: &Mesh) -> Result<(), Error> {
        debug!(
            "writing {} triangles as {:?} STL",
            mesh.triangle_count(),
            self.config.encoding,
        );

        match self.config.encoding {
            Encoding::Binary => self.write_binary(mesh),
            Encoding::Ascii => self.write_ascii(mesh),
        }
    }

    #[inline(never)]
    fn write_binary(self, mesh: &Mesh) -> Result<(), Error> {
        let mut w = self.writer;
        let num_triangles = u32::try_from(mesh.triangle_count())
            .map_err(|_| Error::TooManyTriangles(mesh.triangle_count()))?;

        // 80 bytes header: the header text, cut off or padded with zeroes.
        let header = mesh.header().as_bytes();
        if header.starts_with(ASCII_SIGNATURE) {
            warn!("binary STL header starts with 'solid ': readers will likely think it's ASCII");
        }
        let mut header_buf = [0u8; HEADER_SIZE];
        let len = cmp::min(header.len(), HEADER_SIZE);
        header_buf[..len].copy_from_slice(&header[..len]);
        w.write_all(&header_buf)?;

        // Next, number of triangles
        w.write_u32::<LittleEndian>(num_triangles)?;

        let mut buf = [0; TRIANGLE_SIZE];
        for triangle in mesh.triangles() {
            encode_triangle(triangle, &mut buf);
            w.write_all(&buf)?;
        }

        w.flush()?;
        Ok(())
    }

    #[inline(never)]
    fn write_ascii(self, mesh: &Mesh) -> Result<(), Error> {
        let mut w = self.writer;

        writeln!(w, "solid {}", mesh.header())?;

        for triangle in mesh.triangles() {
            write!(w, " facet normal ")?;
            write_ascii_vector(&mut w, triangle.normal.to_array())?;
            writeln!(w)?;

            writeln!(w, "  outer loop")?;
            for vertex in &triangle.vertices {
                write!(w, "   vertex ")?;
                write_ascii_vector(&mut w, vertex.to_array())?;
                writeln!(w)?;
            }
            writeln!(w, "  endloop")?;
            writeln!(w, " endfacet")?;
        }

        writeln!(w, "endsolid {}", mesh.header())?;

        w.flush()?;
        Ok(())
    }
}

/// Encodes one triangle into its 50 byte record.
pub fn encode_triangle(triangle: &Triangle, out: &mut [u8; TRIANGLE_SIZE]) {
    write_vec3_le(&mut out[0..12], triangle.normal.to_array());
    write_vec3_le(&mut out[12..24], triangle.vertices[0].to_array());
    write_vec3_le(&mut out[24..36], triangle.vertices[1].to_array());
    write_vec3_le(&mut out[36..48], triangle.vertices[2].to_array());
    out[48..50].copy_from_slice(&triangle.attribute_byte_count.to_le_bytes());
}

/// Writes the three values of the given vector separated by ' '.
fn write_ascii_vector(w: &mut impl Write, [x, y, z]: [f32; 3]) -> Result<(), io::Error> {
    write_f32(w, x)?;
    w.write_all(b" ")?;
    write_f32(w, y)?;
    w.write_all(b" ")?;
    write_f32(w, z)?;

    Ok(())
}
