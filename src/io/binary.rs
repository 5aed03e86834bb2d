//! Decoding binary STL.
//!
//! Layout: an 80 byte header with no defined meaning, the number of
//! triangles as `u32`, then one 50 byte record per triangle:
//!
//! ```text
//!   normal   i j k   3 × f32
//!   vertex a x y z   3 × f32
//!   vertex b x y z   3 × f32
//!   vertex c x y z   3 × f32
//!   attribute count  u16
//! ```
//!
//! Everything is little endian, including the attribute byte count.

use std::{cmp::min, io::Read};

use log::{debug, trace, warn};

use crate::{Coordinate, Mesh, Triangle, UnitVector};
use super::{
    Error, ReadOptions,
    buf::Buffer,
    num::read_vec3_le,
    pool,
};


/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 80;

/// Size of one triangle record in bytes.
pub const TRIANGLE_SIZE: usize = 4 * 3 * 4 + 2;

/// Upper bound for how many result slots are allocated up front. The triangle
/// count in the file is not trusted for huge allocations; beyond this, the
/// result buffer grows as work units arrive.
const MAX_PREALLOC_TRIANGLES: usize = 1 << 20;

static_assertions::const_assert_eq!(TRIANGLE_SIZE, 50);


/// A contiguous run of raw triangle records, tagged with the index of its
/// first triangle in the whole file.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub offset: u32,
    pub data: Vec<u8>,
}

impl WorkUnit {
    pub fn num_triangles(&self) -> usize {
        self.data.len() / TRIANGLE_SIZE
    }
}

/// Splits the triangle records of a binary STL file into [`WorkUnit`]s.
#[derive(Debug)]
pub(crate) struct BinaryTokenizer<R: Read> {
    input: Buffer<R>,
    header: String,
    triangle_count: u32,
    next_offset: u32,
    triangles_per_unit: usize,
}

impl<R: Read> BinaryTokenizer<R> {
    /// Reads the header and the triangle count.
    pub(crate) fn new(mut input: Buffer<R>, triangles_per_unit: usize) -> Result<Self, Error> {
        input.saturating_prepare(HEADER_SIZE + 4)?;
        if input.len() < HEADER_SIZE + 4 {
            return Err(Error::TruncatedInput {
                expected: 0,
                complete: 0,
                trailing: input.len(),
            });
        }

        let raw = input.raw_buf();
        let header = decode_header(&raw[..HEADER_SIZE]);
        let triangle_count = u32::from_le_bytes([
            raw[HEADER_SIZE],
            raw[HEADER_SIZE + 1],
            raw[HEADER_SIZE + 2],
            raw[HEADER_SIZE + 3],
        ]);
        input.consume(HEADER_SIZE + 4);

        Ok(Self {
            input,
            header,
            triangle_count,
            next_offset: 0,
            triangles_per_unit: triangles_per_unit.max(1),
        })
    }

    pub(crate) fn header(&self) -> &str {
        &self.header
    }

    pub(crate) fn triangle_count(&self) -> u32 {
        self.triangle_count
    }

    /// Returns the next work unit or `None` once all declared triangles have
    /// been read.
    pub(crate) fn next_unit(&mut self) -> Result<Option<WorkUnit>, Error> {
        let remaining = (self.triangle_count - self.next_offset) as usize;
        if remaining == 0 {
            return Ok(None);
        }

        let num_triangles = min(remaining, self.triangles_per_unit);
        let mut data = vec![0; num_triangles * TRIANGLE_SIZE];
        let filled = self.input.read_up_to(&mut data)?;
        if filled < data.len() {
            return Err(Error::TruncatedInput {
                expected: self.triangle_count,
                complete: self.next_offset + (filled / TRIANGLE_SIZE) as u32,
                trailing: filled % TRIANGLE_SIZE,
            });
        }

        let unit = WorkUnit {
            offset: self.next_offset,
            data,
        };
        self.next_offset += num_triangles as u32;

        // The source is not read past the declared records. Only bytes that
        // already arrived with the last records are noticed here.
        if self.next_offset == self.triangle_count && self.input.len() > 0 {
            warn!(
                "ignoring data after the {} triangles declared in the binary STL header",
                self.triangle_count,
            );
        }

        Ok(Some(unit))
    }
}

/// The header is exposed without surrounding whitespace and NUL padding.
fn decode_header(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

/// Decodes one 50 byte triangle record.
pub fn decode_triangle(record: &[u8; TRIANGLE_SIZE]) -> Triangle {
    let vertex = |offset: usize| Coordinate::from(read_vec3_le(&record[offset..]));

    Triangle {
        normal: UnitVector::from(read_vec3_le(&record[0..])),
        vertices: [vertex(12), vertex(24), vertex(36)],
        attribute_byte_count: u16::from_le_bytes([record[48], record[49]]),
    }
}

/// Decodes all records of one work unit. Returns the unit's offset with the
/// triangles.
pub fn decode_unit(unit: WorkUnit) -> (u32, Vec<Triangle>) {
    let triangles = unit.data
        .chunks_exact(TRIANGLE_SIZE)
        .map(|chunk| {
            let mut record = [0; TRIANGLE_SIZE];
            record.copy_from_slice(chunk);
            decode_triangle(&record)
        })
        .collect();

    (unit.offset, triangles)
}

/// Result buffer of the binary pipeline. Each decoded unit is written to its
/// offset, so the final order is the file order no matter which worker
/// finishes first.
struct Placement {
    slots: Vec<Triangle>,
    placed: usize,
}

impl Placement {
    fn new(triangle_count: u32) -> Self {
        Self {
            slots: Vec::with_capacity(min(triangle_count as usize, MAX_PREALLOC_TRIANGLES)),
            placed: 0,
        }
    }

    fn place(&mut self, offset: u32, triangles: &[Triangle]) {
        let start = offset as usize;
        let end = start + triangles.len();
        if self.slots.len() < end {
            self.slots.resize(end, Triangle::default());
        }

        self.slots[start..end].copy_from_slice(triangles);
        self.placed += triangles.len();
    }
}

/// Decodes a binary STL file whose header has not been consumed yet.
pub(crate) fn read<R: Read>(input: Buffer<R>, options: &ReadOptions) -> Result<Mesh, Error> {
    let mut tokenizer = BinaryTokenizer::new(input, options.unit_size())?;
    let triangle_count = tokenizer.triangle_count();
    let header = tokenizer.header().to_string();
    debug!(
        "decoding {} binary STL triangles with {} workers ({} triangles per unit)",
        triangle_count,
        options.workers(),
        options.unit_size(),
    );

    let placement = pool::run(
        options.workers(),
        Placement::new(triangle_count),
        |dispatcher| {
            while let Some(unit) = tokenizer.next_unit()? {
                trace!("dispatching binary unit at offset {}", unit.offset);
                if !dispatcher.dispatch(unit) {
                    break;
                }
            }
            Ok(())
        },
        |unit| Ok(decode_unit(unit)),
        |placement, (offset, triangles)| placement.place(offset, &triangles),
    )?;

    debug_assert_eq!(placement.placed, triangle_count as usize);
    debug_assert_eq!(placement.slots.len(), triangle_count as usize);

    Ok(Mesh::new(header, placement.slots))
}
