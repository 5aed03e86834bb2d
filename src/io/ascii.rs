//! Decoding ASCII STL.
//!
//! ```text
//! solid <name>
//!   facet normal <i> <j> <k>
//!     outer loop
//!       vertex <x> <y> <z>
//!       vertex <x> <y> <z>
//!       vertex <x> <y> <z>
//!     endloop
//!   endfacet
//!   ...
//! endsolid <name>
//! ```
//!
//! Finding the facet blocks requires scanning for line breaks, so this is
//! done sequentially by the [`TextTokenizer`]. Parsing the numbers is the
//! expensive part and happens on the workers.

use std::io::Read;

use log::{debug, trace};

use crate::{Coordinate, Mesh, Triangle, UnitVector};
use super::{
    Error, LineKind, ReadOptions,
    buf::Buffer,
    num::parse_f32,
    pool,
};


/// Number of lines of one facet block.
pub const LINES_PER_BLOCK: usize = 7;

/// The line that ends the list of facets.
pub const END_SIGNATURE: &[u8] = b"endsolid";

/// The kind of each line in a facet block.
const BLOCK_LAYOUT: [LineKind; LINES_PER_BLOCK] = [
    LineKind::Normal,
    LineKind::OuterLoop,
    LineKind::Vertex,
    LineKind::Vertex,
    LineKind::Vertex,
    LineKind::EndLoop,
    LineKind::EndFacet,
];

/// Result of [`split_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// A complete facet block is found at `data[start..end]`, without the
    /// final line break. The caller should consume `advance` bytes.
    Block {
        start: usize,
        end: usize,
        advance: usize,
    },

    /// The data does not contain a complete block yet.
    NeedMore,

    /// There are no more facets: `endsolid` was found or only whitespace is
    /// left at EOF.
    End,
}

/// Finds the next facet block at the start of `data`.
///
/// Leading whitespace (including blank lines) is skipped. A block is
/// complete once its 7th line break has been seen. `at_eof` says whether
/// more data could follow; if it is `true`, an incomplete block is an error
/// instead of [`Split::NeedMore`].
pub fn split_block(data: &[u8], at_eof: bool) -> Result<Split, Error> {
    let start = data.iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let rest = &data[start..];

    if rest.is_empty() {
        return Ok(if at_eof { Split::End } else { Split::NeedMore });
    }
    if rest.starts_with(END_SIGNATURE) {
        return Ok(Split::End);
    }
    if !at_eof && rest.len() < END_SIGNATURE.len() && END_SIGNATURE.starts_with(rest) {
        return Ok(Split::NeedMore);
    }

    let mut pos = start;
    for _ in 0..LINES_PER_BLOCK {
        match data[pos..].iter().position(|&b| b == b'\n') {
            Some(idx) => pos += idx + 1,
            None if at_eof => {
                return Err(Error::MalformedInput {
                    offset: start,
                    fragment: String::from_utf8_lossy(rest).into_owned(),
                });
            }
            None => return Ok(Split::NeedMore),
        }
    }

    Ok(Split::Block {
        start,
        end: pos - 1,
        advance: pos,
    })
}

/// One facet block as raw text, tagged with its position in the file.
#[derive(Debug, Clone)]
pub struct Block {
    pub index: u64,
    pub text: Vec<u8>,
}

/// Splits the body of an ASCII STL file into facet [`Block`]s.
#[derive(Debug)]
pub(crate) struct TextTokenizer<R: Read> {
    input: Buffer<R>,
    header: String,
    next_index: u64,
    done: bool,
}

impl<R: Read> TextTokenizer<R> {
    /// Reads the `solid <name>` line.
    pub(crate) fn new(mut input: Buffer<R>) -> Result<Self, Error> {
        let header = read_header(&mut input)?;

        Ok(Self {
            input,
            header,
            next_index: 0,
            done: false,
        })
    }

    pub(crate) fn header(&self) -> &str {
        &self.header
    }

    /// Returns the next facet block or `None` at the end of the facet list.
    pub(crate) fn next_block(&mut self) -> Result<Option<Block>, Error> {
        if self.done {
            return Ok(None);
        }

        let mut at_eof = false;
        loop {
            let split = split_block(self.input.raw_buf(), at_eof).map_err(|e| match e {
                Error::MalformedInput { offset, fragment } => Error::MalformedInput {
                    offset: offset + self.input.offset(),
                    fragment,
                },
                other => other,
            })?;

            match split {
                Split::Block { start, end, advance } => {
                    let block = Block {
                        index: self.next_index,
                        text: self.input.raw_buf()[start..end].to_vec(),
                    };
                    self.input.consume(advance);
                    self.next_index += 1;
                    return Ok(Some(block));
                }
                Split::End => {
                    self.done = true;
                    return Ok(None);
                }
                Split::NeedMore => {
                    at_eof = self.input.fill_more()? == 0;
                }
            }
        }
    }
}

/// Reads the first line and returns it without `solid` and surrounding
/// whitespace.
fn read_header<R: Read>(input: &mut Buffer<R>) -> Result<String, Error> {
    let mut searched = 0;
    let (line_len, consume) = loop {
        let data = input.raw_buf();
        if let Some(idx) = data[searched..].iter().position(|&b| b == b'\n') {
            break (searched + idx, searched + idx + 1);
        }
        searched = data.len();

        if input.fill_more()? == 0 {
            // A file with only a header line and no line break.
            let len = input.len();
            break (len, len);
        }
    };

    let line = String::from_utf8_lossy(&input.raw_buf()[..line_len]).into_owned();
    input.consume(consume);

    let line = line.trim();
    Ok(line.strip_prefix("solid").unwrap_or(line).trim().to_string())
}

/// Splits `line` into exactly `kind.field_count()` whitespace separated
/// fields.
fn fields<'a>(line: &'a str, kind: LineKind) -> Result<Vec<&'a str>, Error> {
    let fields: Vec<_> = line.split_whitespace().collect();
    if fields.len() != kind.field_count() {
        return Err(Error::FieldCount {
            kind,
            line: line.trim().to_string(),
        });
    }

    Ok(fields)
}

/// Parses the three numbers at the end of a normal or vertex line.
fn vec3(line: &str, kind: LineKind, names: [char; 3]) -> Result<[f32; 3], Error> {
    let fields = fields(line, kind)?;
    let numbers = &fields[fields.len() - 3..];

    let mut out = [0.0; 3];
    for ((slot, &value), &field) in out.iter_mut().zip(numbers).zip(&names) {
        *slot = parse_f32(value).map_err(|cause| Error::NumberFormat {
            kind,
            field,
            value: value.to_string(),
            cause,
        })?;
    }

    Ok(out)
}

/// Parses a `facet normal <i> <j> <k>` line.
pub fn parse_normal(line: &str) -> Result<UnitVector, Error> {
    vec3(line, LineKind::Normal, ['i', 'j', 'k']).map(UnitVector::from)
}

/// Parses a `vertex <x> <y> <z>` line.
pub fn parse_vertex(line: &str) -> Result<Coordinate, Error> {
    vec3(line, LineKind::Vertex, ['x', 'y', 'z']).map(Coordinate::from)
}

/// Parses one facet block as returned by [`split_block`] (exactly 7 lines).
///
/// The field count of every line is checked; the keywords themselves are
/// not.
pub fn parse_block(text: &[u8]) -> Result<Triangle, Error> {
    let text = String::from_utf8_lossy(text);
    let mut lines = text.split('\n');

    let mut normal = UnitVector::default();
    let mut vertices = [Coordinate::default(); 3];
    let mut next_vertex = vertices.iter_mut();
    for &kind in &BLOCK_LAYOUT {
        // Missing lines fail the field count check below.
        let line = lines.next().unwrap_or("");
        match kind {
            LineKind::Normal => normal = parse_normal(line)?,
            LineKind::Vertex => {
                if let Some(slot) = next_vertex.next() {
                    *slot = parse_vertex(line)?;
                }
            }
            _ => { fields(line, kind)?; }
        }
    }

    Ok(Triangle::new(normal, vertices))
}

/// Decodes an ASCII STL file whose `solid` line has not been consumed yet.
pub(crate) fn read<R: Read>(input: Buffer<R>, options: &ReadOptions) -> Result<Mesh, Error> {
    let mut tokenizer = TextTokenizer::new(input)?;
    let header = tokenizer.header().to_string();
    debug!(
        "decoding ASCII STL '{}' with {} workers (preserve order: {})",
        header,
        options.workers(),
        options.preserve_text_order,
    );

    let mut triangles = pool::run(
        options.workers(),
        Vec::new(),
        |dispatcher| {
            while let Some(block) = tokenizer.next_block()? {
                trace!("dispatching facet block #{}", block.index);
                if !dispatcher.dispatch(block) {
                    break;
                }
            }
            Ok(())
        },
        |block| parse_block(&block.text).map(|t| (block.index, t)),
        |acc: &mut Vec<(u64, Triangle)>, out| acc.push(out),
    )?;

    if options.preserve_text_order {
        triangles.sort_unstable_by_key(|&(index, _)| index);
    }
    debug!("decoded {} triangles from ASCII STL", triangles.len());

    Ok(Mesh::new(header, triangles.into_iter().map(|(_, t)| t).collect()))
}


#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "facet normal 0.05082 -0.24321 -0.96864\n  outer loop\n   \
        vertex -1000 0 0\n   vertex 0 -358 -934\n   vertex 0 -407 -914\n  endloop\n endfacet";

    #[test]
    fn split_full_block() {
        let data = format!("{}\n", BLOCK);
        assert_eq!(
            split_block(data.as_bytes(), false).unwrap(),
            Split::Block { start: 0, end: 135, advance: 136 },
        );
    }

    #[test]
    fn split_block_with_more_data() {
        let data = format!("{}\n{}\n", BLOCK, BLOCK);
        match split_block(data.as_bytes(), false).unwrap() {
            Split::Block { start, end, advance } => {
                assert_eq!(&data.as_bytes()[start..end], BLOCK.as_bytes());
                assert_eq!(advance, 136);
            }
            other => panic!("unexpected split: {:?}", other),
        }
    }

    #[test]
    fn split_skips_leading_whitespace() {
        let data = format!("\n   {}\n", BLOCK);
        assert_eq!(
            split_block(data.as_bytes(), true).unwrap(),
            Split::Block { start: 4, end: 139, advance: 140 },
        );
    }

    #[test]
    fn split_partial_block() {
        let data = b"facet normal 0.05082 -0.24321 -0.96864\n";
        assert_eq!(split_block(data, false).unwrap(), Split::NeedMore);
        assert_eq!(split_block(b"", false).unwrap(), Split::NeedMore);
        assert_eq!(split_block(b"  endso", false).unwrap(), Split::NeedMore);
    }

    #[test]
    fn split_end() {
        assert_eq!(split_block(b"", true).unwrap(), Split::End);
        assert_eq!(split_block(b" \n\n", true).unwrap(), Split::End);
        assert_eq!(
            split_block(b"endsolid ASCII_STL_of_a_sphericon_by_CMG_Lee\n", true).unwrap(),
            Split::End,
        );
        assert_eq!(split_block(b"endsolid", false).unwrap(), Split::End);
    }

    #[test]
    fn split_truncated_at_eof() {
        let data = b"facet normal 0 0 1\n outer loop\n vertex 0 0 0\n";
        match split_block(data, true) {
            Err(Error::MalformedInput { offset: 0, fragment }) => {
                assert!(fragment.starts_with("facet normal"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(split_block(b"endso", true).is_err());
    }

    #[test]
    fn header_line() -> Result<(), Error> {
        let mut input = Buffer::new(&b"solid  my part \r\nfacet"[..]);
        assert_eq!(read_header(&mut input)?, "my part");
        assert_eq!(input.raw_buf(), b"facet");

        let mut input = Buffer::new(&b"solid t"[..]);
        assert_eq!(read_header(&mut input)?, "t");
        Ok(())
    }

    #[test]
    fn normal_line() {
        assert_eq!(
            parse_normal(" facet normal 0.01388 -0.69223 -0.72154").unwrap(),
            UnitVector::new(0.01388, -0.69223, -0.72154),
        );
    }

    #[test]
    fn normal_line_errors() {
        let err = parse_normal(" facet normal 0.01388 -0.69223").unwrap_err();
        assert_eq!(err.to_string(), "invalid input for unit vector: facet normal 0.01388 -0.69223");

        for &(line, expected) in &[
            (" facet normal 0.01388 -0.69223 a", 'k'),
            (" facet normal 0.01388 a -0.72154", 'j'),
            (" facet normal a -0.69223 a", 'i'),
        ] {
            match parse_normal(line) {
                Err(Error::NumberFormat { kind: LineKind::Normal, field, value, .. }) => {
                    assert_eq!(field, expected);
                    assert_eq!(value, "a");
                }
                other => panic!("unexpected result for {:?}: {:?}", line, other),
            }
        }
    }

    #[test]
    fn vertex_line() {
        assert_eq!(
            parse_vertex("   vertex -1000 0 0").unwrap(),
            Coordinate::new(-1000.0, 0.0, 0.0),
        );
        assert_eq!(
            parse_vertex("\tvertex  1.5e2\t-2 3.25  \r").unwrap(),
            Coordinate::new(150.0, -2.0, 3.25),
        );
    }

    #[test]
    fn vertex_line_errors() {
        let err = parse_vertex("   vertex -1000 0 ").unwrap_err();
        assert_eq!(err.to_string(), "invalid input for coordinate: vertex -1000 0");

        for &(line, expected) in &[
            ("   vertex -1000 0 a", 'z'),
            ("   vertex -1000 a 0", 'y'),
            ("   vertex a 0 0", 'x'),
        ] {
            match parse_vertex(line) {
                Err(Error::NumberFormat { kind: LineKind::Vertex, field, .. }) => {
                    assert_eq!(field, expected);
                }
                other => panic!("unexpected result for {:?}: {:?}", line, other),
            }
        }
    }

    #[test]
    fn block() {
        let t = parse_block(BLOCK.as_bytes()).unwrap();
        assert_eq!(t.normal, UnitVector::new(0.05082, -0.24321, -0.96864));
        assert_eq!(t.vertices, [
            Coordinate::new(-1000.0, 0.0, 0.0),
            Coordinate::new(0.0, -358.0, -934.0),
            Coordinate::new(0.0, -407.0, -914.0),
        ]);
        assert_eq!(t.attribute_byte_count, 0);
    }

    #[test]
    fn block_third_vertex_error() {
        let text = BLOCK.replace("vertex 0 -407 -914", "vertex 0 abc -914");
        match parse_block(text.as_bytes()) {
            Err(Error::NumberFormat { kind: LineKind::Vertex, field: 'y', value, .. }) => {
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn block_field_counts() {
        let text = BLOCK.replace("outer loop", "outer loop now");
        match parse_block(text.as_bytes()) {
            Err(Error::FieldCount { kind: LineKind::OuterLoop, line }) => {
                assert_eq!(line, "outer loop now");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let text = BLOCK.replace(" endfacet", "");
        assert!(matches!(
            parse_block(text.as_bytes()),
            Err(Error::FieldCount { kind: LineKind::EndFacet, .. })
        ));
    }

    #[test]
    fn tokenizer_yields_indexed_blocks() -> Result<(), Error> {
        let data = format!("solid x\n{}\n {}\nendsolid x\n", BLOCK, BLOCK);
        let mut tokenizer = TextTokenizer::new(Buffer::new(data.as_bytes()))?;
        assert_eq!(tokenizer.header(), "x");

        for i in 0..2 {
            let block = tokenizer.next_block()?.expect("block");
            assert_eq!(block.index, i);
            assert_eq!(block.text, BLOCK.as_bytes());
        }
        assert!(tokenizer.next_block()?.is_none());
        assert!(tokenizer.next_block()?.is_none());
        Ok(())
    }

    #[test]
    fn tokenizer_reports_absolute_offset() {
        let data = format!("solid x\n{}\nfacet normal 1 2 3\n", BLOCK);
        let mut tokenizer = TextTokenizer::new(Buffer::new(data.as_bytes())).unwrap();
        assert!(tokenizer.next_block().unwrap().is_some());
        match tokenizer.next_block() {
            Err(Error::MalformedInput { offset, .. }) => assert_eq!(offset, 8 + 136),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
