//! Guessing whether an STL file is binary or ASCII.
//!
//! This is harder than it sounds because there is no clear metric. An ASCII
//! file starts with `solid <name>`. A binary file starts with an 80 byte
//! header that has no significance and may contain arbitrary data, including
//! `solid`. We look for `solid ` *with* the trailing space, which rules out
//! at least the binary files whose header is just `solid` followed by
//! padding. Binary files starting with `solid ` are still misdetected; that
//! ambiguity is inherent to the format.

use std::io::Read;

use log::debug;

use super::{buf::Buffer, Encoding, Error};


/// The bytes every ASCII STL file starts with.
pub const ASCII_SIGNATURE: &[u8] = b"solid ";

/// Decides the encoding from the first bytes of a file.
///
/// `start` needs to contain at least [`ASCII_SIGNATURE`]`.len()` bytes;
/// otherwise [`Error::EmptyInput`] is returned.
pub fn detect_encoding(start: &[u8]) -> Result<Encoding, Error> {
    if start.len() < ASCII_SIGNATURE.len() {
        return Err(Error::EmptyInput {
            needed: ASCII_SIGNATURE.len(),
            available: start.len(),
        });
    }

    if start.starts_with(ASCII_SIGNATURE) {
        Ok(Encoding::Ascii)
    } else {
        Ok(Encoding::Binary)
    }
}

/// Peeks at the start of `buf` (without consuming anything) to detect the
/// encoding.
pub(crate) fn sniff<R: Read>(buf: &mut Buffer<R>) -> Result<Encoding, Error> {
    buf.saturating_prepare(ASCII_SIGNATURE.len())?;
    let encoding = detect_encoding(buf.raw_buf())?;
    debug!("detected {:?} STL", encoding);

    Ok(encoding)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect() {
        assert_eq!(detect_encoding(b"solid foo\n").unwrap(), Encoding::Ascii);
        assert_eq!(detect_encoding(b"solid ").unwrap(), Encoding::Ascii);
        assert_eq!(detect_encoding(b"solidworks export").unwrap(), Encoding::Binary);
        assert_eq!(detect_encoding(&[0; 84]).unwrap(), Encoding::Binary);
        assert_eq!(detect_encoding(b"SOLID x").unwrap(), Encoding::Binary);
    }

    #[test]
    fn too_short() {
        for input in &[&b""[..], b"solid", b"\x00\x01"] {
            match detect_encoding(input) {
                Err(Error::EmptyInput { needed: 6, available }) => {
                    assert_eq!(available, input.len());
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn sniff_does_not_consume() -> Result<(), Error> {
        let mut buf = Buffer::new(&b"solid cube\n"[..]);
        assert_eq!(sniff(&mut buf)?, Encoding::Ascii);
        assert_eq!(buf.offset(), 0);
        assert!(buf.raw_buf().starts_with(b"solid cube"));
        Ok(())
    }
}
