use std::{
    cmp::{max, min},
    fmt,
    io::{self, Read},
};

use super::Error;


/// The initial size of the buffer in bytes.
const START_BUFFER_SIZE: usize = 64 * 1024;

/// Minimal number of free bytes we want at the end of the buffer before
/// reading more data.
const MIN_READ_SIZE: usize = 8 * 1024;

/// The maximum size the internal buffer can grow to.
///
/// The buffer only ever holds one "piece" of the file at a time: the ASCII
/// header line, one facet block or the 84 byte binary preamble. None of these
/// are anywhere close to this limit in a sane file. Exceeding it is reported
/// as [`Error::LookAheadTooBig`].
pub(crate) const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

static_assertions::const_assert!(MIN_READ_SIZE < START_BUFFER_SIZE);
static_assertions::const_assert!(START_BUFFER_SIZE <= MAX_BUFFER_SIZE);

/// A growable window over an `io::Read` that lets the tokenizers look ahead
/// an arbitrary (but bounded) number of bytes.
pub(crate) struct Buffer<R: Read> {
    reader: R,

    buf: Vec<u8>,

    /// Points to the first byte in `buf` that is real data. Invariants:
    /// - `0 <= start <= end`
    start: usize,

    /// Points to the byte after the last byte of real data. Invariants:
    /// - `0 <= end <= buf.len()`
    /// - `start <= end`
    end: usize,

    consumed_total: usize,
}

impl<R: Read> fmt::Debug for Buffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Buffer {{ consumed_total: {}, buffered: {}, .. }}",
            self.consumed_total,
            self.len(),
        )
    }
}

impl<R: Read> Buffer<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            buf: vec![0; START_BUFFER_SIZE],
            reader,
            start: 0,
            end: 0,
            consumed_total: 0,
        }
    }

    // =======================================================================
    // ===== Internal methods
    // =======================================================================

    fn cap(&self) -> usize {
        self.buf.len()
    }

    /// Makes sure there is space for at least `additional` more bytes after
    /// `self.end`, either by moving the data to the front or by growing the
    /// buffer.
    #[inline(never)]
    fn grow_buf(&mut self, additional: usize) -> Result<(), Error> {
        let space_after = self.cap() - self.end;
        let space_before = self.start;

        if space_after >= additional {
            return Ok(());
        }

        // We only move the data if that makes enough room and the data is
        // less than half the buffer. Otherwise alternating small and large
        // requests could make us copy nearly the whole buffer again and
        // again.
        if space_after + space_before >= additional && self.len() < self.cap() / 2 {
            self.buf.copy_within(self.start..self.end, 0);
        } else {
            if self.len() + additional > MAX_BUFFER_SIZE {
                return Err(Error::LookAheadTooBig(MAX_BUFFER_SIZE));
            }

            // At least our current length + `additional`, but no less than
            // twice the current buffer size.
            let new_len = min(
                max(self.len() + additional, self.cap() * 2),
                MAX_BUFFER_SIZE,
            );

            let mut new = Vec::with_capacity(new_len);
            new.extend_from_slice(self.raw_buf());
            new.resize(new_len, 0);
            self.buf = new;
        }

        // In both cases, the data starts at the very beginning now.
        self.end -= self.start;
        self.start = 0;

        Ok(())
    }

    /// Reads once from the underlying reader into the free space at the
    /// end. Returns the number of bytes read, 0 means EOF.
    fn read_once(&mut self) -> Result<usize, Error> {
        loop {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(n) => {
                    self.end += n;
                    return Ok(n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    // =======================================================================
    // ===== Public interface
    // =======================================================================

    /// Number of buffered bytes.
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }

    /// The buffered bytes.
    pub(crate) fn raw_buf(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Tries to buffer at least `num_bytes` bytes. Stops early on EOF, so
    /// after this returns, `len()` might still be smaller than `num_bytes`.
    pub(crate) fn saturating_prepare(&mut self, num_bytes: usize) -> Result<(), Error> {
        if self.len() < num_bytes {
            self.grow_buf(num_bytes - self.len())?;
            while self.len() < num_bytes {
                if self.read_once()? == 0 {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads more data (at least one byte, unless EOF is reached) in addition
    /// to what is already buffered. Returns the number of new bytes; 0 means
    /// EOF.
    pub(crate) fn fill_more(&mut self) -> Result<usize, Error> {
        self.grow_buf(MIN_READ_SIZE)?;
        self.read_once()
    }

    pub(crate) fn consume(&mut self, num_bytes: usize) {
        assert!(self.start + num_bytes <= self.end);

        self.start += num_bytes;
        self.consumed_total += num_bytes;

        // If we consumed all the data, we set both indices to 0.
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    /// Reads exactly `out.len()` bytes unless EOF is reached first. Returns
    /// the number of bytes written into `out`.
    ///
    /// Buffered data is used first, the rest is read directly from the
    /// underlying reader.
    pub(crate) fn read_up_to(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        let from_buf = min(self.len(), out.len());
        out[..from_buf].copy_from_slice(&self.raw_buf()[..from_buf]);
        self.consume(from_buf);

        let mut filled = from_buf;
        while filled < out.len() {
            match self.reader.read(&mut out[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.consumed_total += filled - from_buf;
        Ok(filled)
    }

    /// The number of bytes consumed so far.
    pub(crate) fn offset(&self) -> usize {
        self.consumed_total
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// A reader that returns at most one byte per `read` call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn saturating_prepare_collects_short_reads() -> Result<(), Error> {
        let mut buf = Buffer::new(Trickle(b"solid abc"));
        buf.saturating_prepare(6)?;
        assert!(buf.len() >= 6);
        assert!(buf.raw_buf().starts_with(b"solid "));
        assert_eq!(buf.offset(), 0);

        buf.saturating_prepare(100)?;
        assert_eq!(buf.raw_buf(), b"solid abc");
        Ok(())
    }

    #[test]
    fn consume_and_read_up_to() -> Result<(), Error> {
        let data: Vec<u8> = (0..=255).collect();
        let mut buf = Buffer::new(&data[..]);
        buf.saturating_prepare(10)?;
        buf.consume(4);
        assert_eq!(buf.offset(), 4);

        let mut out = [0; 100];
        assert_eq!(buf.read_up_to(&mut out)?, 100);
        assert_eq!(out[0], 4);
        assert_eq!(out[99], 103);
        assert_eq!(buf.offset(), 104);

        let mut rest = vec![0; 500];
        assert_eq!(buf.read_up_to(&mut rest)?, 152);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.fill_more()?, 0);
        Ok(())
    }

    #[test]
    fn lookahead_is_bounded() {
        let data = vec![b'x'; MAX_BUFFER_SIZE + 10];
        let mut buf = Buffer::new(&data[..]);
        let res = buf.saturating_prepare(MAX_BUFFER_SIZE + 1);
        assert!(matches!(res, Err(Error::LookAheadTooBig(_))));
    }
}
