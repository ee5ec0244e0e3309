//! Bounded output sink over a caller-provided byte slice.

use std::io::{self, Write};

/// A [`Write`] implementation that fills a fixed `&mut [u8]` and never
/// writes past its end.
///
/// Once a write does not fit, the sink copies what it can, records the
/// overflow and fails with [`io::ErrorKind::WriteZero`]. The encoder maps
/// that failure onto [`Error::OutputTooSmall`](crate::Error::OutputTooSmall).
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
    overflowed: bool,
}

impl<'a> SliceSink<'a> {
    /// Wrap `buf`; writing starts at offset 0.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            overflowed: false,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total capacity of the underlying slice.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Whether a write was ever refused for lack of space.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl Write for SliceSink<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let remaining = self.buf.len() - self.pos;
        if data.len() > remaining {
            self.overflowed = true;
        }
        let n = data.len().min(remaining);
        if n == 0 && !data.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "output buffer is full",
            ));
        }
        self.buf[self.pos..self.pos + n].copy_from_slice(&data[..n]);
        self.pos += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_within_capacity() {
        let mut buf = [0u8; 4];
        let mut sink = SliceSink::new(&mut buf);
        sink.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(sink.position(), 3);
        assert!(!sink.overflowed());
        assert_eq!(buf, [1, 2, 3, 0]);
    }

    #[test]
    fn test_overflow_never_writes_past_end() {
        let mut buf = [0u8; 4];
        let mut sink = SliceSink::new(&mut buf);
        let err = sink.write_all(&[9; 6]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert!(sink.overflowed());
        assert_eq!(sink.position(), 4);
        assert_eq!(buf, [9; 4]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut sink = SliceSink::new(&mut []);
        assert!(sink.write_all(&[]).is_ok());
        assert!(sink.write_all(&[1]).is_err());
        assert_eq!(sink.capacity(), 0);
    }
}
