//! Bitstream writer for JPEG entropy-coded segments.
//!
//! Bits accumulate MSB-first in a 64-bit buffer and are drained eight bytes
//! at a time. Every 0xFF byte that reaches the output is followed by a
//! stuffed 0x00 so it cannot be mistaken for a marker, and segments end
//! padded to a byte boundary with 1-bits.

use std::io::Write;

use crate::consts::JPEG_RST0;

/// Size of the bit buffer in bits
const BIT_BUF_SIZE: i32 = 64;

/// True if any byte lane of `word` is 0xFF.
#[inline]
fn has_ff_byte(word: u64) -> bool {
    // A lane is 0xFF iff its high bit is set and adding one carries out of it
    word & 0x8080_8080_8080_8080 & !word.wrapping_add(0x0101_0101_0101_0101) != 0
}

/// Bitstream writer for JPEG encoding.
pub struct BitWriter<W: Write> {
    /// Output destination
    output: W,
    /// Pending bits, right-aligned
    put_buffer: u64,
    /// Number of free bits remaining in the buffer
    free_bits: i32,
    /// Bytes handed to `output`, including stuffing
    bytes_written: usize,
}

impl<W: Write> BitWriter<W> {
    /// Create a new bitstream writer.
    pub fn new(output: W) -> Self {
        Self {
            output,
            put_buffer: 0,
            free_bits: BIT_BUF_SIZE,
            bytes_written: 0,
        }
    }

    /// Append the low `size` bits of `code` (1-16 bits).
    #[inline]
    pub fn put_bits(&mut self, code: u32, size: u8) -> std::io::Result<()> {
        debug_assert!(size <= 16, "Size must be <= 16 bits");
        debug_assert!(code < (1 << size), "Code exceeds size bits");

        let size = size as i32;
        if size <= self.free_bits {
            // A shift by 64 is only possible when size == 64, which never happens
            self.put_buffer = (self.put_buffer << size) | code as u64;
            self.free_bits -= size;
            return Ok(());
        }

        // Fill the buffer with the high bits, drain it, keep the rest
        let carried = size - self.free_bits;
        let word = (self.put_buffer << self.free_bits) | (code as u64 >> carried);
        self.drain_word(word)?;
        self.put_buffer = code as u64 & ((1u64 << carried) - 1);
        self.free_bits = BIT_BUF_SIZE - carried;
        Ok(())
    }

    /// Write a full 64-bit word, stuffing where needed.
    fn drain_word(&mut self, word: u64) -> std::io::Result<()> {
        if has_ff_byte(word) {
            for byte in word.to_be_bytes() {
                self.emit_byte_stuffed(byte)?;
            }
        } else {
            self.output.write_all(&word.to_be_bytes())?;
            self.bytes_written += 8;
        }
        Ok(())
    }

    /// Emit a single byte with 0xFF stuffing.
    #[inline]
    fn emit_byte_stuffed(&mut self, byte: u8) -> std::io::Result<()> {
        if byte == 0xFF {
            self.output.write_all(&[0xFF, 0x00])?;
            self.bytes_written += 2;
        } else {
            self.output.write_all(&[byte])?;
            self.bytes_written += 1;
        }
        Ok(())
    }

    /// Flush remaining bits to output, padding with 1s to byte boundary.
    pub fn flush(&mut self) -> std::io::Result<()> {
        let pending = BIT_BUF_SIZE - self.free_bits;
        if pending == 0 {
            return Ok(());
        }

        let padding = (8 - pending % 8) % 8;
        let total = pending + padding;
        let padded = (self.put_buffer << padding) | ((1u64 << padding) - 1);
        for i in (0..total / 8).rev() {
            self.emit_byte_stuffed((padded >> (i * 8)) as u8)?;
        }

        self.put_buffer = 0;
        self.free_bits = BIT_BUF_SIZE;
        Ok(())
    }

    /// Flush and write restart marker `RSTn` (n is taken modulo 8).
    pub fn emit_restart(&mut self, restart_num: u8) -> std::io::Result<()> {
        self.flush()?;
        self.write_bytes(&[0xFF, JPEG_RST0 + (restart_num & 0x07)])
    }

    /// Write raw bytes directly (not bit-stuffed).
    ///
    /// The bit buffer must be byte-aligned (flushed) before calling this.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        debug_assert!(
            self.free_bits == BIT_BUF_SIZE,
            "Buffer must be flushed before writing raw bytes"
        );
        self.output.write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    /// Get the number of bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Consume the writer and return the underlying output.
    ///
    /// Pending bits are discarded; call [`flush`](Self::flush) first.
    pub fn into_inner(self) -> W {
        self.output
    }
}
