//! Huffman entropy encoder for baseline scans.
//!
//! This module implements sequential Huffman encoding of quantized blocks:
//! - DC coefficient encoding with differential coding
//! - AC coefficient encoding with run-length coding
//! - EOB (End of Block) and ZRL (Zero Run Length) symbols
//!
//! Reference: ITU-T T.81 Section F.1.2

use std::io::Write;

use crate::bitstream::BitWriter;
use crate::consts::{DCTSIZE2, JPEG_NATURAL_ORDER, NUM_COMPONENTS};
use crate::huffman::DerivedTable;

/// EOB (End of Block) symbol - run=0, size=0
const EOB: u8 = 0x00;

/// ZRL symbol - sixteen consecutive zeros
const ZRL: u8 = 0xF0;

/// Number of bits needed to represent a value (its JPEG "category").
///
/// - 0 → 0 bits
/// - ±1 → 1 bit
/// - -3..-2, 2..3 → 2 bits
/// - etc.
#[inline]
pub fn jpeg_nbits(value: i16) -> u8 {
    16 - value.unsigned_abs().leading_zeros() as u8
}

/// Category and appended bits for a nonzero-or-zero coefficient.
///
/// Negative values are sent as the low `nbits` of `value - 1`.
#[inline]
fn magnitude_bits(value: i16) -> (u8, u32) {
    let nbits = jpeg_nbits(value);
    let bits = if value < 0 {
        (value as i32 - 1) as u32 & ((1u32 << nbits) - 1)
    } else {
        value as u32
    };
    (nbits, bits)
}

/// Entropy encoder state for a single scan.
pub struct EntropyEncoder<W: Write> {
    writer: BitWriter<W>,
    /// Last DC value for each component (for differential coding)
    last_dc_val: [i16; NUM_COMPONENTS],
}

impl<W: Write> EntropyEncoder<W> {
    /// Create a new entropy encoder.
    pub fn new(writer: BitWriter<W>) -> Self {
        Self {
            writer,
            last_dc_val: [0; NUM_COMPONENTS],
        }
    }

    /// Flush, write `RSTn`, and reset DC predictions.
    pub fn emit_restart(&mut self, restart_num: u8) -> std::io::Result<()> {
        self.writer.emit_restart(restart_num)?;
        self.last_dc_val = [0; NUM_COMPONENTS];
        Ok(())
    }

    /// Get the last DC value for a component.
    pub fn last_dc(&self, component: usize) -> i16 {
        self.last_dc_val[component]
    }

    /// Encode a single 8x8 block of quantized coefficients.
    ///
    /// # Arguments
    /// * `block` - 64 quantized coefficients in natural (row-major) order
    /// * `component` - Component index (for DC prediction tracking)
    /// * `dc_table` - Derived Huffman table for DC coefficients
    /// * `ac_table` - Derived Huffman table for AC coefficients
    pub fn encode_block(
        &mut self,
        block: &[i16; DCTSIZE2],
        component: usize,
        dc_table: &DerivedTable,
        ac_table: &DerivedTable,
    ) -> std::io::Result<()> {
        self.encode_dc(block[0], component, dc_table)?;
        self.encode_ac(block, ac_table)
    }

    fn encode_dc(
        &mut self,
        dc: i16,
        component: usize,
        dc_table: &DerivedTable,
    ) -> std::io::Result<()> {
        let diff = dc.wrapping_sub(self.last_dc_val[component]);
        self.last_dc_val[component] = dc;

        let (nbits, bits) = magnitude_bits(diff);
        self.emit_symbol(dc_table, nbits)?;
        if nbits > 0 {
            self.writer.put_bits(bits, nbits)?;
        }
        Ok(())
    }

    fn encode_ac(&mut self, block: &[i16; DCTSIZE2], ac_table: &DerivedTable) -> std::io::Result<()> {
        let mut run = 0u8;

        for &natural in JPEG_NATURAL_ORDER[1..].iter() {
            let coef = block[natural];
            if coef == 0 {
                run += 1;
                continue;
            }

            while run >= 16 {
                self.emit_symbol(ac_table, ZRL)?;
                run -= 16;
            }

            let (nbits, bits) = magnitude_bits(coef);
            debug_assert!(nbits <= 10, "AC coefficient out of range: {}", coef);
            self.emit_symbol(ac_table, (run << 4) | nbits)?;
            self.writer.put_bits(bits, nbits)?;
            run = 0;
        }

        if run > 0 {
            self.emit_symbol(ac_table, EOB)?;
        }
        Ok(())
    }

    #[inline]
    fn emit_symbol(&mut self, table: &DerivedTable, symbol: u8) -> std::io::Result<()> {
        let (code, size) = table.get_code(symbol);
        debug_assert!(size > 0, "no Huffman code for symbol {:#04x}", symbol);
        self.writer.put_bits(code, size)
    }

    /// Flush any remaining bits to the output.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Bytes of entropy-coded data written so far, including stuffing.
    pub fn bytes_written(&self) -> usize {
        self.writer.bytes_written()
    }

    /// Consume the encoder and return the bit writer.
    pub fn into_inner(self) -> BitWriter<W> {
        self.writer
    }
}
