//! JPEG marker emission for baseline frames.
//!
//! This module handles writing the marker segments of a baseline stream:
//! - SOI / EOI
//! - APP0 (JFIF header)
//! - DQT (Define Quantization Table)
//! - SOF0 (Start of Frame, baseline)
//! - DHT (Define Huffman Table)
//! - DRI (Define Restart Interval)
//! - SOS (Start of Scan)
//!
//! Reference: ITU-T T.81 Section B

use std::io::Write;

use crate::consts::{
    DCTSIZE2, JPEG_APP0, JPEG_DHT, JPEG_DQT, JPEG_DRI, JPEG_EOI, JPEG_NATURAL_ORDER, JPEG_SOF0,
    JPEG_SOI, JPEG_SOS,
};
use crate::huffman::HuffTable;
use crate::types::{ComponentInfo, ScanInfo};

/// JFIF identifier
const JFIF_ID: [u8; 5] = *b"JFIF\0";

/// JFIF version 1.01
const JFIF_VERSION: [u8; 2] = [1, 1];

/// Marker writer for JPEG encoding.
pub struct MarkerWriter<W: Write> {
    output: W,
    bytes_written: usize,
}

impl<W: Write> MarkerWriter<W> {
    /// Create a new marker writer.
    pub fn new(output: W) -> Self {
        Self {
            output,
            bytes_written: 0,
        }
    }

    fn emit_byte(&mut self, byte: u8) -> std::io::Result<()> {
        self.output.write_all(&[byte])?;
        self.bytes_written += 1;
        Ok(())
    }

    fn emit_2bytes(&mut self, value: u16) -> std::io::Result<()> {
        self.output.write_all(&value.to_be_bytes())?;
        self.bytes_written += 2;
        Ok(())
    }

    fn emit_marker(&mut self, marker: u8) -> std::io::Result<()> {
        self.emit_byte(0xFF)?;
        self.emit_byte(marker)
    }

    /// Write Start of Image marker.
    pub fn write_soi(&mut self) -> std::io::Result<()> {
        self.emit_marker(JPEG_SOI)
    }

    /// Write End of Image marker.
    pub fn write_eoi(&mut self) -> std::io::Result<()> {
        self.emit_marker(JPEG_EOI)
    }

    /// Write APP0 (JFIF) marker with 1:1 aspect ratio and no thumbnail.
    pub fn write_jfif_app0(&mut self) -> std::io::Result<()> {
        self.emit_marker(JPEG_APP0)?;

        // 2 (length) + 5 (identifier) + 2 (version) + 1 (units) +
        // 2 + 2 (density) + 1 + 1 (thumbnail size)
        self.emit_2bytes(16)?;
        for &b in &JFIF_ID {
            self.emit_byte(b)?;
        }
        self.emit_byte(JFIF_VERSION[0])?;
        self.emit_byte(JFIF_VERSION[1])?;

        // Unitless 1:1 density
        self.emit_byte(0)?;
        self.emit_2bytes(1)?;
        self.emit_2bytes(1)?;

        self.emit_byte(0)?;
        self.emit_byte(0)
    }

    /// Write one DQT segment holding all `tables`.
    ///
    /// # Arguments
    /// * `tables` - Slice of (table slot, values in natural order)
    ///
    /// Tables with any entry above 255 are written with 16-bit precision.
    pub fn write_dqt_multiple(&mut self, tables: &[(u8, &[u16; DCTSIZE2])]) -> std::io::Result<()> {
        if tables.is_empty() {
            return Ok(());
        }

        let needs_16bit = |table: &[u16; DCTSIZE2]| table.iter().any(|&v| v > 255);
        let total_len = 2 + tables
            .iter()
            .map(|(_, t)| 1 + if needs_16bit(*t) { 128 } else { 64 })
            .sum::<u16>();

        self.emit_marker(JPEG_DQT)?;
        self.emit_2bytes(total_len)?;

        for (slot, table) in tables {
            let wide = needs_16bit(*table);
            // Pq in high nibble, Tq in low nibble
            self.emit_byte(((wide as u8) << 4) | (slot & 0x0F))?;
            for &natural in JPEG_NATURAL_ORDER.iter() {
                let value = table[natural];
                if wide {
                    self.emit_2bytes(value)?;
                } else {
                    self.emit_byte(value as u8)?;
                }
            }
        }

        Ok(())
    }

    /// Write a baseline Start of Frame (SOF0) marker with 8-bit precision.
    pub fn write_sof0(
        &mut self,
        height: u16,
        width: u16,
        components: &[ComponentInfo],
    ) -> std::io::Result<()> {
        self.emit_marker(JPEG_SOF0)?;

        let num_components = components.len() as u16;
        self.emit_2bytes(8 + 3 * num_components)?;
        self.emit_byte(8)?;
        self.emit_2bytes(height)?;
        self.emit_2bytes(width)?;
        self.emit_byte(num_components as u8)?;

        for comp in components {
            self.emit_byte(comp.component_id)?;
            self.emit_byte((comp.h_samp_factor << 4) | comp.v_samp_factor)?;
            self.emit_byte(comp.quant_tbl_no)?;
        }

        Ok(())
    }

    /// Write one DHT segment holding all `tables`.
    ///
    /// # Arguments
    /// * `tables` - Slice of (table slot, is_ac, table)
    pub fn write_dht_multiple(&mut self, tables: &[(u8, bool, &HuffTable)]) -> std::io::Result<()> {
        if tables.is_empty() {
            return Ok(());
        }

        let total_len = 2 + tables
            .iter()
            .map(|(_, _, t)| 1 + 16 + t.num_symbols() as u16)
            .sum::<u16>();

        self.emit_marker(JPEG_DHT)?;
        self.emit_2bytes(total_len)?;

        for (slot, is_ac, table) in tables {
            // Tc in high nibble, Th in low nibble
            self.emit_byte(((*is_ac as u8) << 4) | (slot & 0x0F))?;
            for &count in &table.bits[1..=16] {
                self.emit_byte(count)?;
            }
            for &symbol in &table.huffval[..table.num_symbols()] {
                self.emit_byte(symbol)?;
            }
        }

        Ok(())
    }

    /// Write Start of Scan marker.
    pub fn write_sos(&mut self, scan: &ScanInfo, components: &[ComponentInfo]) -> std::io::Result<()> {
        self.emit_marker(JPEG_SOS)?;

        // 2 (length) + 1 (Ns) + 2*Ns + 3 (Ss, Se, Ah/Al)
        self.emit_2bytes(6 + 2 * scan.comps_in_scan as u16)?;
        self.emit_byte(scan.comps_in_scan)?;

        for &idx in &scan.component_index[..scan.comps_in_scan as usize] {
            if let Some(comp) = components.get(idx as usize) {
                self.emit_byte(comp.component_id)?;
                self.emit_byte((comp.dc_tbl_no << 4) | comp.ac_tbl_no)?;
            }
        }

        self.emit_byte(scan.ss)?;
        self.emit_byte(scan.se)?;
        self.emit_byte((scan.ah << 4) | scan.al)
    }

    /// Write Define Restart Interval marker (nothing for interval 0).
    pub fn write_dri(&mut self, interval: u16) -> std::io::Result<()> {
        if interval == 0 {
            return Ok(());
        }

        self.emit_marker(JPEG_DRI)?;
        self.emit_2bytes(4)?;
        self.emit_2bytes(interval)
    }

    /// Get total bytes written.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Consume the writer and return the underlying output.
    pub fn into_inner(self) -> W {
        self.output
    }
}
