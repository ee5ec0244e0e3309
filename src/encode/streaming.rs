//! Scanline-driven encoding of one frame.
//!
//! [`EncodingStream`] writes the stream header up front, accepts rows in
//! batches, and entropy-codes each MCU row as soon as enough rows for it
//! have arrived. Only one MCU row of samples is ever buffered, in scratch
//! memory owned by the session.

use std::io::Write;

use log::trace;

use crate::bitstream::BitWriter;
use crate::color::convert_packed_row;
use crate::consts::{BYTES_PER_PIXEL, DCTSIZE, DCTSIZE2, NUM_COMPONENTS};
use crate::dct::{forward_dct_8x8, load_level_shifted};
use crate::entropy::EntropyEncoder;
use crate::error::{Error, Result};
use crate::marker::MarkerWriter;
use crate::quant::quantize_block;
use crate::sample::{downsample_plane, expand_right_edge, mcu_aligned};
use crate::types::{ComponentInfo, PixelLayout, ScanInfo};

use super::helpers::{create_components, try_grow_vec, EncodeTables};
use super::CompressorConfig;

/// Per-session sample buffers, sized for one MCU row.
///
/// Kept across images so that encoding a stream of same-sized frames does
/// not allocate.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    /// Full-resolution Y, Cb and Cr rows for the current MCU row
    planes: [Vec<u8>; NUM_COMPONENTS],
    /// Downsampled Cb and Cr for the current MCU row
    chroma: [Vec<u8>; 2],
}

impl Scratch {
    /// Reserve room for MCU rows `padded_width` samples wide.
    pub fn with_width(padded_width: usize, mcu_height: usize) -> Result<Self> {
        let mut scratch = Self::default();
        scratch.prepare(padded_width, mcu_height, (1, 1))?;
        Ok(scratch)
    }

    /// Size the buffers for one MCU row of the given geometry.
    fn prepare(
        &mut self,
        padded_width: usize,
        mcu_height: usize,
        ratio: (usize, usize),
    ) -> Result<()> {
        let full = padded_width * mcu_height;
        for plane in &mut self.planes {
            try_grow_vec(plane, 0, full)?;
        }
        // 4:4:4 codes chroma straight from the full-resolution rows
        let reduced = if ratio == (1, 1) {
            0
        } else {
            (padded_width / ratio.0) * (mcu_height / ratio.1)
        };
        for plane in &mut self.chroma {
            try_grow_vec(plane, 0, reduced)?;
        }
        Ok(())
    }

    /// Total bytes currently reserved.
    pub fn capacity(&self) -> usize {
        self.planes.iter().map(Vec::capacity).sum::<usize>()
            + self.chroma.iter().map(Vec::capacity).sum::<usize>()
    }
}

/// An in-progress frame.
///
/// Created by [`EncodingStream::start`], fed with
/// [`write_rows`](EncodingStream::write_rows), completed by
/// [`finish`](EncodingStream::finish). Dropping a stream without finishing
/// leaves a truncated stream in the output.
pub(crate) struct EncodingStream<'s, W: Write> {
    encoder: EntropyEncoder<W>,
    tables: &'s EncodeTables,
    scratch: &'s mut Scratch,
    components: [ComponentInfo; NUM_COMPONENTS],
    layout: PixelLayout,
    width: usize,
    height: usize,
    padded_width: usize,
    mcu_width: usize,
    mcu_height: usize,
    /// Luma-to-chroma sampling ratio (horizontal, vertical)
    chroma_ratio: (usize, usize),
    /// Rows buffered for the MCU row being assembled
    rows_buffered: usize,
    /// Rows accepted so far
    rows_received: usize,
    restart_interval: usize,
    mcus_since_restart: usize,
    next_restart_num: u8,
    header_bytes: usize,
}

impl<'s, W: Write> EncodingStream<'s, W> {
    /// Write the stream header and prepare to accept rows.
    ///
    /// Dimensions must already be validated.
    pub fn start(
        output: W,
        config: &CompressorConfig,
        tables: &'s EncodeTables,
        scratch: &'s mut Scratch,
        width: u16,
        height: u16,
    ) -> Result<Self> {
        let components = create_components(config.subsampling);
        let (mcu_width, mcu_height) = config.subsampling.mcu_size();
        let (h_max, v_max) = config.subsampling.luma_factors();
        let chroma_ratio = (h_max as usize, v_max as usize);
        let padded_width = mcu_aligned(width as usize, mcu_width);
        scratch.prepare(padded_width, mcu_height, chroma_ratio)?;

        let mut marker = MarkerWriter::new(output);
        marker.write_soi()?;
        if config.write_jfif {
            marker.write_jfif_app0()?;
        }
        if !config.omit_quant_tables {
            marker.write_dqt_multiple(&[
                (0, &tables.quant[0].values),
                (1, &tables.quant[1].values),
            ])?;
        }
        marker.write_sof0(height, width, &components)?;
        if !config.omit_huffman_tables {
            let dht = tables
                .huffman
                .each_ref()
                .map(|(slot, is_ac, table)| (*slot, *is_ac, table));
            marker.write_dht_multiple(&dht)?;
        }
        marker.write_dri(config.restart_interval)?;
        marker.write_sos(&ScanInfo::sequential(), &components)?;
        let header_bytes = marker.bytes_written();

        Ok(Self {
            encoder: EntropyEncoder::new(BitWriter::new(marker.into_inner())),
            tables,
            scratch,
            components,
            layout: config.layout,
            width: width as usize,
            height: height as usize,
            padded_width,
            mcu_width,
            mcu_height,
            chroma_ratio,
            rows_buffered: 0,
            rows_received: 0,
            restart_interval: config.restart_interval as usize,
            mcus_since_restart: 0,
            next_restart_num: 0,
            header_bytes,
        })
    }

    /// Accept a batch of rows, each exactly `width` packed pixels.
    pub fn write_rows(&mut self, rows: &[&[u8]]) -> Result<()> {
        if self.rows_received + rows.len() > self.height {
            return Err(Error::InternalError("more rows than the frame height"));
        }

        let row_bytes = self.width * BYTES_PER_PIXEL;
        for row in rows {
            if row.len() != row_bytes {
                return Err(Error::InternalError("row length does not match width"));
            }
            let offset = self.rows_buffered * self.padded_width;
            let [y, cb, cr] = &mut self.scratch.planes;
            let y = &mut y[offset..offset + self.padded_width];
            let cb = &mut cb[offset..offset + self.padded_width];
            let cr = &mut cr[offset..offset + self.padded_width];
            convert_packed_row(
                row,
                self.layout,
                &mut y[..self.width],
                &mut cb[..self.width],
                &mut cr[..self.width],
            );
            expand_right_edge(y, self.width);
            expand_right_edge(cb, self.width);
            expand_right_edge(cr, self.width);

            self.rows_buffered += 1;
            self.rows_received += 1;
            if self.rows_buffered == self.mcu_height {
                self.encode_mcu_row()?;
            }
        }

        trace!(
            "batch of {} rows, {}/{} rows received",
            rows.len(),
            self.rows_received,
            self.height
        );
        Ok(())
    }

    /// Pad the final MCU row, flush the entropy coder and write EOI.
    ///
    /// Returns the underlying output and the total bytes written into it.
    pub fn finish(mut self) -> Result<(W, usize)> {
        if self.rows_received != self.height {
            return Err(Error::InternalError("frame finished before its last row"));
        }

        if self.rows_buffered > 0 {
            // Replicate the last row down to the MCU boundary
            let stride = self.padded_width;
            let last = (self.rows_buffered - 1) * stride;
            for plane in &mut self.scratch.planes {
                for row in self.rows_buffered..self.mcu_height {
                    plane.copy_within(last..last + stride, row * stride);
                }
            }
            self.rows_buffered = self.mcu_height;
            self.encode_mcu_row()?;
        }

        self.encoder.flush()?;
        let scan_bytes = self.encoder.bytes_written();
        let mut marker = MarkerWriter::new(self.encoder.into_inner().into_inner());
        marker.write_eoi()?;
        let total = self.header_bytes + scan_bytes + marker.bytes_written();
        Ok((marker.into_inner(), total))
    }

    fn encode_mcu_row(&mut self) -> Result<()> {
        let (h_ratio, v_ratio) = self.chroma_ratio;
        let subsampled = self.chroma_ratio != (1, 1);

        let scratch = &mut *self.scratch;
        if subsampled {
            for (src, dst) in scratch.planes[1..].iter().zip(scratch.chroma.iter_mut()) {
                downsample_plane(src, self.padded_width, self.mcu_height, h_ratio, v_ratio, dst);
            }
        }

        let [y, cb, cr] = &scratch.planes;
        let planes: [(&[u8], usize); NUM_COMPONENTS] = if subsampled {
            let chroma_width = self.padded_width / h_ratio;
            [
                (y.as_slice(), self.padded_width),
                (scratch.chroma[0].as_slice(), chroma_width),
                (scratch.chroma[1].as_slice(), chroma_width),
            ]
        } else {
            [
                (y.as_slice(), self.padded_width),
                (cb.as_slice(), self.padded_width),
                (cr.as_slice(), self.padded_width),
            ]
        };

        let mcus_per_row = self.padded_width / self.mcu_width;
        for mcu_x in 0..mcus_per_row {
            if self.restart_interval > 0 && self.mcus_since_restart == self.restart_interval {
                self.encoder.emit_restart(self.next_restart_num)?;
                self.next_restart_num = (self.next_restart_num + 1) & 7;
                self.mcus_since_restart = 0;
            }

            for (ci, comp) in self.components.iter().enumerate() {
                let (plane, stride) = planes[ci];
                let h_blocks = comp.h_samp_factor as usize;

                for v in 0..comp.v_samp_factor as usize {
                    for h in 0..h_blocks {
                        let x0 = (mcu_x * h_blocks + h) * DCTSIZE;
                        let samples = load_level_shifted(plane, stride, x0, v * DCTSIZE);
                        encode_block(&mut self.encoder, &samples, ci, comp, self.tables)?;
                    }
                }
            }
            self.mcus_since_restart += 1;
        }

        self.rows_buffered = 0;
        Ok(())
    }
}

/// DCT, quantize and entropy-code one level-shifted block.
#[inline]
fn encode_block<W: Write>(
    encoder: &mut EntropyEncoder<W>,
    samples: &[i16; DCTSIZE2],
    component: usize,
    comp: &ComponentInfo,
    tables: &EncodeTables,
) -> std::io::Result<()> {
    let mut coeffs = [0i16; DCTSIZE2];
    forward_dct_8x8(samples, &mut coeffs);
    let mut quantized = [0i16; DCTSIZE2];
    quantize_block(
        &coeffs,
        &tables.quant[comp.quant_tbl_no as usize].values,
        &mut quantized,
    );
    encoder.encode_block(
        &quantized,
        component,
        &tables.dc[comp.dc_tbl_no as usize],
        &tables.ac[comp.ac_tbl_no as usize],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subsampling;

    fn encode_rows(config: &CompressorConfig, width: u16, height: u16, pixel: [u8; 4]) -> Vec<u8> {
        let tables = EncodeTables::build(config.quality).unwrap();
        let mut scratch = Scratch::default();
        let mut out = Vec::new();
        let row: Vec<u8> = pixel.repeat(width as usize);
        let rows: Vec<&[u8]> = vec![row.as_slice(); height as usize];

        let mut stream =
            EncodingStream::start(&mut out, config, &tables, &mut scratch, width, height).unwrap();
        stream.write_rows(&rows).unwrap();
        let (_, total) = stream.finish().unwrap();
        assert_eq!(total, out.len());
        out
    }

    #[test]
    fn test_stream_framing() {
        let out = encode_rows(&CompressorConfig::default(), 8, 8, [0, 0, 0, 0]);
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        assert_eq!(&out[out.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_partial_mcu_rows_are_padded() {
        let config = CompressorConfig::default().with_subsampling(Subsampling::S420);
        let out = encode_rows(&config, 17, 9, [255, 255, 255, 0]);
        assert_eq!(&out[out.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_too_many_rows_rejected() {
        let config = CompressorConfig::default();
        let tables = EncodeTables::build(config.quality).unwrap();
        let mut scratch = Scratch::default();
        let mut out = Vec::new();
        let row = [0u8; 8 * BYTES_PER_PIXEL];
        let rows: Vec<&[u8]> = vec![&row[..]; 3];

        let mut stream =
            EncodingStream::start(&mut out, &config, &tables, &mut scratch, 8, 2).unwrap();
        assert!(matches!(
            stream.write_rows(&rows),
            Err(Error::InternalError(_))
        ));
    }

    #[test]
    fn test_finish_requires_all_rows() {
        let config = CompressorConfig::default();
        let tables = EncodeTables::build(config.quality).unwrap();
        let mut scratch = Scratch::default();
        let mut out = Vec::new();
        let row = [0u8; 8 * BYTES_PER_PIXEL];

        let mut stream =
            EncodingStream::start(&mut out, &config, &tables, &mut scratch, 8, 2).unwrap();
        stream.write_rows(&[&row[..]]).unwrap();
        assert!(stream.finish().is_err());
    }

    #[test]
    fn test_scratch_sized_for_mcu_row() {
        let mut scratch = Scratch::default();
        scratch.prepare(32, 16, (2, 2)).unwrap();
        assert_eq!(scratch.planes[0].len(), 32 * 16);
        assert_eq!(scratch.chroma[0].len(), 16 * 8);
        assert!(scratch.capacity() >= 3 * 32 * 16 + 2 * 16 * 8);
    }
}
