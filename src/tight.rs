//! JPEG rectangles for the RFB "Tight" encoding.
//!
//! A Tight JPEG rectangle body is the encoding type, a compression-control
//! byte selecting JPEG, the stream length in Tight's compact form, and the
//! JPEG stream itself. The rectangle header (position and size) is the
//! caller's business.

use log::trace;

use crate::compare::Rect;
use crate::encode::{Compressor, ImageView};
use crate::error::{Error, Result};

/// Encoding type 7 (Tight) as a big-endian `i32`.
pub const TIGHT_ENCODING_TYPE: [u8; 4] = [0, 0, 0, 7];

/// Compression control byte selecting a JPEG rectangle.
pub const TIGHT_JPEG_CONTROL: u8 = 0b1001_0000;

/// Largest length the compact form can carry.
pub const MAX_COMPACT_LENGTH: usize = (1 << 22) - 1;

/// Number of bytes the compact form of `len` takes (1 to 3).
pub fn compact_length_len(len: usize) -> usize {
    if len < 1 << 7 {
        1
    } else if len < 1 << 14 {
        2
    } else {
        3
    }
}

/// Append `len` in compact form: seven bits per byte, low bits first, with
/// the high bit flagging that another byte follows. The third byte, if
/// present, carries eight bits.
///
/// # Errors
/// [`Error::TightLengthOverflow`] if `len` exceeds [`MAX_COMPACT_LENGTH`].
pub fn write_compact_length(out: &mut Vec<u8>, len: usize) -> Result<()> {
    if len > MAX_COMPACT_LENGTH {
        return Err(Error::TightLengthOverflow(len));
    }
    match compact_length_len(len) {
        1 => out.push(len as u8),
        2 => out.extend_from_slice(&[0x80 | (len & 0x7f) as u8, (len >> 7) as u8]),
        _ => out.extend_from_slice(&[
            0x80 | (len & 0x7f) as u8,
            0x80 | ((len >> 7) & 0x7f) as u8,
            (len >> 14) as u8,
        ]),
    }
    Ok(())
}

/// Parse a compact length from the front of `bytes`.
///
/// Returns the length and the number of bytes it occupied, or `None` if
/// `bytes` ends mid-field.
pub fn read_compact_length(bytes: &[u8]) -> Option<(usize, usize)> {
    let mut len = 0usize;
    for (i, &b) in bytes.iter().enumerate().take(3) {
        if i == 2 {
            return Some((len | (b as usize) << 14, 3));
        }
        len |= ((b & 0x7f) as usize) << (7 * i);
        if b & 0x80 == 0 {
            return Some((len, i + 1));
        }
    }
    None
}

/// Produces Tight JPEG rectangle bodies from a packed framebuffer.
///
/// The JPEG stream is staged in a buffer the encoder keeps, so the length
/// prefix can use its shortest form.
#[derive(Debug)]
pub struct TightJpegEncoder {
    compressor: Compressor,
    staging: Vec<u8>,
}

impl TightJpegEncoder {
    /// Create an encoder around a default [`Compressor`].
    pub fn new() -> Result<Self> {
        Ok(Self::with_compressor(Compressor::new()?))
    }

    /// Create an encoder around an already configured [`Compressor`].
    pub fn with_compressor(compressor: Compressor) -> Self {
        Self {
            compressor,
            staging: Vec::new(),
        }
    }

    /// The session used for each rectangle, for reconfiguration.
    pub fn compressor_mut(&mut self) -> &mut Compressor {
        &mut self.compressor
    }

    /// Append one rectangle body for `width` x `height` pixels of `src`.
    ///
    /// Returns the number of bytes appended. On failure `out` is unchanged.
    pub fn encode_rect(
        &mut self,
        out: &mut Vec<u8>,
        src: &[u32],
        stride: usize,
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let image = ImageView::from_u32(src, stride, width, height)?;
        self.staging.clear();
        let jpeg_len = self.compressor.compress_to_vec(&mut self.staging, &image)?;
        if jpeg_len > MAX_COMPACT_LENGTH {
            return Err(Error::TightLengthOverflow(jpeg_len));
        }

        let start = out.len();
        let total = TIGHT_ENCODING_TYPE.len() + 1 + compact_length_len(jpeg_len) + jpeg_len;
        out.try_reserve(total)?;
        out.extend_from_slice(&TIGHT_ENCODING_TYPE);
        out.push(TIGHT_JPEG_CONTROL);
        write_compact_length(out, jpeg_len)?;
        out.extend_from_slice(&self.staging);

        trace!("tight rect {}x{}: {} byte jpeg", width, height, jpeg_len);
        Ok(out.len() - start)
    }

    /// Append one rectangle body for `rect` of a whole frame.
    ///
    /// `frame` holds the full framebuffer with rows `stride` pixels apart,
    /// as handed to a [`crate::compare::Comparator`].
    pub fn encode_region(
        &mut self,
        out: &mut Vec<u8>,
        frame: &[u32],
        stride: usize,
        rect: Rect,
    ) -> Result<usize> {
        let width = u32::try_from(rect.width()).unwrap_or(u32::MAX);
        let height = u32::try_from(rect.height()).unwrap_or(u32::MAX);
        if rect.x1 > stride {
            return Err(Error::InvalidStride { stride, width });
        }
        let start = rect.offset(stride).ok_or(Error::InvalidDimensions { width, height })?;
        let src = frame.get(start..).ok_or(Error::BufferSizeMismatch {
            expected: start,
            actual: frame.len(),
        })?;
        self.encode_rect(out, src, stride, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        write_compact_length(&mut out, len).unwrap();
        out
    }

    #[test]
    fn test_compact_length_forms() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(127), vec![0x7f]);
        assert_eq!(compact(128), vec![0x80, 0x01]);
        assert_eq!(compact(10_000), vec![0x90, 0x4e]);
        assert_eq!(compact(16_384), vec![0x80, 0x80, 0x01]);
        assert_eq!(compact(MAX_COMPACT_LENGTH), vec![0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_compact_length_len_matches_written() {
        for len in [0, 1, 127, 128, 16_383, 16_384, 1 << 21, MAX_COMPACT_LENGTH] {
            assert_eq!(compact(len).len(), compact_length_len(len), "len {}", len);
        }
    }

    #[test]
    fn test_compact_length_overflow() {
        let mut out = Vec::new();
        assert_eq!(
            write_compact_length(&mut out, 1 << 22),
            Err(Error::TightLengthOverflow(1 << 22))
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_compact_length() {
        assert_eq!(read_compact_length(&[0x05, 0xAA]), Some((5, 1)));
        assert_eq!(read_compact_length(&[0x90, 0x4e]), Some((10_000, 2)));
        // Fixed three-byte form with a small value is still valid
        assert_eq!(read_compact_length(&[0x85, 0x80, 0x00]), Some((5, 3)));
        assert_eq!(read_compact_length(&[0x80]), None);
        assert_eq!(read_compact_length(&[]), None);
    }

    #[test]
    fn test_encode_rect_framing() {
        let mut encoder = TightJpegEncoder::new().unwrap();
        let src = vec![0x00FF_8000u32; 16 * 16];
        let mut out = vec![0xEE];
        let n = encoder.encode_rect(&mut out, &src, 16, 16, 16).unwrap();
        assert_eq!(out.len(), 1 + n);

        let body = &out[1..];
        assert_eq!(&body[..4], &TIGHT_ENCODING_TYPE);
        assert_eq!(body[4], TIGHT_JPEG_CONTROL);
        let (len, used) = read_compact_length(&body[5..]).unwrap();
        let jpeg = &body[5 + used..];
        assert_eq!(jpeg.len(), len);
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[len - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_rect_error_leaves_output() {
        let mut encoder = TightJpegEncoder::new().unwrap();
        let mut out = vec![1, 2, 3];
        assert!(encoder.encode_rect(&mut out, &[], 0, 0, 0).is_err());
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_encode_region_matches_subslice() {
        let stride = 32usize;
        let frame: Vec<u32> = (0..stride as u32 * 24).map(|i| i.wrapping_mul(0x0001_0203)).collect();
        let rect = Rect::new(4, 2, 12, 10);

        let mut encoder = TightJpegEncoder::new().unwrap();
        let mut by_region = Vec::new();
        encoder
            .encode_region(&mut by_region, &frame, stride, rect)
            .unwrap();
        let mut by_rect = Vec::new();
        encoder
            .encode_rect(&mut by_rect, &frame[2 * stride + 4..], stride, 8, 8)
            .unwrap();
        assert_eq!(by_region, by_rect);
    }

    #[test]
    fn test_encode_region_rejects_outside_rect() {
        let frame = vec![0u32; 16 * 16];
        let mut encoder = TightJpegEncoder::new().unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            encoder.encode_region(&mut out, &frame, 16, Rect::new(8, 0, 20, 4)),
            Err(Error::InvalidStride { .. })
        ));
        assert!(encoder
            .encode_region(&mut out, &frame, 16, Rect::new(0, 14, 4, 18))
            .is_err());
        assert!(encoder
            .encode_region(&mut out, &frame, 16, Rect::new(3, 3, 3, 5))
            .is_err());
        assert!(out.is_empty());
    }
}
