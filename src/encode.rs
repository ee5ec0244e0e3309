//! The compression session.
//!
//! A [`Compressor`] owns its configuration, the tables derived from it, and
//! scratch memory for one MCU row. Each `compress*` call validates the
//! source, writes a complete baseline JPEG and reports how many bytes it
//! produced. Sessions are reused sequentially; buffers are kept between
//! images.
//!
//! # Example
//!
//! ```no_run
//! use framejpeg::{Compressor, PixelLayout, Subsampling};
//!
//! # fn main() -> Result<(), framejpeg::Error> {
//! let (width, height) = (640u32, 480u32);
//! let framebuffer = vec![0x0033_66CCu32; (width * height) as usize];
//!
//! let mut compressor = Compressor::new()?;
//! compressor.configure(85, Subsampling::S420, PixelLayout::Bgrx);
//!
//! let mut dst = vec![0u8; 512 * 1024];
//! let n = compressor.compress(&mut dst, &framebuffer, width as usize, width, height)?;
//! let jpeg = &dst[..n];
//! # let _ = jpeg;
//! # Ok(())
//! # }
//! ```

mod helpers;
mod streaming;

use std::io::Write;

use log::{debug, warn};
use rgb::alt::BGRA8;

use crate::consts::{
    BYTES_PER_PIXEL, DCTSIZE, DEFAULT_QUALITY, MAX_DIMENSION, MAX_ROWS_PER_BATCH,
};
use crate::error::{Error, Result};
use crate::output::SliceSink;
use crate::types::{PixelLayout, Subsampling};

use helpers::EncodeTables;
use streaming::{EncodingStream, Scratch};

pub(crate) use helpers::std_huffman_tables;

/// Width the scratch buffers are sized for when a session is created.
const INITIAL_SCRATCH_WIDTH: usize = 1024;

// ============================================================================
// Configuration
// ============================================================================

/// Encode parameters for a [`Compressor`].
///
/// The default reproduces the classic framebuffer setup: quality 93, no
/// chroma subsampling, BGRX input, Huffman tables left out of the stream
/// and quantization tables written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressorConfig {
    /// Quality level (1-100)
    pub quality: u8,
    /// Chroma subsampling mode
    pub subsampling: Subsampling,
    /// Byte order of the packed source pixels
    pub layout: PixelLayout,
    /// Leave the DHT segment out; the decoder must already know the
    /// standard tables
    pub omit_huffman_tables: bool,
    /// Leave the DQT segment out; the decoder must already know the tables
    /// for this quality
    pub omit_quant_tables: bool,
    /// Restart interval in MCUs (0 = disabled)
    pub restart_interval: u16,
    /// Write a JFIF APP0 segment after SOI
    pub write_jfif: bool,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            subsampling: Subsampling::S444,
            layout: PixelLayout::Bgrx,
            omit_huffman_tables: true,
            omit_quant_tables: false,
            restart_interval: 0,
            write_jfif: true,
        }
    }
}

impl CompressorConfig {
    /// Set quality level (1-100). Out-of-range values are clamped.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Set chroma subsampling mode.
    pub fn with_subsampling(mut self, subsampling: Subsampling) -> Self {
        self.subsampling = subsampling;
        self
    }

    /// Set the source pixel layout.
    pub fn with_layout(mut self, layout: PixelLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Write or omit the DHT segment.
    pub fn with_omit_huffman_tables(mut self, omit: bool) -> Self {
        self.omit_huffman_tables = omit;
        self
    }

    /// Write or omit the DQT segment.
    pub fn with_omit_quant_tables(mut self, omit: bool) -> Self {
        self.omit_quant_tables = omit;
        self
    }

    /// Set restart interval in MCUs.
    pub fn with_restart_interval(mut self, interval: u16) -> Self {
        self.restart_interval = interval;
        self
    }

    /// Write or omit the JFIF APP0 segment.
    pub fn with_jfif(mut self, enable: bool) -> Self {
        self.write_jfif = enable;
        self
    }

    /// Check that every field holds a value the encoder accepts.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(Error::InvalidQuality(self.quality));
        }
        Ok(())
    }
}

// ============================================================================
// Source Image
// ============================================================================

/// A borrowed packed 32-bit image.
///
/// Rows start `stride` pixels apart; only the first `width` pixels of each
/// row are read, and the last row need not be padded out to `stride`.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> ImageView<'a> {
    /// View a buffer of native-endian `u32` pixels.
    ///
    /// On little-endian machines a `0x00RRGGBB` word is
    /// [`PixelLayout::Bgrx`] in memory.
    pub fn from_u32(src: &'a [u32], stride: usize, width: u32, height: u32) -> Result<Self> {
        let expected = required_pixels(stride, width, height)?;
        if src.len() < expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: src.len(),
            });
        }
        Ok(Self {
            data: bytemuck::cast_slice(src),
            width,
            height,
            stride,
        })
    }

    /// View a byte buffer holding four bytes per pixel.
    ///
    /// `stride` is still counted in pixels.
    pub fn from_bytes(src: &'a [u8], stride: usize, width: u32, height: u32) -> Result<Self> {
        let expected = required_pixels(stride, width, height)?
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(Error::InvalidStride { stride, width })?;
        if src.len() < expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: src.len(),
            });
        }
        Ok(Self {
            data: src,
            width,
            height,
            stride,
        })
    }

    /// View a buffer of [`BGRA8`] pixels. The alpha channel is ignored.
    pub fn from_bgra(src: &'a [BGRA8], stride: usize, width: u32, height: u32) -> Result<Self> {
        let expected = required_pixels(stride, width, height)?;
        if src.len() < expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: src.len(),
            });
        }
        Ok(Self {
            data: bytemuck::cast_slice(src),
            width,
            height,
            stride,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between row starts, in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The packed bytes of row `y`, exactly `width` pixels long.
    fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride * BYTES_PER_PIXEL;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }
}

/// Minimum source length in pixels for the given geometry.
pub(crate) fn required_pixels(stride: usize, width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::InvalidDimensions { width, height });
    }
    if stride < width as usize {
        return Err(Error::InvalidStride { stride, width });
    }
    stride
        .checked_mul(height as usize - 1)
        .and_then(|n| n.checked_add(width as usize))
        .ok_or(Error::InvalidStride { stride, width })
}

// ============================================================================
// Compressor
// ============================================================================

/// A reusable JPEG compression session.
///
/// `compress*` takes `&mut self`, so a session serves one call at a time;
/// it may be moved between threads freely.
#[derive(Debug)]
pub struct Compressor {
    config: CompressorConfig,
    /// Derived from `config.quality`; rebuilt lazily after reconfiguration
    tables: Option<EncodeTables>,
    scratch: Scratch,
}

impl Compressor {
    /// Create a session with the default configuration.
    ///
    /// # Errors
    /// [`Error::AllocationFailed`] if scratch memory cannot be reserved.
    pub fn new() -> Result<Self> {
        Self::with_config(CompressorConfig::default())
    }

    /// Create a session with `config`.
    pub fn with_config(config: CompressorConfig) -> Result<Self> {
        config.validate()?;
        let scratch = Scratch::with_width(INITIAL_SCRATCH_WIDTH, DCTSIZE)?;
        debug!(
            "created compressor: q{} {:?} {:?}, {} bytes scratch",
            config.quality,
            config.subsampling,
            config.layout,
            scratch.capacity()
        );
        Ok(Self {
            config,
            tables: None,
            scratch,
        })
    }

    /// Set the parameters used by the next compress call.
    ///
    /// Quality is clamped to 1-100. Table omission, restart interval and
    /// JFIF settings are left as they are.
    pub fn configure(&mut self, quality: u8, subsampling: Subsampling, layout: PixelLayout) {
        let config = self
            .config
            .clone()
            .with_quality(quality)
            .with_subsampling(subsampling)
            .with_layout(layout);
        self.replace_config(config);
    }

    /// Replace the whole configuration.
    pub fn set_config(&mut self, config: CompressorConfig) -> Result<()> {
        config.validate()?;
        self.replace_config(config);
        Ok(())
    }

    /// The current configuration.
    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    fn replace_config(&mut self, config: CompressorConfig) {
        if config.quality != self.config.quality {
            self.tables = None;
        }
        self.config = config;
    }

    /// Compress a buffer of `u32` pixels into `dst`.
    ///
    /// # Arguments
    /// * `dst` - Output buffer; never written past its end
    /// * `src` - Source pixels, `height` rows starting `stride` pixels apart
    /// * `stride` - Row pitch in pixels (at least `width`)
    /// * `width`, `height` - Image dimensions, 1 to 65535
    ///
    /// # Returns
    /// The number of bytes of `dst` holding the JPEG stream.
    ///
    /// # Errors
    /// [`Error::OutputTooSmall`] when `dst` cannot hold the stream, or a
    /// parameter error for bad geometry. The contents of `dst` are
    /// unspecified after a failure.
    pub fn compress(
        &mut self,
        dst: &mut [u8],
        src: &[u32],
        stride: usize,
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let image = ImageView::from_u32(src, stride, width, height)?;
        self.compress_image(dst, &image)
    }

    /// Compress a byte buffer holding four bytes per pixel.
    ///
    /// `stride` is counted in pixels.
    pub fn compress_bytes(
        &mut self,
        dst: &mut [u8],
        src: &[u8],
        stride: usize,
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let image = ImageView::from_bytes(src, stride, width, height)?;
        self.compress_image(dst, &image)
    }

    /// Compress [`BGRA8`] pixels.
    ///
    /// Independent of the configured [`PixelLayout`]; alpha is ignored.
    pub fn compress_bgra(
        &mut self,
        dst: &mut [u8],
        src: &[BGRA8],
        stride: usize,
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let image = ImageView::from_bgra(src, stride, width, height)?;
        let layout = self.config.layout;
        self.config.layout = PixelLayout::Bgrx;
        let result = self.compress_image(dst, &image);
        self.config.layout = layout;
        result
    }

    /// Compress an [`ImageView`] into `dst`.
    pub fn compress_image(&mut self, dst: &mut [u8], image: &ImageView<'_>) -> Result<usize> {
        let capacity = dst.len();
        let mut sink = SliceSink::new(dst);
        match self.encode_to(&mut sink, image) {
            Ok(written) => {
                debug_assert_eq!(written, sink.position());
                self.log_summary(image, written);
                Ok(written)
            }
            Err(e) => Err(self.recover(e, sink.overflowed(), capacity)),
        }
    }

    /// Compress an [`ImageView`], appending the stream to `out`.
    ///
    /// Returns the number of bytes appended. On failure `out` is left as
    /// it was.
    pub fn compress_to_vec(&mut self, out: &mut Vec<u8>, image: &ImageView<'_>) -> Result<usize> {
        let start = out.len();
        let hint = (image.width as usize * image.height as usize) / 4 + 1024;
        if let Err(e) = out.try_reserve(hint) {
            warn!("could not reserve {} bytes of output: {}", hint, e);
            return Err(e.into());
        }

        match self.encode_to(&mut *out, image) {
            Ok(written) => {
                self.log_summary(image, written);
                Ok(written)
            }
            Err(e) => {
                out.truncate(start);
                Err(self.recover(e, false, 0))
            }
        }
    }

    fn encode_to<W: Write>(&mut self, output: W, image: &ImageView<'_>) -> Result<usize> {
        self.config.validate()?;
        let quality = self.config.quality;
        if self.tables.as_ref().map(|t| t.quality) != Some(quality) {
            self.tables = Some(EncodeTables::build(quality)?);
        }
        let Some(tables) = self.tables.as_ref() else {
            return Err(Error::InternalError("encode tables missing"));
        };

        let invalid = || Error::InvalidDimensions {
            width: image.width,
            height: image.height,
        };
        let width = u16::try_from(image.width).map_err(|_| invalid())?;
        let height = u16::try_from(image.height).map_err(|_| invalid())?;

        let mut stream =
            EncodingStream::start(output, &self.config, tables, &mut self.scratch, width, height)?;

        let empty: &[u8] = &[];
        let mut batch = [empty; MAX_ROWS_PER_BATCH];
        let height = height as usize;
        let mut row = 0;
        while row < height {
            let n = (height - row).min(MAX_ROWS_PER_BATCH);
            for (i, slot) in batch[..n].iter_mut().enumerate() {
                *slot = image.row(row + i);
            }
            stream.write_rows(&batch[..n])?;
            row += n;
        }

        let (_, written) = stream.finish()?;
        Ok(written)
    }

    /// Map a failed encode onto the error the caller sees and drop any
    /// state the failure may have left inconsistent.
    fn recover(&mut self, err: Error, overflowed: bool, capacity: usize) -> Error {
        if overflowed {
            warn!(
                "output buffer of {} bytes too small (q{}, {:?})",
                capacity, self.config.quality, self.config.subsampling
            );
            return Error::OutputTooSmall { capacity };
        }
        if !err.leaves_session_reusable() {
            warn!("encode failed, discarding derived tables: {}", err);
            self.tables = None;
        }
        err
    }

    fn log_summary(&self, image: &ImageView<'_>, written: usize) {
        debug!(
            "encoded {}x{} q{} {:?}: {} bytes (dht {}, dqt {})",
            image.width,
            image.height,
            self.config.quality,
            self.config.subsampling,
            written,
            if self.config.omit_huffman_tables { "omitted" } else { "written" },
            if self.config.omit_quant_tables { "omitted" } else { "written" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u32> {
        (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                ((x * 255 / width) << 16) | ((y * 255 / height) << 8) | 0x40
            })
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = CompressorConfig::default();
        assert_eq!(config.quality, 93);
        assert_eq!(config.subsampling, Subsampling::S444);
        assert_eq!(config.layout, PixelLayout::Bgrx);
        assert!(config.omit_huffman_tables);
        assert!(!config.omit_quant_tables);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps_quality() {
        assert_eq!(CompressorConfig::default().with_quality(0).quality, 1);
        assert_eq!(CompressorConfig::default().with_quality(250).quality, 100);
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let config = CompressorConfig {
            quality: 0,
            ..CompressorConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidQuality(0)));

        let mut compressor = Compressor::new().unwrap();
        assert!(compressor.set_config(config).is_err());
        assert_eq!(compressor.config().quality, 93);
    }

    #[test]
    fn test_required_pixels() {
        assert_eq!(required_pixels(10, 8, 3).unwrap(), 28);
        assert!(matches!(
            required_pixels(4, 8, 3),
            Err(Error::InvalidStride { .. })
        ));
        assert!(matches!(
            required_pixels(8, 0, 3),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            required_pixels(70000, 70000, 1),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_image_view_rows() {
        let src: Vec<u32> = (0..12).collect();
        let view = ImageView::from_u32(&src, 4, 3, 3).unwrap();
        assert_eq!(view.row(1).len(), 3 * BYTES_PER_PIXEL);
        assert_eq!(view.row(1)[..4], 4u32.to_ne_bytes());
        // The last row does not need the full stride
        assert!(ImageView::from_u32(&src[..11], 4, 3, 3).is_ok());
        assert!(ImageView::from_u32(&src[..10], 4, 3, 3).is_err());
    }

    #[test]
    fn test_image_view_bytes_length_in_bytes() {
        let src = vec![0u8; 2 * 2 * BYTES_PER_PIXEL - 1];
        assert_eq!(
            ImageView::from_bytes(&src, 2, 2, 2).unwrap_err(),
            Error::BufferSizeMismatch {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_configure_invalidates_tables() {
        let mut compressor = Compressor::new().unwrap();
        let src = gradient(16, 16);
        let mut dst = vec![0u8; 16 * 1024];
        compressor.compress(&mut dst, &src, 16, 16, 16).unwrap();
        assert_eq!(compressor.tables.as_ref().map(|t| t.quality), Some(93));

        compressor.configure(50, Subsampling::S444, PixelLayout::Bgrx);
        assert!(compressor.tables.is_none());
        compressor.compress(&mut dst, &src, 16, 16, 16).unwrap();
        assert_eq!(compressor.tables.as_ref().map(|t| t.quality), Some(50));
    }

    #[test]
    fn test_output_too_small_keeps_session_usable() {
        let mut compressor = Compressor::new().unwrap();
        let src = gradient(32, 32);
        let mut small = [0u8; 64];
        let err = compressor.compress(&mut small, &src, 32, 32, 32).unwrap_err();
        assert_eq!(err, Error::OutputTooSmall { capacity: 64 });
        assert!(err.leaves_session_reusable());

        let mut dst = vec![0u8; 64 * 1024];
        assert!(compressor.compress(&mut dst, &src, 32, 32, 32).is_ok());
    }

    #[test]
    fn test_internal_fault_discards_tables() {
        let mut compressor = Compressor::new().unwrap();
        let src = gradient(16, 16);
        let mut dst = vec![0u8; 16 * 1024];
        let n = compressor.compress(&mut dst, &src, 16, 16, 16).unwrap();
        let expected = dst[..n].to_vec();
        assert!(compressor.tables.is_some());

        let err = compressor.recover(Error::InternalError("stream state"), false, 0);
        assert_eq!(err, Error::InternalError("stream state"));
        assert!(compressor.tables.is_none());

        let m = compressor.compress(&mut dst, &src, 16, 16, 16).unwrap();
        assert_eq!(compressor.tables.as_ref().map(|t| t.quality), Some(93));
        assert_eq!(&dst[..m], &expected[..]);
    }

    #[test]
    fn test_parameter_error_keeps_tables() {
        let mut compressor = Compressor::new().unwrap();
        let src = gradient(8, 8);
        let mut dst = vec![0u8; 8192];
        compressor.compress(&mut dst, &src, 8, 8, 8).unwrap();

        let err = compressor.recover(Error::InvalidStride { stride: 4, width: 8 }, false, 0);
        assert!(matches!(err, Error::InvalidStride { .. }));
        assert!(compressor.tables.is_some());

        let err = compressor.recover(Error::IoError("sink full".into()), true, 32);
        assert_eq!(err, Error::OutputTooSmall { capacity: 32 });
        assert!(compressor.tables.is_some());
    }

    #[test]
    fn test_compress_to_vec_appends() {
        let mut compressor = Compressor::new().unwrap();
        let src = gradient(8, 8);
        let view = ImageView::from_u32(&src, 8, 8, 8).unwrap();
        let mut out = vec![1, 2, 3];
        let n = compressor.compress_to_vec(&mut out, &view).unwrap();
        assert_eq!(out.len(), 3 + n);
        assert_eq!(&out[3..5], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_compress_bgra_ignores_configured_layout() {
        let pixels = vec![
            BGRA8 {
                b: 200,
                g: 100,
                r: 50,
                a: 0
            };
            64
        ];
        let mut compressor = Compressor::new().unwrap();
        let mut expected = vec![0u8; 8192];
        let n = compressor
            .compress_bgra(&mut expected, &pixels, 8, 8, 8)
            .unwrap();

        compressor.configure(93, Subsampling::S444, PixelLayout::Xrgb);
        let mut dst = vec![0u8; 8192];
        let m = compressor.compress_bgra(&mut dst, &pixels, 8, 8, 8).unwrap();
        assert_eq!(&dst[..m], &expected[..n]);
        assert_eq!(compressor.config().layout, PixelLayout::Xrgb);
    }

    #[test]
    fn test_compressor_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Compressor>();
    }
}
