//! # framejpeg
//!
//! Baseline JPEG encoder for packed 32-bit framebuffers.
//!
//! The encoder takes rows of four-byte pixels (one byte ignored), converts
//! them to YCbCr, and writes a sequential Huffman-coded JPEG into a buffer
//! the caller provides. It is built for remote-desktop style workloads:
//! one long-lived [`Compressor`] per connection, many small frames, no
//! allocation once the session has seen its largest frame.
//!
//! - **Bounded output** - never writes past the destination slice
//! - **Abbreviated streams** - Huffman tables may be left out of the stream
//!   for peers that already know the standard tables
//! - **Tight framing** - [`tight`] wraps streams as RFB Tight JPEG rectangles
//! - **Dirty rectangles** - [`compare`] finds the regions that changed
//!   between two frames
//!
//! ## Quick Start
//!
//! ```no_run
//! use framejpeg::{restore_huffman_tables, Compressor};
//!
//! # fn main() -> Result<(), framejpeg::Error> {
//! // 0x00RRGGBB words, 640 pixels per row
//! let framebuffer: Vec<u32> = vec![0x0020_4080; 640 * 480];
//!
//! let mut compressor = Compressor::new()?;
//! let mut dst = vec![0u8; 256 * 1024];
//! let n = compressor.compress(&mut dst, &framebuffer, 640, 640, 480)?;
//!
//! // The default stream omits its Huffman tables; put them back for
//! // decoders that do not assume them
//! let standalone = restore_huffman_tables(&dst[..n])?;
//! # let _ = standalone;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```no_run
//! use framejpeg::{Compressor, CompressorConfig, PixelLayout, Subsampling};
//!
//! # fn main() -> Result<(), framejpeg::Error> {
//! let config = CompressorConfig::default()
//!     .with_quality(80)
//!     .with_subsampling(Subsampling::S420)
//!     .with_layout(PixelLayout::Rgbx)
//!     .with_omit_huffman_tables(false)
//!     .with_restart_interval(16);
//! let compressor = Compressor::with_config(config)?;
//! # let _ = compressor;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

// ============================================================================
// Internal modules - hidden from public docs but accessible for tests
// ============================================================================

/// Bitstream writing utilities (internal).
#[doc(hidden)]
pub mod bitstream;

/// Color conversion utilities (internal).
#[doc(hidden)]
pub mod color;

/// Constants and standard tables (internal).
#[doc(hidden)]
pub mod consts;

/// DCT transform (internal).
#[doc(hidden)]
pub mod dct;

/// Entropy encoding (internal).
#[doc(hidden)]
pub mod entropy;

/// Huffman table utilities (internal).
#[doc(hidden)]
pub mod huffman;

/// JPEG marker writing (internal).
#[doc(hidden)]
pub mod marker;

/// Bounded output sink (internal).
#[doc(hidden)]
pub mod output;

/// Quantization utilities (internal).
#[doc(hidden)]
pub mod quant;

/// Edge expansion and chroma subsampling (internal).
#[doc(hidden)]
pub mod sample;

/// Type definitions (internal).
#[doc(hidden)]
pub mod types;

mod encode;
mod error;
mod restore;

pub mod compare;
pub mod tight;

// ============================================================================
// Public API
// ============================================================================

/// The compression session, its configuration, and borrowed source images.
///
/// # Example
///
/// ```no_run
/// use framejpeg::{Compressor, ImageView};
///
/// # fn main() -> Result<(), framejpeg::Error> {
/// let pixels = vec![0u8; 100 * 4 * 50];
/// let image = ImageView::from_bytes(&pixels, 100, 100, 50)?;
///
/// let mut jpeg = Vec::new();
/// Compressor::new()?.compress_to_vec(&mut jpeg, &image)?;
/// # Ok(())
/// # }
/// ```
pub use encode::{Compressor, CompressorConfig, ImageView};

/// Error type for encoding operations.
///
/// Use [`Error::category`] to separate allocation failures from encode
/// failures, and [`Error::leaves_session_reusable`] to decide whether to
/// keep the session.
pub use error::{Error, ErrorCategory, Result};

/// Source pixel byte order.
pub use types::PixelLayout;

/// Chroma subsampling mode.
///
/// - [`Subsampling::S444`] - no subsampling (default)
/// - [`Subsampling::S422`] - half horizontal chroma resolution
/// - [`Subsampling::S420`] - half horizontal and vertical chroma resolution
/// - [`Subsampling::S440`] - half vertical chroma resolution
pub use types::Subsampling;

/// Splice the standard Huffman tables into an abbreviated stream.
pub use restore::restore_huffman_tables;

/// Default quality level.
pub use consts::DEFAULT_QUALITY;

/// Largest number of rows handed to the block pipeline at once.
pub use consts::MAX_ROWS_PER_BATCH;
