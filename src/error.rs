//! Error types for the framebuffer encoder.

use std::fmt;

/// Result type for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Callers that only care whether a failure came from resource exhaustion
/// or from the encode itself can match on this instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Memory for the session or its scratch buffers could not be obtained.
    Allocation,
    /// The encode call failed: bad parameters, insufficient output space,
    /// or an internal fault.
    Encode,
}

/// Error type for encoder operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid image dimensions (zero, or larger than a frame header allows)
    InvalidDimensions {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
    /// Row stride is shorter than the image width
    InvalidStride {
        /// Row stride in pixels
        stride: usize,
        /// Image width in pixels
        width: u32,
    },
    /// Source buffer is too short for the declared geometry
    BufferSizeMismatch {
        /// Minimum buffer size in pixels or bytes, matching the source type
        expected: usize,
        /// Actual buffer size
        actual: usize,
    },
    /// Destination buffer filled up before the stream was complete
    OutputTooSmall {
        /// Capacity of the destination buffer in bytes
        capacity: usize,
    },
    /// Invalid quality value (must be 1-100)
    InvalidQuality(u8),
    /// Invalid Huffman table structure
    InvalidHuffmanTable,
    /// Input is not a JPEG stream this crate can rewrite
    MalformedStream(&'static str),
    /// Payload too long for the Tight compact length field
    TightLengthOverflow(usize),
    /// Internal encoder error
    InternalError(&'static str),
    /// I/O error
    IoError(String),
    /// Memory allocation failed
    AllocationFailed,
}

impl Error {
    /// Classify the error as an allocation or an encode failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::AllocationFailed => ErrorCategory::Allocation,
            _ => ErrorCategory::Encode,
        }
    }

    /// Whether the session that produced this error can be used again as is.
    ///
    /// Parameter errors leave the session untouched. Internal faults may
    /// leave derived state inconsistent; the session discards it, but the
    /// caller should drop and recreate the session.
    pub fn leaves_session_reusable(&self) -> bool {
        !matches!(
            self,
            Error::InternalError(_) | Error::InvalidHuffmanTable | Error::IoError(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {}x{}", width, height)
            }
            Error::InvalidStride { stride, width } => {
                write!(f, "Invalid stride: {} is less than width {}", stride, width)
            }
            Error::BufferSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "Buffer size mismatch: expected at least {}, got {}",
                    expected, actual
                )
            }
            Error::OutputTooSmall { capacity } => {
                write!(f, "Output buffer too small: capacity {} bytes", capacity)
            }
            Error::InvalidQuality(q) => {
                write!(f, "Invalid quality value: {} (must be 1-100)", q)
            }
            Error::InvalidHuffmanTable => {
                write!(f, "Invalid Huffman table structure")
            }
            Error::MalformedStream(reason) => {
                write!(f, "Malformed JPEG stream: {}", reason)
            }
            Error::TightLengthOverflow(len) => {
                write!(f, "Length {} does not fit a Tight compact length", len)
            }
            Error::InternalError(msg) => {
                write!(f, "Internal encoder error: {}", msg)
            }
            Error::IoError(msg) => {
                write!(f, "I/O error: {}", msg)
            }
            Error::AllocationFailed => {
                write!(f, "Memory allocation failed")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}
