//! Error types for Archive II decoding.
//!
//! Three tiers:
//! - [`DecodeError`] aborts the whole decode and is returned to the caller.
//! - [`SkipReason`] drops a single segment, ray or moment block; decoding
//!   continues and the reason is only logged and counted.
//! - [`QueryError`] is returned by the extraction API on a decoded volume.

use thiserror::Error;

use crate::tables::MomentKind;

/// Result type for fatal decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Bounds violation from [`crate::reader::ByteReader`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    #[error("read of {width} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },
}

/// Fatal errors: nothing usable could be decoded.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Buffer is smaller than the fixed volume header.
    #[error("buffer of {len} bytes is too small for the 24-byte volume header")]
    HeaderTooShort { len: usize },

    /// Every message was parsed but no ray survived validation.
    #[error("volume contains no decodable sweeps")]
    NoSweeps,

    /// Configuration rejected by validation.
    #[error("invalid decoder configuration: {0}")]
    InvalidConfig(String),

    /// File I/O error (file entry point only)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a segment, ray or moment block was dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("unsupported compression signature {0:02X?}")]
    UnsupportedCompression([u8; 2]),

    #[error("station identifier does not start with an uppercase letter")]
    InvalidStation,

    #[error("azimuth {0} outside [0, 360) under both encodings")]
    AzimuthOutOfRange(f32),

    #[error("elevation {0} outside [-10, 90]")]
    ElevationOutOfRange(f32),

    #[error("data block count {0} outside [1, 15]")]
    BlockCountOutOfRange(u16),

    #[error("ray carries no recognized moments")]
    NoMoments,

    #[error("gate count {0} out of range")]
    GateCountOutOfRange(u16),

    #[error("gate spacing {0} m outside [50, 4000]")]
    GateSpacingOutOfRange(u16),

    #[error("moment scale is zero")]
    ZeroScale,

    #[error("unsupported data word size {0}")]
    UnsupportedWordSize(u8),
}

/// Errors from the extraction API on a decoded [`crate::RadarVolume`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("sweep index {index} out of range (volume has {count} sweeps)")]
    SweepOutOfRange { index: usize, count: usize },

    #[error("moment {moment} not present in sweep {sweep}")]
    MomentNotFound { sweep: usize, moment: MomentKind },

    #[error("unknown moment name: {0}")]
    UnknownMoment(String),
}
