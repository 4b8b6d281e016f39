//! NEXRAD Archive II (Level 2) decoder.
//!
//! Turns a raw Archive II volume file into a [`RadarVolume`]: sweeps of
//! rays, each ray carrying one or more moments (reflectivity, velocity, ...)
//! as physical values per range gate.
//!
//! # Pipeline
//!
//! ```text
//! bytes
//!   │
//!   ├─► parse_volume_header   (24 bytes, fatal if short)
//!   │
//!   ├─► split_records         (size-prefixed, bzip2 or raw)
//!   │         │
//!   │         └─► expand_record ─► MessageScanner ─► decode_ray (type 31)
//!   │                             (per record, optionally on rayon)
//!   │
//!   └─► VolumeAccumulator     (group by elevation number, renumber 0..n)
//!             │
//!             ▼
//!        RadarVolume::extract_moment(sweep, moment) ─► MomentData
//! ```
//!
//! Corrupt records, messages, rays and moment blocks are dropped and
//! counted in [`DecodeStats`]; only a missing header or an empty volume is
//! an error.
//!
//! # Example
//!
//! ```ignore
//! use nexrad_decoder::{decode_file, DecoderConfig, MomentKind};
//!
//! let output = decode_file("KTLX20130520_201643_V06", &DecoderConfig::default())?;
//! let reflectivity = output.volume.extract_moment(0, MomentKind::Reflectivity)?;
//! println!("{} rays x {} gates", reflectivity.ray_count, reflectivity.gate_count);
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod messages;
pub mod moment;
pub mod ray;
pub mod reader;
pub mod records;
pub mod tables;
pub mod time;
pub mod volume;

pub use config::DecoderConfig;
pub use decoder::{decode_file, decode_volume, DecodeOutput, DecodeStats, Level2Decoder};
pub use error::{DecodeError, DecodeResult, QueryError, ReadError, SkipReason};
pub use moment::MomentRecord;
pub use ray::{Ray, SiteLocation};
pub use records::{Bzip2Decompressor, Decompressor, VolumeHeader};
pub use tables::MomentKind;
pub use volume::{MomentData, RadarVolume, Sweep, SweepSummary, VolumeSummary};
