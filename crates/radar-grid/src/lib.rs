//! Polar-to-Cartesian resampling for decoded radar sweeps.
//!
//! ```text
//! RadarVolume::extract_moment ─► MomentData
//!                                   │ try_into
//!                                   ▼
//!                               PolarField ─► PolarResampler::resample ─► CartesianGrid
//! ```
//!
//! The resampler is nearest-neighbor: every output pixel copies exactly one
//! polar sample. Rows are filled in parallel with rayon by default.
//!
//! # Example
//!
//! ```ignore
//! use radar_grid::{PolarField, PolarResampler, ResampleConfig};
//!
//! let moment = volume.extract_moment(0, MomentKind::Reflectivity)?;
//! let field = PolarField::try_from(moment)?;
//! let grid = PolarResampler::new(ResampleConfig::default())?.resample(&field);
//! ```

pub mod config;
pub mod error;
pub mod resample;
pub mod types;

pub use config::ResampleConfig;
pub use error::{GridError, Result};
pub use resample::{resample_to_grid, PolarResampler};
pub use types::{CartesianGrid, PolarField};
