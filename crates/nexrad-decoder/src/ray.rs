//! Digital radar data (message type 31) ray decoding.
//!
//! Body layout (offsets relative to the message body, after the 16-byte
//! message header):
//!
//! ```text
//!  0..4   radar identifier
//!  4..8   collection time (ms past midnight)
//!  8..10  modified Julian date
//! 10..12  azimuth number
//! 12..16  azimuth angle
//! 16..21  compression, spare, radial length, azimuth spacing
//! 21      radial status
//! 22      elevation number
//! 23      cut sector number
//! 24..28  elevation angle
//! 28..30  spot blanking, azimuth indexing mode
//! 30..32  data block count
//! 32..    data block pointers, u32 each, relative to the body start
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::error::SkipReason;
use crate::moment::{decode_moment_block, MomentRecord, MOMENT_BLOCK_TYPE};
use crate::reader::ByteReader;
use crate::tables::MomentKind;
use crate::time::julian_to_datetime;

/// Message type carrying generic-format digital radar data.
pub const MESSAGE_TYPE_RAY: u8 = 31;

/// Block type byte shared by the volume, elevation and radial blocks.
const CONSTANT_BLOCK_TYPE: u8 = b'R';
const VOLUME_BLOCK_NAME: &[u8; 3] = b"VOL";

/// Offsets inside the volume data block.
const VOLUME_LATITUDE_OFFSET: usize = 8;
const VOLUME_LONGITUDE_OFFSET: usize = 12;
const VOLUME_SITE_HEIGHT_OFFSET: usize = 16;
const VOLUME_VCP_OFFSET: usize = 40;

const MAX_DATA_BLOCKS: u16 = 15;

/// One angular sample along a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    /// Degrees clockwise from north, in [0, 360).
    pub azimuth: f32,
    /// Degrees above the horizon, in [-10, 90].
    pub elevation: f32,
    /// Raw elevation (sweep) number from the record.
    pub elevation_number: u8,
    pub azimuth_number: u16,
    pub radial_status: u8,
    pub station_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub moments: BTreeMap<MomentKind, MomentRecord>,
}

impl Ray {
    pub fn moment(&self, kind: MomentKind) -> Option<&MomentRecord> {
        self.moments.get(&kind)
    }
}

/// Radar site location from the volume data block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteLocation {
    pub latitude: f32,
    pub longitude: f32,
    /// Site height above sea level (m).
    pub height_m: i16,
}

/// Contents of a volume data block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeBlock {
    /// Volume coverage pattern; `None` when the field is zero.
    pub vcp: Option<u16>,
    pub site: Option<SiteLocation>,
}

/// A ray plus the volume-level metadata its record carried.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRay {
    pub ray: Ray,
    pub volume: Option<VolumeBlock>,
    /// Moment blocks that failed validation and were left out.
    pub dropped_blocks: usize,
}

/// Decode one message-31 body into a ray.
///
/// Any validation or bounds failure rejects the whole ray. A moment block that
/// fails its own validation is dropped on its own; a ray left with no
/// recognized moments is rejected.
pub fn decode_ray(body: &[u8], config: &DecoderConfig) -> Result<DecodedRay, SkipReason> {
    let mut reader = ByteReader::new(body);

    let station_raw = reader.read_array::<4>()?;
    if !station_raw[0].is_ascii_uppercase() {
        return Err(SkipReason::InvalidStation);
    }
    let station_id = String::from_utf8_lossy(&station_raw)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string();

    let collection_ms = reader.read_u32()?;
    let julian_day = reader.read_u16()?;
    let azimuth_number = reader.read_u16()?;
    let azimuth_raw = reader.read_array::<4>()?;
    reader.skip(5)?;
    let radial_status = reader.read_u8()?;
    let elevation_number = reader.read_u8()?;
    reader.skip(1)?;
    let elevation = reader.read_f32()?;
    reader.skip(2)?;
    let block_count = reader.read_u16()?;

    let azimuth = decode_azimuth(azimuth_raw)
        .ok_or(SkipReason::AzimuthOutOfRange(f32::from_be_bytes(azimuth_raw)))?;

    if !(-10.0..=90.0).contains(&elevation) {
        return Err(SkipReason::ElevationOutOfRange(elevation));
    }

    if block_count == 0 || block_count > MAX_DATA_BLOCKS {
        return Err(SkipReason::BlockCountOutOfRange(block_count));
    }

    let mut pointers = Vec::with_capacity(block_count as usize);
    for _ in 0..block_count {
        pointers.push(reader.read_u32()? as usize);
    }

    let mut moments = BTreeMap::new();
    let mut volume = None;
    let mut dropped_blocks = 0;

    for pointer in pointers {
        let block_type = reader.slice_at(pointer, 1)?[0];

        match block_type {
            CONSTANT_BLOCK_TYPE => {
                if reader.slice_at(pointer + 1, 3)? == VOLUME_BLOCK_NAME {
                    volume = Some(decode_volume_block(body, pointer)?);
                }
            }
            MOMENT_BLOCK_TYPE => match decode_moment_block(body, pointer, config.max_gates) {
                Ok(block) => match MomentKind::from_block_name(&block.name) {
                    Some(kind) => {
                        moments.entry(kind).or_insert(block.record);
                    }
                    None => {
                        debug!(name = %block.name, "Ignoring unrecognized moment block");
                    }
                },
                Err(reason) => {
                    debug!(pointer, reason = %reason, "Dropping moment block");
                    dropped_blocks += 1;
                }
            },
            _ => {}
        }
    }

    if moments.is_empty() {
        return Err(SkipReason::NoMoments);
    }

    Ok(DecodedRay {
        ray: Ray {
            azimuth,
            elevation,
            elevation_number,
            azimuth_number,
            radial_status,
            station_id: Some(station_id),
            timestamp: julian_to_datetime(julian_day as u32, collection_ms),
            moments,
        },
        volume,
        dropped_blocks,
    })
}

/// Decode an azimuth field.
///
/// The four bytes are read as an IEEE float first. If that is NaN, subnormal
/// or outside [0, 360), the same bytes are read as an unsigned integer in
/// eighths of a degree. Returns `None` when neither reading is in range.
///
/// Every integer below 2880 is also a subnormal float bit pattern, so
/// subnormals have to be refused for the integer reading to ever apply.
pub fn decode_azimuth(raw: [u8; 4]) -> Option<f32> {
    let as_float = f32::from_be_bytes(raw);
    if !as_float.is_subnormal() && is_valid_azimuth(as_float) {
        return Some(as_float);
    }

    // Scaled-integer form; which sources emit it is unconfirmed.
    let as_scaled = u32::from_be_bytes(raw) as f32 / 8.0;
    is_valid_azimuth(as_scaled).then_some(as_scaled)
}

fn is_valid_azimuth(azimuth: f32) -> bool {
    (0.0..360.0).contains(&azimuth)
}

fn decode_volume_block(body: &[u8], pointer: usize) -> Result<VolumeBlock, SkipReason> {
    let mut reader = ByteReader::at(body, pointer + VOLUME_LATITUDE_OFFSET);
    let latitude = reader.read_f32()?;

    reader.seek(pointer + VOLUME_LONGITUDE_OFFSET);
    let longitude = reader.read_f32()?;

    reader.seek(pointer + VOLUME_SITE_HEIGHT_OFFSET);
    let height_m = reader.read_i16()?;

    reader.seek(pointer + VOLUME_VCP_OFFSET);
    let vcp = reader.read_u16()?;

    let site = ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude))
        .then_some(SiteLocation {
            latitude,
            longitude,
            height_m,
        });

    Ok(VolumeBlock {
        vcp: (vcp != 0).then_some(vcp),
        site,
    })
}
