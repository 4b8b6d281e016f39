//! Moment data block decoding.
//!
//! A moment block carries the gate geometry, the quantization parameters
//! and the raw samples for one radar variable along one ray.
//!
//! Block layout (offsets relative to the block start):
//!
//! ```text
//!  0      block type ('D')
//!  1..4   moment name, space padded
//!  4..8   reserved
//!  8..10  gate count
//! 10..12  range to first gate (m)
//! 12..14  gate spacing (m)
//! 14..18  thresholds (unused)
//! 18      control flags (unused)
//! 19      data word size (8 or 16)
//! 20..24  scale (f32)
//! 24..28  offset (f32)
//! 28..    samples, one per gate
//! ```

use crate::error::SkipReason;
use crate::reader::ByteReader;

/// Block type byte for a moment data block.
pub const MOMENT_BLOCK_TYPE: u8 = b'D';

/// Size of the fixed moment block header preceding the samples.
pub const MOMENT_HEADER_LEN: usize = 28;

pub const MIN_GATE_SPACING_M: u16 = 50;
pub const MAX_GATE_SPACING_M: u16 = 4_000;

/// Raw value meaning "below threshold".
const RAW_BELOW_THRESHOLD: u16 = 0;
/// Raw value meaning "range folded".
const RAW_RANGE_FOLDED: u16 = 1;

/// One moment's samples along a ray, in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentRecord {
    pub gate_count: u16,
    /// Range to the center of the first gate (km).
    pub first_gate_km: f32,
    /// Distance between gate centers (km).
    pub gate_spacing_km: f32,
    /// One value per gate; NaN marks below-threshold or range-folded gates.
    pub data: Vec<f32>,
}

impl MomentRecord {
    /// Range of gate `index` in km.
    pub fn range_km(&self, index: usize) -> f32 {
        self.first_gate_km + index as f32 * self.gate_spacing_km
    }

    /// Range of the last gate in km.
    pub fn max_range_km(&self) -> f32 {
        self.range_km((self.gate_count as usize).saturating_sub(1))
    }
}

/// A decoded moment block and its raw (trimmed) name.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentBlock {
    pub name: String,
    pub record: MomentRecord,
}

/// Decode the moment block starting at absolute `offset` in `data`.
pub fn decode_moment_block(
    data: &[u8],
    offset: usize,
    max_gates: u16,
) -> Result<MomentBlock, SkipReason> {
    let mut reader = ByteReader::at(data, offset);

    reader.skip(1)?;
    let name = reader.read_ascii(3)?;
    reader.skip(4)?;
    let gate_count = reader.read_u16()?;
    let first_gate_m = reader.read_u16()?;
    let gate_spacing_m = reader.read_u16()?;
    reader.skip(5)?;
    let word_size = reader.read_u8()?;
    let scale = reader.read_f32()?;
    let add_offset = reader.read_f32()?;

    if gate_count == 0 || gate_count > max_gates {
        return Err(SkipReason::GateCountOutOfRange(gate_count));
    }
    if !(MIN_GATE_SPACING_M..=MAX_GATE_SPACING_M).contains(&gate_spacing_m) {
        return Err(SkipReason::GateSpacingOutOfRange(gate_spacing_m));
    }
    if scale == 0.0 {
        return Err(SkipReason::ZeroScale);
    }

    let values = match word_size {
        8 => {
            let raw = reader.read_bytes(gate_count as usize)?;
            raw.iter()
                .map(|&v| to_physical(v as u16, scale, add_offset))
                .collect()
        }
        16 => {
            let raw = reader.read_bytes(gate_count as usize * 2)?;
            raw.chunks_exact(2)
                .map(|pair| to_physical(u16::from_be_bytes([pair[0], pair[1]]), scale, add_offset))
                .collect()
        }
        other => return Err(SkipReason::UnsupportedWordSize(other)),
    };

    Ok(MomentBlock {
        name,
        record: MomentRecord {
            gate_count,
            first_gate_km: first_gate_m as f32 / 1000.0,
            gate_spacing_km: gate_spacing_m as f32 / 1000.0,
            data: values,
        },
    })
}

/// Convert one raw sample to physical units.
///
/// Raw 0 and 1 are reserved flags and map to NaN.
pub fn to_physical(raw: u16, scale: f32, offset: f32) -> f32 {
    match raw {
        RAW_BELOW_THRESHOLD | RAW_RANGE_FOLDED => f32::NAN,
        v => (v as f32 - offset) / scale,
    }
}
