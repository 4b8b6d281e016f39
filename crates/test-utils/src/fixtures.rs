//! Builders for synthetic Archive II volumes.
//!
//! The builders emit the exact byte layout the decoder reads: a 24-byte
//! volume header, size-prefixed records (bzip2 or raw), 12-byte frame
//! prefixes, 16-byte message headers and type-31 ray bodies with data
//! block pointers.
//!
//! Fields are public-by-method so tests can also produce malformed input
//! (bad sizes, out-of-range angles, invalid gate geometry).

use std::io::Write;
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use bzip2::Compression as BzLevel;

/// Default station used by the builders.
pub const STATION: &str = "KTLX";

/// Julian day for 2013-05-20 (day 1 is 1970-01-01).
pub const JULIAN_DAY_2013_05_20: u32 = 15_846;

/// Message type of a digital radar data message.
pub const RAY_MESSAGE_TYPE: u8 = 31;

const FRAME_PREFIX_LEN: usize = 12;
const MESSAGE_HEADER_LEN: usize = 16;
const RAY_FIXED_LEN: usize = 32;
const VOLUME_BLOCK_LEN: usize = 44;

/// How a record is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// bzip2 stream, positive size field
    Bzip2,
    /// Stored as-is, negative size field
    Raw,
}

/// Compress bytes with bzip2.
pub fn bzip2_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), BzLevel::best());
    encoder.write_all(data).expect("bzip2 write to Vec cannot fail");
    encoder.finish().expect("bzip2 finish to Vec cannot fail")
}

/// Wrap a message body in a frame prefix and message header.
///
/// Odd-length bodies are padded by one byte so the size fits in halfwords.
pub fn message_frame(message_type: u8, body: &[u8]) -> Vec<u8> {
    let mut padded = body.to_vec();
    if padded.len() % 2 == 1 {
        padded.push(0);
    }
    let halfwords = ((MESSAGE_HEADER_LEN + padded.len()) / 2) as u16;

    let mut out = vec![0u8; FRAME_PREFIX_LEN];
    out.extend_from_slice(&halfwords.to_be_bytes());
    out.push(0); // channel
    out.push(message_type);
    out.extend_from_slice(&[0u8; MESSAGE_HEADER_LEN - 4]);
    out.extend(padded);
    out
}

/// One moment data block.
#[derive(Debug, Clone)]
pub struct MomentBuilder {
    name: String,
    gate_count: Option<u16>,
    first_gate_m: u16,
    gate_spacing_m: u16,
    word_size: u8,
    scale: f32,
    offset: f32,
    raw: Vec<u16>,
}

impl MomentBuilder {
    /// New block with reflectivity-style quantization (scale 2, offset 66).
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gate_count: None,
            first_gate_m: 2_125,
            gate_spacing_m: 250,
            word_size: 8,
            scale: 2.0,
            offset: 66.0,
            raw: Vec::new(),
        }
    }

    /// Raw quantized samples. The gate count follows the sample count.
    pub fn raw(mut self, values: Vec<u16>) -> Self {
        self.raw = values;
        self
    }

    /// Physical samples, quantized with the block's scale and offset.
    ///
    /// NaN becomes the below-threshold flag (raw 0).
    pub fn physical(mut self, values: &[f32]) -> Self {
        self.raw = values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    0
                } else {
                    (v * self.scale + self.offset).round() as u16
                }
            })
            .collect();
        self
    }

    /// Override the declared gate count (samples are written unchanged).
    pub fn gate_count(mut self, gates: u16) -> Self {
        self.gate_count = Some(gates);
        self
    }

    pub fn first_gate_m(mut self, meters: u16) -> Self {
        self.first_gate_m = meters;
        self
    }

    pub fn gate_spacing_m(mut self, meters: u16) -> Self {
        self.gate_spacing_m = meters;
        self
    }

    pub fn word_size(mut self, bits: u8) -> Self {
        self.word_size = bits;
        self
    }

    /// Set the quantization. Call before [`MomentBuilder::physical`].
    pub fn scale_offset(mut self, scale: f32, offset: f32) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut name = [b' '; 3];
        for (dst, src) in name.iter_mut().zip(self.name.bytes()) {
            *dst = src;
        }
        let gate_count = self.gate_count.unwrap_or(self.raw.len() as u16);

        let mut out = vec![b'D'];
        out.extend_from_slice(&name);
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&gate_count.to_be_bytes());
        out.extend_from_slice(&self.first_gate_m.to_be_bytes());
        out.extend_from_slice(&self.gate_spacing_m.to_be_bytes());
        out.extend_from_slice(&[0u8; 5]);
        out.push(self.word_size);
        out.extend_from_slice(&self.scale.to_be_bytes());
        out.extend_from_slice(&self.offset.to_be_bytes());
        for &v in &self.raw {
            if self.word_size == 16 {
                out.extend_from_slice(&v.to_be_bytes());
            } else {
                out.push(v as u8);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
enum AzimuthField {
    Float(f32),
    Scaled(u32),
}

#[derive(Debug, Clone, Copy)]
struct VolumeBlockSpec {
    vcp: u16,
    latitude: f32,
    longitude: f32,
    height_m: i16,
}

/// One type-31 ray message.
#[derive(Debug, Clone)]
pub struct RayBuilder {
    station: [u8; 4],
    collection_ms: u32,
    julian_day: u16,
    azimuth_number: u16,
    azimuth: AzimuthField,
    radial_status: u8,
    elevation_number: u8,
    elevation: f32,
    volume: Option<VolumeBlockSpec>,
    moments: Vec<MomentBuilder>,
    block_count: Option<u16>,
}

impl RayBuilder {
    pub fn new(elevation_number: u8, azimuth: f32, elevation: f32) -> Self {
        let mut station = [0u8; 4];
        station.copy_from_slice(STATION.as_bytes());
        Self {
            station,
            collection_ms: 72_000_000,
            julian_day: JULIAN_DAY_2013_05_20 as u16,
            azimuth_number: 1,
            azimuth: AzimuthField::Float(azimuth),
            radial_status: 1,
            elevation_number,
            elevation,
            volume: None,
            moments: Vec::new(),
            block_count: None,
        }
    }

    /// Four raw station bytes.
    pub fn station(mut self, station: [u8; 4]) -> Self {
        self.station = station;
        self
    }

    pub fn time(mut self, julian_day: u16, collection_ms: u32) -> Self {
        self.julian_day = julian_day;
        self.collection_ms = collection_ms;
        self
    }

    pub fn azimuth_number(mut self, number: u16) -> Self {
        self.azimuth_number = number;
        self
    }

    pub fn radial_status(mut self, status: u8) -> Self {
        self.radial_status = status;
        self
    }

    /// Write the azimuth as an integer count of eighths of a degree.
    pub fn scaled_azimuth(mut self, eighths: u32) -> Self {
        self.azimuth = AzimuthField::Scaled(eighths);
        self
    }

    /// Attach a volume data block.
    pub fn volume_block(mut self, vcp: u16, latitude: f32, longitude: f32, height_m: i16) -> Self {
        self.volume = Some(VolumeBlockSpec {
            vcp,
            latitude,
            longitude,
            height_m,
        });
        self
    }

    pub fn moment(mut self, moment: MomentBuilder) -> Self {
        self.moments.push(moment);
        self
    }

    /// Override the declared data block count.
    pub fn block_count(mut self, count: u16) -> Self {
        self.block_count = Some(count);
        self
    }

    /// Encode the message body (no frame).
    pub fn encode_body(&self) -> Vec<u8> {
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        if let Some(vol) = self.volume {
            blocks.push(encode_volume_block(vol));
        }
        blocks.extend(self.moments.iter().map(MomentBuilder::encode));

        let declared = self.block_count.unwrap_or(blocks.len() as u16);

        let mut body = Vec::new();
        body.extend_from_slice(&self.station);
        body.extend_from_slice(&self.collection_ms.to_be_bytes());
        body.extend_from_slice(&self.julian_day.to_be_bytes());
        body.extend_from_slice(&self.azimuth_number.to_be_bytes());
        match self.azimuth {
            AzimuthField::Float(v) => body.extend_from_slice(&v.to_be_bytes()),
            AzimuthField::Scaled(v) => body.extend_from_slice(&v.to_be_bytes()),
        }
        body.extend_from_slice(&[0u8; 5]);
        body.push(self.radial_status);
        body.push(self.elevation_number);
        body.push(0); // cut sector
        body.extend_from_slice(&self.elevation.to_be_bytes());
        body.extend_from_slice(&[0u8; 2]);
        body.extend_from_slice(&declared.to_be_bytes());
        debug_assert_eq!(body.len(), RAY_FIXED_LEN);

        // Pointers are written for the blocks that exist; a declared count
        // larger than that leaves the remaining pointer slots missing.
        let mut cursor = RAY_FIXED_LEN + blocks.len() * 4;
        for block in &blocks {
            body.extend_from_slice(&(cursor as u32).to_be_bytes());
            cursor += block.len();
        }
        for block in blocks {
            body.extend(block);
        }
        body
    }

    /// Encode the framed message.
    pub fn encode(&self) -> Vec<u8> {
        message_frame(RAY_MESSAGE_TYPE, &self.encode_body())
    }
}

fn encode_volume_block(spec: VolumeBlockSpec) -> Vec<u8> {
    let mut out = Vec::with_capacity(VOLUME_BLOCK_LEN);
    out.push(b'R');
    out.extend_from_slice(b"VOL");
    out.extend_from_slice(&(VOLUME_BLOCK_LEN as u16).to_be_bytes());
    out.push(1); // major version
    out.push(0); // minor version
    out.extend_from_slice(&spec.latitude.to_be_bytes());
    out.extend_from_slice(&spec.longitude.to_be_bytes());
    out.extend_from_slice(&spec.height_m.to_be_bytes());
    out.extend_from_slice(&[0u8; 22]);
    out.extend_from_slice(&spec.vcp.to_be_bytes());
    out.extend_from_slice(&[0u8; 2]);
    out
}

/// A complete Archive II file.
#[derive(Debug, Clone)]
pub struct VolumeBuilder {
    tape_filename: String,
    extension: String,
    julian_day: u32,
    ms_of_day: u32,
    icao: String,
    stream: Vec<u8>,
}

impl VolumeBuilder {
    pub fn new() -> Self {
        Self {
            tape_filename: "AR2V0006.".to_string(),
            extension: "001".to_string(),
            julian_day: JULIAN_DAY_2013_05_20,
            ms_of_day: 72_000_000,
            icao: STATION.to_string(),
            stream: Vec::new(),
        }
    }

    pub fn icao(mut self, icao: &str) -> Self {
        self.icao = icao.to_string();
        self
    }

    pub fn header_time(mut self, julian_day: u32, ms_of_day: u32) -> Self {
        self.julian_day = julian_day;
        self.ms_of_day = ms_of_day;
        self
    }

    /// Append a record holding `payload` (concatenated message frames).
    pub fn record(mut self, compression: Compression, payload: &[u8]) -> Self {
        match compression {
            Compression::Bzip2 => {
                let compressed = bzip2_compress(payload);
                self.stream.extend_from_slice(&(compressed.len() as i32).to_be_bytes());
                self.stream.extend(compressed);
            }
            Compression::Raw => {
                self.stream.extend_from_slice(&(-(payload.len() as i32)).to_be_bytes());
                self.stream.extend_from_slice(payload);
            }
        }
        self
    }

    /// Append a record holding the given rays.
    pub fn rays(self, compression: Compression, rays: &[RayBuilder]) -> Self {
        let payload: Vec<u8> = rays.iter().flat_map(RayBuilder::encode).collect();
        self.record(compression, &payload)
    }

    /// Append a size field and bytes verbatim.
    pub fn raw_record(mut self, size_field: i32, bytes: &[u8]) -> Self {
        self.stream.extend_from_slice(&size_field.to_be_bytes());
        self.stream.extend_from_slice(bytes);
        self
    }

    /// Append a zero size field (end of stream).
    pub fn end_marker(self) -> Self {
        self.raw_record(0, &[])
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(24 + self.stream.len());
        out.extend(fixed_ascii(&self.tape_filename, 9));
        out.extend(fixed_ascii(&self.extension, 3));
        out.extend_from_slice(&self.julian_day.to_be_bytes());
        out.extend_from_slice(&self.ms_of_day.to_be_bytes());
        out.extend(fixed_ascii(&self.icao, 4));
        out.extend_from_slice(&self.stream);
        out
    }

    /// Write the file into `dir` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, self.build())?;
        Ok(path)
    }
}

impl Default for VolumeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn fixed_ascii(s: &str, width: usize) -> Vec<u8> {
    let mut out = vec![b' '; width];
    for (dst, src) in out.iter_mut().zip(s.bytes()) {
        *dst = src;
    }
    out
}

/// A full sweep of evenly spaced rays.
///
/// Each ray carries every named moment with `gate_count` gates; sample
/// values follow `ray * 10 + gate` in physical units (wrapped to stay in
/// the 8-bit range).
pub fn uniform_sweep(
    elevation_number: u8,
    elevation: f32,
    ray_count: usize,
    gate_count: usize,
    moments: &[&str],
) -> Vec<RayBuilder> {
    (0..ray_count)
        .map(|r| {
            let azimuth = r as f32 * 360.0 / ray_count as f32;
            let values: Vec<f32> = (0..gate_count).map(|g| ((r * 10 + g) % 90) as f32).collect();
            moments.iter().fold(
                RayBuilder::new(elevation_number, azimuth, elevation).azimuth_number(r as u16 + 1),
                |ray, name| ray.moment(MomentBuilder::new(name).physical(&values)),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let data = VolumeBuilder::new().build();
        assert_eq!(data.len(), 24);
        assert_eq!(&data[0..12], b"AR2V0006.001");
        assert_eq!(&data[20..24], b"KTLX");
    }

    #[test]
    fn test_message_frame_size_in_halfwords() {
        let frame = message_frame(31, &[1, 2, 3]);
        // 3 byte body padded to 4, plus 16 header bytes = 10 halfwords
        assert_eq!(u16::from_be_bytes([frame[12], frame[13]]), 10);
        assert_eq!(frame[15], 31);
        assert_eq!(frame.len(), 12 + 20);
    }

    #[test]
    fn test_ray_pointers_address_blocks() {
        let body = RayBuilder::new(1, 10.0, 0.5)
            .volume_block(212, 35.3, -97.3, 370)
            .moment(MomentBuilder::new("REF").raw(vec![2, 3]))
            .encode_body();

        let count = u16::from_be_bytes([body[30], body[31]]) as usize;
        assert_eq!(count, 2);
        let vol = u32::from_be_bytes(body[32..36].try_into().unwrap()) as usize;
        let refl = u32::from_be_bytes(body[36..40].try_into().unwrap()) as usize;
        assert_eq!(&body[vol..vol + 4], b"RVOL");
        assert_eq!(&body[refl..refl + 4], b"DREF");
    }

    #[test]
    fn test_physical_quantization() {
        let block = MomentBuilder::new("REF").physical(&[f32::NAN, 0.0, 10.0]).encode();
        assert_eq!(&block[28..], &[0, 66, 86]);
    }

    #[test]
    fn test_raw_record_size_field_is_negative() {
        let data = VolumeBuilder::new().record(Compression::Raw, &[1, 2]).build();
        assert_eq!(i32::from_be_bytes(data[24..28].try_into().unwrap()), -2);
    }
}
