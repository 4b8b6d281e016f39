//! Volume header and compressed record demultiplexing.
//!
//! An Archive II file is a 24-byte volume header followed by a sequence of
//! records, each prefixed by a signed 32-bit size:
//!
//! - `size > 0`: the record is compressed and `size` bytes long
//! - `size < 0`: the record is stored raw and `|size|` bytes long
//! - `size == 0`: end of stream
//!
//! Compressed records are identified by their two-byte signature and handed
//! to a [`Decompressor`]. A failed record is dropped on its own; the scan
//! continues at the next record boundary.

use std::io::Read;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeResult, ReadError, SkipReason};
use crate::reader::ByteReader;
use crate::time::julian_to_datetime;

/// Size of the fixed volume header.
pub const VOLUME_HEADER_LEN: usize = 24;

/// Signature at the start of a bzip2 stream.
pub const BZIP2_SIGNATURE: [u8; 2] = *b"BZ";

/// Section 0 of the file: the fixed volume header.
///
/// Read in the byte order archive files use on disk, not station first:
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 9    | Tape filename (`AR2V00NN.`) |
/// | 9      | 3    | Extension |
/// | 12     | 4    | Julian day |
/// | 16     | 4    | Milliseconds of day |
/// | 20     | 4    | ICAO |
///
/// Station and time here are fallbacks for rays that carry none. A file
/// shorter than 24 bytes is the only header defect that fails a decode.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeHeader {
    /// Tape filename, e.g. `AR2V0006.`
    pub tape_filename: String,
    pub extension: String,
    pub julian_day: u32,
    pub ms_of_day: u32,
    /// Station ICAO as written in the header.
    pub icao: String,
}

impl VolumeHeader {
    /// Archive version digits from the tape filename (`"0006"` for `AR2V0006.`).
    pub fn archive_version(&self) -> Option<&str> {
        self.tape_filename
            .strip_prefix("AR2V")
            .map(|rest| rest.trim_end_matches('.'))
            .filter(|v| !v.is_empty())
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        julian_to_datetime(self.julian_day, self.ms_of_day)
    }

    /// Header ICAO if it looks like a station identifier.
    pub fn station_id(&self) -> Option<&str> {
        self.icao
            .chars()
            .next()
            .filter(|c| c.is_ascii_uppercase())
            .map(|_| self.icao.as_str())
    }
}

/// Parse the volume header at the start of `data`.
///
/// This is the only read in the decoder whose failure is fatal.
pub fn parse_volume_header(data: &[u8]) -> DecodeResult<VolumeHeader> {
    if data.len() < VOLUME_HEADER_LEN {
        return Err(DecodeError::HeaderTooShort { len: data.len() });
    }

    read_header(&mut ByteReader::new(data))
        .map_err(|_| DecodeError::HeaderTooShort { len: data.len() })
}

fn read_header(reader: &mut ByteReader<'_>) -> Result<VolumeHeader, ReadError> {
    Ok(VolumeHeader {
        tape_filename: reader.read_ascii(9)?,
        extension: reader.read_ascii(3)?,
        julian_day: reader.read_u32()?,
        ms_of_day: reader.read_u32()?,
        icao: reader.read_ascii(4)?,
    })
}

/// One record as stored in the file.
#[derive(Debug, Clone)]
pub struct Record {
    /// Position of the record in the file, counting from 0.
    pub index: usize,
    /// Offset of the record payload in the file.
    pub offset: usize,
    pub compressed: bool,
    pub data: Bytes,
}

/// Result of splitting the post-header stream into records.
#[derive(Debug, Clone, Default)]
pub struct RecordSplit {
    pub records: Vec<Record>,
    /// A record size pointed past the end of the buffer.
    pub truncated: bool,
}

/// Split everything after the volume header into records.
///
/// Stops at a zero size field, at the end of the buffer, or at the first
/// record that would overrun the buffer (a truncated file is not an error).
pub fn split_records(data: &Bytes) -> RecordSplit {
    let mut split = RecordSplit::default();
    let mut reader = ByteReader::at(data, VOLUME_HEADER_LEN);

    loop {
        let size = match reader.read_i32() {
            Ok(size) => size,
            Err(_) => break,
        };

        if size == 0 {
            debug!(offset = reader.offset() - 4, "End-of-stream marker");
            break;
        }

        let length = size.unsigned_abs() as usize;
        let start = reader.offset();
        if reader.skip(length).is_err() {
            warn!(
                offset = start,
                length,
                available = data.len() - start,
                "Record overruns end of file, stopping"
            );
            split.truncated = true;
            break;
        }

        split.records.push(Record {
            index: split.records.len(),
            offset: start,
            compressed: size > 0,
            data: data.slice(start..start + length),
        });
    }

    split
}

/// External decompression routine for compressed records.
///
/// Implementations must be thread-safe: records may be expanded in parallel.
pub trait Decompressor: Send + Sync {
    /// Two-byte signature of the streams this decompressor accepts.
    fn signature(&self) -> [u8; 2];

    /// Decompress one complete record.
    fn decompress(&self, input: &[u8]) -> std::io::Result<Vec<u8>>;
}

/// bzip2 decompression via the `bzip2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2Decompressor;

impl Decompressor for Bzip2Decompressor {
    fn signature(&self) -> [u8; 2] {
        BZIP2_SIGNATURE
    }

    fn decompress(&self, input: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 4);
        bzip2::read::BzDecoder::new(input).read_to_end(&mut output)?;
        Ok(output)
    }
}

/// Produce the message bytes of a record.
///
/// Raw records are returned as-is (zero copy); compressed records must carry
/// the decompressor's signature.
pub fn expand_record(
    record: &Record,
    decompressor: &dyn Decompressor,
) -> Result<Bytes, SkipReason> {
    if !record.compressed {
        return Ok(record.data.clone());
    }

    let magic: [u8; 2] = ByteReader::new(&record.data).read_array()?;
    if magic != decompressor.signature() {
        return Err(SkipReason::UnsupportedCompression(magic));
    }

    decompressor
        .decompress(&record.data)
        .map(Bytes::from)
        .map_err(|e| SkipReason::Decompression(e.to_string()))
}
