//! Decode pipeline: header, records, messages, rays, volume.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::messages::MessageScanner;
use crate::ray::{decode_ray, DecodedRay, MESSAGE_TYPE_RAY};
use crate::records::{
    expand_record, parse_volume_header, split_records, Bzip2Decompressor, Decompressor, Record,
};
use crate::volume::{RadarVolume, VolumeAccumulator};

/// Counters collected during a decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub records: usize,
    /// Records that failed to decompress.
    pub records_dropped: usize,
    /// The record stream ended with an overrun.
    pub truncated: bool,
    pub messages: usize,
    pub ray_messages: usize,
    pub resync_bytes: usize,
    pub rays_accepted: usize,
    pub rays_rejected: usize,
    pub moment_blocks_dropped: usize,
}

impl DecodeStats {
    fn merge(&mut self, other: &DecodeStats) {
        self.records += other.records;
        self.records_dropped += other.records_dropped;
        self.truncated |= other.truncated;
        self.messages += other.messages;
        self.ray_messages += other.ray_messages;
        self.resync_bytes += other.resync_bytes;
        self.rays_accepted += other.rays_accepted;
        self.rays_rejected += other.rays_rejected;
        self.moment_blocks_dropped += other.moment_blocks_dropped;
    }
}

/// A decoded volume plus the counters gathered while decoding it.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    pub volume: RadarVolume,
    pub stats: DecodeStats,
}

#[derive(Default)]
struct SegmentOutput {
    rays: Vec<DecodedRay>,
    stats: DecodeStats,
}

/// Archive II decoder.
///
/// Stateless between calls; one decoder can be shared across threads.
#[derive(Clone)]
pub struct Level2Decoder {
    config: DecoderConfig,
    decompressor: Arc<dyn Decompressor>,
}

impl fmt::Debug for Level2Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level2Decoder")
            .field("config", &self.config)
            .field("signature", &self.decompressor.signature())
            .finish()
    }
}

impl Level2Decoder {
    /// Create a decoder using bzip2 for compressed records.
    pub fn new(config: DecoderConfig) -> DecodeResult<Self> {
        config.validate().map_err(DecodeError::InvalidConfig)?;
        Ok(Self {
            config,
            decompressor: Arc::new(Bzip2Decompressor),
        })
    }

    /// Replace the decompression routine.
    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = decompressor;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a complete Archive II file held in memory.
    ///
    /// Only a missing header or a volume without any valid ray is an error;
    /// every other defect drops the affected record, message or ray.
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub fn decode(&self, data: Bytes) -> DecodeResult<DecodeOutput> {
        let header = parse_volume_header(&data)?;
        debug!(
            tape = %header.tape_filename,
            icao = %header.icao,
            julian_day = header.julian_day,
            "Parsed volume header"
        );

        let split = split_records(&data);

        let segments: Vec<SegmentOutput> = if self.config.parallel_segments {
            split.records.par_iter().map(|r| self.decode_segment(r)).collect()
        } else {
            split.records.iter().map(|r| self.decode_segment(r)).collect()
        };

        let mut stats = DecodeStats {
            records: split.records.len(),
            truncated: split.truncated,
            ..Default::default()
        };
        let mut accumulator = VolumeAccumulator::new();
        for segment in segments {
            stats.merge(&segment.stats);
            for ray in segment.rays {
                accumulator.push(ray);
            }
        }

        let volume = accumulator.finish(&header)?;

        info!(
            station = volume.station_id(),
            vcp = volume.vcp(),
            sweeps = volume.sweep_count(),
            records = stats.records,
            rays = stats.rays_accepted,
            rays_rejected = stats.rays_rejected,
            records_dropped = stats.records_dropped,
            "Decoded volume"
        );

        Ok(DecodeOutput { volume, stats })
    }

    fn decode_segment(&self, record: &Record) -> SegmentOutput {
        let mut out = SegmentOutput::default();

        let bytes = match expand_record(record, self.decompressor.as_ref()) {
            Ok(bytes) => bytes,
            Err(reason) => {
                warn!(
                    record = record.index,
                    offset = record.offset,
                    reason = %reason,
                    "Dropping record"
                );
                out.stats.records_dropped = 1;
                return out;
            }
        };

        let mut scanner =
            MessageScanner::with_max_message_bytes(&bytes, self.config.max_message_bytes);
        for message in scanner.by_ref() {
            out.stats.messages += 1;
            if message.message_type != MESSAGE_TYPE_RAY {
                continue;
            }
            out.stats.ray_messages += 1;

            match decode_ray(message.body, &self.config) {
                Ok(ray) => {
                    out.stats.rays_accepted += 1;
                    out.stats.moment_blocks_dropped += ray.dropped_blocks;
                    out.rays.push(ray);
                }
                Err(reason) => {
                    debug!(
                        record = record.index,
                        offset = message.offset,
                        reason = %reason,
                        "Rejecting ray"
                    );
                    out.stats.rays_rejected += 1;
                }
            }
        }
        out.stats.resync_bytes = scanner.resync_bytes();

        out
    }
}

/// Decode an in-memory file with the default configuration.
pub fn decode_volume(data: &[u8]) -> DecodeResult<RadarVolume> {
    Level2Decoder::new(DecoderConfig::default())?
        .decode(Bytes::copy_from_slice(data))
        .map(|output| output.volume)
}

/// Read and decode a file from disk.
pub fn decode_file(path: impl AsRef<Path>, config: &DecoderConfig) -> DecodeResult<DecodeOutput> {
    let data = std::fs::read(path.as_ref())?;
    Level2Decoder::new(config.clone())?.decode(Bytes::from(data))
}
