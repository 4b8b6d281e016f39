//! Common helpers for nexrad-decoder integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use nexrad_decoder::{DecodeOutput, DecoderConfig, Level2Decoder};
use test_utils::{uniform_sweep, Compression, VolumeBuilder};

/// Gates per moment in the synthetic sweeps.
pub const GATES: usize = 10;

pub fn decoder() -> Level2Decoder {
    Level2Decoder::new(DecoderConfig::default()).expect("default config is valid")
}

pub fn parallel_decoder() -> Level2Decoder {
    Level2Decoder::new(DecoderConfig {
        parallel_segments: true,
        ..Default::default()
    })
    .expect("parallel config is valid")
}

pub fn decode(data: Vec<u8>) -> DecodeOutput {
    decoder().decode(Bytes::from(data)).expect("volume should decode")
}

/// Three sweeps (elevation numbers 1, 2, 3) of 4, 6 and 8 rays, one record
/// per sweep. Sweep 1 carries REF and VEL, the others only REF.
pub fn three_sweep_volume(compression: Compression) -> VolumeBuilder {
    VolumeBuilder::new()
        .rays(compression, &uniform_sweep(1, 0.5, 4, GATES, &["REF", "VEL"]))
        .rays(compression, &uniform_sweep(2, 1.5, 6, GATES, &["REF"]))
        .rays(compression, &uniform_sweep(3, 2.4, 8, GATES, &["REF"]))
}

/// Physical value written by `uniform_sweep` for (ray, gate).
pub fn sweep_value(ray: usize, gate: usize) -> f32 {
    ((ray * 10 + gate) % 90) as f32
}
