//! End-to-end decoding of synthetic Archive II volumes.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use nexrad_decoder::{
    decode_file, decode_volume, DecodeError, DecoderConfig, Decompressor, Level2Decoder, MomentKind,
    QueryError,
};
use test_utils::{
    message_frame, temp_test_dir, uniform_sweep, Compression, MomentBuilder, RayBuilder,
    VolumeBuilder,
};

use common::{decode, decoder, parallel_decoder, sweep_value, three_sweep_volume, GATES};

#[test]
fn test_three_sweeps_round_trip() {
    let output = decode(three_sweep_volume(Compression::Bzip2).build());
    let volume = &output.volume;

    assert_eq!(volume.sweep_count(), 3);
    let ray_counts: Vec<usize> = volume.sweeps().iter().map(|s| s.ray_count).collect();
    assert_eq!(ray_counts, vec![4, 6, 8]);
    let elevations: Vec<f32> = volume.sweeps().iter().map(|s| s.elevation).collect();
    assert_eq!(elevations, vec![0.5, 1.5, 2.4]);

    assert_eq!(volume.moment_names(), vec![MomentKind::Reflectivity, MomentKind::Velocity]);
    assert_eq!(volume.sweep_moment_names(2).unwrap(), vec![MomentKind::Reflectivity]);

    let refl = volume.extract_moment(1, MomentKind::Reflectivity).unwrap();
    assert_eq!(refl.ray_count, 6);
    assert_eq!(refl.gate_count, GATES);
    assert_eq!(refl.azimuths, vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0]);
    assert_eq!(refl.elevation, 1.5);
    test_utils::assert_approx_eq!(refl.ranges[0], 2.125, 1e-6);
    test_utils::assert_approx_eq!(refl.ranges[GATES - 1], 2.125 + 9.0 * 0.25, 1e-5);
    for ray in 0..6 {
        for gate in 0..GATES {
            assert_eq!(refl.value(ray, gate), Some(sweep_value(ray, gate)));
        }
    }

    assert_eq!(output.stats.records, 3);
    assert_eq!(output.stats.rays_accepted, 18);
    assert_eq!(output.stats.rays_rejected, 0);
    assert!(!output.stats.truncated);
}

#[test]
fn test_unit_scale_values_survive() {
    let ray = RayBuilder::new(1, 0.0, 0.5).moment(
        MomentBuilder::new("REF")
            .scale_offset(1.0, 0.0)
            .raw(vec![2, 3, 4]),
    );

    let volume = decode(VolumeBuilder::new().rays(Compression::Bzip2, &[ray]).build()).volume;
    let refl = volume.extract_moment(0, MomentKind::Reflectivity).unwrap();
    assert_eq!(refl.data, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_raw_records_decode_like_compressed() {
    let raw = decode(three_sweep_volume(Compression::Raw).build());
    let bz = decode(three_sweep_volume(Compression::Bzip2).build());

    assert_eq!(raw.volume.sweeps(), bz.volume.sweeps());
    assert_eq!(
        raw.volume.extract_moment(0, MomentKind::Velocity).unwrap(),
        bz.volume.extract_moment(0, MomentKind::Velocity).unwrap()
    );
}

#[test]
fn test_decoding_is_idempotent() {
    let data = Bytes::from(three_sweep_volume(Compression::Bzip2).build());
    let decoder = decoder();

    let first = decoder.decode(data.clone()).unwrap();
    let second = decoder.decode(data).unwrap();

    assert_eq!(first.stats, second.stats);
    assert_eq!(first.volume.sweeps(), second.volume.sweeps());
    for index in 0..first.volume.sweep_count() {
        assert_eq!(first.volume.rays(index).unwrap(), second.volume.rays(index).unwrap());
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let data = Bytes::from(three_sweep_volume(Compression::Bzip2).build());

    let sequential = decoder().decode(data.clone()).unwrap();
    let parallel = parallel_decoder().decode(data).unwrap();

    assert_eq!(sequential.stats, parallel.stats);
    assert_eq!(
        serde_json::to_value(sequential.volume.summary()).unwrap(),
        serde_json::to_value(parallel.volume.summary()).unwrap()
    );
    for index in 0..sequential.volume.sweep_count() {
        assert_eq!(
            sequential.volume.rays(index).unwrap(),
            parallel.volume.rays(index).unwrap()
        );
    }
}

#[test]
fn test_out_of_order_elevation_numbers_are_renumbered() {
    let data = VolumeBuilder::new()
        .rays(Compression::Raw, &uniform_sweep(3, 3.1, 2, 4, &["REF"]))
        .rays(Compression::Raw, &uniform_sweep(1, 0.5, 3, 4, &["REF"]))
        .rays(Compression::Raw, &uniform_sweep(2, 1.3, 4, 4, &["REF"]))
        .build();

    let volume = decode(data).volume;
    let numbers: Vec<u8> = volume.sweeps().iter().map(|s| s.elevation_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(volume.sweep(0).unwrap().ray_count, 3);
    assert_eq!(volume.sweep(2).unwrap().elevation, 3.1);
}

#[test]
fn test_volume_metadata() {
    let first = RayBuilder::new(1, 0.0, 0.5)
        .volume_block(212, 35.333, -97.278, 370)
        .moment(MomentBuilder::new("REF").physical(&[10.0, 20.0]));
    let second = RayBuilder::new(1, 1.0, 0.5)
        .volume_block(35, 10.0, 10.0, 1)
        .moment(MomentBuilder::new("REF").physical(&[10.0, 20.0]));

    let data = VolumeBuilder::new()
        .rays(Compression::Bzip2, &[first, second])
        .build();
    let volume = decode(data).volume;

    assert_eq!(volume.station_id(), "KTLX");
    assert_eq!(volume.vcp(), 212);
    assert_eq!(volume.archive_version(), Some("0006"));
    let site = volume.site().unwrap();
    assert_eq!(site.height_m, 370);
    test_utils::assert_approx_eq!(site.latitude, 35.333, 1e-4);
    assert_eq!(
        volume.timestamp(),
        Some(Utc.with_ymd_and_hms(2013, 5, 20, 20, 0, 0).unwrap())
    );

    let ray = &volume.rays(0).unwrap()[0];
    assert_eq!(ray.radial_status, 1);
    assert_eq!(ray.azimuth_number, 1);
}

#[test]
fn test_header_time_used_when_rays_have_none() {
    let ray = RayBuilder::new(1, 0.0, 0.5)
        .time(0, 0)
        .moment(MomentBuilder::new("REF").physical(&[1.0]));
    let data = VolumeBuilder::new()
        .header_time(15_846, 3_600_000)
        .rays(Compression::Raw, &[ray])
        .build();

    let volume = decode(data).volume;
    assert_eq!(volume.vcp(), 0);
    assert!(volume.site().is_none());
    assert_eq!(
        volume.timestamp(),
        Some(Utc.with_ymd_and_hms(2013, 5, 20, 1, 0, 0).unwrap())
    );
}

#[test]
fn test_zero_size_record_ends_stream() {
    let data = VolumeBuilder::new()
        .rays(Compression::Bzip2, &uniform_sweep(1, 0.5, 4, 4, &["REF"]))
        .end_marker()
        .rays(Compression::Bzip2, &uniform_sweep(2, 1.5, 4, 4, &["REF"]))
        .build();

    let output = decode(data);
    assert_eq!(output.volume.sweep_count(), 1);
    assert_eq!(output.stats.records, 1);
}

#[test]
fn test_truncated_record_keeps_earlier_sweeps() {
    let data = VolumeBuilder::new()
        .rays(Compression::Bzip2, &uniform_sweep(1, 0.5, 4, 4, &["REF"]))
        .raw_record(-5_000, &[0u8; 64])
        .build();

    let output = decode(data);
    assert!(output.stats.truncated);
    assert_eq!(output.volume.sweep_count(), 1);
}

#[test]
fn test_failed_decompression_drops_only_that_record() {
    let data = VolumeBuilder::new()
        .rays(Compression::Bzip2, &uniform_sweep(1, 0.5, 4, 4, &["REF"]))
        .raw_record(16, b"BZh9 not bzip2!!")
        .raw_record(4, &[0x1f, 0x8b, 0x08, 0x00])
        .rays(Compression::Bzip2, &uniform_sweep(2, 1.5, 4, 4, &["REF"]))
        .build();

    let output = decode(data);
    assert_eq!(output.stats.records, 4);
    assert_eq!(output.stats.records_dropped, 2);
    assert_eq!(output.volume.sweep_count(), 2);
}

#[test]
fn test_scanner_resyncs_past_garbage() {
    let rays = uniform_sweep(1, 0.5, 2, 4, &["REF"]);
    let mut payload = vec![0xFFu8; 5];
    for ray in &rays {
        payload.extend(ray.encode());
    }

    let output = decode(VolumeBuilder::new().record(Compression::Raw, &payload).build());
    assert_eq!(output.stats.resync_bytes, 5);
    assert_eq!(output.stats.rays_accepted, 2);
    assert_eq!(output.volume.sweep(0).unwrap().ray_count, 2);
}

#[test]
fn test_non_ray_messages_are_skipped() {
    let mut payload = message_frame(2, &[0u8; 20]);
    payload.extend(message_frame(15, &[7u8; 40]));
    payload.extend(uniform_sweep(1, 0.5, 1, 4, &["REF"])[0].encode());

    let output = decode(VolumeBuilder::new().record(Compression::Bzip2, &payload).build());
    assert_eq!(output.stats.messages, 3);
    assert_eq!(output.stats.ray_messages, 1);
    assert_eq!(output.stats.rays_accepted, 1);
}

#[test]
fn test_invalid_rays_are_dropped() {
    let refl = || MomentBuilder::new("REF").physical(&[1.0, 2.0]);
    let rays = [
        RayBuilder::new(1, 10.0, 0.5).moment(refl()),
        RayBuilder::new(1, 400.0, 0.5).moment(refl()),
        RayBuilder::new(1, 20.0, 95.0).moment(refl()),
        RayBuilder::new(1, 30.0, 0.5).station(*b"ktlx").moment(refl()),
        RayBuilder::new(1, 40.0, 0.5).moment(refl()).block_count(16),
        RayBuilder::new(1, 50.0, 0.5),
        RayBuilder::new(1, 60.0, 0.5)
            .moment(MomentBuilder::new("REF").gate_spacing_m(10).physical(&[1.0])),
        RayBuilder::new(1, 70.0, 0.5).moment(MomentBuilder::new("XYZ").physical(&[1.0])),
    ];

    let output = decode(VolumeBuilder::new().rays(Compression::Bzip2, &rays).build());
    assert_eq!(output.stats.rays_accepted, 1);
    assert_eq!(output.stats.rays_rejected, 7);
    assert_eq!(output.volume.rays(0).unwrap()[0].azimuth, 10.0);
}

#[test]
fn test_bad_moment_block_dropped_from_valid_ray() {
    let ray = RayBuilder::new(1, 10.0, 0.5)
        .moment(MomentBuilder::new("REF").physical(&[1.0, 2.0]))
        .moment(MomentBuilder::new("VEL").word_size(12).physical(&[1.0, 2.0]))
        .moment(MomentBuilder::new("ZDR").scale_offset(0.0, 128.0).raw(vec![130, 131]));

    let output = decode(VolumeBuilder::new().rays(Compression::Raw, &[ray]).build());
    assert_eq!(output.stats.moment_blocks_dropped, 2);
    assert_eq!(output.volume.moment_names(), vec![MomentKind::Reflectivity]);
}

#[test]
fn test_scaled_integer_azimuth() {
    let ray = RayBuilder::new(1, 0.0, 0.5)
        .scaled_azimuth(1_000)
        .moment(MomentBuilder::new("REF").physical(&[1.0]));

    let volume = decode(VolumeBuilder::new().rays(Compression::Raw, &[ray]).build()).volume;
    assert_eq!(volume.rays(0).unwrap()[0].azimuth, 125.0);
}

#[test]
fn test_sixteen_bit_moment() {
    let ray = RayBuilder::new(1, 0.0, 0.5).moment(
        MomentBuilder::new("PHI")
            .word_size(16)
            .scale_offset(2.8361, 2.0)
            .raw(vec![0, 1, 2, 1_023]),
    );

    let volume = decode(VolumeBuilder::new().rays(Compression::Bzip2, &[ray]).build()).volume;
    let phi = volume.extract_moment(0, MomentKind::DifferentialPhase).unwrap();
    assert!(phi.data[0].is_nan());
    assert!(phi.data[1].is_nan());
    assert_eq!(phi.data[2], 0.0);
    test_utils::assert_approx_eq!(phi.data[3], 1_021.0 / 2.8361, 1e-3);
}

#[test]
fn test_extract_pads_missing_and_short_rays() {
    let rays = [
        RayBuilder::new(1, 0.0, 0.5).moment(MomentBuilder::new("VEL").physical(&[1.0])),
        RayBuilder::new(1, 1.0, 0.5).moment(MomentBuilder::new("REF").physical(&[1.0, 2.0, 3.0])),
        RayBuilder::new(1, 2.0, 0.5).moment(MomentBuilder::new("REF").physical(&[4.0])),
        RayBuilder::new(1, 3.0, 0.5)
            .moment(MomentBuilder::new("REF").physical(&[5.0, 6.0, 7.0, 8.0])),
    ];

    let volume = decode(VolumeBuilder::new().rays(Compression::Raw, &rays).build()).volume;
    let refl = volume.extract_moment(0, MomentKind::Reflectivity).unwrap();

    assert_eq!((refl.ray_count, refl.gate_count), (4, 3));
    assert!((0..3).all(|g| refl.value(0, g).unwrap().is_nan()));
    assert_eq!(refl.value(1, 2), Some(3.0));
    assert!(refl.value(2, 1).unwrap().is_nan());
    assert_eq!(refl.value(3, 2), Some(7.0));
}

#[test]
fn test_query_errors() {
    let volume = decode(three_sweep_volume(Compression::Raw).build()).volume;

    assert_eq!(
        volume.extract_moment(3, MomentKind::Reflectivity).unwrap_err(),
        QueryError::SweepOutOfRange { index: 3, count: 3 }
    );
    assert_eq!(
        volume.extract_moment(1, MomentKind::Velocity).unwrap_err(),
        QueryError::MomentNotFound {
            sweep: 1,
            moment: MomentKind::Velocity
        }
    );
    assert_eq!(
        "XYZ".parse::<MomentKind>().unwrap_err(),
        QueryError::UnknownMoment("XYZ".to_string())
    );
}

#[test]
fn test_fatal_errors() {
    assert!(matches!(
        decode_volume(&[0u8; 10]),
        Err(DecodeError::HeaderTooShort { len: 10 })
    ));
    assert!(matches!(
        decode_volume(&VolumeBuilder::new().build()),
        Err(DecodeError::NoSweeps)
    ));

    let only_bad = VolumeBuilder::new()
        .rays(
            Compression::Raw,
            &[RayBuilder::new(1, 500.0, 0.5).moment(MomentBuilder::new("REF").physical(&[1.0]))],
        )
        .build();
    assert!(matches!(decode_volume(&only_bad), Err(DecodeError::NoSweeps)));
}

#[test]
fn test_invalid_config_rejected() {
    let result = Level2Decoder::new(DecoderConfig {
        max_gates: 0,
        ..Default::default()
    });
    assert!(matches!(result, Err(DecodeError::InvalidConfig(_))));
}

#[test]
fn test_max_gates_limit_applies() {
    let data = VolumeBuilder::new()
        .rays(Compression::Raw, &uniform_sweep(1, 0.5, 2, 8, &["REF"]))
        .build();
    let decoder = Level2Decoder::new(DecoderConfig {
        max_gates: 4,
        ..Default::default()
    })
    .unwrap();

    assert!(matches!(decoder.decode(Bytes::from(data)), Err(DecodeError::NoSweeps)));
}

/// Decompressor for a made-up "ZZ" format: the payload follows the signature.
struct PrefixDecompressor;

impl Decompressor for PrefixDecompressor {
    fn signature(&self) -> [u8; 2] {
        *b"ZZ"
    }

    fn decompress(&self, input: &[u8]) -> std::io::Result<Vec<u8>> {
        Ok(input[2..].to_vec())
    }
}

#[test]
fn test_custom_decompressor() {
    let payload: Vec<u8> = uniform_sweep(1, 0.5, 3, 4, &["REF"])
        .iter()
        .flat_map(RayBuilder::encode)
        .collect();
    let mut record = b"ZZ".to_vec();
    record.extend(payload);

    let data = VolumeBuilder::new().raw_record(record.len() as i32, &record).build();
    let output = decoder()
        .with_decompressor(Arc::new(PrefixDecompressor))
        .decode(Bytes::from(data))
        .unwrap();

    assert_eq!(output.volume.sweep(0).unwrap().ray_count, 3);
}

#[test]
fn test_decode_file_from_disk() {
    let dir = temp_test_dir();
    let path = three_sweep_volume(Compression::Bzip2)
        .write_to(dir.path(), "KTLX20130520_200000_V06")
        .unwrap();

    let output = decode_file(&path, &DecoderConfig::default()).unwrap();
    assert_eq!(output.volume.sweep_count(), 3);

    let missing = decode_file(dir.path().join("missing"), &DecoderConfig::default());
    assert!(matches!(missing, Err(DecodeError::Io(_))));
}
