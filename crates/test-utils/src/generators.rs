//! Synthetic polar fields for resampler tests and benchmarks.

/// Evenly spaced azimuths starting at `start` degrees, wrapped to [0, 360).
///
/// A non-zero `start` mimics a sweep whose first ray is not at north, so
/// the azimuths are not sorted.
pub fn rotated_azimuths(ray_count: usize, start: f32) -> Vec<f32> {
    let step = 360.0 / ray_count.max(1) as f32;
    (0..ray_count)
        .map(|i| (start + i as f32 * step).rem_euclid(360.0))
        .collect()
}

/// Gate center ranges in km.
pub fn gate_ranges(first_km: f32, spacing_km: f32, gate_count: usize) -> Vec<f32> {
    (0..gate_count).map(|i| first_km + i as f32 * spacing_km).collect()
}

/// Row-major `ray_count x gate_count` field with value `ray * 1000 + gate`.
///
/// Makes it easy to tell which ray and gate a resampled pixel came from.
///
/// # Example
///
/// ```
/// use test_utils::polar_ramp_data;
///
/// let data = polar_ramp_data(3, 4);
/// assert_eq!(data.len(), 12);
/// assert_eq!(data[5], 1001.0); // ray 1, gate 1
/// ```
pub fn polar_ramp_data(ray_count: usize, gate_count: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(ray_count * gate_count);
    for ray in 0..ray_count {
        for gate in 0..gate_count {
            data.push((ray * 1000 + gate) as f32);
        }
    }
    data
}

/// A reflectivity-like field: a storm cell centered on `azimuth` degrees and
/// `range_km`, NaN (no echo) below 5 dBZ.
pub fn storm_cell_data(azimuths: &[f32], ranges: &[f32], azimuth: f32, range_km: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(azimuths.len() * ranges.len());
    for &az in azimuths {
        let mut d_az = (az - azimuth).abs();
        if d_az > 180.0 {
            d_az = 360.0 - d_az;
        }
        for &r in ranges {
            let d_r = (r - range_km).abs();
            let dbz = 60.0 - d_az * 2.0 - d_r * 1.5;
            data.push(if dbz < 5.0 { f32::NAN } else { dbz });
        }
    }
    data
}
