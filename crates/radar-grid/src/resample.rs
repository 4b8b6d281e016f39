//! Nearest-neighbor polar-to-Cartesian resampling.
//!
//! The output is a square grid with the radar at its center. Each axis spans
//! `[-max_range, +max_range]`, so one pixel is `2 * max_range / N` wide.
//! For every pixel the range and meteorological azimuth (0 at the top edge,
//! clockwise) are computed, then the polar sample at the last azimuth and
//! last gate not greater than those values is copied in.

use rayon::prelude::*;
use tracing::debug;

use crate::config::ResampleConfig;
use crate::error::{GridError, Result};
use crate::types::{CartesianGrid, PolarField};

/// Resampler with a fixed output configuration.
#[derive(Debug, Clone)]
pub struct PolarResampler {
    config: ResampleConfig,
}

impl PolarResampler {
    pub fn new(config: ResampleConfig) -> Result<Self> {
        config.validate().map_err(GridError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// Resample a polar field. The whole grid is filled before returning.
    pub fn resample(&self, field: &PolarField) -> CartesianGrid {
        let size = self.config.grid_size;
        let lookup = AzimuthLookup::new(field.azimuths());
        let geometry = Geometry::new(size, field.min_range_km(), field.max_range_km());

        let mut data = vec![f32::NAN; size * size];
        if self.config.parallel {
            data.par_chunks_mut(size)
                .enumerate()
                .for_each(|(py, row)| fill_row(row, py, field, &lookup, &geometry));
        } else {
            data.chunks_mut(size)
                .enumerate()
                .for_each(|(py, row)| fill_row(row, py, field, &lookup, &geometry));
        }

        let grid = CartesianGrid {
            size,
            max_range_km: field.max_range_km(),
            data,
        };
        debug!(
            size,
            rays = field.ray_count(),
            gates = field.gate_count(),
            valid = grid.valid_count(),
            "Resampled polar field"
        );
        grid
    }
}

/// Resample with the default configuration and the given side length.
pub fn resample_to_grid(field: &PolarField, grid_size: usize) -> Result<CartesianGrid> {
    if grid_size < 2 {
        return Err(GridError::InvalidSize(grid_size));
    }
    let resampler = PolarResampler::new(ResampleConfig::default().with_grid_size(grid_size))?;
    Ok(resampler.resample(field))
}

struct Geometry {
    half: f64,
    km_per_pixel: f64,
    min_range: f64,
    max_range: f64,
}

impl Geometry {
    fn new(size: usize, min_range_km: f32, max_range_km: f32) -> Self {
        let half = size as f64 / 2.0;
        Self {
            half,
            km_per_pixel: max_range_km as f64 / half,
            min_range: min_range_km as f64,
            max_range: max_range_km as f64,
        }
    }

    /// Range (km) and azimuth (degrees, [0, 360)) of a pixel.
    fn polar(&self, px: usize, py: usize) -> (f64, f64) {
        let dx = px as f64 - self.half;
        let dy = self.half - py as f64;
        let range = (dx * dx + dy * dy).sqrt() * self.km_per_pixel;
        let azimuth = dx.atan2(dy).to_degrees().rem_euclid(360.0);
        (range, azimuth)
    }
}

/// Azimuths sorted ascending, remembering each one's original ray.
struct AzimuthLookup {
    sorted: Vec<(f64, usize)>,
}

impl AzimuthLookup {
    fn new(azimuths: &[f32]) -> Self {
        let mut sorted: Vec<(f64, usize)> = azimuths
            .iter()
            .enumerate()
            .map(|(ray, &az)| (az as f64, ray))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { sorted }
    }

    /// Ray of the last azimuth <= `target`, wrapping to the largest azimuth
    /// when every azimuth is greater.
    fn ray_for(&self, target: f64) -> usize {
        let insertion = self.sorted.partition_point(|&(az, _)| az <= target);
        let index = insertion.checked_sub(1).unwrap_or(self.sorted.len() - 1);
        self.sorted[index].1
    }
}

/// Index of the last gate whose range is <= `range`, clamped into bounds.
fn gate_for(ranges: &[f32], range: f64) -> usize {
    ranges
        .partition_point(|&r| r as f64 <= range)
        .saturating_sub(1)
        .min(ranges.len() - 1)
}

fn fill_row(
    row: &mut [f32],
    py: usize,
    field: &PolarField,
    lookup: &AzimuthLookup,
    geometry: &Geometry,
) {
    for (px, pixel) in row.iter_mut().enumerate() {
        *pixel = sample_pixel(field, lookup, geometry, px, py);
    }
}

fn sample_pixel(
    field: &PolarField,
    lookup: &AzimuthLookup,
    geometry: &Geometry,
    px: usize,
    py: usize,
) -> f32 {
    let (range, azimuth) = geometry.polar(px, py);
    if range < geometry.min_range || range > geometry.max_range {
        return f32::NAN;
    }

    let ray = lookup.ray_for(azimuth);
    let gate = gate_for(field.ranges(), range);
    field.value(ray, gate)
}
