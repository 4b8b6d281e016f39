//! Polar input and Cartesian output types.

use nexrad_decoder::MomentData;
use serde::Serialize;

use crate::error::{GridError, Result};

/// One sweep of one moment in polar form.
///
/// `data` is row-major, one row per ray, one column per gate. Azimuths are
/// in record order and need not be sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarField {
    azimuths: Vec<f32>,
    ranges: Vec<f32>,
    data: Vec<f32>,
}

impl PolarField {
    /// Build a field, checking that `data` holds `azimuths x ranges` samples.
    pub fn new(azimuths: Vec<f32>, ranges: Vec<f32>, data: Vec<f32>) -> Result<Self> {
        if azimuths.is_empty() || ranges.is_empty() {
            return Err(GridError::EmptyField);
        }

        let expected = azimuths.len() * ranges.len();
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            azimuths,
            ranges,
            data,
        })
    }

    pub fn azimuths(&self) -> &[f32] {
        &self.azimuths
    }

    /// Gate ranges in km, ascending.
    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    pub fn ray_count(&self) -> usize {
        self.azimuths.len()
    }

    pub fn gate_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn min_range_km(&self) -> f32 {
        self.ranges[0]
    }

    pub fn max_range_km(&self) -> f32 {
        self.ranges[self.ranges.len() - 1]
    }

    #[inline]
    pub fn value(&self, ray: usize, gate: usize) -> f32 {
        self.data[ray * self.ranges.len() + gate]
    }
}

impl TryFrom<MomentData> for PolarField {
    type Error = GridError;

    fn try_from(moment: MomentData) -> Result<Self> {
        Self::new(moment.azimuths, moment.ranges, moment.data)
    }
}

/// Square Cartesian grid centered on the radar. NaN marks no data.
#[derive(Debug, Clone, Serialize)]
pub struct CartesianGrid {
    pub size: usize,
    /// Distance from the center to an edge, in km.
    pub max_range_km: f32,
    pub data: Vec<f32>,
}

impl CartesianGrid {
    /// Pixel at column `px`, row `py` (row 0 is the top, north edge).
    pub fn get(&self, px: usize, py: usize) -> Option<f32> {
        (px < self.size && py < self.size).then(|| self.data[py * self.size + px])
    }

    /// Number of pixels holding a value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Pixel size in km.
    pub fn resolution_km(&self) -> f32 {
        2.0 * self.max_range_km / self.size as f32
    }
}
