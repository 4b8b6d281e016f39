//! JSON documents written by the CLI.

use chrono::{DateTime, Utc};
use nexrad_decoder::{DecodeStats, MomentData, MomentKind, VolumeSummary};
use radar_grid::CartesianGrid;
use serde::Serialize;

/// Volume overview printed for every run.
#[derive(Debug, Serialize)]
pub struct VolumeReport {
    pub file: String,
    #[serde(flatten)]
    pub summary: VolumeSummary,
    pub stats: DecodeStats,
}

/// One resampled sweep. `null` marks pixels without data.
#[derive(Debug, Serialize)]
pub struct GridReport {
    pub station_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub sweep: usize,
    pub elevation: f32,
    pub moment: MomentKind,
    pub long_name: &'static str,
    pub units: &'static str,
    pub size: usize,
    pub max_range_km: f32,
    pub resolution_km: f32,
    pub valid_pixels: usize,
    pub data: Vec<Option<f32>>,
}

impl GridReport {
    pub fn new(
        station_id: &str,
        timestamp: Option<DateTime<Utc>>,
        moment: &MomentData,
        grid: &CartesianGrid,
    ) -> Self {
        Self {
            station_id: station_id.to_string(),
            timestamp,
            sweep: moment.sweep_index,
            elevation: moment.elevation,
            moment: moment.moment,
            long_name: moment.moment.long_name(),
            units: moment.moment.units(),
            size: grid.size,
            max_range_km: grid.max_range_km,
            resolution_km: grid.resolution_km(),
            valid_pixels: grid.valid_count(),
            data: grid
                .data
                .iter()
                .map(|v| (!v.is_nan()).then_some(*v))
                .collect(),
        }
    }
}
