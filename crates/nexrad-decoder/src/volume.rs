//! Volume aggregation and the moment extraction API.
//!
//! Accepted rays are grouped by their raw elevation number. Once all records
//! have been read, elevation numbers are sorted and renumbered as dense
//! 0-based sweep indices. The raw numbers need not start at 0 or be
//! contiguous.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{DecodeError, DecodeResult, QueryError};
use crate::ray::{DecodedRay, Ray, SiteLocation};
use crate::records::VolumeHeader;
use crate::tables::MomentKind;

/// Sweep metadata. Derived from the rays of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sweep {
    /// Position in the volume, 0-based.
    pub index: usize,
    /// Raw elevation number from the records.
    pub elevation_number: u8,
    /// Mean elevation of the sweep's rays, rounded to 2 decimals.
    pub elevation: f32,
    pub ray_count: usize,
}

/// A decoded volume. Immutable once built.
#[derive(Debug, Clone)]
pub struct RadarVolume {
    station_id: String,
    timestamp: Option<DateTime<Utc>>,
    vcp: u16,
    site: Option<SiteLocation>,
    archive_version: Option<String>,
    sweeps: Vec<Sweep>,
    rays: Vec<Vec<Ray>>,
}

/// One moment of one sweep, flattened for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentData {
    pub moment: MomentKind,
    pub sweep_index: usize,
    /// Elevation of the representative ray.
    pub elevation: f32,
    /// Gate ranges (km) of the representative ray.
    pub ranges: Vec<f32>,
    /// Ray azimuths in record order (not sorted).
    pub azimuths: Vec<f32>,
    /// Row-major `ray_count x gate_count` samples. NaN where there is no data.
    pub data: Vec<f32>,
    pub ray_count: usize,
    pub gate_count: usize,
}

impl MomentData {
    /// Sample at (`ray`, `gate`), or `None` outside the grid.
    pub fn value(&self, ray: usize, gate: usize) -> Option<f32> {
        (ray < self.ray_count && gate < self.gate_count)
            .then(|| self.data[ray * self.gate_count + gate])
    }
}

/// Serializable overview of a volume.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSummary {
    pub station_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub vcp: u16,
    pub site: Option<SiteLocation>,
    pub archive_version: Option<String>,
    pub moments: Vec<MomentKind>,
    pub sweeps: Vec<SweepSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    #[serde(flatten)]
    pub sweep: Sweep,
    pub moments: Vec<MomentKind>,
}

impl RadarVolume {
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Volume coverage pattern, 0 when unknown.
    pub fn vcp(&self) -> u16 {
        self.vcp
    }

    pub fn site(&self) -> Option<SiteLocation> {
        self.site
    }

    pub fn archive_version(&self) -> Option<&str> {
        self.archive_version.as_deref()
    }

    pub fn sweeps(&self) -> &[Sweep] {
        &self.sweeps
    }

    pub fn sweep_count(&self) -> usize {
        self.sweeps.len()
    }

    pub fn sweep(&self, index: usize) -> Result<&Sweep, QueryError> {
        self.sweeps.get(index).ok_or(QueryError::SweepOutOfRange {
            index,
            count: self.sweeps.len(),
        })
    }

    /// Rays of a sweep in record order.
    pub fn rays(&self, index: usize) -> Result<&[Ray], QueryError> {
        self.rays
            .get(index)
            .map(Vec::as_slice)
            .ok_or(QueryError::SweepOutOfRange {
                index,
                count: self.sweeps.len(),
            })
    }

    /// All moments present anywhere in the volume, sorted by name.
    pub fn moment_names(&self) -> Vec<MomentKind> {
        self.rays
            .iter()
            .flatten()
            .flat_map(|ray| ray.moments.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Moments present in any ray of a sweep, sorted by name.
    pub fn sweep_moment_names(&self, index: usize) -> Result<Vec<MomentKind>, QueryError> {
        Ok(self
            .rays(index)?
            .iter()
            .flat_map(|ray| ray.moments.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    /// Flatten one moment of one sweep into a ray x gate grid.
    ///
    /// The first ray carrying the moment defines the gate geometry. Rays
    /// without the moment are all NaN; shorter rays are NaN-padded and
    /// longer rays truncated to the representative gate count.
    pub fn extract_moment(
        &self,
        index: usize,
        moment: MomentKind,
    ) -> Result<MomentData, QueryError> {
        let rays = self.rays(index)?;

        let (representative_ray, representative) = rays
            .iter()
            .find_map(|ray| ray.moment(moment).map(|record| (ray, record)))
            .ok_or(QueryError::MomentNotFound { sweep: index, moment })?;

        let gate_count = representative.gate_count as usize;
        let ranges = (0..gate_count).map(|i| representative.range_km(i)).collect();
        let azimuths = rays.iter().map(|ray| ray.azimuth).collect();

        let mut data = vec![f32::NAN; rays.len() * gate_count];
        for (row, ray) in data.chunks_exact_mut(gate_count).zip(rays) {
            if let Some(record) = ray.moment(moment) {
                let n = record.data.len().min(gate_count);
                row[..n].copy_from_slice(&record.data[..n]);
            }
        }

        Ok(MomentData {
            moment,
            sweep_index: index,
            elevation: representative_ray.elevation,
            ranges,
            azimuths,
            data,
            ray_count: rays.len(),
            gate_count,
        })
    }

    pub fn summary(&self) -> VolumeSummary {
        VolumeSummary {
            station_id: self.station_id.clone(),
            timestamp: self.timestamp,
            vcp: self.vcp,
            site: self.site,
            archive_version: self.archive_version.clone(),
            moments: self.moment_names(),
            sweeps: self
                .sweeps
                .iter()
                .map(|sweep| SweepSummary {
                    sweep: sweep.clone(),
                    moments: self.sweep_moment_names(sweep.index).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Collects accepted rays during a decode.
#[derive(Debug, Default)]
pub struct VolumeAccumulator {
    by_elevation: BTreeMap<u8, Vec<Ray>>,
    station_id: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    vcp: Option<u16>,
    site: Option<SiteLocation>,
}

impl VolumeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ray. The first valid station, time, VCP and site seen are kept.
    pub fn push(&mut self, decoded: DecodedRay) {
        let DecodedRay { ray, volume, .. } = decoded;

        if self.station_id.is_none() {
            self.station_id = ray.station_id.clone();
        }
        if self.timestamp.is_none() {
            self.timestamp = ray.timestamp;
        }
        if let Some(block) = volume {
            if self.vcp.is_none() {
                self.vcp = block.vcp;
            }
            if self.site.is_none() {
                self.site = block.site;
            }
        }

        self.by_elevation.entry(ray.elevation_number).or_default().push(ray);
    }

    pub fn ray_count(&self) -> usize {
        self.by_elevation.values().map(Vec::len).sum()
    }

    /// Build the volume. Fails if no ray was accepted.
    ///
    /// The header station and time are used only when no ray supplied one.
    pub fn finish(self, header: &VolumeHeader) -> DecodeResult<RadarVolume> {
        if self.by_elevation.is_empty() {
            return Err(DecodeError::NoSweeps);
        }

        let mut sweeps = Vec::with_capacity(self.by_elevation.len());
        let mut rays = Vec::with_capacity(self.by_elevation.len());

        for (index, (elevation_number, sweep_rays)) in self.by_elevation.into_iter().enumerate() {
            let total: f64 = sweep_rays.iter().map(|r| r.elevation as f64).sum();
            let mean = total / sweep_rays.len() as f64;
            sweeps.push(Sweep {
                index,
                elevation_number,
                elevation: ((mean * 100.0).round() / 100.0) as f32,
                ray_count: sweep_rays.len(),
            });
            rays.push(sweep_rays);
        }

        Ok(RadarVolume {
            station_id: self
                .station_id
                .or_else(|| header.station_id().map(str::to_string))
                .unwrap_or_default(),
            timestamp: self.timestamp.or_else(|| header.timestamp()),
            vcp: self.vcp.unwrap_or(0),
            site: self.site,
            archive_version: header.archive_version().map(str::to_string),
            sweeps,
            rays,
        })
    }
}
