//! Moment name lookup table.
//!
//! Maps the 3-character names found in moment data blocks to canonical
//! moment identifiers. Names not in the table are dropped by the decoder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A radar moment the decoder recognizes.
///
/// Variants are declared in alphabetical order of their canonical names so
/// that ordered collections keyed by `MomentKind` list them alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MomentKind {
    /// Clutter filter power removed
    #[serde(rename = "CFP")]
    ClutterFilterPower,
    /// Differential phase
    #[serde(rename = "PHI")]
    DifferentialPhase,
    /// Reflectivity
    #[serde(rename = "REF")]
    Reflectivity,
    /// Correlation coefficient
    #[serde(rename = "RHO")]
    CorrelationCoefficient,
    /// Spectrum width
    #[serde(rename = "SW")]
    SpectrumWidth,
    /// Radial velocity
    #[serde(rename = "VEL")]
    Velocity,
    /// Differential reflectivity
    #[serde(rename = "ZDR")]
    DifferentialReflectivity,
}

/// Raw block name -> moment. Raw names are space padded to three characters.
const MOMENT_TABLE: [(&str, MomentKind); 7] = [
    ("REF", MomentKind::Reflectivity),
    ("VEL", MomentKind::Velocity),
    ("SW", MomentKind::SpectrumWidth),
    ("ZDR", MomentKind::DifferentialReflectivity),
    ("PHI", MomentKind::DifferentialPhase),
    ("RHO", MomentKind::CorrelationCoefficient),
    ("CFP", MomentKind::ClutterFilterPower),
];

impl MomentKind {
    pub const ALL: [MomentKind; 7] = [
        MomentKind::ClutterFilterPower,
        MomentKind::DifferentialPhase,
        MomentKind::Reflectivity,
        MomentKind::CorrelationCoefficient,
        MomentKind::SpectrumWidth,
        MomentKind::Velocity,
        MomentKind::DifferentialReflectivity,
    ];

    /// Look up a raw block name, ignoring space and NUL padding.
    pub fn from_block_name(raw: &str) -> Option<Self> {
        let name = raw.trim_matches(|c: char| c == ' ' || c == '\0');
        MOMENT_TABLE
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, kind)| *kind)
    }

    /// Canonical short name ("REF", "VEL", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reflectivity => "REF",
            Self::Velocity => "VEL",
            Self::SpectrumWidth => "SW",
            Self::DifferentialReflectivity => "ZDR",
            Self::DifferentialPhase => "PHI",
            Self::CorrelationCoefficient => "RHO",
            Self::ClutterFilterPower => "CFP",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Reflectivity => "Reflectivity",
            Self::Velocity => "Radial Velocity",
            Self::SpectrumWidth => "Spectrum Width",
            Self::DifferentialReflectivity => "Differential Reflectivity",
            Self::DifferentialPhase => "Differential Phase",
            Self::CorrelationCoefficient => "Correlation Coefficient",
            Self::ClutterFilterPower => "Clutter Filter Power Removed",
        }
    }

    /// Physical units of decoded samples.
    pub fn units(&self) -> &'static str {
        match self {
            Self::Reflectivity | Self::ClutterFilterPower => "dBZ",
            Self::Velocity | Self::SpectrumWidth => "m/s",
            Self::DifferentialReflectivity => "dB",
            Self::DifferentialPhase => "degrees",
            Self::CorrelationCoefficient => "unitless",
        }
    }
}

impl fmt::Display for MomentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MomentKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_block_name(&s.to_uppercase())
            .ok_or_else(|| QueryError::UnknownMoment(s.to_string()))
    }
}
