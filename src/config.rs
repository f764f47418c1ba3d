// Configuration for the pull request list.
// Merges the JSON config file, environment and command-line flags.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdoprError, Result};

/// Look-back window for the pull request query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DayRange {
    #[default]
    Week,
    TwoWeeks,
    ThreeWeeks,
    Month,
}

impl DayRange {
    pub const ALL: [DayRange; 4] = [
        DayRange::Week,
        DayRange::TwoWeeks,
        DayRange::ThreeWeeks,
        DayRange::Month,
    ];

    pub fn days(&self) -> u32 {
        match self {
            DayRange::Week => 7,
            DayRange::TwoWeeks => 14,
            DayRange::ThreeWeeks => 21,
            DayRange::Month => 31,
        }
    }

    pub fn label(&self) -> String {
        format!("Last {} days", self.days())
    }

    pub fn next(&self) -> Self {
        match self {
            DayRange::Week => DayRange::TwoWeeks,
            DayRange::TwoWeeks => DayRange::ThreeWeeks,
            DayRange::ThreeWeeks => DayRange::Month,
            DayRange::Month => DayRange::Week,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            DayRange::Week => DayRange::Month,
            DayRange::TwoWeeks => DayRange::Week,
            DayRange::ThreeWeeks => DayRange::TwoWeeks,
            DayRange::Month => DayRange::ThreeWeeks,
        }
    }
}

impl TryFrom<u32> for DayRange {
    type Error = AdoprError;

    fn try_from(days: u32) -> Result<Self> {
        DayRange::ALL
            .into_iter()
            .find(|range| range.days() == days)
            .ok_or_else(|| {
                AdoprError::Config(format!("day range must be one of 7, 14, 21, 31 (got {})", days))
            })
    }
}

impl From<DayRange> for u32 {
    fn from(range: DayRange) -> Self {
        range.days()
    }
}

impl FromStr for DayRange {
    type Err = AdoprError;

    fn from_str(s: &str) -> Result<Self> {
        let days: u32 = s
            .trim()
            .parse()
            .map_err(|_| AdoprError::Config(format!("invalid day range: {:?}", s)))?;
        DayRange::try_from(days)
    }
}

impl fmt::Display for DayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.days())
    }
}

/// Partial settings from one source; later sources override earlier ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    pub organization: Option<String>,
    pub project: Option<String>,
    pub repository: Option<String>,
    pub day_range: Option<DayRange>,
}

impl ConfigLayer {
    /// Read a layer from a JSON file. A missing file is an empty layer.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| AdoprError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(self, other: ConfigLayer) -> Self {
        Self {
            organization: other.organization.or(self.organization),
            project: other.project.or(self.project),
            repository: other.repository.or(self.repository),
            day_range: other.day_range.or(self.day_range),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub day_range: DayRange,
}

impl Config {
    pub fn resolve(layer: ConfigLayer) -> Result<Self> {
        Ok(Self {
            organization: required(layer.organization, "organization")?,
            project: required(layer.project, "project")?,
            repository: required(layer.repository, "repository")?,
            day_range: layer.day_range.unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AdoprError::Config(format!(
            "missing {name}; set it in the config file, ADOPR_{} or --{name}",
            name.to_uppercase()
        ))),
    }
}
