//! Known indicator keys
//!
//! Every metric the atlas can serve is one column of the score store. The
//! GMI family measures militarisation, the WRI family disaster risk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("Unknown metric: {0}")]
    Unknown(String),
}

/// Indicator family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFamily {
    Gmi,
    Wri,
}

/// A score column, in store column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    GmiScore,
    MilexIndicator,
    PersonnelIndicator,
    WeaponsIndicator,
    GmiRank,
    WriScore,
    WriExposure,
    WriVulnerability,
    WriSusceptibility,
    WriCopingCapacity,
    WriAdaptiveCapacity,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::GmiScore,
        Metric::MilexIndicator,
        Metric::PersonnelIndicator,
        Metric::WeaponsIndicator,
        Metric::GmiRank,
        Metric::WriScore,
        Metric::WriExposure,
        Metric::WriVulnerability,
        Metric::WriSusceptibility,
        Metric::WriCopingCapacity,
        Metric::WriAdaptiveCapacity,
    ];

    /// Metric requested when a query names none
    pub const DEFAULT: Metric = Metric::GmiScore;

    /// Wire / column key
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::GmiScore => "gmi_score",
            Metric::MilexIndicator => "milex_indicator",
            Metric::PersonnelIndicator => "personnel_indicator",
            Metric::WeaponsIndicator => "weapons_indicator",
            Metric::GmiRank => "gmi_rank",
            Metric::WriScore => "wri_score",
            Metric::WriExposure => "wri_exposure",
            Metric::WriVulnerability => "wri_vulnerability",
            Metric::WriSusceptibility => "wri_susceptibility",
            Metric::WriCopingCapacity => "wri_coping_capacity",
            Metric::WriAdaptiveCapacity => "wri_adaptive_capacity",
        }
    }

    pub fn family(&self) -> MetricFamily {
        match self {
            Metric::GmiScore
            | Metric::MilexIndicator
            | Metric::PersonnelIndicator
            | Metric::WeaponsIndicator
            | Metric::GmiRank => MetricFamily::Gmi,
            _ => MetricFamily::Wri,
        }
    }

    /// Checkbox label shown in the map sidebar
    pub fn label(&self) -> &'static str {
        match self {
            Metric::GmiScore => "Militarisation Index",
            Metric::MilexIndicator => "Military Expenditure Index",
            Metric::PersonnelIndicator => "Military Personnel Index",
            Metric::WeaponsIndicator => "Heavy Weapons Index",
            Metric::GmiRank => "Militarisation Rank",
            Metric::WriScore => "World Risk Index",
            Metric::WriExposure => "Exposure",
            Metric::WriVulnerability => "Vulnerability",
            Metric::WriSusceptibility => "Susceptibility",
            Metric::WriCopingCapacity => "Coping Capacity",
            Metric::WriAdaptiveCapacity => "Adaptive Capacity",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Metric::GmiScore => "Composite index measuring the overall militarisation level of a country.",
            Metric::MilexIndicator => "Index based on military expenditure in relation to GDP and health spending.",
            Metric::PersonnelIndicator => "Index based on the number of military personnel per capita.",
            Metric::WeaponsIndicator => "Index based on the volume of heavy weapons in armed forces.",
            Metric::GmiRank => "Position of the country in the yearly militarisation ranking.",
            Metric::WriScore => "Composite index reflecting a country's disaster risk due to natural hazards.",
            Metric::WriExposure => "Degree to which a country is exposed to natural hazards.",
            Metric::WriVulnerability => "Societal susceptibility and capacity to cope with disasters.",
            Metric::WriSusceptibility => "Structural vulnerability of a country (e.g., infrastructure, health).",
            Metric::WriCopingCapacity => "Short-term capabilities to reduce negative disaster impacts.",
            Metric::WriAdaptiveCapacity => "Long-term capacity to adapt and transform in response to risks.",
        }
    }

    /// Ranks are ordinal; they are neither offered as map indicators nor forecast.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Metric::GmiRank)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| MetricError::Unknown(s.to_string()))
    }
}

impl Serialize for Metric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered, duplicate-free list of requested metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSet(Vec<Metric>);

impl MetricSet {
    pub fn new(metrics: impl IntoIterator<Item = Metric>) -> Self {
        let mut out: Vec<Metric> = Vec::new();
        for m in metrics {
            if !out.contains(&m) {
                out.push(m);
            }
        }
        Self(out)
    }

    /// Parse a comma separated query value such as `gmi_score,wri_score`.
    /// Blank segments are ignored; an empty list yields the default metric.
    pub fn parse(raw: &str) -> Result<Self, MetricError> {
        let parsed = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Metric::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if parsed.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self::new(parsed))
    }

    pub fn iter(&self) -> impl Iterator<Item = Metric> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.0.contains(&metric)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Metric] {
        &self.0
    }

    /// The only metric, when exactly one was requested
    pub fn single(&self) -> Option<Metric> {
        match self.0.as_slice() {
            [m] => Some(*m),
            _ => None,
        }
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self(vec![Metric::DEFAULT])
    }
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.iter().map(|m| m.as_str()).collect();
        f.write_str(&keys.join(","))
    }
}

impl Serialize for MetricSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
