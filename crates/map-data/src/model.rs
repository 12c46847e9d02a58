//! Row and record types shared by the store, the snapshot and the merge engine

use crate::metric::{Metric, MetricSet};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Where a row's values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Actual,
    Predicted,
}

impl Source {
    /// Tag implied by the year alone
    pub fn for_year(year: i32, boundary_year: i32) -> Self {
        if year > boundary_year {
            Source::Predicted
        } else {
            Source::Actual
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Actual => "actual",
            Source::Predicted => "predicted",
        }
    }
}

/// Forecast confidence bounds for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lo: f64,
    pub hi: f64,
}

/// A country as held by the score store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-3 code
    pub iso_code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Country {
    pub fn iso3(&self) -> String {
        self.iso_code.trim().to_uppercase()
    }
}

/// One country-year of observed indicator values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub year: i32,
    #[serde(default)]
    pub gmi_score: Option<f64>,
    #[serde(default)]
    pub milex_indicator: Option<f64>,
    #[serde(default)]
    pub personnel_indicator: Option<f64>,
    #[serde(default)]
    pub weapons_indicator: Option<f64>,
    #[serde(default)]
    pub gmi_rank: Option<u32>,
    #[serde(default)]
    pub wri_score: Option<f64>,
    #[serde(default)]
    pub wri_exposure: Option<f64>,
    #[serde(default)]
    pub wri_vulnerability: Option<f64>,
    #[serde(default)]
    pub wri_susceptibility: Option<f64>,
    #[serde(default)]
    pub wri_coping_capacity: Option<f64>,
    #[serde(default)]
    pub wri_adaptive_capacity: Option<f64>,
}

impl ScoreRecord {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::GmiScore => self.gmi_score,
            Metric::MilexIndicator => self.milex_indicator,
            Metric::PersonnelIndicator => self.personnel_indicator,
            Metric::WeaponsIndicator => self.weapons_indicator,
            Metric::GmiRank => self.gmi_rank.map(f64::from),
            Metric::WriScore => self.wri_score,
            Metric::WriExposure => self.wri_exposure,
            Metric::WriVulnerability => self.wri_vulnerability,
            Metric::WriSusceptibility => self.wri_susceptibility,
            Metric::WriCopingCapacity => self.wri_coping_capacity,
            Metric::WriAdaptiveCapacity => self.wri_adaptive_capacity,
        }
    }

    /// Builder-style setter, mostly for fixtures
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        match metric {
            Metric::GmiScore => self.gmi_score = Some(value),
            Metric::MilexIndicator => self.milex_indicator = Some(value),
            Metric::PersonnelIndicator => self.personnel_indicator = Some(value),
            Metric::WeaponsIndicator => self.weapons_indicator = Some(value),
            Metric::GmiRank => self.gmi_rank = Some(value.max(0.0).round() as u32),
            Metric::WriScore => self.wri_score = Some(value),
            Metric::WriExposure => self.wri_exposure = Some(value),
            Metric::WriVulnerability => self.wri_vulnerability = Some(value),
            Metric::WriSusceptibility => self.wri_susceptibility = Some(value),
            Metric::WriCopingCapacity => self.wri_coping_capacity = Some(value),
            Metric::WriAdaptiveCapacity => self.wri_adaptive_capacity = Some(value),
        }
        self
    }
}

/// One forecast value from the predicted snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedRecord {
    pub iso3: String,
    pub year: i32,
    pub metric: Metric,
    pub value: Option<f64>,
    pub lo_ci: Option<f64>,
    pub hi_ci: Option<f64>,
    pub method: Option<String>,
    pub version: Option<String>,
}

impl PredictedRecord {
    /// Extract a record from one snapshot array element.
    ///
    /// Returns `None` for elements without a usable iso3, year or known metric.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;

        let iso3 = obj.get("iso3")?.as_str()?.trim().to_uppercase();
        if iso3.is_empty() {
            return None;
        }
        let year = obj.get("year").and_then(json_year)?;
        let metric: Metric = obj.get("metric")?.as_str()?.trim().parse().ok()?;

        Some(Self {
            iso3,
            year,
            metric,
            value: obj.get("value").and_then(serde_json::Value::as_f64),
            lo_ci: obj.get("lo_ci").and_then(serde_json::Value::as_f64),
            hi_ci: obj.get("hi_ci").and_then(serde_json::Value::as_f64),
            method: obj.get("method").and_then(json_string),
            version: obj.get("version").and_then(json_string),
        })
    }

    /// Both bounds, when both are present
    pub fn confidence_interval(&self) -> Option<ConfidenceInterval> {
        match (self.lo_ci, self.hi_ci) {
            (Some(lo), Some(hi)) => Some(ConfidenceInterval { lo, hi }),
            _ => None,
        }
    }
}

/// Years arrive as integers, floats or numeric strings; fractions truncate toward zero
fn json_year(value: &serde_json::Value) -> Option<i32> {
    let year = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_year)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_year))
        }
        _ => None,
    };
    year.and_then(|y| i32::try_from(y).ok())
}

fn truncate_year(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

fn json_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One country for one year, as served to the map
#[derive(Debug, Clone, PartialEq)]
pub struct CountryYearRow {
    pub iso3: String,
    pub name: Option<String>,
    pub year: i32,
    pub source: Source,
    pub metric_values: BTreeMap<Metric, Option<f64>>,
    pub confidence_intervals: BTreeMap<Metric, ConfidenceInterval>,
    pub method: Option<String>,
    pub version: Option<String>,
}

impl CountryYearRow {
    /// Row with only identity fields; no metric keys yet
    pub fn bare(iso3: impl Into<String>, name: Option<String>, year: i32, source: Source) -> Self {
        Self {
            iso3: iso3.into(),
            name,
            year,
            source,
            metric_values: BTreeMap::new(),
            confidence_intervals: BTreeMap::new(),
            method: None,
            version: None,
        }
    }

    /// Observed row: every requested metric copied from `score`, null without one
    pub fn actual(country: &Country, year: i32, metrics: &MetricSet, score: Option<&ScoreRecord>) -> Self {
        let mut row = Self::bare(country.iso3(), Some(country.name.clone()), year, Source::Actual);
        for metric in metrics.iter() {
            row.metric_values
                .insert(metric, score.and_then(|s| s.value(metric)));
        }
        row
    }

    /// Re-tag as predicted and make sure every requested metric has a key
    pub fn into_predicted_skeleton(mut self, metrics: &MetricSet) -> Self {
        self.source = Source::Predicted;
        for metric in metrics.iter() {
            self.metric_values.entry(metric).or_insert(None);
        }
        self
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metric_values.get(&metric).copied().flatten()
    }

    pub fn confidence_interval(&self, metric: Metric) -> Option<ConfidenceInterval> {
        self.confidence_intervals.get(&metric).copied()
    }
}

/// Flattened wire shape: metric keys sit directly on the object, CI bounds
/// as `{metric}_lo_ci` / `{metric}_hi_ci`, provenance on predicted rows only.
impl Serialize for CountryYearRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("iso3", &self.iso3)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("year", &self.year)?;
        map.serialize_entry("source", &self.source)?;

        for (metric, value) in &self.metric_values {
            map.serialize_entry(metric.as_str(), value)?;
        }

        if self.source == Source::Predicted {
            for (metric, ci) in &self.confidence_intervals {
                map.serialize_entry(&format!("{}_lo_ci", metric.as_str()), &ci.lo)?;
                map.serialize_entry(&format!("{}_hi_ci", metric.as_str()), &ci.hi)?;
            }
            map.serialize_entry("method", &self.method)?;
            map.serialize_entry("version", &self.version)?;
        }

        map.end()
    }
}
