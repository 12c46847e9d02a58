//! Country polygon layer
//!
//! Applies a [`RenderState`] to a country FeatureCollection by stamping
//! `fill_color`, `source`, `score` and `popup` onto each feature's
//! properties. Features are matched on an ISO3 property.

use crate::render::RenderState;
use geojson::{FeatureCollection, GeoJson};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Natural Earth ISO3 property
pub const DEFAULT_ISO_PROPERTY: &str = "ADM0_A3";

/// Natural Earth display name property
pub const DEFAULT_NAME_PROPERTY: &str = "ADMIN";

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("IO error reading layer {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("GeoJSON parse error: {0}")]
    Parse(#[from] geojson::Error),
    #[error("Layer is not a FeatureCollection")]
    NotACollection,
}

pub type Result<T> = std::result::Result<T, LayerError>;

#[derive(Debug, Clone)]
pub struct CountryLayer {
    collection: FeatureCollection,
    iso_property: String,
    name_property: String,
}

impl CountryLayer {
    pub fn new(collection: FeatureCollection) -> Self {
        Self {
            collection,
            iso_property: DEFAULT_ISO_PROPERTY.to_string(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }

    /// Load a FeatureCollection from a GeoJSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LayerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::parse(&text)?;
        info!("Loaded {} country features from {:?}", layer.len(), path);
        Ok(layer)
    }

    pub fn parse(text: &str) -> Result<Self> {
        match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => Ok(Self::new(fc)),
            _ => Err(LayerError::NotACollection),
        }
    }

    pub fn with_properties(mut self, iso_property: &str, name_property: &str) -> Self {
        self.iso_property = iso_property.to_string();
        self.name_property = name_property.to_string();
        self
    }

    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// Copy of the collection with render state applied.
    ///
    /// Features without the ISO3 property are passed through untouched.
    pub fn styled(&self, state: &RenderState) -> FeatureCollection {
        let mut collection = self.collection.clone();
        let mut stamped = 0usize;

        for feature in &mut collection.features {
            let Some(iso) = feature
                .property(&self.iso_property)
                .and_then(|v| v.as_str())
                .map(str::to_string)
            else {
                continue;
            };
            let name = feature
                .property(&self.name_property)
                .and_then(|v| v.as_str())
                .map(str::to_string);

            let style = state.style_for(&iso, name.as_deref());
            feature.set_property("fill_color", style.fill_color);
            feature.set_property("source", style.source.as_str());
            feature.set_property("score", json!(style.score));
            feature.set_property("popup", style.popup);
            stamped += 1;
        }

        debug!("Styled {} of {} features", stamped, collection.features.len());
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::NO_DATA_COLOR;
    use crate::render::{refresh, RenderRequest};
    use map_data::{CountryYearRow, Metric, MetricSet, Source};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COUNTRIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": null, "properties": {"ADM0_A3": "AFG", "ADMIN": "Afghanistan"}},
            {"type": "Feature", "geometry": null, "properties": {"ADM0_A3": "FRA", "ADMIN": "France"}},
            {"type": "Feature", "geometry": null, "properties": {"ADMIN": "Disputed area"}}
        ]
    }"#;

    fn state() -> RenderState {
        let mut afg = CountryYearRow::bare("AFG", None, 2022, Source::Actual);
        afg.metric_values.insert(Metric::GmiScore, Some(45.2));
        refresh(&[afg], &RenderRequest::new(2022, MetricSet::default()), 2022)
    }

    #[test]
    fn test_styled_stamps_matching_features() {
        let layer = CountryLayer::parse(COUNTRIES).unwrap();
        assert_eq!(layer.len(), 3);

        let styled = layer.styled(&state());

        let afg = &styled.features[0];
        assert_eq!(afg.property("fill_color").unwrap(), "#800026");
        assert_eq!(afg.property("source").unwrap(), "actual");
        assert_eq!(afg.property("score").unwrap(), &json!(0.5));
        assert!(afg
            .property("popup")
            .and_then(|v| v.as_str())
            .unwrap()
            .starts_with("<strong>Afghanistan</strong>"));

        let fra = &styled.features[1];
        assert_eq!(fra.property("fill_color").unwrap(), NO_DATA_COLOR);
        assert!(fra.property("score").unwrap().is_null());

        let disputed = &styled.features[2];
        assert!(disputed.property("fill_color").is_none());
    }

    #[test]
    fn test_custom_iso_property() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null, "properties": {"ISO_A3": "AFG", "NAME": "Afghanistan"}}
        ]}"#;
        let layer = CountryLayer::parse(text).unwrap().with_properties("ISO_A3", "NAME");
        let styled = layer.styled(&state());
        assert_eq!(styled.features[0].property("fill_color").unwrap(), "#800026");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(COUNTRIES.as_bytes()).unwrap();
        let layer = CountryLayer::load(file.path()).unwrap();
        assert!(!layer.is_empty());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            CountryLayer::load("/nonexistent/countries.geojson"),
            Err(LayerError::Io { .. })
        ));
        assert!(matches!(CountryLayer::parse("{not json"), Err(LayerError::Parse(_))));
        assert!(matches!(
            CountryLayer::parse(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#),
            Err(LayerError::NotACollection)
        ));
    }
}
