//! Colour palettes and quintile legends
//!
//! Actual and predicted years use visibly different palettes so forecasts
//! never read as observations. Colour-blind mode swaps in perceptually
//! uniform scales (two families to choose from).

use serde::{Serialize, Serializer};

/// Fill for countries without a score
pub const NO_DATA_COLOR: &str = "#ddd";

/// Five colours, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub name: &'static str,
    pub colors: [&'static str; 5],
}

/// Reds, observed years
pub const ACTUAL: Palette = Palette {
    name: "reds",
    colors: ["#800026", "#BD0026", "#E31A1C", "#FC4E2A", "#FD8D3C"],
};

/// Blues, forecast years
pub const PREDICTED: Palette = Palette {
    name: "blues",
    colors: ["#08306B", "#08519C", "#2171B5", "#4292C6", "#6BAED6"],
};

pub const CB_A_ACTUAL: Palette = Palette {
    name: "inferno",
    colors: ["#000004", "#2c115f", "#721f81", "#f1605d", "#fcffa4"],
};

pub const CB_A_PREDICTED: Palette = Palette {
    name: "viridis",
    colors: ["#440154", "#3b528b", "#21918c", "#5ec962", "#fde725"],
};

pub const CB_B_ACTUAL: Palette = Palette {
    name: "plasma",
    colors: ["#0d0887", "#6a00a8", "#b12a90", "#e16462", "#f0f921"],
};

pub const CB_B_PREDICTED: Palette = Palette {
    name: "cividis",
    colors: ["#00204c", "#2c4f73", "#576d83", "#a1a77d", "#fdea45"],
};

/// Palette for a year. `alternate` selects the second colour-blind family
/// and has no effect outside colour-blind mode.
pub fn pick_palette(year: i32, boundary_year: i32, color_blind: bool, alternate: bool) -> &'static Palette {
    let predicted = year > boundary_year;
    match (color_blind, alternate, predicted) {
        (false, _, false) => &ACTUAL,
        (false, _, true) => &PREDICTED,
        (true, false, false) => &CB_A_ACTUAL,
        (true, false, true) => &CB_A_PREDICTED,
        (true, true, false) => &CB_B_ACTUAL,
        (true, true, true) => &CB_B_PREDICTED,
    }
}

/// Lower bound of a legend band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Scores at or above this value
    Min(f64),
    /// Catch-all bottom band
    Unbounded,
    /// Countries without a score
    NoData,
}

/// `Min` as a number, `Unbounded` as `"-Infinity"`, `NoData` as null
impl Serialize for Threshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Threshold::Min(v) => serializer.serialize_f64(*v),
            Threshold::Unbounded => serializer.serialize_str("-Infinity"),
            Threshold::NoData => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBand {
    pub color: String,
    pub label: String,
    pub threshold: Threshold,
}

impl LegendBand {
    fn new(color: &str, label: &str, threshold: Threshold) -> Self {
        Self {
            color: color.to_string(),
            label: label.to_string(),
            threshold,
        }
    }
}

/// Quintile legend for a set of scores.
///
/// Thresholds sit at sorted index `floor(p * n)` for p = 0.8, 0.6, 0.4, 0.2.
/// With no finite score the legend is the "no data" band alone.
pub fn build_color_ranges<I>(values: I, palette: &Palette) -> Vec<LegendBand>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut all: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();

    let no_data = LegendBand::new(NO_DATA_COLOR, "no data", Threshold::NoData);
    if all.is_empty() {
        return vec![no_data];
    }

    all.sort_by(f64::total_cmp);
    let q = |p: f64| all[((p * all.len() as f64).floor() as usize).min(all.len() - 1)];
    let c = &palette.colors;

    vec![
        LegendBand::new(c[0], "Top 20%", Threshold::Min(q(0.8))),
        LegendBand::new(c[1], "60–80%", Threshold::Min(q(0.6))),
        LegendBand::new(c[2], "40–60%", Threshold::Min(q(0.4))),
        LegendBand::new(c[3], "20–40%", Threshold::Min(q(0.2))),
        LegendBand::new(c[4], "Bottom 20%", Threshold::Unbounded),
        no_data,
    ]
}

/// Fill colour for a score: the first band whose threshold it reaches
pub fn color_for(bands: &[LegendBand], value: Option<f64>) -> &str {
    let Some(value) = value else {
        return NO_DATA_COLOR;
    };

    bands
        .iter()
        .find(|band| match band.threshold {
            Threshold::Min(min) => value >= min,
            Threshold::Unbounded => true,
            Threshold::NoData => false,
        })
        .or_else(|| bands.last())
        .map(|band| band.color.as_str())
        .unwrap_or(NO_DATA_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn one_to_ten() -> Vec<Option<f64>> {
        (1..=10).map(|v| Some(v as f64)).collect()
    }

    #[test]
    fn test_pick_palette() {
        assert_eq!(pick_palette(2022, 2022, false, false), &ACTUAL);
        assert_eq!(pick_palette(2023, 2022, false, true), &PREDICTED);
        assert_eq!(pick_palette(2020, 2022, true, false), &CB_A_ACTUAL);
        assert_eq!(pick_palette(2030, 2022, true, false), &CB_A_PREDICTED);
        assert_eq!(pick_palette(2020, 2022, true, true), &CB_B_ACTUAL);
        assert_eq!(pick_palette(2030, 2022, true, true), &CB_B_PREDICTED);
    }

    #[test]
    fn test_quintile_bands() {
        let bands = build_color_ranges(one_to_ten(), &ACTUAL);
        assert_eq!(bands.len(), 6);

        let thresholds: Vec<Threshold> = bands.iter().map(|b| b.threshold).collect();
        assert_eq!(
            thresholds,
            vec![
                Threshold::Min(9.0),
                Threshold::Min(7.0),
                Threshold::Min(5.0),
                Threshold::Min(3.0),
                Threshold::Unbounded,
                Threshold::NoData,
            ]
        );
        assert_eq!(bands[0].color, "#800026");
        assert_eq!(bands[4].label, "Bottom 20%");
        assert_eq!(bands[5].color, NO_DATA_COLOR);
    }

    #[test]
    fn test_no_values_only_no_data_band() {
        let bands = build_color_ranges(vec![None, None], &PREDICTED);
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].threshold, Threshold::NoData);
        assert_eq!(color_for(&bands, Some(1.0)), NO_DATA_COLOR);
    }

    #[test]
    fn test_color_for() {
        let bands = build_color_ranges(one_to_ten(), &ACTUAL);
        assert_eq!(color_for(&bands, None), NO_DATA_COLOR);
        assert_eq!(color_for(&bands, Some(10.0)), "#800026");
        assert_eq!(color_for(&bands, Some(9.0)), "#800026");
        assert_eq!(color_for(&bands, Some(8.5)), "#BD0026");
        assert_eq!(color_for(&bands, Some(3.0)), "#FC4E2A");
        assert_eq!(color_for(&bands, Some(-100.0)), "#FD8D3C");
    }

    #[test]
    fn test_single_value_lands_in_top_band() {
        let bands = build_color_ranges(vec![Some(4.2)], &ACTUAL);
        assert_eq!(color_for(&bands, Some(4.2)), "#800026");
    }

    #[test]
    fn test_threshold_wire_format() {
        let bands = build_color_ranges(one_to_ten(), &ACTUAL);
        let json = serde_json::to_value(&bands).unwrap();
        assert_eq!(json[0]["threshold"], serde_json::json!(9.0));
        assert_eq!(json[4]["threshold"], serde_json::json!("-Infinity"));
        assert!(json[5]["threshold"].is_null());
    }

    proptest! {
        #[test]
        fn fuzz_thresholds_descend(values in prop::collection::vec(prop::option::of(-1e6f64..1e6), 0..200)) {
            let bands = build_color_ranges(values.clone(), &CB_A_PREDICTED);
            let numeric = values.iter().flatten().count();

            if numeric == 0 {
                prop_assert_eq!(bands.len(), 1);
            } else {
                prop_assert_eq!(bands.len(), 6);
                let mins: Vec<f64> = bands
                    .iter()
                    .filter_map(|b| match b.threshold {
                        Threshold::Min(v) => Some(v),
                        _ => None,
                    })
                    .collect();
                prop_assert!(mins.windows(2).all(|w| w[0] >= w[1]));
            }
        }

        #[test]
        fn fuzz_every_score_gets_palette_color(values in prop::collection::vec(-1e6f64..1e6, 1..100)) {
            let bands = build_color_ranges(values.iter().map(|v| Some(*v)), &PREDICTED);
            for v in &values {
                let color = color_for(&bands, Some(*v));
                prop_assert!(PREDICTED.colors.iter().any(|c| *c == color), "{} -> {}", v, color);
            }
        }
    }
}
