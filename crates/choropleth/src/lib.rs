//! Atlas choropleth
//!
//! Everything between merged country-year rows and a coloured map:
//!
//! - [`normalize`] - min-max scaling
//! - [`scores`] - per-metric indicator matrix and composite scores
//! - [`palette`] - palettes, quintile legend, colour lookup
//! - [`popup`] - popup markup
//! - [`render`] - [`render::refresh`], the render state for one view
//! - [`layer`] - applies a render state to GeoJSON country polygons

pub mod layer;
pub mod normalize;
pub mod palette;
pub mod popup;
pub mod render;
pub mod scores;

pub use layer::{CountryLayer, LayerError};
pub use normalize::normalize;
pub use palette::{build_color_ranges, color_for, pick_palette, LegendBand, Palette, Threshold, NO_DATA_COLOR};
pub use render::{refresh, CountryStyle, RenderRequest, RenderState};
pub use scores::{build_matrix, build_scores, CountryScores, IndicatorMatrix};
