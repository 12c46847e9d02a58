//! Country popup markup

use map_data::{CountryYearRow, MetricSet, Source};

/// Escape text for inclusion in HTML element content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Confidence interval line, shown only for a single forecast metric with both bounds
pub fn ci_text(year: i32, boundary_year: i32, metrics: &MetricSet, row: Option<&CountryYearRow>) -> String {
    if year <= boundary_year {
        return String::new();
    }
    let (Some(metric), Some(row)) = (metrics.single(), row) else {
        return String::new();
    };

    match row.confidence_interval(metric) {
        Some(ci) => format!("<br>CI ({}): {:.2} … {:.2}", metric, ci.lo, ci.hi),
        None => String::new(),
    }
}

pub fn popup_html(country_name: &str, year: i32, score: Option<f64>, source: Source, ci_text: &str) -> String {
    let score_text = match score {
        Some(s) => format!("{:.2}", s),
        None => "no data".to_string(),
    };

    format!(
        "<strong>{}</strong><br>Score ({}): {}<br>Source: {}{}",
        escape_html(country_name),
        year,
        score_text,
        source.as_str(),
        ci_text
    )
}
