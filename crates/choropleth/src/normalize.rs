//! Min-max normalization onto [0, 1]

use std::collections::BTreeMap;

/// Scale every numeric value to `(v - min) / (max - min)`.
///
/// Keys without a finite value map to `None`. When all numeric values are
/// equal each of them maps to 0.5; when there are none every key maps to `None`.
pub fn normalize<K: Ord + Clone>(values: &BTreeMap<K, Option<f64>>) -> BTreeMap<K, Option<f64>> {
    let finite = || values.values().filter_map(|v| v.filter(|x| x.is_finite()));

    let Some(min) = finite().reduce(f64::min) else {
        return values.keys().map(|k| (k.clone(), None)).collect();
    };
    let max = finite().fold(min, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|(k, v)| {
            let scaled = v.filter(|x| x.is_finite()).map(|x| {
                if span == 0.0 {
                    0.5
                } else {
                    (x - min) / span
                }
            });
            (k.clone(), scaled)
        })
        .collect()
}
