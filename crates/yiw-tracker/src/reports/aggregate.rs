use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::ReportRecord;

/// Bucket label for records whose group field is null, missing, or blank.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Counts per group plus the overall total; for score-bearing entities the
/// mean composite score across the set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub groups: BTreeMap<String, usize>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
}

/// Count records per distinct value of `field`. Null and missing values land
/// in the [`UNCATEGORIZED`] bucket, so group counts always sum to the total.
pub fn group_counts(records: &[ReportRecord], field: &str) -> AggregateResult {
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        let key = record
            .field(field)
            .map(|value| value.display_text())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        *groups.entry(key).or_insert(0) += 1;
    }

    AggregateResult {
        groups,
        total: records.len(),
        mean_score: None,
    }
}

/// Average the rated sub-scores of one record, rounded to one decimal.
///
/// Zero, missing, and non-numeric values count as "not rated" and are
/// excluded; a record with nothing rated scores 0.0.
pub fn composite_score(record: &ReportRecord, score_fields: &[&str]) -> f64 {
    let rated: Vec<f64> = score_fields
        .iter()
        .filter_map(|field| record.field(field).and_then(|value| value.as_number()))
        .filter(|score| *score > 0.0)
        .collect();

    if rated.is_empty() {
        return 0.0;
    }

    round_one_decimal(rated.iter().sum::<f64>() / rated.len() as f64)
}

/// Mean composite score across a record set, ignoring records with nothing
/// rated. An entirely unrated set reports 0.0.
pub fn mean_composite(records: &[ReportRecord], score_fields: &[&str]) -> f64 {
    let composites: Vec<f64> = records
        .iter()
        .map(|record| composite_score(record, score_fields))
        .filter(|score| *score > 0.0)
        .collect();

    if composites.is_empty() {
        return 0.0;
    }

    round_one_decimal(composites.iter().sum::<f64>() / composites.len() as f64)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
