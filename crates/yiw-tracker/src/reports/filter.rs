use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use super::domain::{FieldKind, ReportEntity};

/// A normalized constraint on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPredicate {
    /// Field value must be one of the listed values.
    OneOf(BTreeSet<String>),
    /// Numeric field must fall inside the (optionally open-ended) range.
    Range { min: Option<f64>, max: Option<f64> },
}

/// Immutable, validated filter built from raw request input.
///
/// Construction is permissive: unknown keys are ignored and malformed values
/// are dropped rather than failing the request, so a filter can only narrow
/// a listing, never break it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    terms: BTreeMap<String, FieldPredicate>,
    keyword: Option<String>,
}

impl FilterSpec {
    /// Normalize raw key/value pairs against the entity's field schema.
    ///
    /// Accepted shapes per field kind:
    /// - enumerated: an array of strings, or a bare scalar treated as a
    ///   one-element set; an empty set means no constraint
    /// - numeric: an object `{min?, max?}`, plus `min<Field>`/`max<Field>`
    ///   aliases carrying a bare number (the shape URL parameters arrive in)
    /// - `keyword`: a non-blank string, matched across the entity's
    ///   searchable columns
    pub fn from_raw(entity: ReportEntity, raw: &BTreeMap<String, Value>) -> Self {
        let mut spec = FilterSpec::default();

        for (key, value) in raw {
            if key == "keyword" {
                match value.as_str() {
                    Some(text) if !text.trim().is_empty() => {
                        spec.keyword = Some(text.trim().to_string());
                    }
                    _ => {}
                }
                continue;
            }

            match entity.field_kind(key) {
                Some(FieldKind::Enumerated) => {
                    let values = enumerated_values(value);
                    if values.is_empty() {
                        debug!(field = %key, "dropping empty or malformed set predicate");
                    } else {
                        spec.terms.insert(key.clone(), FieldPredicate::OneOf(values));
                    }
                }
                Some(FieldKind::Numeric) => {
                    let min = value.get("min").and_then(numeric_value);
                    let max = value.get("max").and_then(numeric_value);
                    if min.is_none() && max.is_none() {
                        debug!(field = %key, "dropping malformed range predicate");
                    } else {
                        spec.terms
                            .insert(key.clone(), FieldPredicate::Range { min, max });
                    }
                }
                None => {
                    if let Some((field, bound)) = range_alias(entity, key) {
                        match numeric_value(value) {
                            Some(number) => spec.set_bound(field, bound, number),
                            None => {
                                debug!(field = %key, "dropping non-numeric range bound");
                            }
                        }
                    }
                    // Anything else is an unknown key; ignore it.
                }
            }
        }

        spec
    }

    pub fn terms(&self) -> &BTreeMap<String, FieldPredicate> {
        &self.terms
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.terms.is_empty() && self.keyword.is_none()
    }

    fn set_bound(&mut self, field: String, bound: RangeBound, number: f64) {
        let entry = self
            .terms
            .entry(field)
            .or_insert(FieldPredicate::Range {
                min: None,
                max: None,
            });
        if let FieldPredicate::Range { min, max } = entry {
            match bound {
                RangeBound::Min => *min = Some(number),
                RangeBound::Max => *max = Some(number),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RangeBound {
    Min,
    Max,
}

/// Map `minAge` / `max_age` style keys onto a numeric field of the entity.
fn range_alias(entity: ReportEntity, key: &str) -> Option<(String, RangeBound)> {
    let (bound, rest) = if let Some(rest) = key.strip_prefix("min") {
        (RangeBound::Min, rest)
    } else if let Some(rest) = key.strip_prefix("max") {
        (RangeBound::Max, rest)
    } else {
        return None;
    };

    let rest = rest.strip_prefix('_').unwrap_or(rest);
    if rest.is_empty() {
        return None;
    }

    let mut chars = rest.chars();
    let first = chars.next()?;
    let field: String = first.to_lowercase().chain(chars).collect();

    match entity.field_kind(&field) {
        Some(FieldKind::Numeric) => Some((field, bound)),
        _ => None,
    }
}

fn enumerated_values(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 1-based pagination request. Both fields are clamped to at least 1 at
/// construction so downstream offset math cannot underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub const fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }
}
