use std::collections::BTreeSet;

use super::domain::{ReportEntity, ReportRecord, SortOrder};
use super::filter::{FieldPredicate, FilterSpec, PageRequest};

/// A single predicate in the shape the data store consumes. `matches` is the
/// reference evaluation used by in-memory stores and by tests; a SQL-backed
/// store would compile each variant to a WHERE clause instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    OneOf {
        field: String,
        values: BTreeSet<String>,
    },
    MinBound {
        field: String,
        min: f64,
    },
    MaxBound {
        field: String,
        max: f64,
    },
    Keyword {
        fields: &'static [&'static str],
        needle: String,
    },
}

impl Predicate {
    pub fn matches(&self, record: &ReportRecord) -> bool {
        match self {
            Predicate::OneOf { field, values } => record
                .field(field)
                .filter(|value| !value.is_null())
                .is_some_and(|value| values.contains(&value.display_text())),
            Predicate::MinBound { field, min } => record
                .field(field)
                .and_then(|value| value.as_number())
                .is_some_and(|number| number >= *min),
            Predicate::MaxBound { field, max } => record
                .field(field)
                .and_then(|value| value.as_number())
                .is_some_and(|number| number <= *max),
            Predicate::Keyword { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    record
                        .field(field)
                        .map(|value| value.display_text().to_lowercase())
                        .is_some_and(|haystack| haystack.contains(&needle))
                })
            }
        }
    }
}

/// The query handed to the data store: predicates, ordering, and a window.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub predicates: Vec<Predicate>,
    pub sort: SortOrder,
    pub offset: usize,
    pub limit: usize,
}

impl StoreQuery {
    pub fn matches(&self, record: &ReportRecord) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(record))
    }
}

/// Translate a filter plus pagination into a page query. Offset is
/// `(page - 1) * page_size`; the store reports the parallel total count.
pub fn translate(entity: ReportEntity, spec: &FilterSpec, page: PageRequest) -> StoreQuery {
    StoreQuery {
        predicates: predicates(entity, spec),
        sort: entity.default_sort(),
        offset: page.offset(),
        limit: page.page_size,
    }
}

/// Translate a filter into a full-set query for export and aggregation. The
/// caller passes `cap + 1` as the limit so an over-cap set is detectable
/// without fetching everything.
pub fn translate_unpaginated(
    entity: ReportEntity,
    spec: &FilterSpec,
    limit: usize,
) -> StoreQuery {
    StoreQuery {
        predicates: predicates(entity, spec),
        sort: entity.default_sort(),
        offset: 0,
        limit,
    }
}

fn predicates(entity: ReportEntity, spec: &FilterSpec) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    for (field, term) in spec.terms() {
        match term {
            FieldPredicate::OneOf(values) => predicates.push(Predicate::OneOf {
                field: field.clone(),
                values: values.clone(),
            }),
            FieldPredicate::Range { min, max } => {
                if let Some(min) = min {
                    predicates.push(Predicate::MinBound {
                        field: field.clone(),
                        min: *min,
                    });
                }
                if let Some(max) = max {
                    predicates.push(Predicate::MaxBound {
                        field: field.clone(),
                        max: *max,
                    });
                }
            }
        }
    }

    if let Some(keyword) = spec.keyword() {
        predicates.push(Predicate::Keyword {
            fields: entity.keyword_fields(),
            needle: keyword.to_string(),
        });
    }

    predicates
}
