use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{ReportEntity, ReportRecord, SortOrder};
use super::query::StoreQuery;

/// One page of store output together with the filtered total across all
/// pages.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub rows: Vec<ReportRecord>,
    pub total: usize,
}

/// Error enumeration for store failures. The engine never retries; a failed
/// fetch surfaces to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

/// Read-only data-store abstraction the report engine runs against, so the
/// session module can be exercised in isolation.
pub trait ReportStore: Send + Sync {
    /// Fetch the query window plus the parallel total count.
    fn fetch_page(
        &self,
        entity: ReportEntity,
        query: &StoreQuery,
    ) -> Result<RecordPage, StoreError>;

    /// Fetch the full filtered set, truncated at `query.limit` rows.
    fn fetch_all(
        &self,
        entity: ReportEntity,
        query: &StoreQuery,
    ) -> Result<Vec<ReportRecord>, StoreError>;
}

/// In-memory store used by the service binary and tests. Applies the
/// query's predicates with their reference evaluation and sorts per the
/// query's ordering.
#[derive(Default, Clone)]
pub struct InMemoryReportStore {
    tables: Arc<Mutex<HashMap<ReportEntity, Vec<ReportRecord>>>>,
}

impl InMemoryReportStore {
    pub fn insert(&self, entity: ReportEntity, record: ReportRecord) {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.entry(entity).or_default().push(record);
    }

    pub fn insert_all(
        &self,
        entity: ReportEntity,
        records: impl IntoIterator<Item = ReportRecord>,
    ) {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.entry(entity).or_default().extend(records);
    }

    fn filtered(&self, entity: ReportEntity, query: &StoreQuery) -> Vec<ReportRecord> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        let mut rows: Vec<ReportRecord> = guard
            .get(&entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if query.sort == SortOrder::UpdatedDesc {
            // Timestamps are ISO-8601 text, so lexicographic order is
            // chronological; the sort is stable, so ties keep insertion order.
            rows.sort_by(|a, b| {
                let a_stamp = a.field("updated_at").map(|value| value.display_text());
                let b_stamp = b.field("updated_at").map(|value| value.display_text());
                b_stamp.cmp(&a_stamp)
            });
        }

        rows
    }
}

impl ReportStore for InMemoryReportStore {
    fn fetch_page(
        &self,
        entity: ReportEntity,
        query: &StoreQuery,
    ) -> Result<RecordPage, StoreError> {
        let rows = self.filtered(entity, query);
        let total = rows.len();
        let rows = rows
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok(RecordPage { rows, total })
    }

    fn fetch_all(
        &self,
        entity: ReportEntity,
        query: &StoreQuery,
    ) -> Result<Vec<ReportRecord>, StoreError> {
        let mut rows = self.filtered(entity, query);
        rows.truncate(query.limit);
        Ok(rows)
    }
}
