use std::sync::Arc;

use serde::Serialize;

use super::aggregate::{group_counts, mean_composite, AggregateResult};
use super::domain::{ReportEntity, ReportRecord};
use super::export::{export_records, ColumnManifest, ExportError, ExportFile, ExportFormat};
use super::filter::{FilterSpec, PageRequest};
use super::query::{translate, translate_unpaginated};
use super::store::{ReportStore, StoreError};

/// Engine knobs threaded in from configuration.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub export_row_cap: usize,
    pub default_page_size: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            export_row_cap: 100_000,
            default_page_size: 20,
        }
    }
}

/// One page of a report plus the cross-page total, echoing the pagination
/// that produced it. Built fresh per request; nothing is cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub records: Vec<ReportRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateResult>,
}

/// Error raised by the report session.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Stateless orchestration over the store: the list flow (translate, fetch a
/// page, optionally aggregate) and the export flow (translate, fetch the
/// capped full set, serialize).
pub struct ReportService<S> {
    store: Arc<S>,
    options: ReportOptions,
}

impl<S> ReportService<S>
where
    S: ReportStore + 'static,
{
    pub fn new(store: Arc<S>, options: ReportOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Run the list flow. When `group_by` names a field, counts (and for
    /// score-bearing entities the mean composite score) are computed over
    /// the full filtered set so they reconcile against `total`.
    pub fn list(
        &self,
        entity: ReportEntity,
        spec: &FilterSpec,
        page: PageRequest,
        group_by: Option<&str>,
    ) -> Result<ReportPage, ReportError> {
        let query = translate(entity, spec, page);
        let fetched = self.store.fetch_page(entity, &query)?;

        let aggregate = match group_by {
            Some(field) => {
                let full_set = self.fetch_full(entity, spec)?;
                let mut aggregate = group_counts(&full_set, field);
                if !entity.score_fields().is_empty() {
                    aggregate.mean_score =
                        Some(mean_composite(&full_set, entity.score_fields()));
                }
                Some(aggregate)
            }
            None => None,
        };

        Ok(ReportPage {
            records: fetched.rows,
            total: fetched.total,
            page: page.page,
            page_size: page.page_size,
            aggregate,
        })
    }

    /// Run the export flow. The format is validated before any store access;
    /// the full filtered set is fetched without pagination, bounded by the
    /// configured row cap.
    pub fn export(
        &self,
        entity: ReportEntity,
        spec: &FilterSpec,
        raw_format: &str,
    ) -> Result<ExportFile, ReportError> {
        let format = ExportFormat::parse(raw_format)?;
        let records = self.fetch_full(entity, spec)?;
        let manifest = ColumnManifest::for_entity(entity);
        Ok(export_records(
            entity.report_name(),
            format,
            &manifest,
            &records,
        )?)
    }

    fn fetch_full(
        &self,
        entity: ReportEntity,
        spec: &FilterSpec,
    ) -> Result<Vec<ReportRecord>, ReportError> {
        let cap = self.options.export_row_cap;
        let query = translate_unpaginated(entity, spec, cap + 1);
        let rows = self.store.fetch_all(entity, &query)?;
        if rows.len() > cap {
            return Err(ExportError::TooLarge {
                rows: rows.len(),
                cap,
            }
            .into());
        }
        Ok(rows)
    }
}
