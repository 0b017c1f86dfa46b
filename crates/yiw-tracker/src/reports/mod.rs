//! The filtered report engine: filter normalization, query translation,
//! aggregation, export serialization, and the session tying them together
//! behind an HTTP router.
//!
//! Every flow is a straight-line pipeline run to completion inside one
//! request; nothing is cached or carried between calls.

pub mod aggregate;
pub mod domain;
pub mod export;
pub mod filter;
pub mod query;
pub mod router;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use aggregate::{AggregateResult, UNCATEGORIZED};
pub use domain::{
    BusinessRecord, EnrollmentStatus, FeasibilityAssessment, FieldKind, FieldValue, Gender,
    ReportEntity, ReportRecord, SortOrder, YouthProfile, ASSESSMENT_SCORE_FIELDS,
};
pub use export::{CellFormat, Column, ColumnManifest, ExportError, ExportFile, ExportFormat};
pub use filter::{FieldPredicate, FilterSpec, PageRequest};
pub use query::{Predicate, StoreQuery};
pub use router::{report_router, ExportRequest, ListRequest};
pub use session::{ReportError, ReportOptions, ReportPage, ReportService};
pub use store::{InMemoryReportStore, RecordPage, ReportStore, StoreError};
