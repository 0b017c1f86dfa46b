use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::reports::domain::{
    EnrollmentStatus, FeasibilityAssessment, Gender, ReportEntity, ReportRecord, YouthProfile,
};
use crate::reports::query::StoreQuery;
use crate::reports::session::{ReportOptions, ReportService};
use crate::reports::store::{InMemoryReportStore, RecordPage, ReportStore, StoreError};

pub(super) fn stamp(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .expect("valid date")
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
}

pub(super) fn youth(id: usize, district: Option<&str>, age: u8) -> YouthProfile {
    YouthProfile {
        id: format!("yiw-{id:04}"),
        full_name: format!("Participant {id}"),
        age,
        gender: if id % 2 == 0 {
            Gender::Female
        } else {
            Gender::Male
        },
        district: district.map(str::to_string),
        training_program: "Agribusiness".to_string(),
        status: EnrollmentStatus::InTraining,
        updated_at: stamp(1, 8),
    }
}

pub(super) fn assessment(id: usize, day: u32, scores: [u8; 5]) -> FeasibilityAssessment {
    FeasibilityAssessment {
        id: format!("fa-{id:02}"),
        business_idea: format!("Idea {id}"),
        district: Some("Bekwai".to_string()),
        market_score: scores[0],
        financial_score: scores[1],
        technical_score: scores[2],
        management_score: scores[3],
        risk_score: scores[4],
        updated_at: stamp(day, 12),
    }
}

/// Fixture of 8 Bekwai + 4 non-Bekwai participants used by the concrete
/// filter scenarios.
pub(super) fn seeded_youth_store() -> InMemoryReportStore {
    let store = InMemoryReportStore::default();
    store.insert_all(
        ReportEntity::Youth,
        (0..8).map(|id| youth(id, Some("Bekwai"), 18 + id as u8).to_record()),
    );
    store.insert_all(
        ReportEntity::Youth,
        (8..12).map(|id| youth(id, Some("Ejisu"), 18 + id as u8).to_record()),
    );
    store
}

pub(super) fn service_over(
    store: InMemoryReportStore,
) -> ReportService<InMemoryReportStore> {
    ReportService::new(Arc::new(store), ReportOptions::default())
}

pub(super) fn raw_filters(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Store wrapper counting fetches, so tests can assert an invalid request
/// never reached the data store.
pub(super) struct CountingStore {
    inner: InMemoryReportStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub(super) fn new(inner: InMemoryReportStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ReportStore for CountingStore {
    fn fetch_page(
        &self,
        entity: ReportEntity,
        query: &StoreQuery,
    ) -> Result<RecordPage, StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch_page(entity, query)
    }

    fn fetch_all(
        &self,
        entity: ReportEntity,
        query: &StoreQuery,
    ) -> Result<Vec<ReportRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch_all(entity, query)
    }
}

/// Store that fails every fetch, for surfacing data-access failures.
pub(super) struct UnavailableStore;

impl ReportStore for UnavailableStore {
    fn fetch_page(
        &self,
        _entity: ReportEntity,
        _query: &StoreQuery,
    ) -> Result<RecordPage, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_all(
        &self,
        _entity: ReportEntity,
        _query: &StoreQuery,
    ) -> Result<Vec<ReportRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
