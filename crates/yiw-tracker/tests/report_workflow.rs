//! Integration scenarios for the report engine exercised through the public
//! facade: typed entities projected into the store, the list and export
//! flows, and the HTTP router on top.

mod common {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveDateTime};

    use yiw_tracker::reports::{
        BusinessRecord, EnrollmentStatus, FeasibilityAssessment, Gender, InMemoryReportStore,
        ReportEntity, ReportOptions, ReportService, YouthProfile,
    };

    pub(super) fn stamp(month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, month, day)
            .expect("valid date")
            .and_hms_opt(10, 0, 0)
            .expect("valid time")
    }

    pub(super) fn seeded_store() -> InMemoryReportStore {
        let store = InMemoryReportStore::default();

        let districts = [
            Some("Bekwai"),
            Some("Bekwai"),
            Some("Ejisu"),
            Some("Atwima Nwabiagya"),
            None,
        ];
        store.insert_all(
            ReportEntity::Youth,
            districts.iter().enumerate().map(|(id, district)| {
                YouthProfile {
                    id: format!("yiw-{id:04}"),
                    full_name: format!("Participant {id}"),
                    age: 18 + 2 * id as u8,
                    gender: if id % 2 == 0 {
                        Gender::Female
                    } else {
                        Gender::Male
                    },
                    district: district.map(str::to_string),
                    training_program: if id % 2 == 0 {
                        "Agribusiness".to_string()
                    } else {
                        "Tailoring".to_string()
                    },
                    status: EnrollmentStatus::InTraining,
                    updated_at: stamp(6, 1 + id as u32),
                }
                .to_record()
            }),
        );

        store.insert(
            ReportEntity::Businesses,
            BusinessRecord {
                id: "biz-01".to_string(),
                name: "Adum Fabrics".to_string(),
                district: Some("Bekwai".to_string()),
                category: Some("Tailoring".to_string()),
                owner_name: "Yaw Boateng".to_string(),
                mentor_assigned: true,
                updated_at: stamp(5, 20),
            }
            .to_record(),
        );

        store.insert_all(
            ReportEntity::Assessments,
            (1..=3).map(|id| {
                FeasibilityAssessment {
                    id: format!("fa-{id:02}"),
                    business_idea: format!("Idea {id}"),
                    district: Some("Ejisu".to_string()),
                    market_score: 0,
                    financial_score: 3,
                    technical_score: 4,
                    management_score: 0,
                    risk_score: 5,
                    updated_at: stamp(7, id),
                }
                .to_record()
            }),
        );

        store
    }

    pub(super) fn service() -> ReportService<InMemoryReportStore> {
        ReportService::new(Arc::new(seeded_store()), ReportOptions::default())
    }
}

use std::collections::BTreeMap;

use serde_json::{json, Value};

use common::{seeded_store, service};
use yiw_tracker::reports::{FilterSpec, PageRequest, ReportEntity};

fn raw(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn list_flow_filters_and_paginates() {
    let service = service();
    let spec = FilterSpec::from_raw(
        ReportEntity::Youth,
        &raw(&[("district", json!(["Bekwai", "Ejisu"]))]),
    );

    let page = service
        .list(ReportEntity::Youth, &spec, PageRequest::new(1, 2), None)
        .expect("list succeeds");
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.total, 3);

    let rest = service
        .list(ReportEntity::Youth, &spec, PageRequest::new(2, 2), None)
        .expect("list succeeds");
    assert_eq!(rest.records.len(), 1);
    assert_eq!(rest.total, 3);
}

#[test]
fn group_by_reconciles_with_total() {
    let service = service();
    let page = service
        .list(
            ReportEntity::Youth,
            &FilterSpec::default(),
            PageRequest::new(1, 2),
            Some("district"),
        )
        .expect("list succeeds");

    let aggregate = page.aggregate.expect("aggregate present");
    assert_eq!(aggregate.groups.values().sum::<usize>(), page.total);
    assert_eq!(aggregate.groups.get("Uncategorized"), Some(&1));
}

#[test]
fn assessments_list_newest_first_with_mean_score() {
    let service = service();
    let page = service
        .list(
            ReportEntity::Assessments,
            &FilterSpec::default(),
            PageRequest::new(1, 10),
            Some("district"),
        )
        .expect("list succeeds");

    let first = page.records[0].field("id").expect("id present");
    assert_eq!(first.display_text(), "fa-03");
    // Each assessment averages the rated sub-scores 3, 4, and 5.
    assert_eq!(page.aggregate.expect("aggregate present").mean_score, Some(4.0));
}

#[test]
fn csv_export_covers_the_full_filtered_set() {
    let service = service();
    let spec = FilterSpec::from_raw(ReportEntity::Youth, &raw(&[("keyword", json!("agri"))]));

    let file = service
        .export(ReportEntity::Youth, &spec, "csv")
        .expect("export succeeds");
    let text = String::from_utf8(file.bytes).expect("utf8 csv");

    // Participants 0, 2, and 4 train in Agribusiness.
    assert_eq!(text.lines().count(), 4);
    assert!(file.file_name.ends_with(".csv"));
}

#[test]
fn excel_export_is_a_readable_archive() {
    let service = service();
    let file = service
        .export(ReportEntity::Businesses, &FilterSpec::default(), "excel")
        .expect("export succeeds");

    assert_eq!(file.file_name, "business_listing.xlsx");
    let cursor = std::io::Cursor::new(file.bytes);
    let archive = zip_archive(cursor);
    assert!(archive.contains(&"xl/worksheets/sheet1.xml".to_string()));
}

fn zip_archive(cursor: std::io::Cursor<Vec<u8>>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(cursor).expect("valid archive");
    (0..archive.len())
        .map(|index| {
            archive
                .by_index(index)
                .expect("entry readable")
                .name()
                .to_string()
        })
        .collect()
}

#[test]
fn store_contents_survive_repeated_queries() {
    let store = seeded_store();
    let service = yiw_tracker::reports::ReportService::new(
        std::sync::Arc::new(store),
        yiw_tracker::reports::ReportOptions::default(),
    );

    let spec = FilterSpec::default();
    let first = service
        .list(ReportEntity::Youth, &spec, PageRequest::new(1, 10), None)
        .expect("list succeeds");
    let second = service
        .list(ReportEntity::Youth, &spec, PageRequest::new(1, 10), None)
        .expect("list succeeds");
    assert_eq!(first.records, second.records);
    assert_eq!(first.total, second.total);
}
