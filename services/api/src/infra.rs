use chrono::{NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use yiw_tracker::reports::{
    BusinessRecord, EnrollmentStatus, FeasibilityAssessment, Gender, InMemoryReportStore,
    ReportEntity, YouthProfile,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn stamp(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, month, day)
        .expect("valid seed date")
        .and_hms_opt(hour, 0, 0)
        .expect("valid seed time")
}

/// In-memory store seeded with representative program data, standing in for
/// the tracker database in the demo commands and the default server.
pub(crate) fn seeded_store() -> InMemoryReportStore {
    let store = InMemoryReportStore::default();

    let youth = [
        ("Akosua Mensah", 19, Gender::Female, Some("Bekwai"), "Agribusiness", EnrollmentStatus::InTraining),
        ("Kwame Osei", 22, Gender::Male, Some("Bekwai"), "Carpentry", EnrollmentStatus::Enrolled),
        ("Ama Serwaa", 24, Gender::Female, Some("Bekwai"), "Tailoring", EnrollmentStatus::Placed),
        ("Yaw Darko", 20, Gender::Male, Some("Ejisu"), "Agribusiness", EnrollmentStatus::InTraining),
        ("Efua Asante", 23, Gender::Female, Some("Ejisu"), "Hairdressing", EnrollmentStatus::InTraining),
        ("Kofi Boadu", 21, Gender::Male, Some("Atwima Nwabiagya"), "Welding", EnrollmentStatus::Enrolled),
        ("Abena Owusu", 18, Gender::Female, Some("Atwima Nwabiagya"), "Tailoring", EnrollmentStatus::Enrolled),
        ("Kwabena Appiah", 25, Gender::Male, None, "Agribusiness", EnrollmentStatus::Exited),
    ];
    store.insert_all(
        ReportEntity::Youth,
        youth
            .iter()
            .enumerate()
            .map(|(index, (name, age, gender, district, program, status))| {
                YouthProfile {
                    id: format!("yiw-{:04}", index + 1),
                    full_name: (*name).to_string(),
                    age: *age,
                    gender: *gender,
                    district: district.map(str::to_string),
                    training_program: (*program).to_string(),
                    status: *status,
                    updated_at: stamp(6, 1 + index as u32, 9),
                }
                .to_record()
            }),
    );

    let businesses = [
        ("Adum Fabrics", Some("Bekwai"), Some("Tailoring"), "Yaw Boateng", true),
        ("Ejisu Agro Supplies", Some("Ejisu"), Some("Agribusiness"), "Adwoa Nyarko", true),
        ("Nwabiagya Woodworks", Some("Atwima Nwabiagya"), Some("Carpentry"), "Kojo Antwi", false),
        ("Golden Shears", Some("Bekwai"), None, "Esi Appiah", false),
        ("Roadside Catering", None, Some("Catering"), "Afia Kumi", false),
    ];
    store.insert_all(
        ReportEntity::Businesses,
        businesses
            .iter()
            .enumerate()
            .map(|(index, (name, district, category, owner, mentored))| {
                BusinessRecord {
                    id: format!("biz-{:02}", index + 1),
                    name: (*name).to_string(),
                    district: district.map(str::to_string),
                    category: category.map(str::to_string),
                    owner_name: (*owner).to_string(),
                    mentor_assigned: *mentored,
                    updated_at: stamp(5, 10 + index as u32, 14),
                }
                .to_record()
            }),
    );

    let assessments = [
        ("Poultry feed production", Some("Bekwai"), [4, 3, 4, 2, 3]),
        ("Mobile phone repairs", Some("Ejisu"), [5, 4, 0, 3, 4]),
        ("Cassava processing", Some("Bekwai"), [3, 0, 3, 0, 2]),
        ("Bead craft exports", None, [0, 0, 0, 0, 0]),
    ];
    store.insert_all(
        ReportEntity::Assessments,
        assessments
            .iter()
            .enumerate()
            .map(|(index, (idea, district, scores))| {
                FeasibilityAssessment {
                    id: format!("fa-{:02}", index + 1),
                    business_idea: (*idea).to_string(),
                    district: district.map(str::to_string),
                    market_score: scores[0],
                    financial_score: scores[1],
                    technical_score: scores[2],
                    management_score: scores[3],
                    risk_score: scores[4],
                    updated_at: stamp(7, 2 + index as u32, 11),
                }
                .to_record()
            }),
    );

    store
}
