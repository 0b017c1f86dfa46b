use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single scalar cell as it travels between the store, the engine, and the
/// wire. Serializes to a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Render the cell the way listings and exports show it: empty for null,
    /// integers without a trailing `.0`.
    pub fn display_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            Self::Text(value) => value.clone(),
        }
    }
}

/// One row of a report: a flat, read-only snapshot of an entity. The engine
/// never mutates a record after the store hands it over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportRecord(BTreeMap<String, FieldValue>);

impl ReportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reported gender as captured at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

/// Where a participant currently sits in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Enrolled,
    InTraining,
    Placed,
    Exited,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::InTraining => "in_training",
            EnrollmentStatus::Placed => "placed",
            EnrollmentStatus::Exited => "exited",
        }
    }
}

/// A tracked program participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YouthProfile {
    pub id: String,
    pub full_name: String,
    pub age: u8,
    pub gender: Gender,
    pub district: Option<String>,
    pub training_program: String,
    pub status: EnrollmentStatus,
    pub updated_at: NaiveDateTime,
}

impl YouthProfile {
    pub fn to_record(&self) -> ReportRecord {
        ReportRecord::new()
            .with("id", FieldValue::text(&self.id))
            .with("full_name", FieldValue::text(&self.full_name))
            .with("age", FieldValue::number(f64::from(self.age)))
            .with("gender", FieldValue::text(self.gender.label()))
            .with("district", optional_text(self.district.as_deref()))
            .with(
                "training_program",
                FieldValue::text(&self.training_program),
            )
            .with("status", FieldValue::text(self.status.label()))
            .with("updated_at", timestamp_text(self.updated_at))
    }
}

/// A business registered with the program, with or without a mentor attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    pub name: String,
    pub district: Option<String>,
    pub category: Option<String>,
    pub owner_name: String,
    pub mentor_assigned: bool,
    pub updated_at: NaiveDateTime,
}

impl BusinessRecord {
    pub fn to_record(&self) -> ReportRecord {
        ReportRecord::new()
            .with("id", FieldValue::text(&self.id))
            .with("name", FieldValue::text(&self.name))
            .with("district", optional_text(self.district.as_deref()))
            .with("category", optional_text(self.category.as_deref()))
            .with("owner_name", FieldValue::text(&self.owner_name))
            .with("mentor_assigned", FieldValue::Bool(self.mentor_assigned))
            .with("updated_at", timestamp_text(self.updated_at))
    }
}

/// A feasibility assessment of a proposed business idea. Sub-scores run 1-5;
/// zero means the dimension was not rated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityAssessment {
    pub id: String,
    pub business_idea: String,
    pub district: Option<String>,
    pub market_score: u8,
    pub financial_score: u8,
    pub technical_score: u8,
    pub management_score: u8,
    pub risk_score: u8,
    pub updated_at: NaiveDateTime,
}

impl FeasibilityAssessment {
    pub fn to_record(&self) -> ReportRecord {
        ReportRecord::new()
            .with("id", FieldValue::text(&self.id))
            .with("business_idea", FieldValue::text(&self.business_idea))
            .with("district", optional_text(self.district.as_deref()))
            .with("market_score", FieldValue::number(f64::from(self.market_score)))
            .with(
                "financial_score",
                FieldValue::number(f64::from(self.financial_score)),
            )
            .with(
                "technical_score",
                FieldValue::number(f64::from(self.technical_score)),
            )
            .with(
                "management_score",
                FieldValue::number(f64::from(self.management_score)),
            )
            .with("risk_score", FieldValue::number(f64::from(self.risk_score)))
            .with("updated_at", timestamp_text(self.updated_at))
    }
}

fn optional_text(value: Option<&str>) -> FieldValue {
    match value {
        Some(text) => FieldValue::text(text),
        None => FieldValue::Null,
    }
}

fn timestamp_text(value: NaiveDateTime) -> FieldValue {
    FieldValue::Text(value.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// The kinds of constraint a filter field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Enumerated,
    Numeric,
}

/// Sort applied when a request names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Insertion,
    UpdatedDesc,
}

/// The reportable entities. Each carries its URL slug, the searchable
/// columns keyword queries fan out across, the constraint schema used by
/// filter normalization, and its default ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportEntity {
    Youth,
    Businesses,
    Assessments,
}

const YOUTH_SCHEMA: &[(&str, FieldKind)] = &[
    ("district", FieldKind::Enumerated),
    ("gender", FieldKind::Enumerated),
    ("status", FieldKind::Enumerated),
    ("training_program", FieldKind::Enumerated),
    ("age", FieldKind::Numeric),
];

const BUSINESS_SCHEMA: &[(&str, FieldKind)] = &[
    ("district", FieldKind::Enumerated),
    ("category", FieldKind::Enumerated),
    ("mentor_assigned", FieldKind::Enumerated),
];

const ASSESSMENT_SCHEMA: &[(&str, FieldKind)] = &[
    ("district", FieldKind::Enumerated),
    ("market_score", FieldKind::Numeric),
    ("financial_score", FieldKind::Numeric),
    ("technical_score", FieldKind::Numeric),
    ("management_score", FieldKind::Numeric),
    ("risk_score", FieldKind::Numeric),
];

/// Sub-score columns feeding the composite feasibility score.
pub const ASSESSMENT_SCORE_FIELDS: &[&str] = &[
    "market_score",
    "financial_score",
    "technical_score",
    "management_score",
    "risk_score",
];

impl ReportEntity {
    pub const fn slug(self) -> &'static str {
        match self {
            ReportEntity::Youth => "youth",
            ReportEntity::Businesses => "businesses",
            ReportEntity::Assessments => "assessments",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        match value {
            "youth" => Some(Self::Youth),
            "businesses" => Some(Self::Businesses),
            "assessments" => Some(Self::Assessments),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ReportEntity::Youth => "Youth Profiles",
            ReportEntity::Businesses => "Business Listing",
            ReportEntity::Assessments => "Feasibility Assessments",
        }
    }

    /// Logical name used to compose export file names.
    pub const fn report_name(self) -> &'static str {
        match self {
            ReportEntity::Youth => "youth_profiles",
            ReportEntity::Businesses => "business_listing",
            ReportEntity::Assessments => "feasibility_assessments",
        }
    }

    pub const fn keyword_fields(self) -> &'static [&'static str] {
        match self {
            ReportEntity::Youth => &["full_name", "training_program", "id"],
            ReportEntity::Businesses => &["name", "category", "id"],
            ReportEntity::Assessments => &["business_idea", "id"],
        }
    }

    pub const fn field_kinds(self) -> &'static [(&'static str, FieldKind)] {
        match self {
            ReportEntity::Youth => YOUTH_SCHEMA,
            ReportEntity::Businesses => BUSINESS_SCHEMA,
            ReportEntity::Assessments => ASSESSMENT_SCHEMA,
        }
    }

    pub fn field_kind(self, field: &str) -> Option<FieldKind> {
        self.field_kinds()
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    pub const fn default_sort(self) -> SortOrder {
        match self {
            ReportEntity::Assessments => SortOrder::UpdatedDesc,
            _ => SortOrder::Insertion,
        }
    }

    pub const fn score_fields(self) -> &'static [&'static str] {
        match self {
            ReportEntity::Assessments => ASSESSMENT_SCORE_FIELDS,
            _ => &[],
        }
    }
}
