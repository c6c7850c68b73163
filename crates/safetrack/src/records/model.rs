//! Record types shared by the repositories and the report generators.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::dates::DateRange;

/// Form fields of an inspection ("Проверка ОТиПБ"), everything but the id
/// and the attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionDraft {
    pub inspection_date: String,
    pub object: String,
    pub section: String,
    pub organization: String,
    pub violator_name: String,
    pub violation_description: String,
    pub violation_type: String,
    pub violation_category: String,
    pub risk_level: String,
    pub inspector_name: String,
    pub elimination_date: String,
    pub elimination_status: String,
}

/// A persisted inspection with its optional single photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: InspectionDraft,
    pub photo_path: Option<String>,
}

impl InspectionRecord {
    /// Stringified value of a named field, `None` for unknown names.
    pub fn field_value(&self, name: &str) -> Option<String> {
        let f = &self.fields;
        let value = match name {
            "id" => return Some(self.id.to_string()),
            "inspection_date" => &f.inspection_date,
            "object" => &f.object,
            "section" => &f.section,
            "organization" => &f.organization,
            "violator_name" => &f.violator_name,
            "violation_description" => &f.violation_description,
            "violation_type" => &f.violation_type,
            "violation_category" => &f.violation_category,
            "risk_level" => &f.risk_level,
            "inspector_name" => &f.inspector_name,
            "elimination_date" => &f.elimination_date,
            "elimination_status" => &f.elimination_status,
            "photo_path" => return Some(self.photo_path.clone().unwrap_or_default()),
            _ => return None,
        };
        Some(value.clone())
    }
}

/// Form fields of a site check ("Проверка в СП"). `kpb_detected` is not
/// part of the input; the repository derives it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDraft {
    pub date: String,
    pub sp_name: String,
    pub responsible: String,
    pub po_name: String,
    pub object: String,
    pub works_count: i64,
    pub responsibility_zone: String,
    pub start_time: String,
    pub end_time: String,
    pub personnel_count: i64,
    pub checks_count: i64,
    pub violations_count: i64,
    pub violation_type: String,
    pub kpb_violation: String,
    pub act_issued: bool,
}

/// A persisted site check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: CheckDraft,
    pub kpb_detected: bool,
}

/// One site check joined with its photo paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckListing {
    #[serde(flatten)]
    pub record: CheckRecord,
    pub photo_paths: Vec<PathBuf>,
}

/// Optional narrowing for record listings.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub organization: Option<String>,
    pub date_range: Option<DateRange>,
}

impl RecordFilter {
    pub fn organization(mut self, name: impl Into<String>) -> Self {
        self.organization = Some(name.into());
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}
