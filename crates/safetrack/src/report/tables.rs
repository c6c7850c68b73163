//! Whole-table spreadsheet exports, one row per record, headers named after
//! the stored columns.

use super::xlsx::{Cell, Workbook};
use crate::error::ReportError;
use crate::records::{CheckListing, InspectionRecord};

pub const INSPECTIONS_SHEET: &str = "Проверки ОТиПБ";
pub const CHECKS_SHEET: &str = "Проверки в СП";

pub const INSPECTION_COLUMNS: [&str; 14] = [
    "id",
    "inspection_date",
    "object",
    "section",
    "organization",
    "violator_name",
    "violation_description",
    "violation_type",
    "violation_category",
    "risk_level",
    "inspector_name",
    "elimination_date",
    "elimination_status",
    "photo_path",
];

pub const CHECK_COLUMNS: [&str; 19] = [
    "id",
    "date",
    "sp_name",
    "responsible",
    "po_name",
    "object",
    "works_count",
    "responsibility_zone",
    "start_time",
    "end_time",
    "personnel_count",
    "checks_count",
    "violations_count",
    "violation_type",
    "kpb_violation",
    "kpb_detected",
    "act_issued",
    "photo_count",
    "photo_paths",
];

pub fn export_inspections(records: &[InspectionRecord]) -> Result<Vec<u8>, ReportError> {
    let rows: Vec<Vec<Cell>> = records
        .iter()
        .map(|record| {
            INSPECTION_COLUMNS
                .iter()
                .map(|column| match *column {
                    "id" => Cell::from(record.id),
                    name => Cell::from(record.field_value(name).unwrap_or_default()),
                })
                .collect::<Vec<Cell>>()
        })
        .collect();

    let mut workbook = Workbook::new();
    workbook.add_data_sheet(INSPECTIONS_SHEET, &INSPECTION_COLUMNS, rows);
    workbook.to_bytes()
}

pub fn export_checks(listings: &[CheckListing]) -> Result<Vec<u8>, ReportError> {
    let rows: Vec<Vec<Cell>> = listings
        .iter()
        .map(|listing| {
            let r = &listing.record;
            let f = &r.fields;
            let photos = listing
                .photo_paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("; ");
            vec![
                Cell::from(r.id),
                Cell::from(f.date.as_str()),
                Cell::from(f.sp_name.as_str()),
                Cell::from(f.responsible.as_str()),
                Cell::from(f.po_name.as_str()),
                Cell::from(f.object.as_str()),
                Cell::from(f.works_count),
                Cell::from(f.responsibility_zone.as_str()),
                Cell::from(f.start_time.as_str()),
                Cell::from(f.end_time.as_str()),
                Cell::from(f.personnel_count),
                Cell::from(f.checks_count),
                Cell::from(f.violations_count),
                Cell::from(f.violation_type.as_str()),
                Cell::from(f.kpb_violation.as_str()),
                Cell::from(r.kpb_detected),
                Cell::from(f.act_issued),
                Cell::from(listing.photo_paths.len() as i64),
                Cell::from(photos),
            ]
        })
        .collect();

    let mut workbook = Workbook::new();
    workbook.add_data_sheet(CHECKS_SHEET, &CHECK_COLUMNS, rows);
    workbook.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CheckDraft, CheckRecord, InspectionDraft};
    use std::io::{Cursor, Read};
    use std::path::PathBuf;

    fn first_sheet(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_export_inspections() {
        let records = vec![InspectionRecord {
            id: 3,
            fields: InspectionDraft {
                inspection_date: "01.03.2024".to_string(),
                organization: "ООО Монтаж".to_string(),
                ..Default::default()
            },
            photo_path: None,
        }];
        let xml = first_sheet(&export_inspections(&records).unwrap());

        assert!(xml.contains("elimination_status"));
        assert!(xml.contains(r#"<c r="A2"><v>3</v></c>"#));
        assert!(xml.contains("ООО Монтаж"));
    }

    #[test]
    fn test_export_checks_includes_photo_count() {
        let listings = vec![CheckListing {
            record: CheckRecord {
                id: 1,
                fields: CheckDraft {
                    po_name: "ООО Монтаж".to_string(),
                    act_issued: true,
                    ..Default::default()
                },
                kpb_detected: true,
            },
            photo_paths: vec![PathBuf::from("u/1/a.jpg"), PathBuf::from("u/1/b.jpg")],
        }];
        let xml = first_sheet(&export_checks(&listings).unwrap());

        assert!(xml.contains("photo_count"));
        assert!(xml.contains(r#"<c r="R2"><v>2</v></c>"#));
        assert!(xml.contains("u/1/a.jpg; u/1/b.jpg"));
    }

    #[test]
    fn test_export_empty_has_header_only() {
        let xml = first_sheet(&export_checks(&[]).unwrap());
        assert!(xml.contains("kpb_detected"));
        assert!(!xml.contains(r#"<row r="2">"#));
    }
}
