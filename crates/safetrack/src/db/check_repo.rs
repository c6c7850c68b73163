//! Site check repository: CRUD operations for the `site_checks` table.

use std::path::PathBuf;

use rusqlite::{params, OptionalExtension, Row};

use super::{calendar_key, filter_clause, Database, DatabaseError};
use crate::records::{CheckDraft, CheckListing, CheckRecord, DateRange, RecordFilter};

fn from_row(row: &Row<'_>) -> Result<CheckRecord, rusqlite::Error> {
    Ok(CheckRecord {
        id: row.get("id")?,
        fields: CheckDraft {
            date: row.get("date")?,
            sp_name: row.get("sp_name")?,
            responsible: row.get("responsible")?,
            po_name: row.get("po_name")?,
            object: row.get("object")?,
            works_count: row.get("works_count")?,
            responsibility_zone: row.get("responsibility_zone")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            personnel_count: row.get("personnel_count")?,
            checks_count: row.get("checks_count")?,
            violations_count: row.get("violations_count")?,
            violation_type: row.get("violation_type")?,
            kpb_violation: row.get("kpb_violation")?,
            act_issued: row.get("act_issued")?,
        },
        kpb_detected: row.get("kpb_detected")?,
    })
}

/// Inserts a new check row and returns its id.
pub fn insert(db: &Database, draft: &CheckDraft, kpb_detected: bool) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO site_checks (date, sp_name, responsible, po_name, object,
             works_count, responsibility_zone, start_time, end_time, personnel_count,
             checks_count, violations_count, violation_type, kpb_violation,
             kpb_detected, act_issued)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                draft.date,
                draft.sp_name,
                draft.responsible,
                draft.po_name,
                draft.object,
                draft.works_count,
                draft.responsibility_zone,
                draft.start_time,
                draft.end_time,
                draft.personnel_count,
                draft.checks_count,
                draft.violations_count,
                draft.violation_type,
                draft.kpb_violation,
                kpb_detected,
                draft.act_issued,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Overwrites all columns of a check. Returns the number of rows changed.
pub fn update(
    db: &Database,
    id: i64,
    draft: &CheckDraft,
    kpb_detected: bool,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE site_checks SET date=?2, sp_name=?3, responsible=?4, po_name=?5,
             object=?6, works_count=?7, responsibility_zone=?8, start_time=?9,
             end_time=?10, personnel_count=?11, checks_count=?12, violations_count=?13,
             violation_type=?14, kpb_violation=?15, kpb_detected=?16, act_issued=?17
             WHERE id=?1",
            params![
                id,
                draft.date,
                draft.sp_name,
                draft.responsible,
                draft.po_name,
                draft.object,
                draft.works_count,
                draft.responsibility_zone,
                draft.start_time,
                draft.end_time,
                draft.personnel_count,
                draft.checks_count,
                draft.violations_count,
                draft.violation_type,
                draft.kpb_violation,
                kpb_detected,
                draft.act_issued,
            ],
        )?;
        Ok(changed)
    })
}

/// Finds a check by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<CheckRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let record = conn
            .query_row(
                "SELECT * FROM site_checks WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(record)
    })
}

/// Whether a check with this id exists.
pub fn exists(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT 1 FROM site_checks WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    })
}

/// Lists checks joined with their photo paths: one entry per check, photos
/// in insertion order, an empty list when a check has none.
pub fn query_with_photos(
    db: &Database,
    filter: &RecordFilter,
) -> Result<Vec<CheckListing>, DatabaseError> {
    db.with_conn(|conn| {
        let (where_clause, param_values) = filter_clause(filter, "c.po_name", "c.date");
        let sql = format!(
            "SELECT c.*, p.file_path AS photo_path
             FROM site_checks c
             LEFT JOIN photos p ON p.record_id = c.id
             {}
             ORDER BY c.id, p.id",
            where_clause
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let joined = stmt
            .query_map(params_ref.as_slice(), |row| {
                let photo: Option<String> = row.get("photo_path")?;
                Ok((from_row(row)?, photo))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut listings: Vec<CheckListing> = Vec::new();
        for (record, photo) in joined {
            let same_record = listings
                .last()
                .is_some_and(|last| last.record.id == record.id);
            if !same_record {
                listings.push(CheckListing {
                    record,
                    photo_paths: Vec::new(),
                });
            }
            if let (Some(path), Some(listing)) = (photo, listings.last_mut()) {
                listing.photo_paths.push(PathBuf::from(path));
            }
        }
        Ok(listings)
    })
}

/// Returns `(date, violations_count)` for one organization inside a calendar
/// range, ordered by calendar date then id.
pub fn violation_points(
    db: &Database,
    organization: &str,
    range: &DateRange,
) -> Result<Vec<(String, i64)>, DatabaseError> {
    db.with_conn(|conn| {
        let (start, end) = range.calendar_bounds();
        let key = calendar_key("date");
        let sql = format!(
            "SELECT date, violations_count FROM site_checks
             WHERE po_name = ?1 AND {key} BETWEEN ?2 AND ?3
             ORDER BY {key}, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let points = stmt
            .query_map(params![organization, start, end], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    })
}

/// Deletes a check row. Photos must already be gone; the foreign key on
/// `photos.record_id` rejects the delete otherwise.
pub fn delete(db: &Database, id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM site_checks WHERE id = ?1", params![id])?;
        Ok(removed)
    })
}
