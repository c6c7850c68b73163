//! Inspection repository: CRUD operations for the `inspections` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{filter_clause, Database, DatabaseError};
use crate::records::{InspectionDraft, InspectionRecord, RecordFilter};

fn from_row(row: &Row<'_>) -> Result<InspectionRecord, rusqlite::Error> {
    Ok(InspectionRecord {
        id: row.get("id")?,
        fields: InspectionDraft {
            inspection_date: row.get("inspection_date")?,
            object: row.get("object")?,
            section: row.get("section")?,
            organization: row.get("organization")?,
            violator_name: row.get("violator_name")?,
            violation_description: row.get("violation_description")?,
            violation_type: row.get("violation_type")?,
            violation_category: row.get("violation_category")?,
            risk_level: row.get("risk_level")?,
            inspector_name: row.get("inspector_name")?,
            elimination_date: row.get("elimination_date")?,
            elimination_status: row.get("elimination_status")?,
        },
        photo_path: row.get("photo_path")?,
    })
}

/// Inserts a new inspection row and returns its id.
pub fn insert(
    db: &Database,
    draft: &InspectionDraft,
    photo_path: Option<&str>,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO inspections (inspection_date, object, section, organization,
             violator_name, violation_description, violation_type, violation_category,
             risk_level, inspector_name, elimination_date, elimination_status, photo_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                draft.inspection_date,
                draft.object,
                draft.section,
                draft.organization,
                draft.violator_name,
                draft.violation_description,
                draft.violation_type,
                draft.violation_category,
                draft.risk_level,
                draft.inspector_name,
                draft.elimination_date,
                draft.elimination_status,
                photo_path,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Overwrites every form field of an inspection. The photo path is left
/// alone. Returns the number of rows changed.
pub fn update(db: &Database, id: i64, draft: &InspectionDraft) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE inspections SET inspection_date=?2, object=?3, section=?4,
             organization=?5, violator_name=?6, violation_description=?7,
             violation_type=?8, violation_category=?9, risk_level=?10,
             inspector_name=?11, elimination_date=?12, elimination_status=?13
             WHERE id=?1",
            params![
                id,
                draft.inspection_date,
                draft.object,
                draft.section,
                draft.organization,
                draft.violator_name,
                draft.violation_description,
                draft.violation_type,
                draft.violation_category,
                draft.risk_level,
                draft.inspector_name,
                draft.elimination_date,
                draft.elimination_status,
            ],
        )?;
        Ok(changed)
    })
}

/// Sets (or clears) the photo path of an inspection.
pub fn set_photo_path(
    db: &Database,
    id: i64,
    photo_path: Option<&str>,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE inspections SET photo_path = ?2 WHERE id = ?1",
            params![id, photo_path],
        )?;
        Ok(changed)
    })
}

/// Finds an inspection by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<InspectionRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let record = conn
            .query_row(
                "SELECT * FROM inspections WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(record)
    })
}

/// Lists inspections matching the filter, ordered by id.
pub fn query(db: &Database, filter: &RecordFilter) -> Result<Vec<InspectionRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let (where_clause, param_values) = filter_clause(filter, "organization", "inspection_date");
        let sql = format!("SELECT * FROM inspections {} ORDER BY id", where_clause);

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes an inspection row. Returns the number of rows removed.
pub fn delete(db: &Database, id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM inspections WHERE id = ?1", params![id])?;
        Ok(removed)
    })
}
