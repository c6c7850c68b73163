//! Photo index: rows linking stored files to their site check.

use rusqlite::params;

use super::{Database, DatabaseError};

/// Indexes a stored file for a record. Returns the photo id.
pub fn insert(
    db: &Database,
    record_id: i64,
    file_path: &str,
    mime_type: Option<&str>,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO photos (record_id, file_path, mime_type) VALUES (?1, ?2, ?3)",
            params![record_id, file_path, mime_type],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// File paths indexed for a record, in insertion order.
pub fn paths_for(db: &Database, record_id: i64) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT file_path FROM photos WHERE record_id = ?1 ORDER BY id")?;
        let paths = stmt
            .query_map(params![record_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(paths)
    })
}

/// Removes every index row of a record. Returns the number removed.
pub fn delete_for_record(db: &Database, record_id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM photos WHERE record_id = ?1", params![record_id])?;
        Ok(removed)
    })
}
