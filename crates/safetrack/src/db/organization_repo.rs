//! Organization repository: row access for the `organizations` table.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

/// Inserts a new organization. Fails with a UNIQUE violation for duplicates.
pub fn insert(db: &Database, name: &str) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("INSERT INTO organizations (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    })
}

/// Returns all organization names in name order.
pub fn list_names(db: &Database) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM organizations ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    })
}

/// Whether an organization with exactly this name exists.
pub fn exists(db: &Database, name: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT 1 FROM organizations WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    })
}

/// Renames an organization. Returns the number of rows changed.
pub fn rename(db: &Database, old_name: &str, new_name: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE organizations SET name = ?2 WHERE name = ?1",
            params![old_name, new_name],
        )?;
        Ok(changed)
    })
}

/// Deletes an organization by name. Returns the number of rows removed.
pub fn delete(db: &Database, name: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM organizations WHERE name = ?1", params![name])?;
        Ok(removed)
    })
}
