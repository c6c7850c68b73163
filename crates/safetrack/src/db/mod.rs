//! Database module for persistent storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::types::ToSql;
use rusqlite::Connection;

use crate::records::RecordFilter;

pub mod check_repo;
pub mod error;
pub mod inspection_repo;
pub mod migrations;
pub mod organization_repo;
pub mod photo_repo;

pub use error::DatabaseError;

/// SQL expression turning a `DD.MM.YYYY` column into a sortable `YYYYMMDD`
/// key. Range filters compare on this key, never on the display string.
pub(crate) fn calendar_key(column: &str) -> String {
    format!(
        "(substr({col}, 7, 4) || substr({col}, 4, 2) || substr({col}, 1, 2))",
        col = column
    )
}

/// Builds a parameterized `WHERE` clause for a record filter.
pub(crate) fn filter_clause(
    filter: &RecordFilter,
    organization_column: &str,
    date_column: &str,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(ref organization) = filter.organization {
        conditions.push(format!(
            "{} = ?{}",
            organization_column,
            param_values.len() + 1
        ));
        param_values.push(Box::new(organization.clone()));
    }
    if let Some(ref range) = filter.date_range {
        let (start, end) = range.calendar_bounds();
        conditions.push(format!(
            "{} BETWEEN ?{} AND ?{}",
            calendar_key(date_column),
            param_values.len() + 1,
            param_values.len() + 2
        ));
        param_values.push(Box::new(start));
        param_values.push(Box::new(end));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, param_values)
}

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). All access is serialized through
/// a `Mutex`, which is fine for SQLite (which serializes writes anyway).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the database path inside a data directory.
pub fn database_path(data_directory: &Path) -> PathBuf {
    data_directory.join("safetrack.db")
}
