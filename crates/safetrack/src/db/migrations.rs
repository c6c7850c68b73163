//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order. `ADD COLUMN` migrations are skipped when the
//! column already exists, so databases created by older builds that
//! added the column by hand still upgrade cleanly.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN, skipped when the column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_organizations_table",
        sql: include_str!("migrations/sql/001_create_organizations.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_inspections_table",
        sql: include_str!("migrations/sql/002_create_inspections.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_site_checks_table",
        sql: include_str!("migrations/sql/003_create_site_checks.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "create_photos_table",
        sql: include_str!("migrations/sql/004_create_photos.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 5,
        description: "add_mime_type_to_photos",
        sql: include_str!("migrations/sql/005_add_photo_mime_type.sql"),
        kind: MigrationKind::AddColumn {
            table: "photos",
            column: "mime_type",
        },
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let should_run = match &migration.kind {
            MigrationKind::Standard => true,
            MigrationKind::AddColumn { table, column } => !column_exists(conn, table, column)?,
        };

        if should_run {
            conn.execute_batch(migration.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::info!(
                "Skipping migration v{} (column already present)",
                migration.version
            );
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

/// Checks whether a column exists on a table using `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    // Identifiers cannot be bound as parameters.
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = fresh();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = fresh();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_column_exists_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE test_tbl (id TEXT, name TEXT);")
            .unwrap();

        assert!(column_exists(&conn, "test_tbl", "id").unwrap());
        assert!(!column_exists(&conn, "test_tbl", "missing").unwrap());
    }

    #[test]
    fn test_column_exists_rejects_bad_identifier() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(column_exists(&conn, "photos; DROP TABLE x", "id").is_err());
    }

    #[test]
    fn test_photos_table_has_mime_type() {
        let conn = fresh();
        run_all(&conn).unwrap();

        assert!(column_exists(&conn, "photos", "mime_type").unwrap());
    }

    #[test]
    fn test_add_column_skipped_when_present() {
        let conn = fresh();
        // Simulate a database that already carries the column before v5 ran.
        for migration in &MIGRATIONS[..4] {
            conn.execute_batch(migration.sql).unwrap();
        }
        conn.execute_batch("ALTER TABLE photos ADD COLUMN mime_type TEXT;")
            .unwrap();

        run_all(&conn).unwrap();
        assert!(column_exists(&conn, "photos", "mime_type").unwrap());
    }

    #[test]
    fn test_photos_require_existing_check() {
        let conn = fresh();
        run_all(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO photos (record_id, file_path) VALUES (42, '/tmp/x.jpg')",
            [],
        );
        assert!(result.is_err());
    }
}
