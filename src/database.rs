use log::info;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::error::SchemaDriftError;

/// An open connection to the application's SQLite database.
///
/// The connection is released when the `Database` is dropped.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens an existing database file read-write. The file is never created.
    pub fn connect(db_path: &Path) -> Result<Self, SchemaDriftError> {
        let connection_error = |source: rusqlite::Error| SchemaDriftError::ConnectionError {
            path: db_path.display().to_string(),
            source,
        };

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connection_error)?;

        // Opening is lazy - touch the schema so a non-database file fails here
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(connection_error)?;

        info!("Database opened at: {}", db_path.display());

        Ok(Self {
            conn,
            path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::Inspector;
    use tempfile::TempDir;

    #[test]
    fn test_connect_existing_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY);")
                .unwrap();
        }

        let db = Database::connect(&db_path).unwrap();
        assert_eq!(db.path(), db_path.as_path());
        assert_eq!(
            Inspector::list_columns(db.conn(), "users").unwrap(),
            vec!["id"]
        );
    }

    #[test]
    fn test_connect_missing_file_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("missing.db");

        match Database::connect(&db_path) {
            Err(SchemaDriftError::ConnectionError { path, .. }) => {
                assert!(path.ends_with("missing.db"));
            }
            Err(other) => panic!("Expected ConnectionError, got {:?}", other),
            Ok(_) => panic!("Expected ConnectionError, got a connection"),
        }
        assert!(!db_path.exists(), "connect must not create the file");
    }

    #[test]
    fn test_connect_rejects_non_database_file() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("notes.db");
        std::fs::write(&db_path, "this is not a sqlite database, just some text padding it out")
            .unwrap();

        assert!(matches!(
            Database::connect(&db_path),
            Err(SchemaDriftError::ConnectionError { .. })
        ));
    }

    #[test]
    fn test_writes_persist_after_drop() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        Connection::open(&db_path)
            .unwrap()
            .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY);")
            .unwrap();

        {
            let db = Database::connect(&db_path).unwrap();
            db.conn()
                .execute("ALTER TABLE users ADD COLUMN email TEXT", [])
                .unwrap();
        }

        let db = Database::connect(&db_path).unwrap();
        assert!(Inspector::has_column(db.conn(), "users", "email").unwrap());
    }
}
