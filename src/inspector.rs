use log::debug;
use rusqlite::Connection;

use crate::error::SchemaDriftError;

/// Read-only catalog queries against a live SQLite connection.
pub struct Inspector;

impl Inspector {
    pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, SchemaDriftError> {
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Live column names of `table` in physical (cid) order.
    ///
    /// `pragma_table_info` quietly returns no rows for an unknown table, so
    /// existence is checked against `sqlite_master` first.
    pub fn list_columns(conn: &Connection, table: &str) -> Result<Vec<String>, SchemaDriftError> {
        if !Self::table_exists(conn, table)? {
            return Err(SchemaDriftError::TableNotFound(table.to_owned()));
        }

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Columns in '{}': {:?}", table, columns);

        Ok(columns)
    }

    pub fn has_column(
        conn: &Connection,
        table: &str,
        column: &str,
    ) -> Result<bool, SchemaDriftError> {
        let columns = Self::list_columns(conn, table)?;
        Ok(columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
    }

    /// Members of `required` that `table` lacks, in checklist order.
    pub fn missing_columns(
        conn: &Connection,
        table: &str,
        required: &[&str],
    ) -> Result<Vec<String>, SchemaDriftError> {
        let columns = Self::list_columns(conn, table)?;

        Ok(required
            .iter()
            .filter(|r| !columns.iter().any(|c| c.eq_ignore_ascii_case(r)))
            .map(|r| r.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                failed_login_attempts INTEGER DEFAULT 0
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_list_columns_in_physical_order() {
        let conn = users_db();
        let columns = Inspector::list_columns(&conn, "users").unwrap();
        assert_eq!(columns, vec!["id", "username", "failed_login_attempts"]);
    }

    #[test]
    fn test_list_columns_missing_table() {
        let conn = users_db();
        match Inspector::list_columns(&conn, "accounts") {
            Err(SchemaDriftError::TableNotFound(table)) => assert_eq!(table, "accounts"),
            other => panic!("Expected TableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_table_exists_ignores_case() {
        let conn = users_db();
        assert!(Inspector::table_exists(&conn, "users").unwrap());
        assert!(Inspector::table_exists(&conn, "USERS").unwrap());
        assert!(!Inspector::table_exists(&conn, "sessions").unwrap());
    }

    #[test]
    fn test_table_exists_ignores_views() {
        let conn = users_db();
        conn.execute_batch("CREATE VIEW active_users AS SELECT id FROM users;")
            .unwrap();
        assert!(!Inspector::table_exists(&conn, "active_users").unwrap());
    }

    #[test]
    fn test_has_column() {
        let conn = users_db();
        assert!(Inspector::has_column(&conn, "users", "username").unwrap());
        assert!(Inspector::has_column(&conn, "users", "UserName").unwrap());
        assert!(!Inspector::has_column(&conn, "users", "email").unwrap());
    }

    #[test]
    fn test_missing_columns_reports_exactly_the_gap() {
        let conn = users_db();
        let missing = Inspector::missing_columns(
            &conn,
            "users",
            &["failed_login_attempts", "last_login", "is_locked"],
        )
        .unwrap();
        assert_eq!(missing, vec!["last_login", "is_locked"]);
    }

    #[test]
    fn test_missing_columns_none_missing() {
        let conn = users_db();
        let missing = Inspector::missing_columns(&conn, "users", &["id", "username"]).unwrap();
        assert!(missing.is_empty());
    }
}
