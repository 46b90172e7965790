use std::collections::HashSet;

use log::{debug, info, warn};
use rusqlite::{Connection, Error as RusqliteError};

use crate::inspector::Inspector;
use crate::report::{ColumnOutcome, MigrationReport};
use crate::schema::ColumnSpec;

/// Ensures every spec's column exists, adding the ones that don't.
///
/// Each spec is checked against the live catalog before any DDL is issued,
/// so a column that is already present is skipped without touching the
/// table. A "duplicate column name" error from SQLite is also treated as a
/// skip, which covers a column appearing between the check and the
/// `ALTER TABLE` as well as generated columns, which the catalog listing
/// does not show. Every other failure is recorded against its spec and the
/// run moves on to the next one. No error escapes: callers inspect the
/// returned report.
///
/// Accepts any connection, including a `rusqlite::Transaction` (through
/// deref). Without a transaction each statement is committed as it runs.
pub fn apply_additive_columns(conn: &Connection, specs: &[ColumnSpec]) -> MigrationReport {
    run(conn, specs, false)
}

/// Dry-run counterpart of [`apply_additive_columns`]. Columns that would be
/// added are reported as pending and no DDL is executed. A repeated spec is
/// skipped, as the real run would skip it once the first copy is added.
pub fn plan_additive_columns(conn: &Connection, specs: &[ColumnSpec]) -> MigrationReport {
    run(conn, specs, true)
}

fn run(conn: &Connection, specs: &[ColumnSpec], dry_run: bool) -> MigrationReport {
    let mut report = MigrationReport::new();
    // (table, column) pairs a dry run has already marked pending
    let mut planned: HashSet<(String, String)> = HashSet::new();

    for spec in specs {
        let outcome = apply_one(conn, spec, dry_run, &mut planned);
        match &outcome.detail {
            Some(detail) => debug!("{} -> {} ({})", spec, outcome.status, detail),
            None => debug!("{} -> {}", spec, outcome.status),
        }
        report.push(outcome);
    }

    info!(
        "Applied {} column spec(s){}: {}",
        report.outcomes().len(),
        if dry_run { " (dry run)" } else { "" },
        report.summary()
    );

    report
}

fn apply_one(
    conn: &Connection,
    spec: &ColumnSpec,
    dry_run: bool,
    planned: &mut HashSet<(String, String)>,
) -> ColumnOutcome {
    if let Err(e) = spec.validate() {
        warn!("Rejected column spec {}: {}", spec, e);
        return ColumnOutcome::failed(spec, e.to_string());
    }

    match Inspector::has_column(conn, &spec.table, &spec.name) {
        Ok(true) => {
            return ColumnOutcome::skipped(spec, format!("already exists in {}", spec.table));
        }
        Ok(false) => {}
        Err(e) => {
            warn!("Unable to inspect '{}' for {}: {}", spec.table, spec.name, e);
            return ColumnOutcome::failed(spec, e.to_string());
        }
    }

    if dry_run {
        let key = (
            spec.table.to_ascii_lowercase(),
            spec.name.to_ascii_lowercase(),
        );
        if !planned.insert(key) {
            return ColumnOutcome::skipped(spec, format!("already exists in {}", spec.table));
        }
        return ColumnOutcome::pending(spec);
    }

    let sql = spec.add_column_sql();
    match conn.execute(&sql, []) {
        Ok(_) => {
            info!("Executed: {}", sql);
            ColumnOutcome::added(spec)
        }
        Err(e) if is_duplicate_column(&e) => {
            info!("Column {}.{} already exists: {}", spec.table, spec.name, e);
            ColumnOutcome::skipped(spec, format!("already exists in {}", spec.table))
        }
        Err(e) => {
            warn!("Failed: {}: {}", sql, e);
            ColumnOutcome::failed(spec, e.to_string())
        }
    }
}

/// True when `err` is SQLite's "duplicate column name" rejection of
/// `ALTER TABLE ... ADD COLUMN`.
pub fn is_duplicate_column(err: &RusqliteError) -> bool {
    match err {
        RusqliteError::SqliteFailure(_, Some(msg)) => msg.starts_with("duplicate column name"),
        _ => false,
    }
}
