use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use rusqlite::Transaction;

use crate::applier::{apply_additive_columns, plan_additive_columns};
use crate::config::Config;
use crate::database::Database;
use crate::error::SchemaDriftError;
use crate::inspector::Inspector;
use crate::report::{ColumnStatus, MigrationReport};
use crate::schema::{is_valid_identifier, users_plan, ColumnSpec, LOGIN_COLUMNS};

#[derive(Parser)]
#[command(
    name = "schemadrift",
    version,
    about = "schemadrift: add missing login columns to the users table"
)]
pub struct Cli {
    /// SQLite database file (overrides the configured path)
    #[arg(long = "db", short = 'd', global = true)]
    pub db: Option<PathBuf>,

    /// Table to inspect and migrate (overrides the configured table)
    #[arg(long = "table", short = 't', global = true)]
    pub table: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Add any missing columns (default if no command specified)
    Migrate {
        /// Report what would change without altering the table
        #[arg(long = "dry-run", default_value_t = false)]
        dry_run: bool,

        /// Apply all columns in one transaction, rolled back if any column fails
        #[arg(long = "atomic", conflicts_with = "dry_run", default_value_t = false)]
        atomic: bool,

        /// Print the report as JSON instead of progress lines
        #[arg(long = "json", default_value_t = false)]
        json: bool,
    },

    /// List the table's live columns
    Columns,

    /// Compare the table's live columns against a required-columns checklist
    Check {
        /// Required column (repeatable or comma separated; default: the login columns)
        #[arg(long = "require", short = 'r', value_delimiter = ',')]
        require: Vec<String>,
    },
}

impl Command {
    fn default_migrate() -> Self {
        Command::Migrate {
            dry_run: false,
            atomic: false,
            json: false,
        }
    }
}

impl Cli {
    pub fn handle_command_line(config: &Config) -> Result<(), SchemaDriftError> {
        let args = Cli::parse();
        let stdout = io::stdout();
        args.run(config, &mut stdout.lock())
    }

    pub fn run(self, config: &Config, out: &mut impl Write) -> Result<(), SchemaDriftError> {
        let db_path = self
            .db
            .unwrap_or_else(|| PathBuf::from(&config.database.path));

        let table = self
            .table
            .unwrap_or_else(|| config.migration.table.clone());
        if !is_valid_identifier(&table) {
            return Err(SchemaDriftError::InvalidSpec(format!(
                "'{}' is not a valid table name",
                table
            )));
        }

        let mut db = Database::connect(&db_path)?;
        info!("Using table '{}' in {}", table, db.path().display());

        // Default to Migrate if no command specified
        match self.command.unwrap_or_else(Command::default_migrate) {
            Command::Migrate {
                dry_run,
                atomic,
                json,
            } => Self::migrate(&mut db, &table, dry_run, atomic, json, out),
            Command::Columns => Self::columns(&db, &table, out),
            Command::Check { require } => Self::check(&db, &table, &require, out),
        }
    }

    fn migrate(
        db: &mut Database,
        table: &str,
        dry_run: bool,
        atomic: bool,
        json: bool,
        out: &mut impl Write,
    ) -> Result<(), SchemaDriftError> {
        if !json {
            writeln!(out, "Starting migration...")?;
        }

        let report = Self::run_plan(db, &users_plan(table), dry_run, atomic, json, out)?;

        if report.has_failures() {
            return Err(SchemaDriftError::MigrationFailed(
                report.count(ColumnStatus::Failed),
            ));
        }

        info!("Migration of '{}' complete: {}", table, report.summary());
        Ok(())
    }

    /// Runs the applier over `specs` and prints the report. With `atomic`,
    /// every statement shares one transaction that is rolled back if any
    /// spec failed. The report is printed even when settling the
    /// transaction fails.
    fn run_plan(
        db: &mut Database,
        specs: &[ColumnSpec],
        dry_run: bool,
        atomic: bool,
        json: bool,
        out: &mut impl Write,
    ) -> Result<MigrationReport, SchemaDriftError> {
        let mut settled = Ok(());

        let report = if dry_run {
            plan_additive_columns(db.conn(), specs)
        } else if atomic {
            let tx = db.conn_mut().transaction()?;
            let mut report = apply_additive_columns(&tx, specs);
            settled = Self::finish_atomic(tx, &mut report);
            report
        } else {
            apply_additive_columns(db.conn(), specs)
        };

        Self::print_report(&report, dry_run, json, out)?;
        settled?;

        Ok(report)
    }

    /// Commits a clean atomic run and rolls back one with failures.
    fn finish_atomic(
        tx: Transaction<'_>,
        report: &mut MigrationReport,
    ) -> Result<(), SchemaDriftError> {
        if !report.has_failures() {
            tx.commit()?;
            return Ok(());
        }

        if let Err(e) = tx.rollback() {
            error!("Rollback of atomic migration failed: {}", e);
            return Err(e.into());
        }

        report.mark_rolled_back();
        warn!("Rolled back atomic migration: {}", report.summary());
        Ok(())
    }

    fn print_report(
        report: &MigrationReport,
        dry_run: bool,
        json: bool,
        out: &mut impl Write,
    ) -> Result<(), SchemaDriftError> {
        if json {
            writeln!(out, "{}", report.to_json()?)?;
            return Ok(());
        }

        for outcome in report.outcomes() {
            writeln!(out, "{}", outcome)?;
        }

        let label = if dry_run { "Dry run" } else { "Migration" };
        writeln!(out, "{} complete: {}", label, report.summary())?;
        if report.rolled_back() {
            writeln!(out, "No columns were kept: the transaction was rolled back.")?;
        }
        Ok(())
    }

    fn columns(db: &Database, table: &str, out: &mut impl Write) -> Result<(), SchemaDriftError> {
        for col in Inspector::list_columns(db.conn(), table)? {
            writeln!(out, "COL: {}", col)?;
        }
        Ok(())
    }

    fn check(
        db: &Database,
        table: &str,
        require: &[String],
        out: &mut impl Write,
    ) -> Result<(), SchemaDriftError> {
        let columns = Inspector::list_columns(db.conn(), table)?;
        writeln!(out, "Columns in '{}' table: {:?}", table, columns)?;

        let mut required: Vec<&str> = require
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect();
        if required.is_empty() {
            required = LOGIN_COLUMNS.to_vec();
        }

        let missing = Inspector::missing_columns(db.conn(), table, &required)?;
        if missing.is_empty() {
            writeln!(out, "All columns present.")?;
            return Ok(());
        }

        writeln!(out, "MISSING COLUMNS: {:?}", missing)?;
        Err(SchemaDriftError::MissingColumns {
            table: table.to_owned(),
            columns: missing,
        })
    }
}
