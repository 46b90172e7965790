use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaDriftError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError), // Converts rusqlite::Error automatically

    #[error("Unable to open database '{path}': {source}")]
    ConnectionError {
        path: String,
        #[source]
        source: RusqliteError,
    },

    #[error("Logging error: {0}")]
    LoggerError(#[from] flexi_logger::FlexiLoggerError),

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Invalid column spec: {0}")]
    InvalidSpec(String),

    #[error("Migration failed for {0} column(s)")]
    MigrationFailed(usize),

    #[error("Table '{table}' is missing required columns: {columns:?}")]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}
