mod users;

use std::fmt;

use serde::Serialize;

use crate::error::SchemaDriftError;

pub use users::{users_plan, LOGIN_COLUMNS};

/// A literal usable in the `DEFAULT` clause of `ADD COLUMN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DefaultValue {
    Integer(i64),
    Boolean(bool),
    #[allow(dead_code)]
    Text(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Integer(i) => write!(f, "{}", i),
            DefaultValue::Boolean(true) => write!(f, "TRUE"),
            DefaultValue::Boolean(false) => write!(f, "FALSE"),
            DefaultValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// One column that must exist on a table.
///
/// Specs are built at the call site and live for a single run. Nothing
/// about them is persisted: whether a spec "has run" is only ever answered
/// by looking at the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub table: String,
    pub name: String,
    pub sql_type: String,
    pub default: Option<DefaultValue>,
}

impl ColumnSpec {
    pub fn new(table: &str, name: &str, sql_type: &str) -> Self {
        ColumnSpec {
            table: table.to_owned(),
            name: name.to_owned(),
            sql_type: sql_type.to_owned(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Checks that the table and column names are plain identifiers and that
    /// the type is something that can be spliced into DDL. Both identifiers
    /// are quoted when rendered, but the type is not, so it gets the tighter
    /// character check.
    pub fn validate(&self) -> Result<(), SchemaDriftError> {
        if !is_valid_identifier(&self.table) {
            return Err(SchemaDriftError::InvalidSpec(format!(
                "'{}' is not a valid table name",
                self.table
            )));
        }

        if !is_valid_identifier(&self.name) {
            return Err(SchemaDriftError::InvalidSpec(format!(
                "'{}' is not a valid column name",
                self.name
            )));
        }

        let sql_type = self.sql_type.trim();
        if sql_type.is_empty() {
            return Err(SchemaDriftError::InvalidSpec(format!(
                "column '{}' has an empty type",
                self.name
            )));
        }

        if !sql_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '(' | ')' | ','))
        {
            return Err(SchemaDriftError::InvalidSpec(format!(
                "column '{}' has an unsupported type '{}'",
                self.name, self.sql_type
            )));
        }

        Ok(())
    }

    pub fn add_column_sql(&self) -> String {
        let mut sql = format!(
            "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {}",
            self.table,
            self.name,
            self.sql_type.trim()
        );
        if let Some(default) = &self.default {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        sql
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.table, self.name, self.sql_type)?;
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
