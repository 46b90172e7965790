use super::{ColumnSpec, DefaultValue};

/// Columns the login flow reads. A table missing any of these cannot
/// support account lockout.
pub const LOGIN_COLUMNS: [&str; 3] = ["failed_login_attempts", "last_login", "is_locked"];

/// The additive changes for the users table, in application order.
///
/// | column                  | type           | default |
/// |-------------------------|----------------|---------|
/// | `failed_login_attempts` | `INTEGER`      | `0`     |
/// | `last_login`            | `TIMESTAMP`    | NULL    |
/// | `is_locked`             | `BOOLEAN`      | `FALSE` |
/// | `email`                 | `VARCHAR(255)` | NULL    |
///
/// SQLite keeps declared type names as written, so `TIMESTAMP` and
/// `BOOLEAN` are recorded verbatim and `FALSE` is stored as 0.
pub fn users_plan(table: &str) -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(table, "failed_login_attempts", "INTEGER")
            .with_default(DefaultValue::Integer(0)),
        ColumnSpec::new(table, "last_login", "TIMESTAMP"),
        ColumnSpec::new(table, "is_locked", "BOOLEAN").with_default(DefaultValue::Boolean(false)),
        ColumnSpec::new(table, "email", "VARCHAR(255)"),
    ]
}
