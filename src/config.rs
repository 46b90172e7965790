use std::fs;
use std::path::Path;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::schema::is_valid_identifier;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub schemadrift: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const SCHEMADRIFT_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            schemadrift: Self::SCHEMADRIFT_LEVEL.to_string(),
        }
    }

    /// Level spec handed to flexi_logger
    pub fn log_spec(&self) -> String {
        format!("schemadrift={}", self.schemadrift)
    }

    fn ensure_valid(&mut self) {
        let str_original = self.schemadrift.clone();
        self.schemadrift = self.schemadrift.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.schemadrift.as_str()) {
            eprintln!(
                "Config error: schemadrift log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::SCHEMADRIFT_LEVEL
            );
            self.schemadrift = Self::SCHEMADRIFT_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    const DB_PATH: &str = "app.db";

    fn default() -> Self {
        DatabaseConfig {
            path: Self::DB_PATH.to_owned(),
        }
    }

    fn ensure_valid(&mut self) {
        self.path = self.path.trim().to_owned();
        if self.path.is_empty() {
            eprintln!(
                "Config error: database path is empty - using default of '{}'",
                Self::DB_PATH
            );
            self.path = Self::DB_PATH.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MigrationConfig {
    pub table: String,
}

impl MigrationConfig {
    const TABLE: &str = "users";

    fn default() -> Self {
        MigrationConfig {
            table: Self::TABLE.to_owned(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.table.clone();
        self.table = self.table.trim().to_owned();
        if !is_valid_identifier(&self.table) {
            eprintln!(
                "Config error: table name '{}' is invalid - using default of '{}'",
                str_original,
                Self::TABLE
            );
            self.table = Self::TABLE.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub migration: MigrationConfig,
    pub logging: LoggingConfig,
}

impl Config {
    const ENV_PREFIX: &str = "SCHEMADRIFT_";

    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            migration: MigrationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Loads the configuration from a TOML file located in the app's data directory.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        // If the config file doesn't exist, write the default configuration to disk.
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!(
                        "Failed to create configuration directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
            if let Ok(toml_string) = toml::to_string_pretty(&Self::default()) {
                if let Err(e) = fs::write(&config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            } else {
                eprintln!("Failed to serialize default config.");
            }
        }

        Self::load_from_path(&config_path)
    }

    /// Defaults, then the TOML file (if it exists), then `SCHEMADRIFT_*`
    /// environment variables. Nested keys use `__`, e.g.
    /// `SCHEMADRIFT_DATABASE__PATH`.
    pub fn load_from_path(config_path: &Path) -> Self {
        let default_config = Self::default();

        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        // Attempt to extract the configuration; on error, report it and fall back to defaults.
        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn ensure_valid(&mut self) {
        self.database.ensure_valid();
        self.migration.ensure_valid();
        self.logging.ensure_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load_from_path(Path::new("config.toml"));
            assert_eq!(config, Config::default());
            assert_eq!(config.database.path, "app.db");
            assert_eq!(config.migration.table, "users");
            assert_eq!(config.logging.log_spec(), "schemadrift=info");
            Ok(())
        });
    }

    #[test]
    fn test_toml_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [database]
                path = "/var/lib/app/prod.db"

                [migration]
                table = "accounts"
                "#,
            )?;

            let config = Config::load_from_path(Path::new("config.toml"));
            assert_eq!(config.database.path, "/var/lib/app/prod.db");
            assert_eq!(config.migration.table, "accounts");
            assert_eq!(config.logging.schemadrift, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [database]
                path = "from_file.db"
                "#,
            )?;
            jail.set_env("SCHEMADRIFT_DATABASE__PATH", "from_env.db");
            jail.set_env("SCHEMADRIFT_LOGGING__SCHEMADRIFT", "debug");

            let config = Config::load_from_path(Path::new("config.toml"));
            assert_eq!(config.database.path, "from_env.db");
            assert_eq!(config.logging.schemadrift, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [database]
                path = "   "

                [migration]
                table = "users; DROP TABLE users"

                [logging]
                schemadrift = " LOUD "
                "#,
            )?;

            let config = Config::load_from_path(Path::new("config.toml"));
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_log_level_is_normalized() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[logging]\nschemadrift = \" WARN \"\n")?;

            let config = Config::load_from_path(Path::new("config.toml"));
            assert_eq!(config.logging.schemadrift, "warn");
            Ok(())
        });
    }

    #[test]
    fn test_unparseable_file_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[database\npath = ")?;

            let config = Config::load_from_path(Path::new("config.toml"));
            assert_eq!(config, Config::default());
            Ok(())
        });
    }
}
