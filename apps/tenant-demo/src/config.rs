//! Layered application config: defaults, then an optional YAML file, then
//! `APP__*` environment variables, then CLI overrides.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tenant_db::{DbConfig, IsolationConfig, redact_dsn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to render configuration: {0}")]
    Render(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DbConfig,
    pub isolation: IsolationConfig,
    pub logging: LoggingConfig,
}

/// `logging:` section. `RUST_LOG` wins over `level` when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, e.g. `info` or `tenant_db=debug,info`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Values taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dsn: Option<String>,
    /// `-v` count: 1 info, 2 debug, 3 or more trace.
    pub verbose: u8,
}

impl AppConfig {
    /// Build the config from defaults, `path` (if any) and the environment.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingFile` if `path` is not a file and
    /// `ConfigError::Load` if a layer cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("APP__").split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(dsn) = &cli.dsn {
            self.database.dsn.clone_from(dsn);
        }
        let level = match cli.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };
        if let Some(level) = level {
            level.clone_into(&mut self.logging.level);
        }
    }

    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.dsn.trim().is_empty() {
            return Err(ConfigError::Invalid("database.dsn must not be empty".to_owned()));
        }
        if let (Some(min), Some(max)) = (self.database.min_conns, self.database.max_conns)
            && min > max
        {
            return Err(ConfigError::Invalid(format!(
                "database.min_conns ({min}) exceeds database.max_conns ({max})"
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Effective config as YAML, with the DSN password redacted.
    ///
    /// # Errors
    /// Returns `ConfigError::Render` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        shown.database.dsn = redact_dsn(&self.database.dsn);
        serde_saphyr::to_string(&shown).map_err(|e| ConfigError::Render(e.to_string()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;
    use tenant_db::secure::MissingTenantPolicy;

    #[test]
    fn defaults_without_file() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg.database.dsn, "sqlite::memory:");
        assert_eq!(cfg.isolation.missing_tenant, MissingTenantPolicy::PassThrough);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn yaml_layer_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  dsn: \"sqlite::memory:\"\n  sqlx_logging: true\nisolation:\n  missing_tenant: deny_all\nlogging:\n  json: true"
        )
        .unwrap();

        let cfg = AppConfig::load(Some(file.path())).unwrap();
        assert!(cfg.database.sqlx_logging);
        assert_eq!(cfg.isolation.missing_tenant, MissingTenantPolicy::DenyAll);
        assert!(cfg.logging.json);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::MissingFile(_))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "isolation:\n  missing_tenants: deny_all").unwrap();
        assert!(matches!(
            AppConfig::load(Some(file.path())),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn cli_overrides_win() {
        let mut cfg = AppConfig::default();
        cfg.apply_cli_overrides(&CliOverrides {
            dsn: Some("sqlite://./demo.db?mode=rwc".to_owned()),
            verbose: 2,
        });
        assert_eq!(cfg.database.dsn, "sqlite://./demo.db?mode=rwc");
        assert_eq!(cfg.logging.level, "debug");

        cfg.apply_cli_overrides(&CliOverrides::default());
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn validate_rejects_empty_dsn() {
        let mut cfg = AppConfig::default();
        cfg.database.dsn = String::new();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn yaml_output_redacts_password() {
        let mut cfg = AppConfig::default();
        cfg.database.dsn = "postgres://app:secret@db/tenants".to_owned();
        let yaml = cfg.to_yaml().unwrap();
        assert!(yaml.contains("database:"), "{yaml}");
        assert!(yaml.contains("app:***@db"), "{yaml}");
        assert!(!yaml.contains("secret"), "{yaml}");
    }
}
