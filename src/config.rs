use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite database file path.
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Days of logs to keep. 0 means retain forever (never drop partitions).
    pub keep_days: u32,
    /// Per-application overrides, keyed by application path.
    #[serde(default)]
    pub per_application: HashMap<String, u32>,
    /// Hour of day (0-23, UTC) to run scheduled maintenance.
    pub maintenance_hour: u32,
    /// How often the maintenance task checks the clock, in seconds.
    pub check_interval_secs: u64,
}

impl RetentionConfig {
    pub fn keep_time(&self) -> TimeDelta {
        TimeDelta::days(self.keep_days as i64)
    }

    pub fn per_application_keep(&self) -> HashMap<String, TimeDelta> {
        self.per_application
            .iter()
            .map(|(path, days)| (path.clone(), TimeDelta::days(*days as i64)))
            .collect()
    }
}

/// Load configuration from `logvault.toml` (optional) layered with
/// `LOGVAULT__*` environment overrides.
pub fn load_config() -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8350)?
        .set_default("server.log_level", "info")?
        .set_default("storage.database_path", "./data/logvault.db")?
        .set_default("retention.keep_days", 14)?
        .set_default("retention.maintenance_hour", 3)?
        .set_default("retention.check_interval_secs", 3600)?
        .add_source(config::File::with_name("logvault").required(false))
        .add_source(config::Environment::with_prefix("LOGVAULT").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.storage.database_path.is_empty() {
        anyhow::bail!("storage.database_path cannot be empty");
    }

    if cfg.retention.maintenance_hour > 23 {
        anyhow::bail!(
            "retention.maintenance_hour must be 0-23, got {}",
            cfg.retention.maintenance_hour
        );
    }

    if cfg.retention.check_interval_secs == 0 {
        anyhow::bail!("retention.check_interval_secs must be positive");
    }

    for path in cfg.retention.per_application.keys() {
        if path.is_empty() {
            anyhow::bail!("retention.per_application contains an empty application path");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8350,
                log_level: "info".to_string(),
            },
            storage: StorageConfig {
                database_path: "./data/logvault.db".to_string(),
            },
            retention: RetentionConfig {
                keep_days: 14,
                per_application: HashMap::new(),
                maintenance_hour: 3,
                check_interval_secs: 3600,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_rejects_bad_maintenance_hour() {
        let mut cfg = base_config();
        cfg.retention.maintenance_hour = 24;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_rejects_empty_database_path() {
        let mut cfg = base_config();
        cfg.storage.database_path = String::new();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_rejects_empty_override_path() {
        let mut cfg = base_config();
        cfg.retention.per_application.insert(String::new(), 7);
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_keep_time_conversion() {
        let mut cfg = base_config();
        cfg.retention.keep_days = 3;
        cfg.retention.per_application.insert("/apps/orders".to_string(), 0);

        assert_eq!(cfg.retention.keep_time(), TimeDelta::days(3));
        let per_app = cfg.retention.per_application_keep();
        assert_eq!(per_app["/apps/orders"], TimeDelta::zero());
    }
}
