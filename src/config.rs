use std::time::Duration;

use anyhow::Context;

pub const APP_NAME: &str = "incident-reports";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_REFRESH_SECS: u64 = 30;

pub fn default_log_filter() -> &'static str {
    "incident_reports=info"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub refresh_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let max_connections: u32 = match lookup("INCIDENT_REPORTS_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .context("INCIDENT_REPORTS_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let refresh_secs: u64 = match lookup("INCIDENT_REPORTS_REFRESH_SECS") {
            Some(value) => value
                .parse()
                .context("INCIDENT_REPORTS_REFRESH_SECS must be a number of seconds")?,
            None => DEFAULT_REFRESH_SECS,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: max_connections.max(1),
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = config(&[]).unwrap();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/reports"),
            ("INCIDENT_REPORTS_MAX_CONNECTIONS", "12"),
            ("INCIDENT_REPORTS_REFRESH_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/reports");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.refresh_interval, Duration::from_secs(1));
    }

    #[test]
    fn rejects_garbage_numbers() {
        assert!(config(&[("INCIDENT_REPORTS_MAX_CONNECTIONS", "lots")]).is_err());
    }

    #[test]
    fn app_name_is_stable() {
        assert_eq!(APP_NAME, "incident-reports");
    }
}
