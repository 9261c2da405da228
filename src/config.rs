use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use dotenvy::dotenv;

use crate::scrapers::browser::{DriverKind, SessionSettings};
use crate::scrapers::columns::COLUMNS_URL;
use crate::scrapers::plan_table::PlanCodeTable;
use crate::storage::MAX_RETENTION_DAYS;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub session: SessionSettings,
    pub retention_days: i64,
    pub plan_table: Option<PathBuf>,
    pub columns_url: String,
    pub addr: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let driver = var("LEASEWATCH_DRIVER", "chrome")
            .parse::<DriverKind>()
            .map_err(|e| anyhow!(e))
            .context("LEASEWATCH_DRIVER must be chrome or http")?;

        let retention_days: i64 = var("LEASEWATCH_RETENTION_DAYS", "90")
            .parse()
            .context("LEASEWATCH_RETENTION_DAYS must be a number of days")?;
        ensure!(
            (1..=MAX_RETENTION_DAYS).contains(&retention_days),
            "LEASEWATCH_RETENTION_DAYS must be between 1 and {}, got {}",
            MAX_RETENTION_DAYS,
            retention_days
        );

        Ok(Self {
            data_dir: PathBuf::from(var("LEASEWATCH_DATA_DIR", "data")),
            session: SessionSettings {
                driver,
                headless: var("LEASEWATCH_HEADLESS", "true")
                    .parse()
                    .context("LEASEWATCH_HEADLESS must be true or false")?,
                nav_timeout: Duration::from_secs(
                    var("LEASEWATCH_NAV_TIMEOUT_SECS", "30")
                        .parse()
                        .context("LEASEWATCH_NAV_TIMEOUT_SECS must be a number of seconds")?,
                ),
                settle_delay: Duration::from_secs(
                    var("LEASEWATCH_SETTLE_SECS", "3")
                        .parse()
                        .context("LEASEWATCH_SETTLE_SECS must be a number of seconds")?,
                ),
            },
            retention_days,
            plan_table: lookup("LEASEWATCH_PLAN_TABLE").map(PathBuf::from),
            columns_url: var("LEASEWATCH_COLUMNS_URL", COLUMNS_URL),
            addr: var("LEASEWATCH_ADDR", "127.0.0.1:8000")
                .parse()
                .context("LEASEWATCH_ADDR must be a socket address like 127.0.0.1:8000")?,
        })
    }

    /// The configured plan-code table, or the built-in one
    pub fn load_plan_table(&self) -> Result<Arc<PlanCodeTable>> {
        let table = match &self.plan_table {
            Some(path) => PlanCodeTable::from_json_file(path)?,
            None => PlanCodeTable::default(),
        };
        Ok(Arc::new(table))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.session.driver, DriverKind::Chrome);
        assert!(config.session.headless);
        assert_eq!(config.session.nav_timeout, Duration::from_secs(30));
        assert_eq!(config.session.settle_delay, Duration::from_secs(3));
        assert_eq!(config.retention_days, 90);
        assert_eq!(config.plan_table, None);
        assert_eq!(config.columns_url, COLUMNS_URL);
        assert_eq!(config.addr, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.load_plan_table().unwrap().len(), 5);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("LEASEWATCH_DRIVER", "http"),
            ("LEASEWATCH_HEADLESS", "false"),
            ("LEASEWATCH_RETENTION_DAYS", "14"),
            ("LEASEWATCH_ADDR", "0.0.0.0:9000"),
        ]))
        .unwrap();
        assert_eq!(config.session.driver, DriverKind::Http);
        assert!(!config.session.headless);
        assert_eq!(config.retention_days, 14);
        assert_eq!(config.addr.port(), 9000);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("LEASEWATCH_NAV_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("LEASEWATCH_NAV_TIMEOUT_SECS"));

        assert!(Config::from_lookup(lookup(&[("LEASEWATCH_DRIVER", "firefox")])).is_err());
    }

    #[test]
    fn retention_must_be_a_sane_window() {
        for days in ["0", "-7", "1000000000", "36501"] {
            let err = Config::from_lookup(lookup(&[("LEASEWATCH_RETENTION_DAYS", days)])).unwrap_err();
            assert!(err.to_string().contains("between 1 and 36500"), "{}: {}", days, err);
        }

        let config = Config::from_lookup(lookup(&[("LEASEWATCH_RETENTION_DAYS", "36500")])).unwrap();
        assert_eq!(config.retention_days, MAX_RETENTION_DAYS);
    }
}
