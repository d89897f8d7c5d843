//! Layered settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, or `vitalwatch.toml` if it exists)
//! 3. Environment variables prefixed `VITALWATCH_`, with `__` between
//!    nested keys (e.g. `VITALWATCH_ALERTS__RESP_RATE_HIGH=28`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! alert_interval = "60s"
//! refresh = "1s"
//! merge_policy = "append"
//! window = 24
//! notifier = "bell"
//!
//! [alerts]
//! o2_critical = 50.0
//! resp_rate_high = 30.0
//! decompensation_pct = 70.0
//! los_days = 14.0
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::data::alerts::AlertThresholds;
use crate::data::duration::parse_interval;
use crate::ingest::MergePolicy;
use crate::notify::NotifierKind;

/// File read when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "vitalwatch.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "VITALWATCH";

/// Default number of points shown per sparkline.
pub const DEFAULT_WINDOW: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub alerts: AlertThresholds,
    /// Alert re-check period for the selected patient (e.g. "60s").
    pub alert_interval: String,
    /// How often the upload source is polled (e.g. "1s").
    pub refresh: String,
    pub merge_policy: MergePolicy,
    /// Points per sparkline in the vitals view.
    pub window: usize,
    pub notifier: NotifierKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alerts: AlertThresholds::default(),
            alert_interval: "60s".to_string(),
            refresh: "1s".to_string(),
            merge_policy: MergePolicy::default(),
            window: DEFAULT_WINDOW,
            notifier: NotifierKind::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check that interval strings parse.
    pub fn validate(&self) -> Result<()> {
        self.alert_interval()?;
        self.refresh_interval()?;
        Ok(())
    }

    pub fn alert_interval(&self) -> Result<Duration> {
        parse_interval(&self.alert_interval)
            .with_context(|| format!("Invalid alert_interval: {}", self.alert_interval))
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_interval(&self.refresh)
            .with_context(|| format!("Invalid refresh: {}", self.refresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.alerts, AlertThresholds::default());
        assert_eq!(s.alert_interval().unwrap(), Duration::from_secs(60));
        assert_eq!(s.refresh_interval().unwrap(), Duration::from_secs(1));
        assert_eq!(s.merge_policy, MergePolicy::Replace);
        assert_eq!(s.window, DEFAULT_WINDOW);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
alert_interval = "30s"
merge_policy = "append"

[alerts]
resp_rate_high = 28.0
"#
        )
        .unwrap();

        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.alert_interval().unwrap(), Duration::from_secs(30));
        assert_eq!(s.merge_policy, MergePolicy::Append);
        assert_eq!(s.alerts.resp_rate_high, 28.0);
        // Unset keys keep their defaults
        assert_eq!(s.alerts.o2_critical, 50.0);
    }

    #[test]
    fn explicit_file_must_exist() {
        assert!(Settings::load(Some(Path::new("/nonexistent/vitalwatch.toml"))).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window = 48\n\n[alerts]\nlos_days = 21.0").unwrap();

        std::env::set_var("VITALWATCH_WINDOW", "12");
        std::env::set_var("VITALWATCH_ALERTS__LOS_DAYS", "10");
        let loaded = Settings::load(Some(file.path()));
        std::env::remove_var("VITALWATCH_WINDOW");
        std::env::remove_var("VITALWATCH_ALERTS__LOS_DAYS");

        let s = loaded.unwrap();
        assert_eq!(s.window, 12);
        assert_eq!(s.alerts.los_days, 10.0);
        assert_eq!(s.alerts.resp_rate_high, 30.0);
    }

    #[test]
    fn bad_interval_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"refresh = "often""#).unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
