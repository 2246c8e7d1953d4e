use chrono::{FixedOffset, Weekday};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::analytics::BucketPolicy;

const ENV_PREFIX: &str = "JOURNAL";

/// Furthest real-world UTC offsets, in minutes
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub store: StoreSettings,
    pub buckets: BucketSettings,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            buckets: BucketSettings::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Defaults, then the TOML file at `path` if it exists, then environment
    /// variables of the form `JOURNAL__<SECTION>__<KEY>`, e.g.
    /// `JOURNAL__BUCKETS__WEEK_START=monday`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_from(path, env_overrides())
    }

    fn load_from(path: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.store.database_url.trim().is_empty() {
            errors.push("store.database_url must not be empty".to_string());
        }

        if self.buckets.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            errors.push(format!(
                "buckets.utc_offset_minutes must be within +/-{}",
                MAX_OFFSET_MINUTES
            ));
        }
        if self.buckets.week_start.parse::<Weekday>().is_err() {
            errors.push(format!(
                "buckets.week_start '{}' is not a weekday",
                self.buckets.week_start
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn bucket_policy(&self) -> Result<BucketPolicy, Vec<String>> {
        self.validate()?;

        let utc_offset = FixedOffset::east_opt(self.buckets.utc_offset_minutes * 60)
            .ok_or_else(|| vec!["buckets.utc_offset_minutes out of range".to_string()])?;
        let week_start = self
            .buckets
            .week_start
            .parse::<Weekday>()
            .map_err(|_| vec!["buckets.week_start is not a weekday".to_string()])?;

        Ok(BucketPolicy {
            utc_offset,
            week_start,
        })
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub database_url: String,
    /// Optional JSON export read instead of the database
    pub trades_file: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./trade_journal.db".to_string(),
            trades_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSettings {
    /// Offset every exit time is shifted by before taking its calendar date
    pub utc_offset_minutes: i32,
    pub week_start: String,
}

impl Default for BucketSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            week_start: "sunday".to_string(),
        }
    }
}
