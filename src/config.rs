//! Runtime configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::classifier::ScoringStrategy;
use crate::environment::{get_env_flag, get_env_var_as_vec, get_env_var_or};
use crate::fetcher::sources::{default_sources, Source};
use crate::fetcher::FetchConfig;
use crate::TARGET_MONITOR;

pub const DEFAULT_DATABASE_PATH: &str = "defense_intelligence.db";
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_RECENT_ALERTS_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub monitor_interval: Duration,
    pub fetch: FetchConfig,
    pub scoring: ScoringStrategy,
    /// Directory for raw candidate JSON. When set, fetched candidates are
    /// archived there and new files dropped there are imported each cycle.
    pub data_dir: Option<PathBuf>,
    pub sources: Vec<Source>,
    pub recent_alerts_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            monitor_interval: Duration::from_secs(DEFAULT_MONITOR_INTERVAL_SECS),
            fetch: FetchConfig::default(),
            scoring: ScoringStrategy::default(),
            data_dir: None,
            sources: default_sources(),
            recent_alerts_limit: DEFAULT_RECENT_ALERTS_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let scoring = match std::env::var("SCORING_STRATEGY") {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                warn!(target: TARGET_MONITOR, "{}, using {}", err, defaults.scoring);
                defaults.scoring
            }),
            Err(_) => defaults.scoring,
        };

        let configured_sources: Vec<Source> = get_env_var_as_vec("SOURCES", ';')
            .iter()
            .filter_map(|entry| match entry.parse::<Source>() {
                Ok(source) => Some(source),
                Err(err) => {
                    warn!(target: TARGET_MONITOR, "Ignoring source '{}': {}", entry, err);
                    None
                }
            })
            .collect();
        let sources = if configured_sources.is_empty() {
            defaults.sources
        } else {
            configured_sources
        };

        let fetch = FetchConfig {
            max_workers: get_env_var_or("FETCH_WORKERS", defaults.fetch.max_workers).max(1),
            request_timeout: Duration::from_secs(get_env_var_or(
                "REQUEST_TIMEOUT_SECS",
                defaults.fetch.request_timeout.as_secs(),
            )),
            request_delay: Duration::from_millis(get_env_var_or(
                "REQUEST_DELAY_MS",
                defaults.fetch.request_delay.as_millis() as u64,
            )),
            max_links_per_section: get_env_var_or(
                "MAX_LINKS_PER_SECTION",
                defaults.fetch.max_links_per_section,
            ),
            min_content_length: get_env_var_or(
                "MIN_CONTENT_LENGTH",
                defaults.fetch.min_content_length,
            ),
            today_only: get_env_flag("TODAY_ONLY"),
        };

        Config {
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            monitor_interval: Duration::from_secs(get_env_var_or(
                "MONITOR_INTERVAL_SECS",
                DEFAULT_MONITOR_INTERVAL_SECS,
            )),
            fetch,
            scoring,
            data_dir: std::env::var("DATA_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            sources,
            recent_alerts_limit: get_env_var_or("RECENT_ALERTS_LIMIT", DEFAULT_RECENT_ALERTS_LIMIT),
        }
    }
}
