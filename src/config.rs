// Runtime configuration
//
// Everything comes from the environment with a default. A bad value logs a
// warning and falls back to the default instead of aborting startup.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FETCH_LATENCY_MS: u64 = 500;
pub const DEFAULT_SEARCH_LATENCY_MS: u64 = 300;
pub const DEFAULT_COMPARE_MAX: usize = 3;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub fetch_latency: Duration,
    pub search_latency: Duration,
    pub compare_max: usize,
    /// Backoff before the single retry of a failed load; `None` disables retry
    pub retry_backoff: Option<Duration>,
    pub log_filter: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("CAMPUS_PORT", DEFAULT_PORT),
            fetch_latency: Duration::from_millis(try_load(
                "CAMPUS_FETCH_LATENCY_MS",
                DEFAULT_FETCH_LATENCY_MS,
            )),
            search_latency: Duration::from_millis(try_load(
                "CAMPUS_SEARCH_LATENCY_MS",
                DEFAULT_SEARCH_LATENCY_MS,
            )),
            compare_max: try_load::<usize>("CAMPUS_COMPARE_MAX", DEFAULT_COMPARE_MAX).max(1),
            retry_backoff: try_load_optional::<u64>("CAMPUS_RETRY_BACKOFF_MS")
                .map(Duration::from_millis),
            log_filter: log_filter(),
        }
    }

    /// No artificial latency; used by tests and the CLI
    pub fn instant() -> Self {
        Self {
            fetch_latency: Duration::ZERO,
            search_latency: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, fetch: Duration, search: Duration) -> Self {
        self.fetch_latency = fetch;
        self.search_latency = search;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = Some(backoff);
        self
    }

    pub fn with_compare_max(mut self, max: usize) -> Self {
        self.compare_max = max.max(1);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            fetch_latency: Duration::from_millis(DEFAULT_FETCH_LATENCY_MS),
            search_latency: Duration::from_millis(DEFAULT_SEARCH_LATENCY_MS),
            compare_max: DEFAULT_COMPARE_MAX,
            retry_backoff: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Tracing filter directive from `CAMPUS_LOG`, default `info`
pub fn log_filter() -> String {
    var("CAMPUS_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Option<T>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value {raw:?}: {e}");
        })
        .ok()
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Some(raw) => parse(key, &raw).unwrap_or_else(|| {
            warn!("{key} misconfigured, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

fn try_load_optional<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    var(key).and_then(|raw| parse(key, &raw))
}
