use std::{env, net::SocketAddr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::schema::SheetLayout;

/// Quarterly Summary of State & Local Tax Revenue, table 3 (2023 Q3 release).
pub const DEFAULT_SOURCE_URL: &str =
    "https://www2.census.gov/programs-surveys/qtax/tables/2023/q3t3.xlsx";

/// The source is republished quarterly; a day is plenty.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Where the workbook lives and how it is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub layout: SheetLayout,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            layout: SheetLayout::default(),
        }
    }
}

/// Bounded retry with exponential backoff for the workbook download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            timeout_secs: 60,
        }
    }
}

impl FetchPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceConfig,
    pub fetch: FetchPolicy,
    /// `None` keeps the table for the whole process lifetime.
    pub cache_ttl: Option<Duration>,
    pub bind: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            fetch: FetchPolicy::default(),
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl Settings {
    /// Defaults, with the listening port taken from `PORT` when the hosting
    /// platform sets it.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            settings.bind.set_port(port);
        }
        settings
    }
}
