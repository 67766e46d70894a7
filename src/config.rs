use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;

/// Which external classifier backs the AI moderation stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierBackend {
    /// No AI stage: static rules only (default)
    Off,
    /// OpenAI moderation endpoint: requires OPENAI_API_KEY
    OpenAi,
    /// Google Perspective API: requires PERSPECTIVE_API_KEY
    Perspective,
}

/// Whether a cache is used at all.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheMode {
    /// In-process cache, or Redis when REDIS_URL is set (default)
    Memory,
    /// No cache: every read misses, every write is dropped
    Off,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub bind: String,
    pub port: u16,
    pub cache_mode: CacheMode,
    /// Redis connection URL. Only honoured by builds with the `redis` feature.
    pub redis_url: Option<String>,
    /// Ceiling on raw request bodies for the submission endpoint.
    pub max_payload_bytes: usize,
    pub classifier_backend: ClassifierBackend,
    pub openai_api_key: String,
    pub perspective_api_key: String,
    /// Upper bound on one classifier call before the AI stage fails open.
    pub classifier_timeout: Duration,
    /// Number of items kept in the trending pool.
    pub trend_pool_size: usize,
    /// How long a trending pool stays fresh in the cache.
    pub trend_ttl: Duration,
    /// Upper bound on one trend source fetch.
    pub trend_source_timeout: Duration,
    /// Optional token for the GitHub search API (raises its rate limit).
    pub github_token: Option<String>,
    /// Shared secret the scheduler sends in `x-cron-secret`.
    pub cron_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./rarely.db".to_string(),
            bind: "0.0.0.0".to_string(),
            port: 8080,
            cache_mode: CacheMode::Memory,
            redis_url: None,
            max_payload_bytes: 10 * 1024,
            classifier_backend: ClassifierBackend::Off,
            openai_api_key: String::new(),
            perspective_api_key: String::new(),
            classifier_timeout: Duration::from_millis(3000),
            trend_pool_size: 100,
            trend_ttl: Duration::from_secs(300),
            trend_source_timeout: Duration::from_millis(5000),
            github_token: None,
            cron_secret: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything except the API keys and the cron secret has a default.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let classifier_backend = match env::var("RARELY_CLASSIFIER").as_deref() {
            Ok("openai") => ClassifierBackend::OpenAi,
            Ok("perspective") => ClassifierBackend::Perspective,
            // "off" or unset both mean static rules only
            _ => ClassifierBackend::Off,
        };

        let cache_mode = match env::var("RARELY_CACHE").as_deref() {
            Ok("off") => CacheMode::Off,
            _ => CacheMode::Memory,
        };

        Ok(Self {
            db_path: env::var("RARELY_DB_PATH").unwrap_or(defaults.db_path),
            bind: env::var("RARELY_BIND").unwrap_or(defaults.bind),
            port: parse_var("RARELY_PORT")?.unwrap_or(defaults.port),
            cache_mode,
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            max_payload_bytes: parse_var("RARELY_MAX_PAYLOAD_BYTES")?
                .unwrap_or(defaults.max_payload_bytes),
            classifier_backend,
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            perspective_api_key: env::var("PERSPECTIVE_API_KEY").unwrap_or_default(),
            classifier_timeout: parse_var("RARELY_CLASSIFIER_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.classifier_timeout),
            trend_pool_size: parse_var("RARELY_TREND_POOL_SIZE")?
                .unwrap_or(defaults.trend_pool_size),
            trend_ttl: parse_var("RARELY_TREND_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.trend_ttl),
            trend_source_timeout: parse_var("RARELY_TREND_SOURCE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.trend_source_timeout),
            github_token: env::var("GITHUB_TOKEN").ok().filter(|s| !s.is_empty()),
            cron_secret: env::var("RARELY_CRON_SECRET").unwrap_or_default(),
        })
    }

    /// Validate that the chosen classifier backend has what it needs.
    pub fn require_classifier(&self) -> Result<()> {
        match self.classifier_backend {
            ClassifierBackend::Off => Ok(()),
            ClassifierBackend::OpenAi if self.openai_api_key.is_empty() => anyhow::bail!(
                "RARELY_CLASSIFIER=openai but OPENAI_API_KEY is not set.\n\
                 Add it to your .env file, or set RARELY_CLASSIFIER=off."
            ),
            ClassifierBackend::Perspective if self.perspective_api_key.is_empty() => {
                anyhow::bail!(
                    "RARELY_CLASSIFIER=perspective but PERSPECTIVE_API_KEY is not set.\n\
                     Add it to your .env file, or set RARELY_CLASSIFIER=off."
                )
            }
            _ => Ok(()),
        }
    }
}

/// Parse an optional numeric env var, rejecting garbage instead of
/// silently falling back to the default.
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{name} must be a number, got {raw:?}")),
        _ => Ok(None),
    }
}
