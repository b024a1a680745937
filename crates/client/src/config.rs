use std::path::PathBuf;
use std::time::Duration;

use ikd_core::catalog::ContentRule;
use ikd_core::error::CoreError;
use ikd_core::pagination::DEFAULT_PAGE_SIZE;
use ikd_core::units::UnitKerja;

use crate::scores::DEFAULT_SCORE_DEBOUNCE;
use crate::sync::{clamp_interval, DEFAULT_POLL_INTERVAL};

/// Settings for one unit page session.
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub unit: UnitKerja,
    /// Evidence poll period, already clamped to 2..=30 s.
    pub poll_interval: Duration,
    pub score_debounce: Duration,
    pub page_size: usize,
    pub content_rule: ContentRule,
}

impl PageConfig {
    pub fn new(unit: UnitKerja) -> Self {
        Self {
            unit,
            poll_interval: DEFAULT_POLL_INTERVAL,
            score_debounce: DEFAULT_SCORE_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            content_rule: ContentRule::default(),
        }
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub api_token: String,
    /// HTTP request timeout (default: 30 s).
    pub request_timeout: Duration,
    /// Where the agent writes report files (default: `./exports`).
    pub export_dir: PathBuf,
    pub page: PageConfig,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default      |
    /// |----------------------------|--------------|
    /// | `IKD_API_URL`              | required     |
    /// | `IKD_API_TOKEN`            | required     |
    /// | `IKD_UNIT_KERJA`           | required     |
    /// | `IKD_POLL_INTERVAL_SECS`   | `5`          |
    /// | `IKD_SCORE_DEBOUNCE_MS`    | `500`        |
    /// | `IKD_REQUEST_TIMEOUT_SECS` | `30`         |
    /// | `IKD_PAGE_SIZE`            | `10`         |
    /// | `IKD_CONTENT_RULE`         | `positive`   |
    /// | `IKD_EXPORT_DIR`           | `./exports`  |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &str| {
            get(name).ok_or_else(|| CoreError::Validation(format!("{name} must be set")))
        };

        let api_url = required("IKD_API_URL")?;
        let api_token = required("IKD_API_TOKEN")?;
        let unit = UnitKerja::parse(&required("IKD_UNIT_KERJA")?)?;

        let poll_secs: u64 = parse_or(get("IKD_POLL_INTERVAL_SECS"), "IKD_POLL_INTERVAL_SECS", 5)?;
        let debounce_ms: u64 = parse_or(get("IKD_SCORE_DEBOUNCE_MS"), "IKD_SCORE_DEBOUNCE_MS", 500)?;
        let timeout_secs: u64 =
            parse_or(get("IKD_REQUEST_TIMEOUT_SECS"), "IKD_REQUEST_TIMEOUT_SECS", 30)?;
        let page_size: usize =
            parse_or(get("IKD_PAGE_SIZE"), "IKD_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(CoreError::Validation("IKD_PAGE_SIZE must be at least 1".into()));
        }
        let content_rule = match get("IKD_CONTENT_RULE") {
            Some(value) => ContentRule::parse(&value)?,
            None => ContentRule::default(),
        };
        let export_dir = get("IKD_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./exports"));

        Ok(Self {
            api_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_secs),
            export_dir,
            page: PageConfig {
                unit,
                poll_interval: clamp_interval(Duration::from_secs(poll_secs)),
                score_debounce: Duration::from_millis(debounce_ms),
                page_size,
                content_rule,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &str,
    default: T,
) -> Result<T, CoreError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| CoreError::Validation(format!("{name} must be a number, got '{raw}'"))),
    }
}
