//! Runtime configuration, resolved once at startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the news backend, without trailing slash.
    pub api_url: String,
    /// Timeout for `GET` and `DELETE` requests.
    pub read_timeout: Duration,
    /// Timeout for `POST` and `PUT` requests.
    pub write_timeout: Duration,
    pub log_file: PathBuf,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("NEWSDESK_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let parsed = reqwest::Url::parse(api_url.trim())
            .with_context(|| format!("NEWSDESK_API_URL is not a valid URL: {api_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("NEWSDESK_API_URL must be http or https, got {}", parsed.scheme());
        }

        let read_timeout = timeout_var(&lookup, "NEWSDESK_READ_TIMEOUT_SECS", DEFAULT_READ_TIMEOUT)?;
        let write_timeout =
            timeout_var(&lookup, "NEWSDESK_WRITE_TIMEOUT_SECS", DEFAULT_WRITE_TIMEOUT)?;

        let log_file = lookup("NEWSDESK_LOG_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or_else(|| std::env::temp_dir().join("newsdesk.log"));

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            read_timeout,
            write_timeout,
            log_file,
        })
    }

    pub fn news_url(&self) -> String {
        format!("{}/api/news", self.api_url)
    }

    pub fn article_url(&self, id: &str) -> String {
        format!("{}/api/news/{}", self.api_url, id)
    }
}

fn timeout_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?;
            if secs == 0 {
                bail!("{key} must be greater than zero");
            }
            Ok(Duration::from_secs(secs))
        }
    }
}
