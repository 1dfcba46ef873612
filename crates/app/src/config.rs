use std::path::PathBuf;
use std::time::Duration;

use syncavatar_client::api::{ClientError, SyncAvatarApi};
use syncavatar_core::error::CoreError;

/// Default backend address for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default delay between status checks.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base address (default: `http://localhost:8000`).
    pub api_url: String,
    /// Delay between status checks (default: 2 s).
    pub poll_interval: Duration,
    /// Per-request HTTP timeout (default: none).
    pub http_timeout: Option<Duration>,
    /// Where the finished video is saved (default: current directory).
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            http_timeout: None,
            download_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                  |
    /// |--------------------------------|--------------------------|
    /// | `SYNCAVATAR_API_URL`           | `http://localhost:8000`  |
    /// | `SYNCAVATAR_POLL_INTERVAL_MS`  | `2000`                   |
    /// | `SYNCAVATAR_HTTP_TIMEOUT_SECS` | unset (no timeout)       |
    /// | `SYNCAVATAR_DOWNLOAD_DIR`      | `.`                      |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var("SYNCAVATAR_API_URL").unwrap_or(defaults.api_url);

        let poll_interval = match var("SYNCAVATAR_POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms = parse_u64("SYNCAVATAR_POLL_INTERVAL_MS", &raw)?;
                if ms == 0 {
                    return Err(CoreError::Validation(
                        "SYNCAVATAR_POLL_INTERVAL_MS must be greater than zero".into(),
                    ));
                }
                Duration::from_millis(ms)
            }
            None => defaults.poll_interval,
        };

        let http_timeout = match var("SYNCAVATAR_HTTP_TIMEOUT_SECS") {
            Some(raw) => match parse_u64("SYNCAVATAR_HTTP_TIMEOUT_SECS", &raw)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        let download_dir = var("SYNCAVATAR_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.download_dir);

        Ok(Self {
            api_url,
            poll_interval,
            http_timeout,
            download_dir,
        })
    }

    /// Build the REST client described by this configuration.
    pub fn build_api(&self) -> Result<SyncAvatarApi, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        SyncAvatarApi::with_client(builder.build()?, &self.api_url)
    }
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, CoreError> {
    raw.parse().map_err(|_| CoreError::Config {
        key,
        message: format!("expected a non-negative integer, got '{raw}'"),
    })
}
