//! Appender configuration
//!
//! [`AppenderOptions`] is the raw, partially filled input a host hands over
//! (deserialized from its own config, built in code, or read from the
//! environment). [`Config::from_options`] validates it once at setup and
//! resolves defaults; the resulting [`Config`] never changes afterwards.

use anyhow::{Context, Result};
use serde::Deserialize;
use sls_client::{ClientOptions, DEFAULT_API_VERSION};
use sls_core::domain::payload::Value;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Records per dispatch group when no batch size is configured
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Raw appender options
///
/// Every field is optional here; required ones are checked by
/// [`Config::from_options`]. The short option names used by existing
/// appender configs (`access`, `secret`, `storage`, `batch`, ...) are
/// accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppenderOptions {
    #[serde(alias = "access")]
    pub access_key_id: Option<String>,
    #[serde(alias = "secret")]
    pub access_key_secret: Option<String>,
    pub endpoint: Option<String>,
    #[serde(alias = "version")]
    pub api_version: Option<String>,
    pub project: Option<String>,
    #[serde(alias = "storage", alias = "store")]
    pub logstore: Option<String>,
    /// Request timeout in milliseconds
    #[serde(alias = "timeout")]
    pub timeout_ms: Option<u64>,
    /// Records per dispatch group
    #[serde(alias = "batch")]
    pub batch_size: Option<usize>,
    /// Flush interval in milliseconds; batching is disabled without it
    #[serde(alias = "interval")]
    pub interval_ms: Option<u64>,
    pub topic: Option<String>,
    /// Static fields merged into every event
    pub content: Option<serde_json::Map<String, serde_json::Value>>,
}

impl AppenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.access_key_secret = Some(access_key_secret.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_logstore(mut self, logstore: impl Into<String>) -> Self {
        self.logstore = Some(logstore.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = Some(interval.as_millis() as u64);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Adds a static field merged into every event
    pub fn with_content(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.content
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        self
    }

    /// Reads options from environment variables
    ///
    /// Variables:
    /// - SLS_ACCESS_KEY, SLS_SECRET, SLS_ENDPOINT, SLS_PROJECT, SLS_STORE
    /// - SLS_API_VERSION (optional)
    /// - SLS_TIMEOUT_MS, SLS_BATCH_SIZE, SLS_FLUSH_INTERVAL_MS (optional, integers)
    /// - SLS_TOPIC (optional)
    ///
    /// Missing required variables are reported later by
    /// [`Config::from_options`]; only malformed numbers fail here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |name: &str| -> Result<Option<u64>> {
            lookup(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a non-negative integer", name))
                })
                .transpose()
        };

        Ok(Self {
            access_key_id: lookup("SLS_ACCESS_KEY"),
            access_key_secret: lookup("SLS_SECRET"),
            endpoint: lookup("SLS_ENDPOINT"),
            api_version: lookup("SLS_API_VERSION"),
            project: lookup("SLS_PROJECT"),
            logstore: lookup("SLS_STORE"),
            timeout_ms: number("SLS_TIMEOUT_MS")?,
            batch_size: number("SLS_BATCH_SIZE")?.map(|n| n as usize),
            interval_ms: number("SLS_FLUSH_INTERVAL_MS")?,
            topic: lookup("SLS_TOPIC"),
            content: None,
        })
    }
}

/// Validated appender configuration
#[derive(Clone)]
pub struct Config {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub endpoint: String,
    pub api_version: String,
    pub project: String,
    pub logstore: String,
    pub timeout: Option<Duration>,
    /// Batching is enabled when set
    pub flush_interval: Option<Duration>,
    pub batch_size: usize,
    pub topic: Option<String>,
    /// Static fields in insertion order
    pub content: Vec<(String, Value)>,
}

impl Config {
    /// Validates options and resolves defaults
    ///
    /// Empty strings count as missing. A zero batch size falls back to
    /// [`DEFAULT_BATCH_SIZE`]; a zero interval or timeout means unset.
    pub fn from_options(options: AppenderOptions) -> std::result::Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |value: Option<String>, name: &'static str| match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let access_key_id = required(options.access_key_id, "access");
        let access_key_secret = required(options.access_key_secret, "secret");
        let endpoint = required(options.endpoint, "endpoint");
        let project = required(options.project, "project");
        let logstore = required(options.logstore, "store");

        if !missing.is_empty() {
            return Err(ConfigError::MissingParameters(missing));
        }

        let positive_millis = |ms: Option<u64>| ms.filter(|ms| *ms > 0).map(Duration::from_millis);

        Ok(Self {
            access_key_id,
            access_key_secret,
            endpoint,
            api_version: options
                .api_version
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            project,
            logstore,
            timeout: positive_millis(options.timeout_ms),
            flush_interval: positive_millis(options.interval_ms),
            batch_size: options
                .batch_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            topic: options.topic.filter(|topic| !topic.is_empty()),
            content: options
                .content
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
        })
    }

    pub fn batching_enabled(&self) -> bool {
        self.flush_interval.is_some()
    }

    /// Connection settings for the bundled SLS client
    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::new(
            self.access_key_id.clone(),
            self.access_key_secret.clone(),
            self.endpoint.clone(),
        )
        .with_api_version(self.api_version.clone());

        match self.timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}

impl TryFrom<AppenderOptions> for Config {
    type Error = ConfigError;

    fn try_from(options: AppenderOptions) -> std::result::Result<Self, Self::Error> {
        Self::from_options(options)
    }
}

// The secret stays out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("project", &self.project)
            .field("logstore", &self.logstore)
            .field("timeout", &self.timeout)
            .field("flush_interval", &self.flush_interval)
            .field("batch_size", &self.batch_size)
            .field("topic", &self.topic)
            .field("content", &self.content)
            .finish()
    }
}
