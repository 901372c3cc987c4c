//! SLS HTTP Client
//!
//! Delivery boundary between the log appender and Aliyun Log Service.
//!
//! The appender only depends on the [`DeliveryClient`] trait, so tests and
//! alternative transports can stand in for the real service. [`SlsClient`]
//! is the bundled implementation: it encodes a dispatch group as a protobuf
//! `LogGroup`, signs the request and posts it to the logstore.
//!
//! # Example
//!
//! ```no_run
//! use sls_client::{ClientOptions, DeliveryClient, SlsClient};
//! use sls_core::dto::put_logs::PutLogsRequest;
//!
//! #[tokio::main]
//! async fn main() -> sls_client::Result<()> {
//!     let client = SlsClient::new(ClientOptions::new(
//!         "access-key-id",
//!         "access-key-secret",
//!         "cn-hangzhou.log.aliyuncs.com",
//!     ))?;
//!
//!     client
//!         .put_logs(PutLogsRequest {
//!             project: "my-project".to_string(),
//!             logstore: "app".to_string(),
//!             topic: None,
//!             logs: vec![],
//!         })
//!         .await
//! }
//! ```

pub mod error;
mod logs;
mod proto;
mod signature;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use sls_core::dto::put_logs::PutLogsRequest;

use async_trait::async_trait;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

/// API version sent with every request unless overridden
pub const DEFAULT_API_VERSION: &str = "0.6.0";

/// Outbound boundary used by the appender to ship a dispatch group
///
/// Implementations report failures through the returned `Result`; the
/// appender logs them and moves on, so implementations should not retry on
/// its behalf.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Sends one dispatch group to the store
    ///
    /// # Arguments
    /// * `request` - Target project/logstore, topic and the records to ship
    async fn put_logs(&self, request: PutLogsRequest) -> Result<()>;
}

/// Connection settings for [`SlsClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Region endpoint, with or without scheme (e.g. "cn-hangzhou.log.aliyuncs.com")
    pub endpoint: String,
    pub api_version: String,
    /// Per-request timeout applied to the underlying HTTP client
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client for the Aliyun Log Service PutLogs API
#[derive(Debug, Clone)]
pub struct SlsClient {
    /// "http" or "https"
    scheme: String,
    /// Endpoint host (and optional port) without scheme
    host: String,
    /// Raw IP or localhost endpoints are addressed directly, others are
    /// prefixed with the project name
    direct_host: bool,
    access_key_id: String,
    access_key_secret: String,
    api_version: String,
    /// HTTP client instance
    client: Client,
}

impl SlsClient {
    /// Create a new client, building an HTTP client with the configured timeout
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Self::with_client(options, client)
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. The timeout
    /// in `options` is ignored; configure it on `client` instead.
    pub fn with_client(options: ClientOptions, client: Client) -> Result<Self> {
        let (scheme, rest) = match options.endpoint.split_once("://") {
            Some((scheme, rest)) if scheme == "http" || scheme == "https" => (scheme, rest),
            Some((scheme, _)) => {
                return Err(ClientError::InvalidEndpoint(format!(
                    "unsupported scheme '{}' in '{}'",
                    scheme, options.endpoint
                )));
            }
            None => ("https", options.endpoint.as_str()),
        };

        let host = rest.trim_end_matches('/').to_string();
        if host.is_empty() || host.contains('/') {
            return Err(ClientError::InvalidEndpoint(options.endpoint.clone()));
        }

        let direct_host = is_direct_host(&host);

        Ok(Self {
            scheme: scheme.to_string(),
            host,
            direct_host,
            access_key_id: options.access_key_id,
            access_key_secret: options.access_key_secret,
            api_version: options.api_version,
            client,
        })
    }

    /// Base URL requests for `project` are sent to
    pub fn project_url(&self, project: &str) -> String {
        if self.direct_host {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}.{}", self.scheme, project, self.host)
        }
    }

    /// Check the status code and turn failures into [`ClientError::ApiError`]
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

fn is_direct_host(host: &str) -> bool {
    let bare = match host.rsplit_once(':') {
        // Bracketed IPv6 with a port, or a host:port pair
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };
    let bare = bare.trim_start_matches('[').trim_end_matches(']');

    bare == "localhost" || bare.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(endpoint: &str) -> ClientOptions {
        ClientOptions::new("ak", "secret", endpoint)
    }

    #[test]
    fn test_client_creation_defaults_to_https() {
        let client = SlsClient::new(options("cn-hangzhou.log.aliyuncs.com")).unwrap();
        assert_eq!(
            client.project_url("demo"),
            "https://demo.cn-hangzhou.log.aliyuncs.com"
        );
    }

    #[test]
    fn test_client_keeps_scheme_and_trims_trailing_slash() {
        let client = SlsClient::new(options("http://cn-hangzhou.log.aliyuncs.com/")).unwrap();
        assert_eq!(
            client.project_url("demo"),
            "http://demo.cn-hangzhou.log.aliyuncs.com"
        );
    }

    #[test]
    fn test_ip_endpoint_is_not_prefixed() {
        let client = SlsClient::new(options("http://127.0.0.1:8080")).unwrap();
        assert_eq!(client.project_url("demo"), "http://127.0.0.1:8080");

        let client = SlsClient::new(options("localhost:9000")).unwrap();
        assert_eq!(client.project_url("demo"), "https://localhost:9000");
    }

    #[test]
    fn test_invalid_endpoints_are_rejected() {
        assert!(matches!(
            SlsClient::new(options("ftp://example.com")),
            Err(ClientError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            SlsClient::new(options("https://")),
            Err(ClientError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            SlsClient::new(options("example.com/path")),
            Err(ClientError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_error_classification() {
        assert!(ClientError::api_error(401, "denied").is_client_error());
        assert!(ClientError::api_error(503, "busy").is_server_error());
        assert!(!ClientError::SigningFailed("bad key".into()).is_server_error());
    }
}
