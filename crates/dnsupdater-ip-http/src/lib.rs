// # HTTP IP Source
//
// This crate provides the public IP lookup for dnsupdater.
//
// ## Protocol
//
// A plain HTTP GET against a "what is my IP" service (e.g. ifconfig.me,
// api.ipify.org, icanhazip.com). The whole response body, trimmed, is the
// IP address. There is no JSON envelope.
//
// ## Behavior
//
// - One request per call, no caching, no retry
// - Transport errors, timeouts and non-2xx statuses are `Error::Network`
// - An empty body is `Error::Network`
// - The body is passed through as-is unless IPv4 validation is enabled,
//   in which case anything that is not dotted-decimal IPv4 is
//   `Error::InvalidInput`

use dnsupdater_core::config::IpSourceConfig;
use dnsupdater_core::traits::IpSource;
use dnsupdater_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default HTTP timeout for IP lookups
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain-text HTTP IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// Reject anything that is not an IPv4 address
    require_ipv4: bool,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "http://ifconfig.me")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            require_ipv4: false,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::with_timeout(config.url.clone(), config.timeout())?
            .with_ipv4_validation(config.require_ipv4))
    }

    /// Enable or disable IPv4 validation of the response body
    pub fn with_ipv4_validation(mut self, require_ipv4: bool) -> Self {
        self.require_ipv4 = require_ipv4;
        self
    }

    /// The URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from HTTP service
    async fn fetch_ip(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::network(format!("Request to {} timed out", self.url))
                } else {
                    Error::network(format!("Request to {} failed: {}", self.url, e))
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "{} answered with HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = body.trim();
        if ip.is_empty() {
            return Err(Error::network(format!("{} returned an empty response body", self.url)));
        }

        if self.require_ipv4 && ip.parse::<Ipv4Addr>().is_err() {
            return Err(Error::invalid_input(format!(
                "{} returned something that is not an IPv4 address: {:?}",
                self.url, ip
            )));
        }

        Ok(ip.to_string())
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);
        self.fetch_ip().await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
