//! Configuration types for dnsupdater
//!
//! This module defines all configuration structures used throughout the crate.
//! The configuration is loaded once at startup and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Main dnsupdater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// The record to keep pointed at the public IP
    pub record: RecordConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Optional scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl UpdaterConfig {
    /// Create a configuration for a record, with default everything else
    pub fn new(record: RecordConfig, provider: ProviderConfig) -> Self {
        Self {
            record,
            provider,
            ip_source: IpSourceConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.record.validate()?;
        self.provider.validate()?;
        self.ip_source.validate()?;
        self.scheduler.validate()?;

        Ok(())
    }
}

/// DNS record configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// The DNS zone (e.g., "example.com")
    pub domain: String,

    /// The record name within the zone (e.g., "home", or "@" for the apex)
    pub host_record: String,
}

impl RecordConfig {
    /// Create a new record configuration
    pub fn new(domain: impl Into<String>, host_record: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            host_record: host_record.into(),
        }
    }

    /// Fully qualified record name, e.g. "home.example.com"
    pub fn fqdn(&self) -> String {
        if self.host_record == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", self.host_record, self.domain)
        }
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.trim().is_empty() {
            return Err(crate::Error::config("Domain name cannot be empty"));
        }
        if self.host_record.trim().is_empty() {
            return Err(crate::Error::config("Host record cannot be empty"));
        }
        if self.host_record.ends_with('.') || self.domain.starts_with('.') {
            return Err(crate::Error::config(format!(
                "Host record and domain must not carry separating dots: {}.{}",
                self.host_record, self.domain
            )));
        }
        Ok(())
    }
}

/// Alidns provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Region used to select the regional API endpoint
    #[serde(default = "default_region")]
    pub region: String,

    /// AccessKey ID
    pub access_key_id: String,

    /// AccessKey secret
    pub access_key_secret: String,

    /// Endpoint override (defaults to the regional endpoint)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// HTTP timeout for provider calls (in seconds)
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Create a provider configuration with the default region and timeout
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            region: default_region(),
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            endpoint: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }

    /// Set the region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// The endpoint API calls are sent to
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://alidns.{}.aliyuncs.com/", self.region),
        }
    }

    /// HTTP timeout for provider calls
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.access_key_id.is_empty() {
            return Err(crate::Error::config("AccessKey ID cannot be empty"));
        }
        if self.access_key_secret.is_empty() {
            return Err(crate::Error::config("AccessKey secret cannot be empty"));
        }
        if self.region.is_empty() && self.endpoint.is_none() {
            return Err(crate::Error::config(
                "Either a region or an explicit endpoint is required",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Provider timeout must be > 0"));
        }
        Ok(())
    }
}

// The secret must never reach logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning the caller's public IP as plain text
    #[serde(default = "default_ip_source_url")]
    pub url: String,

    /// HTTP timeout for the IP lookup (in seconds)
    #[serde(default = "default_ip_source_timeout_secs")]
    pub timeout_secs: u64,

    /// Reject responses that are not a dotted-decimal IPv4 address
    #[serde(default)]
    pub require_ipv4: bool,
}

impl IpSourceConfig {
    /// Create an IP source configuration for a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// HTTP timeout for the IP lookup
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP source URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP source timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_source_url(),
            timeout_secs: default_ip_source_timeout_secs(),
            require_ipv4: false,
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay between the end of one cycle and the start of the next (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the scheduler event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SchedulerConfig {
    /// The inter-cycle delay
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate the scheduler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_region() -> String {
    "cn-hangzhou".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_ip_source_url() -> String {
    "http://ifconfig.me".to_string()
}

fn default_ip_source_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    100
}
