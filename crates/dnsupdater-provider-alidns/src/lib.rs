// # Alidns Provider
//
// This crate provides the Alibaba Cloud DNS (Alidns) provider for dnsupdater.
//
// ## Behavior
//
// - Makes exactly one HTTP request per trait call
// - Full error propagation to the scheduler (no retry, no backoff)
// - HTTP timeout configured (30 seconds by default)
// - Typed response structures, no ad hoc JSON traversal
// - Errors classified into client-side (request rejected: bad credentials,
//   unknown domain) and server-side (5xx, throttling, transport failures,
//   unparseable responses)
//
// ## Security Requirements
//
// - AccessKey secret NEVER appears in logs or Debug output
// - Request URLs (which carry the signature) are stripped from transport errors
//
// ## API Reference
//
// RPC style, API version 2015-01-09, GET with signed query parameters:
// - `DescribeDomainRecords`: DomainName, RRKeyWord, TypeKeyWord, PageSize
// - `AddDomainRecord`: DomainName, RR, Type, Value
// - `UpdateDomainRecord`: RecordId, RR, Type, Value

mod response;
mod signature;

use async_trait::async_trait;
use dnsupdater_core::config::ProviderConfig;
use dnsupdater_core::traits::{DnsProvider, DnsRecord};
use dnsupdater_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use response::{DescribeDomainRecordsResponse, ErrorResponse, RecordIdResponse};

/// Alidns API version
const API_VERSION: &str = "2015-01-09";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page DescribeDomainRecords accepts
const MAX_PAGE_SIZE: &str = "500";

/// Managed record type
const RECORD_TYPE_A: &str = "A";

/// Alibaba Cloud DNS provider
///
/// Stateless and single-shot: all coordination (scheduling, retry via the
/// next cycle) is owned by the scheduler.
pub struct AlidnsProvider {
    /// AccessKey ID
    access_key_id: String,

    /// AccessKey secret
    /// ⚠️ NEVER log this value
    access_key_secret: String,

    /// API endpoint, e.g. "https://alidns.cn-hangzhou.aliyuncs.com/"
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the AccessKey secret
impl std::fmt::Debug for AlidnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlidnsProvider")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AlidnsProvider {
    /// Create a new Alidns provider
    ///
    /// # Parameters
    ///
    /// - `access_key_id`: AccessKey ID with AliyunDNSFullAccess permissions
    /// - `access_key_secret`: AccessKey secret
    /// - `endpoint`: API endpoint
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeout(access_key_id, access_key_secret, endpoint, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        if access_key_id.is_empty() || access_key_secret.is_empty() {
            return Err(Error::config("Alidns AccessKey ID and secret are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        // Requests are signed for the "/" path
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Ok(Self {
            access_key_id,
            access_key_secret,
            endpoint,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        Self::with_timeout(
            config.access_key_id.clone(),
            config.access_key_secret.clone(),
            config.endpoint_url(),
            config.timeout(),
        )
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Parameters every RPC call carries
    fn common_params(&self, action: &str) -> BTreeMap<String, String> {
        let nonce = format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>());
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        [
            ("Action", action.to_string()),
            ("Format", "JSON".to_string()),
            ("Version", API_VERSION.to_string()),
            ("AccessKeyId", self.access_key_id.clone()),
            ("SignatureMethod", "HMAC-SHA1".to_string()),
            ("SignatureVersion", "1.0".to_string()),
            ("SignatureNonce", nonce),
            ("Timestamp", timestamp),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Perform one signed RPC call and decode the response
    async fn call<T: DeserializeOwned>(&self, action: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut query = self.common_params(action);
        for (k, v) in params {
            query.insert(k.to_string(), v.to_string());
        }

        let url = format!(
            "{}?{}",
            self.endpoint,
            signature::signed_query(&query, &self.access_key_secret)
        );

        tracing::debug!("Calling Alidns {} at {}", action, self.endpoint);

        let response = self.client.get(&url).send().await.map_err(|e| {
            let code = if e.is_timeout() {
                "SDK.Timeout"
            } else {
                "SDK.ServerUnreachable"
            };
            Error::provider_server(code, format!("{} request failed: {}", action, e.without_url()))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::provider_server(
                "SDK.ServerUnreachable",
                format!("Failed to read {} response: {}", action, e.without_url()),
            )
        })?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider_server(
                "InvalidResponse",
                format!("Unexpected {} response shape: {}", action, e),
            )
        })
    }
}

/// Map a non-2xx response to a client- or server-side provider error
///
/// Throttling is reported with 4xx statuses but is a transient provider
/// condition, so it is classified server-side.
fn classify_failure(status: u16, body: &str) -> Error {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();

    let code = if parsed.code.is_empty() {
        format!("HTTP{}", status)
    } else {
        parsed.code
    };

    let mut message = if parsed.message.is_empty() {
        body.trim().chars().take(200).collect::<String>()
    } else {
        parsed.message
    };
    if !parsed.request_id.is_empty() {
        message = format!("{} (RequestId: {})", message, parsed.request_id);
    }

    let transient = status >= 500
        || code.starts_with("Throttling")
        || code == "ServiceUnavailable"
        || code.starts_with("InternalError");

    if transient {
        Error::provider_server(code, message)
    } else {
        Error::provider_client(code, message)
    }
}

#[async_trait]
impl DnsProvider for AlidnsProvider {
    /// Look up the "A" record for `host_record`
    ///
    /// `RRKeyWord` is a fuzzy filter ("home" also matches "home2"), so the
    /// returned entries are narrowed to exact host record and type before
    /// taking the first. When the page is truncated and holds no exact
    /// match, absence cannot be proven and the lookup fails instead.
    async fn lookup(&self, domain: &str, host_record: &str) -> Result<Option<DnsRecord>> {
        let response: DescribeDomainRecordsResponse = self
            .call(
                "DescribeDomainRecords",
                &[
                    ("DomainName", domain),
                    ("RRKeyWord", host_record),
                    ("TypeKeyWord", RECORD_TYPE_A),
                    ("PageSize", MAX_PAGE_SIZE),
                ],
            )
            .await?;

        if response.total_count == 0 {
            return Ok(None);
        }

        let entries = response.domain_records.record;
        let listed = entries.len();
        if entries.is_empty() {
            return Err(Error::provider_server(
                "InvalidResponse",
                format!(
                    "DescribeDomainRecords reported {} record(s) but listed none",
                    response.total_count
                ),
            ));
        }

        // Host names compare case-insensitively
        let mut matching = entries.into_iter().filter(|r| {
            r.rr.eq_ignore_ascii_case(host_record)
                && r.record_type.eq_ignore_ascii_case(RECORD_TYPE_A)
        });

        let Some(first) = matching.next() else {
            // The exact record may sit on a page that was never read
            if response.total_count > listed as u64 {
                return Err(Error::provider_server(
                    "InvalidResponse",
                    format!(
                        "DescribeDomainRecords listed {} of {} fuzzy matches for {}.{} \
                         and none was exact",
                        listed, response.total_count, host_record, domain
                    ),
                ));
            }

            tracing::debug!(
                "{} fuzzy match(es) for {}.{}, none exact",
                response.total_count,
                host_record,
                domain
            );
            return Ok(None);
        };

        let extra = matching.count();
        if extra > 0 {
            tracing::warn!(
                "{} A records match {}.{}; using the first ({})",
                extra + 1,
                host_record,
                domain,
                first.record_id
            );
        }

        Ok(Some(DnsRecord::new(first.record_id, first.value)))
    }

    async fn create_record(&self, domain: &str, host_record: &str, ip: &str) -> Result<String> {
        let response: RecordIdResponse = self
            .call(
                "AddDomainRecord",
                &[
                    ("DomainName", domain),
                    ("RR", host_record),
                    ("Type", RECORD_TYPE_A),
                    ("Value", ip),
                ],
            )
            .await?;

        tracing::debug!(
            "AddDomainRecord accepted (RecordId: {}, RequestId: {})",
            response.record_id,
            response.request_id
        );
        Ok(response.record_id)
    }

    async fn update_record(&self, record_id: &str, host_record: &str, ip: &str) -> Result<()> {
        let response: RecordIdResponse = self
            .call(
                "UpdateDomainRecord",
                &[
                    ("RecordId", record_id),
                    ("RR", host_record),
                    ("Type", RECORD_TYPE_A),
                    ("Value", ip),
                ],
            )
            .await?;

        tracing::debug!(
            "UpdateDomainRecord accepted (RecordId: {}, RequestId: {})",
            response.record_id,
            response.request_id
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "alidns"
    }
}
