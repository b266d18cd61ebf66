// # DNS Provider Trait
//
// Defines the interface for reading and mutating the managed "A" record
// through a provider's management API.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `dnsupdater-provider-alidns` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsupdater_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     match provider.lookup("example.com", "home").await? {
//         Some(record) => provider.update_record(&record.id, "home", "203.0.113.5").await?,
//         None => {
//             provider.create_record("example.com", "home", "203.0.113.5").await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// The provider's current "A" record for the managed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record ID (opaque)
    pub id: String,
    /// Current record value (IPv4 dotted-decimal)
    pub value: String,
}

impl DnsRecord {
    /// Create a new record
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Rules
///
/// - Exactly one API call per method invocation
/// - No retry or backoff (the scheduler's next cycle is the retry)
/// - No decision about whether a change is needed (owned by the reconciler)
/// - Errors are classified as [`crate::Error::ProviderClient`] when the
///   provider rejected the request and [`crate::Error::ProviderServer`]
///   for faults, throttling, transport failures and unusable responses
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up the existing "A" record for `host_record` in `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(None)`: No matching record exists
    /// - `Ok(Some(record))`: The first matching record
    /// - `Err(Error)`: If the request failed
    async fn lookup(
        &self,
        domain: &str,
        host_record: &str,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Create a new "A" record
    ///
    /// # Returns
    ///
    /// The provider-assigned record ID
    async fn create_record(
        &self,
        domain: &str,
        host_record: &str,
        ip: &str,
    ) -> Result<String, crate::Error>;

    /// Overwrite the value of an existing record
    ///
    /// `host_record` is sent unchanged so the record keeps its name.
    async fn update_record(
        &self,
        record_id: &str,
        host_record: &str,
        ip: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
