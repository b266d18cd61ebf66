// # IP Source Trait
//
// Defines the interface for resolving the host's current public IP.
//
// ## Implementations
//
// - HTTP plain-text lookup: `dnsupdater-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsupdater_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let ip = source.current().await?;
//     println!("public IP: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// The scheduler calls [`IpSource::current`] once per reconciliation cycle.
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Rules
///
/// - One lookup per call, bounded by a client-level timeout
/// - No caching between calls: every cycle sees a fresh answer
/// - No retry: a failure skips the cycle and the next cycle tries again
/// - No background tasks
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IP
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The IP as text, trimmed
    /// - `Err(Error::Network)`: If the source was unreachable, timed out,
    ///   or answered with a non-success status
    async fn current(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
