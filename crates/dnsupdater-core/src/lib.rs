// # dnsupdater-core
//
// Core library for keeping a single DNS "A" record pointed at the host's
// current public IP.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for resolving the current public IP
// - **DnsProvider**: Trait for reading, creating and updating the record
// - **reconcile**: Pure decision between create, update and no-op
// - **Scheduler**: Polling loop that runs one reconciliation cycle per tick
//   until its shutdown future resolves
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and IP source implementations
// 2. **Polling**: One cycle per interval, cycles never overlap
// 3. **Fail Soft**: Every error ends the current cycle only
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod traits;
pub mod reconcile;
pub mod scheduler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource};
pub use reconcile::{ReconcileDecision, decide};
pub use scheduler::{CycleError, CycleOutcome, CycleStep, Scheduler, SchedulerEvent, SchedulerState};
pub use config::{IpSourceConfig, ProviderConfig, RecordConfig, SchedulerConfig, UpdaterConfig};
pub use error::{Error, ErrorKind, Result};
