//! Reconciliation scheduler
//!
//! The Scheduler is responsible for:
//! - Resolving the current public IP via IpSource
//! - Reading the existing record via DnsProvider
//! - Deciding what to do via the reconciler
//! - Creating or updating the record via DnsProvider
//! - Sleeping until the next cycle, or until shutdown
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  Scheduler   │◀── shutdown future
//!                 └──────────────┘
//!                        │ one cycle per tick
//!         ┌──────────────┼──────────────┬─────────────────┐
//!         ▼              ▼              ▼                 ▼
//! ┌─────────────┐ ┌─────────────┐ ┌───────────┐  ┌─────────────────┐
//! │  IpSource   │ │ DnsProvider │ │ reconcile │  │   DnsProvider   │
//! │  (resolve)  │ │  (lookup)   │ │ (decide)  │  │ (create/update) │
//! └─────────────┘ └─────────────┘ └───────────┘  └─────────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve the public IP
//! 2. Look up the existing record
//! 3. Decide: create, update, or nothing
//! 4. Apply the decision (at most one provider call)
//! 5. Emit an event and sleep for the poll interval
//!
//! A failure at any step ends that cycle only. Nothing is retried until the
//! next tick.

use crate::config::{RecordConfig, UpdaterConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::reconcile::{self, ReconcileDecision};
use crate::traits::{DnsProvider, IpSource};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Lifecycle state of a [`Scheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, loop not started
    Idle,
    /// Executing cycles
    Running,
    /// Shutdown observed, in-flight cycle finishing
    Stopping,
    /// Loop exited
    Stopped,
}

/// Step of a reconciliation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStep {
    ResolveIp,
    LookupRecord,
    CreateRecord,
    UpdateRecord,
}

impl CycleStep {
    /// Stable name for structured logging
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStep::ResolveIp => "resolve_ip",
            CycleStep::LookupRecord => "lookup_record",
            CycleStep::CreateRecord => "create_record",
            CycleStep::UpdateRecord => "update_record",
        }
    }
}

impl fmt::Display for CycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed cycle, tagged with the step that failed
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct CycleError {
    /// Where the cycle stopped
    pub step: CycleStep,
    /// What went wrong
    #[source]
    pub source: Error,
}

/// Result of a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No record existed; one was created
    Created { record_id: String, ip: String },
    /// The record pointed elsewhere; it was overwritten
    Updated {
        record_id: String,
        previous_ip: String,
        ip: String,
    },
    /// The record already matched
    Unchanged { ip: String },
}

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Loop started
    Started { record: String },

    /// Public IP resolved
    IpResolved { record: String, ip: String },

    /// Record created
    RecordCreated {
        record: String,
        record_id: String,
        ip: String,
    },

    /// Record updated
    RecordUpdated {
        record: String,
        record_id: String,
        previous_ip: String,
        ip: String,
    },

    /// Record already pointed at the current IP
    RecordUnchanged { record: String, ip: String },

    /// Cycle aborted
    CycleFailed {
        record: String,
        step: CycleStep,
        kind: ErrorKind,
        error: String,
    },

    /// Loop stopped
    Stopped { reason: String },
}

/// Polling reconciler for a single "A" record
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`]
/// 2. Start with [`Scheduler::run_until()`], which consumes the scheduler
/// 3. Resolve the shutdown future to stop; the call returns once the
///    in-flight cycle (if any) has finished
///
/// ## Threading
///
/// All cycles run sequentially on the caller's task. The IP source and
/// provider handles are owned by the scheduler and only read after
/// construction.
pub struct Scheduler {
    /// IP source used at the start of each cycle
    ip_source: Box<dyn IpSource>,

    /// DNS provider for lookups and mutations
    provider: Box<dyn DnsProvider>,

    /// The managed record
    record: RecordConfig,

    /// Cached `host_record.domain`
    fqdn: String,

    /// Delay between cycles
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SchedulerEvent>,

    /// Lifecycle state publisher
    state_tx: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: dnsupdater configuration
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields scheduler events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &UpdaterConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(config.scheduler.event_channel_capacity);
        let (state_tx, _) = watch::channel(SchedulerState::Idle);

        let scheduler = Self {
            ip_source,
            provider,
            fqdn: config.record.fqdn(),
            record: config.record.clone(),
            poll_interval: config.scheduler.poll_interval(),
            event_tx,
            state_tx,
        };

        Ok((scheduler, event_rx))
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    /// Watch lifecycle state transitions
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Fully qualified name of the managed record
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Run cycles until `shutdown` resolves
    ///
    /// The shutdown future is checked before every cycle and raced against
    /// every inter-cycle sleep, so a signal arriving during the delay ends
    /// it immediately. A signal arriving mid-cycle lets that cycle finish
    /// and prevents the next one.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.state_tx.send_replace(SchedulerState::Running);
        info!(
            "Scheduler started for {} (provider={}, ip_source={}, poll_interval={:?})",
            self.fqdn,
            self.provider.provider_name(),
            self.ip_source.source_name(),
            self.poll_interval
        );
        self.emit_event(SchedulerEvent::Started {
            record: self.fqdn.clone(),
        });

        let mut cycle: u64 = 0;
        loop {
            // Never start a cycle once shutdown has been requested
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = std::future::ready(()) => {}
            }

            cycle += 1;
            let span = info_span!("cycle", record = %self.fqdn, n = cycle);
            let in_flight = self.run_cycle().instrument(span);
            tokio::pin!(in_flight);

            let stop_requested = tokio::select! {
                biased;
                _ = &mut in_flight => false,
                _ = &mut shutdown => {
                    self.state_tx.send_replace(SchedulerState::Stopping);
                    info!("Shutdown requested during cycle {}, letting it finish", cycle);
                    let _ = (&mut in_flight).await;
                    true
                }
            };
            if stop_requested {
                break;
            }

            debug!("Next cycle for {} in {:?}", self.fqdn, self.poll_interval);
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        self.state_tx.send_replace(SchedulerState::Stopping);
        info!("Shutdown signal received, scheduler for {} stopping", self.fqdn);
        self.emit_event(SchedulerEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        self.state_tx.send_replace(SchedulerState::Stopped);
        info!("Scheduler stopped after {} cycle(s)", cycle);
    }

    /// Execute a single reconciliation cycle
    ///
    /// Errors are logged and emitted as [`SchedulerEvent::CycleFailed`]
    /// before being returned.
    pub async fn run_cycle(&self) -> std::result::Result<CycleOutcome, CycleError> {
        let ip = self
            .ip_source
            .current()
            .await
            .map_err(|e| self.fail(CycleStep::ResolveIp, e))?;

        info!("Resolved public IP {} for {}", ip, self.fqdn);
        self.emit_event(SchedulerEvent::IpResolved {
            record: self.fqdn.clone(),
            ip: ip.clone(),
        });

        let existing = self
            .provider
            .lookup(&self.record.domain, &self.record.host_record)
            .await
            .map_err(|e| self.fail(CycleStep::LookupRecord, e))?;

        match &existing {
            Some(record) => debug!("Existing record {} has value {}", record.id, record.value),
            None => debug!("No existing A record for {}", self.fqdn),
        }

        let outcome = match reconcile::decide(&ip, existing.as_ref()) {
            ReconcileDecision::NoOp => {
                info!("IP unchanged: {} -> {}", self.fqdn, ip);
                self.emit_event(SchedulerEvent::RecordUnchanged {
                    record: self.fqdn.clone(),
                    ip: ip.clone(),
                });
                CycleOutcome::Unchanged { ip }
            }
            ReconcileDecision::Create { ip } => {
                let record_id = self
                    .provider
                    .create_record(&self.record.domain, &self.record.host_record, &ip)
                    .await
                    .map_err(|e| self.fail(CycleStep::CreateRecord, e))?;

                info!("Created record {} -> {} (id: {})", self.fqdn, ip, record_id);
                self.emit_event(SchedulerEvent::RecordCreated {
                    record: self.fqdn.clone(),
                    record_id: record_id.clone(),
                    ip: ip.clone(),
                });
                CycleOutcome::Created { record_id, ip }
            }
            ReconcileDecision::Update { record_id, ip } => {
                let previous_ip = existing.map(|r| r.value).unwrap_or_default();

                self.provider
                    .update_record(&record_id, &self.record.host_record, &ip)
                    .await
                    .map_err(|e| self.fail(CycleStep::UpdateRecord, e))?;

                info!("Updated record {} -> {} (was: {})", self.fqdn, ip, previous_ip);
                self.emit_event(SchedulerEvent::RecordUpdated {
                    record: self.fqdn.clone(),
                    record_id: record_id.clone(),
                    previous_ip: previous_ip.clone(),
                    ip: ip.clone(),
                });
                CycleOutcome::Updated {
                    record_id,
                    previous_ip,
                    ip,
                }
            }
        };

        Ok(outcome)
    }

    /// Log and report a failed step
    fn fail(&self, step: CycleStep, source: Error) -> CycleError {
        let kind = source.kind();

        if kind.is_persistent() {
            error!(
                step = step.as_str(),
                kind = kind.as_str(),
                persistent = true,
                "{} failed for {}: {}. \
                 This will recur every cycle until the configuration is fixed",
                step,
                self.fqdn,
                source
            );
        } else {
            warn!(
                step = step.as_str(),
                kind = kind.as_str(),
                persistent = false,
                "{} failed for {}: {}. Retrying next cycle",
                step,
                self.fqdn,
                source
            );
        }

        self.emit_event(SchedulerEvent::CycleFailed {
            record: self.fqdn.clone(),
            step,
            kind,
            error: source.to_string(),
        });

        CycleError { step, source }
    }

    /// Emit a scheduler event
    fn emit_event(&self, event: SchedulerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. \
                     Consider increasing event_channel_capacity."
                );
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
