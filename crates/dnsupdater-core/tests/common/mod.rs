//! Test doubles and common utilities for scheduler contract tests
//!
//! These doubles keep their state behind `Arc`s so a test can hand one copy
//! to the scheduler and keep another to inspect afterwards.

#![allow(dead_code)]

use dnsupdater_core::error::{Error, ErrorKind, Result};
use dnsupdater_core::traits::{DnsProvider, DnsRecord, IpSource};
use dnsupdater_core::{ProviderConfig, RecordConfig, UpdaterConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DOMAIN: &str = "example.com";
pub const HOST_RECORD: &str = "home";
pub const FQDN: &str = "home.example.com";

/// Build an error of the given kind, shaped like the real implementations produce
pub fn error_of(kind: ErrorKind) -> Error {
    match kind {
        ErrorKind::Network => Error::network("connection refused"),
        ErrorKind::ProviderClient => Error::provider_client(
            "InvalidAccessKeyId.NotFound",
            "Specified access key is not found.",
        ),
        ErrorKind::ProviderServer => Error::provider_server(
            "ServiceUnavailable",
            "The request has failed due to a temporary failure of the server.",
        ),
        ErrorKind::InvalidInput => Error::invalid_input("not an IPv4 address"),
        ErrorKind::Config => Error::config("bad configuration"),
    }
}

/// One scripted answer from [`ScriptedIpSource`]
#[derive(Debug, Clone)]
pub enum IpAnswer {
    Ip(String),
    Fail(ErrorKind),
}

/// An IpSource that replays a script, then repeats a fallback answer
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<IpAnswer>>>,
    fallback: IpAnswer,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Always answer with `ip`
    pub fn fixed(ip: &str) -> Self {
        Self::new(Vec::new(), IpAnswer::Ip(ip.to_string()))
    }

    /// Always fail with `kind`
    pub fn failing(kind: ErrorKind) -> Self {
        Self::new(Vec::new(), IpAnswer::Fail(kind))
    }

    pub fn new(script: Vec<IpAnswer>, fallback: IpAnswer) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedIpSource that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fallback: other.fallback.clone(),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match answer {
            IpAnswer::Ip(ip) => Ok(ip),
            IpAnswer::Fail(kind) => Err(error_of(kind)),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Provider operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lookup,
    Create,
    Update,
}

/// A recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Lookup {
        domain: String,
        host_record: String,
    },
    Create {
        domain: String,
        host_record: String,
        ip: String,
    },
    Update {
        record_id: String,
        host_record: String,
        ip: String,
    },
}

/// An in-memory DnsProvider holding at most one record
pub struct MockDnsProvider {
    record: Arc<Mutex<Option<DnsRecord>>>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    failures: Arc<Mutex<Vec<(Op, ErrorKind)>>>,
    latency: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    /// A provider with no record for the managed name
    pub fn empty() -> Self {
        Self {
            record: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// A provider that already holds `record`
    pub fn with_record(id: &str, value: &str) -> Self {
        let provider = Self::empty();
        *provider.record.lock().unwrap() = Some(DnsRecord::new(id, value));
        provider
    }

    /// Make every call take `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next call of `op` with an error of `kind`
    pub fn fail_next(&self, op: Op, kind: ErrorKind) {
        self.failures.lock().unwrap().push((op, kind));
    }

    /// All calls in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of create/update calls
    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, ProviderCall::Lookup { .. }))
            .count()
    }

    /// Highest number of calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// The record as the provider currently holds it
    pub fn current_record(&self) -> Option<DnsRecord> {
        self.record.lock().unwrap().clone()
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            record: Arc::clone(&other.record),
            calls: Arc::clone(&other.calls),
            failures: Arc::clone(&other.failures),
            latency: other.latency,
            in_flight: Arc::clone(&other.in_flight),
            max_in_flight: Arc::clone(&other.max_in_flight),
            next_id: Arc::clone(&other.next_id),
        }
    }

    async fn enter(&self, op: Op, call: ProviderCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut failures = self.failures.lock().unwrap();
        if let Some(pos) = failures.iter().position(|(o, _)| *o == op) {
            let (_, kind) = failures.remove(pos);
            return Err(error_of(kind));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn lookup(&self, domain: &str, host_record: &str) -> Result<Option<DnsRecord>> {
        self.enter(
            Op::Lookup,
            ProviderCall::Lookup {
                domain: domain.to_string(),
                host_record: host_record.to_string(),
            },
        )
        .await?;

        Ok(self.record.lock().unwrap().clone())
    }

    async fn create_record(&self, domain: &str, host_record: &str, ip: &str) -> Result<String> {
        self.enter(
            Op::Create,
            ProviderCall::Create {
                domain: domain.to_string(),
                host_record: host_record.to_string(),
                ip: ip.to_string(),
            },
        )
        .await?;

        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        *self.record.lock().unwrap() = Some(DnsRecord::new(id.clone(), ip));
        Ok(id)
    }

    async fn update_record(&self, record_id: &str, host_record: &str, ip: &str) -> Result<()> {
        self.enter(
            Op::Update,
            ProviderCall::Update {
                record_id: record_id.to_string(),
                host_record: host_record.to_string(),
                ip: ip.to_string(),
            },
        )
        .await?;

        let mut record = self.record.lock().unwrap();
        match record.as_mut() {
            Some(existing) if existing.id == record_id => {
                existing.value = ip.to_string();
                Ok(())
            }
            _ => Err(Error::provider_client(
                "DomainRecordNotBelongToUser",
                "The DNS record does not exist.",
            )),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal UpdaterConfig for testing
pub fn minimal_config() -> UpdaterConfig {
    UpdaterConfig::new(
        RecordConfig::new(DOMAIN, HOST_RECORD),
        ProviderConfig::new("test-access-key-id", "test-access-key-secret"),
    )
}

/// Drain every event currently buffered in the channel
pub fn drain_events<T>(rx: &mut mpsc::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
