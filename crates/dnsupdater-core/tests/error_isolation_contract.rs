//! Contract Test: Error Isolation
//!
//! This test verifies that failures never escape a cycle.
//!
//! Constraints verified:
//! - A failure at any step aborts only the current cycle
//! - The loop keeps its cadence after failures (no backoff, no extra retries)
//! - Failures are reported with the step and error kind that caused them
//! - Persistent (client-side) and transient (server-side) provider errors
//!   are told apart in reporting, but recovered the same way

mod common;

use common::*;
use dnsupdater_core::error::ErrorKind;
use dnsupdater_core::{CycleOutcome, CycleStep, Scheduler, SchedulerEvent};
use std::time::Duration;

#[tokio::test]
async fn each_step_failure_is_tagged() {
    let cases = [
        (Op::Lookup, CycleStep::LookupRecord, ErrorKind::ProviderServer),
        (Op::Create, CycleStep::CreateRecord, ErrorKind::ProviderClient),
    ];

    for (op, step, kind) in cases {
        let provider = MockDnsProvider::empty();
        provider.fail_next(op, kind);

        let (scheduler, _event_rx) = Scheduler::new(
            Box::new(ScriptedIpSource::fixed("203.0.113.5")),
            Box::new(MockDnsProvider::sharing_counters_with(&provider)),
            &minimal_config(),
        )
        .expect("scheduler construction succeeds");

        let err = scheduler.run_cycle().await.expect_err("cycle fails");
        assert_eq!(err.step, step);
        assert_eq!(err.source.kind(), kind);

        // Nothing sticks: the next cycle goes through
        let outcome = scheduler.run_cycle().await.expect("next cycle succeeds");
        assert!(matches!(outcome, CycleOutcome::Created { .. }));
    }
}

#[tokio::test]
async fn update_failure_leaves_record_untouched() {
    let provider = MockDnsProvider::with_record("rec-1", "203.0.113.5");
    provider.fail_next(Op::Update, ErrorKind::ProviderServer);

    let (scheduler, _event_rx) = Scheduler::new(
        Box::new(ScriptedIpSource::fixed("198.51.100.9")),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        &minimal_config(),
    )
    .expect("scheduler construction succeeds");

    let err = scheduler.run_cycle().await.expect_err("cycle fails");
    assert_eq!(err.step, CycleStep::UpdateRecord);
    assert!(!err.source.is_persistent());
    assert_eq!(provider.current_record().unwrap().value, "203.0.113.5");

    // Exactly one update attempt per cycle
    assert_eq!(provider.mutation_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn loop_survives_failures_at_fixed_cadence() {
    let ip_source = ScriptedIpSource::new(
        vec![
            IpAnswer::Fail(ErrorKind::Network),
            IpAnswer::Ip("203.0.113.5".to_string()),
        ],
        IpAnswer::Ip("203.0.113.5".to_string()),
    );
    let provider = MockDnsProvider::empty();
    provider.fail_next(Op::Lookup, ErrorKind::ProviderClient);

    let (scheduler, mut event_rx) = Scheduler::new(
        Box::new(ScriptedIpSource::sharing_counters_with(&ip_source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        &minimal_config(),
    )
    .expect("scheduler construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(scheduler.run_until(async move {
        let _ = shutdown_rx.await;
    }));

    // t=0s: IP fails, t=5s: lookup rejected, t=10s: created, t=15s: unchanged
    tokio::time::sleep(Duration::from_secs(17)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    assert_eq!(ip_source.call_count(), 4);
    assert_eq!(provider.mutation_count(), 1);

    let events = drain_events(&mut event_rx);
    let failures: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::CycleFailed { step, kind, .. } => Some((*step, *kind)),
            _ => None,
        })
        .collect();
    assert_eq!(
        failures,
        vec![
            (CycleStep::ResolveIp, ErrorKind::Network),
            (CycleStep::LookupRecord, ErrorKind::ProviderClient),
        ]
    );
    assert!(ErrorKind::ProviderClient.is_persistent());
    assert!(!ErrorKind::Network.is_persistent());

    assert!(events.iter().any(|e| matches!(e, SchedulerEvent::RecordCreated { .. })));
    assert!(events.iter().any(|e| matches!(e, SchedulerEvent::RecordUnchanged { .. })));
}

#[tokio::test(start_paused = true)]
async fn cycles_never_overlap() {
    // Provider calls take longer than the poll interval
    let provider = MockDnsProvider::empty().with_latency(Duration::from_secs(7));
    let ip_source = ScriptedIpSource::new(
        vec![
            IpAnswer::Ip("203.0.113.5".to_string()),
            IpAnswer::Ip("198.51.100.9".to_string()),
        ],
        IpAnswer::Ip("198.51.100.9".to_string()),
    );

    let (scheduler, _event_rx) = Scheduler::new(
        Box::new(ScriptedIpSource::sharing_counters_with(&ip_source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        &minimal_config(),
    )
    .expect("scheduler construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(scheduler.run_until(async move {
        let _ = shutdown_rx.await;
    }));

    tokio::time::sleep(Duration::from_secs(60)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    assert_eq!(provider.max_in_flight(), 1, "provider calls must never run concurrently");
    assert!(ip_source.call_count() >= 2);
    // Cycle 1 creates, cycle 2 updates, later cycles settle
    let mutations: Vec<_> = provider
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, ProviderCall::Lookup { .. }))
        .collect();
    assert!(matches!(
        mutations.as_slice(),
        [ProviderCall::Create { .. }, ProviderCall::Update { .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn full_event_channel_never_stalls_the_loop() {
    let ip_source = ScriptedIpSource::fixed("203.0.113.5");
    let provider = MockDnsProvider::empty();

    let mut config = minimal_config();
    config.scheduler.event_channel_capacity = 1;

    // The receiver is kept alive but never read until the end
    let (scheduler, mut event_rx) = Scheduler::new(
        Box::new(ScriptedIpSource::sharing_counters_with(&ip_source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        &config,
    )
    .expect("scheduler construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(scheduler.run_until(async move {
        let _ = shutdown_rx.await;
    }));

    // Cycles at t=0s, 5s and 10s
    tokio::time::sleep(Duration::from_secs(12)).await;
    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler stops despite the full channel")
        .expect("scheduler task completes");

    assert_eq!(ip_source.call_count(), 3);
    assert_eq!(provider.mutation_count(), 1);
    assert!(provider.current_record().is_some());

    // Only the first event fit; everything after it was dropped
    let events = drain_events(&mut event_rx);
    assert_eq!(
        events,
        vec![SchedulerEvent::Started {
            record: FQDN.to_string()
        }]
    );
}
