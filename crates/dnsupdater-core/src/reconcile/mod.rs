//! Reconciliation decision
//!
//! Maps the resolved public IP and the provider's current record to the
//! single action the scheduler should take. Pure and synchronous.

use crate::traits::DnsRecord;

/// What the scheduler should do this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// The record already points at the current IP
    NoOp,

    /// No record exists; create one
    Create {
        /// IP to register
        ip: String,
    },

    /// A record exists with a stale value; overwrite it
    Update {
        /// ID of the existing record
        record_id: String,
        /// IP to write
        ip: String,
    },
}

/// Decide how to bring `existing` in line with `current_ip`
///
/// Values are compared as strings, exactly as the IP source and provider
/// report them.
pub fn decide(current_ip: &str, existing: Option<&DnsRecord>) -> ReconcileDecision {
    match existing {
        None => ReconcileDecision::Create {
            ip: current_ip.to_string(),
        },
        Some(record) if record.value != current_ip => ReconcileDecision::Update {
            record_id: record.id.clone(),
            ip: current_ip.to_string(),
        },
        Some(_) => ReconcileDecision::NoOp,
    }
}
