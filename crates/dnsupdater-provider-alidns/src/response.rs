//! Typed Alidns response bodies
//!
//! Only the fields dnsupdater reads are declared; unknown fields are ignored.

use serde::Deserialize;

/// `DescribeDomainRecords` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeDomainRecordsResponse {
    pub total_count: u64,
    #[serde(default)]
    pub domain_records: DomainRecords,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DomainRecords {
    #[serde(default)]
    pub record: Vec<RecordEntry>,
}

/// One entry of `DomainRecords.Record`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RecordEntry {
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    pub value: String,
}

/// `AddDomainRecord` / `UpdateDomainRecord` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RecordIdResponse {
    pub record_id: String,
    #[serde(default)]
    pub request_id: String,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}
