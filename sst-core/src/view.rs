//! Human-readable JSON view of a timestamp, for inspection only.

use std::fmt;

use chrono::{DateTime, SecondsFormat};
use serde::Serialize;
use sst_types::{
    attestation_status_label, operation_type_label, Attestation, Digest, Identity, Location,
    Operation,
};

use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampView {
    pub hash: String,
    pub nonce: String,
    pub digest_hash: Digest,
    pub created: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub attestations: Vec<AttestationView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationView {
    pub calendar_url: String,
    pub calendar_key: String,
    pub submitted: String,
    pub status: &'static str,
    pub block_height: u32,
    pub block_merkle_root: String,
    pub timestamp_merkle_root: String,
    pub transaction_id: String,
    pub operations: Vec<OperationView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Empty for non-attestation operations
    pub status: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub calendar_url: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub block_height: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// ISO-8601 UTC with milliseconds, e.g. `2020-03-11T16:39:43.000Z`
fn iso8601(seconds: u32) -> String {
    DateTime::from_timestamp(i64::from(seconds), 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

impl From<&Operation> for OperationView {
    fn from(operation: &Operation) -> Self {
        Self {
            kind: operation_type_label(operation.kind),
            value: hex::encode(&operation.value),
            status: if operation.status == 0 {
                ""
            } else {
                attestation_status_label(operation.status)
            },
            calendar_url: operation.calendar_url.clone(),
            block_height: operation.block_height,
        }
    }
}

impl AttestationView {
    fn new(timestamp: &Timestamp, attestation: &Attestation) -> Self {
        let calendar_key = timestamp
            .calendar_key(attestation)
            .map(|key| key.to_hex())
            .unwrap_or_default();

        Self {
            calendar_url: attestation.calendar_url.clone(),
            calendar_key,
            submitted: iso8601(attestation.submitted),
            status: attestation_status_label(attestation.status),
            block_height: attestation.block_height,
            block_merkle_root: hex::encode(&attestation.block_merkle_root),
            timestamp_merkle_root: hex::encode(&attestation.timestamp_merkle_root),
            transaction_id: hex::encode(&attestation.transaction_id),
            operations: attestation.operations.iter().map(OperationView::from).collect(),
        }
    }
}

impl Timestamp {
    pub fn view(&self) -> TimestampView {
        TimestampView {
            hash: hex::encode(self.hash()),
            nonce: hex::encode(self.nonce()),
            digest_hash: self.digest_hash(),
            created: iso8601(self.created()),
            source: self.source().to_string(),
            identity: self.identity().cloned(),
            location: self.location().cloned(),
            attestations: self
                .attestations()
                .iter()
                .map(|a| AttestationView::new(self, a))
                .collect(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.view()).map_err(|_| fmt::Error)?;
        write!(f, "SimpleStamp: {json}")
    }
}
