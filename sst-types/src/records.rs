//! Persisted record layout for timestamps, attestations and operations.
//!
//! These are field-numbered protobuf messages. Encoding must stay bit-exact
//! with other SimpleStamp implementations: a field equal to its zero value is
//! omitted, and enum zero values are sentinels.

use serde::Serialize;

/// Operation type. The discriminants double as the calendar wire tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OperationType {
    Attestation = 0x00,
    Sha1 = 0x02,
    Ripemd160 = 0x03,
    Sha256 = 0x08,
    Append = 0xf0,
    Prepend = 0xf1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AttestationStatus {
    Invalid = 0,
    Unknown = 1,
    Pending = 2,
    Bitcoin = 3,
    Litecoin = 4,
}

const OPERATION_TYPE_LABELS: [(OperationType, &str); 6] = [
    (OperationType::Attestation, "ATTESTATION"),
    (OperationType::Sha1, "SHA1"),
    (OperationType::Ripemd160, "RIPEMD160"),
    (OperationType::Sha256, "SHA256"),
    (OperationType::Append, "APPEND"),
    (OperationType::Prepend, "PREPEND"),
];

const ATTESTATION_STATUS_LABELS: [(AttestationStatus, &str); 5] = [
    (AttestationStatus::Invalid, "INVALID"),
    (AttestationStatus::Unknown, "UNKNOWN"),
    (AttestationStatus::Pending, "PENDING"),
    (AttestationStatus::Bitcoin, "BITCOIN"),
    (AttestationStatus::Litecoin, "LITECOIN"),
];

impl OperationType {
    pub fn label(self) -> &'static str {
        OPERATION_TYPE_LABELS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or("ATTESTATION", |(_, label)| *label)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        OPERATION_TYPE_LABELS
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(kind, _)| *kind)
    }
}

impl AttestationStatus {
    pub fn label(self) -> &'static str {
        ATTESTATION_STATUS_LABELS
            .iter()
            .find(|(status, _)| *status == self)
            .map_or("INVALID", |(_, label)| *label)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        ATTESTATION_STATUS_LABELS
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(status, _)| *status)
    }
}

/// Label for a raw operation type; unknown values read as the zero value.
pub fn operation_type_label(value: i32) -> &'static str {
    OperationType::try_from(value)
        .unwrap_or(OperationType::Attestation)
        .label()
}

/// Label for a raw attestation status; unknown values read as `INVALID`.
pub fn attestation_status_label(value: i32) -> &'static str {
    AttestationStatus::try_from(value)
        .unwrap_or(AttestationStatus::Invalid)
        .label()
}

/// One step of an operation chain
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operation {
    #[prost(enumeration = "OperationType", tag = "1")]
    pub kind: i32,
    /// Operand for APPEND / PREPEND
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
    /// Only meaningful for ATTESTATION
    #[prost(enumeration = "AttestationStatus", tag = "3")]
    pub status: i32,
    #[prost(string, tag = "4")]
    pub calendar_url: String,
    #[prost(uint32, tag = "5")]
    pub block_height: u32,
}

impl Operation {
    pub fn sha1() -> Self {
        Self::of_kind(OperationType::Sha1)
    }

    pub fn ripemd160() -> Self {
        Self::of_kind(OperationType::Ripemd160)
    }

    pub fn sha256() -> Self {
        Self::of_kind(OperationType::Sha256)
    }

    pub fn append(value: Vec<u8>) -> Self {
        Self {
            value,
            ..Self::of_kind(OperationType::Append)
        }
    }

    pub fn prepend(value: Vec<u8>) -> Self {
        Self {
            value,
            ..Self::of_kind(OperationType::Prepend)
        }
    }

    /// A pending attestation naming the calendar that will upgrade it
    pub fn pending(calendar_url: impl Into<String>) -> Self {
        Self {
            status: AttestationStatus::Pending as i32,
            calendar_url: calendar_url.into(),
            ..Self::of_kind(OperationType::Attestation)
        }
    }

    /// A block-anchored attestation (BITCOIN or LITECOIN)
    pub fn anchored(status: AttestationStatus, block_height: u32) -> Self {
        Self {
            status: status as i32,
            block_height,
            ..Self::of_kind(OperationType::Attestation)
        }
    }

    /// An attestation with an unrecognized magic tag
    pub fn unknown_attestation() -> Self {
        Self {
            status: AttestationStatus::Unknown as i32,
            ..Self::of_kind(OperationType::Attestation)
        }
    }

    fn of_kind(kind: OperationType) -> Self {
        Self {
            kind: kind as i32,
            ..Default::default()
        }
    }
}

/// A calendar's proof for one timestamp
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Attestation {
    #[prost(string, tag = "1")]
    pub calendar_url: String,
    /// Unix seconds at which the attestation was attached
    #[prost(uint32, tag = "2")]
    pub submitted: u32,
    #[prost(message, repeated, tag = "3")]
    pub operations: Vec<Operation>,
    #[prost(enumeration = "AttestationStatus", tag = "4")]
    pub status: i32,
    #[prost(uint32, tag = "5")]
    pub block_height: u32,
    #[prost(bytes = "vec", tag = "6")]
    pub block_merkle_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub timestamp_merkle_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub transaction_id: Vec<u8>,
}

impl Attestation {
    pub fn with_operations(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            ..Default::default()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == AttestationStatus::Pending as i32
    }
}

/// Optional subject information mixed into the digest hash
#[derive(Clone, PartialEq, Eq, Serialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[prost(string, tag = "1")]
    pub country_code: String,
    #[prost(string, tag = "2")]
    pub state: String,
    #[prost(string, tag = "3")]
    pub city: String,
    #[prost(string, tag = "4")]
    pub organization: String,
    #[prost(string, tag = "5")]
    pub section: String,
    #[prost(string, tag = "6")]
    pub common_name: String,
    #[prost(string, tag = "7")]
    pub email: String,
    #[prost(string, tag = "8")]
    pub full_name: String,
}

/// Where and how the timestamp was created
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "2")]
    pub longitude: f64,
    #[prost(double, tag = "3")]
    pub altitude: f64,
    #[prost(float, tag = "4")]
    pub accuracy_meters: f32,
    #[prost(float, tag = "5")]
    pub direction: f32,
    #[prost(float, tag = "6")]
    pub velocity: f32,
}

/// Top-level persisted timestamp
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimestampRecord {
    #[prost(bytes = "vec", tag = "1")]
    pub hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub nonce: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub created: u32,
    #[prost(string, tag = "4")]
    pub source: String,
    #[prost(message, optional, tag = "5")]
    pub identity: Option<Identity>,
    #[prost(message, optional, tag = "6")]
    pub location: Option<Location>,
    #[prost(message, repeated, tag = "7")]
    pub attestations: Vec<Attestation>,
}
