//! Error types for SimpleStamp

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Truncated input: need {needed} bytes, only {available} available")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Varint does not fit in 64 bits")]
    VarintOverflow,

    #[error("Operation with type {0:#04x} not supported")]
    UnsupportedOperation(u8),

    #[error("Cannot handle an operation of type {0}")]
    UnhandledOperation(i32),

    #[error("Calendar URL is not valid UTF-8")]
    InvalidCalendarUrl,

    #[error("Attestation with status {0} has no wire representation")]
    UnserializableAttestation(i32),

    #[error("No attestation was found with a matching calendar key")]
    NotFound,

    #[error("Attestation has already been upgraded with timestamp data")]
    AlreadyUpgraded,

    #[error("Timestamp already sent for attestation, cannot change {0}")]
    AlreadyStamped(&'static str),

    #[error("Timestamp requires a hash with content")]
    EmptyHash,

    #[error("Failed to decode timestamp record: {0}")]
    MalformedAggregate(String),

    #[error("Invalid digest length: expected {expected}, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("Invalid nonce")]
    InvalidNonce,

    #[error("Hex encoding error: {0}")]
    HexEncoding(#[from] hex::FromHexError),
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::MalformedAggregate(err.to_string())
    }
}
