//! Core types for SimpleStamp
//!
//! This crate defines the operation-chain and timestamp records shared by
//! the parser, the chain executor and the calendar client, together with the
//! error taxonomy used across the workspace.

pub mod error;
pub mod primitives;
pub mod records;

pub use error::{Error, Result};
pub use primitives::{CalendarKey, Digest, Nonce};
pub use records::{
    attestation_status_label, operation_type_label, Attestation, AttestationStatus, Identity,
    Location, Operation, OperationType, TimestampRecord,
};
