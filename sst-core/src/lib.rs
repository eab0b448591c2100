//! Core SimpleStamp functionality
//!
//! This crate provides:
//! - Varint and length-prefixed block codec
//! - Calendar response parsing and serialization
//! - Operation chain execution (lookup keys and proof recovery)
//! - The timestamp aggregate and its inspection view

pub mod execution;
pub mod nonce;
pub mod parser;
pub mod timestamp;
pub mod varint;
pub mod view;

pub use execution::{derive_key, fold};
pub use nonce::NonceGenerator;
pub use parser::{parse, serialize};
pub use timestamp::Timestamp;
pub use view::{AttestationView, OperationView, TimestampView};
