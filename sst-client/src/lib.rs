//! SimpleStamp Client Library
//!
//! Submits digest hashes to remote calendar servers, upgrades pending
//! attestations and keeps timestamps in local storage.

pub mod calendar;
pub mod config;
pub mod storage;
pub mod transport;

pub use calendar::CalendarClient;
pub use config::CalendarConfig;
pub use storage::StampStorage;
pub use transport::{CalendarRequest, CalendarTransport, HttpTransport, Method};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error(transparent)]
    Chain(#[from] sst_types::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
