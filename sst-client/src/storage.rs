//! Local storage for timestamps

use sled::Db;
use sst_core::Timestamp;
use sst_types::Digest;

use crate::{ClientError, Result};

/// sled-backed timestamp store keyed by digest hash.
///
/// Values are the persisted binary record, so anything stored here can be
/// handed to other SimpleStamp implementations unchanged.
pub struct StampStorage {
    db: Db,
}

impl StampStorage {
    /// Open or create a store at the given path
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| ClientError::Storage(format!("Failed to open database: {}", e)))?;

        Ok(Self { db })
    }

    /// Store a timestamp under its current digest hash
    pub fn store(&self, timestamp: &Timestamp) -> Result<Digest> {
        let digest = timestamp.digest_hash();

        self.db
            .insert(digest.as_bytes(), timestamp.to_bytes())
            .map_err(|e| ClientError::Storage(format!("Failed to store timestamp: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| ClientError::Storage(format!("Failed to flush database: {}", e)))?;

        Ok(digest)
    }

    pub fn get(&self, digest: &Digest) -> Result<Option<Timestamp>> {
        let value = self
            .db
            .get(digest.as_bytes())
            .map_err(|e| ClientError::Storage(format!("Failed to retrieve timestamp: {}", e)))?;

        match value {
            Some(bytes) => Ok(Some(Timestamp::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All stored timestamps, in digest order
    pub fn list(&self) -> Result<Vec<(Digest, Timestamp)>> {
        let mut timestamps = Vec::new();

        for item in self.db.iter() {
            let (key, value) = item
                .map_err(|e| ClientError::Storage(format!("Failed to iterate database: {}", e)))?;

            let digest = Digest::from_slice(&key)
                .map_err(|e| ClientError::Storage(format!("Invalid digest in database: {}", e)))?;

            timestamps.push((digest, Timestamp::from_bytes(&value)?));
        }

        Ok(timestamps)
    }

    /// Pretty JSON inspection view of a stored timestamp
    pub fn export_json(&self, digest: &Digest) -> Result<String> {
        let timestamp = self
            .get(digest)?
            .ok_or_else(|| ClientError::Storage(format!("Timestamp not found: {}", digest)))?;

        serde_json::to_string_pretty(&timestamp.view())
            .map_err(|e| ClientError::Storage(format!("Failed to serialize timestamp: {}", e)))
    }

    /// Import a persisted binary record
    pub fn import_bytes(&self, bytes: &[u8]) -> Result<Digest> {
        let timestamp = Timestamp::from_bytes(bytes)?;
        self.store(&timestamp)
    }
}
