//! Fan-out to calendar servers
//!
//! Requests to different calendars run concurrently and are awaited as one
//! batch. Responses are then applied to the timestamp one at a time, so the
//! in-flight requests never touch the timestamp. A calendar that fails or
//! answers with bad data is logged and skipped; it never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use sst_core::Timestamp;
use sst_types::CalendarKey;
use tracing::{debug, info, warn};

use crate::config::CalendarConfig;
use crate::transport::{CalendarRequest, CalendarTransport, HttpTransport};
use crate::{ClientError, Result};

pub struct CalendarClient {
    config: CalendarConfig,
    transport: Arc<dyn CalendarTransport>,
}

impl CalendarClient {
    /// Create a client talking HTTP to the configured calendars
    pub fn new(config: CalendarConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: CalendarConfig, transport: Arc<dyn CalendarTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    async fn fetch(&self, request: CalendarRequest) -> Result<Vec<u8>> {
        debug!("{:?} {}", request.method, request.url);
        let body = self.transport.send(&request).await?;
        if body.is_empty() {
            return Err(ClientError::EmptyResponse(request.url));
        }
        Ok(body)
    }

    /// Submit the digest hash to every configured calendar.
    pub async fn stamp(&self, timestamp: &mut Timestamp) -> usize {
        self.stamp_urls(timestamp, &self.config.calendars).await
    }

    /// Submit the digest hash to `urls`, returning how many new attestations
    /// were attached.
    pub async fn stamp_urls(&self, timestamp: &mut Timestamp, urls: &[String]) -> usize {
        let digest = timestamp.digest_hash();
        let responses = join_all(
            urls.iter()
                .map(|url| self.fetch(CalendarRequest::digest(url, &digest))),
        )
        .await;

        let mut stamps = 0;
        for (url, response) in urls.iter().zip(responses) {
            let imported = response.and_then(|bytes| {
                timestamp
                    .import_digest_response(&bytes)
                    .map_err(ClientError::from)
            });

            match imported {
                Ok(true) => {
                    info!("Digest {} submitted to {}", digest, url);
                    stamps += 1;
                }
                Ok(false) => debug!("{} already attests this timestamp", url),
                Err(e) => warn!("Failed to stamp with {}: {}", url, e),
            }
        }

        stamps
    }

    /// Ask each pending attestation's calendar for its continuation.
    ///
    /// Returns false without any request when nothing is pending; otherwise
    /// true if at least one attestation was upgraded.
    pub async fn update(&self, timestamp: &mut Timestamp) -> bool {
        let pending: Vec<(String, CalendarKey)> = timestamp
            .pending()
            .filter_map(|attestation| match timestamp.calendar_key(attestation) {
                Ok(key) => Some((attestation.calendar_url.clone(), key)),
                Err(e) => {
                    warn!("Cannot derive key for {}: {}", attestation.calendar_url, e);
                    None
                }
            })
            .collect();

        if pending.is_empty() {
            return false;
        }

        let responses = join_all(
            pending
                .iter()
                .map(|(url, key)| self.fetch(CalendarRequest::timestamp(url, key))),
        )
        .await;

        let mut upgraded = false;
        for ((url, key), response) in pending.iter().zip(responses) {
            let result = response.and_then(|bytes| {
                timestamp
                    .upgrade_attestation(key, &bytes)
                    .map_err(ClientError::from)
            });

            match result {
                Ok(()) => {
                    info!("Attestation from {} upgraded", url);
                    upgraded = true;
                }
                Err(e) => warn!("Attestation from {} not upgraded: {}", url, e),
            }
        }

        upgraded
    }
}
