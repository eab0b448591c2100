//! HTTP requests to calendar servers
//!
//! The calendar client builds [`CalendarRequest`]s and hands them to a
//! [`CalendarTransport`]. [`HttpTransport`] is the production implementation;
//! tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use sst_types::{CalendarKey, Digest};

use crate::{ClientError, Result};

pub const OTS_MEDIA_TYPE: &str = "application/vnd.opentimestamps.v1";
pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

impl CalendarRequest {
    /// `POST <base>/digest` with the raw digest hash as body
    pub fn digest(base: &str, digest: &Digest) -> Self {
        Self {
            method: Method::Post,
            url: endpoint(base, "digest"),
            body: Some(digest.as_bytes().to_vec()),
        }
    }

    /// `GET <base>/timestamp/<hex key>`
    pub fn timestamp(base: &str, key: &CalendarKey) -> Self {
        Self {
            method: Method::Get,
            url: endpoint(base, &format!("timestamp/{}", key.to_hex())),
            body: None,
        }
    }
}

#[async_trait]
pub trait CalendarTransport: Send + Sync {
    /// Issue `request` and return the raw response body.
    async fn send(&self, request: &CalendarRequest) -> Result<Vec<u8>>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(e.to_string())
    }
}

#[async_trait]
impl CalendarTransport for HttpTransport {
    async fn send(&self, request: &CalendarRequest) -> Result<Vec<u8>> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, FORM_MEDIA_TYPE)
                .body(request.body.clone().unwrap_or_default()),
        };

        let response = builder
            .header(ACCEPT, OTS_MEDIA_TYPE)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!(
                "{} returned {}",
                request.url, status
            )));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(body.to_vec())
    }
}
