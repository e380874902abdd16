//! Backend client trait and HTTP implementation.
//!
//! The [`BackendClient`] trait mirrors the tracking server's REST surface.
//! Endpoints that may legitimately have nothing to say (the hardware feed
//! before the first packet) are modeled in the return type rather than as
//! errors, so the poller never confuses "no data yet" with a failure.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::error::BackendError;
use crate::geo::Coordinate;
use crate::source::DataSource;
use crate::telemetry::{ReceiverStatus, TelemetrySnapshot};

/// Default HTTP timeout for backend requests.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of polling the hardware feed.
#[derive(Debug, Clone)]
pub enum SnapshotFetch {
    /// A reading was available.
    Snapshot(TelemetrySnapshot),
    /// 204: the feed is healthy but no packet has arrived yet.
    NoDataYet,
}

/// Abstraction over the tracking server's REST endpoints.
pub trait BackendClient: Send + Sync {
    /// `GET /data` - current snapshot from the active source.
    fn fetch_snapshot(
        &self,
    ) -> impl Future<Output = Result<TelemetrySnapshot, BackendError>> + Send;

    /// `GET /data/latest_hardware` - latest real hardware packet, which may
    /// not exist yet (204).
    fn fetch_latest_hardware(
        &self,
    ) -> impl Future<Output = Result<SnapshotFetch, BackendError>> + Send;

    /// `GET /history?n=` - the most recent `count` snapshots, oldest last.
    fn fetch_history(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<TelemetrySnapshot>, BackendError>> + Send;

    /// `GET /api/base_station_location` - the receiver's surveyed position.
    fn fetch_base_station(
        &self,
    ) -> impl Future<Output = Result<Coordinate, BackendError>> + Send;

    /// `GET /receiver_status` - the receiver's last heartbeat.
    fn fetch_receiver_status(
        &self,
    ) -> impl Future<Output = Result<ReceiverStatus, BackendError>> + Send;

    /// `POST /api/set_data_source` - switch the backend feed.
    fn set_data_source(
        &self,
        source: DataSource,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// `POST /api/logout` - end the authenticated session.
    fn logout(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[derive(serde::Serialize)]
struct SetDataSourceRequest {
    source: DataSource,
}

/// History responses arrive newest-first from the server.
#[derive(Deserialize)]
struct HistoryResponse {
    history: Vec<TelemetrySnapshot>,
}

/// HTTP client for the real tracking server.
///
/// Uses a reusable `reqwest::Client` with connection pooling, a cookie store
/// for the session, and request timeouts.
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    /// Create a client for the server at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, BackendError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| BackendError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::HttpError(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::JsonError(e.to_string()))
    }
}

impl BackendClient for HttpBackendClient {
    async fn fetch_snapshot(&self) -> Result<TelemetrySnapshot, BackendError> {
        self.get_json("/data").await
    }

    async fn fetch_latest_hardware(&self) -> Result<SnapshotFetch, BackendError> {
        let response = self
            .http
            .get(self.url("/data/latest_hardware"))
            .send()
            .await
            .map_err(|e| BackendError::HttpError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(SnapshotFetch::NoDataYet);
        }
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::HttpError(e.to_string()))?;

        let snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::JsonError(e.to_string()))?;
        Ok(SnapshotFetch::Snapshot(snapshot))
    }

    async fn fetch_history(&self, count: usize) -> Result<Vec<TelemetrySnapshot>, BackendError> {
        let response: HistoryResponse = self.get_json(&format!("/history?n={count}")).await?;
        Ok(response.history)
    }

    async fn fetch_base_station(&self) -> Result<Coordinate, BackendError> {
        self.get_json("/api/base_station_location").await
    }

    async fn fetch_receiver_status(&self) -> Result<ReceiverStatus, BackendError> {
        self.get_json("/receiver_status").await
    }

    async fn set_data_source(&self, source: DataSource) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/api/set_data_source"))
            .json(&SetDataSourceRequest { source })
            .send()
            .await
            .map_err(|e| BackendError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/api/logout"))
            .send()
            .await
            .map_err(|e| BackendError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}
