//! Wire types for inbound telemetry.
//!
//! A [`TelemetrySnapshot`] is one reading from the backend feed. It is
//! transient: consumed once per poll tick, folded into the history buffers
//! and derived status, then discarded. Fields the transmitter may omit are
//! explicit `Option`s here; default substitution happens exactly once, in
//! [`crate::status::derive`] and the chart append, never in consumers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Provenance of the currently displayed telemetry, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryMode {
    /// Generated by the backend's offline simulation.
    #[default]
    Simulated,
    /// Relayed from real hardware.
    Live,
}

impl std::fmt::Display for TelemetryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => write!(f, "simulated"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// One inbound telemetry reading.
///
/// Coordinates both absent, or both within 1e-4 degrees of zero, mean
/// **no-fix** - never a valid position of (0, 0). That classification lives
/// in [`crate::fix::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetrySnapshot {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Ground speed in km/h.
    #[serde(default)]
    pub speed: Option<f64>,
    /// GPS satellites in view.
    #[serde(default)]
    pub satellites: Option<u32>,
    /// Battery voltage in volts.
    #[serde(default)]
    pub battery: Option<f64>,
    /// Received signal strength in dBm.
    #[serde(default)]
    pub rssi: Option<i32>,
    /// Packets per minute reported by the link.
    #[serde(default)]
    pub data_rate: Option<u32>,
    /// Link latency in milliseconds.
    #[serde(default)]
    pub latency: Option<u32>,
    /// Packet loss percentage.
    #[serde(default)]
    pub packet_loss: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub mode: TelemetryMode,
    /// Backend-assigned ISO 8601 timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Latest base-station receiver heartbeat from `GET /receiver_status`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverStatus {
    /// Backend-assigned ISO 8601 timestamp of the last heartbeat.
    pub timestamp: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Receiver-side RSSI in dBm, if reported.
    #[serde(default)]
    pub signal_strength: Option<i32>,
}

impl ReceiverStatus {
    /// Whether the receiver counts as online: its last heartbeat is younger
    /// than `timeout` relative to `now`. An unparseable timestamp is offline.
    pub fn is_online(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        match parse_backend_timestamp(&self.timestamp) {
            Some(seen) => now.signed_duration_since(seen) < timeout,
            None => false,
        }
    }
}

/// Parse a backend timestamp.
///
/// The backend emits `datetime.utcnow().isoformat()` - naive UTC without an
/// offset - but RFC 3339 timestamps are accepted too.
pub fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
