//! Configuration for the dashboard engine.

use std::time::Duration;

use crate::geo::Coordinate;

/// Default backend base URL (local development server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default telemetry poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default receiver-status poll interval.
pub const DEFAULT_RECEIVER_POLL_INTERVAL_MS: u64 = 5_000;

/// A receiver heartbeat older than this counts as offline.
pub const DEFAULT_RECEIVER_TIMEOUT_SECS: i64 = 15;

/// Default number of history samples requested when seeding the views.
pub const DEFAULT_SEED_SAMPLES: usize = 100;

/// Default travelled-path trail length.
pub const DEFAULT_PATH_CAPACITY: usize = 20;

/// Default heat-overlay point count.
pub const DEFAULT_HEAT_CAPACITY: usize = 200;

/// Default rolling chart window, in samples.
pub const DEFAULT_CHART_CAPACITY: usize = 30;

/// Default event-log length.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Base-station coordinates used until the backend reports real ones.
pub const DEFAULT_BASE_STATION: Coordinate = Coordinate {
    latitude: 12.9692,
    longitude: 79.1559,
};

/// Optional engine features that a deployment may switch off.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFlags {
    /// Compute and publish the tracker-to-base-station distance label.
    pub distance_calculator: bool,
    /// Poll the receiver heartbeat endpoint and publish liveness.
    pub receiver_liveness: bool,
    /// Allow switching the backend between simulated and hardware feeds.
    pub hardware_toggle: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            distance_calculator: true,
            receiver_liveness: true,
            hardware_toggle: true,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,

    /// How often to poll the telemetry feed.
    pub poll_interval: Duration,

    /// How often to poll the receiver heartbeat.
    pub receiver_poll_interval: Duration,

    /// Heartbeat age past which the receiver counts as offline.
    pub receiver_timeout: chrono::Duration,

    /// History samples requested when seeding views at startup.
    pub seed_samples: usize,

    /// Travelled-path trail capacity.
    pub path_capacity: usize,

    /// Heat-overlay point capacity.
    pub heat_capacity: usize,

    /// Rolling chart window capacity.
    pub chart_capacity: usize,

    /// Event-log capacity.
    pub log_capacity: usize,

    /// Fallback position when no base-station location is known yet.
    pub base_station: Coordinate,

    /// Optional feature switches.
    pub features: FeatureFlags,
}

impl DashboardConfig {
    /// Create a config for the given backend, defaults elsewhere.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            receiver_poll_interval: Duration::from_millis(DEFAULT_RECEIVER_POLL_INTERVAL_MS),
            receiver_timeout: chrono::Duration::seconds(DEFAULT_RECEIVER_TIMEOUT_SECS),
            seed_samples: DEFAULT_SEED_SAMPLES,
            path_capacity: DEFAULT_PATH_CAPACITY,
            heat_capacity: DEFAULT_HEAT_CAPACITY,
            chart_capacity: DEFAULT_CHART_CAPACITY,
            log_capacity: DEFAULT_LOG_CAPACITY,
            base_station: DEFAULT_BASE_STATION,
            features: FeatureFlags::default(),
        }
    }
}
