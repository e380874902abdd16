//! GeoTrail - client-side engine for a live GPS/telemetry tracking dashboard.
//!
//! This library implements the pipeline behind the dashboard: it periodically
//! pulls a telemetry snapshot from a backend, decides how trustworthy and
//! "live" that snapshot is, derives operator-facing status signals, and keeps
//! every visual projection (map marker, travelled path, heat overlay, rolling
//! charts, event log, mini-map) mutually consistent as snapshots arrive.
//!
//! # Architecture
//!
//! ```text
//! TelemetryPoller ──fetch──▶ BackendClient (HTTP)
//!       │
//!       ▼ snapshot / failure / no-data (+ sequence number)
//! ViewSynchronizer ──▶ fix::resolve ──▶ status::derive
//!       │
//!       ├─▶ DashboardHistory (path / heat / charts / log, bounded FIFO)
//!       └─▶ ViewSink (marker, path, charts, badges, banner, camera, ...)
//! ```
//!
//! The [`source::ModeArbiter`] decides which backend feed is polled
//! (simulated vs hardware) and owns the base-station location; switching
//! sources clears every history buffer and re-seeds the views.
//!
//! # Components
//!
//! - [`geo`] - great-circle distance and distance formatting
//! - [`telemetry`] - wire types: `TelemetrySnapshot`, `ReceiverStatus`
//! - [`fix`] - GPS fix validation with base-station fallback
//! - [`status`] - pure snapshot → status-bundle derivation
//! - [`history`] - fixed-capacity ring buffers for every projection
//! - [`source`] - simulated/hardware arbitration and preference persistence
//! - [`backend`] - `BackendClient` trait and reqwest implementation
//! - [`view`] - `ViewSink` seam to the rendering layer
//! - [`sync`] - `ViewSynchronizer`, the per-tick orchestrator
//! - [`poller`] - fixed-interval scheduler driving the whole pipeline

pub mod backend;
pub mod config;
pub mod fix;
pub mod geo;
pub mod history;
pub mod logging;
pub mod poller;
pub mod source;
pub mod status;
pub mod sync;
pub mod telemetry;
pub mod view;

/// Version of the GeoTrail library and CLI.
///
/// Synchronized across all workspace members and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
