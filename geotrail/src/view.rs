//! View surface abstraction.
//!
//! The synchronizer never touches a UI directly. Everything it wants shown
//! goes through [`ViewSink`], one method per surface: marker, trail, heat
//! overlay, charts, status readouts, banner, minimap, event log. A real
//! frontend implements this against its widgets; tests implement it with a
//! recorder; [`TracingViewSink`] renders everything as structured log events
//! for headless runs.

use crate::geo::Coordinate;
use crate::history::{ChartHistory, HeatPoint};
use crate::status::{Connection, DerivedStatus};

/// Receiver for view updates published by the synchronizer.
///
/// Methods are invoked in a fixed order within a tick (marker before trail,
/// status before banner) and never concurrently.
pub trait ViewSink {
    /// The tracker marker moved. `using_fallback` is true when the position
    /// is the base-station substitute, not a real fix.
    fn marker_moved(&mut self, position: Coordinate, using_fallback: bool);

    /// The travelled-path trail changed; `path` is oldest-first.
    fn path_updated(&mut self, path: &[Coordinate]);

    /// The heat-density overlay changed; `points` is oldest-first.
    fn heat_updated(&mut self, points: &[HeatPoint]);

    /// The rolling chart series changed.
    fn charts_updated(&mut self, charts: &ChartHistory);

    /// Derived status readouts changed.
    fn status_updated(&mut self, status: &DerivedStatus);

    /// The connection banner changed.
    fn banner_changed(&mut self, connection: Connection);

    /// The minimap position indicator moved.
    fn minimap_moved(&mut self, position: Coordinate);

    /// The tracker-to-base-station distance label changed.
    fn distance_label(&mut self, text: &str);

    /// The main map camera should center on `position`.
    fn camera_centered(&mut self, position: Coordinate);

    /// A line was appended to the event log (display is newest-first).
    fn log_appended(&mut self, line: &str);

    /// Receiver liveness changed or was re-reported.
    fn receiver_status(&mut self, online: bool, position: Coordinate);

    /// All view state was cleared (data-source switch).
    fn views_reset(&mut self);

    /// A transient user-facing notice (switch failures, logout).
    fn notice(&mut self, message: &str);
}

/// View sink that renders every update as a `tracing` event.
///
/// Used by the CLI, where the "dashboard" is the log stream.
#[derive(Debug, Default)]
pub struct TracingViewSink;

impl ViewSink for TracingViewSink {
    fn marker_moved(&mut self, position: Coordinate, using_fallback: bool) {
        tracing::info!(
            latitude = position.latitude,
            longitude = position.longitude,
            using_fallback,
            "marker moved"
        );
    }

    fn path_updated(&mut self, path: &[Coordinate]) {
        tracing::debug!(points = path.len(), "path updated");
    }

    fn heat_updated(&mut self, points: &[HeatPoint]) {
        tracing::debug!(points = points.len(), "heat overlay updated");
    }

    fn charts_updated(&mut self, charts: &ChartHistory) {
        tracing::debug!(samples = charts.len(), "charts updated");
    }

    fn status_updated(&mut self, status: &DerivedStatus) {
        tracing::info!(
            fix = %status.fix_quality,
            battery = %status.battery_level,
            battery_percent = status.battery_percent,
            signal = %status.signal_quality,
            rescue = status.rescue_active,
            beacon = status.beacon_active,
            "status updated"
        );
    }

    fn banner_changed(&mut self, connection: Connection) {
        tracing::info!(connection = %connection, "banner changed");
    }

    fn minimap_moved(&mut self, position: Coordinate) {
        tracing::debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            "minimap moved"
        );
    }

    fn distance_label(&mut self, text: &str) {
        tracing::debug!(distance = text, "distance label updated");
    }

    fn camera_centered(&mut self, position: Coordinate) {
        tracing::debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            "camera centered"
        );
    }

    fn log_appended(&mut self, line: &str) {
        tracing::info!(entry = line, "event log");
    }

    fn receiver_status(&mut self, online: bool, position: Coordinate) {
        tracing::info!(
            online,
            latitude = position.latitude,
            longitude = position.longitude,
            "receiver status"
        );
    }

    fn views_reset(&mut self) {
        tracing::info!("views reset");
    }

    fn notice(&mut self, message: &str) {
        tracing::warn!(message, "notice");
    }
}
