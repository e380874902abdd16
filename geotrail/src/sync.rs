//! View synchronization.
//!
//! [`ViewSynchronizer`] folds each poll outcome into the history buffers and
//! publishes the result through a [`ViewSink`]. It owns every piece of
//! dashboard state: the bounded histories, the camera's first-fix latch, and
//! the last-applied sequence number.
//!
//! Snapshots carry a poller-assigned monotonic sequence number. A snapshot
//! whose sequence is not strictly newer than the last applied one is
//! discarded, so a slow response that completes after a newer one can never
//! roll the views backwards.

use chrono::{Local, Utc};

use crate::config::DashboardConfig;
use crate::fix;
use crate::geo::{format_distance, Coordinate};
use crate::history::{DashboardHistory, HeatPoint, LIVE_HEAT_INTENSITY, SEED_HEAT_INTENSITY};
use crate::status::{self, Connection, DEFAULT_BATTERY_VOLTS, DEFAULT_RSSI_DBM};
use crate::telemetry::{parse_backend_timestamp, ReceiverStatus, TelemetrySnapshot};
use crate::view::ViewSink;

/// Folds poll outcomes into view state and publishes through a [`ViewSink`].
pub struct ViewSynchronizer<S: ViewSink> {
    sink: S,
    config: DashboardConfig,
    history: DashboardHistory,
    last_applied_seq: Option<u64>,
    first_fix_centered: bool,
    auto_tracking: bool,
}

impl<S: ViewSink> ViewSynchronizer<S> {
    pub fn new(sink: S, config: DashboardConfig) -> Self {
        let history = DashboardHistory::new(
            config.path_capacity,
            config.heat_capacity,
            config.chart_capacity,
            config.log_capacity,
        );
        Self {
            sink,
            config,
            history,
            last_applied_seq: None,
            first_fix_centered: false,
            auto_tracking: false,
        }
    }

    /// When enabled, the camera follows the marker every tick. When disabled,
    /// the camera centers once on the first valid fix and then stays put.
    pub fn set_auto_tracking(&mut self, enabled: bool) {
        self.auto_tracking = enabled;
    }

    pub fn history(&self) -> &DashboardHistory {
        &self.history
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Apply one successfully fetched snapshot.
    ///
    /// Returns false if the snapshot was discarded as stale (its sequence
    /// number is not newer than the last applied one).
    pub fn apply_snapshot(
        &mut self,
        seq: u64,
        snapshot: &TelemetrySnapshot,
        base_station: Coordinate,
    ) -> bool {
        if let Some(last) = self.last_applied_seq {
            if seq <= last {
                tracing::debug!(seq, last_applied = last, "discarding stale snapshot");
                return false;
            }
        }
        self.last_applied_seq = Some(seq);

        let fix = fix::resolve(snapshot, base_station);
        let position = fix.position();
        let derived = status::derive(snapshot, false);
        let label = tick_label(snapshot);

        self.sink.marker_moved(position, fix.using_fallback);

        // Fallback substitutes are for display only and never enter history.
        if !fix.using_fallback {
            self.history.path.push(position);
            self.history
                .heat
                .push(HeatPoint::new(position, LIVE_HEAT_INTENSITY));
            self.sink.path_updated(&self.history.path.to_vec());
            self.sink.heat_updated(&self.history.heat.to_vec());
        }

        // Charts advance every tick; missing readings get the defaults so the
        // series never has gaps.
        self.history.charts.push(
            label.clone(),
            snapshot.rssi.map_or(DEFAULT_RSSI_DBM as f64, f64::from),
            snapshot.battery.unwrap_or(DEFAULT_BATTERY_VOLTS),
        );
        self.sink.charts_updated(&self.history.charts);

        self.sink.status_updated(&derived);
        self.sink.banner_changed(derived.connection);
        self.sink.minimap_moved(position);

        if self.config.features.distance_calculator {
            let meters = position.distance_to(&base_station);
            self.sink.distance_label(&format_distance(meters));
        }

        if self.auto_tracking {
            self.sink.camera_centered(position);
        } else if !self.first_fix_centered && !fix.using_fallback {
            self.sink.camera_centered(position);
            self.first_fix_centered = true;
        }

        let line = tick_log_line(&label, snapshot, &fix);
        self.history.log.push(line.clone());
        self.sink.log_appended(&line);

        true
    }

    /// A poll attempt failed at the transport level.
    ///
    /// The banner flips to Lost; histories and readouts keep their last
    /// values so the operator still sees where the tracker was.
    pub fn apply_failure(&mut self) {
        self.sink.banner_changed(Connection::Lost);
    }

    /// The hardware feed answered 204: healthy, but no packet yet.
    ///
    /// Not a failure - everything on screen stays as it is.
    pub fn apply_no_data(&self) {
        tracing::debug!("hardware feed has no data yet");
    }

    /// Seed the trail and heat overlay from backend history.
    ///
    /// The server returns snapshots newest-first; they are replayed in
    /// chronological order so the buffers end holding the most recent fixes.
    /// Seeded heat points get a lower intensity than live ones.
    pub fn seed_from_history(
        &mut self,
        snapshots: &[TelemetrySnapshot],
        base_station: Coordinate,
    ) {
        let mut seeded = 0usize;
        for snapshot in snapshots.iter().rev() {
            let fix = fix::resolve(snapshot, base_station);
            if fix.using_fallback {
                continue;
            }
            let position = fix.position();
            self.history.path.push(position);
            self.history
                .heat
                .push(HeatPoint::new(position, SEED_HEAT_INTENSITY));
            seeded += 1;
        }

        if seeded > 0 {
            self.sink.path_updated(&self.history.path.to_vec());
            self.sink.heat_updated(&self.history.heat.to_vec());
        }
        tracing::info!(
            received = snapshots.len(),
            seeded,
            "seeded views from history"
        );
    }

    /// Publish receiver liveness from the latest heartbeat.
    pub fn apply_receiver_status(&mut self, status: &ReceiverStatus) {
        let online = status.is_online(Utc::now(), self.config.receiver_timeout);
        let position = Coordinate::new(status.latitude, status.longitude);
        self.sink.receiver_status(online, position);
    }

    /// Show a transient user-facing notice.
    pub fn notice(&mut self, message: &str) {
        self.sink.notice(message);
    }

    /// Clear all view state for a data-source transition.
    ///
    /// Every history buffer empties and the camera's first-fix latch rearms,
    /// so the first valid fix from the new source recenters the map.
    pub fn reset(&mut self) {
        self.history.clear_all();
        self.first_fix_centered = false;
        self.sink.views_reset();
    }
}

/// Timestamp label for a tick: the snapshot's own timestamp if parseable,
/// the local wall clock otherwise.
fn tick_label(snapshot: &TelemetrySnapshot) -> String {
    snapshot
        .timestamp
        .as_deref()
        .and_then(parse_backend_timestamp)
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| Local::now().format("%H:%M:%S").to_string())
}

/// One event-log line summarizing a tick.
fn tick_log_line(
    label: &str,
    snapshot: &TelemetrySnapshot,
    fix: &fix::ResolvedFix,
) -> String {
    if fix.using_fallback {
        format!("{label} | no fix | showing base station")
    } else {
        format!(
            "{label} | {:.6}, {:.6} | sats {} | {} dBm | {:.2} V",
            fix.latitude,
            fix.longitude,
            snapshot.satellites.unwrap_or(0),
            snapshot.rssi.unwrap_or(DEFAULT_RSSI_DBM),
            snapshot.battery.unwrap_or(DEFAULT_BATTERY_VOLTS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryMode;

    /// Records every sink call for assertions.
    #[derive(Debug, Default)]
    struct RecordingSink {
        marker: Vec<(Coordinate, bool)>,
        path_lens: Vec<usize>,
        heat_lens: Vec<usize>,
        chart_lens: Vec<usize>,
        banners: Vec<Connection>,
        distances: Vec<String>,
        cameras: Vec<Coordinate>,
        log_lines: Vec<String>,
        receiver: Vec<(bool, Coordinate)>,
        resets: usize,
        notices: Vec<String>,
    }

    impl ViewSink for RecordingSink {
        fn marker_moved(&mut self, position: Coordinate, using_fallback: bool) {
            self.marker.push((position, using_fallback));
        }
        fn path_updated(&mut self, path: &[Coordinate]) {
            self.path_lens.push(path.len());
        }
        fn heat_updated(&mut self, points: &[HeatPoint]) {
            self.heat_lens.push(points.len());
        }
        fn charts_updated(&mut self, charts: &crate::history::ChartHistory) {
            self.chart_lens.push(charts.len());
        }
        fn status_updated(&mut self, _status: &crate::status::DerivedStatus) {}
        fn banner_changed(&mut self, connection: Connection) {
            self.banners.push(connection);
        }
        fn minimap_moved(&mut self, _position: Coordinate) {}
        fn distance_label(&mut self, text: &str) {
            self.distances.push(text.to_string());
        }
        fn camera_centered(&mut self, position: Coordinate) {
            self.cameras.push(position);
        }
        fn log_appended(&mut self, line: &str) {
            self.log_lines.push(line.to_string());
        }
        fn receiver_status(&mut self, online: bool, position: Coordinate) {
            self.receiver.push((online, position));
        }
        fn views_reset(&mut self) {
            self.resets += 1;
        }
        fn notice(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    const BASE: Coordinate = Coordinate {
        latitude: 12.9692,
        longitude: 79.1559,
    };

    fn valid_snapshot(lat: f64, lon: f64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            latitude: Some(lat),
            longitude: Some(lon),
            satellites: Some(5),
            rssi: Some(-60),
            battery: Some(3.9),
            ..Default::default()
        }
    }

    fn no_fix_snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            latitude: None,
            longitude: None,
            satellites: Some(0),
            ..Default::default()
        }
    }

    fn synchronizer() -> ViewSynchronizer<RecordingSink> {
        ViewSynchronizer::new(RecordingSink::default(), DashboardConfig::default())
    }

    #[test]
    fn test_valid_fix_feeds_all_surfaces() {
        let mut sync = synchronizer();
        assert!(sync.apply_snapshot(1, &valid_snapshot(12.97, 79.0), BASE));

        let sink = sync.sink_mut();
        assert_eq!(sink.marker.len(), 1);
        assert!(!sink.marker[0].1);
        assert_eq!(sink.path_lens, vec![1]);
        assert_eq!(sink.heat_lens, vec![1]);
        assert_eq!(sink.chart_lens, vec![1]);
        assert_eq!(sink.banners, vec![Connection::Simulated]);
        assert_eq!(sink.cameras.len(), 1);
        assert_eq!(sink.log_lines.len(), 1);
        assert_eq!(sink.distances.len(), 1);
    }

    #[test]
    fn test_fallback_skips_path_and_heat() {
        let mut sync = synchronizer();
        assert!(sync.apply_snapshot(1, &no_fix_snapshot(), BASE));

        assert!(sync.history().path.is_empty());
        assert!(sync.history().heat.is_empty());
        // Charts still advance, with defaults.
        assert_eq!(sync.history().charts.len(), 1);

        let sink = sync.sink_mut();
        assert_eq!(sink.marker, vec![(BASE, true)]);
        assert!(sink.path_lens.is_empty());
        // No-fix never centers the camera.
        assert!(sink.cameras.is_empty());
    }

    #[test]
    fn test_stale_sequence_discarded() {
        let mut sync = synchronizer();
        assert!(sync.apply_snapshot(2, &valid_snapshot(12.97, 79.0), BASE));
        // A slower, older response completing late must not roll back.
        assert!(!sync.apply_snapshot(1, &valid_snapshot(12.90, 79.2), BASE));
        assert!(!sync.apply_snapshot(2, &valid_snapshot(12.90, 79.2), BASE));

        assert_eq!(sync.history().path.len(), 1);
        assert_eq!(
            sync.history().path.latest(),
            Some(&Coordinate::new(12.97, 79.0))
        );
    }

    #[test]
    fn test_first_fix_centers_camera_once() {
        let mut sync = synchronizer();
        sync.apply_snapshot(1, &valid_snapshot(12.97, 79.0), BASE);
        sync.apply_snapshot(2, &valid_snapshot(12.98, 79.1), BASE);

        let sink = sync.sink_mut();
        assert_eq!(sink.cameras, vec![Coordinate::new(12.97, 79.0)]);
    }

    #[test]
    fn test_auto_tracking_centers_every_tick() {
        let mut sync = synchronizer();
        sync.set_auto_tracking(true);
        sync.apply_snapshot(1, &valid_snapshot(12.97, 79.0), BASE);
        sync.apply_snapshot(2, &valid_snapshot(12.98, 79.1), BASE);

        assert_eq!(sync.sink_mut().cameras.len(), 2);
    }

    #[test]
    fn test_failure_flips_banner_keeps_history() {
        let mut sync = synchronizer();
        sync.apply_snapshot(1, &valid_snapshot(12.97, 79.0), BASE);
        sync.apply_failure();

        assert_eq!(sync.history().path.len(), 1);
        assert_eq!(sync.history().charts.len(), 1);
        let sink = sync.sink_mut();
        assert_eq!(
            sink.banners,
            vec![Connection::Simulated, Connection::Lost]
        );
    }

    #[test]
    fn test_live_mode_banner() {
        let mut sync = synchronizer();
        let snapshot = TelemetrySnapshot {
            mode: TelemetryMode::Live,
            ..valid_snapshot(12.97, 79.0)
        };
        sync.apply_snapshot(1, &snapshot, BASE);
        assert_eq!(sync.sink_mut().banners, vec![Connection::Live]);
    }

    #[test]
    fn test_seed_from_history_reverses_and_filters() {
        let mut sync = synchronizer();
        // Newest-first, as the server sends it; middle entry has no fix.
        let snapshots = vec![
            valid_snapshot(12.99, 79.2),
            no_fix_snapshot(),
            valid_snapshot(12.97, 79.0),
        ];
        sync.seed_from_history(&snapshots, BASE);

        let path = sync.history().path.to_vec();
        assert_eq!(
            path,
            vec![Coordinate::new(12.97, 79.0), Coordinate::new(12.99, 79.2)]
        );
        for point in sync.history().heat.iter() {
            assert_eq!(point.intensity, SEED_HEAT_INTENSITY);
        }
        assert_eq!(sync.sink_mut().path_lens, vec![2]);
    }

    #[test]
    fn test_reset_clears_state_and_rearms_camera() {
        let mut sync = synchronizer();
        sync.apply_snapshot(1, &valid_snapshot(12.97, 79.0), BASE);
        sync.reset();

        assert!(sync.history().path.is_empty());
        assert!(sync.history().charts.is_empty());
        assert!(sync.history().log.is_empty());
        assert_eq!(sync.sink_mut().resets, 1);

        // After reset, the next valid fix centers again.
        sync.apply_snapshot(2, &valid_snapshot(12.98, 79.1), BASE);
        assert_eq!(sync.sink_mut().cameras.len(), 2);
    }

    #[test]
    fn test_receiver_status_published() {
        let mut sync = synchronizer();
        let status = ReceiverStatus {
            timestamp: Utc::now().to_rfc3339(),
            latitude: 12.9692,
            longitude: 79.1559,
            signal_strength: Some(-70),
        };
        sync.apply_receiver_status(&status);

        let sink = sync.sink_mut();
        assert_eq!(sink.receiver.len(), 1);
        assert!(sink.receiver[0].0);
        assert_eq!(sink.receiver[0].1, BASE);
    }

    #[test]
    fn test_chart_defaults_for_missing_readings() {
        let mut sync = synchronizer();
        let snapshot = TelemetrySnapshot {
            latitude: Some(12.97),
            longitude: Some(79.0),
            satellites: Some(5),
            rssi: None,
            battery: None,
            ..Default::default()
        };
        sync.apply_snapshot(1, &snapshot, BASE);

        let rssi: Vec<f64> = sync.history().charts.rssi().collect();
        let battery: Vec<f64> = sync.history().charts.battery().collect();
        assert_eq!(rssi, vec![-75.0]);
        assert_eq!(battery, vec![3.7]);
    }

    #[test]
    fn test_log_history_capped_newest_first() {
        let mut sync = synchronizer();
        for i in 0..60 {
            sync.apply_snapshot(i + 1, &valid_snapshot(12.97, 79.0), BASE);
        }
        assert_eq!(sync.history().log.len(), 50);
    }
}
