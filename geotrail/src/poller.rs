//! The poll loop driving the dashboard.
//!
//! [`TelemetryPoller`] owns the backend client, the data-source arbiter, and
//! the view synchronizer, and runs the fixed-interval fetch cycle. Fetches
//! are single-flight: each tick awaits its request before the next tick can
//! start, so responses reach the synchronizer in order and the sequence
//! guard only has to catch out-of-order application, never racing tasks.

use tokio::time::MissedTickBehavior;

use crate::backend::{BackendClient, SnapshotFetch};
use crate::config::DashboardConfig;
use crate::source::{DataSource, ModeArbiter, PreferenceStore};
use crate::sync::ViewSynchronizer;
use crate::telemetry::TelemetrySnapshot;
use crate::view::ViewSink;

/// Fixed-interval telemetry poller.
pub struct TelemetryPoller<C, S, P>
where
    C: BackendClient,
    S: ViewSink,
    P: PreferenceStore,
{
    client: C,
    sync: ViewSynchronizer<S>,
    arbiter: ModeArbiter,
    prefs: P,
    config: DashboardConfig,
    seq: u64,
}

impl<C, S, P> TelemetryPoller<C, S, P>
where
    C: BackendClient,
    S: ViewSink,
    P: PreferenceStore,
{
    /// Create a poller. The initial data source comes from the preference
    /// store, defaulting to simulated.
    pub fn new(client: C, sink: S, prefs: P, config: DashboardConfig) -> Self {
        let initial = prefs.load().unwrap_or_default();
        let arbiter = ModeArbiter::new(initial, config.base_station);
        let sync = ViewSynchronizer::new(sink, config.clone());
        Self {
            client,
            sync,
            arbiter,
            prefs,
            config,
            seq: 0,
        }
    }

    pub fn selected_source(&self) -> DataSource {
        self.arbiter.selected()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn synchronizer(&self) -> &ViewSynchronizer<S> {
        &self.sync
    }

    pub fn synchronizer_mut(&mut self) -> &mut ViewSynchronizer<S> {
        &mut self.sync
    }

    pub fn set_auto_tracking(&mut self, enabled: bool) {
        self.sync.set_auto_tracking(enabled);
    }

    /// Run the poll loop until the task is dropped or aborted.
    pub async fn run(&mut self) {
        self.seed().await;

        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut receiver = tokio::time::interval(self.config.receiver_poll_interval);
        receiver.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            source = %self.arbiter.selected(),
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "telemetry poller started"
        );

        loop {
            tokio::select! {
                _ = poll.tick() => self.tick().await,
                _ = receiver.tick() => self.poll_receiver().await,
            }
        }
    }

    /// Fetch the base-station location and seed views from backend history.
    ///
    /// Both fetches are best-effort: an unreachable backend at startup just
    /// means the defaults stay until the first successful poll.
    pub async fn seed(&mut self) {
        match self.client.fetch_base_station().await {
            Ok(position) => self.arbiter.set_base_station(position),
            Err(e) => {
                tracing::warn!(error = %e, "base station location unavailable, using default");
            }
        }

        match self.client.fetch_history(self.config.seed_samples).await {
            Ok(snapshots) => {
                self.sync
                    .seed_from_history(&snapshots, self.arbiter.base_station());
            }
            Err(e) => tracing::warn!(error = %e, "history seed unavailable"),
        }
    }

    /// One poll cycle against the currently selected source.
    pub async fn tick(&mut self) {
        match self.arbiter.selected() {
            DataSource::Simulated => match self.client.fetch_snapshot().await {
                Ok(snapshot) => self.apply(snapshot),
                Err(e) => {
                    tracing::warn!(error = %e, "telemetry poll failed");
                    self.sync.apply_failure();
                }
            },
            DataSource::Hardware => {
                match self.client.fetch_latest_hardware().await {
                    Ok(SnapshotFetch::Snapshot(snapshot)) => self.apply(snapshot),
                    Ok(SnapshotFetch::NoDataYet) => self.sync.apply_no_data(),
                    Err(e) => {
                        tracing::warn!(error = %e, "hardware poll failed");
                        self.sync.apply_failure();
                    }
                }
                // The hardware receiver can be resurveyed at any time; keep
                // the fallback coordinate current even while no packets flow.
                self.refresh_base_station().await;
            }
        }
    }

    /// One receiver-heartbeat poll cycle.
    pub async fn poll_receiver(&mut self) {
        if !self.config.features.receiver_liveness {
            return;
        }
        match self.client.fetch_receiver_status().await {
            Ok(status) => self.sync.apply_receiver_status(&status),
            Err(e) => tracing::debug!(error = %e, "receiver status unavailable"),
        }
    }

    /// Switch the backend data source.
    ///
    /// The switch is optimistic: the local selection changes first, then the
    /// backend is told. If the backend refuses, the selection rolls back and
    /// the views are left exactly as they were. Only a confirmed switch
    /// clears the histories and re-seeds.
    pub async fn select_source(&mut self, source: DataSource) {
        if !self.config.features.hardware_toggle {
            tracing::debug!("hardware toggle disabled, ignoring source selection");
            return;
        }
        let previous = self.arbiter.selected();
        if !self.arbiter.select(source) {
            return;
        }

        match self.client.set_data_source(source).await {
            Ok(()) => {
                tracing::info!(from = %previous, to = %source, "data source switched");
                if let Err(e) = self.prefs.save(source) {
                    tracing::warn!(error = %e, "failed to persist data source preference");
                }
                self.sync.reset();
                match self.client.fetch_history(self.config.seed_samples).await {
                    Ok(snapshots) => {
                        self.sync
                            .seed_from_history(&snapshots, self.arbiter.base_station());
                    }
                    Err(e) => tracing::warn!(error = %e, "history seed unavailable"),
                }
            }
            Err(e) => {
                self.arbiter.select(previous);
                tracing::warn!(error = %e, requested = %source, "data source switch failed, reverting");
                self.sync
                    .notice(&format!("Could not switch to {source}; staying on {previous}"));
            }
        }
    }

    /// End the backend session.
    pub async fn logout(&mut self) {
        match self.client.logout().await {
            Ok(()) => tracing::info!("logged out"),
            Err(e) => tracing::warn!(error = %e, "logout failed"),
        }
    }

    fn apply(&mut self, snapshot: TelemetrySnapshot) {
        // The mode stamped on the snapshot is authoritative. If the backend
        // switched sources underneath us (another client, a hardware packet
        // promoting the feed), follow it and start fresh.
        if let Some(adopted) = self.arbiter.observe_reported_mode(snapshot.mode) {
            tracing::info!(source = %adopted, "backend reports a different data source, following");
            if let Err(e) = self.prefs.save(adopted) {
                tracing::warn!(error = %e, "failed to persist data source preference");
            }
            self.sync.reset();
        }

        self.seq += 1;
        self.sync
            .apply_snapshot(self.seq, &snapshot, self.arbiter.base_station());
    }

    async fn refresh_base_station(&mut self) {
        match self.client.fetch_base_station().await {
            Ok(position) => self.arbiter.set_base_station(position),
            Err(e) => tracing::debug!(error = %e, "base station refresh failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::backend::BackendError;
    use crate::geo::Coordinate;
    use crate::history::HeatPoint;
    use crate::source::NullPreferenceStore;
    use crate::status::Connection;
    use crate::telemetry::{ReceiverStatus, TelemetryMode};

    const BASE: Coordinate = Coordinate {
        latitude: 12.9692,
        longitude: 79.1559,
    };

    #[derive(Default)]
    struct MockClient {
        snapshot: Mutex<TelemetrySnapshot>,
        fail_fetch: AtomicBool,
        hardware_no_data: AtomicBool,
        fail_set_source: AtomicBool,
        set_source_calls: Mutex<Vec<DataSource>>,
        history: Mutex<Vec<TelemetrySnapshot>>,
    }

    impl MockClient {
        fn with_snapshot(snapshot: TelemetrySnapshot) -> Self {
            Self {
                snapshot: Mutex::new(snapshot),
                ..Default::default()
            }
        }
    }

    impl BackendClient for MockClient {
        async fn fetch_snapshot(&self) -> Result<TelemetrySnapshot, BackendError> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(BackendError::HttpError("connection refused".into()));
            }
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn fetch_latest_hardware(&self) -> Result<SnapshotFetch, BackendError> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(BackendError::HttpError("connection refused".into()));
            }
            if self.hardware_no_data.load(Ordering::SeqCst) {
                return Ok(SnapshotFetch::NoDataYet);
            }
            Ok(SnapshotFetch::Snapshot(self.snapshot.lock().unwrap().clone()))
        }

        async fn fetch_history(&self, _count: usize) -> Result<Vec<TelemetrySnapshot>, BackendError> {
            Ok(self.history.lock().unwrap().clone())
        }

        async fn fetch_base_station(&self) -> Result<Coordinate, BackendError> {
            Ok(BASE)
        }

        async fn fetch_receiver_status(&self) -> Result<ReceiverStatus, BackendError> {
            Ok(ReceiverStatus {
                timestamp: chrono::Utc::now().to_rfc3339(),
                latitude: BASE.latitude,
                longitude: BASE.longitude,
                signal_strength: Some(-70),
            })
        }

        async fn set_data_source(&self, source: DataSource) -> Result<(), BackendError> {
            self.set_source_calls.lock().unwrap().push(source);
            if self.fail_set_source.load(Ordering::SeqCst) {
                return Err(BackendError::UnexpectedStatus(500));
            }
            Ok(())
        }

        async fn logout(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct CountingSink {
        markers: usize,
        banners: Vec<Connection>,
        resets: usize,
        notices: Vec<String>,
        receiver_updates: usize,
    }

    impl ViewSink for CountingSink {
        fn marker_moved(&mut self, _position: Coordinate, _using_fallback: bool) {
            self.markers += 1;
        }
        fn path_updated(&mut self, _path: &[Coordinate]) {}
        fn heat_updated(&mut self, _points: &[HeatPoint]) {}
        fn charts_updated(&mut self, _charts: &crate::history::ChartHistory) {}
        fn status_updated(&mut self, _status: &crate::status::DerivedStatus) {}
        fn banner_changed(&mut self, connection: Connection) {
            self.banners.push(connection);
        }
        fn minimap_moved(&mut self, _position: Coordinate) {}
        fn distance_label(&mut self, _text: &str) {}
        fn camera_centered(&mut self, _position: Coordinate) {}
        fn log_appended(&mut self, _line: &str) {}
        fn receiver_status(&mut self, _online: bool, _position: Coordinate) {
            self.receiver_updates += 1;
        }
        fn views_reset(&mut self) {
            self.resets += 1;
        }
        fn notice(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    fn valid_snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            latitude: Some(12.97),
            longitude: Some(79.0),
            satellites: Some(5),
            rssi: Some(-60),
            battery: Some(3.9),
            ..Default::default()
        }
    }

    fn poller(
        client: MockClient,
    ) -> TelemetryPoller<MockClient, CountingSink, NullPreferenceStore> {
        TelemetryPoller::new(
            client,
            CountingSink::default(),
            NullPreferenceStore,
            DashboardConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_tick_applies_snapshot() {
        let mut poller = poller(MockClient::with_snapshot(valid_snapshot()));
        poller.tick().await;

        assert_eq!(poller.synchronizer().history().path.len(), 1);
        let sink = poller.synchronizer_mut().sink_mut();
        assert_eq!(sink.markers, 1);
        assert_eq!(sink.banners, vec![Connection::Simulated]);
    }

    #[tokio::test]
    async fn test_tick_failure_flips_banner_keeps_history() {
        let client = MockClient::with_snapshot(valid_snapshot());
        let mut poller = poller(client);
        poller.tick().await;
        poller.client.fail_fetch.store(true, Ordering::SeqCst);
        poller.tick().await;

        assert_eq!(poller.synchronizer().history().path.len(), 1);
        let sink = poller.synchronizer_mut().sink_mut();
        assert_eq!(sink.banners, vec![Connection::Simulated, Connection::Lost]);
    }

    #[tokio::test]
    async fn test_select_source_rollback_on_post_failure() {
        let client = MockClient::with_snapshot(valid_snapshot());
        client.fail_set_source.store(true, Ordering::SeqCst);
        let mut poller = poller(client);
        poller.tick().await;

        poller.select_source(DataSource::Hardware).await;

        // Reverted, views untouched, operator notified.
        assert_eq!(poller.selected_source(), DataSource::Simulated);
        assert_eq!(poller.synchronizer().history().path.len(), 1);
        let sink = poller.synchronizer_mut().sink_mut();
        assert_eq!(sink.resets, 0);
        assert_eq!(sink.notices.len(), 1);
    }

    #[tokio::test]
    async fn test_select_source_success_resets_views() {
        let client = MockClient::with_snapshot(valid_snapshot());
        client.snapshot.lock().unwrap().mode = TelemetryMode::Live;
        let mut poller = poller(client);
        poller.tick().await; // the live-mode report makes the poller adopt hardware

        poller.select_source(DataSource::Simulated).await;
        assert_eq!(poller.selected_source(), DataSource::Simulated);
        assert_eq!(
            poller.client.set_source_calls.lock().unwrap().as_slice(),
            &[DataSource::Simulated]
        );
    }

    #[tokio::test]
    async fn test_reported_mode_adopted_and_views_reset() {
        let client = MockClient::with_snapshot(valid_snapshot());
        let mut poller = poller(client);
        poller.tick().await;
        assert_eq!(poller.selected_source(), DataSource::Simulated);

        // Backend switches to hardware underneath us.
        poller.client.snapshot.lock().unwrap().mode = TelemetryMode::Live;
        poller.tick().await;

        assert_eq!(poller.selected_source(), DataSource::Hardware);
        let sink = poller.synchronizer_mut().sink_mut();
        assert_eq!(sink.resets, 1);
    }

    #[tokio::test]
    async fn test_hardware_no_data_keeps_views() {
        let client = MockClient::with_snapshot(valid_snapshot());
        let mut poller = poller(client);
        poller.tick().await;

        poller.client.snapshot.lock().unwrap().mode = TelemetryMode::Live;
        poller.tick().await; // adopts hardware
        let path_len = poller.synchronizer().history().path.len();

        poller.client.hardware_no_data.store(true, Ordering::SeqCst);
        poller.tick().await;

        assert_eq!(poller.synchronizer().history().path.len(), path_len);
        // No Lost banner was published for the 204.
        let sink = poller.synchronizer_mut().sink_mut();
        assert!(!sink.banners.contains(&Connection::Lost));
    }

    #[tokio::test]
    async fn test_receiver_poll_publishes_status() {
        let mut poller = poller(MockClient::with_snapshot(valid_snapshot()));
        poller.poll_receiver().await;
        assert_eq!(poller.synchronizer_mut().sink_mut().receiver_updates, 1);
    }
}
