//! Data-source selection and persistence.
//!
//! The dashboard can read from the backend's offline simulation or from real
//! hardware. The local toggle is optimistic: the selection is applied
//! immediately, pushed to the backend, and rolled back if the push fails.
//! The backend's own per-snapshot mode report stays authoritative - if it
//! disagrees with the local selection, the selection follows the report.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;
use crate::telemetry::TelemetryMode;

/// Which backend feed the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The backend's built-in telemetry simulation.
    #[default]
    Simulated,
    /// The real LoRa hardware feed.
    Hardware,
}

impl DataSource {
    /// Wire name used by the backend's `set_data_source` endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Hardware => "hardware",
        }
    }

    /// The telemetry mode snapshots should report under this source.
    pub fn expected_mode(&self) -> TelemetryMode {
        match self {
            Self::Simulated => TelemetryMode::Simulated,
            Self::Hardware => TelemetryMode::Live,
        }
    }

    /// The source that would have produced snapshots in the given mode.
    pub fn from_mode(mode: TelemetryMode) -> Self {
        match mode {
            TelemetryMode::Simulated => Self::Simulated,
            TelemetryMode::Live => Self::Hardware,
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from persisting the data-source preference.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to write preference file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode preference: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for the selected data source across restarts.
pub trait PreferenceStore {
    /// The previously saved selection, if any readable one exists.
    fn load(&self) -> Option<DataSource>;

    /// Save the current selection.
    fn save(&self, source: DataSource) -> Result<(), PreferenceError>;
}

#[derive(Serialize, Deserialize)]
struct PreferenceFile {
    data_source: DataSource,
}

/// JSON-file preference store.
///
/// A missing or unreadable file just means no saved preference.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Option<DataSource> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str::<PreferenceFile>(&raw)
            .ok()
            .map(|file| file.data_source)
    }

    fn save(&self, source: DataSource) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&PreferenceFile {
            data_source: source,
        })?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

/// In-memory preference store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct NullPreferenceStore;

impl PreferenceStore for NullPreferenceStore {
    fn load(&self) -> Option<DataSource> {
        None
    }

    fn save(&self, _source: DataSource) -> Result<(), PreferenceError> {
        Ok(())
    }
}

/// Owns the current data-source selection and the base-station position.
///
/// Both pieces travel together: a source switch invalidates accumulated
/// history, and the base-station coordinate is the fallback used when the
/// selected feed has no fix.
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    selected: DataSource,
    base_station: Coordinate,
}

impl ModeArbiter {
    pub fn new(initial: DataSource, base_station: Coordinate) -> Self {
        Self {
            selected: initial,
            base_station,
        }
    }

    pub fn selected(&self) -> DataSource {
        self.selected
    }

    pub fn base_station(&self) -> Coordinate {
        self.base_station
    }

    pub fn set_base_station(&mut self, position: Coordinate) {
        self.base_station = position;
    }

    /// Apply a local selection. Returns true if the source actually changed.
    pub fn select(&mut self, source: DataSource) -> bool {
        if self.selected == source {
            return false;
        }
        self.selected = source;
        true
    }

    /// Reconcile against the mode the backend reported in a snapshot.
    ///
    /// The report is authoritative: if it disagrees with the local selection,
    /// the selection follows it and the adopted source is returned so the
    /// caller can reset views and re-persist.
    pub fn observe_reported_mode(&mut self, mode: TelemetryMode) -> Option<DataSource> {
        let reported = DataSource::from_mode(mode);
        if reported == self.selected {
            return None;
        }
        self.selected = reported;
        Some(reported)
    }
}
