//! Pure derivation of the operator-facing status bundle.
//!
//! Re-evaluated on every tick from the raw snapshot; nothing here is
//! persisted. All thresholds are named constants so they can be tuned
//! without touching the derivation logic.

use crate::telemetry::{TelemetryMode, TelemetrySnapshot};

/// RSSI above this is an excellent link.
pub const RSSI_EXCELLENT_DBM: i32 = -50;
/// RSSI above this is a good link.
pub const RSSI_GOOD_DBM: i32 = -65;
/// RSSI above this is a fair link; at or below is poor.
pub const RSSI_FAIR_DBM: i32 = -80;

/// Voltage treated as an empty battery (0%).
pub const BATTERY_EMPTY_VOLTS: f64 = 3.2;
/// Voltage treated as a full battery (100%).
pub const BATTERY_FULL_VOLTS: f64 = 4.2;
/// Percentage boundaries between the battery level bands.
pub const BATTERY_FULL_PCT: f64 = 80.0;
pub const BATTERY_MEDIUM_PCT: f64 = 50.0;
pub const BATTERY_LOW_PCT: f64 = 20.0;

/// Satellites needed for a solid fix.
pub const FIX_SOLID_SATELLITES: u32 = 4;
/// Satellites needed for a weak fix; below is still searching.
pub const FIX_WEAK_SATELLITES: u32 = 2;

/// Rescue display triggers: any single breach is enough.
pub const RESCUE_BATTERY_VOLTS: f64 = 3.3;
pub const RESCUE_MIN_SATELLITES: u32 = 1;
pub const RESCUE_RSSI_DBM: i32 = -90;

/// Emergency beacon triggers. Deliberately looser on satellites than rescue
/// and without an RSSI term; the two alert states are independent.
pub const BEACON_BATTERY_VOLTS: f64 = 3.3;
pub const BEACON_MIN_SATELLITES: u32 = 2;

/// Substituted when a snapshot omits RSSI, so charts never have gaps.
pub const DEFAULT_RSSI_DBM: i32 = -75;
/// Substituted when a snapshot omits battery voltage.
pub const DEFAULT_BATTERY_VOLTS: f64 = 3.7;

/// Link quality bucket derived from RSSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SignalQuality {
    /// Signal bars for the badge (4 = excellent).
    pub fn bars(&self) -> u8 {
        match self {
            Self::Excellent => 4,
            Self::Good => 3,
            Self::Fair => 2,
            Self::Poor => 1,
        }
    }
}

impl std::fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::Fair => write!(f, "Fair"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}

/// Battery health bucket derived from voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Full,
    Medium,
    Low,
    Critical,
}

impl std::fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "Full"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// GPS fix quality bucket derived from satellite count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixQuality {
    Fixed,
    Weak,
    Searching,
}

impl std::fmt::Display for FixQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "Fixed"),
            Self::Weak => write!(f, "Weak"),
            Self::Searching => write!(f, "Searching"),
        }
    }
}

/// Connectivity shown in the banner.
///
/// `Lost` overrides the mode-derived values until a poll succeeds again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Live,
    Simulated,
    Lost,
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "Hardware Connected"),
            Self::Simulated => write!(f, "Simulated Data"),
            Self::Lost => write!(f, "Connection Lost"),
        }
    }
}

/// The computed status bundle for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedStatus {
    pub fix_quality: FixQuality,
    pub battery_level: BatteryLevel,
    /// Battery charge estimate, clamped to 0-100.
    pub battery_percent: f64,
    pub signal_quality: SignalQuality,
    pub rescue_active: bool,
    pub beacon_active: bool,
    pub connection: Connection,
}

/// Derive the status bundle from a snapshot.
///
/// This is the single place where missing RSSI/battery readings are
/// substituted with defaults; missing satellite counts are treated as zero.
/// `poll_failed` forces the connection to `Lost` regardless of mode.
pub fn derive(snapshot: &TelemetrySnapshot, poll_failed: bool) -> DerivedStatus {
    let rssi = snapshot.rssi.unwrap_or(DEFAULT_RSSI_DBM);
    let battery = snapshot.battery.unwrap_or(DEFAULT_BATTERY_VOLTS);
    let satellites = snapshot.satellites.unwrap_or(0);

    let signal_quality = if rssi > RSSI_EXCELLENT_DBM {
        SignalQuality::Excellent
    } else if rssi > RSSI_GOOD_DBM {
        SignalQuality::Good
    } else if rssi > RSSI_FAIR_DBM {
        SignalQuality::Fair
    } else {
        SignalQuality::Poor
    };

    let battery_percent = ((battery - BATTERY_EMPTY_VOLTS)
        / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS)
        * 100.0)
        .clamp(0.0, 100.0);
    let battery_level = if battery_percent >= BATTERY_FULL_PCT {
        BatteryLevel::Full
    } else if battery_percent >= BATTERY_MEDIUM_PCT {
        BatteryLevel::Medium
    } else if battery_percent >= BATTERY_LOW_PCT {
        BatteryLevel::Low
    } else {
        BatteryLevel::Critical
    };

    let fix_quality = if satellites >= FIX_SOLID_SATELLITES {
        FixQuality::Fixed
    } else if satellites >= FIX_WEAK_SATELLITES {
        FixQuality::Weak
    } else {
        FixQuality::Searching
    };

    let rescue_active = battery < RESCUE_BATTERY_VOLTS
        || satellites < RESCUE_MIN_SATELLITES
        || rssi < RESCUE_RSSI_DBM;

    let beacon_active = battery < BEACON_BATTERY_VOLTS || satellites < BEACON_MIN_SATELLITES;

    let connection = if poll_failed {
        Connection::Lost
    } else {
        match snapshot.mode {
            TelemetryMode::Live => Connection::Live,
            TelemetryMode::Simulated => Connection::Simulated,
        }
    };

    DerivedStatus {
        fix_quality,
        battery_level,
        battery_percent,
        signal_quality,
        rescue_active,
        beacon_active,
        connection,
    }
}
