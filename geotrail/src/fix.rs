//! GPS fix validation with base-station fallback.
//!
//! A snapshot only counts as a valid fix when two independent signals agree:
//! coordinates are present and not both near zero, and at least one satellite
//! is in view. Anything else - missing satellite data included - is treated
//! conservatively as no-fix, and the configured fallback coordinate is
//! substituted for display. The `using_fallback` flag lets callers keep
//! substitutes out of the path/heat history.

use crate::geo::Coordinate;
use crate::telemetry::TelemetrySnapshot;

/// Coordinates with both components inside this band around zero are treated
/// as an uninitialized GPS module, not a position in the Gulf of Guinea.
pub const ZERO_COORD_EPSILON_DEG: f64 = 1e-4;

/// Minimum satellites in view for a fix to be trusted.
pub const MIN_SATELLITES_FOR_FIX: u32 = 1;

/// A display position resolved from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFix {
    pub latitude: f64,
    pub longitude: f64,
    /// True when the position is the fallback coordinate, not a real reading.
    pub using_fallback: bool,
}

impl ResolvedFix {
    /// The resolved position as a [`Coordinate`].
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Classify a snapshot's fix validity and resolve a display position.
///
/// On no-fix the `fallback` coordinate (the base-station location) is
/// substituted and `using_fallback` is set.
pub fn resolve(snapshot: &TelemetrySnapshot, fallback: Coordinate) -> ResolvedFix {
    if has_valid_fix(snapshot) {
        ResolvedFix {
            // has_valid_fix guarantees both are present
            latitude: snapshot.latitude.unwrap_or(fallback.latitude),
            longitude: snapshot.longitude.unwrap_or(fallback.longitude),
            using_fallback: false,
        }
    } else {
        ResolvedFix {
            latitude: fallback.latitude,
            longitude: fallback.longitude,
            using_fallback: true,
        }
    }
}

/// Both fix signals: plausible coordinates and satellite lock.
fn has_valid_fix(snapshot: &TelemetrySnapshot) -> bool {
    let coords_valid = match (snapshot.latitude, snapshot.longitude) {
        (Some(lat), Some(lon)) => {
            !(lat.abs() < ZERO_COORD_EPSILON_DEG && lon.abs() < ZERO_COORD_EPSILON_DEG)
        }
        _ => false,
    };

    let satellites_valid = snapshot
        .satellites
        .is_some_and(|sats| sats >= MIN_SATELLITES_FOR_FIX);

    coords_valid && satellites_valid
}
