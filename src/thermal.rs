//! Thermals: contiguous circling climbs.

use crate::fix::{rawtime_to_hms, GnssFix};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single thermal detected in a flight, bounded by the fix where
/// circling started and the fix where it stopped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Thermal {
    /// Entry point of the thermal.
    pub enter_fix: GnssFix,
    /// Exit point of the thermal.
    pub exit_fix: GnssFix,
}

impl Thermal {
    pub fn new(enter_fix: &GnssFix, exit_fix: &GnssFix) -> Self {
        Self {
            enter_fix: enter_fix.clone(),
            exit_fix: exit_fix.clone(),
        }
    }

    /// Time spent in the thermal, seconds.
    pub fn time_change(&self) -> f64 {
        self.exit_fix.rawtime - self.enter_fix.rawtime
    }

    /// Altitude gained (or lost) in the thermal, meters.
    pub fn alt_change(&self) -> f64 {
        self.exit_fix.alt - self.enter_fix.alt
    }

    /// Average vertical velocity in the thermal, m/s.
    pub fn vertical_velocity(&self) -> f64 {
        if self.time_change().abs() < 1e-7 {
            return 0.0;
        }
        self.alt_change() / self.time_change()
    }
}

impl std::fmt::Display for Thermal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (_, minutes, seconds) = rawtime_to_hms(self.time_change());
        write!(
            f,
            "Thermal(vertical_velocity={:.2} m/s, duration={}m {}s)",
            self.vertical_velocity(),
            minutes,
            seconds
        )
    }
}
