//! Glides: the track flown between thermals.

use crate::fix::{rawtime_to_hms, GnssFix};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single glide detected in a flight.
///
/// `track_length` is the length of the recorded track between the entry
/// and exit points, summed fix to fix, which is not the same as the
/// distance between the two endpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Glide {
    /// Entry point of the glide.
    pub enter_fix: GnssFix,
    /// Exit point of the glide.
    pub exit_fix: GnssFix,
    /// Length of the recorded track, kilometers.
    pub track_length: f64,
}

impl Glide {
    pub fn new(enter_fix: &GnssFix, exit_fix: &GnssFix, track_length: f64) -> Self {
        Self {
            enter_fix: enter_fix.clone(),
            exit_fix: exit_fix.clone(),
            track_length,
        }
    }

    /// Time spent in the glide, seconds.
    pub fn time_change(&self) -> f64 {
        self.exit_fix.timestamp - self.enter_fix.timestamp
    }

    /// Average speed over the glide, km/h.
    pub fn speed(&self) -> f64 {
        self.track_length / (self.time_change() / 3600.0)
    }

    /// Overall altitude change in the glide, meters.
    pub fn alt_change(&self) -> f64 {
        self.exit_fix.alt - self.enter_fix.alt
    }

    /// The L/D (distance over height lost) of the glide.
    pub fn glide_ratio(&self) -> f64 {
        if self.alt_change().abs() < 1e-7 {
            return 0.0;
        }
        (self.track_length * 1000.0) / self.alt_change()
    }
}

impl std::fmt::Display for Glide {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (_, minutes, seconds) = rawtime_to_hms(self.time_change());
        write!(
            f,
            "Glide(dist={:.2} km, avg_speed={:.2} kph, avg L/D={:.2} duration={}m {}s)",
            self.track_length,
            self.speed(),
            self.glide_ratio(),
            minutes,
            seconds
        )
    }
}
