//! Validation and segmentation tunables.

use strum_macros::{Display, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which continuous flying segment to report when a log contains
/// several takeoff / landing cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlightPick {
    /// Keep the first segment, ignore everything after the first landing.
    #[strum(serialize = "first")]
    First,
    /// Concatenate all segments, down periods between them included.
    #[default]
    #[strum(serialize = "concat")]
    Concatenate,
}

/// Thresholds used to validate a recording and to segment the flight.
///
/// The defaults suit one second gliding logs; build one, tweak the
/// fields of interest and hand it to the flight constructors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightParsingConfig {
    /// Minimum number of fixes in a file.
    pub min_fixes: usize,
    /// Maximum time between fixes, seconds.
    /// Soft limit, some fixes are allowed to exceed.
    pub max_seconds_between_fixes: f64,
    /// Minimum time between fixes, seconds.
    /// Soft limit, some fixes are allowed to exceed.
    pub min_seconds_between_fixes: f64,
    /// Maximum number of fixes exceeding the time between fix constraints.
    pub max_time_violations: usize,
    /// Maximum number of times a file can cross 0:00 UTC.
    pub max_new_days_in_flight: u32,
    /// Minimum average of absolute altitude changes over a file,
    /// meters per fix. Discovers altitude sensors that report a (nearly)
    /// constant altitude, which makes them invalid.
    pub min_avg_abs_alt_change: f64,
    /// Maximum altitude change between fixes, meters per second.
    /// Soft limit, some fixes are allowed to exceed.
    pub max_alt_change_rate: f64,
    /// Maximum number of fixes exceeding the altitude change limit.
    pub max_alt_change_violations: usize,
    /// Absolute maximum altitude, meters.
    pub max_alt: f64,
    /// Absolute minimum altitude, meters.
    pub min_alt: f64,
    /// Minimum ground speed to switch to flight mode, km/h.
    pub min_gsp_flight: f64,
    /// Minimum idle time (speed below `min_gsp_flight`) to count as a
    /// landing, seconds. Does not apply to the tail of the log.
    pub min_landing_time: f64,
    /// Which flying segment to pick when the log contains several.
    pub which_flight_to_pick: FlightPick,
    /// Minimum bearing change rate to consider circling, degrees per second.
    pub min_bearing_change_circling: f64,
    /// Minimum time between the fixes used to compute a bearing change,
    /// seconds. Neighbor fixes are too noisy on one second logs.
    pub min_time_for_bearing_change: f64,
    /// Minimum circling time for a climb to count as a thermal, seconds.
    pub min_time_for_thermal: f64,
}

impl Default for FlightParsingConfig {
    fn default() -> Self {
        Self {
            min_fixes: 50,
            max_seconds_between_fixes: 50.0,
            min_seconds_between_fixes: 1.0,
            max_time_violations: 10,
            max_new_days_in_flight: 2,
            min_avg_abs_alt_change: 0.01,
            max_alt_change_rate: 50.0,
            max_alt_change_violations: 3,
            max_alt: 10000.0,
            min_alt: -600.0,
            min_gsp_flight: 15.0,
            min_landing_time: 5.0 * 60.0,
            which_flight_to_pick: FlightPick::Concatenate,
            min_bearing_change_circling: 6.0,
            min_time_for_bearing_change: 5.0,
            min_time_for_thermal: 60.0,
        }
    }
}
