//! Record sanity checks: altitude sensors and the fix clock.

use itertools::Itertools;

use super::{AltitudeSource, Flight};
use crate::config::FlightParsingConfig;

impl Flight {
    /// Walks adjacent fix pairs and judges both altitude sensors on
    /// three criteria: rate of change plausibility, liveness (a sensor
    /// reporting a near constant altitude is dead) and the absolute
    /// envelope. The first healthy sensor is retained; a flight with two
    /// dead sensors is unusable.
    ///
    /// Runs on the raw clock, before midnight repair: a crossing shows
    /// up as a huge interval, which drowns the altitude rates of that
    /// single pair instead of spiking them.
    pub(crate) fn check_altitudes(&mut self, config: &FlightParsingConfig) {
        let mut press_huge_changes_num = 0usize;
        let mut gnss_huge_changes_num = 0usize;
        let mut press_violations_num = 0usize;
        let mut gnss_violations_num = 0usize;
        let mut press_chgs_sum = 0.0f64;
        let mut gnss_chgs_sum = 0.0f64;

        for (f0, f1) in self.fixes.iter().tuple_windows() {
            let press_alt_delta = (f1.press_alt - f0.press_alt).abs();
            let gnss_alt_delta = (f1.gnss_alt - f0.gnss_alt).abs();
            let rawtime_delta = (f1.rawtime - f0.rawtime).abs();
            if rawtime_delta > 0.5 {
                if press_alt_delta / rawtime_delta > config.max_alt_change_rate {
                    press_huge_changes_num += 1;
                } else {
                    press_chgs_sum += press_alt_delta;
                }
                if gnss_alt_delta / rawtime_delta > config.max_alt_change_rate {
                    gnss_huge_changes_num += 1;
                } else {
                    gnss_chgs_sum += gnss_alt_delta;
                }
            }
            if f0.press_alt > config.max_alt || f0.press_alt < config.min_alt {
                press_violations_num += 1;
            }
            if f0.gnss_alt > config.max_alt || f0.gnss_alt < config.min_alt {
                gnss_violations_num += 1;
            }
        }

        let pair_count = self.fixes.len().saturating_sub(1);
        let press_chgs_avg = if pair_count == 0 {
            0.0
        } else {
            press_chgs_sum / pair_count as f64
        };
        let gnss_chgs_avg = if pair_count == 0 {
            0.0
        } else {
            gnss_chgs_sum / pair_count as f64
        };

        let mut press_alt_ok = true;
        if press_chgs_avg < config.min_avg_abs_alt_change {
            self.note_warning(format!(
                "average pressure altitude change between fixes is: {:.6}. \
                 It is lower than the minimum: {:.6}.",
                press_chgs_avg, config.min_avg_abs_alt_change
            ));
            press_alt_ok = false;
        }
        if press_huge_changes_num > config.max_alt_change_violations {
            self.note_warning(format!(
                "too many high changes in pressure altitude: {}. Maximum allowed: {}.",
                press_huge_changes_num, config.max_alt_change_violations
            ));
            press_alt_ok = false;
        }
        if press_violations_num > 0 {
            self.note_warning(format!(
                "pressure altitude limits exceeded in {} fixes.",
                press_violations_num
            ));
            press_alt_ok = false;
        }

        let mut gnss_alt_ok = true;
        if gnss_chgs_avg < config.min_avg_abs_alt_change {
            self.note_warning(format!(
                "average gnss altitude change between fixes is: {:.6}. \
                 It is lower than the minimum: {:.6}.",
                gnss_chgs_avg, config.min_avg_abs_alt_change
            ));
            gnss_alt_ok = false;
        }
        if gnss_huge_changes_num > config.max_alt_change_violations {
            self.note_warning(format!(
                "too many high changes in gnss altitude: {}. Maximum allowed: {}.",
                gnss_huge_changes_num, config.max_alt_change_violations
            ));
            gnss_alt_ok = false;
        }
        if gnss_violations_num > 0 {
            self.note_warning(format!(
                "gnss altitude limits exceeded in {} fixes.",
                gnss_violations_num
            ));
            gnss_alt_ok = false;
        }

        self.press_alt_valid = press_alt_ok;
        self.gnss_alt_valid = gnss_alt_ok;

        if self.press_alt_valid {
            self.alt_source = Some(AltitudeSource::Pressure);
        } else if self.gnss_alt_valid {
            self.alt_source = Some(AltitudeSource::Gnss);
        } else {
            self.note_error("neither pressure nor gnss altitude is valid.".to_string());
        }
    }

    /// Checks the fix clock and repairs 0:00 UTC crossings.
    ///
    /// B records carry the time of day only, so a flight across UTC
    /// midnight jumps backwards by a day. A backwards step that lands
    /// within 200 seconds of the previous fix once a day is added is
    /// such a crossing: the day is added to this and all later fixes.
    pub(crate) fn check_rawtime(&mut self, config: &FlightParsingConfig) {
        const DAY: f64 = 24.0 * 60.0 * 60.0;

        let mut days_added = 0u32;
        let mut rawtime_to_add = 0.0f64;
        let mut gap_violations = 0usize;

        for i in 1..self.fixes.len() {
            let f0_rawtime = self.fixes[i - 1].rawtime;
            let f1 = &mut self.fixes[i];
            f1.rawtime += rawtime_to_add;

            if f0_rawtime > f1.rawtime && f1.rawtime + DAY < f0_rawtime + 200.0 {
                days_added += 1;
                rawtime_to_add += DAY;
                f1.rawtime += DAY;
            }

            let time_change = f1.rawtime - f0_rawtime;
            if time_change < config.min_seconds_between_fixes - 1e-5 {
                gap_violations += 1;
            }
            if time_change > config.max_seconds_between_fixes + 1e-5 {
                gap_violations += 1;
            }
        }

        self.days_added = days_added;

        if gap_violations > config.max_time_violations {
            self.note_error(format!(
                "too many fixes intervals exceed time between fixes constraints. \
                 Allowed {} fixes, found {} fixes.",
                config.max_time_violations, gap_violations
            ));
        }
        if days_added > config.max_new_days_in_flight {
            self.note_error(format!(
                "too many times did the flight cross the UTC 0:00 barrier. \
                 Allowed {} times, found {} times.",
                config.max_new_days_in_flight, days_added
            ));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fix::GnssFix;

    fn flight_of(fixes: Vec<GnssFix>) -> Flight {
        // bypass the pipeline: hand craft a flight and run single passes
        let config = FlightParsingConfig {
            min_fixes: usize::MAX,
            ..FlightParsingConfig::default()
        };
        let mut flight = Flight::new(Vec::new(), &[], &[], &[], &config);
        flight.valid = true;
        flight.notes.clear();
        flight.fixes = fixes;
        flight
    }

    fn fix(index: usize, rawtime: f64, press_alt: f64, gnss_alt: f64) -> GnssFix {
        GnssFix::new(rawtime, 46.0, 6.0, 'A', press_alt, gnss_alt, index, "")
    }

    #[test]
    fn healthy_sensors_prefer_pressure() {
        let fixes = (0..100)
            .map(|i| fix(i, i as f64, 500.0 + i as f64, 520.0 + i as f64))
            .collect();
        let mut flight = flight_of(fixes);
        flight.check_altitudes(&FlightParsingConfig::default());
        assert!(flight.press_alt_valid);
        assert!(flight.gnss_alt_valid);
        assert_eq!(flight.alt_source, Some(AltitudeSource::Pressure));
        assert!(flight.valid);
    }

    #[test]
    fn flatlined_pressure_sensor_falls_back_to_gnss() {
        let fixes = (0..100)
            .map(|i| fix(i, i as f64, 500.0, 520.0 + i as f64))
            .collect();
        let mut flight = flight_of(fixes);
        flight.check_altitudes(&FlightParsingConfig::default());
        assert!(!flight.press_alt_valid);
        assert!(flight.gnss_alt_valid);
        assert_eq!(flight.alt_source, Some(AltitudeSource::Gnss));
        assert!(flight.valid);
        assert!(flight.notes[0].starts_with("Warning:"));
    }

    #[test]
    fn two_dead_sensors_invalidate_the_flight() {
        let fixes = (0..100).map(|i| fix(i, i as f64, 500.0, 520.0)).collect();
        let mut flight = flight_of(fixes);
        flight.check_altitudes(&FlightParsingConfig::default());
        assert_eq!(flight.alt_source, None);
        assert!(!flight.valid);
        assert!(flight.notes.last().unwrap().starts_with("Error:"));
    }

    #[test]
    fn altitude_spikes_are_counted() {
        // four spikes of 1000 m/s, one more than allowed
        let mut fixes: Vec<GnssFix> = Vec::new();
        for i in 0..100usize {
            let press_alt = if i % 25 == 1 { 1500.0 } else { 500.0 + i as f64 };
            fixes.push(fix(i, i as f64, press_alt, 520.0 + i as f64));
        }
        let mut flight = flight_of(fixes);
        flight.check_altitudes(&FlightParsingConfig::default());
        assert!(!flight.press_alt_valid);
        assert_eq!(flight.alt_source, Some(AltitudeSource::Gnss));
    }

    #[test]
    fn envelope_violations_invalidate_a_sensor() {
        let fixes = (0..100)
            .map(|i| fix(i, i as f64, 500.0 + i as f64, 10500.0 + i as f64))
            .collect();
        let mut flight = flight_of(fixes);
        flight.check_altitudes(&FlightParsingConfig::default());
        assert!(flight.press_alt_valid);
        assert!(!flight.gnss_alt_valid);
        assert!(flight
            .notes
            .iter()
            .any(|n| n.contains("gnss altitude limits exceeded")));
    }

    #[test]
    fn midnight_crossing_is_repaired() {
        let mut fixes = vec![fix(0, 86390.0, 500.0, 520.0), fix(1, 10.0, 501.0, 521.0)];
        for i in 2..102usize {
            fixes.push(fix(i, 10.0 + i as f64, 500.0 + i as f64, 520.0 + i as f64));
        }
        let mut flight = flight_of(fixes);
        flight.check_rawtime(&FlightParsingConfig::default());
        assert!(flight.valid);
        assert_eq!(flight.days_added, 1);
        assert_eq!(flight.fixes[1].rawtime, 86410.0);
        // the day carries over to all subsequent fixes
        assert_eq!(flight.fixes[2].rawtime, 86412.0);
        for pair in flight.fixes.windows(2) {
            assert!(pair[1].rawtime >= pair[0].rawtime);
        }
    }

    #[test]
    fn large_backwards_jump_is_not_a_crossing() {
        let mut fixes = vec![fix(0, 50000.0, 500.0, 520.0)];
        for i in 1..101usize {
            fixes.push(fix(i, i as f64, 500.0 + i as f64, 520.0 + i as f64));
        }
        let mut flight = flight_of(fixes);
        flight.check_rawtime(&FlightParsingConfig::default());
        assert_eq!(flight.days_added, 0);
        // the negative interval counts as a time violation instead
        assert_eq!(flight.fixes[1].rawtime, 1.0);
    }

    #[test]
    fn too_many_gap_violations_invalidate() {
        // every second interval is 60 s long: far more than allowed
        let fixes = (0..100)
            .map(|i| {
                let rawtime = (i / 2 * 62 + (i % 2) * 60) as f64;
                fix(i, rawtime, 500.0 + i as f64, 520.0 + i as f64)
            })
            .collect();
        let mut flight = flight_of(fixes);
        flight.check_rawtime(&FlightParsingConfig::default());
        assert!(!flight.valid);
        assert!(flight
            .notes
            .iter()
            .any(|n| n.starts_with("Error:") && n.contains("time between fixes")));
    }

    #[test]
    fn too_many_crossings_invalidate() {
        // three blocks, each wrapping past 0:00 UTC once
        let mut fixes = Vec::new();
        let mut index = 0usize;
        for _ in 0..3 {
            for j in 0..4usize {
                let rawtime = 86380.0 + 5.0 * j as f64;
                fixes.push(fix(index, rawtime, 500.0 + index as f64, 520.0 + index as f64));
                index += 1;
            }
            for j in 0..21usize {
                let rawtime = 5.0 * j as f64;
                fixes.push(fix(index, rawtime, 500.0 + index as f64, 520.0 + index as f64));
                index += 1;
            }
        }
        let mut flight = flight_of(fixes);
        flight.check_rawtime(&FlightParsingConfig::default());
        assert_eq!(flight.days_added, 3);
        assert!(!flight.valid);
        assert!(flight.notes.iter().any(|n| n.contains("UTC 0:00")));
    }
}
