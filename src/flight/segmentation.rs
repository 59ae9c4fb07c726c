//! Phase segmentation: flying vs standing, straight vs circling, and
//! the thermal / glide intervals derived from both.

use super::Flight;
use crate::config::{FlightParsingConfig, FlightPick};
use crate::glide::Glide;
use crate::thermal::Thermal;
use crate::viterbi::ViterbiDecoder;

/// Tables of the flying / standing model. State 0 is standing, state 1
/// is flying. Tuned empirically; the segmentation results are only
/// reproducible with these exact values.
const FLYING_INIT_PROBS: [f64; 2] = [0.80, 0.20];
const FLYING_TRANSITION_PROBS: [[f64; 2]; 2] = [
    [0.9995, 0.0005], // transitions from standing
    [0.0005, 0.9995], // transitions from flying
];
const FLYING_EMISSION_PROBS: [[f64; 2]; 2] = [
    [0.8, 0.2], // emissions from standing
    [0.2, 0.8], // emissions from flying
];

/// Tables of the straight / circling model. State 0 is straight flight,
/// state 1 is circling.
const CIRCLING_INIT_PROBS: [f64; 2] = [0.80, 0.20];
const CIRCLING_TRANSITION_PROBS: [[f64; 2]; 2] = [
    [0.982, 0.018], // transitions from straight flight
    [0.030, 0.970], // transitions from circling
];
const CIRCLING_EMISSION_PROBS: [[f64; 2]; 2] = [
    [0.942, 0.058], // emissions from straight flight
    [0.093, 0.907], // emissions from circling
];

/// Folds a bearing difference into [-180, 180] so the 0/360 seam does
/// not read as a full turn.
fn normalize_bearing_change(mut change: f64) -> f64 {
    while change > 180.0 {
        change -= 360.0;
    }
    while change < -180.0 {
        change += 360.0;
    }
    change
}

impl Flight {
    /// Ground speed to the previous fix, km/h. The first fix gets 0.
    pub(crate) fn compute_ground_speeds(&mut self) {
        if self.fixes.is_empty() {
            return;
        }
        self.fixes[0].gsp = 0.0;
        for i in 1..self.fixes.len() {
            let distance = self.fixes[i].distance_to(&self.fixes[i - 1]);
            let rawtime = self.fixes[i].rawtime - self.fixes[i - 1].rawtime;
            self.fixes[i].gsp = if rawtime.abs() < 1e-5 {
                0.0
            } else {
                distance / rawtime * 3600.0
            };
        }
    }

    /// Raw flying / standing emissions from ground speed.
    /// Standing is 0, flying is 1.
    fn flying_emissions(&self, config: &FlightParsingConfig) -> Vec<usize> {
        self.fixes
            .iter()
            .map(|fix| usize::from(fix.gsp > config.min_gsp_flight))
            .collect()
    }

    /// Labels every fix flying or standing.
    ///
    /// Two passes: the Viterbi decoder smooths the raw emissions, then
    /// decoded standing runs shorter than `min_landing_time` are folded
    /// back into the flight. The verdict on a standing run is taken at
    /// its first fix and holds until the next decoded flying fix; a run
    /// that reaches the end of the log is always a landing.
    pub(crate) fn compute_flying(&mut self, config: &FlightParsingConfig) {
        let emissions = self.flying_emissions(config);
        let decoder = ViterbiDecoder::new(
            FLYING_INIT_PROBS,
            FLYING_TRANSITION_PROBS,
            [
                FLYING_EMISSION_PROBS[0].to_vec(),
                FLYING_EMISSION_PROBS[1].to_vec(),
            ],
        );
        let outputs = decoder.decode(&emissions);

        let mut ignore_next_downtime = false;
        let mut apply_next_downtime = false;
        for i in 0..self.fixes.len() {
            if outputs[i] == 1 {
                self.fixes[i].flying = true;
                // back in the air: reset the downtime verdict
                ignore_next_downtime = false;
                apply_next_downtime = false;
                continue;
            }

            if apply_next_downtime || ignore_next_downtime {
                self.fixes[i].flying = !apply_next_downtime;
                continue;
            }

            // first fix of a standing run: find the next decoded flying
            // fix to judge how long the downtime lasts
            let mut j = i + 1;
            while j < self.fixes.len() && outputs[j] != 1 {
                j += 1;
            }

            if j == self.fixes.len() {
                // standing until the end of the log
                apply_next_downtime = true;
                self.fixes[i].flying = false;
            } else {
                let time_ahead = self.fixes[j].rawtime - self.fixes[i].rawtime;
                if time_ahead >= config.min_landing_time {
                    apply_next_downtime = true;
                    self.fixes[i].flying = false;
                } else {
                    ignore_next_downtime = true;
                    self.fixes[i].flying = true;
                }
            }
        }
    }

    /// Locates takeoff and landing in the labelled fix stream.
    ///
    /// Takeoff is the first flying fix. Landing is the fix right after a
    /// flying run; with [FlightPick::First] the scan stops at the first
    /// one, with [FlightPick::Concatenate] the last one wins. A log that
    /// ends in flight lands on its final fix.
    pub(crate) fn compute_takeoff_landing(&mut self, config: &FlightParsingConfig) {
        let mut takeoff: Option<usize> = None;
        let mut landing: Option<usize> = None;
        let mut was_flying = false;

        for (i, fix) in self.fixes.iter().enumerate() {
            if fix.flying && takeoff.is_none() {
                takeoff = Some(i);
            }
            if !fix.flying && was_flying {
                landing = Some(i);
                if config.which_flight_to_pick == FlightPick::First {
                    break;
                }
            }
            was_flying = fix.flying;
        }

        let takeoff = match takeoff {
            Some(takeoff) => takeoff,
            None => return,
        };

        self.takeoff_index = Some(takeoff);
        self.landing_index = Some(landing.unwrap_or(self.fixes.len() - 1));
    }

    /// Initial bearing to the next fix; the last fix copies its
    /// predecessor.
    pub(crate) fn compute_bearings(&mut self) {
        let n = self.fixes.len();
        if n < 2 {
            return;
        }
        for i in 0..n - 1 {
            self.fixes[i].bearing = self.fixes[i].bearing_to(&self.fixes[i + 1]);
        }
        self.fixes[n - 1].bearing = self.fixes[n - 2].bearing;
    }

    /// Bearing change rate, degrees per second, positive to the right.
    ///
    /// Neighbor to neighbor deltas are noisy on one second logs, so the
    /// rate is taken against the closest fix at least
    /// `min_time_for_bearing_change` seconds back. Fixes without such a
    /// reference get 0.
    pub(crate) fn compute_bearing_change_rates(&mut self, config: &FlightParsingConfig) {
        for curr in 0..self.fixes.len() {
            let mut reference = None;
            for j in (1..curr).rev() {
                let time_dist = (self.fixes[curr].timestamp - self.fixes[j].timestamp).abs();
                if time_dist > config.min_time_for_bearing_change - 1e-7 {
                    reference = Some(j);
                    break;
                }
            }

            self.fixes[curr].bearing_change_rate = match reference {
                None => 0.0,
                Some(j) => {
                    let change = normalize_bearing_change(
                        self.fixes[curr].bearing - self.fixes[j].bearing,
                    );
                    let time_change = self.fixes[curr].timestamp - self.fixes[j].timestamp;
                    if time_change.abs() < 1e-7 {
                        0.0
                    } else {
                        change / time_change
                    }
                },
            };
        }
    }

    /// Raw circling / straight emissions. A fix emits "circling" when it
    /// is flying and turning faster than the configured rate, so this
    /// must run after the flying labels are final.
    fn circling_emissions(&self, config: &FlightParsingConfig) -> Vec<usize> {
        self.fixes
            .iter()
            .map(|fix| {
                let turning = fix.bearing_change_rate.abs() > config.min_bearing_change_circling;
                usize::from(fix.flying && turning)
            })
            .collect()
    }

    /// Labels every fix circling or not.
    pub(crate) fn compute_circling(&mut self, config: &FlightParsingConfig) {
        let emissions = self.circling_emissions(config);
        let decoder = ViterbiDecoder::new(
            CIRCLING_INIT_PROBS,
            CIRCLING_TRANSITION_PROBS,
            [
                CIRCLING_EMISSION_PROBS[0].to_vec(),
                CIRCLING_EMISSION_PROBS[1].to_vec(),
            ],
        );
        let outputs = decoder.decode(&emissions);
        for (fix, output) in self.fixes.iter_mut().zip(outputs) {
            fix.circling = output == 1;
        }
    }

    /// Walks the fixes between takeoff and landing and cuts them into
    /// thermals and glides.
    ///
    /// A circling run becomes a thermal when it lasted longer than
    /// `min_time_for_thermal`; the glide in progress then ends at the
    /// thermal entry with the track length accumulated up to that point.
    /// A rejected (too short) circling run interrupts nothing: the open
    /// glide continues and keeps its rolling distance. A glide still
    /// open after the last fix is closed at the landing fix.
    pub(crate) fn find_thermals(&mut self, config: &FlightParsingConfig) {
        let (takeoff, landing) = match (self.takeoff_index, self.landing_index) {
            (Some(takeoff), Some(landing)) => (takeoff, landing),
            _ => return,
        };

        let mut thermals: Vec<Thermal> = Vec::new();
        let mut glides: Vec<Glide> = Vec::new();

        let mut circling_now = false;
        let mut gliding_now = false;
        let mut first_fix: Option<usize> = None;
        let mut first_glide_fix: Option<usize> = None;
        let mut last_glide_fix: Option<usize> = None;
        let mut distance = 0.0f64;
        let mut distance_start_circling = 0.0f64;

        for i in takeoff..=landing {
            if !circling_now && self.fixes[i].circling {
                // climb entry
                circling_now = true;
                first_fix = Some(i);
                distance_start_circling = distance;
            } else if circling_now && !self.fixes[i].circling {
                // climb exit: keep it only when it lasted long enough
                circling_now = false;
                if let (Some(enter), Some(glide_enter)) = (first_fix, first_glide_fix) {
                    let thermal = Thermal::new(&self.fixes[enter], &self.fixes[i]);
                    if thermal.time_change() > config.min_time_for_thermal - 1e-5 {
                        thermals.push(thermal);
                        // the glide ends where the thermal began
                        glides.push(Glide::new(
                            &self.fixes[glide_enter],
                            &self.fixes[enter],
                            distance_start_circling,
                        ));
                        gliding_now = false;
                    }
                }
            }

            if gliding_now {
                if let Some(last) = last_glide_fix {
                    distance += self.fixes[i].distance_to(&self.fixes[last]);
                }
                last_glide_fix = Some(i);
            } else {
                // glide entry
                first_glide_fix = Some(i);
                last_glide_fix = Some(i);
                gliding_now = true;
                distance = 0.0;
            }
        }

        if gliding_now {
            if let (Some(enter), Some(exit)) = (first_glide_fix, last_glide_fix) {
                glides.push(Glide::new(&self.fixes[enter], &self.fixes[exit], distance));
            }
        }

        self.thermals = thermals;
        self.glides = glides;
    }
}
