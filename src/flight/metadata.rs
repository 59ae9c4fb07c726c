//! A, H and I record extraction.
//!
//! Header records carry free form metadata: the recording date, glider
//! type, competition class, recorder identification. Keywords are
//! matched case insensitively and tolerate interstitial whitespace.

use hifitime::Epoch;
use once_cell::sync::Lazy;
use regex::Regex;

use super::Flight;

static HFDTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:HFDTE|HFDTEDATE:[ ]*)(\d\d)(\d\d)(\d\d)").unwrap());

static HFGTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HFGTY[ ]*GLIDER[ ]*TYPE[ ]*:[ ]*(.*)").unwrap());

static HFRFW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HFR[FH]W[ ]*FIRMWARE[ ]*VERSION[ ]*:[ ]*(.*)").unwrap());

static HFRHW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HFR[FH]W[ ]*HARDWARE[ ]*VERSION[ ]*:[ ]*(.*)").unwrap());

static HFFTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HFFTY[ ]*FR[ ]*TYPE[ ]*:[ ]*(.*)").unwrap());

static HFGPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^HFGPS(?:[: ]|(?:GPS))*(.*)").unwrap());

static HFPRS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HFPRS[ ]*PRESS[ ]*ALT[ ]*SENSOR[ ]*:[ ]*(.*)").unwrap());

static HFCCL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HFCCL[ ]*COMPETITION[ ]*CLASS[ ]*:[ ]*(.*)").unwrap());

/// Drops everything but ASCII alphanumerics, ASCII punctuation and space.
fn strip_non_printable(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_punctuation() || *c == ' ')
        .collect()
}

impl Flight {
    /// Extracts the metadata surface from the raw A, H and I record
    /// lines. A missing or unusable date record invalidates the flight:
    /// without it no absolute timestamp can be derived.
    pub(crate) fn parse_metadata(
        &mut self,
        a_records: &[String],
        h_records: &[String],
        i_records: &[String],
    ) {
        if let Some(first) = a_records.first() {
            let manufacturer: String = first.chars().skip(1).take(3).collect();
            let unique_id: String = first.chars().skip(4).take(3).collect();
            self.fr_manuf_code = Some(strip_non_printable(&manufacturer));
            self.fr_uniq_id = Some(strip_non_printable(&unique_id));
        }

        if !i_records.is_empty() {
            self.i_record = Some(strip_non_printable(&i_records.join(" ")));
        }

        for record in h_records {
            self.parse_h_record(record);
        }

        if self.date_timestamp.is_none() {
            self.note_error("no date record (HFDTE) in the file".to_string());
        }
    }

    fn parse_h_record(&mut self, record: &str) {
        let keyword = match record.get(0..5) {
            Some(keyword) => keyword,
            None => return,
        };
        match keyword {
            "HFDTE" => {
                if let Some(caps) = HFDTE_RE.captures(record) {
                    if let (Ok(day), Ok(month), Ok(year)) = (
                        caps[1].parse::<u8>(),
                        caps[2].parse::<u8>(),
                        caps[3].parse::<i32>(),
                    ) {
                        self.set_date(2000 + year, month, day);
                    }
                }
            },
            "HFGTY" => {
                if let Some(caps) = HFGTY_RE.captures(record) {
                    self.glider_type = Some(strip_non_printable(&caps[1]));
                }
            },
            "HFRFW" | "HFRHW" => {
                if let Some(caps) = HFRFW_RE.captures(record) {
                    self.fr_firmware_version = Some(strip_non_printable(&caps[1]));
                }
                if let Some(caps) = HFRHW_RE.captures(record) {
                    self.fr_hardware_version = Some(strip_non_printable(&caps[1]));
                }
            },
            "HFFTY" => {
                if let Some(caps) = HFFTY_RE.captures(record) {
                    self.fr_recorder_type = Some(strip_non_printable(&caps[1]));
                }
            },
            "HFGPS" => {
                if let Some(caps) = HFGPS_RE.captures(record) {
                    self.fr_gps_receiver = Some(strip_non_printable(&caps[1]));
                }
            },
            "HFPRS" => {
                if let Some(caps) = HFPRS_RE.captures(record) {
                    self.fr_pressure_sensor = Some(strip_non_printable(&caps[1]));
                }
            },
            "HFCCL" => {
                if let Some(caps) = HFCCL_RE.captures(record) {
                    self.competition_class = Some(strip_non_printable(&caps[1]));
                }
            },
            _ => {},
        }
    }

    /// Resolves the recording date to the seconds between its UTC
    /// midnight and the Unix epoch.
    fn set_date(&mut self, year: i32, month: u8, day: u8) {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return;
        }
        if let Ok(epoch) = Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0) {
            self.date_timestamp = Some(epoch.to_unix_seconds());
        }
    }
}
