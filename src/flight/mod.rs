//! Flight reconstruction: parsing, validation and phase segmentation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use strum_macros::{Display, EnumString};

use crate::config::FlightParsingConfig;
use crate::errors::ParsingError;
use crate::fix::GnssFix;
use crate::glide::Glide;
use crate::thermal::Thermal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod metadata;
mod segmentation;
mod validation;

/// The altitude sensor a flight is analyzed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AltitudeSource {
    /// Barometric altitude.
    #[strum(serialize = "PRESS")]
    Pressure,
    /// GNSS altitude.
    #[strum(serialize = "GNSS")]
    Gnss,
}

/// A parsed, validated and segmented IGC recording.
///
/// Check `valid` before using an instance: when it is false the recording
/// failed validation and every field except `notes` is undefined. The
/// reason is spelled out in `notes`.
///
/// ```no_run
/// use igc::prelude::*;
///
/// let flight = Flight::from_file("flight.igc").unwrap();
/// assert!(flight.valid, "rejected: {:?}", flight.notes);
/// for thermal in &flight.thermals {
///     println!("{}", thermal);
/// }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Flight {
    /// Whether the recording passed validation. When false, every field
    /// except `notes` is undefined.
    pub valid: bool,
    /// Warnings and errors gathered while parsing and validating.
    /// Fatal entries start with `Error:`, sensor level entries with
    /// `Warning:`.
    pub notes: Vec<String>,
    /// Ordered fix sequence, one entry per retained B record.
    pub fixes: Vec<GnssFix>,
    /// Detected thermals, in flight order.
    pub thermals: Vec<Thermal>,
    /// Glides between thermals, in flight order.
    pub glides: Vec<Glide>,
    /// The altitude sensor retained for analysis.
    pub alt_source: Option<AltitudeSource>,
    /// Whether the pressure altitude sensor passed the sanity checks.
    pub press_alt_valid: bool,
    /// Whether the GNSS altitude sensor passed the sanity checks.
    pub gnss_alt_valid: bool,
    /// UTC midnight of the recording date, seconds since the Unix epoch.
    pub date_timestamp: Option<f64>,
    /// Number of UTC midnight crossings repaired in the fix stream.
    pub days_added: u32,
    /// Flight recorder manufacturer code (A record).
    pub fr_manuf_code: Option<String>,
    /// Flight recorder unique id (A record).
    pub fr_uniq_id: Option<String>,
    /// Declared glider type.
    pub glider_type: Option<String>,
    /// Declared competition class.
    pub competition_class: Option<String>,
    /// Concatenated I records (B record extension descriptions).
    pub i_record: Option<String>,
    /// Recorder firmware version.
    pub fr_firmware_version: Option<String>,
    /// Recorder hardware version.
    pub fr_hardware_version: Option<String>,
    /// Recorder type.
    pub fr_recorder_type: Option<String>,
    /// GPS receiver description.
    pub fr_gps_receiver: Option<String>,
    /// Pressure sensor description.
    pub fr_pressure_sensor: Option<String>,

    takeoff_index: Option<usize>,
    landing_index: Option<usize>,
}

/// IGC files are ASCII in theory, ISO-8859-1 in the wild.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl Flight {
    /// Parses a recording from a file, with default thresholds.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParsingError> {
        Self::from_file_with_config(path, &FlightParsingConfig::default())
    }

    /// Parses a recording from a file with caller supplied thresholds.
    pub fn from_file_with_config<P: AsRef<Path>>(
        path: P,
        config: &FlightParsingConfig,
    ) -> Result<Self, ParsingError> {
        Self::from_reader(File::open(path)?, config)
    }

    /// Parses a gzip compressed recording (`.igc.gz`).
    #[cfg(feature = "flate2")]
    #[cfg_attr(docrs, doc(cfg(feature = "flate2")))]
    pub fn from_gzip_file<P: AsRef<Path>>(path: P) -> Result<Self, ParsingError> {
        let reader = flate2::read::GzDecoder::new(File::open(path)?);
        Self::from_reader(reader, &FlightParsingConfig::default())
    }

    /// Parses a recording from any readable input. Record lines may be
    /// terminated by CR, LF or CRLF; empty lines and unrecognized record
    /// types are skipped.
    pub fn from_reader<R: Read>(
        mut reader: R,
        config: &FlightParsingConfig,
    ) -> Result<Self, ParsingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let content = decode_latin1(&bytes);

        let mut fixes: Vec<GnssFix> = Vec::new();
        let mut a_records: Vec<String> = Vec::new();
        let mut h_records: Vec<String> = Vec::new();
        let mut i_records: Vec<String> = Vec::new();

        for line in content.split(['\r', '\n']) {
            if line.is_empty() {
                continue;
            }
            match line.as_bytes()[0] {
                b'A' => a_records.push(line.to_string()),
                b'B' => {
                    if let Ok(fix) = GnssFix::from_b_record(line, fixes.len()) {
                        match fixes.last() {
                            // the clock did not move: drop the duplicate
                            Some(prev) if (fix.rawtime - prev.rawtime).abs() < 1e-5 => {},
                            _ => fixes.push(fix),
                        }
                    }
                },
                b'H' => h_records.push(line.to_string()),
                b'I' => i_records.push(line.to_string()),
                _ => {}, // other record types do not participate
            }
        }

        debug!(
            "ingested {} fixes, {} A, {} H, {} I records",
            fixes.len(),
            a_records.len(),
            h_records.len(),
            i_records.len()
        );

        Ok(Self::new(fixes, &a_records, &h_records, &i_records, config))
    }

    /// Builds a flight from already materialized fixes and raw header
    /// record lines, then runs the full validation and segmentation
    /// pipeline. This is the entry point for callers that perform the
    /// file read themselves.
    pub fn new(
        fixes: Vec<GnssFix>,
        a_records: &[String],
        h_records: &[String],
        i_records: &[String],
        config: &FlightParsingConfig,
    ) -> Self {
        let mut flight = Flight {
            valid: true,
            notes: Vec::new(),
            fixes,
            thermals: Vec::new(),
            glides: Vec::new(),
            alt_source: None,
            press_alt_valid: false,
            gnss_alt_valid: false,
            date_timestamp: None,
            days_added: 0,
            fr_manuf_code: None,
            fr_uniq_id: None,
            glider_type: None,
            competition_class: None,
            i_record: None,
            fr_firmware_version: None,
            fr_hardware_version: None,
            fr_recorder_type: None,
            fr_gps_receiver: None,
            fr_pressure_sensor: None,
            takeoff_index: None,
            landing_index: None,
        };

        if flight.fixes.len() < config.min_fixes {
            flight.note_error(format!(
                "This file has {} fixes, less than the minimum {}.",
                flight.fixes.len(),
                config.min_fixes
            ));
            return flight;
        }

        // sensor sanity, then retain the first healthy sensor
        flight.check_altitudes(config);
        let alt_source = match flight.alt_source {
            Some(alt_source) => alt_source,
            None => return flight,
        };

        // clock sanity, repairs midnight crossings in place
        flight.check_rawtime(config);
        if !flight.valid {
            return flight;
        }

        flight.parse_metadata(a_records, h_records, i_records);
        let date_timestamp = match flight.date_timestamp {
            Some(date_timestamp) => date_timestamp,
            None => return flight,
        };

        for fix in flight.fixes.iter_mut() {
            fix.alt = match alt_source {
                AltitudeSource::Pressure => fix.press_alt,
                AltitudeSource::Gnss => fix.gnss_alt,
            };
            fix.timestamp = fix.rawtime + date_timestamp;
        }

        flight.compute_ground_speeds();
        flight.compute_flying(config);
        flight.compute_takeoff_landing(config);
        if flight.takeoff_index.is_none() {
            flight.notes.push("Warning: did not detect takeoff.".to_string());
            return flight;
        }

        flight.compute_bearings();
        flight.compute_bearing_change_rates(config);
        flight.compute_circling(config);
        flight.find_thermals(config);
        flight
    }

    /// The fix at which takeoff was detected, when one was.
    pub fn takeoff_fix(&self) -> Option<&GnssFix> {
        self.takeoff_index.map(|index| &self.fixes[index])
    }

    /// The fix at which landing was detected, when one was.
    pub fn landing_fix(&self) -> Option<&GnssFix> {
        self.landing_index.map(|index| &self.fixes[index])
    }

    fn note_error(&mut self, message: String) {
        warn!("flight rejected: {}", message);
        self.notes.push(format!("Error: {}", message));
        self.valid = false;
    }

    fn note_warning(&mut self, message: String) {
        warn!("{}", message);
        self.notes.push(format!("Warning: {}", message));
    }
}

impl std::fmt::Display for Flight {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flight(valid={}, fixes: {}, thermals: {})",
            self.valid,
            self.fixes.len(),
            self.thermals.len()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn latin1_is_byte_transparent() {
        let bytes: Vec<u8> = (0..=255).collect();
        let decoded = decode_latin1(&bytes);
        assert_eq!(decoded.chars().count(), 256);
        assert_eq!(decoded.chars().next(), Some('\0'));
        assert_eq!(decoded.chars().last(), Some('ÿ'));
    }

    #[test]
    fn empty_input_is_rejected_not_an_error() {
        let config = FlightParsingConfig::default();
        let flight = Flight::from_reader("".as_bytes(), &config).unwrap();
        assert!(!flight.valid);
        assert!(flight.notes[0].starts_with("Error:"));
    }

    #[test]
    fn line_terminators() {
        let config = FlightParsingConfig::default();
        let content = "AXCSABC\r\nHFDTE010124\rB1101355206343N00006198WA0058700558\n";
        let flight = Flight::from_reader(content.as_bytes(), &config).unwrap();
        // one fix survives ingestion even though the flight is too short
        assert_eq!(flight.fixes.len(), 1);
        assert!(!flight.valid);
    }
}
