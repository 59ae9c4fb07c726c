//! GNSS fixes: the in-memory form of IGC B records.

use thiserror::Error;

use crate::geo;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Byte offset of every field inside a B record line.
/// `B HHMMSS DDMMmmmN DDDMMmmmE V PPPPP GGGGG extras`
const TIME_OFFSET: usize = 1;
const LAT_OFFSET: usize = 7;
const LON_OFFSET: usize = 15;
const VALIDITY_OFFSET: usize = 24;
const PRESS_ALT_OFFSET: usize = 25;
const GNSS_ALT_OFFSET: usize = 30;
const EXTRAS_OFFSET: usize = 35;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("not a B record")]
    NotABRecord,
    #[error("B record line is too short")]
    TruncatedRecord,
    #[error("failed to parse \"{0}\" field")]
    FieldParsing(String),
    #[error("invalid hemisphere letter")]
    InvalidHemisphere,
    #[error("invalid fix validity character")]
    InvalidValidity,
}

/// A single GNSS flight recorder sample (one B record).
///
/// The raw attributes come straight off the record line. The derived
/// attributes start zeroed and are filled in by the flight engine, each
/// exactly once, before any thermal or glide is emitted.
///
/// ```
/// use igc::fix::GnssFix;
///
/// let fix = GnssFix::from_b_record("B1101355206343N00006198WA0058700558", 0)
///     .unwrap();
/// assert_eq!(fix.validity, 'A');
/// assert_eq!(fix.press_alt, 587.0);
/// assert_eq!(fix.to_b_record(), "B1101355206343N00006198WA0058700558");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GnssFix {
    /// Seconds since the log's current UTC midnight.
    /// Monotonic once the engine has repaired midnight crossings.
    pub rawtime: f64,
    /// Latitude, signed decimal degrees, south negative.
    pub lat: f64,
    /// Longitude, signed decimal degrees, west negative.
    pub lon: f64,
    /// Recorder validity character: 'A' = 3D fix, 'V' = 2D or invalid.
    pub validity: char,
    /// Pressure altitude, meters.
    pub press_alt: f64,
    /// GNSS altitude, meters.
    pub gnss_alt: f64,
    /// Zero based position of the fix in the source stream.
    pub index: usize,
    /// B record extension bytes, preserved verbatim.
    pub extras: String,
    /// Absolute time, seconds since the Unix epoch.
    pub timestamp: f64,
    /// Selected altitude, meters, from the flight's retained sensor.
    pub alt: f64,
    /// Ground speed to the previous fix, km/h.
    pub gsp: f64,
    /// Initial bearing to the next fix, degrees in [0, 360).
    pub bearing: f64,
    /// Bearing change rate, degrees per second. Positive turns right.
    pub bearing_change_rate: f64,
    /// Whether the aircraft is airborne at this fix.
    pub flying: bool,
    /// Whether this fix belongs to a circling (thermalling) interval.
    pub circling: bool,
}

/// Reads an unsigned fixed width decimal field.
fn parse_digits(line: &str, offset: usize, width: usize, field: &str) -> Result<u32, Error> {
    let slice = line
        .get(offset..offset + width)
        .ok_or(Error::TruncatedRecord)?;
    if !slice.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::FieldParsing(field.to_string()));
    }
    slice
        .parse::<u32>()
        .map_err(|_| Error::FieldParsing(field.to_string()))
}

/// Reads a 5 character altitude field: an optional leading minus in the
/// first column, digits everywhere else.
fn parse_altitude(line: &str, offset: usize, field: &str) -> Result<f64, Error> {
    let slice = line.get(offset..offset + 5).ok_or(Error::TruncatedRecord)?;
    let bytes = slice.as_bytes();
    if bytes[0] != b'-' && !bytes[0].is_ascii_digit() {
        return Err(Error::FieldParsing(field.to_string()));
    }
    if !bytes[1..].iter().all(|b| b.is_ascii_digit()) {
        return Err(Error::FieldParsing(field.to_string()));
    }
    slice
        .parse::<i32>()
        .map(f64::from)
        .map_err(|_| Error::FieldParsing(field.to_string()))
}

impl GnssFix {
    /// Builds a fix with the given raw attributes. The derived attributes
    /// are zeroed until the flight engine fills them.
    pub fn new(
        rawtime: f64,
        lat: f64,
        lon: f64,
        validity: char,
        press_alt: f64,
        gnss_alt: f64,
        index: usize,
        extras: &str,
    ) -> Self {
        Self {
            rawtime,
            lat,
            lon,
            validity,
            press_alt,
            gnss_alt,
            index,
            extras: extras.to_string(),
            timestamp: 0.0,
            alt: 0.0,
            gsp: 0.0,
            bearing: 0.0,
            bearing_change_rate: 0.0,
            flying: false,
            circling: false,
        }
    }

    /// Parses one IGC B record line. `index` is the zero based position
    /// the fix will take in the parent fix sequence. Lines that do not
    /// match the fixed width grammar are rejected and simply skipped by
    /// the engine.
    pub fn from_b_record(line: &str, index: usize) -> Result<Self, Error> {
        if !line.starts_with('B') {
            return Err(Error::NotABRecord);
        }
        if line.len() < EXTRAS_OFFSET {
            return Err(Error::TruncatedRecord);
        }

        let hours = parse_digits(line, TIME_OFFSET, 2, "hours")?;
        let minutes = parse_digits(line, TIME_OFFSET + 2, 2, "minutes")?;
        let seconds = parse_digits(line, TIME_OFFSET + 4, 2, "seconds")?;
        let rawtime = f64::from((hours * 60 + minutes) * 60 + seconds);

        let lat_deg = parse_digits(line, LAT_OFFSET, 2, "latitude degrees")?;
        let lat_min = parse_digits(line, LAT_OFFSET + 2, 2, "latitude minutes")?;
        let lat_min_dec = parse_digits(line, LAT_OFFSET + 4, 3, "latitude minute thousandths")?;
        let mut lat =
            f64::from(lat_deg) + f64::from(lat_min) / 60.0 + f64::from(lat_min_dec) / 60000.0;
        match line.as_bytes()[LAT_OFFSET + 7] {
            b'N' => {},
            b'S' => lat = -lat,
            _ => return Err(Error::InvalidHemisphere),
        }

        let lon_deg = parse_digits(line, LON_OFFSET, 3, "longitude degrees")?;
        let lon_min = parse_digits(line, LON_OFFSET + 3, 2, "longitude minutes")?;
        let lon_min_dec = parse_digits(line, LON_OFFSET + 5, 3, "longitude minute thousandths")?;
        let mut lon =
            f64::from(lon_deg) + f64::from(lon_min) / 60.0 + f64::from(lon_min_dec) / 60000.0;
        match line.as_bytes()[LON_OFFSET + 8] {
            b'E' => {},
            b'W' => lon = -lon,
            _ => return Err(Error::InvalidHemisphere),
        }

        let validity = match line.as_bytes()[VALIDITY_OFFSET] {
            b'A' => 'A',
            b'V' => 'V',
            _ => return Err(Error::InvalidValidity),
        };

        let press_alt = parse_altitude(line, PRESS_ALT_OFFSET, "pressure altitude")?;
        let gnss_alt = parse_altitude(line, GNSS_ALT_OFFSET, "gnss altitude")?;

        // everything after the altitude fields, up to the line terminator
        let extras = &line[EXTRAS_OFFSET..];

        Ok(Self::new(
            rawtime, lat, lon, validity, press_alt, gnss_alt, index, extras,
        ))
    }

    /// Reconstructs the IGC B record line for this fix.
    ///
    /// The inverse of [Self::from_b_record] up to one unit in the last
    /// place of the minute thousandths. A fix whose rawtime was pushed
    /// past midnight by the engine emits an hours field beyond 23, which
    /// reparses to the same rawtime.
    pub fn to_b_record(&self) -> String {
        let rawtime = self.rawtime as i64;
        let hours = rawtime / 3600;
        let minutes = (rawtime % 3600) / 60;
        let seconds = rawtime % 60;

        let (lat, lat_hemisphere) = if self.lat < 0.0 {
            (-self.lat, 'S')
        } else {
            (self.lat, 'N')
        };
        let lat = (lat * 60000.0).round() as i64;
        let (lat_deg, lat_min, lat_min_dec) = (lat / 60000, (lat % 60000) / 1000, lat % 1000);

        let (lon, lon_hemisphere) = if self.lon < 0.0 {
            (-self.lon, 'W')
        } else {
            (self.lon, 'E')
        };
        let lon = (lon * 60000.0).round() as i64;
        let (lon_deg, lon_min, lon_min_dec) = (lon / 60000, (lon % 60000) / 1000, lon % 1000);

        format!(
            "B{:02}{:02}{:02}{:02}{:02}{:03}{}{:03}{:02}{:03}{}{}{:05}{:05}{}",
            hours,
            minutes,
            seconds,
            lat_deg,
            lat_min,
            lat_min_dec,
            lat_hemisphere,
            lon_deg,
            lon_min,
            lon_min_dec,
            lon_hemisphere,
            self.validity,
            self.press_alt as i64,
            self.gnss_alt as i64,
            self.extras,
        )
    }

    /// Great circle distance to another fix, kilometers.
    pub fn distance_to(&self, other: &Self) -> f64 {
        geo::earth_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Initial bearing to another fix, degrees in [0, 360).
    pub fn bearing_to(&self, other: &Self) -> f64 {
        geo::bearing_to(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Splits rounded seconds into hours, minutes and seconds.
pub(crate) fn rawtime_to_hms(rawtime: f64) -> (i64, i64, i64) {
    let time = rawtime.round() as i64;
    (time / 3600, (time % 3600) / 60, time % 60)
}

impl std::fmt::Display for GnssFix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (h, m, s) = rawtime_to_hms(self.rawtime);
        write!(
            f,
            "GnssFix(rawtime={:02}:{:02}:{:02}, lat={:.6}, lon={:.6}, press_alt={:.1}, gnss_alt={:.1})",
            h, m, s, self.lat, self.lon, self.press_alt, self.gnss_alt
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn parse_b_record() {
        let fix = GnssFix::from_b_record("B1101355206343N00006198WA0058700558", 7).unwrap();
        assert_eq!(fix.rawtime, (11.0 * 60.0 + 1.0) * 60.0 + 35.0);
        assert!(approx_eq!(
            f64,
            fix.lat,
            52.0 + 6.0 / 60.0 + 343.0 / 60000.0,
            epsilon = 1e-12
        ));
        assert!(approx_eq!(
            f64,
            fix.lon,
            -(6.0 / 60.0 + 198.0 / 60000.0),
            epsilon = 1e-12
        ));
        assert_eq!(fix.validity, 'A');
        assert_eq!(fix.press_alt, 587.0);
        assert_eq!(fix.gnss_alt, 558.0);
        assert_eq!(fix.index, 7);
        assert_eq!(fix.extras, "");
    }

    #[test]
    fn parse_southern_hemisphere() {
        let fix = GnssFix::from_b_record("B0940233335500S01822833EA0105601090", 0).unwrap();
        assert!(fix.lat < 0.0);
        assert!(fix.lon > 0.0);
        assert!(approx_eq!(
            f64,
            fix.lat,
            -(33.0 + 35.0 / 60.0 + 500.0 / 60000.0),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn parse_negative_altitudes() {
        let fix = GnssFix::from_b_record("B1101355206343N00006198WA-0100-0042", 0).unwrap();
        assert_eq!(fix.press_alt, -100.0);
        assert_eq!(fix.gnss_alt, -42.0);
    }

    #[test]
    fn parse_extras_kept_verbatim() {
        let fix = GnssFix::from_b_record("B1101355206343N00006198WA0058700558012345abc", 0).unwrap();
        assert_eq!(fix.extras, "012345abc");
    }

    #[test]
    fn rejected_lines() {
        // record letter
        assert_eq!(
            GnssFix::from_b_record("A1101355206343N00006198WA0058700558", 0),
            Err(Error::NotABRecord)
        );
        // too short
        assert_eq!(
            GnssFix::from_b_record("B110135", 0),
            Err(Error::TruncatedRecord)
        );
        // letters in the time field
        assert!(GnssFix::from_b_record("Bxx01355206343N00006198WA0058700558", 0).is_err());
        // bad hemisphere
        assert_eq!(
            GnssFix::from_b_record("B1101355206343X00006198WA0058700558", 0),
            Err(Error::InvalidHemisphere)
        );
        // bad validity
        assert_eq!(
            GnssFix::from_b_record("B1101355206343N00006198WX0058700558", 0),
            Err(Error::InvalidValidity)
        );
    }

    #[test]
    fn b_record_round_trip() {
        for line in [
            "B1101355206343N00006198WA0058700558",
            "B0940233335500S01822833EA0105601090",
            "B2359594959999N17959999EV-0001-0600",
            "B1101355206343N00006198WA0058700558012345abc",
        ] {
            let fix = GnssFix::from_b_record(line, 0).unwrap();
            assert_eq!(fix.to_b_record(), line);
            // second round is idempotent
            let again = GnssFix::from_b_record(&fix.to_b_record(), 0).unwrap();
            assert_eq!(again.to_b_record(), line);
        }
    }

    #[test]
    fn emit_past_midnight() {
        let mut fix = GnssFix::from_b_record("B2359595206343N00006198WA0058700558", 0).unwrap();
        fix.rawtime += 11.0;
        let line = fix.to_b_record();
        assert!(line.starts_with("B240010"));
        let reparsed = GnssFix::from_b_record(&line, 0).unwrap();
        assert_eq!(reparsed.rawtime, fix.rawtime);
    }

    #[test]
    fn display() {
        let fix = GnssFix::from_b_record("B1101355206343N00006198WA0058700558", 0).unwrap();
        let s = format!("{}", fix);
        assert!(s.starts_with("GnssFix(rawtime=11:01:35"));
    }
}
