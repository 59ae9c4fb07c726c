#![cfg_attr(docrs, feature(doc_cfg))]

//! IGC flight recorder files parsing and soaring flight analysis.
//!
//! [Flight] is the core structure: it ingests the fix stream of an IGC
//! recording, validates it (sensor sanity, clock sanity, UTC midnight
//! crossings), derives per fix kinematics and segments the flight into
//! its soaring phases. [Thermal]s are the circling climbs, [Glide]s the
//! transitions between them; both segmentations are decoded with a two
//! state hidden Markov model over the derived quantities.
//!
//! ```no_run
//! use igc::prelude::*;
//!
//! let flight = Flight::from_file("flight.igc").unwrap();
//! assert!(flight.valid, "rejected: {:?}", flight.notes);
//!
//! println!(
//!     "takeoff at {:?}, landing at {:?}",
//!     flight.takeoff_fix().map(|fix| fix.rawtime),
//!     flight.landing_fix().map(|fix| fix.rawtime),
//! );
//! for thermal in &flight.thermals {
//!     println!("{}", thermal);
//! }
//! for glide in &flight.glides {
//!     println!("{}", glide);
//! }
//! ```
//!
//! Validation outcomes never panic and never error: a rejected
//! recording comes back with `valid == false` and the reasons spelled
//! out in `notes`. Only I/O failures surface as [ParsingError].
//!
//! Thresholds live in [config::FlightParsingConfig]; the defaults suit
//! one second gliding logs.
//!
//! [Flight]: flight::Flight
//! [Thermal]: thermal::Thermal
//! [Glide]: glide::Glide
//! [ParsingError]: errors::ParsingError

mod errors;

pub mod config;
pub mod fix;
pub mod flight;
pub mod geo;
pub mod glide;
pub mod thermal;
pub mod viterbi;

pub use errors::ParsingError;

pub mod prelude {
    pub use crate::config::{FlightParsingConfig, FlightPick};
    pub use crate::errors::ParsingError;
    pub use crate::fix::GnssFix;
    pub use crate::flight::{AltitudeSource, Flight};
    pub use crate::glide::Glide;
    pub use crate::thermal::Thermal;
    pub use crate::viterbi::ViterbiDecoder;
}
