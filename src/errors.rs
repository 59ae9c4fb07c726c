//! IGC parsing errors.

use thiserror::Error;

/// Errors raised while reading a recording from disk.
///
/// Only I/O can fail a read: unparseable record lines are skipped and
/// every flight level anomaly is reported through [crate::flight::Flight]
/// `notes` and its `valid` flag instead.
#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("file i/o error: {0}")]
    IoError(#[from] std::io::Error),
}
