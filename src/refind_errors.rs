use thiserror::Error;

use crate::constants::Night;

/// Error taxonomy for the follow-up probability engine.
///
/// Expected data conditions (a missing night, an empty reachable schedule)
/// are deliberately *not* errors: the first is surfaced as an explicit
/// "no data" sentinel by the loaders, the second short-circuits to a zero
/// probability. Everything here indicates either a broken configuration or
/// a failing collaborator.
#[derive(Error, Debug)]
pub enum RefindError {
    #[error("No observation data for night {0}")]
    MissingNightData(Night),

    #[error("Unknown filter band: {0}")]
    UnknownBand(String),

    #[error("Unknown asteroid colour type: {0}")]
    UnknownAsteroidType(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Tracklet for object {0} has fewer than two detections")]
    EmptyTracklet(String),

    #[error("Ephemeris propagation failed: {0}")]
    PropagationFailed(String),

    #[error("Failed to build worker pool: {0}")]
    WorkerPoolError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PartialEq for RefindError {
    fn eq(&self, other: &Self) -> bool {
        use RefindError::*;
        match (self, other) {
            (MissingNightData(a), MissingNightData(b)) => a == b,
            (UnknownBand(a), UnknownBand(b)) => a == b,
            (UnknownAsteroidType(a), UnknownAsteroidType(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (EmptyTracklet(a), EmptyTracklet(b)) => a == b,
            (PropagationFailed(a), PropagationFailed(b)) => a == b,
            (WorkerPoolError(a), WorkerPoolError(b)) => a == b,

            // Wrapped foreign errors: equality if same variant
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
