/// Error kinds surfaced by the viewfinder
///
/// None of these are fatal to the process. Each one is kept as state and
/// rendered as a human-readable status string.

use thiserror::Error;

/// Errors the viewfinder reports to its host
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewfinderError {
    /// Camera access was refused; recovery is up to the user
    #[error("No permission to use camera")]
    PermissionDenied,

    /// No usable back-facing wide camera was found
    #[error("Camera unavailable")]
    DeviceUnavailable,

    /// The calibration photo or its metadata could not be read
    #[error("Calibration pending: {0}")]
    CalibrationFailed(String),

    /// A setter received a value outside its domain
    #[error("Invalid {what}: {value}")]
    InvalidSetting { what: &'static str, value: f64 },
}

/// Errors from the capture and metadata collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("camera is busy")]
    Busy,

    #[error("capture unavailable: {0}")]
    Unavailable(String),

    #[error("camera permission was revoked")]
    PermissionRevoked,

    #[error("failed to read photo metadata: {0}")]
    Metadata(String),

    #[error("photo has no 35mm-equivalent focal length")]
    MissingFocalLength,

    #[error("background task failed: {0}")]
    Join(String),
}

impl From<CaptureError> for ViewfinderError {
    fn from(err: CaptureError) -> Self {
        ViewfinderError::CalibrationFailed(err.to_string())
    }
}
