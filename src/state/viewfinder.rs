/// Viewfinder state record
///
/// Owned and mutated only by the controller; the UI host reads it for display.

use chrono::{DateTime, Utc};

use super::catalog::{AspectRatioChoice, CameraProfile, LensChoice};
use crate::camera::device::{CaptureFormat, DeviceHandle, DeviceId};
use crate::error::ViewfinderError;
use crate::optics::{self, CropSource};

/// Where the controller is in the calibration cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial state: standard device active, never calibrated
    Idle,
    /// Active device has no trusted calibration yet
    AwaitingCalibration,
    /// Active device has a calibration sample and the zoom is derived from it
    Calibrated,
}

/// How a calibration value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSource {
    /// `FocalLengthIn35mmFilm` from the calibration photo
    Exif,
    /// Native `FocalLength` scaled by the sensor size implied by the format's field of view
    FieldOfView,
    /// Assumed value for an ultra-wide unit whose photo had no usable metadata
    AssumedUltraWide,
}

/// Measured 35mm-equivalent focal length of a device at neutral zoom
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSample {
    pub device: DeviceId,
    pub equivalent_focal_mm: f64,
    pub source: CalibrationSource,
    pub measured_at: DateTime<Utc>,
}

/// Everything the viewfinder currently shows and requests
#[derive(Debug, Clone)]
pub struct ViewfinderState {
    pub lens: LensChoice,
    pub profile: CameraProfile,
    pub aspect: AspectRatioChoice,
    pub active: DeviceHandle,
    /// Capture format handed back by the format collaborator
    pub format: Option<CaptureFormat>,
    pub calibration: Option<CalibrationSample>,
    /// Zoom currently requested from the camera preview
    pub zoom: f64,
    pub phase: Phase,
    pub last_error: Option<ViewfinderError>,
}

impl ViewfinderState {
    /// Lens focal length scaled by the body's crop factor
    pub fn desired_equivalent_focal(&self) -> f64 {
        optics::equivalent_focal_length(self.lens.mm(), CropSource::Ratio(self.profile.crop_factor))
    }

    /// Calibration, but only while it belongs to the active device
    pub fn trusted_calibration(&self) -> Option<&CalibrationSample> {
        self.calibration
            .as_ref()
            .filter(|sample| sample.device == self.active.id)
    }

    pub fn is_calibrated(&self) -> bool {
        self.phase == Phase::Calibrated && self.trusted_calibration().is_some()
    }

    /// One-line status for the UI host
    pub fn status_line(&self) -> String {
        match (self.phase, self.trusted_calibration(), &self.last_error) {
            (Phase::Calibrated, Some(sample), _) => {
                let source = match sample.source {
                    CalibrationSource::Exif => "EXIF",
                    CalibrationSource::FieldOfView => "FOV",
                    CalibrationSource::AssumedUltraWide => "assumed",
                };
                format!(
                    "Calibrated: {} ≈ {:.1} mm ({})",
                    self.active.kind.label(),
                    sample.equivalent_focal_mm,
                    source
                )
            }
            (Phase::Idle, _, _) => "Starting...".to_string(),
            (_, _, Some(err)) => err.to_string(),
            _ => format!("Calibrating {} camera...", self.active.kind.label()),
        }
    }
}
