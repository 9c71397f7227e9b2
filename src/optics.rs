/// Focal length and zoom math
///
/// Pure conversions between phone-camera focal lengths, crop factors,
/// 35mm-equivalent focal lengths and the zoom factor requested from the camera.
/// Nothing in here touches devices or UI state.

/// Diagonal of a full-frame (36x24mm) sensor
pub const FULL_FRAME_DIAGONAL_MM: f64 = 43.3;

/// Diagonal of a typical compact / phone main sensor (1/2.3")
#[allow(dead_code)]
pub const COMPACT_SENSOR_DIAGONAL_MM: f64 = 7.356;

/// Zoom bounds used when a device does not report its own
pub const DEFAULT_MIN_ZOOM: f64 = 1.0;
pub const DEFAULT_MAX_ZOOM: f64 = 10.0;

/// How a crop factor is known for an equivalent focal length conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropSource {
    /// Crop factor given directly (e.g. 1.6 for Canon APS-C)
    Ratio(f64),
    /// Sensor diagonal in mm, compared against the full-frame diagonal
    SensorDiagonal(f64),
}

impl CropSource {
    /// The multiplier from native to 35mm-equivalent focal length
    pub fn ratio(self) -> f64 {
        match self {
            CropSource::Ratio(ratio) => ratio,
            CropSource::SensorDiagonal(diagonal) => FULL_FRAME_DIAGONAL_MM / diagonal,
        }
    }
}

/// Convert a native focal length to its 35mm-equivalent
pub fn equivalent_focal_length(native_focal_mm: f64, crop: CropSource) -> f64 {
    native_focal_mm * crop.ratio()
}

/// Sensor diagonal derived from a lens focal length and its horizontal field of view
///
/// # Arguments
/// * `focal_mm` - Native focal length, must be > 0
/// * `fov_degrees` - Horizontal field of view, strictly inside (0, 180)
/// * `aspect_ratio` - Sensor width / height, must be > 0
///
/// # Returns
/// * `None` when any input is outside its domain
pub fn sensor_diagonal_from_fov(focal_mm: f64, fov_degrees: f64, aspect_ratio: f64) -> Option<f64> {
    let in_domain = focal_mm.is_finite()
        && focal_mm > 0.0
        && fov_degrees > 0.0
        && fov_degrees < 180.0
        && aspect_ratio.is_finite()
        && aspect_ratio > 0.0;
    if !in_domain {
        return None;
    }

    let width = 2.0 * focal_mm * (fov_degrees.to_radians() / 2.0).tan();
    let height = width / aspect_ratio;
    let diagonal = width.hypot(height);

    diagonal.is_finite().then_some(diagonal)
}

/// Sensor diagonal with an explicit fallback for missing or unusable inputs
///
/// Callers pass one of the diagonal constants (usually
/// [`COMPACT_SENSOR_DIAGONAL_MM`]) as the fallback. Calibration does not use
/// this: a wide unit must never be calibrated from an assumed sensor.
#[allow(dead_code)]
pub fn sensor_diagonal_or(
    focal_mm: Option<f64>,
    fov_degrees: Option<f64>,
    aspect_ratio: f64,
    fallback_mm: f64,
) -> f64 {
    match (focal_mm, fov_degrees) {
        (Some(focal), Some(fov)) => {
            sensor_diagonal_from_fov(focal, fov, aspect_ratio).unwrap_or(fallback_mm)
        }
        _ => fallback_mm,
    }
}

/// Zoom needed to make a calibrated camera frame like the desired focal length
///
/// Returns `None` when the calibrated focal length is not a positive number.
pub fn zoom_factor(desired_equivalent_mm: f64, calibrated_equivalent_mm: f64) -> Option<f64> {
    if !calibrated_equivalent_mm.is_finite() || calibrated_equivalent_mm <= 0.0 {
        return None;
    }
    if !desired_equivalent_mm.is_finite() {
        return None;
    }
    Some(desired_equivalent_mm / calibrated_equivalent_mm)
}

/// Clip a zoom value to device bounds
///
/// Unreported bounds fall back to [`DEFAULT_MIN_ZOOM`] and [`DEFAULT_MAX_ZOOM`].
/// The lower bound wins if a device reports inverted bounds.
pub fn clamp_zoom(zoom: f64, min_zoom: Option<f64>, max_zoom: Option<f64>) -> f64 {
    let min = min_zoom.unwrap_or(DEFAULT_MIN_ZOOM);
    let max = max_zoom.unwrap_or(DEFAULT_MAX_ZOOM);
    zoom.min(max).max(min)
}
