/// One-shot calibration capture
///
/// Takes a single photo on the requested device and reads its
/// 35mm-equivalent focal length. When the photo only records the native focal
/// length, the sensor size is estimated from the capture format's field of
/// view. Ultra-wide units with nothing usable fall back to a typical
/// ultra-wide equivalent; the wide unit has no safe fallback and fails instead.

use tracing::{debug, warn};

use super::backend::{CapturedPhoto, MetadataReader, PhotoCapture};
use super::device::DeviceKind;
use crate::error::CaptureError;
use crate::optics::{self, CropSource};
use crate::state::controller::{CalibrationOutcome, CalibrationReading, CaptureRequest};
use crate::state::viewfinder::CalibrationSource;

/// Equivalent focal length assumed for ultra-wide optics without metadata
pub const ULTRA_WIDE_FALLBACK_MM: f64 = 13.0;

/// Run a capture request to completion
pub async fn calibrate<C, M>(request: CaptureRequest, capture: &C, metadata: &M) -> CalibrationOutcome
where
    C: PhotoCapture,
    M: MetadataReader,
{
    let result = read_calibration(&request, capture, metadata).await;

    CalibrationOutcome {
        ticket: request.ticket,
        device: request.device.id.clone(),
        result,
    }
}

async fn read_calibration<C, M>(
    request: &CaptureRequest,
    capture: &C,
    metadata: &M,
) -> Result<CalibrationReading, CaptureError>
where
    C: PhotoCapture,
    M: MetadataReader,
{
    let photo = capture.take_photo(request.device.clone()).await?;
    debug!(path = %photo.path.display(), "calibration photo taken");

    if let Some(focal) = usable(metadata.read_equivalent_focal_length(&photo).await) {
        return Ok(CalibrationReading {
            equivalent_focal_mm: focal,
            source: CalibrationSource::Exif,
        });
    }

    if let Some(focal) = from_field_of_view(request, metadata, &photo).await {
        return Ok(CalibrationReading {
            equivalent_focal_mm: focal,
            source: CalibrationSource::FieldOfView,
        });
    }

    match request.device.kind {
        DeviceKind::UltraWide => {
            debug!(fallback_mm = ULTRA_WIDE_FALLBACK_MM, "assuming typical ultra-wide focal length");
            Ok(CalibrationReading {
                equivalent_focal_mm: ULTRA_WIDE_FALLBACK_MM,
                source: CalibrationSource::AssumedUltraWide,
            })
        }
        DeviceKind::Wide => Err(CaptureError::MissingFocalLength),
    }
}

/// Equivalent focal length from the native one and the format's field of view
///
/// Only used when the format reports a usable field of view. Unusable
/// geometry yields `None`; no sensor size is assumed here.
async fn from_field_of_view<M: MetadataReader>(
    request: &CaptureRequest,
    metadata: &M,
    photo: &CapturedPhoto,
) -> Option<f64> {
    let format = request.format?;
    let field_of_view = format.field_of_view?;
    let native = usable(metadata.read_native_focal_length(photo).await)?;

    let Some(diagonal) = optics::sensor_diagonal_from_fov(native, field_of_view, format.photo_aspect()) else {
        debug!(native_mm = native, field_of_view, "field of view geometry unusable");
        return None;
    };
    let focal = optics::equivalent_focal_length(native, CropSource::SensorDiagonal(diagonal));
    debug!(native_mm = native, diagonal_mm = diagonal, focal_mm = focal, "derived focal length from field of view");

    (focal.is_finite() && focal > 0.0).then_some(focal)
}

fn usable(read: Result<Option<f64>, CaptureError>) -> Option<f64> {
    match read {
        Ok(Some(focal)) if focal.is_finite() && focal > 0.0 => Some(focal),
        Ok(_) => None,
        Err(err) => {
            warn!(%err, "EXIF error");
            None
        }
    }
}
