/// EXIF metadata reader for calibration photos
///
/// Reads `FocalLengthIn35mmFilm` when the camera wrote it. Otherwise the
/// native `FocalLength` is converted with the sensor size recorded in the
/// focal-plane resolution tags, when those are present. The native value is
/// also exposed on its own for field-of-view based calibration.

use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tokio::task;

use super::backend::{CapturedPhoto, MetadataReader};
use crate::error::CaptureError;
use crate::optics::{self, CropSource};

/// Reads calibration focal lengths from photo files
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifFocalReader;

impl MetadataReader for ExifFocalReader {
    async fn read_equivalent_focal_length(&self, photo: &CapturedPhoto) -> Result<Option<f64>, CaptureError> {
        let path = photo.path.clone();
        // Spawn blocking because EXIF parsing does file IO
        task::spawn_blocking(move || read_focal_blocking(&path, equivalent_focal_from_exif))
            .await
            .map_err(|e| CaptureError::Join(e.to_string()))?
    }

    async fn read_native_focal_length(&self, photo: &CapturedPhoto) -> Result<Option<f64>, CaptureError> {
        let path = photo.path.clone();
        task::spawn_blocking(move || read_focal_blocking(&path, native_focal_from_exif))
            .await
            .map_err(|e| CaptureError::Join(e.to_string()))?
    }
}

fn read_focal_blocking(path: &Path, extract: fn(&exif::Exif) -> Option<f64>) -> Result<Option<f64>, CaptureError> {
    let file = File::open(path).map_err(|e| CaptureError::Metadata(format!("{}: {}", path.display(), e)))?;
    let mut reader = BufReader::new(file);

    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(extract(&exif)),
        // No EXIF block at all is "absent", not an error
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(CaptureError::Metadata(e.to_string())),
    }
}

/// Native lens focal length in mm
pub fn native_focal_from_exif(exif: &exif::Exif) -> Option<f64> {
    rational(exif, Tag::FocalLength).filter(|&mm| mm.is_finite() && mm > 0.0)
}

/// 35mm-equivalent focal length recorded in (or derivable from) EXIF
pub fn equivalent_focal_from_exif(exif: &exif::Exif) -> Option<f64> {
    let recorded = exif
        .get_field(Tag::FocalLengthIn35mmFilm, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        // 0 means "unknown"
        .filter(|&mm| mm > 0)
        .map(f64::from);
    if recorded.is_some() {
        return recorded;
    }

    let focal = native_focal_from_exif(exif)?;
    let diagonal = sensor_diagonal_from_focal_plane(exif)?;
    Some(optics::equivalent_focal_length(focal, CropSource::SensorDiagonal(diagonal)))
}

/// Sensor diagonal in mm from pixel dimensions and focal-plane resolution
fn sensor_diagonal_from_focal_plane(exif: &exif::Exif) -> Option<f64> {
    let unit_mm = match uint(exif, Tag::FocalPlaneResolutionUnit).unwrap_or(2) {
        2 => 25.4,
        3 => 10.0,
        4 => 1.0,
        5 => 0.001,
        _ => return None,
    };

    let x_resolution = rational(exif, Tag::FocalPlaneXResolution).filter(|&r| r > 0.0)?;
    let y_resolution = rational(exif, Tag::FocalPlaneYResolution).filter(|&r| r > 0.0)?;
    let width_px = uint(exif, Tag::PixelXDimension).filter(|&px| px > 0)? as f64;
    let height_px = uint(exif, Tag::PixelYDimension).filter(|&px| px > 0)? as f64;

    let width_mm = width_px / x_resolution * unit_mm;
    let height_mm = height_px / y_resolution * unit_mm;
    let diagonal = width_mm.hypot(height_mm);

    (diagonal.is_finite() && diagonal > 0.0).then_some(diagonal)
}

fn uint(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn rational(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => values.first().map(|r| r.to_f64()),
        _ => None,
    }
}
