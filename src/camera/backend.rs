/// Collaborators the viewfinder consumes but does not implement
///
/// A platform camera layer provides these; the desktop build uses the still
/// rig in `camera::still` and the EXIF reader in `camera::metadata`.

use std::future::Future;
use std::path::PathBuf;

use super::device::{CaptureFormat, DeviceHandle, DeviceKind, Facing, PhysicalDevice};
use crate::error::CaptureError;
use crate::state::catalog::AspectRatioChoice;

/// A captured still, referenced by where the platform stored it
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    pub path: PathBuf,
}

/// Result of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Finds physical camera units
pub trait DeviceEnumerator {
    /// Zero or one device matching the facing and physical type
    fn find_device(&self, facing: Facing, kind: DeviceKind) -> Option<DeviceHandle>;
}

/// Chooses a capture format for a device and aspect ratio
pub trait FormatSelector {
    fn select_format(&self, device: &PhysicalDevice, aspect: AspectRatioChoice) -> Option<CaptureFormat>;
}

/// Takes still photos
pub trait PhotoCapture {
    /// Fails if the hardware is busy or permission was revoked mid-session
    fn take_photo(
        &self,
        device: DeviceHandle,
    ) -> impl Future<Output = Result<CapturedPhoto, CaptureError>> + Send;
}

/// Reads calibration metadata from a captured still
pub trait MetadataReader {
    /// `Ok(None)` when the photo carries no 35mm-equivalent focal length
    fn read_equivalent_focal_length(
        &self,
        photo: &CapturedPhoto,
    ) -> impl Future<Output = Result<Option<f64>, CaptureError>> + Send;

    /// Lens focal length as built, in mm, when recorded
    fn read_native_focal_length(
        &self,
        photo: &CapturedPhoto,
    ) -> impl Future<Output = Result<Option<f64>, CaptureError>> + Send;
}

/// Camera permission
pub trait PermissionGate {
    fn has_permission(&self) -> bool;

    fn request_permission(&self) -> impl Future<Output = PermissionStatus> + Send;
}
