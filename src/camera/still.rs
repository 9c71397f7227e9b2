/// Desktop camera rig backed by still photos
///
/// Stands in for a phone camera on the desktop: each configured device is
/// "captured" by handing back its sample photo, so the calibration path reads
/// real EXIF data from a real file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::backend::{CapturedPhoto, DeviceEnumerator, PermissionGate, PhotoCapture, PermissionStatus};
use super::device::{CaptureFormat, DeviceHandle, DeviceId, DeviceKind, Facing, PhysicalDevice};
use crate::error::CaptureError;

/// A device declared in the settings file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RigDevice {
    pub id: DeviceId,
    pub kind: DeviceKind,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default)]
    pub min_zoom: Option<f64>,
    #[serde(default)]
    pub max_zoom: Option<f64>,
    #[serde(default)]
    pub neutral_zoom: Option<f64>,
    #[serde(default)]
    pub formats: Vec<CaptureFormat>,
    /// Photo returned when this device takes a picture
    #[serde(default)]
    pub sample_photo: Option<PathBuf>,
}

/// The still rig section of the settings file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RigSettings {
    /// Simulates the platform permission prompt answer
    pub permission_granted: bool,
    pub devices: Vec<RigDevice>,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            permission_granted: true,
            devices: vec![
                RigDevice {
                    id: DeviceId::new("back-wide"),
                    kind: DeviceKind::Wide,
                    facing: Facing::Back,
                    min_zoom: Some(1.0),
                    max_zoom: Some(10.0),
                    neutral_zoom: Some(1.0),
                    formats: phone_formats(69.4),
                    sample_photo: None,
                },
                RigDevice {
                    id: DeviceId::new("back-ultra-wide"),
                    kind: DeviceKind::UltraWide,
                    facing: Facing::Back,
                    min_zoom: Some(1.0),
                    max_zoom: Some(10.0),
                    neutral_zoom: Some(1.0),
                    formats: phone_formats(106.0),
                    sample_photo: None,
                },
            ],
        }
    }
}

/// Typical 4:3 and 16:9 formats of a phone camera unit
fn phone_formats(field_of_view: f64) -> Vec<CaptureFormat> {
    vec![
        CaptureFormat {
            photo_width: 4032,
            photo_height: 3024,
            video_width: 1920,
            video_height: 1440,
            max_fps: 30.0,
            field_of_view: Some(field_of_view),
        },
        CaptureFormat {
            photo_width: 4032,
            photo_height: 2268,
            video_width: 3840,
            video_height: 2160,
            max_fps: 60.0,
            field_of_view: Some(field_of_view),
        },
    ]
}

/// Collaborators for the desktop build
#[derive(Debug)]
pub struct StillRig {
    permission_granted: bool,
    devices: Vec<DeviceHandle>,
    photos: HashMap<DeviceId, PathBuf>,
    /// Set while a photo is being taken
    shutter: AtomicBool,
}

impl StillRig {
    pub fn new(settings: &RigSettings) -> Self {
        let devices = settings
            .devices
            .iter()
            .map(|device| {
                Arc::new(PhysicalDevice {
                    id: device.id.clone(),
                    kind: device.kind,
                    facing: device.facing,
                    min_zoom: device.min_zoom,
                    max_zoom: device.max_zoom,
                    neutral_zoom: device.neutral_zoom,
                    formats: device.formats.clone(),
                })
            })
            .collect();

        let photos = settings
            .devices
            .iter()
            .filter_map(|device| {
                device
                    .sample_photo
                    .clone()
                    .map(|photo| (device.id.clone(), photo))
            })
            .collect();

        Self {
            permission_granted: settings.permission_granted,
            devices,
            photos,
            shutter: AtomicBool::new(false),
        }
    }

    /// Sample photo of a device, used for the preview
    pub fn sample_photo(&self, device: &DeviceId) -> Option<&PathBuf> {
        self.photos.get(device)
    }
}

impl DeviceEnumerator for StillRig {
    fn find_device(&self, facing: Facing, kind: DeviceKind) -> Option<DeviceHandle> {
        self.devices
            .iter()
            .find(|device| device.facing == facing && device.kind == kind)
            .cloned()
    }
}

impl PhotoCapture for StillRig {
    async fn take_photo(&self, device: DeviceHandle) -> Result<CapturedPhoto, CaptureError> {
        if !self.permission_granted {
            return Err(CaptureError::PermissionRevoked);
        }
        if self.shutter.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::Busy);
        }

        let result = self.expose(&device).await;
        self.shutter.store(false, Ordering::SeqCst);
        result
    }
}

impl StillRig {
    async fn expose(&self, device: &PhysicalDevice) -> Result<CapturedPhoto, CaptureError> {
        let path = self.photos.get(&device.id).cloned().ok_or_else(|| {
            CaptureError::Unavailable(format!("no sample photo configured for {}", device.id))
        })?;

        // Make sure the photo is actually there
        tokio::fs::metadata(&path)
            .await
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", path.display(), e)))?;

        Ok(CapturedPhoto { path })
    }
}

impl PermissionGate for StillRig {
    fn has_permission(&self) -> bool {
        self.permission_granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        if self.permission_granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}
