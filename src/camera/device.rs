/// Physical camera units and their capture formats
///
/// Devices come from an enumeration collaborator and are shared as read-only
/// `Arc` handles. The viewfinder compares them by id and passes them back to
/// the capture and format collaborators untouched.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::optics;

/// Shared, read-only handle to a physical camera unit
pub type DeviceHandle = Arc<PhysicalDevice>;

/// Stable identifier of a physical camera unit
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which way the camera points
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Back,
    Front,
}

/// Physical device type filter used during enumeration
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    /// The standard wide-angle unit
    Wide,
    /// The ultra-wide unit, when the phone has one
    UltraWide,
}

impl DeviceKind {
    pub fn label(self) -> &'static str {
        match self {
            DeviceKind::Wide => "Wide",
            DeviceKind::UltraWide => "Ultra-wide",
        }
    }
}

/// A capture format offered by a device
///
/// The viewfinder only stores whatever the format collaborator hands back.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CaptureFormat {
    pub photo_width: u32,
    pub photo_height: u32,
    pub video_width: u32,
    pub video_height: u32,
    pub max_fps: f64,
    /// Horizontal field of view in degrees, when the platform reports it
    #[serde(default)]
    pub field_of_view: Option<f64>,
}

impl CaptureFormat {
    /// Photo width / height
    pub fn photo_aspect(&self) -> f64 {
        if self.photo_height == 0 {
            return 0.0;
        }
        self.photo_width as f64 / self.photo_height as f64
    }

    pub fn photo_pixels(&self) -> u64 {
        self.photo_width as u64 * self.photo_height as u64
    }
}

/// One of the phone's real camera units
#[derive(Debug, PartialEq)]
pub struct PhysicalDevice {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub facing: Facing,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    /// Zoom level at which no digital scaling is applied
    pub neutral_zoom: Option<f64>,
    pub formats: Vec<CaptureFormat>,
}

impl PhysicalDevice {
    /// Clamp a zoom value to this device's bounds
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        optics::clamp_zoom(zoom, self.min_zoom, self.max_zoom)
    }

    /// Neutral zoom (1 if unreported), kept inside the device bounds
    pub fn neutral_zoom(&self) -> f64 {
        self.clamp_zoom(self.neutral_zoom.unwrap_or(1.0))
    }
}

/// The devices the viewfinder can switch between
#[derive(Debug, Clone)]
pub struct DeviceSet {
    pub wide: DeviceHandle,
    pub ultra_wide: Option<DeviceHandle>,
}

impl DeviceSet {
    pub fn has_ultra_wide(&self) -> bool {
        self.ultra_wide.is_some()
    }

    /// Pick the unit for a desired 35mm-equivalent focal length
    ///
    /// Below `ultra_wide_below_mm` the wide unit cannot optically reach the
    /// framing, so the ultra-wide unit is used when the phone has one.
    pub fn select(&self, desired_equivalent_mm: f64, ultra_wide_below_mm: f64) -> &DeviceHandle {
        match &self.ultra_wide {
            Some(ultra_wide) if desired_equivalent_mm < ultra_wide_below_mm => ultra_wide,
            _ => &self.wide,
        }
    }
}
