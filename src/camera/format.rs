/// Default capture format selection
///
/// Prefers formats whose photo aspect ratio matches the chosen frame, then the
/// largest photo resolution, then the widest video stream. Falls back to the
/// device's first format when nothing matches.

use super::backend::FormatSelector;
use super::device::{CaptureFormat, PhysicalDevice};
use crate::state::catalog::AspectRatioChoice;

/// How far a format's photo aspect ratio may be from the target
const ASPECT_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct PreferredFormat;

impl FormatSelector for PreferredFormat {
    fn select_format(&self, device: &PhysicalDevice, aspect: AspectRatioChoice) -> Option<CaptureFormat> {
        let target = aspect.ratio();

        let best = device
            .formats
            .iter()
            .filter(|format| (format.photo_aspect() - target).abs() < ASPECT_TOLERANCE)
            .max_by_key(|format| (format.photo_pixels(), format.video_width));

        match best {
            Some(format) => Some(*format),
            None => {
                tracing::debug!(
                    device = %device.id,
                    aspect = %aspect,
                    "no format matches aspect ratio, using first format"
                );
                device.formats.first().copied()
            }
        }
    }
}
