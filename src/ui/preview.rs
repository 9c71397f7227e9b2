/// Digital zoom preview
///
/// Renders what the viewfinder would show: the active device's photo, cropped
/// around the center by the zoom factor, then cropped to the frame's aspect
/// ratio.

use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tokio::task;

use crate::state::catalog::AspectRatioChoice;

/// Preview frames wider than this are downscaled
const MAX_PREVIEW_WIDTH: u32 = 1280;

/// RGBA pixels ready for an iced image handle
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Region of the source photo shown in the viewfinder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Center crop for a zoom factor and aspect ratio
///
/// Zoom below 1 shows the full photo; a still can't be zoomed out.
pub fn zoom_crop(width: u32, height: u32, zoom: f64, aspect: AspectRatioChoice) -> CropRect {
    let zoom = if zoom.is_finite() { zoom.max(1.0) } else { 1.0 };
    let ratio = aspect.ratio();

    let zoomed_width = width as f64 / zoom;
    let zoomed_height = height as f64 / zoom;

    let (crop_width, crop_height) = if zoomed_width / zoomed_height > ratio {
        (zoomed_height * ratio, zoomed_height)
    } else {
        (zoomed_width, zoomed_width / ratio)
    };

    let crop_width = (crop_width.round() as u32).clamp(1, width.max(1));
    let crop_height = (crop_height.round() as u32).clamp(1, height.max(1));

    CropRect {
        x: width.saturating_sub(crop_width) / 2,
        y: height.saturating_sub(crop_height) / 2,
        width: crop_width,
        height: crop_height,
    }
}

/// Render a preview frame in the background
pub async fn render_preview(path: PathBuf, zoom: f64, aspect: AspectRatioChoice) -> Result<PreviewFrame, String> {
    // Spawn blocking because decoding and resizing are CPU-intensive
    task::spawn_blocking(move || render_preview_blocking(&path, zoom, aspect))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}

fn render_preview_blocking(path: &Path, zoom: f64, aspect: AspectRatioChoice) -> Result<PreviewFrame, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let crop = zoom_crop(img.width(), img.height(), zoom, aspect);
    let mut frame = img.crop_imm(crop.x, crop.y, crop.width, crop.height);

    if frame.width() > MAX_PREVIEW_WIDTH {
        // Width-constrained, aspect preserved
        frame = frame.resize(MAX_PREVIEW_WIDTH, MAX_PREVIEW_WIDTH * 10, FilterType::Triangle);
    }

    let rgba = frame.to_rgba8();
    tracing::debug!(
        width = rgba.width(),
        height = rgba.height(),
        zoom,
        "🖼️  Rendered preview"
    );

    Ok(PreviewFrame {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
