/// Camera-selection and zoom controller
///
/// A small state machine over [`ViewfinderState`]. Every transition is a named
/// method called on the UI thread, either for user input (`set_lens`,
/// `set_crop_factor`, `set_aspect_ratio`) or for an async completion
/// (`device_ready`, `finish_calibration`). Methods that may need a calibration
/// photo return a [`CaptureRequest`] for the host to run; the result comes back
/// through [`Controller::finish_calibration`].

use chrono::Utc;
use tracing::{debug, info, warn};

use super::catalog::{AspectRatioChoice, CameraProfile, LensChoice};
use super::settings::Settings;
use super::viewfinder::{CalibrationSample, CalibrationSource, Phase, ViewfinderState};
use crate::camera::backend::FormatSelector;
use crate::camera::device::{CaptureFormat, DeviceHandle, DeviceId, DeviceSet};
use crate::camera::format::PreferredFormat;
use crate::error::{CaptureError, ViewfinderError};
use crate::optics;

/// Equivalent focal length below which the wide unit cannot frame the shot
/// and the ultra-wide unit takes over
pub const ULTRA_WIDE_BELOW_MM: f64 = 28.0;

/// A one-shot calibration photo the host should take
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub ticket: u64,
    pub device: DeviceHandle,
    /// Format active when the photo was requested
    pub format: Option<CaptureFormat>,
}

/// Calibration value read from a photo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReading {
    pub equivalent_focal_mm: f64,
    pub source: CalibrationSource,
}

/// Completion of a [`CaptureRequest`]
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub ticket: u64,
    /// Device the photo was requested for
    pub device: DeviceId,
    pub result: Result<CalibrationReading, CaptureError>,
}

pub struct Controller {
    state: ViewfinderState,
    devices: DeviceSet,
    profiles: Vec<CameraProfile>,
    formats: Box<dyn FormatSelector>,
    /// Ticket of the capture currently in flight
    in_flight: Option<u64>,
    /// Whether the active device's preview can take a photo
    ready: bool,
    next_ticket: u64,
}

impl Controller {
    /// Create a controller in `Idle`, with the standard wide device active
    pub fn new(devices: DeviceSet, settings: &Settings) -> Self {
        let lens = match positive("lens focal length", settings.default_lens_mm) {
            Ok(mm) => LensChoice(mm),
            Err(err) => {
                warn!(%err, "falling back to default lens");
                LensChoice::default()
            }
        };
        let crop_factor = positive("crop factor", settings.default_crop_factor).unwrap_or_else(|err| {
            warn!(%err, "falling back to full frame");
            1.0
        });
        let profiles = if settings.profiles.is_empty() {
            CameraProfile::builtin()
        } else {
            settings.profiles.clone()
        };
        let profile = CameraProfile::for_crop_factor(&profiles, crop_factor);

        let formats: Box<dyn FormatSelector> = Box::new(PreferredFormat);
        let active = devices.wide.clone();
        let format = formats.select_format(&active, settings.default_aspect);

        let state = ViewfinderState {
            lens,
            profile,
            aspect: settings.default_aspect,
            zoom: active.neutral_zoom(),
            active,
            format,
            calibration: None,
            phase: Phase::Idle,
            last_error: None,
        };

        Self {
            state,
            devices,
            profiles,
            formats,
            in_flight: None,
            ready: false,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &ViewfinderState {
        &self.state
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    pub fn profiles(&self) -> &[CameraProfile] {
        &self.profiles
    }

    pub fn capture_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Leave `Idle`: pick the device for the current lens and calibrate it
    pub fn start(&mut self) -> Option<CaptureRequest> {
        info!(
            lens = self.state.lens.mm(),
            crop_factor = self.state.profile.crop_factor,
            "🎬 Starting viewfinder"
        );
        self.reconcile()
    }

    pub fn set_lens(&mut self, lens_mm: f64) -> Result<Option<CaptureRequest>, ViewfinderError> {
        let lens_mm = positive("lens focal length", lens_mm)?;
        representable("lens focal length", lens_mm, lens_mm * self.state.profile.crop_factor)?;
        self.state.lens = LensChoice(lens_mm);
        Ok(self.reconcile())
    }

    pub fn set_crop_factor(&mut self, crop_factor: f64) -> Result<Option<CaptureRequest>, ViewfinderError> {
        let crop_factor = positive("crop factor", crop_factor)?;
        representable("crop factor", crop_factor, self.state.lens.mm() * crop_factor)?;
        self.state.profile = CameraProfile::for_crop_factor(&self.profiles, crop_factor);
        Ok(self.reconcile())
    }

    /// Aspect ratio only changes the capture format; calibration stays valid
    pub fn set_aspect_ratio(&mut self, aspect: AspectRatioChoice) {
        self.state.aspect = aspect;
        self.state.format = self.formats.select_format(&self.state.active, aspect);
        debug!(aspect = %aspect, format = ?self.state.format, "aspect ratio changed");
    }

    /// The host's preview for `device` can now take photos
    pub fn device_ready(&mut self, device: &DeviceId) -> Option<CaptureRequest> {
        if *device != self.state.active.id {
            debug!(%device, "ignoring readiness of inactive device");
            return None;
        }
        self.ready = true;
        self.request_capture()
    }

    /// Manually re-trigger a calibration that failed
    pub fn retry_calibration(&mut self) -> Option<CaptureRequest> {
        if self.state.is_calibrated() {
            return None;
        }
        self.state.phase = Phase::AwaitingCalibration;
        self.request_capture()
    }

    /// Apply the result of a calibration capture
    ///
    /// A result for a device that is no longer active is dropped, and a fresh
    /// capture is requested for the current device instead.
    pub fn finish_calibration(&mut self, outcome: CalibrationOutcome) -> Option<CaptureRequest> {
        if self.in_flight != Some(outcome.ticket) {
            warn!(ticket = outcome.ticket, "ignoring calibration result nobody is waiting for");
            return None;
        }
        self.in_flight = None;

        if outcome.device != self.state.active.id {
            info!(
                stale = %outcome.device,
                active = %self.state.active.id,
                "🗑️  Discarding calibration for a camera that is no longer active"
            );
            return self.request_capture();
        }

        match outcome.result.and_then(validate_reading) {
            Ok(reading) => {
                info!(
                    device = %outcome.device,
                    focal = reading.equivalent_focal_mm,
                    source = ?reading.source,
                    "✅ Calibrated"
                );
                self.state.calibration = Some(CalibrationSample {
                    device: outcome.device,
                    equivalent_focal_mm: reading.equivalent_focal_mm,
                    source: reading.source,
                    measured_at: Utc::now(),
                });
                self.state.last_error = None;
                self.apply_zoom(reading.equivalent_focal_mm);
            }
            Err(err) => {
                warn!(device = %outcome.device, %err, "⚠️  Calibration failed, staying at neutral zoom");
                self.state.phase = Phase::AwaitingCalibration;
                self.state.zoom = self.state.active.neutral_zoom();
                self.state.last_error = Some(err.into());
            }
        }
        None
    }

    /// Bring device, calibration and zoom in line with lens and crop factor
    fn reconcile(&mut self) -> Option<CaptureRequest> {
        let desired = self.state.desired_equivalent_focal();
        let target = self.devices.select(desired, ULTRA_WIDE_BELOW_MM).clone();

        if target.id != self.state.active.id {
            self.switch_device(target);
            return self.request_capture();
        }

        match self.state.trusted_calibration().map(|sample| sample.equivalent_focal_mm) {
            Some(calibrated) => {
                self.apply_zoom(calibrated);
                None
            }
            None => {
                self.state.phase = Phase::AwaitingCalibration;
                self.request_capture()
            }
        }
    }

    fn switch_device(&mut self, target: DeviceHandle) {
        info!(from = %self.state.active.id, to = %target.id, "📷 Switching camera");

        self.state.format = self.formats.select_format(&target, self.state.aspect);
        self.state.zoom = target.neutral_zoom();
        self.state.active = target;
        self.state.calibration = None;
        self.state.last_error = None;
        self.state.phase = Phase::AwaitingCalibration;
        self.ready = false;
    }

    fn apply_zoom(&mut self, calibrated_mm: f64) {
        let desired = self.state.desired_equivalent_focal();
        match optics::zoom_factor(desired, calibrated_mm) {
            Some(factor) => {
                self.state.zoom = self.state.active.clamp_zoom(factor);
                self.state.phase = Phase::Calibrated;
                debug!(desired, calibrated_mm, zoom = self.state.zoom, "zoom updated");
            }
            None => {
                warn!(desired, calibrated_mm, "calibration cannot produce a zoom factor");
                self.state.zoom = self.state.active.neutral_zoom();
                self.state.phase = Phase::AwaitingCalibration;
            }
        }
    }

    fn request_capture(&mut self) -> Option<CaptureRequest> {
        if self.state.phase != Phase::AwaitingCalibration {
            return None;
        }
        if !self.ready {
            debug!(device = %self.state.active.id, "waiting for preview before calibrating");
            return None;
        }
        if let Some(ticket) = self.in_flight {
            debug!(ticket, "calibration already in flight, ignoring request");
            return None;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        info!(ticket, device = %self.state.active.id, "📸 Requesting calibration photo");
        Some(CaptureRequest {
            ticket,
            device: self.state.active.clone(),
            format: self.state.format,
        })
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight)
            .field("ready", &self.ready)
            .finish()
    }
}

fn positive(what: &'static str, value: f64) -> Result<f64, ViewfinderError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ViewfinderError::InvalidSetting { what, value })
    }
}

/// Reject a setting whose equivalent focal length overflows
fn representable(what: &'static str, value: f64, equivalent_mm: f64) -> Result<(), ViewfinderError> {
    if equivalent_mm.is_finite() {
        Ok(())
    } else {
        Err(ViewfinderError::InvalidSetting { what, value })
    }
}

fn validate_reading(reading: CalibrationReading) -> Result<CalibrationReading, CaptureError> {
    if reading.equivalent_focal_mm.is_finite() && reading.equivalent_focal_mm > 0.0 {
        Ok(reading)
    } else {
        Err(CaptureError::MissingFocalLength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::device::tests::test_device;
    use crate::camera::device::DeviceKind;
    use std::sync::Arc;

    fn settings(lens_mm: f64, crop_factor: f64) -> Settings {
        Settings {
            default_lens_mm: lens_mm,
            default_crop_factor: crop_factor,
            ..Settings::default()
        }
    }

    fn wide_only() -> DeviceSet {
        DeviceSet {
            wide: test_device("wide", DeviceKind::Wide),
            ultra_wide: None,
        }
    }

    fn wide_and_ultra_wide() -> DeviceSet {
        DeviceSet {
            wide: test_device("wide", DeviceKind::Wide),
            ultra_wide: Some(test_device("uw", DeviceKind::UltraWide)),
        }
    }

    fn exif_outcome(request: &CaptureRequest, focal: f64) -> CalibrationOutcome {
        CalibrationOutcome {
            ticket: request.ticket,
            device: request.device.id.clone(),
            result: Ok(CalibrationReading {
                equivalent_focal_mm: focal,
                source: CalibrationSource::Exif,
            }),
        }
    }

    /// Start, report the preview ready and calibrate the active device
    fn calibrated(devices: DeviceSet, lens_mm: f64, crop_factor: f64, focal: f64) -> Controller {
        let mut controller = Controller::new(devices, &settings(lens_mm, crop_factor));
        assert!(controller.start().is_none());
        let active = controller.state().active.id.clone();
        let request = controller.device_ready(&active).expect("capture requested");
        assert!(controller.finish_calibration(exif_outcome(&request, focal)).is_none());
        controller
    }

    #[test]
    fn test_new_controller_is_idle_on_wide() {
        let controller = Controller::new(wide_and_ultra_wide(), &settings(24.0, 1.0));
        let state = controller.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.active.kind, DeviceKind::Wide);
        assert_eq!(state.zoom, 1.0);
        assert!(state.format.is_some());
    }

    #[test]
    fn test_apsc_24mm_uses_wide() {
        // 24 * 1.6 = 38.4 >= 28
        let mut controller = Controller::new(wide_and_ultra_wide(), &settings(24.0, 1.6));
        controller.start();
        assert_eq!(controller.state().active.kind, DeviceKind::Wide);
        assert!((controller.state().desired_equivalent_focal() - 38.4).abs() < 1e-9);
    }

    #[test]
    fn test_16mm_full_frame_uses_ultra_wide_when_available() {
        let mut controller = Controller::new(wide_and_ultra_wide(), &settings(16.0, 1.0));
        controller.start();
        assert_eq!(controller.state().active.kind, DeviceKind::UltraWide);
        assert_eq!(controller.state().phase, Phase::AwaitingCalibration);

        let mut controller = Controller::new(wide_only(), &settings(16.0, 1.0));
        controller.start();
        assert_eq!(controller.state().active.kind, DeviceKind::Wide);
    }

    #[test]
    fn test_capture_waits_for_ready_device() {
        let mut controller = Controller::new(wide_and_ultra_wide(), &settings(16.0, 1.0));
        assert!(controller.start().is_none());

        // Readiness of the old device doesn't count
        assert!(controller.device_ready(&DeviceId::new("wide")).is_none());

        let request = controller.device_ready(&DeviceId::new("uw")).expect("capture requested");
        assert_eq!(request.device.kind, DeviceKind::UltraWide);
        assert!(controller.capture_in_flight());
    }

    #[test]
    fn test_calibration_sets_zoom() {
        let controller = calibrated(wide_only(), 50.0, 1.6, 26.0);
        let state = controller.state();
        assert_eq!(state.phase, Phase::Calibrated);
        assert!((state.zoom - 80.0 / 26.0).abs() < 1e-9);
        assert!(!controller.capture_in_flight());
    }

    #[test]
    fn test_idle_lens_change_without_switch() {
        let mut controller = Controller::new(wide_only(), &settings(24.0, 1.6));
        let wide = controller.state().active.clone();

        let request = controller.set_lens(50.0).unwrap();
        assert!(request.is_none(), "preview not ready yet");
        assert!(Arc::ptr_eq(&controller.state().active, &wide));
        assert_eq!(controller.state().phase, Phase::AwaitingCalibration);
    }

    #[test]
    fn test_lens_change_recomputes_without_recapture() {
        let mut controller = calibrated(wide_only(), 24.0, 1.6, 26.0);

        let request = controller.set_lens(50.0).unwrap();
        assert!(request.is_none());
        assert!(!controller.capture_in_flight());

        let state = controller.state();
        assert_eq!(state.active.kind, DeviceKind::Wide);
        assert_eq!(state.phase, Phase::Calibrated);
        assert!((state.zoom - optics::clamp_zoom(80.0 / 26.0, Some(1.0), Some(16.0))).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamped_to_device_bounds() {
        let mut controller = calibrated(wide_only(), 35.0, 1.0, 13.0);
        controller.set_lens(135.0).unwrap();
        controller.set_crop_factor(2.0).unwrap();
        // 270 / 13 > 16
        assert_eq!(controller.state().zoom, 16.0);

        let mut controller = calibrated(wide_only(), 35.0, 1.0, 26.0);
        controller.set_lens(16.0).unwrap();
        // 16 / 26 < 1, no ultra-wide to switch to
        assert_eq!(controller.state().active.kind, DeviceKind::Wide);
        assert_eq!(controller.state().zoom, 1.0);
    }

    #[test]
    fn test_device_switch_resets_calibration() {
        let mut controller = calibrated(wide_and_ultra_wide(), 50.0, 1.0, 26.0);
        assert!(controller.state().is_calibrated());

        let request = controller.set_lens(16.0).unwrap();
        assert!(request.is_none(), "new device is not ready yet");

        let state = controller.state();
        assert_eq!(state.active.kind, DeviceKind::UltraWide);
        assert_eq!(state.phase, Phase::AwaitingCalibration);
        assert!(state.calibration.is_none());
        assert_eq!(state.zoom, 1.0);
    }

    #[test]
    fn test_crop_factor_change_can_switch_device() {
        let mut controller = calibrated(wide_and_ultra_wide(), 24.0, 1.6, 26.0);
        assert_eq!(controller.state().active.kind, DeviceKind::Wide);

        controller.set_crop_factor(1.0).unwrap();
        assert_eq!(controller.state().active.kind, DeviceKind::UltraWide);
        assert_eq!(controller.state().profile.label, "Full Frame (1.0×)");
    }

    #[test]
    fn test_failed_calibration_stays_pending() {
        let mut controller = Controller::new(wide_only(), &settings(50.0, 1.0));
        controller.start();
        let request = controller.device_ready(&DeviceId::new("wide")).unwrap();

        let next = controller.finish_calibration(CalibrationOutcome {
            ticket: request.ticket,
            device: request.device.id.clone(),
            result: Err(CaptureError::MissingFocalLength),
        });
        assert!(next.is_none());

        let state = controller.state();
        assert_eq!(state.phase, Phase::AwaitingCalibration);
        assert_eq!(state.zoom, 1.0);
        assert!(matches!(state.last_error, Some(ViewfinderError::CalibrationFailed(_))));

        // Next lens change re-triggers the capture
        let retry = controller.set_lens(70.0).unwrap().expect("capture requested");
        let next = controller.finish_calibration(exif_outcome(&retry, 28.0));
        assert!(next.is_none());
        assert!((controller.state().zoom - 2.5).abs() < 1e-9);
        assert!(controller.state().last_error.is_none());
    }

    #[test]
    fn test_manual_retry() {
        let mut controller = Controller::new(wide_only(), &settings(50.0, 1.0));
        controller.start();
        let request = controller.device_ready(&DeviceId::new("wide")).unwrap();
        controller.finish_calibration(CalibrationOutcome {
            ticket: request.ticket,
            device: request.device.id.clone(),
            result: Err(CaptureError::Busy),
        });

        let retry = controller.retry_calibration().expect("capture requested");
        assert_ne!(retry.ticket, request.ticket);
        controller.finish_calibration(exif_outcome(&retry, 25.0));

        assert!(controller.retry_calibration().is_none(), "already calibrated");
    }

    #[test]
    fn test_only_one_capture_in_flight() {
        let mut controller = Controller::new(wide_only(), &settings(50.0, 1.0));
        controller.start();
        let request = controller.device_ready(&DeviceId::new("wide")).unwrap();

        assert!(controller.set_lens(70.0).unwrap().is_none());
        assert!(controller.retry_calibration().is_none());
        assert!(controller.device_ready(&DeviceId::new("wide")).is_none());

        controller.finish_calibration(exif_outcome(&request, 26.0));
        assert!((controller.state().zoom - 70.0 / 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_ticket_is_ignored() {
        let mut controller = calibrated(wide_only(), 50.0, 1.0, 25.0);
        let zoom = controller.state().zoom;

        let bogus = CalibrationOutcome {
            ticket: 99,
            device: DeviceId::new("wide"),
            result: Ok(CalibrationReading {
                equivalent_focal_mm: 5.0,
                source: CalibrationSource::Exif,
            }),
        };
        assert!(controller.finish_calibration(bogus).is_none());
        assert_eq!(controller.state().zoom, zoom);
    }

    #[test]
    fn test_superseded_capture_is_discarded() {
        let devices = wide_and_ultra_wide();
        let mut controller = Controller::new(devices, &settings(50.0, 1.0));

        // A: wide, calibrated
        controller.start();
        let first = controller.device_ready(&DeviceId::new("wide")).unwrap();
        controller.finish_calibration(exif_outcome(&first, 26.0));

        // A -> B: ultra-wide, capture goes out
        controller.set_lens(16.0).unwrap();
        let stale = controller.device_ready(&DeviceId::new("uw")).expect("capture for B");
        assert_eq!(stale.device.kind, DeviceKind::UltraWide);

        // B -> C: back to wide before B's photo resolves
        assert!(controller.set_lens(35.0).unwrap().is_none());
        assert!(controller.device_ready(&DeviceId::new("wide")).is_none(), "B still in flight");
        assert_eq!(controller.state().active.kind, DeviceKind::Wide);
        assert!(controller.state().calibration.is_none());

        // B's result arrives late: dropped, capture reissued for C
        let fresh = controller
            .finish_calibration(exif_outcome(&stale, 13.0))
            .expect("capture for C");
        assert_eq!(fresh.device.kind, DeviceKind::Wide);
        assert!(controller.state().calibration.is_none());
        assert_eq!(controller.state().phase, Phase::AwaitingCalibration);
        assert_eq!(controller.state().zoom, 1.0);

        controller.finish_calibration(exif_outcome(&fresh, 25.0));
        let state = controller.state();
        let sample = state.trusted_calibration().expect("C calibrated");
        assert_eq!(sample.device, DeviceId::new("wide"));
        assert_eq!(sample.equivalent_focal_mm, 25.0);
        assert!((state.zoom - 35.0 / 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut controller = calibrated(wide_only(), 50.0, 1.0, 25.0);
        let zoom = controller.state().zoom;

        assert_eq!(
            controller.set_lens(0.0).unwrap_err(),
            ViewfinderError::InvalidSetting { what: "lens focal length", value: 0.0 }
        );
        assert!(controller.set_crop_factor(-1.5).is_err());
        assert!(controller.set_crop_factor(f64::NAN).is_err());
        assert_eq!(controller.state().zoom, zoom);
        assert_eq!(controller.state().lens, LensChoice(50.0));
    }

    #[test]
    fn test_overflowing_equivalent_focal_rejected() {
        let mut controller = calibrated(wide_only(), 50.0, 1.0, 25.0);

        controller.set_lens(1e308).unwrap();
        assert_eq!(controller.state().zoom, 16.0);

        assert_eq!(
            controller.set_crop_factor(2.0).unwrap_err(),
            ViewfinderError::InvalidSetting { what: "crop factor", value: 2.0 }
        );
        assert_eq!(controller.state().profile.crop_factor, 1.0);
        assert!(controller.set_lens(f64::MAX).is_ok());

        controller.set_crop_factor(1.5).unwrap_err();
        let state = controller.state();
        assert_eq!(state.phase, Phase::Calibrated);
        assert!(state.desired_equivalent_focal().is_finite());
    }

    #[test]
    fn test_aspect_ratio_keeps_calibration() {
        let mut controller = calibrated(wide_only(), 50.0, 1.0, 25.0);
        controller.set_aspect_ratio(AspectRatioChoice::SixteenNine);

        let state = controller.state();
        assert_eq!(state.aspect, AspectRatioChoice::SixteenNine);
        assert!(state.is_calibrated());
        assert_eq!(state.zoom, 2.0);
    }
}
