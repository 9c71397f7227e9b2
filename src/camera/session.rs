/// Session opening: permission check and device discovery
///
/// Produces the [`DeviceSet`] the controller switches between, or the
/// blocking error the host should show.

use tracing::{info, warn};

use super::backend::{DeviceEnumerator, PermissionGate, PermissionStatus};
use super::device::{DeviceKind, DeviceSet, Facing};
use crate::error::ViewfinderError;

pub async fn open_session<P, E>(permissions: &P, enumerator: &E) -> Result<DeviceSet, ViewfinderError>
where
    P: PermissionGate,
    E: DeviceEnumerator,
{
    if !permissions.has_permission() {
        info!("🔐 Requesting camera permission");
        if permissions.request_permission().await == PermissionStatus::Denied {
            warn!("Camera permission not granted");
            return Err(ViewfinderError::PermissionDenied);
        }
    }

    let wide = enumerator
        .find_device(Facing::Back, DeviceKind::Wide)
        .ok_or(ViewfinderError::DeviceUnavailable)?;
    let ultra_wide = enumerator.find_device(Facing::Back, DeviceKind::UltraWide);

    let ultra_wide_id = ultra_wide
        .as_ref()
        .map_or_else(|| "none".to_string(), |device| device.id.to_string());
    info!(wide = %wide.id, ultra_wide = %ultra_wide_id, "📷 Camera session opened");

    Ok(DeviceSet { wide, ultra_wide })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::device::tests::test_device;
    use crate::camera::device::DeviceHandle;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakePermissions {
        granted: bool,
        answer: PermissionStatus,
        asked: AtomicBool,
    }

    impl FakePermissions {
        fn new(granted: bool, answer: PermissionStatus) -> Self {
            Self { granted, answer, asked: AtomicBool::new(false) }
        }
    }

    impl PermissionGate for FakePermissions {
        fn has_permission(&self) -> bool {
            self.granted
        }

        async fn request_permission(&self) -> PermissionStatus {
            self.asked.store(true, Ordering::SeqCst);
            self.answer
        }
    }

    struct FakeDevices(Vec<DeviceHandle>);

    impl DeviceEnumerator for FakeDevices {
        fn find_device(&self, facing: Facing, kind: DeviceKind) -> Option<DeviceHandle> {
            self.0
                .iter()
                .find(|device| device.facing == facing && device.kind == kind)
                .cloned()
        }
    }

    #[tokio::test]
    async fn test_opens_with_both_units() {
        let permissions = FakePermissions::new(true, PermissionStatus::Denied);
        let devices = FakeDevices(vec![
            test_device("wide", DeviceKind::Wide),
            test_device("uw", DeviceKind::UltraWide),
        ]);

        let set = open_session(&permissions, &devices).await.unwrap();
        assert_eq!(set.wide.kind, DeviceKind::Wide);
        assert!(set.has_ultra_wide());
        assert!(!permissions.asked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_requests_missing_permission() {
        let permissions = FakePermissions::new(false, PermissionStatus::Granted);
        let devices = FakeDevices(vec![test_device("wide", DeviceKind::Wide)]);

        let set = open_session(&permissions, &devices).await.unwrap();
        assert!(!set.has_ultra_wide());
        assert!(permissions.asked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let permissions = FakePermissions::new(false, PermissionStatus::Denied);
        let devices = FakeDevices(vec![test_device("wide", DeviceKind::Wide)]);

        let err = open_session(&permissions, &devices).await.unwrap_err();
        assert_eq!(err, ViewfinderError::PermissionDenied);
    }

    #[tokio::test]
    async fn test_missing_wide_unit() {
        let permissions = FakePermissions::new(true, PermissionStatus::Granted);
        let devices = FakeDevices(vec![test_device("uw", DeviceKind::UltraWide)]);

        let err = open_session(&permissions, &devices).await.unwrap_err();
        assert_eq!(err, ViewfinderError::DeviceUnavailable);
    }
}
