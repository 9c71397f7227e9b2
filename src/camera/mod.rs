/// Camera collaborators
///
/// This module handles everything between the viewfinder and the camera:
/// - Physical device handles and capture formats (device.rs)
/// - Collaborator traits for enumeration, capture and metadata (backend.rs)
/// - Default capture format selection (format.rs)
/// - Session opening: permission + device discovery (session.rs)
/// - One-shot calibration captures (calibration.rs)
/// - EXIF focal length reading (metadata.rs)
/// - The desktop still-photo rig (still.rs)

pub mod backend;
pub mod calibration;
pub mod device;
pub mod format;
pub mod metadata;
pub mod session;
pub mod still;
