/// UI building blocks for the viewfinder host
///
/// - Selection lists for lens, crop factor and aspect ratio (selection.rs)
/// - Info panel text (info.rs)
/// - Digitally zoomed preview frames (preview.rs)

pub mod info;
pub mod preview;
pub mod selection;
