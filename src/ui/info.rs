/// Info panel lines shown over the preview
use crate::state::viewfinder::ViewfinderState;

pub fn info_lines(state: &ViewfinderState) -> Vec<String> {
    let mut lines = vec![
        format!("FF Equivalent: {:.2} mm", state.desired_equivalent_focal()),
        format!("Zoom: {:.2}x", state.zoom),
        format!("Aspect Ratio: {}", state.aspect),
        format!("Camera: {}", state.active.kind.label()),
        state.status_line(),
    ];
    if let Some(sample) = state.trusted_calibration() {
        lines.push(format!(
            "Measured: {}",
            sample.measured_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        ));
    }
    lines
}
