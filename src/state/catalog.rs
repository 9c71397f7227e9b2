/// Static catalogs the user picks from: target camera bodies, lenses and
/// aspect ratios.

use serde::{Deserialize, Serialize};

/// A camera body being simulated, identified by its crop factor
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraProfile {
    /// Display name (e.g., "Canon APS-C (1.6×)")
    pub label: String,
    /// Full-frame diagonal divided by this body's sensor diagonal
    pub crop_factor: f64,
}

impl CameraProfile {
    pub fn new(label: impl Into<String>, crop_factor: f64) -> Self {
        Self {
            label: label.into(),
            crop_factor,
        }
    }

    /// Built-in bodies
    pub fn builtin() -> Vec<CameraProfile> {
        vec![
            CameraProfile::new("Full Frame (1.0×)", 1.0),
            CameraProfile::new("Canon APS-C (1.6×)", 1.6),
            CameraProfile::new("Sony/Nikon APS-C (1.5×)", 1.5),
            CameraProfile::new("Micro Four Thirds (2.0×)", 2.0),
        ]
    }

    /// Find the catalog entry for a crop factor, or make an unnamed one
    pub fn for_crop_factor(catalog: &[CameraProfile], crop_factor: f64) -> CameraProfile {
        catalog
            .iter()
            .find(|profile| (profile.crop_factor - crop_factor).abs() < 1e-6)
            .cloned()
            .unwrap_or_else(|| CameraProfile::new(format!("Custom ({crop_factor:.1}×)"), crop_factor))
    }
}

/// A simulated full-frame lens focal length in millimeters
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct LensChoice(pub f64);

/// Lenses offered when the phone has an ultra-wide unit
const LENSES_WITH_ULTRA_WIDE: [f64; 8] = [16.0, 24.0, 35.0, 50.0, 70.0, 85.0, 100.0, 135.0];

/// Lenses reachable by the wide unit alone
const LENSES_WIDE_ONLY: [f64; 6] = [35.0, 50.0, 70.0, 85.0, 100.0, 135.0];

impl LensChoice {
    pub fn mm(self) -> f64 {
        self.0
    }

    /// Lens catalog for the available hardware
    pub fn available(has_ultra_wide: bool) -> Vec<LensChoice> {
        let lenses: &[f64] = if has_ultra_wide {
            &LENSES_WITH_ULTRA_WIDE
        } else {
            &LENSES_WIDE_ONLY
        };
        lenses.iter().copied().map(LensChoice).collect()
    }

    pub fn label(self) -> String {
        format!("{} mm", self.0)
    }
}

impl Default for LensChoice {
    fn default() -> Self {
        LensChoice(24.0)
    }
}

/// Frame aspect ratio of the preview and capture format
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatioChoice {
    #[default]
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatioChoice {
    pub const ALL: [AspectRatioChoice; 3] = [
        AspectRatioChoice::FourThree,
        AspectRatioChoice::SixteenNine,
        AspectRatioChoice::Square,
    ];

    /// Width divided by height
    pub fn ratio(self) -> f64 {
        match self {
            AspectRatioChoice::FourThree => 4.0 / 3.0,
            AspectRatioChoice::SixteenNine => 16.0 / 9.0,
            AspectRatioChoice::Square => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatioChoice::FourThree => "4:3",
            AspectRatioChoice::SixteenNine => "16:9",
            AspectRatioChoice::Square => "1:1",
        }
    }
}

impl std::fmt::Display for AspectRatioChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
