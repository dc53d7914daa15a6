//! Standard band layout and dynamic EQ preset catalogue
//!
//! Seven bands matching the static EQ layout (Sub through Air), with the
//! Air band running in upward-expansion mode. Presets enable a subset of
//! bands with tuned threshold/ratio/time constants.

use serde::{Deserialize, Serialize};

use crate::dynamic_eq::{BandMode, DynamicBandConfig};

/// One entry in the standard band table
struct BandSpec {
    name: &'static str,
    center_freq: f32,
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    knee_db: f32,
    mode: BandMode,
}

/// Standard 7-band layout. All bands start disabled; presets or
/// analysis-derived corrections enable what they need.
const STANDARD_BANDS: [BandSpec; 7] = [
    BandSpec {
        name: "Sub",
        center_freq: 40.0,
        threshold_db: -20.0,
        ratio: 3.0,
        attack_ms: 10.0,
        release_ms: 100.0,
        knee_db: 6.0,
        mode: BandMode::Compress,
    },
    BandSpec {
        name: "Bass",
        center_freq: 120.0,
        threshold_db: -18.0,
        ratio: 2.5,
        attack_ms: 15.0,
        release_ms: 150.0,
        knee_db: 6.0,
        mode: BandMode::Compress,
    },
    BandSpec {
        name: "Low-Mid",
        center_freq: 350.0,
        threshold_db: -15.0,
        ratio: 3.0,
        attack_ms: 8.0,
        release_ms: 120.0,
        knee_db: 6.0,
        mode: BandMode::Compress,
    },
    BandSpec {
        name: "Mid",
        center_freq: 1000.0,
        threshold_db: -12.0,
        ratio: 2.0,
        attack_ms: 5.0,
        release_ms: 80.0,
        knee_db: 6.0,
        mode: BandMode::Compress,
    },
    // Faster attack and harder knee: harsh content needs precision
    BandSpec {
        name: "High-Mid",
        center_freq: 3500.0,
        threshold_db: -10.0,
        ratio: 4.0,
        attack_ms: 3.0,
        release_ms: 60.0,
        knee_db: 3.0,
        mode: BandMode::Compress,
    },
    BandSpec {
        name: "High",
        center_freq: 8000.0,
        threshold_db: -8.0,
        ratio: 2.5,
        attack_ms: 2.0,
        release_ms: 50.0,
        knee_db: 6.0,
        mode: BandMode::Compress,
    },
    // Upward expansion adds sparkle; very soft knee keeps it gentle
    BandSpec {
        name: "Air",
        center_freq: 14000.0,
        threshold_db: -15.0,
        ratio: 1.5,
        attack_ms: 20.0,
        release_ms: 200.0,
        knee_db: 9.0,
        mode: BandMode::Expand,
    },
];

/// Standard band configurations, all disabled
pub fn standard_bands() -> Vec<DynamicBandConfig> {
    STANDARD_BANDS
        .iter()
        .map(|spec| DynamicBandConfig {
            name: spec.name.to_string(),
            center_freq: spec.center_freq,
            q: 0.7,
            static_gain_db: 0.0,
            threshold_db: spec.threshold_db,
            ratio: spec.ratio,
            attack_ms: spec.attack_ms,
            release_ms: spec.release_ms,
            knee_db: spec.knee_db,
            mode: spec.mode,
            enabled: false,
        })
        .collect()
}

/// Per-band override applied by a preset
struct BandOverride {
    band: usize,
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    mode: Option<BandMode>,
}

/// Named dynamic EQ presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicEqPreset {
    /// Tames harsh frequencies in vocals and instruments
    DeHarsh,
    /// Sibilance control
    DeEss,
    /// Control excessive low-end on bass-heavy material
    BoomControl,
    /// Adaptive presence boost for vocals
    VocalPresence,
    /// Gentle mastering EQ with adaptive control
    Mastering,
    /// Aggressive control for broadcast/streaming
    Broadcast,
}

impl DynamicEqPreset {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            DynamicEqPreset::DeHarsh => "Tames harsh frequencies in vocals and instruments",
            DynamicEqPreset::DeEss => "Professional de-essing (sibilance control)",
            DynamicEqPreset::BoomControl => "Control excessive low-end on bass-heavy material",
            DynamicEqPreset::VocalPresence => "Adaptive presence boost for vocals",
            DynamicEqPreset::Mastering => "Gentle mastering EQ with adaptive control",
            DynamicEqPreset::Broadcast => "Aggressive control for broadcast/streaming",
        }
    }

    fn overrides(&self) -> Vec<BandOverride> {
        match self {
            DynamicEqPreset::DeHarsh => vec![BandOverride {
                band: 4,
                threshold_db: -12.0,
                ratio: 4.0,
                attack_ms: 2.0,
                release_ms: 50.0,
                mode: None,
            }],
            DynamicEqPreset::DeEss => vec![BandOverride {
                band: 5,
                threshold_db: -8.0,
                ratio: 6.0,
                attack_ms: 1.0,
                release_ms: 30.0,
                mode: None,
            }],
            DynamicEqPreset::BoomControl => vec![
                BandOverride {
                    band: 0,
                    threshold_db: -18.0,
                    ratio: 3.0,
                    attack_ms: 10.0,
                    release_ms: 100.0,
                    mode: None,
                },
                BandOverride {
                    band: 1,
                    threshold_db: -15.0,
                    ratio: 2.5,
                    attack_ms: 12.0,
                    release_ms: 120.0,
                    mode: None,
                },
            ],
            DynamicEqPreset::VocalPresence => vec![
                BandOverride {
                    band: 3,
                    threshold_db: -20.0,
                    ratio: 1.5,
                    attack_ms: 5.0,
                    release_ms: 80.0,
                    mode: Some(BandMode::Expand),
                },
                BandOverride {
                    band: 4,
                    threshold_db: -15.0,
                    ratio: 1.8,
                    attack_ms: 3.0,
                    release_ms: 60.0,
                    mode: Some(BandMode::Expand),
                },
            ],
            DynamicEqPreset::Mastering => vec![
                BandOverride {
                    band: 0,
                    threshold_db: -20.0,
                    ratio: 2.0,
                    attack_ms: 15.0,
                    release_ms: 150.0,
                    mode: None,
                },
                BandOverride {
                    band: 2,
                    threshold_db: -15.0,
                    ratio: 2.5,
                    attack_ms: 8.0,
                    release_ms: 100.0,
                    mode: None,
                },
                BandOverride {
                    band: 4,
                    threshold_db: -12.0,
                    ratio: 3.0,
                    attack_ms: 4.0,
                    release_ms: 70.0,
                    mode: None,
                },
                BandOverride {
                    band: 6,
                    threshold_db: -18.0,
                    ratio: 1.5,
                    attack_ms: 20.0,
                    release_ms: 200.0,
                    mode: Some(BandMode::Expand),
                },
            ],
            DynamicEqPreset::Broadcast => vec![
                BandOverride {
                    band: 0,
                    threshold_db: -22.0,
                    ratio: 4.0,
                    attack_ms: 8.0,
                    release_ms: 100.0,
                    mode: None,
                },
                BandOverride {
                    band: 2,
                    threshold_db: -18.0,
                    ratio: 3.5,
                    attack_ms: 6.0,
                    release_ms: 90.0,
                    mode: None,
                },
                BandOverride {
                    band: 4,
                    threshold_db: -10.0,
                    ratio: 5.0,
                    attack_ms: 2.0,
                    release_ms: 50.0,
                    mode: None,
                },
            ],
        }
    }

    /// Full band configurations with this preset applied
    pub fn band_configs(&self) -> Vec<DynamicBandConfig> {
        let mut bands = standard_bands();
        for ov in self.overrides() {
            let band = &mut bands[ov.band];
            band.enabled = true;
            band.threshold_db = ov.threshold_db;
            band.ratio = ov.ratio;
            band.attack_ms = ov.attack_ms;
            band.release_ms = ov.release_ms;
            if let Some(mode) = ov.mode {
                band.mode = mode;
            }
        }
        bands
    }

    /// All presets in catalogue order
    pub fn all() -> &'static [DynamicEqPreset] {
        &[
            DynamicEqPreset::DeHarsh,
            DynamicEqPreset::DeEss,
            DynamicEqPreset::BoomControl,
            DynamicEqPreset::VocalPresence,
            DynamicEqPreset::Mastering,
            DynamicEqPreset::Broadcast,
        ]
    }
}
