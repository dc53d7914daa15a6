//! Processing-chain template selection
//!
//! A fixed catalogue of eight named stage orderings, each scored
//! against the feature profile and artifact results with fixed point
//! awards. Highest score wins; ties keep the first-declared template
//! so selection is deterministic.

use serde::{Deserialize, Serialize};

use crate::artifacts::DetectionResult;
use crate::features::FeatureProfile;

/// Host-side processing stage identifiers, in canonical chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    HighPassFilter,
    SpectralDenoiser,
    DeEsser,
    EqCorrection,
    DynamicEq,
    Compression,
    MultibandCompression,
    MsProcessing,
    HarmonicExciter,
    StereoWidening,
    Limiting,
    Dithering,
}

impl Stage {
    pub fn id(&self) -> &'static str {
        match self {
            Stage::HighPassFilter => "high-pass-filter",
            Stage::SpectralDenoiser => "spectral-denoiser",
            Stage::DeEsser => "de-esser",
            Stage::EqCorrection => "eq-correction",
            Stage::DynamicEq => "dynamic-eq",
            Stage::Compression => "compression",
            Stage::MultibandCompression => "multiband-compression",
            Stage::MsProcessing => "ms-processing",
            Stage::HarmonicExciter => "harmonic-exciter",
            Stage::StereoWidening => "stereo-widening",
            Stage::Limiting => "limiting",
            Stage::Dithering => "dithering",
        }
    }
}

/// The eight chain templates, in catalogue (tie-break) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainTemplate {
    CleanMix,
    HarshVocals,
    MuddyMix,
    ThinMix,
    NoisyRecording,
    BassHeavy,
    AcousticNatural,
    BroadcastAggressive,
}

impl ChainTemplate {
    pub const ALL: [ChainTemplate; 8] = [
        ChainTemplate::CleanMix,
        ChainTemplate::HarshVocals,
        ChainTemplate::MuddyMix,
        ChainTemplate::ThinMix,
        ChainTemplate::NoisyRecording,
        ChainTemplate::BassHeavy,
        ChainTemplate::AcousticNatural,
        ChainTemplate::BroadcastAggressive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChainTemplate::CleanMix => "clean-mix",
            ChainTemplate::HarshVocals => "harsh-vocals",
            ChainTemplate::MuddyMix => "muddy-mix",
            ChainTemplate::ThinMix => "thin-mix",
            ChainTemplate::NoisyRecording => "noisy-recording",
            ChainTemplate::BassHeavy => "bass-heavy",
            ChainTemplate::AcousticNatural => "acoustic-natural",
            ChainTemplate::BroadcastAggressive => "broadcast-aggressive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChainTemplate::CleanMix => "Well-recorded, balanced mix with no major issues",
            ChainTemplate::HarshVocals => "Vocals with harshness, sibilance, or brittleness",
            ChainTemplate::MuddyMix => "Mix with excessive low-end or frequency masking",
            ChainTemplate::ThinMix => "Mix lacking body, warmth, or low-end",
            ChainTemplate::NoisyRecording => "Recording with noise, hiss, hum, or artifacts",
            ChainTemplate::BassHeavy => "EDM, Hip-Hop, or other bass-heavy genres",
            ChainTemplate::AcousticNatural => "Acoustic, classical, or natural-sounding material",
            ChainTemplate::BroadcastAggressive => "Aggressive processing for broadcast/streaming",
        }
    }

    /// Ordered stage sequence for this template
    pub fn stages(&self) -> &'static [Stage] {
        use Stage::*;
        match self {
            ChainTemplate::CleanMix => &[
                HighPassFilter,
                EqCorrection,
                Compression,
                HarmonicExciter,
                StereoWidening,
                Limiting,
                Dithering,
            ],
            // De-esser before compression so sibilance is not boosted
            ChainTemplate::HarshVocals => &[
                HighPassFilter,
                DeEsser,
                DynamicEq,
                EqCorrection,
                Compression,
                HarmonicExciter,
                Limiting,
                Dithering,
            ],
            // Cut mud before compression to prevent pumping
            ChainTemplate::MuddyMix => &[
                HighPassFilter,
                EqCorrection,
                DynamicEq,
                MultibandCompression,
                HarmonicExciter,
                Limiting,
                Dithering,
            ],
            // Boost low end and add harmonics early
            ChainTemplate::ThinMix => &[
                EqCorrection,
                HarmonicExciter,
                Compression,
                MultibandCompression,
                StereoWidening,
                Limiting,
                Dithering,
            ],
            // Denoise before anything else touches the signal
            ChainTemplate::NoisyRecording => &[
                SpectralDenoiser,
                HighPassFilter,
                DynamicEq,
                EqCorrection,
                Compression,
                HarmonicExciter,
                Limiting,
                Dithering,
            ],
            // Control bass early, tighten low end in M/S
            ChainTemplate::BassHeavy => &[
                HighPassFilter,
                MultibandCompression,
                EqCorrection,
                MsProcessing,
                Compression,
                HarmonicExciter,
                Limiting,
                Dithering,
            ],
            ChainTemplate::AcousticNatural => &[
                HighPassFilter,
                EqCorrection,
                DynamicEq,
                Compression,
                StereoWidening,
                Limiting,
                Dithering,
            ],
            ChainTemplate::BroadcastAggressive => &[
                HighPassFilter,
                SpectralDenoiser,
                DeEsser,
                MultibandCompression,
                DynamicEq,
                EqCorrection,
                Compression,
                HarmonicExciter,
                Limiting,
                Dithering,
            ],
        }
    }

    /// Fixed per-template point awards over the profile and artifact
    /// results.
    pub fn score(&self, profile: &FeatureProfile, detection: &DetectionResult) -> f32 {
        let mut score = 0.0f32;
        match self {
            ChainTemplate::CleanMix => {
                score = detection.quality_score as f32;
                if !detection.scores.clipping.detected && !profile.is_muddy() && !profile.is_harsh()
                {
                    score += 20.0;
                }
            }
            ChainTemplate::HarshVocals => {
                if profile.is_harsh() {
                    score += 40.0;
                }
                if profile.high_energy_ratio > 0.3 {
                    score += 30.0;
                }
                if profile.spectral_tilt_db_oct > 1.0 {
                    score += 20.0;
                }
            }
            ChainTemplate::MuddyMix => {
                if profile.is_muddy() {
                    score += 50.0;
                }
                if profile.low_energy_ratio > 0.35 {
                    score += 30.0;
                }
                if profile.spectral_centroid_hz < 1500.0 && profile.spectral_centroid_hz > 0.0 {
                    score += 20.0;
                }
            }
            ChainTemplate::ThinMix => {
                if profile.is_thin() {
                    score += 50.0;
                }
                if profile.low_energy_ratio < 0.2 && profile.mid_energy_ratio > 0.0 {
                    score += 40.0;
                }
            }
            ChainTemplate::NoisyRecording => {
                if profile.noise_floor_db > -60.0 {
                    score += 50.0;
                }
                if profile.snr_db < 40.0 && profile.snr_db > 0.0 {
                    score += 30.0;
                }
                if profile.noise_floor_db > -50.0 {
                    score += 20.0;
                }
            }
            ChainTemplate::BassHeavy => {
                if profile.low_energy_ratio > 0.4 {
                    score += 40.0;
                }
                if profile.is_percussive() {
                    score += 30.0;
                }
            }
            ChainTemplate::AcousticNatural => {
                if profile.crest_factor > 8.0 {
                    score += 30.0;
                }
                if !profile.is_percussive() {
                    score += 20.0;
                }
                if profile.stereo_correlation > 0.7 {
                    score += 20.0;
                }
            }
            ChainTemplate::BroadcastAggressive => {
                if profile.is_over_compressed() {
                    score += 20.0;
                }
                if profile.dynamic_range_db < 10.0 && profile.dynamic_range_db > 0.0 {
                    score += 20.0;
                }
            }
        }
        score
    }

    /// Static reasoning strings, keyed by template
    pub fn reasoning(&self) -> &'static [&'static str] {
        match self {
            ChainTemplate::CleanMix => &[
                "No major spectral imbalances detected",
                "Good signal-to-noise ratio",
                "Appropriate dynamic range",
                "Using standard mastering chain order",
            ],
            ChainTemplate::HarshVocals => &[
                "Detected excessive high-frequency energy",
                "De-esser placed before compression to prevent sibilance boost",
                "Dynamic EQ will tame harsh frequencies adaptively",
                "EQ correction after de-essing for surgical fixes",
            ],
            ChainTemplate::MuddyMix => &[
                "Detected excessive low-end energy",
                "High-pass filter removes sub-sonic rumble first",
                "EQ cuts mud before compression to prevent pumping",
                "Multiband compression for frequency-specific control",
            ],
            ChainTemplate::ThinMix => &[
                "Low-end energy below optimal level",
                "EQ boost applied early to add body",
                "Harmonic exciter adds warmth and harmonics",
                "Compression adds density and sustain",
            ],
            ChainTemplate::NoisyRecording => &[
                "Significant noise floor detected",
                "Spectral denoiser placed first to remove noise",
                "Processing applied after noise removal for cleaner result",
                "Dynamic EQ prevents noise modulation",
            ],
            ChainTemplate::BassHeavy => &[
                "High low-frequency content detected",
                "Multiband compression controls bass early",
                "M/S processing tightens low-end in mono",
                "Prevents bass from overwhelming other frequencies",
            ],
            ChainTemplate::AcousticNatural => &[
                "High dynamic range preserved",
                "Gentle processing maintains natural sound",
                "Dynamic EQ for transparent control",
                "Minimal compression to preserve dynamics",
            ],
            ChainTemplate::BroadcastAggressive => &[
                "Multiple stages of control for broadcast loudness",
                "Heavy multiband compression for consistent level",
                "De-esser prevents sibilance overload",
                "Aggressive limiting for maximum loudness",
            ],
        }
    }
}

/// Selection result handed back to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSelection {
    pub template: ChainTemplate,
    pub name: String,
    pub description: String,
    pub stages: Vec<Stage>,
    pub score: f32,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ChainOptimizer;

impl ChainOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Score every template and return the winner. Strict comparison
    /// keeps the first-declared template on ties.
    pub fn optimize(
        &self,
        profile: &FeatureProfile,
        detection: &DetectionResult,
    ) -> ChainSelection {
        let mut best = ChainTemplate::ALL[0];
        let mut best_score = f32::NEG_INFINITY;

        for template in ChainTemplate::ALL {
            let score = template.score(profile, detection);
            log::debug!("chain template {}: {:.0} points", template.name(), score);
            if score > best_score {
                best_score = score;
                best = template;
            }
        }

        ChainSelection {
            template: best,
            name: best.name().to_string(),
            description: best.description().to_string(),
            stages: best.stages().to_vec(),
            score: best_score,
            reasoning: best.reasoning().iter().map(|s| s.to_string()).collect(),
        }
    }
}
