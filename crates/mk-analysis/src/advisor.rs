//! Analysis orchestrator
//!
//! `MasteringAdvisor` runs the full pipeline over one decoded buffer:
//! feature extraction, then artifact detection and genre
//! classification in parallel, then chain selection. The aggregate
//! `AnalysisReport` is the only object handed back across the host
//! boundary.

use serde::{Deserialize, Serialize};

use mk_core::AudioSignal;
use mk_dsp::DynamicEqPreset;

use crate::artifacts::{ArtifactDetector, DetectionResult, DetectorConfig, Issue};
use crate::chain::{ChainOptimizer, ChainSelection};
use crate::error::AnalysisResult;
use crate::features::{FeatureExtractor, FeatureProfile};
use crate::genre::{Genre, GenreClassifier, GenreMatch};

/// Per-call knobs. Defaults run the full automatic pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Skip classification and use this genre as-is
    pub genre_override: Option<Genre>,
}

/// Aggregate analysis output, serializable for the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub features: FeatureProfile,
    pub issues: Vec<Issue>,
    pub detection: DetectionResult,
    pub quality_score: u8,
    pub chain: ChainSelection,
    pub genre: GenreMatch,
}

impl AnalysisReport {
    /// Quality movement against an earlier report of the same
    /// material, positive when this report is better.
    pub fn quality_delta(&self, prior: &AnalysisReport) -> i16 {
        self.quality_score as i16 - prior.quality_score as i16
    }
}

pub struct MasteringAdvisor {
    sample_rate: u32,
    extractor: FeatureExtractor,
    detector: ArtifactDetector,
    optimizer: ChainOptimizer,
    classifier: GenreClassifier,
}

impl MasteringAdvisor {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_config(sample_rate, DetectorConfig::default())
    }

    pub fn with_config(sample_rate: u32, config: DetectorConfig) -> Self {
        Self {
            sample_rate,
            extractor: FeatureExtractor::new(sample_rate),
            detector: ArtifactDetector::with_config(sample_rate, config),
            optimizer: ChainOptimizer::new(),
            classifier: GenreClassifier::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn analyze(&self, signal: &AudioSignal) -> AnalysisResult<AnalysisReport> {
        self.analyze_with(signal, &AnalyzeOptions::default())
    }

    /// Full pipeline. Detection and classification are independent
    /// consumers of the profile and run as a fork-join pair.
    pub fn analyze_with(
        &self,
        signal: &AudioSignal,
        options: &AnalyzeOptions,
    ) -> AnalysisResult<AnalysisReport> {
        signal.validate()?;

        let features = self.extractor.extract(signal);
        log::debug!(
            "extracted features: centroid {:.0} Hz, crest {:.2}, rms {:.1} dB",
            features.spectral_centroid_hz,
            features.crest_factor,
            features.rms_db
        );

        let (detection, genre) = rayon::join(
            || self.detector.detect(signal, &features),
            || match options.genre_override {
                Some(genre) => self.classifier.with_override(genre, &features),
                None => self.classifier.classify(&features),
            },
        );
        let detection = detection?;

        let chain = self.optimizer.optimize(&features, &detection);
        log::info!(
            "analysis complete: quality {}, chain {}, genre {}",
            detection.quality_score,
            chain.name,
            genre.name
        );

        Ok(AnalysisReport {
            issues: detection.issues.clone(),
            quality_score: detection.quality_score,
            features,
            detection,
            chain,
            genre,
        })
    }

    /// Pick the dynamic EQ starting preset for the material, from the
    /// normalized five-band balance.
    pub fn recommend_dynamic_eq(&self, features: &FeatureProfile) -> DynamicEqPreset {
        if features.harshness > 0.7 {
            return DynamicEqPreset::DeHarsh;
        }
        if features.sibilance > 0.6 {
            return DynamicEqPreset::DeEss;
        }
        if features.low_end_excess > 0.7 {
            return DynamicEqPreset::BoomControl;
        }
        if features.vocal_presence > 0.6 {
            return DynamicEqPreset::VocalPresence;
        }
        DynamicEqPreset::Mastering
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{IssueKind, Severity};
    use mk_core::CoreError;
    use mk_dsp::DynamicEq;

    fn sine(freq: f32, amp: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn test_silence_scores_perfect() {
        let channels = vec![vec![0.0f32; 96000], vec![0.0f32; 96000]];
        let signal = AudioSignal::new(&channels, 48000);
        let report = MasteringAdvisor::new(48000).analyze(&signal).unwrap();
        assert_eq!(report.quality_score, 100);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_clipped_buffer_reports_critical() {
        let channels = vec![vec![1.0f32; 48000]];
        let signal = AudioSignal::new(&channels, 48000);
        let report = MasteringAdvisor::new(48000).analyze(&signal).unwrap();

        let clip = report
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::Clipping)
            .expect("clipping issue");
        assert_eq!(clip.severity, Severity::Critical);
        assert!(report.quality_score < 100);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let advisor = MasteringAdvisor::new(48000);

        let empty: Vec<Vec<f32>> = Vec::new();
        let signal = AudioSignal::new(&empty, 48000);
        assert!(advisor.analyze(&signal).is_err());

        let channels = vec![vec![0.0f32; 16]];
        let signal = AudioSignal::new(&channels, 0);
        let err = advisor.analyze(&signal).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AnalysisError::Input(CoreError::InvalidSampleRate(0))
        ));

        let channels = vec![vec![0.0f32; 16], vec![0.0f32; 8]];
        let signal = AudioSignal::new(&channels, 48000);
        assert!(advisor.analyze(&signal).is_err());
    }

    #[test]
    fn test_repeated_analysis_is_deterministic() {
        let channels = vec![sine(440.0, 0.6, 96000), sine(880.0, 0.4, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let advisor = MasteringAdvisor::new(48000);

        let first = advisor.analyze(&signal).unwrap();
        let second = advisor.analyze(&signal).unwrap();

        assert_eq!(first.features, second.features);
        assert_eq!(first.issues, second.issues);
        assert_eq!(first.quality_score, second.quality_score);
        assert_eq!(first.chain, second.chain);
        assert_eq!(first.genre, second.genre);
    }

    #[test]
    fn test_genre_override_bypasses_classifier() {
        let channels = vec![sine(440.0, 0.5, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let options = AnalyzeOptions {
            genre_override: Some(Genre::Podcast),
        };
        let report = MasteringAdvisor::new(48000)
            .analyze_with(&signal, &options)
            .unwrap();
        assert_eq!(report.genre.genre, Genre::Podcast);
        assert_eq!(report.genre.confidence, 1.0);
    }

    #[test]
    fn test_chain_reselects_identically_from_same_inputs() {
        let channels = vec![sine(220.0, 0.5, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let advisor = MasteringAdvisor::new(48000);
        let report = advisor.analyze(&signal).unwrap();

        let optimizer = ChainOptimizer::new();
        let reselected = optimizer.optimize(&report.features, &report.detection);
        assert_eq!(reselected.template, report.chain.template);
        assert_eq!(reselected.stages, report.chain.stages);
    }

    #[test]
    fn test_report_serde_round_trip() {
        let channels = vec![sine(440.0, 0.5, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let report = MasteringAdvisor::new(48000).analyze(&signal).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.features, report.features);
        assert_eq!(back.quality_score, report.quality_score);
        assert_eq!(back.chain.template, report.chain.template);
        assert_eq!(back.genre.genre, report.genre.genre);
    }

    #[test]
    fn test_quality_delta() {
        let channels = vec![sine(440.0, 0.5, 96000)];
        let clipped = vec![vec![1.0f32; 48000]];
        let advisor = MasteringAdvisor::new(48000);

        let clean_signal = AudioSignal::new(&channels, 48000);
        let clipped_signal = AudioSignal::new(&clipped, 48000);
        let good = advisor.analyze(&clean_signal).unwrap();
        let bad = advisor.analyze(&clipped_signal).unwrap();

        assert!(good.quality_delta(&bad) > 0);
        assert_eq!(good.quality_delta(&bad), -(bad.quality_delta(&good)));
    }

    #[test]
    fn test_harsh_material_gets_de_harsh_preset() {
        // 6 kHz tone concentrates energy in the 4-8 kHz band
        let channels = vec![sine(6000.0, 0.5, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let advisor = MasteringAdvisor::new(48000);
        let features = advisor.analyze(&signal).unwrap().features;
        assert_eq!(
            advisor.recommend_dynamic_eq(&features),
            DynamicEqPreset::DeHarsh
        );
    }

    #[test]
    fn test_balanced_material_gets_mastering_preset() {
        let channels = vec![vec![0.0f32; 96000]];
        let signal = AudioSignal::new(&channels, 48000);
        let advisor = MasteringAdvisor::new(48000);
        let features = advisor.analyze(&signal).unwrap().features;
        assert_eq!(
            advisor.recommend_dynamic_eq(&features),
            DynamicEqPreset::Mastering
        );
    }

    #[test]
    fn test_recommended_preset_builds_processor() {
        let channels = vec![sine(6000.0, 0.5, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let advisor = MasteringAdvisor::new(48000);
        let features = advisor.analyze(&signal).unwrap().features;

        let preset = advisor.recommend_dynamic_eq(&features);
        let eq = DynamicEq::from_preset(preset, 48000);
        assert!(eq.bands().iter().any(|b| b.config().enabled));
    }
}
