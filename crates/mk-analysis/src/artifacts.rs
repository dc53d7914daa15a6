//! Artifact and distortion detection
//!
//! Ten independent checks over the buffer and its feature profile:
//! clipping, DC offset, phase cancellation, over-compression, limiting
//! artifacts, aliasing, intermodulation, lossy-source pre-echo,
//! sub-bass mono compatibility, and intersample peaks. Each check is a
//! pure function; `detect` fans them out over rayon and merges issues
//! in declaration order so output is stable across scheduling.

use serde::{Deserialize, Serialize};

use mk_core::{AudioSignal, DB_EPSILON, db_to_linear, linear_to_db};
use mk_dsp::{Biquad, BiquadCoeffs};

use crate::error::AnalysisResult;
use crate::features::FeatureProfile;
use crate::spectrum::SpectrumAnalyzer;

/// Window RMS below this linear level is treated as silence and
/// excluded from windowed statistics.
const SILENCE_RMS: f32 = 1e-6;

/// Detection thresholds. Defaults mirror tuned production values;
/// every field is overridable per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Sample magnitude that counts as clipped
    pub clip_threshold: f32,
    /// Clipped percentage (0-100) above which clipping is flagged
    pub clip_percent: f32,
    /// Per-channel mean magnitude above which DC offset is flagged
    pub dc_offset: f32,
    /// Window correlation below this counts as a phase problem
    pub phase_correlation: f32,
    /// Window-to-window RMS delta (dB) that counts as pumping
    pub pumping_db: f32,
    /// Magnitude above which a run of equal samples is a flat-top
    pub flat_top_amplitude: f32,
    /// Energy above 70% of Nyquist, relative to total (dB)
    pub aliasing_db: f32,
    /// Intermodulation product level relative to strongest peak (dB)
    pub imd_db: f32,
    /// Pre-transient energy above this (dBFS) counts as pre-echo
    pub pre_echo_db: f32,
    /// Sub-bass correlation below this is flagged
    pub sub_bass_correlation: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            clip_threshold: 0.999,
            clip_percent: 0.01,
            dc_offset: 0.001,
            phase_correlation: 0.3,
            pumping_db: 3.0,
            flat_top_amplitude: 0.98,
            aliasing_db: -60.0,
            imd_db: -70.0,
            pre_echo_db: -50.0,
            sub_bass_correlation: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Issue kind, one per detector, in detector declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    Clipping,
    DcOffset,
    PhaseCancellation,
    OverCompression,
    LimitingArtifacts,
    Aliasing,
    Intermodulation,
    PreEcho,
    SubBassPhase,
    IntersamplePeaks,
}

impl IssueKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            IssueKind::Clipping => "Digital Clipping",
            IssueKind::DcOffset => "DC Offset",
            IssueKind::PhaseCancellation => "Phase Cancellation",
            IssueKind::OverCompression => "Over-Compression",
            IssueKind::LimitingArtifacts => "Brick-Wall Limiting Artifacts",
            IssueKind::Aliasing => "Aliasing",
            IssueKind::Intermodulation => "Intermodulation Distortion",
            IssueKind::PreEcho => "Lossy Compression Artifacts",
            IssueKind::SubBassPhase => "Sub-Bass Phase Issues",
            IssueKind::IntersamplePeaks => "Intersample Peaks",
        }
    }
}

/// Sample range within one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub channel: usize,
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
    pub suggestion: String,
    pub auto_fixable: bool,
    pub locations: Vec<Region>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClippingReport {
    pub detected: bool,
    pub clipped_samples: usize,
    pub percentage: f32,
    pub regions: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcOffsetReport {
    pub detected: bool,
    pub offsets: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseReport {
    pub detected: bool,
    pub avg_correlation: f32,
    pub problematic_windows: usize,
    pub total_windows: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PumpingReport {
    pub detected: bool,
    pub dynamic_range_db: f32,
    pub pumping_windows: usize,
    pub total_windows: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitingReport {
    pub detected: bool,
    pub flat_top_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasingReport {
    pub detected: bool,
    pub alias_db: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImdReport {
    pub detected: bool,
    pub products: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreEchoReport {
    pub detected: bool,
    pub pre_echo_count: usize,
    pub transient_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubBassReport {
    pub detected: bool,
    pub correlation: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IspReport {
    pub detected: bool,
    pub count: usize,
}

/// Per-detector results, in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorScores {
    pub clipping: ClippingReport,
    pub dc_offset: DcOffsetReport,
    pub phase: PhaseReport,
    pub pumping: PumpingReport,
    pub limiting: LimitingReport,
    pub aliasing: AliasingReport,
    pub intermodulation: ImdReport,
    pub pre_echo: PreEchoReport,
    pub sub_bass: SubBassReport,
    pub intersample_peaks: IspReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub issues: Vec<Issue>,
    pub scores: DetectorScores,
    /// 100 minus fixed penalties per fired detector, floored at 0
    pub quality_score: u8,
}

/// Quality penalty per detector, declaration order
const PENALTIES: [u8; 10] = [20, 5, 10, 15, 10, 5, 10, 5, 10, 10];

pub struct ArtifactDetector {
    sample_rate: u32,
    config: DetectorConfig,
    spectral: SpectrumAnalyzer,
}

type Check = (bool, Vec<Issue>);

impl ArtifactDetector {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_config(sample_rate, DetectorConfig::default())
    }

    pub fn with_config(sample_rate: u32, config: DetectorConfig) -> Self {
        Self {
            sample_rate,
            config,
            spectral: SpectrumAnalyzer::new(sample_rate, 8192),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run all ten checks. The four groups fan out over rayon; issues
    /// are merged in declaration order regardless of completion order.
    pub fn detect(
        &self,
        signal: &AudioSignal,
        profile: &FeatureProfile,
    ) -> AnalysisResult<DetectionResult> {
        signal.validate()?;
        let mono = signal.downmix_mono();
        let spectrum = self.spectral.average_spectrum(&mono);
        let transients = self.find_transients(&mono);

        let (((clipping, dc_offset, phase), (pumping, limiting)), (
            (aliasing, intermodulation, pre_echo),
            (sub_bass, intersample),
        )) = rayon::join(
            || {
                rayon::join(
                    || {
                        (
                            self.detect_clipping(signal),
                            self.detect_dc_offset(signal),
                            self.detect_phase_issues(signal),
                        )
                    },
                    || {
                        (
                            self.detect_over_compression(&mono, profile),
                            self.detect_limiting_artifacts(&mono),
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || {
                        (
                            self.detect_aliasing(&spectrum),
                            self.detect_intermodulation(&spectrum),
                            self.detect_pre_echo(&mono, &transients),
                        )
                    },
                    || {
                        (
                            self.detect_sub_bass_phase(signal),
                            self.detect_intersample_peaks(signal),
                        )
                    },
                )
            },
        );

        let checks: [&Check; 10] = [
            &clipping.1,
            &dc_offset.1,
            &phase.1,
            &pumping.1,
            &limiting.1,
            &aliasing.1,
            &intermodulation.1,
            &pre_echo.1,
            &sub_bass.1,
            &intersample.1,
        ];

        let mut issues = Vec::new();
        let mut score = 100i32;
        for (check, &penalty) in checks.iter().zip(PENALTIES.iter()) {
            if check.0 {
                score -= penalty as i32;
            }
            issues.extend(check.1.iter().cloned());
        }

        log::debug!(
            "artifact detection: {} issues, quality {}",
            issues.len(),
            score.max(0)
        );

        Ok(DetectionResult {
            issues,
            scores: DetectorScores {
                clipping: clipping.0,
                dc_offset: dc_offset.0,
                phase: phase.0,
                pumping: pumping.0,
                limiting: limiting.0,
                aliasing: aliasing.0,
                intermodulation: intermodulation.0,
                pre_echo: pre_echo.0,
                sub_bass: sub_bass.0,
                intersample_peaks: intersample.0,
            },
            quality_score: score.max(0) as u8,
        })
    }

    /// A detector that cannot run on the given buffer reports an Info
    /// issue instead of silently passing. It never counts against the
    /// quality score.
    fn skipped(kind: IssueKind, needed_ms: f32) -> Vec<Issue> {
        log::warn!("{} check skipped: buffer too short", kind.display_name());
        vec![Issue {
            kind,
            severity: Severity::Info,
            description: format!(
                "{} check skipped: buffer shorter than the {needed_ms:.0} ms analysis window",
                kind.display_name()
            ),
            suggestion: "Provide a longer buffer to run this check.".to_string(),
            auto_fixable: false,
            locations: Vec::new(),
        }]
    }

    fn detect_clipping(&self, signal: &AudioSignal) -> (ClippingReport, Check) {
        let mut clipped_samples = 0usize;
        let mut total_samples = 0usize;
        let mut regions: Vec<Region> = Vec::new();

        for (ch, data) in signal.channels().iter().enumerate() {
            total_samples += data.len();
            let mut run_start = 0usize;
            let mut run_len = 0usize;
            for (i, &s) in data.iter().enumerate() {
                if s.abs() >= self.config.clip_threshold {
                    if run_len == 0 {
                        run_start = i;
                    }
                    run_len += 1;
                    clipped_samples += 1;
                } else {
                    if run_len >= 10 {
                        regions.push(Region {
                            channel: ch,
                            start: run_start,
                            len: run_len,
                        });
                    }
                    run_len = 0;
                }
            }
            if run_len >= 10 {
                regions.push(Region {
                    channel: ch,
                    start: run_start,
                    len: run_len,
                });
            }
        }

        let percentage = if total_samples > 0 {
            clipped_samples as f32 / total_samples as f32 * 100.0
        } else {
            0.0
        };
        let detected = percentage > self.config.clip_percent;

        let report = ClippingReport {
            detected,
            clipped_samples,
            percentage,
            regions: regions.len(),
        };

        let issues = if detected {
            regions.truncate(10);
            vec![Issue {
                kind: IssueKind::Clipping,
                severity: if percentage > 1.0 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                description: format!(
                    "{clipped_samples} samples clipped ({percentage:.2}%)"
                ),
                suggestion: "Reduce input gain before mastering. Use soft-clipping or repair tools."
                    .to_string(),
                auto_fixable: true,
                locations: regions,
            }]
        } else {
            Vec::new()
        };

        (report, (detected, issues))
    }

    fn detect_dc_offset(&self, signal: &AudioSignal) -> (DcOffsetReport, Check) {
        let mut offsets = Vec::with_capacity(signal.num_channels());
        let mut issues = Vec::new();

        for (ch, data) in signal.channels().iter().enumerate() {
            let offset = if data.is_empty() {
                0.0
            } else {
                data.iter().sum::<f32>() / data.len() as f32
            };
            offsets.push(offset);

            if offset.abs() > self.config.dc_offset {
                issues.push(Issue {
                    kind: IssueKind::DcOffset,
                    severity: Severity::Warning,
                    description: format!(
                        "Channel {} has DC offset of {:.3}%",
                        ch + 1,
                        offset * 100.0
                    ),
                    suggestion: "Apply DC offset removal filter before processing.".to_string(),
                    auto_fixable: true,
                    locations: Vec::new(),
                });
            }
        }

        let detected = !issues.is_empty();
        (DcOffsetReport { detected, offsets }, (detected, issues))
    }

    /// Sliding 100 ms windows with 50% overlap. Windows with no energy
    /// in either channel are skipped so silence stays clean.
    fn detect_phase_issues(&self, signal: &AudioSignal) -> (PhaseReport, Check) {
        if signal.num_channels() < 2 {
            return (
                PhaseReport {
                    detected: false,
                    avg_correlation: 1.0,
                    ..Default::default()
                },
                (false, Vec::new()),
            );
        }
        let (left, right) = match signal.stereo_pair() {
            Some(pair) => pair,
            None => return (PhaseReport::default(), (false, Vec::new())),
        };

        let window = (self.sample_rate as f32 * 0.1) as usize;
        if window == 0 || left.len() < window {
            return (
                PhaseReport::default(),
                (false, Self::skipped(IssueKind::PhaseCancellation, 100.0)),
            );
        }

        let mut correlations = Vec::new();
        let mut problematic = 0usize;
        let mut i = 0usize;
        while i + window <= left.len() {
            let mut corr = 0.0f32;
            let mut lp = 0.0f32;
            let mut rp = 0.0f32;
            for j in 0..window {
                corr += left[i + j] * right[i + j];
                lp += left[i + j] * left[i + j];
                rp += right[i + j] * right[i + j];
            }
            if lp + rp > SILENCE_RMS {
                let c = corr / (lp * rp + DB_EPSILON).sqrt();
                if c < self.config.phase_correlation {
                    problematic += 1;
                }
                correlations.push(c);
            }
            i += window / 2;
        }

        let total = correlations.len();
        let avg = if total > 0 {
            correlations.iter().sum::<f32>() / total as f32
        } else {
            1.0
        };
        let detected = total > 0 && problematic as f32 > total as f32 * 0.1;

        let report = PhaseReport {
            detected,
            avg_correlation: avg,
            problematic_windows: problematic,
            total_windows: total,
        };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::PhaseCancellation,
                severity: Severity::Warning,
                description: format!("Poor stereo correlation detected (avg: {avg:.2})"),
                suggestion:
                    "Check for out-of-phase signals. Consider M/S processing or phase correction."
                        .to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    /// Pumping shows up as large window-to-window RMS swings, crushing
    /// as a collapsed windowed range. Silent windows are excluded.
    fn detect_over_compression(
        &self,
        mono: &[f32],
        profile: &FeatureProfile,
    ) -> (PumpingReport, Check) {
        let window = (self.sample_rate as f32 * 0.05) as usize;
        if window == 0 || mono.len() < window {
            return (
                PumpingReport::default(),
                (false, Self::skipped(IssueKind::OverCompression, 50.0)),
            );
        }

        let rms_db: Vec<f32> = mono
            .chunks_exact(window)
            .filter_map(|chunk| {
                let rms = mk_core::rms(chunk);
                (rms > SILENCE_RMS).then(|| linear_to_db(rms))
            })
            .collect();

        if rms_db.len() < 2 {
            return (PumpingReport::default(), (false, Vec::new()));
        }

        let pumping = rms_db
            .windows(2)
            .filter(|pair| (pair[1] - pair[0]).abs() > self.config.pumping_db)
            .count();

        let max = rms_db.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min = rms_db.iter().cloned().fold(f32::INFINITY, f32::min);
        let range = max - min;

        let detected = pumping as f32 > rms_db.len() as f32 * 0.2 || range < 3.0;

        let report = PumpingReport {
            detected,
            dynamic_range_db: range,
            pumping_windows: pumping,
            total_windows: rms_db.len(),
        };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::OverCompression,
                severity: Severity::Warning,
                description: format!(
                    "Excessive compression detected (windowed range {:.1} dB, crest {:.2})",
                    range, profile.crest_factor
                ),
                suggestion: "Reduce compression ratio or increase attack/release times."
                    .to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    fn detect_limiting_artifacts(&self, mono: &[f32]) -> (LimitingReport, Check) {
        let mut flat_top_count = 0usize;
        let mut consecutive = 0usize;
        let mut last = 0.0f32;

        for &s in mono {
            let abs = s.abs();
            if abs > self.config.flat_top_amplitude && (abs - last.abs()).abs() < 0.001 {
                consecutive += 1;
            } else {
                if consecutive >= 3 {
                    flat_top_count += 1;
                }
                consecutive = 0;
            }
            last = s;
        }
        if consecutive >= 3 {
            flat_top_count += 1;
        }

        let detected = flat_top_count > 100;
        let report = LimitingReport {
            detected,
            flat_top_count,
        };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::LimitingArtifacts,
                severity: Severity::Warning,
                description: format!(
                    "{flat_top_count} flat-top regions detected from aggressive limiting"
                ),
                suggestion: "Reduce limiter gain or increase ceiling. Use look-ahead limiting."
                    .to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    /// Energy above 70% of Nyquist relative to total energy
    fn detect_aliasing(&self, spectrum: &[f32]) -> (AliasingReport, Check) {
        if spectrum.is_empty() {
            return (AliasingReport::default(), (false, Vec::new()));
        }

        let alias_bin = (spectrum.len() as f32 * 0.7) as usize;
        let total: f32 = spectrum.iter().sum();
        let alias: f32 = spectrum[alias_bin.min(spectrum.len())..].iter().sum();

        let ratio = alias / (total + DB_EPSILON);
        let alias_db = linear_to_db(ratio);
        let detected = alias_db > self.config.aliasing_db;

        let report = AliasingReport { detected, alias_db };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::Aliasing,
                severity: Severity::Info,
                description: format!("Aliasing detected ({alias_db:.1} dB)"),
                suggestion:
                    "Enable oversampling in processing plugins. Check sample rate conversion quality."
                        .to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    /// Sum/difference products of the top 20 spectral peaks, measured
    /// relative to the strongest peak.
    fn detect_intermodulation(&self, spectrum: &[f32]) -> (ImdReport, Check) {
        let peaks = self.spectral.find_peaks(spectrum, 20);
        if peaks.is_empty() {
            return (ImdReport::default(), (false, Vec::new()));
        }

        let threshold = db_to_linear(self.config.imd_db) * peaks[0].1;
        let mut products = 0usize;

        for i in 0..peaks.len() {
            for j in (i + 1)..peaks.len() {
                let sum = peaks[i].0 + peaks[j].0;
                let diff = peaks[i].0.abs_diff(peaks[j].0);

                if sum < spectrum.len() && spectrum[sum] > threshold {
                    products += 1;
                }
                if diff < spectrum.len() && spectrum[diff] > threshold {
                    products += 1;
                }
            }
        }

        let detected = products > 5;
        let report = ImdReport { detected, products };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::Intermodulation,
                severity: Severity::Warning,
                description: format!("{products} intermodulation products detected"),
                suggestion: "Reduce saturation/distortion effects. Check for over-processing."
                    .to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    /// Transient onsets: 5 ms windows whose RMS rises >10 dB over the
    /// previous window.
    fn find_transients(&self, mono: &[f32]) -> Vec<usize> {
        let window = (self.sample_rate as f32 * 0.005) as usize;
        if window == 0 || mono.len() < 2 * window {
            return Vec::new();
        }

        let mut transients = Vec::new();
        let mut i = window;
        while i + window <= mono.len() {
            let current = mk_core::rms(&mono[i..i + window]);
            let previous = mk_core::rms(&mono[i - window..i]);
            if linear_to_db(current) - linear_to_db(previous) > 10.0 {
                transients.push(i);
            }
            i += window;
        }
        transients
    }

    /// Lossy codecs smear energy ahead of transients. Measure RMS in
    /// the 10 ms before each onset.
    fn detect_pre_echo(&self, mono: &[f32], transients: &[usize]) -> (PreEchoReport, Check) {
        let transient_window = (self.sample_rate as f32 * 0.005) as usize;
        if transient_window == 0 || mono.len() < 2 * transient_window {
            return (
                PreEchoReport::default(),
                (false, Self::skipped(IssueKind::PreEcho, 10.0)),
            );
        }
        let pre_window = (self.sample_rate as f32 * 0.01) as usize;
        if pre_window == 0 || transients.is_empty() {
            return (
                PreEchoReport {
                    transient_count: transients.len(),
                    ..Default::default()
                },
                (false, Vec::new()),
            );
        }

        let mut pre_echo_count = 0usize;
        for &index in transients {
            let start = index.saturating_sub(pre_window);
            if start == index {
                continue;
            }
            let pre_db = linear_to_db(mk_core::rms(&mono[start..index]));
            if pre_db > self.config.pre_echo_db {
                pre_echo_count += 1;
            }
        }

        let detected = pre_echo_count as f32 > transients.len() as f32 * 0.2;
        let report = PreEchoReport {
            detected,
            pre_echo_count,
            transient_count: transients.len(),
        };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::PreEcho,
                severity: Severity::Info,
                description: format!("Pre-echo detected before {pre_echo_count} transients"),
                suggestion: "Source file may be lossy-compressed. Use lossless source for mastering."
                    .to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    /// Sub-bass below 100 Hz should be near-mono. Low-pass both
    /// channels and correlate.
    fn detect_sub_bass_phase(&self, signal: &AudioSignal) -> (SubBassReport, Check) {
        if signal.num_channels() < 2 {
            return (
                SubBassReport {
                    detected: false,
                    correlation: 1.0,
                },
                (false, Vec::new()),
            );
        }
        let (left, right) = match signal.stereo_pair() {
            Some(pair) => pair,
            None => return (SubBassReport::default(), (false, Vec::new())),
        };

        let coeffs = BiquadCoeffs::lowpass(100.0, 0.707, self.sample_rate as f64);
        let mut filter_l = Biquad::new(coeffs);
        let mut filter_r = Biquad::new(coeffs);

        let mut corr = 0.0f32;
        let mut lp = 0.0f32;
        let mut rp = 0.0f32;
        for (&l, &r) in left.iter().zip(right.iter()) {
            let fl = filter_l.process(l);
            let fr = filter_r.process(r);
            corr += fl * fr;
            lp += fl * fl;
            rp += fr * fr;
        }

        // No sub-bass content is trivially mono-compatible
        let correlation = if lp + rp > SILENCE_RMS {
            corr / (lp * rp + DB_EPSILON).sqrt()
        } else {
            1.0
        };
        let detected = correlation < self.config.sub_bass_correlation;

        let report = SubBassReport {
            detected,
            correlation,
        };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::SubBassPhase,
                severity: Severity::Warning,
                description: format!(
                    "Sub-bass (<100Hz) has poor mono compatibility (corr: {correlation:.2})"
                ),
                suggestion: "Apply M/S processing to make sub-bass mono. Use bass focus plugins."
                    .to_string(),
                auto_fixable: true,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }

    /// 4x linear-interpolation upsample; count interpolated samples
    /// beyond full scale.
    fn detect_intersample_peaks(&self, signal: &AudioSignal) -> (IspReport, Check) {
        const FACTOR: usize = 4;
        let mut count = 0usize;

        for data in signal.channels() {
            for pair in data.windows(2) {
                let step = (pair[1] - pair[0]) / FACTOR as f32;
                for k in 0..FACTOR {
                    if (pair[0] + step * k as f32).abs() > 1.0 {
                        count += 1;
                    }
                }
            }
            if let Some(&last) = data.last()
                && last.abs() > 1.0
            {
                count += 1;
            }
        }

        let detected = count > 0;
        let report = IspReport { detected, count };
        let issues = if detected {
            vec![Issue {
                kind: IssueKind::IntersamplePeaks,
                severity: Severity::Warning,
                description: format!("{count} samples exceed 0dBFS when oversampled"),
                suggestion: "Use true-peak limiting. Reduce ceiling by 1-2dB.".to_string(),
                auto_fixable: false,
                locations: Vec::new(),
            }]
        } else {
            Vec::new()
        };
        (report, (detected, issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;

    fn detect(channels: Vec<Vec<f32>>) -> DetectionResult {
        let signal = AudioSignal::new(&channels, 48000);
        let profile = FeatureExtractor::new(48000).extract(&signal);
        ArtifactDetector::new(48000).detect(&signal, &profile).unwrap()
    }

    fn sine(freq: f32, amp: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn test_silence_is_clean() {
        let result = detect(vec![vec![0.0f32; 96000], vec![0.0f32; 96000]]);
        assert!(result.issues.is_empty(), "issues: {:?}", result.issues);
        assert_eq!(result.quality_score, 100);
    }

    #[test]
    fn test_short_buffer_reports_skipped_checks_as_info() {
        // 1000 samples at 48 kHz is shorter than the 100 ms phase window
        // and the 50 ms pumping window, but long enough for everything else.
        let result = detect(vec![vec![0.0f32; 1000], vec![0.0f32; 1000]]);

        let kinds: Vec<IssueKind> = result.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::PhaseCancellation, IssueKind::OverCompression],
            "issues: {:?}",
            result.issues
        );
        for issue in &result.issues {
            assert_eq!(issue.severity, Severity::Info);
            assert!(!issue.auto_fixable);
        }

        // skipped checks never count as detections or cost quality
        assert!(!result.scores.phase.detected);
        assert!(!result.scores.pumping.detected);
        assert_eq!(result.quality_score, 100);
    }

    #[test]
    fn test_full_scale_clipping_is_critical() {
        let result = detect(vec![vec![1.0f32; 48000]]);
        let issue = result
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::Clipping)
            .expect("clipping issue");
        assert_eq!(issue.severity, Severity::Critical);
        assert!(result.scores.clipping.percentage > 99.0);
        assert!(issue.auto_fixable);
        assert!(!issue.locations.is_empty());
        assert!(issue.locations.len() <= 10);
    }

    #[test]
    fn test_clean_sine_not_clipped() {
        let result = detect(vec![sine(440.0, 0.5, 96000)]);
        assert!(!result.scores.clipping.detected);
        assert_eq!(result.scores.clipping.clipped_samples, 0);
    }

    #[test]
    fn test_dc_offset_flagged_per_channel() {
        let biased: Vec<f32> = sine(440.0, 0.3, 48000).iter().map(|s| s + 0.05).collect();
        let clean = sine(440.0, 0.3, 48000);
        let result = detect(vec![biased, clean]);

        let dc_issues: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::DcOffset)
            .collect();
        assert_eq!(dc_issues.len(), 1);
        assert!(dc_issues[0].description.contains("Channel 1"));
        assert!(result.scores.dc_offset.offsets[0] > 0.04);
    }

    #[test]
    fn test_inverted_channels_trip_phase_and_sub_bass() {
        let left = sine(60.0, 0.5, 96000);
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let result = detect(vec![left, right]);

        assert!(result.scores.phase.detected);
        assert!(result.scores.sub_bass.detected);
        let sub = result
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::SubBassPhase)
            .expect("sub-bass issue");
        assert!(sub.auto_fixable);
    }

    #[test]
    fn test_constant_level_reads_over_compressed() {
        // Constant-amplitude tone has near-zero windowed range
        let result = detect(vec![sine(440.0, 0.5, 96000)]);
        assert!(result.scores.pumping.detected);
        assert!(result.scores.pumping.dynamic_range_db < 3.0);
    }

    #[test]
    fn test_dynamic_material_not_over_compressed() {
        // Amplitude ramp gives the windowed RMS a wide, smooth range
        let audio: Vec<f32> = sine(440.0, 1.0, 96000)
            .iter()
            .enumerate()
            .map(|(i, s)| s * (0.05 + 0.9 * i as f32 / 96000.0))
            .collect();
        let result = detect(vec![audio]);
        assert!(!result.scores.pumping.detected);
    }

    #[test]
    fn test_flat_tops_flagged_as_limiting() {
        // Hard-clip a loud sine below the clipping threshold so only
        // the limiting detector fires on the plateaus
        let audio: Vec<f32> = sine(440.0, 1.2, 96000)
            .iter()
            .map(|s| s.clamp(-0.985, 0.985))
            .collect();
        let result = detect(vec![audio]);
        assert!(result.scores.limiting.detected);
        assert!(result.scores.limiting.flat_top_count > 100);
        assert!(!result.scores.clipping.detected);
    }

    #[test]
    fn test_high_tone_reads_as_aliasing() {
        // Nearly all energy above 70% of Nyquist
        let result = detect(vec![sine(20000.0, 0.5, 96000)]);
        assert!(result.scores.aliasing.detected);
        assert!(result.scores.aliasing.alias_db > -10.0);
    }

    #[test]
    fn test_low_tone_no_aliasing() {
        let result = detect(vec![sine(440.0, 0.5, 96000)]);
        assert!(!result.scores.aliasing.detected);
    }

    #[test]
    fn test_clipping_raises_imd_products() {
        let two_tone: Vec<f32> = sine(1000.0, 0.5, 96000)
            .iter()
            .zip(sine(1300.0, 0.5, 96000).iter())
            .map(|(a, b)| a + b)
            .collect();
        let clipped: Vec<f32> = two_tone.iter().map(|s| s.clamp(-0.4, 0.4)).collect();

        let clean = detect(vec![two_tone]);
        let dirty = detect(vec![clipped]);
        assert!(
            dirty.scores.intermodulation.products > clean.scores.intermodulation.products,
            "clean {} dirty {}",
            clean.scores.intermodulation.products,
            dirty.scores.intermodulation.products
        );
    }

    #[test]
    fn test_pre_echo_before_transients() {
        // Clicks preceded by an audible noise bed read as pre-echo
        let sample_rate = 48000usize;
        let mut audio = vec![0.0f32; sample_rate * 2];
        let burst = sample_rate / 200;
        for beat in 1..8 {
            let start = beat * sample_rate / 4;
            // -34 dBFS bed in the 10 ms before the click
            for s in audio.iter_mut().skip(start - sample_rate / 100).take(sample_rate / 100) {
                *s = 0.02;
            }
            for s in audio.iter_mut().skip(start).take(burst) {
                *s = 0.9;
            }
        }
        let result = detect(vec![audio]);
        assert!(result.scores.pre_echo.transient_count > 0);
        assert!(result.scores.pre_echo.detected);
    }

    #[test]
    fn test_clean_clicks_no_pre_echo() {
        let sample_rate = 48000usize;
        let mut audio = vec![0.0f32; sample_rate * 2];
        for beat in 1..8 {
            let start = beat * sample_rate / 4;
            for s in audio.iter_mut().skip(start).take(sample_rate / 200) {
                *s = 0.9;
            }
        }
        let result = detect(vec![audio]);
        assert!(result.scores.pre_echo.transient_count > 0);
        assert!(!result.scores.pre_echo.detected);
    }

    #[test]
    fn test_intersample_peaks_on_overs() {
        let audio = sine(440.0, 1.05, 48000);
        let result = detect(vec![audio]);
        assert!(result.scores.intersample_peaks.detected);
        assert!(result.scores.intersample_peaks.count > 0);
    }

    #[test]
    fn test_issue_order_matches_declaration_order() {
        // Signal tripping several detectors at once
        let audio: Vec<f32> = (0..96000)
            .map(|i| {
                let s = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin() * 1.5;
                s.clamp(-1.0, 1.0) + 0.01
            })
            .collect();
        let result = detect(vec![audio.clone(), audio]);

        let order: Vec<IssueKind> = result.issues.iter().map(|i| i.kind).collect();
        let mut sorted = order.clone();
        sorted.sort_by_key(|k| *k as usize);
        assert_eq!(order, sorted, "issues must follow declaration order");
    }

    #[test]
    fn test_quality_score_matches_penalties() {
        let result = detect(vec![vec![1.0f32; 48000]]);
        let mut expected = 100i32;
        let fired = [
            result.scores.clipping.detected,
            result.scores.dc_offset.detected,
            result.scores.phase.detected,
            result.scores.pumping.detected,
            result.scores.limiting.detected,
            result.scores.aliasing.detected,
            result.scores.intermodulation.detected,
            result.scores.pre_echo.detected,
            result.scores.sub_bass.detected,
            result.scores.intersample_peaks.detected,
        ];
        for (on, &penalty) in fired.iter().zip(PENALTIES.iter()) {
            if *on {
                expected -= penalty as i32;
            }
        }
        assert_eq!(result.quality_score as i32, expected.max(0));
    }

    #[test]
    fn test_custom_config_thresholds() {
        let config = DetectorConfig {
            clip_threshold: 0.5,
            ..Default::default()
        };
        let channels = vec![sine(440.0, 0.8, 48000)];
        let signal = AudioSignal::new(&channels, 48000);
        let profile = FeatureExtractor::new(48000).extract(&signal);
        let result = ArtifactDetector::with_config(48000, config)
            .detect(&signal, &profile)
            .unwrap();
        assert!(result.scores.clipping.detected);
    }
}
