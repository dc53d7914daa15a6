//! Feature extraction
//!
//! Computes one `FeatureProfile` per buffer: spectral energy
//! distribution, centroid/rolloff/tilt, dynamics, transient density and
//! tempo, stereo image, MFCC timbre, noise floor and SNR. Pure function
//! of the input; all numeric edge cases degrade to sentinel values.

use serde::{Deserialize, Serialize};

use mk_core::{AudioSignal, DB_EPSILON, linear_to_db, peak, rms};

use crate::spectrum::{MfccExtractor, SpectrumAnalyzer};

/// Transient detection window (5 ms)
const TRANSIENT_WINDOW_SECS: f32 = 0.005;
/// RMS rise that counts as a transient (dB)
const TRANSIENT_RISE_DB: f32 = 10.0;
/// Ceiling on the side/mid width ratio; anti-phase input pins it here
const MAX_STEREO_WIDTH: f32 = 10.0;

/// Flat record of per-buffer features, shared read-only by every
/// downstream consumer. Produced exactly once per buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProfile {
    /// Energy ratio in 20-250 Hz
    pub low_energy_ratio: f32,
    /// Energy ratio in 250-4000 Hz
    pub mid_energy_ratio: f32,
    /// Energy ratio in 4-20 kHz
    pub high_energy_ratio: f32,
    /// Energy-weighted mean frequency (Hz)
    pub spectral_centroid_hz: f32,
    /// Frequency below which 95% of energy lies (Hz)
    pub spectral_rolloff_hz: f32,
    /// Spectral slope from band regression (dB/octave)
    pub spectral_tilt_db_oct: f32,
    /// Sample peak (dBFS)
    pub peak_db: f32,
    /// Whole-signal RMS (dBFS)
    pub rms_db: f32,
    /// Peak/RMS ratio (linear); 0 for silence
    pub crest_factor: f32,
    /// peak_db - rms_db
    pub dynamic_range_db: f32,
    /// Transients per second
    pub transient_density: f32,
    /// Autocorrelation tempo estimate (BPM); 0 when no pulse found
    pub tempo_bpm: f32,
    /// Inter-channel correlation; 1.0 for mono
    pub stereo_correlation: f32,
    /// Side/mid energy ratio (sqrt); 0.0 for mono
    pub stereo_width: f32,
    /// Mel-cepstral timbre descriptors
    pub mfcc: Vec<f32>,
    /// 10th-percentile magnitude (dBFS)
    pub noise_floor_db: f32,
    /// 95th percentile over 10th percentile (dB)
    pub snr_db: f32,
    /// 4-8 kHz share of the per-bin-normalized 5-way band split
    pub harshness: f32,
    /// 8-20 kHz share of the 5-way band split
    pub sibilance: f32,
    /// 20-250 Hz share of the 5-way band split
    pub low_end_excess: f32,
    /// 1-4 kHz share of the 5-way band split
    pub vocal_presence: f32,
}

impl FeatureProfile {
    /// Excessive low end masking the mids
    pub fn is_muddy(&self) -> bool {
        self.low_energy_ratio > 0.4 && self.mid_energy_ratio < 0.3
    }

    /// Lacking body and low end
    pub fn is_thin(&self) -> bool {
        self.low_energy_ratio < 0.15 && self.mid_energy_ratio > 0.4
    }

    /// Excessive high-frequency energy
    pub fn is_harsh(&self) -> bool {
        self.high_energy_ratio > 0.35
    }

    /// Spectrum slopes upward
    pub fn is_bright(&self) -> bool {
        self.spectral_tilt_db_oct > 1.5
    }

    /// Spectrum slopes downward
    pub fn is_dark(&self) -> bool {
        self.spectral_tilt_db_oct < -1.5
    }

    /// Dense transient activity (drums, percussion)
    pub fn is_percussive(&self) -> bool {
        self.transient_density > 10.0
    }

    /// Crest factor collapsed by heavy compression
    pub fn is_over_compressed(&self) -> bool {
        self.crest_factor > 0.0 && self.crest_factor < 3.0
    }

    /// High-band energy share, a brightness proxy
    pub fn brightness(&self) -> f32 {
        self.high_energy_ratio
    }
}

/// Feature extractor over a fixed sample rate
pub struct FeatureExtractor {
    sample_rate: u32,
    spectral: SpectrumAnalyzer,
    mfcc: MfccExtractor,
}

impl FeatureExtractor {
    /// Create an extractor; the spectral path uses 8192-point frames
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            spectral: SpectrumAnalyzer::new(sample_rate, 8192),
            mfcc: MfccExtractor::new(sample_rate),
        }
    }

    /// Extract the complete feature profile. Never panics on finite input.
    pub fn extract(&self, signal: &AudioSignal) -> FeatureProfile {
        let mono = signal.downmix_mono();

        let spectrum = self.spectral.average_spectrum(&mono);

        // Three-band energy split
        let low = self.spectral.band_energy(&spectrum, 20.0, 250.0);
        let mid = self.spectral.band_energy(&spectrum, 250.0, 4000.0);
        let high = self.spectral.band_energy(&spectrum, 4000.0, 20000.0);
        let total = low + mid + high;

        let (low_ratio, mid_ratio, high_ratio) = if total > DB_EPSILON {
            (low / total, mid / total, high / total)
        } else {
            (0.0, 0.0, 0.0)
        };

        let centroid = self.spectral.centroid(&spectrum);
        let rolloff = self.spectral.rolloff(&spectrum, 0.95);
        let tilt = self.spectral_tilt(&spectrum, total);

        // Five-way split normalized per bin, for dynamic EQ auto-presets
        let means = [
            self.spectral.band_mean(&spectrum, 20.0, 250.0),
            self.spectral.band_mean(&spectrum, 250.0, 1000.0),
            self.spectral.band_mean(&spectrum, 1000.0, 4000.0),
            self.spectral.band_mean(&spectrum, 4000.0, 8000.0),
            self.spectral.band_mean(&spectrum, 8000.0, 20000.0),
        ];
        let mean_total: f32 = means.iter().sum::<f32>() + DB_EPSILON;

        // Dynamics
        let peak_lin = peak(&mono);
        let rms_lin = rms(&mono);
        let crest = if rms_lin > DB_EPSILON {
            peak_lin / rms_lin
        } else {
            0.0
        };
        let peak_db = linear_to_db(peak_lin);
        let rms_db = linear_to_db(rms_lin);
        let dynamic_range = if rms_lin > DB_EPSILON {
            peak_db - rms_db
        } else {
            0.0
        };

        // Rhythm
        let onset_env = self.onset_envelope(&mono);
        let transient_density = self.transient_density(&onset_env, signal.duration_secs());
        let tempo_bpm = self.estimate_tempo(&onset_env);

        // Stereo
        let (correlation, width) = self.stereo_image(signal);

        // Noise floor / SNR
        let (noise_floor_db, snr_db) = self.noise_floor(&mono);

        FeatureProfile {
            low_energy_ratio: low_ratio,
            mid_energy_ratio: mid_ratio,
            high_energy_ratio: high_ratio,
            spectral_centroid_hz: centroid,
            spectral_rolloff_hz: rolloff,
            spectral_tilt_db_oct: tilt,
            peak_db,
            rms_db,
            crest_factor: crest,
            dynamic_range_db: dynamic_range,
            transient_density,
            tempo_bpm,
            stereo_correlation: correlation,
            stereo_width: width,
            mfcc: self.mfcc.compute(&mono).to_vec(),
            noise_floor_db,
            snr_db,
            harshness: means[3] / mean_total,
            sibilance: means[4] / mean_total,
            low_end_excess: means[0] / mean_total,
            vocal_presence: means[2] / mean_total,
        }
    }

    /// Linear regression of band mean level (dB) against log2 of the
    /// band center frequency, in dB/octave.
    fn spectral_tilt(&self, spectrum: &[f32], total: f32) -> f32 {
        if total <= DB_EPSILON {
            return 0.0;
        }

        let bands: [(f32, f32); 3] = [(20.0, 250.0), (250.0, 4000.0), (4000.0, 20000.0)];
        let mut xs = [0.0f32; 3];
        let mut ys = [0.0f32; 3];
        for (i, &(lo, hi)) in bands.iter().enumerate() {
            let center = (lo * hi).sqrt();
            xs[i] = center.log2();
            ys[i] = linear_to_db(self.spectral.band_mean(spectrum, lo, hi));
        }

        let n = xs.len() as f32;
        let mean_x = xs.iter().sum::<f32>() / n;
        let mean_y = ys.iter().sum::<f32>() / n;
        let mut num = 0.0f32;
        let mut den = 0.0f32;
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            num += (x - mean_x) * (y - mean_y);
            den += (x - mean_x) * (x - mean_x);
        }
        if den > DB_EPSILON { num / den } else { 0.0 }
    }

    /// Per-window RMS over 5 ms hops, the substrate for transient and
    /// tempo analysis.
    fn onset_envelope(&self, mono: &[f32]) -> Vec<f32> {
        let window = (self.sample_rate as f32 * TRANSIENT_WINDOW_SECS) as usize;
        if window == 0 || mono.len() < window {
            return Vec::new();
        }
        mono.chunks_exact(window).map(rms).collect()
    }

    /// Count windows whose level rises >10 dB over the previous window
    fn transient_density(&self, onset_env: &[f32], duration_secs: f32) -> f32 {
        if onset_env.len() < 2 || duration_secs <= 0.0 {
            return 0.0;
        }
        let mut count = 0usize;
        for pair in onset_env.windows(2) {
            let rise = linear_to_db(pair[1]) - linear_to_db(pair[0]);
            if rise > TRANSIENT_RISE_DB {
                count += 1;
            }
        }
        count as f32 / duration_secs
    }

    /// Autocorrelate the onset envelope over 60-180 BPM lags and pick
    /// the strongest. Returns 0 when the envelope carries no pulse.
    fn estimate_tempo(&self, onset_env: &[f32]) -> f32 {
        if onset_env.len() < 64 {
            return 0.0;
        }

        let mean = onset_env.iter().sum::<f32>() / onset_env.len() as f32;
        let centered: Vec<f32> = onset_env.iter().map(|e| e - mean).collect();
        let energy: f32 = centered.iter().map(|e| e * e).sum();
        if energy < DB_EPSILON {
            return 0.0;
        }

        // Lag in windows for a given BPM: (60/bpm) / window_secs
        let windows_per_sec = 1.0 / TRANSIENT_WINDOW_SECS;
        let min_lag = (60.0 / 180.0 * windows_per_sec) as usize;
        let max_lag = ((60.0 / 60.0 * windows_per_sec) as usize).min(centered.len() / 2);
        if min_lag >= max_lag {
            return 0.0;
        }

        let mut best_lag = 0usize;
        let mut best_r = 0.0f32;
        for lag in min_lag..=max_lag {
            let r: f32 = centered[lag..]
                .iter()
                .zip(centered.iter())
                .map(|(a, b)| a * b)
                .sum::<f32>()
                / energy;
            if r > best_r {
                best_r = r;
                best_lag = lag;
            }
        }

        // Require a meaningful periodicity before reporting a tempo
        if best_r < 0.1 || best_lag == 0 {
            return 0.0;
        }
        60.0 / (best_lag as f32 * TRANSIENT_WINDOW_SECS)
    }

    /// Correlation and width; mono reports (1.0, 0.0)
    fn stereo_image(&self, signal: &AudioSignal) -> (f32, f32) {
        if signal.num_channels() < 2 {
            return (1.0, 0.0);
        }
        let (left, right) = match signal.stereo_pair() {
            Some(pair) => pair,
            None => return (1.0, 0.0),
        };

        let mut sum_lr = 0.0f32;
        let mut sum_l2 = 0.0f32;
        let mut sum_r2 = 0.0f32;
        let mut mid_energy = 0.0f32;
        let mut side_energy = 0.0f32;

        for (&l, &r) in left.iter().zip(right.iter()) {
            sum_lr += l * r;
            sum_l2 += l * l;
            sum_r2 += r * r;
            let mid = (l + r) * 0.5;
            let side = (l - r) * 0.5;
            mid_energy += mid * mid;
            side_energy += side * side;
        }

        let denom = (sum_l2 * sum_r2).sqrt();
        let correlation = if denom > DB_EPSILON {
            sum_lr / denom
        } else {
            1.0 // silent stereo is trivially mono-compatible
        };

        // Anti-phase material drives mid energy to zero, so the mid term is
        // epsilon-guarded and the ratio capped. Width 0.0 is reserved for
        // signals with no side content at all.
        let width = if side_energy > DB_EPSILON {
            (side_energy / (mid_energy + DB_EPSILON))
                .sqrt()
                .min(MAX_STEREO_WIDTH)
        } else {
            0.0
        };

        (correlation, width)
    }

    /// 10th percentile as noise floor, 95th as signal reference
    fn noise_floor(&self, mono: &[f32]) -> (f32, f32) {
        if mono.is_empty() {
            return (linear_to_db(0.0), 0.0);
        }
        let mut sorted: Vec<f32> = mono.iter().map(|s| s.abs()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let floor = sorted[(sorted.len() as f32 * 0.10) as usize];
        let signal = sorted[((sorted.len() as f32 * 0.95) as usize).min(sorted.len() - 1)];

        let floor_db = linear_to_db(floor);
        let snr_db = 20.0 * ((signal + DB_EPSILON) / (floor + DB_EPSILON)).log10();
        (floor_db, snr_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amp: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn extract(channels: Vec<Vec<f32>>) -> FeatureProfile {
        let signal = AudioSignal::new(&channels, 48000);
        FeatureExtractor::new(48000).extract(&signal)
    }

    #[test]
    fn test_silence_yields_sentinels() {
        let profile = extract(vec![vec![0.0f32; 96000]]);
        assert_eq!(profile.crest_factor, 0.0);
        assert_eq!(profile.spectral_centroid_hz, 0.0);
        assert_eq!(profile.dynamic_range_db, 0.0);
        assert_eq!(profile.transient_density, 0.0);
        assert_eq!(profile.tempo_bpm, 0.0);
        assert!(profile.mfcc.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_sine_crest_factor() {
        use approx::assert_relative_eq;

        let profile = extract(vec![sine(440.0, 0.5, 48000.0, 96000)]);
        // Sine crest factor is sqrt(2)
        assert_relative_eq!(profile.crest_factor, std::f32::consts::SQRT_2, epsilon = 0.05);
        assert_relative_eq!(profile.dynamic_range_db, 3.0, epsilon = 0.3);
    }

    #[test]
    fn test_low_tone_dominates_low_band() {
        let profile = extract(vec![sine(80.0, 0.5, 48000.0, 96000)]);
        assert!(profile.low_energy_ratio > 0.8);
        assert!(profile.is_dark());
        assert!(profile.spectral_centroid_hz < 500.0);
    }

    #[test]
    fn test_high_tone_is_bright() {
        let profile = extract(vec![sine(9000.0, 0.5, 48000.0, 96000)]);
        assert!(profile.high_energy_ratio > 0.8);
        assert!(profile.is_harsh());
        assert!(profile.is_bright());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let channels = vec![sine(440.0, 0.5, 48000.0, 96000), sine(443.0, 0.4, 48000.0, 96000)];
        let signal = AudioSignal::new(&channels, 48000);
        let extractor = FeatureExtractor::new(48000);
        let first = extractor.extract(&signal);
        let second = extractor.extract(&signal);
        assert_eq!(first, second, "extraction must be a pure function");
    }

    #[test]
    fn test_identical_channels_fully_correlated() {
        let ch = sine(440.0, 0.5, 48000.0, 48000);
        let profile = extract(vec![ch.clone(), ch]);
        assert!(profile.stereo_correlation > 0.99);
        assert!(profile.stereo_width < 0.01);
    }

    #[test]
    fn test_inverted_channels_anticorrelated() {
        use approx::assert_relative_eq;
        let ch = sine(440.0, 0.5, 48000.0, 48000);
        let inv: Vec<f32> = ch.iter().map(|s| -s).collect();
        let profile = extract(vec![ch, inv]);
        assert!(profile.stereo_correlation < -0.99);
        // mid collapses to zero, so the width ratio pins at the ceiling
        assert!(profile.stereo_width > 1.0);
        assert_relative_eq!(profile.stereo_width, MAX_STEREO_WIDTH, epsilon = 1e-4);
    }

    #[test]
    fn test_click_train_density_and_tempo() {
        // 120 BPM click train: one 5 ms burst every 0.5 s
        let sample_rate = 48000usize;
        let mut audio = vec![0.0f32; sample_rate * 4];
        let burst = (sample_rate as f32 * 0.005) as usize;
        for beat in 0..8 {
            let start = beat * sample_rate / 2;
            for sample in audio.iter_mut().skip(start).take(burst) {
                *sample = 0.9;
            }
        }
        let profile = extract(vec![audio]);
        assert!(
            profile.transient_density > 1.0 && profile.transient_density < 4.0,
            "density {}",
            profile.transient_density
        );
        assert!(
            (profile.tempo_bpm - 120.0).abs() < 8.0,
            "tempo {}",
            profile.tempo_bpm
        );
    }

    #[test]
    fn test_noise_floor_separates_quiet_bed() {
        // Loud tone over a quiet constant bed
        let mut audio = sine(440.0, 0.5, 48000.0, 96000);
        for (i, s) in audio.iter_mut().enumerate() {
            if i % 10 == 0 {
                *s = 0.001; // fake quiet samples
            }
        }
        let profile = extract(vec![audio]);
        assert!(profile.snr_db > 20.0);
    }
}
