//! Shared spectral estimation substrate
//!
//! Every consumer (features, artifact detection) goes through one FFT
//! path: overlapped Hann-windowed frames accumulated into an averaged
//! magnitude spectrum, plus helpers for band energy, centroid, rolloff
//! and peak picking. The mel/MFCC path has its own smaller FFT plan.

use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use mk_core::DB_EPSILON;

/// Number of mel filters in the MFCC filterbank
const NUM_MEL_BANDS: usize = 26;
/// Number of cepstral coefficients kept after the DCT
pub const NUM_MFCC: usize = 13;
/// Frame cap for MFCC averaging, bounds work on long files
const MAX_MFCC_FRAMES: usize = 100;

/// Averaged-magnitude spectrum analyzer over a fixed FFT size
pub struct SpectrumAnalyzer {
    sample_rate: u32,
    fft_size: usize,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer with the given FFT size (power of two)
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(fft_size);

        // Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / fft_size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Self {
            sample_rate,
            fft_size,
            fft_forward,
            window,
        }
    }

    /// FFT size in samples
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Width of one bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Average magnitude spectrum over 50%-overlapped frames.
    ///
    /// Input shorter than one frame is zero-padded into a single frame
    /// so short buffers still produce a (coarse) spectrum.
    pub fn average_spectrum(&self, audio: &[f32]) -> Vec<f32> {
        let bins = self.fft_size / 2 + 1;
        let hop = self.fft_size / 2;
        let mut avg = vec![0.0f32; bins];
        let mut frame_count = 0usize;

        let mut scratch = vec![0.0f32; self.fft_size];
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); bins];

        if audio.len() < self.fft_size {
            scratch.fill(0.0);
            for (i, &s) in audio.iter().enumerate() {
                scratch[i] = s * self.window[i];
            }
            self.fft_forward.process(&mut scratch, &mut spectrum).ok();
            for (a, c) in avg.iter_mut().zip(spectrum.iter()) {
                *a = c.norm();
            }
            return avg;
        }

        for start in (0..=audio.len() - self.fft_size).step_by(hop) {
            for i in 0..self.fft_size {
                scratch[i] = audio[start + i] * self.window[i];
            }
            self.fft_forward.process(&mut scratch, &mut spectrum).ok();
            for (a, c) in avg.iter_mut().zip(spectrum.iter()) {
                *a += c.norm();
            }
            frame_count += 1;
        }

        if frame_count > 0 {
            let scale = 1.0 / frame_count as f32;
            for a in &mut avg {
                *a *= scale;
            }
        }

        avg
    }

    /// Sum of magnitudes in [low_hz, high_hz)
    pub fn band_energy(&self, spectrum: &[f32], low_hz: f32, high_hz: f32) -> f32 {
        let bin_width = self.bin_width();
        let low_bin = (low_hz / bin_width) as usize;
        let high_bin = ((high_hz / bin_width) as usize).min(spectrum.len());
        if low_bin >= high_bin {
            return 0.0;
        }
        spectrum[low_bin..high_bin].iter().sum()
    }

    /// Mean magnitude in [low_hz, high_hz), normalized per bin
    pub fn band_mean(&self, spectrum: &[f32], low_hz: f32, high_hz: f32) -> f32 {
        let bin_width = self.bin_width();
        let low_bin = (low_hz / bin_width) as usize;
        let high_bin = ((high_hz / bin_width) as usize).min(spectrum.len());
        if low_bin >= high_bin {
            return 0.0;
        }
        self.band_energy(spectrum, low_hz, high_hz) / (high_bin - low_bin) as f32
    }

    /// Energy-weighted mean frequency. Returns 0 for an empty spectrum.
    pub fn centroid(&self, spectrum: &[f32]) -> f32 {
        let bin_width = self.bin_width();
        let mut weighted = 0.0f32;
        let mut total = 0.0f32;

        for (i, &mag) in spectrum.iter().enumerate() {
            weighted += i as f32 * bin_width * mag;
            total += mag;
        }

        if total > DB_EPSILON {
            weighted / total
        } else {
            0.0
        }
    }

    /// Frequency below which `fraction` of total magnitude lies.
    /// Linear bin scan, first crossing wins.
    pub fn rolloff(&self, spectrum: &[f32], fraction: f32) -> f32 {
        let total: f32 = spectrum.iter().sum();
        if total <= DB_EPSILON {
            return 0.0;
        }
        let target = total * fraction;
        let bin_width = self.bin_width();

        let mut cumulative = 0.0f32;
        for (i, &mag) in spectrum.iter().enumerate() {
            cumulative += mag;
            if cumulative >= target {
                return i as f32 * bin_width;
            }
        }
        (spectrum.len() - 1) as f32 * bin_width
    }

    /// Local-maximum peaks sorted by magnitude, strongest first
    pub fn find_peaks(&self, spectrum: &[f32], count: usize) -> Vec<(usize, f32)> {
        let mut peaks: Vec<(usize, f32)> = Vec::new();
        for i in 1..spectrum.len().saturating_sub(1) {
            if spectrum[i] > spectrum[i - 1] && spectrum[i] > spectrum[i + 1] {
                peaks.push((i, spectrum[i]));
            }
        }
        peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        peaks.truncate(count);
        peaks
    }
}

/// Hz -> mel
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// mel -> Hz
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// MFCC extractor: pre-emphasis, Hamming frames, mel filterbank, DCT-II
pub struct MfccExtractor {
    fft_size: usize,
    hop_size: usize,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    filterbank: Vec<Vec<f32>>,
}

impl MfccExtractor {
    /// Build the extractor with a 2048-point frame and hop of 512
    pub fn new(sample_rate: u32) -> Self {
        let fft_size = 2048;
        let hop_size = 512;

        let mut planner = RealFftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(fft_size);

        // Hamming window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.54 - 0.46
                    * (2.0 * std::f32::consts::PI * i as f32 / (fft_size as f32 - 1.0)).cos()
            })
            .collect();

        let filterbank = Self::mel_filterbank(sample_rate, fft_size);

        Self {
            fft_size,
            hop_size,
            fft_forward,
            window,
            filterbank,
        }
    }

    /// Triangular mel filters spanning 0 Hz to Nyquist
    fn mel_filterbank(sample_rate: u32, fft_size: usize) -> Vec<Vec<f32>> {
        let nyquist = sample_rate as f32 / 2.0;
        let bins = fft_size / 2 + 1;

        let low_mel = hz_to_mel(0.0);
        let high_mel = hz_to_mel(nyquist);

        // numFilters + 2 evenly spaced points on the mel scale
        let points: Vec<usize> = (0..NUM_MEL_BANDS + 2)
            .map(|i| {
                let mel = low_mel + (high_mel - low_mel) * i as f32 / (NUM_MEL_BANDS + 1) as f32;
                let hz = mel_to_hz(mel);
                (((bins as f32) * hz / nyquist) as usize).min(bins - 1)
            })
            .collect();

        let mut filterbank = Vec::with_capacity(NUM_MEL_BANDS);
        for m in 1..=NUM_MEL_BANDS {
            let mut filter = vec![0.0f32; bins];
            let (left, center, right) = (points[m - 1], points[m], points[m + 1]);
            for (k, f) in filter.iter_mut().enumerate().take(center).skip(left) {
                *f = (k - left) as f32 / ((center - left) as f32 + DB_EPSILON);
            }
            for (k, f) in filter.iter_mut().enumerate().take(right).skip(center) {
                *f = (right - k) as f32 / ((right - center) as f32 + DB_EPSILON);
            }
            filterbank.push(filter);
        }
        filterbank
    }

    /// Compute MFCCs averaged over up to `MAX_MFCC_FRAMES` frames.
    /// Returns all-zero coefficients when the buffer is too short.
    pub fn compute(&self, audio: &[f32]) -> [f32; NUM_MFCC] {
        let mut avg = [0.0f32; NUM_MFCC];
        if audio.len() < self.fft_size {
            return avg;
        }

        // Pre-emphasis boosts high frequencies before the filterbank
        let mut emphasized = vec![0.0f32; audio.len()];
        emphasized[0] = audio[0];
        for i in 1..audio.len() {
            emphasized[i] = audio[i] - 0.97 * audio[i - 1];
        }

        let bins = self.fft_size / 2 + 1;
        let mut scratch = vec![0.0f32; self.fft_size];
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); bins];
        let mut frame_count = 0usize;

        let num_frames = (emphasized.len() - self.fft_size) / self.hop_size + 1;
        for frame in 0..num_frames.min(MAX_MFCC_FRAMES) {
            let start = frame * self.hop_size;
            for i in 0..self.fft_size {
                scratch[i] = emphasized[start + i] * self.window[i];
            }
            self.fft_forward.process(&mut scratch, &mut spectrum).ok();

            // Log mel energies
            let mut mel_energies = [0.0f32; NUM_MEL_BANDS];
            for (m, filter) in self.filterbank.iter().enumerate() {
                let mut energy = 0.0f32;
                for (c, &w) in spectrum.iter().zip(filter.iter()) {
                    if w > 0.0 {
                        energy += c.norm_sqr() / self.fft_size as f32 * w;
                    }
                }
                mel_energies[m] = (energy + DB_EPSILON).ln();
            }

            // DCT-II truncated to NUM_MFCC coefficients
            for (i, coeff) in avg.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (j, &e) in mel_energies.iter().enumerate() {
                    acc += e
                        * (std::f32::consts::PI * i as f32 * (j as f32 + 0.5)
                            / NUM_MEL_BANDS as f32)
                            .cos();
                }
                *coeff += acc;
            }
            frame_count += 1;
        }

        if frame_count > 0 {
            for c in &mut avg {
                *c /= frame_count as f32;
            }
        }
        avg
    }
}
