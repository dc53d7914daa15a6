//! Biquad filter implementation using Transposed Direct Form II
//!
//! TDF-II is numerically optimal for floating-point arithmetic,
//! minimizing quantization noise and ensuring stability. Coefficients
//! and state run in f64; the I/O boundary is f32 sample data.

use std::f64::consts::PI;

use crate::Processor;

/// Biquad coefficients (already normalized by a0)
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Calculate lowpass filter coefficients
    pub fn lowpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Calculate highpass filter coefficients
    pub fn highpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Calculate bandpass filter coefficients (constant 0 dB peak gain)
    pub fn bandpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Calculate peaking EQ coefficients
    pub fn peaking(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0f64.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// TDF-II biquad filter with owned state
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl Biquad {
    /// Create from coefficients
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Replace coefficients, preserving state
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    /// Process a single sample
    #[inline(always)]
    pub fn process(&mut self, input: f32) -> f32 {
        let x = input as f64;
        let y = self.coeffs.b0 * x + self.z1;
        self.z1 = self.coeffs.b1 * x - self.coeffs.a1 * y + self.z2;
        self.z2 = self.coeffs.b2 * x - self.coeffs.a2 * y;
        y as f32
    }

    /// Filter a slice into a new buffer, leaving the input untouched
    pub fn process_to_vec(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&s| self.process(s)).collect()
    }
}

impl Processor for Biquad {
    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_lowpass_attenuates_high_frequency() {
        let mut filter = Biquad::new(BiquadCoeffs::lowpass(100.0, 0.707, 48000.0));
        let input = sine(8000.0, 48000.0, 48000);
        let output = filter.process_to_vec(&input);

        // Skip the transient, then compare RMS
        let in_rms = mk_core::rms(&input[4800..]);
        let out_rms = mk_core::rms(&output[4800..]);
        assert!(out_rms < in_rms * 0.05, "8 kHz should be well below a 100 Hz lowpass");
    }

    #[test]
    fn test_bandpass_passes_center() {
        let mut filter = Biquad::new(BiquadCoeffs::bandpass(1000.0, 0.707, 48000.0));
        let input = sine(1000.0, 48000.0, 48000);
        let output = filter.process_to_vec(&input);

        let in_rms = mk_core::rms(&input[4800..]);
        let out_rms = mk_core::rms(&output[4800..]);
        assert!(out_rms > in_rms * 0.7, "center frequency should pass near unity");
    }

    #[test]
    fn test_peaking_at_zero_gain_is_identity() {
        use approx::assert_relative_eq;

        let mut filter = Biquad::new(BiquadCoeffs::peaking(1000.0, 1.0, 0.0, 48000.0));
        let input = sine(440.0, 48000.0, 4800);
        let output = filter.process_to_vec(&input);
        for (x, y) in input.iter().zip(output.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = Biquad::new(BiquadCoeffs::lowpass(100.0, 0.707, 48000.0));
        filter.process(1.0);
        filter.process(1.0);
        filter.reset();
        let first = filter.process(0.0);
        assert_eq!(first, 0.0);
    }
}
