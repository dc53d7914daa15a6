//! Per-band envelope-following dynamics ("dynamic EQ")
//!
//! Each band isolates its frequency range with a bandpass filter, tracks
//! the band level with an attack/release envelope follower, and applies a
//! threshold/ratio gain law to the band component only. `Compress` bands
//! reduce gain above threshold; `Expand` bands boost above threshold
//! (used for "air"/sparkle bands).
//!
//! Bands are configured once from a preset or an analysis-derived
//! correction, then mutated sample-by-sample during rendering. Envelope
//! state persists across `process_block` calls within one render pass;
//! callers must `reset` before starting an independent pass.

use serde::{Deserialize, Serialize};

use mk_core::{DB_EPSILON, db_to_linear};

use crate::Processor;
use crate::biquad::{Biquad, BiquadCoeffs};

/// Gain law direction for a dynamic band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandMode {
    /// Reduce gain when the band level exceeds threshold
    Compress,
    /// Increase gain when the band level exceeds threshold (upward expansion)
    Expand,
}

/// Static configuration for one dynamic band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicBandConfig {
    /// Display name ("Sub", "Air", ...)
    pub name: String,
    /// Band center frequency (Hz)
    pub center_freq: f32,
    /// Filter Q; bandwidth = center_freq / q
    pub q: f32,
    /// Static gain always applied to the band (dB)
    pub static_gain_db: f32,
    /// Level above which the dynamic gain law engages (dB)
    pub threshold_db: f32,
    /// Compression/expansion ratio
    pub ratio: f32,
    /// Envelope attack time (ms)
    pub attack_ms: f32,
    /// Envelope release time (ms)
    pub release_ms: f32,
    /// Soft knee width (dB); 0 = hard knee
    pub knee_db: f32,
    /// Compress or expand
    pub mode: BandMode,
    /// Inactive bands are skipped entirely
    pub enabled: bool,
}

/// One band of the dynamic EQ with owned runtime state
#[derive(Debug, Clone)]
pub struct DynamicBand {
    config: DynamicBandConfig,
    filter: Biquad,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
    last_gain_reduction_db: f32,
}

impl DynamicBand {
    /// Create a band for the given sample rate
    pub fn new(config: DynamicBandConfig, sample_rate: u32) -> Self {
        let coeffs = BiquadCoeffs::bandpass(
            config.center_freq as f64,
            config.q as f64,
            sample_rate as f64,
        );
        let attack_coeff = (-1.0 / (config.attack_ms * 0.001 * sample_rate as f32)).exp();
        let release_coeff = (-1.0 / (config.release_ms * 0.001 * sample_rate as f32)).exp();

        Self {
            config,
            filter: Biquad::new(coeffs),
            attack_coeff,
            release_coeff,
            envelope: 0.0,
            last_gain_reduction_db: 0.0,
        }
    }

    /// Band configuration
    pub fn config(&self) -> &DynamicBandConfig {
        &self.config
    }

    /// Enable or disable the band
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Magnitude of the most recent dynamic gain change (dB), for metering
    pub fn gain_reduction_db(&self) -> f32 {
        self.last_gain_reduction_db
    }

    /// Current envelope level (linear)
    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    /// Apply the band in place. The dynamic delta is applied to the
    /// band-filtered component only and mixed back, so content outside
    /// the band is untouched.
    pub fn process_block(&mut self, data: &mut [f32]) {
        if !self.config.enabled {
            return;
        }

        for sample in data.iter_mut() {
            let filtered = self.filter.process(*sample);
            let level = filtered.abs();

            // Attack when the band level rises, release when it falls
            if level > self.envelope {
                self.envelope = self.attack_coeff * self.envelope
                    + (1.0 - self.attack_coeff) * level;
            } else {
                self.envelope = self.release_coeff * self.envelope
                    + (1.0 - self.release_coeff) * level;
            }

            let envelope_db = 20.0 * (self.envelope + DB_EPSILON).log10();

            let mut gain_db = 0.0f32;
            if envelope_db > self.config.threshold_db {
                let over = envelope_db - self.config.threshold_db;
                gain_db = match self.config.mode {
                    BandMode::Compress => over / self.config.ratio - over,
                    BandMode::Expand => over * self.config.ratio - over,
                };
            }

            // Soft knee: scale the delta by the fractional position
            // inside the knee window around the threshold
            if self.config.knee_db > 0.0 {
                let knee_start = self.config.threshold_db - self.config.knee_db / 2.0;
                let knee_end = self.config.threshold_db + self.config.knee_db / 2.0;
                if envelope_db > knee_start && envelope_db < knee_end {
                    let knee_pos = (envelope_db - knee_start) / self.config.knee_db;
                    gain_db *= knee_pos;
                }
            }

            let total_db = self.config.static_gain_db + gain_db;
            let linear = db_to_linear(total_db);

            *sample += filtered * (linear - 1.0);
            self.last_gain_reduction_db = gain_db.abs();
        }
    }
}

impl Processor for DynamicBand {
    fn reset(&mut self) {
        self.envelope = 0.0;
        self.last_gain_reduction_db = 0.0;
        self.filter.reset();
    }
}

/// Bank of dynamic bands for one channel stream.
///
/// Bands are applied serially, so a later band sees the output of
/// earlier bands; samples within a band run in strict temporal order.
#[derive(Debug, Clone)]
pub struct DynamicEq {
    bands: Vec<DynamicBand>,
    sample_rate: u32,
}

impl DynamicEq {
    /// Create a bank from band configurations
    pub fn new(configs: Vec<DynamicBandConfig>, sample_rate: u32) -> Self {
        let bands = configs
            .into_iter()
            .map(|c| DynamicBand::new(c, sample_rate))
            .collect();
        Self { bands, sample_rate }
    }

    /// Create from a named preset
    pub fn from_preset(preset: crate::presets::DynamicEqPreset, sample_rate: u32) -> Self {
        log::debug!("building dynamic EQ: {}", preset.description());
        Self::new(preset.band_configs(), sample_rate)
    }

    /// Sample rate the bank was built for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The bands
    pub fn bands(&self) -> &[DynamicBand] {
        &self.bands
    }

    /// Mutable band access for host parameter changes
    pub fn band_mut(&mut self, index: usize) -> Option<&mut DynamicBand> {
        self.bands.get_mut(index)
    }

    /// Process a block of samples in place
    pub fn process_block(&mut self, data: &mut [f32]) {
        for band in &mut self.bands {
            band.process_block(data);
        }
    }

    /// Per-band gain reduction for metering
    pub fn gain_reductions_db(&self) -> Vec<f32> {
        self.bands.iter().map(|b| b.gain_reduction_db()).collect()
    }
}

impl Processor for DynamicEq {
    fn reset(&mut self) {
        for band in &mut self.bands {
            band.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_band(mode: BandMode) -> DynamicBandConfig {
        DynamicBandConfig {
            name: "Mid".to_string(),
            center_freq: 1000.0,
            q: 0.7,
            static_gain_db: 0.0,
            threshold_db: -20.0,
            ratio: 3.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            knee_db: 0.0,
            mode,
            enabled: true,
        }
    }

    fn tone(freq: f32, amp: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_disabled_band_is_bypassed() {
        let mut config = test_band(BandMode::Compress);
        config.enabled = false;
        let mut band = DynamicBand::new(config, 48000);

        let mut data = tone(1000.0, 0.5, 48000.0, 4800);
        let original = data.clone();
        band.process_block(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_compress_band_reduces_loud_tone() {
        let mut band = DynamicBand::new(test_band(BandMode::Compress), 48000);

        // A 1 kHz tone at -6 dBFS is well above the -20 dB threshold
        let mut data = tone(1000.0, 0.5, 48000.0, 48000);
        let in_rms = mk_core::rms(&data[24000..]);
        band.process_block(&mut data);
        let out_rms = mk_core::rms(&data[24000..]);

        assert!(out_rms < in_rms, "compression should reduce band level");
        assert!(band.gain_reduction_db() > 1.0);
    }

    #[test]
    fn test_step_response_converges_to_static_reduction() {
        // Silence, then a constant tone above threshold: gain reduction
        // must rise monotonically toward over - over/ratio and settle
        // within roughly 5x the attack time constant.
        let sample_rate = 48000u32;
        let mut band = DynamicBand::new(test_band(BandMode::Compress), sample_rate);

        let mut silence = vec![0.0f32; 4800];
        band.process_block(&mut silence);
        assert!(band.gain_reduction_db() < 0.01);

        let attack_samples = (10.0 * 0.001 * sample_rate as f32) as usize;
        let mut last_gr = 0.0f32;
        let mut grs = Vec::new();
        for _ in 0..10 {
            let mut chunk = tone(1000.0, 0.5, sample_rate as f32, attack_samples);
            band.process_block(&mut chunk);
            let gr = band.gain_reduction_db();
            assert!(gr + 0.2 >= last_gr, "gain reduction should rise monotonically");
            last_gr = gr;
            grs.push(gr);
        }

        // Steady state: envelope ~= tone peak 0.5 => about -6 dB, over ~= 14 dB,
        // expected reduction ~= over - over/ratio ~= 9.3 dB. The bandpass and
        // envelope smoothing blur this, so allow a generous window.
        let settled = grs[9];
        assert!(settled > 5.0 && settled < 12.0, "settled GR {settled} out of range");
        // Converged: last two chunks (5x attack onward) nearly equal
        assert!((grs[9] - grs[8]).abs() < 0.3);
    }

    #[test]
    fn test_expand_band_boosts_above_threshold() {
        let mut band = DynamicBand::new(test_band(BandMode::Expand), 48000);

        let mut data = tone(1000.0, 0.5, 48000.0, 48000);
        let in_rms = mk_core::rms(&data[24000..]);
        band.process_block(&mut data);
        let out_rms = mk_core::rms(&data[24000..]);

        assert!(out_rms > in_rms, "expansion should boost band level");
    }

    #[test]
    fn test_reset_isolates_render_passes() {
        let mut band = DynamicBand::new(test_band(BandMode::Compress), 48000);

        let mut data = tone(1000.0, 0.5, 48000.0, 48000);
        band.process_block(&mut data);
        assert!(band.envelope() > 0.0);

        band.reset();
        assert_eq!(band.envelope(), 0.0);
        assert_eq!(band.gain_reduction_db(), 0.0);
    }

    #[test]
    fn test_out_of_band_content_untouched() {
        // A 40 Hz Sub band must leave a 10 kHz tone essentially alone
        let mut config = test_band(BandMode::Compress);
        config.name = "Sub".to_string();
        config.center_freq = 40.0;
        let mut band = DynamicBand::new(config, 48000);

        let mut data = tone(10000.0, 0.5, 48000.0, 48000);
        let in_rms = mk_core::rms(&data[24000..]);
        band.process_block(&mut data);
        let out_rms = mk_core::rms(&data[24000..]);

        assert!((out_rms - in_rms).abs() / in_rms < 0.01);
    }
}
