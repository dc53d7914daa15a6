//! Borrowed view over a decoded multi-channel PCM buffer
//!
//! The host owns the audio; analysis borrows it read-only for the
//! duration of a call. All channels must have equal length and the
//! sample rate must be non-zero - `validate` checks both.

use crate::error::{CoreError, CoreResult};

/// Immutable view over decoded multi-channel float PCM.
#[derive(Debug, Clone, Copy)]
pub struct AudioSignal<'a> {
    channels: &'a [Vec<f32>],
    sample_rate: u32,
}

impl<'a> AudioSignal<'a> {
    /// Wrap a channel-major buffer. Call `validate` before analysis.
    pub fn new(channels: &'a [Vec<f32>], sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Eager input validation: empty buffer, zero sample rate, and
    /// mismatched channel lengths are rejected with a descriptive error.
    pub fn validate(&self) -> CoreResult<()> {
        if self.sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels.is_empty() {
            return Err(CoreError::EmptyBuffer("no channels".to_string()));
        }
        let expected = self.channels[0].len();
        if expected == 0 {
            return Err(CoreError::EmptyBuffer("channel 0 has no samples".to_string()));
        }
        for (i, ch) in self.channels.iter().enumerate().skip(1) {
            if ch.len() != expected {
                return Err(CoreError::ChannelLengthMismatch {
                    channel: i,
                    got: ch.len(),
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    /// True if there is no audio data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f32 / self.sample_rate as f32
    }

    /// Per-channel sample access.
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&'a [f32]> {
        self.channels.get(index).map(|c| c.as_slice())
    }

    /// All channels.
    #[inline]
    pub fn channels(&self) -> &'a [Vec<f32>] {
        self.channels
    }

    /// Left/right pair for stereo features. Mono maps both to channel 0.
    pub fn stereo_pair(&self) -> Option<(&'a [f32], &'a [f32])> {
        match self.num_channels() {
            0 => None,
            1 => {
                let c = self.channels[0].as_slice();
                Some((c, c))
            }
            _ => Some((self.channels[0].as_slice(), self.channels[1].as_slice())),
        }
    }

    /// Downmix to mono as the arithmetic mean of all channels.
    pub fn downmix_mono(&self) -> Vec<f32> {
        let len = self.len();
        let n = self.num_channels();
        if n == 0 || len == 0 {
            return Vec::new();
        }
        if n == 1 {
            return self.channels[0].clone();
        }
        let scale = 1.0 / n as f32;
        let mut mono = vec![0.0f32; len];
        for ch in self.channels {
            for (m, s) in mono.iter_mut().zip(ch.iter()) {
                *m += s;
            }
        }
        for m in &mut mono {
            *m *= scale;
        }
        mono
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_rate() {
        let channels = vec![vec![0.0f32; 16]];
        let signal = AudioSignal::new(&channels, 0);
        assert!(matches!(
            signal.validate(),
            Err(CoreError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let channels: Vec<Vec<f32>> = vec![];
        let signal = AudioSignal::new(&channels, 48000);
        assert!(matches!(signal.validate(), Err(CoreError::EmptyBuffer(_))));

        let channels = vec![vec![]];
        let signal = AudioSignal::new(&channels, 48000);
        assert!(matches!(signal.validate(), Err(CoreError::EmptyBuffer(_))));
    }

    #[test]
    fn test_validate_rejects_mismatched_channels() {
        let channels = vec![vec![0.0f32; 16], vec![0.0f32; 8]];
        let signal = AudioSignal::new(&channels, 48000);
        assert!(matches!(
            signal.validate(),
            Err(CoreError::ChannelLengthMismatch { channel: 1, .. })
        ));
    }

    #[test]
    fn test_downmix_is_mean() {
        let channels = vec![vec![1.0f32, 0.0], vec![0.0f32, 1.0]];
        let signal = AudioSignal::new(&channels, 48000);
        let mono = signal.downmix_mono();
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn test_stereo_pair_mono_fallback() {
        let channels = vec![vec![0.25f32; 4]];
        let signal = AudioSignal::new(&channels, 44100);
        let (l, r) = signal.stereo_pair().unwrap();
        assert_eq!(l, r);
    }
}
