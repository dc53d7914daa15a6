//! Sample math helpers shared across analysis and DSP

/// Guard value added before logarithms and divisions so that silent or
/// degenerate input degrades to a sentinel instead of NaN/-inf.
pub const DB_EPSILON: f32 = 1e-12;

/// Convert a linear amplitude to decibels (20 log10), epsilon-guarded.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * (linear + DB_EPSILON).log10()
}

/// Convert decibels to a linear amplitude multiplier.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// RMS of a sample slice. Returns 0.0 for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Absolute peak of a sample slice.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}
