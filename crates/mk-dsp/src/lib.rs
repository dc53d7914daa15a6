//! mk-dsp: Signal-path DSP for MasterKit
//!
//! ## Modules
//! - `biquad` - TDF-II biquad filters (lowpass, highpass, bandpass, peaking)
//! - `dynamic_eq` - per-band envelope-following dynamics ("dynamic EQ")
//! - `presets` - standard band layout and dynamic EQ preset catalogue

pub mod biquad;
pub mod dynamic_eq;
pub mod presets;

pub use biquad::{Biquad, BiquadCoeffs};
pub use dynamic_eq::{BandMode, DynamicBand, DynamicBandConfig, DynamicEq};
pub use presets::{DynamicEqPreset, standard_bands};

/// Trait for stateful DSP processors with resettable runtime state.
///
/// State persists across calls within one continuous render pass and is
/// never reset implicitly; callers must invoke `reset` at the start of
/// each independent pass.
pub trait Processor: Send {
    /// Reset all runtime state for a new render pass
    fn reset(&mut self);
}
