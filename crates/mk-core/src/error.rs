//! Error types for MasterKit

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input buffer has no channels or no samples
    #[error("Empty audio buffer: {0}")]
    EmptyBuffer(String),

    /// Sample rate is zero or otherwise unusable
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Channels in one buffer differ in length
    #[error("Channel length mismatch: channel {channel} has {got} samples, expected {expected}")]
    ChannelLengthMismatch {
        /// Offending channel index
        channel: usize,
        /// Length of the offending channel
        got: usize,
        /// Length of channel 0
        expected: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
