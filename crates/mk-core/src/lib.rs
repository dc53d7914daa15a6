//! mk-core: Shared types and utilities for MasterKit
//!
//! Foundational types used across the MasterKit crates:
//! - `AudioSignal` - borrowed, validated view over decoded PCM
//! - Sample math helpers (dB conversion, epsilon guards)
//! - Core error type

mod error;
mod sample;
mod signal;

pub use error::*;
pub use sample::*;
pub use signal::*;
