//! MasterKit analysis and decision engine
//!
//! Turns one decoded buffer into a structured mastering recommendation:
//!
//! - **Feature extraction**: spectral balance, centroid/rolloff/tilt,
//!   dynamics, transient density, tempo, stereo image, MFCC, noise floor
//! - **Artifact detection**: ten independent checks with a 0-100
//!   quality score
//! - **Chain selection**: eight stage-order templates scored against
//!   the profile
//! - **Genre classification**: range-based matching with loudness and
//!   platform targets
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mk_analysis::MasteringAdvisor;
//! use mk_core::AudioSignal;
//!
//! let advisor = MasteringAdvisor::new(48000);
//! let signal = AudioSignal::new(&channels, 48000);
//! let report = advisor.analyze(&signal)?;
//! println!("{} via {}", report.genre.name, report.chain.name);
//! ```
//!
//! The advisor produces an [`AnalysisReport`]; rendering it through an
//! actual filter/limiter chain is the host's job. The companion
//! `mk-dsp` crate supplies the dynamic EQ the report can configure.

pub mod advisor;
pub mod artifacts;
pub mod chain;
pub mod error;
pub mod features;
pub mod genre;
pub mod spectrum;

pub use advisor::{AnalysisReport, AnalyzeOptions, MasteringAdvisor};
pub use artifacts::{
    ArtifactDetector, DetectionResult, DetectorConfig, Issue, IssueKind, Region, Severity,
};
pub use chain::{ChainOptimizer, ChainSelection, ChainTemplate, Stage};
pub use error::{AnalysisError, AnalysisResult};
pub use features::{FeatureExtractor, FeatureProfile};
pub use genre::{Genre, GenreClassifier, GenreMatch, MasteringStatus, Platform};
pub use spectrum::{MfccExtractor, SpectrumAnalyzer};
