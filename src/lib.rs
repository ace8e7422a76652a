//! Audio feature extraction and structural analysis.
//!
//! One [`Analyzer`] turns a local file or an HTTP(S) URL into an
//! [`AnalysisResult`]: tempo and beats, spectral descriptors, MFCCs, a
//! rule-based genre label, a complexity score and a list of sections.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;

pub use analysis::report::{AnalysisReport, AnalysisResult, FeatureVector, Section, SectionKind};
pub use analysis::genre::Genre;
pub use analysis::{analyze_source, Analyzer};
pub use audio::{AudioBuffer, AudioSource};
pub use config::Config;
pub use error::{AnalysisError, SegmentationError};
