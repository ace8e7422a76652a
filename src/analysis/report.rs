use serde::{Serialize, Serializer};
use std::fmt;

use super::genre::Genre;
use crate::error::AnalysisError;

/// Scalar summary of the spectral features, population means over all frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub spectral_centroid_mean: f64,
    pub spectral_rolloff_mean: f64,
    /// 0 when no frame has a voiced pitch.
    pub pitch_mean: f64,
    pub energy_mean: f64,
    pub zcr_mean: f64,
}

/// MFCCs, one row per coefficient and one column per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimbreMatrix(pub Vec<Vec<f32>>);

impl TimbreMatrix {
    pub fn num_coefficients(&self) -> usize {
        self.0.len()
    }

    pub fn num_frames(&self) -> usize {
        self.0.first().map_or(0, |row| row.len())
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Intro,
    Verse,
    Chorus,
    Outro,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::Intro => "intro",
            SectionKind::Verse => "verse",
            SectionKind::Chorus => "chorus",
            SectionKind::Outro => "outro",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub start_time: f64,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    /// Novelty value at the boundary.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub duration: f64,
    pub tempo: f64,
    pub key_features: FeatureVector,
    pub mfccs: TimbreMatrix,
    pub genre: Genre,
    pub complexity: f64,
    pub sections: Vec<Section>,
    /// Beat times in seconds.
    pub beats: Vec<f64>,
    pub analysis_timestamp: String,
}

/// Outcome of one `analyze()` call, serialized with a `success` flag.
#[derive(Debug, Clone)]
pub enum AnalysisReport {
    Success(AnalysisResult),
    Failure { error: String },
}

impl AnalysisReport {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisReport::Success(_))
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisReport::Success(result) => Some(result),
            AnalysisReport::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisReport::Success(_) => None,
            AnalysisReport::Failure { error } => Some(error),
        }
    }
}

impl From<Result<AnalysisResult, AnalysisError>> for AnalysisReport {
    fn from(outcome: Result<AnalysisResult, AnalysisError>) -> Self {
        match outcome {
            Ok(result) => AnalysisReport::Success(result),
            Err(err) => AnalysisReport::Failure {
                error: err.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct Flagged<'a, T> {
    success: bool,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Serialize for AnalysisReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalysisReport::Success(result) => Flagged {
                success: true,
                body: result,
            }
            .serialize(serializer),
            AnalysisReport::Failure { error } => Flagged {
                success: false,
                body: &ErrorBody {
                    error: error.as_str(),
                },
            }
            .serialize(serializer),
        }
    }
}
