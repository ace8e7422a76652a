use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Every way a single `analyze()` call can fail.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid URL {0}")]
    InvalidUrl(String),

    #[error("fetching {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("failed to resample audio: {0}")]
    Resample(String),

    #[error("decoded audio contains no samples")]
    EmptyAudio,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal analysis error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::Decode(err.to_string())
    }
}

/// Structural segmentation failures. These never leave the pipeline; the
/// analyzer degrades them to an empty section list.
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("novelty curve has a non-finite value at frame {frame}")]
    NonFiniteNovelty { frame: usize },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
