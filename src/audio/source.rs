use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Where the audio to analyze comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Local(PathBuf),
    Remote(Url),
}

impl AudioSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::Remote(_))
    }
}

impl FromStr for AudioSource {
    type Err = AnalysisError;

    /// Strings with an `http://` or `https://` scheme are remote, anything
    /// else is a filesystem path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Url::parse(s.trim())
                .map(AudioSource::Remote)
                .map_err(|e| AnalysisError::InvalidUrl(format!("{}: {}", s, e)))
        } else {
            Ok(AudioSource::Local(PathBuf::from(s)))
        }
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        AudioSource::Local(path)
    }
}

impl From<Url> for AudioSource {
    fn from(url: Url) -> Self {
        AudioSource::Remote(url)
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Local(path) => write!(f, "{}", path.display()),
            AudioSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_remote() {
        let source: AudioSource = "https://cdn.example.com/track.mp3".parse().unwrap();
        assert!(source.is_remote());
        let source: AudioSource = "HTTP://example.com/a.wav".parse().unwrap();
        assert!(source.is_remote());
    }

    #[test]
    fn everything_else_is_local() {
        let source: AudioSource = "music/httpd-live.wav".parse().unwrap();
        assert_eq!(source, AudioSource::Local(PathBuf::from("music/httpd-live.wav")));
        let source: AudioSource = "httpfile.wav".parse().unwrap();
        assert!(!source.is_remote());
    }

    #[test]
    fn malformed_url_is_rejected() {
        let err = "http://".parse::<AudioSource>().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidUrl(_)));
    }
}
