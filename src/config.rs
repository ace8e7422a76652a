use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dsp::frame::FrameGrid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Signal-processing parameters shared by every stage of one analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_n_mels")]
    pub n_mels: usize,
    #[serde(default = "default_n_mfcc")]
    pub n_mfcc: usize,
    #[serde(default = "default_roll_percent")]
    pub roll_percent: f32,
    #[serde(default = "default_pitch_fmin")]
    pub pitch_fmin: f32,
    #[serde(default = "default_pitch_fmax")]
    pub pitch_fmax: f32,
    #[serde(default = "default_pitch_threshold")]
    pub pitch_threshold: f32,
    /// Onset strength (mean dB rise) at or below which novelty is treated as
    /// steady-state ripple. 0 keeps every local maximum above the mean.
    #[serde(default = "default_novelty_floor")]
    pub novelty_floor: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory for downloaded audio; the system temp dir when unset.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            n_fft: default_n_fft(),
            hop_length: default_hop_length(),
            n_mels: default_n_mels(),
            n_mfcc: default_n_mfcc(),
            roll_percent: default_roll_percent(),
            pitch_fmin: default_pitch_fmin(),
            pitch_fmax: default_pitch_fmax(),
            pitch_threshold: default_pitch_threshold(),
            novelty_floor: default_novelty_floor(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            temp_dir: None,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            extensions: default_extensions(),
        }
    }
}

fn default_sample_rate() -> u32 { 22050 }
fn default_n_fft() -> usize { 2048 }
fn default_hop_length() -> usize { 512 }
fn default_n_mels() -> usize { 128 }
fn default_n_mfcc() -> usize { 13 }
fn default_roll_percent() -> f32 { 0.85 }
fn default_pitch_fmin() -> f32 { 150.0 }
fn default_pitch_fmax() -> f32 { 4000.0 }
fn default_pitch_threshold() -> f32 { 0.1 }
fn default_novelty_floor() -> f32 { 0.1 }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_file_size_mb() -> u64 { 50 }
fn default_extensions() -> Vec<String> {
    ["mp3", "wav", "m4a", "flac", "ogg"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl AnalysisConfig {
    pub fn grid(&self) -> FrameGrid {
        FrameGrid::new(self.n_fft, self.hop_length)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ValidationConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl Config {
    /// Check the invariants every component relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }
        if a.n_fft < 2 {
            return Err(ConfigError::Invalid("n_fft must be at least 2".into()));
        }
        if a.hop_length == 0 || a.hop_length > a.n_fft {
            return Err(ConfigError::Invalid(format!(
                "hop_length must be in 1..={} (got {})",
                a.n_fft, a.hop_length
            )));
        }
        if a.n_mfcc == 0 || a.n_mfcc > a.n_mels {
            return Err(ConfigError::Invalid(format!(
                "n_mfcc must be in 1..={} (got {})",
                a.n_mels, a.n_mfcc
            )));
        }
        if !(0.0..=1.0).contains(&a.roll_percent) {
            return Err(ConfigError::Invalid("roll_percent must be within [0, 1]".into()));
        }
        if a.pitch_fmin >= a.pitch_fmax {
            return Err(ConfigError::Invalid("pitch_fmin must be below pitch_fmax".into()));
        }
        if !a.novelty_floor.is_finite() || a.novelty_floor < 0.0 {
            return Err(ConfigError::Invalid("novelty_floor must be finite and non-negative".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch timeout must be positive".into()));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_engine_constants() {
        let config = Config::default();
        assert_eq!(config.analysis.sample_rate, 22050);
        assert_eq!(config.analysis.n_fft, 2048);
        assert_eq!(config.analysis.hop_length, 512);
        assert_eq!(config.analysis.n_mfcc, 13);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert_eq!(config.validation.max_file_size_bytes(), 50 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nhop_length = 256\n\n[fetch]\ntimeout_secs = 5").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.analysis.hop_length, 256);
        assert_eq!(config.analysis.n_fft, 2048);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert!(config.validation.accepts_extension("WAV"));
    }

    #[test]
    fn hop_larger_than_frame_is_rejected() {
        let mut config = Config::default();
        config.analysis.hop_length = 4096;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_hop_is_rejected() {
        let mut config = Config::default();
        config.analysis.hop_length = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn huge_size_limit_saturates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nmax_file_size_mb = {}", u64::MAX / 1024).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.validation.max_file_size_bytes(), u64::MAX);
        assert!(crate::audio::validate::check_size(u64::MAX - 1, &config.validation).is_ok());
    }

    #[test]
    fn novelty_floor_is_configurable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nnovelty_floor = 0.0").unwrap();
        assert_eq!(load_config(file.path()).unwrap().analysis.novelty_floor, 0.0);

        let mut config = Config::default();
        assert_eq!(config.analysis.novelty_floor, 0.1);
        config.analysis.novelty_floor = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis\nsample_rate = ").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
