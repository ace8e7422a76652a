//! The analysis pipeline: spectral features, tempo and beats, genre,
//! complexity and sections, combined into one report per source.

pub mod complexity;
pub mod features;
pub mod frontend;
pub mod genre;
pub mod onset;
pub mod pitch;
pub mod report;
pub mod sections;
pub mod tempo;

use std::panic::{self, AssertUnwindSafe};

use crate::audio::{AudioBuffer, AudioLoader, AudioSource};
use crate::config::{Config, ConfigError};
use crate::error::{AnalysisError, Result};
use features::FeatureExtractor;
use frontend::SpectralFrontEnd;
use report::{AnalysisReport, AnalysisResult};
use tempo::BeatTracker;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Runs the full pipeline for one source at a time. Holds only read-only,
/// validated configuration, so one instance can serve many threads.
pub struct Analyzer {
    config: Config,
}

impl Analyzer {
    /// Fails when `config` breaks an invariant the pipeline relies on
    /// (framing grid, MFCC count, novelty floor, ...).
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze `source`, never failing: errors and panics become a
    /// [`AnalysisReport::Failure`].
    pub fn analyze(&self, source: &AudioSource) -> AnalysisReport {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_analyze(source)))
            .unwrap_or_else(|payload| Err(AnalysisError::Internal(panic_message(payload.as_ref()))));

        if let Err(ref err) = outcome {
            log::error!("Analysis of {} failed: {}", source, err);
        }
        outcome.into()
    }

    pub fn try_analyze(&self, source: &AudioSource) -> Result<AnalysisResult> {
        log::info!("Loading {}", source);
        let buffer = AudioLoader::new(&self.config).load(source)?;
        log::info!(
            "Loaded {:.2}s at {}Hz",
            buffer.duration(),
            buffer.sample_rate
        );
        Ok(self.analyze_buffer(&buffer))
    }

    /// Pipeline stages after loading. `buffer` must already be at the
    /// configured sample rate.
    pub fn analyze_buffer(&self, buffer: &AudioBuffer) -> AnalysisResult {
        let cfg = &self.config.analysis;
        let grid = cfg.grid();

        log::info!("Computing spectral features...");
        let front = SpectralFrontEnd::compute(buffer, cfg);
        let features = FeatureExtractor::new(cfg).extract(buffer, &front);

        log::info!("Tracking tempo and beats...");
        let novelty = onset::onset_strength(&front.mel_db, grid);
        let tracker = BeatTracker::new(buffer.sample_rate, grid, cfg.novelty_floor);
        let estimate = tracker.track(&novelty);
        let beats = tracker.beat_times(&estimate.beat_frames);

        let genre = genre::classify(estimate.bpm, features.summary.spectral_centroid_mean);
        let complexity = complexity::score(
            &features.series.centroid,
            &features.series.rolloff,
            &features.mfccs,
        );

        log::info!("Segmenting sections...");
        let sections = match sections::segment(&novelty, buffer.sample_rate, grid, cfg.novelty_floor) {
            Ok(sections) => sections,
            Err(err) => {
                log::warn!("Section segmentation failed, reporting none: {}", err);
                Vec::new()
            }
        };

        log::info!(
            "Tempo {:.1} BPM, {} beats, genre {}, complexity {:.3}, {} sections",
            estimate.bpm,
            beats.len(),
            genre,
            complexity,
            sections.len()
        );

        AnalysisResult {
            duration: buffer.duration(),
            tempo: estimate.bpm,
            key_features: features.summary,
            mfccs: features.mfccs,
            genre,
            complexity,
            sections,
            beats,
            analysis_timestamp: chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Analyze a path or URL with the default configuration.
pub fn analyze_source(source: &str) -> AnalysisReport {
    let prepared = Analyzer::new(Config::default())
        .map_err(AnalysisError::from)
        .and_then(|analyzer| Ok((analyzer, source.parse::<AudioSource>()?)));
    match prepared {
        Ok((analyzer, source)) => analyzer.analyze(&source),
        Err(err) => AnalysisReport::Failure {
            error: err.to_string(),
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "analysis panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn default_analyzer() -> Analyzer {
        Analyzer::new(Config::default()).unwrap()
    }

    #[test]
    fn invalid_grid_is_rejected_at_construction() {
        let mut config = Config::default();
        config.analysis.hop_length = 0;
        assert!(matches!(Analyzer::new(config), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.analysis.n_mfcc = 200;
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn construction_keeps_config() {
        let mut config = Config::default();
        config.analysis.novelty_floor = 0.0;
        let analyzer = Analyzer::new(config).unwrap();
        assert_eq!(analyzer.config().analysis.novelty_floor, 0.0);
        assert_eq!(analyzer.config().analysis.sample_rate, 22050);
    }

    #[test]
    fn missing_file_is_a_failure_report() {
        let source = AudioSource::Local(PathBuf::from("/nonexistent/track.wav"));
        let report = default_analyzer().analyze(&source);
        assert!(!report.is_success());
        assert!(report.error().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn malformed_url_is_a_failure_report() {
        let report = analyze_source("http://exa mple.com/a.wav");
        assert!(report.result().is_none());
        assert!(report.error().is_some_and(|e| e.contains("invalid URL")));
    }

    #[test]
    fn silent_buffer_degrades_to_zeros() {
        let analyzer = default_analyzer();
        let buffer = AudioBuffer::new(vec![0.0; 22050 * 3], 22050);
        let result = analyzer.analyze_buffer(&buffer);

        assert_eq!(result.duration, 3.0);
        assert_eq!(result.tempo, 0.0);
        assert!(result.beats.is_empty());
        assert!(result.sections.is_empty());
        assert_eq!(result.complexity, 0.0);
        assert_eq!(result.key_features.pitch_mean, 0.0);
        assert_eq!(result.genre, genre::Genre::ClassicalAmbient);
        assert_eq!(result.mfccs.num_coefficients(), 13);
    }

    #[test]
    fn timestamp_has_no_zone_suffix() {
        let analyzer = default_analyzer();
        let buffer = AudioBuffer::new(vec![0.0; 4096], 22050);
        let stamp = analyzer.analyze_buffer(&buffer).analysis_timestamp;
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "analysis panicked");
    }
}
