//! Getting audio into memory: fetch, validate, decode, downmix, resample.

pub mod decode;
pub mod fetch;
pub mod resample;
pub mod source;
pub mod validate;

pub use source::AudioSource;

use crate::config::Config;
use crate::error::{AnalysisError, Result};

/// Mono PCM samples at a known rate.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Turns an [`AudioSource`] into a buffer at the analysis sample rate.
pub struct AudioLoader<'a> {
    config: &'a Config,
}

impl<'a> AudioLoader<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn load(&self, source: &AudioSource) -> Result<AudioBuffer> {
        let native = match source {
            AudioSource::Local(path) => {
                validate::check_local_file(path, &self.config.validation)?;
                decode::decode_file(path)?
            }
            AudioSource::Remote(url) => {
                let download = fetch::download(url, &self.config.fetch, &self.config.validation)?;
                decode::decode_file(download.path())?
            }
        };
        self.conform(native)
    }

    /// Resample a decoded buffer to the analysis rate.
    pub fn conform(&self, audio: AudioBuffer) -> Result<AudioBuffer> {
        if audio.is_empty() {
            return Err(AnalysisError::EmptyAudio);
        }

        let target = self.config.analysis.sample_rate;
        if audio.sample_rate == target {
            return Ok(audio);
        }

        log::info!("Resampling {}Hz -> {}Hz", audio.sample_rate, target);
        let samples = resample::resample(&audio.samples, audio.sample_rate, target)?;
        Ok(AudioBuffer::new(samples, target))
    }
}
