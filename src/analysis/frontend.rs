use crate::audio::AudioBuffer;
use crate::config::AnalysisConfig;
use crate::dsp::{power_to_db, MelFilterBank, Spectrogram};

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// Spectral representations computed once per analysis and shared by the
/// feature extractor, the tempo tracker and the segmenter.
pub struct SpectralFrontEnd {
    /// Magnitude STFT.
    pub spectrogram: Spectrogram,
    /// Mel power spectrogram in dB, one row of `n_mels` values per frame.
    pub mel_db: Vec<Vec<f32>>,
}

impl SpectralFrontEnd {
    pub fn compute(buffer: &AudioBuffer, config: &AnalysisConfig) -> Self {
        let grid = config.grid();
        let spectrogram = Spectrogram::compute(&buffer.samples, buffer.sample_rate, grid);

        let bank = MelFilterBank::new(
            config.n_mels,
            buffer.sample_rate,
            grid.n_fft,
            0.0,
            buffer.sample_rate as f64 / 2.0,
        );
        let mut mel_db: Vec<Vec<f32>> = spectrogram
            .power()
            .iter()
            .map(|frame| bank.apply(frame))
            .collect();
        power_to_db(&mut mel_db, AMIN, TOP_DB);

        Self {
            spectrogram,
            mel_db,
        }
    }
}
