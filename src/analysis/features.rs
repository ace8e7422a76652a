use super::frontend::SpectralFrontEnd;
use super::pitch;
use super::report::{FeatureVector, TimbreMatrix};
use crate::audio::AudioBuffer;
use crate::config::AnalysisConfig;
use crate::dsp::{stats, Dct, FrameGrid, Padding, Spectrogram};

/// Magnitudes at or below this count as exact zeros for zero-crossing purposes.
const ZERO_CROSSING_THRESHOLD: f32 = 1e-10;

/// Framewise spectral shape, kept unreduced for complexity scoring.
#[derive(Debug, Clone, Default)]
pub struct SpectralSeries {
    pub centroid: Vec<f32>,
    pub rolloff: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ExtractedFeatures {
    pub summary: FeatureVector,
    pub series: SpectralSeries,
    pub mfccs: TimbreMatrix,
}

pub struct FeatureExtractor<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, buffer: &AudioBuffer, front: &SpectralFrontEnd) -> ExtractedFeatures {
        let grid = self.config.grid();
        let spec = &front.spectrogram;

        let series = SpectralSeries {
            centroid: spectral_centroid(spec),
            rolloff: spectral_rolloff(spec, self.config.roll_percent),
        };
        let energy = rms(&buffer.samples, grid);
        let zcr = zero_crossing_rate(&buffer.samples, grid);
        let mfccs = mfcc(&front.mel_db, self.config.n_mfcc);
        let pitch = pitch::track(
            spec,
            self.config.pitch_fmin,
            self.config.pitch_fmax,
            self.config.pitch_threshold,
        );

        let summary = FeatureVector {
            spectral_centroid_mean: stats::mean(&series.centroid),
            spectral_rolloff_mean: stats::mean(&series.rolloff),
            pitch_mean: pitch.voiced_mean(),
            energy_mean: stats::mean(&energy),
            zcr_mean: stats::mean(&zcr),
        };

        log::debug!(
            "Features: centroid={:.1}Hz rolloff={:.1}Hz pitch={:.1}Hz rms={:.4} zcr={:.4}",
            summary.spectral_centroid_mean,
            summary.spectral_rolloff_mean,
            summary.pitch_mean,
            summary.energy_mean,
            summary.zcr_mean
        );

        ExtractedFeatures {
            summary,
            series,
            mfccs,
        }
    }
}

/// Magnitude-weighted mean frequency of each frame; 0 for silent frames.
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f32> {
    let freqs = spec.bin_frequencies();
    spec.frames
        .iter()
        .map(|mags| {
            let total: f32 = mags.iter().sum();
            if total <= f32::MIN_POSITIVE {
                return 0.0;
            }
            mags.iter().zip(&freqs).map(|(m, f)| m * f).sum::<f32>() / total
        })
        .collect()
}

/// Lowest bin frequency whose cumulative magnitude reaches `roll_percent`
/// of the frame total.
pub fn spectral_rolloff(spec: &Spectrogram, roll_percent: f32) -> Vec<f32> {
    let freqs = spec.bin_frequencies();
    spec.frames
        .iter()
        .map(|mags| {
            let threshold = roll_percent * mags.iter().sum::<f32>();
            let mut cumulative = 0.0f32;
            for (m, f) in mags.iter().zip(&freqs) {
                cumulative += m;
                if cumulative >= threshold {
                    return *f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

pub fn rms(samples: &[f32], grid: FrameGrid) -> Vec<f32> {
    let mut values = Vec::with_capacity(grid.frame_count(samples.len()));
    grid.for_each_frame(samples, Padding::Zero, |_, frame| {
        let power = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
        values.push(power.sqrt());
    });
    values
}

/// Fraction of sign changes per frame. Near-zero samples count as positive.
pub fn zero_crossing_rate(samples: &[f32], grid: FrameGrid) -> Vec<f32> {
    let negative = |x: f32| x.abs() > ZERO_CROSSING_THRESHOLD && x < 0.0;
    let mut values = Vec::with_capacity(grid.frame_count(samples.len()));
    grid.for_each_frame(samples, Padding::Edge, |_, frame| {
        let crossings = frame
            .windows(2)
            .filter(|w| negative(w[0]) != negative(w[1]))
            .count();
        values.push(crossings as f32 / frame.len() as f32);
    });
    values
}

/// Cepstral coefficients from a dB mel spectrogram, coefficient-major.
pub fn mfcc(mel_db: &[Vec<f32>], n_mfcc: usize) -> TimbreMatrix {
    let n_mels = mel_db.first().map_or(0, |frame| frame.len());
    let dct = Dct::new(n_mels, n_mfcc);
    let mut rows = vec![Vec::with_capacity(mel_db.len()); n_mfcc];
    for frame in mel_db {
        for (row, c) in rows.iter_mut().zip(dct.apply(frame)) {
            row.push(c);
        }
    }
    TimbreMatrix(rows)
}
