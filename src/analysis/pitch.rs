use crate::dsp::Spectrogram;

/// One spectral peak accepted as a pitch candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCandidate {
    pub frequency: f32,
    pub magnitude: f32,
}

/// Per-frame pitch candidates found by parabolic peak picking.
#[derive(Debug, Clone, Default)]
pub struct PitchTrack {
    pub frames: Vec<Vec<PitchCandidate>>,
}

impl PitchTrack {
    /// Mean frequency of every voiced candidate, or 0 when nothing is voiced.
    pub fn voiced_mean(&self) -> f64 {
        let (sum, count) = self
            .frames
            .iter()
            .flatten()
            .filter(|c| c.frequency > 0.0)
            .fold((0.0f64, 0usize), |(sum, n), c| (sum + c.frequency as f64, n + 1));

        if count == 0 {
            log::debug!("No voiced pitch frames; pitch_mean defaults to 0");
            return 0.0;
        }
        sum / count as f64
    }
}

/// Pick pitch candidates from each frame of a magnitude spectrogram.
///
/// A bin is a candidate when its frequency lies in `[fmin, fmax)`, its
/// magnitude exceeds `threshold` times the frame maximum, and it is a local
/// maximum across frequency. The frequency is refined by fitting a parabola
/// through the bin and its two neighbours.
pub fn track(spec: &Spectrogram, fmin: f32, fmax: f32, threshold: f32) -> PitchTrack {
    let fmax = fmax.min(spec.sample_rate as f32 / 2.0);
    let freqs = spec.bin_frequencies();
    let bin_hz = spec.sample_rate as f32 / spec.n_fft as f32;

    let frames = spec
        .frames
        .iter()
        .map(|mags| {
            let n = mags.len();
            let ref_value = threshold * mags.iter().copied().fold(0.0f32, f32::max);
            let gated = |i: usize| if mags[i] > ref_value { mags[i] } else { 0.0 };

            (0..n)
                .filter(|&i| freqs[i] >= fmin && freqs[i] < fmax)
                .filter(|&i| {
                    let here = gated(i);
                    let prev = gated(i.saturating_sub(1));
                    let next = gated((i + 1).min(n - 1));
                    here > prev && here >= next
                })
                .map(|i| {
                    let shift = parabolic_shift(mags, i);
                    let slope = if i == 0 || i == n - 1 {
                        0.0
                    } else {
                        0.5 * (mags[i + 1] - mags[i - 1])
                    };
                    PitchCandidate {
                        frequency: (i as f32 + shift) * bin_hz,
                        magnitude: mags[i] + 0.5 * slope * shift,
                    }
                })
                .collect()
        })
        .collect();

    PitchTrack { frames }
}

/// Offset of the parabola vertex through bins `i - 1, i, i + 1`, in bins.
fn parabolic_shift(mags: &[f32], i: usize) -> f32 {
    if i == 0 || i + 1 >= mags.len() {
        return 0.0;
    }
    let curvature = mags[i + 1] + mags[i - 1] - 2.0 * mags[i];
    let slope = 0.5 * (mags[i + 1] - mags[i - 1]);
    if slope.abs() < curvature.abs() {
        -slope / curvature
    } else {
        0.0
    }
}
