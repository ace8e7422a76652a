use rustfft::{num_complex::Complex, FftPlanner};

use crate::dsp::stft::{hann_symmetric, hann_window};
use crate::dsp::{stats, FrameGrid};

/// Autocorrelation window of the tempogram, in onset frames (~8.9 s).
const AC_WINDOW: usize = 384;
const START_BPM: f64 = 120.0;
/// Width of the log-normal tempo prior, in octaves.
const STD_BPM: f64 = 1.0;
const MAX_TEMPO: f64 = 320.0;
const TIGHTNESS: f64 = 100.0;
/// Minimum mean normalised autocorrelation at the chosen lag.
const MIN_PERIODICITY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct TempoEstimate {
    /// Global tempo in BPM, 0 when no periodicity was found.
    pub bpm: f64,
    /// Strictly increasing beat positions in onset frames.
    pub beat_frames: Vec<usize>,
}

impl TempoEstimate {
    fn none() -> Self {
        Self {
            bpm: 0.0,
            beat_frames: Vec::new(),
        }
    }
}

/// Global tempo from an autocorrelation tempogram, beats by dynamic programming.
pub struct BeatTracker {
    sample_rate: u32,
    grid: FrameGrid,
    novelty_floor: f32,
}

impl BeatTracker {
    /// Onset values at or below `novelty_floor` are ignored when looking for
    /// a tempo.
    pub fn new(sample_rate: u32, grid: FrameGrid, novelty_floor: f32) -> Self {
        Self {
            sample_rate,
            grid,
            novelty_floor,
        }
    }

    fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.grid.hop_length as f64
    }

    pub fn track(&self, onset_envelope: &[f32]) -> TempoEstimate {
        if !onset_envelope.iter().any(|&v| v > 0.0) {
            log::debug!("Onset envelope is empty; no tempo");
            return TempoEstimate::none();
        }

        let Some(bpm) = self.estimate_tempo(onset_envelope) else {
            log::debug!("No periodicity in onset envelope; no tempo");
            return TempoEstimate::none();
        };

        let beat_frames = self.track_beats(onset_envelope, bpm);
        log::debug!("Tempo {:.1} BPM, {} beats", bpm, beat_frames.len());

        TempoEstimate { bpm, beat_frames }
    }

    pub fn beat_times(&self, beat_frames: &[usize]) -> Vec<f64> {
        beat_frames
            .iter()
            .map(|&f| self.grid.frame_to_time(f, self.sample_rate))
            .collect()
    }

    /// Most likely tempo under a log-normal prior centred on 120 BPM, or
    /// `None` when the envelope has no periodic structure.
    pub fn estimate_tempo(&self, onset_envelope: &[f32]) -> Option<f64> {
        let gated: Vec<f64> = onset_envelope
            .iter()
            .map(|&v| if v > self.novelty_floor { v as f64 } else { 0.0 })
            .collect();
        if gated.iter().all(|&v| v == 0.0) {
            return None;
        }

        let tempogram = mean_tempogram(&gated, AC_WINDOW);
        let frame_rate = self.frame_rate();

        let mut best: Option<(usize, f64)> = None;
        for (lag, &strength) in tempogram.iter().enumerate().skip(1) {
            let bpm = 60.0 * frame_rate / lag as f64;
            if bpm > MAX_TEMPO {
                continue;
            }
            let log_prior = -0.5 * ((bpm.log2() - START_BPM.log2()) / STD_BPM).powi(2);
            let score = (1e6 * strength).ln_1p() + log_prior;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((lag, score));
            }
        }

        let (lag, _) = best?;
        if tempogram[lag] < MIN_PERIODICITY {
            return None;
        }
        Some(60.0 * frame_rate / lag as f64)
    }

    /// Beat frames consistent with `bpm`, trimmed of weak leading and
    /// trailing beats.
    pub fn track_beats(&self, onset_envelope: &[f32], bpm: f64) -> Vec<usize> {
        if bpm <= 0.0 || onset_envelope.len() < 2 {
            return Vec::new();
        }
        let period = (60.0 * self.frame_rate() / bpm).round_ties_even().max(1.0) as usize;

        let local = local_score(onset_envelope, period);
        let (backlink, cumscore) = dynamic_program(&local, period);

        let Some(tail) = last_beat(&cumscore) else {
            return Vec::new();
        };

        let mut beats = vec![tail];
        let mut cursor = backlink[tail];
        while cursor >= 0 {
            beats.push(cursor as usize);
            cursor = backlink[cursor as usize];
        }
        beats.reverse();

        trim_beats(&local, &beats)
    }
}

/// Time-averaged autocorrelation of Hann-windowed slices of the envelope,
/// each slice normalised by its own lag-0 value.
fn mean_tempogram(envelope: &[f64], win: usize) -> Vec<f64> {
    let half = win / 2;
    let padded = linear_ramp_pad(envelope, half);
    let window = hann_window(win);

    let fft_len = (2 * win - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let num_slices = padded.len() + 1 - win;
    let mut sum = vec![0.0f64; win];
    let mut buffer = vec![Complex::new(0.0f64, 0.0); fft_len];

    for start in 0..num_slices {
        let slice = &padded[start..start + win];
        if slice.iter().all(|&v| v == 0.0) {
            continue;
        }

        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = if i < win {
                Complex::new(slice[i] * window[i] as f64, 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
        }
        forward.process(&mut buffer);
        for c in buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        inverse.process(&mut buffer);

        let peak = buffer[..win].iter().map(|c| c.re.abs()).fold(0.0f64, f64::max);
        if peak <= f64::MIN_POSITIVE {
            continue;
        }
        for (acc, c) in sum.iter_mut().zip(&buffer[..win]) {
            *acc += c.re / peak;
        }
    }

    sum.iter().map(|v| v / num_slices as f64).collect()
}

/// Pad both ends with `width` values ramping linearly from 0 to the edge value.
fn linear_ramp_pad(values: &[f64], width: usize) -> Vec<f64> {
    let first = values.first().copied().unwrap_or(0.0);
    let last = values.last().copied().unwrap_or(0.0);
    let mut padded = Vec::with_capacity(values.len() + 2 * width);
    padded.extend((0..width).map(|k| first * k as f64 / width as f64));
    padded.extend_from_slice(values);
    padded.extend((1..=width).map(|k| last * (width - k) as f64 / width as f64));
    padded
}

/// Onset envelope scaled to unit deviation and smoothed with a Gaussian one
/// beat period wide.
fn local_score(onset_envelope: &[f32], period: usize) -> Vec<f64> {
    let values: Vec<f64> = onset_envelope.iter().map(|&v| v as f64).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sample_std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    let normalized: Vec<f64> = values
        .iter()
        .map(|v| v / (sample_std + f64::MIN_POSITIVE))
        .collect();

    let p = period as f64;
    let kernel: Vec<f64> = (-(period as i64)..=period as i64)
        .map(|k| (-0.5 * (k as f64 * 32.0 / p).powi(2)).exp())
        .collect();
    stats::convolve_same(&normalized, &kernel)
}

/// Cumulative beat score and back-pointers. A back-pointer below zero marks
/// the first beat of a chain.
fn dynamic_program(local: &[f64], period: usize) -> (Vec<isize>, Vec<f64>) {
    let p = period as f64;
    let earliest = -2 * period as isize;
    let latest = -((p / 2.0).round_ties_even() as isize);
    let offsets: Vec<isize> = (earliest..=latest).collect();
    let transition: Vec<f64> = offsets
        .iter()
        .map(|&o| -TIGHTNESS * (-(o as f64) / p).ln().powi(2))
        .collect();

    let score_thresh = 0.01 * local.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut backlink = vec![-1isize; local.len()];
    let mut cumscore = vec![0.0f64; local.len()];
    let mut first_beat = true;

    for (i, &score) in local.iter().enumerate() {
        let mut best_idx = 0;
        let mut best_val = f64::NEG_INFINITY;
        for (j, (&offset, &weight)) in offsets.iter().zip(&transition).enumerate() {
            let pos = i as isize + offset;
            let candidate = if pos >= 0 {
                weight + cumscore[pos as usize]
            } else {
                weight
            };
            if candidate > best_val {
                best_val = candidate;
                best_idx = j;
            }
        }

        cumscore[i] = score + best_val;
        if first_beat && score < score_thresh {
            backlink[i] = -1;
        } else {
            backlink[i] = i as isize + offsets[best_idx];
            first_beat = false;
        }
    }

    (backlink, cumscore)
}

/// Last local maximum of the cumulative score that is strong relative to the
/// median of all local maxima.
fn last_beat(cumscore: &[f64]) -> Option<usize> {
    let n = cumscore.len();
    let is_max = |i: usize| {
        let prev = if i == 0 { cumscore[0] } else { cumscore[i - 1] };
        let next = if i + 1 == n { cumscore[i] } else { cumscore[i + 1] };
        cumscore[i] > prev && cumscore[i] >= next
    };

    let maxima: Vec<f64> = (0..n).filter(|&i| is_max(i)).map(|i| cumscore[i]).collect();
    let median = stats::median(&maxima)?;

    (0..n)
        .rev()
        .find(|&i| {
            let value = if is_max(i) { 2.0 * cumscore[i] } else { 0.0 };
            value > median
        })
}

/// Drop weak beats at both ends. The last strong beat goes with them.
fn trim_beats(local: &[f64], beats: &[usize]) -> Vec<usize> {
    let at_beats: Vec<f64> = beats.iter().map(|&b| local[b]).collect();
    let smooth = stats::convolve_same(&at_beats, &hann_symmetric(5));
    let rms = (smooth.iter().map(|v| v * v).sum::<f64>() / smooth.len() as f64).sqrt();
    let threshold = 0.5 * rms;

    let first = smooth.iter().position(|&v| v > threshold);
    let last = smooth.iter().rposition(|&v| v > threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..last].to_vec(),
        _ => Vec::new(),
    }
}
