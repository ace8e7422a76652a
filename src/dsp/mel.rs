//! Mel filterbank, decibel scaling and the DCT used for cepstral coefficients.

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// One triangular filter, stored as its non-zero run of bins.
#[derive(Debug, Clone)]
struct MelFilter {
    start_bin: usize,
    weights: Vec<f32>,
}

/// Area-normalised triangular filters spaced evenly on the mel scale.
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
}

impl MelFilterBank {
    pub fn new(n_mels: usize, sample_rate: u32, n_fft: usize, fmin: f64, fmax: f64) -> Self {
        let num_bins = n_fft / 2 + 1;
        let fft_freqs: Vec<f64> = (0..num_bins)
            .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
            .collect();

        let min_mel = hz_to_mel(fmin);
        let max_mel = hz_to_mel(fmax);
        let mel_f: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (left, center, right) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
                let enorm = 2.0 / (right - left);
                let weights: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - left) / (center - left);
                        let upper = (right - f) / (right - center);
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect();

                match weights.iter().position(|&w| w > 0.0) {
                    Some(start) => {
                        let end = weights.iter().rposition(|&w| w > 0.0).unwrap_or(start);
                        MelFilter {
                            start_bin: start,
                            weights: weights[start..=end].iter().map(|&w| w as f32).collect(),
                        }
                    }
                    None => MelFilter {
                        start_bin: 0,
                        weights: Vec::new(),
                    },
                }
            })
            .collect();

        Self { filters }
    }

    pub fn num_mels(&self) -> usize {
        self.filters.len()
    }

    /// Project one power-spectrum frame onto the mel bands.
    pub fn apply(&self, power_frame: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .weights
                    .iter()
                    .zip(&power_frame[filter.start_bin..])
                    .map(|(w, p)| w * p)
                    .sum()
            })
            .collect()
    }
}

/// Convert power values to decibels in place: `10 * log10(max(amin, x))`,
/// floored at `max - top_db` over the whole matrix.
pub fn power_to_db(frames: &mut [Vec<f32>], amin: f32, top_db: f32) {
    let mut max_db = f32::NEG_INFINITY;
    for frame in frames.iter_mut() {
        for v in frame.iter_mut() {
            *v = 10.0 * v.max(amin).log10();
            max_db = max_db.max(*v);
        }
    }
    let floor = max_db - top_db;
    for frame in frames.iter_mut() {
        for v in frame.iter_mut() {
            *v = v.max(floor);
        }
    }
}

/// Orthonormal DCT-II truncated to the first `n_out` coefficients.
#[derive(Debug, Clone)]
pub struct Dct {
    basis: Vec<Vec<f32>>,
}

impl Dct {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        let n = n_in as f64;
        let basis = (0..n_out)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_in)
                    .map(|i| {
                        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
                        (scale * angle.cos()) as f32
                    })
                    .collect()
            })
            .collect();
        Self { basis }
    }

    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        self.basis
            .iter()
            .map(|row| row.iter().zip(input).map(|(b, x)| b * x).sum())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_scale_round_trips_across_the_knee() {
        for hz in [0.0, 440.0, 999.0, 1000.0, 4000.0, 11025.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn filters_cover_increasing_bins() {
        let bank = MelFilterBank::new(40, 22050, 2048, 0.0, 11025.0);
        assert_eq!(bank.num_mels(), 40);
        let starts: Vec<usize> = bank.filters.iter().map(|f| f.start_bin).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
        assert!(bank.filters.iter().all(|f| !f.weights.is_empty()));
    }

    #[test]
    fn white_spectrum_gives_positive_bands() {
        let bank = MelFilterBank::new(128, 22050, 2048, 0.0, 11025.0);
        let bands = bank.apply(&vec![1.0; 1025]);
        assert_eq!(bands.len(), 128);
        assert!(bands.iter().skip(8).all(|&b| b > 0.0));
    }

    #[test]
    fn db_floor_is_relative_to_peak() {
        let mut frames = vec![vec![1.0, 1e-12], vec![0.0, 100.0]];
        power_to_db(&mut frames, 1e-10, 80.0);
        assert!((frames[0][0] - 0.0).abs() < 1e-6);
        assert!((frames[1][1] - 20.0).abs() < 1e-4);
        assert!((frames[0][1] - -60.0).abs() < 1e-4);
        assert!((frames[1][0] - -60.0).abs() < 1e-4);
    }

    #[test]
    fn dct_of_constant_has_only_dc() {
        let dct = Dct::new(16, 4);
        let out = dct.apply(&vec![2.0; 16]);
        assert!((out[0] - 2.0 * 16f32.sqrt()).abs() < 1e-4);
        for c in &out[1..] {
            assert!(c.abs() < 1e-4);
        }
    }
}
