use rustfft::{num_complex::Complex, FftPlanner};

use super::frame::{FrameGrid, Padding};

/// Magnitude spectrogram, one `Vec` of `n_fft / 2 + 1` bins per frame.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub n_fft: usize,
}

impl Spectrogram {
    pub fn compute(samples: &[f32], sample_rate: u32, grid: FrameGrid) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(grid.n_fft);
        let window = hann_window(grid.n_fft);
        let num_bins = grid.num_bins();

        let mut frames = Vec::with_capacity(grid.frame_count(samples.len()));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); grid.n_fft];

        grid.for_each_frame(samples, Padding::Zero, |_, frame| {
            for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(&window) {
                *slot = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);
            frames.push(buffer[..num_bins].iter().map(|c| c.norm()).collect());
        });

        log::debug!(
            "STFT: {} frames x {} bins (n_fft={}, hop={})",
            frames.len(),
            num_bins,
            grid.n_fft,
            grid.hop_length
        );

        Self {
            frames,
            sample_rate,
            n_fft: grid.n_fft,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Center frequency in Hz of every bin.
    pub fn bin_frequencies(&self) -> Vec<f32> {
        let num_bins = self.n_fft / 2 + 1;
        (0..num_bins)
            .map(|k| k as f32 * self.sample_rate as f32 / self.n_fft as f32)
            .collect()
    }

    /// Squared magnitudes, frame by frame.
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|m| m * m).collect())
            .collect()
    }
}

/// Periodic Hann window, as used for spectral analysis.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Symmetric Hann window, as used for smoothing kernels.
pub fn hann_symmetric(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: u32, secs: f32) -> Vec<f32> {
        let n = (sr as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn periodic_hann_starts_at_zero_and_peaks_mid_frame() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[2] - w[6]).abs() < 1e-6);
    }

    #[test]
    fn symmetric_hann_five_taps() {
        let w = hann_symmetric(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
        for (a, b) in w.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn sine_energy_lands_in_expected_bin() {
        let sr = 22050;
        let spec = Spectrogram::compute(&sine(1000.0, sr, 1.0), sr, FrameGrid::new(2048, 512));
        assert_eq!(spec.num_frames(), 1 + 22050 / 512);

        let middle = &spec.frames[spec.num_frames() / 2];
        let peak_bin = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let freqs = spec.bin_frequencies();
        assert!((freqs[peak_bin] - 1000.0).abs() < sr as f32 / 2048.0);
    }
}
