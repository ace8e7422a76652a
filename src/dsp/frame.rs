/// How samples outside the signal are filled when frames are centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    Zero,
    /// Repeat the first/last sample.
    Edge,
}

/// Frame size and hop shared by all spectral computations.
///
/// Frames are centered: frame `t` covers samples
/// `[t * hop - n_fft / 2, t * hop + n_fft / 2)`, so a signal of `len` samples
/// yields `1 + len / hop` frames and every feature computed on the same grid
/// is time-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGrid {
    pub n_fft: usize,
    pub hop_length: usize,
}

impl FrameGrid {
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        debug_assert!(hop_length > 0 && hop_length <= n_fft);
        Self { n_fft, hop_length }
    }

    pub fn frame_count(&self, num_samples: usize) -> usize {
        1 + num_samples / self.hop_length
    }

    pub fn frame_to_time(&self, frame: usize, sample_rate: u32) -> f64 {
        (frame * self.hop_length) as f64 / sample_rate as f64
    }

    /// Number of positive-frequency bins of one frame's spectrum.
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Call `f(index, frame)` for every centered frame of `samples`.
    pub fn for_each_frame<F>(&self, samples: &[f32], padding: Padding, mut f: F)
    where
        F: FnMut(usize, &[f32]),
    {
        let half = (self.n_fft / 2) as isize;
        let len = samples.len() as isize;
        let mut buf = vec![0.0f32; self.n_fft];

        for t in 0..self.frame_count(samples.len()) {
            let start = (t * self.hop_length) as isize - half;
            for (i, slot) in buf.iter_mut().enumerate() {
                let idx = start + i as isize;
                *slot = if idx >= 0 && idx < len {
                    samples[idx as usize]
                } else if len == 0 {
                    0.0
                } else {
                    match padding {
                        Padding::Zero => 0.0,
                        Padding::Edge if idx < 0 => samples[0],
                        Padding::Edge => samples[(len - 1) as usize],
                    }
                };
            }
            f(t, &buf);
        }
    }
}
