use crate::dsp::FrameGrid;

/// Onset strength ("novelty") per frame from a dB mel spectrogram.
///
/// Positive band-wise increases between consecutive frames are averaged over
/// the mel bands. The curve is delayed by one frame for the difference and by
/// `n_fft / (2 * hop)` frames for frame centering, so a value lines up with
/// the frame in which the change becomes audible. The first frames are zero
/// and the curve has one value per spectrogram frame.
pub fn onset_strength(mel_db: &[Vec<f32>], grid: FrameGrid) -> Vec<f32> {
    let num_frames = mel_db.len();
    let mut envelope = vec![0.0f32; num_frames];
    let delay = 1 + grid.n_fft / (2 * grid.hop_length);

    for t in 1..num_frames {
        let target = t - 1 + delay;
        if target >= num_frames {
            break;
        }
        let (prev, cur) = (&mel_db[t - 1], &mel_db[t]);
        if cur.is_empty() {
            continue;
        }
        let rise: f32 = cur
            .iter()
            .zip(prev)
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
        envelope[target] = rise / cur.len() as f32;
    }

    envelope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_spectrogram_has_no_novelty() {
        let mel = vec![vec![-100.0f32; 8]; 20];
        let env = onset_strength(&mel, FrameGrid::new(2048, 512));
        assert_eq!(env.len(), 20);
        assert!(env.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rise_is_averaged_and_delayed() {
        let mut mel = vec![vec![-60.0f32; 4]; 12];
        // frame 5: two of four bands rise by 20 dB and stay up
        for frame in mel.iter_mut().skip(5) {
            frame[0] = -40.0;
            frame[1] = -40.0;
        }
        let env = onset_strength(&mel, FrameGrid::new(2048, 512));
        // diff between frames 4 and 5 lands at 4 + 3
        assert_eq!(env[7], 10.0);
        assert_eq!(env.iter().filter(|&&v| v > 0.0).count(), 1);
    }

    #[test]
    fn decreases_are_rectified() {
        let mut mel = vec![vec![0.0f32; 2]; 10];
        for frame in mel.iter_mut().skip(4) {
            frame[0] = -30.0;
        }
        let env = onset_strength(&mel, FrameGrid::new(2048, 512));
        assert!(env.iter().all(|&v| v == 0.0));
    }
}
