use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

use crate::error::{AnalysisError, Result};

const SINC_LEN: usize = 256;

/// Resample mono f32 audio from `from_rate` to `to_rate` using rubato.
///
/// The whole signal is processed as one chunk. The input is zero-padded by one
/// filter length so the filter delay can be dropped from the front without
/// losing the tail; the output is trimmed to `ceil(len * ratio)` samples.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).ceil() as usize;

    let mut input = samples.to_vec();
    input.resize(samples.len() + SINC_LEN, 0.0);

    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        2.0, // max relative ratio
        params,
        input.len(),
        1, // mono
    )
    .map_err(|e| AnalysisError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let output = resampler
        .process(&[input], None)
        .map_err(|e| AnalysisError::Resample(e.to_string()))?;

    let resampled: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(expected)
        .collect();

    log::debug!(
        "Resampled {} -> {} samples ({}Hz -> {}Hz)",
        samples.len(),
        resampled.len(),
        from_rate,
        to_rate
    );

    Ok(resampled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_passthrough() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&samples, 22050, 22050).unwrap(), samples);
    }

    #[test]
    fn halving_rate_halves_length() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let out = resample(&samples, 44100, 22050).unwrap();
        assert!((out.len() as i64 - 22050).abs() <= 2, "got {}", out.len());

        let rms = (out[1000..21000].iter().map(|s| s * s).sum::<f32>() / 20000.0).sqrt();
        assert!((rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05);
    }
}
