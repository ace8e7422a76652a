use super::report::TimbreMatrix;
use crate::dsp::stats;

/// Empirical divisor bringing MFCC variance into the range of the two
/// coefficients of variation.
const MFCC_VARIANCE_SCALE: f64 = 1000.0;

/// Musical complexity in [0, 1]: the mean of the spectral centroid's and
/// rolloff's coefficients of variation and the scaled mean MFCC variance.
pub fn score(centroid: &[f32], rolloff: &[f32], mfcc: &TimbreMatrix) -> f64 {
    let mfcc_variance = if mfcc.num_coefficients() == 0 {
        0.0
    } else {
        mfcc.rows().iter().map(|row| stats::variance(row)).sum::<f64>()
            / mfcc.num_coefficients() as f64
    };

    let raw = (coefficient_of_variation(centroid)
        + coefficient_of_variation(rolloff)
        + mfcc_variance / MFCC_VARIANCE_SCALE)
        / 3.0;

    if !raw.is_finite() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

/// `std / mean`, or 0 for a series whose mean is zero (silence).
fn coefficient_of_variation(values: &[f32]) -> f64 {
    let mean = stats::mean(values);
    if mean == 0.0 {
        return 0.0;
    }
    stats::std_dev(values) / mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_series_have_zero_complexity() {
        let mfcc = TimbreMatrix(vec![vec![-100.0; 10]; 13]);
        assert_eq!(score(&[1000.0; 10], &[2000.0; 10], &mfcc), 0.0);
    }

    #[test]
    fn silence_does_not_produce_nan() {
        let mfcc = TimbreMatrix(vec![vec![0.0; 5]; 13]);
        let value = score(&[0.0; 5], &[0.0; 5], &mfcc);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn averages_three_terms() {
        // cv(centroid) = 0.5, cv(rolloff) = 0, mfcc variance 300 -> 0.3
        let centroid = [500.0, 1500.0];
        let rolloff = [4000.0, 4000.0];
        let mfcc = TimbreMatrix(vec![vec![0.0, 20.0 * 3f32.sqrt()]; 13]);
        let value = score(&centroid, &rolloff, &mfcc);
        assert!((value - (0.5 + 0.0 + 0.3) / 3.0).abs() < 1e-6, "got {}", value);
    }

    #[test]
    fn result_is_clamped_to_one() {
        let mfcc = TimbreMatrix(vec![vec![-1000.0, 1000.0]; 13]);
        assert_eq!(score(&[1.0, 100.0], &[1.0, 100.0], &mfcc), 1.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(score(&[], &[], &TimbreMatrix(Vec::new())), 0.0);
    }
}
