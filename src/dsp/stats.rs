//! Reductions over feature series. All of them are population statistics
//! and return 0 for empty input.

pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v as f64 - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f32]) -> f64 {
    variance(values).sqrt()
}

/// Median of the finite values, `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    })
}

/// Linear convolution trimmed to the length of `signal`, centered on the
/// full result.
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return vec![0.0; signal.len()];
    }
    let offset = (kernel.len() - 1) / 2;
    (0..signal.len())
        .map(|i| {
            let m = i + offset;
            let lo = m.saturating_sub(signal.len() - 1);
            let hi = m.min(kernel.len() - 1);
            (lo..=hi).map(|j| signal[m - j] * kernel[j]).sum()
        })
        .collect()
}
