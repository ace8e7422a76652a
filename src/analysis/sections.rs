use super::report::{Section, SectionKind};
use crate::dsp::{stats, FrameGrid};
use crate::error::SegmentationError;

/// Structural boundaries at the prominent peaks of the novelty curve.
///
/// A peak must be a strict local maximum whose height reaches the curve's
/// mean and rises above `floor`. Kinds are assigned by position in the list
/// only.
pub fn segment(
    novelty: &[f32],
    sample_rate: u32,
    grid: FrameGrid,
    floor: f32,
) -> Result<Vec<Section>, SegmentationError> {
    if let Some(frame) = novelty.iter().position(|v| !v.is_finite()) {
        return Err(SegmentationError::NonFiniteNovelty { frame });
    }

    let threshold = stats::mean(novelty);
    let peaks: Vec<usize> = local_maxima(novelty)
        .into_iter()
        .filter(|&i| novelty[i] as f64 >= threshold && novelty[i] > floor)
        .collect();

    let total = peaks.len();
    let sections = peaks
        .iter()
        .enumerate()
        .map(|(index, &frame)| Section {
            start_time: grid.frame_to_time(frame, sample_rate),
            kind: classify(index, total),
            confidence: novelty[frame] as f64,
        })
        .collect();

    Ok(sections)
}

/// First match wins, so a lone peak is an intro.
pub fn classify(index: usize, total: usize) -> SectionKind {
    if index == 0 {
        SectionKind::Intro
    } else if index + 1 == total {
        SectionKind::Outro
    } else if index % 4 == 0 {
        SectionKind::Chorus
    } else {
        SectionKind::Verse
    }
}

/// Indices of strict local maxima. Flat peaks report their (left-biased)
/// midpoint; the first and last samples are never peaks.
fn local_maxima(x: &[f32]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> FrameGrid {
        FrameGrid::new(2048, 512)
    }

    #[test]
    fn finds_strict_and_flat_peaks() {
        let x = [0.0, 1.0, 0.0, 2.0, 2.0, 2.0, 0.0, 3.0, 3.0];
        // the trailing plateau touches the end and is not a peak
        assert_eq!(local_maxima(&x), vec![1, 4]);
        assert!(local_maxima(&[5.0, 1.0]).is_empty());
    }

    #[test]
    fn flat_curve_has_no_sections() {
        let sections = segment(&[0.0; 200], 22050, grid(), 0.1).unwrap();
        assert!(sections.is_empty());
    }

    #[test]
    fn peaks_below_mean_are_dropped() {
        let mut novelty = vec![0.0f32; 40];
        novelty[10] = 10.0;
        novelty[20] = 0.1;
        novelty[30] = 8.0;
        let sections = segment(&novelty, 22050, grid(), 0.1).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].confidence, 10.0);
        assert!((sections[1].start_time - 30.0 * 512.0 / 22050.0).abs() < 1e-12);
    }

    #[test]
    fn ripple_below_floor_is_not_a_section() {
        let novelty: Vec<f32> = (0..100).map(|i| if i % 3 == 0 { 0.02 } else { 0.01 }).collect();
        assert!(segment(&novelty, 22050, grid(), 0.1).unwrap().is_empty());

        // without a floor every maximum above the mean counts
        let sections = segment(&novelty, 22050, grid(), 0.0).unwrap();
        assert_eq!(sections.len(), 32);
    }

    #[test]
    fn single_peak_is_intro() {
        let mut novelty = vec![0.0f32; 10];
        novelty[5] = 1.0;
        let sections = segment(&novelty, 22050, grid(), 0.1).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Intro);
    }

    #[test]
    fn kinds_follow_ordinal_rule() {
        let kinds: Vec<SectionKind> = (0..9).map(|i| classify(i, 9)).collect();
        use SectionKind::*;
        assert_eq!(
            kinds,
            vec![Intro, Verse, Verse, Verse, Chorus, Verse, Verse, Verse, Outro]
        );
        assert_eq!(classify(1, 2), Outro);
    }

    #[test]
    fn sections_are_ordered() {
        let novelty: Vec<f32> = (0..300).map(|i| if i % 37 == 5 { 2.0 } else { 0.0 }).collect();
        let sections = segment(&novelty, 22050, grid(), 0.1).unwrap();
        assert_eq!(sections.len(), 8);
        assert!(sections.windows(2).all(|w| w[0].start_time < w[1].start_time));
        assert_eq!(sections.last().unwrap().kind, SectionKind::Outro);
    }

    #[test]
    fn nan_novelty_is_an_error() {
        let novelty = [0.0, 1.0, f32::NAN, 0.0];
        assert!(matches!(
            segment(&novelty, 22050, grid(), 0.1),
            Err(SegmentationError::NonFiniteNovelty { frame: 2 })
        ));
    }
}
