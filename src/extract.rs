//! Windowed per-transition point extraction.
//!
//! Given one scan's m/z and intensity arrays, [`extract_point`] produces one
//! (intensity, relative mass error) sample for one transition. The mass
//! error is an intensity-weighted mean of `mz - target_mz` maintained
//! online, so the window is traversed exactly once.

use crate::request::ChromExtractor;

/// One scan's contribution to one transition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExtractedPoint {
    /// Extracted intensity: the window sum (`Summed`) or the highest single
    /// intensity in the window (`BasePeak`).
    pub intensity: f64,
    /// Mass error relative to the target m/z, dimensionless. Zero when the
    /// transition has no target m/z.
    pub mass_error: f64,
}

/// Online intensity-weighted mean of m/z deltas.
///
/// Maintains a running total weight and the weighted mean of observed
/// deltas using the incremental update
/// `mean += (delta - mean) * weight / total`, valid once `total > 0`.
/// Keeping this separate from the extraction loop makes the `Summed` and
/// `BasePeak` branches testable in isolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanErrorAccumulator {
    mean: f64,
    total: f64,
}

impl MeanErrorAccumulator {
    /// Fold one observation into the running mean, adding its weight to the
    /// total.
    pub fn accumulate(&mut self, delta: f64, weight: f64) {
        self.total += weight;
        self.update(delta, weight);
    }

    /// Discard all prior observations and restart from this one. With the
    /// total equal to the new weight, the update collapses the mean to
    /// exactly `delta`.
    pub fn replace(&mut self, delta: f64, weight: f64) {
        self.total = weight;
        self.mean = 0.0;
        self.update(delta, weight);
    }

    fn update(&mut self, delta: f64, weight: f64) {
        if self.total > 0.0 {
            self.mean += (delta - self.mean) * weight / self.total;
        }
    }

    /// The accumulated total weight.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// The current weighted mean delta. Zero until any weight has been seen.
    pub fn mean(&self) -> f64 {
        self.mean
    }
}

/// Extract one (intensity, relative mass error) sample from a scan.
///
/// `mzs` must be ascending; `intensities` is parallel to it. When
/// `target_mz` is zero the whole spectrum is scanned, `mz_window` is
/// ignored and the reported mass error is always zero. Otherwise the scan
/// window is `[target_mz - mz_window/2, target_mz + mz_window/2)`.
///
/// An empty or out-of-range window yields intensity 0 and mass error 0; no
/// error condition exists.
pub fn extract_point(
    mzs: &[f64],
    intensities: &[f64],
    target_mz: f64,
    mz_window: f64,
    extractor: ChromExtractor,
) -> ExtractedPoint {
    let (start, upper_bound) = if target_mz == 0.0 {
        (0, f64::INFINITY)
    } else {
        let lower_bound = target_mz - mz_window / 2.0;
        (
            mzs.partition_point(|&mz| mz < lower_bound),
            target_mz + mz_window / 2.0,
        )
    };

    let mut acc = MeanErrorAccumulator::default();
    for (&mz, &intensity) in mzs[start..].iter().zip(&intensities[start..]) {
        if mz >= upper_bound {
            break;
        }
        let delta = mz - target_mz;
        match extractor {
            ChromExtractor::Summed => acc.accumulate(delta, intensity),
            ChromExtractor::BasePeak => {
                // Only a new maximum contributes; it owns the mass error.
                if intensity > acc.total() {
                    acc.replace(delta, intensity);
                }
            }
        }
    }

    let mass_error = if target_mz != 0.0 {
        acc.mean() / target_mz
    } else {
        0.0
    };
    ExtractedPoint {
        intensity: acc.total(),
        mass_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MZS: [f64; 5] = [99.97, 99.99, 100.0, 100.02, 100.5];
    const INTENSITIES: [f64; 5] = [5.0, 10.0, 50.0, 90.0, 7.0];

    #[test]
    fn test_zero_target_sums_whole_spectrum() {
        let point = extract_point(&MZS, &INTENSITIES, 0.0, 0.0, ChromExtractor::Summed);
        assert_eq!(point.intensity, INTENSITIES.iter().sum::<f64>());
        assert_eq!(point.mass_error, 0.0);
    }

    #[test]
    fn test_zero_target_base_peak_is_max() {
        let point = extract_point(&MZS, &INTENSITIES, 0.0, 0.0, ChromExtractor::BasePeak);
        assert_eq!(point.intensity, 90.0);
        assert_eq!(point.mass_error, 0.0);
    }

    #[test]
    fn test_single_point_window() {
        let mzs = [99.0, 100.0, 101.0];
        let intensities = [20.0, 50.0, 30.0];
        for extractor in [ChromExtractor::Summed, ChromExtractor::BasePeak] {
            let point = extract_point(&mzs, &intensities, 100.0, 0.5, extractor);
            assert_eq!(point.intensity, 50.0);
            assert_eq!(point.mass_error, 0.0);
        }
    }

    #[test]
    fn test_summed_weighted_mass_error() {
        // Two points at offsets -0.01 and +0.02 from 500, weighted 10:90.
        let mzs = [499.99, 500.02];
        let intensities = [10.0, 90.0];
        let point = extract_point(&mzs, &intensities, 500.0, 0.1, ChromExtractor::Summed);
        assert_eq!(point.intensity, 100.0);
        let expected = (10.0 * -0.01 + 90.0 * 0.02) / 100.0 / 500.0;
        assert!((point.mass_error - expected).abs() < 1e-12);
    }

    #[test]
    fn test_base_peak_takes_max_point_error() {
        let mzs = [499.99, 500.02];
        let intensities = [10.0, 90.0];
        let point = extract_point(&mzs, &intensities, 500.0, 0.1, ChromExtractor::BasePeak);
        assert_eq!(point.intensity, 90.0);
        assert!((point.mass_error - 0.02 / 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_is_half_open() {
        // Upper bound is exclusive, lower bound inclusive.
        let mzs = [99.95, 100.05];
        let intensities = [1.0, 2.0];
        let point = extract_point(&mzs, &intensities, 100.0, 0.1, ChromExtractor::Summed);
        assert_eq!(point.intensity, 1.0);
    }

    #[test]
    fn test_out_of_range_window() {
        let point = extract_point(&MZS, &INTENSITIES, 200.0, 0.1, ChromExtractor::Summed);
        assert_eq!(point.intensity, 0.0);
        assert_eq!(point.mass_error, 0.0);
    }

    #[test]
    fn test_empty_spectrum() {
        let point = extract_point(&[], &[], 100.0, 0.1, ChromExtractor::BasePeak);
        assert_eq!(point, ExtractedPoint::default());
    }

    #[test]
    fn test_accumulator_replace_collapses_to_delta() {
        let mut acc = MeanErrorAccumulator::default();
        acc.accumulate(0.5, 10.0);
        acc.replace(-0.25, 40.0);
        assert_eq!(acc.total(), 40.0);
        assert_eq!(acc.mean(), -0.25);
    }

    #[test]
    fn test_accumulator_zero_weight_keeps_mean() {
        let mut acc = MeanErrorAccumulator::default();
        acc.accumulate(0.5, 0.0);
        assert_eq!(acc.total(), 0.0);
        assert_eq!(acc.mean(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_zero_target_matches_sum_and_max(
            intensities in proptest::collection::vec(0.0f64..1e6, 1..50)
        ) {
            let mzs: Vec<f64> = (0..intensities.len()).map(|i| 100.0 + i as f64).collect();

            let summed = extract_point(&mzs, &intensities, 0.0, 0.0, ChromExtractor::Summed);
            prop_assert_eq!(summed.intensity, intensities.iter().sum::<f64>());
            prop_assert_eq!(summed.mass_error, 0.0);

            let base = extract_point(&mzs, &intensities, 0.0, 0.0, ChromExtractor::BasePeak);
            prop_assert_eq!(base.intensity, intensities.iter().copied().fold(0.0, f64::max));
            prop_assert_eq!(base.mass_error, 0.0);
        }
    }
}
