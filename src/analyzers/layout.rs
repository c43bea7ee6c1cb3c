//! Stacked-bar layout: tier histograms to segment widths that add up to 100.

use crate::analyzers::tier::PerformanceTier;
use crate::analyzers::types::{AggregateStats, LayoutSegments, TierCounts};
use crate::analyzers::utility::pct;

/// Stacked-bar segment widths for a tier histogram.
///
/// The first three segments are exact shares; the unsatisfactory segment takes
/// whatever is left of 100, floored at zero, so the bar never overshoots.
/// An empty histogram yields four zero-width segments.
pub fn layout_segments(counts: &TierCounts, total: usize) -> LayoutSegments {
    if total == 0 {
        return LayoutSegments::default();
    }

    let excellent = pct(counts.get(PerformanceTier::Excellent), total);
    let good = pct(counts.get(PerformanceTier::Good), total);
    let acceptable = pct(counts.get(PerformanceTier::Acceptable), total);
    let unsatisfactory = (100.0 - (excellent + good + acceptable)).max(0.0);

    LayoutSegments {
        excellent,
        good,
        acceptable,
        unsatisfactory,
    }
}

impl AggregateStats {
    pub fn layout(&self) -> LayoutSegments {
        layout_segments(&self.tier_counts, self.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_total_is_all_zero() {
        let segments = layout_segments(&TierCounts::default(), 0);
        assert_eq!(segments.values(), [0.0; 4]);
    }

    #[test]
    fn test_thirds_sum_to_hundred() {
        let counts = TierCounts::from_array([1, 1, 1, 0]);
        let segments = layout_segments(&counts, 3);
        let sum: f64 = segments.values().iter().sum();
        assert!((sum - 100.0).abs() < 1e-6);
        assert!(segments.unsatisfactory >= 0.0);
        assert!(segments.unsatisfactory < 1e-9);
    }

    #[test]
    fn test_remainder_goes_to_unsatisfactory() {
        let counts = TierCounts::from_array([1, 0, 0, 3]);
        let segments = layout_segments(&counts, 4);
        assert_eq!(segments.excellent, 25.0);
        assert_eq!(segments.good, 0.0);
        assert_eq!(segments.acceptable, 0.0);
        assert_eq!(segments.unsatisfactory, 75.0);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let counts = TierCounts::from_array([2, 5, 3, 7]);
        let a = layout_segments(&counts, 17);
        let b = layout_segments(&counts, 17);
        for (x, y) in a.values().iter().zip(b.values().iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    proptest! {
        #[test]
        fn prop_segments_sum_to_hundred(
            exc in 0usize..500,
            good in 0usize..500,
            acc in 0usize..500,
            unsat in 0usize..500,
        ) {
            let total = exc + good + acc + unsat;
            prop_assume!(total > 0);
            let counts = TierCounts::from_array([exc, good, acc, unsat]);
            let segments = layout_segments(&counts, total);
            let sum: f64 = segments.values().iter().sum();
            prop_assert!((sum - 100.0).abs() < 1e-6);
            prop_assert!(segments.values().iter().all(|w| *w >= 0.0));
        }
    }
}
