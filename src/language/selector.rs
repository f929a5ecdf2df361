use super::core::GrammarPattern;
use crate::stats::ErrorSnapshot;
use rand::{Rng, RngCore};

/// Strategy for choosing which pattern the next phrase drills.
pub trait PatternSelector {
    /// Index into `patterns` of the chosen pattern. `patterns` must be
    /// non-empty.
    fn select(
        &self,
        patterns: &[GrammarPattern],
        snapshot: &ErrorSnapshot,
        rng: &mut dyn RngCore,
    ) -> usize;
}

/// Uniform choice, ignoring recorded errors
pub struct RandomSelector;

impl PatternSelector for RandomSelector {
    fn select(
        &self,
        patterns: &[GrammarPattern],
        _snapshot: &ErrorSnapshot,
        rng: &mut dyn RngCore,
    ) -> usize {
        if patterns.len() <= 1 {
            return 0;
        }
        rng.gen_range(0..patterns.len())
    }
}

/// Error-weighted choice: patterns the player gets wrong come up more often,
/// but every pattern keeps a weight of at least one.
pub struct WeightedSelector;

impl PatternSelector for WeightedSelector {
    fn select(
        &self,
        patterns: &[GrammarPattern],
        snapshot: &ErrorSnapshot,
        rng: &mut dyn RngCore,
    ) -> usize {
        if snapshot.is_empty() {
            // Fall back to uniform selection until something has been missed
            return RandomSelector.select(patterns, snapshot, rng);
        }

        let weights = selection_weights(patterns, snapshot);
        let total: f64 = weights.iter().map(|w| f64::from(*w)).sum();
        let mut remainder = rng.gen::<f64>() * total;

        for (index, weight) in weights.iter().enumerate() {
            remainder -= f64::from(*weight);
            if remainder <= 0.0 {
                return index;
            }
        }

        0
    }
}

/// `max(1, errors + 1)` for each pattern, in catalog order.
pub fn selection_weights(patterns: &[GrammarPattern], snapshot: &ErrorSnapshot) -> Vec<u32> {
    patterns
        .iter()
        .map(|p| snapshot.get(&p.id).saturating_add(1).max(1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::core::{Tense, VerbKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DRAWS: usize = 20_000;

    fn patterns() -> Vec<GrammarPattern> {
        ["A", "B", "C", "D", "E"]
            .iter()
            .map(|id| GrammarPattern::new(*id, 3, Tense::PastSimple, VerbKind::Regular))
            .collect()
    }

    fn frequencies(selector: &dyn PatternSelector, snapshot: &ErrorSnapshot, seed: u64) -> Vec<f64> {
        let patterns = patterns();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts = vec![0usize; patterns.len()];
        for _ in 0..DRAWS {
            counts[selector.select(&patterns, snapshot, &mut rng)] += 1;
        }
        counts.iter().map(|c| *c as f64 / DRAWS as f64).collect()
    }

    #[test]
    fn test_selection_weights() {
        let snapshot: ErrorSnapshot = [("B", 4), ("Z", 9)].into_iter().collect();
        assert_eq!(selection_weights(&patterns(), &snapshot), vec![1, 5, 1, 1, 1]);
    }

    #[test]
    fn test_empty_snapshot_is_uniform() {
        let freq = frequencies(&WeightedSelector, &ErrorSnapshot::default(), 7);
        for f in freq {
            assert!((f - 0.2).abs() < 0.02, "frequency {f} too far from uniform");
        }
    }

    #[test]
    fn test_all_zero_counts_are_uniform() {
        let snapshot: ErrorSnapshot = [("A", 0), ("C", 0)].into_iter().collect();
        let freq = frequencies(&WeightedSelector, &snapshot, 11);
        for f in freq {
            assert!((f - 0.2).abs() < 0.02, "frequency {f} too far from uniform");
        }
    }

    #[test]
    fn test_weighted_follows_error_counts() {
        let snapshot: ErrorSnapshot = [("C", 5)].into_iter().collect();
        let freq = frequencies(&WeightedSelector, &snapshot, 3);
        // weights 1,1,6,1,1
        assert!((freq[2] - 0.6).abs() < 0.02, "got {}", freq[2]);
        assert!((freq[0] - 0.1).abs() < 0.02, "got {}", freq[0]);
    }

    #[test]
    fn test_more_errors_raise_relative_probability() {
        let mut last_ratio = 0.0;
        for errors in [1, 3, 6] {
            let snapshot: ErrorSnapshot = [("A", errors), ("E", 1)].into_iter().collect();
            let freq = frequencies(&WeightedSelector, &snapshot, 42);
            let ratio = freq[0] / freq[4];
            assert!(ratio > last_ratio, "ratio {ratio} at {errors} errors");
            last_ratio = ratio;
        }
    }

    #[test]
    fn test_single_pattern_always_selected() {
        let single = vec![GrammarPattern::new("Only", 2, Tense::PastSimple, VerbKind::Regular)];
        let snapshot: ErrorSnapshot = [("Only", 3)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(WeightedSelector.select(&single, &snapshot, &mut rng), 0);
            assert_eq!(RandomSelector.select(&single, &snapshot, &mut rng), 0);
        }
    }
}
