//! Property-based tests for the encoding policy and row normalization

use features::encoding::{continuous_boundaries, encode_categorical, encode_continuous};
use features::FeatureMatrix;
use proptest::prelude::*;

fn sample_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e4..1.0e4f64, 1..200)
}

proptest! {
    #[test]
    fn continuous_encoding_has_one_hot_bin(
        values in sample_strategy(),
        n_bins in 1usize..12,
        value in -2.0e4..2.0e4f64,
    ) {
        let boundaries = continuous_boundaries(&values, n_bins).unwrap();
        prop_assert_eq!(boundaries.len(), n_bins - 1);

        let encoded = encode_continuous(value, &boundaries);
        prop_assert_eq!(encoded.len(), boundaries.len() + 1);
        prop_assert_eq!(encoded.iter().filter(|v| **v == 1.0).count(), 1);
        prop_assert_eq!(encoded.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn boundaries_are_sorted(values in sample_strategy(), n_bins in 2usize..12) {
        let boundaries = continuous_boundaries(&values, n_bins).unwrap();
        prop_assert!(boundaries.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn unknown_slot_hot_only_without_match(
        values in prop::collection::vec(0u8..20, 0..8),
        retained in prop::collection::vec(0u8..20, 0..8),
    ) {
        let encoded = encode_categorical(&values, &retained, true);
        prop_assert_eq!(encoded.len(), retained.len() + 1);

        let matched = retained.iter().any(|c| values.contains(c));
        let unknown = encoded[retained.len()];
        prop_assert_eq!(unknown == 1.0, !matched);
    }

    #[test]
    fn normalize_is_idempotent(rows in prop::collection::vec(
        prop::collection::vec(-100.0..100.0f64, 5),
        1..20,
    )) {
        let ids: Vec<String> = (0..rows.len()).map(|i| i.to_string()).collect();
        let mut once = FeatureMatrix::from_rows(ids, 5, rows).unwrap();
        once.normalize_rows();
        let mut twice = once.clone();
        twice.normalize_rows();

        for (a, b) in once.values().iter().zip(twice.values()) {
            prop_assert!((a - b).abs() < 1e-9);
        }
        for row in once.rows() {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
        }
    }
}
