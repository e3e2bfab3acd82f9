use serde::{Deserialize, Serialize};

/// Linear fusion weights for normalised BM25 and embedding scores
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub bm25: f32,
    pub embedding: f32,
}

impl HybridWeights {
    /// Weights used when no semantic signal is available
    pub const LEXICAL_ONLY: Self = Self {
        bm25: 1.0,
        embedding: 0.0,
    };
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            bm25: 0.4,
            embedding: 0.6,
        }
    }
}

/// Min-max normalise into [0, 1].
///
/// Zero variance (or an empty input) yields all zeros; non-finite inputs count as 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let clean: Vec<f32> = scores
        .iter()
        .map(|s| if s.is_finite() { *s } else { 0.0 })
        .collect();

    let Some(min) = clean.iter().copied().reduce(f32::min) else {
        return Vec::new();
    };
    let max = clean.iter().copied().fold(min, f32::max);
    // f64 keeps the range finite and exact for any pair of finite f32 scores.
    let (min, range) = (f64::from(min), f64::from(max) - f64::from(min));
    if range <= 0.0 {
        return vec![0.0; clean.len()];
    }

    clean
        .iter()
        .map(|s| ((f64::from(*s) - min) / range).clamp(0.0, 1.0) as f32)
        .collect()
}

/// Weighted sum of normalised lexical and (optional) semantic scores.
///
/// Without semantic scores the lexical score passes through unweighted.
#[must_use]
pub fn fuse_scores(bm25: &[f32], embedding: Option<&[f32]>, weights: HybridWeights) -> Vec<f32> {
    match embedding {
        Some(embedding) if embedding.len() == bm25.len() => bm25
            .iter()
            .zip(embedding)
            .map(|(b, e)| weights.bm25 * b + weights.embedding * e)
            .collect(),
        _ => bm25.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn normalizes_into_unit_range() {
        assert_eq!(min_max_normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn zero_variance_maps_to_zero() {
        assert_eq!(min_max_normalize(&[5.0, 5.0, 5.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max_normalize(&[7.0]), vec![0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn tiny_and_extreme_spreads_still_normalize() {
        assert_eq!(
            min_max_normalize(&[1.0, 1.0 + f32::EPSILON]),
            vec![0.0, 1.0]
        );
        assert_eq!(min_max_normalize(&[-3e38, 3e38, 0.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn non_finite_scores_are_treated_as_zero() {
        assert_eq!(min_max_normalize(&[f32::NAN, 2.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn fusion_uses_weights_when_semantic_present() {
        let fused = fuse_scores(&[1.0, 0.0], Some(&[0.0, 1.0]), HybridWeights::default());
        assert!((fused[0] - 0.4).abs() < 1e-6);
        assert!((fused[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn fusion_without_semantic_is_lexical() {
        assert_eq!(
            fuse_scores(&[0.25, 1.0], None, HybridWeights::default()),
            vec![0.25, 1.0]
        );
    }

    proptest! {
        #[test]
        fn normalized_scores_stay_in_unit_range(scores in prop::collection::vec(-1e6f32..1e6, 0..40)) {
            let normalized = min_max_normalize(&scores);
            prop_assert_eq!(normalized.len(), scores.len());
            for value in normalized {
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
