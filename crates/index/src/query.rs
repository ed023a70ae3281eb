use semantic::cosine_similarity;
use serde::Serialize;

use crate::{EmbeddingIndex, IndexError};

/// One ranked hit: a catalog position and its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub entry_index: usize,
    pub similarity: f32,
}

/// Exhaustive cosine retrieval over every vector in `index`.
///
/// Results are sorted by similarity descending, ties broken by catalog
/// position (lower first). Only hits with `similarity >= threshold` are kept,
/// and at most `top_k` are returned. Cost is O(N·D) per query.
///
/// A `top_k` of zero or an empty index returns nothing. A query whose width
/// differs from the index is an [`IndexError::Dimension`], since it means the
/// query was encoded by a different model.
pub fn retrieve(
    query: &[f32],
    index: &EmbeddingIndex,
    top_k: usize,
    threshold: f32,
) -> Result<Vec<RetrievalResult>, IndexError> {
    if top_k == 0 || index.is_empty() {
        return Ok(Vec::new());
    }

    if query.len() != index.dim() {
        return Err(IndexError::Dimension {
            position: 0,
            expected: index.dim(),
            found: query.len(),
        });
    }

    let mut results: Vec<RetrievalResult> = index
        .vectors()
        .iter()
        .enumerate()
        .map(|(entry_index, vector)| RetrievalResult {
            entry_index,
            similarity: cosine_similarity(query, vector),
        })
        .filter(|result| result.similarity >= threshold)
        .collect();

    results.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.entry_index.cmp(&b.entry_index))
    });
    results.truncate(top_k);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogEntry;
    use proptest::prelude::*;

    fn seed_index(vectors: Vec<Vec<f32>>) -> EmbeddingIndex {
        let entries = (0..vectors.len())
            .map(|i| CatalogEntry::new(format!("drug-{i}"), "condition", "effects"))
            .collect();
        let texts = (0..vectors.len()).map(|i| format!("drug-{i}")).collect();
        EmbeddingIndex::new("test", entries, vectors, texts).unwrap()
    }

    #[test]
    fn orders_by_score_and_tie_breaks_by_position() {
        let index = seed_index(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 0.0],
        ]);

        let results = retrieve(&[1.0, 0.0], &index, 10, -1.0).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.entry_index).collect();

        assert_eq!(order, vec![1, 3, 2, 0]);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(results[0].similarity, results[1].similarity);
    }

    #[test]
    fn threshold_filters_before_truncation() {
        let index = seed_index(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.1]]);
        let results = retrieve(&[1.0, 0.0], &index, 10, 0.5).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.entry_index).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn truncates_to_top_k() {
        let index = seed_index(vec![vec![1.0, 0.0]; 5]);
        let results = retrieve(&[1.0, 0.0], &index, 2, 0.0).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry_index, 0);
        assert_eq!(results[1].entry_index, 1);
    }

    #[test]
    fn zero_top_k_short_circuits() {
        let index = seed_index(vec![vec![1.0, 0.0]]);
        assert!(retrieve(&[1.0, 0.0], &index, 0, -1.0).unwrap().is_empty());
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = EmbeddingIndex::empty("test");
        assert!(retrieve(&[1.0, 2.0, 3.0], &index, 5, -1.0).unwrap().is_empty());
    }

    #[test]
    fn zero_query_scores_zero() {
        let index = seed_index(vec![vec![1.0, 0.0]]);
        let results = retrieve(&[0.0, 0.0], &index, 5, 0.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity, 0.0);
    }

    #[test]
    fn wrong_query_width_is_an_error() {
        let index = seed_index(vec![vec![1.0, 0.0]]);
        let err = retrieve(&[1.0, 0.0, 0.0], &index, 5, 0.0).unwrap_err();
        assert!(matches!(err, IndexError::Dimension { expected: 2, found: 3, .. }));
    }

    fn vectors_strategy() -> impl Strategy<Value = (Vec<Vec<f32>>, Vec<f32>)> {
        (1usize..6).prop_flat_map(|dim| {
            (
                prop::collection::vec(prop::collection::vec(-3i8..=3, dim), 1..40),
                prop::collection::vec(-3i8..=3, dim),
            )
                .prop_map(|(vectors, query)| {
                    (
                        vectors
                            .into_iter()
                            .map(|v| v.into_iter().map(f32::from).collect())
                            .collect(),
                        query.into_iter().map(f32::from).collect(),
                    )
                })
        })
    }

    proptest! {
        #[test]
        fn results_respect_top_k_threshold_and_order(
            (vectors, query) in vectors_strategy(),
            top_k in 1usize..10,
            threshold in -1.0f32..1.0,
        ) {
            let index = seed_index(vectors);
            let results = retrieve(&query, &index, top_k, threshold).unwrap();

            prop_assert!(results.len() <= top_k);
            for result in &results {
                prop_assert!(result.similarity >= threshold);
                prop_assert!(result.entry_index < index.len());
            }
            for pair in results.windows(2) {
                prop_assert!(pair[0].similarity >= pair[1].similarity);
                if pair[0].similarity == pair[1].similarity {
                    prop_assert!(pair[0].entry_index < pair[1].entry_index);
                }
            }
        }
    }
}
