//! Similarity and distance over `f32` vectors
//!
//! Mismatched lengths are `LlmError::Embeddings`; zero vectors are never
//! divided by.

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

/// A stored vector plus caller data carried through a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingCandidate<M> {
    pub embedding: Vec<f32>,
    pub metadata: M,
}

impl<M> EmbeddingCandidate<M> {
    pub fn new(embedding: Vec<f32>, metadata: M) -> Self {
        Self { embedding, metadata }
    }
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch<M> {
    /// Cosine similarity to the query
    pub similarity: f32,
    pub metadata: M,
}

fn check_lengths(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(LlmError::Embeddings(format!(
            "vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Euclidean length of `v`
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Sum of pairwise products; fails on length mismatch
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Scale `v` to unit length
///
/// A zero vector has no direction and is returned unchanged.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let mag = magnitude(v);
    if mag == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / mag).collect()
}

/// Cosine of the angle between `a` and `b`, in [-1, 1]
///
/// Zero when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let denom = magnitude(a) * magnitude(b);
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}

/// Straight-line distance between `a` and `b`
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_lengths(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt())
}

/// Rank `candidates` by cosine similarity to `query`
///
/// Returns the best `min(top_k, candidates.len())` matches, highest first.
/// Equal scores keep their input order.
pub fn find_similar_embeddings<M: Clone>(
    query: &[f32],
    candidates: &[EmbeddingCandidate<M>],
    top_k: usize,
) -> Result<Vec<SimilarityMatch<M>>> {
    let mut scored = candidates
        .iter()
        .map(|c| {
            cosine_similarity(query, &c.embedding).map(|similarity| SimilarityMatch {
                similarity,
                metadata: c.metadata.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // sort_by is stable
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(top_k);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_reference_values() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]).unwrap() - 1.0).abs() < EPS);
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap().abs() < EPS);
        assert!(
            (euclidean_distance(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap() - 2f32.sqrt()).abs()
                < EPS
        );
        assert_eq!(dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap(), 32.0);
        assert_eq!(magnitude(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_normalize_preserves_direction() {
        for v in [vec![3.0, 4.0], vec![-1.0, 2.0, 0.5], vec![1e-3, 7.0, -2.0, 9.5]] {
            let n = normalize(&v);
            assert!((magnitude(&n) - 1.0).abs() < EPS);
            assert!((cosine_similarity(&v, &n).unwrap() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        let pairs: [(&[f32], &[f32]); 3] = [
            (&[1.0], &[1.0, 2.0]),
            (&[], &[1.0]),
            (&[1.0, 2.0, 3.0], &[1.0, 2.0]),
        ];
        for (a, b) in pairs {
            assert_eq!(cosine_similarity(a, b).unwrap_err().kind(), ErrorKind::Embeddings);
            assert_eq!(euclidean_distance(a, b).unwrap_err().kind(), ErrorKind::Embeddings);
        }
    }

    #[test]
    fn test_find_similar_top_k() {
        let query = [1.0, 0.0];
        let candidates = vec![
            EmbeddingCandidate::new(vec![0.0, 1.0], "orthogonal"),
            EmbeddingCandidate::new(vec![1.0, 0.0], "exact"),
            EmbeddingCandidate::new(vec![1.0, 1.0], "diagonal"),
            EmbeddingCandidate::new(vec![-1.0, 0.0], "opposite"),
        ];

        let top = find_similar_embeddings(&query, &candidates, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].metadata, "exact");
        assert_eq!(top[1].metadata, "diagonal");

        let all = find_similar_embeddings(&query, &candidates, 10).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert_eq!(all[3].metadata, "opposite");
    }

    #[test]
    fn test_find_similar_ties_keep_input_order() {
        let candidates = vec![
            EmbeddingCandidate::new(vec![2.0, 0.0], 1),
            EmbeddingCandidate::new(vec![1.0, 0.0], 2),
            EmbeddingCandidate::new(vec![5.0, 0.0], 3),
        ];
        let hits = find_similar_embeddings(&[1.0, 0.0], &candidates, 3).unwrap();
        let order: Vec<_> = hits.iter().map(|m| m.metadata).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_find_similar_mismatch_is_error() {
        let candidates = vec![EmbeddingCandidate::new(vec![1.0, 0.0, 0.0], ())];
        assert!(find_similar_embeddings(&[1.0, 0.0], &candidates, 1).is_err());
    }
}
