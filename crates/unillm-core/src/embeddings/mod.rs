//! Vector math over embeddings
//!
//! Pure functions for comparing vectors returned by
//! [`Provider::generate_embeddings`](crate::providers::Provider::generate_embeddings).

mod math;

pub use math::{
    cosine_similarity, dot_product, euclidean_distance, find_similar_embeddings, magnitude,
    normalize, EmbeddingCandidate, SimilarityMatch,
};
