//! Offline feature-hashing embedder.
//!
//! Each normalized token is hashed into one of `dimension` buckets and the
//! resulting bag-of-words vector is L2-normalized. Texts that share vocabulary
//! score high under cosine similarity, which is enough to ground answers
//! without a network embedding service.

use std::hash::Hasher;

use async_trait::async_trait;
use twox_hash::XxHash64;

use super::provider::Embedder;
use crate::core::errors::TutorError;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    id: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self, TutorError> {
        if dimension == 0 {
            return Err(TutorError::InvalidParameter(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            id: format!("hashing-{}", dimension),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        for token in normalized_tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let hash = hasher.finish();
            let idx = (hash % self.dimension as u64) as usize;
            // High bit picks the sign.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, TutorError> {
        Ok(inputs.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn normalized_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_math::cosine_similarity;

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            HashingEmbedder::new(0),
            Err(TutorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn vectors_have_configured_dimension_and_unit_length() {
        let embedder = HashingEmbedder::new(64).expect("embedder");
        let vector = embedder.embed_text("The cat sat on the mat.");
        assert_eq!(vector.len(), 64);
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        let embedder = HashingEmbedder::new(128).expect("embedder");
        assert_eq!(embedder.embed_text("Hello, World!"), embedder.embed_text("hello world"));
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::new(384).expect("embedder");
        let doc = embedder.embed_text("The cat sat on the mat.");
        let related = embedder.embed_text("Where did the cat sit? on the mat");
        let unrelated = embedder.embed_text("quantum chromodynamics lecture notes");

        assert!(cosine_similarity(&related, &doc) > cosine_similarity(&unrelated, &doc));
    }

    #[test]
    fn blank_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::new(8).expect("embedder");
        assert!(embedder.embed_text("  ... ").iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn batch_embedding_preserves_input_order() {
        let embedder = HashingEmbedder::new(32).expect("embedder");
        let inputs = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = embedder.embed(&inputs).await.expect("embed");
        assert_eq!(vectors[0], embedder.embed_text("alpha"));
        assert_eq!(vectors[1], embedder.embed_text("beta"));
    }
}
