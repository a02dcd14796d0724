use super::{TextAnalyzer, TextSimilarity};
use crate::Result;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Analyzer backed by local transformer embeddings
pub struct EmbeddingAnalyzer {
    model: Mutex<TextEmbedding>,
}

impl EmbeddingAnalyzer {
    /// Load the default model (downloaded on first use)
    pub fn new() -> Result<Self> {
        let mut options = InitOptions::default();
        options.model_name = EmbeddingModel::AllMiniLML6V2;
        options.show_download_progress = true;

        let model = TextEmbedding::try_new(options)
            .map_err(|e| crate::Error::Analyzer(format!("Failed to load embedding model: {}", e)))?;

        Ok(Self { model: Mutex::new(model) })
    }

    /// Embed a batch of texts
    pub fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let inputs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let model = self
            .model
            .lock()
            .map_err(|_| crate::Error::Analyzer("embedding model lock poisoned".to_string()))?;

        model
            .embed(inputs, None)
            .map_err(|e| crate::Error::Analyzer(format!("Embedding generation failed: {}", e)))
    }
}

impl TextSimilarity for EmbeddingAnalyzer {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a.trim().is_empty() || b.trim().is_empty() {
            return 0.0;
        }
        match self.embed(&[a, b]) {
            Ok(vectors) if vectors.len() == 2 => cosine_similarity(&vectors[0], &vectors[1]).clamp(0.0, 1.0),
            Ok(_) => 0.0,
            Err(e) => {
                tracing::warn!("Similarity unavailable, treating as unrelated: {}", e);
                0.0
            }
        }
    }
}

impl TextAnalyzer for EmbeddingAnalyzer {
    fn name(&self) -> &'static str {
        "embedding"
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
