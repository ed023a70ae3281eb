//! Deterministic encoders for tests in this and downstream crates.
//!
//! Enabled with the `test-util` feature.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Encoder, SemanticError};

/// Bag-of-keywords encoder: dimension `i` counts occurrences of
/// `vocabulary[i]`. Words outside the vocabulary are ignored, which makes
/// similarities easy to compute by hand.
#[derive(Debug)]
pub struct KeywordEncoder {
    vocabulary: Vec<String>,
    model_name: String,
    batch_calls: AtomicUsize,
    texts_encoded: AtomicUsize,
}

impl KeywordEncoder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self::named("keyword-test", vocabulary)
    }

    pub fn named(model_name: &str, vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|word| word.to_lowercase()).collect(),
            model_name: model_name.to_owned(),
            batch_calls: AtomicUsize::new(0),
            texts_encoded: AtomicUsize::new(0),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.vocabulary.len()];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if let Some(i) = self.vocabulary.iter().position(|word| word == token) {
                v[i] += 1.0;
            }
        }
        v
    }

    /// Number of `encode_batch` invocations (single encodes count as one).
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Total number of texts encoded across all calls.
    pub fn texts_encoded(&self) -> usize {
        self.texts_encoded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Encoder for KeywordEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.texts_encoded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

/// Encoder that always fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingEncoder;

#[async_trait]
impl Encoder for FailingEncoder {
    fn model_name(&self) -> &str {
        "failing-test"
    }

    async fn encode_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Err(SemanticError::Transport("encoder offline".into()))
    }
}
