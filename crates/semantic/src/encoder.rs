use async_trait::async_trait;

use crate::SemanticError;

/// A text encoder mapping strings into a fixed-width vector space.
///
/// Implementations must be safe to share across tasks: one instance encodes
/// the catalog at startup and then serves every query for the rest of the
/// process lifetime.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Identity of the underlying model. Two encoders with the same name must
    /// produce comparable vectors.
    fn model_name(&self) -> &str;

    /// Encodes `texts` in one call, returning vectors in input order.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError>;

    /// Encodes a single text.
    async fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vectors = self.encode_batch(&[text.to_owned()]).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(SemanticError::Inference(
                "encoder must return exactly one vector per text".into(),
            )),
        }
    }
}
