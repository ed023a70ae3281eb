//! Local ONNX inference for sentence-transformer models such as
//! all-MiniLM-L6-v2.
//!
//! ONNX Runtime sessions are neither `Send` nor `Sync`, so the session lives on
//! a dedicated worker thread that owns it for the life of the encoder. Async
//! callers hand batches over a channel and await the reply, which keeps
//! blocking inference off the tokio runtime.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, Array2};
use onnxruntime::session::Session;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tokenizers::Tokenizer;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::normalize::l2_normalize_in_place;
use crate::{Encoder, SemanticConfig, SemanticError};

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

type Reply = Result<Vec<Vec<f32>>, SemanticError>;

struct Job {
    texts: Vec<String>,
    reply: oneshot::Sender<Reply>,
}

/// Encoder running a local ONNX model with masked mean pooling.
pub struct OnnxEncoder {
    model_name: String,
    jobs: mpsc::Sender<Job>,
}

impl OnnxEncoder {
    /// Resolves (and if needed downloads) the model assets, then starts the
    /// inference worker. Returns once the model is loaded.
    pub async fn load(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let assets = resolve_model_assets(cfg).await?;
        let max_sequence_length = cfg.max_sequence_length.max(1);
        let normalize = cfg.normalize;

        let (jobs, inbox) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), SemanticError>>();

        std::thread::Builder::new()
            .name("onnx-encoder".into())
            .spawn(move || {
                let mut model = match LoadedModel::load(&assets) {
                    Ok(model) => {
                        let _ = ready_tx.send(Ok(()));
                        model
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                for job in inbox {
                    let result = model.embed(&job.texts, max_sequence_length, normalize);
                    if job.reply.send(result).is_err() {
                        warn!("onnx_reply_dropped");
                    }
                }
            })?;

        ready_rx
            .await
            .map_err(|_| SemanticError::Inference("onnx worker exited during startup".into()))??;

        info!(model = %cfg.model_name, max_sequence_length, "onnx_encoder_ready");
        Ok(Self {
            model_name: cfg.model_name.clone(),
            jobs,
        })
    }
}

#[async_trait]
impl Encoder for OnnxEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (reply, response) = oneshot::channel();
        self.jobs
            .send(Job {
                texts: texts.to_vec(),
                reply,
            })
            .map_err(|_| SemanticError::Inference("onnx worker is not running".into()))?;
        response
            .await
            .map_err(|_| SemanticError::Inference("onnx worker dropped the request".into()))?
    }
}

struct LoadedModel {
    tokenizer: Tokenizer,
    session: Session<'static>,
}

impl LoadedModel {
    fn load(assets: &ModelAssets) -> Result<Self, SemanticError> {
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let session = ort_environment()?
            .new_session_builder()
            .map_err(|e| SemanticError::Inference(e.to_string()))?
            .with_model_from_file(assets.model_path.clone())
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        Ok(Self { tokenizer, session })
    }

    fn embed(
        &mut self,
        texts: &[String],
        max_sequence_length: usize,
        normalize: bool,
    ) -> Result<Vec<Vec<f32>>, SemanticError> {
        let encoded = encode_documents(&self.tokenizer, texts, max_sequence_length)?;
        let (input_ids, attn_mask) = build_padded_arrays(encoded)?;
        let mut vectors = execute_session(&mut self.session, input_ids, attn_mask)?;
        if normalize {
            for vector in &mut vectors {
                l2_normalize_in_place(vector);
            }
        }
        Ok(vectors)
    }
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("medsearch")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}

struct EncodedDoc {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

fn encode_documents(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_sequence_length: usize,
) -> Result<Vec<EncodedDoc>, SemanticError> {
    texts
        .iter()
        .map(|text| {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| SemanticError::Inference(e.to_string()))?;
            let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
            let mut mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&x| x as i64)
                .collect();
            ids.truncate(max_sequence_length);
            mask.truncate(max_sequence_length);
            Ok(EncodedDoc { ids, mask })
        })
        .collect()
}

fn build_padded_arrays(
    encoded: Vec<EncodedDoc>,
) -> Result<(Array2<i64>, Array2<i64>), SemanticError> {
    let seq_len = encoded.iter().map(|doc| doc.ids.len()).max().unwrap_or(0).max(1);
    let batch = encoded.len();
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedDoc { ids, mask } in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        let pad = seq_len - ids.len();
        id_storage.extend(ids);
        mask_storage.extend(mask);
        id_storage.extend(std::iter::repeat_n(0, pad));
        mask_storage.extend(std::iter::repeat_n(0, pad));
    }

    let input_ids = Array::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attn_mask = Array::from_shape_vec((batch, seq_len), mask_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    Ok((input_ids, attn_mask))
}

fn execute_session(
    session: &mut Session<'static>,
    input_ids: Array2<i64>,
    attn_mask: Array2<i64>,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let (batch, seq_len) = input_ids.dim();
    let mask_rows: Vec<i64> = attn_mask.iter().copied().collect();
    let mut runtime_inputs = Vec::with_capacity(session.inputs.len());
    let mut input_ids_tensor = Some(input_ids);
    let mut attn_mask_tensor = Some(attn_mask);

    for input in &session.inputs {
        match input.name.as_str() {
            "input_ids" => {
                let tensor = input_ids_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig("model requested `input_ids` twice".into())
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "attention_mask" => {
                let tensor = attn_mask_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig("model requested `attention_mask` twice".into())
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "token_type_ids" => {
                runtime_inputs.push(Array::from_elem((batch, seq_len), 0_i64).into_dyn());
            }
            other => {
                return Err(SemanticError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        }
    }

    let outputs = session
        .run::<i64, f32, _>(runtime_inputs)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let output = outputs
        .into_iter()
        .next()
        .ok_or_else(|| SemanticError::Inference("model returned no outputs".into()))?;

    let shape = output.shape().to_vec();
    let flat: Vec<f32> = output.iter().copied().collect();
    match shape.as_slice() {
        [b, s, hidden] if *b == batch && *s == seq_len => {
            Ok(mean_pool(&flat, &mask_rows, batch, seq_len, *hidden))
        }
        [b, hidden] if *b == batch => {
            Ok(flat.chunks((*hidden).max(1)).map(<[f32]>::to_vec).collect())
        }
        other => Err(SemanticError::Inference(format!(
            "unexpected model output shape {other:?} for batch {batch}x{seq_len}"
        ))),
    }
}

/// Averages token embeddings over positions where the attention mask is set.
fn mean_pool(
    hidden_states: &[f32],
    mask: &[i64],
    batch: usize,
    seq_len: usize,
    hidden: usize,
) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let mut pooled = vec![0f32; hidden];
            let mut count = 0f32;
            for s in 0..seq_len {
                if mask[b * seq_len + s] == 0 {
                    continue;
                }
                count += 1.0;
                let offset = (b * seq_len + s) * hidden;
                for (acc, value) in pooled.iter_mut().zip(&hidden_states[offset..offset + hidden]) {
                    *acc += value;
                }
            }
            if count > 0.0 {
                for value in &mut pooled {
                    *value /= count;
                }
            }
            pooled
        })
        .collect()
}

#[derive(Debug)]
struct ModelAssets {
    model_path: PathBuf,
    tokenizer_path: PathBuf,
}

/// Ensures the model and tokenizer exist locally, downloading them when URLs
/// are configured.
async fn resolve_model_assets(cfg: &SemanticConfig) -> Result<ModelAssets, SemanticError> {
    let model_path = ensure_local_file(&cfg.model_path, cfg.model_url.as_deref(), || {
        SemanticError::ModelNotFound(cfg.model_path.display().to_string())
    })
    .await?;

    let tokenizer_target = cfg.resolved_tokenizer_path();
    let tokenizer_path = ensure_local_file(&tokenizer_target, cfg.tokenizer_url.as_deref(), || {
        SemanticError::TokenizerMissing(tokenizer_target.display().to_string())
    })
    .await?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

async fn ensure_local_file<F>(
    target: &Path,
    remote_url: Option<&str>,
    on_missing: F,
) -> Result<PathBuf, SemanticError>
where
    F: FnOnce() -> SemanticError,
{
    if target.exists() {
        return Ok(target.to_path_buf());
    }

    match remote_url {
        Some(url) => {
            download_to_path(target, url).await?;
            Ok(target.to_path_buf())
        }
        None => Err(on_missing()),
    }
}

async fn download_to_path(target: &Path, url: &str) -> Result<(), SemanticError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(url, target = %target.display(), "model_asset_download");
    let response = reqwest::get(url)
        .await
        .map_err(|e| SemanticError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SemanticError::Status {
            status: status.as_u16(),
            body: format!("while fetching {url}"),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SemanticError::Transport(e.to_string()))?;
    tokio::fs::write(target, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_ignores_padding() {
        // batch 1, seq 3 (last position padded), hidden 2
        let hidden_states = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let mask = [1, 1, 0];
        let pooled = mean_pool(&hidden_states, &mask, 1, 3, 2);
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn mean_pool_all_masked_is_zero() {
        let pooled = mean_pool(&[5.0, 5.0], &[0], 1, 1, 2);
        assert_eq!(pooled, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn padded_arrays_share_sequence_length() {
        let docs = vec![
            EncodedDoc { ids: vec![101, 7, 102], mask: vec![1, 1, 1] },
            EncodedDoc { ids: vec![101, 102], mask: vec![1, 1] },
        ];
        let (ids, mask) = build_padded_arrays(docs).unwrap();
        assert_eq!(ids.dim(), (2, 3));
        assert_eq!(mask[[1, 2]], 0);
        assert_eq!(ids[[1, 2]], 0);
    }

    #[tokio::test]
    async fn missing_model_without_url_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SemanticConfig {
            mode: "onnx".into(),
            model_path: dir.path().join("model.onnx"),
            ..SemanticConfig::default()
        };
        let err = resolve_model_assets(&cfg).await.unwrap_err();
        assert!(matches!(err, SemanticError::ModelNotFound(_)));
    }
}
