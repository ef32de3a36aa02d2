//! On-device BGE-M3 embeddings with candle (`--features local-model`).
//!
//! Texts are embedded in padded mini-batches; each row is mean-pooled over
//! its real tokens and L2-normalised.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::anyhow;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use hemo_core::error::{Error, Result};
use hemo_core::traits::Embedder;
use tokenizers::Tokenizer;

const MAX_LEN: usize = 256;
const MINI_BATCH: usize = 16;
// XLM-RoBERTa <pad>
const PAD_ID: u32 = 1;

pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    id: String,
}

impl BgeM3Embedder {
    pub fn new() -> Result<Self> {
        let model_dir = resolve_model_dir().map_err(provider_err)?;
        Self::load(&model_dir).map_err(provider_err)
    }

    fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let vb = VarBuilder::from_tensors(weights.into_iter().collect(), DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        let dim = config.hidden_size;
        tracing::info!(dim, "BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, dim, id: format!("local:bge-m3:d{dim}") })
    }

    /// `[B, W]` token ids and attention mask, `W` = longest text clipped to `MAX_LEN`.
    fn encode(&self, texts: &[String]) -> anyhow::Result<(Tensor, Tensor)> {
        let encodings = texts
            .iter()
            .map(|t| self.tokenizer.encode(t.as_str(), true).map_err(|e| anyhow!("tokenization failed: {e}")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let width = encodings.iter().map(|e| e.get_ids().len().min(MAX_LEN)).max().unwrap_or(0).max(1);
        let mut ids = Vec::with_capacity(texts.len() * width);
        let mut mask = Vec::with_capacity(texts.len() * width);
        for enc in &encodings {
            let n = enc.get_ids().len().min(width);
            ids.extend_from_slice(&enc.get_ids()[..n]);
            mask.extend_from_slice(&enc.get_attention_mask()[..n]);
            ids.extend(std::iter::repeat(PAD_ID).take(width - n));
            mask.extend(std::iter::repeat(0u32).take(width - n));
        }
        let shape = (texts.len(), width);
        Ok((Tensor::from_vec(ids, shape, &self.device)?, Tensor::from_vec(mask, shape, &self.device)?))
    }

    fn embed_mini_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = self.encode(texts)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2::<f32>()?;
        tracing::debug!(count = texts.len(), ms = start.elapsed().as_millis() as u64, "embedded mini-batch");
        Ok(rows)
    }
}

impl Embedder for BgeM3Embedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MINI_BATCH) {
            out.extend(self.embed_mini_batch(batch).map_err(provider_err)?);
        }
        Ok(out)
    }
}

/// Mean of the token states where the mask is set, then L2 normalisation: `[B,T,H] -> [B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let counts = (mask.sum_keepdim(1)? + 1e-9)?;
    let mean = summed.broadcast_div(&counts)?;
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + 1e-12)?;
    mean.broadcast_div(&norm)
}

fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            tracing::info!("embedding device: Metal");
            return device;
        }
    }
    tracing::info!("embedding device: CPU");
    Device::Cpu
}

fn provider_err(e: anyhow::Error) -> Error { Error::Provider(e.to_string()) }

fn resolve_model_dir() -> anyhow::Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(dir);
            if p.exists() {
                return Ok(p);
            }
        }
    }
    ["../models/bge-m3", "models/bge-m3"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("could not locate the BGE-M3 model directory (set APP_MODEL_DIR)"))
}
