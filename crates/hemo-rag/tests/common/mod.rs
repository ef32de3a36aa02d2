#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use hemo_core::error::{Error, Result};
use hemo_core::traits::{AnswerGenerator, Embedder, VectorIndex};
use hemo_core::types::SearchHit;

/// Embeds only the texts it was given vectors for; anything else is a provider error.
pub struct MapEmbedder {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl MapEmbedder {
    pub fn new(pairs: &[(&str, [f32; 2])]) -> Self {
        Self { dim: 2, vectors: pairs.iter().map(|(t, v)| (t.to_string(), v.to_vec())).collect() }
    }
}

impl Embedder for MapEmbedder {
    fn embedder_id(&self) -> &str { "map:d2" }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().ok_or_else(|| Error::Provider(format!("no vector for {t:?}"))))
            .collect()
    }
}

/// Counts embedded texts and stalls each batch so concurrent callers overlap.
pub struct CountingEmbedder {
    inner: MapEmbedder,
    pub embedded: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(inner: MapEmbedder) -> Self {
        Self { inner, embedded: AtomicUsize::new(0) }
    }
}

impl Embedder for CountingEmbedder {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }

    fn dim(&self) -> usize { self.inner.dim() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        std::thread::sleep(Duration::from_millis(20));
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

pub struct FailingIndex;

impl VectorIndex for FailingIndex {
    fn dim(&self) -> usize { 2 }

    fn len(&self) -> usize { 1 }

    fn search(&self, _query: &[f32], _k: usize) -> Result<Vec<SearchHit>> {
        Err(Error::InvalidVector("corrupted index".into()))
    }
}

/// Returns a fixed reply and records every call.
pub struct ScriptedGenerator {
    reply: Option<String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), calls: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { reply: None, calls: Mutex::new(Vec::new()) }
    }
}

impl AnswerGenerator for ScriptedGenerator {
    fn complete(&self, system_role: &str, user_prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push((system_role.to_string(), user_prompt.to_string()));
        self.reply.clone().ok_or_else(|| Error::Provider("model overloaded".into()))
    }
}

pub const ALPHABET: [&str; 4] = ["A is for apple", "B is for ball", "C is for cat", "D is for dog"];

pub fn alphabet_embedder() -> MapEmbedder {
    MapEmbedder::new(&[
        ("A is for apple", [0.0, 0.0]),
        ("B is for ball", [10.0, 0.0]),
        ("C is for cat", [3.0, 0.0]),
        ("D is for dog", [4.0, 0.0]),
        ("tell me about cats", [3.1, 0.0]),
    ])
}
