//! Context selection for the chatbot.
//!
//! Tiers are tried in a fixed order and the first one that produces passages
//! wins:
//! 1) pre-built index loaded from artifacts
//! 2) default index built from the corpus at bootstrap
//! 3) the leading corpus passages, which cannot fail

use std::path::Path;
use std::sync::{Arc, OnceLock};

use hemo_core::config::{resolve_with_base, Settings};
use hemo_core::corpus::Corpus;
use hemo_core::error::Result;
use hemo_core::traits::Embedder;
use hemo_core::types::ContextSource;
use hemo_vector::ArtifactPaths;
use serde::Serialize;

use crate::bootstrap::{bootstrap_sources, IndexSlot, KnowledgeSources};

/// Passages taken from each searched index.
pub const TOP_K: usize = 3;
/// Passages taken from the corpus when no index answers.
pub const FALLBACK_PASSAGES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NotBootstrapped,
    Unavailable(String),
    EmbeddingFailed(String),
    SearchFailed(String),
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTier {
    pub tier: ContextSource,
    pub reason: SkipReason,
}

/// Context text plus the tier that produced it and the tiers passed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievedContext {
    pub text: String,
    pub source: ContextSource,
    pub skipped: Vec<SkippedTier>,
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    corpus: Corpus,
    artifacts: Option<ArtifactPaths>,
    sources: OnceLock<KnowledgeSources>,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn Embedder>, corpus: Corpus) -> Self {
        Self { embedder, corpus, artifacts: None, sources: OnceLock::new() }
    }

    /// Look for pre-built artifacts at `paths` during bootstrap.
    pub fn with_artifacts(mut self, paths: ArtifactPaths) -> Self {
        self.artifacts = Some(paths);
        self
    }

    /// Engine over the built-in corpus with the configured embedder and
    /// artifact directory (relative to `base`).
    pub fn from_settings(settings: &Settings, base: &Path) -> Result<Self> {
        let embedder = hemo_embed::embedder_from_settings(&settings.embedding)?;
        let engine = Self::new(embedder, Corpus::builtin());
        Ok(match &settings.artifacts.dir {
            Some(dir) => {
                let dir = resolve_with_base(base, dir);
                engine.with_artifacts(ArtifactPaths::from_settings(&dir, &settings.artifacts))
            }
            None => engine,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Load or build both indices. Runs once; later calls keep the first state.
    pub fn bootstrap(&self) -> &KnowledgeSources {
        if let Some(existing) = self.sources.get() {
            tracing::warn!("bootstrap already ran, keeping existing knowledge sources");
            return existing;
        }
        self.sources
            .get_or_init(|| bootstrap_sources(self.embedder.as_ref(), &self.corpus, self.artifacts.as_ref()))
    }

    /// Install externally prepared sources. Returns false if sources were already set.
    pub fn install(&self, sources: KnowledgeSources) -> bool {
        let installed = self.sources.set(sources).is_ok();
        if !installed {
            tracing::warn!("knowledge sources already installed, ignoring");
        }
        installed
    }

    pub fn sources(&self) -> Option<&KnowledgeSources> {
        self.sources.get()
    }

    pub fn prebuilt_available(&self) -> bool {
        self.sources.get().is_some_and(|s| s.prebuilt.is_ready())
    }

    pub fn get_relevant_context(&self, question: &str) -> RetrievedContext {
        let mut skipped = Vec::new();
        let Some(sources) = self.sources.get() else {
            for tier in [ContextSource::Prebuilt, ContextSource::Default] {
                skipped.push(SkippedTier { tier, reason: SkipReason::NotBootstrapped });
            }
            return self.corpus_slice(skipped);
        };

        let mut query: Option<Vec<f32>> = None;
        let mut embed_error: Option<String> = None;
        for (tier, slot) in sources.tiers() {
            let index = match slot {
                IndexSlot::Ready(index) => index,
                IndexSlot::Unavailable { reason } => {
                    skipped.push(SkippedTier { tier, reason: SkipReason::Unavailable(reason.clone()) });
                    continue;
                }
            };
            if query.is_none() && embed_error.is_none() {
                match self.embedder.embed(question) {
                    Ok(v) => query = Some(v),
                    Err(e) => {
                        tracing::warn!(error = %e, "query embedding failed");
                        embed_error = Some(e.to_string());
                    }
                }
            }
            let Some(q) = query.as_deref() else {
                let reason = SkipReason::EmbeddingFailed(embed_error.clone().unwrap_or_default());
                skipped.push(SkippedTier { tier, reason });
                continue;
            };
            match index.search(q, TOP_K) {
                Ok(hits) if !hits.is_empty() => {
                    tracing::debug!(%tier, hits = hits.len(), best = hits[0].distance, "context retrieved");
                    let text = hits.iter().map(|h| h.passage.text.as_str()).collect::<Vec<_>>().join("\n");
                    return RetrievedContext { text, source: tier, skipped };
                }
                Ok(_) => skipped.push(SkippedTier { tier, reason: SkipReason::NoMatches }),
                Err(e) => {
                    tracing::warn!(%tier, error = %e, "index search failed");
                    skipped.push(SkippedTier { tier, reason: SkipReason::SearchFailed(e.to_string()) });
                }
            }
        }
        self.corpus_slice(skipped)
    }

    fn corpus_slice(&self, skipped: Vec<SkippedTier>) -> RetrievedContext {
        tracing::warn!(skipped = skipped.len(), "no index answered, using leading corpus passages");
        RetrievedContext {
            text: self.corpus.leading_context(FALLBACK_PASSAGES),
            source: ContextSource::CorpusSlice,
            skipped,
        }
    }
}
