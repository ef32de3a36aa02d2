//! One-time construction of the two knowledge indices.
//!
//! Nothing here returns an error: every failure becomes
//! [`IndexSlot::Unavailable`] with the reason, and retrieval skips that tier.

use std::fmt;
use std::sync::Arc;

use hemo_core::corpus::Corpus;
use hemo_core::traits::{Embedder, VectorIndex};
use hemo_core::types::ContextSource;
use hemo_vector::{build_index, load_prebuilt, ArtifactPaths, DEFAULT_BATCH_SIZE};

#[derive(Clone)]
pub enum IndexSlot {
    Ready(Arc<dyn VectorIndex>),
    Unavailable { reason: String },
}

impl IndexSlot {
    pub fn unavailable(reason: impl fmt::Display) -> Self {
        IndexSlot::Unavailable { reason: reason.to_string() }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, IndexSlot::Ready(_))
    }

    pub fn index(&self) -> Option<&dyn VectorIndex> {
        match self {
            IndexSlot::Ready(index) => Some(index.as_ref()),
            IndexSlot::Unavailable { .. } => None,
        }
    }
}

impl fmt::Debug for IndexSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSlot::Ready(index) => write!(f, "Ready({} entries, d{})", index.len(), index.dim()),
            IndexSlot::Unavailable { reason } => write!(f, "Unavailable({reason})"),
        }
    }
}

/// Outcome of bootstrap, fixed for the lifetime of an engine.
#[derive(Debug, Clone)]
pub struct KnowledgeSources {
    pub prebuilt: IndexSlot,
    pub default: IndexSlot,
}

impl KnowledgeSources {
    pub fn unavailable(reason: impl fmt::Display) -> Self {
        let reason = reason.to_string();
        Self { prebuilt: IndexSlot::unavailable(&reason), default: IndexSlot::unavailable(reason) }
    }

    /// Searchable tiers in priority order.
    pub fn tiers(&self) -> [(ContextSource, &IndexSlot); 2] {
        [(ContextSource::Prebuilt, &self.prebuilt), (ContextSource::Default, &self.default)]
    }
}

/// Load the persisted index; any inconsistency disables the whole tier.
pub fn load_prebuilt_slot(paths: Option<&ArtifactPaths>, embedder: &dyn Embedder) -> IndexSlot {
    let Some(paths) = paths else {
        tracing::info!("no artifact directory configured, pre-built index disabled");
        return IndexSlot::unavailable("no artifact directory configured");
    };
    match load_prebuilt(paths, Some(embedder.dim())) {
        Ok(loaded) => {
            if loaded.manifest.embedder_id != embedder.embedder_id() {
                tracing::warn!(
                    built_with = %loaded.manifest.embedder_id,
                    querying_with = embedder.embedder_id(),
                    "pre-built index was embedded by a different provider"
                );
            }
            IndexSlot::Ready(Arc::new(loaded.index))
        }
        Err(e) => {
            tracing::warn!(error = %e, dir = %paths.index.display(), "pre-built index unavailable");
            IndexSlot::unavailable(e)
        }
    }
}

/// Embed the corpus into a fresh in-memory index.
pub fn build_default_slot(embedder: &dyn Embedder, corpus: &Corpus) -> IndexSlot {
    match build_index(embedder, corpus.passages(), DEFAULT_BATCH_SIZE, false) {
        Ok(index) => IndexSlot::Ready(Arc::new(index)),
        Err(e) => {
            tracing::warn!(error = %e, "default index unavailable");
            IndexSlot::unavailable(e)
        }
    }
}

pub fn bootstrap_sources(embedder: &dyn Embedder, corpus: &Corpus, artifacts: Option<&ArtifactPaths>) -> KnowledgeSources {
    let sources = KnowledgeSources {
        prebuilt: load_prebuilt_slot(artifacts, embedder),
        default: build_default_slot(embedder, corpus),
    };
    tracing::info!(
        prebuilt = sources.prebuilt.is_ready(),
        default = sources.default.is_ready(),
        "knowledge sources bootstrapped"
    );
    sources
}
