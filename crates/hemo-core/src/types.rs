//! Domain types shared by the index, the embedders and the retrieval engine.

use serde::{Deserialize, Serialize};

/// A unit of retrievable knowledge.
///
/// - `text`: the passage payload handed to the language model
/// - `source`: opaque origin label (built-in slug, `doc:chunk` id, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub source: Option<String>,
}

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: None }
    }

    pub fn with_source(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { text: text.into(), source: Some(source.into()) }
    }
}

/// Which knowledge tier produced a context string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContextSource {
    /// Index loaded from persisted artifacts.
    Prebuilt,
    /// Index built at startup from the built-in corpus.
    Default,
    /// Leading passages of the raw corpus, no search involved.
    CorpusSlice,
}

impl std::fmt::Display for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContextSource::Prebuilt => "prebuilt",
            ContextSource::Default => "default",
            ContextSource::CorpusSlice => "corpus-slice",
        };
        f.write_str(name)
    }
}

/// One nearest-neighbour result.
///
/// `position` is the insertion position inside the index, `distance` is the
/// squared L2 distance to the query (lower is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
    pub passage: Passage,
}
