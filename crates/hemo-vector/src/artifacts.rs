//! Persisted form of a pre-built index.
//!
//! Three files travel together:
//! 1) `embeddings.json`: the `rows x dim` matrix, row-major
//! 2) `index.json`: manifest describing a flat L2 index over that matrix
//! 3) `chunks.json`: one `{chunk, source}` record per row
//!
//! Loading is all-or-nothing: any missing file or any disagreement between the
//! three is an error and no index is returned.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hemo_core::config::ArtifactSettings;
use hemo_core::error::{Error, Result};
use hemo_core::traits::VectorIndex;
use hemo_core::types::Passage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::index::FlatL2Index;

pub const INDEX_KIND: &str = "flat_l2";
pub const INDEX_METRIC: &str = "l2_squared";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub embeddings: PathBuf,
    pub index: PathBuf,
    pub chunks: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::from_settings(dir, &ArtifactSettings::default())
    }

    /// File names from `settings`, all placed in `dir`.
    pub fn from_settings(dir: &Path, settings: &ArtifactSettings) -> Self {
        Self {
            embeddings: dir.join(&settings.embeddings_file),
            index: dir.join(&settings.index_file),
            chunks: dir.join(&settings.chunks_file),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    pub rows: usize,
    pub dim: usize,
    pub data: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for x in &self.data {
            hasher.update(&x.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub kind: String,
    pub metric: String,
    pub dimension: usize,
    pub count: usize,
    pub embedder_id: String,
    pub matrix_digest: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(rename = "chunk", alias = "text")]
    pub text: String,
    #[serde(default, alias = "source_id")]
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedIndex {
    pub index: FlatL2Index,
    pub manifest: IndexManifest,
}

/// Write the three artifacts for `index`, creating the parent directories.
pub fn save_prebuilt(paths: &ArtifactPaths, index: &FlatL2Index, embedder_id: &str) -> Result<IndexManifest> {
    let dim = index.dim();
    let mut data = Vec::with_capacity(index.len() * dim);
    let mut chunks = Vec::with_capacity(index.len());
    for entry in index.entries() {
        data.extend_from_slice(&entry.vector);
        chunks.push(ChunkRecord { text: entry.passage.text.clone(), source: entry.passage.source.clone() });
    }
    let matrix = EmbeddingMatrix { rows: index.len(), dim, data };
    let manifest = IndexManifest {
        kind: INDEX_KIND.to_string(),
        metric: INDEX_METRIC.to_string(),
        dimension: dim,
        count: matrix.rows,
        embedder_id: embedder_id.to_string(),
        matrix_digest: matrix.digest(),
        built_at: Utc::now(),
    };

    write_json(&paths.embeddings, &matrix, false)?;
    write_json(&paths.chunks, &chunks, true)?;
    // manifest last: a directory without it never loads
    write_json(&paths.index, &manifest, true)?;
    tracing::info!(rows = matrix.rows, dim, path = %paths.index.display(), "pre-built index written");
    Ok(manifest)
}

/// Load and cross-check the three artifacts.
///
/// `expected_dim` is the dimension of the embedder that will produce queries.
pub fn load_prebuilt(paths: &ArtifactPaths, expected_dim: Option<usize>) -> Result<LoadedIndex> {
    let manifest: IndexManifest = read_json(&paths.index)?;
    let matrix: EmbeddingMatrix = read_json(&paths.embeddings)?;
    let chunks: Vec<ChunkRecord> = read_json(&paths.chunks)?;

    if manifest.kind != INDEX_KIND || manifest.metric != INDEX_METRIC {
        return Err(Error::Artifact(format!(
            "unsupported index {}/{} (expected {INDEX_KIND}/{INDEX_METRIC})",
            manifest.kind, manifest.metric
        )));
    }
    if matrix.rows == 0 {
        return Err(Error::Artifact("embedding matrix is empty".to_string()));
    }
    if matrix.dim == 0 || manifest.dimension == 0 {
        return Err(Error::Artifact("embedding dimension must be greater than zero".to_string()));
    }
    if matrix.rows.checked_mul(matrix.dim) != Some(matrix.data.len()) {
        return Err(Error::Misaligned(format!(
            "matrix holds {} values, shape says {}x{}",
            matrix.data.len(),
            matrix.rows,
            matrix.dim
        )));
    }
    if manifest.count != matrix.rows || chunks.len() != matrix.rows {
        return Err(Error::Misaligned(format!(
            "index count {}, matrix rows {}, chunks {}",
            manifest.count,
            matrix.rows,
            chunks.len()
        )));
    }
    if manifest.dimension != matrix.dim {
        return Err(Error::Misaligned(format!(
            "index dimension {} != matrix dimension {}",
            manifest.dimension, matrix.dim
        )));
    }
    if let Some(expected) = expected_dim {
        if expected != matrix.dim {
            return Err(Error::DimensionMismatch { expected, actual: matrix.dim });
        }
    }
    if manifest.matrix_digest != matrix.digest() {
        return Err(Error::Misaligned("matrix digest does not match the index manifest".to_string()));
    }

    let mut index = FlatL2Index::new(matrix.dim);
    for (record, row) in chunks.into_iter().zip(matrix.data.chunks_exact(matrix.dim)) {
        index.add(Passage { text: record.text, source: record.source }, row.to_vec())?;
    }
    tracing::info!(rows = index.len(), dim = index.dim(), embedder = %manifest.embedder_id, "pre-built index loaded");
    Ok(LoadedIndex { index, manifest })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| Error::Artifact(format!("{}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Artifact(format!("{}: {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;
    Ok(())
}
