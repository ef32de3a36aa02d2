use indicatif::{ProgressBar, ProgressStyle};

use hemo_core::error::{Error, Result};
use hemo_core::traits::{Embedder, VectorIndex};
use hemo_core::types::Passage;

use crate::index::FlatL2Index;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embed every passage and index it in input order.
///
/// All-or-nothing: the first failing batch aborts the build and no partial
/// index is returned.
pub fn build_index(embedder: &dyn Embedder, passages: &[Passage], batch_size: usize, progress: bool) -> Result<FlatL2Index> {
    if passages.is_empty() {
        return Err(Error::InvalidConfig("cannot build an index over zero passages".to_string()));
    }
    let batch_size = batch_size.max(1);
    let pb = if progress { ProgressBar::new(passages.len() as u64) } else { ProgressBar::hidden() };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} passages ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut index = FlatL2Index::new(embedder.dim());
    for batch in passages.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).inspect_err(|e| {
            pb.abandon_with_message("embedding failed");
            tracing::warn!(error = %e, done = index.len(), total = passages.len(), "index build aborted");
        })?;
        if vectors.len() != batch.len() {
            pb.abandon_with_message("embedding count mismatch");
            return Err(Error::Provider(format!(
                "embedder returned {} vectors for {} passages",
                vectors.len(),
                batch.len()
            )));
        }
        for (passage, vector) in batch.iter().zip(vectors) {
            index.add(passage.clone(), vector)?;
        }
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message("done");
    tracing::info!(entries = index.len(), dim = index.dim(), embedder = embedder.embedder_id(), "index built");
    Ok(index)
}
