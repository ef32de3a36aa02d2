use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use hemo_core::corpus::Corpus;
use hemo_core::error::{Error, Result};
use hemo_core::traits::{Embedder, VectorIndex};
use hemo_core::types::Passage;
use hemo_embed::FakeEmbedder;
use hemo_vector::artifacts::{ChunkRecord, EmbeddingMatrix, IndexManifest};
use hemo_vector::{build_index, load_prebuilt, save_prebuilt, ArtifactPaths};

fn builtin_index(embedder: &FakeEmbedder) -> hemo_vector::FlatL2Index {
    build_index(embedder, Corpus::builtin().passages(), 3, false).unwrap()
}

#[test]
fn save_then_load_answers_like_the_built_index() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(&tmp.path().join("assets"));
    let embedder = FakeEmbedder::new(64);
    let built = builtin_index(&embedder);

    let manifest = save_prebuilt(&paths, &built, embedder.embedder_id()).unwrap();
    assert_eq!(manifest.count, 8);
    assert_eq!(manifest.dimension, 64);

    let loaded = load_prebuilt(&paths, Some(64)).unwrap();
    assert_eq!(loaded.manifest, manifest);
    assert_eq!(loaded.index.len(), built.len());

    let query = embedder.embed("symptoms of beta thalassemia").unwrap();
    let a = built.search(&query, 3).unwrap();
    let b = loaded.index.search(&query, 3).unwrap();
    let texts = |hits: &[hemo_core::types::SearchHit]| hits.iter().map(|h| h.passage.text.clone()).collect::<Vec<_>>();
    assert_eq!(texts(&a), texts(&b));
    assert_eq!(b[0].passage.source, a[0].passage.source);
}

#[test]
fn building_twice_gives_identical_indices() {
    let embedder = FakeEmbedder::new(32);
    let first = builtin_index(&embedder);
    let second = builtin_index(&embedder);
    assert_eq!(first.entries(), second.entries());
}

#[test]
fn missing_file_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    let embedder = FakeEmbedder::new(16);
    save_prebuilt(&paths, &builtin_index(&embedder), embedder.embedder_id()).unwrap();
    fs::remove_file(&paths.chunks).unwrap();
    assert!(matches!(load_prebuilt(&paths, None), Err(Error::Artifact(_))));
}

#[test]
fn chunk_count_disagreeing_with_matrix_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    let embedder = FakeEmbedder::new(16);
    save_prebuilt(&paths, &builtin_index(&embedder), embedder.embedder_id()).unwrap();

    let mut chunks: Vec<ChunkRecord> = serde_json::from_str(&fs::read_to_string(&paths.chunks).unwrap()).unwrap();
    chunks.pop();
    fs::write(&paths.chunks, serde_json::to_string(&chunks).unwrap()).unwrap();

    assert!(matches!(load_prebuilt(&paths, None), Err(Error::Misaligned(_))));
}

#[test]
fn tampered_matrix_fails_digest_check() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    let embedder = FakeEmbedder::new(16);
    save_prebuilt(&paths, &builtin_index(&embedder), embedder.embedder_id()).unwrap();

    let mut matrix: EmbeddingMatrix = serde_json::from_str(&fs::read_to_string(&paths.embeddings).unwrap()).unwrap();
    matrix.data[0] += 1.0;
    fs::write(&paths.embeddings, serde_json::to_string(&matrix).unwrap()).unwrap();

    assert!(matches!(load_prebuilt(&paths, None), Err(Error::Misaligned(_))));
}

#[test]
fn query_dimension_must_match_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    let embedder = FakeEmbedder::new(16);
    save_prebuilt(&paths, &builtin_index(&embedder), embedder.embedder_id()).unwrap();
    assert!(matches!(
        load_prebuilt(&paths, Some(1536)),
        Err(Error::DimensionMismatch { expected: 1536, actual: 16 })
    ));
}

#[test]
fn hand_written_artifacts_accept_text_and_source_id_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    let matrix = EmbeddingMatrix { rows: 2, dim: 2, data: vec![0.0, 0.0, 1.0, 1.0] };
    let manifest = IndexManifest {
        kind: "flat_l2".into(),
        metric: "l2_squared".into(),
        dimension: 2,
        count: 2,
        embedder_id: "manual".into(),
        matrix_digest: matrix.digest(),
        built_at: chrono::Utc::now(),
    };
    fs::write(&paths.embeddings, serde_json::to_string(&matrix).unwrap()).unwrap();
    fs::write(&paths.index, serde_json::to_string(&manifest).unwrap()).unwrap();
    fs::write(&paths.chunks, r#"[{"text": "origin", "source_id": "a:0"}, {"chunk": "corner"}]"#).unwrap();

    let loaded = load_prebuilt(&paths, Some(2)).unwrap();
    let hits = loaded.index.search(&[0.9, 0.9], 1).unwrap();
    assert_eq!(hits[0].passage, Passage::new("corner"));
    assert_eq!(loaded.index.passage(0), Some(&Passage::with_source("origin", "a:0")));
}

fn write_hand_made(paths: &ArtifactPaths, matrix: &EmbeddingMatrix, dimension: usize) {
    let manifest = IndexManifest {
        kind: "flat_l2".into(),
        metric: "l2_squared".into(),
        dimension,
        count: 2,
        embedder_id: "manual".into(),
        matrix_digest: matrix.digest(),
        built_at: chrono::Utc::now(),
    };
    fs::write(&paths.embeddings, serde_json::to_string(matrix).unwrap()).unwrap();
    fs::write(&paths.index, serde_json::to_string(&manifest).unwrap()).unwrap();
    fs::write(&paths.chunks, r#"[{"chunk": "a"}, {"chunk": "b"}]"#).unwrap();
}

#[test]
fn zero_dimension_artifacts_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    write_hand_made(&paths, &EmbeddingMatrix { rows: 2, dim: 0, data: vec![] }, 0);

    assert!(matches!(load_prebuilt(&paths, Some(0)), Err(Error::Artifact(_))));
    assert!(matches!(load_prebuilt(&paths, None), Err(Error::Artifact(_))));
}

#[test]
fn overflowing_matrix_shape_is_misaligned() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(tmp.path());
    write_hand_made(&paths, &EmbeddingMatrix { rows: usize::MAX, dim: 2, data: vec![0.0; 4] }, 2);

    assert!(matches!(load_prebuilt(&paths, Some(2)), Err(Error::Misaligned(_))));
}

struct FailingAfter {
    calls: AtomicUsize,
    ok_batches: usize,
}

impl Embedder for FailingAfter {
    fn embedder_id(&self) -> &str { "failing" }

    fn dim(&self) -> usize { 2 }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_batches {
            return Err(Error::Provider("quota exceeded".into()));
        }
        Ok(texts.iter().map(|_| vec![0.5, 0.5]).collect())
    }
}

#[test]
fn build_is_all_or_nothing() {
    let embedder = FailingAfter { calls: AtomicUsize::new(0), ok_batches: 1 };
    let result = build_index(&embedder, Corpus::builtin().passages(), 4, false);
    assert!(matches!(result, Err(Error::Provider(_))));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn build_rejects_empty_input() {
    assert!(build_index(&FakeEmbedder::new(8), &[], 8, false).is_err());
}
