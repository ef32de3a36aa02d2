use hemo_core::config::{EmbeddingProviderKind, EmbeddingSettings};
use hemo_core::traits::Embedder;
use hemo_embed::{embedder_from_settings, FakeEmbedder};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(1024);
    let texts = vec!["sickle cell trait".to_string(), "sickle cell trait".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_single_embed_matches_batch() {
    let embedder = FakeEmbedder::new(64);
    let single = embedder.embed("beta thalassemia").unwrap();
    let batch = embedder.embed_batch(&["beta thalassemia".to_string()]).unwrap();
    assert_eq!(single, batch[0]);
    assert_eq!(embedder.embedder_id(), "fake:xxhash64:d64");
}

#[test]
fn shared_tokens_are_closer_than_unrelated_text() {
    let embedder = FakeEmbedder::new(4096);
    let q = embedder.embed("alpha thalassemia genes").unwrap();
    let near = embedder.embed("alpha thalassemia genes anemia").unwrap();
    let far = embedder.embed("vaccination hydration nutrition").unwrap();
    let d = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>();
    assert!(d(&q, &near) < d(&q, &far));
}

#[test]
fn settings_select_fake_provider() {
    let settings = EmbeddingSettings { provider: EmbeddingProviderKind::Fake, dimension: 32, ..Default::default() };
    let embedder = embedder_from_settings(&settings).expect("fake provider");
    assert_eq!(embedder.dim(), 32);
}

#[cfg(not(feature = "local-model"))]
#[test]
fn local_provider_requires_feature() {
    let settings = EmbeddingSettings { provider: EmbeddingProviderKind::Local, ..Default::default() };
    if hemo_embed::fake_embeddings_requested() { return; }
    assert!(embedder_from_settings(&settings).is_err());
}
