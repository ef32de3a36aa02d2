//! Flat L2 vector index over passages, its on-disk artifacts, and the
//! all-or-nothing builder that fills it from an embedder.

pub mod artifacts;
pub mod build;
pub mod index;

pub use artifacts::{load_prebuilt, save_prebuilt, ArtifactPaths, IndexManifest, LoadedIndex};
pub use build::{build_index, DEFAULT_BATCH_SIZE};
pub use index::{squared_l2, FlatL2Index, IndexEntry};
