//! Exact nearest-neighbour search with squared L2 distance.
//!
//! Each entry owns its passage and its vector, so a position always resolves
//! to the passage that was embedded for it.

use hemo_core::error::{Error, Result};
use hemo_core::traits::VectorIndex;
use hemo_core::types::{Passage, SearchHit};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub passage: Passage,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    entries: Vec<IndexEntry>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self { dim, entries: Vec::new() }
    }

    /// Append a passage with its embedding; returns the new entry's position.
    pub fn add(&mut self, passage: Passage, vector: Vec<f32>) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        if let Some(i) = vector.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidVector(format!("component {i} is not finite")));
        }
        self.entries.push(IndexEntry { passage, vector });
        Ok(self.entries.len() - 1)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn passage(&self, position: usize) -> Option<&Passage> {
        self.entries.get(position).map(|e| &e.passage)
    }

    /// Up to `k` entries ordered by increasing distance; ties keep insertion order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, squared_l2(query, &e.vector)))
            .collect();
        // stable sort keeps the lower position first on equal distance
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k.min(self.entries.len()));
        Ok(scored)
    }
}

impl VectorIndex for FlatL2Index {
    fn dim(&self) -> usize { self.dim }

    fn len(&self) -> usize { self.entries.len() }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        Ok(self
            .nearest(query, k)?
            .into_iter()
            .map(|(position, distance)| SearchHit {
                position,
                distance,
                passage: self.entries[position].passage.clone(),
            })
            .collect())
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
