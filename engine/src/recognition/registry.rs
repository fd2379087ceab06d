//! Reference gesture registry: named poses captured by the training flow.
//!
//! Readers (the classifier, every frame) take an `Arc` snapshot of the
//! whole map; `upsert` builds a new map and swaps it in. A snapshot taken
//! before an upsert therefore never observes a partial update.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::tracking::landmarks::HandPose;

/// A named reference pose used for matching.
///
/// Poses are stored raw, exactly as captured; normalization happens in
/// the classifier immediately before scoring.
#[derive(Debug, Clone)]
pub struct GestureModel {
    pub name: String,
    pub pose: HandPose,
}

/// Mapping from gesture name to its reference model.
#[derive(Debug, Clone, Default)]
pub struct GestureRegistry {
    models: Arc<HashMap<String, GestureModel>>,
}

impl GestureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the model for `name` (last write wins).
    pub fn upsert(&mut self, name: &str, pose: HandPose) {
        let mut next = (*self.models).clone();
        let replaced = next
            .insert(
                name.to_string(),
                GestureModel {
                    name: name.to_string(),
                    pose,
                },
            )
            .is_some();
        self.models = Arc::new(next);
        info!(name, replaced, total = self.models.len(), "gesture trained");
    }

    pub fn get(&self, name: &str) -> Option<&GestureModel> {
        self.models.get(name)
    }

    /// Consistent snapshot of all models at the time of the call.
    pub fn snapshot(&self) -> Arc<HashMap<String, GestureModel>> {
        Arc::clone(&self.models)
    }

    /// All trained names, sorted for stable listing.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────
