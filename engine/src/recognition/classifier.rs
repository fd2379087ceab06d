//! Pose classification: score a live pose against every vocabulary entry.
//!
//! A plain linear scan over the vocabulary, rescoring all 21 landmarks
//! per entry. Vocabularies stay small (tens of names) and frames arrive
//! tens of milliseconds apart, so nothing cleverer is warranted.

use tracing::debug;

use super::registry::GestureRegistry;
use super::vocabulary::Vocabulary;
use crate::tracking::landmarks::{HandPose, LANDMARK_COUNT};
use crate::tracking::normalize::normalize;

/// Per-frame classification output for the classification hand.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Score per vocabulary name, in vocabulary order, each in 0..100.
    pub scores: Vec<(String, f64)>,
    /// Name of the best-scoring entry, if a live pose was present.
    pub best_name: Option<String>,
    /// Score of the best entry (0 when no live pose was present).
    pub best_score: f64,
}

impl ClassificationResult {
    /// The all-zero result used when no classification hand is present.
    pub fn zeroed(vocabulary: &Vocabulary) -> Self {
        Self {
            scores: vocabulary
                .names()
                .iter()
                .map(|n| (n.clone(), 0.0))
                .collect(),
            best_name: None,
            best_score: 0.0,
        }
    }

    /// Format as an s-expression plist for IPC snapshots.
    pub fn status_sexp(&self) -> String {
        let best = self
            .best_name
            .as_ref()
            .map(|n| format!("\"{}\"", n))
            .unwrap_or_else(|| "nil".to_string());
        let mut scores = String::from("(");
        for (i, (name, score)) in self.scores.iter().enumerate() {
            if i > 0 {
                scores.push(' ');
            }
            scores.push_str(&format!("(\"{}\" . {:.1})", name, score));
        }
        scores.push(')');
        format!(
            "(:best {} :best-score {:.1} :scores {})",
            best, self.best_score, scores
        )
    }
}

/// Similarity between two already-normalized poses, in 0..100.
///
/// Mean landmark-to-landmark Euclidean distance, inverted and clamped.
fn similarity(live: &HandPose, reference: &HandPose) -> f64 {
    let mut total = 0.0;
    for (a, b) in live.landmarks.iter().zip(reference.landmarks.iter()) {
        total += a.distance(b);
    }
    let mean = total / LANDMARK_COUNT as f64;
    (1.0 - mean).clamp(0.0, 1.0) * 100.0
}

/// Score `live` against every vocabulary entry and pick the best match.
///
/// Names without a trained model score 0. Ties keep the first-seen
/// maximum, so vocabulary order is the defined tie-break. With no live
/// pose, returns the all-zero result.
pub fn classify(
    registry: &GestureRegistry,
    live: Option<&HandPose>,
    vocabulary: &Vocabulary,
) -> ClassificationResult {
    let live = match live {
        Some(pose) => normalize(pose),
        None => return ClassificationResult::zeroed(vocabulary),
    };

    let models = registry.snapshot();
    let mut scores = Vec::with_capacity(vocabulary.len());
    let mut best_name: Option<String> = None;
    let mut best_score = 0.0;

    for name in vocabulary.names() {
        let score = models
            .get(name)
            .map(|model| similarity(&live, &normalize(&model.pose)))
            .unwrap_or(0.0);
        if best_name.is_none() || score > best_score {
            best_name = Some(name.clone());
            best_score = score;
        }
        scores.push((name.clone(), score));
    }

    if let Some(name) = &best_name {
        debug!(best = %name, score = format!("{best_score:.1}"), "classified");
    }

    ClassificationResult {
        scores,
        best_name,
        best_score,
    }
}

// ── Tests ──────────────────────────────────────────────────
