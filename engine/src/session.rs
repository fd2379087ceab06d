//! Practice sessions: the per-frame pipeline from detected hands to
//! buffer mutation.
//!
//! Each session owns its vocabulary, trigger state, and buffer; nothing
//! is shared between sessions, so concurrent sessions (or tests) never
//! interfere.

use tracing::debug;

use crate::input::buffer::{apply_commit, Buffer, BufferKind};
use crate::recognition::classifier::{classify, ClassificationResult};
use crate::recognition::registry::GestureRegistry;
use crate::recognition::trigger::{self, TriggerConfig, TriggerState};
use crate::recognition::vocabulary::{Preset, Vocabulary};
use crate::tracking::landmarks::HandFrame;
use crate::tracking::roles::assign_roles;

// ── Config ─────────────────────────────────────────────────

/// Per-session configuration, fixed at session start (except trigger
/// thresholds, which are tunable at runtime).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub vocabulary: Vocabulary,
    pub buffer: BufferKind,
    pub trigger: TriggerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::preset(Preset::Alphabet),
            buffer: BufferKind::Text,
            trigger: TriggerConfig::default(),
        }
    }
}

// ── Session ────────────────────────────────────────────────

/// One live practice session.
pub struct PracticeSession {
    pub name: String,
    pub config: SessionConfig,
    pub trigger: TriggerState,
    pub buffer: Buffer,
    /// Classification of the most recent frame.
    pub classification: ClassificationResult,
    pub frames_seen: u64,
    pub commits_fired: u64,
    pub last_commit_symbol: Option<String>,
}

impl PracticeSession {
    pub fn new(name: &str, config: SessionConfig) -> Self {
        let classification = ClassificationResult::zeroed(&config.vocabulary);
        let buffer = Buffer::new(config.buffer);
        Self {
            name: name.to_string(),
            config,
            trigger: TriggerState::default(),
            buffer,
            classification,
            frames_seen: 0,
            commits_fired: 0,
            last_commit_symbol: None,
        }
    }

    /// Run one frame through the full pipeline: role assignment,
    /// classification, trigger debounce, buffer mutation.
    ///
    /// Returns the committed symbol, if this frame fired a commit.
    pub fn process_frame(
        &mut self,
        registry: &GestureRegistry,
        hands: &[HandFrame],
        now_ms: u64,
    ) -> Option<String> {
        self.frames_seen += 1;
        let roles = assign_roles(hands);
        self.classification = classify(registry, roles.classifier, &self.config.vocabulary);
        let commit = trigger::update(&mut self.trigger, &self.config.trigger, roles.trigger, now_ms);
        let committed = apply_commit(&self.classification, commit, &mut self.buffer);
        if let Some(symbol) = &committed {
            self.commits_fired += 1;
            self.last_commit_symbol = Some(symbol.clone());
            debug!(session = %self.name, symbol = %symbol, now_ms, "symbol committed");
        }
        committed
    }

    /// Restore the session to its just-started state.
    pub fn reset(&mut self) {
        self.trigger.reset();
        self.buffer.clear();
        self.classification = ClassificationResult::zeroed(&self.config.vocabulary);
        self.frames_seen = 0;
        self.commits_fired = 0;
        self.last_commit_symbol = None;
    }

    /// Format a full session snapshot as an s-expression plist.
    pub fn status_sexp(&self) -> String {
        let last_commit = self
            .last_commit_symbol
            .as_ref()
            .map(|s| format!("\"{}\"", s))
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:session \"{}\" :vocabulary-size {} :closed {} :classification {} :buffer {} :frames {} :commits {} :last-commit {})",
            self.name,
            self.config.vocabulary.len(),
            if self.trigger.closed { "t" } else { "nil" },
            self.classification.status_sexp(),
            self.buffer.status_sexp(),
            self.frames_seen,
            self.commits_fired,
            last_commit,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
