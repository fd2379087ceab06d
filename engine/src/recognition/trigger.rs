//! Trigger-hand debounce: closed-fist detection and edge-triggered commits.
//!
//! A commit fires only on an open-to-closed transition of the trigger
//! hand, and never more than once per minimum interval, regardless of
//! how many edges occur.

use tracing::debug;

use crate::tracking::landmarks::{HandPose, FINGER_MCPS, FINGER_TIPS};

// ── Config ─────────────────────────────────────────────────

/// Tunable thresholds for the trigger state machine.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Maximum planar tip-to-MCP distance for a finger to count as
    /// curled, in the acquisition pipeline's 0..1 coordinate space.
    pub curl_threshold: f64,
    /// Curled fingers required for the hand to count as closed.
    pub min_curled_fingers: usize,
    /// Minimum interval between commits, in milliseconds.
    pub min_commit_interval_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            curl_threshold: 0.05,
            min_curled_fingers: 4,
            min_commit_interval_ms: 500,
        }
    }
}

impl TriggerConfig {
    /// Format as an s-expression plist for IPC.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:curl-threshold {:.3} :min-curled-fingers {} :min-commit-interval-ms {})",
            self.curl_threshold, self.min_curled_fingers, self.min_commit_interval_ms
        )
    }
}

// ── State ──────────────────────────────────────────────────

/// Per-session trigger state, updated once per frame.
#[derive(Debug, Clone, Default)]
pub struct TriggerState {
    /// Whether the trigger hand is currently closed.
    pub closed: bool,
    /// Closed state from the previous frame, for edge detection.
    pub was_closed: bool,
    /// Time of the last fired commit. None until the first commit, so
    /// the very first closure always passes the rate check.
    pub last_commit_ms: Option<u64>,
}

impl TriggerState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Whether the hand is closed: at least `min_curled_fingers` of the five
/// fingers have their tip within `curl_threshold` of their MCP joint.
///
/// Measured on the raw pose in planar (x, y) image coordinates, not the
/// centroid-normalized pose. Deliberately coarse: tolerating one uncurled
/// finger keeps a reluctant thumb from blocking commits.
pub fn is_closed(pose: &HandPose, config: &TriggerConfig) -> bool {
    let mut curled = 0;
    for (&tip, &mcp) in FINGER_TIPS.iter().zip(FINGER_MCPS.iter()) {
        let dist = pose.landmarks[tip].planar_distance(&pose.landmarks[mcp]);
        if dist < config.curl_threshold {
            curled += 1;
        }
    }
    curled >= config.min_curled_fingers
}

/// Advance the trigger state machine by one frame.
///
/// Returns true exactly when a commit should fire: on a rising edge of
/// the closed state, no sooner than the minimum interval after the last
/// commit. An absent trigger hand resets the edge detector without
/// firing.
pub fn update(
    state: &mut TriggerState,
    config: &TriggerConfig,
    pose: Option<&HandPose>,
    now_ms: u64,
) -> bool {
    let pose = match pose {
        Some(p) => p,
        None => {
            state.closed = false;
            state.was_closed = false;
            return false;
        }
    };

    let closed = is_closed(pose, config);
    let interval_ok = state
        .last_commit_ms
        .map_or(true, |last| now_ms.saturating_sub(last) >= config.min_commit_interval_ms);
    let fire = closed && !state.was_closed && interval_ok;

    if fire {
        state.last_commit_ms = Some(now_ms);
        debug!(now_ms, "trigger commit fired");
    }
    state.closed = closed;
    state.was_closed = closed;
    fire
}

// ── Tests ──────────────────────────────────────────────────
