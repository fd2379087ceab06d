//! Dual-hand role separation.
//!
//! Every frame carries 0-2 detected hands. One hand shapes the symbol
//! (classification hand), the other commits it by closing (trigger hand).

use super::landmarks::{HandFrame, HandPose, Handedness};

/// Handedness label assigned the classification (dominant) role.
///
/// The camera preview is horizontally mirrored, so the pipeline's "Left"
/// label is the user's right hand. This mapping is the single place the
/// mirroring convention is encoded; do not duplicate it elsewhere.
pub const CLASSIFIER_HANDEDNESS: Handedness = Handedness::Left;

/// Handedness label assigned the trigger role.
pub const TRIGGER_HANDEDNESS: Handedness = Handedness::Right;

/// Role assignment for one frame. Either slot may be empty.
#[derive(Debug, Default)]
pub struct HandRoles<'a> {
    pub classifier: Option<&'a HandPose>,
    pub trigger: Option<&'a HandPose>,
}

/// Split the frame's hands into classification and trigger roles.
///
/// At most one hand per role; if the pipeline reports duplicate
/// handedness labels (sensor noise), the first encountered wins.
pub fn assign_roles(hands: &[HandFrame]) -> HandRoles<'_> {
    let mut roles = HandRoles::default();
    for hand in hands {
        let slot = if hand.handedness == CLASSIFIER_HANDEDNESS {
            &mut roles.classifier
        } else {
            &mut roles.trigger
        };
        if slot.is_none() {
            *slot = Some(&hand.pose);
        }
    }
    roles
}

// ── Tests ──────────────────────────────────────────────────
