//! Landmark normalization: translation- and scale-invariant poses.
//!
//! Both live poses and stored reference poses pass through `normalize`
//! immediately before scoring. The registry keeps raw poses only, so a
//! normalized pose can never be compared against a raw one by accident.

use super::landmarks::{HandPose, LANDMARK_COUNT};

/// Center a pose on its centroid and scale it so the farthest landmark
/// sits at distance 1.
///
/// A degenerate pose whose landmarks all coincide has a zero maximum
/// distance; it is returned translated but unscaled.
pub fn normalize(pose: &HandPose) -> HandPose {
    let n = LANDMARK_COUNT as f64;
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut cz = 0.0;
    for lm in &pose.landmarks {
        cx += lm.x;
        cy += lm.y;
        cz += lm.z;
    }
    cx /= n;
    cy /= n;
    cz /= n;

    let mut out = pose.clone();
    let mut max_dist: f64 = 0.0;
    for lm in &mut out.landmarks {
        lm.x -= cx;
        lm.y -= cy;
        lm.z -= cz;
        let dist = (lm.x * lm.x + lm.y * lm.y + lm.z * lm.z).sqrt();
        max_dist = max_dist.max(dist);
    }

    if max_dist > 0.0 {
        for lm in &mut out.landmarks {
            lm.x /= max_dist;
            lm.y /= max_dist;
            lm.z /= max_dist;
        }
    }
    out
}

// ── Tests ──────────────────────────────────────────────────
