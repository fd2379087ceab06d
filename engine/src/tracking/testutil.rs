//! Shared pose constructors for unit tests.

use super::landmarks::{HandPose, Landmark, FINGER_MCPS, FINGER_TIPS, LANDMARK_COUNT};

/// Pose with every landmark computed from its index.
pub fn pose_with(f: impl Fn(usize) -> (f64, f64, f64)) -> HandPose {
    let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
    for (i, lm) in landmarks.iter_mut().enumerate() {
        let (x, y, z) = f(i);
        *lm = Landmark::new(x, y, z);
    }
    HandPose::new(landmarks)
}

/// Degenerate pose: all 21 landmarks at the same point.
pub fn uniform_pose(x: f64, y: f64, z: f64) -> HandPose {
    pose_with(|_| (x, y, z))
}

/// Non-degenerate pose with distinct landmark positions.
pub fn spread_pose() -> HandPose {
    pose_with(|i| (0.02 * i as f64, 0.5 + 0.01 * i as f64, 0.005 * i as f64))
}

/// Pose with each fingertip offset from its MCP joint by `tip_offset`
/// in y. Zero offset yields a fist; a large offset an open hand.
pub fn finger_pose(tip_offset: f64) -> HandPose {
    let mut pose = uniform_pose(0.5, 0.8, 0.0);
    for (f, (&tip, &mcp)) in FINGER_TIPS.iter().zip(FINGER_MCPS.iter()).enumerate() {
        let bx = 0.2 + 0.12 * f as f64;
        pose.landmarks[mcp] = Landmark::new(bx, 0.5, 0.0);
        pose.landmarks[tip] = Landmark::new(bx, 0.5 - tip_offset, 0.0);
    }
    pose
}

/// Fully closed hand: every fingertip on its MCP joint.
pub fn closed_pose() -> HandPose {
    finger_pose(0.0)
}

/// Open hand: every fingertip well away from its MCP joint.
pub fn open_pose() -> HandPose {
    finger_pose(0.3)
}
