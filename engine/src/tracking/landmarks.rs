//! Hand landmark data structures.
//!
//! A hand pose is a fixed sequence of 21 landmarks in the acquisition
//! pipeline's normalized image space (x/y in 0..1, z a relative depth),
//! indexed anatomically: wrist=0, thumb tip=4, index tip=8, middle tip=12,
//! ring tip=16, pinky tip=20.

// ── Landmark ───────────────────────────────────────────────

/// A single 3D point of a tracked hand skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Planar (x, y) distance to another landmark, ignoring depth.
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ── Pose ───────────────────────────────────────────────────

/// Number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Fingertip landmark indices (thumb, index, middle, ring, pinky).
pub const FINGER_TIPS: [usize; 5] = [4, 8, 12, 16, 20];

/// Finger base (MCP) landmark indices, in the same order as `FINGER_TIPS`.
pub const FINGER_MCPS: [usize; 5] = [2, 5, 9, 13, 17];

/// The full 21-landmark set for one hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandPose {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    /// Build a pose from a flat coordinate list (x y z per landmark).
    /// Returns None unless exactly 63 values are supplied.
    pub fn from_coords(coords: &[f64]) -> Option<Self> {
        if coords.len() != LANDMARK_COUNT * 3 {
            return None;
        }
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (i, chunk) in coords.chunks_exact(3).enumerate() {
            landmarks[i] = Landmark::new(chunk[0], chunk[1], chunk[2]);
        }
        Some(Self { landmarks })
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Left/Right label as reported by the acquisition pipeline.
///
/// The camera view is horizontally flipped for display, so this label is
/// mirrored relative to the user: "Left" is the user's right hand and
/// vice versa. Role assignment (see `roles`) depends on this convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a handedness string ("left" or "right").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One detected hand in one captured frame.
#[derive(Debug, Clone)]
pub struct HandFrame {
    pub pose: HandPose,
    pub handedness: Handedness,
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_planar_distance_ignores_depth() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(3.0, 4.0, 100.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_coords_valid() {
        let coords: Vec<f64> = (0..LANDMARK_COUNT * 3).map(|i| i as f64).collect();
        let pose = HandPose::from_coords(&coords).unwrap();
        assert_eq!(pose.landmarks[0], Landmark::new(0.0, 1.0, 2.0));
        assert_eq!(pose.landmarks[20], Landmark::new(60.0, 61.0, 62.0));
    }

    #[test]
    fn test_from_coords_wrong_count() {
        assert!(HandPose::from_coords(&[0.0; 10]).is_none());
        assert!(HandPose::from_coords(&[]).is_none());
        assert!(HandPose::from_coords(&[0.0; 64]).is_none());
    }

    #[test]
    fn test_tip_mcp_pairing() {
        // Tips and MCPs line up finger by finger.
        assert_eq!(FINGER_TIPS.len(), FINGER_MCPS.len());
        for (tip, mcp) in FINGER_TIPS.iter().zip(FINGER_MCPS.iter()) {
            assert!(tip > mcp);
            assert!(*tip < LANDMARK_COUNT);
        }
    }

    #[test]
    fn test_handedness_parse() {
        assert_eq!(Handedness::parse("left"), Some(Handedness::Left));
        assert_eq!(Handedness::parse("right"), Some(Handedness::Right));
        assert_eq!(Handedness::parse("both"), None);
    }

    #[test]
    fn test_handedness_as_str() {
        assert_eq!(Handedness::Left.as_str(), "left");
        assert_eq!(Handedness::Right.as_str(), "right");
    }
}
