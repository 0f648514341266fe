//! Landmark model for the 33-point full-body pose topology and the
//! squat-specific view over it.

use crate::types::{BodySide, PixelPoint};

pub const NUM_LANDMARKS: usize = 33;

// Joint indices of the 33-point pose topology.
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_HEEL: usize = 29;
pub const RIGHT_HEEL: usize = 30;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// Left-side segments drawn on a left profile view.
pub const LEFT_SIDE_CONNECTIONS: &[(usize, usize)] = &[
    (LEFT_SHOULDER, LEFT_ELBOW),
    (LEFT_ELBOW, LEFT_WRIST),
    (LEFT_SHOULDER, LEFT_HIP),
    (LEFT_HIP, LEFT_KNEE),
    (LEFT_KNEE, LEFT_ANKLE),
    (LEFT_ANKLE, LEFT_HEEL),
    (LEFT_HEEL, LEFT_FOOT_INDEX),
];

/// Right-side segments drawn on a right profile view.
pub const RIGHT_SIDE_CONNECTIONS: &[(usize, usize)] = &[
    (RIGHT_SHOULDER, RIGHT_ELBOW),
    (RIGHT_ELBOW, RIGHT_WRIST),
    (RIGHT_SHOULDER, RIGHT_HIP),
    (RIGHT_HIP, RIGHT_KNEE),
    (RIGHT_KNEE, RIGHT_ANKLE),
    (RIGHT_ANKLE, RIGHT_HEEL),
    (RIGHT_HEEL, RIGHT_FOOT_INDEX),
];

pub fn side_connections(side: BodySide) -> &'static [(usize, usize)] {
    match side {
        BodySide::Left => LEFT_SIDE_CONNECTIONS,
        BodySide::Right => RIGHT_SIDE_CONNECTIONS,
    }
}

/// One body-joint estimate from the pose detector: position normalized to
/// [0, 1] within the frame, plus the detector's confidence that the point is
/// genuinely observed rather than occluded or off-frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

impl Landmark {
    /// Project into a frame's pixel grid, rounding to the nearest pixel.
    pub fn project(self, width: u32, height: u32) -> PixelPoint {
        PixelPoint {
            x: (self.x * width as f32).round() as i32,
            y: (self.y * height as f32).round() as i32,
        }
    }
}

/// The full landmark set for one frame, indexed by the joint constants above.
#[derive(Clone, Debug)]
pub struct PoseLandmarks {
    points: Vec<Landmark>,
}

impl PoseLandmarks {
    /// Wraps a detector output. The detector contract is 33 or more points;
    /// shorter outputs are rejected at the decode boundary before reaching
    /// this constructor.
    pub fn new(points: Vec<Landmark>) -> Self {
        debug_assert!(points.len() >= NUM_LANDMARKS);
        Self { points }
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.points[index]
    }
}

/// A left/right pair of the same joint.
#[derive(Clone, Copy, Debug)]
pub struct JointPair {
    pub left: Landmark,
    pub right: Landmark,
}

impl JointPair {
    pub fn visibility_gap(&self) -> f32 {
        (self.left.visibility - self.right.visibility).abs()
    }

    pub fn pick(&self, side: BodySide) -> Landmark {
        match side {
            BodySide::Left => self.left,
            BodySide::Right => self.right,
        }
    }
}

/// Squat-relevant named joints for one frame.
#[derive(Clone, Copy, Debug)]
pub struct SquatPose {
    pub shoulders: JointPair,
    pub hips: JointPair,
    pub elbows: JointPair,
    pub knees: JointPair,
    pub ankles: JointPair,
    pub feet: JointPair,
}

impl SquatPose {
    pub fn from_landmarks(landmarks: &PoseLandmarks) -> Self {
        let pair = |left, right| JointPair {
            left: landmarks.get(left),
            right: landmarks.get(right),
        };
        Self {
            shoulders: pair(LEFT_SHOULDER, RIGHT_SHOULDER),
            hips: pair(LEFT_HIP, RIGHT_HIP),
            elbows: pair(LEFT_ELBOW, RIGHT_ELBOW),
            knees: pair(LEFT_KNEE, RIGHT_KNEE),
            ankles: pair(LEFT_ANKLE, RIGHT_ANKLE),
            feet: pair(LEFT_FOOT_INDEX, RIGHT_FOOT_INDEX),
        }
    }

    /// The five anatomical pairs the viewpoint classifier weighs:
    /// shoulders, hips, elbows, knees, ankles.
    pub fn classifier_pairs(&self) -> [JointPair; 5] {
        [
            self.shoulders,
            self.hips,
            self.elbows,
            self.knees,
            self.ankles,
        ]
    }

    pub fn shoulder_midpoint(&self, width: u32, height: u32) -> PixelPoint {
        PixelPoint::midpoint(
            self.shoulders.left.project(width, height),
            self.shoulders.right.project(width, height),
        )
    }

    pub fn hip_midpoint(&self, width: u32, height: u32) -> PixelPoint {
        PixelPoint::midpoint(
            self.hips.left.project(width, height),
            self.hips.right.project(width, height),
        )
    }

    pub fn foot_midpoint(&self, width: u32, height: u32) -> PixelPoint {
        PixelPoint::midpoint(
            self.feet.left.project(width, height),
            self.feet.right.project(width, height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_rounds_to_nearest_pixel() {
        let lm = Landmark {
            x: 0.5004,
            y: 0.2496,
            visibility: 1.0,
        };
        let p = lm.project(1000, 1000);
        assert_eq!(p, PixelPoint { x: 500, y: 250 });
    }

    #[test]
    fn midpoint_is_integer_average() {
        let a = PixelPoint { x: 10, y: 20 };
        let b = PixelPoint { x: 21, y: 30 };
        assert_eq!(PixelPoint::midpoint(a, b), PixelPoint { x: 15, y: 25 });
    }

    #[test]
    fn squat_pose_picks_the_paired_joints() {
        let mut points = vec![Landmark::default(); NUM_LANDMARKS];
        points[LEFT_KNEE] = Landmark {
            x: 0.3,
            y: 0.7,
            visibility: 0.9,
        };
        points[RIGHT_KNEE] = Landmark {
            x: 0.6,
            y: 0.7,
            visibility: 0.4,
        };
        let pose = SquatPose::from_landmarks(&PoseLandmarks::new(points));
        assert_eq!(pose.knees.left.x, 0.3);
        assert_eq!(pose.knees.right.x, 0.6);
        assert!((pose.knees.visibility_gap() - 0.5).abs() < 1e-6);
        assert_eq!(pose.knees.pick(BodySide::Right).visibility, 0.4);
    }
}
