//! Camera viewpoint and visible-side classification from landmark
//! visibility scores.
//!
//! Visibility approximates self-occlusion: both sides reading roughly equal
//! means the camera is behind (or in front of) the lifter, while one side
//! substantially more confident than the other means a profile view with
//! that side facing the camera.

use thiserror::Error;

use crate::pose::SquatPose;
use crate::types::{BodySide, Viewpoint};

pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.2;

/// Left and right aggregate visibility came out exactly equal, so no side
/// dominates and the filmed side cannot be determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("left and right visibility are exactly equal; filmed side is undetermined")]
pub struct AmbiguousSide;

/// Decide the camera viewpoint for one frame.
///
/// A pair is balanced when its left/right visibility difference is below
/// `threshold`. All five pairs balanced means the camera sees both sides
/// equally: a back view. Anything else is a side view of whichever side's
/// summed visibility dominates.
pub fn classify(pose: &SquatPose, threshold: f32) -> Result<Viewpoint, AmbiguousSide> {
    let all_balanced = pose
        .classifier_pairs()
        .iter()
        .all(|pair| pair.visibility_gap() < threshold);

    if all_balanced {
        Ok(Viewpoint::Back)
    } else {
        visible_side(pose).map(Viewpoint::Side)
    }
}

/// Which side faces the camera, by summed visibility over the shoulder, hip,
/// elbow, knee and ankle. An exact tie is surfaced, never defaulted.
pub fn visible_side(pose: &SquatPose) -> Result<BodySide, AmbiguousSide> {
    let pairs = pose.classifier_pairs();
    let left: f32 = pairs.iter().map(|pair| pair.left.visibility).sum();
    let right: f32 = pairs.iter().map(|pair| pair.right.visibility).sum();

    if right > left {
        Ok(BodySide::Right)
    } else if left > right {
        Ok(BodySide::Left)
    } else {
        Err(AmbiguousSide)
    }
}
