//! Planar geometry over frame coordinates.
//!
//! All functions work on `(x, y)` tuples in whichever space the caller is in
//! (normalized or pixel); angles come back in degrees.

use thiserror::Error;

/// A vertex angle is undefined when one of its arms has zero length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("zero-length vector between joint points; angle is undefined")]
pub struct DegenerateInput;

/// Angle ABC at vertex `b`, in degrees.
///
/// Uses the dot-product form `cos(θ) = (BA · BC) / (|BA| · |BC|)`, with the
/// cosine clamped to [-1, 1] before `acos` so floating-point overshoot on
/// near-collinear input cannot leave the domain.
pub fn angle_at_vertex(
    a: (f32, f32),
    b: (f32, f32),
    c: (f32, f32),
) -> Result<f32, DegenerateInput> {
    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);

    let mag_ba = (ba.0 * ba.0 + ba.1 * ba.1).sqrt();
    let mag_bc = (bc.0 * bc.0 + bc.1 * bc.1).sqrt();
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return Err(DegenerateInput);
    }

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let cos_theta = (dot / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    Ok(cos_theta.acos().to_degrees())
}

/// Signed heading of the vector A→B in whole degrees.
///
/// Coincident points have no direction; callers expect a numeric default
/// there, so this returns 0 rather than failing.
pub fn angle_between(a: (f32, f32), b: (f32, f32)) -> i32 {
    if a == b {
        return 0;
    }

    let delta_x = b.0 - a.0;
    let delta_y = b.1 - a.1;
    delta_y.atan2(delta_x).to_degrees().round() as i32
}

/// Euclidean distance between two points.
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}
