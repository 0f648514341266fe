//! Barbell plate detection.
//!
//! Weight plates read as large circles in a squat video, so the detector
//! blurs the grayscale frame, extracts Sobel edges and runs a Hough gradient
//! circle transform over a plate-sized radius range. Every edge pixel votes
//! for the two candidate centers one radius away along its gradient
//! direction; accumulator peaks that collect enough of a circle's
//! circumference become candidates.
//!
//! This is a coarse per-frame heuristic with no memory of prior positions.
//! Continuity across frames is the bar path's job, and a candidate far from
//! the lifter's torso is rejected by the anchor plausibility filter rather
//! than by tracking.

use image::{GrayImage, imageops};
use ndarray::Array2;
use rayon::prelude::*;

use crate::geometry;
use crate::types::PixelPoint;

/// Tuning knobs for the circle transform. Radius defaults assume plate-sized
/// circles at typical squat-video resolutions.
#[derive(Clone, Debug)]
pub struct HoughParams {
    /// Gaussian blur sigma applied before edge extraction.
    pub blur_sigma: f32,
    pub min_radius: u32,
    pub max_radius: u32,
    pub radius_step: u32,
    /// Minimum Sobel gradient magnitude for a pixel to cast votes.
    pub edge_threshold: f32,
    /// Fraction of a circle's circumference that must vote for a center.
    pub vote_threshold: f32,
    /// Candidate centers closer than this collapse into the stronger one.
    pub min_center_distance: f32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            min_radius: 120,
            max_radius: 200,
            radius_step: 4,
            edge_threshold: 80.0,
            vote_threshold: 0.25,
            min_center_distance: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Circle {
    pub center: PixelPoint,
    pub radius: u32,
    pub votes: u32,
}

/// Locates the barbell center in a grayscale frame, if a plausible one
/// exists.
///
/// Candidates are ordered by vote strength; the first whose center lies
/// within `max_distance` of `anchor` (typically the shoulder midpoint) wins.
/// No circles, or none near the anchor, is a normal no-observation outcome.
pub fn detect(
    gray: &GrayImage,
    anchor: PixelPoint,
    max_distance: f32,
    params: &HoughParams,
) -> Option<PixelPoint> {
    detect_circles(gray, params)
        .iter()
        .find(|circle| geometry::distance(circle.center.as_f32(), anchor.as_f32()) <= max_distance)
        .map(|circle| circle.center)
}

/// Runs the full transform and returns candidate circles, strongest first.
pub fn detect_circles(gray: &GrayImage, params: &HoughParams) -> Vec<Circle> {
    let blurred = imageops::blur(gray, params.blur_sigma);
    let edges = sobel_edges(&blurred, params.edge_threshold);
    if edges.is_empty() {
        return Vec::new();
    }

    let (width, height) = gray.dimensions();
    let radii: Vec<u32> = (params.min_radius..=params.max_radius)
        .step_by(params.radius_step.max(1) as usize)
        .collect();

    let mut circles: Vec<Circle> = radii
        .into_par_iter()
        .filter_map(|radius| best_center_for_radius(&edges, width, height, radius, params))
        .collect();

    circles.sort_by(|a, b| b.votes.cmp(&a.votes));

    // Collapse near-duplicate centers found at neighboring radii.
    let mut kept: Vec<Circle> = Vec::new();
    for circle in circles {
        let distinct = kept.iter().all(|k| {
            geometry::distance(circle.center.as_f32(), k.center.as_f32())
                > params.min_center_distance
        });
        if distinct {
            kept.push(circle);
        }
    }
    kept
}

struct EdgePoint {
    x: f32,
    y: f32,
    // unit gradient direction
    dx: f32,
    dy: f32,
}

fn sobel_edges(gray: &GrayImage, threshold: f32) -> Vec<EdgePoint> {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return Vec::new();
    }

    let mut edges = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let p = |ox: i32, oy: i32| {
                gray.get_pixel((x as i32 + ox) as u32, (y as i32 + oy) as u32).0[0] as f32
            };
            let gx = p(1, -1) + 2.0 * p(1, 0) + p(1, 1) - p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1);
            let gy = p(-1, 1) + 2.0 * p(0, 1) + p(1, 1) - p(-1, -1) - 2.0 * p(0, -1) - p(1, -1);
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude >= threshold {
                edges.push(EdgePoint {
                    x: x as f32,
                    y: y as f32,
                    dx: gx / magnitude,
                    dy: gy / magnitude,
                });
            }
        }
    }
    edges
}

/// Accumulates center votes for one radius and returns the strongest cell if
/// it clears the circumference-fraction threshold.
fn best_center_for_radius(
    edges: &[EdgePoint],
    width: u32,
    height: u32,
    radius: u32,
    params: &HoughParams,
) -> Option<Circle> {
    let mut acc = Array2::<u32>::zeros((height as usize, width as usize));
    let r = radius as f32;

    for edge in edges {
        // The gradient points across the circle boundary; the center lies one
        // radius away on one of the two sides.
        for direction in [-1.0f32, 1.0] {
            let cx = (edge.x + direction * edge.dx * r).round() as i32;
            let cy = (edge.y + direction * edge.dy * r).round() as i32;
            if cx >= 0 && cy >= 0 && (cx as u32) < width && (cy as u32) < height {
                acc[[cy as usize, cx as usize]] += 1;
            }
        }
    }

    let needed = (params.vote_threshold * std::f32::consts::TAU * r).ceil() as u32;
    let mut best: Option<Circle> = None;
    for cy in 1..height as usize - 1 {
        for cx in 1..width as usize - 1 {
            if acc[[cy, cx]] == 0 {
                continue;
            }
            // Blur spreads votes over neighboring cells; score a 3x3 patch.
            let mut votes = 0u32;
            for oy in cy - 1..=cy + 1 {
                for ox in cx - 1..=cx + 1 {
                    votes += acc[[oy, ox]];
                }
            }
            if votes >= needed.max(1) && best.as_ref().is_none_or(|b| votes > b.votes) {
                best = Some(Circle {
                    center: PixelPoint {
                        x: cx as i32,
                        y: cy as i32,
                    },
                    radius,
                    votes,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn test_params() -> HoughParams {
        HoughParams {
            blur_sigma: 1.2,
            min_radius: 30,
            max_radius: 50,
            radius_step: 2,
            edge_threshold: 30.0,
            vote_threshold: 0.25,
            min_center_distance: 30.0,
        }
    }

    /// White ring of the given radius and stroke on a black background.
    fn ring_image(width: u32, height: u32, cx: f32, cy: f32, radius: f32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            if (d - radius).abs() <= 2.5 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    #[test]
    fn finds_a_drawn_circle_near_its_true_center() {
        let img = ring_image(400, 400, 200.0, 200.0, 40.0);
        let circles = detect_circles(&img, &test_params());
        assert!(!circles.is_empty());
        let top = circles[0];
        assert!((top.center.x - 200).abs() <= 5, "center x {}", top.center.x);
        assert!((top.center.y - 200).abs() <= 5, "center y {}", top.center.y);
    }

    #[test]
    fn anchor_filter_accepts_nearby_center() {
        let img = ring_image(400, 400, 200.0, 200.0, 40.0);
        let anchor = PixelPoint { x: 210, y: 190 };
        let found = detect(&img, anchor, 60.0, &test_params());
        assert!(found.is_some());
        let center = found.unwrap();
        assert!((center.x - 200).abs() <= 5 && (center.y - 200).abs() <= 5);
    }

    #[test]
    fn anchor_filter_rejects_distant_center() {
        let img = ring_image(400, 400, 200.0, 200.0, 40.0);
        let anchor = PixelPoint { x: 30, y: 30 };
        assert_eq!(detect(&img, anchor, 40.0, &test_params()), None);
    }

    #[test]
    fn blank_frame_yields_no_detection() {
        let img = GrayImage::from_pixel(200, 200, Luma([0u8]));
        assert!(detect_circles(&img, &test_params()).is_empty());
        let anchor = PixelPoint { x: 100, y: 100 };
        assert_eq!(detect(&img, anchor, 1000.0, &test_params()), None);
    }
}
