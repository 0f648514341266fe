//! Marker and line drawing into RGBA frame buffers.
//!
//! The analysis core knows nothing about rendering; this module is the
//! consuming side of [`crate::types::AnalysisResult`] and matches it
//! exhaustively.

use crate::pose::{self, PoseLandmarks};
use crate::types::{AnalysisResult, BodySide, PixelPoint};

const JOINT_COLOR: [u8; 4] = [74u8, 222u8, 128u8, 255u8];
const SEGMENT_COLOR: [u8; 4] = [74u8, 222u8, 128u8, 255u8];
const BARBELL_COLOR: [u8; 4] = [248u8, 113u8, 113u8, 255u8];
const BAR_PATH_COLOR: [u8; 4] = [250u8, 204u8, 21u8, 255u8];

const MARKER_SIZE: i32 = 10;
const LINE_THICKNESS: i32 = 2;
const BARBELL_DOT_RADIUS: i32 = 10;

/// Draws one frame's analysis over its RGBA pixels.
pub fn draw_analysis(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    result: &AnalysisResult,
    bar_path: &[PixelPoint],
) {
    match result {
        AnalysisResult::Side {
            joints, barbell, ..
        } => {
            for segment in [
                (joints.shoulder, joints.hip),
                (joints.hip, joints.knee),
                (joints.knee, joints.ankle),
                (joints.ankle, joints.foot),
            ] {
                draw_line(buffer, width, height, segment.0, segment.1, SEGMENT_COLOR);
            }
            for joint in [
                joints.shoulder,
                joints.hip,
                joints.knee,
                joints.ankle,
                joints.foot,
            ] {
                draw_square_marker(buffer, width, height, joint, JOINT_COLOR);
            }
            if let Some(center) = barbell {
                draw_disc(buffer, width, height, *center, BARBELL_DOT_RADIUS, BARBELL_COLOR);
            }
            draw_bar_path(buffer, width, height, bar_path);
        }
        AnalysisResult::Back {
            hips, shoulders, ..
        } => {
            draw_line(buffer, width, height, hips.0, hips.1, SEGMENT_COLOR);
            draw_line(buffer, width, height, shoulders.0, shoulders.1, SEGMENT_COLOR);
            for joint in [hips.0, hips.1, shoulders.0, shoulders.1] {
                draw_square_marker(buffer, width, height, joint, JOINT_COLOR);
            }
        }
    }
}

/// Draws the visible side's full landmark chain, arm included, using the
/// side connection tables.
pub fn draw_side_skeleton(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    landmarks: &PoseLandmarks,
    side: BodySide,
) {
    for &(a, b) in pose::side_connections(side) {
        let pa = landmarks.get(a).project(width, height);
        let pb = landmarks.get(b).project(width, height);
        draw_line(buffer, width, height, pa, pb, SEGMENT_COLOR);
    }
}

/// Polyline through every accepted barbell observation, oldest first.
pub fn draw_bar_path(buffer: &mut [u8], width: u32, height: u32, bar_path: &[PixelPoint]) {
    for pair in bar_path.windows(2) {
        draw_line(buffer, width, height, pair[0], pair[1], BAR_PATH_COLOR);
    }
    for &point in bar_path {
        draw_disc(buffer, width, height, point, 3, BAR_PATH_COLOR);
    }
}

/// Hollow square centered on the joint.
fn draw_square_marker(buffer: &mut [u8], width: u32, height: u32, at: PixelPoint, color: [u8; 4]) {
    let half = MARKER_SIZE / 2;
    let corners = [
        PixelPoint {
            x: at.x - half,
            y: at.y - half,
        },
        PixelPoint {
            x: at.x + half,
            y: at.y - half,
        },
        PixelPoint {
            x: at.x + half,
            y: at.y + half,
        },
        PixelPoint {
            x: at.x - half,
            y: at.y + half,
        },
    ];
    for i in 0..4 {
        draw_line(buffer, width, height, corners[i], corners[(i + 1) % 4], color);
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: PixelPoint,
    p1: PixelPoint,
    color: [u8; 4],
) {
    let (mut x0, mut y0) = (p0.x, p0.y);
    let (x1, y1) = (p1.x, p1.y);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (LINE_THICKNESS.max(1) - 1) / 2;

    loop {
        put_pixel_safe(buffer, width, height, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox == 0 && oy == 0 {
                        continue;
                    }
                    if ox.abs() + oy.abs() <= radius {
                        put_pixel_safe(buffer, width, height, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_disc(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: PixelPoint,
    radius: i32,
    color: [u8; 4],
) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(buffer, width, height, center.x + dx, center.y + dy, color);
            }
        }
    }
}

fn put_pixel_safe(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}
