use std::time::Instant;

use crate::pose::PoseLandmarks;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    #[allow(dead_code)]
    pub timestamp: Instant,
}

/// A landmark projected into a frame's pixel grid. Coordinates are rounded,
/// not truncated, so markers land on the same pixel the renderer targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn as_f32(self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }

    /// Integer midpoint of two projected points.
    pub fn midpoint(a: PixelPoint, b: PixelPoint) -> PixelPoint {
        PixelPoint {
            x: (a.x + b.x) / 2,
            y: (a.y + b.y) / 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodySide {
    Left,
    Right,
}

impl BodySide {
    pub fn label(&self) -> &'static str {
        match self {
            BodySide::Left => "left",
            BodySide::Right => "right",
        }
    }
}

/// Camera framing relative to the lifter, decided fresh every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewpoint {
    Side(BodySide),
    Back,
}

impl Viewpoint {
    pub fn label(&self) -> &'static str {
        match self {
            Viewpoint::Side(_) => "side angle",
            Viewpoint::Back => "back angle",
        }
    }
}

/// The visible side's joints in pixel space.
#[derive(Clone, Copy, Debug)]
pub struct SideJoints {
    pub shoulder: PixelPoint,
    pub hip: PixelPoint,
    pub knee: PixelPoint,
    pub ankle: PixelPoint,
    pub foot: PixelPoint,
}

/// Side-view joint angles in degrees, each in [0, 180].
#[derive(Clone, Copy, Debug)]
pub struct SideAngles {
    pub knee: f32,
    pub hip: f32,
    pub shin: f32,
}

/// Back-view alignment in integer degrees. `hip_tilt` is the heading of the
/// hip line; `hip_shift` is the torso axis re-centered so vertical reads 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackAlignment {
    pub hip_tilt: i32,
    pub hip_shift: i32,
}

/// Per-frame analysis outcome. Consumers match exhaustively; there is no
/// string-keyed dispatch between the side and back paths.
#[derive(Clone, Debug)]
pub enum AnalysisResult {
    Side {
        side: BodySide,
        joints: SideJoints,
        angles: SideAngles,
        /// Horizontal offset of the shoulder over the foot, in pixels.
        balance_offset: i32,
        barbell: Option<PixelPoint>,
    },
    Back {
        alignment: BackAlignment,
        hips: (PixelPoint, PixelPoint),
        shoulders: (PixelPoint, PixelPoint),
    },
}

impl AnalysisResult {
    pub fn viewpoint(&self) -> Viewpoint {
        match self {
            AnalysisResult::Side { side, .. } => Viewpoint::Side(*side),
            AnalysisResult::Back { .. } => Viewpoint::Back,
        }
    }
}

/// A frame together with its landmarks, its analysis and a snapshot of the
/// bar path taken after this frame's orchestration completed.
#[derive(Clone, Debug)]
pub struct AnalyzedFrame {
    pub frame: Frame,
    pub landmarks: PoseLandmarks,
    pub result: AnalysisResult,
    pub bar_path: Vec<PixelPoint>,
}
