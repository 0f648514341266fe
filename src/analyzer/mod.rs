//! Per-frame analysis orchestration.
//!
//! Each frame is handled independently: classify the viewpoint, derive the
//! angle set for that viewpoint, and on a side view run barbell detection
//! anchored at the shoulder midpoint, threading the caller-owned bar path
//! forward. A session may legitimately flip between side and back views as
//! the camera or lifter moves.

pub mod common;
pub mod ort;

use std::{path::PathBuf, thread};

use crossbeam_channel::{Receiver, Sender};
use image::{GrayImage, Luma};
use thiserror::Error;

use crate::{
    barbell::{self, HoughParams},
    geometry::{self, DegenerateInput},
    pose::{PoseLandmarks, SquatPose},
    trajectory::BarPath,
    types::{
        AnalysisResult, AnalyzedFrame, BackAlignment, Frame, SideAngles, SideJoints, Viewpoint,
    },
    viewpoint::{self, AmbiguousSide, DEFAULT_VISIBILITY_THRESHOLD},
};

/// Recognized analysis options. Everything has a documented default; there
/// is no persisted configuration file.
#[derive(Clone, Debug)]
pub struct Config {
    /// Visibility-difference threshold for the viewpoint classifier.
    pub visibility_threshold: f32,
    /// Plausibility radius in pixels around the shoulder midpoint for
    /// barbell candidates.
    pub barbell_max_distance: f32,
    pub hough: HoughParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            barbell_max_distance: 320.0,
            hough: HoughParams::default(),
        }
    }
}

/// Per-frame failures. The frame loop catches these and skips rendering for
/// the frame; they never terminate the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    DegenerateInput(#[from] DegenerateInput),
    #[error(transparent)]
    AmbiguousSide(#[from] AmbiguousSide),
}

/// The per-frame pose-landmark source. Production uses the ORT model in
/// [`ort`]; tests substitute synthetic fixtures.
pub trait PoseLandmarkEngine: Send + 'static {
    /// `Ok(None)` means no person was detected in this frame.
    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Option<PoseLandmarks>>;
}

/// Analyzes one frame's landmarks against its grayscale pixels.
///
/// A frame that fails classification or angle derivation contributes nothing
/// to `bar_path`.
pub fn analyze(
    landmarks: &PoseLandmarks,
    gray: &GrayImage,
    width: u32,
    height: u32,
    bar_path: &mut BarPath,
    config: &Config,
) -> Result<AnalysisResult, AnalysisError> {
    let pose = SquatPose::from_landmarks(landmarks);

    match viewpoint::classify(&pose, config.visibility_threshold)? {
        Viewpoint::Side(side) => {
            let joints = SideJoints {
                shoulder: pose.shoulders.pick(side).project(width, height),
                hip: pose.hips.pick(side).project(width, height),
                knee: pose.knees.pick(side).project(width, height),
                ankle: pose.ankles.pick(side).project(width, height),
                foot: pose.feet.pick(side).project(width, height),
            };
            let angles = SideAngles {
                knee: geometry::angle_at_vertex(
                    joints.hip.as_f32(),
                    joints.knee.as_f32(),
                    joints.ankle.as_f32(),
                )?,
                hip: geometry::angle_at_vertex(
                    joints.shoulder.as_f32(),
                    joints.hip.as_f32(),
                    joints.knee.as_f32(),
                )?,
                shin: geometry::angle_at_vertex(
                    joints.knee.as_f32(),
                    joints.ankle.as_f32(),
                    joints.foot.as_f32(),
                )?,
            };
            // Lateral balance: how far the shoulders sit ahead of the feet.
            let shoulder_mid = pose.shoulder_midpoint(width, height);
            let balance_offset = shoulder_mid.x - pose.foot_midpoint(width, height).x;

            let barbell =
                barbell::detect(gray, shoulder_mid, config.barbell_max_distance, &config.hough);
            bar_path.append_if_present(barbell);

            Ok(AnalysisResult::Side {
                side,
                joints,
                angles,
                balance_offset,
                barbell,
            })
        }
        Viewpoint::Back => {
            let hips = (
                pose.hips.left.project(width, height),
                pose.hips.right.project(width, height),
            );
            let shoulders = (
                pose.shoulders.left.project(width, height),
                pose.shoulders.right.project(width, height),
            );
            let hip_tilt = geometry::angle_between(hips.0.as_f32(), hips.1.as_f32());
            // A perfectly vertical torso heads straight down the frame (90°);
            // re-center so it reads 0.
            let hip_shift = geometry::angle_between(
                pose.shoulder_midpoint(width, height).as_f32(),
                pose.hip_midpoint(width, height).as_f32(),
            ) - 90;

            Ok(AnalysisResult::Back {
                alignment: BackAlignment {
                    hip_tilt,
                    hip_shift,
                },
                hips,
                shoulders,
            })
        }
    }
}

/// Spawns the analysis worker backed by the ORT pose model.
pub fn start_analyzer(
    model_path: PathBuf,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<AnalyzedFrame>,
) -> thread::JoinHandle<()> {
    log::info!("starting pose analysis worker");
    ort::start_worker(model_path, frame_rx, result_tx)
}

fn run_worker_loop<E: PoseLandmarkEngine>(
    mut engine: E,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<AnalyzedFrame>,
) {
    let config = Config::default();
    let mut bar_path = BarPath::new();

    while let Some(frame) = recv_latest_frame(&frame_rx) {
        let landmarks = match engine.infer(&frame) {
            Ok(Some(landmarks)) => landmarks,
            Ok(None) => continue,
            Err(err) => {
                log::warn!("pose inference failed: {err:?}");
                continue;
            }
        };

        let gray = grayscale(&frame);
        match analyze(
            &landmarks,
            &gray,
            frame.width,
            frame.height,
            &mut bar_path,
            &config,
        ) {
            Ok(result) => {
                log::debug!("frame analyzed, bar path at {} points", bar_path.len());
                let snapshot = bar_path.points().to_vec();
                let _ = result_tx.try_send(AnalyzedFrame {
                    frame,
                    landmarks,
                    result,
                    bar_path: snapshot,
                });
            }
            Err(err) => log::warn!("skipping frame: {err}"),
        }
    }
}

fn recv_latest_frame(frame_rx: &Receiver<Frame>) -> Option<Frame> {
    let mut frame = frame_rx.recv().ok()?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}

/// Grayscale copy of an RGBA frame for the circle detector.
pub fn grayscale(frame: &Frame) -> GrayImage {
    GrayImage::from_fn(frame.width, frame.height, |x, y| {
        let idx = ((y * frame.width + x) as usize) * 4;
        let r = frame.rgba[idx] as f32;
        let g = frame.rgba[idx + 1] as f32;
        let b = frame.rgba[idx + 2] as f32;
        Luma([(0.299 * r + 0.587 * g + 0.114 * b) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{
        Landmark, LEFT_ANKLE, LEFT_ELBOW, LEFT_FOOT_INDEX, LEFT_HEEL, LEFT_HIP, LEFT_KNEE,
        LEFT_SHOULDER, NUM_LANDMARKS, RIGHT_ANKLE, RIGHT_ELBOW, RIGHT_FOOT_INDEX, RIGHT_HEEL,
        RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER,
    };
    use crate::types::BodySide;

    const WIDTH: u32 = 320;
    const HEIGHT: u32 = 240;

    fn lm(x: f32, y: f32, visibility: f32) -> Landmark {
        Landmark { x, y, visibility }
    }

    fn blank_gray() -> GrayImage {
        GrayImage::from_pixel(WIDTH, HEIGHT, Luma([0u8]))
    }

    /// A left-profile squat: left side well visible, right side partially
    /// occluded behind it.
    fn left_profile_landmarks() -> PoseLandmarks {
        let mut points = vec![Landmark::default(); NUM_LANDMARKS];
        points[LEFT_SHOULDER] = lm(0.50, 0.30, 0.9);
        points[LEFT_HIP] = lm(0.52, 0.55, 0.7);
        points[LEFT_ELBOW] = lm(0.44, 0.38, 0.9);
        points[LEFT_KNEE] = lm(0.46, 0.72, 0.8);
        points[LEFT_ANKLE] = lm(0.50, 0.90, 0.85);
        points[LEFT_HEEL] = lm(0.45, 0.92, 0.8);
        points[LEFT_FOOT_INDEX] = lm(0.56, 0.94, 0.8);
        points[RIGHT_SHOULDER] = lm(0.51, 0.31, 0.8);
        points[RIGHT_HIP] = lm(0.53, 0.56, 0.6);
        points[RIGHT_ELBOW] = lm(0.45, 0.39, 0.85);
        points[RIGHT_KNEE] = lm(0.47, 0.73, 0.2);
        points[RIGHT_ANKLE] = lm(0.51, 0.91, 0.8);
        points[RIGHT_HEEL] = lm(0.46, 0.93, 0.7);
        points[RIGHT_FOOT_INDEX] = lm(0.57, 0.95, 0.7);
        PoseLandmarks::new(points)
    }

    /// A rear view: both sides equally visible, torso vertical.
    fn back_landmarks() -> PoseLandmarks {
        let mut points = vec![Landmark::default(); NUM_LANDMARKS];
        for idx in [
            LEFT_SHOULDER,
            RIGHT_SHOULDER,
            LEFT_HIP,
            RIGHT_HIP,
            LEFT_ELBOW,
            RIGHT_ELBOW,
            LEFT_KNEE,
            RIGHT_KNEE,
            LEFT_ANKLE,
            RIGHT_ANKLE,
        ] {
            points[idx].visibility = 0.9;
        }
        points[LEFT_SHOULDER].x = 0.42;
        points[LEFT_SHOULDER].y = 0.30;
        points[RIGHT_SHOULDER].x = 0.58;
        points[RIGHT_SHOULDER].y = 0.30;
        points[LEFT_HIP].x = 0.42;
        points[LEFT_HIP].y = 0.55;
        points[RIGHT_HIP].x = 0.58;
        points[RIGHT_HIP].y = 0.55;
        PoseLandmarks::new(points)
    }

    #[test]
    fn side_view_produces_angles_and_no_barbell_on_blank_frame() {
        let landmarks = left_profile_landmarks();
        let mut bar_path = BarPath::new();
        let result = analyze(
            &landmarks,
            &blank_gray(),
            WIDTH,
            HEIGHT,
            &mut bar_path,
            &Config::default(),
        )
        .unwrap();

        match result {
            AnalysisResult::Side {
                side,
                angles,
                balance_offset,
                barbell,
                ..
            } => {
                assert_eq!(side, BodySide::Left);
                assert!(angles.knee > 0.0 && angles.knee < 180.0);
                assert!(angles.hip > 0.0 && angles.hip < 180.0);
                assert!(angles.shin > 0.0 && angles.shin < 180.0);
                let pose = SquatPose::from_landmarks(&landmarks);
                let expected = pose.shoulder_midpoint(WIDTH, HEIGHT).x
                    - pose.foot_midpoint(WIDTH, HEIGHT).x;
                assert_eq!(balance_offset, expected);
                assert_eq!(barbell, None);
            }
            AnalysisResult::Back { .. } => panic!("expected a side view"),
        }
        assert!(bar_path.is_empty());
    }

    #[test]
    fn back_view_reads_level_hips_and_vertical_torso_as_zero() {
        let landmarks = back_landmarks();
        let mut bar_path = BarPath::new();
        let result = analyze(
            &landmarks,
            &blank_gray(),
            WIDTH,
            HEIGHT,
            &mut bar_path,
            &Config::default(),
        )
        .unwrap();

        match result {
            AnalysisResult::Back { alignment, .. } => {
                assert_eq!(
                    alignment,
                    BackAlignment {
                        hip_tilt: 0,
                        hip_shift: 0,
                    }
                );
            }
            AnalysisResult::Side { .. } => panic!("expected a back view"),
        }
        // The back path never touches the bar path.
        assert!(bar_path.is_empty());
    }

    #[test]
    fn coincident_joints_fail_without_touching_the_bar_path() {
        let mut points = vec![Landmark::default(); NUM_LANDMARKS];
        // Side view with the left knee collapsed onto the left hip.
        points[LEFT_SHOULDER] = lm(0.50, 0.30, 0.9);
        points[LEFT_HIP] = lm(0.50, 0.55, 0.9);
        points[LEFT_KNEE] = lm(0.50, 0.55, 0.9);
        points[LEFT_ANKLE] = lm(0.50, 0.90, 0.9);
        points[LEFT_FOOT_INDEX] = lm(0.56, 0.94, 0.9);
        points[LEFT_ELBOW] = lm(0.44, 0.38, 0.9);
        let landmarks = PoseLandmarks::new(points);

        let mut bar_path = BarPath::new();
        let err = analyze(
            &landmarks,
            &blank_gray(),
            WIDTH,
            HEIGHT,
            &mut bar_path,
            &Config::default(),
        )
        .unwrap_err();

        assert!(matches!(err, AnalysisError::DegenerateInput(_)));
        assert!(bar_path.is_empty());
    }

    #[test]
    fn exact_visibility_tie_surfaces_as_ambiguous() {
        let mut points = vec![Landmark::default(); NUM_LANDMARKS];
        // Shoulder gap forces a side view; sums are exactly equal.
        points[LEFT_SHOULDER].visibility = 0.9;
        points[RIGHT_SHOULDER].visibility = 0.5;
        points[LEFT_HIP].visibility = 0.5;
        points[RIGHT_HIP].visibility = 0.9;
        let landmarks = PoseLandmarks::new(points);

        let mut bar_path = BarPath::new();
        let err = analyze(
            &landmarks,
            &blank_gray(),
            WIDTH,
            HEIGHT,
            &mut bar_path,
            &Config::default(),
        )
        .unwrap_err();

        assert!(matches!(err, AnalysisError::AmbiguousSide(_)));
        assert!(bar_path.is_empty());
    }

    struct FixedEngine {
        landmarks: PoseLandmarks,
    }

    impl PoseLandmarkEngine for FixedEngine {
        fn infer(&mut self, _frame: &Frame) -> anyhow::Result<Option<PoseLandmarks>> {
            Ok(Some(self.landmarks.clone()))
        }
    }

    #[test]
    fn worker_loop_drains_frames_and_emits_results() {
        use crossbeam_channel::bounded;
        use std::time::Instant;

        let (frame_tx, frame_rx) = bounded(4);
        let (result_tx, result_rx) = bounded(4);

        let engine = FixedEngine {
            landmarks: left_profile_landmarks(),
        };
        let handle = std::thread::spawn(move || run_worker_loop(engine, frame_rx, result_tx));

        let frame = Frame {
            rgba: vec![0u8; (WIDTH * HEIGHT * 4) as usize],
            width: WIDTH,
            height: HEIGHT,
            timestamp: Instant::now(),
        };
        frame_tx.send(frame).unwrap();

        let analyzed = result_rx
            .recv_timeout(std::time::Duration::from_secs(30))
            .unwrap();
        assert!(matches!(analyzed.result, AnalysisResult::Side { .. }));
        assert!(analyzed.bar_path.is_empty());

        drop(frame_tx);
        handle.join().unwrap();
    }
}
