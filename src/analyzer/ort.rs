use std::{path::PathBuf, thread};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{PoseLandmarkEngine, common, run_worker_loop};
use crate::{
    model_download::ensure_pose_model_ready,
    pose::PoseLandmarks,
    types::{AnalyzedFrame, Frame},
};

// Frames scoring below this carry no usable person detection.
const MIN_POSE_SCORE: f32 = 0.5;

pub fn start_worker(
    model_path: PathBuf,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<AnalyzedFrame>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(err) = ensure_pose_model_ready(&model_path, |_evt| {}) {
            log::error!(
                "failed to prepare pose model at {}: {err:?}",
                model_path.display()
            );
            return;
        }

        let engine = match OrtEngine::new(&model_path) {
            Ok(engine) => {
                log::info!("pose ORT backend ready using {}", model_path.display());
                engine
            }
            Err(err) => {
                log::error!("failed to load ORT pose model: {err:?}");
                return;
            }
        };

        run_worker_loop(engine, frame_rx, result_tx);
    })
}

pub struct OrtEngine {
    session: Session,
}

impl OrtEngine {
    pub fn new(model_path: &PathBuf) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ORT session from {}", model_path.display()))?;

        Ok(Self { session })
    }
}

impl PoseLandmarkEngine for OrtEngine {
    fn infer(&mut self, frame: &Frame) -> Result<Option<PoseLandmarks>> {
        let (input, letterbox) = common::prepare_frame(frame)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("model returned no outputs"));
        }

        // Second output is the pose presence score; without one, trust the
        // landmarks.
        let score = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(1.0)
        } else {
            1.0
        };
        if score < MIN_POSE_SCORE {
            return Ok(None);
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let landmarks = common::decode_landmarks(&flattened, &letterbox)?;

        Ok(Some(landmarks))
    }
}
