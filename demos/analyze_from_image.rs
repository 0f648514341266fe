//! Runs the full squat analysis pipeline over a single still image and
//! writes an annotated copy next to it.
//!
//! Usage: cargo run --example analyze_from_image -- <image> [output.png]

#[path = "../src/analyzer/mod.rs"]
mod analyzer;
#[path = "../src/barbell.rs"]
mod barbell;
#[path = "../src/geometry.rs"]
mod geometry;
#[path = "../src/model_download.rs"]
mod model_download;
#[path = "../src/overlay.rs"]
mod overlay;
#[path = "../src/pose.rs"]
mod pose;
#[path = "../src/trajectory.rs"]
mod trajectory;
#[path = "../src/types.rs"]
mod types;
#[path = "../src/viewpoint.rs"]
mod viewpoint;

use std::time::Instant;

use anyhow::{Context, Result, bail};
use image::RgbaImage;

use analyzer::{Config, PoseLandmarkEngine, ort::OrtEngine};
use model_download::{default_pose_model_path, ensure_pose_model_ready};
use trajectory::BarPath;
use types::{AnalysisResult, Frame};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("usage: analyze_from_image <image> [output.png]")?;
    let output = args.next().unwrap_or_else(|| "analyzed.png".to_string());

    let img = image::open(&input)
        .with_context(|| format!("failed to open {input}"))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    let frame = Frame {
        rgba: img.into_raw(),
        width,
        height,
        timestamp: Instant::now(),
    };

    let model_path = default_pose_model_path();
    ensure_pose_model_ready(&model_path, |_evt| {})?;
    let mut engine = OrtEngine::new(&model_path)?;

    let Some(landmarks) = engine.infer(&frame)? else {
        bail!("no person detected in {input}");
    };

    let gray = analyzer::grayscale(&frame);
    let mut bar_path = BarPath::new();
    let config = Config::default();
    let result = analyzer::analyze(&landmarks, &gray, width, height, &mut bar_path, &config)?;

    match &result {
        AnalysisResult::Side {
            side,
            angles,
            balance_offset,
            barbell,
            ..
        } => {
            println!("viewpoint: side angle, {} side visible", side.label());
            println!(
                "knee {:.1} deg, hip {:.1} deg, shin {:.1} deg",
                angles.knee, angles.hip, angles.shin
            );
            println!("balance offset: {balance_offset:+} px");
            match barbell {
                Some(center) => println!("barbell at ({}, {})", center.x, center.y),
                None => println!("no barbell detected"),
            }
        }
        AnalysisResult::Back { alignment, .. } => {
            println!("viewpoint: back angle");
            println!(
                "hip tilt {} deg, hip shift {} deg",
                alignment.hip_tilt, alignment.hip_shift
            );
        }
    }

    let mut rgba = frame.rgba;
    if let AnalysisResult::Side { side, .. } = &result {
        overlay::draw_side_skeleton(&mut rgba, width, height, &landmarks, *side);
    }
    overlay::draw_analysis(&mut rgba, width, height, &result, bar_path.points());
    let annotated =
        RgbaImage::from_raw(width, height, rgba).context("frame buffer size mismatch")?;
    annotated
        .save(&output)
        .with_context(|| format!("failed to save {output}"))?;
    println!("annotated image written to {output}");

    Ok(())
}
