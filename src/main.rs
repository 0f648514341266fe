mod analyzer;
mod barbell;
#[cfg(feature = "camera-nokhwa")]
mod camera;
mod geometry;
mod model_download;
mod overlay;
mod pose;
mod trajectory;
mod types;
mod viewpoint;

use anyhow::Result;

#[cfg(feature = "camera-nokhwa")]
fn main() -> Result<()> {
    use std::time::{Duration, Instant};

    use anyhow::Context;
    use crossbeam_channel::bounded;
    use image::RgbaImage;

    use crate::types::AnalysisResult;

    const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(1);
    const SNAPSHOT_PATH: &str = "latest_analysis.png";

    env_logger::init();

    let devices = camera::available_cameras()?;
    let device = devices.first().context("no camera available")?;
    log::info!("capturing from {}", device.label);

    let (frame_tx, frame_rx) = bounded(1);
    let (result_tx, result_rx) = bounded(4);

    let stream = camera::start_camera_stream(device.index.clone(), frame_tx)?;
    let worker = analyzer::start_analyzer(
        model_download::default_pose_model_path(),
        frame_rx,
        result_tx,
    );

    let mut last_snapshot = Instant::now();

    for analyzed in result_rx.iter() {
        let viewpoint = analyzed.result.viewpoint();
        match &analyzed.result {
            AnalysisResult::Side {
                side,
                angles,
                balance_offset,
                barbell,
                ..
            } => {
                log::info!(
                    "{} ({} side): knee {:.0} deg, hip {:.0} deg, shin {:.0} deg, balance {:+} px, bar path {} points{}",
                    viewpoint.label(),
                    side.label(),
                    angles.knee,
                    angles.hip,
                    angles.shin,
                    balance_offset,
                    analyzed.bar_path.len(),
                    if barbell.is_some() { " (bar seen)" } else { "" },
                );
            }
            AnalysisResult::Back { alignment, .. } => {
                log::info!(
                    "{}: hip tilt {} deg, hip shift {} deg",
                    viewpoint.label(),
                    alignment.hip_tilt,
                    alignment.hip_shift,
                );
            }
        }

        // Keep a headless view of the session: one annotated still per second.
        if last_snapshot.elapsed() >= SNAPSHOT_INTERVAL {
            let frame = &analyzed.frame;
            let mut rgba = frame.rgba.clone();
            if let AnalysisResult::Side { side, .. } = &analyzed.result {
                overlay::draw_side_skeleton(
                    &mut rgba,
                    frame.width,
                    frame.height,
                    &analyzed.landmarks,
                    *side,
                );
            }
            overlay::draw_analysis(
                &mut rgba,
                frame.width,
                frame.height,
                &analyzed.result,
                &analyzed.bar_path,
            );
            match RgbaImage::from_raw(frame.width, frame.height, rgba) {
                Some(img) => {
                    if let Err(err) = img.save(SNAPSHOT_PATH) {
                        log::warn!("failed to write {SNAPSHOT_PATH}: {err}");
                    }
                }
                None => log::warn!("frame buffer size mismatch, skipping snapshot"),
            }
            last_snapshot = Instant::now();
        }
    }

    stream.stop();
    let _ = worker.join();
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn main() -> Result<()> {
    env_logger::init();
    anyhow::bail!(
        "built without camera support; enable the camera-nokhwa feature or use the demo programs"
    )
}
