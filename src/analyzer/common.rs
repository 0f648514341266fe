//! Model input/output plumbing shared by pose engines.

use anyhow::{Result, anyhow};
use image::{RgbaImage, imageops, imageops::FilterType};
use ndarray::Array4;

use crate::pose::{Landmark, NUM_LANDMARKS, PoseLandmarks};
use crate::types::Frame;

pub const INPUT_SIZE: u32 = 256;
// x, y, z, visibility, presence per landmark.
pub const LANDMARK_STRIDE: usize = 5;

#[derive(Clone, Debug)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

/// Letterboxes a frame into the model's square input and returns the NHWC
/// tensor normalized to [0, 1].
pub fn prepare_frame(frame: &Frame) -> Result<(Array4<f32>, LetterboxInfo)> {
    let Some(img) = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()) else {
        return Err(anyhow!("failed to build RGBA image from frame"));
    };

    let scale = INPUT_SIZE as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;
    let resized = imageops::resize(&img, new_w, new_h, FilterType::CatmullRom);

    let pad_x = ((INPUT_SIZE as i64 - new_w as i64) / 2).max(0) as f32;
    let pad_y = ((INPUT_SIZE as i64 - new_h as i64) / 2).max(0) as f32;
    let mut canvas =
        RgbaImage::from_pixel(INPUT_SIZE, INPUT_SIZE, image::Rgba([0u8, 0u8, 0u8, 255u8]));
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    let mut input = Array4::<f32>::zeros((1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3));
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let pixel = canvas.get_pixel(x, y).0;
            input[[0, y as usize, x as usize, 0]] = pixel[0] as f32 / 255.0;
            input[[0, y as usize, x as usize, 1]] = pixel[1] as f32 / 255.0;
            input[[0, y as usize, x as usize, 2]] = pixel[2] as f32 / 255.0;
        }
    }

    let letterbox = LetterboxInfo {
        scale,
        pad_x,
        pad_y,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((input, letterbox))
}

/// Decodes the model's flat landmark output back into frame-normalized
/// coordinates.
///
/// The model emits input-pixel coordinates inside the letterboxed square and
/// a logit visibility channel; both are mapped back to the contract the rest
/// of the engine works in (positions in [0, 1], visibility in [0, 1]).
pub fn decode_landmarks(flat: &[f32], letterbox: &LetterboxInfo) -> Result<PoseLandmarks> {
    if flat.len() < NUM_LANDMARKS * LANDMARK_STRIDE {
        return Err(anyhow!(
            "unexpected landmark output length: got {}, need {}",
            flat.len(),
            NUM_LANDMARKS * LANDMARK_STRIDE
        ));
    }

    let mut points = Vec::with_capacity(NUM_LANDMARKS);
    for chunk in flat.chunks_exact(LANDMARK_STRIDE).take(NUM_LANDMARKS) {
        let px = (chunk[0] - letterbox.pad_x) / letterbox.scale;
        let py = (chunk[1] - letterbox.pad_y) / letterbox.scale;
        points.push(Landmark {
            x: (px / letterbox.orig_w as f32).clamp(0.0, 1.0),
            y: (py / letterbox.orig_h as f32).clamp(0.0, 1.0),
            visibility: sigmoid(chunk[3]),
        });
    }
    Ok(PoseLandmarks::new(points))
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn prepare_frame_letterboxes_landscape_input() {
        let frame = Frame {
            rgba: vec![255u8; 512 * 256 * 4],
            width: 512,
            height: 256,
            timestamp: Instant::now(),
        };
        let (input, letterbox) = prepare_frame(&frame).unwrap();
        assert_eq!(input.shape(), &[1, 256, 256, 3]);
        assert_eq!(letterbox.scale, 0.5);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 64.0);
    }

    #[test]
    fn decode_rejects_short_output() {
        let letterbox = LetterboxInfo {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            orig_w: 256,
            orig_h: 256,
        };
        assert!(decode_landmarks(&[0.0; 10], &letterbox).is_err());
    }

    #[test]
    fn decode_unletterboxes_and_squashes_visibility() {
        let letterbox = LetterboxInfo {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 64.0,
            orig_w: 512,
            orig_h: 256,
        };
        let mut flat = vec![0.0f32; NUM_LANDMARKS * LANDMARK_STRIDE];
        // First landmark at the center of the letterboxed input, high logit.
        flat[0] = 128.0;
        flat[1] = 128.0;
        flat[3] = 10.0;
        let landmarks = decode_landmarks(&flat, &letterbox).unwrap();
        let first = landmarks.get(0);
        assert!((first.x - 0.5).abs() < 1e-6);
        assert!((first.y - 0.5).abs() < 1e-6);
        assert!(first.visibility > 0.99);
    }
}
