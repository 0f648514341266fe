//! Runs only the circle detector over a still image and lists the candidate
//! plates it finds.
//!
//! Usage: cargo run --example barbell_from_image -- <image>

#[path = "../src/barbell.rs"]
mod barbell;
#[path = "../src/geometry.rs"]
mod geometry;
#[path = "../src/pose.rs"]
mod pose;
#[path = "../src/types.rs"]
mod types;

use anyhow::{Context, Result};

use barbell::HoughParams;

fn main() -> Result<()> {
    env_logger::init();

    let input = std::env::args()
        .nth(1)
        .context("usage: barbell_from_image <image>")?;
    let gray = image::open(&input)
        .with_context(|| format!("failed to open {input}"))?
        .to_luma8();

    let params = HoughParams::default();
    let circles = barbell::detect_circles(&gray, &params);
    if circles.is_empty() {
        println!("no plate-sized circles found");
        return Ok(());
    }

    println!("{} candidate(s), strongest first:", circles.len());
    for circle in &circles {
        println!(
            "  center ({}, {})  radius {}  votes {}",
            circle.center.x, circle.center.y, circle.radius, circle.votes
        );
    }

    Ok(())
}
