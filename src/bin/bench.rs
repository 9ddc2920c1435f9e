//! Headless benchmark: renders a fixed number of frames of the demo scene
//! while the camera flies forward, then reports frame times.
//!
//! Usage: `bench [frames] [output.png]`

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec3;

use rusterizer::{Axis, Controls, EngineConfig, FixedClock, FrameClock, Mesh, RenderTarget, Renderer, Texture, World};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let frames: usize = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid frame count {arg:?}"))?,
        None => 200,
    };
    let output = args.next();

    let config = EngineConfig::load_or_default("rusterizer.ron")?;
    let mut world = World::new(&EngineConfig { z_far: config.z_far.max(100.0), ..config.clone() });
    let texture = Arc::new(Texture::checkerboard(8, 8, [230, 230, 230], [40, 90, 200]));
    world.add_grid(&Arc::new(Mesh::cube(1.0)), &texture, 32, 3.0);
    world.camera_mut().set_position(Vec3::new(0.0, 2.0, -60.0));

    let renderer = Renderer::new(config.threads)?;
    let mut target = RenderTarget::new(config.width, config.height).with_clear_color(config.clear_color);
    let mut clock = FixedClock { step: 1.0 / 60.0 };
    let mut controls = Controls::default();
    controls.start(Axis::MoveForward);
    controls.start(Axis::YawRight);

    let mut frame_times = Vec::with_capacity(frames);
    let mut triangles = 0;
    for _ in 0..frames {
        let start = Instant::now();
        world.update(clock.tick(), &controls);
        target.clear();
        let stats = renderer.render_frame(&world, &target);
        target.resolve();
        frame_times.push(start.elapsed().as_secs_f64() * 1000.0);
        triangles += stats.triangles_sent_to_render;
    }

    if frame_times.is_empty() {
        log::warn!("no frames rendered");
        return Ok(());
    }
    let mean = frame_times.iter().sum::<f64>() / frame_times.len() as f64;
    let min = frame_times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = frame_times.iter().copied().fold(0.0, f64::max);
    log::info!(
        "{frames} frames at {}x{} on {} threads: mean {mean:.2} ms, min {min:.2} ms, max {max:.2} ms, {} triangles/frame",
        config.width,
        config.height,
        renderer.threads(),
        triangles / frames
    );
    println!("mean frame time {mean:.2} ms ({:.1} fps)", 1000.0 / mean);

    if let Some(path) = output {
        let (width, height) = (target.width(), target.height());
        image::save_buffer(&path, target.resolve(), width, height, image::ColorType::Rgba8)
            .with_context(|| format!("failed to write {path}"))?;
        log::info!("saved last frame to {path}");
    }
    Ok(())
}
