use std::sync::Arc;

use anyhow::{Result, anyhow};
use raylib::prelude::*;

use rusterizer::{
    Axis, ChannelSink, EngineConfig, Mesh, RenderTarget, RenderWorker, Renderer, SystemClock, Texture, World,
    WorkerParts,
};

const CONFIG_PATH: &str = "rusterizer.ron";

const KEY_BINDINGS: [(KeyboardKey, Axis); 14] = [
    (KeyboardKey::KEY_W, Axis::MoveForward),
    (KeyboardKey::KEY_S, Axis::MoveBackward),
    (KeyboardKey::KEY_A, Axis::MoveLeft),
    (KeyboardKey::KEY_D, Axis::MoveRight),
    (KeyboardKey::KEY_SPACE, Axis::MoveUp),
    (KeyboardKey::KEY_LEFT_SHIFT, Axis::MoveDown),
    (KeyboardKey::KEY_UP, Axis::PitchUp),
    (KeyboardKey::KEY_DOWN, Axis::PitchDown),
    (KeyboardKey::KEY_LEFT, Axis::YawLeft),
    (KeyboardKey::KEY_RIGHT, Axis::YawRight),
    (KeyboardKey::KEY_Q, Axis::RollLeft),
    (KeyboardKey::KEY_E, Axis::RollRight),
    (KeyboardKey::KEY_KP_ADD, Axis::FovIncrease),
    (KeyboardKey::KEY_KP_SUBTRACT, Axis::FovDecrease),
];

fn main() -> Result<()> {
    env_logger::init();

    let config = EngineConfig::load_or_default(CONFIG_PATH)?;
    let (width, height) = (config.width, config.height);

    let mut world = World::new(&config);
    let texture = Arc::new(Texture::checkerboard(8, 8, [230, 230, 230], [40, 90, 200]));
    world.add_grid(&Arc::new(Mesh::cube(1.0)), &texture, 16, 3.0);
    world.camera_mut().set_position(glam::Vec3::new(0.0, 2.0, -30.0));

    // at most one frame waits for the display
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(1);
    let worker = RenderWorker::spawn(WorkerParts {
        world,
        renderer: Renderer::new(config.threads)?,
        target: RenderTarget::new(width, height).with_clear_color(config.clear_color),
        clock: SystemClock::new(),
        sink: ChannelSink::new(frame_tx),
        max_frames: None,
    })?;

    let (mut rl, thread) = raylib::init().size(width as i32, height as i32).title("Rusterizer").resizable().build();
    rl.set_target_fps(240);
    let image = Image::gen_image_color(width as i32, height as i32, Color::BLACK);
    let mut screen = rl
        .load_texture_from_image(&thread, &image)
        .map_err(|e| anyhow!("failed to create screen texture: {e:?}"))?;
    let mut stats_line = String::new();

    while !rl.window_should_close() {
        for (key, axis) in KEY_BINDINGS {
            if rl.is_key_pressed(key) {
                worker.start(axis)?;
            }
            if rl.is_key_released(key) {
                worker.stop(axis)?;
            }
        }

        if let Ok(frame) = frame_rx.try_recv() {
            screen.update_texture(&frame.pixels).map_err(|e| anyhow!("failed to upload frame: {e:?}"))?;
            stats_line = format!(
                "objects {} (inside {}), triangles rendered {}",
                frame.stats.objects_after_prune, frame.stats.objects_inside_after_prune, frame.stats.triangles_sent_to_render
            );
        }
        if worker.is_finished() {
            break;
        }

        let window_width = rl.get_screen_width() as f32;
        let window_height = rl.get_screen_height() as f32;
        let fps = rl.get_fps();
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::BLACK);
        d.draw_texture_pro(
            &screen,
            Rectangle { x: 0.0, y: 0.0, width: width as f32, height: height as f32 },
            Rectangle { x: 0.0, y: 0.0, width: window_width, height: window_height },
            Vector2 { x: 0.0, y: 0.0 },
            0.0,
            Color::WHITE,
        );
        d.draw_text(&format!("{fps} fps\n{stats_line}"), 10, 10, 20, Color::LIME);
    }

    let frames = worker.shutdown()?;
    log::info!("rendered {frames} frames");
    Ok(())
}
