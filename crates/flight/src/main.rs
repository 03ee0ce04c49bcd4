//! Headless flythrough: drives the scene core with a scripted pointer sweep and
//! one turbo press, logging what a renderer would draw.
//!
//! Pass `--write-config` to write the active settings to `config.ron`.

use anyhow::Result;
use flight::{AssetError, CraftModel, FlightConfig, SceneCore, SceneEvent};
use input::{ElementState, InputState, KeyCode};
use renderer::{HeadlessCapture, SceneObjectId};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAME: f32 = 1.0 / 60.0;
const SECONDS: u32 = 8;
/// Frames at which Space goes down and comes back up.
const PRESS_AT: u32 = 60;
const RELEASE_AT: u32 = 75;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔════════════════════════════════════════════╗");
    println!("║            Hyperspace Flythrough           ║");
    println!("╠════════════════════════════════════════════╣");
    println!("║  Mouse       - Steer the craft             ║");
    println!("║  Space/Click - Charge FTL jump             ║");
    println!("╚════════════════════════════════════════════╝");

    let config = FlightConfig::load();
    if std::env::args().any(|a| a == "--write-config") {
        config.save();
        log::info!("Wrote config.ron");
    }

    let mut assets = || -> Result<CraftModel, AssetError> {
        Ok(CraftModel::new("spaceship_racer", SceneObjectId(1), 12))
    };
    let mut scene = SceneCore::mount(&config, &mut assets, HeadlessCapture::new());
    scene.resize(WIDTH, HEIGHT);

    let mut input = InputState::new(config.input.activation, config.input.pointer);
    input.set_viewport(WIDTH, HEIGHT);

    for frame in 0..SECONDS * 60 {
        let t = frame as f32 * FRAME;

        // Slow figure-eight across the viewport.
        let cursor = (
            (WIDTH as f32 * 0.5 * (1.0 + 0.8 * (t * 0.7).sin())) as f64,
            (HEIGHT as f32 * 0.5 * (1.0 + 0.6 * (t * 1.4).sin())) as f64,
        );
        let mut inputs = Vec::new();
        inputs.extend(input.process_cursor_position(cursor));
        if frame == PRESS_AT {
            inputs.extend(input.process_keyboard(KeyCode::Space, ElementState::Pressed));
        }
        if frame == RELEASE_AT {
            inputs.extend(input.process_keyboard(KeyCode::Space, ElementState::Released));
        }
        for event in inputs {
            scene.handle_input(event);
        }

        let snap = scene.tick(FRAME);
        input.set_switch(snap.turbo_engaged);
        for event in &snap.events {
            match event {
                SceneEvent::PhaseChanged(change) => log::info!(
                    "{:>6.2}s  {:?} -> {:?}  energy {:.0}%",
                    change.at,
                    change.from,
                    change.to,
                    snap.gauges.energy_percentage
                ),
                SceneEvent::BoostComplete => log::info!("{:>6.2}s  boost complete", snap.time),
            }
        }

        if frame % 60 == 0 {
            log::info!(
                "{:>6.2}s  turbo {:.2}  fov {:.1}  craft y {:+.2} roll {:+.1}°  glow {:.2}",
                snap.time,
                snap.turbo_intensity,
                snap.camera.fov_degrees,
                snap.craft.vertical_offset,
                snap.craft.roll.to_degrees(),
                snap.visual_effects.glow_intensity
            );
        }
    }

    let maps = scene.reflections().capture().map(|c| c.captures()).unwrap_or(0);
    log::info!("Captured {maps} environment maps");
    scene.unmount();
    Ok(())
}
