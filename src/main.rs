//! Rolling Runner entry point
//!
//! Plays a scripted session against the headless host and logs how it went.
//! Pass a settings JSON path as the first argument to override the defaults.

use std::process::ExitCode;

use glam::Vec2;
use rolling_runner::Settings;
use rolling_runner::platform::HeadlessHost;
use rolling_runner::sim::{FrameInput, Game, InputPlatform, RunPhase, Touch, TouchPhase};

/// 60 Hz frames
const FRAME_DT: f32 = 1.0 / 60.0;
/// Session length in frames (30 seconds)
const SESSION_FRAMES: u32 = 60 * 30;
/// Pause window, in frames
const PAUSE_AT: u32 = 600;
const RESUME_AT: u32 = 660;

fn main() -> ExitCode {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    log::info!("Rolling Runner (headless) starting...");

    let mut host = HeadlessHost::new();
    let (width, height) = host.viewport_size();
    let mut game = Game::new(settings);
    game.load_level(&mut host, &game.settings().game_level.clone());

    let mut losses = 0u32;
    let mut most_tiles = 0u32;
    let mut last_phase = game.phase();

    for frame in 0..SESSION_FRAMES {
        for event in host.step(FRAME_DT) {
            game.handle_event(&mut host, event);
        }

        match frame {
            PAUSE_AT => game.pause(&mut host, true),
            RESUME_AT => game.pause(&mut host, false),
            _ => {}
        }

        let input = scripted_input(frame, game.settings().platform, width, height);
        game.update(&mut host, &input);

        most_tiles = most_tiles.max(game.tiles_spawned());
        if last_phase == RunPhase::Running && game.phase() == RunPhase::Lost {
            losses += 1;
        }
        last_phase = game.phase();
    }

    log::info!(
        "Session over: {} frames, {} losses, longest run {} tiles, {} entities alive",
        SESSION_FRAMES,
        losses,
        most_tiles,
        host.entity_count()
    );
    ExitCode::SUCCESS
}

/// Weave left/right; on mobile, also swipe every two seconds
fn scripted_input(frame: u32, platform: InputPlatform, width: f32, height: f32) -> FrameInput {
    let weave = (frame as f32 * 0.05).sin();
    match platform {
        InputPlatform::Desktop => FrameInput {
            horizontal_axis: weave,
            ..FrameInput::default()
        },
        InputPlatform::Mobile => {
            let touches = match frame % 120 {
                0 => vec![Touch::new(Vec2::new(width * 0.5, height * 0.3), TouchPhase::Began)],
                1..=9 => vec![Touch::new(Vec2::new(width * 0.5, height * 0.3), TouchPhase::Moved)],
                10 => {
                    let dx = if (frame / 120) % 2 == 0 { 200.0 } else { -200.0 };
                    vec![Touch::new(Vec2::new(width * 0.5 + dx, height * 0.3), TouchPhase::Ended)]
                }
                _ => Vec::new(),
            };
            FrameInput {
                acceleration: glam::Vec3::new(weave * 0.3, 0.0, 0.0),
                touches,
                ..FrameInput::default()
            }
        }
    }
}
