//! Rise of the AI
//!
//! Runs level 1 headlessly from a scripted input track, then replays the
//! recorded inputs and checks the final state hash matches.
//!
//! Usage: `rise-of-the-ai [config.json]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rise_of_ai::{
    TICK_RATE, VERSION,
    config::GameConfig,
    driver::Driver,
    game::{
        events::GameEventData,
        input::InputFrame,
        level::build_level_one,
        state::Outcome,
        tick::replay_session,
    },
    render::{FrameRecorder, FsTextureLoader, HeadlessTextureLoader, TextureLoader},
};

/// Frames in the scripted run (30 seconds of 60 Hz frames).
const DEMO_FRAMES: u32 = 1800;

/// Frame index that simulates a half-second stall.
const STALL_FRAME: u32 = 240;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Rise of the AI v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = GameConfig::load_or_default(config_path.as_deref())
        .with_context(|| match &config_path {
            Some(path) => format!("loading config {}", path.display()),
            None => "building default config".to_string(),
        })?
        .with_env_overrides();

    demo_session(&config)
}

/// Scripted input: run right, jump every 40 frames with a double jump
/// shortly after.
fn scripted_input(frame: u32) -> InputFrame {
    let input = InputFrame::horizontal(1);
    match frame % 40 {
        0 | 12 => input.jumping(),
        _ => input,
    }
}

/// Run the scripted session and verify it replays.
fn demo_session(config: &GameConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let mut loader: Box<dyn TextureLoader> = if config.assets.headless {
        info!("Headless mode: textures are not read from disk");
        Box::new(HeadlessTextureLoader::default())
    } else {
        Box::new(FsTextureLoader::new())
    };
    let level = build_level_one(loader.as_mut(), config)
        .with_context(|| format!("building level 1 from {}", config.assets.directory.display()))?;

    let initial = level.state.clone();
    let mut driver = Driver::new(level, config.sim_config(), config.driver.max_steps_per_frame);
    let mut recorder = FrameRecorder::new();

    let frame_time = Duration::from_micros(1_000_000 / TICK_RATE as u64);
    let mut dropped = Duration::ZERO;

    for frame in 0..DEMO_FRAMES {
        let elapsed = if frame == STALL_FRAME { Duration::from_millis(500) } else { frame_time };
        let report = driver.frame(elapsed, &scripted_input(frame));
        dropped += report.dropped;

        for event in &report.events {
            match &event.data {
                GameEventData::EnemyStomped { enemy, ai_type } => {
                    info!("Tick {}: stomped enemy {} ({:?})", event.tick, enemy, ai_type);
                }
                GameEventData::PlayerHit { enemy } => {
                    info!("Tick {}: player hit by enemy {}", event.tick, enemy);
                }
                GameEventData::EnemyFell { enemy } => {
                    info!("Tick {}: enemy {} fell out of the level", event.tick, enemy);
                }
                GameEventData::PlayerFell => {
                    info!("Tick {}: player fell out of the level", event.tick);
                }
                GameEventData::AiStateChanged { enemy, from, to } => {
                    debug!("Tick {}: enemy {} {:?} -> {:?}", event.tick, enemy, from, to);
                }
                _ => {}
            }
        }

        recorder.clear();
        driver.render(&mut recorder);

        if report.outcome != Outcome::InProgress {
            info!("Session over after {} frames", frame + 1);
            break;
        }
    }

    // Final results
    info!("=== Session Results ===");
    let state = driver.state();
    info!("Outcome: {:?}", state.outcome);
    info!("Ticks: {}, enemies stomped: {}/{}", state.tick, state.dead_enemy_count(), state.enemies.len());
    info!("Backlog dropped: {} ms", dropped.as_millis());
    info!("Last frame: {} draw commands, banner {:?}", recorder.commands.len(), recorder.texts());

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let inputs = driver.recorded_inputs();
    info!("Replaying {} ticks ({} input changes)", inputs.len(), driver.recording().delta_count());

    let (replay_final, _) = replay_session(initial, &inputs, driver.config());
    let replay_hash = replay_final.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
