//! Level Setup
//!
//! Level 1 tile data and roster. Textures are loaded here, once; a missing
//! asset aborts setup.

use thiserror::Error;
use tracing::info;

use crate::config::GameConfig;
use crate::core::fixed::{TILE_SIZE, to_fixed};
use crate::core::vec2::FixedVec2;
use crate::game::ai::{AiState, AiType};
use crate::game::entity::Entity;
use crate::game::map::{MapError, TileMap};
use crate::game::state::SessionState;
use crate::render::{AssetError, TextureHandle, TextureLoader};

/// Level 1 columns.
pub const LEVEL_1_WIDTH: u32 = 25;

/// Level 1 rows.
pub const LEVEL_1_HEIGHT: u32 = 5;

/// Level 1 tiles, row-major, top row first. 103 is grass, 152 is dirt.
#[rustfmt::skip]
pub static LEVEL_1_DATA: [u32; (LEVEL_1_WIDTH * LEVEL_1_HEIGHT) as usize] = [
      0,   0,   0,   0,   0,   0, 103, 103, 103, 103, 103, 103, 103,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0, 103, 103,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    103, 103,   0,   0,   0,   0,   0,   0, 103, 103, 103, 103, 103, 103,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    152, 152, 103, 103,   0,   0, 103, 103, 152, 152, 152, 152, 152, 152, 103, 103, 103, 103, 103, 103, 103, 103, 103, 103, 103,
    152, 152, 152, 152,   0,   0, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152, 152,
];

/// Errors raised while building a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// A texture could not be loaded.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// The tile data is malformed.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// A ready-to-play level.
#[derive(Clone, Debug)]
pub struct Level {
    /// Session at tick 0.
    pub state: SessionState,
    /// Bitmap font for banners.
    pub font: TextureHandle,
}

/// Build level 1: the map, the player at the origin and three enemies.
///
/// Roster order is fixed: Jumper, Assassin, Guard.
pub fn build_level_one(loader: &mut dyn TextureLoader, config: &GameConfig) -> Result<Level, LevelError> {
    let assets = &config.assets;
    let stats = config.stat_tuning();

    let tileset = loader.load(&assets.resolve(&assets.tileset))?;
    let player_texture = loader.load(&assets.resolve(&assets.player))?;
    let enemy_texture = loader.load(&assets.resolve(&assets.enemy))?;
    let font = loader.load(&assets.resolve(&assets.font))?;

    let map = TileMap::new(LEVEL_1_WIDTH, LEVEL_1_HEIGHT, LEVEL_1_DATA.to_vec(), TILE_SIZE)?
        .with_tileset(tileset, assets.tileset_cols, assets.tileset_rows);

    let gravity = FixedVec2::new(0, stats.gravity);

    let player = Entity::player(FixedVec2::ZERO)
        .with_size(stats.player_size, stats.player_size)
        .with_speed(stats.player_speed)
        .with_acceleration(gravity)
        .with_jumping_power(stats.jump_power)
        .with_texture(player_texture);

    let enemy = |ai_type: AiType, x: f64, y: f64, speed| {
        Entity::enemy(ai_type, FixedVec2::new(to_fixed(x), to_fixed(y)))
            .with_size(stats.enemy_size, stats.enemy_size)
            .with_speed(speed)
            .with_acceleration(gravity)
            .with_texture(enemy_texture)
    };

    let enemies = vec![
        enemy(AiType::Jumper, 2.5, 3.0, stats.jumper_speed)
            .with_jumping_power(stats.jumper_jump_power)
            .with_ai_state(AiState::Reset),
        enemy(AiType::Assassin, 20.0, 0.0, stats.assassin_speed).with_ai_state(AiState::Idle),
        enemy(AiType::Guard, 12.0, 0.0, stats.guard_speed).with_ai_state(AiState::Idle),
    ];

    info!(
        width = LEVEL_1_WIDTH,
        height = LEVEL_1_HEIGHT,
        enemies = enemies.len(),
        "Level 1 ready"
    );

    Ok(Level {
        state: SessionState::new(player, enemies, map),
        font,
    })
}
