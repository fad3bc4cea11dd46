//! Configuration
//!
//! Human-facing tuning in floats and seconds, loaded from an optional JSON
//! file. Converted once into the fixed-point values the simulation uses;
//! nothing downstream reads floats.

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::fixed::{Fixed, to_fixed};
use crate::game::ai::AiTuning;
use crate::game::tick::SimConfig;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Requested path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for [`GameConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Player physics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration (units/s², negative is down).
    pub gravity: f64,
    /// Player horizontal speed (units/s).
    pub player_speed: f64,
    /// Player jump velocity (units/s).
    pub jump_power: f64,
    /// Player width and height.
    pub player_size: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            player_speed: 2.5,
            jump_power: 5.0,
            player_size: 1.0,
        }
    }
}

/// Enemy roster stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Guard speed (units/s).
    pub guard_speed: f64,
    /// Assassin base speed (units/s).
    pub assassin_speed: f64,
    /// Jumper speed (units/s).
    pub jumper_speed: f64,
    /// Jumper leap velocity (units/s).
    pub jumper_jump_power: f64,
    /// Enemy width and height.
    pub size: f64,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            guard_speed: 0.5,
            assassin_speed: 1.0,
            jumper_speed: 0.5,
            jumper_jump_power: 4.0,
            size: 1.0,
        }
    }
}

/// AI ranges and timers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Guard engages inside this horizontal distance.
    pub guard_aggro_radius: f64,
    /// Jumper follows inside this distance.
    pub jumper_sight_range: f64,
    /// Jumper leaps inside this distance.
    pub jumper_strike_range: f64,
    /// Jumper leaps after following this many ticks.
    pub jumper_chase_ticks: u32,
    /// Jumper rests this many ticks after landing.
    pub jumper_cooldown_ticks: u32,
    /// Speed multiplier during a leap.
    pub jumper_leap_scale: f64,
    /// Assassin charges inside this distance.
    pub assassin_range: f64,
    /// Assassin breaks off inside this distance.
    pub assassin_melee_range: f64,
    /// Speed multiplier during a charge.
    pub assassin_charge_scale: f64,
    /// Assassin is home within this distance of its spawn.
    pub assassin_arrival_tolerance: f64,
    /// Assassin slows down inside this distance of its spawn.
    pub assassin_slow_radius: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            guard_aggro_radius: 3.0,
            jumper_sight_range: 6.0,
            jumper_strike_range: 1.5,
            jumper_chase_ticks: 180,
            jumper_cooldown_ticks: 120,
            jumper_leap_scale: 3.0,
            assassin_range: 5.0,
            assassin_melee_range: 0.75,
            assassin_charge_scale: 2.5,
            assassin_arrival_tolerance: 0.05,
            assassin_slow_radius: 1.0,
        }
    }
}

/// Frame pacing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Most fixed steps run for one frame; the rest of the backlog is dropped.
    pub max_steps_per_frame: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { max_steps_per_frame: 5 }
    }
}

/// Asset locations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory of all assets.
    pub directory: PathBuf,
    /// Player sprite, relative to `directory`.
    pub player: PathBuf,
    /// Enemy sprite.
    pub enemy: PathBuf,
    /// Tileset atlas.
    pub tileset: PathBuf,
    /// Bitmap font.
    pub font: PathBuf,
    /// Atlas grid columns.
    pub tileset_cols: u32,
    /// Atlas grid rows.
    pub tileset_rows: u32,
    /// Skip the filesystem and hand out placeholder textures.
    pub headless: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets"),
            player: PathBuf::from("images/player.png"),
            enemy: PathBuf::from("images/enemy.png"),
            tileset: PathBuf::from("images/tile_spritesheet.png"),
            font: PathBuf::from("fonts/font1.png"),
            tileset_cols: 12,
            tileset_rows: 13,
            headless: false,
        }
    }
}

impl AssetConfig {
    /// Full path of an asset.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.directory.join(relative)
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Player physics
    pub physics: PhysicsConfig,
    /// Enemy stats
    pub enemies: EnemyConfig,
    /// AI tuning
    pub ai: AiConfig,
    /// Frame pacing
    pub driver: DriverConfig,
    /// Asset locations
    pub assets: AssetConfig,
}

/// Physical stats in fixed point, for level setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatTuning {
    /// Gravity.
    pub gravity: Fixed,
    /// Player speed.
    pub player_speed: Fixed,
    /// Player jump velocity.
    pub jump_power: Fixed,
    /// Player extent.
    pub player_size: Fixed,
    /// Guard speed.
    pub guard_speed: Fixed,
    /// Assassin speed.
    pub assassin_speed: Fixed,
    /// Jumper speed.
    pub jumper_speed: Fixed,
    /// Jumper leap velocity.
    pub jumper_jump_power: Fixed,
    /// Enemy extent.
    pub enemy_size: Fixed,
}

impl GameConfig {
    /// Load from a JSON file. Missing sections and fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply environment overrides.
    ///
    /// - `RISE_ASSET_DIR`: asset directory
    /// - `RISE_HEADLESS`: `1` or `true` to skip the filesystem
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("RISE_ASSET_DIR") {
            self.assets.directory = PathBuf::from(dir);
        }
        if let Ok(flag) = std::env::var("RISE_HEADLESS") {
            self.assets.headless = flag == "1" || flag == "true";
        }
        self
    }

    /// Reject values the simulation cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("physics.gravity", self.physics.gravity),
            ("physics.player_speed", self.physics.player_speed),
            ("physics.jump_power", self.physics.jump_power),
            ("physics.player_size", self.physics.player_size),
            ("enemies.guard_speed", self.enemies.guard_speed),
            ("enemies.assassin_speed", self.enemies.assassin_speed),
            ("enemies.jumper_speed", self.enemies.jumper_speed),
            ("enemies.jumper_jump_power", self.enemies.jumper_jump_power),
            ("enemies.size", self.enemies.size),
            ("ai.guard_aggro_radius", self.ai.guard_aggro_radius),
            ("ai.jumper_sight_range", self.ai.jumper_sight_range),
            ("ai.jumper_strike_range", self.ai.jumper_strike_range),
            ("ai.jumper_leap_scale", self.ai.jumper_leap_scale),
            ("ai.assassin_range", self.ai.assassin_range),
            ("ai.assassin_melee_range", self.ai.assassin_melee_range),
            ("ai.assassin_charge_scale", self.ai.assassin_charge_scale),
            ("ai.assassin_arrival_tolerance", self.ai.assassin_arrival_tolerance),
            ("ai.assassin_slow_radius", self.ai.assassin_slow_radius),
        ];
        for (field, value) in finite {
            // Q16.16 holds roughly +/-32767
            if !value.is_finite() || value.abs() > 30_000.0 {
                return Err(ConfigError::Invalid { field, reason: "must be a finite number below 30000" });
            }
        }

        if self.physics.player_size <= 0.0 {
            return Err(ConfigError::Invalid { field: "physics.player_size", reason: "must be positive" });
        }
        if self.enemies.size <= 0.0 {
            return Err(ConfigError::Invalid { field: "enemies.size", reason: "must be positive" });
        }
        if self.ai.assassin_slow_radius <= 0.0 {
            return Err(ConfigError::Invalid { field: "ai.assassin_slow_radius", reason: "must be positive" });
        }
        if self.driver.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid { field: "driver.max_steps_per_frame", reason: "must be at least 1" });
        }
        Ok(())
    }

    /// Fixed-point simulation config.
    pub fn sim_config(&self) -> SimConfig {
        let ai = &self.ai;
        SimConfig {
            ai: AiTuning {
                guard_aggro_radius: to_fixed(ai.guard_aggro_radius),
                jumper_sight_range: to_fixed(ai.jumper_sight_range),
                jumper_strike_range: to_fixed(ai.jumper_strike_range),
                jumper_chase_ticks: ai.jumper_chase_ticks,
                jumper_cooldown_ticks: ai.jumper_cooldown_ticks,
                jumper_leap_scale: to_fixed(ai.jumper_leap_scale),
                assassin_range: to_fixed(ai.assassin_range),
                assassin_melee_range: to_fixed(ai.assassin_melee_range),
                assassin_charge_scale: to_fixed(ai.assassin_charge_scale),
                assassin_arrival_tolerance: to_fixed(ai.assassin_arrival_tolerance),
                assassin_slow_radius: to_fixed(ai.assassin_slow_radius),
            },
            ..SimConfig::default()
        }
    }

    /// Fixed-point stats for level setup.
    pub fn stat_tuning(&self) -> StatTuning {
        StatTuning {
            gravity: to_fixed(self.physics.gravity),
            player_speed: to_fixed(self.physics.player_speed),
            jump_power: to_fixed(self.physics.jump_power),
            player_size: to_fixed(self.physics.player_size),
            guard_speed: to_fixed(self.enemies.guard_speed),
            assassin_speed: to_fixed(self.enemies.assassin_speed),
            jumper_speed: to_fixed(self.enemies.jumper_speed),
            jumper_jump_power: to_fixed(self.enemies.jumper_jump_power),
            enemy_size: to_fixed(self.enemies.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_ONE, GRAVITY, JUMP_POWER, PLAYER_SPEED};

    #[test]
    fn test_defaults_match_simulation_constants() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());

        let stats = config.stat_tuning();
        assert_eq!(stats.player_speed, PLAYER_SPEED);
        assert_eq!(stats.jump_power, JUMP_POWER);
        assert_eq!(stats.gravity, GRAVITY);
        assert_eq!(stats.enemy_size, FIXED_ONE);

        assert_eq!(config.sim_config(), SimConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "ai": { "guard_aggro_radius": 4.5 }, "driver": { "max_steps_per_frame": 2 } }"#,
        )
        .unwrap();

        assert_eq!(config.ai.guard_aggro_radius, 4.5);
        assert_eq!(config.ai.jumper_cooldown_ticks, 120);
        assert_eq!(config.driver.max_steps_per_frame, 2);
        assert_eq!(config.physics, PhysicsConfig::default());
        assert_eq!(config.sim_config().ai.guard_aggro_radius, to_fixed(4.5));
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(GameConfig::from_json_str("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = GameConfig::from_json_str(r#"{ "driver": { "max_steps_per_frame": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "driver.max_steps_per_frame", .. }));

        let err = GameConfig::from_json_str(r#"{ "enemies": { "size": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "enemies.size", .. }));

        let err = GameConfig::from_json_str(r#"{ "physics": { "gravity": 1e9 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "physics.gravity", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"{ "assets": { "headless": true, "directory": "res" } }"#).unwrap();

        let config = GameConfig::load(&path).unwrap();
        assert!(config.assets.headless);
        assert_eq!(config.assets.resolve(Path::new("fonts/font1.png")), PathBuf::from("res/fonts/font1.png"));

        let missing = GameConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(GameConfig::load_or_default(None).unwrap(), GameConfig::default());
    }
}
