//! Gameplay settings
//!
//! Every tunable value of a run, grouped per component. Loaded from JSON; any
//! section or field left out keeps its default.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_INIT_SPAWN, MAX_ROLL_SPEED};
use crate::sim::host::Prefab;
use crate::sim::input::{HorizMovement, InputPlatform};

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Tile generator tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Tile template to chain
    pub tile: Prefab,
    /// Obstacle template placed on tile anchors
    pub obstacle: Prefab,
    /// Where the first tile is placed
    pub start_point: Vec3,
    /// Tiles created in advance (1..=15)
    pub init_spawn_num: u32,
    /// Leading tiles spawned without obstacles
    pub init_no_obstacles: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            tile: Prefab::Tile,
            obstacle: Prefab::Obstacle,
            start_point: Vec3::new(0.0, 0.0, -5.0),
            init_spawn_num: 10,
            init_no_obstacles: 4,
        }
    }
}

impl GeneratorSettings {
    /// Warm-up count clamped to the slider range
    pub fn effective_init_spawn_num(&self) -> u32 {
        self.init_spawn_num.clamp(1, MAX_INIT_SPAWN)
    }
}

/// Player steering tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Where the ball starts
    pub start_position: Vec3,
    /// How fast the ball moves left/right
    pub dodge_speed: f32,
    /// How fast the ball moves forward automatically (0..=10)
    pub roll_speed: f32,
    /// Lateral control source on mobile
    pub horiz_movement: HorizMovement,
    /// How far a swipe teleports the ball
    pub swipe_move: f32,
    /// Minimum horizontal swipe, in pixels, before teleporting
    pub min_swipe_distance: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            start_position: Vec3::new(0.0, 0.5, 0.0),
            dodge_speed: 5.0,
            roll_speed: 5.0,
            horiz_movement: HorizMovement::Accelerometer,
            swipe_move: 2.0,
            min_swipe_distance: 2.0,
        }
    }
}

impl PlayerSettings {
    /// Roll speed clamped to the slider range
    pub fn effective_roll_speed(&self) -> f32 {
        self.roll_speed.clamp(0.0, MAX_ROLL_SPEED)
    }
}

/// Obstacle tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleSettings {
    /// Seconds between the player dying and the level reloading
    pub wait_time: f32,
    /// Effect spawned when the obstacle is tapped
    pub explosion: Option<Prefab>,
    /// Seconds the effect stays alive
    pub explosion_lifetime: f32,
}

impl Default for ObstacleSettings {
    fn default() -> Self {
        Self {
            wait_time: 2.0,
            explosion: Some(Prefab::Explosion),
            explosion_lifetime: 1.0,
        }
    }
}

/// Tile-end trigger tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileEndSettings {
    /// Seconds a passed tile stays visible
    pub destroy_time: f32,
}

impl Default for TileEndSettings {
    fn default() -> Self {
        Self { destroy_time: 1.5 }
    }
}

/// Camera follow tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub offset: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 3.0, -6.0),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for obstacle placement
    pub seed: u64,
    /// Level that runs the game
    pub game_level: String,
    /// Level holding the main menu
    pub menu_level: String,
    /// Which input path the player reads
    pub platform: InputPlatform,

    pub generator: GeneratorSettings,
    pub player: PlayerSettings,
    pub obstacle: ObstacleSettings,
    pub tile_end: TileEndSettings,
    pub camera: CameraSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            game_level: "Gameplay".to_string(),
            menu_level: "MainMenu".to_string(),
            platform: InputPlatform::Desktop,
            generator: GeneratorSettings::default(),
            player: PlayerSettings::default(),
            obstacle: ObstacleSettings::default(),
            tile_end: TileEndSettings::default(),
            camera: CameraSettings::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject values the components cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.game_level.is_empty() {
            return Err(SettingsError::invalid("game_level", "must not be empty"));
        }
        if !self.generator.start_point.is_finite() {
            return Err(SettingsError::invalid("generator.start_point", "must be finite"));
        }
        if !self.player.start_position.is_finite() {
            return Err(SettingsError::invalid("player.start_position", "must be finite"));
        }

        let non_negative = [
            ("player.dodge_speed", self.player.dodge_speed),
            ("player.roll_speed", self.player.roll_speed),
            ("player.swipe_move", self.player.swipe_move),
            ("player.min_swipe_distance", self.player.min_swipe_distance),
            ("obstacle.wait_time", self.obstacle.wait_time),
            ("obstacle.explosion_lifetime", self.obstacle.explosion_lifetime),
            ("tile_end.destroy_time", self.tile_end.destroy_time),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::invalid(
                    field,
                    format!("expected a finite value >= 0, got {value}"),
                ));
            }
        }

        if !self.camera.offset.is_finite() {
            return Err(SettingsError::invalid("camera.offset", "must be finite"));
        }
        Ok(())
    }
}
