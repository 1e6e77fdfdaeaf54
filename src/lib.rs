//! Rolling Runner - endless runner gameplay core
//!
//! Core modules:
//! - `sim`: Gameplay components (tile generator, player, obstacles, menus, camera)
//! - `platform`: Host engine implementations (headless reference host)
//! - `settings`: Data-driven tuning loaded from JSON

pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

use glam::{Mat3, Quat, Vec3};

/// Game configuration constants
pub mod consts {
    /// Frame rate the per-frame force is normalized to
    pub const REFERENCE_FRAME_RATE: f32 = 60.0;

    /// Child anchor that marks where the following tile attaches
    pub const NEXT_SPAWN_POINT: &str = "NextSpawnPoint";
    /// Child trigger volume at the far edge of a tile
    pub const TILE_END: &str = "TileEnd";

    /// Upper bound for tiles spawned ahead at run start
    pub const MAX_INIT_SPAWN: u32 = 15;
    /// Roll speed slider range
    pub const MAX_ROLL_SPEED: f32 = 10.0;

    /// Viewport x above which pointer steering goes right
    pub const VIEWPORT_CENTER: f32 = 0.5;
}

/// Rotation whose +Z axis points along `forward` with `up` as the vertical hint
/// (left-handed, +Y up). Returns identity for a degenerate direction.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = up.cross(forward).normalize_or_zero();
    if right == Vec3::ZERO {
        // Looking straight up or down
        right = Vec3::X;
    }
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize()
}
