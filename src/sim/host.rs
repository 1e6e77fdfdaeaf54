//! Host engine boundary
//!
//! Components only talk to the engine through [`Host`]. The engine owns the
//! scene graph, physics bodies, queries, timers and level loading; components
//! issue requests and react to [`HostEvent`]s.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to an engine-managed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Position + orientation in world or parent space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Compose a child's local transform onto this (parent) transform
    pub fn mul_transform(&self, local: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * local.translation,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// Map a point from this transform's local space into its parent space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }
}

/// Object tags the gameplay filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tag {
    #[default]
    Untagged,
    /// Valid location for an obstacle on a tile
    ObstacleSpawn,
}

/// Templates the host knows how to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prefab {
    Tile,
    Obstacle,
    Explosion,
    Player,
    Camera,
    PausePanel,
}

/// Ray for scene queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Result of a ray or sweep query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

/// Work the host runs after a delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Destroy an entity and its children
    Destroy(EntityId),
    /// Reload whichever level is active when the task fires
    ReloadActiveLevel,
}

/// Events the host raises into the gameplay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `entity`'s collider started touching `other`
    Collision { entity: EntityId, other: EntityId },
    /// `other` entered the trigger volume `trigger`
    TriggerEnter { trigger: EntityId, other: EntityId },
    /// The entity no longer exists
    Destroyed(EntityId),
    /// A level finished loading and replaced the previous one
    LevelLoaded(String),
}

/// Engine capabilities the gameplay components rely on
pub trait Host {
    // --- Scene graph ---

    /// Instantiate a template at a world transform
    fn instantiate(&mut self, prefab: Prefab, at: Transform) -> EntityId;
    /// Reparent keeping the current world transform
    fn set_parent(&mut self, child: EntityId, parent: EntityId);
    /// Destroy immediately, children included
    fn destroy(&mut self, entity: EntityId);
    /// Direct child with the given name
    fn find_child(&self, entity: EntityId, name: &str) -> Option<EntityId>;
    /// Direct children in creation order
    fn children(&self, entity: EntityId) -> Vec<EntityId>;
    fn parent(&self, entity: EntityId) -> Option<EntityId>;
    fn has_tag(&self, entity: EntityId, tag: Tag) -> bool;
    /// World transform, `None` once destroyed
    fn transform(&self, entity: EntityId) -> Option<Transform>;
    fn set_transform(&mut self, entity: EntityId, transform: Transform);
    /// Show or hide an object (UI panels included)
    fn set_active(&mut self, entity: EntityId, active: bool);

    // --- Timers ---

    /// Run `action` after `delay` seconds of scaled time; cancelled if `owner` dies first
    fn schedule(&mut self, owner: EntityId, delay: f32, action: DeferredAction);

    // --- Physics ---

    /// Additive force on a rigid body
    fn add_force(&mut self, body: EntityId, force: Vec3);
    /// Teleport a rigid body
    fn move_position(&mut self, body: EntityId, position: Vec3);
    /// Would moving `body` along `direction` for `distance` hit anything
    fn sweep_test(&self, body: EntityId, direction: Vec3, distance: f32) -> Option<Hit>;
    fn raycast(&self, ray: Ray) -> Option<Hit>;

    // --- Camera / screen ---

    /// Pixel position to 0..1 viewport space
    fn screen_to_viewport(&self, screen: Vec2) -> Vec2;
    /// Ray from the main camera through a pixel position
    fn screen_point_to_ray(&self, screen: Vec2) -> Ray;

    // --- Time ---

    /// Scaled seconds since the previous frame
    fn delta_time(&self) -> f32;
    fn set_time_scale(&mut self, scale: f32);

    // --- Levels ---

    /// Replace the current level; takes effect on the next frame
    fn load_level(&mut self, name: &str);
    fn active_level(&self) -> &str;
}
