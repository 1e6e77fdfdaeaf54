//! Gameplay simulation
//!
//! Every component here is a thin behavior driven by the host loop:
//! - No rendering, physics or scene loading of its own (all through [`Host`])
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)

pub mod camera;
pub mod game;
pub mod generator;
pub mod host;
pub mod input;
pub mod menu;
pub mod obstacle;
pub mod player;
pub mod schedule;

pub use camera::CameraFollow;
pub use game::{Game, GameContext, RunPhase};
pub use generator::{SpawnReport, TileGenerator};
pub use host::{DeferredAction, EntityId, Hit, Host, HostEvent, Prefab, Ray, Tag, Transform};
pub use input::{FrameInput, HorizMovement, InputPlatform, Touch, TouchPhase};
pub use menu::{MainMenu, MenuActions, PauseMenu, PauseState};
pub use obstacle::{Contact, Obstacle, TileEnd, Touchable};
pub use player::{PlayerController, PlayerUpdate};
pub use schedule::{DeferredTask, Scheduler};
