//! Ball steering
//!
//! Two independent motion channels per frame: a continuous force (forward roll
//! plus lateral dodge) and an instantaneous swipe teleport.

use glam::{Vec2, Vec3};

use super::host::{EntityId, Host};
use super::input::{FrameInput, HorizMovement, InputPlatform, Touch, TouchPhase};
use super::menu::PauseState;
use crate::consts::{REFERENCE_FRAME_RATE, VIEWPORT_CENTER};
use crate::settings::PlayerSettings;

/// What the controller requested this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerUpdate {
    /// Force handed to the body
    pub force: Vec3,
    /// Target of a swipe teleport
    pub teleport: Option<Vec3>,
    /// Object under the primary touch
    pub touched: Option<EntityId>,
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    entity: EntityId,
    settings: PlayerSettings,
    platform: InputPlatform,
    /// Swipe start, consumed when the touch ends
    touch_start: Option<Vec2>,
}

impl PlayerController {
    pub fn new(entity: EntityId, settings: PlayerSettings, platform: InputPlatform) -> Self {
        Self {
            entity,
            settings,
            platform,
            touch_start: None,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Per-frame update; `None` while paused
    pub fn update(
        &mut self,
        host: &mut dyn Host,
        pause: &PauseState,
        input: &FrameInput,
    ) -> Option<PlayerUpdate> {
        if pause.is_paused() {
            return None;
        }

        let mut teleport = None;
        let mut touched = None;

        let horizontal_speed = match self.platform {
            InputPlatform::Desktop => {
                let mut speed = input.horizontal_axis * self.settings.dodge_speed;
                if let Some(pointer) = input.pointer_held {
                    speed = self.calculate_movement(host, pointer);
                }
                speed
            }
            InputPlatform::Mobile => {
                let mut speed = 0.0;
                if self.settings.horiz_movement == HorizMovement::Accelerometer {
                    speed = input.acceleration.x * self.settings.dodge_speed;
                }
                if let Some(touch) = input.primary_touch() {
                    if self.settings.horiz_movement == HorizMovement::ScreenTouch {
                        speed = self.calculate_movement(host, touch.position);
                    }
                    teleport = self.swipe_teleport(host, touch);
                    touched = touch_objects(host, touch);
                }
                speed
            }
        };

        let force = Vec3::new(horizontal_speed, 0.0, self.settings.effective_roll_speed())
            * (host.delta_time() * REFERENCE_FRAME_RATE);
        host.add_force(self.entity, force);

        Some(PlayerUpdate {
            force,
            teleport,
            touched,
        })
    }

    /// Binary steering from a pixel position: right half is +dodge, left half -dodge
    fn calculate_movement(&self, host: &dyn Host, pixel_pos: Vec2) -> f32 {
        let viewport = host.screen_to_viewport(pixel_pos);
        let x_move = if viewport.x > VIEWPORT_CENTER { 1.0 } else { -1.0 };
        x_move * self.settings.dodge_speed
    }

    /// Teleport sideways on a long enough horizontal swipe, if the path is clear
    fn swipe_teleport(&mut self, host: &mut dyn Host, touch: &Touch) -> Option<Vec3> {
        match touch.phase {
            TouchPhase::Began => {
                self.touch_start = Some(touch.position);
                None
            }
            TouchPhase::Ended => {
                let start = self.touch_start.take()?;
                let dx = touch.position.x - start.x;
                if dx.abs() < self.settings.min_swipe_distance {
                    return None;
                }

                let direction = if dx < 0.0 { Vec3::NEG_X } else { Vec3::X };
                if host.sweep_test(self.entity, direction, self.settings.swipe_move).is_some() {
                    log::debug!("Swipe blocked moving {:?}", direction);
                    return None;
                }

                let position = host.transform(self.entity)?.translation;
                let target = position + direction * self.settings.swipe_move;
                host.move_position(self.entity, target);
                log::debug!("Swipe teleport to {:?}", target);
                Some(target)
            }
            _ => None,
        }
    }
}

/// Object under a touch, if any
fn touch_objects(host: &dyn Host, touch: &Touch) -> Option<EntityId> {
    let ray = host.screen_point_to_ray(touch.position);
    host.raycast(ray).map(|hit| hit.entity)
}
