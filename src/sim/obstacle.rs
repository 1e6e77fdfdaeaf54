//! Obstacle and tile-end handlers
//!
//! Obstacle lifecycle: `Idle -> Destroyed` when tapped, or
//! `Idle -> player destroyed -> level reload` on contact with the ball.

use super::generator::{SpawnReport, TileGenerator};
use super::host::{DeferredAction, EntityId, Host, Transform};
use crate::settings::{ObstacleSettings, TileEndSettings};

/// Something on the receiving end of a contact event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub other: EntityId,
    /// Whether `other` is the player ball
    pub is_player: bool,
}

/// Objects that react to being tapped
pub trait Touchable {
    fn player_touch(&mut self, host: &mut dyn Host);
}

#[derive(Debug, Clone)]
pub struct Obstacle {
    entity: EntityId,
    settings: ObstacleSettings,
}

impl Obstacle {
    pub fn new(entity: EntityId, settings: ObstacleSettings) -> Self {
        Self { entity, settings }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Kill the player on contact and restart after `wait_time`
    pub fn on_collision(&mut self, host: &mut dyn Host, contact: Contact) {
        if !contact.is_player {
            return;
        }

        host.destroy(contact.other);
        host.schedule(self.entity, self.settings.wait_time, DeferredAction::ReloadActiveLevel);
        log::info!(
            "Player hit obstacle {:?}, restarting in {}s",
            self.entity,
            self.settings.wait_time
        );
    }
}

impl Touchable for Obstacle {
    fn player_touch(&mut self, host: &mut dyn Host) {
        if let Some(explosion) = self.settings.explosion {
            if let Some(at) = host.transform(self.entity) {
                let particles =
                    host.instantiate(explosion, Transform::from_translation(at.translation));
                host.schedule(
                    particles,
                    self.settings.explosion_lifetime,
                    DeferredAction::Destroy(particles),
                );
            }
        }
        host.destroy(self.entity);
    }
}

/// Trigger at the far edge of a tile
#[derive(Debug, Clone)]
pub struct TileEnd {
    entity: EntityId,
    settings: TileEndSettings,
}

impl TileEnd {
    pub fn new(entity: EntityId, settings: TileEndSettings) -> Self {
        Self { entity, settings }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Extend the track and retire this tile once the player passes
    pub fn on_trigger_enter(
        &mut self,
        host: &mut dyn Host,
        generator: &mut TileGenerator,
        contact: Contact,
    ) -> Option<SpawnReport> {
        if !contact.is_player {
            return None;
        }

        let report = generator.spawn_next(host, true);
        match host.parent(self.entity) {
            Some(tile) => {
                host.schedule(tile, self.settings.destroy_time, DeferredAction::Destroy(tile))
            }
            None => log::warn!("Tile end {:?} is not attached to a tile", self.entity),
        }
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TILE_END;
    use crate::platform::headless::{HeadlessHost, Request};
    use crate::settings::GeneratorSettings;
    use crate::sim::host::{HostEvent, Prefab};
    use glam::Vec3;

    fn host_with_player() -> (HeadlessHost, EntityId) {
        let mut host = HeadlessHost::new();
        let player = host.instantiate(
            Prefab::Player,
            Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)),
        );
        (host, player)
    }

    #[test]
    fn test_collision_kills_player_and_schedules_reload() {
        let mut host = HeadlessHost::new();
        host.load_level("Gameplay");
        host.step(0.0);
        let player = host.instantiate(Prefab::Player, Transform::IDENTITY);
        let entity = host.instantiate(
            Prefab::Obstacle,
            Transform::from_translation(Vec3::new(0.0, 0.5, 20.0)),
        );
        let mut obstacle = Obstacle::new(entity, ObstacleSettings::default());
        host.clear_requests();

        obstacle.on_collision(&mut host, Contact { other: player, is_player: true });
        assert_eq!(
            host.requests(),
            &[
                Request::Destroy(player),
                Request::Schedule {
                    owner: entity,
                    delay: 2.0,
                    action: DeferredAction::ReloadActiveLevel
                },
            ]
        );
        assert!(host.transform(player).is_none());

        // Nothing before the wait is over
        host.clear_requests();
        for _ in 0..3 {
            host.step(0.5);
        }
        assert!(host.requests().is_empty());
        host.step(0.5);
        assert_eq!(host.requests(), &[Request::LoadLevel("Gameplay".to_string())]);
        let events = host.step(0.0);
        assert!(events.contains(&HostEvent::LevelLoaded("Gameplay".to_string())));
    }

    #[test]
    fn test_collision_with_non_player_ignored() {
        let (mut host, _) = host_with_player();
        let other = host.instantiate(Prefab::Obstacle, Transform::IDENTITY);
        let entity = host.instantiate(Prefab::Obstacle, Transform::IDENTITY);
        let mut obstacle = Obstacle::new(entity, ObstacleSettings::default());
        host.clear_requests();

        obstacle.on_collision(&mut host, Contact { other, is_player: false });
        assert!(host.requests().is_empty());
        assert!(host.transform(other).is_some());
    }

    #[test]
    fn test_touch_spawns_explosion_and_destroys() {
        let (mut host, _) = host_with_player();
        let at = Vec3::new(1.0, 0.5, 7.0);
        let entity = host.instantiate(Prefab::Obstacle, Transform::from_translation(at));
        let mut obstacle = Obstacle::new(entity, ObstacleSettings::default());
        host.clear_requests();

        obstacle.player_touch(&mut host);

        let requests = host.requests().to_vec();
        assert_eq!(requests.len(), 3);
        let Request::Instantiate {
            prefab: Prefab::Explosion,
            id: particles,
            at: spawned,
        } = requests[0]
        else {
            panic!("expected explosion, got {:?}", requests[0]);
        };
        assert_eq!(spawned.translation, at);
        assert_eq!(
            requests[1],
            Request::Schedule {
                owner: particles,
                delay: 1.0,
                action: DeferredAction::Destroy(particles)
            }
        );
        assert_eq!(requests[2], Request::Destroy(entity));
        assert!(host.transform(entity).is_none());

        host.step(1.0);
        assert!(host.transform(particles).is_none());
    }

    #[test]
    fn test_touch_without_explosion_still_destroys() {
        let (mut host, _) = host_with_player();
        let entity = host.instantiate(Prefab::Obstacle, Transform::IDENTITY);
        let settings = ObstacleSettings {
            explosion: None,
            ..ObstacleSettings::default()
        };
        let mut obstacle = Obstacle::new(entity, settings);
        host.clear_requests();

        obstacle.player_touch(&mut host);
        assert_eq!(host.requests(), &[Request::Destroy(entity)]);
    }

    #[test]
    fn test_destroyed_obstacle_cancels_pending_reload() {
        let (mut host, player) = host_with_player();
        let entity = host.instantiate(Prefab::Obstacle, Transform::IDENTITY);
        let mut obstacle = Obstacle::new(entity, ObstacleSettings::default());

        obstacle.on_collision(&mut host, Contact { other: player, is_player: true });
        host.destroy(entity);
        host.clear_requests();
        host.step(5.0);
        assert!(host.requests().is_empty());
    }

    #[test]
    fn test_tile_end_scenario() {
        let (mut host, player) = host_with_player();
        let mut generator = TileGenerator::new(GeneratorSettings::default(), 4);
        let first = generator.spawn_next(&mut host, false);
        let trigger = host.find_child(first.tile, TILE_END).unwrap();
        let mut tile_end = TileEnd::new(trigger, TileEndSettings::default());
        host.clear_requests();

        let report = tile_end
            .on_trigger_enter(&mut host, &mut generator, Contact { other: player, is_player: true })
            .unwrap();

        let tiles: Vec<_> = host
            .requests()
            .iter()
            .filter(|r| matches!(r, Request::Instantiate { prefab: Prefab::Tile, .. }))
            .collect();
        assert_eq!(tiles.len(), 1);
        // Default obstacle spawning is on
        assert!(report.obstacle.is_some());
        assert!(host.requests().contains(&Request::Schedule {
            owner: first.tile,
            delay: 1.5,
            action: DeferredAction::Destroy(first.tile),
        }));

        host.step(1.0);
        assert!(host.transform(first.tile).is_some());
        let events = host.step(0.5);
        assert!(host.transform(first.tile).is_none());
        assert!(host.transform(trigger).is_none());
        assert!(events.contains(&HostEvent::Destroyed(first.tile)));
        assert!(host.transform(report.tile).is_some());
    }

    #[test]
    fn test_tile_end_ignores_non_player() {
        let (mut host, _) = host_with_player();
        let mut generator = TileGenerator::new(GeneratorSettings::default(), 4);
        let first = generator.spawn_next(&mut host, false);
        let trigger = host.find_child(first.tile, TILE_END).unwrap();
        let mut tile_end = TileEnd::new(trigger, TileEndSettings::default());
        let cursor = generator.cursor();
        host.clear_requests();

        let other = EntityId(9999);
        assert!(tile_end
            .on_trigger_enter(&mut host, &mut generator, Contact { other, is_player: false })
            .is_none());
        assert!(host.requests().is_empty());
        assert_eq!(generator.cursor(), cursor);
    }
}
