//! Procedural track generation
//!
//! Tiles are chained through their `NextSpawnPoint` anchor: each new tile is
//! placed at the cursor, and the cursor jumps to the anchor of the tile just
//! placed. No offsets are accumulated here, the host composes the transforms.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::host::{EntityId, Host, Tag, Transform};
use crate::consts::NEXT_SPAWN_POINT;
use crate::settings::GeneratorSettings;

/// Entities created by one `spawn_next` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnReport {
    pub tile: EntityId,
    pub obstacle: Option<EntityId>,
}

/// Owns the track cursor and extends the track on demand
#[derive(Debug, Clone)]
pub struct TileGenerator {
    settings: GeneratorSettings,
    cursor: Transform,
    rng: Pcg32,
}

impl TileGenerator {
    pub fn new(settings: GeneratorSettings, seed: u64) -> Self {
        let cursor = Transform::from_translation(settings.start_point);
        Self {
            settings,
            cursor,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Where the next tile will be placed
    pub fn cursor(&self) -> Transform {
        self.cursor
    }

    /// Reset the cursor and lay down the warm-up track
    pub fn start(&mut self, host: &mut dyn Host) -> Vec<SpawnReport> {
        self.cursor = Transform::from_translation(self.settings.start_point);

        let count = self.settings.effective_init_spawn_num();
        let reports: Vec<_> = (0..count)
            .map(|i| self.spawn_next(host, i >= self.settings.init_no_obstacles))
            .collect();

        log::info!(
            "Track started at {:?}: {} tiles, {} obstacle-free",
            self.settings.start_point,
            count,
            self.settings.init_no_obstacles.min(count)
        );
        reports
    }

    /// Place one tile at the cursor, advance the cursor, optionally add an obstacle
    pub fn spawn_next(&mut self, host: &mut dyn Host, spawn_obstacle: bool) -> SpawnReport {
        let tile = host.instantiate(self.settings.tile, self.cursor);

        match host
            .find_child(tile, NEXT_SPAWN_POINT)
            .and_then(|anchor| host.transform(anchor))
        {
            Some(next) => self.cursor = next,
            None => log::warn!(
                "Tile {:?} has no {} anchor, cursor not advanced",
                tile,
                NEXT_SPAWN_POINT
            ),
        }

        let mut report = SpawnReport {
            tile,
            obstacle: None,
        };
        if !spawn_obstacle {
            return report;
        }

        let anchors: Vec<EntityId> = host
            .children(tile)
            .into_iter()
            .filter(|&child| host.has_tag(child, Tag::ObstacleSpawn))
            .collect();
        if anchors.is_empty() {
            return report;
        }

        let anchor = anchors[self.rng.random_range(0..anchors.len())];
        let Some(anchor_pos) = host.transform(anchor).map(|t| t.translation) else {
            return report;
        };

        let obstacle =
            host.instantiate(self.settings.obstacle, Transform::from_translation(anchor_pos));
        host.set_parent(obstacle, anchor);
        log::debug!("Tile {:?}: obstacle {:?} on anchor {:?}", tile, obstacle, anchor);

        report.obstacle = Some(obstacle);
        report
    }
}
