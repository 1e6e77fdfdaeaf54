//! Chase camera

use glam::Vec3;

use super::host::{EntityId, Host, Transform};
use crate::look_rotation;

/// Keeps the camera behind the target, facing it
#[derive(Debug, Clone)]
pub struct CameraFollow {
    entity: EntityId,
    target: Option<EntityId>,
    offset: Vec3,
}

impl CameraFollow {
    pub fn new(entity: EntityId, target: Option<EntityId>, offset: Vec3) -> Self {
        Self {
            entity,
            target,
            offset,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    pub fn update(&self, host: &mut dyn Host) {
        let Some(target) = self.target.and_then(|t| host.transform(t)) else {
            return;
        };

        let mut position = target.translation + self.offset;
        // Camera only tracks along Y/Z
        position.x = 0.0;

        let rotation = look_rotation(target.translation - position, Vec3::Y);
        host.set_transform(self.entity, Transform::new(position, rotation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessHost;
    use crate::sim::host::Prefab;

    #[test]
    fn test_follows_with_x_pinned() {
        let mut host = HeadlessHost::new();
        let target = host.instantiate(
            Prefab::Player,
            Transform::from_translation(Vec3::new(2.0, 0.5, 12.0)),
        );
        let cam = host.instantiate(Prefab::Camera, Transform::IDENTITY);
        let camera = CameraFollow::new(cam, Some(target), Vec3::new(0.0, 3.0, -6.0));

        camera.update(&mut host);
        let t = host.transform(cam).unwrap();
        assert_eq!(t.translation, Vec3::new(0.0, 3.5, 6.0));

        let facing = t.rotation * Vec3::Z;
        let to_target = (Vec3::new(2.0, 0.5, 12.0) - t.translation).normalize();
        assert!(facing.abs_diff_eq(to_target, 1e-5));
    }

    #[test]
    fn test_missing_target_skips() {
        let mut host = HeadlessHost::new();
        let start = Transform::from_translation(Vec3::new(0.0, 9.0, 9.0));
        let cam = host.instantiate(Prefab::Camera, start);
        let target = host.instantiate(Prefab::Player, Transform::IDENTITY);
        host.destroy(target);
        host.clear_requests();

        CameraFollow::new(cam, Some(target), Vec3::ONE).update(&mut host);
        CameraFollow::new(cam, None, Vec3::ONE).update(&mut host);
        assert_eq!(host.transform(cam).unwrap(), start);
        assert!(host.requests().is_empty());
    }
}
