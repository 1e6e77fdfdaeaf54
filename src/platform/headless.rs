//! In-memory host
//!
//! A minimal engine stand-in: an entity tree built from fixed prefab layouts,
//! sphere colliders and box triggers, velocity integration for bodies,
//! ray/sweep queries, deferred tasks and level switching. Every request a
//! component makes is appended to a log so behavior can be asserted on.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Vec2, Vec3};

use crate::consts::{NEXT_SPAWN_POINT, TILE_END};
use crate::sim::host::{DeferredAction, EntityId, Hit, Host, HostEvent, Prefab, Ray, Tag, Transform};
use crate::sim::schedule::{DeferredTask, Scheduler};

/// Ball collider radius
pub const BALL_RADIUS: f32 = 0.5;
/// Obstacle collider radius
pub const OBSTACLE_RADIUS: f32 = 0.5;
/// Rigid body mass used for force integration
pub const BODY_MASS: f32 = 1.0;

/// Default screen (portrait phone)
pub const DEFAULT_VIEWPORT: (f32, f32) = (1080.0, 1920.0);
/// Vertical field of view of the main camera (radians)
pub const CAMERA_FOV_Y: f32 = std::f32::consts::FRAC_PI_3;

/// Shape of the tile prefab, in tile-local space
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayout {
    pub next_spawn_point: Transform,
    /// Positions of the `ObstacleSpawn` anchors
    pub obstacle_anchors: Vec<Vec3>,
    /// Center of the `TileEnd` trigger
    pub end_trigger: Vec3,
    pub end_trigger_half_extents: Vec3,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            next_spawn_point: Transform::from_translation(Vec3::new(0.0, 0.0, 10.0)),
            obstacle_anchors: vec![
                Vec3::new(-2.0, 0.5, 5.0),
                Vec3::new(0.0, 0.5, 5.0),
                Vec3::new(2.0, 0.5, 5.0),
            ],
            end_trigger: Vec3::new(0.0, 1.0, 9.5),
            end_trigger_half_extents: Vec3::new(3.0, 1.0, 0.5),
        }
    }
}

/// A request issued through [`Host`], in call order
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Instantiate { prefab: Prefab, id: EntityId, at: Transform },
    SetParent { child: EntityId, parent: EntityId },
    Destroy(EntityId),
    Schedule { owner: EntityId, delay: f32, action: DeferredAction },
    SetTransform { entity: EntityId, transform: Transform },
    SetActive { entity: EntityId, active: bool },
    AddForce { body: EntityId, force: Vec3 },
    MovePosition { body: EntityId, position: Vec3 },
    SetTimeScale(f32),
    LoadLevel(String),
}

#[derive(Debug, Clone, Copy)]
enum Collider {
    Sphere { radius: f32 },
    Trigger { half_extents: Vec3 },
}

#[derive(Debug, Clone, Copy, Default)]
struct Body {
    velocity: Vec3,
    force: Vec3,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    prefab: Option<Prefab>,
    tag: Tag,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    local: Transform,
    active: bool,
    collider: Option<Collider>,
    body: Option<Body>,
}

impl Node {
    fn new(name: impl Into<String>, local: Transform) -> Self {
        Self {
            name: name.into(),
            prefab: None,
            tag: Tag::Untagged,
            parent: None,
            children: Vec::new(),
            local,
            active: true,
            collider: None,
            body: None,
        }
    }

    fn tagged(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ContactKey {
    /// (collider, body)
    Touching(EntityId, EntityId),
    /// (trigger, body)
    Inside(EntityId, EntityId),
}

pub struct HeadlessHost {
    layout: TileLayout,
    nodes: BTreeMap<EntityId, Node>,
    next_id: u32,
    scheduler: Scheduler,
    contacts: BTreeSet<ContactKey>,
    events: Vec<HostEvent>,
    requests: Vec<Request>,
    active_level: String,
    pending_level: Option<String>,
    time_scale: f32,
    delta_time: f32,
    viewport: Vec2,
    sweeps: std::cell::Cell<usize>,
    raycasts: std::cell::Cell<usize>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::with_layout(TileLayout::default())
    }

    pub fn with_layout(layout: TileLayout) -> Self {
        Self {
            layout,
            nodes: BTreeMap::new(),
            next_id: 1,
            scheduler: Scheduler::new(),
            contacts: BTreeSet::new(),
            events: Vec::new(),
            requests: Vec::new(),
            active_level: String::new(),
            pending_level: None,
            time_scale: 1.0,
            delta_time: 0.0,
            viewport: Vec2::new(DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1),
            sweeps: Default::default(),
            raycasts: Default::default(),
        }
    }

    /// Advance one frame of `dt` unscaled seconds and collect the events it raised.
    ///
    /// A pending level load replaces the scene and ends the frame early.
    pub fn step(&mut self, dt: f32) -> Vec<HostEvent> {
        self.delta_time = dt.max(0.0) * self.time_scale;

        if let Some(level) = self.pending_level.take() {
            // The loading frame's time is not credited to the new scene
            self.reset_scene();
            log::info!("Level {level} loaded");
            self.active_level = level.clone();
            self.events.push(HostEvent::LevelLoaded(level));
            return self.drain_events();
        }

        for task in self.scheduler.advance(self.delta_time) {
            self.run_task(task);
        }
        self.integrate(self.delta_time);
        self.detect_contacts();
        self.drain_events()
    }

    /// Events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }

    pub fn sweep_count(&self) -> usize {
        self.sweeps.get()
    }

    pub fn raycast_count(&self) -> usize {
        self.raycasts.get()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn viewport_size(&self) -> (f32, f32) {
        (self.viewport.x, self.viewport.y)
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.nodes.get(&entity).map(|n| n.name.as_str())
    }

    pub fn is_active(&self, entity: EntityId) -> Option<bool> {
        self.nodes.get(&entity).map(|n| n.active)
    }

    pub fn velocity(&self, entity: EntityId) -> Option<Vec3> {
        self.nodes.get(&entity)?.body.map(|b| b.velocity)
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    /// Live entities built from `prefab`
    pub fn count_prefab(&self, prefab: Prefab) -> usize {
        self.nodes.values().filter(|n| n.prefab == Some(prefab)).count()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Scaled seconds the scene timers have seen
    pub fn clock(&self) -> f64 {
        self.scheduler.now()
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, node: Node, parent: Option<EntityId>) -> EntityId {
        let id = self.alloc_id();
        let mut node = node;
        node.parent = parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Build a prefab's node tree, returning the root
    fn build_prefab(&mut self, prefab: Prefab, at: Transform) -> EntityId {
        let mut root = match prefab {
            Prefab::Tile => Node::new("Tile", at),
            Prefab::Obstacle => Node::new("Obstacle", at).with_collider(Collider::Sphere {
                radius: OBSTACLE_RADIUS,
            }),
            Prefab::Explosion => Node::new("Explosion", at),
            Prefab::Player => {
                let mut node = Node::new("Player", at)
                    .with_collider(Collider::Sphere { radius: BALL_RADIUS });
                node.body = Some(Body::default());
                node
            }
            Prefab::Camera => Node::new("Main Camera", at),
            Prefab::PausePanel => Node::new("Pause Menu", at),
        };
        root.prefab = Some(prefab);
        let id = self.insert(root, None);

        if prefab == Prefab::Tile {
            let layout = self.layout.clone();
            self.insert(Node::new("Floor", Transform::IDENTITY), Some(id));
            self.insert(Node::new(NEXT_SPAWN_POINT, layout.next_spawn_point), Some(id));
            for (i, anchor) in layout.obstacle_anchors.iter().enumerate() {
                self.insert(
                    Node::new(format!("ObstacleSpawn{i}"), Transform::from_translation(*anchor))
                        .tagged(Tag::ObstacleSpawn),
                    Some(id),
                );
            }
            self.insert(
                Node::new(TILE_END, Transform::from_translation(layout.end_trigger)).with_collider(
                    Collider::Trigger {
                        half_extents: layout.end_trigger_half_extents,
                    },
                ),
                Some(id),
            );
        }
        id
    }

    fn world_transform(&self, entity: EntityId) -> Option<Transform> {
        let node = self.nodes.get(&entity)?;
        match node.parent {
            Some(parent) => Some(self.world_transform(parent)?.mul_transform(&node.local)),
            None => Some(node.local),
        }
    }

    /// Convert a world transform into `entity`'s parent space
    fn to_local(&self, entity: EntityId, world: Transform) -> Transform {
        match self
            .nodes
            .get(&entity)
            .and_then(|n| n.parent)
            .and_then(|p| self.world_transform(p))
        {
            Some(parent) => parent.inverse().mul_transform(&world),
            None => world,
        }
    }

    fn subtree(&self, root: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn detach(&mut self, entity: EntityId) {
        let parent = self.nodes.get(&entity).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != entity);
        }
    }

    fn run_task(&mut self, task: DeferredTask) {
        // Owner died earlier in this same frame
        if !self.nodes.contains_key(&task.owner) {
            return;
        }
        match task.action {
            DeferredAction::Destroy(entity) => self.destroy(entity),
            DeferredAction::ReloadActiveLevel => {
                let level = self.active_level.clone();
                self.load_level(&level);
            }
        }
    }

    fn reset_scene(&mut self) {
        self.nodes.clear();
        self.scheduler.clear();
        self.contacts.clear();
        self.events.clear();
    }

    fn integrate(&mut self, dt: f32) {
        for node in self.nodes.values_mut() {
            if let Some(body) = node.body.as_mut() {
                body.velocity += body.force / BODY_MASS * dt;
                body.force = Vec3::ZERO;
                node.local.translation += body.velocity * dt;
            }
        }
    }

    fn detect_contacts(&mut self) {
        let bodies: Vec<(EntityId, Vec3, f32)> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.active && n.body.is_some())
            .filter_map(|(&id, n)| match n.collider {
                Some(Collider::Sphere { radius }) => {
                    Some((id, self.world_transform(id)?.translation, radius))
                }
                _ => None,
            })
            .collect();

        let mut current = BTreeSet::new();
        for &(body, position, radius) in &bodies {
            for (&id, node) in &self.nodes {
                if id == body || !node.active {
                    continue;
                }
                let (Some(collider), Some(world)) = (node.collider, self.world_transform(id)) else {
                    continue;
                };
                match collider {
                    Collider::Sphere { radius: other } => {
                        if position.distance(world.translation) < radius + other {
                            current.insert(ContactKey::Touching(id, body));
                        }
                    }
                    Collider::Trigger { half_extents } => {
                        let local = world.inverse().transform_point(position);
                        if local.abs().cmple(half_extents + Vec3::splat(radius)).all() {
                            current.insert(ContactKey::Inside(id, body));
                        }
                    }
                }
            }
        }

        for key in current.difference(&self.contacts) {
            match *key {
                ContactKey::Touching(entity, body) => {
                    self.events.push(HostEvent::Collision { entity, other: body });
                    self.events.push(HostEvent::Collision { entity: body, other: entity });
                }
                ContactKey::Inside(trigger, body) => {
                    self.events.push(HostEvent::TriggerEnter { trigger, other: body });
                }
            }
        }
        self.contacts = current;
    }

    /// Closest solid sphere along a ray within `max_distance`, growing each sphere by `inflate`
    fn cast(
        &self,
        ray: &Ray,
        max_distance: f32,
        inflate: f32,
        ignore: Option<EntityId>,
    ) -> Option<Hit> {
        self.nodes
            .iter()
            .filter(|(id, n)| n.active && Some(**id) != ignore)
            .filter_map(|(&id, n)| match n.collider {
                Some(Collider::Sphere { radius }) => {
                    let center = self.world_transform(id)?.translation;
                    let distance = ray_sphere(ray, center, radius + inflate)?;
                    (distance <= max_distance).then(|| Hit {
                        entity: id,
                        point: ray.at(distance),
                        distance,
                    })
                }
                _ => None,
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Entry distance of a ray into a sphere; rays starting inside don't hit it
fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = oc.dot(ray.direction);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

impl Host for HeadlessHost {
    fn instantiate(&mut self, prefab: Prefab, at: Transform) -> EntityId {
        let id = self.build_prefab(prefab, at);
        self.requests.push(Request::Instantiate { prefab, id, at });
        id
    }

    fn set_parent(&mut self, child: EntityId, parent: EntityId) {
        self.requests.push(Request::SetParent { child, parent });
        let (Some(world), Some(parent_world)) =
            (self.world_transform(child), self.world_transform(parent))
        else {
            return;
        };
        if self.subtree(child).contains(&parent) {
            log::warn!("Refusing to parent {:?} under its own descendant {:?}", child, parent);
            return;
        }

        self.detach(child);
        let local = parent_world.inverse().mul_transform(&world);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
            node.local = local;
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn destroy(&mut self, entity: EntityId) {
        if !self.nodes.contains_key(&entity) {
            return;
        }
        self.requests.push(Request::Destroy(entity));
        self.detach(entity);

        for id in self.subtree(entity) {
            self.nodes.remove(&id);
            self.scheduler.cancel_owned_by(id);
            self.contacts.retain(|key| match *key {
                ContactKey::Touching(a, b) | ContactKey::Inside(a, b) => a != id && b != id,
            });
            self.events.push(HostEvent::Destroyed(id));
        }
    }

    fn find_child(&self, entity: EntityId, name: &str) -> Option<EntityId> {
        self.nodes
            .get(&entity)?
            .children
            .iter()
            .copied()
            .find(|c| self.nodes.get(c).is_some_and(|n| n.name == name))
    }

    fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.nodes
            .get(&entity)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(&entity)?.parent
    }

    fn has_tag(&self, entity: EntityId, tag: Tag) -> bool {
        self.nodes.get(&entity).is_some_and(|n| n.tag == tag)
    }

    fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.world_transform(entity)
    }

    fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.requests.push(Request::SetTransform { entity, transform });
        let local = self.to_local(entity, transform);
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.local = local;
        }
    }

    fn set_active(&mut self, entity: EntityId, active: bool) {
        self.requests.push(Request::SetActive { entity, active });
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.active = active;
        }
    }

    fn schedule(&mut self, owner: EntityId, delay: f32, action: DeferredAction) {
        self.requests.push(Request::Schedule {
            owner,
            delay,
            action: action.clone(),
        });
        self.scheduler.schedule(owner, delay, action);
    }

    fn add_force(&mut self, body: EntityId, force: Vec3) {
        self.requests.push(Request::AddForce { body, force });
        if let Some(body) = self.nodes.get_mut(&body).and_then(|n| n.body.as_mut()) {
            body.force += force;
        }
    }

    fn move_position(&mut self, body: EntityId, position: Vec3) {
        self.requests.push(Request::MovePosition { body, position });
        let Some(world) = self.world_transform(body) else {
            return;
        };
        let local = self.to_local(body, Transform::new(position, world.rotation));
        if let Some(node) = self.nodes.get_mut(&body) {
            node.local = local;
        }
    }

    fn sweep_test(&self, body: EntityId, direction: Vec3, distance: f32) -> Option<Hit> {
        self.sweeps.set(self.sweeps.get() + 1);
        let node = self.nodes.get(&body)?;
        let radius = match node.collider {
            Some(Collider::Sphere { radius }) => radius,
            _ => 0.0,
        };
        let origin = self.world_transform(body)?.translation;
        self.cast(&Ray::new(origin, direction), distance, radius, Some(body))
    }

    fn raycast(&self, ray: Ray) -> Option<Hit> {
        self.raycasts.set(self.raycasts.get() + 1);
        self.cast(&ray, f32::INFINITY, 0.0, None)
    }

    fn screen_to_viewport(&self, screen: Vec2) -> Vec2 {
        screen / self.viewport
    }

    fn screen_point_to_ray(&self, screen: Vec2) -> Ray {
        let camera = self
            .nodes
            .iter()
            .find(|(_, n)| n.prefab == Some(Prefab::Camera))
            .and_then(|(&id, _)| self.world_transform(id))
            .unwrap_or_default();

        let ndc = self.screen_to_viewport(screen) * 2.0 - Vec2::ONE;
        let half_height = (CAMERA_FOV_Y * 0.5).tan();
        let aspect = self.viewport.x / self.viewport.y;
        let local = Vec3::new(ndc.x * half_height * aspect, ndc.y * half_height, 1.0);
        Ray::new(camera.translation, camera.rotation * local)
    }

    fn delta_time(&self) -> f32 {
        self.delta_time
    }

    fn set_time_scale(&mut self, scale: f32) {
        self.requests.push(Request::SetTimeScale(scale));
        self.time_scale = scale.max(0.0);
    }

    fn load_level(&mut self, name: &str) {
        self.requests.push(Request::LoadLevel(name.to_string()));
        self.pending_level = Some(name.to_string());
    }

    fn active_level(&self) -> &str {
        &self.active_level
    }
}
