//! Scripted physics body and recording sinks for unit tests

use std::cell::RefCell;
use std::collections::HashMap;

use bevy::prelude::*;

use crate::physics::{CharacterBody, HitScan, RayHit, SurfaceKind};
use crate::sinks::{AmmoDisplay, DamageSink, DecalSink};

/// Distinct entity ids without spawning anything meaningful
pub fn test_entities(count: usize) -> Vec<Entity> {
    let mut world = World::new();
    (0..count).map(|_| world.spawn_empty().id()).collect()
}

/// Body with unit mass: impulses are added straight to velocity.
pub struct MockBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub impulses: Vec<Vec3>,
    /// Whether the downward probe finds ground
    pub ground: bool,
    /// What a non-downward ray hits
    pub target: Option<RayHit>,
    pub kinds: HashMap<Entity, SurfaceKind>,
    pub blocked_points: Vec<Vec3>,
    /// Every ray cast: (origin, direction, max distance)
    pub casts: RefCell<Vec<(Vec3, Vec3, f32)>>,
}

impl MockBody {
    pub fn grounded() -> Self {
        Self {
            position: Vec3::new(0.0, 0.9, 0.0),
            velocity: Vec3::ZERO,
            impulses: Vec::new(),
            ground: true,
            target: None,
            kinds: HashMap::new(),
            blocked_points: Vec::new(),
            casts: RefCell::new(Vec::new()),
        }
    }

    pub fn airborne() -> Self {
        Self {
            ground: false,
            ..Self::grounded()
        }
    }

    /// Forward shots hit `entity` ten meters ahead
    pub fn with_target(mut self, entity: Entity, kind: SurfaceKind) -> Self {
        self.target = Some(RayHit {
            entity,
            point: Vec3::new(0.0, 1.6, -10.0),
            normal: Vec3::Z,
            distance: 10.0,
        });
        self.kinds.insert(entity, kind);
        self
    }

    /// Casts that were not the grounding probe
    pub fn shot_count(&self) -> usize {
        self.casts
            .borrow()
            .iter()
            .filter(|(_, dir, _)| dir.y > -0.99)
            .count()
    }
}

impl HitScan for MockBody {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.casts.borrow_mut().push((origin, direction, max_distance));
        if direction.y <= -0.99 {
            return self.ground.then_some(RayHit {
                entity: Entity::PLACEHOLDER,
                point: origin - Vec3::Y * 0.9,
                normal: Vec3::Y,
                distance: 0.9,
            });
        }
        self.target.filter(|hit| hit.distance <= max_distance)
    }

    fn classify(&self, entity: Entity) -> SurfaceKind {
        self.kinds.get(&entity).copied().unwrap_or(SurfaceKind::Static)
    }

    fn is_clear(&self, center: Vec3, radius: f32) -> bool {
        !self
            .blocked_points
            .iter()
            .any(|p| p.distance(center) < radius)
    }
}

impl CharacterBody for MockBody {
    fn translation(&self) -> Vec3 {
        self.position
    }

    fn linvel(&self) -> Vec3 {
        self.velocity
    }

    fn set_linvel(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.impulses.push(impulse);
        self.velocity += impulse;
    }
}

#[derive(Default)]
pub struct RecordingDamage {
    pub hits: Vec<(Entity, f32)>,
    /// Report every hit as a kill
    pub lethal: bool,
}

impl DamageSink for RecordingDamage {
    fn take_damage(&mut self, target: Entity, amount: f32) -> bool {
        self.hits.push((target, amount));
        self.lethal
    }
}

#[derive(Default)]
pub struct RecordingDecals {
    pub decals: Vec<(Vec3, Vec3, Option<Entity>, SurfaceKind)>,
}

impl DecalSink for RecordingDecals {
    fn add_decal(&mut self, point: Vec3, normal: Vec3, hit: Option<Entity>, surface: SurfaceKind) {
        self.decals.push((point, normal, hit, surface));
    }
}

#[derive(Default)]
pub struct RecordingAmmo {
    pub updates: Vec<(u32, u32, bool)>,
}

impl RecordingAmmo {
    pub fn last(&self) -> Option<(u32, u32, bool)> {
        self.updates.last().copied()
    }
}

impl AmmoDisplay for RecordingAmmo {
    fn update(&mut self, current: u32, max: u32, is_reloading: bool) {
        self.updates.push((current, max, is_reloading));
    }
}
