//! Rapier-backed character body
//!
//! Built fresh each frame from the player's components and the Rapier context.
//! Every query excludes the player's own rigid body.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use controller::{CharacterBody, HitScan, RayHit, SurfaceKind};

pub struct RapierCharacterBody<'a> {
    pub context: &'a RapierContext<'a>,
    pub entity: Entity,
    pub translation: Vec3,
    pub velocity: &'a mut Velocity,
    pub impulse: &'a mut ExternalImpulse,
    /// Maps a hit collider to its surface kind
    pub classify: &'a dyn Fn(Entity) -> SurfaceKind,
}

impl RapierCharacterBody<'_> {
    fn filter(&self) -> QueryFilter<'static> {
        QueryFilter::default().exclude_rigid_body(self.entity)
    }
}

impl HitScan for RapierCharacterBody<'_> {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let (entity, intersection) =
            self.context
                .cast_ray_and_get_normal(origin, direction, max_distance, true, self.filter())?;
        Some(RayHit {
            entity,
            point: intersection.point,
            normal: intersection.normal,
            distance: intersection.time_of_impact,
        })
    }

    fn classify(&self, entity: Entity) -> SurfaceKind {
        (self.classify)(entity)
    }

    fn is_clear(&self, center: Vec3, radius: f32) -> bool {
        let probe = Collider::ball(radius);
        let mut hit = false;
        self.context
            .intersect_shape(center, Quat::IDENTITY, &*probe.raw, self.filter(), |_| {
                hit = true;
                false
            });
        !hit
    }
}

impl CharacterBody for RapierCharacterBody<'_> {
    fn translation(&self) -> Vec3 {
        self.translation
    }

    fn linvel(&self) -> Vec3 {
        self.velocity.linvel
    }

    fn set_linvel(&mut self, velocity: Vec3) {
        self.velocity.linvel = velocity;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.impulse.impulse += impulse;
    }
}

/// Scene queries that belong to no character, such as picking a spawn point
pub struct RapierScene<'a> {
    pub context: &'a RapierContext<'a>,
}

impl HitScan for RapierScene<'_> {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let (entity, intersection) =
            self.context
                .cast_ray_and_get_normal(origin, direction, max_distance, true, QueryFilter::default())?;
        Some(RayHit {
            entity,
            point: intersection.point,
            normal: intersection.normal,
            distance: intersection.time_of_impact,
        })
    }

    /// Surfaces are not told apart here
    fn classify(&self, _entity: Entity) -> SurfaceKind {
        SurfaceKind::Static
    }

    fn is_clear(&self, center: Vec3, radius: f32) -> bool {
        let ball = Collider::ball(radius);
        let mut hit = false;
        self.context
            .intersect_shape(center, Quat::IDENTITY, &*ball.raw, QueryFilter::default(), |_| {
                hit = true;
                false
            });
        !hit
    }
}
