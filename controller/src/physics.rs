//! Physics seam
//!
//! The controller never owns a rigid body. The host wraps its physics engine in a
//! [`CharacterBody`] each frame; ray casts go through [`HitScan`].

use bevy::prelude::*;

/// Result of a solid ray cast
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Entity owning the collider that was hit
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// What kind of thing a ray hit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Something with health (players, targets). Damaged, never decaled.
    Entity,
    /// World geometry
    Static,
    /// Loose rigid bodies
    Dynamic,
}

/// Origin and direction of a shot, usually the camera pose
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl AimRay {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray along the transform's forward (-Z) axis
    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, *transform.forward())
    }
}

impl Default for AimRay {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

/// Synchronous scene queries
pub trait HitScan {
    /// Solid ray cast that never reports the character's own collider
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// Classify the entity behind a hit
    fn classify(&self, entity: Entity) -> SurfaceKind;

    /// True when a sphere at `center` overlaps no collider
    fn is_clear(&self, center: Vec3, radius: f32) -> bool;
}

/// One dynamic rigid body, read and written by the controllers
pub trait CharacterBody: HitScan {
    fn translation(&self) -> Vec3;
    fn linvel(&self) -> Vec3;
    fn set_linvel(&mut self, velocity: Vec3);
    fn apply_impulse(&mut self, impulse: Vec3);
}

/// First candidate with enough free space around it
pub fn find_clear_spawn(scene: &(dyn HitScan + '_), candidates: &[Vec3], radius: f32) -> Option<Vec3> {
    candidates
        .iter()
        .copied()
        .find(|candidate| scene.is_clear(*candidate, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBody;

    #[test]
    fn test_aim_ray_normalizes() {
        let ray = AimRay::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(ray.direction, Vec3::NEG_Z);
    }

    #[test]
    fn test_aim_ray_from_camera_transform() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0);
        let ray = AimRay::from_transform(&transform);
        assert_eq!(ray.origin, Vec3::new(1.0, 2.0, 3.0));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_find_clear_spawn_skips_blocked() {
        let mut body = MockBody::grounded();
        body.blocked_points.push(Vec3::ZERO);
        let spawn = find_clear_spawn(&body, &[Vec3::ZERO, Vec3::X * 5.0], 0.5);
        assert_eq!(spawn, Some(Vec3::X * 5.0));
    }

    #[test]
    fn test_find_clear_spawn_none_when_all_blocked() {
        let mut body = MockBody::grounded();
        body.blocked_points.push(Vec3::ZERO);
        assert_eq!(find_clear_spawn(&body, &[Vec3::ZERO], 0.5), None);
    }
}
