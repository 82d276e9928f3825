//! Wandering NPC
//!
//! One shootable wanderer roams the range. When it dies it disappears through
//! the regular target-death path, and a new one appears at a clear spot after
//! a short delay.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use controller::physics::find_clear_spawn;
use controller::wander::spawn_candidates;
use controller::{DeathBehavior, Health, HitScan, WanderConfig, Wanderer};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::world::TargetDummy;
use crate::physics::RapierScene;

const WANDERER_HEALTH: f32 = 100.0;
const WANDERER_RADIUS: f32 = 0.4;
const WANDERER_HALF_HEIGHT: f32 = 0.6;
/// Seconds between a death and the next wanderer
const RESPAWN_DELAY: f32 = 1.0;
const SPAWN_CENTER: Vec3 = Vec3::new(0.0, 2.0, -10.0);
const SPAWN_RADIUS: f32 = 15.0;
const SPAWN_ATTEMPTS: usize = 5;
/// Used when every sampled spot is blocked
const FALLBACK_SPAWN: Vec3 = Vec3::new(0.0, 2.0, -18.0);
const FALL_LIMIT: f32 = -20.0;

#[derive(Resource)]
pub struct WandererSpawner {
    delay: Timer,
    rng: StdRng,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
}

pub fn setup_wanderer_spawner(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(WandererSpawner {
        delay: Timer::from_seconds(RESPAWN_DELAY, TimerMode::Once),
        rng: StdRng::from_entropy(),
        mesh: meshes.add(Capsule3d::new(WANDERER_RADIUS, WANDERER_HALF_HEIGHT * 2.0)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.75, 0.25),
            perceptual_roughness: 0.7,
            ..default()
        }),
    });
}

/// First clear spot around the range center, or the fallback
fn choose_spawn(scene: &dyn HitScan, rng: &mut StdRng) -> Vec3 {
    let candidates = spawn_candidates(rng, SPAWN_CENTER, SPAWN_RADIUS, SPAWN_ATTEMPTS);
    find_clear_spawn(scene, &candidates, WANDERER_HALF_HEIGHT + WANDERER_RADIUS).unwrap_or_else(|| {
        warn!("No clear spot for the wanderer; using {FALLBACK_SPAWN:?}");
        FALLBACK_SPAWN
    })
}

/// Spawn a wanderer once the previous one has been gone for the delay
pub fn respawn_wanderer(
    mut commands: Commands,
    time: Res<Time>,
    rapier: ReadRapierContext,
    spawner: Option<ResMut<WandererSpawner>>,
    wanderers: Query<(), With<Wanderer>>,
) {
    let Some(mut spawner) = spawner else {
        return;
    };
    if !wanderers.is_empty() {
        spawner.delay.reset();
        return;
    }
    if !spawner.delay.tick(time.delta()).is_finished() {
        return;
    }
    let Ok(context) = rapier.single() else {
        return;
    };

    let scene = RapierScene { context: &context };
    let position = choose_spawn(&scene, &mut spawner.rng);
    commands.spawn((
        TargetDummy,
        Wanderer::new(position, WanderConfig::default()),
        Health::new(WANDERER_HEALTH).with_death_behavior(DeathBehavior::Disappear),
        Mesh3d(spawner.mesh.clone()),
        MeshMaterial3d(spawner.material.clone()),
        Transform::from_translation(position),
        RigidBody::Dynamic,
        Collider::capsule_y(WANDERER_HALF_HEIGHT, WANDERER_RADIUS),
        LockedAxes::ROTATION_LOCKED,
        Damping {
            linear_damping: 2.0,
            angular_damping: 5.0,
        },
        Friction::coefficient(0.5),
        Velocity::default(),
    ));
    spawner.delay.reset();
    info!("Wanderer spawned at {position:?}");
}

/// Steer every wanderer; one that fell out of the range is removed and respawns
pub fn drive_wanderers(
    mut commands: Commands,
    time: Res<Time>,
    mut wanderers: Query<(Entity, &mut Wanderer, &Transform, &mut Velocity)>,
) {
    let dt = time.delta_secs();
    for (entity, mut brain, transform, mut velocity) in wanderers.iter_mut() {
        if transform.translation.y < FALL_LIMIT {
            commands.entity(entity).despawn();
            warn!("Wanderer {entity:?} fell out of the range");
            continue;
        }
        velocity.linvel = brain.update(dt, transform.translation, velocity.linvel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller::{RayHit, SurfaceKind};

    struct Scene {
        open: bool,
    }

    impl HitScan for Scene {
        fn cast_ray(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<RayHit> {
            None
        }

        fn classify(&self, _entity: Entity) -> SurfaceKind {
            SurfaceKind::Static
        }

        fn is_clear(&self, _center: Vec3, _radius: f32) -> bool {
            self.open
        }
    }

    #[test]
    fn test_spawn_lands_near_range_center() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..10 {
            let spot = choose_spawn(&Scene { open: true }, &mut rng);
            assert!(spot.distance(SPAWN_CENTER) <= SPAWN_RADIUS + 1e-4);
        }
    }

    #[test]
    fn test_blocked_range_uses_fallback() {
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(choose_spawn(&Scene { open: false }, &mut rng), FALLBACK_SPAWN);
    }
}
