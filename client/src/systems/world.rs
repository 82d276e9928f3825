//! World systems
//!
//! The firing range: ground, walls, crates and target dummies.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use controller::{DamageSink, DeathBehavior, Health, SurfaceKind};

// =============================================================================
// COMPONENTS
// =============================================================================

/// Root entity for all range geometry
#[derive(Component)]
pub struct RangeRoot;

/// Shootable dummy
#[derive(Component)]
pub struct TargetDummy;

/// Dummy that has been knocked over
#[derive(Component)]
pub struct Fallen;

const TARGET_HEALTH: f32 = 100.0;

// =============================================================================
// SPAWNING
// =============================================================================

/// Spawn the firing range
pub fn spawn_world(
    mut commands: Commands,
    roots: Query<Entity, With<RangeRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !roots.is_empty() {
        return;
    }

    let root = commands
        // Parent of every range entity; needs GlobalTransform for its children.
        .spawn((
            RangeRoot,
            Transform::default(),
            GlobalTransform::default(),
            Visibility::default(),
            InheritedVisibility::default(),
        ))
        .id();

    // --- Ground ---
    let ground_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.42, 0.45, 0.38),
        perceptual_roughness: 0.95,
        ..default()
    });
    let ground = commands
        .spawn((
            Mesh3d(meshes.add(Cuboid::new(100.0, 0.2, 100.0))),
            MeshMaterial3d(ground_material),
            Transform::from_xyz(0.0, -0.1, 0.0),
            RigidBody::Fixed,
            Collider::cuboid(50.0, 0.1, 50.0),
        ))
        .id();
    commands.entity(root).add_child(ground);

    // --- Back wall and side walls ---
    let wall_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.6, 0.6, 0.65),
        perceptual_roughness: 0.9,
        metallic: 0.0,
        ..default()
    });
    let walls = [
        // (center, half extents)
        (Vec3::new(0.0, 4.0, -40.0), Vec3::new(20.0, 4.0, 0.5)),
        (Vec3::new(-20.0, 2.0, -20.0), Vec3::new(0.5, 2.0, 20.0)),
        (Vec3::new(20.0, 2.0, -20.0), Vec3::new(0.5, 2.0, 20.0)),
    ];
    for (center, half) in walls {
        let wall = commands
            .spawn((
                Mesh3d(meshes.add(Cuboid::new(half.x * 2.0, half.y * 2.0, half.z * 2.0))),
                MeshMaterial3d(wall_material.clone()),
                Transform::from_translation(center),
                RigidBody::Fixed,
                Collider::cuboid(half.x, half.y, half.z),
            ))
            .id();
        commands.entity(root).add_child(wall);
    }

    // --- Cover crates (static) ---
    let crate_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.4, 0.22),
        perceptual_roughness: 0.85,
        ..default()
    });
    let crate_mesh = meshes.add(Cuboid::new(1.2, 1.2, 1.2));
    for position in [
        Vec3::new(-4.0, 0.6, -12.0),
        Vec3::new(3.5, 0.6, -15.0),
        Vec3::new(3.5, 1.8, -15.0),
        Vec3::new(-8.0, 0.6, -22.0),
    ] {
        let crate_entity = commands
            .spawn((
                Mesh3d(crate_mesh.clone()),
                MeshMaterial3d(crate_material.clone()),
                Transform::from_translation(position),
                RigidBody::Fixed,
                Collider::cuboid(0.6, 0.6, 0.6),
            ))
            .id();
        commands.entity(root).add_child(crate_entity);
    }

    // --- Loose barrels (dynamic, never decaled) ---
    let barrel_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.2, 0.35, 0.6),
        metallic: 0.6,
        perceptual_roughness: 0.5,
        ..default()
    });
    let barrel_mesh = meshes.add(Cylinder::new(0.35, 1.0));
    for position in [Vec3::new(7.0, 0.5, -10.0), Vec3::new(-6.0, 0.5, -6.0)] {
        let barrel = commands
            .spawn((
                Mesh3d(barrel_mesh.clone()),
                MeshMaterial3d(barrel_material.clone()),
                Transform::from_translation(position),
                RigidBody::Dynamic,
                Collider::cylinder(0.5, 0.35),
            ))
            .id();
        commands.entity(root).add_child(barrel);
    }

    // --- Target dummies ---
    let dummy_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.25, 0.2),
        perceptual_roughness: 0.7,
        ..default()
    });
    let dummy_mesh = meshes.add(Capsule3d::new(0.35, 1.1));
    let dummies = [
        (Vec3::new(0.0, 0.9, -20.0), DeathBehavior::Disappear),
        (Vec3::new(-5.0, 0.9, -25.0), DeathBehavior::Disappear),
        (Vec3::new(6.0, 0.9, -28.0), DeathBehavior::Persist),
        (Vec3::new(-10.0, 0.9, -33.0), DeathBehavior::Persist),
        (Vec3::new(10.0, 0.9, -35.0), DeathBehavior::Disappear),
    ];
    for (position, on_death) in dummies {
        let dummy = commands
            .spawn((
                TargetDummy,
                Health::new(TARGET_HEALTH).with_death_behavior(on_death),
                Mesh3d(dummy_mesh.clone()),
                MeshMaterial3d(dummy_material.clone()),
                Transform::from_translation(position),
                RigidBody::Fixed,
                Collider::capsule_y(0.55, 0.35),
            ))
            .id();
        commands.entity(root).add_child(dummy);
    }

    // Distance markers along the lane
    let marker_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.9, 0.9, 0.85),
        perceptual_roughness: 0.9,
        ..default()
    });
    let marker_mesh = meshes.add(Cuboid::new(2.0, 0.02, 0.3));
    for dist in [10, 20, 30] {
        let marker = commands
            .spawn((
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(marker_material.clone()),
                Transform::from_xyz(0.0, 0.01, -(dist as f32)),
            ))
            .id();
        commands.entity(root).add_child(marker);
    }

    info!("Spawned firing range with {} targets", dummies.len());
}

// =============================================================================
// DAMAGE
// =============================================================================

/// Map a hit entity to the kind of surface it is
pub fn surface_kind(entity: Entity, targets: &Query<(), With<Health>>, bodies: &Query<&RigidBody>) -> SurfaceKind {
    if targets.contains(entity) {
        return SurfaceKind::Entity;
    }
    match bodies.get(entity) {
        Ok(RigidBody::Dynamic) => SurfaceKind::Dynamic,
        _ => SurfaceKind::Static,
    }
}

/// Damage sink over the `Health` components in the world
pub struct HealthDamage<'a, 'w, 's> {
    pub healths: &'a mut Query<'w, 's, &'static mut Health>,
}

impl DamageSink for HealthDamage<'_, '_, '_> {
    fn take_damage(&mut self, target: Entity, amount: f32) -> bool {
        let Ok(mut health) = self.healths.get_mut(target) else {
            return false;
        };
        let died = health.take_damage(amount);
        debug!("{target:?} took {amount} damage ({:.0} left)", health.current);
        died
    }
}

/// Remove or knock over dummies that ran out of health
pub fn handle_target_deaths(
    mut commands: Commands,
    mut targets: Query<(Entity, &Health, &mut Transform), (With<TargetDummy>, Without<Fallen>)>,
) {
    for (entity, health, mut transform) in targets.iter_mut() {
        if !health.is_dead() {
            continue;
        }
        match health.on_death {
            DeathBehavior::Disappear => {
                commands.entity(entity).despawn();
                info!("Target {entity:?} destroyed");
            }
            DeathBehavior::Persist => {
                transform.rotate_x(-std::f32::consts::FRAC_PI_2);
                transform.translation.y = 0.35;
                commands.entity(entity).insert(Fallen).remove::<Collider>();
                info!("Target {entity:?} down");
            }
        }
    }
}
