//! Local player systems
//!
//! Spawning the player body, dispatching this frame's intents and ticking the
//! character controller before the physics step.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use controller::physics::find_clear_spawn;
use controller::{
    AimRay, CharacterController, CommandContext, ControllerConfig, Health, VisualModeContext, WeaponInstance,
    WeaponLibrary, WeaponSinks,
};

use super::world::{surface_kind, HealthDamage};
use crate::decals::DecalRequests;
use crate::input::{PendingEquip, PendingIntents};
use crate::physics::RapierCharacterBody;
use crate::weapon_view::{spawn_weapon_model, AmmoReadout, WeaponView};

// =============================================================================
// COMPONENTS & RESOURCES
// =============================================================================

/// Marker for the local player body
#[derive(Component)]
pub struct Player;

/// Tuning handed to the character controller at spawn
#[derive(Resource, Default)]
pub struct CharacterTuning(pub ControllerConfig);

/// Capsule radius
pub const PLAYER_RADIUS: f32 = 0.4;
/// Half height of the capsule's cylinder part (total height 1.8)
pub const PLAYER_HALF_HEIGHT: f32 = 0.5;
/// Jump height follows from this and the jump force
const PLAYER_MASS: f32 = 2.0;
/// Falling below this respawns the player
const FALL_LIMIT: f32 = -20.0;

const SPAWN_POINTS: [Vec3; 3] = [
    Vec3::new(0.0, 1.0, 5.0),
    Vec3::new(-3.0, 1.0, 5.0),
    Vec3::new(3.0, 1.0, 5.0),
];

// =============================================================================
// SPAWNING
// =============================================================================

pub fn spawn_player(mut commands: Commands, tuning: Res<CharacterTuning>) {
    commands.spawn((
        Player,
        CharacterController::new(tuning.0.clone()),
        Transform::from_translation(SPAWN_POINTS[0]),
        GlobalTransform::default(),
        RigidBody::Dynamic,
        Collider::capsule_y(PLAYER_HALF_HEIGHT, PLAYER_RADIUS),
        ColliderMassProperties::Mass(PLAYER_MASS),
        LockedAxes::ROTATION_LOCKED,
        // Horizontal speed is owned by the movement controller
        Friction {
            coefficient: 0.0,
            combine_rule: CoefficientCombineRule::Min,
        },
        Velocity::default(),
        ExternalImpulse::default(),
        Sleeping::disabled(),
        Ccd::enabled(),
    ));
    info!("Spawned player at {:?}", SPAWN_POINTS[0]);
}

// =============================================================================
// PER-FRAME
// =============================================================================

/// Dispatch queued intents, then advance every controller layer
pub fn drive_character(
    time: Res<Time>,
    rapier: ReadRapierContext,
    mut pending: ResMut<PendingIntents>,
    mut players: Query<
        (Entity, &mut CharacterController, &mut Transform, &mut Velocity, &mut ExternalImpulse),
        With<Player>,
    >,
    cameras: Query<&Transform, (With<Camera3d>, Without<Player>)>,
    targets: Query<(), With<Health>>,
    bodies: Query<&RigidBody>,
    mut healths: Query<&'static mut Health>,
    mut decals: ResMut<DecalRequests>,
    mut ammo: ResMut<AmmoReadout>,
) {
    let intents = std::mem::take(&mut pending.0);

    let Ok((entity, mut controller, mut transform, mut velocity, mut impulse)) = players.single_mut() else {
        return;
    };
    let Ok(context) = rapier.single() else {
        return;
    };

    let aim = cameras.single().map(AimRay::from_transform).unwrap_or_default();
    let classify = |hit: Entity| surface_kind(hit, &targets, &bodies);

    let mut body = RapierCharacterBody {
        context: &context,
        entity,
        translation: transform.translation,
        velocity: &mut *velocity,
        impulse: &mut *impulse,
        classify: &classify,
    };

    {
        let mut damage = HealthDamage { healths: &mut healths };
        let sinks = WeaponSinks::default()
            .with_damage(&mut damage)
            .with_decals(&mut *decals)
            .with_ammo(&mut *ammo);
        let mut ctx = CommandContext::new(time.elapsed_secs(), aim)
            .with_body(&mut body)
            .with_sinks(sinks);
        for intent in intents {
            controller.dispatch(intent, &mut ctx);
        }
    }

    controller.update(time.delta_secs(), Some(&mut body));

    let respawn = if transform.translation.y < FALL_LIMIT {
        find_clear_spawn(&body, &SPAWN_POINTS, PLAYER_RADIUS)
    } else {
        None
    };
    if let Some(spawn) = respawn {
        transform.translation = spawn;
        velocity.linvel = Vec3::ZERO;
        warn!("Player fell out of the range; respawned at {spawn:?}");
    }
}

/// Swap to the weapon named in [`PendingEquip`]
pub fn apply_pending_equip(
    mut commands: Commands,
    mut pending: ResMut<PendingEquip>,
    library: Res<WeaponLibrary>,
    mut modes: ResMut<VisualModeContext>,
    mut players: Query<&mut CharacterController, With<Player>>,
    cameras: Query<Entity, With<Camera3d>>,
    views: Query<Entity, With<WeaponView>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ammo: ResMut<AmmoReadout>,
) {
    let Some(name) = pending.0.take() else {
        return;
    };
    let (Ok(mut controller), Ok(camera)) = (players.single_mut(), cameras.single()) else {
        // Not spawned yet; try again next frame
        pending.0 = Some(name);
        return;
    };
    let Some(definition) = library.get(&name) else {
        warn!("No weapon definition named {name:?}");
        return;
    };
    if controller.weapon().is_some_and(|weapon| weapon.definition().name == name) {
        return;
    }

    let mut sinks = WeaponSinks::default().with_ammo(&mut *ammo);
    if let Some(previous) = controller.unequip(&mut sinks) {
        previous.destroy(&mut modes);
    }
    for view in views.iter() {
        commands.entity(view).despawn();
    }

    let rig = spawn_weapon_model(&mut commands, &mut meshes, &mut materials, &definition, camera);
    let weapon = WeaponInstance::new(definition, rig, &mut modes);
    controller.equip(weapon, &mut sinks);
}
