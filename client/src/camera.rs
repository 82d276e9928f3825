//! First-person camera
//!
//! Follows the player's eye, applies lean and weapon recoil, and blends the
//! field of view with ADS progress.

use bevy::prelude::*;
use controller::{CharacterController, LeanOffset};

use crate::input::InputState;
use crate::systems::{Player, DEFAULT_FOV_DEGREES};

/// Camera rotation for the given look angles and lean
pub fn view_rotation(yaw: f32, pitch: f32, lean: LeanOffset) -> Quat {
    // Leaning left (negative lateral) rolls the view counter-clockwise
    Quat::from_euler(EulerRot::YXZ, yaw, pitch, -lean.roll)
}

/// Eye position for a body origin, eye height and lean
pub fn eye_position(origin: Vec3, eye_height: f32, lean: LeanOffset, yaw: f32) -> Vec3 {
    let right = Quat::from_rotation_y(yaw) * Vec3::X;
    origin + Vec3::Y * eye_height + right * lean.lateral
}

/// Place the camera at the player's eye
pub fn update_camera(
    mut players: Query<(&Transform, &mut CharacterController), (With<Player>, Without<Camera3d>)>,
    mut cameras: Query<&mut Transform, (With<Camera3d>, Without<Player>)>,
    mut input_state: ResMut<InputState>,
) {
    let Ok((player_transform, mut controller)) = players.single_mut() else {
        return;
    };
    let Ok(mut camera_transform) = cameras.single_mut() else {
        return;
    };

    let kick = controller.take_camera_kick();
    if kick != Vec2::ZERO {
        input_state.add_rotation(kick.x, kick.y);
    }

    let lean = controller.lean_offset();
    camera_transform.translation = eye_position(
        player_transform.translation,
        controller.eye_height(),
        lean,
        input_state.yaw,
    );
    camera_transform.rotation = view_rotation(input_state.yaw, input_state.pitch, lean);
}

/// Blend between the weapon's hipfire and ADS field of view
pub fn update_camera_fov(
    players: Query<&CharacterController, With<Player>>,
    mut cameras: Query<&mut Projection, With<Camera3d>>,
) {
    let Ok(mut projection) = cameras.single_mut() else {
        return;
    };
    let Projection::Perspective(ref mut perspective) = *projection else {
        return;
    };

    let target_degrees = players
        .single()
        .ok()
        .and_then(|controller| controller.weapon())
        .map(|weapon| {
            let ads = &weapon.definition().ads;
            ads.hipfire_fov_degrees + (ads.ads_fov_degrees - ads.hipfire_fov_degrees) * weapon.ads_progress()
        })
        .unwrap_or(DEFAULT_FOV_DEGREES);

    perspective.fov = target_degrees.to_radians();
}
