//! Rendering systems
//!
//! Camera and light setup for the firing range.

use bevy::prelude::*;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::{light_consts::lux, CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::render::view::Msaa;

/// Default horizontal field of view without a weapon (degrees)
pub const DEFAULT_FOV_DEGREES: f32 = 70.0;

/// Marker for the sun directional light
#[derive(Component)]
pub struct SunLight;

/// One-time rendering setup.
pub fn setup_rendering(mut commands: Commands) {
    commands.insert_resource(DirectionalLightShadowMap { size: 2048 });
    commands.insert_resource(ClearColor(Color::srgb(0.62, 0.72, 0.84)));
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.9, 1.0),
        brightness: 400.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: DEFAULT_FOV_DEGREES.to_radians(),
            // The weapon model sits a few centimeters from the eye
            near: 0.01,
            ..default()
        }),
        Msaa::Off,
        Tonemapping::AcesFitted,
        Transform::from_xyz(0.0, 1.6, 0.0),
        // Explicit spatial + visibility components (camera is parent of the first-person weapon model).
        GlobalTransform::default(),
        Visibility::default(),
        InheritedVisibility::default(),
    ));

    commands.spawn((
        SunLight,
        DirectionalLight {
            illuminance: lux::AMBIENT_DAYLIGHT,
            shadows_enabled: true,
            color: Color::srgb(1.0, 0.97, 0.9),
            ..default()
        },
        CascadeShadowConfigBuilder {
            num_cascades: 2,
            maximum_distance: 80.0,
            first_cascade_far_bound: 10.0,
            ..default()
        }
        .build(),
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
    ));

    info!("Client rendering initialized");
}
