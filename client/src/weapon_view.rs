//! First-person weapon view and HUD
//!
//! Builds the procedural weapon models under the camera, binds their named parts
//! into a [`WeaponRig`] and mirrors the weapon's pose onto them every frame.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;
use controller::weapons::{PartSlot, HIPFIRE_OFFSET, PROTOTYPE_MODEL_OFFSET};
use controller::{
    AmmoDisplay, CharacterController, VisualMode, VisualModeContext, WeaponArchetype, WeaponDefinition, WeaponRig,
    WeaponSinks,
};

use crate::systems::Player;

// =============================================================================
// COMPONENTS
// =============================================================================

/// Weapon group entity, child of the camera
#[derive(Component)]
pub struct FirstPersonWeapon;

/// Entities making up one spawned weapon view
#[derive(Component, Debug)]
pub struct WeaponView {
    pub full: Entity,
    pub prototype: Entity,
    /// Rig slots and the scene node each one drives
    pub parts: Vec<(PartSlot, Entity)>,
}

#[derive(Component)]
pub struct WeaponHUD;

#[derive(Component, Clone, Copy, PartialEq, Eq)]
pub enum HudText {
    WeaponName,
    Ammo,
    Status,
}

/// Last ammo state reported by the equipped weapon
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct AmmoReadout {
    pub current: u32,
    pub max: u32,
    pub reloading: bool,
}

impl AmmoReadout {
    pub fn label(&self) -> String {
        if self.reloading {
            format!("{} / {}  RELOADING", self.current, self.max)
        } else {
            format!("{} / {}", self.current, self.max)
        }
    }
}

impl AmmoDisplay for AmmoReadout {
    fn update(&mut self, current: u32, max: u32, is_reloading: bool) {
        *self = Self {
            current,
            max,
            reloading: is_reloading,
        };
    }
}

// =============================================================================
// MODEL CONSTRUCTION
// =============================================================================

/// One named mesh node of a procedural model
struct ModelNode {
    name: &'static str,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
    transform: Transform,
}

struct Palette {
    metal: Handle<StandardMaterial>,
    grip: Handle<StandardMaterial>,
    accent: Handle<StandardMaterial>,
}

impl Palette {
    fn new(materials: &mut Assets<StandardMaterial>) -> Self {
        Self {
            metal: materials.add(StandardMaterial {
                base_color: Color::srgb(0.15, 0.15, 0.18),
                metallic: 0.9,
                perceptual_roughness: 0.3,
                ..default()
            }),
            grip: materials.add(StandardMaterial {
                base_color: Color::srgb(0.08, 0.06, 0.04),
                metallic: 0.1,
                perceptual_roughness: 0.8,
                ..default()
            }),
            accent: materials.add(StandardMaterial {
                base_color: Color::srgb(0.6, 0.55, 0.4),
                metallic: 0.7,
                perceptual_roughness: 0.4,
                ..default()
            }),
        }
    }
}

fn rifle_nodes(meshes: &mut Assets<Mesh>, palette: &Palette) -> Vec<ModelNode> {
    let barrel_rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
    vec![
        ModelNode {
            name: "rifle_receiver",
            mesh: meshes.add(Cuboid::new(0.04, 0.06, 0.35)),
            material: palette.metal.clone(),
            transform: Transform::IDENTITY,
        },
        ModelNode {
            name: "rifle_barrel",
            mesh: meshes.add(Cylinder::new(0.012, 0.15)),
            material: palette.metal.clone(),
            transform: Transform::from_xyz(0.0, 0.0, -0.25).with_rotation(barrel_rotation),
        },
        ModelNode {
            name: "rifle_magazine",
            mesh: meshes.add(Cuboid::new(0.02, 0.08, 0.025)),
            material: palette.accent.clone(),
            transform: Transform::from_xyz(0.0, -0.07, -0.02).with_rotation(Quat::from_rotation_x(-0.15)),
        },
        ModelNode {
            name: "rifle_stock",
            mesh: meshes.add(Cuboid::new(0.03, 0.05, 0.12)),
            material: palette.grip.clone(),
            transform: Transform::from_xyz(0.0, -0.01, 0.22),
        },
        ModelNode {
            name: "rifle_grip",
            mesh: meshes.add(Cuboid::new(0.025, 0.06, 0.03)),
            material: palette.grip.clone(),
            transform: Transform::from_xyz(0.0, -0.05, 0.08).with_rotation(Quat::from_rotation_x(-0.25)),
        },
        ModelNode {
            name: "rifle_charging_handle",
            mesh: meshes.add(Cuboid::new(0.02, 0.012, 0.012)),
            material: palette.metal.clone(),
            transform: Transform::from_xyz(0.03, 0.015, -0.05),
        },
        ModelNode {
            name: "rifle_rear_sight",
            mesh: meshes.add(Cuboid::new(0.015, 0.025, 0.02)),
            material: palette.metal.clone(),
            transform: Transform::from_xyz(0.0, 0.045, 0.08),
        },
        ModelNode {
            name: "rifle_front_sight",
            mesh: meshes.add(Cuboid::new(0.006, 0.03, 0.006)),
            material: palette.metal.clone(),
            transform: Transform::from_xyz(0.0, 0.04, -0.16),
        },
    ]
}

fn pistol_nodes(meshes: &mut Assets<Mesh>, palette: &Palette) -> Vec<ModelNode> {
    vec![
        ModelNode {
            name: "pistol_frame",
            mesh: meshes.add(Cuboid::new(0.03, 0.03, 0.14)),
            material: palette.metal.clone(),
            transform: Transform::IDENTITY,
        },
        ModelNode {
            name: "pistol_slide",
            mesh: meshes.add(Cuboid::new(0.028, 0.03, 0.16)),
            material: palette.metal.clone(),
            transform: Transform::from_xyz(0.0, 0.03, -0.01),
        },
        ModelNode {
            name: "pistol_grip",
            mesh: meshes.add(Cuboid::new(0.025, 0.08, 0.03)),
            material: palette.grip.clone(),
            transform: Transform::from_xyz(0.0, -0.05, 0.04).with_rotation(Quat::from_rotation_x(-0.2)),
        },
        ModelNode {
            name: "pistol_magazine",
            mesh: meshes.add(Cuboid::new(0.02, 0.07, 0.022)),
            material: palette.accent.clone(),
            transform: Transform::from_xyz(0.0, -0.06, 0.04).with_rotation(Quat::from_rotation_x(-0.2)),
        },
        ModelNode {
            name: "pistol_rear_sight",
            mesh: meshes.add(Cuboid::new(0.02, 0.01, 0.008)),
            material: palette.metal.clone(),
            transform: Transform::from_xyz(0.0, 0.05, 0.06),
        },
    ]
}

/// Build the model matching `definition` under `camera` and return its rig
pub fn spawn_weapon_model(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    definition: &WeaponDefinition,
    camera: Entity,
) -> WeaponRig {
    let palette = Palette::new(materials);
    let archetype = WeaponArchetype::ALL
        .into_iter()
        .find(|archetype| archetype.name() == definition.name)
        .unwrap_or(WeaponArchetype::Rifle);
    let nodes = match archetype {
        WeaponArchetype::Rifle => rifle_nodes(meshes, &palette),
        WeaponArchetype::Pistol => pistol_nodes(meshes, &palette),
    };
    let model_root = Transform::IDENTITY;

    let full = commands
        .spawn((
            Name::new("full_model"),
            model_root,
            GlobalTransform::default(),
            Visibility::Inherited,
            InheritedVisibility::default(),
        ))
        .id();

    let mut parts = Vec::new();
    for node in &nodes {
        let entity = commands
            .spawn((
                Name::new(node.name),
                Mesh3d(node.mesh.clone()),
                MeshMaterial3d(node.material.clone()),
                node.transform,
            ))
            .id();
        commands.entity(full).add_child(entity);
        for slot in PartSlot::ALL {
            if definition.parts.name(slot) == Some(node.name) {
                parts.push((slot, entity));
            }
        }
    }

    let prototype = commands
        .spawn((
            Name::new("prototype_model"),
            Mesh3d(meshes.add(Cuboid::new(0.05, 0.08, 0.3))),
            MeshMaterial3d(palette.accent.clone()),
            Transform::from_translation(PROTOTYPE_MODEL_OFFSET),
            Visibility::Hidden,
        ))
        .id();

    let group = commands
        .spawn((
            FirstPersonWeapon,
            Transform::from_translation(HIPFIRE_OFFSET),
            // Explicit GlobalTransform avoids B0004 warnings when children are spawned immediately.
            GlobalTransform::default(),
            Visibility::Inherited,
            InheritedVisibility::default(),
            WeaponView {
                full,
                prototype,
                parts,
            },
        ))
        .id();
    commands.entity(group).add_children(&[full, prototype]);
    commands.entity(camera).add_child(group);

    info!("Spawned {} view model ({} nodes)", definition.name, nodes.len());
    WeaponRig::from_named_parts(
        &definition.parts,
        model_root,
        nodes.iter().map(|node| (node.name, node.transform)),
    )
}

// =============================================================================
// PER-FRAME
// =============================================================================

/// Advance the equipped weapon and mirror its pose onto the view entities
pub fn animate_weapon(
    time: Res<Time>,
    mut players: Query<(&mut CharacterController, &Velocity), With<Player>>,
    mut views: Query<(&WeaponView, &mut Transform), With<FirstPersonWeapon>>,
    mut nodes: Query<(&mut Transform, &mut Visibility), Without<FirstPersonWeapon>>,
    mut ammo: ResMut<AmmoReadout>,
) {
    let Ok((mut controller, velocity)) = players.single_mut() else {
        return;
    };
    let mut sinks = WeaponSinks::default().with_ammo(&mut *ammo);
    controller.update_weapon(time.delta_secs(), velocity.linvel, &mut sinks);

    let Some(weapon) = controller.weapon() else {
        return;
    };
    let pose = weapon.pose();

    for (view, mut group) in views.iter_mut() {
        *group = pose.group;

        let (active, inactive) = match pose.mode {
            VisualMode::Full => (view.full, view.prototype),
            VisualMode::Prototype => (view.prototype, view.full),
        };
        if let Ok((mut transform, mut visibility)) = nodes.get_mut(active) {
            *transform = pose.model;
            *visibility = Visibility::Inherited;
        }
        if let Ok((_, mut visibility)) = nodes.get_mut(inactive) {
            *visibility = Visibility::Hidden;
        }

        for (slot, entity) in &view.parts {
            let Some(part) = weapon.rig().pose(*slot) else {
                continue;
            };
            if let Ok((mut transform, mut visibility)) = nodes.get_mut(*entity) {
                *transform = part.transform;
                *visibility = if part.visible {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }
}

// =============================================================================
// HUD
// =============================================================================

pub fn spawn_weapon_hud(mut commands: Commands) {
    commands
        .spawn((
            WeaponHUD,
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(20.0),
                bottom: Val::Px(20.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::End,
                row_gap: Val::Px(5.0),
                ..default()
            },
            Pickable::IGNORE,
        ))
        .with_children(|parent| {
            parent.spawn((
                HudText::WeaponName,
                Text::new(""),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.9)),
            ));
            parent.spawn((
                HudText::Ammo,
                Text::new(""),
                TextFont {
                    font_size: 32.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 0.9, 0.6, 1.0)),
            ));
            parent.spawn((
                HudText::Status,
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgba(0.8, 0.8, 0.8, 0.8)),
            ));
            parent.spawn((
                Text::new("[1] AK-47  [2] Pistol  [R] Reload  [F1] Model  [Esc] Pause"),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(Color::srgba(0.7, 0.7, 0.7, 0.6)),
            ));
        });
}

pub fn update_weapon_hud(
    players: Query<&CharacterController, With<Player>>,
    ammo: Res<AmmoReadout>,
    modes: Res<VisualModeContext>,
    mut texts: Query<(&HudText, &mut Text)>,
) {
    let Ok(controller) = players.single() else {
        return;
    };
    let state = controller.state();

    for (kind, mut text) in texts.iter_mut() {
        **text = match kind {
            HudText::WeaponName => controller
                .weapon()
                .map(|weapon| weapon.definition().name.clone())
                .unwrap_or_else(|| "Unarmed".to_string()),
            HudText::Ammo if controller.weapon().is_some() => ammo.label(),
            HudText::Ammo => String::new(),
            HudText::Status => format!(
                "{:?} | {:?} | {:?} | {:?}",
                state.stance,
                state.weapon,
                state.lean,
                modes.mode()
            ),
        };
    }
}
