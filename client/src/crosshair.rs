//! Crosshair UI
//!
//! Centered dot with four ticks. The ticks close in as ADS progresses and the
//! whole crosshair hides once the sights are up.

use bevy::prelude::*;
use controller::CharacterController;

use crate::systems::Player;

/// Tick distance from center at hipfire and fully aimed (px)
const HIP_OFFSET: f32 = 14.0;
const ADS_OFFSET: f32 = 6.0;
/// ADS progress above which the crosshair is hidden
const HIDE_AT_ADS: f32 = 0.9;

#[derive(Component)]
pub struct Crosshair;

#[derive(Component)]
pub struct CrosshairDot;

#[derive(Component, Clone, Copy)]
pub enum CrosshairLine {
    Top,
    Bottom,
    Left,
    Right,
}

impl CrosshairLine {
    const ALL: [Self; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    fn node(self, offset: f32) -> Node {
        let mut node = Node {
            position_type: PositionType::Absolute,
            ..default()
        };
        self.place(&mut node, offset);
        node
    }

    fn place(self, node: &mut Node, offset: f32) {
        let (thin, long) = (Val::Px(2.0), Val::Px(8.0));
        match self {
            CrosshairLine::Top => {
                (node.width, node.height) = (thin, long);
                node.top = Val::Px(-offset);
            }
            CrosshairLine::Bottom => {
                (node.width, node.height) = (thin, long);
                node.bottom = Val::Px(-offset);
            }
            CrosshairLine::Left => {
                (node.width, node.height) = (long, thin);
                node.left = Val::Px(-offset);
            }
            CrosshairLine::Right => {
                (node.width, node.height) = (long, thin);
                node.right = Val::Px(-offset);
            }
        }
    }
}

/// Tick offset for an ADS progress in [0, 1]
pub fn line_offset(ads_progress: f32) -> f32 {
    HIP_OFFSET + (ADS_OFFSET - HIP_OFFSET) * ads_progress.clamp(0.0, 1.0)
}

pub fn spawn_crosshair(mut commands: Commands) {
    commands
        .spawn((
            Crosshair,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            // Ensure it doesn't block mouse input
            Pickable::IGNORE,
        ))
        .with_children(|parent| {
            parent.spawn((
                CrosshairDot,
                Node {
                    width: Val::Px(4.0),
                    height: Val::Px(4.0),
                    ..default()
                },
                BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
                BorderRadius::all(Val::Px(2.0)),
            ));
            for line in CrosshairLine::ALL {
                parent.spawn((
                    line,
                    line.node(HIP_OFFSET),
                    BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.7)),
                ));
            }
        });
}

pub fn update_crosshair(
    players: Query<&CharacterController, With<Player>>,
    mut root: Query<&mut Visibility, With<Crosshair>>,
    mut lines: Query<(&CrosshairLine, &mut Node)>,
) {
    let ads_progress = players
        .single()
        .ok()
        .and_then(|controller| controller.weapon())
        .map_or(0.0, |weapon| weapon.ads_progress());

    for mut visibility in root.iter_mut() {
        *visibility = if ads_progress > HIDE_AT_ADS {
            Visibility::Hidden
        } else {
            Visibility::Inherited
        };
    }

    let offset = line_offset(ads_progress);
    for (line, mut node) in lines.iter_mut() {
        line.place(&mut node, offset);
    }
}
