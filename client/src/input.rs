//! Player input handling
//!
//! Mouse look, cursor grab, and resolving bindings into this frame's intents.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};
use controller::{BindingTable, CharacterController, DeviceButtons, Intent, VisualModeContext, WeaponArchetype};
use std::f32::consts::FRAC_PI_2;

use crate::states::GameState;

pub const MOUSE_SENSITIVITY: f32 = 0.003;

/// Client-side look state
#[derive(Resource, Default)]
pub struct InputState {
    /// Mouse-controlled yaw
    pub yaw: f32,
    /// Mouse-controlled pitch
    pub pitch: f32,
    /// Raw mouse delta this frame
    pub look_delta: Vec2,
}

impl InputState {
    /// Rotate the view, keeping pitch short of straight up or down
    pub fn add_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
    }
}

/// Intents gathered this frame, drained by the character system
#[derive(Resource, Default)]
pub struct PendingIntents(pub Vec<Intent>);

/// Weapon to equip on the next frame, by definition name
#[derive(Resource, Default)]
pub struct PendingEquip(pub Option<String>);

/// Handle mouse input for looking around
pub fn handle_mouse_input(
    mut mouse_motion: MessageReader<MouseMotion>,
    mut input_state: ResMut<InputState>,
    players: Query<&CharacterController>,
) {
    let mut delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        delta += motion.delta;
    }
    input_state.look_delta = delta;

    if delta == Vec2::ZERO {
        return;
    }

    // Reduce sensitivity when aiming for more precise control
    let aiming = players.iter().any(|controller| controller.state().is_aiming());
    let sensitivity = if aiming {
        MOUSE_SENSITIVITY * 0.5
    } else {
        MOUSE_SENSITIVITY
    };
    input_state.add_rotation(-delta.x * sensitivity, -delta.y * sensitivity);
}

/// Feed mouse movement into weapon sway
pub fn feed_weapon_sway(input_state: Res<InputState>, mut players: Query<&mut CharacterController>) {
    if input_state.look_delta == Vec2::ZERO {
        return;
    }
    for mut controller in players.iter_mut() {
        controller.add_look_input(input_state.look_delta);
    }
}

/// Resolve bindings into intents for the character system
pub fn gather_intents(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    bindings: Res<BindingTable>,
    input_state: Res<InputState>,
    mut pending: ResMut<PendingIntents>,
) {
    let buttons = DeviceButtons {
        keys: &keyboard,
        mouse: &mouse,
    };
    pending.0.extend(bindings.resolve(&buttons, input_state.yaw));
}

/// F1 flips between the full and prototype weapon models
pub fn toggle_visual_mode(keyboard: Res<ButtonInput<KeyCode>>, mut modes: ResMut<VisualModeContext>) {
    if keyboard.just_pressed(KeyCode::F1) {
        let mode = modes.toggle();
        info!("Visual mode: {mode:?}");
    }
}

/// Number keys pick a weapon
pub fn handle_weapon_switch(keyboard: Res<ButtonInput<KeyCode>>, mut pending: ResMut<PendingEquip>) {
    let archetype = if keyboard.just_pressed(KeyCode::Digit1) {
        Some(WeaponArchetype::Rifle)
    } else if keyboard.just_pressed(KeyCode::Digit2) {
        Some(WeaponArchetype::Pistol)
    } else {
        None
    };

    if let Some(archetype) = archetype {
        pending.0 = Some(archetype.name().to_string());
    }
}

/// Escape releases the cursor and pauses; clicking back in resumes
pub fn handle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    game_state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
    mut pending: ResMut<PendingIntents>,
    mut virtual_time: ResMut<Time<Virtual>>,
) {
    let playing = match game_state.get() {
        GameState::Playing if keyboard.just_pressed(KeyCode::Escape) => false,
        GameState::Paused if mouse.just_pressed(MouseButton::Left) => true,
        _ => return,
    };

    if let Ok(window_entity) = windows.single() {
        if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
            if playing {
                cursor.grab_mode = CursorGrabMode::Locked;
                cursor.visible = false;
            } else {
                cursor.grab_mode = CursorGrabMode::None;
                cursor.visible = true;
            }
        }
    }

    // Freezes the physics step and every controller timer
    if playing {
        virtual_time.unpause();
    } else {
        virtual_time.pause();
    }
    pending.0.clear();
    next_state.set(if playing {
        GameState::Playing
    } else {
        GameState::Paused
    });
    info!("{}", if playing { "Resumed" } else { "Paused" });
}

/// Lock the cursor when gameplay starts
pub fn grab_cursor(windows: Query<Entity, With<PrimaryWindow>>, mut cursor_opts: Query<&mut CursorOptions>) {
    let Ok(window_entity) = windows.single() else {
        return;
    };
    if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    }
}
