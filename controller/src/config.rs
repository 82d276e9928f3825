//! Controller tuning and shared constants

use serde::{Deserialize, Serialize};

use crate::state::{Stance, WeaponState};

/// Base horizontal speed in m/s
pub const PLAYER_SPEED: f32 = 5.0;

/// Blend rates (1/s) toward the target horizontal velocity.
/// Air control is deliberately sluggish.
pub const GROUND_ACCELERATION: f32 = 12.0;
pub const GROUND_DECELERATION: f32 = 14.0;
pub const AIR_ACCELERATION: f32 = 2.0;
pub const AIR_DECELERATION: f32 = 0.5;

/// Stance speed multipliers
pub const CROUCH_SPEED_MULTIPLIER: f32 = 0.5;
pub const PRONE_SPEED_MULTIPLIER: f32 = 0.2;

/// Speed multiplier for any weapon state other than hipfire
pub const WEAPON_HANDLING_SPEED_MULTIPLIER: f32 = 0.5;

/// Vertical impulse applied on jump (N*s)
pub const JUMP_FORCE: f32 = 10.0;
/// Minimum time between two jumps in seconds
pub const JUMP_COOLDOWN: f32 = 0.2;
/// Horizontal velocity kept when jumping
pub const JUMP_HORIZONTAL_DAMPING: f32 = 0.5;
/// Length of the downward grounding probe, measured from the body origin
pub const GROUND_PROBE_DISTANCE: f32 = 1.2;

pub const LEAN_SPEED: f32 = 5.0;
/// Camera roll at full lean (radians)
pub const MAX_LEAN_ANGLE: f32 = 0.3;
/// Lateral camera shift at full lean (m)
pub const LEAN_DISTANCE: f32 = 0.5;

/// Reload length used when no weapon is equipped
pub const FALLBACK_RELOAD_DURATION: f32 = 2.0;

/// Eye height above the body origin per stance
pub const EYE_HEIGHT_STANDING: f32 = 0.7;
pub const EYE_HEIGHT_CROUCHING: f32 = 0.2;
pub const EYE_HEIGHT_PRONE: f32 = -0.45;
/// How fast the eye height follows a stance change (1/s)
pub const STANCE_TRANSITION_RATE: f32 = 10.0;

/// How the aim binding behaves
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AimMode {
    /// Aim while the button is held
    #[default]
    Hold,
    /// Each press flips aiming on or off
    Toggle,
}

/// Per-character tuning. Every field falls back to the constants above.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub base_speed: f32,
    pub ground_acceleration: f32,
    pub ground_deceleration: f32,
    pub air_acceleration: f32,
    pub air_deceleration: f32,
    pub crouch_multiplier: f32,
    pub prone_multiplier: f32,
    pub weapon_handling_multiplier: f32,

    pub jump_force: f32,
    pub jump_cooldown: f32,
    pub jump_horizontal_damping: f32,
    pub ground_probe_distance: f32,

    pub lean_speed: f32,
    pub max_lean_angle: f32,
    pub lean_distance: f32,

    pub eye_height_standing: f32,
    pub eye_height_crouching: f32,
    pub eye_height_prone: f32,
    pub stance_transition_rate: f32,

    pub aim_mode: AimMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_speed: PLAYER_SPEED,
            ground_acceleration: GROUND_ACCELERATION,
            ground_deceleration: GROUND_DECELERATION,
            air_acceleration: AIR_ACCELERATION,
            air_deceleration: AIR_DECELERATION,
            crouch_multiplier: CROUCH_SPEED_MULTIPLIER,
            prone_multiplier: PRONE_SPEED_MULTIPLIER,
            weapon_handling_multiplier: WEAPON_HANDLING_SPEED_MULTIPLIER,
            jump_force: JUMP_FORCE,
            jump_cooldown: JUMP_COOLDOWN,
            jump_horizontal_damping: JUMP_HORIZONTAL_DAMPING,
            ground_probe_distance: GROUND_PROBE_DISTANCE,
            lean_speed: LEAN_SPEED,
            max_lean_angle: MAX_LEAN_ANGLE,
            lean_distance: LEAN_DISTANCE,
            eye_height_standing: EYE_HEIGHT_STANDING,
            eye_height_crouching: EYE_HEIGHT_CROUCHING,
            eye_height_prone: EYE_HEIGHT_PRONE,
            stance_transition_rate: STANCE_TRANSITION_RATE,
            aim_mode: AimMode::Hold,
        }
    }
}

impl ControllerConfig {
    pub fn stance_multiplier(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Standing => 1.0,
            Stance::Crouching => self.crouch_multiplier,
            Stance::Prone => self.prone_multiplier,
        }
    }

    /// Hipfire moves at full speed; ADS, focus and reload all slow down equally.
    pub fn weapon_multiplier(&self, weapon: WeaponState) -> f32 {
        if weapon.is_hipfire() {
            1.0
        } else {
            self.weapon_handling_multiplier
        }
    }

    pub fn eye_height(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Standing => self.eye_height_standing,
            Stance::Crouching => self.eye_height_crouching,
            Stance::Prone => self.eye_height_prone,
        }
    }

    /// Target horizontal speed for a stance/weapon combination
    pub fn target_speed(&self, stance: Stance, weapon: WeaponState) -> f32 {
        self.base_speed * self.stance_multiplier(stance) * self.weapon_multiplier(weapon)
    }

    /// Parse a RON tuning file; missing fields keep their defaults
    pub fn from_ron(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|e| format!("failed to parse controller config: {e}"))
    }
}
