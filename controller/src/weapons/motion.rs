//! Procedural view-model motion: footstep bob and look sway

use bevy::prelude::*;

use crate::smoothing::{blend_factor, guarded_lerp_vec3};

/// Bob phase speed in rad/s while moving fast
pub const BOB_FREQUENCY: f32 = 20.0;
/// Below this speed (m/s) the bob runs at half frequency
pub const BOB_SPEED_THRESHOLD: f32 = 4.0;
pub const BOB_IDLE_FREQUENCY_DIVIDER: f32 = 2.0;
/// Bob offset per m/s of speed, divided by ten
pub const BOB_AMOUNT: f32 = 0.05;
/// Rate the model follows its bob target (1/s)
pub const BOB_BLEND_RATE: f32 = 5.0;

/// Mouse delta to sway input scale
pub const SWAY_INPUT_SCALE: f32 = 0.01;
/// Per-tick decay of the sway input at 60 Hz
pub const SWAY_DECAY: f32 = 0.9;
/// Model shift at full sway (m)
pub const SWAY_POSITION: f32 = 0.02;
/// Model rotation at full sway (radians)
pub const SWAY_ROTATION: f32 = 0.06;
pub const SWAY_BLEND_RATE: f32 = 6.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewMotion {
    /// Resting local position of the active model
    base: Vec3,
    bob_phase: f32,
    /// Current model offset including bob and sway
    position: Vec3,
    sway_input: Vec2,
    sway_rotation: Quat,
}

impl ViewMotion {
    pub fn new(base: Vec3) -> Self {
        Self {
            base,
            bob_phase: 0.0,
            position: base,
            sway_input: Vec2::ZERO,
            sway_rotation: Quat::IDENTITY,
        }
    }

    /// Switch to a different model's rest position
    pub fn rebase(&mut self, base: Vec3) {
        self.base = base;
        self.position = base;
    }

    pub fn base(&self) -> Vec3 {
        self.base
    }

    pub fn sway_input(&self) -> Vec2 {
        self.sway_input
    }

    /// Accumulate a mouse-look delta into the clamped sway input
    pub fn add_look_input(&mut self, delta: Vec2) {
        if !delta.is_finite() {
            return;
        }
        self.sway_input = (self.sway_input + delta * SWAY_INPUT_SCALE).clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Advance bob and sway. `speed` is the horizontal speed in m/s.
    pub fn update(&mut self, dt: f32, speed: f32) {
        let speed = if speed.is_finite() {
            speed
        } else {
            warn!("Weapon bob received non-finite speed; treating as still");
            0.0
        };

        let mut frequency = BOB_FREQUENCY;
        if speed < BOB_SPEED_THRESHOLD {
            frequency /= BOB_IDLE_FREQUENCY_DIVIDER;
        }
        self.bob_phase = (self.bob_phase + dt * frequency) % std::f32::consts::TAU;

        let amplitude = BOB_AMOUNT * speed / 10.0;
        let bob = Vec3::new(
            (self.bob_phase * 0.5).sin() * amplitude,
            self.bob_phase.sin() * amplitude,
            0.0,
        );
        let sway = Vec3::new(-self.sway_input.x, self.sway_input.y, 0.0) * SWAY_POSITION;

        let target = self.base + bob + sway;
        self.position = guarded_lerp_vec3(self.position, target, blend_factor(BOB_BLEND_RATE, dt));

        let target_rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.sway_input.x * SWAY_ROTATION,
            self.sway_input.y * SWAY_ROTATION,
            0.0,
        );
        self.sway_rotation = self
            .sway_rotation
            .slerp(target_rotation, blend_factor(SWAY_BLEND_RATE, dt));

        self.sway_input *= SWAY_DECAY.powf(dt * 60.0);
    }

    /// Local transform of the active model
    pub fn model_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.sway_rotation)
    }
}
