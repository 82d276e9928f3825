//! Horizontal movement
//!
//! Blends the body's horizontal velocity toward `direction * speed` exponentially.
//! Vertical velocity belongs to gravity and jumping and is never touched here.

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::physics::CharacterBody;
use crate::smoothing::blend_factor;
use crate::state::{MovementState, PlayerState};

pub struct MovementController {
    config: ControllerConfig,
    /// This tick's desired direction, unit length or zero
    intent: Vec3,
    /// Horizontal velocity written on the last update
    horizontal_velocity: Vec3,
}

impl MovementController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            config: config.clone(),
            intent: Vec3::ZERO,
            horizontal_velocity: Vec3::ZERO,
        }
    }

    /// Store a world-space direction (already rotated by camera yaw) for this tick
    pub fn handle_move(&mut self, direction: Vec3) {
        self.intent = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
    }

    pub fn intent(&self) -> Vec3 {
        self.intent
    }

    pub fn horizontal_velocity(&self) -> Vec3 {
        self.horizontal_velocity
    }

    pub fn update(&mut self, dt: f32, state: &mut PlayerState, body: Option<&mut (dyn CharacterBody + '_)>) {
        let has_intent = self.intent != Vec3::ZERO;
        state.movement = if has_intent {
            MovementState::Moving
        } else {
            MovementState::Idle
        };

        if let Some(body) = body {
            let velocity = body.linvel();
            let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
            let grounded = state.is_grounded();

            let (target, rate) = if has_intent {
                let speed = self.config.target_speed(state.stance, state.weapon);
                let rate = if grounded {
                    self.config.ground_acceleration
                } else {
                    self.config.air_acceleration
                };
                (self.intent * speed, rate)
            } else {
                let rate = if grounded {
                    self.config.ground_deceleration
                } else {
                    self.config.air_deceleration
                };
                (Vec3::ZERO, rate)
            };

            let blended = horizontal + (target - horizontal) * blend_factor(rate, dt);
            if blended.is_finite() {
                body.set_linvel(Vec3::new(blended.x, velocity.y, blended.z));
                self.horizontal_velocity = blended;
            } else {
                warn!("Movement produced non-finite velocity {blended:?}; keeping {horizontal:?}");
                self.horizontal_velocity = horizontal;
            }
        }

        self.intent = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PLAYER_SPEED;
    use crate::state::{GroundingState, Stance, WeaponState};
    use crate::test_support::MockBody;

    fn controller() -> MovementController {
        MovementController::new(&ControllerConfig::default())
    }

    #[test]
    fn test_moving_only_with_intent() {
        let mut movement = controller();
        let mut state = PlayerState::default();
        let mut body = MockBody::grounded();

        movement.handle_move(Vec3::NEG_Z);
        movement.update(0.016, &mut state, Some(&mut body));
        assert_eq!(state.movement, MovementState::Moving);

        // Intent is consumed; next tick without input goes idle
        movement.update(0.016, &mut state, Some(&mut body));
        assert_eq!(state.movement, MovementState::Idle);
        assert_eq!(movement.intent(), Vec3::ZERO);
    }

    #[test]
    fn test_intent_is_flattened_and_normalized() {
        let mut movement = controller();
        movement.handle_move(Vec3::new(3.0, 5.0, 4.0));
        let intent = movement.intent();
        assert_eq!(intent.y, 0.0);
        assert!((intent.length() - 1.0).abs() < 1e-5);

        movement.handle_move(Vec3::new(f32::NAN, 0.0, 1.0));
        assert_eq!(movement.intent(), Vec3::ZERO);
    }

    #[test]
    fn test_converges_to_target_speed() {
        let mut movement = controller();
        let mut state = PlayerState::default();
        let mut body = MockBody::grounded();

        for _ in 0..200 {
            movement.handle_move(Vec3::X);
            movement.update(0.016, &mut state, Some(&mut body));
        }
        assert!((body.velocity.x - PLAYER_SPEED).abs() < 0.01);
    }

    #[test]
    fn test_never_overshoots_target() {
        let mut movement = controller();
        let mut state = PlayerState::default();
        let mut body = MockBody::grounded();

        let mut last = 0.0;
        for _ in 0..100 {
            movement.handle_move(Vec3::X);
            movement.update(0.05, &mut state, Some(&mut body));
            assert!(body.velocity.x >= last);
            assert!(body.velocity.x <= PLAYER_SPEED + 1e-4);
            last = body.velocity.x;
        }
    }

    #[test]
    fn test_crouch_and_aim_slow_down() {
        let mut movement = controller();
        let mut state = PlayerState {
            stance: Stance::Crouching,
            weapon: WeaponState::Ads,
            ..default()
        };
        let mut body = MockBody::grounded();

        for _ in 0..300 {
            movement.handle_move(Vec3::Z);
            movement.update(0.016, &mut state, Some(&mut body));
        }
        assert!((body.velocity.z - PLAYER_SPEED * 0.5 * 0.5).abs() < 0.01);
    }

    #[test]
    fn test_air_control_is_sluggish() {
        let mut ground = controller();
        let mut air = controller();
        let mut ground_state = PlayerState::default();
        let mut air_state = PlayerState {
            grounding: GroundingState::Airborne,
            ..default()
        };
        let mut ground_body = MockBody::grounded();
        let mut air_body = MockBody::airborne();

        ground.handle_move(Vec3::X);
        ground.update(0.1, &mut ground_state, Some(&mut ground_body));
        air.handle_move(Vec3::X);
        air.update(0.1, &mut air_state, Some(&mut air_body));

        assert!(air_body.velocity.x < ground_body.velocity.x);
    }

    #[test]
    fn test_vertical_velocity_untouched() {
        let mut movement = controller();
        let mut state = PlayerState::default();
        let mut body = MockBody::grounded();
        body.velocity = Vec3::new(2.0, -3.5, 0.0);

        movement.update(0.016, &mut state, Some(&mut body));
        assert_eq!(body.velocity.y, -3.5);
        assert!(body.velocity.x < 2.0);
    }

    #[test]
    fn test_update_without_body_still_tracks_state() {
        let mut movement = controller();
        let mut state = PlayerState::default();
        movement.handle_move(Vec3::X);
        movement.update(0.016, &mut state, None);
        assert_eq!(state.movement, MovementState::Moving);
        assert_eq!(movement.intent(), Vec3::ZERO);
    }
}
