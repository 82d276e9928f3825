//! Peeking left and right

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::smoothing::blend_factor;
use crate::state::{LeanState, PlayerState};

/// Camera adjustment derived from the current lean
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LeanOffset {
    /// Sideways shift in camera space (negative is left)
    pub lateral: f32,
    /// Roll in radians, same sign as `lateral`
    pub roll: f32,
}

pub struct LeanController {
    speed: f32,
    max_angle: f32,
    distance: f32,
    /// Continuous lean in [-1, 1]
    amount: f32,
}

impl LeanController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            speed: config.lean_speed,
            max_angle: config.max_lean_angle,
            distance: config.lean_distance,
            amount: 0.0,
        }
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    pub fn handle_lean_left(&self, state: &mut PlayerState) {
        state.lean = match state.lean {
            LeanState::Left => LeanState::None,
            _ => LeanState::Left,
        };
        debug!("Lean: {:?}", state.lean);
    }

    pub fn handle_lean_right(&self, state: &mut PlayerState) {
        state.lean = match state.lean {
            LeanState::Right => LeanState::None,
            _ => LeanState::Right,
        };
        debug!("Lean: {:?}", state.lean);
    }

    pub fn update(&mut self, dt: f32, state: &PlayerState) {
        let target = state.lean.target();
        self.amount += (target - self.amount) * blend_factor(self.speed, dt);
        self.amount = self.amount.clamp(-1.0, 1.0);
    }

    pub fn camera_offset(&self) -> LeanOffset {
        LeanOffset {
            lateral: self.amount * self.distance,
            roll: self.amount * self.max_angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_side_twice_returns_to_none() {
        let lean = LeanController::new(&ControllerConfig::default());
        let mut state = PlayerState::default();

        lean.handle_lean_left(&mut state);
        assert_eq!(state.lean, LeanState::Left);
        lean.handle_lean_left(&mut state);
        assert_eq!(state.lean, LeanState::None);
    }

    #[test]
    fn test_opposite_side_switches_directly() {
        let lean = LeanController::new(&ControllerConfig::default());
        let mut state = PlayerState::default();

        lean.handle_lean_left(&mut state);
        lean.handle_lean_right(&mut state);
        assert_eq!(state.lean, LeanState::Right);
        lean.handle_lean_left(&mut state);
        assert_eq!(state.lean, LeanState::Left);
    }

    #[test]
    fn test_amount_approaches_target_within_bounds() {
        let mut lean = LeanController::new(&ControllerConfig::default());
        let state = PlayerState {
            lean: LeanState::Right,
            ..default()
        };

        let mut last = 0.0;
        for _ in 0..120 {
            lean.update(0.016, &state);
            assert!(lean.amount() >= last);
            assert!(lean.amount() <= 1.0);
            last = lean.amount();
        }
        assert!(lean.amount() > 0.99);
    }

    #[test]
    fn test_camera_offset_scales_with_amount() {
        let config = ControllerConfig::default();
        let mut lean = LeanController::new(&config);
        let state = PlayerState {
            lean: LeanState::Left,
            ..default()
        };
        // Large step lands on the target
        lean.update(100.0, &state);

        let offset = lean.camera_offset();
        assert!((offset.lateral + config.lean_distance).abs() < 1e-5);
        assert!((offset.roll + config.max_lean_angle).abs() < 1e-5);
    }

    #[test]
    fn test_centered_offset_is_zero() {
        let lean = LeanController::new(&ControllerConfig::default());
        assert_eq!(lean.camera_offset(), LeanOffset::default());
    }
}
