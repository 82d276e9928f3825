//! Ground detection and jumping
//!
//! Uses a positional probe every tick instead of contact events, so the first frame
//! after landing already reads as grounded.

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::physics::CharacterBody;
use crate::state::{GroundingState, PlayerState};

use super::StanceController;

pub struct GroundingController {
    probe_distance: f32,
    jump_force: f32,
    jump_cooldown: f32,
    horizontal_damping: f32,
    /// Seconds until the next jump is allowed
    cooldown: f32,
}

impl GroundingController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            probe_distance: config.ground_probe_distance,
            jump_force: config.jump_force,
            jump_cooldown: config.jump_cooldown,
            horizontal_damping: config.jump_horizontal_damping,
            cooldown: 0.0,
        }
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Probe for ground and tick the jump cooldown.
    /// Without a body the grounding layer is left as it is.
    pub fn update(&mut self, dt: f32, state: &mut PlayerState, body: Option<&(dyn CharacterBody + '_)>) {
        self.cooldown = (self.cooldown - dt).max(0.0);

        let Some(body) = body else {
            return;
        };

        let hit = body.cast_ray(body.translation(), Vec3::NEG_Y, self.probe_distance);
        let grounding = if hit.is_some() {
            GroundingState::Grounded
        } else {
            GroundingState::Airborne
        };

        if grounding != state.grounding {
            debug!("Grounding: {:?} -> {:?}", state.grounding, grounding);
            state.grounding = grounding;
        }
    }

    /// Jump if grounded and off cooldown. Returns whether the jump happened.
    pub fn handle_jump(&mut self, state: &mut PlayerState, body: Option<&mut (dyn CharacterBody + '_)>) -> bool {
        if !state.is_grounded() || self.cooldown > 0.0 {
            debug!(
                "Jump refused (grounding: {:?}, cooldown: {:.2})",
                state.grounding, self.cooldown
            );
            return false;
        }

        let Some(body) = body else {
            return false;
        };

        // Damp horizontal speed so jump-strafing cannot compound
        let velocity = body.linvel();
        body.set_linvel(Vec3::new(
            velocity.x * self.horizontal_damping,
            velocity.y,
            velocity.z * self.horizontal_damping,
        ));
        body.apply_impulse(Vec3::Y * self.jump_force);

        state.grounding = GroundingState::Airborne;
        StanceController::force_standing(state);
        self.cooldown = self.jump_cooldown;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Stance;
    use crate::test_support::MockBody;

    fn controller() -> GroundingController {
        GroundingController::new(&ControllerConfig::default())
    }

    #[test]
    fn test_probe_sets_grounding() {
        let mut grounding = controller();
        let mut state = PlayerState::default();

        grounding.update(0.016, &mut state, Some(&MockBody::airborne()));
        assert_eq!(state.grounding, GroundingState::Airborne);

        let body = MockBody::grounded();
        grounding.update(0.016, &mut state, Some(&body));
        assert_eq!(state.grounding, GroundingState::Grounded);

        let casts = body.casts.borrow();
        assert_eq!(casts.len(), 1);
        assert_eq!(casts[0].1, Vec3::NEG_Y);
        assert!((casts[0].2 - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_jump_halves_horizontal_velocity_then_adds_impulse() {
        let mut grounding = controller();
        let mut state = PlayerState::default();
        let mut body = MockBody::grounded();
        body.velocity = Vec3::new(4.0, 0.0, 2.0);

        assert!(grounding.handle_jump(&mut state, Some(&mut body)));

        assert_eq!(body.impulses, vec![Vec3::new(0.0, 10.0, 0.0)]);
        assert_eq!(body.velocity, Vec3::new(2.0, 10.0, 1.0));
        assert_eq!(state.grounding, GroundingState::Airborne);
    }

    #[test]
    fn test_jump_forces_standing() {
        let mut grounding = controller();
        let mut state = PlayerState {
            stance: Stance::Prone,
            ..default()
        };
        let mut body = MockBody::grounded();

        assert!(grounding.handle_jump(&mut state, Some(&mut body)));
        assert_eq!(state.stance, Stance::Standing);
    }

    #[test]
    fn test_jump_refused_while_airborne() {
        let mut grounding = controller();
        let mut state = PlayerState {
            grounding: GroundingState::Airborne,
            ..default()
        };
        let mut body = MockBody::airborne();
        body.velocity = Vec3::new(4.0, -1.0, 2.0);

        assert!(!grounding.handle_jump(&mut state, Some(&mut body)));
        assert!(body.impulses.is_empty());
        assert_eq!(body.velocity, Vec3::new(4.0, -1.0, 2.0));
        assert_eq!(state.grounding, GroundingState::Airborne);
    }

    #[test]
    fn test_jump_refused_during_cooldown() {
        let mut grounding = controller();
        let mut state = PlayerState::default();
        let mut body = MockBody::grounded();

        assert!(grounding.handle_jump(&mut state, Some(&mut body)));
        // Still touching the ground on the next probe
        grounding.update(0.1, &mut state, Some(&body));
        assert!(state.is_grounded());

        assert!(!grounding.handle_jump(&mut state, Some(&mut body)));
        assert_eq!(body.impulses.len(), 1);
        assert!(state.is_grounded());

        grounding.update(0.1, &mut state, Some(&body));
        assert_eq!(grounding.cooldown(), 0.0);
        assert!(grounding.handle_jump(&mut state, Some(&mut body)));
        assert_eq!(body.impulses.len(), 2);
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut grounding = controller();
        let mut state = PlayerState::default();
        grounding.update(5.0, &mut state, None);
        assert_eq!(grounding.cooldown(), 0.0);
    }

    #[test]
    fn test_missing_body_is_a_noop() {
        let mut grounding = controller();
        let mut state = PlayerState::default();
        assert!(!grounding.handle_jump(&mut state, None));
        assert!(state.is_grounded());
    }
}
