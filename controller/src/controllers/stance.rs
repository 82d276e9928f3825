//! Standing / crouching / prone

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::smoothing::blend_factor;
use crate::state::{PlayerState, Stance};

pub struct StanceController {
    config: ControllerConfig,
    /// Smoothed eye height above the body origin
    eye_height: f32,
}

impl StanceController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            config: config.clone(),
            eye_height: config.eye_height(Stance::Standing),
        }
    }

    pub fn eye_height(&self) -> f32 {
        self.eye_height
    }

    /// Standing <-> crouching. Prone goes up one step to crouching.
    pub fn handle_crouch(&self, state: &mut PlayerState) -> bool {
        if !state.is_grounded() {
            return false;
        }
        let next = match state.stance {
            Stance::Standing => Stance::Crouching,
            Stance::Crouching => Stance::Standing,
            Stance::Prone => Stance::Crouching,
        };
        debug!("Stance: {:?} -> {:?}", state.stance, next);
        state.stance = next;
        true
    }

    /// Prone <-> standing, skipping crouch
    pub fn handle_prone(&self, state: &mut PlayerState) -> bool {
        if !state.is_grounded() {
            return false;
        }
        let next = match state.stance {
            Stance::Prone => Stance::Standing,
            Stance::Standing | Stance::Crouching => Stance::Prone,
        };
        debug!("Stance: {:?} -> {:?}", state.stance, next);
        state.stance = next;
        true
    }

    pub fn force_standing(state: &mut PlayerState) {
        state.stance = Stance::Standing;
    }

    pub fn update(&mut self, dt: f32, state: &mut PlayerState) {
        // Walking off a ledge never goes through handle_jump
        if !state.is_grounded() && state.stance != Stance::Standing {
            Self::force_standing(state);
        }

        let target = self.config.eye_height(state.stance);
        self.eye_height += (target - self.eye_height) * blend_factor(self.config.stance_transition_rate, dt);
    }
}
