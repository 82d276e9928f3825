//! Hipfire / ADS / focus / reload layer
//!
//! Reload is timed here and cannot be interrupted by aiming. When the timer runs
//! out the layer always lands on hipfire.

use bevy::prelude::*;

use crate::config::FALLBACK_RELOAD_DURATION;
use crate::state::{PlayerState, WeaponState};

#[derive(Default)]
pub struct WeaponStateController {
    aim_held: bool,
    focus_held: bool,
    reload_timer: f32,
}

impl WeaponStateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_aim_held(&self) -> bool {
        self.aim_held
    }

    pub fn reload_remaining(&self) -> f32 {
        self.reload_timer
    }

    /// Refused while reloading
    pub fn handle_aim(&mut self, state: &PlayerState) -> bool {
        if state.is_reloading() {
            return false;
        }
        self.aim_held = true;
        true
    }

    pub fn handle_aim_release(&mut self) {
        self.aim_held = false;
    }

    /// Flip aiming for toggle-style bindings
    pub fn handle_toggle_aim(&mut self, state: &PlayerState) -> bool {
        if self.aim_held {
            self.handle_aim_release();
            true
        } else {
            self.handle_aim(state)
        }
    }

    pub fn handle_focus(&mut self, state: &PlayerState) -> bool {
        if state.is_reloading() {
            return false;
        }
        self.focus_held = true;
        true
    }

    pub fn handle_focus_release(&mut self) {
        self.focus_held = false;
    }

    /// Enter reload for `duration` seconds (fallback when no weapon is equipped).
    /// Returns false when a reload is already running.
    pub fn handle_reload(&mut self, state: &mut PlayerState, duration: Option<f32>) -> bool {
        if state.is_reloading() {
            return false;
        }
        self.begin_reload(state, duration.unwrap_or(FALLBACK_RELOAD_DURATION));
        true
    }

    /// Drop out of reload without waiting for the timer
    pub fn cancel_reload(&mut self, state: &mut PlayerState) {
        if state.is_reloading() {
            self.reload_timer = 0.0;
            state.weapon = WeaponState::Hipfire;
        }
    }

    fn begin_reload(&mut self, state: &mut PlayerState, duration: f32) {
        // Aim and focus must be re-issued after the reload
        self.aim_held = false;
        self.focus_held = false;
        self.reload_timer = duration.max(0.0);
        state.weapon = WeaponState::Reload;
    }

    pub fn update(&mut self, dt: f32, state: &mut PlayerState) {
        if state.is_reloading() {
            self.reload_timer -= dt;
            if self.reload_timer <= 0.0 {
                self.reload_timer = 0.0;
                state.weapon = WeaponState::Hipfire;
                debug!("Reload timer expired");
            }
            return;
        }

        state.weapon = if self.aim_held {
            WeaponState::Ads
        } else if self.focus_held {
            WeaponState::FocusHipfire
        } else {
            WeaponState::Hipfire
        };
    }
}
