//! Damageable targets

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// What happens to a target when its health reaches zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathBehavior {
    /// Despawned on death
    #[default]
    Disappear,
    /// Stays in the scene, dead
    Persist,
}

/// Health component for damageable entities
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub on_death: DeathBehavior,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            on_death: DeathBehavior::default(),
        }
    }

    pub fn with_death_behavior(mut self, on_death: DeathBehavior) -> Self {
        self.on_death = on_death;
        self
    }

    /// Returns true when this hit took the target from alive to dead
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() || !amount.is_finite() {
            return false;
        }
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.is_dead()
    }

    pub fn heal(&mut self, amount: f32) {
        if self.is_dead() || !amount.is_finite() {
            return;
        }
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_reports_death_once() {
        let mut health = Health::new(50.0);
        assert!(!health.take_damage(35.0));
        assert_eq!(health.current, 15.0);
        assert!(health.take_damage(35.0));
        assert_eq!(health.current, 0.0);
        assert!(!health.take_damage(35.0));
    }

    #[test]
    fn test_heal_is_capped() {
        let mut health = Health::new(100.0);
        health.take_damage(30.0);
        health.heal(50.0);
        assert_eq!(health.current, 100.0);
        assert_eq!(health.fraction(), 1.0);
    }

    #[test]
    fn test_dead_targets_stay_dead() {
        let mut health = Health::new(10.0).with_death_behavior(DeathBehavior::Persist);
        health.take_damage(10.0);
        health.heal(5.0);
        assert!(health.is_dead());
        assert_eq!(health.on_death, DeathBehavior::Persist);
    }

    #[test]
    fn test_non_finite_damage_ignored() {
        let mut health = Health::default();
        assert!(!health.take_damage(f32::NAN));
        assert_eq!(health.current, 100.0);
    }
}
