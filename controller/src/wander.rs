//! Wandering NPC behaviour
//!
//! Picks a random point around home, walks to it, and picks a new one once it
//! arrives or the interval runs out. Only the horizontal velocity is steered;
//! gravity keeps the vertical part.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::smoothing::guarded_lerp_vec3;

#[derive(Clone, Debug, PartialEq)]
pub struct WanderConfig {
    /// Walking speed (m/s)
    pub speed: f32,
    /// Seconds before a new target is picked even if the old one was not reached
    pub interval: f32,
    /// Targets lie within this many meters of home on each horizontal axis
    pub range: f32,
    /// Horizontal distance that counts as arrived
    pub reach_distance: f32,
    /// Velocity blend rate (1/s)
    pub acceleration: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            interval: 4.0,
            range: 10.0,
            reach_distance: 1.0,
            acceleration: 5.0,
        }
    }
}

#[derive(Component, Debug)]
pub struct Wanderer {
    config: WanderConfig,
    home: Vec3,
    target: Option<Vec3>,
    timer: f32,
    rng: StdRng,
}

impl Wanderer {
    pub fn new(home: Vec3, config: WanderConfig) -> Self {
        Self {
            config,
            home,
            target: None,
            timer: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic target picks
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn home(&self) -> Vec3 {
        self.home
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    /// Velocity for this frame given where the body is and how it is moving
    pub fn update(&mut self, dt: f32, position: Vec3, velocity: Vec3) -> Vec3 {
        self.timer += dt;
        if self.target.is_none() || self.timer >= self.config.interval {
            self.timer = 0.0;
            let target = self.pick_target();
            debug!("Wandering to {target:?}");
            self.target = Some(target);
        }
        let Some(target) = self.target else {
            return velocity;
        };

        let to_target = Vec3::new(target.x - position.x, 0.0, target.z - position.z);
        if to_target.length() < self.config.reach_distance {
            // Pick again next frame
            self.timer = self.config.interval;
            return Vec3::new(0.0, velocity.y, 0.0);
        }

        let desired = to_target.normalize_or_zero() * self.config.speed;
        let current = Vec3::new(velocity.x, 0.0, velocity.z);
        let t = (self.config.acceleration * dt).clamp(0.0, 1.0);
        let horizontal = guarded_lerp_vec3(current, desired, t);
        Vec3::new(horizontal.x, velocity.y, horizontal.z)
    }

    fn pick_target(&mut self) -> Vec3 {
        let range = self.config.range.abs();
        if !(range.is_finite() && range > 0.0) {
            return self.home;
        }
        let x = self.rng.gen_range(-range..=range);
        let z = self.rng.gen_range(-range..=range);
        self.home + Vec3::new(x, 0.0, z)
    }
}

/// `count` random points on a disc of `radius` around `center`, at the center's height
pub fn spawn_candidates(rng: &mut impl Rng, center: Vec3, radius: f32, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = rng.gen_range(0.0..=radius.max(0.0));
            center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wanderer() -> Wanderer {
        Wanderer::new(Vec3::new(2.0, 1.0, -3.0), WanderConfig::default()).with_seed(11)
    }

    #[test]
    fn test_targets_stay_in_range_of_home() {
        let mut brain = wanderer();
        let range = brain.config.range;
        for _ in 0..50 {
            brain.update(brain.config.interval, Vec3::new(100.0, 1.0, 100.0), Vec3::ZERO);
            let target = brain.target().unwrap();
            let offset = target - brain.home();
            assert!(offset.x.abs() <= range && offset.z.abs() <= range);
            assert_eq!(offset.y, 0.0);
        }
    }

    #[test]
    fn test_accelerates_toward_target_and_keeps_fall_speed() {
        let mut brain = wanderer();
        let far = Vec3::new(500.0, 1.0, 500.0);
        let velocity = brain.update(0.1, far, Vec3::new(0.0, -3.0, 0.0));
        let target = brain.target().unwrap();

        assert_eq!(velocity.y, -3.0);
        let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
        let toward = Vec3::new(target.x - far.x, 0.0, target.z - far.z).normalize();
        assert!(horizontal.length() > 0.0 && horizontal.length() < brain.config.speed);
        assert!(horizontal.normalize().dot(toward) > 0.999);
    }

    #[test]
    fn test_arrival_stops_and_repicks() {
        let mut brain = wanderer();
        brain.update(0.0, Vec3::ZERO, Vec3::ZERO);
        let first = brain.target().unwrap();

        let stopped = brain.update(0.1, first, Vec3::new(4.0, -1.0, 4.0));
        assert_eq!(stopped, Vec3::new(0.0, -1.0, 0.0));

        brain.update(0.1, first, Vec3::ZERO);
        assert_ne!(brain.target(), Some(first));
    }

    #[test]
    fn test_interval_forces_new_target() {
        let mut brain = wanderer();
        let far = Vec3::new(500.0, 0.0, 500.0);
        brain.update(0.0, far, Vec3::ZERO);
        let first = brain.target();

        brain.update(1.0, far, Vec3::ZERO);
        assert_eq!(brain.target(), first);
        brain.update(3.0, far, Vec3::ZERO);
        assert_ne!(brain.target(), first);
    }

    #[test]
    fn test_spawn_candidates_lie_on_disc() {
        let mut rng = StdRng::seed_from_u64(5);
        let center = Vec3::new(0.0, 2.0, 0.0);
        let points = spawn_candidates(&mut rng, center, 15.0, 5);
        assert_eq!(points.len(), 5);
        for point in points {
            assert_eq!(point.y, 2.0);
            assert!(point.distance(center) <= 15.0 + 1e-4);
        }
    }
}
