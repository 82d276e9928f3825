//! First-person character controller and weapon handling
//!
//! Engine-facing pieces (physics body, damage/decal/ammo sinks) are traits so the
//! controllers run the same against Rapier in the client and against scripted
//! bodies in tests.

pub mod character;
pub mod config;
pub mod controllers;
pub mod health;
pub mod intent;
pub mod physics;
pub mod sinks;
pub mod state;
pub mod visual_mode;
pub mod wander;
pub mod weapons;

mod smoothing;

#[cfg(test)]
mod test_support;

pub use character::{CharacterController, CommandContext};
pub use config::{AimMode, ControllerConfig};
pub use controllers::LeanOffset;
pub use health::{DeathBehavior, Health};
pub use intent::{Action, BindingTable, ButtonSnapshot, DeviceButtons, InputSource, Intent, TriggerPolicy};
pub use physics::{AimRay, CharacterBody, HitScan, RayHit, SurfaceKind};
pub use sinks::{AmmoDisplay, DamageSink, DecalSink, WeaponSinks};
pub use state::{GroundingState, LeanState, MovementState, PlayerState, Stance, WeaponState};
pub use visual_mode::{VisualMode, VisualModeContext, VisualModeObserver};
pub use wander::{WanderConfig, Wanderer};
pub use weapons::{WeaponArchetype, WeaponDefinition, WeaponInstance, WeaponLibrary, WeaponPose, WeaponRig};
