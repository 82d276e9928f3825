//! Per-layer controllers. Each one owns a single slice of [`crate::PlayerState`].

pub mod grounding;
pub mod lean;
pub mod movement;
pub mod stance;
pub mod weapon_state;

pub use grounding::GroundingController;
pub use lean::{LeanController, LeanOffset};
pub use movement::MovementController;
pub use stance::StanceController;
pub use weapon_state::WeaponStateController;
