//! Layered player state
//!
//! Five independent enums, one per concern. Each controller owns one slice and the
//! cross-layer rules are re-applied once per tick by [`PlayerState::enforce_invariants`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Ground contact
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroundingState {
    #[default]
    Grounded,
    Airborne,
}

/// Whether the player asked to move this tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementState {
    #[default]
    Idle,
    Moving,
}

/// Body posture
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
    Prone,
}

/// Weapon handling layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponState {
    #[default]
    Hipfire,
    /// Aiming down sights
    Ads,
    /// Steadied hipfire (held focus, not aiming)
    FocusHipfire,
    /// Reload in progress; blocks every other weapon transition
    Reload,
}

/// Lean direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeanState {
    #[default]
    None,
    Left,
    Right,
}

impl GroundingState {
    pub const ALL: [Self; 2] = [Self::Grounded, Self::Airborne];
}

impl MovementState {
    pub const ALL: [Self; 2] = [Self::Idle, Self::Moving];
}

impl Stance {
    pub const ALL: [Self; 3] = [Self::Standing, Self::Crouching, Self::Prone];
}

impl WeaponState {
    pub const ALL: [Self; 4] = [Self::Hipfire, Self::Ads, Self::FocusHipfire, Self::Reload];

    /// True only for plain hipfire. Every other weapon state counts as handling the weapon.
    pub fn is_hipfire(&self) -> bool {
        *self == WeaponState::Hipfire
    }
}

impl LeanState {
    pub const ALL: [Self; 3] = [Self::None, Self::Left, Self::Right];

    /// Signed target for the continuous lean value (-1 left, +1 right)
    pub fn target(&self) -> f32 {
        match self {
            LeanState::None => 0.0,
            LeanState::Left => -1.0,
            LeanState::Right => 1.0,
        }
    }
}

/// Complete state of one character. Pure data; controllers mutate their own field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub grounding: GroundingState,
    pub movement: MovementState,
    pub stance: Stance,
    pub weapon: WeaponState,
    pub lean: LeanState,
}

impl PlayerState {
    pub fn is_grounded(&self) -> bool {
        self.grounding == GroundingState::Grounded
    }

    pub fn is_moving(&self) -> bool {
        self.movement == MovementState::Moving
    }

    pub fn is_reloading(&self) -> bool {
        self.weapon == WeaponState::Reload
    }

    pub fn is_aiming(&self) -> bool {
        self.weapon == WeaponState::Ads
    }

    /// Re-apply cross-layer constraints after all controllers ran.
    ///
    /// Returns true when something had to be corrected.
    pub fn enforce_invariants(&mut self) -> bool {
        if self.grounding == GroundingState::Airborne && self.stance != Stance::Standing {
            debug!("Airborne while {:?}; forcing standing", self.stance);
            self.stance = Stance::Standing;
            return true;
        }
        false
    }

    /// Every combination of the five layers, reachable or not
    pub fn all_combinations() -> impl Iterator<Item = PlayerState> {
        GroundingState::ALL.into_iter().flat_map(|grounding| {
            MovementState::ALL.into_iter().flat_map(move |movement| {
                Stance::ALL.into_iter().flat_map(move |stance| {
                    WeaponState::ALL.into_iter().flat_map(move |weapon| {
                        LeanState::ALL.into_iter().map(move |lean| PlayerState {
                            grounding,
                            movement,
                            stance,
                            weapon,
                            lean,
                        })
                    })
                })
            })
        })
    }
}
