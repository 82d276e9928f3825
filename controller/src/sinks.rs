//! Optional side-effect collaborators of a weapon
//!
//! Every sink is optional. A missing sink turns the side effect into a no-op.

use bevy::prelude::*;

use crate::physics::SurfaceKind;

/// Receives damage for entity hits
pub trait DamageSink {
    /// Returns true when the hit killed the target
    fn take_damage(&mut self, target: Entity, amount: f32) -> bool;
}

/// Places bullet-hole decals
pub trait DecalSink {
    fn add_decal(&mut self, point: Vec3, normal: Vec3, hit: Option<Entity>, surface: SurfaceKind);
}

/// Ammo readout
pub trait AmmoDisplay {
    fn update(&mut self, current: u32, max: u32, is_reloading: bool);
}

/// Bundle of borrowed sinks handed to weapon operations
#[derive(Default)]
pub struct WeaponSinks<'a> {
    pub damage: Option<&'a mut dyn DamageSink>,
    pub decals: Option<&'a mut dyn DecalSink>,
    pub ammo: Option<&'a mut dyn AmmoDisplay>,
}

impl<'a> WeaponSinks<'a> {
    pub fn with_damage(mut self, sink: &'a mut dyn DamageSink) -> Self {
        self.damage = Some(sink);
        self
    }

    pub fn with_decals(mut self, sink: &'a mut dyn DecalSink) -> Self {
        self.decals = Some(sink);
        self
    }

    pub fn with_ammo(mut self, sink: &'a mut dyn AmmoDisplay) -> Self {
        self.ammo = Some(sink);
        self
    }

    pub(crate) fn report_ammo(&mut self, current: u32, max: u32, is_reloading: bool) {
        if let Some(ammo) = self.ammo.as_deref_mut() {
            ammo.update(current, max, is_reloading);
        }
    }
}
