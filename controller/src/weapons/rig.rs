//! Typed table of animated weapon parts
//!
//! Built once when the weapon model is loaded. Each slot either holds the part's
//! original local transform plus its current pose, or nothing; animating an empty
//! slot does nothing.

use bevy::prelude::*;

use super::PartBindings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartSlot {
    Magazine,
    ChargingHandle,
    Slide,
    Sight,
}

impl PartSlot {
    pub const ALL: [Self; 4] = [Self::Magazine, Self::ChargingHandle, Self::Slide, Self::Sight];

    fn index(self) -> usize {
        self as usize
    }
}

/// Local transform and visibility of one part
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartPose {
    pub transform: Transform,
    pub visible: bool,
}

impl PartPose {
    pub fn rest(transform: Transform) -> Self {
        Self {
            transform,
            visible: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigPart {
    /// Local transform captured at load time
    pub original: Transform,
    pub pose: PartPose,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeaponRig {
    /// Model root relative to the weapon group
    model_root: Transform,
    parts: [Option<RigPart>; PartSlot::ALL.len()],
}

impl WeaponRig {
    /// Bind scene nodes by name. `nodes` are (name, local transform under the model root).
    pub fn from_named_parts<'a>(
        bindings: &PartBindings,
        model_root: Transform,
        nodes: impl IntoIterator<Item = (&'a str, Transform)>,
    ) -> Self {
        let mut rig = Self {
            model_root,
            parts: [None; PartSlot::ALL.len()],
        };

        for (name, transform) in nodes {
            for slot in PartSlot::ALL {
                if bindings.name(slot) == Some(name) {
                    debug!("Bound {slot:?} to '{name}'");
                    rig.insert(slot, transform);
                }
            }
        }

        for slot in PartSlot::ALL {
            if let Some(name) = bindings.name(slot) {
                if !rig.has(slot) {
                    warn!("Weapon part '{name}' ({slot:?}) not found in model");
                }
            }
        }

        rig
    }

    pub fn insert(&mut self, slot: PartSlot, original: Transform) {
        self.parts[slot.index()] = Some(RigPart {
            original,
            pose: PartPose::rest(original),
        });
    }

    pub fn model_root(&self) -> Transform {
        self.model_root
    }

    pub fn has(&self, slot: PartSlot) -> bool {
        self.parts[slot.index()].is_some()
    }

    pub fn part(&self, slot: PartSlot) -> Option<&RigPart> {
        self.parts[slot.index()].as_ref()
    }

    pub fn pose(&self, slot: PartSlot) -> Option<PartPose> {
        self.part(slot).map(|part| part.pose)
    }

    pub fn set_pose(&mut self, slot: PartSlot, pose: PartPose) {
        if let Some(part) = self.parts[slot.index()].as_mut() {
            part.pose = pose;
        }
    }

    /// Put one part back to its original transform, visible
    pub fn restore(&mut self, slot: PartSlot) {
        if let Some(part) = self.parts[slot.index()].as_mut() {
            part.pose = PartPose::rest(part.original);
        }
    }

    pub fn restore_all(&mut self) {
        for slot in PartSlot::ALL {
            self.restore(slot);
        }
    }

    pub fn is_at_rest(&self) -> bool {
        self.parts
            .iter()
            .flatten()
            .all(|part| part.pose == PartPose::rest(part.original))
    }

    /// Handle moved during the charge phase: charging handle, else slide
    pub fn charge_slot(&self) -> Option<PartSlot> {
        [PartSlot::ChargingHandle, PartSlot::Slide]
            .into_iter()
            .find(|slot| self.has(*slot))
    }

    /// Sight position in weapon-group space
    pub fn sight_in_group_space(&self) -> Option<Vec3> {
        self.part(PartSlot::Sight)
            .map(|sight| self.model_root.transform_point(sight.original.translation))
    }
}
