//! Reload timeline evaluation
//!
//! Every part pose is a pure function of reload progress. Nothing here keeps timers,
//! so skipping frames or scrubbing progress always lands on the same pose.

use std::f32::consts::PI;

use bevy::prelude::*;

use super::rig::{PartPose, PartSlot, WeaponRig};
use super::ReloadTimeline;

/// Fraction through `[start, end)`, or `None` outside the window
pub fn window_fraction(progress: f32, start: f32, end: f32) -> Option<f32> {
    if end <= start || progress < start || progress >= end {
        return None;
    }
    Some((progress - start) / (end - start))
}

/// Fraction through a window, clamped to [0, 1] on both sides
pub fn clamped_fraction(progress: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if progress >= end { 1.0 } else { 0.0 };
    }
    ((progress - start) / (end - start)).clamp(0.0, 1.0)
}

/// How far each phase has advanced
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReloadPhases {
    pub mag_drop: f32,
    pub mag_insert: f32,
    pub charge: f32,
}

impl ReloadPhases {
    pub fn at(progress: f32, timeline: &ReloadTimeline) -> Self {
        Self {
            mag_drop: clamped_fraction(progress, timeline.mag_drop_start, timeline.mag_drop_end),
            mag_insert: clamped_fraction(progress, timeline.mag_insert_start, timeline.mag_insert_end),
            charge: clamped_fraction(progress, timeline.charge_start, timeline.charge_end),
        }
    }
}

/// Magazine displacement: 0 is seated, 1 is fully dropped
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagazinePose {
    pub drop: f32,
    pub visible: bool,
}

/// Target pose for the animated parts. `None` means "at the original transform".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReloadPose {
    pub magazine: Option<MagazinePose>,
    /// Offset of the charging handle (or slide) along the charge axis
    pub charge_offset: Option<f32>,
}

impl ReloadPose {
    pub fn at(progress: f32, timeline: &ReloadTimeline) -> Self {
        Self {
            magazine: magazine_pose(progress, timeline),
            charge_offset: window_fraction(progress, timeline.charge_start, timeline.charge_end)
                .map(|fraction| timeline.charge_distance * (fraction * PI).sin()),
        }
    }

    pub fn apply(&self, rig: &mut WeaponRig, timeline: &ReloadTimeline) {
        match self.magazine {
            Some(magazine) => {
                if let Some(part) = rig.part(PartSlot::Magazine).copied() {
                    let original = part.original;
                    let (x, y, z) = original.rotation.to_euler(EulerRot::XYZ);
                    let transform = Transform {
                        translation: original.translation
                            + Vec3::new(
                                timeline.mag_drop_sideways * magazine.drop,
                                -timeline.mag_drop_distance * magazine.drop,
                                0.0,
                            ),
                        rotation: Quat::from_euler(
                            EulerRot::XYZ,
                            x + PI * timeline.mag_drop_rotation * magazine.drop,
                            y,
                            z + PI * timeline.mag_drop_twist * magazine.drop,
                        ),
                        scale: original.scale,
                    };
                    rig.set_pose(
                        PartSlot::Magazine,
                        PartPose {
                            transform,
                            visible: magazine.visible,
                        },
                    );
                }
            }
            None => rig.restore(PartSlot::Magazine),
        }

        let Some(slot) = rig.charge_slot() else {
            return;
        };
        match self.charge_offset {
            Some(offset) => {
                if let Some(part) = rig.part(slot).copied() {
                    let mut transform = part.original;
                    transform.translation += timeline.charge_axis.unit() * offset;
                    rig.set_pose(slot, PartPose::rest(transform));
                }
            }
            None => rig.restore(slot),
        }
    }
}

fn magazine_pose(progress: f32, timeline: &ReloadTimeline) -> Option<MagazinePose> {
    // Insert wins where the windows overlap
    if let Some(fraction) =
        window_fraction(progress, timeline.mag_insert_start, timeline.mag_insert_end)
    {
        return Some(MagazinePose {
            drop: 1.0 - fraction,
            visible: fraction > 0.0,
        });
    }
    if let Some(fraction) = window_fraction(progress, timeline.mag_drop_start, timeline.mag_drop_end) {
        return Some(MagazinePose {
            drop: fraction,
            visible: fraction < 0.9,
        });
    }
    // Between drop and insert the magazine is out
    if progress >= timeline.mag_drop_end && progress < timeline.mag_insert_start {
        return Some(MagazinePose {
            drop: 1.0,
            visible: false,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapons::WeaponArchetype;

    fn rifle_timeline() -> ReloadTimeline {
        WeaponArchetype::Rifle.definition().reload
    }

    #[test]
    fn test_window_fraction_is_half_open() {
        assert_eq!(window_fraction(0.2, 0.2, 0.4), Some(0.0));
        assert_eq!(window_fraction(0.4, 0.2, 0.4), None);
        assert_eq!(window_fraction(0.1, 0.2, 0.4), None);
        assert_eq!(window_fraction(0.3, 0.3, 0.3), None);
    }

    #[test]
    fn test_magazine_hidden_late_in_drop() {
        let timeline = rifle_timeline();
        let early = ReloadPose::at(0.1, &timeline).magazine.unwrap();
        assert!(early.visible);
        assert!((early.drop - 0.5).abs() < 1e-5);

        let late = ReloadPose::at(0.19, &timeline).magazine.unwrap();
        assert!(!late.visible);
    }

    #[test]
    fn test_magazine_out_between_phases() {
        let pose = ReloadPose::at(0.35, &rifle_timeline()).magazine.unwrap();
        assert_eq!(pose.drop, 1.0);
        assert!(!pose.visible);
    }

    #[test]
    fn test_insert_boundary_not_yet_visible() {
        let timeline = rifle_timeline();
        let phases = ReloadPhases::at(0.5, &timeline);
        assert!(phases.mag_drop >= 0.9);
        assert_eq!(phases.mag_insert, 0.0);

        let pose = ReloadPose::at(0.5, &timeline).magazine.unwrap();
        assert!(!pose.visible);
        assert_eq!(pose.drop, 1.0);

        let inserting = ReloadPose::at(0.625, &timeline).magazine.unwrap();
        assert!(inserting.visible);
        assert!((inserting.drop - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_seated_after_insert() {
        assert_eq!(ReloadPose::at(0.8, &rifle_timeline()).magazine, None);
    }

    #[test]
    fn test_charge_goes_out_and_back() {
        let timeline = rifle_timeline();
        let mid = (timeline.charge_start + timeline.charge_end) / 2.0;
        let offset = ReloadPose::at(mid, &timeline).charge_offset.unwrap();
        assert!((offset - timeline.charge_distance).abs() < 1e-4);

        let start = ReloadPose::at(timeline.charge_start, &timeline).charge_offset.unwrap();
        assert!(start.abs() < 1e-6);
        assert_eq!(ReloadPose::at(timeline.charge_end, &timeline).charge_offset, None);
    }

    #[test]
    fn test_apply_moves_slide_when_no_charging_handle() {
        let timeline = ReloadTimeline::default();
        let slide = Transform::from_xyz(0.0, 0.05, 0.0);
        let mut rig = WeaponRig::default();
        rig.insert(PartSlot::Slide, slide);

        let mid = (timeline.charge_start + timeline.charge_end) / 2.0;
        ReloadPose::at(mid, &timeline).apply(&mut rig, &timeline);

        let pose = rig.pose(PartSlot::Slide).unwrap();
        assert!((pose.transform.translation.z - timeline.charge_distance).abs() < 1e-4);
        assert_eq!(pose.transform.translation.y, 0.05);
    }

    #[test]
    fn test_apply_drops_magazine() {
        let timeline = rifle_timeline();
        let original = Transform::from_xyz(0.0, -0.07, 0.0);
        let mut rig = WeaponRig::default();
        rig.insert(PartSlot::Magazine, original);

        ReloadPose::at(0.35, &timeline).apply(&mut rig, &timeline);
        let pose = rig.pose(PartSlot::Magazine).unwrap();
        assert!(!pose.visible);
        assert!((pose.transform.translation.y - (-0.07 - timeline.mag_drop_distance)).abs() < 1e-5);
        assert!((pose.transform.translation.x - timeline.mag_drop_sideways).abs() < 1e-5);

        ReloadPose::at(0.95, &timeline).apply(&mut rig, &timeline);
        assert!(rig.is_at_rest());
    }
}
