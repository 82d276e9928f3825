//! Weapon definitions, archetypes and the runtime weapon instance
//!
//! A [`WeaponDefinition`] is immutable per-archetype data shared behind an `Arc`.
//! Every field has a default, so RON files only need to spell out what differs.

pub mod instance;
pub mod motion;
pub mod reload;
pub mod rig;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use instance::{
    ShotReport, WeaponInstance, WeaponPose, FALLBACK_ADS_OFFSET, HIPFIRE_OFFSET, MAX_SHOT_DISTANCE,
    PROTOTYPE_MODEL_OFFSET,
};
pub use motion::{ViewMotion, BOB_AMOUNT, BOB_FREQUENCY, BOB_SPEED_THRESHOLD};
pub use reload::{ReloadPhases, ReloadPose};
pub use rig::{PartPose, PartSlot, RigPart, WeaponRig};

/// Scene-node names of the animated parts. `None` means the model has no such part.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartBindings {
    pub magazine: Option<String>,
    pub charging_handle: Option<String>,
    pub slide: Option<String>,
    pub sight: Option<String>,
}

impl PartBindings {
    pub fn name(&self, slot: PartSlot) -> Option<&str> {
        match slot {
            PartSlot::Magazine => self.magazine.as_deref(),
            PartSlot::ChargingHandle => self.charging_handle.as_deref(),
            PartSlot::Slide => self.slide.as_deref(),
            PartSlot::Sight => self.sight.as_deref(),
        }
    }
}

/// Firing statistics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    /// Damage per hit
    pub damage: f32,
    /// Minimum seconds between shots
    pub fire_interval: f32,
    pub magazine_size: u32,
    /// Seconds for a full reload
    pub reload_time: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 35.0,
            fire_interval: 0.1,
            magazine_size: 30,
            reload_time: 2.0,
        }
    }
}

/// Axis the charging handle or slide travels along
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeAxis {
    X,
    Y,
    #[default]
    Z,
}

impl ChargeAxis {
    pub fn unit(&self) -> Vec3 {
        match self {
            ChargeAxis::X => Vec3::X,
            ChargeAxis::Y => Vec3::Y,
            ChargeAxis::Z => Vec3::Z,
        }
    }
}

/// Reload choreography as windows over normalized progress.
/// Windows may overlap or leave gaps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadTimeline {
    pub mag_drop_start: f32,
    pub mag_drop_end: f32,
    pub mag_insert_start: f32,
    pub mag_insert_end: f32,
    pub charge_start: f32,
    pub charge_end: f32,
    /// How far the magazine falls (m)
    pub mag_drop_distance: f32,
    pub mag_drop_sideways: f32,
    /// Pitch at full drop, in half turns
    pub mag_drop_rotation: f32,
    /// Roll at full drop, in half turns
    pub mag_drop_twist: f32,
    pub charge_distance: f32,
    pub charge_axis: ChargeAxis,
}

impl Default for ReloadTimeline {
    fn default() -> Self {
        Self {
            mag_drop_start: 0.0,
            mag_drop_end: 0.25,
            mag_insert_start: 0.4,
            mag_insert_end: 0.65,
            charge_start: 0.65,
            charge_end: 0.85,
            mag_drop_distance: 0.5,
            mag_drop_sideways: 0.0,
            mag_drop_rotation: 0.3,
            mag_drop_twist: 0.0,
            charge_distance: 0.03,
            charge_axis: ChargeAxis::Z,
        }
    }
}

/// Per-shot feedback
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireFeedback {
    /// Push-back set on every shot (m)
    pub recoil_amount: f32,
    /// Push-back recovered per second
    pub recoil_recovery_speed: f32,
    /// Camera pitch kick per shot (radians)
    pub vertical_recoil: f32,
    /// Relative spread of the pitch kick
    pub vertical_variation: f32,
    /// Camera yaw kick per shot (radians, random side)
    pub horizontal_recoil: f32,
    pub horizontal_variation: f32,
}

impl Default for FireFeedback {
    fn default() -> Self {
        Self {
            recoil_amount: 0.1,
            recoil_recovery_speed: 5.0,
            vertical_recoil: 0.02,
            vertical_variation: 0.3,
            horizontal_recoil: 0.01,
            horizontal_variation: 0.5,
        }
    }
}

/// Aim-down-sights tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsSettings {
    /// Blend rate of ADS progress (1/s)
    pub transition_speed: f32,
    /// Added to the computed sight alignment
    pub offset_adjustment: Vec3,
    pub hipfire_fov_degrees: f32,
    pub ads_fov_degrees: f32,
}

impl Default for AdsSettings {
    fn default() -> Self {
        Self {
            transition_speed: 10.0,
            offset_adjustment: Vec3::new(0.0, 0.0, -0.15),
            hipfire_fov_degrees: 70.0,
            ads_fov_degrees: 45.0,
        }
    }
}

/// Complete immutable description of one weapon archetype
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponDefinition {
    pub name: String,
    pub parts: PartBindings,
    pub stats: WeaponStats,
    pub reload: ReloadTimeline,
    pub fire: FireFeedback,
    pub ads: AdsSettings,
}

impl Default for WeaponDefinition {
    fn default() -> Self {
        Self {
            name: "Unnamed".to_string(),
            parts: PartBindings::default(),
            stats: WeaponStats::default(),
            reload: ReloadTimeline::default(),
            fire: FireFeedback::default(),
            ads: AdsSettings::default(),
        }
    }
}

impl WeaponDefinition {
    pub fn validate(&self) -> Result<(), String> {
        let r = &self.reload;
        let windows = [
            ("mag drop", r.mag_drop_start, r.mag_drop_end),
            ("mag insert", r.mag_insert_start, r.mag_insert_end),
            ("charge", r.charge_start, r.charge_end),
        ];
        for (label, start, end) in windows {
            if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
                return Err(format!(
                    "{}: {label} window [{start}, {end}) is not inside [0, 1]",
                    self.name
                ));
            }
        }
        if self.stats.magazine_size == 0 {
            return Err(format!("{}: magazine_size must be at least 1", self.name));
        }
        if !(self.stats.reload_time > 0.0) {
            return Err(format!("{}: reload_time must be positive", self.name));
        }
        if !(self.stats.fire_interval >= 0.0) {
            return Err(format!("{}: fire_interval must not be negative", self.name));
        }

        let f = &self.fire;
        let ads = &self.ads;
        let non_negative = [
            ("damage", self.stats.damage),
            ("recoil_amount", f.recoil_amount),
            ("recoil_recovery_speed", f.recoil_recovery_speed),
            ("vertical_recoil", f.vertical_recoil),
            ("vertical_variation", f.vertical_variation),
            ("horizontal_recoil", f.horizontal_recoil),
            ("horizontal_variation", f.horizontal_variation),
            ("transition_speed", ads.transition_speed),
        ];
        for (label, value) in non_negative {
            // Also rejects NaN and infinity
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{}: {label} must be finite and not negative, got {value}", self.name));
            }
        }

        let finite = [
            ("mag_drop_distance", r.mag_drop_distance),
            ("mag_drop_sideways", r.mag_drop_sideways),
            ("mag_drop_rotation", r.mag_drop_rotation),
            ("mag_drop_twist", r.mag_drop_twist),
            ("charge_distance", r.charge_distance),
        ];
        for (label, value) in finite {
            if !value.is_finite() {
                return Err(format!("{}: {label} must be finite, got {value}", self.name));
            }
        }
        if !ads.offset_adjustment.is_finite() {
            return Err(format!("{}: ADS offset_adjustment must be finite", self.name));
        }
        for (label, fov) in [("hipfire_fov_degrees", ads.hipfire_fov_degrees), ("ads_fov_degrees", ads.ads_fov_degrees)] {
            if !(fov > 0.0 && fov < 180.0) {
                return Err(format!("{}: {label} must be inside (0, 180), got {fov}", self.name));
            }
        }
        Ok(())
    }
}

/// Built-in weapons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponArchetype {
    Rifle,
    Pistol,
}

impl WeaponArchetype {
    pub const ALL: [Self; 2] = [Self::Rifle, Self::Pistol];

    pub fn name(&self) -> &'static str {
        match self {
            WeaponArchetype::Rifle => "AK-47",
            WeaponArchetype::Pistol => "Pistol",
        }
    }

    pub fn definition(&self) -> WeaponDefinition {
        match self {
            WeaponArchetype::Rifle => WeaponDefinition {
                name: self.name().to_string(),
                parts: PartBindings {
                    magazine: Some("rifle_magazine".to_string()),
                    charging_handle: Some("rifle_charging_handle".to_string()),
                    slide: None,
                    sight: Some("rifle_rear_sight".to_string()),
                },
                stats: WeaponStats {
                    damage: 35.0,
                    fire_interval: 0.1,
                    magazine_size: 30,
                    reload_time: 2.5,
                },
                reload: ReloadTimeline {
                    mag_drop_start: 0.0,
                    mag_drop_end: 0.2,
                    mag_insert_start: 0.5,
                    mag_insert_end: 0.75,
                    charge_start: 0.75,
                    charge_end: 0.9,
                    mag_drop_distance: 0.25,
                    mag_drop_sideways: 0.025,
                    mag_drop_rotation: 0.3,
                    mag_drop_twist: 0.1,
                    charge_distance: -0.04,
                    charge_axis: ChargeAxis::X,
                },
                fire: FireFeedback {
                    recoil_amount: 0.12,
                    recoil_recovery_speed: 1.0,
                    vertical_recoil: 0.022,
                    vertical_variation: 0.4,
                    horizontal_recoil: 0.012,
                    horizontal_variation: 0.8,
                },
                ads: AdsSettings {
                    offset_adjustment: Vec3::new(0.0, 0.0, -0.18),
                    ..default()
                },
            },
            WeaponArchetype::Pistol => WeaponDefinition {
                name: self.name().to_string(),
                parts: PartBindings {
                    magazine: Some("pistol_magazine".to_string()),
                    charging_handle: None,
                    slide: Some("pistol_slide".to_string()),
                    sight: Some("pistol_rear_sight".to_string()),
                },
                stats: WeaponStats {
                    damage: 25.0,
                    fire_interval: 0.3,
                    magazine_size: 12,
                    reload_time: 1.5,
                },
                reload: ReloadTimeline {
                    mag_drop_start: 0.0,
                    mag_drop_end: 0.3,
                    mag_insert_start: 0.4,
                    mag_insert_end: 0.7,
                    charge_start: 0.7,
                    charge_end: 0.9,
                    mag_drop_distance: 0.2,
                    charge_distance: 0.03,
                    ..default()
                },
                fire: FireFeedback {
                    recoil_amount: 0.08,
                    recoil_recovery_speed: 8.0,
                    ..default()
                },
                ads: AdsSettings {
                    offset_adjustment: Vec3::new(0.0, 0.0, -0.3),
                    ads_fov_degrees: 55.0,
                    ..default()
                },
            },
        }
    }
}

/// Named weapon definitions, loaded once and shared read-only
#[derive(Resource, Clone, Debug, Default)]
pub struct WeaponLibrary {
    definitions: BTreeMap<String, Arc<WeaponDefinition>>,
}

impl WeaponLibrary {
    /// The built-in archetypes
    pub fn builtin() -> Self {
        let mut library = Self::default();
        for archetype in WeaponArchetype::ALL {
            library.insert(archetype.definition());
        }
        library
    }

    /// Parse a RON list of definitions. Every entry is validated.
    pub fn from_ron(text: &str) -> Result<Self, String> {
        let definitions: Vec<WeaponDefinition> =
            ron::from_str(text).map_err(|e| format!("failed to parse weapon definitions: {e}"))?;

        let mut library = Self::default();
        for definition in definitions {
            definition.validate()?;
            library.insert(definition);
        }
        Ok(library)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
        Self::from_ron(&text)
    }

    pub fn insert(&mut self, definition: WeaponDefinition) {
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
    }

    /// Entries of `other` replace entries with the same name
    pub fn merge(&mut self, other: WeaponLibrary) {
        self.definitions.extend(other.definitions);
    }

    pub fn get(&self, name: &str) -> Option<Arc<WeaponDefinition>> {
        self.definitions.get(name).cloned()
    }

    pub fn archetype(&self, archetype: WeaponArchetype) -> Arc<WeaponDefinition> {
        self.get(archetype.name())
            .unwrap_or_else(|| Arc::new(archetype.definition()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_archetypes_are_valid() {
        for archetype in WeaponArchetype::ALL {
            assert!(archetype.definition().validate().is_ok(), "{archetype:?}");
        }
    }

    #[test]
    fn test_every_part_slot_is_driven_by_an_archetype() {
        for slot in PartSlot::ALL {
            let bound = WeaponArchetype::ALL
                .iter()
                .any(|archetype| archetype.definition().parts.name(slot).is_some());
            assert!(bound, "{slot:?} is not bound by any shipped weapon");
        }
    }

    #[test]
    fn test_rifle_numbers() {
        let rifle = WeaponArchetype::Rifle.definition();
        assert_eq!(rifle.stats.magazine_size, 30);
        assert_eq!(rifle.stats.fire_interval, 0.1);
        assert_eq!(rifle.stats.reload_time, 2.5);
        assert_eq!(rifle.reload.mag_insert_start, 0.5);
        assert_eq!(rifle.reload.charge_axis, ChargeAxis::X);
    }

    #[test]
    fn test_pistol_uses_slide() {
        let pistol = WeaponArchetype::Pistol.definition();
        assert!(pistol.parts.charging_handle.is_none());
        assert_eq!(pistol.parts.name(PartSlot::Slide), Some("pistol_slide"));
        assert_eq!(pistol.stats.magazine_size, 12);
    }

    #[test]
    fn test_ron_fills_defaults() {
        let library = WeaponLibrary::from_ron(
            r#"[
                (
                    name: "Carbine",
                    stats: (magazine_size: 20),
                    reload: (charge_axis: Y),
                ),
            ]"#,
        )
        .unwrap();

        let carbine = library.get("Carbine").unwrap();
        assert_eq!(carbine.stats.magazine_size, 20);
        assert_eq!(carbine.stats.damage, 35.0);
        assert_eq!(carbine.reload.charge_axis, ChargeAxis::Y);
        assert_eq!(carbine.reload.mag_drop_end, 0.25);
        assert!(carbine.parts.magazine.is_none());
    }

    #[test]
    fn test_ron_rejects_bad_window() {
        let result = WeaponLibrary::from_ron(
            r#"[(name: "Broken", reload: (mag_drop_start: 0.6, mag_drop_end: 0.2))]"#,
        );
        let err = result.unwrap_err();
        assert!(err.contains("Broken"));
    }

    #[test]
    fn test_ron_rejects_unbounded_recoil_variation() {
        let err = WeaponLibrary::from_ron(r#"[(name: "Hot", fire: (vertical_variation: 1e39))]"#).unwrap_err();
        assert!(err.contains("vertical_variation"), "{err}");

        let err = WeaponLibrary::from_ron(r#"[(name: "Hot", fire: (horizontal_variation: NaN))]"#).unwrap_err();
        assert!(err.contains("horizontal_variation"), "{err}");
    }

    #[test]
    fn test_ron_rejects_negative_recoil_feedback() {
        for field in [
            "recoil_amount",
            "recoil_recovery_speed",
            "vertical_recoil",
            "horizontal_recoil",
        ] {
            let text = format!(r#"[(name: "Odd", fire: ({field}: -5.0))]"#);
            let err = WeaponLibrary::from_ron(&text).unwrap_err();
            assert!(err.contains(field), "{err}");
        }
    }

    #[test]
    fn test_ron_rejects_bad_ads_settings() {
        let err = WeaponLibrary::from_ron(r#"[(name: "Odd", ads: (transition_speed: -1.0))]"#).unwrap_err();
        assert!(err.contains("transition_speed"), "{err}");

        let err = WeaponLibrary::from_ron(r#"[(name: "Odd", ads: (offset_adjustment: (0.0, inf, 0.0)))]"#)
            .unwrap_err();
        assert!(err.contains("offset_adjustment"), "{err}");

        let err = WeaponLibrary::from_ron(r#"[(name: "Odd", ads: (ads_fov_degrees: 0.0))]"#).unwrap_err();
        assert!(err.contains("ads_fov_degrees"), "{err}");
    }

    #[test]
    fn test_ron_rejects_non_finite_reload_magnitude() {
        let err = WeaponLibrary::from_ron(r#"[(name: "Odd", reload: (charge_distance: inf))]"#).unwrap_err();
        assert!(err.contains("charge_distance"), "{err}");
    }

    #[test]
    fn test_ron_syntax_error() {
        assert!(WeaponLibrary::from_ron("[(name: ").is_err());
    }

    #[test]
    fn test_merge_overrides_by_name() {
        let mut library = WeaponLibrary::builtin();
        let custom = WeaponLibrary::from_ron(r#"[(name: "Pistol", stats: (damage: 40.0))]"#).unwrap();
        library.merge(custom);

        assert_eq!(library.len(), 2);
        assert_eq!(library.archetype(WeaponArchetype::Pistol).stats.damage, 40.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = WeaponLibrary::load_from_file("does/not/exist.ron").unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
