//! Runtime state of one equipped weapon
//!
//! Owns fire gating, ammo, the reload timeline, ADS blending, recoil and view motion.
//! Rendering reads the result through [`WeaponInstance::pose`] and the rig.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::physics::{AimRay, HitScan, RayHit, SurfaceKind};
use crate::sinks::WeaponSinks;
use crate::smoothing::{blend_factor, guarded_lerp_vec3};
use crate::visual_mode::{ObserverId, VisualMode, VisualModeContext, VisualModeObserver};

use super::motion::ViewMotion;
use super::reload::{ReloadPhases, ReloadPose};
use super::rig::WeaponRig;
use super::WeaponDefinition;

/// Hipfire position of the weapon group in camera space: right, down, forward
pub const HIPFIRE_OFFSET: Vec3 = Vec3::new(0.3, -0.2, -0.5);
/// ADS position used when the model has no sight part
pub const FALLBACK_ADS_OFFSET: Vec3 = Vec3::new(0.0, -0.1, -0.35);
/// Hit-scan range (m)
pub const MAX_SHOT_DISTANCE: f32 = 1000.0;
/// Muzzle pitch per meter of recoil push-back
pub const RECOIL_PITCH: f32 = 0.15;
/// Rest position of the prototype box inside the group
pub const PROTOTYPE_MODEL_OFFSET: Vec3 = Vec3::ZERO;

/// What one accepted shot did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotReport {
    pub hit: Option<RayHit>,
    pub surface: Option<SurfaceKind>,
    pub killed: bool,
    pub ammo_left: u32,
}

/// Transforms the renderer applies every frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponPose {
    /// Weapon group relative to the camera
    pub group: Transform,
    /// Active model relative to the group
    pub model: Transform,
    pub mode: VisualMode,
}

/// Receives mode changes for a weapon; drained on the weapon's next update
#[derive(Default)]
struct ModeLatch {
    pending: AtomicU8,
}

impl ModeLatch {
    const NONE: u8 = 0;
    const FULL: u8 = 1;
    const PROTOTYPE: u8 = 2;

    fn take(&self) -> Option<VisualMode> {
        match self.pending.swap(Self::NONE, Ordering::AcqRel) {
            Self::FULL => Some(VisualMode::Full),
            Self::PROTOTYPE => Some(VisualMode::Prototype),
            _ => None,
        }
    }
}

impl VisualModeObserver for ModeLatch {
    fn on_mode_change(&self, mode: VisualMode) {
        let value = match mode {
            VisualMode::Full => Self::FULL,
            VisualMode::Prototype => Self::PROTOTYPE,
        };
        self.pending.store(value, Ordering::Release);
    }
}

pub struct WeaponInstance {
    definition: Arc<WeaponDefinition>,
    current_ammo: u32,
    last_fire_time: f32,
    is_reloading: bool,
    reload_progress: f32,
    recoil_kick: f32,
    camera_kick: Vec2,
    ads_progress: f32,
    sight_alignment: Option<Vec3>,
    /// Group position without recoil, blended between hipfire and ADS
    group_offset: Vec3,
    rig: WeaponRig,
    motion: ViewMotion,
    visual_mode: VisualMode,
    mode_latch: Arc<ModeLatch>,
    observer: Option<ObserverId>,
    rng: StdRng,
}

impl WeaponInstance {
    /// Create a weapon with a full magazine and subscribe it to visual mode changes
    pub fn new(definition: Arc<WeaponDefinition>, rig: WeaponRig, modes: &mut VisualModeContext) -> Self {
        let mode_latch = Arc::new(ModeLatch::default());
        let observer = modes.register(&mode_latch);
        let visual_mode = modes.mode();

        info!(
            "Equipped {} ({} rounds)",
            definition.name, definition.stats.magazine_size
        );

        let mut weapon = Self {
            current_ammo: definition.stats.magazine_size,
            last_fire_time: -10.0, // Allow immediate first shot
            is_reloading: false,
            reload_progress: 0.0,
            recoil_kick: 0.0,
            camera_kick: Vec2::ZERO,
            ads_progress: 0.0,
            sight_alignment: None,
            group_offset: HIPFIRE_OFFSET,
            motion: ViewMotion::new(Vec3::ZERO),
            visual_mode,
            mode_latch,
            observer: Some(observer),
            rng: StdRng::from_entropy(),
            rig,
            definition,
        };
        weapon.motion = ViewMotion::new(weapon.model_rest(visual_mode));
        weapon
    }

    /// Deterministic camera-kick variation
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Unsubscribe from mode changes. The weapon is consumed.
    pub fn destroy(mut self, modes: &mut VisualModeContext) {
        if let Some(id) = self.observer.take() {
            modes.unregister(id);
        }
        info!("Unequipped {}", self.definition.name);
    }

    pub fn definition(&self) -> &WeaponDefinition {
        &self.definition
    }

    pub fn current_ammo(&self) -> u32 {
        self.current_ammo
    }

    pub fn magazine_size(&self) -> u32 {
        self.definition.stats.magazine_size
    }

    pub fn reload_duration(&self) -> f32 {
        self.definition.stats.reload_time
    }

    pub fn is_reloading(&self) -> bool {
        self.is_reloading
    }

    pub fn reload_progress(&self) -> f32 {
        self.reload_progress
    }

    /// Seconds of reload left, zero when idle
    pub fn reload_remaining(&self) -> f32 {
        if self.is_reloading {
            (1.0 - self.reload_progress) * self.reload_duration()
        } else {
            0.0
        }
    }

    pub fn reload_phases(&self) -> ReloadPhases {
        ReloadPhases::at(self.reload_progress, &self.definition.reload)
    }

    pub fn recoil_kick(&self) -> f32 {
        self.recoil_kick
    }

    pub fn ads_progress(&self) -> f32 {
        self.ads_progress
    }

    pub fn sight_alignment(&self) -> Option<Vec3> {
        self.sight_alignment
    }

    pub fn visual_mode(&self) -> VisualMode {
        self.visual_mode
    }

    pub fn rig(&self) -> &WeaponRig {
        &self.rig
    }

    /// Push the current ammo state to the display
    pub fn report_ammo(&self, sinks: &mut WeaponSinks) {
        sinks.report_ammo(self.current_ammo, self.magazine_size(), self.is_reloading);
    }

    pub fn can_fire(&self, now: f32) -> bool {
        self.current_ammo > 0 && (now - self.last_fire_time) >= self.definition.stats.fire_interval
    }

    /// Fire one round along `aim`. Returns `None` when gated by ammo or fire rate.
    pub fn fire(
        &mut self,
        now: f32,
        aim: AimRay,
        scene: Option<&(dyn HitScan + '_)>,
        sinks: &mut WeaponSinks,
    ) -> Option<ShotReport> {
        if !self.can_fire(now) {
            return None;
        }

        self.current_ammo -= 1;
        self.last_fire_time = now;
        self.report_ammo(sinks);

        let mut report = ShotReport {
            hit: None,
            surface: None,
            killed: false,
            ammo_left: self.current_ammo,
        };

        if let Some(scene) = scene {
            if let Some(hit) = scene.cast_ray(aim.origin, aim.direction, MAX_SHOT_DISTANCE) {
                let surface = scene.classify(hit.entity);
                match surface {
                    SurfaceKind::Entity => {
                        if let Some(damage) = sinks.damage.as_deref_mut() {
                            report.killed = damage.take_damage(hit.entity, self.definition.stats.damage);
                            if report.killed {
                                info!("{} killed {:?}", self.definition.name, hit.entity);
                            }
                        }
                    }
                    SurfaceKind::Static | SurfaceKind::Dynamic => {
                        if let Some(decals) = sinks.decals.as_deref_mut() {
                            decals.add_decal(hit.point, hit.normal, Some(hit.entity), surface);
                        }
                    }
                }
                debug!("Hit {surface:?} at {:?}", hit.point);
                report.hit = Some(hit);
                report.surface = Some(surface);
            }
        }

        self.apply_recoil();

        if self.current_ammo == 0 {
            info!("Magazine empty");
        }
        Some(report)
    }

    fn apply_recoil(&mut self) {
        let fire = &self.definition.fire;
        self.recoil_kick = fire.recoil_amount;

        let pitch = fire.vertical_recoil * (1.0 + jitter(&mut self.rng, fire.vertical_variation));
        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let yaw = side * fire.horizontal_recoil * (1.0 + jitter(&mut self.rng, fire.horizontal_variation));
        let kick = Vec2::new(yaw, pitch);
        if kick.is_finite() {
            self.camera_kick += kick;
        }
    }

    /// Camera rotation owed since the last call: x is yaw, y is pitch (radians)
    pub fn take_camera_kick(&mut self) -> Vec2 {
        std::mem::take(&mut self.camera_kick)
    }

    /// Begin the reload timeline. Returns false if one is already running.
    pub fn start_reload(&mut self, sinks: &mut WeaponSinks) -> bool {
        if self.is_reloading {
            return false;
        }
        self.is_reloading = true;
        self.reload_progress = 0.0;
        self.report_ammo(sinks);
        info!("Reloading {}", self.definition.name);
        true
    }

    /// Abort a running reload: parts go back to rest, ammo is unchanged
    pub fn cancel_reload(&mut self, sinks: &mut WeaponSinks) {
        if !self.is_reloading {
            return;
        }
        self.is_reloading = false;
        self.reload_progress = 0.0;
        self.rig.restore_all();
        self.report_ammo(sinks);
        info!("Reload of {} cancelled", self.definition.name);
    }

    pub fn update_reload_animation(&mut self, dt: f32, sinks: &mut WeaponSinks) {
        if !self.is_reloading {
            return;
        }

        let duration = self.reload_duration();
        self.reload_progress += if duration > 0.0 { dt / duration } else { 1.0 };

        if self.reload_progress >= 1.0 {
            self.finish_reload(sinks);
            return;
        }

        let timeline = &self.definition.reload;
        ReloadPose::at(self.reload_progress, timeline).apply(&mut self.rig, timeline);
    }

    fn finish_reload(&mut self, sinks: &mut WeaponSinks) {
        self.is_reloading = false;
        self.current_ammo = self.magazine_size();
        self.reload_progress = 0.0;
        self.rig.restore_all();
        self.report_ammo(sinks);
        info!("Reload finished: {} / {}", self.current_ammo, self.magazine_size());
    }

    pub fn update_recoil(&mut self, dt: f32) {
        let recovery = self.definition.fire.recoil_recovery_speed.max(0.0);
        self.recoil_kick = (self.recoil_kick - recovery * dt).max(0.0);
    }

    /// Compute the sight alignment now instead of on first aim
    pub fn align_sight(&mut self) -> Vec3 {
        if let Some(offset) = self.sight_alignment {
            return offset;
        }
        let offset = match self.rig.sight_in_group_space() {
            Some(sight) => -sight + self.definition.ads.offset_adjustment,
            None => {
                warn!(
                    "{} has no sight part, using generic ADS offset",
                    self.definition.name
                );
                FALLBACK_ADS_OFFSET
            }
        };
        info!("Sight alignment for {}: {offset:?}", self.definition.name);
        self.sight_alignment = Some(offset);
        offset
    }

    pub fn update_ads(&mut self, dt: f32, is_ads: bool) {
        let target = if is_ads { 1.0 } else { 0.0 };
        if is_ads {
            self.align_sight();
        }

        let factor = blend_factor(self.definition.ads.transition_speed, dt);
        let next = self.ads_progress + (target - self.ads_progress) * factor;
        if next.is_finite() {
            self.ads_progress = next.clamp(0.0, 1.0);
        }

        let ads_offset = self.sight_alignment.unwrap_or(HIPFIRE_OFFSET);
        self.group_offset = guarded_lerp_vec3(HIPFIRE_OFFSET, ads_offset, self.ads_progress);
    }

    /// Feed a mouse-look delta into the sway
    pub fn add_look_input(&mut self, delta: Vec2) {
        self.motion.add_look_input(delta);
    }

    /// Per-frame update after the physics step.
    /// `velocity` is the character's velocity, `is_ads` whether the weapon layer is ADS.
    pub fn update(&mut self, dt: f32, velocity: Vec3, is_ads: bool, sinks: &mut WeaponSinks) {
        if let Some(mode) = self.mode_latch.take() {
            self.handle_mode_change(mode);
        }

        self.update_ads(dt, is_ads);
        let speed = Vec3::new(velocity.x, 0.0, velocity.z).length();
        self.motion.update(dt, speed);
        self.update_reload_animation(dt, sinks);
        self.update_recoil(dt);
    }

    fn handle_mode_change(&mut self, mode: VisualMode) {
        if mode == self.visual_mode {
            return;
        }
        info!("{} switching to {mode:?} model", self.definition.name);
        self.visual_mode = mode;
        self.motion.rebase(self.model_rest(mode));
    }

    fn model_rest(&self, mode: VisualMode) -> Vec3 {
        match mode {
            VisualMode::Full => self.rig.model_root().translation,
            VisualMode::Prototype => PROTOTYPE_MODEL_OFFSET,
        }
    }

    pub fn pose(&self) -> WeaponPose {
        let group = Transform::from_translation(self.group_offset + Vec3::Z * self.recoil_kick)
            .with_rotation(Quat::from_rotation_x(RECOIL_PITCH * self.recoil_kick));
        WeaponPose {
            group,
            model: self.motion.model_transform(),
            mode: self.visual_mode,
        }
    }
}

/// Uniform sample in `[-spread, spread]`; unusable spreads give no jitter
fn jitter(rng: &mut StdRng, spread: f32) -> f32 {
    let spread = spread.abs();
    if spread.is_finite() && spread > 0.0 {
        rng.gen_range(-spread..=spread)
    } else {
        0.0
    }
}
