//! Character controller
//!
//! Composition root: owns the layered state, one controller per layer and the
//! equipped weapon. Commands are routed here, and [`CharacterController::update`]
//! runs the layers in a fixed order once per tick:
//! grounding, movement, stance, weapon state, lean, then the invariant pass.
//! The weapon animates afterwards, from [`CharacterController::update_weapon`], once
//! the physics step has produced this frame's velocity.

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::controllers::{
    GroundingController, LeanController, LeanOffset, MovementController, StanceController,
    WeaponStateController,
};
use crate::intent::Intent;
use crate::physics::{AimRay, CharacterBody, HitScan};
use crate::sinks::WeaponSinks;
use crate::state::PlayerState;
use crate::weapons::{ShotReport, WeaponInstance, WeaponPose};

/// Everything a command may need besides the controller itself
pub struct CommandContext<'a> {
    pub body: Option<&'a mut dyn CharacterBody>,
    /// Game time in seconds, for fire-rate gating
    pub now: f32,
    pub aim: AimRay,
    pub sinks: WeaponSinks<'a>,
}

impl<'a> CommandContext<'a> {
    pub fn new(now: f32, aim: AimRay) -> Self {
        Self {
            body: None,
            now,
            aim,
            sinks: WeaponSinks::default(),
        }
    }

    pub fn with_body(mut self, body: &'a mut dyn CharacterBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_sinks(mut self, sinks: WeaponSinks<'a>) -> Self {
        self.sinks = sinks;
        self
    }
}

#[derive(Component)]
pub struct CharacterController {
    config: ControllerConfig,
    state: PlayerState,
    grounding: GroundingController,
    movement: MovementController,
    stance: StanceController,
    weapon_state: WeaponStateController,
    lean: LeanController,
    weapon: Option<WeaponInstance>,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl CharacterController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            grounding: GroundingController::new(&config),
            movement: MovementController::new(&config),
            stance: StanceController::new(&config),
            weapon_state: WeaponStateController::new(),
            lean: LeanController::new(&config),
            state: PlayerState::default(),
            weapon: None,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn weapon(&self) -> Option<&WeaponInstance> {
        self.weapon.as_ref()
    }

    /// Smoothed eye height above the body origin
    pub fn eye_height(&self) -> f32 {
        self.stance.eye_height()
    }

    pub fn lean_offset(&self) -> LeanOffset {
        self.lean.camera_offset()
    }

    /// Horizontal velocity written by the last movement update
    pub fn horizontal_velocity(&self) -> Vec3 {
        self.movement.horizontal_velocity()
    }

    pub fn jump_cooldown(&self) -> f32 {
        self.grounding.cooldown()
    }

    pub fn weapon_pose(&self) -> Option<WeaponPose> {
        self.weapon.as_ref().map(WeaponInstance::pose)
    }

    // =========================================================================
    // Weapon ownership
    // =========================================================================

    /// Equip `weapon`, returning the one it replaces
    pub fn equip(&mut self, weapon: WeaponInstance, sinks: &mut WeaponSinks) -> Option<WeaponInstance> {
        let previous = self.unequip(sinks);
        weapon.report_ammo(sinks);
        self.weapon = Some(weapon);
        previous
    }

    /// Take the weapon away. A running reload is cancelled: parts go back to rest,
    /// ammo stays where it was and the weapon layer returns to hipfire.
    pub fn unequip(&mut self, sinks: &mut WeaponSinks) -> Option<WeaponInstance> {
        let mut weapon = self.weapon.take()?;
        weapon.cancel_reload(sinks);
        self.weapon_state.cancel_reload(&mut self.state);
        Some(weapon)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn handle_move(&mut self, direction: Vec3) {
        self.movement.handle_move(direction);
    }

    pub fn handle_jump(&mut self, body: Option<&mut (dyn CharacterBody + '_)>) -> bool {
        self.grounding.handle_jump(&mut self.state, body)
    }

    pub fn handle_crouch(&mut self) -> bool {
        self.stance.handle_crouch(&mut self.state)
    }

    pub fn handle_prone(&mut self) -> bool {
        self.stance.handle_prone(&mut self.state)
    }

    pub fn handle_lean_left(&mut self) {
        self.lean.handle_lean_left(&mut self.state);
    }

    pub fn handle_lean_right(&mut self) {
        self.lean.handle_lean_right(&mut self.state);
    }

    pub fn handle_aim(&mut self) -> bool {
        self.weapon_state.handle_aim(&self.state)
    }

    pub fn handle_aim_release(&mut self) {
        self.weapon_state.handle_aim_release();
    }

    pub fn handle_toggle_aim(&mut self) -> bool {
        self.weapon_state.handle_toggle_aim(&self.state)
    }

    pub fn handle_focus(&mut self) -> bool {
        self.weapon_state.handle_focus(&self.state)
    }

    pub fn handle_focus_release(&mut self) {
        self.weapon_state.handle_focus_release();
    }

    /// Enter the reload layer and start the weapon's reload timeline.
    /// Uses the weapon's reload time, or the fallback duration with no weapon.
    pub fn handle_reload(&mut self, sinks: &mut WeaponSinks) -> bool {
        let duration = self.weapon.as_ref().map(WeaponInstance::reload_duration);
        if !self.weapon_state.handle_reload(&mut self.state, duration) {
            return false;
        }
        if let Some(weapon) = self.weapon.as_mut() {
            weapon.start_reload(sinks);
        }
        true
    }

    /// Fire the equipped weapon. Refused while reloading or with nothing equipped.
    pub fn handle_fire(
        &mut self,
        now: f32,
        aim: AimRay,
        scene: Option<&(dyn HitScan + '_)>,
        sinks: &mut WeaponSinks,
    ) -> Option<ShotReport> {
        let weapon = self.weapon.as_mut()?;
        // The weapon may finish its timeline a frame after the layer does
        if self.state.is_reloading() || weapon.is_reloading() {
            return None;
        }
        weapon.fire(now, aim, scene, sinks)
    }

    /// Route one intent to its handler
    pub fn dispatch(&mut self, intent: Intent, ctx: &mut CommandContext) {
        match intent {
            Intent::Move(direction) => self.handle_move(direction),
            Intent::Jump => {
                self.handle_jump(ctx.body.as_deref_mut());
            }
            Intent::Crouch => {
                self.handle_crouch();
            }
            Intent::Prone => {
                self.handle_prone();
            }
            Intent::LeanLeft => self.handle_lean_left(),
            Intent::LeanRight => self.handle_lean_right(),
            Intent::Aim => {
                self.handle_aim();
            }
            Intent::AimRelease => self.handle_aim_release(),
            Intent::ToggleAim => {
                self.handle_toggle_aim();
            }
            Intent::Focus => {
                self.handle_focus();
            }
            Intent::FocusRelease => self.handle_focus_release(),
            Intent::Reload => {
                self.handle_reload(&mut ctx.sinks);
            }
            Intent::Fire => {
                let scene: Option<&dyn HitScan> = match ctx.body.as_deref() {
                    Some(body) => Some(body),
                    None => None,
                };
                self.handle_fire(ctx.now, ctx.aim, scene, &mut ctx.sinks);
            }
        }
    }

    // =========================================================================
    // Per-tick updates
    // =========================================================================

    /// Advance every layer by `dt`. Runs before the physics step.
    pub fn update(&mut self, dt: f32, body: Option<&mut (dyn CharacterBody + '_)>) {
        let mut body = body;

        self.grounding.update(dt, &mut self.state, body.as_deref());
        self.movement.update(dt, &mut self.state, body.as_deref_mut());
        self.stance.update(dt, &mut self.state);
        self.weapon_state.update(dt, &mut self.state);
        self.lean.update(dt, &self.state);

        self.state.enforce_invariants();
    }

    /// Animate the weapon from the post-physics velocity
    pub fn update_weapon(&mut self, dt: f32, velocity: Vec3, sinks: &mut WeaponSinks) {
        let is_ads = self.state.is_aiming();
        let Some(weapon) = self.weapon.as_mut() else {
            return;
        };

        let was_reloading = weapon.is_reloading();
        weapon.update(dt, velocity, is_ads, sinks);

        // Leave the reload layer together with the weapon
        if was_reloading && !weapon.is_reloading() {
            self.weapon_state.cancel_reload(&mut self.state);
        }
    }

    pub fn add_look_input(&mut self, delta: Vec2) {
        if let Some(weapon) = self.weapon.as_mut() {
            weapon.add_look_input(delta);
        }
    }

    /// Camera recoil owed since the last call
    pub fn take_camera_kick(&mut self) -> Vec2 {
        self.weapon
            .as_mut()
            .map(WeaponInstance::take_camera_kick)
            .unwrap_or(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::physics::SurfaceKind;
    use crate::state::{GroundingState, LeanState, MovementState, Stance, WeaponState};
    use crate::test_support::{test_entities, MockBody, RecordingAmmo, RecordingDamage};
    use crate::visual_mode::VisualModeContext;
    use crate::weapons::{WeaponArchetype, WeaponRig};

    const DT: f32 = 1.0 / 60.0;

    fn armed(modes: &mut VisualModeContext) -> CharacterController {
        let mut controller = CharacterController::default();
        let weapon = WeaponInstance::new(
            Arc::new(WeaponArchetype::Rifle.definition()),
            WeaponRig::default(),
            modes,
        );
        controller.equip(weapon, &mut WeaponSinks::default());
        controller
    }

    #[test]
    fn test_move_then_idle() {
        let mut controller = CharacterController::default();
        let mut body = MockBody::grounded();

        controller.handle_move(Vec3::NEG_Z);
        controller.update(DT, Some(&mut body));
        assert_eq!(controller.state().movement, MovementState::Moving);
        assert!(body.velocity.z < 0.0);

        controller.update(DT, Some(&mut body));
        assert_eq!(controller.state().movement, MovementState::Idle);
    }

    #[test]
    fn test_jump_dampens_horizontal_velocity() {
        let mut controller = CharacterController::default();
        let mut body = MockBody::grounded();
        body.velocity = Vec3::new(4.0, 0.0, 2.0);

        assert!(controller.handle_jump(Some(&mut body)));
        assert_eq!(body.velocity, Vec3::new(2.0, 10.0, 1.0));
        assert_eq!(controller.state().grounding, GroundingState::Airborne);
    }

    #[test]
    fn test_jump_from_crouch_stands_up() {
        let mut controller = CharacterController::default();
        let mut body = MockBody::grounded();

        assert!(controller.handle_crouch());
        assert!(controller.handle_jump(Some(&mut body)));
        assert_eq!(controller.state().stance, Stance::Standing);

        // Airborne: stance commands are refused
        assert!(!controller.handle_prone());
        assert_eq!(controller.state().stance, Stance::Standing);
    }

    #[test]
    fn test_walking_off_a_ledge_forces_standing() {
        let mut controller = CharacterController::default();
        let mut body = MockBody::grounded();
        controller.handle_prone();
        assert_eq!(controller.state().stance, Stance::Prone);

        body.ground = false;
        controller.update(DT, Some(&mut body));
        assert_eq!(controller.state().grounding, GroundingState::Airborne);
        assert_eq!(controller.state().stance, Stance::Standing);
    }

    #[test]
    fn test_update_without_body() {
        let mut controller = CharacterController::default();
        controller.handle_move(Vec3::X);
        controller.handle_lean_right();
        controller.update(DT, None);

        assert_eq!(controller.state().movement, MovementState::Moving);
        assert_eq!(controller.state().lean, LeanState::Right);
        assert!(controller.lean_offset().lateral > 0.0);
    }

    #[test]
    fn test_aim_moves_weapon_layer() {
        let mut modes = VisualModeContext::default();
        let mut controller = armed(&mut modes);

        controller.handle_aim();
        controller.update(DT, None);
        assert_eq!(controller.state().weapon, WeaponState::Ads);

        controller.handle_aim_release();
        controller.handle_focus();
        controller.update(DT, None);
        assert_eq!(controller.state().weapon, WeaponState::FocusHipfire);
    }

    #[test]
    fn test_reload_flow() {
        let mut modes = VisualModeContext::default();
        let mut controller = armed(&mut modes);
        let mut ammo = RecordingAmmo::default();
        let mut sinks = WeaponSinks::default().with_ammo(&mut ammo);

        controller.handle_fire(0.0, AimRay::default(), None, &mut sinks);
        assert!(controller.handle_reload(&mut sinks));
        assert!(!controller.handle_reload(&mut sinks));
        assert_eq!(controller.state().weapon, WeaponState::Reload);

        // Aim and fire are refused mid-reload
        assert!(!controller.handle_aim());
        assert!(controller
            .handle_fire(5.0, AimRay::default(), None, &mut sinks)
            .is_none());

        let mut elapsed = 0.0;
        while controller.state().is_reloading() || controller.weapon().is_some_and(WeaponInstance::is_reloading) {
            controller.update(DT, None);
            controller.update_weapon(DT, Vec3::ZERO, &mut sinks);
            elapsed += DT;
            assert!(elapsed < 3.0);
        }

        assert_eq!(controller.state().weapon, WeaponState::Hipfire);
        assert_eq!(controller.weapon().map(WeaponInstance::current_ammo), Some(30));
        drop(sinks);
        assert_eq!(ammo.last(), Some((30, 30, false)));
    }

    #[test]
    fn test_reload_without_weapon_uses_fallback() {
        let mut controller = CharacterController::default();
        assert!(controller.handle_reload(&mut WeaponSinks::default()));

        for _ in 0..110 {
            controller.update(DT, None);
        }
        assert!(controller.state().is_reloading());
        for _ in 0..20 {
            controller.update(DT, None);
        }
        assert_eq!(controller.state().weapon, WeaponState::Hipfire);
    }

    #[test]
    fn test_unequip_cancels_reload() {
        let mut modes = VisualModeContext::default();
        let mut controller = armed(&mut modes);
        let mut sinks = WeaponSinks::default();

        controller.handle_fire(0.0, AimRay::default(), None, &mut sinks);
        controller.handle_reload(&mut sinks);
        controller.update_weapon(0.5, Vec3::ZERO, &mut sinks);

        let weapon = controller.unequip(&mut sinks).unwrap();
        assert!(!weapon.is_reloading());
        assert_eq!(weapon.current_ammo(), 29);
        assert!(weapon.rig().is_at_rest());
        assert_eq!(controller.state().weapon, WeaponState::Hipfire);

        weapon.destroy(&mut modes);
        assert_eq!(modes.observer_count(), 0);
    }

    #[test]
    fn test_dispatch_routes_fire_through_body() {
        let mut modes = VisualModeContext::default();
        let mut controller = armed(&mut modes);
        let target = test_entities(1)[0];
        let mut body = MockBody::grounded().with_target(target, SurfaceKind::Entity);
        let mut damage = RecordingDamage::default();

        {
            let mut ctx = CommandContext::new(0.0, AimRay::default())
                .with_body(&mut body)
                .with_sinks(WeaponSinks::default().with_damage(&mut damage));
            controller.dispatch(Intent::Fire, &mut ctx);
            controller.dispatch(Intent::Jump, &mut ctx);
        }

        assert_eq!(damage.hits, vec![(target, 35.0)]);
        assert_eq!(body.shot_count(), 1);
        assert_eq!(body.impulses, vec![Vec3::Y * 10.0]);
        assert_eq!(controller.state().grounding, GroundingState::Airborne);
    }

    #[test]
    fn test_ads_slows_movement() {
        let mut hipfire = CharacterController::default();
        let mut aiming = CharacterController::default();
        let mut hip_body = MockBody::grounded();
        let mut ads_body = MockBody::grounded();

        aiming.handle_aim();
        aiming.update(DT, Some(&mut ads_body));
        ads_body.velocity = Vec3::ZERO;

        for _ in 0..300 {
            hipfire.handle_move(Vec3::NEG_Z);
            hipfire.update(DT, Some(&mut hip_body));
            aiming.handle_move(Vec3::NEG_Z);
            aiming.update(DT, Some(&mut ads_body));
        }

        assert!((hip_body.velocity.length() - 5.0).abs() < 0.01);
        assert!((ads_body.velocity.length() - 2.5).abs() < 0.01);
    }
}
