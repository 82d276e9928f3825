//! Input bindings
//!
//! Device buttons resolve through one [`BindingTable`] into a list of [`Intent`]s per
//! frame. Each binding carries its own [`TriggerPolicy`].

use bevy::prelude::*;

use crate::config::AimMode;

/// Everything a character can be told to do in one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    /// World-space horizontal direction, already rotated by camera yaw
    Move(Vec3),
    Jump,
    Crouch,
    Prone,
    LeanLeft,
    LeanRight,
    Aim,
    AimRelease,
    ToggleAim,
    Focus,
    FocusRelease,
    Reload,
    Fire,
}

/// Bindable actions. Movement keys are bound separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Jump,
    Crouch,
    Prone,
    LeanLeft,
    LeanRight,
    Aim,
    ToggleAim,
    Focus,
    Reload,
    Fire,
}

impl Action {
    pub fn press_intent(&self) -> Intent {
        match self {
            Action::Jump => Intent::Jump,
            Action::Crouch => Intent::Crouch,
            Action::Prone => Intent::Prone,
            Action::LeanLeft => Intent::LeanLeft,
            Action::LeanRight => Intent::LeanRight,
            Action::Aim => Intent::Aim,
            Action::ToggleAim => Intent::ToggleAim,
            Action::Focus => Intent::Focus,
            Action::Reload => Intent::Reload,
            Action::Fire => Intent::Fire,
        }
    }

    pub fn release_intent(&self) -> Option<Intent> {
        match self {
            Action::Aim => Some(Intent::AimRelease),
            Action::Focus => Some(Intent::FocusRelease),
            _ => None,
        }
    }
}

/// When a binding emits its intent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerPolicy {
    /// Every frame the button is down, plus the release intent on release
    Continuous,
    /// Once per press
    #[default]
    EdgeTriggered,
    /// Once per press and once per release
    EdgeWithRelease,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSource {
    Key(KeyCode),
    Mouse(MouseButton),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub source: InputSource,
    pub action: Action,
    pub policy: TriggerPolicy,
}

impl Binding {
    pub fn key(key: KeyCode, action: Action, policy: TriggerPolicy) -> Self {
        Self {
            source: InputSource::Key(key),
            action,
            policy,
        }
    }

    pub fn mouse(button: MouseButton, action: Action, policy: TriggerPolicy) -> Self {
        Self {
            source: InputSource::Mouse(button),
            action,
            policy,
        }
    }

    fn resolve(&self, buttons: &dyn ButtonSnapshot, out: &mut Vec<Intent>) {
        let press = match self.policy {
            TriggerPolicy::Continuous => buttons.pressed(self.source),
            TriggerPolicy::EdgeTriggered | TriggerPolicy::EdgeWithRelease => buttons.just_pressed(self.source),
        };
        if press {
            out.push(self.action.press_intent());
        }

        let wants_release = matches!(
            self.policy,
            TriggerPolicy::Continuous | TriggerPolicy::EdgeWithRelease
        );
        if wants_release && buttons.just_released(self.source) {
            if let Some(release) = self.action.release_intent() {
                out.push(release);
            }
        }
    }
}

/// One frame of button state
pub trait ButtonSnapshot {
    fn pressed(&self, source: InputSource) -> bool;
    fn just_pressed(&self, source: InputSource) -> bool;
    fn just_released(&self, source: InputSource) -> bool;
}

/// Keyboard and mouse buttons as Bevy tracks them
pub struct DeviceButtons<'a> {
    pub keys: &'a ButtonInput<KeyCode>,
    pub mouse: &'a ButtonInput<MouseButton>,
}

impl ButtonSnapshot for DeviceButtons<'_> {
    fn pressed(&self, source: InputSource) -> bool {
        match source {
            InputSource::Key(key) => self.keys.pressed(key),
            InputSource::Mouse(button) => self.mouse.pressed(button),
        }
    }

    fn just_pressed(&self, source: InputSource) -> bool {
        match source {
            InputSource::Key(key) => self.keys.just_pressed(key),
            InputSource::Mouse(button) => self.mouse.just_pressed(button),
        }
    }

    fn just_released(&self, source: InputSource) -> bool {
        match source {
            InputSource::Key(key) => self.keys.just_released(key),
            InputSource::Mouse(button) => self.mouse.just_released(button),
        }
    }
}

/// Keys for the four movement directions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
}

impl Default for MoveKeys {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }
}

/// Horizontal direction for the held movement keys, relative to camera yaw.
/// Unit length or zero.
pub fn movement_direction(forward: bool, backward: bool, left: bool, right: bool, yaw: f32) -> Vec3 {
    // In Bevy: +X is right, +Y is up, -Z is forward
    let forward_dir = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right_dir = Vec3::new(yaw.cos(), 0.0, -yaw.sin());

    let mut direction = Vec3::ZERO;
    if forward {
        direction += forward_dir;
    }
    if backward {
        direction -= forward_dir;
    }
    if right {
        direction += right_dir;
    }
    if left {
        direction -= right_dir;
    }
    direction.normalize_or_zero()
}

#[derive(Resource, Clone, Debug, PartialEq)]
pub struct BindingTable {
    pub move_keys: MoveKeys,
    bindings: Vec<Binding>,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::defaults(AimMode::Hold)
    }
}

impl BindingTable {
    pub fn defaults(aim_mode: AimMode) -> Self {
        use TriggerPolicy::*;

        let aim = match aim_mode {
            AimMode::Hold => Binding::mouse(MouseButton::Right, Action::Aim, Continuous),
            AimMode::Toggle => Binding::mouse(MouseButton::Right, Action::ToggleAim, EdgeTriggered),
        };

        Self {
            move_keys: MoveKeys::default(),
            bindings: vec![
                Binding::key(KeyCode::Space, Action::Jump, EdgeTriggered),
                Binding::key(KeyCode::KeyC, Action::Crouch, EdgeTriggered),
                Binding::key(KeyCode::KeyX, Action::Prone, EdgeTriggered),
                Binding::key(KeyCode::KeyQ, Action::LeanLeft, EdgeTriggered),
                Binding::key(KeyCode::KeyE, Action::LeanRight, EdgeTriggered),
                Binding::key(KeyCode::KeyR, Action::Reload, EdgeTriggered),
                Binding::key(KeyCode::KeyF, Action::Focus, Continuous),
                Binding::mouse(MouseButton::Left, Action::Fire, Continuous),
                aim,
            ],
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Replace every binding for `action`
    pub fn rebind(&mut self, action: Action, source: InputSource, policy: TriggerPolicy) {
        self.bindings.retain(|binding| binding.action != action);
        self.bindings.push(Binding {
            source,
            action,
            policy,
        });
    }

    /// Intents for this frame. A move intent comes first, and only when a movement key is held.
    pub fn resolve(&self, buttons: &dyn ButtonSnapshot, yaw: f32) -> Vec<Intent> {
        let mut intents = Vec::new();

        let held = |key| buttons.pressed(InputSource::Key(key));
        let direction = movement_direction(
            held(self.move_keys.forward),
            held(self.move_keys.backward),
            held(self.move_keys.left),
            held(self.move_keys.right),
            yaw,
        );
        if direction != Vec3::ZERO {
            intents.push(Intent::Move(direction));
        }

        for binding in &self.bindings {
            binding.resolve(buttons, &mut intents);
        }
        intents
    }
}
