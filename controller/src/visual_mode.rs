//! Visual quality mode (full models vs. prototype boxes)
//!
//! The context is owned by the host (a Bevy resource in the client) and passed to
//! whatever wants to follow mode changes. Observers are held weakly, so a dropped
//! observer simply stops receiving notifications.

use std::sync::{Arc, Weak};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualMode {
    #[default]
    Full,
    Prototype,
}

impl VisualMode {
    pub fn toggled(self) -> Self {
        match self {
            VisualMode::Full => VisualMode::Prototype,
            VisualMode::Prototype => VisualMode::Full,
        }
    }
}

pub trait VisualModeObserver: Send + Sync {
    fn on_mode_change(&self, mode: VisualMode);
}

/// Handle returned by [`VisualModeContext::register`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Resource, Default)]
pub struct VisualModeContext {
    mode: VisualMode,
    next_id: u64,
    observers: Vec<(ObserverId, Weak<dyn VisualModeObserver>)>,
}

impl VisualModeContext {
    pub fn new(mode: VisualMode) -> Self {
        Self {
            mode,
            ..default()
        }
    }

    pub fn mode(&self) -> VisualMode {
        self.mode
    }

    pub fn register<O: VisualModeObserver + 'static>(&mut self, observer: &Arc<O>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn VisualModeObserver> = weak;
        self.observers.push((id, weak));
        id
    }

    /// Returns false if the id was not registered
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(registered, _)| *registered != id);
        self.observers.len() != before
    }

    /// Live observers
    pub fn observer_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|(_, observer)| observer.strong_count() > 0)
            .count()
    }

    /// Change mode and notify observers. Returns false when nothing changed.
    pub fn set_mode(&mut self, mode: VisualMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        info!("Visual mode: {mode:?}");

        self.observers.retain(|(_, observer)| match observer.upgrade() {
            Some(observer) => {
                observer.on_mode_change(mode);
                true
            }
            None => false,
        });
        true
    }

    pub fn toggle(&mut self) -> VisualMode {
        let next = self.mode.toggled();
        self.set_mode(next);
        next
    }
}
