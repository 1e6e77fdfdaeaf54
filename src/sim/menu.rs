//! Menus and pause flow
//!
//! The pause flag lives in [`PauseState`], owned by the game and lent to the
//! components that read or write it. Level switching is a shared capability
//! ([`MenuActions`]) rather than a base class.

use super::host::{EntityId, Host};

/// Whether gameplay is frozen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseState {
    paused: bool,
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// Level switching shared by every menu screen
pub trait MenuActions {
    /// Replace the current level with `name`
    fn load_level(&self, host: &mut dyn Host, name: &str) {
        log::info!("Loading level {name}");
        host.load_level(name);
    }

    /// Reload the level that is currently active
    fn restart(&self, host: &mut dyn Host) {
        let name = host.active_level().to_owned();
        self.load_level(host, &name);
    }
}

/// Title screen buttons
#[derive(Debug, Clone, Copy, Default)]
pub struct MainMenu;

impl MenuActions for MainMenu {}

/// In-game pause overlay
#[derive(Debug, Clone, Default)]
pub struct PauseMenu {
    panel: Option<EntityId>,
}

impl MenuActions for PauseMenu {}

impl PauseMenu {
    pub fn new(panel: Option<EntityId>) -> Self {
        Self { panel }
    }

    pub fn panel(&self) -> Option<EntityId> {
        self.panel
    }

    /// Always begin a level unpaused
    pub fn start(&self, host: &mut dyn Host, pause: &mut PauseState) {
        pause.set(false);
        self.set_pause_menu(host, pause, false);
    }

    /// Freeze or resume the game and toggle the overlay
    pub fn set_pause_menu(&self, host: &mut dyn Host, pause: &mut PauseState, is_paused: bool) {
        pause.set(is_paused);
        host.set_time_scale(if is_paused { 0.0 } else { 1.0 });
        if let Some(panel) = self.panel {
            host.set_active(panel, is_paused);
        }
        log::info!("{}", if is_paused { "Paused" } else { "Running" });
    }
}
