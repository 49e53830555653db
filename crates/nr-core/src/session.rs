//! Emulator session state machine
//!
//! A pure reducer: [`reduce`] takes the current [`SessionState`] and a
//! [`SessionAction`] and returns the next state. It performs no I/O; blob
//! and storage side effects live in the controller that dispatches actions.
//!
//! The boot token is the remount signal for the embedded emulator. It only
//! ever grows, and grows by at most one per dispatched action.

use crate::game::{CoreOverride, Game, ViewMode, CUSTOM_GAME_ID};

/// Session state for one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub selected_game_id: String,
    /// Most recent user-loaded game, replaced wholesale on each load
    pub custom_game: Option<Game>,
    /// BIOS URL or blob reference; empty means high-level emulation
    pub bios_url: String,
    pub tv_powered_on: bool,
    pub boot_token: u64,
    pub override_core: CoreOverride,
    pub view_mode: ViewMode,
    /// Last status or error message from a load attempt
    pub rom_load_hint: String,
}

/// Actions accepted by the session reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SetSelectedGame(String),
    SetCustomGame(Option<Game>),
    SetBiosUrl(String),
    SetOverrideCore(CoreOverride),
    SetViewMode(ViewMode),
    SetRomHint(String),
    PowerOnOrRestart,
    PowerOff,
}

impl SessionState {
    /// Create a powered-off session with boot token 0
    pub fn new(selected_game_id: impl Into<String>, bios_url: impl Into<String>) -> Self {
        Self {
            selected_game_id: selected_game_id.into(),
            custom_game: None,
            bios_url: bios_url.into(),
            tv_powered_on: false,
            boot_token: 0,
            override_core: CoreOverride::Auto,
            view_mode: ViewMode::Observer,
            rom_load_hint: String::new(),
        }
    }

    /// Token after a change that only matters to a running emulator
    fn bumped_if_powered(&self) -> u64 {
        if self.tv_powered_on {
            self.boot_token + 1
        } else {
            self.boot_token
        }
    }

    /// Catalog games followed by the custom game, if any
    pub fn games<'a>(&'a self, catalog: &'a [Game]) -> Vec<&'a Game> {
        catalog.iter().chain(self.custom_game.iter()).collect()
    }

    /// Game matching the selected id, falling back to the first game
    pub fn selected_game<'a>(&'a self, catalog: &'a [Game]) -> Option<&'a Game> {
        let games = self.games(catalog);
        games
            .iter()
            .find(|game| game.id == self.selected_game_id)
            .or_else(|| games.first())
            .copied()
    }

    /// Selected game with the core override applied
    ///
    /// Recomputed on every call; never stored.
    pub fn effective_game(&self, catalog: &[Game]) -> Option<Game> {
        self.selected_game(catalog)
            .map(|game| game.with_override(self.override_core))
    }

    pub fn is_custom_selected(&self) -> bool {
        self.selected_game_id == CUSTOM_GAME_ID
    }
}

/// Apply `action` to `state`, returning the next state
pub fn reduce(state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::SetSelectedGame(selected_game_id) => {
            if state.selected_game_id == selected_game_id {
                return state;
            }
            SessionState {
                boot_token: state.bumped_if_powered(),
                selected_game_id,
                ..state
            }
        }
        SessionAction::SetCustomGame(custom_game) => {
            // Only remount when the replaced game is the one on screen.
            let restart = state.tv_powered_on && state.is_custom_selected();
            SessionState {
                boot_token: if restart {
                    state.boot_token + 1
                } else {
                    state.boot_token
                },
                custom_game,
                ..state
            }
        }
        SessionAction::SetBiosUrl(bios_url) => {
            if state.bios_url == bios_url {
                return state;
            }
            SessionState {
                boot_token: state.bumped_if_powered(),
                bios_url,
                ..state
            }
        }
        SessionAction::SetOverrideCore(override_core) => {
            if state.override_core == override_core {
                return state;
            }
            SessionState {
                boot_token: state.bumped_if_powered(),
                override_core,
                ..state
            }
        }
        SessionAction::SetViewMode(view_mode) => SessionState { view_mode, ..state },
        SessionAction::SetRomHint(rom_load_hint) => SessionState {
            rom_load_hint,
            ..state
        },
        SessionAction::PowerOnOrRestart => SessionState {
            tv_powered_on: true,
            boot_token: state.boot_token + 1,
            ..state
        },
        SessionAction::PowerOff => SessionState {
            tv_powered_on: false,
            ..state
        },
    }
}
