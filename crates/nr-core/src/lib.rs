//! Core session logic for nostalgia-room
//!
//! This crate provides the foundational types, error handling,
//! configuration, logging and the emulator session state machine.

pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod session;

pub use config::Config;
pub use error::{BundleError, Result, RoomError, StorageError};
pub use game::{Core, CoreOverride, Game, ViewMode, CUSTOM_GAME_ID, DEFAULT_BIOS_URL, DEFAULT_GAME_ID};
pub use session::{reduce, SessionAction, SessionState};
