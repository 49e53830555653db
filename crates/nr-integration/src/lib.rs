//! Integration layer for nostalgia-room
//!
//! Ties the session state machine, ROM bundling and resource tracking into a
//! single controller, and turns its state into an emulator boot URL.

pub mod boot;
pub mod decor;
pub mod session;

pub use boot::BootDescriptor;
pub use decor::{load_decor_items, parse_decor_payload, DecorItem, DecorKind};
pub use session::{EmulatorSession, RomLoadStatus};
