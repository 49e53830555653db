//! Game descriptors and the built-in catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved game id for user-loaded ROMs
pub const CUSTOM_GAME_ID: &str = "custom";

/// Game selected on a fresh session
pub const DEFAULT_GAME_ID: &str = "bow";

/// BIOS image served alongside the emulator shell
pub const DEFAULT_BIOS_URL: &str = "/bios/openbios.bin";

/// Emulation core understood by the emulator shell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Core {
    #[default]
    Psx,
    PcsxRearmed,
    MednafenPsx,
}

impl Core {
    pub fn as_str(&self) -> &'static str {
        match self {
            Core::Psx => "psx",
            Core::PcsxRearmed => "pcsx_rearmed",
            Core::MednafenPsx => "mednafen_psx",
        }
    }

    pub fn all() -> [Core; 3] {
        [Core::Psx, Core::PcsxRearmed, Core::MednafenPsx]
    }
}

impl fmt::Display for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Core {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Core::all()
            .into_iter()
            .find(|core| core.as_str() == s)
            .ok_or_else(|| format!("Unknown core: {}", s))
    }
}

/// Core selection: the per-game default or a forced core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoreOverride {
    #[default]
    Auto,
    Force(Core),
}

impl fmt::Display for CoreOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreOverride::Auto => f.write_str("auto"),
            CoreOverride::Force(core) => f.write_str(core.as_str()),
        }
    }
}

impl FromStr for CoreOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            Ok(CoreOverride::Auto)
        } else {
            s.parse().map(CoreOverride::Force)
        }
    }
}

/// Camera rig used to look at the room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Observer,
    FirstPerson,
}

/// A bootable game
///
/// Treated as an immutable value: a new load produces a new `Game`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    pub title: String,
    /// Site-relative URL or blob reference
    pub rom_path: String,
    pub description: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Core>,
    /// Lookup token of the External Files Map backing a multi-file bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_files_token: Option<String>,
}

impl Game {
    /// Core the emulator should boot this game with
    pub fn boot_core(&self) -> Core {
        self.core.unwrap_or_default()
    }

    /// Copy of this game with the core forced when an override is active
    pub fn with_override(&self, core_override: CoreOverride) -> Game {
        match core_override {
            CoreOverride::Auto => self.clone(),
            CoreOverride::Force(core) => Game {
                core: Some(core),
                ..self.clone()
            },
        }
    }
}

/// Built-in homebrew catalog
pub fn builtin_games() -> Vec<Game> {
    vec![
        Game {
            id: "bow".to_string(),
            title: "Bow and Arrow PSX".to_string(),
            rom_path: "/roms/bow_and_arrow/bow_and_arrow.bin".to_string(),
            description: "Homebrew PS1 remake by ABelliqueux/Schnappy.".to_string(),
            source_url: "https://github.com/ABelliqueux/Bow_and_Arrow_psx".to_string(),
            core: Some(Core::Psx),
            external_files_token: None,
        },
        Game {
            id: "nolibgs".to_string(),
            title: "Nolibgs Demo Disc".to_string(),
            rom_path: "/roms/nolibgs_demo/nolibgs_demo.bin".to_string(),
            description: "PS1 demo disc showcasing multiple homebrew features.".to_string(),
            source_url: "https://github.com/ABelliqueux/nolibgs_demo".to_string(),
            core: Some(Core::Psx),
            external_files_token: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_round_trip_names() {
        for core in Core::all() {
            assert_eq!(core.as_str().parse::<Core>().unwrap(), core);
        }
        assert!("n64".parse::<Core>().is_err());
    }

    #[test]
    fn test_core_override_parse() {
        assert_eq!("auto".parse::<CoreOverride>().unwrap(), CoreOverride::Auto);
        assert_eq!(
            "pcsx_rearmed".parse::<CoreOverride>().unwrap(),
            CoreOverride::Force(Core::PcsxRearmed)
        );
    }

    #[test]
    fn test_with_override_does_not_touch_original() {
        let game = builtin_games().remove(0);
        let forced = game.with_override(CoreOverride::Force(Core::MednafenPsx));
        assert_eq!(forced.core, Some(Core::MednafenPsx));
        assert_eq!(game.core, Some(Core::Psx));
        assert_eq!(forced.id, game.id);
    }

    #[test]
    fn test_missing_core_boots_psx() {
        let mut game = builtin_games().remove(1);
        game.core = None;
        assert_eq!(game.boot_core(), Core::Psx);
    }

    #[test]
    fn test_builtin_catalog_contains_default() {
        assert!(builtin_games().iter().any(|g| g.id == DEFAULT_GAME_ID));
        assert!(builtin_games().iter().all(|g| g.id != CUSTOM_GAME_ID));
    }
}
