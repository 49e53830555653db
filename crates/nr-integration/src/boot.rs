//! Boot descriptor for the embedded emulator
//!
//! The emulator shell is configured entirely through its query string. A
//! changed `v` (boot token) is what tells it to start over.

use nr_core::config::EmulatorConfig;
use nr_core::{Core, Game};
use nr_vfs::is_blob_ref;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;

/// Characters left alone by JavaScript's `encodeURIComponent`
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Everything the emulator shell needs to boot a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootDescriptor {
    pub rom: String,
    pub title: String,
    pub bios: Option<String>,
    pub core: Core,
    pub extras_token: Option<String>,
    pub session_token: Option<u64>,
}

/// Make a site-relative path absolute; blob references pass through
fn resolve_against(origin: &str, reference: &str) -> String {
    if is_blob_ref(reference) {
        reference.to_string()
    } else {
        format!("{}{}", origin.trim_end_matches('/'), reference)
    }
}

impl BootDescriptor {
    /// Descriptor for booting `game` with `bios_url` as boot `token`
    pub fn for_game(game: &Game, bios_url: &str, token: u64, config: &EmulatorConfig) -> Self {
        Self {
            rom: resolve_against(&config.origin, &game.rom_path),
            title: game.title.clone(),
            bios: (!bios_url.is_empty()).then(|| resolve_against(&config.origin, bios_url)),
            core: game.boot_core(),
            extras_token: game.external_files_token.clone(),
            session_token: Some(token),
        }
    }

    /// Emulator shell URL carrying this descriptor as query parameters
    pub fn to_url(&self, shell_path: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("rom", &self.rom)
            .append_pair("title", &self.title)
            .append_pair("core", self.core.as_str());
        if let Some(bios) = self.bios.as_deref().filter(|b| !b.is_empty()) {
            query.append_pair("bios", bios);
        }
        if let Some(token) = self.extras_token.as_deref().filter(|t| !t.is_empty()) {
            query.append_pair("extrasToken", token);
        }
        if let Some(version) = self.session_token {
            query.append_pair("v", &version.to_string());
        }
        format!("{}?{}", shell_path, query.finish())
    }
}

/// Percent-encode one path segment the way `encodeURIComponent` does
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_core::game::builtin_games;

    fn descriptor() -> BootDescriptor {
        BootDescriptor {
            rom: "blob:nostalgia/00000001".to_string(),
            title: "Custom: game.chd".to_string(),
            bios: None,
            core: Core::Psx,
            extras_token: None,
            session_token: Some(3),
        }
    }

    #[test]
    fn test_url_minimal() {
        let url = descriptor().to_url("/emulator-shell.html");
        assert_eq!(
            url,
            "/emulator-shell.html?rom=blob%3Anostalgia%2F00000001&title=Custom%3A+game.chd&core=psx&v=3"
        );
    }

    #[test]
    fn test_url_with_bios_and_extras() {
        let desc = BootDescriptor {
            bios: Some("http://localhost:5173/bios/openbios.bin".to_string()),
            extras_token: Some("abc".to_string()),
            session_token: None,
            ..descriptor()
        };
        let url = desc.to_url("/emulator-shell.html");
        assert!(url.contains("&bios=http%3A%2F%2Flocalhost%3A5173%2Fbios%2Fopenbios.bin"));
        assert!(url.ends_with("&extrasToken=abc"));
        assert!(!url.contains("v="));
    }

    #[test]
    fn test_for_game_resolves_site_paths() {
        let config = EmulatorConfig::default();
        let game = &builtin_games()[0];

        let desc = BootDescriptor::for_game(game, "/bios/openbios.bin", 7, &config);
        assert_eq!(desc.rom, "http://localhost:5173/roms/bow_and_arrow/bow_and_arrow.bin");
        assert_eq!(desc.bios.as_deref(), Some("http://localhost:5173/bios/openbios.bin"));
        assert_eq!(desc.session_token, Some(7));

        let hle = BootDescriptor::for_game(game, "", 7, &config);
        assert!(hle.bios.is_none());

        let blob_bios = BootDescriptor::for_game(game, "blob:nostalgia/0000000a", 7, &config);
        assert_eq!(blob_bios.bios.as_deref(), Some("blob:nostalgia/0000000a"));
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("Disc (Track 1).cue"), "Disc%20(Track%201).cue");
        assert_eq!(
            encode_path_segment("Disc (Track 1)~!.cue"),
            "Disc%20(Track%201)~!.cue"
        );
        assert_eq!(encode_path_segment("it's*.bin"), "it's*.bin");
        assert_eq!(encode_path_segment("a/b?c&d+e%"), "a%2Fb%3Fc%26d%2Be%25");
        assert_eq!(encode_path_segment("Pokémon.cue"), "Pok%C3%A9mon.cue");
    }
}
