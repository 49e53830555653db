//! Emulator session controller
//!
//! Owns the session state and every resource created on its behalf. User
//! actions come in as method calls; each one dispatches reducer actions and
//! performs the blob/storage side effects the reducer must not.
//!
//! Load failures never escape: they become the session's ROM load hint and
//! leave the previous game selected.

use crate::boot::{encode_path_segment, BootDescriptor};
use nr_core::config::{Config, EmulatorConfig};
use nr_core::error::{BundleError, RoomError};
use nr_core::{reduce, Core, CoreOverride, Game, SessionAction, SessionState, ViewMode, CUSTOM_GAME_ID};
use nr_vfs::{
    find_cue, BlobStore, ExternalFilesStore, MemoryStorage, ResourceTracker, RomBundler,
    SelectedFile, SessionStorage,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const BIOS_MIME: &str = "application/octet-stream";

/// Outcome of [`EmulatorSession::load_rom_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomLoadStatus {
    /// Nothing was selected
    Ignored,
    /// A cue sheet and its tracks were bundled under `token`
    Bundle { token: String },
    /// A single image file was loaded
    Single { file_name: String },
    /// Nothing was loaded; the hint says why
    Rejected,
}

pub struct EmulatorSession {
    state: SessionState,
    catalog: Vec<Game>,
    emulator: EmulatorConfig,
    default_bios_url: String,
    blobs: BlobStore,
    external: ExternalFilesStore,
    bundler: RomBundler,
    tracker: ResourceTracker,
}

impl EmulatorSession {
    /// Session backed by in-memory storage sized from `config`
    pub fn new(config: &Config) -> Self {
        let storage: Arc<dyn SessionStorage> = match config.storage.quota_bytes {
            Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage)
    }

    /// Session persisting External Files Maps into `storage`
    pub fn with_storage(config: &Config, storage: Arc<dyn SessionStorage>) -> Self {
        let blobs = BlobStore::new();
        let external = ExternalFilesStore::new(storage, config.storage.external_files_prefix.clone());

        let mut state = SessionState::new(
            config.session.default_game_id.clone(),
            config.session.default_bios_url.clone(),
        );
        state.view_mode = config.session.view_mode;

        Self {
            state,
            catalog: config.games.clone(),
            emulator: config.emulator.clone(),
            default_bios_url: config.session.default_bios_url.clone(),
            bundler: RomBundler::new(blobs.clone(), external.clone()),
            tracker: ResourceTracker::new(blobs.clone(), external.clone()),
            blobs,
            external,
        }
    }

    /// Apply one reducer action
    pub fn dispatch(&mut self, action: SessionAction) {
        let token = self.state.boot_token;
        debug!("Dispatch {:?}", action);
        self.state = reduce(self.state.clone(), action);
        if self.state.boot_token != token {
            info!("Boot token {} -> {}", token, self.state.boot_token);
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn games(&self) -> Vec<&Game> {
        self.state.games(&self.catalog)
    }

    pub fn selected_game(&self) -> Option<&Game> {
        self.state.selected_game(&self.catalog)
    }

    pub fn effective_game(&self) -> Option<Game> {
        self.state.effective_game(&self.catalog)
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn external_files(&self) -> &ExternalFilesStore {
        &self.external
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    pub fn set_selected_game_id(&mut self, id: impl Into<String>) {
        self.dispatch(SessionAction::SetSelectedGame(id.into()));
    }

    /// Select `id`, failing when no listed game carries it
    pub fn select_catalog_game(&mut self, id: &str) -> nr_core::Result<()> {
        if !self.games().iter().any(|game| game.id == id) {
            return Err(RoomError::GameNotFound(id.to_string()));
        }
        self.set_selected_game_id(id);
        Ok(())
    }

    pub fn set_override_core(&mut self, core: CoreOverride) {
        self.dispatch(SessionAction::SetOverrideCore(core));
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.dispatch(SessionAction::SetViewMode(view_mode));
    }

    pub fn power_on_or_restart(&mut self) {
        self.dispatch(SessionAction::PowerOnOrRestart);
    }

    pub fn power_off(&mut self) {
        self.dispatch(SessionAction::PowerOff);
    }

    fn set_hint(&mut self, hint: impl Into<String>) {
        self.dispatch(SessionAction::SetRomHint(hint.into()));
    }

    fn install_custom_game(&mut self, game: Game) {
        self.dispatch(SessionAction::SetCustomGame(Some(game)));
        self.dispatch(SessionAction::SetSelectedGame(CUSTOM_GAME_ID.to_string()));
    }

    /// Load a user selection as the custom game.
    ///
    /// A `.cue` in the selection is bundled with its tracks. If there is no
    /// cue, or bundling fails, the best single image is loaded instead.
    pub fn load_rom_files(&mut self, files: &[SelectedFile]) -> RomLoadStatus {
        if files.is_empty() {
            return RomLoadStatus::Ignored;
        }

        if let Some(cue) = find_cue(files) {
            match self.bundler.build_cue_bundle(files, cue) {
                Ok(bundle) => {
                    self.tracker
                        .replace_custom_rom_artifacts(bundle.blob_refs(), Some(bundle.token.clone()));
                    self.set_hint(bundle.hint.clone());

                    let rom_path = format!(
                        "{}/{}/{}",
                        self.emulator.local_rom_route,
                        bundle.token,
                        encode_path_segment(&bundle.entry_file_name)
                    );
                    self.install_custom_game(Game {
                        id: CUSTOM_GAME_ID.to_string(),
                        title: format!("Custom: {}", bundle.title),
                        rom_path,
                        description: "User-provided multi-file CUE set loaded from local files."
                            .to_string(),
                        source_url: "local-file".to_string(),
                        core: Some(Core::Psx),
                        external_files_token: Some(bundle.token.clone()),
                    });
                    info!("Loaded cue bundle {}", bundle.token);
                    return RomLoadStatus::Bundle {
                        token: bundle.token,
                    };
                }
                Err(e) => {
                    warn!("Cue bundle failed: {}", e);
                    self.set_hint(format!("{} Trying to load the main file directly...", e));
                }
            }
        }

        match self.bundler.pack_single_file(files) {
            Ok(rom) => {
                self.tracker
                    .replace_custom_rom_artifacts(vec![rom.blob.clone()], None);
                self.set_hint(format!("Loaded: {}", rom.file_name));
                self.install_custom_game(Game {
                    id: CUSTOM_GAME_ID.to_string(),
                    title: format!("Custom: {}", rom.file_name),
                    rom_path: rom.blob,
                    description: "User-provided ROM loaded from local file.".to_string(),
                    source_url: "local-file".to_string(),
                    core: Some(Core::Psx),
                    external_files_token: None,
                });
                info!("Loaded single ROM {}", rom.file_name);
                RomLoadStatus::Single {
                    file_name: rom.file_name,
                }
            }
            Err(e) => {
                warn!("ROM load rejected: {}", e);
                self.set_hint(e.to_string());
                RomLoadStatus::Rejected
            }
        }
    }

    /// Use `file` as the BIOS image. `None` leaves the BIOS untouched.
    pub fn load_bios_file(&mut self, file: Option<&SelectedFile>) -> bool {
        let Some(file) = file else {
            return false;
        };

        let data = match file.read() {
            Ok(data) => data,
            Err(source) => {
                let e = BundleError::Read {
                    name: file.name().to_string(),
                    source,
                };
                warn!("BIOS load failed: {}", e);
                self.set_hint(e.to_string());
                return false;
            }
        };

        let blob = self.blobs.create(data, BIOS_MIME);
        self.tracker.replace_bios_blob(Some(blob.clone()));
        info!("Loaded BIOS {}", file.name());
        self.dispatch(SessionAction::SetBiosUrl(blob));
        true
    }

    /// Switch between the default BIOS and high-level emulation
    pub fn toggle_default_bios(&mut self) {
        self.tracker.replace_bios_blob(None);
        let bios_url = if self.state.bios_url == self.default_bios_url {
            String::new()
        } else {
            self.default_bios_url.clone()
        };
        self.dispatch(SessionAction::SetBiosUrl(bios_url));
    }

    /// Boot descriptor for the emulator, or `None` while powered off
    pub fn boot_descriptor(&self) -> Option<BootDescriptor> {
        if !self.state.tv_powered_on {
            return None;
        }
        let game = self.effective_game()?;
        Some(BootDescriptor::for_game(
            &game,
            &self.state.bios_url,
            self.state.boot_token,
            &self.emulator,
        ))
    }

    pub fn boot_url(&self) -> Option<String> {
        self.boot_descriptor()
            .map(|desc| desc.to_url(&self.emulator.shell_path))
    }

    /// Release every blob and stored map owned by this session
    pub fn teardown(&mut self) {
        self.tracker.teardown();
    }
}
