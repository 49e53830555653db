//! nostalgia-room - emulator session manager
//!
//! Command-line front-end for the session core: loads ROM and BIOS files
//! the way the room's file pickers do and prints the resulting boot URL.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nr_core::{Config, CoreOverride};
use nr_integration::{load_decor_items, EmulatorSession};
use nr_vfs::SelectedFile;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser, Debug)]
#[command(name = "nostalgia-room", about = "Emulator session and ROM-bundle manager")]
struct Args {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load ROM files into a session, power on and print the boot URL
    Boot {
        /// ROM files: one image, or a .cue with its track files
        files: Vec<PathBuf>,

        /// BIOS image to use instead of the default
        #[arg(long, value_name = "FILE")]
        bios: Option<PathBuf>,

        /// Boot without BIOS (high-level emulation)
        #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "bios")]
        hle: bool,

        /// Force a core (auto, psx, pcsx_rearmed, mednafen_psx)
        #[arg(long, value_name = "CORE", default_value = "auto")]
        core: CoreOverride,

        /// Catalog game to select when no files are given
        #[arg(long, value_name = "ID")]
        game: Option<String>,
    },

    /// Print the room decor items as JSON
    Decor {
        /// Decor config (defaults to the configured path)
        path: Option<PathBuf>,
    },

    /// Convert .cue sets to .chd with chdman
    ConvertChd {
        /// Input .cue file
        #[arg(required_unless_present = "dir")]
        input: Option<PathBuf>,

        /// Output .chd file (defaults to the input with a .chd extension)
        output: Option<PathBuf>,

        /// Convert every .cue in this directory
        #[arg(long, value_name = "DIR", conflicts_with = "input")]
        dir: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    nr_core::logging::init(config.debug.log_level);
    tracing::debug!("Starting nostalgia-room");

    match args.command {
        Commands::Boot {
            files,
            bios,
            hle,
            core,
            game,
        } => boot(&config, &files, bios.as_deref(), hle, core, game),
        Commands::Decor { path } => {
            let path = path.unwrap_or_else(|| config.decor.config_path.clone());
            let items = load_decor_items(&path);
            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(())
        }
        Commands::ConvertChd { input, output, dir } => match (dir, input) {
            (Some(dir), _) => convert_directory(&dir),
            (None, Some(input)) => convert_single(&input, output.as_deref()),
            (None, None) => bail!("either an input .cue or --dir is required"),
        },
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn boot(
    config: &Config,
    files: &[PathBuf],
    bios: Option<&Path>,
    hle: bool,
    core: CoreOverride,
    game: Option<String>,
) -> anyhow::Result<()> {
    let mut session = EmulatorSession::new(config);

    if let Some(id) = game {
        session.select_catalog_game(&id)?;
    }

    let selected = files
        .iter()
        .map(|path| {
            SelectedFile::from_path(path).with_context(|| format!("opening {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    session.load_rom_files(&selected);

    if let Some(path) = bios {
        let file =
            SelectedFile::from_path(path).with_context(|| format!("opening {}", path.display()))?;
        session.load_bios_file(Some(&file));
    } else if hle {
        session.toggle_default_bios();
    }

    session.set_override_core(core);
    session.power_on_or_restart();

    let state = session.state();
    if !state.rom_load_hint.is_empty() {
        println!("{}", state.rom_load_hint);
    }
    if let Some(game) = session.effective_game() {
        println!("Game: {} ({})", game.title, game.boot_core());
    }
    if let Some(url) = session.boot_url() {
        println!("{}", url);
    }
    Ok(())
}

fn chd_path_for(cue: &Path) -> PathBuf {
    cue.with_extension("chd")
}

fn run_chdman(input: &Path, output: &Path) -> anyhow::Result<()> {
    let status = Command::new("chdman")
        .arg("createcd")
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .status()
        .context("running chdman")?;
    if !status.success() {
        bail!("chdman exited with code {}", status.code().unwrap_or(1));
    }
    Ok(())
}

fn convert_single(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    if nr_vfs::file::extension(&input.to_string_lossy()) != ".cue" {
        bail!("Input must be a .cue file.");
    }
    let output = output.map_or_else(|| chd_path_for(input), Path::to_path_buf);
    run_chdman(input, &output)?;
    println!("CHD created: {}", output.display());
    Ok(())
}

fn convert_directory(dir: &Path) -> anyhow::Result<()> {
    let mut cues = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && nr_vfs::file::extension(&path.to_string_lossy()) == ".cue" {
            cues.push(path);
        }
    }
    if cues.is_empty() {
        bail!("No .cue files found in: {}", dir.display());
    }
    cues.sort();

    for cue in cues {
        let output = chd_path_for(&cue);
        println!("Converting: {}", cue.display());
        run_chdman(&cue, &output)?;
        println!("Done: {}", output.display());
    }
    Ok(())
}
