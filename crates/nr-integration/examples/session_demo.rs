//! Example walking through a typical session
//!
//! This example shows how to:
//! 1. Create a session from the default configuration
//! 2. Power on the TV and read the boot URL
//! 3. Load a CUE/BIN set from memory
//! 4. Switch cores and watch the boot token change

use nr_core::{Config, Core, CoreOverride};
use nr_integration::{EmulatorSession, RomLoadStatus};
use nr_vfs::SelectedFile;

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    println!("=== Emulator Session Example ===\n");

    println!("Step 1: Creating session...");
    let config = Config::default();
    let mut session = EmulatorSession::new(&config);
    println!("  Selected: {:?}\n", session.selected_game().map(|g| &g.title));

    println!("Step 2: Powering on...");
    session.power_on_or_restart();
    println!("  Boot URL: {}\n", session.boot_url().unwrap_or_default());

    println!("Step 3: Loading a CUE/BIN set...");
    let files = vec![
        SelectedFile::from_bytes(
            "demo.cue",
            b"FILE \"demo (track 1).bin\" BINARY\n  TRACK 01 MODE2/2352\n    INDEX 01 00:00:00\n"
                .to_vec(),
        ),
        SelectedFile::from_bytes("demo (track 1).bin", vec![0u8; 2352]),
    ];
    match session.load_rom_files(&files) {
        RomLoadStatus::Bundle { token } => println!("  Bundle token: {}", token),
        other => println!("  Unexpected outcome: {:?}", other),
    }
    println!("  Hint: {}", session.state().rom_load_hint);
    println!("  Boot URL: {}\n", session.boot_url().unwrap_or_default());

    println!("Step 4: Forcing the pcsx_rearmed core...");
    session.set_override_core(CoreOverride::Force(Core::PcsxRearmed));
    println!("  Boot token: {}", session.state().boot_token);
    println!("  Boot URL: {}\n", session.boot_url().unwrap_or_default());

    session.teardown();
    println!("Live blobs after teardown: {}", session.blobs().live_count());
}
