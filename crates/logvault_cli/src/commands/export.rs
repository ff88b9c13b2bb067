//! Export command implementation.

use logvault_core::Engine;
use logvault_source::CommandSourceFactory;
use std::path::Path;
use tracing::info;

/// Runs the export command.
///
/// Opens the engine on the storage root and merges the current rotation set
/// into the export file. The engine restarts capture as part of the export
/// contract; it is stopped again before this process exits.
pub fn run(root: &Path, command: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let factory = match command {
        Some(cmd) => CommandSourceFactory::sh(cmd),
        None => CommandSourceFactory::logcat(),
    };

    let engine = Engine::open(root, Box::new(factory))?;

    let export = engine.export()?;
    info!(path = %export.display(), "export complete");

    let size = std::fs::metadata(&export)?.len();
    println!("Exported {} bytes to {}", size, export.display());

    engine.stop();
    Ok(())
}
