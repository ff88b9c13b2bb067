//! Capture command implementation.

use logvault_core::{Config, Engine};
use logvault_source::CommandSourceFactory;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Runs the capture command.
///
/// Builds an engine on the storage root and captures this process's log
/// stream (or an arbitrary shell command's output) for the requested
/// duration, or until the stream ends.
pub fn run(
    root: &Path,
    command: Option<&str>,
    duration: Option<u64>,
    max_file_size: Option<u64>,
    max_dir_size: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::default();
    if let Some(size) = max_file_size {
        config = config.max_rotation_file_size(size);
    }
    if let Some(size) = max_dir_size {
        config = config.max_directory_size(size);
    }

    let factory = match command {
        Some(cmd) => CommandSourceFactory::sh(cmd),
        None => CommandSourceFactory::logcat(),
    };

    let engine = Engine::open_with_config(root, config, Box::new(factory))?;

    info!(root = %root.display(), pid = engine.pid(), "starting capture");
    engine.start();

    match duration {
        Some(secs) => {
            std::thread::sleep(Duration::from_secs(secs));
            engine.stop();
            info!("capture stopped after {secs}s");
        }
        None => {
            // Run until the source stream ends.
            while engine.is_running() {
                std::thread::sleep(Duration::from_millis(500));
            }
            info!("log stream ended, capture stopped");
        }
    }

    Ok(())
}
