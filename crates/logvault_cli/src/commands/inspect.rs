//! Inspect command implementation.

use logvault_core::{directory_size, files_by_modified};
use serde::Serialize;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Rotation-directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Storage root path.
    pub root: String,
    /// Number of rotation files.
    pub file_count: usize,
    /// Total rotation-directory size in bytes.
    pub total_size: u64,
    /// Per-file statistics, oldest first.
    pub files: Vec<FileStats>,
    /// Export file size, if an export exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_size: Option<u64>,
}

/// Statistics for a single rotation file.
#[derive(Debug, Serialize)]
pub struct FileStats {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub modified_ms: u64,
}

/// Runs the inspect command.
///
/// Reads the storage root directly, without taking the engine lock, so a
/// live engine in another process is not disturbed.
pub fn run(root: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let logs_dir = root.join("logs");
    if !logs_dir.is_dir() {
        return Err(format!("No rotation directory found at {:?}", logs_dir).into());
    }

    let mut files = Vec::new();
    for path in files_by_modified(&logs_dir)? {
        let metadata = std::fs::metadata(&path)?;
        let modified_ms = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        files.push(FileStats {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: metadata.len(),
            modified_ms,
        });
    }

    let export_path = root.join("output").join("logs.txt");
    let export_size = std::fs::metadata(&export_path).ok().map(|m| m.len());

    let result = InspectResult {
        root: root.display().to_string(),
        file_count: files.len(),
        total_size: directory_size(&logs_dir)?,
        files,
        export_size,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text(&result),
    }

    Ok(())
}

fn print_text(result: &InspectResult) {
    println!("Storage root: {}", result.root);
    println!("Rotation files: {}", result.file_count);
    println!("Total size: {} bytes", result.total_size);
    println!();

    for file in &result.files {
        println!(
            "  {:<32} {:>10} bytes  modified {}",
            file.name, file.size, file.modified_ms
        );
    }

    match result.export_size {
        Some(size) => println!("\nExport: {} bytes", size),
        None => println!("\nExport: none"),
    }
}
