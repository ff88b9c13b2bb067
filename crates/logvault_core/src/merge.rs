//! Merging rotation files into a single chronological export.

use crate::dir;
use crate::error::EngineResult;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Consolidates every rotation file under `logs_dir` into `export_path`.
///
/// Files are concatenated in ascending order of modification time (ties
/// broken by path), each file's lines in their original order, every line
/// terminated with `\n`. Any pre-existing export file is deleted first so
/// the merge always starts from empty; an empty rotation directory yields
/// an empty export file.
///
/// # Errors
///
/// Returns an error if the export directory cannot be prepared or any
/// rotation file cannot be read.
pub(crate) fn merge_into(logs_dir: &Path, export_path: &Path) -> EngineResult<()> {
    if let Some(parent) = export_path.parent() {
        fs::create_dir_all(parent)?;
    }
    if export_path.exists() {
        fs::remove_file(export_path)?;
    }

    let files = dir::files_by_modified(logs_dir)?;
    let mut writer = BufWriter::new(File::create(export_path)?);

    for path in files {
        let reader = BufReader::new(File::open(&path)?);
        for line in reader.lines() {
            let line = line?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }

    writer.flush()?;
    Ok(())
}
