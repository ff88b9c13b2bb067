//! Storage root management.
//!
//! This module handles the file system layout for a capture engine:
//!
//! ```text
//! <root>/
//! ├─ LOCK                     # Advisory lock for single-engine access
//! ├─ logs/
//! │  └─ logcat_<millis>.txt   # Rotation files
//! └─ output/
//!    └─ logs.txt              # Merged export, rebuilt on every export
//! ```
//!
//! The LOCK file ensures only one engine instance owns a storage root at a
//! time. Rotation files are named from their creation instant in epoch
//! milliseconds; two rotations within the same millisecond get a monotonic
//! counter suffix (`logcat_<millis>_<n>.txt`).

use crate::error::{EngineError, EngineResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File and directory names within the storage root.
const LOCK_FILE: &str = "LOCK";
const LOGS_DIR: &str = "logs";
const OUTPUT_DIR: &str = "output";
const EXPORT_FILE: &str = "logs.txt";
const ROTATION_PREFIX: &str = "logcat_";
const ROTATION_EXT: &str = "txt";

/// Manages the storage root layout and its advisory lock.
///
/// # Thread Safety
///
/// The `CaptureDir` holds an exclusive lock on the storage root. Only one
/// `CaptureDir` instance can exist per root at a time.
#[derive(Debug)]
pub struct CaptureDir {
    /// Storage root path.
    root: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl CaptureDir {
    /// Opens or creates a storage root.
    ///
    /// Creates the root, the rotation directory and the export directory if
    /// they are absent, and acquires the exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another engine holds the lock (returns `Locked`)
    /// - I/O errors occur while creating the layout
    pub fn open(root: &Path) -> EngineResult<Self> {
        fs::create_dir_all(root)?;

        if !root.is_dir() {
            return Err(EngineError::config(format!(
                "storage root is not a directory: {}",
                root.display()
            )));
        }

        fs::create_dir_all(root.join(LOGS_DIR))?;
        fs::create_dir_all(root.join(OUTPUT_DIR))?;

        // Acquire exclusive lock (non-blocking)
        let lock_path = root.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(EngineError::Locked);
        }

        Ok(Self {
            root: root.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the storage root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the rotation-file directory.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Returns the export output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Returns the path of the merged export file.
    #[must_use]
    pub fn export_path(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR).join(EXPORT_FILE)
    }
}

/// Picks the path for a rotation file created at `millis`.
///
/// The base name is `logcat_<millis>.txt`; if that path is taken (a second
/// rotation within the same millisecond), a monotonic counter suffix is
/// appended until a free name is found.
pub(crate) fn rotation_path(logs_dir: &Path, millis: u64) -> PathBuf {
    let base = logs_dir.join(format!("{ROTATION_PREFIX}{millis}.{ROTATION_EXT}"));
    if !base.exists() {
        return base;
    }

    let mut counter = 1u32;
    loop {
        let candidate =
            logs_dir.join(format!("{ROTATION_PREFIX}{millis}_{counter}.{ROTATION_EXT}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Computes the total size in bytes of everything under `path`.
///
/// Recurses into subdirectories generically, even though the rotation
/// directory is expected to stay flat.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn directory_size(path: &Path) -> EngineResult<u64> {
    let mut size = 0u64;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            size += directory_size(&entry.path())?;
        } else {
            size += entry.metadata()?.len();
        }
    }
    Ok(size)
}

/// Finds the file with the oldest modification time under `path`,
/// recursing into subdirectories.
///
/// Ties are broken by path so the result is deterministic. Returns `None`
/// if the tree holds no files.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn oldest_file(path: &Path) -> EngineResult<Option<PathBuf>> {
    let mut oldest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let candidate = if file_type.is_dir() {
            match oldest_file(&entry.path())? {
                Some(nested) => {
                    let modified = fs::metadata(&nested)?.modified()?;
                    (modified, nested)
                }
                None => continue,
            }
        } else {
            (entry.metadata()?.modified()?, entry.path())
        };

        let is_older = match &oldest {
            Some(current) => candidate < *current,
            None => true,
        };
        if is_older {
            oldest = Some(candidate);
        }
    }

    Ok(oldest.map(|(_, path)| path))
}

/// Lists the files directly under `dir`, sorted ascending by modification
/// time (ties broken by path).
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn files_by_modified(dir: &Path) -> EngineResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push((entry.metadata()?.modified()?, entry.path()));
        }
    }

    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}
