//! Background capture worker.
//!
//! One worker thread owns the log source for the engine's entire running
//! lifetime. It performs blocking line reads and blocking file writes;
//! rotation and eviction checks run between the read and the write of every
//! line, in that order. Capture failures are diagnostics, never surfaced -
//! the loop releases its resources and exits, and the engine simply reports
//! `Stopped` until the next start.

use crate::config::Config;
use crate::dir;
use crate::error::EngineResult;
use crate::policy;
use logvault_source::{LineStream, LogSource};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Handle to a spawned capture worker.
///
/// Dropping the handle detaches the thread; the cooperative stop flag is the
/// only cancellation primitive.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawns a capture worker owning the given source.
    pub(crate) fn spawn(
        source: Box<dyn LogSource>,
        logs_dir: PathBuf,
        config: &Config,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = CaptureWorker {
            source,
            logs_dir,
            max_rotation_file_size: config.max_rotation_file_size,
            max_directory_size: config.max_directory_size,
            stop: Arc::clone(&stop),
        };

        let thread = thread::Builder::new()
            .name("logvault-capture".to_string())
            .spawn(move || worker.run())?;

        Ok(Self { stop, thread })
    }

    /// Whether the worker thread is still running.
    pub(crate) fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Requests a cooperative stop; the worker exits at its next line.
    pub(crate) fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Signals stop and blocks until the worker has exited and released its
    /// rotation-file handle.
    pub(crate) fn stop_and_join(self) {
        self.signal_stop();
        let _ = self.thread.join();
    }
}

/// The capture loop state owned by the worker thread.
struct CaptureWorker {
    source: Box<dyn LogSource>,
    logs_dir: PathBuf,
    max_rotation_file_size: u64,
    max_directory_size: u64,
    stop: Arc<AtomicBool>,
}

impl CaptureWorker {
    /// Runs the capture loop to completion, releasing every resource
    /// exactly once on all exit paths.
    fn run(mut self) {
        // Best-effort discard of pre-capture buffered content.
        if let Err(e) = self.source.clear() {
            tracing::warn!(error = %e, "failed to clear log source buffer");
        }

        match self.source.open() {
            Ok(mut stream) => {
                if let Err(e) = self.capture(stream.as_mut()) {
                    tracing::error!(error = %e, "capture loop terminated");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to open log stream"),
        }

        if let Err(e) = self.source.close() {
            tracing::warn!(error = %e, "failed to release log source");
        }
    }

    fn capture(&mut self, stream: &mut dyn LineStream) -> EngineResult<()> {
        let mut file = RotationFile::create(&self.logs_dir)?;

        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            let Some(line) = stream.next_line()? else {
                break;
            };
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            if line.is_empty() {
                continue;
            }

            if policy::should_rotate(file.size(), self.max_rotation_file_size) {
                file = RotationFile::create(&self.logs_dir)?;
            }

            let total = dir::directory_size(&self.logs_dir)?;
            if policy::should_evict(total, self.max_directory_size) {
                self.evict_oldest()?;
            }

            file.append_line(&line)?;
        }

        Ok(())
    }

    /// Deletes the single oldest file under the rotation directory.
    fn evict_oldest(&self) -> EngineResult<()> {
        if let Some(path) = dir::oldest_file(&self.logs_dir)? {
            fs::remove_file(&path)?;
            tracing::debug!(path = %path.display(), "evicted oldest rotation file");
        }
        Ok(())
    }
}

/// The currently-open rotation file.
///
/// Created fresh on every rotation; tracks its own size so the rotation
/// check does not stat the file per line. Closing happens on drop.
struct RotationFile {
    file: File,
    size: u64,
}

impl RotationFile {
    fn create(logs_dir: &Path) -> EngineResult<Self> {
        let path = dir::rotation_path(logs_dir, dir::now_millis());
        let file = File::create(&path)?;
        Ok(Self { file, size: 0 })
    }

    fn append_line(&mut self, line: &str) -> EngineResult<()> {
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.size += line.len() as u64 + 1;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
