//! Engine facade and lifecycle control.

use crate::capture::WorkerHandle;
use crate::config::Config;
use crate::dir::CaptureDir;
use crate::error::EngineResult;
use crate::merge;
use logvault_source::SourceFactory;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Observable lifecycle state of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No live capture worker.
    Stopped,
    /// A capture worker is running.
    Running,
}

/// Tagged worker state guarded by the engine's mutex.
///
/// Kept as an explicit enum rather than an optional handle so the
/// stopped/running distinction is a value, not a null check.
#[derive(Debug)]
enum WorkerState {
    Stopped,
    Running(WorkerHandle),
}

/// The capture engine.
///
/// `Engine` is the primary entry point: it owns the storage root, spawns
/// and stops the background capture worker, and produces merged exports.
///
/// # Lifecycle
///
/// An engine is built in [`EngineState::Stopped`]. `start()` spawns one
/// worker bound to the current process's identifier; `stop()` signals it
/// cooperatively and returns without waiting; `export()` stops capture,
/// waits for the worker to release its file handle, merges the rotation set
/// and restarts capture whether or not the merge succeeded.
///
/// All lifecycle transitions serialize on an internal mutex, so concurrent
/// `start` calls from multiple threads cannot spawn two workers.
///
/// # Example
///
/// ```rust,no_run
/// use logvault_core::{Config, Engine};
/// use logvault_source::CommandSourceFactory;
/// use std::path::Path;
///
/// # fn main() -> logvault_core::EngineResult<()> {
/// let engine = Engine::open(
///     Path::new("/data/logvault"),
///     Box::new(CommandSourceFactory::logcat()),
/// )?;
///
/// engine.start();
/// // ... later, on demand:
/// let export = engine.export()?;
/// println!("merged log at {}", export.display());
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    /// Validated configuration.
    config: Config,
    /// Storage root (holds the lock).
    dir: CaptureDir,
    /// Process identifier capture is scoped to.
    pid: u32,
    /// Mints one fresh log source per worker spawn.
    sources: Box<dyn SourceFactory>,
    /// Worker state, guarded for lifecycle transitions.
    worker: Mutex<WorkerState>,
}

impl Engine {
    /// Opens an engine with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage root cannot be prepared or is locked
    /// by another engine.
    pub fn open(root: &Path, sources: Box<dyn SourceFactory>) -> EngineResult<Self> {
        Self::open_with_config(root, Config::default(), sources)
    }

    /// Opens an engine with custom configuration.
    ///
    /// Validates the configuration, resolves and creates the rotation and
    /// export directories under `root`, acquires the root lock, and returns
    /// an engine in [`EngineState::Stopped`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid (file cap not strictly below the
    ///   directory budget)
    /// - Another engine holds the root lock (`Locked`)
    /// - I/O errors occur while creating the layout
    pub fn open_with_config(
        root: &Path,
        config: Config,
        sources: Box<dyn SourceFactory>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let dir = CaptureDir::open(root)?;

        Ok(Self {
            config,
            dir,
            pid: std::process::id(),
            sources,
            worker: Mutex::new(WorkerState::Stopped),
        })
    }

    /// Starts capturing. Idempotent.
    ///
    /// Spawns a fresh worker unless one is already alive. A worker that
    /// died on its own (source exhausted, I/O error) is replaced.
    ///
    /// Worker spawn failures are diagnostics only - losing capture must
    /// never take the host down - so this returns nothing; observe the
    /// outcome through [`Engine::state`].
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if let WorkerState::Running(handle) = &*worker {
            if handle.is_alive() {
                return;
            }
        }
        *worker = self.spawn_worker();
    }

    /// Signals the capture worker to stop and returns immediately.
    ///
    /// The stop is cooperative: the worker exits at its next line, and this
    /// call does not wait for that to happen.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        if let WorkerState::Running(handle) =
            std::mem::replace(&mut *worker, WorkerState::Stopped)
        {
            handle.signal_stop();
        }
    }

    /// Merges all rotation files into the export file and returns its path.
    ///
    /// Capture is stopped first, and this call waits for the worker to
    /// release its rotation-file handle before reading the directory, so
    /// the merge never observes a file mid-write. Capture is restarted
    /// before returning, on both the success and the failure path.
    ///
    /// # Errors
    ///
    /// Returns the triggering error if preparing the export directory or
    /// reading any rotation file fails. Capture is restarted regardless.
    pub fn export(&self) -> EngineResult<PathBuf> {
        let mut worker = self.worker.lock();
        if let WorkerState::Running(handle) =
            std::mem::replace(&mut *worker, WorkerState::Stopped)
        {
            handle.stop_and_join();
        }

        let result = merge::merge_into(&self.dir.logs_dir(), &self.dir.export_path());

        // Capture must always resume after an export attempt.
        *worker = self.spawn_worker();

        result.map(|()| self.dir.export_path())
    }

    /// Returns the engine's current lifecycle state.
    ///
    /// `Running` only while a worker thread is actually alive; a worker
    /// that exited on its own reads as `Stopped`.
    pub fn state(&self) -> EngineState {
        match &*self.worker.lock() {
            WorkerState::Running(handle) if handle.is_alive() => EngineState::Running,
            _ => EngineState::Stopped,
        }
    }

    /// Whether a capture worker is currently alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Returns the storage root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.root()
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the process identifier capture is scoped to.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn spawn_worker(&self) -> WorkerState {
        let source = self.sources.create(self.pid);
        match WorkerHandle::spawn(source, self.dir.logs_dir(), &self.config) {
            Ok(handle) => WorkerState::Running(handle),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn capture worker");
                WorkerState::Stopped
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Don't leave a detached worker capturing into a root nobody owns.
        self.stop();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("root", &self.dir.root())
            .field("pid", &self.pid)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use logvault_source::{ScriptedFactory, ScriptedSource};
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    struct SharedFactory(Arc<ScriptedFactory>);

    impl SourceFactory for SharedFactory {
        fn create(&self, pid: u32) -> Box<dyn logvault_source::LogSource> {
            self.0.create(pid)
        }
    }

    fn factory() -> (Arc<ScriptedFactory>, Box<dyn SourceFactory>) {
        let factory = Arc::new(ScriptedFactory::new());
        (Arc::clone(&factory), Box::new(SharedFactory(factory)))
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(
                std::time::Instant::now() < deadline,
                "condition not met within timeout"
            );
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn rotation_contents(engine: &Engine) -> Vec<String> {
        crate::dir::files_by_modified(&engine.dir.logs_dir())
            .unwrap()
            .into_iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect()
    }

    #[test]
    fn open_starts_stopped_with_layout_created() {
        let temp = tempfile::tempdir().unwrap();
        let (_, sources) = factory();
        let engine = Engine::open(temp.path(), sources).unwrap();

        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(!engine.is_running());
        assert!(temp.path().join("logs").is_dir());
        assert!(temp.path().join("output").is_dir());
    }

    #[test]
    fn invalid_config_produces_no_engine() {
        let temp = tempfile::tempdir().unwrap();
        let (_, sources) = factory();
        let config = Config::new()
            .max_rotation_file_size(512)
            .max_directory_size(512);

        let result = Engine::open_with_config(temp.path(), config, sources);
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn second_engine_on_same_root_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let (_, sources_a) = factory();
        let (_, sources_b) = factory();

        let _engine = Engine::open(temp.path(), sources_a).unwrap();
        let result = Engine::open(temp.path(), sources_b);
        assert!(matches!(result, Err(EngineError::Locked)));
    }

    #[test]
    fn start_is_idempotent_while_worker_is_alive() {
        let temp = tempfile::tempdir().unwrap();
        let (probe_side, sources) = factory();

        let source = ScriptedSource::new().hold_open();
        let probe = source.probe();
        probe_side.push(source);

        let engine = Engine::open(temp.path(), sources).unwrap();
        engine.start();
        wait_for(|| engine.is_running());
        engine.start();
        engine.start();

        assert_eq!(probe_side.created_count(), 1);

        probe.release();
        engine.stop();
    }

    #[test]
    fn start_after_stop_creates_a_fresh_rotation_file() {
        let temp = tempfile::tempdir().unwrap();
        let (probe_side, sources) = factory();

        let first = ScriptedSource::with_lines(vec!["first worker".to_string()]);
        let second = ScriptedSource::with_lines(vec!["second worker".to_string()]);
        probe_side.push(first);
        probe_side.push(second);

        let engine = Engine::open(temp.path(), sources).unwrap();

        engine.start();
        wait_for(|| !engine.is_running());
        engine.stop();

        engine.start();
        wait_for(|| !engine.is_running());

        assert_eq!(probe_side.created_count(), 2);
        let contents = rotation_contents(&engine);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0], "first worker\n");
        assert_eq!(contents[1], "second worker\n");
    }

    #[test]
    fn dead_worker_is_replaced_by_start() {
        let temp = tempfile::tempdir().unwrap();
        let (probe_side, sources) = factory();
        probe_side.push(ScriptedSource::new());
        probe_side.push(ScriptedSource::new());

        let engine = Engine::open(temp.path(), sources).unwrap();

        engine.start();
        wait_for(|| !engine.is_running());
        // Engine still tags itself Running internally; start() must notice
        // the dead thread and respawn rather than no-op.
        engine.start();

        assert_eq!(probe_side.created_count(), 2);
    }

    #[test]
    fn export_merges_chronologically_and_resumes_capture() {
        let temp = tempfile::tempdir().unwrap();
        let (probe_side, sources) = factory();

        probe_side.push(ScriptedSource::with_lines(vec![
            "one".to_string(),
            "two".to_string(),
        ]));
        let resumed = ScriptedSource::new().hold_open();
        let resumed_probe = resumed.probe();
        probe_side.push(resumed);

        let engine = Engine::open(temp.path(), sources).unwrap();
        engine.start();
        wait_for(|| !engine.is_running());

        let export = engine.export().unwrap();

        assert_eq!(export, temp.path().join("output").join("logs.txt"));
        assert_eq!(fs::read_to_string(&export).unwrap(), "one\ntwo\n");
        assert!(engine.is_running());

        resumed_probe.release();
        engine.stop();
    }

    #[test]
    fn export_of_empty_rotation_set_is_an_empty_file() {
        let temp = tempfile::tempdir().unwrap();
        let (_, sources) = factory();
        let engine = Engine::open(temp.path(), sources).unwrap();

        let export = engine.export().unwrap();

        assert!(export.exists());
        assert_eq!(fs::read_to_string(&export).unwrap(), "");
    }

    #[test]
    fn failed_export_still_resumes_capture() {
        let temp = tempfile::tempdir().unwrap();
        let (probe_side, sources) = factory();
        let resumed = ScriptedSource::new().hold_open();
        let resumed_probe = resumed.probe();
        probe_side.push(resumed);

        let engine = Engine::open(temp.path(), sources).unwrap();

        // Sabotage the export directory: a plain file where the directory
        // should be makes create_dir_all fail.
        fs::remove_dir_all(temp.path().join("output")).unwrap();
        fs::write(temp.path().join("output"), b"not a directory").unwrap();

        let result = engine.export();

        assert!(result.is_err());
        assert!(engine.is_running());
        assert_eq!(probe_side.created_count(), 1);

        resumed_probe.release();
        engine.stop();
    }

    #[test]
    fn bounded_rotation_and_eviction_walkthrough() {
        let temp = tempfile::tempdir().unwrap();
        let (probe_side, sources) = factory();

        // Nine 40-byte lines (39 chars + newline) against a 100-byte file
        // cap and a 250-byte directory budget: rotation every 3 lines; the
        // seventh line pushes the directory past budget, so the eighth
        // line's check evicts the first file. Three files are created,
        // leaving two of 120 bytes each once the stream ends.
        let line = "x".repeat(39);
        probe_side.push(ScriptedSource::with_lines(vec![line; 9]));

        let config = Config::new()
            .max_rotation_file_size(100)
            .max_directory_size(250);
        let engine = Engine::open_with_config(temp.path(), config, sources).unwrap();

        engine.start();
        wait_for(|| !engine.is_running());

        let contents = rotation_contents(&engine);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].len(), 120);
        assert_eq!(contents[1].len(), 120);
        assert_eq!(
            crate::dir::directory_size(&temp.path().join("logs")).unwrap(),
            240
        );
    }
}
