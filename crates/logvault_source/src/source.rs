//! Log source trait definitions.

use crate::error::SourceResult;

/// A live, line-oriented log source for the capture engine.
///
/// Sources are **opaque line streams**. They provide three operations: a
/// one-shot discard of previously buffered content, a blocking line stream,
/// and a teardown that releases whatever the stream is backed by. The capture
/// engine owns all persistence - sources never touch the rotation directory.
///
/// # Invariants
///
/// - `open` may be called once per source; the returned stream yields lines
///   until the source is exhausted or closed
/// - `clear` is best-effort: a failure leaves the source usable
/// - `close` releases the underlying resources and unblocks a pending read;
///   it must be safe to call more than once
/// - Sources must be `Send` so a capture worker can own one on its thread
///
/// # Implementors
///
/// - [`super::ScriptedSource`] - For testing
/// - [`super::CommandSource`] - For reading an external log command
pub trait LogSource: Send {
    /// Discards content the source buffered before capture began.
    ///
    /// Called once when a capture worker starts, so the first rotation file
    /// begins at "now" rather than replaying history.
    ///
    /// # Errors
    ///
    /// Returns an error if the discard fails. Callers treat this as
    /// non-fatal.
    fn clear(&mut self) -> SourceResult<()>;

    /// Opens the blocking line stream.
    ///
    /// The stream is scoped to the process identifier the source was created
    /// for; lines from other processes are not yielded.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be established.
    fn open(&mut self) -> SourceResult<Box<dyn LineStream>>;

    /// Terminates the stream's underlying resources.
    ///
    /// After this returns, a blocked [`LineStream::next_line`] call observes
    /// end-of-stream or an error rather than blocking forever.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails; callers log and continue.
    fn close(&mut self) -> SourceResult<()>;
}

/// A blocking iterator over log lines.
pub trait LineStream: Send {
    /// Reads the next line, blocking until one is available.
    ///
    /// Returns `Ok(None)` when the source is exhausted. The returned line
    /// does not include a trailing terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn next_line(&mut self) -> SourceResult<Option<String>>;
}

/// Mints one fresh [`LogSource`] per capture worker.
///
/// Each `start()` of the engine spawns a new worker, and each worker needs
/// its own source instance; the factory is the seam that supplies them.
pub trait SourceFactory: Send + Sync {
    /// Creates a source scoped to the given process identifier.
    fn create(&self, pid: u32) -> Box<dyn LogSource>;
}
