//! Scripted in-memory log source for testing.

use crate::error::{SourceError, SourceResult};
use crate::source::{LineStream, LogSource, SourceFactory};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Observation state shared between a scripted source and its probe.
#[derive(Debug, Default)]
struct Shared {
    state: Mutex<SharedState>,
    unblock: Condvar,
}

#[derive(Debug, Default)]
struct SharedState {
    cleared: usize,
    opened: usize,
    closed: usize,
    released: bool,
}

/// A handle for observing and steering a [`ScriptedSource`] from a test.
///
/// The probe counts `clear`/`open`/`close` calls and can release a stream
/// that is blocked waiting for more lines (see
/// [`ScriptedSource::hold_open`]).
#[derive(Debug, Clone)]
pub struct SourceProbe {
    shared: Arc<Shared>,
}

impl SourceProbe {
    /// Number of times `clear()` was called.
    #[must_use]
    pub fn cleared_count(&self) -> usize {
        self.shared.state.lock().cleared
    }

    /// Number of times `open()` was called.
    #[must_use]
    pub fn opened_count(&self) -> usize {
        self.shared.state.lock().opened
    }

    /// Number of times `close()` was called.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.shared.state.lock().closed
    }

    /// Unblocks a stream that is held open, making it report end-of-stream.
    pub fn release(&self) {
        self.shared.state.lock().released = true;
        self.shared.unblock.notify_all();
    }
}

/// A deterministic log source for tests.
///
/// Yields a predetermined sequence of lines, then either reports
/// end-of-stream or, with [`hold_open`](Self::hold_open), blocks like a live
/// source until released or closed. A read error can be injected after a
/// given number of lines to exercise the capture loop's failure exit.
///
/// # Example
///
/// ```rust
/// use logvault_source::{LogSource, ScriptedSource};
///
/// let mut source = ScriptedSource::with_lines(vec!["one".into()]);
/// let probe = source.probe();
/// source.clear().unwrap();
/// assert_eq!(probe.cleared_count(), 1);
/// ```
#[derive(Debug)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
    fail_after: Option<usize>,
    hold_open: bool,
    shared: Arc<Shared>,
}

impl ScriptedSource {
    /// Creates a source with no lines.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lines(Vec::new())
    }

    /// Creates a source that yields the given lines in order.
    #[must_use]
    pub fn with_lines(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into(),
            fail_after: None,
            hold_open: false,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Injects a read error after `count` lines have been yielded.
    #[must_use]
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Keeps the stream blocked after the scripted lines run out, like a
    /// live source that has gone quiet, until the probe releases it or the
    /// source is closed.
    #[must_use]
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Returns a probe observing this source.
    #[must_use]
    pub fn probe(&self) -> SourceProbe {
        SourceProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSource for ScriptedSource {
    fn clear(&mut self) -> SourceResult<()> {
        self.shared.state.lock().cleared += 1;
        Ok(())
    }

    fn open(&mut self) -> SourceResult<Box<dyn LineStream>> {
        self.shared.state.lock().opened += 1;
        Ok(Box::new(ScriptedStream {
            lines: std::mem::take(&mut self.lines),
            fail_after: self.fail_after,
            hold_open: self.hold_open,
            shared: Arc::clone(&self.shared),
        }))
    }

    fn close(&mut self) -> SourceResult<()> {
        let mut state = self.shared.state.lock();
        state.closed += 1;
        state.released = true;
        drop(state);
        self.shared.unblock.notify_all();
        Ok(())
    }
}

struct ScriptedStream {
    lines: VecDeque<String>,
    fail_after: Option<usize>,
    hold_open: bool,
    shared: Arc<Shared>,
}

impl LineStream for ScriptedStream {
    fn next_line(&mut self) -> SourceResult<Option<String>> {
        if self.fail_after == Some(0) {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scripted read failure",
            )));
        }

        if let Some(line) = self.lines.pop_front() {
            if let Some(remaining) = &mut self.fail_after {
                *remaining -= 1;
            }
            return Ok(Some(line));
        }

        if self.hold_open {
            let mut state = self.shared.state.lock();
            while !state.released {
                self.shared.unblock.wait(&mut state);
            }
        }

        Ok(None)
    }
}

/// Factory that hands out pre-built [`ScriptedSource`] instances.
///
/// Sources are dispensed in push order, one per worker spawn; once the queue
/// is empty the factory produces empty sources that end immediately. The
/// process identifier is ignored - scripted lines are not scoped.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    queue: Mutex<VecDeque<ScriptedSource>>,
    created: Mutex<usize>,
}

impl ScriptedFactory {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a source to be dispensed by a future `create` call.
    pub fn push(&self, source: ScriptedSource) {
        self.queue.lock().push_back(source);
    }

    /// Number of sources created so far.
    #[must_use]
    pub fn created_count(&self) -> usize {
        *self.created.lock()
    }
}

impl SourceFactory for ScriptedFactory {
    fn create(&self, _pid: u32) -> Box<dyn LogSource> {
        *self.created.lock() += 1;
        let source = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(ScriptedSource::new);
        Box::new(source)
    }
}
