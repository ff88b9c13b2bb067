//! External-command log source.

use crate::error::{SourceError, SourceResult};
use crate::source::{LineStream, LogSource, SourceFactory};
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

/// A log source backed by an external log command.
///
/// The source spawns the configured command (by default `logcat`) with its
/// stdout piped, and yields only the lines carrying the owning process's
/// `(<pid>)` marker. `clear()` runs the configured clear command (by default
/// `logcat -c`) to discard previously buffered output, and `close()` kills
/// the child process, which unblocks any pending read with end-of-stream.
///
/// # Example
///
/// ```rust,no_run
/// use logvault_source::{CommandSource, LogSource};
///
/// let mut source = CommandSource::logcat(std::process::id());
/// let mut stream = source.open().unwrap();
/// while let Some(line) = stream.next_line().unwrap() {
///     println!("{line}");
/// }
/// source.close().unwrap();
/// ```
#[derive(Debug)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    clear_command: Option<(String, Vec<String>)>,
    pid_marker: Option<String>,
    child: Option<Child>,
    opened: bool,
}

impl CommandSource {
    /// Creates a source that reads `logcat`, scoped to the given pid.
    ///
    /// `clear()` will run `logcat -c`.
    #[must_use]
    pub fn logcat(pid: u32) -> Self {
        Self::new(
            "logcat",
            Vec::new(),
            Some(("logcat".to_string(), vec!["-c".to_string()])),
            pid,
        )
    }

    /// Creates a source that reads an arbitrary command's stdout.
    ///
    /// # Arguments
    ///
    /// * `program` - The log command to spawn
    /// * `args` - Arguments for the log command
    /// * `clear_command` - Optional command run by `clear()`
    /// * `pid` - Process identifier the stream is scoped to
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        clear_command: Option<(String, Vec<String>)>,
        pid: u32,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            clear_command,
            pid_marker: Some(format!("({pid})")),
            child: None,
            opened: false,
        }
    }

    /// Creates a source that yields every line of the command's stdout,
    /// without pid scoping.
    ///
    /// Meant for commands that already emit exactly the stream of interest.
    pub fn unscoped(
        program: impl Into<String>,
        args: Vec<String>,
        clear_command: Option<(String, Vec<String>)>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            clear_command,
            pid_marker: None,
            child: None,
            opened: false,
        }
    }
}

impl LogSource for CommandSource {
    fn clear(&mut self) -> SourceResult<()> {
        let Some((program, args)) = &self.clear_command else {
            return Ok(());
        };

        // Best-effort: a non-zero exit is not a failure, only a spawn error is.
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| SourceError::spawn(program.clone(), e.to_string()))?;
        Ok(())
    }

    fn open(&mut self) -> SourceResult<Box<dyn LineStream>> {
        if self.opened {
            return Err(SourceError::spawn(
                self.program.clone(),
                "source already opened",
            ));
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SourceError::spawn(self.program.clone(), e.to_string()))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SourceError::spawn(self.program.clone(), "child has no stdout handle")
        })?;

        self.child = Some(child);
        self.opened = true;

        Ok(Box::new(CommandStream {
            reader: BufReader::new(stdout),
            pid_marker: self.pid_marker.clone(),
        }))
    }

    fn close(&mut self) -> SourceResult<()> {
        if let Some(mut child) = self.child.take() {
            // The child may already have exited; only reap errors matter.
            let _ = child.kill();
            child.wait()?;
        }
        Ok(())
    }
}

impl Drop for CommandSource {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Blocking stream over the child's stdout, filtered to the pid marker
/// when one is set.
struct CommandStream {
    reader: BufReader<ChildStdout>,
    pid_marker: Option<String>,
}

impl LineStream for CommandStream {
    fn next_line(&mut self) -> SourceResult<Option<String>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = self.reader.read_line(&mut buf)?;
            if n == 0 {
                return Ok(None);
            }

            if let Some(marker) = &self.pid_marker {
                if !buf.contains(marker) {
                    continue;
                }
            }

            while buf.ends_with('\n') || buf.ends_with('\r') {
                buf.pop();
            }
            return Ok(Some(buf.clone()));
        }
    }
}

/// Factory that mints [`CommandSource`] instances.
///
/// One source is created per capture worker spawn, each scoped to the pid
/// the engine was built for.
#[derive(Debug, Clone)]
pub struct CommandSourceFactory {
    program: String,
    args: Vec<String>,
    clear_command: Option<(String, Vec<String>)>,
    scoped: bool,
}

impl CommandSourceFactory {
    /// Creates a factory for the default `logcat` command.
    #[must_use]
    pub fn logcat() -> Self {
        Self {
            program: "logcat".to_string(),
            args: Vec::new(),
            clear_command: Some(("logcat".to_string(), vec!["-c".to_string()])),
            scoped: true,
        }
    }

    /// Creates a factory for an arbitrary log command with pid scoping.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        clear_command: Option<(String, Vec<String>)>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            clear_command,
            scoped: true,
        }
    }

    /// Creates a factory running a shell command whose whole output is the
    /// stream of interest; the process identifier is ignored.
    pub fn sh(command: impl Into<String>) -> Self {
        Self {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), command.into()],
            clear_command: None,
            scoped: false,
        }
    }
}

impl SourceFactory for CommandSourceFactory {
    fn create(&self, pid: u32) -> Box<dyn LogSource> {
        if self.scoped {
            Box::new(CommandSource::new(
                self.program.clone(),
                self.args.clone(),
                self.clear_command.clone(),
                pid,
            ))
        } else {
            Box::new(CommandSource::unscoped(
                self.program.clone(),
                self.args.clone(),
                self.clear_command.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn stream_filters_to_pid_marker() {
        let script = "printf 'I (42) keep me\\nI (7) drop me\\nW (42) also mine\\n'";
        let mut source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), script.to_string()],
            None,
            42,
        );

        let mut stream = source.open().unwrap();
        assert_eq!(
            stream.next_line().unwrap(),
            Some("I (42) keep me".to_string())
        );
        assert_eq!(
            stream.next_line().unwrap(),
            Some("W (42) also mine".to_string())
        );
        assert_eq!(stream.next_line().unwrap(), None);

        source.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn exhausted_stream_yields_none_repeatedly() {
        let mut source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), "printf '(1) only\\n'".to_string()],
            None,
            1,
        );

        let mut stream = source.open().unwrap();
        assert!(stream.next_line().unwrap().is_some());
        assert_eq!(stream.next_line().unwrap(), None);
        assert_eq!(stream.next_line().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn clear_runs_configured_command() {
        let mut source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), "true".to_string()],
            Some(("true".to_string(), Vec::new())),
            1,
        );

        assert!(source.clear().is_ok());
    }

    #[test]
    fn clear_without_command_is_noop() {
        let mut source = CommandSource::new("whatever", Vec::new(), None, 1);
        assert!(source.clear().is_ok());
    }

    #[test]
    fn spawn_failure_is_reported() {
        let mut source =
            CommandSource::new("logvault-no-such-command", Vec::new(), None, 1);
        let result = source.open();
        assert!(matches!(result, Err(SourceError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn second_open_fails() {
        let mut source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), "true".to_string()],
            None,
            1,
        );

        let _stream = source.open().unwrap();
        assert!(source.open().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn close_is_idempotent() {
        let mut source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), "sleep 30".to_string()],
            None,
            1,
        );

        let _stream = source.open().unwrap();
        source.close().unwrap();
        source.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn unscoped_source_yields_every_line() {
        let mut source = CommandSource::unscoped(
            "sh",
            vec!["-c".to_string(), "printf 'one\\ntwo\\n'".to_string()],
            None,
        );

        let mut stream = source.open().unwrap();
        assert_eq!(stream.next_line().unwrap(), Some("one".to_string()));
        assert_eq!(stream.next_line().unwrap(), Some("two".to_string()));
        assert_eq!(stream.next_line().unwrap(), None);
    }

    #[test]
    fn factory_creates_scoped_sources() {
        let factory = CommandSourceFactory::new("cat", Vec::new(), None);
        let _a = factory.create(1);
        let _b = factory.create(2);
    }
}
