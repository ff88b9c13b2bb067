//! # Logvault Source
//!
//! Log source trait and implementations for Logvault.
//!
//! This crate provides the lowest-level abstraction of the capture engine:
//! the collaborator that yields raw log lines. Sources are **opaque line
//! streams** - the engine does not know (or care) where the lines come from.
//!
//! ## Design Principles
//!
//! - Sources yield one line at a time from a blocking stream until closed
//!   or exhausted
//! - A source is scoped to a single process identifier at creation
//! - The engine owns all persistence; sources do not touch the disk
//! - Must be `Send` so a capture worker can own one on its own thread
//!
//! ## Available Sources
//!
//! - [`ScriptedSource`] - For testing, yields a predetermined line sequence
//! - [`CommandSource`] - Reads the stdout of an external log command
//!
//! ## Example
//!
//! ```rust
//! use logvault_source::{LogSource, ScriptedSource};
//!
//! let mut source = ScriptedSource::with_lines(vec!["a".into(), "b".into()]);
//! let mut stream = source.open().unwrap();
//! assert_eq!(stream.next_line().unwrap(), Some("a".to_string()));
//! assert_eq!(stream.next_line().unwrap(), Some("b".to_string()));
//! assert_eq!(stream.next_line().unwrap(), None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod error;
mod scripted;
mod source;

pub use command::{CommandSource, CommandSourceFactory};
pub use error::{SourceError, SourceResult};
pub use scripted::{ScriptedFactory, ScriptedSource, SourceProbe};
pub use source::{LineStream, LogSource, SourceFactory};
