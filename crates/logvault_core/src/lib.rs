//! # Logvault Core
//!
//! Capture, rotation, eviction and merge engine for Logvault.
//!
//! This crate provides:
//! - A background capture worker that persists a live log stream
//! - Size-based rotation of the current log file
//! - Budget-based eviction of the oldest rotation file
//! - On-demand merging of the rotation set into one chronological export
//!
//! The engine is a best-effort background logger: capture failures stop the
//! worker and are reported only through `tracing` diagnostics, while export
//! outcomes are surfaced through [`Engine::export`]'s result.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logvault_core::Engine;
//! use logvault_source::CommandSourceFactory;
//! use std::path::Path;
//!
//! # fn main() -> logvault_core::EngineResult<()> {
//! let engine = Engine::open(
//!     Path::new("/data/logvault"),
//!     Box::new(CommandSourceFactory::logcat()),
//! )?;
//! engine.start();
//! let export = engine.export()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod capture;
mod config;
mod dir;
mod engine;
mod error;
mod merge;
mod policy;

pub use config::{Config, DEFAULT_MAX_DIRECTORY_SIZE, DEFAULT_MAX_ROTATION_FILE_SIZE};
pub use dir::{directory_size, files_by_modified, oldest_file, CaptureDir};
pub use engine::{Engine, EngineState};
pub use error::{EngineError, EngineResult};
pub use policy::{should_evict, should_rotate};

/// Crate version, for tooling output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
