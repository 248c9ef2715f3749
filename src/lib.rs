//! bkup - versioned directory backups
//!
//! This library provides the core functionality for the `bkup` tool: copying
//! a directory tree into numbered backup slots, choosing which slot the next
//! backup goes into, and restoring ("pulling") a slot back over the live
//! directory with a safety backup taken first.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `backup`: Slot metadata, catalog, allocation, writing and restore
//! - `cli`: Command handlers behind the `bkup` binary
//! - `config`: Backup root layout and `config.json` settings
//! - `context`: Explicit home/cwd/environment snapshot
//! - `display`: Terminal formatting
//! - `error`: Custom error types
//! - `fs`: Filesystem capability (real and in-memory)
//! - `shell`: Subshell and editor launching
//! - `storage`: Atomic JSON file I/O
//!
//! # Example
//!
//! ```rust,ignore
//! use bkup::config::{BkupPaths, Settings};
//! use bkup::context::Context;
//! use bkup::fs::RealFs;
//!
//! let ctx = Context::from_process()?;
//! let paths = BkupPaths::from_context(&ctx);
//! let settings = Settings::load_or_default(&RealFs, &paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod fs;
pub mod shell;
pub mod storage;

pub use error::{BkupError, BkupResult};
