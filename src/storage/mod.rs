//! Storage layer for bkup
//!
//! Provides JSON file storage with atomic writes on top of the
//! [`FileSystem`](crate::fs::FileSystem) capability.

pub mod file_io;

pub use file_io::{read_json, write_json_atomic};
