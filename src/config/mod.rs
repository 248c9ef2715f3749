//! Configuration module for bkup
//!
//! This module provides configuration management including:
//! - Backup root and per-project path layout
//! - `config.json` settings persistence

pub mod paths;
pub mod settings;

pub use paths::BkupPaths;
pub use settings::Settings;
