//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup layer.

pub mod backup;
pub mod config;
pub mod navigate;

pub use backup::{handle_clean, handle_create, handle_list, handle_pull};
pub use config::{handle_config_command, ConfigCommands};
pub use navigate::{handle_go, handle_revert};

use crate::backup::{BackupManager, CapacityPolicy, Project};
use crate::config::{BkupPaths, Settings};
use crate::context::Context;
use crate::error::BkupResult;
use crate::fs::FileSystem;

/// Everything a command handler needs for one invocation
pub struct App<'a> {
    pub ctx: &'a Context,
    pub fs: &'a dyn FileSystem,
    pub paths: BkupPaths,
    /// Overwrite the oldest slot instead of refusing when full
    pub queue_mode: bool,
}

impl<'a> App<'a> {
    pub fn new(ctx: &'a Context, fs: &'a dyn FileSystem, queue_mode: bool) -> Self {
        Self {
            ctx,
            fs,
            paths: BkupPaths::from_context(ctx),
            queue_mode,
        }
    }

    pub fn settings(&self) -> BkupResult<Settings> {
        Settings::load_or_default(self.fs, &self.paths)
    }

    pub fn policy(&self, settings: &Settings) -> CapacityPolicy {
        CapacityPolicy::new(settings.max_versions, self.queue_mode)
    }

    /// The project for the working directory
    pub fn project(&self) -> BkupResult<Project> {
        Project::current(self.ctx)
    }

    pub fn manager(&self) -> BackupManager<'a> {
        BackupManager::new(self.fs, self.paths.clone())
    }
}
