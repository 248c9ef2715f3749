//! Project identity
//!
//! A project is not stored anywhere; it is the base name of the directory
//! being backed up, derived each time from its absolute path.

use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::error::{BkupError, BkupResult};

/// A directory being backed up, identified by its base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    root: PathBuf,
}

impl Project {
    /// Derive the project for `dir`, resolved against the context's cwd
    pub fn from_dir(ctx: &Context, dir: impl AsRef<Path>) -> BkupResult<Self> {
        let root = ctx.absolute(dir);
        let name = root
            .file_name()
            .ok_or_else(|| {
                BkupError::Validation(format!("{} has no directory name to back up under", root.display()))
            })?
            .to_str()
            .ok_or_else(|| {
                BkupError::Validation(format!("{} is not valid UTF-8", root.display()))
            })?
            .to_string();

        Ok(Self { name, root })
    }

    /// The project for the context's working directory
    pub fn current(ctx: &Context) -> BkupResult<Self> {
        Self::from_dir(ctx, ctx.cwd())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the live directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
