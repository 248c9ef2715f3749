//! Navigation commands
//!
//! `go` jumps into the newest backup of the working directory and remembers
//! where it came from; `revert` jumps back.

use std::path::PathBuf;

use chrono::Utc;

use super::App;
use crate::backup::ProtectedSlots;
use crate::error::{BkupError, BkupResult};
use crate::shell;

/// Resolve the newest backup (creating one only if none exist, or when
/// `fresh`), record the working directory, then enter or print the backup
pub fn handle_go(app: &App<'_>, print: bool, fresh: bool) -> BkupResult<()> {
    let mut settings = app.settings()?;
    let project = app.project()?;
    let manager = app.manager();

    let existing = if fresh {
        None
    } else {
        manager.newest_backup(&project)?
    };

    let target: PathBuf = match existing {
        Some(slot) => slot.path,
        None => {
            let outcome = manager.create_backup(
                &project,
                &app.policy(&settings),
                &ProtectedSlots::none(),
                Utc::now(),
            )?;
            outcome.path
        }
    };

    settings.prev_path = project.root().display().to_string();
    settings.save(app.fs, &app.paths)?;

    if print {
        println!("{}", target.display());
        return Ok(());
    }
    shell::open_subshell(app.ctx, &target)
}

/// Enter or print the directory recorded by the last `go`
pub fn handle_revert(app: &App<'_>, print: bool) -> BkupResult<()> {
    let settings = app.settings()?;
    let prev = settings.prev_path().ok_or_else(|| BkupError::NotFound {
        entity_type: "Previous directory",
        identifier: "prev_path is empty (run `bkup go` first)".to_string(),
    })?;

    if print {
        println!("{}", prev.display());
        return Ok(());
    }
    shell::open_subshell(app.ctx, &prev)
}
