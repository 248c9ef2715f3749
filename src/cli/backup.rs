//! Backup CLI commands
//!
//! Implements creating, listing, pulling and cleaning backups.

use chrono::Utc;

use super::App;
use crate::backup::{ProtectedSlots, RestoreManager};
use crate::display::format_slot_list;
use crate::error::BkupResult;

/// Back up the working directory into the next slot
pub fn handle_create(app: &App<'_>) -> BkupResult<()> {
    let settings = app.settings()?;
    let project = app.project()?;

    let outcome = app.manager().create_backup(
        &project,
        &app.policy(&settings),
        &ProtectedSlots::none(),
        Utc::now(),
    )?;

    if let Some(old) = &outcome.evicted {
        eprintln!(
            "Overwrote oldest backup (slot {}, created {})",
            old.slot_number,
            old.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("{}", outcome.path.display());
    Ok(())
}

/// List the working directory's backups
pub fn handle_list(app: &App<'_>) -> BkupResult<()> {
    let project = app.project()?;
    let slots = app.manager().list_backups(&project)?;

    println!("{}", format_slot_list(project.name(), &slots, Utc::now()));
    if slots.is_empty() {
        println!("Create one with: bkup");
    }
    Ok(())
}

/// Restore the working directory from slot `slot`
pub fn handle_pull(app: &App<'_>, slot: u32) -> BkupResult<()> {
    let settings = app.settings()?;
    let project = app.project()?;

    let restore = RestoreManager::new(app.fs, app.paths.clone());
    let result = restore.pull(&project, slot, &app.policy(&settings), Utc::now())?;

    if let Some(old) = &result.safety_backup.evicted {
        eprintln!(
            "Overwrote oldest backup (slot {}) to save the current state",
            old.slot_number
        );
    }
    println!("{}", result.summary());
    println!("Pre-pull backup: {}", result.safety_backup.path.display());
    Ok(())
}

/// Delete backups: everything but `config.json`, or one project's slots
pub fn handle_clean(app: &App<'_>, project_only: bool) -> BkupResult<()> {
    let manager = app.manager();

    if project_only {
        let project = app.project()?;
        let removed = manager.clean_project(&project)?;
        println!("Removed {} backup(s) of '{}'.", removed, project.name());
        return Ok(());
    }

    let result = manager.clean_all()?;
    if result.kept_config {
        println!(
            "Cleaned {} item(s). Kept {}.",
            result.removed,
            app.paths.settings_file().display()
        );
    } else {
        println!(
            "Cleaned {} item(s). (No {} present to keep.)",
            result.removed,
            crate::config::paths::SETTINGS_FILE_NAME
        );
    }
    Ok(())
}
