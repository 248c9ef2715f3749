//! Path management for bkup
//!
//! Resolves the backup root and the per-project layout beneath it:
//!
//! ```text
//! <backupRoot>/
//!   config.json
//!   <project>_backup/
//!     <project>_<N>/
//!       .bkup_meta.json
//! ```
//!
//! ## Root Resolution Order
//!
//! 1. `BKUP_ROOT` environment variable (if set)
//! 2. `<home>/.bkup`

use std::path::{Path, PathBuf};

use crate::context::Context;

/// Name of the backup root under the home directory
pub const BACKUP_FOLDER_NAME: &str = ".bkup";

/// Name of the settings file at the backup root
pub const SETTINGS_FILE_NAME: &str = "config.json";

/// Manages all paths used by bkup
#[derive(Debug, Clone)]
pub struct BkupPaths {
    /// Base directory for all backups
    base_dir: PathBuf,
}

impl BkupPaths {
    /// Resolve the backup root from the invocation context
    pub fn from_context(ctx: &Context) -> Self {
        let base_dir = match ctx.var("BKUP_ROOT") {
            Some(custom) => ctx.absolute(custom),
            None => ctx.home_dir().join(BACKUP_FOLDER_NAME),
        };
        Self { base_dir }
    }

    /// Create BkupPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the backup root (~/.bkup/ or the override)
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join(SETTINGS_FILE_NAME)
    }

    /// Get the directory holding every slot of `project`
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.base_dir.join(format!("{}_backup", project))
    }

    /// Get the directory of slot `slot` of `project`
    pub fn slot_dir(&self, project: &str, slot: u32) -> PathBuf {
        self.project_dir(project).join(slot_dir_name(project, slot))
    }
}

/// Directory name of a slot: `<project>_<N>`
pub fn slot_dir_name(project: &str, slot: u32) -> String {
    format!("{}_{}", project, slot)
}

/// Parse a directory name back into a slot number
///
/// Only canonical decimal suffixes are accepted, so `x_01` is not mistaken
/// for slot 1 of `x`.
pub fn parse_slot_dir_name(project: &str, dir_name: &str) -> Option<u32> {
    let digits = dir_name.strip_prefix(project)?.strip_prefix('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_is_under_home() {
        let ctx = Context::new("/home/ada", "/work");
        let paths = BkupPaths::from_context(&ctx);
        assert_eq!(paths.base_dir(), Path::new("/home/ada/.bkup"));
    }

    #[test]
    fn test_env_var_override() {
        let ctx = Context::new("/home/ada", "/work").with_env("BKUP_ROOT", "../store");
        let paths = BkupPaths::from_context(&ctx);
        assert_eq!(paths.base_dir(), Path::new("/store"));
    }

    #[test]
    fn test_layout() {
        let paths = BkupPaths::with_base_dir(PathBuf::from("/b"));

        assert_eq!(paths.settings_file(), PathBuf::from("/b/config.json"));
        assert_eq!(paths.project_dir("app"), PathBuf::from("/b/app_backup"));
        assert_eq!(paths.slot_dir("app", 3), PathBuf::from("/b/app_backup/app_3"));
    }

    #[test]
    fn test_parse_slot_dir_name() {
        assert_eq!(parse_slot_dir_name("app", "app_0"), Some(0));
        assert_eq!(parse_slot_dir_name("app", "app_12"), Some(12));
        assert_eq!(parse_slot_dir_name("my_app", "my_app_7"), Some(7));

        assert_eq!(parse_slot_dir_name("app", "app_"), None);
        assert_eq!(parse_slot_dir_name("app", "app_x1"), None);
        assert_eq!(parse_slot_dir_name("app", "app_1b"), None);
        assert_eq!(parse_slot_dir_name("app", "app_01"), None);
        assert_eq!(parse_slot_dir_name("app", "app-1"), None);
        assert_eq!(parse_slot_dir_name("app", "other_1"), None);
        assert_eq!(parse_slot_dir_name("app", "app_99999999999"), None);
        assert_eq!(parse_slot_dir_name("app", ".app_1.incoming-1234"), None);
    }
}
