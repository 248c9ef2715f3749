//! Invocation context
//!
//! Everything bkup would otherwise read from the process (home directory,
//! working directory, environment variables) is captured once in `main` and
//! passed explicitly into every entry point.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{BkupError, BkupResult};

/// Snapshot of the process state an invocation depends on
#[derive(Debug, Clone)]
pub struct Context {
    home_dir: PathBuf,
    cwd: PathBuf,
    env: HashMap<String, String>,
}

impl Context {
    /// Create a context with an empty environment
    pub fn new(home_dir: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            cwd: cwd.into(),
            env: HashMap::new(),
        }
    }

    /// Capture the current process state
    ///
    /// # Errors
    ///
    /// Returns an error if the home or working directory cannot be determined.
    pub fn from_process() -> BkupResult<Self> {
        let home_dir = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or_else(|| BkupError::Config("Could not determine home directory".into()))?;

        let cwd = std::env::current_dir().map_err(|e| {
            BkupError::Config(format!("Could not determine working directory: {}", e))
        })?;

        Ok(Self {
            home_dir,
            cwd,
            env: std::env::vars().collect(),
        })
    }

    /// Set an environment variable in this context (builder style)
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Look up an environment variable, treating empty values as unset
    pub fn var(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Resolve `path` against the working directory and normalize it lexically
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        normalize(&joined)
    }
}

/// Remove `.` components and fold `..` into their parent without touching the disk
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if out.file_name().is_some() {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_ignores_empty_values() {
        let ctx = Context::new("/home/u", "/work")
            .with_env("BKUP_ROOT", "")
            .with_env("SHELL", "/bin/zsh");

        assert_eq!(ctx.var("BKUP_ROOT"), None);
        assert_eq!(ctx.var("SHELL"), Some("/bin/zsh"));
        assert_eq!(ctx.var("MISSING"), None);
    }

    #[test]
    fn test_absolute_joins_relative_paths() {
        let ctx = Context::new("/home/u", "/work/projects");
        assert_eq!(ctx.absolute("app"), PathBuf::from("/work/projects/app"));
        assert_eq!(ctx.absolute("/etc/app"), PathBuf::from("/etc/app"));
    }

    #[test]
    fn test_absolute_normalizes_dots() {
        let ctx = Context::new("/home/u", "/work/projects/app");
        assert_eq!(ctx.absolute("."), PathBuf::from("/work/projects/app"));
        assert_eq!(ctx.absolute("../lib/./src"), PathBuf::from("/work/projects/lib/src"));
        assert_eq!(ctx.absolute("/../.."), PathBuf::from("/"));
    }
}
