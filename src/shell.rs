//! Interactive subshell and editor launching
//!
//! Program selection is resolved from the [`Context`] so it can be tested;
//! spawning itself just hands the terminal to the child and waits.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::context::Context;
use crate::error::{BkupError, BkupResult};

/// A program plus its leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub path: String,
    pub args: Vec<String>,
}

impl Program {
    fn new(path: impl Into<String>, args: &[&str]) -> Self {
        Self {
            path: path.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// The login shell to open: `$SHELL -l`, else `/bin/sh -l`
#[cfg(not(windows))]
pub fn default_shell(ctx: &Context) -> Program {
    match ctx.var("SHELL") {
        Some(shell) => Program::new(shell, &["-l"]),
        None => Program::new("/bin/sh", &["-l"]),
    }
}

/// The shell to open: PowerShell 7, then Windows PowerShell, then cmd
#[cfg(windows)]
pub fn default_shell(ctx: &Context) -> Program {
    for candidate in ["pwsh.exe", "powershell.exe"] {
        if let Some(found) = find_on_path(ctx, candidate) {
            return Program::new(found, &["-NoLogo"]);
        }
    }
    Program::new("cmd.exe", &[])
}

#[cfg(windows)]
fn find_on_path(ctx: &Context, name: &str) -> Option<String> {
    let path = ctx.var("PATH")?;
    std::env::split_paths(path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .map(|p| p.display().to_string())
}

/// The editor to open: `$VISUAL`, then `$EDITOR`, then a platform default
pub fn default_editor(ctx: &Context) -> Program {
    let fallback = if cfg!(windows) { "notepad" } else { "vi" };
    let editor = ctx
        .var("VISUAL")
        .or_else(|| ctx.var("EDITOR"))
        .unwrap_or(fallback);

    // EDITOR may carry flags, e.g. "code --wait"
    let mut parts = editor.split_whitespace();
    let path = parts.next().unwrap_or(fallback).to_string();
    Program {
        path,
        args: parts.map(str::to_string).collect(),
    }
}

/// Open an interactive shell in `dir` and wait for it to exit
pub fn open_subshell(ctx: &Context, dir: &Path) -> BkupResult<()> {
    if !dir.is_dir() {
        return Err(BkupError::Shell(format!("not a directory: {}", dir.display())));
    }

    let shell = default_shell(ctx);
    println!("Entering subshell in: {}", dir.display());
    println!("(exit to return)");
    debug!(shell = %shell.path, dir = %dir.display(), "spawning subshell");

    run(&shell, None, Some(dir))
}

/// Open `file` in the user's editor and wait for it to exit
pub fn open_editor(ctx: &Context, file: &Path) -> BkupResult<()> {
    let editor = default_editor(ctx);
    debug!(editor = %editor.path, file = %file.display(), "spawning editor");
    run(&editor, Some(file), None)
}

fn run(program: &Program, arg: Option<&Path>, dir: Option<&Path>) -> BkupResult<()> {
    let mut cmd = Command::new(&program.path);
    cmd.args(&program.args);
    if let Some(arg) = arg {
        cmd.arg(arg);
    }
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let status = cmd
        .status()
        .map_err(|e| BkupError::Shell(format!("failed to start {}: {}", program.path, e)))?;

    // A shell's exit code reflects the last command the user ran there
    debug!(status = %status, program = %program.path, "child exited");
    Ok(())
}
