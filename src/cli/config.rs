//! Config CLI commands

use clap::Subcommand;

use super::App;
use crate::config::Settings;
use crate::error::BkupResult;
use crate::shell;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show paths and settings
    Show,

    /// Set how many backups are kept per project (0 or less: unlimited)
    SetMax {
        #[arg(allow_negative_numbers = true)]
        max_versions: i64,
    },

    /// Open config.json in $VISUAL / $EDITOR
    Edit,
}

/// Handle a config command (`Show` when none is given)
pub fn handle_config_command(app: &App<'_>, cmd: Option<ConfigCommands>) -> BkupResult<()> {
    match cmd.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            let settings = app.settings()?;
            let limit = if settings.is_unbounded() {
                format!("{} (unlimited)", settings.max_versions)
            } else {
                settings.max_versions.to_string()
            };

            println!("bkup Configuration");
            println!("==================");
            println!("Backup root: {}", app.paths.base_dir().display());
            println!("Config file: {}", app.paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  max_versions: {}", limit);
            println!(
                "  prev_path:    {}",
                settings
                    .prev_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string())
            );
            println!(
                "  queue mode:   {}",
                if app.queue_mode { "on" } else { "off" }
            );
        }

        ConfigCommands::SetMax { max_versions } => {
            let mut settings = app.settings()?;
            settings.max_versions = max_versions;
            settings.save(app.fs, &app.paths)?;

            if settings.is_unbounded() {
                println!("max_versions set to {} (unlimited).", max_versions);
            } else {
                println!("max_versions set to {}.", max_versions);
            }
        }

        ConfigCommands::Edit => {
            let path = app.paths.settings_file();
            if !app.fs.exists(&path) {
                app.settings()?.save(app.fs, &app.paths)?;
            }

            shell::open_editor(app.ctx, &path)?;

            // Refuse to leave a config behind that later commands can't read
            Settings::load_or_default(app.fs, &app.paths)?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}
