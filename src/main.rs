use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bkup::cli::{
    handle_clean, handle_config_command, handle_create, handle_go, handle_list, handle_pull,
    handle_revert, App, ConfigCommands,
};
use bkup::context::Context;
use bkup::fs::{FileSystem, RealFs};

#[derive(Parser)]
#[command(
    name = "bkup",
    version,
    about = "Versioned backups of the current directory",
    long_about = "bkup copies the current directory into numbered slots under \
                  ~/.bkup/<dirname>_backup/ (or $BKUP_ROOT). Slots are numbered \
                  0..max_versions; when they are full bkup refuses, or with --queue \
                  overwrites the oldest backup. Run without a subcommand to back up."
)]
struct Cli {
    /// Overwrite the oldest backup instead of refusing when all slots are full
    #[arg(long, global = true, env = "BKUP_QUEUE", value_parser = BoolishValueParser::new())]
    queue: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a subshell in the newest backup (backing up first only if none exist)
    Go {
        /// Print the backup directory instead of opening a subshell
        #[arg(long)]
        print: bool,
        /// Always take a new backup first
        #[arg(long)]
        fresh: bool,
    },

    /// Open a subshell in the directory the last `go` left
    Revert {
        /// Print the directory instead of opening a subshell
        #[arg(long)]
        print: bool,
    },

    /// Delete all backups (config.json is kept)
    Clean {
        /// Only delete the backups of the current directory
        #[arg(long)]
        project: bool,
    },

    /// List the current directory's backups
    #[command(alias = "ls")]
    List,

    /// Restore the current directory from backup slot N (saves the current state first)
    Pull {
        /// Slot number, as shown by `bkup list`
        slot: u32,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommands>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context::from_process()?;
    let fs = RealFs::new();
    let app = App::new(&ctx, &fs, cli.queue);

    fs.create_dir_all(app.paths.base_dir())?;

    match cli.command {
        None => handle_create(&app)?,
        Some(Commands::Go { print, fresh }) => handle_go(&app, print, fresh)?,
        Some(Commands::Revert { print }) => handle_revert(&app, print)?,
        Some(Commands::Clean { project }) => handle_clean(&app, project)?,
        Some(Commands::List) => handle_list(&app)?,
        Some(Commands::Pull { slot }) => handle_pull(&app, slot)?,
        Some(Commands::Config { action }) => handle_config_command(&app, action)?,
    }

    Ok(())
}
