mod cli_args;
mod clipboard;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::env;
use std::path::PathBuf;
use std::process;

use cli_args::{Cli, Commands, FilterOpts, ProjectConfigOpts};
use filemerge_core::{AppError, Config, Session};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::TomlSerialize(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::RootNotFound { .. }) => 2,
                Some(AppError::RootInaccessible { .. }) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::WalkDir(_)) => 2,
                Some(AppError::Clipboard(_)) => 3,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::ExtensionParse(_)) => 5,
                Some(AppError::Pattern(_)) => 5,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(_) => 1,
                None => 1,
            };

            // Usage problems are always shown; the rest respects --quiet.
            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Tree(args) => {
                log::debug!("Executing 'tree' command...");
                commands::tree::handle_tree_command(args, quiet)?;
            }
            Commands::Merge(args) => {
                log::debug!("Executing 'merge' command...");
                commands::merge::handle_merge_command(args, quiet)?;
            }
            Commands::Show(args) => {
                log::debug!("Executing 'show' command...");
                commands::show::handle_show_command(args, quiet)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                commands::config::handle_config_command(&args, quiet)?;
            }
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args, quiet)?;
            }
        },
    }
    Ok(())
}

fn apply_filter_overrides(mut config: Config, filters: &FilterOpts, quiet: bool) -> Config {
    log::trace!("Applying CLI filter overrides to config...");
    if let Some(raw) = &filters.extensions {
        // A bad spec is reported and the configured extensions stay in effect.
        if let Err(e) = config.filters.extensions.update_from(raw) {
            if !quiet {
                eprintln!(
                    "{} {} (keeping {})",
                    "Warning:".yellow(),
                    e,
                    config.filters.extensions
                );
            }
        }
    }
    if !filters.ignore_folders.is_empty() {
        config.filters.ignored_folders = filters.ignore_folders.clone();
    }
    if filters.hide_empty {
        config.filters.hide_empty_directories = true;
    }
    config
}

/// Loads the config for a command and resolves the root folder it should browse.
pub fn load_config_for_command(
    project_opts: &ProjectConfigOpts,
    filters: &FilterOpts,
    quiet: bool,
) -> Result<(Config, PathBuf)> {
    let search_dir = match &project_opts.root {
        Some(root) => root.clone(),
        None => env::current_dir().context("Failed to determine current directory")?,
    };
    let config_path = Config::resolve_config_path(
        &search_dir,
        project_opts.config.as_ref(),
        project_opts.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let config = apply_filter_overrides(config, filters, quiet);

    let root = config
        .determine_root(project_opts.root.as_ref())
        .context("Failed to determine root folder")?;
    log::info!("Root folder determined: {}", root.display());
    Ok((config, root))
}

/// Builds a session and loads the tree for `root`.
pub fn open_session(config: &Config, root: PathBuf) -> Result<Session> {
    let mut session = Session::new(config).context("Failed to initialise session")?;
    session
        .load(&root)
        .with_context(|| format!("Error loading directory {}", root.display()))?;
    Ok(session)
}
