mod cli_args;
mod clipboard;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log;
use std::path::PathBuf;
use std::process;

use cli_args::{Cli, Commands, ProjectConfigOpts};
use ctxharvest_core::{AppError, Config, determine_project_root};

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
            let exit_code = exit_code_for(&e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
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

pub(crate) fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_)) | Some(AppError::TomlParse(_)) => 1,
        Some(AppError::Io(_))
        | Some(AppError::FileRead { .. })
        | Some(AppError::FileWrite { .. })
        | Some(AppError::DirCreation { .. }) => 2,
        Some(AppError::InvalidArgument(_)) => 5,
        Some(_) => 1,
        None => 1,
    }
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    let opts = &cli.project_config;
    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Run => {
            log::debug!("Executing 'run' command...");
            commands::run::handle_run_command(opts, quiet)?;
        }
        Commands::Context => {
            log::debug!("Executing 'context' command...");
            commands::run::handle_context_command(opts, quiet)?;
        }
        Commands::Logs => {
            log::debug!("Executing 'logs' command...");
            commands::run::handle_logs_command(opts, quiet)?;
        }
        Commands::Debug(args) => {
            log::debug!("Executing 'debug' command...");
            commands::debug::handle_debug_command(&args, opts)?;
        }
        Commands::Config(args) => {
            log::debug!("Executing 'config' command...");
            commands::config::handle_config_command(&args, opts, quiet)?;
        }
        Commands::Completion(args) => {
            log::debug!("Executing 'completion' command...");
            commands::completion::handle_completion_command(&args, quiet)?;
        }
    }
    Ok(())
}

pub fn resolve_project_root(opts: &ProjectConfigOpts) -> Result<PathBuf> {
    let project_root = determine_project_root(opts.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());
    Ok(project_root)
}

/// Resolves the project root and loads its configuration, bootstrapping the default file.
pub fn load_config_for_command(opts: &ProjectConfigOpts) -> Result<(PathBuf, Config)> {
    let project_root = resolve_project_root(opts)?;
    let config = Config::load(&project_root, opts.config_file.as_deref())
        .context("Failed to load configuration")?;
    Ok((project_root, config))
}
