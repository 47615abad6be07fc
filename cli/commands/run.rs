use crate::cli_args::ProjectConfigOpts;
use crate::output;
use crate::{clipboard, load_config_for_command};
use anyhow::{Context, Result};
use colored::*;
use ctxharvest_core::{Config, LogAggregator, generate_context, write_context};
use log;
use std::path::Path;

/// Runs every enabled pipeline. A failing pipeline does not stop the other one; the
/// first failure is returned once both have had their turn.
pub fn handle_run_command(opts: &ProjectConfigOpts, quiet: bool) -> Result<()> {
    let (project_root, config) = load_config_for_command(opts)?;
    let mut first_error: Option<anyhow::Error> = None;
    let mut ran_something = false;

    if config.is_project_context_enabled() {
        ran_something = true;
        if let Err(e) = run_project_context(&project_root, &config, quiet) {
            first_error = Some(e);
        }
    } else if !quiet {
        println!("Project context (content and tree) is disabled in configuration. Skipping.");
    }

    if config.is_log_aggregator_enabled() {
        ran_something = true;
        if let Err(e) = run_log_aggregator(&project_root, &config, quiet) {
            match first_error {
                None => first_error = Some(e),
                Some(_) => eprintln!("{} {:#}", "Error:".red().bold(), e),
            }
        }
    } else if !quiet {
        println!("Log aggregator is disabled in configuration. Skipping.");
    }

    if !ran_something && !quiet {
        println!(
            "{}",
            "No tasks enabled in configuration. Please enable at least one of content, tree, or log_aggregator."
                .yellow()
        );
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn handle_context_command(opts: &ProjectConfigOpts, quiet: bool) -> Result<()> {
    let (project_root, config) = load_config_for_command(opts)?;
    run_project_context(&project_root, &config, quiet)
}

pub fn handle_logs_command(opts: &ProjectConfigOpts, quiet: bool) -> Result<()> {
    let (project_root, config) = load_config_for_command(opts)?;
    if !config.is_log_aggregator_enabled() {
        if !quiet {
            println!("Log aggregator is disabled in configuration. Skipping.");
        }
        return Ok(());
    }
    run_log_aggregator(&project_root, &config, quiet)
}

fn run_project_context(project_root: &Path, config: &Config, quiet: bool) -> Result<()> {
    let context = generate_context(project_root, config);

    if config.general.print_summary && !quiet {
        output::print_summary(&context);
    }

    if context.is_empty() {
        if !quiet {
            println!("{}", "No content generated.".yellow());
        }
        return Ok(());
    }

    let saved_to = write_context(project_root, &context.content)
        .context("Failed to write project context")?;
    if !quiet {
        output::print_saved("Context", &saved_to);
    }

    if config.general.copy_to_clipboard {
        match clipboard::copy_to_clipboard(&context.content) {
            Ok(()) => {
                if !quiet {
                    println!("{} Contents copied to clipboard.", "📋".blue());
                }
            }
            Err(e) => log::warn!("Could not copy context to clipboard: {}", e),
        }
    }
    Ok(())
}

fn run_log_aggregator(project_root: &Path, config: &Config, quiet: bool) -> Result<()> {
    let Some(section) = config.log_aggregator.as_ref() else {
        return Ok(());
    };
    let aggregator = LogAggregator::new(section.aggregator_config(project_root));
    let written = aggregator
        .aggregate_logs()
        .context("Failed to aggregate logs")?;
    log::debug!("{} log files written", written.len());
    if !quiet {
        output::print_saved("Logs", &aggregator.config().output_file);
    }
    Ok(())
}
