use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use colored::*;
use ctxharvest_core::AppError;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use crate::cli_args::{Cli, CompletionArgs};
use crate::output::confirm_overwrite;

fn parse_shell(shell_str: &str) -> Result<Shell, AppError> {
    match shell_str.to_lowercase().as_str() {
        "fish" => Ok(Shell::Fish),
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        _ => Err(AppError::InvalidArgument(format!(
            "Unsupported shell for completion: {}",
            shell_str
        ))),
    }
}

fn default_completion_path(shell: Shell, bin_name: &str) -> Option<PathBuf> {
    match shell {
        Shell::Fish => dirs::config_dir()
            .map(|p| p.join("fish").join("completions").join(format!("{}.fish", bin_name))),
        Shell::Bash => dirs::config_dir()
            .map(|p| p.join("bash_completion.d").join(format!("{}.bash", bin_name))),
        Shell::Zsh => dirs::data_local_dir()
            .map(|p| p.join("zsh").join("site-functions").join(format!("_{}", bin_name))),
        _ => None,
    }
}

pub fn handle_completion_command(args: &CompletionArgs, quiet: bool) -> Result<()> {
    let shell_str = args.shell.as_deref().unwrap_or("fish");
    let shell = parse_shell(shell_str)?;

    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();

    if !args.save {
        generate(shell, &mut command, bin_name, &mut io::stdout());
        return Ok(());
    }

    let save_path = default_completion_path(shell, &bin_name)
        .ok_or_else(|| anyhow::anyhow!("Could not determine standard completion directory."))?;

    if !confirm_overwrite(&save_path, quiet)? {
        println!("Save cancelled.");
        return Ok(());
    }

    if let Some(save_dir) = save_path.parent() {
        fs::create_dir_all(save_dir)
            .with_context(|| format!("Failed to create directory {}", save_dir.display()))?;
    }
    let mut file = File::create(&save_path)
        .with_context(|| format!("Failed to create file {}", save_path.display()))?;
    generate(shell, &mut command, bin_name, &mut file);

    if !quiet {
        println!(
            "{} {} completions saved to: {}",
            "✅".green(),
            shell_str.cyan(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
