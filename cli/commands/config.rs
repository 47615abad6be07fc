use crate::cli_args::{ConfigArgs, ProjectConfigOpts};
use crate::output::{confirm_overwrite, print_saved, write_to_stdout};
use crate::resolve_project_root;
use anyhow::{Context, Result};
use ctxharvest_core::Config;
use ctxharvest_core::config::default_config_text;
use std::fs;

pub fn handle_config_command(
    args: &ConfigArgs,
    opts: &ProjectConfigOpts,
    quiet: bool,
) -> Result<()> {
    let default_text = default_config_text().context("Failed to load embedded default config")?;

    if !args.save {
        return write_to_stdout(&default_text);
    }

    let project_root = resolve_project_root(opts)?;
    let config_path = Config::resolve_config_path(&project_root, opts.config_file.as_deref());
    if !confirm_overwrite(&config_path, quiet)? {
        println!("Save cancelled.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(&config_path, default_text)
        .with_context(|| format!("Failed to write config file {}", config_path.display()))?;

    if !quiet {
        print_saved("Default config", &config_path);
    }
    Ok(())
}
