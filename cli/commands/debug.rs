use crate::cli_args::{DebugArgs, ProjectConfigOpts};
use crate::resolve_project_root;
use crate::output::write_to_stdout;
use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use ctxharvest_core::config::{CONTENT_SECTIONS, TREE_SECTIONS};
use ctxharvest_core::paths;
use ctxharvest_core::{Config, LogAggregatorConfig, SelectionRule, TreeSpec, select_files};
use log;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct DebugInfo {
    project_root: PathBuf,
    config_path: PathBuf,
    trees: Vec<TreeSectionInfo>,
    contents: Vec<ContentSectionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_aggregator: Option<LogSectionInfo>,
}

#[derive(Debug, Serialize)]
struct TreeSectionInfo {
    section: &'static str,
    enabled: bool,
    base_dir: PathBuf,
    spec: TreeSpec,
}

#[derive(Debug, Serialize)]
struct ContentSectionInfo {
    section: &'static str,
    enabled: bool,
    base_dir: PathBuf,
    rule: SelectionRule,
    files_to_include: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LogSectionInfo {
    enabled: bool,
    settings: LogAggregatorConfig,
}

pub fn handle_debug_command(args: &DebugArgs, opts: &ProjectConfigOpts) -> Result<()> {
    let project_root = resolve_project_root(opts)?;
    let (config_path, config) = load_debug_config(&project_root, opts.config_file.as_deref())?;

    log::debug!("Debug: collecting section plans...");
    let info = collect_debug_info(&project_root, config_path, &config);

    if args.json {
        let json = serde_json::to_string_pretty(&info)
            .context("Failed to serialize debug info to JSON")?;
        write_to_stdout(&json)?;
    } else {
        print_debug_info_pretty(&info);
    }
    Ok(())
}

/// Debug is read-only: a missing config file falls back to the embedded default
/// instead of being written.
fn load_debug_config(project_root: &Path, config_file: Option<&str>) -> Result<(PathBuf, Config)> {
    let config_path = Config::resolve_config_path(project_root, config_file);
    let config = Config::load_or_default(&config_path).context("Failed to load configuration")?;
    Ok((config_path, config))
}

fn collect_debug_info(project_root: &Path, config_path: PathBuf, config: &Config) -> DebugInfo {
    let trees = TREE_SECTIONS
        .into_iter()
        .filter_map(|name| {
            let section = config.effective_section(name)?;
            let spec = section.tree_spec();
            Some(TreeSectionInfo {
                section: name,
                enabled: section.is_enabled(),
                base_dir: paths::resolve_dir(project_root, &spec.base_dir),
                spec,
            })
        })
        .collect();

    let contents = CONTENT_SECTIONS
        .into_iter()
        .filter_map(|name| {
            let section = config.effective_section(name)?;
            let rule = section.selection_rule();
            let enabled = section.is_enabled();
            let files_to_include = if enabled {
                get_relative_paths(&select_files(project_root, &rule), project_root)
            } else {
                Vec::new()
            };
            Some(ContentSectionInfo {
                section: name,
                enabled,
                base_dir: paths::resolve_dir(project_root, &rule.base_dir),
                rule,
                files_to_include,
            })
        })
        .collect();

    let log_aggregator = config.log_aggregator.as_ref().map(|section| LogSectionInfo {
        enabled: section.enabled,
        settings: section.aggregator_config(project_root),
    });

    DebugInfo {
        project_root: project_root.to_path_buf(),
        config_path,
        trees,
        contents,
        log_aggregator,
    }
}

fn get_relative_paths(files: &[PathBuf], project_root: &Path) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            pathdiff::diff_paths(f, project_root)
                .unwrap_or_else(|| f.clone())
                .to_string_lossy()
                .to_string()
        })
        .collect()
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Green))
            .collect::<Vec<_>>(),
    );
    table
}

fn enabled_cell(enabled: bool) -> Cell {
    if enabled {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::DarkGrey)
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn print_debug_info_pretty(info: &DebugInfo) {
    println!("{}", "\n--- Project ---".green().bold().underline());
    println!("{:<14} {}", "Root:".green(), info.project_root.display().to_string().cyan());
    println!("{:<14} {}", "Config file:".green(), info.config_path.display().to_string().cyan());

    println!("{}", "\n--- Tree Sections ---".green().bold().underline());
    if info.trees.is_empty() {
        println!("{}", "(None)".dimmed());
    } else {
        let mut table = new_table(&["Section", "Enabled", "Base dir", "Depth", "Limits", "Excluded dirs"]);
        for tree in &info.trees {
            let limits: Vec<String> = tree
                .spec
                .limits
                .iter()
                .map(|(path, depth)| format!("{}={}", path, depth))
                .collect();
            table.add_row(vec![
                Cell::new(tree.section).fg(Color::Cyan),
                enabled_cell(tree.enabled),
                Cell::new(tree.base_dir.display()),
                Cell::new(tree.spec.default_depth),
                Cell::new(join_or_dash(&limits)),
                Cell::new(join_or_dash(&tree.spec.exclude_dirs)).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }

    println!("{}", "\n--- Content Sections ---".green().bold().underline());
    if info.contents.is_empty() {
        println!("{}", "(None)".dimmed());
    }
    for content in &info.contents {
        let rule = &content.rule;
        let mut table = new_table(&["Setting", "Value"]);
        table.add_row(vec![Cell::new("section"), Cell::new(content.section).fg(Color::Cyan)]);
        table.add_row(vec![Cell::new("enabled"), enabled_cell(content.enabled)]);
        table.add_row(vec![Cell::new("base_dir"), Cell::new(content.base_dir.display())]);
        table.add_row(vec![Cell::new("recursive"), Cell::new(rule.walks_recursively())]);
        table.add_row(vec![Cell::new("prefixes"), Cell::new(join_or_dash(&rule.prefixes))]);
        table.add_row(vec![Cell::new("suffixes"), Cell::new(join_or_dash(&rule.suffixes))]);
        table.add_row(vec![Cell::new("all_dirs"), Cell::new(join_or_dash(&rule.all_dirs))]);
        table.add_row(vec![
            Cell::new("all_dirs_recursive"),
            Cell::new(join_or_dash(&rule.all_dirs_recursive)),
        ]);
        table.add_row(vec![
            Cell::new("exclude_dirs"),
            Cell::new(join_or_dash(&rule.exclude_dirs)),
        ]);
        table.add_row(vec![
            Cell::new("exclude_prefixes"),
            Cell::new(join_or_dash(&rule.exclude_prefixes)),
        ]);
        table.add_row(vec![
            Cell::new("exclude_suffixes"),
            Cell::new(join_or_dash(&rule.exclude_suffixes)),
        ]);
        table.add_row(vec![
            Cell::new("display_line_numbers"),
            Cell::new(rule.display_line_numbers),
        ]);
        println!("{table}");

        println!(
            "{}",
            format!("Files to include ({})", content.files_to_include.len()).green()
        );
        if content.files_to_include.is_empty() {
            println!("{}", "(None)".dimmed());
        } else {
            content
                .files_to_include
                .iter()
                .for_each(|p| println!("- {}", p.cyan()));
        }
    }

    println!("{}", "\n--- Log Aggregator ---".green().bold().underline());
    match &info.log_aggregator {
        None => println!("{}", "(Not configured)".dimmed()),
        Some(logs) => {
            let settings = &logs.settings;
            let dirs: Vec<String> = settings
                .log_directories
                .iter()
                .map(|d| d.display().to_string())
                .collect();
            let mut table = new_table(&["Setting", "Value"]);
            table.add_row(vec![Cell::new("enabled"), enabled_cell(logs.enabled)]);
            table.add_row(vec![Cell::new("log_dirs"), Cell::new(join_or_dash(&dirs))]);
            table.add_row(vec![
                Cell::new("output_file"),
                Cell::new(settings.output_file.display()),
            ]);
            table.add_row(vec![
                Cell::new("time_range_hours"),
                Cell::new(optional(settings.time_range_hours)),
            ]);
            table.add_row(vec![
                Cell::new("max_lines"),
                Cell::new(optional(settings.max_lines)),
            ]);
            table.add_row(vec![
                Cell::new("log_level"),
                Cell::new(settings.log_level.as_deref().unwrap_or("-")),
            ]);
            table.add_row(vec![
                Cell::new("channels"),
                Cell::new(join_or_dash(&settings.channels)),
            ]);
            println!("{table}");
        }
    }

    println!("{}", "\n--- End Debug Info ---".green().bold());
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn debug_does_not_bootstrap_the_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let (config_path, config) = load_debug_config(root, None).unwrap();
        let info = collect_debug_info(root, config_path.clone(), &config);

        assert_eq!(config_path, root.join(".context").join("ch_config.toml"));
        assert!(!config_path.exists());
        assert!(!root.join(".context").exists());
        assert!(!info.contents.is_empty());
    }

    #[test]
    fn debug_info_lists_present_sections_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("notes.txt"), "n").unwrap();
        let config = Config::from_toml_str(
            r#"
            [tree]
            enabled = true
            [content]
            suffixes = [".rs"]
            [content-extra]
            enabled = false
            prefixes = ["*"]
            "#,
        )
        .unwrap();

        let info = collect_debug_info(root, root.join("cfg.toml"), &config);

        assert_eq!(info.trees.len(), 1);
        assert_eq!(info.trees[0].base_dir, root.to_path_buf());
        assert_eq!(info.contents.len(), 2);
        assert_eq!(info.contents[0].files_to_include, vec!["main.rs".to_string()]);
        assert!(!info.contents[1].enabled);
        assert!(info.contents[1].files_to_include.is_empty());
        assert!(info.log_aggregator.is_none());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["contents"][0]["section"], "content");
        assert!(json.get("log_aggregator").is_none());
    }
}
