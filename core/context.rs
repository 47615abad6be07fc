use crate::config::{CONTENT_SECTIONS, Config, TREE_SECTIONS};
use crate::content::{self, IncludedFile};
use crate::error::{AppError, Result};
use crate::gather;
use crate::paths::{self, CONTEXT_OUTPUT_FILENAME};
use crate::tree;
use log;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    pub base_dir: PathBuf,
    pub line_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectContext {
    pub content: String,
    pub tree_summaries: Vec<TreeSummary>,
    pub included_files: Vec<IncludedFile>,
}

impl ProjectContext {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn total_included_lines(&self) -> usize {
        self.included_files.iter().map(|f| f.line_count).sum()
    }
}

/// Renders every present and enabled tree section, then every content section, into one
/// text block.
pub fn generate_context(project_root: &Path, config: &Config) -> ProjectContext {
    let mut lines: Vec<String> = Vec::new();
    let mut context = ProjectContext::default();

    for section_name in TREE_SECTIONS {
        let Some(section) = config.effective_section(section_name) else {
            continue;
        };
        if !section.is_enabled() {
            log::debug!("Section [{}] is disabled, skipping.", section_name);
            continue;
        }

        let spec = section.tree_spec();
        let base_dir = paths::resolve_dir(project_root, &spec.base_dir);
        log::debug!("Rendering [{}] for {}", section_name, base_dir.display());
        let tree_text =
            tree::generate_tree(&base_dir, spec.default_depth, &spec.limits, &spec.exclude_dirs);
        let line_count = tree_text.split('\n').count();

        lines.push(format!("=== Directory Tree for {} ===", base_dir.display()));
        lines.push(tree_text);
        lines.push(String::new());
        context.tree_summaries.push(TreeSummary {
            base_dir,
            line_count,
        });
    }

    for section_name in CONTENT_SECTIONS {
        let Some(section) = config.effective_section(section_name) else {
            continue;
        };
        if !section.is_enabled() {
            log::debug!("Section [{}] is disabled, skipping.", section_name);
            continue;
        }

        let rule = section.selection_rule();
        let files = gather::select_files(project_root, &rule);
        log::debug!("[{}] selected {} files", section_name, files.len());
        let block = content::generate_content(&files, rule.display_line_numbers);
        if block.limit_reached {
            log::warn!(
                "[{}] hit the line limit of {}; later files were left out.",
                section_name,
                content::LINE_LIMIT
            );
        }
        lines.extend(block.lines);
        context.included_files.extend(block.included);
    }

    context.content = lines.join("\n");
    context
}

/// Writes `content` to `<project_root>/.context/context.txt`, replacing any previous run.
pub fn write_context(project_root: &Path, content: &str) -> Result<PathBuf> {
    let output_dir = paths::context_dir(project_root);
    fs::create_dir_all(&output_dir).map_err(|e| AppError::DirCreation {
        path: output_dir.clone(),
        source: e,
    })?;

    let output_path = output_dir.join(CONTEXT_OUTPUT_FILENAME);
    fs::write(&output_path, content).map_err(|e| AppError::FileWrite {
        path: output_path.clone(),
        source: e,
    })?;
    log::info!("Context written to {}", output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(toml: &str) -> Config {
        Config::from_toml_str(toml).unwrap()
    }

    #[test]
    fn tree_section_is_framed_and_summarized() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();

        let ctx = generate_context(tmp.path(), &config("[tree]\nenabled = true\n"));

        let expected = format!(
            "=== Directory Tree for {root} ===\n{root}\n├── a.txt\n└── b.txt\n",
            root = tmp.path().display()
        );
        assert_eq!(ctx.content, expected);
        assert_eq!(
            ctx.tree_summaries,
            vec![TreeSummary {
                base_dir: tmp.path().to_path_buf(),
                line_count: 3
            }]
        );
        assert!(ctx.included_files.is_empty());
    }

    #[test]
    fn disabled_and_absent_sections_are_skipped() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.rs"), "fn a() {}").unwrap();

        let ctx = generate_context(
            tmp.path(),
            &config(
                r#"
                [shared]
                suffixes = [".rs"]
                [tree]
                enabled = false
                [content-extra]
                "#,
            ),
        );

        assert!(ctx.tree_summaries.is_empty());
        assert_eq!(ctx.included_files.len(), 1);
        assert!(ctx.content.starts_with("=== Contents of "));
    }

    #[test]
    fn trees_come_before_contents() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("lib.rs"), "pub fn x() {}").unwrap();

        let ctx = generate_context(
            tmp.path(),
            &config(
                r#"
                [content]
                enabled = true
                base_dir = "src"
                prefixes = ["*"]
                [tree-extra]
                base_dir = "src"
                "#,
            ),
        );

        let tree_at = ctx.content.find("=== Directory Tree for").unwrap();
        let content_at = ctx.content.find("=== Contents of").unwrap();
        assert!(tree_at < content_at);
        assert_eq!(ctx.total_included_lines(), 1);
    }

    #[test]
    fn nothing_enabled_yields_empty_context() {
        let tmp = tempdir().unwrap();
        let ctx = generate_context(tmp.path(), &config("[general]\nprint_summary = true\n"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn write_context_creates_output_dir() {
        let tmp = tempdir().unwrap();
        let path = write_context(tmp.path(), "hello").unwrap();
        assert_eq!(path, tmp.path().join(".context").join("context.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }
}
