use anyhow::{Context, Result};
use colored::*;
use ctxharvest_core::{IncludedFile, LINE_LIMIT, ProjectContext};
use std::io::{self, Write};
use std::path::Path;

/// Renders the tree and included-file counts the way they are printed to the console.
pub fn format_summary(context: &ProjectContext) -> Vec<String> {
    let mut lines = Vec::new();

    if !context.tree_summaries.is_empty() {
        lines.push("=== Tree Summaries ===".to_string());
        for tree in &context.tree_summaries {
            lines.push(format!(
                "{:>10} : tree for {}",
                tree.line_count,
                tree.base_dir.display()
            ));
        }
    }

    if !context.included_files.is_empty() {
        lines.push("=== Included Files Summary ===".to_string());
        lines.push(" length    : path".to_string());
        lines.extend(context.included_files.iter().map(format_included_file));
        let total_lines = context.total_included_lines();
        if total_lines > LINE_LIMIT {
            lines.push("~~~ Note: Line limit of 10,000 reached ~~~".to_string());
        }
        lines.push(String::new());
        lines.push(format!("{:>10} : total lines", total_lines));
    }

    lines
}

fn format_included_file(file: &IncludedFile) -> String {
    format!("{:>10} : {}", file.line_count, file.path.display())
}

pub fn print_summary(context: &ProjectContext) {
    for line in format_summary(context) {
        if line.starts_with("===") {
            println!("{}", line.green().bold());
        } else if line.starts_with("~~~") {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_saved(what: &str, path: &Path) {
    println!(
        "{} {} saved to: {}",
        "✅".green(),
        what,
        path.display().to_string().blue()
    );
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Asks before replacing `path`; quiet mode never overwrites.
pub fn confirm_overwrite(path: &Path, quiet: bool) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    if quiet {
        anyhow::bail!(
            "Target file '{}' exists. Overwrite prevented in quiet mode.",
            path.display()
        );
    }
    print!(
        "{} File already exists at '{}'. Overwrite? [{}/{}] ",
        "⚠️".yellow(),
        path.display().to_string().cyan(),
        "y".green(),
        "N".red()
    );
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .context("Failed to read user input")?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxharvest_core::TreeSummary;
    use std::path::PathBuf;

    fn file(path: &str, line_count: usize) -> IncludedFile {
        IncludedFile {
            path: PathBuf::from(path),
            line_count,
        }
    }

    #[test]
    fn summary_layout() {
        let context = ProjectContext {
            content: "x".to_string(),
            tree_summaries: vec![TreeSummary {
                base_dir: PathBuf::from("/p"),
                line_count: 12,
            }],
            included_files: vec![file("/p/a.rs", 3), file("/p/b.rs", 40)],
        };
        assert_eq!(
            format_summary(&context),
            vec![
                "=== Tree Summaries ===",
                "        12 : tree for /p",
                "=== Included Files Summary ===",
                " length    : path",
                "         3 : /p/a.rs",
                "        40 : /p/b.rs",
                "",
                "        43 : total lines",
            ]
        );
    }

    #[test]
    fn summary_notes_the_line_limit() {
        let context = ProjectContext {
            included_files: vec![file("a", 6000), file("b", 6000)],
            ..Default::default()
        };
        let lines = format_summary(&context);
        assert!(lines.contains(&"~~~ Note: Line limit of 10,000 reached ~~~".to_string()));
        assert_eq!(lines.last().unwrap(), "     12000 : total lines");
    }

    #[test]
    fn empty_context_has_no_summary() {
        assert!(format_summary(&ProjectContext::default()).is_empty());
    }
}
