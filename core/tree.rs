use indexmap::IndexMap;
use log;
use serde::Serialize;
use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

/// Resolved settings for one tree section.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TreeSpec {
    pub base_dir: String,
    pub exclude_dirs: Vec<String>,
    pub default_depth: usize,
    pub limits: IndexMap<String, usize>,
}

#[derive(Debug)]
struct PendingEntry {
    path: PathBuf,
    name: String,
    relative: String,
    is_dir: bool,
    is_last: bool,
    depth: usize,
    prefix: String,
    inherited_limit: usize,
}

/// Renders `directory` as an indented text tree.
///
/// The first line is always `directory` itself. Entries are visited depth-first in
/// sorted name order; a directory is expanded while `depth + 1` stays below the
/// effective limit for its subtree (an exact or path-prefix key in `limits`, else the
/// limit inherited from its parent, which starts at `default_depth`).
pub fn generate_tree(
    directory: &Path,
    default_depth: usize,
    limits: &IndexMap<String, usize>,
    exclude_dirs: &[String],
) -> String {
    let mut lines = vec![directory.display().to_string()];
    if default_depth == 0 {
        return lines.join("\n");
    }

    let mut stack: Vec<PendingEntry> = Vec::new();
    push_children(
        &mut stack,
        directory,
        "",
        0,
        "",
        default_depth,
        exclude_dirs,
    );

    while let Some(entry) = stack.pop() {
        let max_depth = effective_max_depth(&entry.relative, limits, entry.inherited_limit);
        let connector = if entry.is_last { LAST_BRANCH } else { BRANCH };
        lines.push(format!("{}{}{}", entry.prefix, connector, entry.name));

        if entry.is_dir && entry.depth + 1 < max_depth {
            let indent = if entry.is_last { SPACE_INDENT } else { PIPE_INDENT };
            let child_prefix = format!("{}{}", entry.prefix, indent);
            push_children(
                &mut stack,
                &entry.path,
                &entry.relative,
                entry.depth + 1,
                &child_prefix,
                max_depth,
                exclude_dirs,
            );
        }
    }

    lines.join("\n")
}

fn push_children(
    stack: &mut Vec<PendingEntry>,
    dir: &Path,
    parent_relative: &str,
    depth: usize,
    prefix: &str,
    inherited_limit: usize,
    exclude_dirs: &[String],
) {
    let children = sorted_entries(dir);
    // `is_last` is judged against the full listing, so a trailing excluded directory
    // leaves its visible siblings on `├── `.
    let count = children.len();
    // Reversed so the first sorted child is popped first.
    for (index, (name, path, is_dir)) in children.into_iter().enumerate().rev() {
        if is_dir && exclude_dirs.iter().any(|d| *d == name) {
            continue;
        }
        let relative = if parent_relative.is_empty() {
            name.clone()
        } else {
            format!("{}{}{}", parent_relative, MAIN_SEPARATOR, name)
        };
        stack.push(PendingEntry {
            path,
            name,
            relative,
            is_dir,
            is_last: index + 1 == count,
            depth,
            prefix: prefix.to_string(),
            inherited_limit,
        });
    }
}

/// Lists `dir` sorted by name. Unreadable or missing directories yield nothing.
fn sorted_entries(dir: &Path) -> Vec<(String, PathBuf, bool)> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            log::debug!("Cannot list {} for tree: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut entries: Vec<(String, PathBuf, bool)> = read_dir
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => {
                let path = entry.path();
                let is_dir = fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
                Some((entry.file_name().to_string_lossy().into_owned(), path, is_dir))
            }
            Err(e) => {
                log::warn!("Error reading entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn effective_max_depth(relative: &str, limits: &IndexMap<String, usize>, inherited: usize) -> usize {
    if let Some(limit) = limits.get(relative) {
        return *limit;
    }
    limits
        .iter()
        .find(|(key, _)| {
            relative
                .strip_prefix(key.as_str())
                .is_some_and(|rest| rest.starts_with(MAIN_SEPARATOR))
        })
        .map(|(_, limit)| *limit)
        .unwrap_or(inherited)
}
