use crate::paths;
use log;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const WILDCARD: &str = "*";

/// Resolved settings for one content section.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectionRule {
    pub base_dir: String,
    pub exclude_dirs: Vec<String>,
    pub exclude_prefixes: Vec<String>,
    pub exclude_suffixes: Vec<String>,
    pub recursive: bool,
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    pub all_dirs: Vec<String>,
    pub all_dirs_recursive: Vec<String>,
    pub display_line_numbers: bool,
}

#[derive(Debug, Default)]
struct DirListing {
    dirs: Vec<String>,
    files: Vec<String>,
}

impl SelectionRule {
    pub fn walks_recursively(&self) -> bool {
        self.recursive || !self.all_dirs_recursive.is_empty()
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }

    fn is_excluded_file(&self, name: &str) -> bool {
        self.exclude_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.exclude_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    fn is_included_file(&self, name: &str) -> bool {
        self.prefixes
            .iter()
            .any(|p| p == WILDCARD || name.starts_with(&p.replace(WILDCARD, "")))
            || self
                .suffixes
                .iter()
                .any(|s| s == WILDCARD || name.ends_with(&s.replace(WILDCARD, "")))
    }

    /// Files in an all-dir skip the inclusion filters; exclusions always apply.
    pub fn accepts_file(&self, name: &str, in_all_dir: bool) -> bool {
        !self.is_excluded_file(name) && (in_all_dir || self.is_included_file(name))
    }
}

/// Returns the files selected by `rule`, in depth-first traversal order.
///
/// Within one directory, files keep the order the filesystem lists them in. Subdirectories
/// named in `exclude_dirs` are pruned before they are visited, which also stops them from
/// counting as all-dirs.
pub fn select_files(project_root: &Path, rule: &SelectionRule) -> Vec<PathBuf> {
    let base_dir = paths::resolve_dir(project_root, &rule.base_dir);
    let all_dirs_full: Vec<PathBuf> = rule
        .all_dirs
        .iter()
        .map(|d| paths::join_lexical(&base_dir, Path::new(d)))
        .collect();
    let all_dirs_recursive_full: Vec<PathBuf> = rule
        .all_dirs_recursive
        .iter()
        .map(|d| paths::join_lexical(&base_dir, Path::new(d)))
        .collect();
    let walk_recursively = rule.walks_recursively();
    log::debug!(
        "Selecting files under {} (recursive walk: {})",
        base_dir.display(),
        walk_recursively
    );

    let mut selected = Vec::new();
    let mut pending = vec![base_dir];
    while let Some(dir) = pending.pop() {
        let Some(listing) = list_directory(&dir) else {
            continue;
        };

        let is_all_dir = all_dirs_full.iter().any(|d| *d == dir)
            || all_dirs_recursive_full.iter().any(|d| dir.starts_with(d));

        for name in &listing.files {
            if rule.accepts_file(name, is_all_dir) {
                log::trace!("Selected file: {}/{}", dir.display(), name);
                selected.push(dir.join(name));
            }
        }

        if walk_recursively {
            for sub in listing.dirs.iter().rev() {
                if rule.is_excluded_dir(sub) {
                    log::trace!("Pruning excluded directory: {}/{}", dir.display(), sub);
                    continue;
                }
                pending.push(dir.join(sub));
            }
        }
    }

    log::debug!("Selected {} files.", selected.len());
    selected
}

fn list_directory(dir: &Path) -> Option<DirListing> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            log::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut listing = DirListing::default();
    for entry_result in read_dir {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error reading entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_dir() => listing.dirs.push(name),
            Ok(meta) if meta.is_file() => listing.files.push(name),
            Ok(_) => {}
            Err(e) => log::debug!("Cannot stat {}: {}", entry.path().display(), e),
        }
    }
    Some(listing)
}
