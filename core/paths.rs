use crate::error::{AppError, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

pub const CONTEXT_DIR: &str = ".context";
pub const CONTEXT_OUTPUT_FILENAME: &str = "context.txt";
pub const LOG_OUTPUT_FILENAME: &str = "channel_output.txt";

/// Resolves the project root: explicit path, then `PROJECT_ROOT`, then the current directory.
pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
    let path_str_opt = cli_project_root
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| env::var("PROJECT_ROOT").ok().filter(|s| !s.is_empty()));

    let path_to_resolve = match path_str_opt {
        Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
        None => env::current_dir().map_err(AppError::Io)?,
    };

    path_to_resolve.canonicalize().map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to canonicalize project root '{}': {}",
                path_to_resolve.display(),
                e
            ),
        ))
    })
}

pub fn context_dir(project_root: &Path) -> PathBuf {
    project_root.join(CONTEXT_DIR)
}

/// Resolves a configured directory against the project root.
///
/// Absolute entries (after `~` expansion) are kept as written; everything else is
/// joined under `project_root`. An empty entry means the project root itself.
pub fn resolve_dir(project_root: &Path, raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let candidate = Path::new(expanded.as_ref());
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        join_lexical(project_root, candidate)
    }
}

/// Joins `tail` onto `base` without touching the filesystem, dropping `.` and
/// folding `..` into the preceding component.
pub fn join_lexical(base: &Path, tail: &Path) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in tail.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !joined.pop() {
                    joined.push("..");
                }
            }
            Component::Normal(name) => joined.push(name),
            Component::RootDir | Component::Prefix(_) => joined.push(component.as_os_str()),
        }
    }
    joined
}
