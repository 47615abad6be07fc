use log;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of content lines gathered by one content section.
pub const LINE_LIMIT: usize = 10_000;
pub const LINE_LIMIT_MARKER: &str =
    "=== Line limit of 10,000 reached, further files not included ===";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludedFile {
    pub path: PathBuf,
    pub line_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentBlock {
    pub lines: Vec<String>,
    pub included: Vec<IncludedFile>,
    pub limit_reached: bool,
}

impl ContentBlock {
    pub fn total_lines(&self) -> usize {
        self.included.iter().map(|f| f.line_count).sum()
    }
}

/// Concatenates the files in `paths`, stopping after the file that pushes the running
/// line total past [`LINE_LIMIT`].
pub fn generate_content(paths: &[PathBuf], display_line_numbers: bool) -> ContentBlock {
    let mut block = ContentBlock::default();
    let mut total_lines = 0usize;

    for path in paths {
        let Some((file_lines, line_count)) = render_file(path, display_line_numbers) else {
            continue;
        };
        block.lines.extend(file_lines);
        block.included.push(IncludedFile {
            path: path.clone(),
            line_count,
        });
        total_lines += line_count;
        if total_lines > LINE_LIMIT {
            log::info!(
                "Line limit of {} reached after {}; remaining files skipped.",
                LINE_LIMIT,
                path.display()
            );
            block.lines.push(LINE_LIMIT_MARKER.to_string());
            block.limit_reached = true;
            break;
        }
    }

    block
}

/// Returns the rendered lines of one file and its raw line count, or `None` when the file
/// is unreadable or holds only whitespace.
fn render_file(path: &Path, display_line_numbers: bool) -> Option<(Vec<String>, usize)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };

    let lines: Vec<&str> = text.split('\n').collect();
    if lines.iter().all(|line| line.trim().is_empty()) {
        log::debug!("Skipping blank file: {}", path.display());
        return None;
    }

    let mut rendered = Vec::with_capacity(lines.len() + 2);
    rendered.push(format!("=== Contents of {} ===", path.display()));
    if display_line_numbers {
        rendered.extend(
            lines
                .iter()
                .enumerate()
                .map(|(index, line)| format!("{:>4}: {}", index + 1, line)),
        );
    } else {
        rendered.extend(lines.iter().map(|line| line.to_string()));
    }
    rendered.push(String::new());

    Some((rendered, lines.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn whitespace_only_file_contributes_nothing() {
        let tmp = tempdir().unwrap();
        let blank = write(tmp.path(), "blank.txt", "  \n\t\n\n");
        let block = generate_content(&[blank], false);
        assert!(block.lines.is_empty());
        assert!(block.included.is_empty());
        assert_eq!(block.total_lines(), 0);
    }

    #[test]
    fn file_is_wrapped_in_header_and_separator() {
        let tmp = tempdir().unwrap();
        let path = write(tmp.path(), "a.rs", "fn main() {}\n");
        let block = generate_content(&[path.clone()], false);

        assert_eq!(
            block.lines,
            vec![
                format!("=== Contents of {} ===", path.display()),
                "fn main() {}".to_string(),
                String::new(),
                String::new(),
            ]
        );
        // The trailing newline yields an empty final line, which is counted.
        assert_eq!(
            block.included,
            vec![IncludedFile {
                path,
                line_count: 2
            }]
        );
    }

    #[test]
    fn line_numbers_are_right_aligned() {
        let tmp = tempdir().unwrap();
        let path = write(tmp.path(), "n.txt", "alpha\nbeta");
        let block = generate_content(&[path], true);
        assert_eq!(block.lines[1], "   1: alpha");
        assert_eq!(block.lines[2], "   2: beta");
    }

    #[test]
    fn crossing_the_limit_keeps_that_file_and_stops() {
        let tmp = tempdir().unwrap();
        let first = write(tmp.path(), "first.txt", &numbered_lines(6000));
        let second = write(tmp.path(), "second.txt", &numbered_lines(6000));
        let third = write(tmp.path(), "third.txt", "never read");

        let block = generate_content(&[first, second.clone(), third], false);

        assert_eq!(block.included.len(), 2);
        assert_eq!(block.total_lines(), 12_000);
        assert!(block.limit_reached);
        assert_eq!(block.lines.last().map(String::as_str), Some(LINE_LIMIT_MARKER));
        assert!(block.lines.contains(&"line 6000".to_string()));
        assert!(!block.lines.iter().any(|l| l.contains("third.txt")));
        assert!(!block.lines.contains(&"never read".to_string()));
        assert_eq!(block.included[1].path, second);
    }

    #[test]
    fn exactly_at_the_limit_does_not_stop() {
        let tmp = tempdir().unwrap();
        let full = write(tmp.path(), "full.txt", &numbered_lines(LINE_LIMIT));
        let next = write(tmp.path(), "next.txt", "x");
        let block = generate_content(&[full, next], false);
        assert_eq!(block.included.len(), 2);
        assert!(block.limit_reached);
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing.txt");
        let binary = tmp.path().join("binary.bin");
        fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let good = write(tmp.path(), "good.txt", "ok");

        let block = generate_content(&[missing, binary, good.clone()], false);
        assert_eq!(
            block.included,
            vec![IncludedFile {
                path: good,
                line_count: 1
            }]
        );
        assert!(!block.limit_reached);
    }
}
