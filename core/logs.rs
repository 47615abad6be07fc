use crate::content::IncludedFile;
use crate::error::{AppError, Result};
use chrono::{Duration, Local, NaiveDateTime};
use log;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LOG_EXTENSION: &str = ".log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TIMESTAMP_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}")
        .expect("Failed to compile timestamp pattern")
});
static BRACKETED_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([A-Za-z0-9_]+)\]").expect("Failed to compile level pattern")
});
static ORDER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+-").expect("Failed to compile order prefix pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "info" => Some(LogLevel::Info),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LogAggregatorConfig {
    pub log_directories: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub time_range_hours: Option<u64>,
    pub max_lines: Option<usize>,
    pub log_level: Option<String>,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct LogAggregator {
    config: LogAggregatorConfig,
    channels: Vec<String>,
    min_level: Option<Option<LogLevel>>,
}

impl LogAggregator {
    pub fn new(config: LogAggregatorConfig) -> Self {
        let channels = config.channels.iter().map(|c| c.to_lowercase()).collect();
        // Outer `None`: no level filter. `Some(None)`: unrecognized level, nothing passes.
        // A blank level counts as unset.
        let min_level = config
            .log_level
            .as_deref()
            .filter(|level| !level.trim().is_empty())
            .map(LogLevel::parse);
        if let Some(None) = min_level {
            log::warn!(
                "Unrecognized log_level '{}'; every log line will be filtered out. Use info, warning or error.",
                config.log_level.as_deref().unwrap_or_default()
            );
        }
        LogAggregator {
            config,
            channels,
            min_level,
        }
    }

    pub fn config(&self) -> &LogAggregatorConfig {
        &self.config
    }

    /// Collects, filters and writes every matching log file to the configured output file.
    ///
    /// Returns one record per written file with the number of lines it kept.
    pub fn aggregate_logs(&self) -> Result<Vec<IncludedFile>> {
        if let Some(output_dir) = self.config.output_file.parent() {
            fs::create_dir_all(output_dir).map_err(|e| AppError::DirCreation {
                path: output_dir.to_path_buf(),
                source: e,
            })?;
        }

        let entries = self.collect_entries();
        self.write_entries(&entries)?;
        log::info!(
            "Aggregated {} log files into {}",
            entries.len(),
            self.config.output_file.display()
        );

        Ok(entries
            .into_iter()
            .map(|entry| IncludedFile {
                line_count: entry.content.split('\n').count(),
                path: entry.path,
            })
            .collect())
    }

    pub fn collect_entries(&self) -> Vec<LogEntry> {
        self.config
            .log_directories
            .iter()
            .flat_map(|dir| self.collect_from_dir(dir))
            .collect()
    }

    fn collect_from_dir(&self, dir: &Path) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        for entry_result in WalkDir::new(dir).min_depth(1) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Error reading log directory {}: {}", dir.display(), AppError::from(e));
                    continue;
                }
            };
            if entry.file_type().is_dir() || !self.is_log_file(entry.path()) {
                continue;
            }

            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Error reading log file {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let filtered = self.filter_content(&content);
            if filtered.is_empty() {
                log::debug!("No matching lines in {}", entry.path().display());
                continue;
            }
            entries.push(LogEntry {
                path: entry.into_path(),
                content: filtered,
            });
        }
        entries
    }

    /// A file is a log file when its name ends in `.log` and, if channels are configured,
    /// its base name without any `<digits>-` prefix equals a channel, ignoring case.
    pub fn is_log_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        let Some(base_name) = name.strip_suffix(LOG_EXTENSION) else {
            return false;
        };
        if self.channels.is_empty() {
            return true;
        }
        let channel = ORDER_PREFIX.replace(base_name, "").to_lowercase();
        self.channels.contains(&channel)
    }

    pub fn filter_content(&self, content: &str) -> String {
        self.filter_content_at(content, Local::now().naive_local())
    }

    /// Filters `content` line by line as if the current local time were `now`.
    pub fn filter_content_at(&self, content: &str, now: NaiveDateTime) -> String {
        let cutoff = self.config.time_range_hours.map(|hours| {
            i64::try_from(hours)
                .ok()
                .and_then(Duration::try_hours)
                .and_then(|range| now.checked_sub_signed(range))
                .unwrap_or(NaiveDateTime::MIN)
        });

        let kept = content
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .filter(|line| cutoff.is_none_or(|cutoff| is_recent(line, cutoff)))
            .filter(|line| match self.min_level {
                None => true,
                Some(None) => false,
                Some(Some(min_level)) => line_level(line).is_some_and(|level| level >= min_level),
            });

        let lines: Vec<&str> = match self.config.max_lines {
            Some(max) if max > 0 => kept.take(max).collect(),
            _ => kept.collect(),
        };
        lines.join("\n")
    }

    fn write_entries(&self, entries: &[LogEntry]) -> Result<()> {
        let output_path = &self.config.output_file;
        let to_write_error = |e: std::io::Error| AppError::FileWrite {
            path: output_path.clone(),
            source: e,
        };

        let file = File::create(output_path).map_err(to_write_error)?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            write!(
                writer,
                "=== {} ===\n{}\n\n",
                entry.path.display(),
                entry.content
            )
            .map_err(to_write_error)?;
        }
        writer.flush().map_err(to_write_error)
    }
}

fn is_recent(line: &str, cutoff: NaiveDateTime) -> bool {
    TIMESTAMP_PREFIX
        .find(line)
        .and_then(|m| NaiveDateTime::parse_from_str(m.as_str(), TIMESTAMP_FORMAT).ok())
        .is_some_and(|stamp| stamp >= cutoff)
}

/// Level of the first bracketed token on the line, if it names a known level.
fn line_level(line: &str) -> Option<LogLevel> {
    BRACKETED_TOKEN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|token| LogLevel::parse(token.as_str()))
}
