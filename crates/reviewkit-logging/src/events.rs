use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for review and export runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    ReviewStarted {
        working_dir: PathBuf,
        base_branch: String,
        current_branch: Option<String>,
    },
    MergeBaseResolved {
        base_branch: String,
        merge_base: String,
    },
    DiffParsed {
        files_changed: usize,
        hunks: usize,
        insertions: usize,
        deletions: usize,
        skipped_hunks: usize,
    },
    ReportWritten {
        path: PathBuf,
    },
    ExportStarted {
        workspace: String,
        repo_slug: String,
    },
    PullRequestsListed {
        count: usize,
    },
    PullRequestScanned {
        index: usize,
        total: usize,
        pr_id: u64,
        title: String,
        comments_kept: usize,
    },
    ExportCompleted {
        comments: usize,
        output: PathBuf,
    },
    ErrorEncountered {
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for reviewkit events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::ReviewStarted {
                working_dir,
                base_branch,
                current_branch,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {} {} {}",
                    "▶".bright_cyan(),
                    "REVIEW".bright_cyan().bold(),
                    current_branch.as_deref().unwrap_or("unknown").bold(),
                    format!("vs {}", base_branch).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "    {} {}",
                    "Dir:".dimmed(),
                    working_dir.display().to_string().dimmed()
                );
            }
            LogEvent::MergeBaseResolved { merge_base, .. } => {
                let short = merge_base.get(..8).unwrap_or(merge_base);
                let _ = writeln!(stderr, "    {} {}", "Merge base:".dimmed(), short);
            }
            LogEvent::DiffParsed {
                files_changed,
                hunks,
                insertions,
                deletions,
                skipped_hunks,
            } => {
                if *files_changed > 0 {
                    let _ = writeln!(
                        stderr,
                        "    {} {} {}, {} {}, {} {}",
                        "Diff:".dimmed(),
                        files_changed,
                        if *files_changed == 1 { "file" } else { "files" },
                        hunks,
                        if *hunks == 1 { "hunk" } else { "hunks" },
                        format!("+{}", insertions).green(),
                        format!("-{}", deletions).red()
                    );
                } else {
                    let _ = writeln!(stderr, "    {}", "Diff: no changes".dimmed());
                }
                if *skipped_hunks > 0 {
                    let _ = writeln!(
                        stderr,
                        "    {} {} malformed hunk header(s) skipped",
                        "⚠".bright_yellow(),
                        skipped_hunks
                    );
                }
            }
            LogEvent::ReportWritten { path } => {
                let _ = writeln!(
                    stderr,
                    "{} Report written to {}",
                    "✓".bright_green(),
                    path.display()
                );
            }
            LogEvent::ExportStarted {
                workspace,
                repo_slug,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {} {}",
                    "▶".bright_magenta(),
                    "EXPORT".bright_magenta().bold(),
                    format!("{}/{}", workspace, repo_slug).bold()
                );
            }
            LogEvent::PullRequestsListed { count } => {
                let _ = writeln!(stderr, "    Found {} PRs to scan", count);
            }
            LogEvent::PullRequestScanned {
                index,
                total,
                pr_id,
                title,
                comments_kept,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} #{} {} {}",
                    format!("[{}/{}]", index, total).dimmed(),
                    pr_id,
                    truncate(title, 50),
                    format!("({} comments)", comments_kept).dimmed()
                );
            }
            LogEvent::ExportCompleted { comments, output } => {
                let _ = writeln!(
                    stderr,
                    "{} Exported {} comments to {}",
                    "✓".bright_green(),
                    comments,
                    output.display()
                );
            }
            LogEvent::ErrorEncountered { error } => {
                let _ = writeln!(stderr, "{} {}", "✗".bright_red(), error.bright_red());
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let timestamp = chrono::Utc::now().format("%H:%M:%S").to_string();
        let _ = writeln!(std::io::stderr(), "{}", compact_line(event, &timestamp));
    }
}

fn compact_line(event: &LogEvent, timestamp: &str) -> String {
    match event {
        LogEvent::ReviewStarted {
            base_branch,
            current_branch,
            ..
        } => format!(
            "[{}] review:start {}..{}",
            timestamp,
            base_branch,
            current_branch.as_deref().unwrap_or("?")
        ),
        LogEvent::MergeBaseResolved { merge_base, .. } => {
            format!("[{}] git:merge-base {}", timestamp, merge_base)
        }
        LogEvent::DiffParsed {
            files_changed,
            hunks,
            insertions,
            deletions,
            skipped_hunks,
        } => format!(
            "[{}] diff:{}f {}h +{} -{} skipped={}",
            timestamp, files_changed, hunks, insertions, deletions, skipped_hunks
        ),
        LogEvent::ReportWritten { path } => {
            format!("[{}] report:{}", timestamp, path.display())
        }
        LogEvent::ExportStarted {
            workspace,
            repo_slug,
        } => format!("[{}] export:start {}/{}", timestamp, workspace, repo_slug),
        LogEvent::PullRequestsListed { count } => format!("[{}] export:prs {}", timestamp, count),
        LogEvent::PullRequestScanned {
            index,
            total,
            pr_id,
            comments_kept,
            ..
        } => format!(
            "[{}] export:pr {}/{} #{} kept={}",
            timestamp, index, total, pr_id, comments_kept
        ),
        LogEvent::ExportCompleted { comments, output } => format!(
            "[{}] export:done {} -> {}",
            timestamp,
            comments,
            output.display()
        ),
        LogEvent::ErrorEncountered { error } => format!("[{}] error:{}", timestamp, error),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
