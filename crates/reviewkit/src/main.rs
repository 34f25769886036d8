use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use reviewkit_core::{ReviewContext, ReviewRunner};
use reviewkit_git::Git;
use reviewkit_logging::{init_tracing, LogFormat, Logger};
use reviewkit_report::{format_review_comment, ReviewPrompts};

mod config;
mod export;

use config::ProjectConfig;
use export::{handle_export_command, ExportArgs};

#[derive(Parser, Debug)]
#[command(
    name = "reviewkit",
    about = "Branch diff review prompts and Bitbucket comment export",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Working directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    working_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Tracing level (RUST_LOG overrides)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also append JSON log events to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the diff of the current branch against its merge base
    Diff(ReviewArgs),

    /// List files changed on the current branch
    Files(ReviewArgs),

    /// Build a review request for the branch diff
    Review {
        #[command(flatten)]
        review: ReviewArgs,

        /// Comma-separated focus areas: types, docs, style, errors, performance, architecture or all
        #[arg(long)]
        focus: Option<String>,
    },

    /// Build a review request for a single file
    ReviewFile {
        /// File to review (relative to the working directory unless absolute)
        path: PathBuf,

        /// Reviewer persona markdown file
        #[arg(long)]
        persona: Option<PathBuf>,
    },

    /// Show the active reviewer persona
    Persona {
        /// Reviewer persona markdown file
        #[arg(long)]
        persona: Option<PathBuf>,
    },

    /// Print the review checklist
    Checklist,

    /// Write a markdown review report
    Report {
        #[command(flatten)]
        review: ReviewArgs,

        /// Report path (default: .code_review.md in the repository root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Format a single review comment
    Comment {
        /// File the comment refers to
        file: String,

        /// Comment text
        comment: String,

        /// Line number
        #[arg(short, long)]
        line: Option<u32>,

        /// critical, warning, suggestion, question or praise
        #[arg(short, long, default_value = "suggestion")]
        severity: String,
    },

    /// Export pull request comments from Bitbucket Cloud as JSON
    ExportComments(ExportArgs),
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Base branch to compare against (default: development)
    #[arg(short, long)]
    base: Option<String>,

    /// Pathspec restricting the diff (default: *.py)
    #[arg(short, long)]
    filter: Option<String>,

    /// Reviewer persona markdown file
    #[arg(long)]
    persona: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    // Determine working directory
    let working_dir = match cli.working_dir {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = ProjectConfig::load(&working_dir)?.unwrap_or_default();

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);
    let runner = ReviewRunner::new(Git::new(), logger.clone());

    match cli.command {
        Commands::Diff(args) => {
            let ctx = review_context(&working_dir, &args, &config);
            println!("{}", runner.branch_diff(&ctx).await?);
        }
        Commands::Files(args) => {
            let ctx = review_context(&working_dir, &args, &config);
            println!("{}", runner.changed_files(&ctx).await?);
        }
        Commands::Review { review, focus } => {
            let mut ctx = review_context(&working_dir, &review, &config);
            if let Some(focus) = focus.or_else(|| config.focus_areas.clone()) {
                ctx = ctx.with_focus_areas(focus);
            }
            println!("{}", runner.review_diff(&ctx).await?);
        }
        Commands::ReviewFile { path, persona } => {
            let ctx = persona_context(&working_dir, persona, &config);
            println!("{}", runner.review_file(&ctx, &path).await?);
        }
        Commands::Persona { persona } => {
            let ctx = persona_context(&working_dir, persona, &config);
            let persona = runner.persona(&ctx).await;
            println!("{}", ReviewPrompts::persona_view(&persona));
        }
        Commands::Checklist => {
            println!("{}", ReviewPrompts::checklist());
        }
        Commands::Report { review, output } => {
            let ctx = review_context(&working_dir, &review, &config);
            let outcome = runner.generate_report(&ctx, output.as_deref()).await;
            println!("{}", outcome);
            if !outcome.is_written() {
                std::process::exit(outcome.exit_code());
            }
        }
        Commands::Comment {
            file,
            comment,
            line,
            severity,
        } => {
            print!("{}", format_review_comment(&file, line, &comment, &severity));
        }
        Commands::ExportComments(args) => {
            handle_export_command(args, &config.bitbucket, logger).await?;
        }
    }

    Ok(())
}

/// Flags first, then `reviewkit.toml`, then built-in defaults
fn review_context(working_dir: &Path, args: &ReviewArgs, config: &ProjectConfig) -> ReviewContext {
    let mut ctx = persona_context(working_dir, args.persona.clone(), config);
    if let Some(base) = args.base.clone().or_else(|| config.base_branch.clone()) {
        ctx = ctx.with_base_branch(base);
    }
    if let Some(filter) = args.filter.clone().or_else(|| config.file_filter.clone()) {
        ctx = ctx.with_file_filter(filter);
    }
    ctx
}

fn persona_context(
    working_dir: &Path,
    persona: Option<PathBuf>,
    config: &ProjectConfig,
) -> ReviewContext {
    ReviewContext::new(working_dir.to_path_buf())
        .with_persona_file(persona.or_else(|| config.persona_file.clone()))
}
