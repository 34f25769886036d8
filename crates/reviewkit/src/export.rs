use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use reviewkit_bitbucket::{
    ApiError, BitbucketClient, CommentRecord, Credentials, ExportProgress, Paginator,
    ProgressCallback, ReqwestTransport, RepositoryRef, TokioSleeper,
};
use reviewkit_logging::{LogEvent, Logger};

use crate::config::BitbucketConfig;

const PLACEHOLDER_WORKSPACE: &str = "your-workspace";
const PLACEHOLDER_REPO: &str = "your-repo";

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Atlassian account email
    #[arg(long, env = "ATLASSIAN_EMAIL")]
    email: Option<String>,

    /// Bitbucket API token
    #[arg(long, env = "BITBUCKET_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Bitbucket workspace
    #[arg(long, env = "BITBUCKET_WORKSPACE")]
    workspace: Option<String>,

    /// Repository slug
    #[arg(long = "repo", env = "BITBUCKET_REPO_SLUG")]
    repo_slug: Option<String>,

    /// Keep only comments written by this account id
    #[arg(long, env = "BITBUCKET_ACCOUNT_ID")]
    account_id: Option<String>,

    /// Export comments from every author, ignoring any configured account id
    #[arg(long)]
    all_authors: bool,

    /// Output JSON file
    #[arg(short, long, default_value = "pr_comments.json")]
    output: PathBuf,

    /// API root (for Bitbucket-compatible mirrors)
    #[arg(long)]
    api_base: Option<String>,
}

/// Fully resolved export settings
#[derive(Debug)]
struct ExportSettings {
    credentials: Credentials,
    repository: RepositoryRef,
    author: Option<String>,
    output: PathBuf,
}

impl ExportSettings {
    /// Flags and environment win over the `[bitbucket]` config table
    fn resolve(args: ExportArgs, config: &BitbucketConfig) -> Result<Self> {
        let (Some(email), Some(token)) = (args.email, args.token) else {
            bail!(
                "Missing credentials.\n\
                 Provide --email and --token, or set ATLASSIAN_EMAIL and BITBUCKET_API_TOKEN environment variables."
            );
        };

        let workspace = args
            .workspace
            .or_else(|| config.workspace.clone())
            .filter(|w| !w.is_empty() && w != PLACEHOLDER_WORKSPACE);
        let repo_slug = args
            .repo_slug
            .or_else(|| config.repo_slug.clone())
            .filter(|r| !r.is_empty() && r != PLACEHOLDER_REPO);
        let (Some(workspace), Some(repo_slug)) = (workspace, repo_slug) else {
            bail!(
                "Workspace and repository must be specified.\n\
                 Provide --workspace and --repo, or set BITBUCKET_WORKSPACE and BITBUCKET_REPO_SLUG environment variables."
            );
        };

        let mut repository = RepositoryRef::new(workspace, repo_slug);
        if let Some(api_base) = args.api_base.or_else(|| config.api_base.clone()) {
            repository = repository.with_api_base(api_base);
        }

        // An empty account id means every author
        let author = if args.all_authors {
            None
        } else {
            args.account_id
                .or_else(|| config.account_id.clone())
                .filter(|a| !a.is_empty())
        };

        Ok(Self {
            credentials: Credentials::new(email, token),
            repository,
            author,
            output: args.output,
        })
    }
}

pub async fn handle_export_command(
    args: ExportArgs,
    config: &BitbucketConfig,
    logger: Arc<Logger>,
) -> Result<()> {
    let settings = ExportSettings::resolve(args, config)?;

    logger.log(&LogEvent::ExportStarted {
        workspace: settings.repository.workspace.clone(),
        repo_slug: settings.repository.repo_slug.clone(),
    });

    let transport = ReqwestTransport::new(Some(settings.credentials))
        .context("Failed to build HTTP client")?;
    let paginator = Paginator::new(Arc::new(transport), Arc::new(TokioSleeper));
    let client = BitbucketClient::new(paginator, settings.repository);

    let records = client
        .export_comments(settings.author.as_deref(), Some(progress_logger(logger.clone())))
        .await
        .map_err(|e| {
            logger.log(&LogEvent::ErrorEncountered {
                error: e.to_string(),
            });
            anyhow::anyhow!(describe_api_error(&e))
        })?;

    write_records(&settings.output, &records).await?;

    logger.log(&LogEvent::ExportCompleted {
        comments: records.len(),
        output: settings.output.clone(),
    });
    eprintln!(
        "{} Exported {} comments to {}",
        "✓".bright_green(),
        records.len(),
        settings.output.display()
    );

    Ok(())
}

/// Write `records` as a pretty JSON array
async fn write_records(path: &Path, records: &[CommentRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn progress_logger(logger: Arc<Logger>) -> ProgressCallback {
    Arc::new(move |progress: &ExportProgress| {
        let event = match progress {
            ExportProgress::PullRequestsListed { count } => {
                LogEvent::PullRequestsListed { count: *count }
            }
            ExportProgress::PullRequestScanned {
                index,
                total,
                pr_id,
                title,
                comments_kept,
            } => LogEvent::PullRequestScanned {
                index: *index,
                total: *total,
                pr_id: *pr_id,
                title: title.clone(),
                comments_kept: *comments_kept,
            },
        };
        logger.log(&event);
    })
}

fn describe_api_error(err: &ApiError) -> String {
    match err {
        ApiError::Auth { status: 401, .. } => {
            "Authentication failed. Check your email and API token.".to_string()
        }
        ApiError::Auth { .. } => "Access denied. Ensure your API token has the required scopes:\n  \
             - read:repository:bitbucket\n  \
             - read:pullrequest:bitbucket"
            .to_string(),
        ApiError::Network(_) => format!("{}", err),
        _ => format!("API request failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        export: ExportArgs,
    }

    fn parse(args: &[&str]) -> ExportArgs {
        let argv = std::iter::once("reviewkit").chain(args.iter().copied());
        TestCli::parse_from(argv).export
    }

    const CREDS: [&str; 4] = ["--email", "me@example.com", "--token", "t0k"];

    #[test]
    fn test_missing_credentials() {
        let args = parse(&["--email", "me@example.com", "--workspace", "acme", "--repo", "w"]);
        let args = ExportArgs { token: None, ..args };

        let err = ExportSettings::resolve(args, &BitbucketConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Missing credentials"));
    }

    #[test]
    fn test_placeholder_workspace_rejected() {
        let mut argv = CREDS.to_vec();
        argv.extend(["--workspace", "your-workspace", "--repo", "widgets"]);
        let args = parse(&argv);

        let err = ExportSettings::resolve(args, &BitbucketConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Workspace and repository must be specified"));
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let args = ExportArgs {
            workspace: None,
            repo_slug: None,
            account_id: None,
            api_base: None,
            ..parse(&CREDS)
        };
        let config = BitbucketConfig {
            workspace: Some("acme".to_string()),
            repo_slug: Some("widgets".to_string()),
            account_id: Some("abc".to_string()),
            api_base: Some("http://localhost:8080/2.0".to_string()),
        };

        let settings = ExportSettings::resolve(args, &config).unwrap();

        assert_eq!(settings.repository.workspace, "acme");
        assert_eq!(settings.repository.repo_slug, "widgets");
        assert_eq!(settings.repository.api_base, "http://localhost:8080/2.0");
        assert_eq!(settings.author.as_deref(), Some("abc"));
        assert_eq!(settings.output, PathBuf::from("pr_comments.json"));
    }

    #[test]
    fn test_flags_override_config() {
        let mut argv = CREDS.to_vec();
        argv.extend(["--workspace", "cli-ws", "--repo", "cli-repo"]);
        let args = parse(&argv);
        let config = BitbucketConfig {
            workspace: Some("file-ws".to_string()),
            repo_slug: Some("file-repo".to_string()),
            ..Default::default()
        };

        let settings = ExportSettings::resolve(args, &config).unwrap();

        assert_eq!(settings.repository.workspace, "cli-ws");
        assert_eq!(settings.repository.repo_slug, "cli-repo");
    }

    #[test]
    fn test_all_authors_drops_configured_filter() {
        let mut argv = CREDS.to_vec();
        argv.extend(["--workspace", "acme", "--repo", "widgets", "--all-authors"]);
        let args = ExportArgs {
            account_id: None,
            ..parse(&argv)
        };
        let config = BitbucketConfig {
            account_id: Some("abc".to_string()),
            ..Default::default()
        };

        let settings = ExportSettings::resolve(args, &config).unwrap();
        assert!(settings.author.is_none());
    }

    #[test]
    fn test_empty_account_id_exports_every_author() {
        let mut argv = CREDS.to_vec();
        argv.extend(["--workspace", "acme", "--repo", "widgets", "--account-id", ""]);
        let settings = ExportSettings::resolve(parse(&argv), &BitbucketConfig::default()).unwrap();
        assert!(settings.author.is_none());

        let args = ExportArgs {
            account_id: None,
            ..parse(&argv)
        };
        let config = BitbucketConfig {
            account_id: Some(String::new()),
            ..Default::default()
        };
        let settings = ExportSettings::resolve(args, &config).unwrap();
        assert!(settings.author.is_none());
    }

    #[tokio::test]
    async fn test_write_records_as_json_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pr_comments.json");
        let record = CommentRecord {
            pr_id: 7,
            pr_title: "Add parser".to_string(),
            pr_url: "https://bitbucket.org/acme/widgets/pull-requests/7".to_string(),
            comment_id: None,
            content: "LGTM".to_string(),
            file_path: "General comment".to_string(),
            line: None,
            created_on: String::new(),
            updated_on: String::new(),
        };

        write_records(&path, &[record]).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["pr_id"], 7);
        assert!(written[0]["line"].is_null());
    }

    #[tokio::test]
    async fn test_write_records_to_missing_dir_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.json");

        let err = write_records(&path, &[]).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to write"));
    }

    #[test]
    fn test_auth_error_descriptions() {
        let unauthorized = ApiError::Auth {
            status: 401,
            url: "u".to_string(),
            hint: "",
        };
        assert!(describe_api_error(&unauthorized).starts_with("Authentication failed"));

        let forbidden = ApiError::Auth {
            status: 403,
            url: "u".to_string(),
            hint: "",
        };
        assert!(describe_api_error(&forbidden).contains("read:pullrequest:bitbucket"));
    }
}
