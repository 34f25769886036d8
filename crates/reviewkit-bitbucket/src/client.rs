use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::{ApiError, CommentRecord, Paginator, PullRequest, PullRequestComment};

/// Default REST API root
pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

/// Default web root used for pull request links
pub const DEFAULT_WEB_BASE: &str = "https://bitbucket.org";

/// Pull request states included in the listing
pub const PULL_REQUEST_STATES: [&str; 3] = ["MERGED", "OPEN", "DECLINED"];

/// Pause between pull requests while collecting comments
pub const INTER_PULL_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Which repository to read and where the API lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub api_base: String,
    pub web_base: String,
    pub workspace: String,
    pub repo_slug: String,
}

impl RepositoryRef {
    pub fn new(workspace: impl Into<String>, repo_slug: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            workspace: workspace.into(),
            repo_slug: repo_slug.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn repository_url(&self) -> String {
        format!(
            "{}/repositories/{}/{}",
            self.api_base, self.workspace, self.repo_slug
        )
    }

    pub fn pull_requests_url(&self) -> String {
        let states = PULL_REQUEST_STATES
            .iter()
            .map(|s| format!("state={}", s))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/pullrequests?{}", self.repository_url(), states)
    }

    pub fn comments_url(&self, pr_id: u64) -> String {
        format!("{}/pullrequests/{}/comments", self.repository_url(), pr_id)
    }

    pub fn pull_request_web_url(&self, pr_id: u64) -> String {
        format!(
            "{}/{}/{}/pull-requests/{}",
            self.web_base, self.workspace, self.repo_slug, pr_id
        )
    }
}

/// Progress notifications emitted while collecting comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportProgress {
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
}

/// Callback for export progress
pub type ProgressCallback = Arc<dyn Fn(&ExportProgress) + Send + Sync>;

/// Reads pull requests and their comments from one repository
pub struct BitbucketClient {
    paginator: Paginator,
    repository: RepositoryRef,
    inter_pr_delay: Duration,
}

impl BitbucketClient {
    pub fn new(paginator: Paginator, repository: RepositoryRef) -> Self {
        Self {
            paginator,
            repository,
            inter_pr_delay: INTER_PULL_REQUEST_DELAY,
        }
    }

    pub fn with_inter_pr_delay(mut self, delay: Duration) -> Self {
        self.inter_pr_delay = delay;
        self
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    /// All merged, open and declined pull requests, in listing order
    pub async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, ApiError> {
        let url = self.repository.pull_requests_url();
        let values = self.paginator.fetch_all(&url).await?;
        decode_all(&url, values)
    }

    /// Every comment on one pull request, in page order
    pub async fn pull_request_comments(
        &self,
        pr_id: u64,
    ) -> Result<Vec<PullRequestComment>, ApiError> {
        let url = self.repository.comments_url(pr_id);
        let values = self.paginator.fetch_all(&url).await?;
        decode_all(&url, values)
    }

    /// Flatten the comments of `prs` into records.
    ///
    /// Output follows PR order, then comment page order. With `author` set,
    /// only comments whose `user.account_id` equals it are kept.
    pub async fn collect_comments(
        &self,
        prs: &[PullRequest],
        author: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<CommentRecord>, ApiError> {
        let mut records = Vec::new();
        let total = prs.len();

        for (idx, pr) in prs.iter().enumerate() {
            if idx > 0 && !self.inter_pr_delay.is_zero() {
                self.paginator.sleeper().sleep(self.inter_pr_delay).await;
            }

            let comments = self.pull_request_comments(pr.id).await?;
            let fetched = comments.len();
            let before = records.len();

            records.extend(
                comments
                    .into_iter()
                    .filter(|c| c.is_authored_by(author))
                    .map(|c| {
                        CommentRecord::flatten(pr, self.repository.pull_request_web_url(pr.id), c)
                    }),
            );

            let kept = records.len() - before;
            debug!(pr_id = pr.id, fetched, kept, "Scanned pull request");

            if let Some(ref callback) = on_progress {
                callback(&ExportProgress::PullRequestScanned {
                    index: idx + 1,
                    total,
                    pr_id: pr.id,
                    title: pr.title.clone(),
                    comments_kept: kept,
                });
            }
        }

        Ok(records)
    }

    /// List pull requests and collect their comments
    pub async fn export_comments(
        &self,
        author: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<CommentRecord>, ApiError> {
        info!(
            workspace = %self.repository.workspace,
            repo = %self.repository.repo_slug,
            author = ?author,
            "Exporting pull request comments"
        );

        let prs = self.list_pull_requests().await?;
        if let Some(ref callback) = on_progress {
            callback(&ExportProgress::PullRequestsListed { count: prs.len() });
        }

        let records = self.collect_comments(&prs, author, on_progress).await?;
        info!(
            pull_requests = prs.len(),
            comments = records.len(),
            "Export complete"
        );
        Ok(records)
    }
}

fn decode_all<T: DeserializeOwned>(url: &str, values: Vec<Value>) -> Result<Vec<T>, ApiError> {
    values
        .into_iter()
        .map(|v| {
            serde_json::from_value(v).map_err(|e| ApiError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let repo = RepositoryRef::new("acme", "widgets").with_api_base("http://localhost:9/2.0/");

        assert_eq!(
            repo.pull_requests_url(),
            "http://localhost:9/2.0/repositories/acme/widgets/pullrequests?state=MERGED&state=OPEN&state=DECLINED"
        );
        assert_eq!(
            repo.comments_url(42),
            "http://localhost:9/2.0/repositories/acme/widgets/pullrequests/42/comments"
        );
        assert_eq!(
            repo.pull_request_web_url(42),
            "https://bitbucket.org/acme/widgets/pull-requests/42"
        );
    }
}
