use serde::{Deserialize, Serialize};

/// `file_path` value for comments that are not attached to a file
pub const GENERAL_COMMENT: &str = "General comment";

/// A pull request as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CommentContent {
    #[serde(default)]
    raw: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InlineAnchor {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    to: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CommentAuthor {
    #[serde(default)]
    account_id: Option<String>,
}

/// A pull request comment as returned by the comments endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestComment {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    content: Option<CommentContent>,
    #[serde(default)]
    inline: Option<InlineAnchor>,
    #[serde(default)]
    user: Option<CommentAuthor>,
    #[serde(default)]
    created_on: Option<String>,
    #[serde(default)]
    updated_on: Option<String>,
}

impl PullRequestComment {
    pub fn author_id(&self) -> Option<&str> {
        self.user.as_ref()?.account_id.as_deref()
    }

    /// `true` when no filter is set or the author matches it
    pub fn is_authored_by(&self, filter: Option<&str>) -> bool {
        match filter {
            Some(account_id) => self.author_id() == Some(account_id),
            None => true,
        }
    }
}

/// One exported comment, flattened with its pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub pr_id: u64,
    pub pr_title: String,
    pub pr_url: String,
    pub comment_id: Option<u64>,
    pub content: String,
    pub file_path: String,
    pub line: Option<u64>,
    pub created_on: String,
    pub updated_on: String,
}

impl CommentRecord {
    pub fn flatten(pr: &PullRequest, pr_url: String, comment: PullRequestComment) -> Self {
        let (file_path, line) = match comment.inline {
            Some(anchor) => (
                anchor.path.unwrap_or_else(|| GENERAL_COMMENT.to_string()),
                anchor.to,
            ),
            None => (GENERAL_COMMENT.to_string(), None),
        };

        Self {
            pr_id: pr.id,
            pr_title: pr.title.clone(),
            pr_url,
            comment_id: comment.id,
            content: comment.content.and_then(|c| c.raw).unwrap_or_default(),
            file_path,
            line,
            created_on: comment.created_on.unwrap_or_default(),
            updated_on: comment.updated_on.unwrap_or_default(),
        }
    }

    pub fn is_inline(&self) -> bool {
        self.file_path != GENERAL_COMMENT
    }
}
