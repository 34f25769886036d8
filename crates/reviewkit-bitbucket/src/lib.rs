//! # reviewkit-bitbucket
//!
//! Reads pull requests and their comments from Bitbucket Cloud.
//!
//! ## Overview
//!
//! - [`Paginator`] follows `next` cursors across pages, retrying 429/500/502/503/504
//!   responses with exponential backoff ([`RetryPolicy`])
//! - [`BitbucketClient`] lists pull requests and flattens their comments into
//!   [`CommentRecord`]s, optionally keeping only one author's comments
//! - [`Transport`] and [`Sleeper`] are the I/O seams; [`ReqwestTransport`] and
//!   [`TokioSleeper`] are the production implementations and [`fakes`]
//!   provides scripted ones for tests

mod client;
mod comments;
mod error;
pub mod fakes;
mod paginate;
mod retry;
mod sleeper;
mod transport;

pub use client::{
    BitbucketClient, ExportProgress, ProgressCallback, RepositoryRef, DEFAULT_API_BASE,
    DEFAULT_WEB_BASE, INTER_PULL_REQUEST_DELAY, PULL_REQUEST_STATES,
};
pub use comments::{CommentRecord, PullRequest, PullRequestComment, GENERAL_COMMENT};
pub use error::ApiError;
pub use paginate::Paginator;
pub use retry::RetryPolicy;
pub use sleeper::{Sleeper, TokioSleeper};
pub use transport::{Credentials, HttpResponse, ReqwestTransport, Transport, REQUEST_TIMEOUT};
