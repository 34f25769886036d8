use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use reviewkit_core::{
    BranchDiffOutcome, ChangedFilesOutcome, DiffReviewOutcome, ReportOutcome, ReviewContext,
    ReviewError, ReviewRunner, DEFAULT_REPORT_FILE,
};
use reviewkit_git::{Git, GitError};
use reviewkit_logging::{LogFormat, Logger};
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// `development` with one Python file, `feature` changing it and adding another
fn create_feature_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    git(root, &["init", "-q"]);
    git(root, &["symbolic-ref", "HEAD", "refs/heads/development"]);
    fs::write(root.join("app.py"), "def main():\n    return 1\n").unwrap();
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "initial"]);

    git(root, &["checkout", "-q", "-b", "feature"]);
    fs::write(root.join("app.py"), "def main():\n    return 2\n").unwrap();
    fs::write(root.join("util.py"), "X = 1\n").unwrap();
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "feature work"]);

    dir
}

fn runner() -> ReviewRunner {
    ReviewRunner::new(Git::new(), Arc::new(Logger::new(LogFormat::Compact)))
}

#[tokio::test]
async fn test_branch_diff_with_changes() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf());

    let outcome = runner().branch_diff(&ctx).await.unwrap();

    let BranchDiffOutcome::Changes(ref diff) = outcome else {
        panic!("expected changes, got {outcome}");
    };
    assert_eq!(diff.current_branch, "feature");
    assert_eq!(diff.comparison.base_branch, "development");

    let text = outcome.to_string();
    assert!(text.contains("**Current Branch:** feature"));
    assert!(text.contains("**Filter:** *.py"));
    assert!(text.contains("+    return 2"));
}

#[tokio::test]
async fn test_branch_diff_without_matching_changes() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf()).with_file_filter("*.go");

    let outcome = runner().branch_diff(&ctx).await.unwrap();

    assert_eq!(
        outcome.to_string(),
        "No changes found in *.go files between development and feature."
    );
}

#[tokio::test]
async fn test_invalid_base_branch_is_reported() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf()).with_base_branch("nonexistent-branch");

    let err = runner().branch_diff(&ctx).await.unwrap_err();

    match err {
        ReviewError::GitError(GitError::InvalidBaseBranch { base, .. }) => {
            assert_eq!(base, "nonexistent-branch");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_detached_head_is_not_a_repository() {
    let repo = create_feature_repo();
    git(repo.path(), &["checkout", "-q", "--detach"]);
    let ctx = ReviewContext::new(repo.path().to_path_buf());

    let outcome = runner().branch_diff(&ctx).await.unwrap();

    assert!(matches!(outcome, BranchDiffOutcome::NotARepository));
}

#[tokio::test]
async fn test_changed_files() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf());

    let outcome = runner().changed_files(&ctx).await.unwrap();

    match &outcome {
        ChangedFilesOutcome::Files { files, .. } => {
            assert_eq!(files, &vec!["app.py".to_string(), "util.py".to_string()]);
        }
        other => panic!("unexpected outcome: {other}"),
    }
    assert!(outcome.to_string().starts_with("## Changed Files (2 files)"));
}

#[tokio::test]
async fn test_review_diff_builds_request() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf()).with_focus_areas("types,errors");

    let outcome = runner().review_diff(&ctx).await.unwrap();

    let DiffReviewOutcome::Ready {
        files,
        skipped_hunks,
        request,
    } = outcome
    else {
        panic!("expected a review request");
    };
    assert_eq!(files.paths().collect::<Vec<_>>(), vec!["app.py", "util.py"]);
    assert!(skipped_hunks.is_empty());
    assert!(request.contains("### Focus Areas: types,errors"));
    assert!(request.contains("- `util.py`: 1 hunk(s), +1 -0, starting at line(s) 1"));
}

#[tokio::test]
async fn test_review_diff_uses_repository_persona() {
    let repo = create_feature_repo();
    let notebooks = repo.path().join("notebooks");
    fs::create_dir(&notebooks).unwrap();
    fs::write(
        notebooks.join("code_reviewer_persona.md"),
        "Team persona: prefer small functions",
    )
    .unwrap();
    let ctx = ReviewContext::new(repo.path().to_path_buf());

    let outcome = runner().review_diff(&ctx).await.unwrap();

    assert!(outcome
        .to_string()
        .contains("Team persona: prefer small functions"));
}

#[tokio::test]
async fn test_review_file_numbers_lines() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf());

    let request = runner()
        .review_file(&ctx, Path::new("app.py"))
        .await
        .unwrap();

    assert!(request.contains("```python"));
    assert!(request.contains("   1 | def main():"));
    assert!(request.contains("   2 |     return 2"));
}

#[tokio::test]
async fn test_review_missing_file() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf());

    let err = runner()
        .review_file(&ctx, Path::new("missing.py"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReviewError::FileNotFound(ref p) if p.ends_with("missing.py")));
}

#[tokio::test]
async fn test_generate_report_in_repository_root() {
    let repo = create_feature_repo();
    let nested = repo.path().join("pkg");
    fs::create_dir(&nested).unwrap();
    let ctx = ReviewContext::new(nested);

    let outcome = runner().generate_report(&ctx, None).await;

    let ReportOutcome::Written { path } = outcome else {
        panic!("report was not written");
    };
    assert_eq!(
        path.canonicalize().unwrap(),
        repo.path().join(DEFAULT_REPORT_FILE).canonicalize().unwrap()
    );

    let report = fs::read_to_string(path).unwrap();
    assert!(report.starts_with("# Code Review Report"));
    assert!(report.contains("**Branch:** feature"));
    assert!(report.contains("## Changed Files (2 files)"));
    assert!(report.contains("# Code Review Checklist"));
}

#[tokio::test]
async fn test_generate_report_embeds_git_errors() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf()).with_base_branch("nonexistent-branch");

    let outcome = runner()
        .generate_report(&ctx, Some(Path::new("out.md")))
        .await;

    assert!(outcome.is_written());
    let report = fs::read_to_string(repo.path().join("out.md")).unwrap();
    assert!(report.contains("Error getting diff:"));
    assert!(report.contains("nonexistent-branch"));
}

#[tokio::test]
async fn test_generate_report_write_failure_returns_preview() {
    let repo = create_feature_repo();
    let ctx = ReviewContext::new(repo.path().to_path_buf());
    let unwritable = repo.path().join("missing-dir").join("report.md");

    let outcome = runner().generate_report(&ctx, Some(&unwritable)).await;

    match &outcome {
        ReportOutcome::WriteFailed { preview, .. } => {
            assert!(preview.starts_with("# Code Review Report"));
            assert!(preview.chars().count() <= 2000);
        }
        ReportOutcome::Written { .. } => panic!("write should fail"),
    }
    assert!(outcome.to_string().contains("Report content:"));
}
