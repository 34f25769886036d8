use std::sync::{Arc, Mutex};
use std::time::Duration;

use reviewkit_bitbucket::fakes::{FakeTransport, RecordingSleeper};
use reviewkit_bitbucket::{
    ApiError, BitbucketClient, ExportProgress, Paginator, ProgressCallback, PullRequest,
    RepositoryRef, GENERAL_COMMENT,
};
use serde_json::{json, Value};

const API: &str = "https://api.test/2.0";

fn repository() -> RepositoryRef {
    RepositoryRef::new("acme", "widgets").with_api_base(API)
}

fn client(transport: &Arc<FakeTransport>, sleeper: &Arc<RecordingSleeper>) -> BitbucketClient {
    BitbucketClient::new(
        Paginator::new(transport.clone(), sleeper.clone()),
        repository(),
    )
}

fn comment(id: u64, author: &str, raw: &str) -> Value {
    json!({
        "id": id,
        "content": {"raw": raw},
        "user": {"account_id": author},
        "created_on": "2026-02-01T09:00:00+00:00",
        "updated_on": "2026-02-01T09:00:00+00:00"
    })
}

/// Two PRs, five comments: PR 1 spans two comment pages
fn seed_listing(transport: &FakeTransport) {
    let repo = repository();
    let prs_page_2 = format!("{}&page=2", repo.pull_requests_url());
    transport.respond_json(
        &repo.pull_requests_url(),
        &json!({"values": [{"id": 1, "title": "First"}], "next": prs_page_2}),
    );
    transport.respond_json(&prs_page_2, &json!({"values": [{"id": 2, "title": "Second"}]}));

    let pr1_page_2 = format!("{}?page=2", repo.comments_url(1));
    transport.respond_json(
        &repo.comments_url(1),
        &json!({
            "values": [comment(10, "me", "first mine"), comment(11, "other", "theirs")],
            "next": pr1_page_2
        }),
    );
    let mut inline = comment(12, "other", "also theirs");
    inline["inline"] = json!({"path": "app.py", "to": 4});
    transport.respond_json(&pr1_page_2, &json!({"values": [inline]}));

    let mut mine_inline = comment(20, "me", "second mine");
    mine_inline["inline"] = json!({"path": "util.py", "to": 17});
    transport.respond_json(
        &repo.comments_url(2),
        &json!({"values": [comment(21, "someone", "nope"), mine_inline]}),
    );
}

#[tokio::test]
async fn test_author_filter_keeps_matching_comments_in_order() {
    let transport = Arc::new(FakeTransport::new());
    seed_listing(&transport);
    let sleeper = Arc::new(RecordingSleeper::new());

    let records = client(&transport, &sleeper)
        .export_comments(Some("me"), None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].comment_id, Some(10));
    assert_eq!(records[0].pr_id, 1);
    assert_eq!(records[0].file_path, GENERAL_COMMENT);
    assert_eq!(records[0].line, None);
    assert_eq!(records[1].comment_id, Some(20));
    assert_eq!(records[1].pr_title, "Second");
    assert_eq!(records[1].file_path, "util.py");
    assert_eq!(records[1].line, Some(17));
    assert_eq!(
        records[1].pr_url,
        "https://bitbucket.org/acme/widgets/pull-requests/2"
    );
}

#[tokio::test]
async fn test_without_filter_all_comments_follow_pr_then_page_order() {
    let transport = Arc::new(FakeTransport::new());
    seed_listing(&transport);
    let sleeper = Arc::new(RecordingSleeper::new());

    let records = client(&transport, &sleeper)
        .export_comments(None, None)
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().filter_map(|r| r.comment_id).collect();
    assert_eq!(ids, vec![10, 11, 12, 21, 20]);
}

#[tokio::test]
async fn test_delay_only_between_pull_requests() {
    let transport = Arc::new(FakeTransport::new());
    seed_listing(&transport);
    let sleeper = Arc::new(RecordingSleeper::new());

    client(&transport, &sleeper)
        .export_comments(None, None)
        .await
        .unwrap();

    assert_eq!(sleeper.slept(), vec![Duration::from_millis(100)]);
}

#[tokio::test]
async fn test_progress_is_reported() {
    let transport = Arc::new(FakeTransport::new());
    seed_listing(&transport);
    let sleeper = Arc::new(RecordingSleeper::new());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressCallback = Arc::new(move |event: &ExportProgress| {
        sink.lock().unwrap().push(event.clone());
    });

    client(&transport, &sleeper)
        .with_inter_pr_delay(Duration::ZERO)
        .export_comments(Some("me"), Some(callback))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ExportProgress::PullRequestsListed { count: 2 },
            ExportProgress::PullRequestScanned {
                index: 1,
                total: 2,
                pr_id: 1,
                title: "First".to_string(),
                comments_kept: 1,
            },
            ExportProgress::PullRequestScanned {
                index: 2,
                total: 2,
                pr_id: 2,
                title: "Second".to_string(),
                comments_kept: 1,
            },
        ]
    );
    assert!(sleeper.slept().is_empty());
}

#[tokio::test]
async fn test_collect_comments_for_given_pull_requests() {
    let transport = Arc::new(FakeTransport::new());
    seed_listing(&transport);
    let sleeper = Arc::new(RecordingSleeper::new());

    let prs = vec![PullRequest {
        id: 2,
        title: "Second".to_string(),
    }];
    let records = client(&transport, &sleeper)
        .collect_comments(&prs, None, None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.pr_id == 2));
}

#[tokio::test]
async fn test_missing_comment_listing_fails() {
    let transport = Arc::new(FakeTransport::new());
    let sleeper = Arc::new(RecordingSleeper::new());

    let prs = vec![PullRequest {
        id: 99,
        title: "Gone".to_string(),
    }];
    let err = client(&transport, &sleeper)
        .collect_comments(&prs, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 404, .. }));
}

#[tokio::test]
async fn test_malformed_pull_request_is_decode_error() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond_json(
        &repository().pull_requests_url(),
        &json!({"values": [{"title": "no id"}]}),
    );
    let sleeper = Arc::new(RecordingSleeper::new());

    let err = client(&transport, &sleeper)
        .list_pull_requests()
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
}
