use std::sync::Arc;
use std::time::Duration;

use reviewkit_bitbucket::fakes::{FakeTransport, RecordingSleeper};
use reviewkit_bitbucket::{ApiError, Paginator};
use serde_json::json;

const PAGE_1: &str = "https://api.test/2.0/items";
const PAGE_2: &str = "https://api.test/2.0/items?page=2";
const PAGE_3: &str = "https://api.test/2.0/items?page=3";

fn three_page_listing(transport: &FakeTransport) {
    transport.respond_json(PAGE_1, &json!({"values": ["a", "b"], "next": PAGE_2}));
    transport.respond(PAGE_2, 503, "Service Unavailable");
    transport.respond(PAGE_2, 503, "Service Unavailable");
    transport.respond_json(PAGE_2, &json!({"values": ["c", "d"], "next": PAGE_3}));
    transport.respond_json(PAGE_3, &json!({"values": ["e"]}));
}

#[tokio::test]
async fn test_transient_failures_mid_listing_are_retried() {
    let transport = Arc::new(FakeTransport::new());
    three_page_listing(&transport);
    let sleeper = Arc::new(RecordingSleeper::new());

    let items = Paginator::new(transport.clone(), sleeper.clone())
        .fetch_all(PAGE_1)
        .await
        .unwrap();

    assert_eq!(
        items,
        vec![json!("a"), json!("b"), json!("c"), json!("d"), json!("e")]
    );
    assert_eq!(
        transport.requests(),
        vec![PAGE_1, PAGE_2, PAGE_2, PAGE_2, PAGE_3]
    );

    // Exactly two retries, each waiting longer than the one before
    let slept = sleeper.slept();
    assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    assert!(slept[1] > slept[0]);
}

#[tokio::test]
async fn test_exhausted_retries_surface_instead_of_partial_result() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond_json(PAGE_1, &json!({"values": ["a"], "next": PAGE_2}));
    for _ in 0..4 {
        transport.respond(PAGE_2, 502, "Bad Gateway");
    }
    let sleeper = Arc::new(RecordingSleeper::new());

    let err = Paginator::new(transport.clone(), sleeper.clone())
        .fetch_all(PAGE_1)
        .await
        .unwrap_err();

    match err {
        ApiError::RetriesExhausted {
            status,
            attempts,
            url,
        } => {
            assert_eq!(status, 502);
            assert_eq!(attempts, 4);
            assert_eq!(url, PAGE_2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sleeper.slept().len(), 3);
}

#[tokio::test]
async fn test_unauthorized_mid_listing_stops_immediately() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond_json(PAGE_1, &json!({"values": ["a"], "next": PAGE_2}));
    transport.respond(PAGE_2, 401, "");
    let sleeper = Arc::new(RecordingSleeper::new());

    let err = Paginator::new(transport.clone(), sleeper.clone())
        .fetch_all(PAGE_1)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("Check your email and API token."));
    assert_eq!(transport.requests(), vec![PAGE_1, PAGE_2]);
    assert!(sleeper.slept().is_empty());
}
