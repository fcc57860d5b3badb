//! Integration tests for rooster-dash API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use rooster_common::events::EventBus;
use rooster_common::store::JsonStore;
use rooster_common::{Article, DashboardData, Priority, Subscription};
use rooster_dash::notify::{Notifier, NotifyError};
use rooster_dash::services::{JoinCombiner, SlackClient};
use rooster_dash::AppState;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Records every alert instead of sending it
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, u64)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, article: &Article) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((recipient.to_string(), article.id));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    notifier: Arc<RecordingNotifier>,
    root: TempDir,
}

fn article(id: u64, title: &str, priority: Priority, hours_ago: i64) -> Article {
    Article {
        id,
        title: title.to_string(),
        source: if id % 2 == 0 { "Handelsblatt".into() } else { "Reuters".into() },
        url: format!("https://example.com/{}", id),
        datetime: Utc::now() - Duration::hours(hours_ago),
        priority,
        summary: format!("Summary {}", id),
        context: String::new(),
        draft_text: format!("Draft {}", id),
        tags: Vec::new(),
        fingerprint: None,
    }
}

async fn create_test_app() -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp dir");

    let store = JsonStore::in_root(root.path());
    let mut txn = store.begin().await.unwrap();
    txn.data = DashboardData {
        articles: vec![
            article(1, "Fed signals rate pause", Priority::High, 2),
            article(2, "Oil prices slip", Priority::Low, 5),
            article(3, "Federal budget talks stall", Priority::Medium, 1),
            article(4, "Fed minutes released", Priority::Medium, 100),
        ],
        subscriptions: vec![Subscription {
            id: 1,
            email: "desk@example.com".into(),
            tags: vec!["Fed".into()],
            priorities: vec![Priority::High],
            notified_article_ids: vec![],
        }],
        ..Default::default()
    };
    txn.commit().await.unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(
        root.path(),
        Arc::new(JoinCombiner),
        notifier.clone(),
        Arc::new(SlackClient::unconfigured().unwrap()),
        EventBus::new(100),
    );

    TestApp {
        router: rooster_dash::build_router(state),
        notifier,
        root,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ids(value: &Value) -> Vec<u64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;
    let (status, body) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "rooster-dash");
}

#[tokio::test]
async fn test_articles_list_all_newest_first() {
    let app = create_test_app().await;
    let (status, body) = send(&app.router, "GET", "/api/articles", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![3, 1, 2, 4]);
}

#[tokio::test]
async fn test_articles_hours_window() {
    let app = create_test_app().await;
    let (_, body) = send(&app.router, "GET", "/api/articles?hours=3", None).await;
    assert_eq!(ids(&body), vec![3, 1]);

    // clamped to 72
    let (_, body) = send(&app.router, "GET", "/api/articles?hours=500", None).await;
    assert_eq!(ids(&body), vec![3, 1, 2]);
}

#[tokio::test]
async fn test_articles_priority_filter() {
    let app = create_test_app().await;
    let (_, body) = send(&app.router, "GET", "/api/articles?priorities=High,Niedrig&hours=24", None).await;
    assert_eq!(ids(&body), vec![1, 2]);

    let (status, body) = send(&app.router, "GET", "/api/articles?priorities=Urgent", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_process_tag_retags_and_notifies_once() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, "POST", "/api/tags/process", Some(json!({ "name": "Fed" }))).await;
    assert_eq!(status, StatusCode::OK);
    // Whole-word match: "Federal" is not tagged
    assert_eq!(body["matchedArticleIds"], json!([1, 4]));
    // Article 4 is Medium priority, the subscription wants High only
    assert_eq!(body["notificationsSent"], 1);
    assert_eq!(body["allTags"][0]["name"], "Fed");
    assert_eq!(body["updatedArticles"][0]["tags"], json!(["Fed"]));

    // Existing tag is reused case-insensitively and nothing is re-sent
    let (_, body) = send(&app.router, "POST", "/api/tags/process", Some(json!({ "name": "fed" }))).await;
    assert_eq!(body["allTags"].as_array().unwrap().len(), 1);
    assert_eq!(body["matchedArticleIds"], json!([1, 4]));
    assert_eq!(body["notificationsSent"], 0);

    assert_eq!(app.notifier.sent.lock().unwrap().clone(), vec![("desk@example.com".to_string(), 1)]);

    let store = JsonStore::in_root(app.root.path());
    let data = store.load().await.unwrap();
    assert_eq!(data.subscriptions[0].notified_article_ids, vec![1]);
}

/// Opens a store transaction from inside each send, recording what it saw
struct StoreReadingNotifier {
    store: JsonStore,
    seen: Mutex<Vec<Option<Vec<u64>>>>,
}

#[async_trait]
impl Notifier for StoreReadingNotifier {
    async fn notify(&self, _recipient: &str, _article: &Article) -> Result<(), NotifyError> {
        let txn = tokio::time::timeout(std::time::Duration::from_secs(2), self.store.begin()).await;
        let notified = match txn {
            Ok(Ok(txn)) => Some(txn.data.subscriptions[0].notified_article_ids.clone()),
            _ => None,
        };
        self.seen.lock().unwrap().push(notified);
        Ok(())
    }
}

#[tokio::test]
async fn test_process_tag_sends_after_commit_without_store_lock() {
    let app = create_test_app().await;
    let notifier = Arc::new(StoreReadingNotifier {
        store: JsonStore::in_root(app.root.path()),
        seen: Mutex::new(vec![]),
    });
    let state = AppState::new(
        app.root.path(),
        Arc::new(JoinCombiner),
        notifier.clone(),
        Arc::new(SlackClient::unconfigured().unwrap()),
        EventBus::new(100),
    );
    let router = rooster_dash::build_router(state);

    let (status, body) = send(&router, "POST", "/api/tags/process", Some(json!({ "name": "Fed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notificationsSent"], 1);
    // The store was free and already recorded the alert while it was being sent
    assert_eq!(notifier.seen.lock().unwrap().clone(), vec![Some(vec![1])]);
}

#[tokio::test]
async fn test_create_tag_rejects_duplicates() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, "POST", "/api/tags", Some(json!({ "name": "Zinsen" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);

    let (status, body) = send(&app.router, "POST", "/api/tags", Some(json!({ "name": "zinsen" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = send(&app.router, "GET", "/api/tags", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_subscribe_requires_email() {
    let app = create_test_app().await;

    let (status, _) = send(&app.router, "POST", "/api/subscribe", Some(json!({ "tags": ["Fed"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/subscribe",
        Some(json!({ "email": "new@example.com", "tags": ["Oil"], "priorities": ["Niedrig"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_string());

    let data = JsonStore::in_root(app.root.path()).load().await.unwrap();
    assert_eq!(data.subscriptions[1].id, 2);
    assert_eq!(data.subscriptions[1].priorities, vec![Priority::Low]);
}

#[tokio::test]
async fn test_compile_draft() {
    let app = create_test_app().await;
    let (status, body) = send(&app.router, "POST", "/api/draft/compile", Some(json!({ "articleIds": [3, 1] }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Draft 1\n\n---\n\nDraft 3");
    assert_eq!(body["sources"], json!([{ "name": "Reuters", "url": "https://example.com/1" }]));
}

#[tokio::test]
async fn test_combine_texts() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/draft/combine",
        Some(json!({ "existingText": "A", "newText": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["combinedText"], "A\n\n---\n\nB");
}

#[tokio::test]
async fn test_draft_session_and_submit() {
    let app = create_test_app().await;

    let (status, _) = send(&app.router, "POST", "/api/draft/submit", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app.router, "POST", "/api/draft/toggle", Some(json!({ "articleId": 1 }))).await;
    let (_, body) = send(&app.router, "POST", "/api/draft/toggle", Some(json!({ "articleId": 2 }))).await;
    assert_eq!(body["articleIds"], json!([1, 2]));
    assert_eq!(body["text"], "Draft 1\n\n---\n\nDraft 2");
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app.router, "POST", "/api/draft/toggle", Some(json!({ "articleId": 99 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, item) = send(&app.router, "POST", "/api/draft/submit", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["status"], "pending");
    assert_eq!(item["text"], "Draft 1\n\n---\n\nDraft 2");

    let (_, draft) = send(&app.router, "GET", "/api/draft", None).await;
    assert_eq!(draft["articleIds"], json!([]));
    assert_eq!(draft["text"], "");
}

#[tokio::test]
async fn test_clear_draft() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/draft/toggle", Some(json!({ "articleId": 1 }))).await;

    let (status, _) = send(&app.router, "DELETE", "/api/draft", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, draft) = send(&app.router, "GET", "/api/draft", None).await;
    assert_eq!(draft["articleIds"], json!([]));
}

#[tokio::test]
async fn test_review_approval_flow() {
    let app = create_test_app().await;

    let (status, item) = send(
        &app.router,
        "POST",
        "/api/reviews",
        Some(json!({ "text": "Weekly note", "sources": [{ "name": "Reuters" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = item["id"].as_u64().unwrap();

    let (status, item) = send(
        &app.router,
        "POST",
        &format!("/api/reviews/{}/approve", id),
        Some(json!({ "text": "Weekly note (edited)" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["status"], "approved");

    let (status, body) = send(&app.router, "POST", &format!("/api/reviews/{}/reject", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, approved) = send(&app.router, "GET", "/api/approved", None).await;
    assert_eq!(approved[0]["text"], "Weekly note (edited)");
    assert_eq!(approved[0]["id"], 1);

    let (_, pending) = send(&app.router, "GET", "/api/reviews?status=pending", None).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_without_body_and_unknown_item() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/reviews", Some(json!({ "text": "Note" }))).await;

    let (status, item) = send(&app.router, "POST", "/api/reviews/1/approve", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["text"], "Note");

    let (status, _) = send(&app.router, "POST", "/api/reviews/42/reject", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approve_reopens_item_when_log_write_fails() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/reviews", Some(json!({ "text": "Note" }))).await;

    // A directory in place of approved.json makes every append fail
    let blocker = app.root.path().join("approved.json");
    std::fs::create_dir(&blocker).unwrap();

    let (status, _) = send(&app.router, "POST", "/api/reviews/1/approve", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (_, pending) = send(&app.router, "GET", "/api/reviews?status=pending", None).await;
    assert_eq!(ids(&pending), vec![1]);

    std::fs::remove_dir(&blocker).unwrap();
    let (status, item) = send(&app.router, "POST", "/api/reviews/1/approve", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["status"], "approved");
    let (_, approved) = send(&app.router, "GET", "/api/approved", None).await;
    assert_eq!(approved.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_approve_rejects_malformed_body() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/reviews", Some(json!({ "text": "Note" }))).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/reviews/1/approve")
        .header("content-type", "application/json")
        .body(Body::from("{\"text\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, pending) = send(&app.router, "GET", "/api/reviews?status=pending", None).await;
    assert_eq!(ids(&pending), vec![1]);
    let (_, approved) = send(&app.router, "GET", "/api/approved", None).await;
    assert!(approved.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_append_approved_text() {
    let app = create_test_app().await;

    let (status, _) = send(&app.router, "POST", "/api/approved", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, entry) = send(&app.router, "POST", "/api/approved", Some(json!({ "approvedText": "Final" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["text"], "Final");
    assert!(entry["approvedAt"].is_string());
}

#[tokio::test]
async fn test_slack_unconfigured() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, "POST", "/api/reviews/send", Some(json!({ "text": "Hi" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]["message"].as_str().unwrap().contains("SLACK_WEBHOOK_URL"));

    let (status, _) = send(&app.router, "POST", "/api/reviews/sendToMe", Some(json!({ "text": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
