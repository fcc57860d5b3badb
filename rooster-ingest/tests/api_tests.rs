//! Integration tests for rooster-ingest API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use rooster_common::events::{DashboardEvent, EventBus};
use rooster_common::store::JsonStore;
use rooster_common::Priority;
use rooster_ingest::models::{NewsItem, SEC_EDGAR};
use rooster_ingest::settings::IngestSettings;
use rooster_ingest::sources::{NewsSource, SourceError, SourceKind};
use rooster_ingest::AppState;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct FakeSource {
    kind: SourceKind,
    items: Vec<NewsItem>,
    fail: bool,
}

#[async_trait]
impl NewsSource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>, SourceError> {
        if self.fail {
            return Err(SourceError::NetworkError("connection refused".into()));
        }
        Ok(self.items.clone())
    }
}

fn filing(url: &str, summary: &str) -> NewsItem {
    let mut item = NewsItem::new(
        SEC_EDGAR,
        url,
        "8-K - FedEx Corp (0001048911) (Filer)",
        summary,
        Utc::now() - Duration::hours(1),
    );
    let class = rooster_ingest::classify::classify_edgar_summary(summary);
    item.event_type = class.event_type;
    item.urgency = class.urgency;
    item.entities = class.items;
    item.tickers = vec!["FDX".into()];
    item
}

fn press(source: &str, headline: &str) -> NewsItem {
    NewsItem::new(
        source,
        "https://example.com/story",
        headline,
        "Markets were little changed on Tuesday. Traders waited for data.",
        Utc::now() - Duration::hours(2),
    )
}

struct TestApp {
    router: Router,
    event_bus: EventBus,
    root: TempDir,
}

fn create_test_app() -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp dir");

    let sources: Vec<Box<dyn NewsSource>> = vec![
        Box::new(FakeSource {
            kind: SourceKind::SecEdgar,
            items: vec![
                filing("https://www.sec.gov/Archives/edgar/data/1048911/a-index.htm", "Item 5.02: Departure of Directors"),
                filing("https://www.sec.gov/Archives/edgar/data/1048911/a-index.htm", "Item 5.02: Departure of Directors"),
            ],
            fail: false,
        }),
        Box::new(FakeSource {
            kind: SourceKind::MarketAux,
            items: Vec::new(),
            fail: true,
        }),
        Box::new(FakeSource {
            kind: SourceKind::NewsApi,
            items: vec![
                press("Reuters", "Acme agrees to takeover by Widget"),
                press("Tiny Blog", "Quiet session in markets"),
            ],
            fail: false,
        }),
    ];

    let event_bus = EventBus::new(16);
    let state = AppState::new(root.path(), sources, IngestSettings::default(), event_bus.clone());

    TestApp {
        router: rooster_ingest::build_router(state),
        event_bus,
        root,
    }
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, body) = send(&app.router, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "rooster-ingest");
}

#[tokio::test]
async fn test_ingest_reports_counts_without_publishing() {
    let app = create_test_app();
    let mut events = app.event_bus.subscribe();

    let (status, body) = send(&app.router, "POST", "/ingest").await;
    assert_eq!(status, StatusCode::OK);

    let counts = &body["counts"];
    assert_eq!(counts["sec_edgar"], 2);
    assert_eq!(counts["marketaux"], 0);
    assert_eq!(counts["newsapi"], 2);
    assert_eq!(counts["total_deduped"], 3);
    assert_eq!(body["published"], 0);

    let items = body["items"].as_array().unwrap();
    assert_eq!(counts["relevant"], items.len());
    assert_eq!(items[0]["source"], "sec_edgar");
    assert_eq!(items[0]["eventType"], "ceo_exit");
    assert_eq!(items[0]["severity"], "high");
    assert!(items.iter().all(|i| i["headline"] != "Quiet session in markets"));

    match events.recv().await.unwrap() {
        DashboardEvent::IngestCompleted { total_deduped, published, .. } => {
            assert_eq!(total_deduped, 3);
            assert_eq!(published, 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let store = JsonStore::in_root(app.root.path());
    assert!(store.load().await.unwrap().articles.is_empty());
}

#[tokio::test]
async fn test_ingest_publish_is_idempotent() {
    let app = create_test_app();

    let (status, body) = send(&app.router, "POST", "/ingest?publish=true").await;
    assert_eq!(status, StatusCode::OK);
    let relevant = body["counts"]["relevant"].as_u64().unwrap();
    assert!(relevant >= 1);
    assert_eq!(body["published"], relevant);

    let (_, body) = send(&app.router, "POST", "/ingest?publish=true").await;
    assert_eq!(body["published"], 0);

    let data = JsonStore::in_root(app.root.path()).load().await.unwrap();
    assert_eq!(data.articles.len() as u64, relevant);

    let filing = &data.articles[0];
    assert_eq!(filing.id, 1);
    assert_eq!(filing.source, "SEC EDGAR");
    assert_eq!(filing.priority, Priority::High);
    assert_eq!(filing.tags, vec!["Management"]);
    assert!(filing.fingerprint.is_some());
}

#[tokio::test]
async fn test_min_score_threshold() {
    let app = create_test_app();

    let (status, body) = send(&app.router, "POST", "/ingest?min_score=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["relevant"], 3);

    let (status, body) = send(&app.router, "POST", "/ingest?min_score=1.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
