use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use lexicon_cli::handlers::{AppState, router};
use lexicon_cli::index::LexiconIndex;
use lexicon_extract::artifacts;
use lexicon_types::NormalizedEntry;

fn entry(headword: &str, variants: &[&str], line: usize) -> NormalizedEntry {
    NormalizedEntry {
        headword: headword.to_string(),
        variants: variants.iter().map(|v| v.to_string()).collect(),
        dialect_tags: Default::default(),
        line,
    }
}

fn make_state() -> AppState {
    let entries = vec![
        entry("merci", &["lapia", "oyo"], 3),
        entry("Maison", &["kujè", "kuje"], 7),
        entry("mère", &["ko"], 9),
        entry("bonjour", &["mbô"], 12),
    ];
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("lexicon.json");
    artifacts::write_json(&path, &entries).unwrap();
    let index = LexiconIndex::load(&path).unwrap();
    AppState {
        index,
        max_page_size: 2,
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn healthz_ok() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn entry_exposes_primary_and_alternates() {
    let (status, body) = get_json(router(make_state()), "/v1/entries/MAISON").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["headword"], "Maison");
    assert_eq!(body["primary"], "kujè");
    assert_eq!(body["alternates"], serde_json::json!(["kuje"]));
    assert_eq!(body["line"], 7);
}

#[tokio::test]
async fn entry_path_is_percent_decoded() {
    let (status, body) = get_json(router(make_state()), "/v1/entries/m%C3%A8re").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primary"], "ko");
    assert_eq!(body["alternates"], serde_json::json!([]));
}

#[tokio::test]
async fn unknown_entry_is_not_found() {
    let (status, body) = get_json(router(make_state()), "/v1/entries/maisons").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("maisons")
    );
}

#[tokio::test]
async fn search_caps_page_size() {
    let (status, body) = get_json(router(make_state()), "/v1/search?prefix=M&page_size=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prefix"], "M");
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["total"], 3);
    assert_eq!(body["has_more"], true);
    assert_eq!(body["items"], serde_json::json!(["Maison", "merci"]));

    let (_, body) = get_json(router(make_state()), "/v1/search?prefix=m&page=2&page_size=2").await;
    assert_eq!(body["items"], serde_json::json!(["mère"]));
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn search_rejects_invalid_params() {
    let (status, body) = get_json(router(make_state()), "/v1/search?prefix=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("prefix")
    );

    let (status, body) = get_json(router(make_state()), "/v1/search?prefix=m&page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .to_lowercase()
            .contains("page")
    );
}

#[tokio::test]
async fn stats_reports_counts_only() {
    let (status, body) = get_json(router(make_state()), "/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_entries"], 4);
    assert_eq!(body["total_variant_count"], 6);
    assert_eq!(body["average_variants_per_entry"], 1.5);
    assert!(body.get("headwords").is_none());
}
