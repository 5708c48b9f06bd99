mod common;

use axum::{Router, routing::post};
use axum_test::TestServer;
use common::{InMemoryCache, InMemoryUrlRepository, MockConnectInfoLayer};
use link_resolver::api::handlers::shorten_handler;
use link_resolver::state::AppState;
use serde_json::json;

fn server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/shorten", post(shorten_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state);

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_shorten_creates_link() {
    let repo = InMemoryUrlRepository::new();
    let cache = InMemoryCache::new();
    let server = server(common::create_test_state(repo.clone(), Some(cache.clone())));

    let response = server
        .post("/shorten")
        .json(&json!({ "longUrl": "example.com/a" }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["longUrl"], "https://example.com/a");
    assert_eq!(json["customAlias"], false);
    assert!(json["expiresIn"].is_null());

    let code = json["shortCode"].as_str().unwrap();
    assert_eq!(code.len(), 7);
    assert_eq!(json["shortUrl"], format!("{}/{}", common::BASE_URL, code));

    let stored = repo.get(code).unwrap();
    assert_eq!(stored.long_url, "https://example.com/a");
    assert_eq!(stored.creator_ip.as_deref(), Some("127.0.0.1"));

    let (cached_url, ttl) = cache.entry(code).unwrap();
    assert_eq!(cached_url, "https://example.com/a");
    assert_eq!(ttl, 3600);
}

#[tokio::test]
async fn test_shorten_deduplication() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state(repo.clone(), None));

    let first = server
        .post("/shorten")
        .json(&json!({ "longUrl": "https://dedup.com" }))
        .await;
    first.assert_status(axum::http::StatusCode::CREATED);
    let code1 = first.json::<serde_json::Value>()["shortCode"].clone();

    let second = server
        .post("/shorten")
        .json(&json!({ "longUrl": "dedup.com" }))
        .await;
    second.assert_status_ok();
    let code2 = second.json::<serde_json::Value>()["shortCode"].clone();

    assert_eq!(code1, code2);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_shorten_with_expiry() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state(repo.clone(), None));

    let response = server
        .post("/shorten")
        .json(&json!({ "longUrl": "https://example.com", "expiresIn": 86400 }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["expiresIn"], 86400);
    assert!(json["expiresAt"].is_string());

    let record = repo.get(json["shortCode"].as_str().unwrap()).unwrap();
    assert_eq!(
        record.expires_at,
        Some(record.created_at + chrono::Duration::seconds(86400))
    );
}

#[tokio::test]
async fn test_shorten_custom_alias_then_taken() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state(repo.clone(), None));

    let first = server
        .post("/shorten")
        .add_query_param("alias", "mylink")
        .json(&json!({ "longUrl": "https://x.com" }))
        .await;

    first.assert_status(axum::http::StatusCode::CREATED);
    let json = first.json::<serde_json::Value>();
    assert_eq!(json["shortCode"], "mylink");
    assert_eq!(json["customAlias"], true);

    let second = server
        .post("/shorten")
        .add_query_param("alias", "mylink")
        .json(&json!({ "longUrl": "https://other.com" }))
        .await;

    second.assert_status(axum::http::StatusCode::CONFLICT);
    let json = second.json::<serde_json::Value>();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "alias_taken");
}

#[tokio::test]
async fn test_shorten_custom_alias_skips_deduplication() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state(repo.clone(), None));

    server
        .post("/shorten")
        .json(&json!({ "longUrl": "https://x.com" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let aliased = server
        .post("/shorten")
        .add_query_param("alias", "x-home")
        .json(&json!({ "longUrl": "https://x.com" }))
        .await;

    aliased.assert_status(axum::http::StatusCode::CREATED);
    assert_eq!(repo.len(), 2);
}

#[tokio::test]
async fn test_shorten_reserved_alias() {
    let server = server(common::create_test_state(InMemoryUrlRepository::new(), None));

    let response = server
        .post("/shorten")
        .add_query_param("alias", "Stats")
        .json(&json!({ "longUrl": "https://x.com" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["code"],
        "reserved_alias"
    );
}

#[tokio::test]
async fn test_shorten_invalid_alias() {
    let server = server(common::create_test_state(InMemoryUrlRepository::new(), None));

    for alias in ["ab", "has space", "way-too-long-alias-over-thirty-chars"] {
        let response = server
            .post("/shorten")
            .add_query_param("alias", alias)
            .json(&json!({ "longUrl": "https://x.com" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<serde_json::Value>()["error"]["code"],
            "invalid_alias"
        );
    }
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state(repo.clone(), None));

    for url in ["javascript:alert(1)", "ftp://files.example.com", "https://"] {
        let response = server
            .post("/shorten")
            .json(&json!({ "longUrl": url }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<serde_json::Value>()["error"]["code"],
            "invalid_url"
        );
    }

    assert_eq!(repo.len(), 0);
}

#[tokio::test]
async fn test_shorten_malicious_url() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state(repo.clone(), None));

    let response = server
        .post("/shorten")
        .json(&json!({ "longUrl": "https://example.com/free-bitcoin" }))
        .await;

    response.assert_status(axum::http::StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["code"],
        "malicious_url"
    );
    assert_eq!(repo.len(), 0);
}

#[tokio::test]
async fn test_shorten_body_validation() {
    let server = server(common::create_test_state(InMemoryUrlRepository::new(), None));

    let zero_expiry = server
        .post("/shorten")
        .json(&json!({ "longUrl": "https://x.com", "expiresIn": 0 }))
        .await;
    zero_expiry.assert_status_bad_request();
    assert_eq!(
        zero_expiry.json::<serde_json::Value>()["error"]["code"],
        "validation_error"
    );

    let empty_url = server
        .post("/shorten")
        .json(&json!({ "longUrl": "" }))
        .await;
    empty_url.assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_store_unavailable() {
    let repo = InMemoryUrlRepository::new();
    repo.set_unavailable(true);
    let server = server(common::create_test_state(repo, None));

    let response = server
        .post("/shorten")
        .json(&json!({ "longUrl": "https://x.com" }))
        .await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "store_unavailable");
    assert_eq!(json["error"]["message"], "Record store unavailable");
}

#[tokio::test]
async fn test_shorten_creator_ip_from_proxy_headers() {
    let repo = InMemoryUrlRepository::new();
    let server = server(common::create_test_state_with(repo.clone(), None, true));

    let response = server
        .post("/shorten")
        .add_header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .json(&json!({ "longUrl": "https://proxied.example" }))
        .await;

    let code = response.json::<serde_json::Value>()["shortCode"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        repo.get(&code).unwrap().creator_ip.as_deref(),
        Some("203.0.113.7")
    );
}
