//! End-to-end tests over the HTTP surface, backed by an in-memory SqlStore.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use invisibuilder::store::sql::SqlStore;
use invisibuilder::{get_random_free_port, make_router, run_app, Store};

async fn spawn_app() -> String {
    let store: Store = Arc::new(SqlStore::in_memory().await.unwrap());
    let (port, addr) = get_random_free_port();
    tokio::spawn(run_app(make_router(), store, addr));

    let base = format!("http://localhost:{port}");
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client.get(format!("{base}/check_health")).send().await.is_ok() {
            return base;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not come up on {base}");
}

async fn create_category(client: &reqwest::Client, base: &str, name: &str) -> Value {
    let response = client
        .post(format!("{base}/api/categories"))
        .json(&json!({"name": name}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

async fn create_article(client: &reqwest::Client, base: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{base}/api/articles"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_check_is_alive() {
    let base = spawn_app().await;
    let body = reqwest::get(format!("{base}/check_health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "alive");
}

#[tokio::test]
async fn empty_catalog_serves_empty_lists_not_errors() {
    let base = spawn_app().await;
    let articles: Vec<Value> = reqwest::get(format!("{base}/api/articles"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(articles.is_empty());
    let categories: Vec<Value> = reqwest::get(format!("{base}/api/categories"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(categories.is_empty());
}

#[tokio::test]
async fn article_lifecycle_over_http() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    create_category(&client, &base, "Web Development").await;

    let response = create_article(
        &client,
        &base,
        json!({
            "title": "Build In The Open",
            "excerpt": "why and how",
            "content": "Long form body.",
            "category": "web-development",
            "tags": ["indie", "rust"],
            "featured": true
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["slug"], "build-in-the-open");
    assert_eq!(created["category"]["name"], "Web Development");

    let fetched: Value = reqwest::get(format!("{base}/api/articles/slug/build-in-the-open"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "Build In The Open");

    let filtered: Vec<Value> = reqwest::get(format!("{base}/api/articles?featured=true&tag=rust"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);

    let missing = reqwest::get(format!("{base}/api/articles/slug/not-a-slug"))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let body: Value = missing.json().await.unwrap();
    assert!(body["message"].is_string());

    let id = created["id"].as_str().unwrap().to_string();
    let deleted = client
        .delete(format!("{base}/api/articles/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 204);
    let gone = reqwest::get(format!("{base}/api/articles/slug/build-in-the-open"))
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn article_with_unknown_category_is_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let response = create_article(
        &client,
        &base,
        json!({"title": "Orphan", "category": "nope"}),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("unknown category"));
}

#[tokio::test]
async fn subscribe_requires_consent_and_valid_email() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let no_consent = client
        .post(format!("{base}/api/newsletter/subscribe"))
        .json(&json!({"email": "reader@example.com", "consent": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_consent.status(), 400);

    let bad_email = client
        .post(format!("{base}/api/newsletter/subscribe"))
        .json(&json!({"email": "not-an-email", "consent": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_email.status(), 400);

    let ok = client
        .post(format!("{base}/api/newsletter/subscribe"))
        .json(&json!({"email": "reader@example.com", "name": "Reader", "consent": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 201);
    let subscriber: Value = ok.json().await.unwrap();
    assert_eq!(subscriber["status"], "active");
}

#[tokio::test]
async fn contact_form_validates_all_fields() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let incomplete = client
        .post(format!("{base}/api/contact"))
        .json(&json!({"name": "Visitor", "email": "visitor@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(incomplete.status(), 400);

    let ok = client
        .post(format!("{base}/api/contact"))
        .json(&json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "message": "Hello there"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 201);
    let contact: Value = ok.json().await.unwrap();
    assert_eq!(contact["status"], "new");
}

#[tokio::test]
async fn preview_endpoint_serves_featured_article() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    create_category(&client, &base, "Marketing").await;
    let response = create_article(
        &client,
        &base,
        json!({
            "title": "Hero Piece",
            "category": "marketing",
            "featured": true
        }),
    )
    .await;
    assert_eq!(response.status(), 201);

    let preview: Value = reqwest::get(format!("{base}/api/articles/preview"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["slug"], "hero-piece");
}

#[tokio::test]
async fn topic_query_param_is_a_category_alias() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    create_category(&client, &base, "Web Development").await;
    create_category(&client, &base, "Marketing").await;
    let response = create_article(
        &client,
        &base,
        json!({"title": "Aliased Post", "category": "web-development"}),
    )
    .await;
    assert_eq!(response.status(), 201);
    let response = create_article(
        &client,
        &base,
        json!({"title": "Other Post", "category": "marketing"}),
    )
    .await;
    assert_eq!(response.status(), 201);

    let by_category: Vec<Value> = reqwest::get(format!("{base}/api/articles?category=web-development"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let by_topic: Vec<Value> = reqwest::get(format!("{base}/api/articles?topic=web-development"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_topic.len(), 1);
    assert_eq!(by_topic[0]["slug"], "aliased-post");
    assert_eq!(by_category, by_topic);
}

#[tokio::test]
async fn contact_moderation_accepts_legacy_in_progress_status() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let created: Value = client
        .post(format!("{base}/api/contact"))
        .json(&json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "message": "Hello there"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let updated = client
        .put(format!("{base}/api/contacts/{id}"))
        .json(&json!({"status": "in-progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let body: Value = updated.json().await.unwrap();
    // the legacy name is accepted on input but always serialized as "read"
    assert_eq!(body["status"], "read");
}

#[tokio::test]
async fn unknown_routes_fall_through_to_404() {
    let base = spawn_app().await;
    let response = reqwest::get(format!("{base}/api/nope")).await.unwrap();
    assert_eq!(response.status(), 404);
}
