//! CmsStore against a mocked query/mutate HTTP API.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use invisibuilder::models::{ArticleStatus, MediaType};
use invisibuilder::store::{cms::CmsStore, ArticleFilter, ContentStore};
use invisibuilder::UpdateCategoryRequest;

const QUERY_PATH: &str = "/v1/data/query/production";
const MUTATE_PATH: &str = "/v1/data/mutate/production";

fn article_doc(id: &str, title: &str, slug: &str, published: &str, featured: bool) -> serde_json::Value {
    json!({
        "_id": id,
        "title": title,
        "slug": {"current": slug},
        "excerpt": format!("{title} in brief"),
        "content": [
            {"_type": "block", "children": [{"text": format!("Body of {title}")}]}
        ],
        "publishedDate": published,
        "category": {"name": "Web Development", "slug": {"current": "web-development"}},
        "tags": ["rust"],
        "featured": featured,
        "status": "published"
    })
}

async fn mount_empty_children(server: &MockServer) {
    for marker in ["contentSection", "mediaFile", "resource"] {
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(query_param_contains("query", marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn flattens_slug_objects_and_dereferenced_categories() {
    let server = MockServer::start().await;
    mount_empty_children(&server).await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "slug.current == $slug"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": article_doc("a1", "My Post", "my-post", "2024-03-05T12:00:00Z", false)
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "order(publishedDate desc)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [article_doc("a1", "My Post", "my-post", "2024-03-05T12:00:00Z", false)]
        })))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    let article = store.get_article_by_slug("my-post").await.unwrap();
    assert_eq!(article.slug, "my-post");
    assert_eq!(article.status, ArticleStatus::Published);
    assert_eq!(article.content, "Body of My Post");
    let category = article.category.unwrap();
    assert_eq!(category.slug, "web-development");
    assert_eq!(category.name, "Web Development");
}

#[tokio::test]
async fn list_applies_shared_filter_semantics() {
    let server = MockServer::start().await;
    mount_empty_children(&server).await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "order(publishedDate desc)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                article_doc("a2", "Newer Post", "newer-post", "2024-03-05T12:00:00Z", true),
                article_doc("a1", "Older Post", "older-post", "2024-01-10T12:00:00Z", false)
            ]
        })))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    let all = store.list_articles(&ArticleFilter::default()).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].slug, "newer-post");

    let featured = store
        .list_articles(&ArticleFilter {
            featured: Some(true),
            ..Default::default()
        })
        .await;
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].slug, "newer-post");

    // related articles come from the same published pool
    assert_eq!(all[0].related_articles.len(), 1);
    assert_eq!(all[0].related_articles[0].slug, "older-post");
}

#[tokio::test]
async fn featured_or_latest_falls_back_to_newest() {
    let server = MockServer::start().await;
    mount_empty_children(&server).await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "order(publishedDate desc)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                article_doc("a2", "Newest Plain", "newest-plain", "2024-03-05T12:00:00Z", false),
                article_doc("a1", "Older Plain", "older-plain", "2024-01-10T12:00:00Z", false)
            ]
        })))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    let pick = store.featured_or_latest().await.unwrap();
    assert_eq!(pick.slug, "newest-plain");
}

#[tokio::test]
async fn read_failures_degrade_to_empty_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    assert!(store.list_articles(&ArticleFilter::default()).await.is_empty());
    assert!(store.list_categories().await.is_empty());
    assert!(store.get_article_by_slug("anything").await.is_none());
}

#[tokio::test]
async fn upsert_subscriber_creates_when_email_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "subscriber"))
        .and(header("authorization", "Bearer write-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .and(header("authorization", "Bearer write-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "sub-1"}]
        })))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", Some("write-token".to_string()));
    let subscriber = store
        .upsert_subscriber("reader@example.com", Some("Reader".to_string()))
        .await
        .unwrap();
    assert_eq!(subscriber.id, "sub-1");
    assert!(subscriber.consent);
}

#[tokio::test]
async fn delete_is_false_when_mutation_touches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    assert!(!store.delete_article("missing").await.unwrap());
    assert!(!store.delete_media("missing").await.unwrap());
}

#[tokio::test]
async fn update_category_responds_with_patched_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"_id": "cat-1", "name": "Old Name", "slug": {"current": "old-name"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "cat-1"}]
        })))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    let updated = store
        .update_category(
            "cat-1",
            UpdateCategoryRequest {
                name: Some("New Name".to_string()),
                slug: Some("New Name".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    // a rename is reflected immediately, never the pre-patch snapshot
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.slug, "new-name");
}

#[tokio::test]
async fn media_listing_maps_types_and_references() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("query", "mediaFile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"_id": "m1", "title": "clip", "url": "https://cdn.example.com/clip",
                 "type": "video", "articleId": "a1"},
                {"_id": "m2", "title": "blob", "url": "https://cdn.example.com/blob",
                 "type": "unheard-of", "articleId": null}
            ]
        })))
        .mount(&server)
        .await;

    let store = CmsStore::new(server.uri(), "production", None);
    let media = store.list_media(Some("a1")).await;
    assert_eq!(media.len(), 2);
    assert_eq!(media[0].media_type, MediaType::Video);
    assert_eq!(media[0].article_id.as_deref(), Some("a1"));
    // unknown types degrade to the unbucketed document kind
    assert_eq!(media[1].media_type, MediaType::Document);
}
