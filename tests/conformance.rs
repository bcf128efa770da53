//! One behavioral suite run against both embedded backends. Every scenario
//! takes `&dyn ContentStore`, so a backend can only pass by honoring the
//! shared query and enrichment semantics.

use chrono::{DateTime, TimeZone, Utc};

use invisibuilder::models::{ArticleStatus, MediaType, SubscriberStatus};
use invisibuilder::store::{files::FileStore, sql::SqlStore, ArticleFilter, ContentStore};
use invisibuilder::{CreateArticleRequest, CreateCategoryRequest, CreateMediaRequest, CreateSectionRequest};

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

fn category_req(name: &str) -> CreateCategoryRequest {
    CreateCategoryRequest {
        name: name.to_string(),
        slug: None,
        description: None,
        icon: None,
    }
}

fn article_req(
    title: &str,
    category: &str,
    published: DateTime<Utc>,
    featured: bool,
    tags: &[&str],
) -> CreateArticleRequest {
    CreateArticleRequest {
        title: title.to_string(),
        slug: None,
        excerpt: format!("{title} in brief"),
        content: format!("Full text of {title}."),
        featured_image: None,
        published_date: Some(published),
        category: Some(category.to_string()),
        read_time: None,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        featured,
        status: None,
    }
}

fn media_req(title: &str, media_type: MediaType, article_id: &str) -> CreateMediaRequest {
    CreateMediaRequest {
        title: title.to_string(),
        url: format!("https://cdn.example.com/{title}"),
        media_type,
        description: None,
        thumbnail: None,
        duration: None,
        article_id: Some(article_id.to_string()),
    }
}

/// Three articles in two categories, one featured, plus one draft.
async fn seed_catalog(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    store
        .create_category(category_req("Marketing"))
        .await
        .unwrap();
    store
        .create_article(article_req(
            "Older Web Post",
            "web-development",
            date(2024, 1, 10),
            false,
            &["rust", "guides"],
        ))
        .await
        .unwrap();
    store
        .create_article(article_req(
            "Newer Web Post",
            "web-development",
            date(2024, 3, 5),
            true,
            &["rust"],
        ))
        .await
        .unwrap();
    store
        .create_article(article_req(
            "Marketing Play",
            "marketing",
            date(2024, 2, 1),
            false,
            &["seo"],
        ))
        .await
        .unwrap();
    let mut draft = article_req("Hidden Draft", "marketing", date(2024, 4, 1), false, &[]);
    draft.status = Some(ArticleStatus::Draft);
    store.create_article(draft).await.unwrap();
}

async fn derives_slug_from_title(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    let article = store
        .create_article(article_req(
            "Ship Your Side Project!",
            "web-development",
            date(2024, 1, 1),
            false,
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(article.slug, "ship-your-side-project");
    assert!(store
        .get_article_by_slug("ship-your-side-project")
        .await
        .is_some());
}

async fn rejects_duplicate_slugs(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    let req = article_req("Same Title", "web-development", date(2024, 1, 1), false, &[]);
    store.create_article(req).await.unwrap();
    let again = article_req("Same Title", "web-development", date(2024, 1, 2), false, &[]);
    assert!(store.create_article(again).await.is_err());
}

async fn lists_newest_first(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let articles = store.list_articles(&ArticleFilter::default()).await;
    let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["newer-web-post", "marketing-play", "older-web-post"]);
}

async fn excludes_drafts_from_lists(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let articles = store.list_articles(&ArticleFilter::default()).await;
    assert!(articles.iter().all(|a| a.slug != "hidden-draft"));
    // direct fetch still works so draft preview links resolve
    let draft = store.get_article_by_slug("hidden-draft").await.unwrap();
    assert_eq!(draft.status, ArticleStatus::Draft);
}

async fn filters_featured(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let filter = ArticleFilter {
        featured: Some(true),
        ..Default::default()
    };
    let articles = store.list_articles(&filter).await;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].slug, "newer-web-post");
}

async fn filters_category_case_insensitively(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let filter = ArticleFilter {
        category_slug: Some("Web-Development".to_string()),
        ..Default::default()
    };
    let articles = store.list_articles(&filter).await;
    assert_eq!(articles.len(), 2);
    assert!(articles.iter().all(|a| {
        a.category.as_ref().map(|c| c.slug.as_str()) == Some("web-development")
    }));
}

async fn filters_tag_by_exact_membership(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let filter = ArticleFilter {
        tag: Some("RUST".to_string()),
        ..Default::default()
    };
    assert_eq!(store.list_articles(&filter).await.len(), 2);
    // "guide" is a prefix of the tag "guides", not a member
    let filter = ArticleFilter {
        tag: Some("guide".to_string()),
        ..Default::default()
    };
    assert!(store.list_articles(&filter).await.is_empty());
    // LIKE wildcards in the tag are literal characters, not patterns
    let filter = ArticleFilter {
        tag: Some("ru%t".to_string()),
        ..Default::default()
    };
    assert!(store.list_articles(&filter).await.is_empty());
    let filter = ArticleFilter {
        tag: Some("r_st".to_string()),
        ..Default::default()
    };
    assert!(store.list_articles(&filter).await.is_empty());
}

async fn searches_title_excerpt_and_content(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let filter = ArticleFilter {
        search: Some("marketing play".to_string()),
        ..Default::default()
    };
    let articles = store.list_articles(&filter).await;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].slug, "marketing-play");
    // body text is searched too
    let filter = ArticleFilter {
        search: Some("full text of older".to_string()),
        ..Default::default()
    };
    assert_eq!(store.list_articles(&filter).await.len(), 1);
}

async fn honors_limit_after_sorting(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let filter = ArticleFilter {
        limit: Some(2),
        ..Default::default()
    };
    let articles = store.list_articles(&filter).await;
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].slug, "newer-web-post");
}

async fn orders_sections_by_order_field(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    let article = store
        .create_article(article_req(
            "Structured Post",
            "web-development",
            date(2024, 1, 1),
            false,
            &[],
        ))
        .await
        .unwrap();
    for order in [3, 1, 2] {
        store
            .create_section(CreateSectionRequest {
                title: Some(format!("Part {order}")),
                content: format!("section body {order}"),
                order,
                article_id: article.id.clone(),
            })
            .await
            .unwrap();
    }
    let article = store.get_article_by_slug("structured-post").await.unwrap();
    let orders: Vec<i64> = article.content_sections.iter().map(|s| s.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

async fn partitions_media_by_type(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    let article = store
        .create_article(article_req(
            "Media Rich",
            "web-development",
            date(2024, 1, 1),
            false,
            &[],
        ))
        .await
        .unwrap();
    for (title, media_type) in [
        ("clip", MediaType::Video),
        ("podcast", MediaType::Audio),
        ("diagram", MediaType::Image),
        ("whitepaper", MediaType::Document),
    ] {
        store
            .create_media(media_req(title, media_type, &article.id))
            .await
            .unwrap();
    }
    let article = store.get_article_by_slug("media-rich").await.unwrap();
    assert_eq!(article.video_files.len(), 1);
    assert_eq!(article.audio_files.len(), 1);
    assert_eq!(article.images.len(), 1);
    // documents are listable but never bucketed onto the article
    assert_eq!(store.list_media(Some(&article.id)).await.len(), 4);
}

async fn relates_same_category_articles(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    for index in 0..5 {
        store
            .create_article(article_req(
                &format!("Related Post {index}"),
                "web-development",
                date(2024, 1, (index + 1) as u32),
                false,
                &[],
            ))
            .await
            .unwrap();
    }
    let article = store.get_article_by_slug("related-post-0").await.unwrap();
    assert!(article.related_articles.len() <= 3);
    assert!(!article.related_articles.is_empty());
    assert!(article
        .related_articles
        .iter()
        .all(|related| related.slug != "related-post-0"));
}

async fn picks_featured_then_latest(store: &dyn ContentStore) {
    store
        .create_category(category_req("Web Development"))
        .await
        .unwrap();
    store
        .create_article(article_req(
            "Plain Newest",
            "web-development",
            date(2024, 5, 1),
            false,
            &[],
        ))
        .await
        .unwrap();
    let pick = store.featured_or_latest().await.unwrap();
    assert_eq!(pick.slug, "plain-newest");
    store
        .create_article(article_req(
            "Featured Older",
            "web-development",
            date(2024, 1, 1),
            true,
            &[],
        ))
        .await
        .unwrap();
    let pick = store.featured_or_latest().await.unwrap();
    assert_eq!(pick.slug, "featured-older");
}

async fn counts_published_articles_per_category(store: &dyn ContentStore) {
    seed_catalog(store).await;
    let categories = store.list_categories().await;
    let web = categories
        .iter()
        .find(|c| c.slug == "web-development")
        .unwrap();
    let marketing = categories.iter().find(|c| c.slug == "marketing").unwrap();
    assert_eq!(web.article_count, 2);
    // the draft does not count
    assert_eq!(marketing.article_count, 1);
}

async fn resubscribe_reactivates_without_duplicating(store: &dyn ContentStore) {
    let first = store
        .upsert_subscriber("Reader@Example.com", Some("Reader".to_string()))
        .await
        .unwrap();
    store
        .update_subscriber_status(&first.id, SubscriberStatus::Unsubscribed)
        .await
        .unwrap();
    let second = store
        .upsert_subscriber("reader@example.com", None)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.status, SubscriberStatus::Active);
    assert_eq!(store.list_subscribers().await.len(), 1);
}

async fn delete_of_missing_records_is_false(store: &dyn ContentStore) {
    assert!(!store.delete_article("999").await.unwrap());
    assert!(!store.delete_category("999").await.unwrap());
    assert!(!store.delete_subscriber("999").await.unwrap());
    assert!(!store.delete_contact("999").await.unwrap());
}

async fn rejects_unknown_category_on_create(store: &dyn ContentStore) {
    let req = article_req("Orphan", "no-such-category", date(2024, 1, 1), false, &[]);
    assert!(store.create_article(req).await.is_err());
}

macro_rules! backend_tests {
    ($($scenario:ident),* $(,)?) => {
        mod sql_backend {
            use super::*;
            $(
                #[tokio::test]
                async fn $scenario() {
                    let store = SqlStore::in_memory().await.unwrap();
                    super::$scenario(&store).await;
                }
            )*
        }
        mod file_backend {
            use super::*;
            $(
                #[tokio::test]
                async fn $scenario() {
                    let dir = tempfile::tempdir().unwrap();
                    let store = FileStore::new(dir.path());
                    super::$scenario(&store).await;
                }
            )*
        }
    };
}

backend_tests!(
    derives_slug_from_title,
    rejects_duplicate_slugs,
    lists_newest_first,
    excludes_drafts_from_lists,
    filters_featured,
    filters_category_case_insensitively,
    filters_tag_by_exact_membership,
    searches_title_excerpt_and_content,
    honors_limit_after_sorting,
    orders_sections_by_order_field,
    partitions_media_by_type,
    relates_same_category_articles,
    picks_featured_then_latest,
    counts_published_articles_per_category,
    resubscribe_reactivates_without_duplicating,
    delete_of_missing_records_is_false,
    rejects_unknown_category_on_create,
);
