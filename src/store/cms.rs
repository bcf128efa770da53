//! Headless-CMS backend over a Sanity-style HTTP query API.
//!
//! Reads go through `GET {base}/v1/data/query/{dataset}?query=…` (result
//! wrapped in `{"result": …}`), writes through
//! `POST {base}/v1/data/mutate/{dataset}` with a `{"mutations": […]}` body.
//!
//! Two backend quirks are contained here and never leak past the mapping
//! layer: category and related references are always queried with an explicit
//! dereferencing projection (a naive query would return bare reference ids),
//! and slugs stored as `{"current": "…"}` objects are flattened to plain
//! strings.
//!
//! Reads are query-heavy: every enriched article costs three child queries,
//! and single-item reads re-fetch the published pool for related picks.
//! Nothing is cached, which is acceptable only for a small corpus (the same
//! tradeoff the file backend makes with full-directory scans).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::data_formats::{
    ContactRequest, CreateArticleRequest, CreateCategoryRequest, CreateMediaRequest,
    CreateResourceRequest, CreateSectionRequest, UpdateArticleRequest, UpdateCategoryRequest,
    UpdateSectionRequest,
};
use crate::errors::RequestError;
use crate::models::{
    Article, ArticleStatus, Category, CategoryRef, Contact, ContactStatus, ContentSection,
    MediaFile, MediaType, Resource, Subscriber, SubscriberStatus,
};
use crate::slug::slugify;
use crate::store::{enrich, or_empty, or_none, ArticleFilter, ContentStore};

pub struct CmsStore {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    token: Option<String>,
}

/// Article projection with the category dereferenced in the query itself.
const ARTICLE_PROJECTION: &str = "{_id, title, slug, excerpt, content, featuredImage, \
     publishedDate, updatedDate, readTime, tags, featured, status, \
     \"category\": category->{name, slug}}";

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

/// A slug field as the CMS may return it: either already flattened by the
/// projection or still the stored `{"current": …}` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CmsSlug {
    Plain(String),
    Object { current: String },
}

impl CmsSlug {
    fn into_string(self) -> String {
        match self {
            CmsSlug::Plain(slug) => slug,
            CmsSlug::Object { current } => current,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CmsCategoryRef {
    name: String,
    slug: Option<CmsSlug>,
}

impl CmsCategoryRef {
    fn into_category_ref(self) -> CategoryRef {
        let slug = match self.slug {
            Some(slug) => slug.into_string(),
            None => slugify(&self.name),
        };
        CategoryRef {
            name: self.name,
            slug,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsCategory {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    slug: Option<CmsSlug>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    article_count: i64,
}

impl CmsCategory {
    fn into_category(self) -> Category {
        let slug = match self.slug {
            Some(slug) => slug.into_string(),
            None => slugify(&self.name),
        };
        Category {
            id: self.id,
            name: self.name,
            slug,
            description: self.description,
            icon: self.icon,
            article_count: self.article_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsArticle {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    slug: CmsSlug,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    featured_image: Option<String>,
    #[serde(default)]
    published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    category: Option<CmsCategoryRef>,
    #[serde(default)]
    read_time: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    status: Option<String>,
}

impl CmsArticle {
    fn into_article(self) -> Article {
        Article {
            id: self.id,
            title: self.title,
            slug: self.slug.into_string(),
            excerpt: self.excerpt,
            content: rich_text_to_plain(&self.content),
            featured_image: self.featured_image,
            published_date: self.published_date.unwrap_or(DateTime::<Utc>::MIN_UTC),
            updated_date: self.updated_date,
            category: self.category.map(CmsCategoryRef::into_category_ref),
            read_time: self.read_time,
            tags: self.tags,
            featured: self.featured,
            status: self
                .status
                .as_deref()
                .and_then(ArticleStatus::parse)
                .unwrap_or_default(),
            content_sections: Vec::new(),
            video_files: Vec::new(),
            audio_files: Vec::new(),
            images: Vec::new(),
            resources: Vec::new(),
            related_articles: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsSection {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    order: i64,
    #[serde(default)]
    article_id: Option<String>,
}

impl CmsSection {
    fn into_section(self) -> ContentSection {
        ContentSection {
            id: self.id,
            title: self.title,
            content: rich_text_to_plain(&self.content),
            order: self.order,
            article_id: self.article_id.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsMedia {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    url: String,
    #[serde(rename = "type", default)]
    media_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    article_id: Option<String>,
}

impl CmsMedia {
    fn into_media(self) -> MediaFile {
        MediaFile {
            id: self.id,
            title: self.title,
            url: self.url,
            media_type: self
                .media_type
                .as_deref()
                .and_then(MediaType::parse)
                .unwrap_or(MediaType::Document),
            description: self.description,
            thumbnail: self.thumbnail,
            duration: self.duration,
            article_id: self.article_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsResource {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
    #[serde(rename = "type", default)]
    resource_type: Option<String>,
    #[serde(default)]
    article_id: Option<String>,
}

impl CmsResource {
    fn into_resource(self) -> Resource {
        Resource {
            id: self.id,
            title: self.title,
            description: self.description,
            url: self.url,
            resource_type: self.resource_type.unwrap_or_else(|| "link".to_string()),
            article_id: self.article_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsSubscriber {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    consent: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    subscribed_at: Option<DateTime<Utc>>,
}

impl CmsSubscriber {
    fn into_subscriber(self) -> Subscriber {
        Subscriber {
            id: self.id,
            email: self.email,
            name: self.name,
            consent: self.consent,
            status: self
                .status
                .as_deref()
                .and_then(SubscriberStatus::parse)
                .unwrap_or_default(),
            subscribed_at: self.subscribed_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CmsContact {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl CmsContact {
    fn into_contact(self) -> Contact {
        Contact {
            id: self.id,
            name: self.name,
            email: self.email,
            message: self.message,
            status: self
                .status
                .as_deref()
                .and_then(ContactStatus::parse)
                .unwrap_or_default(),
            created_at: self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

/// Normalize rich-text content to plain text: strings pass through, block
/// arrays are flattened by concatenating their span texts.
fn rich_text_to_plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => {
            let mut out = Vec::new();
            for block in blocks {
                if let Some(children) = block.get("children").and_then(Value::as_array) {
                    let text: String = children
                        .iter()
                        .filter_map(|child| child.get("text").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("");
                    if !text.is_empty() {
                        out.push(text);
                    }
                } else if let Some(text) = block.as_str() {
                    out.push(text.to_string());
                }
            }
            out.join("\n\n")
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_param(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

impl CmsStore {
    pub fn new(base_url: impl Into<String>, dataset: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            dataset: dataset.into(),
            token,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("CMS_BASE_URL")
            .map_err(|_| anyhow::anyhow!("CMS_BASE_URL must be set for the cms backend"))?;
        let dataset = std::env::var("CMS_DATASET").unwrap_or_else(|_| "production".to_string());
        let token = std::env::var("CMS_TOKEN").ok();
        Ok(Self::new(base_url, dataset, token))
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, String)],
    ) -> Result<T, RequestError> {
        let url = format!(
            "{}/v1/data/query/{}",
            self.base_url.trim_end_matches('/'),
            self.dataset
        );
        let mut request = self.client.get(&url).query(&[("query", groq)]);
        for (key, value) in params {
            request = request.query(&[(*key, value.as_str())]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        let body: QueryResponse<T> = response.json().await?;
        Ok(body.result)
    }

    async fn mutate(&self, mutations: Value) -> Result<MutateResponse, RequestError> {
        let url = format!(
            "{}/v1/data/mutate/{}",
            self.base_url.trim_end_matches('/'),
            self.dataset
        );
        let mut request = self
            .client
            .post(&url)
            .query(&[("returnIds", "true")])
            .json(&json!({ "mutations": mutations }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn create_document(&self, document: Value) -> Result<String, RequestError> {
        let response = self.mutate(json!([{ "create": document }])).await?;
        response
            .results
            .into_iter()
            .next()
            .map(|result| result.id)
            .ok_or_else(|| RequestError::Storage(anyhow::anyhow!("mutation returned no results")))
    }

    async fn patch_document(&self, id: &str, set: Value) -> Result<bool, RequestError> {
        let response = self
            .mutate(json!([{ "patch": { "id": id, "set": set } }]))
            .await?;
        Ok(!response.results.is_empty())
    }

    async fn delete_document(&self, id: &str) -> Result<bool, RequestError> {
        let response = self.mutate(json!([{ "delete": { "id": id } }])).await?;
        Ok(!response.results.is_empty())
    }

    async fn fetch_published_articles(&self) -> Result<Vec<Article>, RequestError> {
        let groq = format!(
            "*[_type == \"article\" && status == \"published\"] | order(publishedDate desc) {ARTICLE_PROJECTION}"
        );
        let docs: Vec<CmsArticle> = self.query(&groq, &[]).await?;
        Ok(docs.into_iter().map(CmsArticle::into_article).collect())
    }

    async fn try_list_sections(
        &self,
        article_id: &str,
    ) -> Result<Vec<ContentSection>, RequestError> {
        let groq = "*[_type == \"contentSection\" && article._ref == $articleId] | order(order asc) \
             {_id, title, content, order, \"articleId\": article._ref}";
        let docs: Vec<CmsSection> = self
            .query(groq, &[("$articleId", json_param(article_id))])
            .await?;
        Ok(docs.into_iter().map(CmsSection::into_section).collect())
    }

    async fn try_list_media(
        &self,
        article_id: Option<&str>,
    ) -> Result<Vec<MediaFile>, RequestError> {
        let projection = "{_id, title, url, type, description, thumbnail, duration, \"articleId\": article._ref}";
        let docs: Vec<CmsMedia> = match article_id {
            Some(article_id) => {
                let groq = format!(
                    "*[_type == \"mediaFile\" && article._ref == $articleId] {projection}"
                );
                self.query(&groq, &[("$articleId", json_param(article_id))])
                    .await?
            }
            None => {
                let groq = format!("*[_type == \"mediaFile\"] {projection}");
                self.query(&groq, &[]).await?
            }
        };
        Ok(docs.into_iter().map(CmsMedia::into_media).collect())
    }

    async fn try_list_resources(
        &self,
        article_id: Option<&str>,
    ) -> Result<Vec<Resource>, RequestError> {
        let projection =
            "{_id, title, description, url, type, \"articleId\": article._ref}";
        let docs: Vec<CmsResource> = match article_id {
            Some(article_id) => {
                let groq = format!(
                    "*[_type == \"resource\" && article._ref == $articleId] {projection}"
                );
                self.query(&groq, &[("$articleId", json_param(article_id))])
                    .await?
            }
            None => {
                let groq = format!("*[_type == \"resource\"] {projection}");
                self.query(&groq, &[]).await?
            }
        };
        Ok(docs.into_iter().map(CmsResource::into_resource).collect())
    }

    async fn enrich_article(&self, raw: Article) -> Result<Article, RequestError> {
        let sections = self.try_list_sections(&raw.id).await?;
        let media = self.try_list_media(Some(&raw.id)).await?;
        let resources = self.try_list_resources(Some(&raw.id)).await?;
        let candidates = self.fetch_published_articles().await?;
        Ok(enrich(raw, sections, media, resources, &candidates))
    }

    async fn try_get_article(&self, groq: &str, params: &[(&str, String)]) -> Result<Option<Article>, RequestError> {
        let doc: Option<CmsArticle> = self.query(groq, params).await?;
        match doc {
            Some(doc) => Ok(Some(self.enrich_article(doc.into_article()).await?)),
            None => Ok(None),
        }
    }

    async fn find_category_id_by_slug(&self, slug: &str) -> Result<Option<String>, RequestError> {
        #[derive(Deserialize)]
        struct IdOnly {
            #[serde(rename = "_id")]
            id: String,
        }
        let groq = "*[_type == \"category\" && slug.current == $slug][0]{_id}";
        let doc: Option<IdOnly> = self.query(groq, &[("$slug", json_param(slug))]).await?;
        Ok(doc.map(|doc| doc.id))
    }

    async fn category_reference(&self, slug: &str) -> Result<Value, RequestError> {
        match self.find_category_id_by_slug(slug).await? {
            Some(id) => Ok(json!({ "_type": "reference", "_ref": id })),
            None => Err(RequestError::validation(format!("unknown category: {slug}"))),
        }
    }
}

#[async_trait]
impl ContentStore for CmsStore {
    async fn list_categories(&self) -> Vec<Category> {
        let groq = "*[_type == \"category\"] | order(name asc) \
             {_id, name, slug, description, icon, \
              \"articleCount\": count(*[_type == \"article\" && status == \"published\" && category._ref == ^._id])}";
        let result = self
            .query::<Vec<CmsCategory>>(groq, &[])
            .await
            .map(|docs| docs.into_iter().map(CmsCategory::into_category).collect());
        or_empty(result, "categories")
    }

    async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        let groq = "*[_type == \"category\" && slug.current == $slug][0] \
             {_id, name, slug, description, icon, \
              \"articleCount\": count(*[_type == \"article\" && status == \"published\" && category._ref == ^._id])}";
        let result = self
            .query::<Option<CmsCategory>>(groq, &[("$slug", json_param(slug))])
            .await
            .map(|doc| doc.map(CmsCategory::into_category));
        or_none(result, "category")
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RequestError> {
        let slug = slugify(req.slug.as_deref().unwrap_or(&req.name));
        if slug.is_empty() {
            return Err(RequestError::validation("name must produce a non-empty slug"));
        }
        if self.find_category_id_by_slug(&slug).await?.is_some() {
            return Err(RequestError::validation(format!(
                "category slug already exists: {slug}"
            )));
        }
        let id = self
            .create_document(json!({
                "_type": "category",
                "name": req.name,
                "slug": { "current": slug },
                "description": req.description,
                "icon": req.icon,
            }))
            .await?;
        Ok(Category {
            id,
            name: req.name,
            slug,
            description: req.description,
            icon: req.icon,
            article_count: 0,
        })
    }

    async fn update_category(
        &self,
        id: &str,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RequestError> {
        let groq = "*[_type == \"category\" && _id == $id][0]{_id, name, slug, description, icon}";
        let existing: Option<CmsCategory> =
            self.query(groq, &[("$id", json_param(id))]).await?;
        let Some(existing) = existing else {
            return Ok(None);
        };
        // the response is the merged state, never a re-fetch
        let mut category = existing.into_category();
        let mut set = serde_json::Map::new();
        if let Some(name) = req.name {
            set.insert("name".to_string(), json!(&name));
            category.name = name;
        }
        if let Some(slug) = req.slug {
            let slug = slugify(&slug);
            set.insert("slug".to_string(), json!({ "current": &slug }));
            category.slug = slug;
        }
        if let Some(description) = req.description {
            set.insert("description".to_string(), json!(&description));
            category.description = Some(description);
        }
        if let Some(icon) = req.icon {
            set.insert("icon".to_string(), json!(&icon));
            category.icon = Some(icon);
        }
        if !set.is_empty() {
            self.patch_document(id, Value::Object(set)).await?;
        }
        Ok(Some(category))
    }

    async fn delete_category(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article> {
        let raw = match self.fetch_published_articles().await {
            Ok(articles) => articles,
            Err(err) => {
                tracing::warn!("article list read failed, serving empty list: {err:?}");
                return Vec::new();
            }
        };
        // the query already restricts to published; the shared filter keeps
        // the remaining semantics identical across backends
        let selected = filter.apply(raw.clone());
        let mut articles = Vec::with_capacity(selected.len());
        for article in selected {
            let sections = self.try_list_sections(&article.id).await;
            let media = self.try_list_media(Some(&article.id)).await;
            let resources = self.try_list_resources(Some(&article.id)).await;
            match (sections, media, resources) {
                (Ok(sections), Ok(media), Ok(resources)) => {
                    articles.push(enrich(article, sections, media, resources, &raw));
                }
                _ => {
                    tracing::warn!("article enrichment failed, skipping record {}", article.id);
                }
            }
        }
        articles
    }

    async fn get_article_by_id(&self, id: &str) -> Option<Article> {
        let groq = format!("*[_type == \"article\" && _id == $id][0] {ARTICLE_PROJECTION}");
        or_none(
            self.try_get_article(&groq, &[("$id", json_param(id))]).await,
            "article",
        )
    }

    async fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        let groq = format!("*[_type == \"article\" && slug.current == $slug][0] {ARTICLE_PROJECTION}");
        or_none(
            self.try_get_article(&groq, &[("$slug", json_param(slug))])
                .await,
            "article",
        )
    }

    async fn featured_or_latest(&self) -> Option<Article> {
        let result = async {
            let articles = self.fetch_published_articles().await?;
            let pick = articles
                .iter()
                .find(|article| article.featured)
                .or_else(|| articles.first())
                .cloned();
            match pick {
                Some(article) => Ok(Some(self.enrich_article(article).await?)),
                None => Ok(None),
            }
        }
        .await;
        or_none(result, "preview article")
    }

    async fn create_article(&self, req: CreateArticleRequest) -> Result<Article, RequestError> {
        let slug = slugify(req.slug.as_deref().unwrap_or(&req.title));
        if slug.is_empty() {
            return Err(RequestError::validation("title must produce a non-empty slug"));
        }
        let category = match &req.category {
            Some(category_slug) => Some(self.category_reference(category_slug).await?),
            None => None,
        };
        let published_date = req.published_date.unwrap_or_else(Utc::now);
        let id = self
            .create_document(json!({
                "_type": "article",
                "title": req.title,
                "slug": { "current": slug },
                "excerpt": req.excerpt,
                "content": req.content,
                "featuredImage": req.featured_image,
                "publishedDate": published_date,
                "category": category,
                "readTime": req.read_time,
                "tags": req.tags,
                "featured": req.featured,
                "status": req.status.unwrap_or_default().as_str(),
            }))
            .await?;
        self.get_article_by_id(&id)
            .await
            .ok_or(RequestError::NotFound)
    }

    async fn update_article(
        &self,
        id: &str,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, RequestError> {
        let groq = format!("*[_type == \"article\" && _id == $id][0] {ARTICLE_PROJECTION}");
        let existing: Option<CmsArticle> = self.query(&groq, &[("$id", json_param(id))]).await?;
        if existing.is_none() {
            return Ok(None);
        }
        let mut set = serde_json::Map::new();
        if let Some(title) = &req.title {
            set.insert("title".to_string(), json!(title));
        }
        if let Some(slug) = &req.slug {
            set.insert("slug".to_string(), json!({ "current": slugify(slug) }));
        }
        if let Some(excerpt) = &req.excerpt {
            set.insert("excerpt".to_string(), json!(excerpt));
        }
        if let Some(content) = &req.content {
            set.insert("content".to_string(), json!(content));
        }
        if let Some(featured_image) = &req.featured_image {
            set.insert("featuredImage".to_string(), json!(featured_image));
        }
        if let Some(published_date) = &req.published_date {
            set.insert("publishedDate".to_string(), json!(published_date));
        }
        if let Some(category_slug) = &req.category {
            let reference = self.category_reference(category_slug).await?;
            set.insert("category".to_string(), reference);
        }
        if let Some(read_time) = &req.read_time {
            set.insert("readTime".to_string(), json!(read_time));
        }
        if let Some(tags) = &req.tags {
            set.insert("tags".to_string(), json!(tags));
        }
        if let Some(featured) = req.featured {
            set.insert("featured".to_string(), json!(featured));
        }
        if let Some(status) = req.status {
            set.insert("status".to_string(), json!(status.as_str()));
        }
        set.insert("updatedDate".to_string(), json!(Utc::now()));
        self.patch_document(id, Value::Object(set)).await?;
        Ok(self.get_article_by_id(id).await)
    }

    async fn delete_article(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }

    async fn list_sections(&self, article_id: &str) -> Vec<ContentSection> {
        or_empty(self.try_list_sections(article_id).await, "sections")
    }

    async fn create_section(
        &self,
        req: CreateSectionRequest,
    ) -> Result<ContentSection, RequestError> {
        let id = self
            .create_document(json!({
                "_type": "contentSection",
                "title": req.title,
                "content": req.content,
                "order": req.order,
                "article": { "_type": "reference", "_ref": req.article_id },
            }))
            .await?;
        Ok(ContentSection {
            id,
            title: req.title,
            content: req.content,
            order: req.order,
            article_id: req.article_id,
        })
    }

    async fn update_section(
        &self,
        id: &str,
        req: UpdateSectionRequest,
    ) -> Result<Option<ContentSection>, RequestError> {
        let groq = "*[_type == \"contentSection\" && _id == $id][0] \
             {_id, title, content, order, \"articleId\": article._ref}";
        let existing: Option<CmsSection> = self.query(groq, &[("$id", json_param(id))]).await?;
        let Some(existing) = existing else {
            return Ok(None);
        };
        let mut section = existing.into_section();
        let mut set = serde_json::Map::new();
        if let Some(title) = req.title {
            set.insert("title".to_string(), json!(&title));
            section.title = Some(title);
        }
        if let Some(content) = req.content {
            section.content = content.clone();
            set.insert("content".to_string(), json!(content));
        }
        if let Some(order) = req.order {
            section.order = order;
            set.insert("order".to_string(), json!(order));
        }
        if !set.is_empty() {
            self.patch_document(id, Value::Object(set)).await?;
        }
        Ok(Some(section))
    }

    async fn delete_section(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }

    async fn list_media(&self, article_id: Option<&str>) -> Vec<MediaFile> {
        or_empty(self.try_list_media(article_id).await, "media")
    }

    async fn create_media(&self, req: CreateMediaRequest) -> Result<MediaFile, RequestError> {
        let article = req
            .article_id
            .as_ref()
            .map(|id| json!({ "_type": "reference", "_ref": id }));
        let id = self
            .create_document(json!({
                "_type": "mediaFile",
                "title": req.title,
                "url": req.url,
                "type": req.media_type.as_str(),
                "description": req.description,
                "thumbnail": req.thumbnail,
                "duration": req.duration,
                "article": article,
            }))
            .await?;
        Ok(MediaFile {
            id,
            title: req.title,
            url: req.url,
            media_type: req.media_type,
            description: req.description,
            thumbnail: req.thumbnail,
            duration: req.duration,
            article_id: req.article_id,
        })
    }

    async fn delete_media(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }

    async fn list_resources(&self, article_id: Option<&str>) -> Vec<Resource> {
        or_empty(self.try_list_resources(article_id).await, "resources")
    }

    async fn create_resource(&self, req: CreateResourceRequest) -> Result<Resource, RequestError> {
        let article = req
            .article_id
            .as_ref()
            .map(|id| json!({ "_type": "reference", "_ref": id }));
        let id = self
            .create_document(json!({
                "_type": "resource",
                "title": req.title,
                "description": req.description,
                "url": req.url,
                "type": req.resource_type,
                "article": article,
            }))
            .await?;
        Ok(Resource {
            id,
            title: req.title,
            description: req.description,
            url: req.url,
            resource_type: req.resource_type,
            article_id: req.article_id,
        })
    }

    async fn delete_resource(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }

    async fn list_subscribers(&self) -> Vec<Subscriber> {
        let groq = "*[_type == \"subscriber\"] | order(subscribedAt desc) \
             {_id, email, name, consent, status, subscribedAt}";
        let result = self
            .query::<Vec<CmsSubscriber>>(groq, &[])
            .await
            .map(|docs| docs.into_iter().map(CmsSubscriber::into_subscriber).collect());
        or_empty(result, "subscribers")
    }

    async fn upsert_subscriber(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Subscriber, RequestError> {
        let groq = "*[_type == \"subscriber\" && lower(email) == lower($email)][0] \
             {_id, email, name, consent, status, subscribedAt}";
        let existing: Option<CmsSubscriber> =
            self.query(groq, &[("$email", json_param(email))]).await?;
        if let Some(existing) = existing {
            let mut set = serde_json::Map::new();
            set.insert("status".to_string(), json!("active"));
            set.insert("consent".to_string(), json!(true));
            if let Some(name) = &name {
                set.insert("name".to_string(), json!(name));
            }
            self.patch_document(&existing.id, Value::Object(set)).await?;
            let mut subscriber = existing.into_subscriber();
            subscriber.status = SubscriberStatus::Active;
            subscriber.consent = true;
            if let Some(name) = name {
                subscriber.name = Some(name);
            }
            return Ok(subscriber);
        }
        let subscribed_at = Utc::now();
        let id = self
            .create_document(json!({
                "_type": "subscriber",
                "email": email,
                "name": name,
                "consent": true,
                "status": "active",
                "subscribedAt": subscribed_at,
            }))
            .await?;
        Ok(Subscriber {
            id,
            email: email.to_string(),
            name,
            consent: true,
            status: SubscriberStatus::Active,
            subscribed_at,
        })
    }

    async fn update_subscriber_status(
        &self,
        id: &str,
        status: SubscriberStatus,
    ) -> Result<Option<Subscriber>, RequestError> {
        let groq = "*[_type == \"subscriber\" && _id == $id][0] \
             {_id, email, name, consent, status, subscribedAt}";
        let existing: Option<CmsSubscriber> = self.query(groq, &[("$id", json_param(id))]).await?;
        let Some(existing) = existing else {
            return Ok(None);
        };
        self.patch_document(id, json!({ "status": status.as_str() }))
            .await?;
        let mut subscriber = existing.into_subscriber();
        subscriber.status = status;
        Ok(Some(subscriber))
    }

    async fn delete_subscriber(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }

    async fn list_contacts(&self) -> Vec<Contact> {
        let groq = "*[_type == \"contact\"] | order(createdAt desc) \
             {_id, name, email, message, status, createdAt}";
        let result = self
            .query::<Vec<CmsContact>>(groq, &[])
            .await
            .map(|docs| docs.into_iter().map(CmsContact::into_contact).collect());
        or_empty(result, "contacts")
    }

    async fn create_contact(&self, req: ContactRequest) -> Result<Contact, RequestError> {
        let created_at = Utc::now();
        let id = self
            .create_document(json!({
                "_type": "contact",
                "name": req.name,
                "email": req.email,
                "message": req.message,
                "status": "new",
                "createdAt": created_at,
            }))
            .await?;
        Ok(Contact {
            id,
            name: req.name,
            email: req.email,
            message: req.message,
            status: ContactStatus::New,
            created_at,
        })
    }

    async fn update_contact_status(
        &self,
        id: &str,
        status: ContactStatus,
    ) -> Result<Option<Contact>, RequestError> {
        let groq = "*[_type == \"contact\" && _id == $id][0] \
             {_id, name, email, message, status, createdAt}";
        let existing: Option<CmsContact> = self.query(groq, &[("$id", json_param(id))]).await?;
        let Some(existing) = existing else {
            return Ok(None);
        };
        self.patch_document(id, json!({ "status": status.as_str() }))
            .await?;
        let mut contact = existing.into_contact();
        contact.status = status;
        Ok(Some(contact))
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, RequestError> {
        self.delete_document(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_objects_flatten_to_plain_strings() {
        let object: CmsSlug = serde_json::from_str(r#"{"current": "my-article"}"#).unwrap();
        let plain: CmsSlug = serde_json::from_str(r#""my-article""#).unwrap();
        assert_eq!(object.into_string(), "my-article");
        assert_eq!(plain.into_string(), "my-article");
    }

    #[test]
    fn rich_text_blocks_flatten_to_plain_text() {
        let blocks = json!([
            {"_type": "block", "children": [{"text": "Hello "}, {"text": "world"}]},
            {"_type": "block", "children": [{"text": "Second paragraph"}]}
        ]);
        assert_eq!(rich_text_to_plain(&blocks), "Hello world\n\nSecond paragraph");
        assert_eq!(rich_text_to_plain(&json!("plain markdown")), "plain markdown");
        assert_eq!(rich_text_to_plain(&Value::Null), "");
    }

    #[test]
    fn category_ref_falls_back_to_slugified_name() {
        let reference = CmsCategoryRef {
            name: "Web Development".to_string(),
            slug: None,
        };
        let normalized = reference.into_category_ref();
        assert_eq!(normalized.slug, "web-development");
    }
}
