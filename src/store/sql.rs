//! Relational backend on SQLite through sqlx.
//!
//! Filters compile to WHERE clauses: category matching runs against the
//! denormalized `category_name`/`category_slug` columns (no join), and both
//! tag membership (delimiter-wrapped over the comma-joined `tags` column)
//! and search use `instr` over lowered text, never LIKE, so `%` and `_` in
//! a needle stay literal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};

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
use crate::store::{enrich, or_empty, or_none, ArticleFilter, ContentStore, RELATED_LIMIT};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Single-connection in-memory database with the schema applied.
    /// One connection is mandatory: every pooled connection would otherwise
    /// get its own private `:memory:` database.
    pub async fn in_memory() -> Result<Self, RequestError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        MIGRATOR.run(&pool).await.map_err(anyhow::Error::from)?;
        Ok(Self::new(pool))
    }
}

const ARTICLE_COLUMNS: &str = "id, title, slug, excerpt, content, featured_image, \
     published_date, updated_date, category_name, category_slug, read_time, tags, \
     featured, status";

const SECTION_COLUMNS: &str = "id, title, content, sort_order, article_id";
const MEDIA_COLUMNS: &str = "id, title, url, media_type, description, thumbnail, duration, article_id";
const RESOURCE_COLUMNS: &str = "id, title, description, url, resource_type, article_id";

fn parse_id(id: &str) -> Option<i64> {
    id.parse::<i64>().ok()
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    featured_image: Option<String>,
    published_date: DateTime<Utc>,
    updated_date: Option<DateTime<Utc>>,
    category_name: Option<String>,
    category_slug: Option<String>,
    read_time: Option<String>,
    tags: String,
    featured: bool,
    status: String,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        let category = match (self.category_name, self.category_slug) {
            (Some(name), Some(slug)) => Some(CategoryRef { name, slug }),
            (Some(name), None) => {
                let slug = slugify(&name);
                Some(CategoryRef { name, slug })
            }
            _ => None,
        };
        Article {
            id: self.id.to_string(),
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            featured_image: self.featured_image,
            published_date: self.published_date,
            updated_date: self.updated_date,
            category,
            read_time: self.read_time,
            tags: split_tags(&self.tags),
            featured: self.featured,
            status: ArticleStatus::parse(&self.status).unwrap_or_default(),
            content_sections: Vec::new(),
            video_files: Vec::new(),
            audio_files: Vec::new(),
            images: Vec::new(),
            resources: Vec::new(),
            related_articles: Vec::new(),
        }
    }
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    icon: Option<String>,
    article_count: i64,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id.to_string(),
            name: self.name,
            slug: self.slug,
            description: self.description,
            icon: self.icon,
            article_count: self.article_count,
        }
    }
}

// article_count is recomputed on read rather than trusted as a stored
// counter, so it can never drift from the article table.
const CATEGORY_QUERY: &str = "\
    SELECT c.id, c.name, c.slug, c.description, c.icon, \
           (SELECT COUNT(*) FROM articles a \
             WHERE a.category_slug = c.slug AND a.status = 'published') AS article_count \
    FROM categories c";

#[derive(Debug, sqlx::FromRow)]
struct SectionRow {
    id: i64,
    title: Option<String>,
    content: String,
    sort_order: i64,
    article_id: i64,
}

impl SectionRow {
    fn into_section(self) -> ContentSection {
        ContentSection {
            id: self.id.to_string(),
            title: self.title,
            content: self.content,
            order: self.sort_order,
            article_id: self.article_id.to_string(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: i64,
    title: String,
    url: String,
    media_type: String,
    description: Option<String>,
    thumbnail: Option<String>,
    duration: Option<String>,
    article_id: Option<i64>,
}

impl MediaRow {
    fn into_media(self) -> MediaFile {
        MediaFile {
            id: self.id.to_string(),
            title: self.title,
            url: self.url,
            media_type: MediaType::parse(&self.media_type).unwrap_or(MediaType::Document),
            description: self.description,
            thumbnail: self.thumbnail,
            duration: self.duration,
            article_id: self.article_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResourceRow {
    id: i64,
    title: String,
    description: Option<String>,
    url: String,
    resource_type: String,
    article_id: Option<i64>,
}

impl ResourceRow {
    fn into_resource(self) -> Resource {
        Resource {
            id: self.id.to_string(),
            title: self.title,
            description: self.description,
            url: self.url,
            resource_type: self.resource_type,
            article_id: self.article_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    email: String,
    name: Option<String>,
    consent: bool,
    status: String,
    subscribed_at: DateTime<Utc>,
}

impl SubscriberRow {
    fn into_subscriber(self) -> Subscriber {
        Subscriber {
            id: self.id.to_string(),
            email: self.email,
            name: self.name,
            consent: self.consent,
            status: SubscriberStatus::parse(&self.status).unwrap_or_default(),
            subscribed_at: self.subscribed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i64,
    name: String,
    email: String,
    message: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl ContactRow {
    fn into_contact(self) -> Contact {
        Contact {
            id: self.id.to_string(),
            name: self.name,
            email: self.email,
            message: self.message,
            status: ContactStatus::parse(&self.status).unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

impl SqlStore {
    async fn fetch_article_rows(
        &self,
        filter: &ArticleFilter,
    ) -> Result<Vec<ArticleRow>, RequestError> {
        let mut sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = 'published'");
        let mut params: Vec<String> = Vec::new();

        if let Some(featured) = filter.featured {
            sql.push_str(" AND featured = ");
            sql.push_str(if featured { "1" } else { "0" });
        }
        if let Some(slug) = &filter.category_slug {
            sql.push_str(
                " AND (lower(category_slug) = lower(?) \
                  OR lower(replace(category_name, ' ', '-')) = lower(?))",
            );
            params.push(slug.clone());
            params.push(slug.clone());
        }
        if let Some(tag) = &filter.tag {
            // instr, not LIKE: % and _ in the tag stay literal
            sql.push_str(" AND instr(',' || lower(tags) || ',', ',' || lower(?) || ',') > 0");
            params.push(tag.clone());
        }
        if let Some(needle) = &filter.search {
            sql.push_str(
                " AND (instr(lower(title), lower(?)) > 0 \
                  OR instr(lower(excerpt), lower(?)) > 0 \
                  OR instr(lower(content), lower(?)) > 0)",
            );
            params.push(needle.clone());
            params.push(needle.clone());
            params.push(needle.clone());
        }
        sql.push_str(" ORDER BY published_date DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query_as::<Sqlite, ArticleRow>(&sql);
        for param in params {
            query = query.bind(param);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn enrich_article(&self, raw: Article) -> Result<Article, RequestError> {
        let sections = self.try_list_sections(&raw.id).await?;
        let media = self.try_list_media(Some(&raw.id)).await?;
        let resources = self.try_list_resources(Some(&raw.id)).await?;
        let candidates = match &raw.category {
            Some(category) => {
                let sql = format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles \
                     WHERE status = 'published' AND category_slug = ? AND id != ? \
                     ORDER BY id LIMIT {RELATED_LIMIT}"
                );
                let own_id = parse_id(&raw.id).unwrap_or(-1);
                sqlx::query_as::<Sqlite, ArticleRow>(&sql)
                    .bind(&category.slug)
                    .bind(own_id)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(ArticleRow::into_article)
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(enrich(raw, sections, media, resources, &candidates))
    }

    async fn fetch_article_row_by(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<ArticleRow>, RequestError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE {column} = ?");
        Ok(sqlx::query_as::<Sqlite, ArticleRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn try_get_article_by_id(&self, id: &str) -> Result<Option<Article>, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = self.fetch_article_row_by("id", &id.to_string()).await?;
        match row {
            Some(row) => Ok(Some(self.enrich_article(row.into_article()).await?)),
            None => Ok(None),
        }
    }

    async fn try_get_article_by_slug(&self, slug: &str) -> Result<Option<Article>, RequestError> {
        let row = self.fetch_article_row_by("slug", slug).await?;
        match row {
            Some(row) => Ok(Some(self.enrich_article(row.into_article()).await?)),
            None => Ok(None),
        }
    }

    async fn try_list_sections(
        &self,
        article_id: &str,
    ) -> Result<Vec<ContentSection>, RequestError> {
        let Some(article_id) = parse_id(article_id) else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {SECTION_COLUMNS} FROM content_sections \
             WHERE article_id = ? ORDER BY sort_order ASC"
        );
        let rows = sqlx::query_as::<Sqlite, SectionRow>(&sql)
            .bind(article_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(SectionRow::into_section).collect())
    }

    async fn try_list_media(
        &self,
        article_id: Option<&str>,
    ) -> Result<Vec<MediaFile>, RequestError> {
        let rows = match article_id {
            Some(article_id) => {
                let Some(article_id) = parse_id(article_id) else {
                    return Ok(Vec::new());
                };
                let sql = format!("SELECT {MEDIA_COLUMNS} FROM media_files WHERE article_id = ?");
                sqlx::query_as::<Sqlite, MediaRow>(&sql)
                    .bind(article_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {MEDIA_COLUMNS} FROM media_files");
                sqlx::query_as::<Sqlite, MediaRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(MediaRow::into_media).collect())
    }

    async fn try_list_resources(
        &self,
        article_id: Option<&str>,
    ) -> Result<Vec<Resource>, RequestError> {
        let rows = match article_id {
            Some(article_id) => {
                let Some(article_id) = parse_id(article_id) else {
                    return Ok(Vec::new());
                };
                let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE article_id = ?");
                sqlx::query_as::<Sqlite, ResourceRow>(&sql)
                    .bind(article_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources");
                sqlx::query_as::<Sqlite, ResourceRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(ResourceRow::into_resource).collect())
    }

    async fn resolve_category(
        &self,
        slug: &str,
    ) -> Result<CategoryRef, RequestError> {
        let category = self.try_get_category_by_slug(slug).await?;
        match category {
            Some(category) => Ok(CategoryRef {
                name: category.name,
                slug: category.slug,
            }),
            None => Err(RequestError::validation(format!("unknown category: {slug}"))),
        }
    }

    async fn try_list_categories(&self) -> Result<Vec<Category>, RequestError> {
        let sql = format!("{CATEGORY_QUERY} ORDER BY c.name ASC");
        let rows = sqlx::query_as::<Sqlite, CategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CategoryRow::into_category).collect())
    }

    async fn try_get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RequestError> {
        let sql = format!("{CATEGORY_QUERY} WHERE lower(c.slug) = lower(?)");
        let row = sqlx::query_as::<Sqlite, CategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CategoryRow::into_category))
    }

    async fn get_category_row_by_id(&self, id: i64) -> Result<Option<Category>, RequestError> {
        let sql = format!("{CATEGORY_QUERY} WHERE c.id = ?");
        let row = sqlx::query_as::<Sqlite, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CategoryRow::into_category))
    }
}

#[async_trait]
impl ContentStore for SqlStore {
    async fn list_categories(&self) -> Vec<Category> {
        or_empty(self.try_list_categories().await, "categories")
    }

    async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        or_none(self.try_get_category_by_slug(slug).await, "category")
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RequestError> {
        let slug = slugify(req.slug.as_deref().unwrap_or(&req.name));
        if slug.is_empty() {
            return Err(RequestError::validation("name must produce a non-empty slug"));
        }
        if self.try_get_category_by_slug(&slug).await?.is_some() {
            return Err(RequestError::validation(format!(
                "category slug already exists: {slug}"
            )));
        }
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO categories (name, slug, description, icon) \
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&req.name)
        .bind(&slug)
        .bind(&req.description)
        .bind(&req.icon)
        .fetch_one(&self.pool)
        .await?;
        Ok(Category {
            id: row.0.to_string(),
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
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let Some(existing) = self.get_category_row_by_id(id).await? else {
            return Ok(None);
        };
        let name = req.name.unwrap_or(existing.name);
        let slug = match req.slug {
            Some(slug) => slugify(&slug),
            None => existing.slug,
        };
        let description = req.description.or(existing.description);
        let icon = req.icon.or(existing.icon);
        sqlx::query("UPDATE categories SET name = ?, slug = ?, description = ?, icon = ? WHERE id = ?")
            .bind(&name)
            .bind(&slug)
            .bind(&description)
            .bind(&icon)
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.get_category_row_by_id(id).await
    }

    async fn delete_category(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        // hard delete; articles keep their denormalized category columns
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article> {
        let rows = match self.fetch_article_rows(filter).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!("article list read failed, serving empty list: {err:?}");
                return Vec::new();
            }
        };
        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            match self.enrich_article(row.into_article()).await {
                Ok(article) => articles.push(article),
                Err(err) => {
                    tracing::warn!("article enrichment failed, skipping record: {err:?}");
                }
            }
        }
        articles
    }

    async fn get_article_by_id(&self, id: &str) -> Option<Article> {
        or_none(self.try_get_article_by_id(id).await, "article")
    }

    async fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        or_none(self.try_get_article_by_slug(slug).await, "article")
    }

    async fn featured_or_latest(&self) -> Option<Article> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = 'published' \
             ORDER BY featured DESC, published_date DESC LIMIT 1"
        );
        let result = async {
            let row = sqlx::query_as::<Sqlite, ArticleRow>(&sql)
                .fetch_optional(&self.pool)
                .await?;
            match row {
                Some(row) => Ok(Some(self.enrich_article(row.into_article()).await?)),
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
        if self.fetch_article_row_by("slug", &slug).await?.is_some() {
            return Err(RequestError::validation(format!(
                "article slug already exists: {slug}"
            )));
        }
        let category = match &req.category {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let published_date = req.published_date.unwrap_or_else(Utc::now);
        let status = req.status.unwrap_or_default();

        let row: (i64,) = sqlx::query_as(
            "INSERT INTO articles (title, slug, excerpt, content, featured_image, \
             published_date, category_name, category_slug, read_time, tags, featured, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&req.title)
        .bind(&slug)
        .bind(&req.excerpt)
        .bind(&req.content)
        .bind(&req.featured_image)
        .bind(published_date)
        .bind(category.as_ref().map(|c| c.name.clone()))
        .bind(category.as_ref().map(|c| c.slug.clone()))
        .bind(&req.read_time)
        .bind(join_tags(&req.tags))
        .bind(req.featured)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        self.try_get_article_by_id(&row.0.to_string())
            .await?
            .ok_or(RequestError::NotFound)
    }

    async fn update_article(
        &self,
        id: &str,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, RequestError> {
        let Some(numeric_id) = parse_id(id) else {
            return Ok(None);
        };
        let Some(existing) = self.fetch_article_row_by("id", &numeric_id.to_string()).await? else {
            return Ok(None);
        };

        let category = match &req.category {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let title = req.title.unwrap_or(existing.title);
        let slug = match req.slug {
            Some(slug) => slugify(&slug),
            None => existing.slug,
        };
        let excerpt = req.excerpt.unwrap_or(existing.excerpt);
        let content = req.content.unwrap_or(existing.content);
        let featured_image = req.featured_image.or(existing.featured_image);
        let published_date = req.published_date.unwrap_or(existing.published_date);
        let (category_name, category_slug) = match category {
            Some(category) => (Some(category.name), Some(category.slug)),
            None => (existing.category_name, existing.category_slug),
        };
        let read_time = req.read_time.or(existing.read_time);
        let tags = match req.tags {
            Some(tags) => join_tags(&tags),
            None => existing.tags,
        };
        let featured = req.featured.unwrap_or(existing.featured);
        let status = req
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or(existing.status);

        sqlx::query(
            "UPDATE articles SET title = ?, slug = ?, excerpt = ?, content = ?, \
             featured_image = ?, published_date = ?, updated_date = ?, category_name = ?, \
             category_slug = ?, read_time = ?, tags = ?, featured = ?, status = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&slug)
        .bind(&excerpt)
        .bind(&content)
        .bind(&featured_image)
        .bind(published_date)
        .bind(Utc::now())
        .bind(&category_name)
        .bind(&category_slug)
        .bind(&read_time)
        .bind(&tags)
        .bind(featured)
        .bind(&status)
        .bind(numeric_id)
        .execute(&self.pool)
        .await?;

        self.try_get_article_by_id(id).await
    }

    async fn delete_article(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_sections(&self, article_id: &str) -> Vec<ContentSection> {
        or_empty(self.try_list_sections(article_id).await, "sections")
    }

    async fn create_section(
        &self,
        req: CreateSectionRequest,
    ) -> Result<ContentSection, RequestError> {
        let Some(article_id) = parse_id(&req.article_id) else {
            return Err(RequestError::validation("articleId must be a numeric id"));
        };
        if self
            .fetch_article_row_by("id", &article_id.to_string())
            .await?
            .is_none()
        {
            return Err(RequestError::validation(format!(
                "unknown articleId: {article_id}"
            )));
        }
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO content_sections (title, content, sort_order, article_id) \
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.order)
        .bind(article_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(ContentSection {
            id: row.0.to_string(),
            title: req.title,
            content: req.content,
            order: req.order,
            article_id: article_id.to_string(),
        })
    }

    async fn update_section(
        &self,
        id: &str,
        req: UpdateSectionRequest,
    ) -> Result<Option<ContentSection>, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {SECTION_COLUMNS} FROM content_sections WHERE id = ?");
        let Some(existing) = sqlx::query_as::<Sqlite, SectionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let title = req.title.or(existing.title);
        let content = req.content.unwrap_or(existing.content);
        let order = req.order.unwrap_or(existing.sort_order);
        sqlx::query("UPDATE content_sections SET title = ?, content = ?, sort_order = ? WHERE id = ?")
            .bind(&title)
            .bind(&content)
            .bind(order)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(Some(ContentSection {
            id: id.to_string(),
            title,
            content,
            order,
            article_id: existing.article_id.to_string(),
        }))
    }

    async fn delete_section(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM content_sections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_media(&self, article_id: Option<&str>) -> Vec<MediaFile> {
        or_empty(self.try_list_media(article_id).await, "media")
    }

    async fn create_media(&self, req: CreateMediaRequest) -> Result<MediaFile, RequestError> {
        let article_id = match &req.article_id {
            Some(article_id) => match parse_id(article_id) {
                Some(id) => Some(id),
                None => {
                    return Err(RequestError::validation("articleId must be a numeric id"));
                }
            },
            None => None,
        };
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO media_files (title, url, media_type, description, thumbnail, duration, article_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&req.title)
        .bind(&req.url)
        .bind(req.media_type.as_str())
        .bind(&req.description)
        .bind(&req.thumbnail)
        .bind(&req.duration)
        .bind(article_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(MediaFile {
            id: row.0.to_string(),
            title: req.title,
            url: req.url,
            media_type: req.media_type,
            description: req.description,
            thumbnail: req.thumbnail,
            duration: req.duration,
            article_id: article_id.map(|id| id.to_string()),
        })
    }

    async fn delete_media(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM media_files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_resources(&self, article_id: Option<&str>) -> Vec<Resource> {
        or_empty(self.try_list_resources(article_id).await, "resources")
    }

    async fn create_resource(&self, req: CreateResourceRequest) -> Result<Resource, RequestError> {
        let article_id = match &req.article_id {
            Some(article_id) => match parse_id(article_id) {
                Some(id) => Some(id),
                None => {
                    return Err(RequestError::validation("articleId must be a numeric id"));
                }
            },
            None => None,
        };
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO resources (title, description, url, resource_type, article_id) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.url)
        .bind(&req.resource_type)
        .bind(article_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Resource {
            id: row.0.to_string(),
            title: req.title,
            description: req.description,
            url: req.url,
            resource_type: req.resource_type,
            article_id: article_id.map(|id| id.to_string()),
        })
    }

    async fn delete_resource(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_subscribers(&self) -> Vec<Subscriber> {
        let result = async {
            let rows = sqlx::query_as::<Sqlite, SubscriberRow>(
                "SELECT id, email, name, consent, status, subscribed_at FROM subscribers \
                 ORDER BY subscribed_at DESC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(SubscriberRow::into_subscriber).collect())
        }
        .await;
        or_empty(result, "subscribers")
    }

    async fn upsert_subscriber(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Subscriber, RequestError> {
        let existing = sqlx::query_as::<Sqlite, SubscriberRow>(
            "SELECT id, email, name, consent, status, subscribed_at FROM subscribers \
             WHERE lower(email) = lower(?)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(existing) = existing {
            // re-subscription reactivates the record instead of duplicating it
            sqlx::query("UPDATE subscribers SET status = 'active', consent = 1, name = COALESCE(?, name) WHERE id = ?")
                .bind(&name)
                .bind(existing.id)
                .execute(&self.pool)
                .await?;
            let mut subscriber = existing.into_subscriber();
            subscriber.status = SubscriberStatus::Active;
            subscriber.consent = true;
            if let Some(name) = name {
                subscriber.name = Some(name);
            }
            return Ok(subscriber);
        }

        let subscribed_at = Utc::now();
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO subscribers (email, name, consent, status, subscribed_at) \
             VALUES (?, ?, 1, 'active', ?) RETURNING id",
        )
        .bind(email)
        .bind(&name)
        .bind(subscribed_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(Subscriber {
            id: row.0.to_string(),
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
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let result = sqlx::query("UPDATE subscribers SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query_as::<Sqlite, SubscriberRow>(
            "SELECT id, email, name, consent, status, subscribed_at FROM subscribers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SubscriberRow::into_subscriber))
    }

    async fn delete_subscriber(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM subscribers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_contacts(&self) -> Vec<Contact> {
        let result = async {
            let rows = sqlx::query_as::<Sqlite, ContactRow>(
                "SELECT id, name, email, message, status, created_at FROM contacts \
                 ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(ContactRow::into_contact).collect())
        }
        .await;
        or_empty(result, "contacts")
    }

    async fn create_contact(&self, req: ContactRequest) -> Result<Contact, RequestError> {
        let created_at = Utc::now();
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO contacts (name, email, message, status, created_at) \
             VALUES (?, ?, ?, 'new', ?) RETURNING id",
        )
        .bind(&req.name)
        .bind(&req.email)
        .bind(&req.message)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(Contact {
            id: row.0.to_string(),
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
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let result = sqlx::query("UPDATE contacts SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query_as::<Sqlite, ContactRow>(
            "SELECT id, name, email, message, status, created_at FROM contacts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ContactRow::into_contact))
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, RequestError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
