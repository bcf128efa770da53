//! Flat-file backend: directories of frontmatter-tagged markdown.
//!
//! Layout under the content root:
//!   articles/*.md     YAML frontmatter + markdown body; the filename stem is
//!                     the article's slug and its id
//!   categories/*.md   YAML frontmatter; filename stem is the slug
//!   subscribers.json  JSON array
//!   contacts.json     JSON array
//!
//! Sections, media and resources live inside the owning article's
//! frontmatter; their ids are positional (`slug#section-0`). Every listing
//! reads and parses the whole directory, and every write is a full-file
//! rewrite, which is acceptable only for a small single-editor corpus.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

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

pub struct FileStore {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ArticleFrontmatter {
    title: String,
    excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    read_time: Option<String>,
    tags: Vec<String>,
    featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sections: Vec<SectionFront>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media: Vec<MediaFront>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resources: Vec<ResourceFront>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SectionFront {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    content: String,
    order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct MediaFront {
    title: String,
    url: String,
    #[serde(rename = "type")]
    media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ResourceFront {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    url: String,
    #[serde(rename = "type")]
    resource_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CategoryFrontmatter {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
}

/// One parsed article file: the raw article plus its frontmatter children,
/// already carrying their positional ids.
struct RawArticle {
    article: Article,
    sections: Vec<ContentSection>,
    media: Vec<MediaFile>,
    resources: Vec<Resource>,
    front: ArticleFrontmatter,
    body: String,
}

/// Split a document into its YAML frontmatter block and the remaining body.
/// The first line must be `---`; the block ends at the next `---` or `...`.
fn split_frontmatter(input: &str) -> Option<(String, String)> {
    let rest = input.strip_prefix("\u{feff}").unwrap_or(input);
    let mut lines = rest.lines();
    if lines.next()?.trim_end() != "---" {
        return None;
    }
    let mut yaml_lines = Vec::new();
    let mut closed = false;
    let mut body_lines = Vec::new();
    for line in lines {
        if !closed {
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                closed = true;
                continue;
            }
            yaml_lines.push(line);
        } else {
            body_lines.push(line);
        }
    }
    if !closed {
        return None;
    }
    Some((yaml_lines.join("\n"), body_lines.join("\n")))
}

fn render_document<T: Serialize>(front: &T, body: &str) -> Result<String, RequestError> {
    let yaml = serde_yaml::to_string(front)?;
    let yaml = yaml.strip_prefix("---\n").unwrap_or(&yaml);
    let mut doc = format!("---\n{yaml}---\n");
    if !body.is_empty() {
        doc.push('\n');
        doc.push_str(body);
        if !body.ends_with('\n') {
            doc.push('\n');
        }
    }
    Ok(doc)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Positional child id: `{article-slug}#{kind}-{index}`.
fn child_id(slug: &str, kind: &str, index: usize) -> String {
    format!("{slug}#{kind}-{index}")
}

fn parse_child_id(id: &str, kind: &str) -> Option<(String, usize)> {
    let (slug, rest) = id.split_once('#')?;
    let index = rest.strip_prefix(kind)?.strip_prefix('-')?.parse().ok()?;
    Some((slug.to_string(), index))
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn articles_dir(&self) -> PathBuf {
        self.root.join("articles")
    }

    fn categories_dir(&self) -> PathBuf {
        self.root.join("categories")
    }

    fn article_path(&self, slug: &str) -> PathBuf {
        self.articles_dir().join(format!("{slug}.md"))
    }

    fn category_path(&self, slug: &str) -> PathBuf {
        self.categories_dir().join(format!("{slug}.md"))
    }

    fn markdown_files(&self, dir: &Path) -> Result<Vec<PathBuf>, RequestError> {
        let mut paths = Vec::new();
        if !dir.exists() {
            return Ok(paths);
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map(|ext| ext == "md").unwrap_or(false) {
                paths.push(path);
            }
        }
        // directory order is platform-dependent; sort for determinism
        paths.sort();
        Ok(paths)
    }

    fn resolve_category(&self, value: &str) -> CategoryRef {
        let slug = slugify(value);
        match self.read_category_front(&slug) {
            Ok(Some(front)) => CategoryRef {
                name: if front.name.is_empty() {
                    value.to_string()
                } else {
                    front.name
                },
                slug,
            },
            // dangling references are tolerated; fall back to the raw value
            _ => CategoryRef {
                name: value.to_string(),
                slug,
            },
        }
    }

    fn read_category_front(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryFrontmatter>, RequestError> {
        let path = self.category_path(slug);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let front = match split_frontmatter(&text) {
            Some((yaml, _)) => serde_yaml::from_str(&yaml)?,
            None => CategoryFrontmatter::default(),
        };
        Ok(Some(front))
    }

    fn read_raw(&self, path: &Path) -> Result<RawArticle, RequestError> {
        let slug = file_stem(path);
        let text = fs::read_to_string(path)?;
        let (yaml, body) = split_frontmatter(&text)
            .ok_or_else(|| anyhow!("missing frontmatter in {}", path.display()))?;
        let front: ArticleFrontmatter = serde_yaml::from_str(&yaml)?;
        Ok(self.assemble(slug, front, body, path))
    }

    fn assemble(
        &self,
        slug: String,
        front: ArticleFrontmatter,
        body: String,
        path: &Path,
    ) -> RawArticle {
        let published_date = front.published_date.unwrap_or_else(|| {
            // hand-authored files may omit publishedDate; the file's own
            // timestamp is the closest thing to a creation time
            fs::metadata(path)
                .and_then(|meta| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
        let category = front.category.as_deref().map(|c| self.resolve_category(c));

        let sections = front
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| ContentSection {
                id: child_id(&slug, "section", index),
                title: section.title.clone(),
                content: section.content.clone(),
                order: section.order,
                article_id: slug.clone(),
            })
            .collect();
        let media = front
            .media
            .iter()
            .enumerate()
            .map(|(index, media)| MediaFile {
                id: child_id(&slug, "media", index),
                title: media.title.clone(),
                url: media.url.clone(),
                media_type: MediaType::parse(&media.media_type).unwrap_or(MediaType::Document),
                description: media.description.clone(),
                thumbnail: media.thumbnail.clone(),
                duration: media.duration.clone(),
                article_id: Some(slug.clone()),
            })
            .collect();
        let resources = front
            .resources
            .iter()
            .enumerate()
            .map(|(index, resource)| Resource {
                id: child_id(&slug, "resource", index),
                title: resource.title.clone(),
                description: resource.description.clone(),
                url: resource.url.clone(),
                resource_type: if resource.resource_type.is_empty() {
                    "link".to_string()
                } else {
                    resource.resource_type.clone()
                },
                article_id: Some(slug.clone()),
            })
            .collect();

        let article = Article {
            id: slug.clone(),
            title: front.title.clone(),
            slug: slug.clone(),
            excerpt: front.excerpt.clone(),
            content: body.trim().to_string(),
            featured_image: front.featured_image.clone(),
            published_date,
            updated_date: front.updated_date,
            category,
            read_time: front.read_time.clone(),
            tags: front.tags.clone(),
            featured: front.featured,
            status: front
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
        };

        RawArticle {
            article,
            sections,
            media,
            resources,
            front,
            body,
        }
    }

    fn load_raw(&self) -> Result<Vec<RawArticle>, RequestError> {
        let mut raws = Vec::new();
        for path in self.markdown_files(&self.articles_dir())? {
            match self.read_raw(&path) {
                Ok(raw) => raws.push(raw),
                Err(err) => {
                    tracing::warn!("skipping unparseable article {}: {err:?}", path.display());
                }
            }
        }
        Ok(raws)
    }

    fn load_raw_by_slug(&self, slug: &str) -> Result<Option<RawArticle>, RequestError> {
        let path = self.article_path(slug);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_raw(&path)?))
    }

    fn write_article_file(
        &self,
        slug: &str,
        front: &ArticleFrontmatter,
        body: &str,
    ) -> Result<(), RequestError> {
        fs::create_dir_all(self.articles_dir())?;
        let doc = render_document(front, body)?;
        fs::write(self.article_path(slug), doc)?;
        Ok(())
    }

    fn enrich_raw(&self, raw: RawArticle, candidates: &[Article]) -> Article {
        enrich(raw.article, raw.sections, raw.media, raw.resources, candidates)
    }

    fn try_get_article(&self, slug: &str) -> Result<Option<Article>, RequestError> {
        let Some(raw) = self.load_raw_by_slug(slug)? else {
            return Ok(None);
        };
        let candidates: Vec<Article> = self
            .load_raw()?
            .into_iter()
            .map(|raw| raw.article)
            .collect();
        Ok(Some(self.enrich_raw(raw, &candidates)))
    }

    fn try_list_categories(&self) -> Result<Vec<Category>, RequestError> {
        let articles = self.load_raw()?;
        let mut categories = Vec::new();
        for path in self.markdown_files(&self.categories_dir())? {
            let slug = file_stem(&path);
            let text = fs::read_to_string(&path)?;
            let front: CategoryFrontmatter = match split_frontmatter(&text) {
                Some((yaml, _)) => match serde_yaml::from_str(&yaml) {
                    Ok(front) => front,
                    Err(err) => {
                        tracing::warn!("skipping unparseable category {}: {err}", path.display());
                        continue;
                    }
                },
                None => CategoryFrontmatter::default(),
            };
            let article_count = articles
                .iter()
                .filter(|raw| raw.article.status == ArticleStatus::Published)
                .filter(|raw| {
                    raw.article
                        .category
                        .as_ref()
                        .map(|c| c.slug == slug)
                        .unwrap_or(false)
                })
                .count() as i64;
            categories.push(Category {
                id: slug.clone(),
                name: if front.name.is_empty() { slug.clone() } else { front.name },
                slug,
                description: front.description,
                icon: front.icon,
                article_count,
            });
        }
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    // --- json-array stores for subscribers and contacts ---

    fn load_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, RequestError> {
        let path = self.root.join(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save_json<T: Serialize>(&self, name: &str, items: &[T]) -> Result<(), RequestError> {
        fs::create_dir_all(&self.root)?;
        let text = serde_json::to_string_pretty(items)?;
        fs::write(self.root.join(name), text)?;
        Ok(())
    }
}

fn next_numeric_id(existing: impl Iterator<Item = String>) -> String {
    let max = existing
        .filter_map(|id| id.parse::<i64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

#[async_trait]
impl ContentStore for FileStore {
    async fn list_categories(&self) -> Vec<Category> {
        or_empty(self.try_list_categories(), "categories")
    }

    async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        let result = self.try_list_categories().map(|categories| {
            categories
                .into_iter()
                .find(|category| category.slug.eq_ignore_ascii_case(slug))
        });
        or_none(result, "category")
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RequestError> {
        let slug = slugify(req.slug.as_deref().unwrap_or(&req.name));
        if slug.is_empty() {
            return Err(RequestError::validation("name must produce a non-empty slug"));
        }
        if self.category_path(&slug).exists() {
            return Err(RequestError::validation(format!(
                "category slug already exists: {slug}"
            )));
        }
        fs::create_dir_all(self.categories_dir())?;
        let front = CategoryFrontmatter {
            name: req.name.clone(),
            description: req.description.clone(),
            icon: req.icon.clone(),
        };
        fs::write(self.category_path(&slug), render_document(&front, "")?)?;
        Ok(Category {
            id: slug.clone(),
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
        let Some(mut front) = self.read_category_front(id)? else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            front.name = name;
        }
        if let Some(description) = req.description {
            front.description = Some(description);
        }
        if let Some(icon) = req.icon {
            front.icon = Some(icon);
        }
        let new_slug = match req.slug {
            Some(slug) => slugify(&slug),
            None => id.to_string(),
        };
        fs::write(self.category_path(&new_slug), render_document(&front, "")?)?;
        if new_slug != id {
            fs::remove_file(self.category_path(id))?;
        }
        Ok(self.get_category_by_slug(&new_slug).await)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, RequestError> {
        let path = self.category_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article> {
        let raws = match self.load_raw() {
            Ok(raws) => raws,
            Err(err) => {
                tracing::warn!("article list read failed, serving empty list: {err:?}");
                return Vec::new();
            }
        };
        let candidates: Vec<Article> = raws.iter().map(|raw| raw.article.clone()).collect();
        let selected = filter.apply(candidates.clone());
        selected
            .into_iter()
            .filter_map(|article| {
                raws.iter()
                    .find(|raw| raw.article.slug == article.slug)
                    .map(|raw| {
                        enrich(
                            article,
                            raw.sections.clone(),
                            raw.media.clone(),
                            raw.resources.clone(),
                            &candidates,
                        )
                    })
            })
            .collect()
    }

    async fn get_article_by_id(&self, id: &str) -> Option<Article> {
        // in this backend the filename-derived slug is the id
        or_none(self.try_get_article(id), "article")
    }

    async fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        or_none(self.try_get_article(slug), "article")
    }

    async fn featured_or_latest(&self) -> Option<Article> {
        let published = self.list_articles(&ArticleFilter::default()).await;
        published
            .iter()
            .find(|article| article.featured)
            .or_else(|| published.first())
            .cloned()
    }

    async fn create_article(&self, req: CreateArticleRequest) -> Result<Article, RequestError> {
        let slug = slugify(req.slug.as_deref().unwrap_or(&req.title));
        if slug.is_empty() {
            return Err(RequestError::validation("title must produce a non-empty slug"));
        }
        if self.article_path(&slug).exists() {
            return Err(RequestError::validation(format!(
                "article slug already exists: {slug}"
            )));
        }
        if let Some(category) = &req.category {
            if self.read_category_front(&slugify(category))?.is_none() {
                return Err(RequestError::validation(format!(
                    "unknown category: {category}"
                )));
            }
        }
        let front = ArticleFrontmatter {
            title: req.title,
            excerpt: req.excerpt,
            featured_image: req.featured_image,
            published_date: Some(req.published_date.unwrap_or_else(Utc::now)),
            updated_date: None,
            category: req.category,
            read_time: req.read_time,
            tags: req.tags,
            featured: req.featured,
            status: Some(req.status.unwrap_or_default().as_str().to_string()),
            sections: Vec::new(),
            media: Vec::new(),
            resources: Vec::new(),
        };
        self.write_article_file(&slug, &front, &req.content)?;
        self.try_get_article(&slug)?.ok_or(RequestError::NotFound)
    }

    async fn update_article(
        &self,
        id: &str,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, RequestError> {
        let Some(raw) = self.load_raw_by_slug(id)? else {
            return Ok(None);
        };
        let mut front = raw.front;
        let mut body = raw.body;
        if let Some(title) = req.title {
            front.title = title;
        }
        if let Some(excerpt) = req.excerpt {
            front.excerpt = excerpt;
        }
        if let Some(content) = req.content {
            body = content;
        }
        if let Some(featured_image) = req.featured_image {
            front.featured_image = Some(featured_image);
        }
        if let Some(published_date) = req.published_date {
            front.published_date = Some(published_date);
        }
        if let Some(category) = req.category {
            if self.read_category_front(&slugify(&category))?.is_none() {
                return Err(RequestError::validation(format!(
                    "unknown category: {category}"
                )));
            }
            front.category = Some(category);
        }
        if let Some(read_time) = req.read_time {
            front.read_time = Some(read_time);
        }
        if let Some(tags) = req.tags {
            front.tags = tags;
        }
        if let Some(featured) = req.featured {
            front.featured = featured;
        }
        if let Some(status) = req.status {
            front.status = Some(status.as_str().to_string());
        }
        front.updated_date = Some(Utc::now());

        let new_slug = match req.slug {
            Some(slug) => slugify(&slug),
            None => id.to_string(),
        };
        self.write_article_file(&new_slug, &front, &body)?;
        if new_slug != id {
            fs::remove_file(self.article_path(id))?;
        }
        self.try_get_article(&new_slug)
    }

    async fn delete_article(&self, id: &str) -> Result<bool, RequestError> {
        let path = self.article_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    async fn list_sections(&self, article_id: &str) -> Vec<ContentSection> {
        let result = self.load_raw_by_slug(article_id).map(|raw| {
            raw.map(|mut raw| {
                raw.sections.sort_by_key(|section| section.order);
                raw.sections
            })
            .unwrap_or_default()
        });
        or_empty(result, "sections")
    }

    async fn create_section(
        &self,
        req: CreateSectionRequest,
    ) -> Result<ContentSection, RequestError> {
        let Some(raw) = self.load_raw_by_slug(&req.article_id)? else {
            return Err(RequestError::validation(format!(
                "unknown articleId: {}",
                req.article_id
            )));
        };
        let mut front = raw.front;
        front.sections.push(SectionFront {
            title: req.title.clone(),
            content: req.content.clone(),
            order: req.order,
        });
        let index = front.sections.len() - 1;
        self.write_article_file(&req.article_id, &front, &raw.body)?;
        Ok(ContentSection {
            id: child_id(&req.article_id, "section", index),
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
        let Some((slug, index)) = parse_child_id(id, "section") else {
            return Ok(None);
        };
        let Some(raw) = self.load_raw_by_slug(&slug)? else {
            return Ok(None);
        };
        let mut front = raw.front;
        let Some(section) = front.sections.get_mut(index) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            section.title = Some(title);
        }
        if let Some(content) = req.content {
            section.content = content;
        }
        if let Some(order) = req.order {
            section.order = order;
        }
        let updated = ContentSection {
            id: id.to_string(),
            title: section.title.clone(),
            content: section.content.clone(),
            order: section.order,
            article_id: slug.clone(),
        };
        self.write_article_file(&slug, &front, &raw.body)?;
        Ok(Some(updated))
    }

    async fn delete_section(&self, id: &str) -> Result<bool, RequestError> {
        let Some((slug, index)) = parse_child_id(id, "section") else {
            return Ok(false);
        };
        let Some(raw) = self.load_raw_by_slug(&slug)? else {
            return Ok(false);
        };
        let mut front = raw.front;
        if index >= front.sections.len() {
            return Ok(false);
        }
        front.sections.remove(index);
        self.write_article_file(&slug, &front, &raw.body)?;
        Ok(true)
    }

    async fn list_media(&self, article_id: Option<&str>) -> Vec<MediaFile> {
        let result = match article_id {
            Some(article_id) => self
                .load_raw_by_slug(article_id)
                .map(|raw| raw.map(|raw| raw.media).unwrap_or_default()),
            None => self.load_raw().map(|raws| {
                raws.into_iter().flat_map(|raw| raw.media).collect()
            }),
        };
        or_empty(result, "media")
    }

    async fn create_media(&self, req: CreateMediaRequest) -> Result<MediaFile, RequestError> {
        let Some(article_id) = req.article_id else {
            // no orphan storage exists in this backend
            return Err(RequestError::validation(
                "articleId is required for the file backend",
            ));
        };
        let Some(raw) = self.load_raw_by_slug(&article_id)? else {
            return Err(RequestError::validation(format!(
                "unknown articleId: {article_id}"
            )));
        };
        let mut front = raw.front;
        front.media.push(MediaFront {
            title: req.title.clone(),
            url: req.url.clone(),
            media_type: req.media_type.as_str().to_string(),
            description: req.description.clone(),
            thumbnail: req.thumbnail.clone(),
            duration: req.duration.clone(),
        });
        let index = front.media.len() - 1;
        self.write_article_file(&article_id, &front, &raw.body)?;
        Ok(MediaFile {
            id: child_id(&article_id, "media", index),
            title: req.title,
            url: req.url,
            media_type: req.media_type,
            description: req.description,
            thumbnail: req.thumbnail,
            duration: req.duration,
            article_id: Some(article_id),
        })
    }

    async fn delete_media(&self, id: &str) -> Result<bool, RequestError> {
        let Some((slug, index)) = parse_child_id(id, "media") else {
            return Ok(false);
        };
        let Some(raw) = self.load_raw_by_slug(&slug)? else {
            return Ok(false);
        };
        let mut front = raw.front;
        if index >= front.media.len() {
            return Ok(false);
        }
        front.media.remove(index);
        self.write_article_file(&slug, &front, &raw.body)?;
        Ok(true)
    }

    async fn list_resources(&self, article_id: Option<&str>) -> Vec<Resource> {
        let result = match article_id {
            Some(article_id) => self
                .load_raw_by_slug(article_id)
                .map(|raw| raw.map(|raw| raw.resources).unwrap_or_default()),
            None => self.load_raw().map(|raws| {
                raws.into_iter().flat_map(|raw| raw.resources).collect()
            }),
        };
        or_empty(result, "resources")
    }

    async fn create_resource(&self, req: CreateResourceRequest) -> Result<Resource, RequestError> {
        let Some(article_id) = req.article_id else {
            return Err(RequestError::validation(
                "articleId is required for the file backend",
            ));
        };
        let Some(raw) = self.load_raw_by_slug(&article_id)? else {
            return Err(RequestError::validation(format!(
                "unknown articleId: {article_id}"
            )));
        };
        let mut front = raw.front;
        front.resources.push(ResourceFront {
            title: req.title.clone(),
            description: req.description.clone(),
            url: req.url.clone(),
            resource_type: req.resource_type.clone(),
        });
        let index = front.resources.len() - 1;
        self.write_article_file(&article_id, &front, &raw.body)?;
        Ok(Resource {
            id: child_id(&article_id, "resource", index),
            title: req.title,
            description: req.description,
            url: req.url,
            resource_type: req.resource_type,
            article_id: Some(article_id),
        })
    }

    async fn delete_resource(&self, id: &str) -> Result<bool, RequestError> {
        let Some((slug, index)) = parse_child_id(id, "resource") else {
            return Ok(false);
        };
        let Some(raw) = self.load_raw_by_slug(&slug)? else {
            return Ok(false);
        };
        let mut front = raw.front;
        if index >= front.resources.len() {
            return Ok(false);
        }
        front.resources.remove(index);
        self.write_article_file(&slug, &front, &raw.body)?;
        Ok(true)
    }

    async fn list_subscribers(&self) -> Vec<Subscriber> {
        or_empty(self.load_json("subscribers.json"), "subscribers")
    }

    async fn upsert_subscriber(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Subscriber, RequestError> {
        let mut subscribers: Vec<Subscriber> = self.load_json("subscribers.json")?;
        if let Some(existing) = subscribers
            .iter_mut()
            .find(|subscriber| subscriber.email.eq_ignore_ascii_case(email))
        {
            existing.status = SubscriberStatus::Active;
            existing.consent = true;
            if let Some(name) = name {
                existing.name = Some(name);
            }
            let result = existing.clone();
            self.save_json("subscribers.json", &subscribers)?;
            return Ok(result);
        }
        let subscriber = Subscriber {
            id: next_numeric_id(subscribers.iter().map(|s| s.id.clone())),
            email: email.to_string(),
            name,
            consent: true,
            status: SubscriberStatus::Active,
            subscribed_at: Utc::now(),
        };
        subscribers.push(subscriber.clone());
        self.save_json("subscribers.json", &subscribers)?;
        Ok(subscriber)
    }

    async fn update_subscriber_status(
        &self,
        id: &str,
        status: SubscriberStatus,
    ) -> Result<Option<Subscriber>, RequestError> {
        let mut subscribers: Vec<Subscriber> = self.load_json("subscribers.json")?;
        let Some(subscriber) = subscribers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        subscriber.status = status;
        let result = subscriber.clone();
        self.save_json("subscribers.json", &subscribers)?;
        Ok(Some(result))
    }

    async fn delete_subscriber(&self, id: &str) -> Result<bool, RequestError> {
        let mut subscribers: Vec<Subscriber> = self.load_json("subscribers.json")?;
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        if subscribers.len() == before {
            return Ok(false);
        }
        self.save_json("subscribers.json", &subscribers)?;
        Ok(true)
    }

    async fn list_contacts(&self) -> Vec<Contact> {
        or_empty(self.load_json("contacts.json"), "contacts")
    }

    async fn create_contact(&self, req: ContactRequest) -> Result<Contact, RequestError> {
        let mut contacts: Vec<Contact> = self.load_json("contacts.json")?;
        let contact = Contact {
            id: next_numeric_id(contacts.iter().map(|c| c.id.clone())),
            name: req.name,
            email: req.email,
            message: req.message,
            status: ContactStatus::New,
            created_at: Utc::now(),
        };
        contacts.push(contact.clone());
        self.save_json("contacts.json", &contacts)?;
        Ok(contact)
    }

    async fn update_contact_status(
        &self,
        id: &str,
        status: ContactStatus,
    ) -> Result<Option<Contact>, RequestError> {
        let mut contacts: Vec<Contact> = self.load_json("contacts.json")?;
        let Some(contact) = contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        contact.status = status;
        let result = contact.clone();
        self.save_json("contacts.json", &contacts)?;
        Ok(Some(result))
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, RequestError> {
        let mut contacts: Vec<Contact> = self.load_json("contacts.json")?;
        let before = contacts.len();
        contacts.retain(|contact| contact.id != id);
        if contacts.len() == before {
            return Ok(false);
        }
        self.save_json("contacts.json", &contacts)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_frontmatter_and_body() {
        let doc = "---\ntitle: Hello\ntags:\n  - a\n---\n\n# Body\n\ntext\n";
        let (yaml, body) = split_frontmatter(doc).unwrap();
        assert!(yaml.contains("title: Hello"));
        assert!(body.contains("# Body"));
    }

    #[test]
    fn rejects_documents_without_frontmatter() {
        assert!(split_frontmatter("# Just markdown\n").is_none());
        assert!(split_frontmatter("---\nnever closed\n").is_none());
    }

    #[test]
    fn renders_roundtrippable_documents() {
        let front = ArticleFrontmatter {
            title: "Round Trip".to_string(),
            tags: vec!["one".to_string()],
            ..Default::default()
        };
        let doc = render_document(&front, "body text").unwrap();
        let (yaml, body) = split_frontmatter(&doc).unwrap();
        let parsed: ArticleFrontmatter = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.title, "Round Trip");
        assert_eq!(parsed.tags, vec!["one".to_string()]);
        assert_eq!(body.trim(), "body text");
    }

    #[test]
    fn child_ids_roundtrip() {
        let id = child_id("my-article", "section", 2);
        assert_eq!(id, "my-article#section-2");
        assert_eq!(
            parse_child_id(&id, "section"),
            Some(("my-article".to_string(), 2))
        );
        assert_eq!(parse_child_id(&id, "media"), None);
        assert_eq!(parse_child_id("no-delimiter", "section"), None);
    }
}
