//! The storage contract and its three interchangeable backends.
//!
//! All backends implement [`ContentStore`] with identical filter and
//! enrichment semantics; which one is live is a deployment choice
//! (`CONTENT_BACKEND`), never something the HTTP layer branches on.

pub mod cms;
mod enrich;
pub mod files;
mod filter;
pub mod sql;

pub use enrich::{enrich, RELATED_LIMIT};
pub use filter::{category_matches, ArticleFilter};

use async_trait::async_trait;

use crate::data_formats::{
    ContactRequest, CreateArticleRequest, CreateCategoryRequest, CreateMediaRequest,
    CreateResourceRequest, CreateSectionRequest, UpdateArticleRequest, UpdateCategoryRequest,
    UpdateSectionRequest,
};
use crate::errors::RequestError;
use crate::models::{
    Article, Category, Contact, ContactStatus, ContentSection, MediaFile, Resource, Subscriber,
    SubscriberStatus,
};

/// One content backend.
///
/// Reads degrade instead of failing: a storage error is logged as a warning
/// and surfaces as an empty list or `None`, so one broken fetch never takes
/// down the rest of the site. Writes return errors; the HTTP layer maps
/// unexpected ones to 500.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- categories ---
    async fn list_categories(&self) -> Vec<Category>;
    async fn get_category_by_slug(&self, slug: &str) -> Option<Category>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RequestError>;
    async fn update_category(
        &self,
        id: &str,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RequestError>;
    async fn delete_category(&self, id: &str) -> Result<bool, RequestError>;

    // --- articles ---
    /// Published articles matching every supplied filter, newest first,
    /// truncated to the limit, each fully enriched.
    async fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article>;
    async fn get_article_by_id(&self, id: &str) -> Option<Article>;
    async fn get_article_by_slug(&self, slug: &str) -> Option<Article>;
    /// The hero/preview pick: first featured article, else the most recently
    /// published one.
    async fn featured_or_latest(&self) -> Option<Article>;
    async fn create_article(&self, req: CreateArticleRequest) -> Result<Article, RequestError>;
    async fn update_article(
        &self,
        id: &str,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, RequestError>;
    async fn delete_article(&self, id: &str) -> Result<bool, RequestError>;

    // --- content sections ---
    async fn list_sections(&self, article_id: &str) -> Vec<ContentSection>;
    async fn create_section(
        &self,
        req: CreateSectionRequest,
    ) -> Result<ContentSection, RequestError>;
    async fn update_section(
        &self,
        id: &str,
        req: UpdateSectionRequest,
    ) -> Result<Option<ContentSection>, RequestError>;
    async fn delete_section(&self, id: &str) -> Result<bool, RequestError>;

    // --- media ---
    async fn list_media(&self, article_id: Option<&str>) -> Vec<MediaFile>;
    async fn create_media(&self, req: CreateMediaRequest) -> Result<MediaFile, RequestError>;
    async fn delete_media(&self, id: &str) -> Result<bool, RequestError>;

    // --- resources ---
    async fn list_resources(&self, article_id: Option<&str>) -> Vec<Resource>;
    async fn create_resource(&self, req: CreateResourceRequest) -> Result<Resource, RequestError>;
    async fn delete_resource(&self, id: &str) -> Result<bool, RequestError>;

    // --- subscribers ---
    async fn list_subscribers(&self) -> Vec<Subscriber>;
    /// Looks the email up case-insensitively first; an existing record is
    /// reactivated rather than duplicated.
    async fn upsert_subscriber(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Subscriber, RequestError>;
    async fn update_subscriber_status(
        &self,
        id: &str,
        status: SubscriberStatus,
    ) -> Result<Option<Subscriber>, RequestError>;
    async fn delete_subscriber(&self, id: &str) -> Result<bool, RequestError>;

    // --- contacts ---
    async fn list_contacts(&self) -> Vec<Contact>;
    async fn create_contact(&self, req: ContactRequest) -> Result<Contact, RequestError>;
    async fn update_contact_status(
        &self,
        id: &str,
        status: ContactStatus,
    ) -> Result<Option<Contact>, RequestError>;
    async fn delete_contact(&self, id: &str) -> Result<bool, RequestError>;
}

/// Degrade a failed list read to an empty list, keeping the site up.
pub(crate) fn or_empty<T>(result: Result<Vec<T>, RequestError>, what: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!("{what} read failed, serving empty list: {err:?}");
            Vec::new()
        }
    }
}

/// Degrade a failed single-item read to a miss.
pub(crate) fn or_none<T>(result: Result<Option<T>, RequestError>, what: &str) -> Option<T> {
    match result {
        Ok(item) => item,
        Err(err) => {
            tracing::warn!("{what} read failed, serving not-found: {err:?}");
            None
        }
    }
}
