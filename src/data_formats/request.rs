use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ArticleStatus, ContactStatus, MediaType, SubscriberStatus};
use crate::store::ArticleFilter;

// ----------------- Query Params -----------------

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ArticleQueryParams {
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    /// Legacy alias for `category` from before the topic -> category rename.
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ArticleQueryParams {
    pub fn into_filter(self) -> ArticleFilter {
        ArticleFilter {
            featured: self.featured,
            category_slug: self.category.or(self.topic),
            tag: self.tag,
            search: self.search,
            limit: self.limit,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChildQueryParams {
    #[serde(default)]
    pub article_id: Option<String>,
}

// ----------------- Category Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

// ----------------- Article Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    /// Category slug; resolved against the category store on write.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: Option<ArticleStatus>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub featured_image: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub read_time: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub status: Option<ArticleStatus>,
}

// ----------------- Child Entity Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub order: i64,
    pub article_id: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSectionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub article_id: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "type", default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default)]
    pub article_id: Option<String>,
}

fn default_resource_type() -> String {
    "link".to_string()
}

// ----------------- Form Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateSubscriberRequest {
    pub status: SubscriberStatus,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateContactRequest {
    pub status: ContactStatus,
}
