//! Shared article query semantics.
//!
//! `ArticleFilter::matches` is the reference implementation of the filter
//! contract. The file and document backends run it directly over loaded
//! articles; the relational backend compiles the same semantics to SQL and
//! the conformance suite holds all of them to this definition.

use crate::models::{Article, ArticleStatus, CategoryRef};

#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub featured: Option<bool>,
    pub category_slug: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl ArticleFilter {
    /// All supplied filters must hold (logical AND). Drafts never match.
    pub fn matches(&self, article: &Article) -> bool {
        if article.status != ArticleStatus::Published {
            return false;
        }
        if let Some(featured) = self.featured {
            if article.featured != featured {
                return false;
            }
        }
        if let Some(want) = &self.category_slug {
            if !category_matches(article.category.as_ref(), want) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !article.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            // ASCII-only folding on every path, matching SQLite's lower()
            let needle = needle.to_ascii_lowercase();
            let hit = article.title.to_ascii_lowercase().contains(&needle)
                || article.excerpt.to_ascii_lowercase().contains(&needle)
                || article.content.to_ascii_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }

    /// Filter, sort newest-first and truncate to the requested limit.
    pub fn apply(&self, mut articles: Vec<Article>) -> Vec<Article> {
        articles.retain(|article| self.matches(article));
        articles.sort_by(|a, b| b.published_date.cmp(&a.published_date));
        if let Some(limit) = self.limit {
            articles.truncate(limit);
        }
        articles
    }
}

/// Case-insensitive slug match, with a fallback against the display name
/// hyphenated in place of whitespace so legacy links keep resolving.
pub fn category_matches(category: Option<&CategoryRef>, want: &str) -> bool {
    let Some(category) = category else {
        return false;
    };
    if category.slug.eq_ignore_ascii_case(want) {
        return true;
    }
    let name_slug = category
        .name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    name_slug == want.to_lowercase()
}
