//! Article enrichment: attaching the derived child collections to a raw
//! article record. Every adapter funnels through this one function so list
//! and single-item reads return the exact same shape.

use crate::models::{
    Article, ArticleStatus, ContentSection, MediaFile, MediaType, RelatedArticle, Resource,
};

/// Upper bound on the "you may also like" list.
pub const RELATED_LIMIT: usize = 3;

/// Attach sections (ordered), media (partitioned by type), resources and
/// related articles to `article`.
///
/// `related_candidates` is the pool related articles are drawn from, in the
/// adapter's stable storage order; candidates not sharing the article's
/// resolved category slug, and the article itself, are skipped.
pub fn enrich(
    mut article: Article,
    mut sections: Vec<ContentSection>,
    media: Vec<MediaFile>,
    resources: Vec<Resource>,
    related_candidates: &[Article],
) -> Article {
    sections.sort_by_key(|section| section.order);
    article.content_sections = sections;

    let mut videos = Vec::new();
    let mut audios = Vec::new();
    let mut images = Vec::new();
    for file in media {
        match file.media_type {
            MediaType::Video => videos.push(file),
            MediaType::Audio => audios.push(file),
            MediaType::Image => images.push(file),
            // document-type media stays reachable only through the generic
            // media listing endpoint
            MediaType::Document => {}
        }
    }
    article.video_files = videos;
    article.audio_files = audios;
    article.images = images;

    article.resources = resources;

    let own_id = article.id.clone();
    let own_category = article.category.as_ref().map(|c| c.slug.clone());
    article.related_articles = match own_category {
        Some(slug) => related_candidates
            .iter()
            .filter(|candidate| candidate.status == ArticleStatus::Published)
            .filter(|candidate| candidate.id != own_id)
            .filter(|candidate| {
                candidate
                    .category
                    .as_ref()
                    .map(|c| c.slug == slug)
                    .unwrap_or(false)
            })
            .take(RELATED_LIMIT)
            .map(RelatedArticle::from)
            .collect(),
        None => Vec::new(),
    };

    article
}
