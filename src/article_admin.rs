use crate::model::{ArticleId, ArticleItem};
use crate::source::{ArticleAdmin, ArticleSource, SourceError};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::info;

/// Categories offered before any article uses one.
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "Warehouse basics",
    "Building techniques",
    "Materials",
    "Maintenance",
    "News",
];

pub const DEFAULT_AUTHOR: &str = "SP Warehouse";

const SLUG_SUFFIX_LEN: usize = 6;

static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("static pattern compiles"));
static NOT_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("static pattern compiles"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("static pattern compiles"));

#[derive(Error, Debug)]
pub enum ArticleAdminError {
    #[error("Article {0} is required")]
    MissingField(&'static str),

    #[error("Slug {0:?} may only use a-z, 0-9 and single hyphens")]
    InvalidSlug(String),

    #[error("No article with slug {0:?}")]
    UnknownSlug(String),

    #[error(transparent)]
    Storage(#[from] SourceError),
}

/// Editor input for a new article, read as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewArticle {
    pub title: String,
    /// Generated from the title when left empty.
    pub slug: String,
    pub category: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: String,
    pub author: Option<String>,
    pub is_published: bool,
}

/// ASCII part of a title as a slug; Thai and other scripts drop out.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let kept = NOT_SLUG_CHARS.replace_all(&lower, "");
    SEPARATORS
        .replace_all(kept.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// Slug from the title plus a short suffix so repeated titles stay unique.
/// The suffix is derived from the title and creation time.
pub fn generate_slug(title: &str, created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(created_at.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    let suffix = &digest[..SLUG_SUFFIX_LEN];

    match slugify(title) {
        base if base.is_empty() => suffix.to_string(),
        base => format!("{base}-{suffix}"),
    }
}

pub fn validate_slug(slug: &str) -> Result<(), ArticleAdminError> {
    if VALID_SLUG.is_match(slug) {
        Ok(())
    } else {
        Err(ArticleAdminError::InvalidSlug(slug.to_string()))
    }
}

/// Default categories followed by any others already in use, first-seen order.
pub fn category_options(articles: &[ArticleItem]) -> Vec<String> {
    let mut options: Vec<String> = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
    for category in articles.iter().filter_map(|a| a.category.as_deref()) {
        let category = category.trim();
        if !category.is_empty() && !options.iter().any(|c| c == category) {
            options.push(category.to_string());
        }
    }
    options
}

fn non_blank(s: &str) -> Option<String> {
    Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

impl NewArticle {
    /// Validated article ready to store; the id is assigned by the store.
    pub fn into_article(self, now: DateTime<Utc>) -> Result<ArticleItem, ArticleAdminError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ArticleAdminError::MissingField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(ArticleAdminError::MissingField("content"));
        }
        let slug = match self.slug.trim() {
            "" => generate_slug(&title, now),
            given => given.to_string(),
        };
        validate_slug(&slug)?;

        Ok(ArticleItem {
            id: 0,
            title,
            slug,
            category: non_blank(&self.category),
            excerpt: self.excerpt.trim().to_string(),
            content: self.content,
            image_ref: non_blank(&self.image_url),
            author: match self.author {
                Some(author) => non_blank(&author),
                None => Some(DEFAULT_AUTHOR.to_string()),
            },
            published: self.is_published,
            published_at: self.is_published.then_some(now),
            created_at: now,
            view_count: 0,
        })
    }
}

pub async fn create_article<S: ArticleAdmin>(
    source: &S,
    new: NewArticle,
    now: DateTime<Utc>,
) -> Result<ArticleItem, ArticleAdminError> {
    let mut article = new.into_article(now)?;
    article.id = source.create_article(&article).await?;
    info!(id = article.id, slug = %article.slug, published = article.published, "article created");
    Ok(article)
}

async fn find<S: ArticleSource>(source: &S, slug: &str) -> Result<ArticleItem, ArticleAdminError> {
    source
        .article_by_slug(slug)
        .await?
        .ok_or_else(|| ArticleAdminError::UnknownSlug(slug.to_string()))
}

/// Publish a draft (stamped `now`) or pull a published article back to draft.
/// Returns the new published state.
pub async fn toggle_publish<S: ArticleSource + ArticleAdmin>(
    source: &S,
    slug: &str,
    now: DateTime<Utc>,
) -> Result<bool, ArticleAdminError> {
    let article = find(source, slug).await?;
    let published_at = (!article.published).then_some(now);
    source.set_published(article.id, published_at).await?;
    info!(slug, published = published_at.is_some(), "publish state changed");
    Ok(published_at.is_some())
}

pub async fn delete_article<S: ArticleSource + ArticleAdmin>(
    source: &S,
    slug: &str,
) -> Result<ArticleId, ArticleAdminError> {
    let article = find(source, slug).await?;
    source.delete_article(article.id).await?;
    info!(slug, id = article.id, "article deleted");
    Ok(article.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use crate::source::memory::MemorySource;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-01T03:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Choosing a Warehouse Size"), "choosing-a-warehouse-size");
        assert_eq!(slugify("  Steel -- roofs: 2026 edition! "), "steel-roofs-2026-edition");
        assert_eq!(slugify("โกดังสำเร็จรูป"), "");
        assert_eq!(slugify("โกดัง Prefab 101"), "prefab-101");
    }

    #[test]
    fn test_generated_slug_is_valid_and_suffixed() {
        let slug = generate_slug("Prefab versus concrete", now());
        assert!(slug.starts_with("prefab-versus-concrete-"));
        assert_eq!(slug.len(), "prefab-versus-concrete-".len() + SLUG_SUFFIX_LEN);
        assert!(validate_slug(&slug).is_ok());

        let thai = generate_slug("ความรู้โกดัง", now());
        assert_eq!(thai.len(), SLUG_SUFFIX_LEN);
        assert!(validate_slug(&thai).is_ok());

        assert_eq!(generate_slug("Same", now()), generate_slug("Same", now()));
        assert_ne!(
            generate_slug("Same", now()),
            generate_slug("Same", now() + chrono::Duration::seconds(1))
        );
    }

    #[test]
    fn test_validate_slug() {
        for ok in ["a", "roof-care", "guide-2026"] {
            assert!(validate_slug(ok).is_ok(), "{ok}");
        }
        for bad in ["", "-lead", "trail-", "double--dash", "Upper", "with space", "ไทย", "a/b"] {
            assert!(validate_slug(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_category_options_merge_defaults_and_store() {
        let options = category_options(&sample::articles());
        assert_eq!(&options[..5], DEFAULT_CATEGORIES);
        // "Maintenance" is already a default
        assert_eq!(&options[5..], ["Buying guide", "Design"]);
    }

    #[test]
    fn test_into_article_defaults() {
        let article = NewArticle {
            title: " Roof care ".into(),
            content: "<p>Check bolts yearly.</p>".into(),
            category: "  ".into(),
            ..Default::default()
        }
        .into_article(now())
        .unwrap();
        assert_eq!(article.title, "Roof care");
        assert!(article.slug.starts_with("roof-care-"));
        assert_eq!(article.category, None);
        assert_eq!(article.author.as_deref(), Some(DEFAULT_AUTHOR));
        assert!(!article.published);
        assert_eq!(article.published_at, None);

        let missing = NewArticle {
            content: "x".into(),
            ..Default::default()
        };
        assert!(matches!(missing.into_article(now()), Err(ArticleAdminError::MissingField("title"))));

        let bad_slug = NewArticle {
            title: "Roof".into(),
            slug: "Roof Care".into(),
            content: "x".into(),
            ..Default::default()
        };
        assert!(matches!(bad_slug.into_article(now()), Err(ArticleAdminError::InvalidSlug(_))));
    }

    #[test]
    fn test_new_article_from_json() {
        let new: NewArticle = serde_json::from_str(
            r#"{"title":"Site survey","content":"<p>We visit first.</p>","is_published":true}"#,
        )
        .unwrap();
        let article = new.into_article(now()).unwrap();
        assert!(article.published);
        assert_eq!(article.published_at, Some(now()));
    }

    #[tokio::test]
    async fn test_create_publish_delete_flow() {
        let source = MemorySource::with_articles(sample::articles());
        let created = create_article(
            &source,
            NewArticle {
                title: "Site survey".into(),
                slug: "site-survey".into(),
                content: "<p>We visit first.</p>".into(),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap();
        assert_eq!(created.id, 7);
        assert!(!created.published);

        let all = source.fetch_all_articles().await.unwrap();
        assert_eq!(all[0].slug, "site-survey");
        assert_eq!(source.fetch_published_articles().await.unwrap().len(), 5);

        assert!(toggle_publish(&source, "site-survey", now()).await.unwrap());
        let live = source.article_by_slug("site-survey").await.unwrap().unwrap();
        assert_eq!(live.published_at, Some(now()));
        assert_eq!(source.fetch_published_articles().await.unwrap().len(), 6);

        assert!(!toggle_publish(&source, "site-survey", now()).await.unwrap());
        let draft = source.article_by_slug("site-survey").await.unwrap().unwrap();
        assert_eq!(draft.published_at, None);

        assert_eq!(delete_article(&source, "site-survey").await.unwrap(), 7);
        assert!(matches!(
            delete_article(&source, "site-survey").await,
            Err(ArticleAdminError::UnknownSlug(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_reported() {
        let source = MemorySource::with_articles(sample::articles());
        let err = create_article(
            &source,
            NewArticle {
                title: "Again".into(),
                slug: "company-news".into(),
                content: "x".into(),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ArticleAdminError::Storage(SourceError::Duplicate { field: "slug", .. })
        ));
    }
}
