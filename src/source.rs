use crate::model::{ArticleId, ArticleItem, WorkId, WorkItem, WorkPatch};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure talking to the content store.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),

    #[error("Row {id} has an invalid {field}: {value:?}")]
    InvalidRow {
        id: i64,
        field: &'static str,
        value: String,
    },

    #[error("An article with {field} {value:?} already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Content store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a (possibly bulk) delete. Partial failure is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<WorkId>,
    pub failed: Vec<(WorkId, String)>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Read and admin access to the `works` collection.
pub trait WorksSource {
    /// Active works, newest first.
    async fn fetch_active_works(&self) -> Result<Vec<WorkItem>, SourceError>;

    async fn update_work(&self, id: WorkId, patch: WorkPatch) -> Result<(), SourceError>;

    async fn delete_works(&self, ids: &[WorkId]) -> Result<DeleteReport, SourceError>;
}

/// Read access to the `articles` collection.
pub trait ArticleSource {
    /// Published articles, newest `published_at` first.
    async fn fetch_published_articles(&self) -> Result<Vec<ArticleItem>, SourceError>;

    async fn article_by_slug(&self, slug: &str) -> Result<Option<ArticleItem>, SourceError>;

    /// Add one to the stored view count, atomically on the store side.
    async fn increment_view_count(&self, id: ArticleId) -> Result<(), SourceError>;
}

/// Editor access to `articles`, drafts included.
pub trait ArticleAdmin {
    /// Every article, newest `created_at` first.
    async fn fetch_all_articles(&self) -> Result<Vec<ArticleItem>, SourceError>;

    /// Store a new article and return its id. A taken slug is `Duplicate`.
    async fn create_article(&self, article: &ArticleItem) -> Result<ArticleId, SourceError>;

    /// `Some(t)` publishes at `t`; `None` turns the article back into a draft.
    async fn set_published(&self, id: ArticleId, published_at: Option<DateTime<Utc>>) -> Result<(), SourceError>;

    async fn delete_article(&self, id: ArticleId) -> Result<(), SourceError>;
}
