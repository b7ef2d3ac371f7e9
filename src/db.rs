use crate::contact::ContactForm;
use crate::model::{
    ArticleId, ArticleItem, ViewCategory, WorkCategory, WorkId, WorkItem, WorkPatch,
};
use crate::source::{ArticleAdmin, ArticleSource, DeleteReport, SourceError, WorksSource};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use tracing::{debug, warn};
use turso::Value;
use turso::params::Params;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS works (\
     id INTEGER PRIMARY KEY, \
     created_at TEXT NOT NULL, \
     updated_at TEXT NOT NULL, \
     image_url TEXT NOT NULL, \
     category TEXT NOT NULL, \
     view_category TEXT NOT NULL, \
     is_active INTEGER NOT NULL DEFAULT 1)",
    "CREATE TABLE IF NOT EXISTS articles (\
     id INTEGER PRIMARY KEY, \
     created_at TEXT NOT NULL, \
     updated_at TEXT NOT NULL, \
     title TEXT NOT NULL, \
     slug TEXT NOT NULL, \
     category TEXT, \
     excerpt TEXT, \
     content TEXT NOT NULL, \
     image_url TEXT, \
     author TEXT, \
     is_published INTEGER NOT NULL DEFAULT 0, \
     published_at TEXT, \
     view_count INTEGER NOT NULL DEFAULT 0)",
    "CREATE UNIQUE INDEX IF NOT EXISTS articles_slug ON articles (slug)",
    "CREATE TABLE IF NOT EXISTS contacts (\
     id INTEGER PRIMARY KEY, \
     created_at TEXT NOT NULL, \
     first_name TEXT NOT NULL, \
     last_name TEXT, \
     phone TEXT NOT NULL, \
     email TEXT, \
     address TEXT, \
     line_id TEXT, \
     warehouse_size TEXT, \
     message TEXT, \
     status TEXT NOT NULL DEFAULT 'new')",
];

const ARTICLE_COLUMNS: &str = "id, title, slug, category, COALESCE(excerpt, ''), content, \
     image_url, author, is_published, published_at, created_at, COALESCE(view_count, 0)";

// ── Value extraction helpers ──

fn val_i64(v: &Value) -> i64 {
    match v {
        Value::Integer(i) => *i,
        _ => 0,
    }
}

fn val_string(v: &Value) -> String {
    match v {
        Value::Text(s) => s.clone(),
        _ => String::new(),
    }
}

fn val_opt_string(v: &Value) -> Option<String> {
    match v {
        Value::Text(s) => Some(s.clone()),
        _ => None,
    }
}

fn val_bool(v: &Value) -> bool {
    match v {
        Value::Integer(i) => *i != 0,
        _ => false,
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<&str>) -> Value {
    s.map_or(Value::Null, text)
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_time(id: i64, field: &'static str, raw: &str) -> Result<DateTime<Utc>, SourceError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| SourceError::InvalidRow {
            id,
            field,
            value: raw.to_string(),
        })
}

/// Database handle wrapping a turso connection.
pub struct Database {
    conn: turso::Connection,
}

impl Database {
    /// Open (creating if needed) a local SQLite file and ensure the schema.
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let path_str = path.to_string_lossy().to_string();
        let db = turso::Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;
        let database = Database { conn };
        database.ensure_schema().await?;
        Ok(database)
    }

    async fn ensure_schema(&self) -> Result<(), SourceError> {
        for statement in SCHEMA {
            self.conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    /// Insert an active work, as done after an image upload.
    pub async fn insert_work(
        &self,
        image_url: &str,
        category: WorkCategory,
        view_category: ViewCategory,
        created_at: DateTime<Utc>,
    ) -> Result<(), SourceError> {
        let now = timestamp(created_at);
        self.conn
            .execute(
                "INSERT INTO works (created_at, updated_at, image_url, category, view_category, is_active) \
                 VALUES (?1, ?1, ?2, ?3, ?4, 1)",
                Params::Positional(vec![
                    text(&now),
                    text(image_url),
                    text(category.as_str()),
                    text(view_category.as_str()),
                ]),
            )
            .await?;
        Ok(())
    }

    pub async fn insert_contact(&self, form: &ContactForm, received_at: DateTime<Utc>) -> Result<(), SourceError> {
        let sizes = form.warehouse_size.join(", ");
        self.conn
            .execute(
                "INSERT INTO contacts (created_at, first_name, last_name, phone, email, address, line_id, \
                 warehouse_size, message, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'new')",
                Params::Positional(vec![
                    text(&timestamp(received_at)),
                    text(form.first_name.trim()),
                    opt_text(non_blank(&form.last_name)),
                    text(form.phone.trim()),
                    opt_text(non_blank(&form.email)),
                    opt_text(non_blank(&form.address)),
                    opt_text(non_blank(&form.line_id)),
                    opt_text(non_blank(&sizes)),
                    opt_text(non_blank(&form.details)),
                ]),
            )
            .await?;
        Ok(())
    }

    pub async fn count_contacts(&self) -> Result<i64, SourceError> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM contacts", ()).await?;
        match rows.next().await? {
            Some(row) => Ok(val_i64(&row.get_value(0)?)),
            None => Ok(0),
        }
    }

    fn work_from_row(row: &turso::Row) -> Result<WorkItem, SourceError> {
        let id = val_i64(&row.get_value(0)?);
        let category_raw = val_string(&row.get_value(2)?);
        let view_raw = val_string(&row.get_value(3)?);
        let category = category_raw.parse().map_err(|_| SourceError::InvalidRow {
            id,
            field: "category",
            value: category_raw.clone(),
        })?;
        let view_category = view_raw.parse().map_err(|_| SourceError::InvalidRow {
            id,
            field: "view_category",
            value: view_raw.clone(),
        })?;
        Ok(WorkItem {
            id,
            image_ref: val_string(&row.get_value(1)?),
            category,
            view_category,
            active: val_bool(&row.get_value(4)?),
            created_at: parse_time(id, "created_at", &val_string(&row.get_value(5)?))?,
        })
    }

    fn article_from_row(row: &turso::Row) -> Result<ArticleItem, SourceError> {
        let id = val_i64(&row.get_value(0)?);
        let published_at = match val_opt_string(&row.get_value(9)?) {
            Some(raw) => Some(parse_time(id, "published_at", &raw)?),
            None => None,
        };
        Ok(ArticleItem {
            id,
            title: val_string(&row.get_value(1)?),
            slug: val_string(&row.get_value(2)?),
            category: val_opt_string(&row.get_value(3)?),
            excerpt: val_string(&row.get_value(4)?),
            content: val_string(&row.get_value(5)?),
            image_ref: val_opt_string(&row.get_value(6)?),
            author: val_opt_string(&row.get_value(7)?),
            published: val_bool(&row.get_value(8)?),
            published_at,
            created_at: parse_time(id, "created_at", &val_string(&row.get_value(10)?))?,
            view_count: val_i64(&row.get_value(11)?),
        })
    }
}

fn is_unique_violation(e: &turso::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

fn non_blank(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}

impl WorksSource for Database {
    async fn fetch_active_works(&self) -> Result<Vec<WorkItem>, SourceError> {
        let mut items = Vec::new();
        let mut rows = self
            .conn
            .query(
                "SELECT id, image_url, category, view_category, is_active, created_at \
                 FROM works WHERE is_active = 1 ORDER BY created_at DESC, id DESC",
                (),
            )
            .await?;

        while let Some(row) = rows.next().await? {
            match Self::work_from_row(&row) {
                Ok(item) => items.push(item),
                // One bad row should not hide the rest of the gallery.
                Err(e) => warn!(error = %e, "skipping malformed work row"),
            }
        }
        debug!(count = items.len(), "fetched active works");
        Ok(items)
    }

    async fn update_work(&self, id: WorkId, patch: WorkPatch) -> Result<(), SourceError> {
        let changed = self
            .conn
            .execute(
                "UPDATE works SET category = ?2, view_category = ?3, updated_at = ?4 WHERE id = ?1",
                Params::Positional(vec![
                    Value::Integer(id),
                    text(patch.category.as_str()),
                    text(patch.view_category.as_str()),
                    text(&timestamp(Utc::now())),
                ]),
            )
            .await?;
        if changed == 0 {
            return Err(SourceError::NotFound(format!("work {id}")));
        }
        Ok(())
    }

    async fn delete_works(&self, ids: &[WorkId]) -> Result<DeleteReport, SourceError> {
        let mut report = DeleteReport::default();
        for &id in ids {
            let result = self
                .conn
                .execute(
                    "DELETE FROM works WHERE id = ?1",
                    Params::Positional(vec![Value::Integer(id)]),
                )
                .await;
            match result {
                Ok(0) => report.failed.push((id, "not found".to_string())),
                Ok(_) => report.deleted.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }
        Ok(report)
    }
}

impl ArticleSource for Database {
    async fn fetch_published_articles(&self) -> Result<Vec<ArticleItem>, SourceError> {
        let mut items = Vec::new();
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE is_published = 1 \
             ORDER BY published_at DESC, id DESC"
        );
        let mut rows = self.conn.query(&sql, ()).await?;
        while let Some(row) = rows.next().await? {
            match Self::article_from_row(&row) {
                Ok(item) => items.push(item),
                Err(e) => warn!(error = %e, "skipping malformed article row"),
            }
        }
        Ok(items)
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Option<ArticleItem>, SourceError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = ?1 LIMIT 1");
        let mut rows = self
            .conn
            .query(&sql, Params::Positional(vec![text(slug)]))
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::article_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn increment_view_count(&self, id: ArticleId) -> Result<(), SourceError> {
        let changed = self
            .conn
            .execute(
                "UPDATE articles SET view_count = COALESCE(view_count, 0) + 1 WHERE id = ?1",
                Params::Positional(vec![Value::Integer(id)]),
            )
            .await?;
        if changed == 0 {
            return Err(SourceError::NotFound(format!("article {id}")));
        }
        Ok(())
    }
}

impl ArticleAdmin for Database {
    async fn fetch_all_articles(&self) -> Result<Vec<ArticleItem>, SourceError> {
        let mut items = Vec::new();
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC, id DESC");
        let mut rows = self.conn.query(&sql, ()).await?;
        while let Some(row) = rows.next().await? {
            match Self::article_from_row(&row) {
                Ok(item) => items.push(item),
                Err(e) => warn!(error = %e, "skipping malformed article row"),
            }
        }
        Ok(items)
    }

    async fn create_article(&self, article: &ArticleItem) -> Result<ArticleId, SourceError> {
        let created = timestamp(article.created_at);
        let result = self
            .conn
            .execute(
                "INSERT INTO articles (created_at, updated_at, title, slug, category, excerpt, content, \
                 image_url, author, is_published, published_at, view_count) \
                 VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                Params::Positional(vec![
                    text(&created),
                    text(&article.title),
                    text(&article.slug),
                    opt_text(article.category.as_deref()),
                    text(&article.excerpt),
                    text(&article.content),
                    opt_text(article.image_ref.as_deref()),
                    opt_text(article.author.as_deref()),
                    Value::Integer(i64::from(article.published)),
                    article
                        .published_at
                        .map_or(Value::Null, |t| Value::Text(timestamp(t))),
                    Value::Integer(article.view_count),
                ]),
            )
            .await;
        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(SourceError::Duplicate {
                field: "slug",
                value: article.slug.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_published(&self, id: ArticleId, published_at: Option<DateTime<Utc>>) -> Result<(), SourceError> {
        let changed = self
            .conn
            .execute(
                "UPDATE articles SET is_published = ?2, published_at = ?3, updated_at = ?4 WHERE id = ?1",
                Params::Positional(vec![
                    Value::Integer(id),
                    Value::Integer(i64::from(published_at.is_some())),
                    published_at.map_or(Value::Null, |t| Value::Text(timestamp(t))),
                    text(&timestamp(Utc::now())),
                ]),
            )
            .await?;
        if changed == 0 {
            return Err(SourceError::NotFound(format!("article {id}")));
        }
        Ok(())
    }

    async fn delete_article(&self, id: ArticleId) -> Result<(), SourceError> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM articles WHERE id = ?1",
                Params::Positional(vec![Value::Integer(id)]),
            )
            .await?;
        if changed == 0 {
            return Err(SourceError::NotFound(format!("article {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    async fn seeded() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("works.db")).await.unwrap();
        for w in sample::works() {
            db.insert_work(&w.image_ref, w.category, w.view_category, w.created_at)
                .await
                .unwrap();
        }
        for a in sample::articles() {
            db.create_article(&a).await.unwrap();
        }
        (dir, db)
    }

    #[tokio::test]
    async fn test_fetch_active_works_newest_first() {
        let (_dir, db) = seeded().await;
        let works = db.fetch_active_works().await.unwrap();
        assert_eq!(works.len(), 24);
        assert!(works.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        let expected: Vec<_> = sample::works().into_iter().map(|w| w.image_ref).collect();
        let got: Vec<_> = works.iter().map(|w| w.image_ref.clone()).collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_update_and_delete_works() {
        let (_dir, db) = seeded().await;
        let works = db.fetch_active_works().await.unwrap();
        let target = works[0].id;
        db.update_work(
            target,
            WorkPatch {
                category: WorkCategory::Shop,
                view_category: ViewCategory::Design,
            },
        )
        .await
        .unwrap();
        let after = db.fetch_active_works().await.unwrap();
        let patched = after.iter().find(|w| w.id == target).unwrap();
        assert_eq!(patched.category, WorkCategory::Shop);
        assert_eq!(patched.view_category, ViewCategory::Design);

        let report = db.delete_works(&[target, 9999]).await.unwrap();
        assert_eq!(report.deleted, vec![target]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(db.fetch_active_works().await.unwrap().len(), 23);
    }

    #[tokio::test]
    async fn test_update_missing_work_is_not_found() {
        let (_dir, db) = seeded().await;
        let err = db
            .update_work(
                424242,
                WorkPatch {
                    category: WorkCategory::Roof,
                    view_category: ViewCategory::Exterior,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_published_articles_only_and_ordered() {
        let (_dir, db) = seeded().await;
        let articles = db.fetch_published_articles().await.unwrap();
        assert_eq!(articles.len(), 5);
        assert!(articles.iter().all(|a| a.published));
        assert_eq!(articles[0].slug, "choosing-a-warehouse-size");
        assert_eq!(articles[3].category, None);
    }

    #[tokio::test]
    async fn test_article_by_slug_and_view_count() {
        let (_dir, db) = seeded().await;
        let article = db
            .article_by_slug("prefab-versus-concrete")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(article.view_count, 300);
        db.increment_view_count(article.id).await.unwrap();
        db.increment_view_count(article.id).await.unwrap();
        let again = db
            .article_by_slug("prefab-versus-concrete")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.view_count, 302);
        assert!(db.article_by_slug("missing").await.unwrap().is_none());

        let err = db.increment_view_count(424242).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (_dir, db) = seeded().await;
        let dup = sample::articles().remove(0);
        let err = db.create_article(&dup).await.unwrap_err();
        assert!(matches!(err, SourceError::Duplicate { field: "slug", .. }));
    }

    #[tokio::test]
    async fn test_admin_lists_drafts_newest_created_first() {
        let (_dir, db) = seeded().await;
        let all = db.fetch_all_articles().await.unwrap();
        assert_eq!(all.len(), sample::articles().len());
        assert!(all.iter().any(|a| !a.published));
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_publish_toggle_and_delete_article() {
        let (_dir, db) = seeded().await;
        let article = db
            .article_by_slug("prefab-versus-concrete")
            .await
            .unwrap()
            .unwrap();

        db.set_published(article.id, None).await.unwrap();
        let draft = db.article_by_slug(&article.slug).await.unwrap().unwrap();
        assert!(!draft.published);
        assert_eq!(draft.published_at, None);
        assert_eq!(db.fetch_published_articles().await.unwrap().len(), 4);

        let at = DateTime::parse_from_rfc3339("2026-05-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        db.set_published(article.id, Some(at)).await.unwrap();
        let live = db.article_by_slug(&article.slug).await.unwrap().unwrap();
        assert!(live.published);
        assert_eq!(live.published_at, Some(at));

        db.delete_article(article.id).await.unwrap();
        assert!(db.article_by_slug(&article.slug).await.unwrap().is_none());
        let err = db.delete_article(article.id).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_contact() {
        let (_dir, db) = seeded().await;
        let form = ContactForm {
            first_name: "Somchai".into(),
            phone: "0812345678".into(),
            warehouse_size: vec!["100 - 300 sq.m.".into()],
            ..Default::default()
        };
        db.insert_contact(&form, Utc::now()).await.unwrap();
        assert_eq!(db.count_contacts().await.unwrap(), 1);
    }
}
