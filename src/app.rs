use crate::article_detail::{ArticleDetail, DetailTab};
use crate::articles::{ARTICLES_PATH, ArticlesGrid};
use crate::cache::WorksCache;
use crate::gallery::{Gallery, LoadState};
use crate::model::{ViewCategory, WorkCategory, WorkId, WorkPatch};
use crate::source::{ArticleSource, DeleteReport, WorksSource};
use crate::upload::{self, ImageHost};
use std::rc::Rc;
use std::time::Duration;
use tracing::{info, warn};

/// Which view is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Works,
    Articles,
    ArticleDetail,
}

/// Category/view being chosen for a work before it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDraft {
    pub id: WorkId,
    pub category: WorkCategory,
    pub view_category: ViewCategory,
}

fn step<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let pos = all.iter().position(|c| *c == current).unwrap_or(0);
    let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
    all[next]
}

impl EditDraft {
    pub fn cycle_category(&mut self, forward: bool) {
        self.category = step(&WorkCategory::ALL, self.category, forward);
    }

    pub fn cycle_view(&mut self, forward: bool) {
        self.view_category = step(&ViewCategory::ALL, self.view_category, forward);
    }

    pub fn patch(&self) -> WorkPatch {
        WorkPatch {
            category: self.category,
            view_category: self.view_category,
        }
    }
}

/// Main application state.
pub struct App<S, H> {
    pub source: S,
    pub image_host: Option<H>,
    pub should_quit: bool,
    pub view: View,
    pub show_help: bool,

    pub gallery: Gallery,
    pub articles: ArticlesGrid,
    pub detail: Option<ArticleDetail>,
    /// Shareable route of the articles view.
    pub route: String,

    pub edit: Option<EditDraft>,
    /// Works waiting for a y/n confirmation before deletion.
    pub pending_delete: Option<Vec<WorkId>>,

    pub status_msg: String,
}

impl<S: WorksSource + ArticleSource, H: ImageHost> App<S, H> {
    pub fn new(source: S, image_host: Option<H>, page_size: usize, cache_ttl: Duration, route: &str) -> Self {
        let cache = Rc::new(WorksCache::new(cache_ttl));
        let articles = ArticlesGrid::from_route(route);
        Self {
            source,
            image_host,
            should_quit: false,
            view: View::Works,
            show_help: false,
            gallery: Gallery::new(cache, page_size),
            route: articles.route(),
            articles,
            detail: None,
            edit: None,
            pending_delete: None,
            status_msg: "Loading...".to_string(),
        }
    }

    /// Initial data load. Each view keeps its own failure; one failing
    /// never stops the other from loading.
    pub async fn init(&mut self) {
        let works = self.gallery.load(&self.source).await;
        let articles = self.articles.load(&self.source).await;
        self.route = self.articles.route();
        self.status_msg = match (works, articles) {
            (Ok(()), Ok(())) => format!(
                "{} works, {} articles loaded",
                self.gallery.total_len(),
                self.articles.articles().len()
            ),
            (Err(e), _) => e.user_message(),
            (Ok(()), Err(_)) => "Could not load articles. Press r in the articles view to retry.".to_string(),
        };
    }

    /// Apply filter changes once input has gone quiet.
    pub fn settle(&mut self) {
        if self.gallery.settle() {
            self.status_msg = format!(
                "{} of {} works match",
                self.gallery.filtered_len(),
                self.gallery.total_len()
            );
        }
        if self.articles.settle() {
            self.route = self.articles.route();
            self.status_msg = format!("{} articles", self.articles.filtered().len());
        }
    }

    /// Switch to the gallery; a fresh cache entry avoids the fetch.
    pub async fn show_works(&mut self) {
        self.view = View::Works;
        if let Err(e) = self.gallery.load(&self.source).await {
            self.status_msg = e.user_message();
        }
    }

    pub fn show_articles(&mut self) {
        self.view = View::Articles;
        self.route = self.articles.route();
    }

    pub fn cycle_article_category(&mut self, forward: bool) {
        self.route = self.articles.cycle_category(forward);
    }

    /// Manual retry of whatever the current view shows.
    pub async fn retry(&mut self) {
        match self.view {
            View::Works => match self.gallery.reload(&self.source).await {
                Ok(()) => self.status_msg = format!("{} works loaded", self.gallery.total_len()),
                Err(e) => self.status_msg = e.user_message(),
            },
            View::Articles | View::ArticleDetail => match self.articles.load(&self.source).await {
                Ok(()) => {
                    self.route = self.articles.route();
                    self.status_msg = format!("{} articles loaded", self.articles.articles().len());
                }
                Err(e) => self.status_msg = format!("Could not load articles: {e}"),
            },
        }
    }

    pub fn dismiss_error(&mut self) {
        self.gallery.dismiss_error();
        self.articles.dismiss_error();
        self.status_msg.clear();
    }

    // ── Articles ──

    /// Open the highlighted article, or the selected related one when a
    /// detail view is already showing.
    pub async fn open_article(&mut self) {
        let slug = match (self.view, &self.detail) {
            (View::ArticleDetail, Some(detail)) if detail.tab == DetailTab::Related => {
                detail.selected_related().map(|a| a.slug.clone())
            }
            (View::Articles, _) => self.articles.highlighted().map(|a| a.slug.clone()),
            _ => None,
        };
        let Some(slug) = slug else { return };

        match ArticleDetail::open(&self.source, &slug).await {
            Ok(Some(mut detail)) => {
                if let Err(e) = detail.record_view(&self.source).await {
                    warn!(slug = %slug, error = %e, "view count not stored");
                }
                self.status_msg = format!("{} · {} views", detail.article.title, detail.article.view_count);
                self.route = format!("{ARTICLES_PATH}/{slug}");
                self.detail = Some(detail);
                self.view = View::ArticleDetail;
            }
            Ok(None) => self.status_msg = format!("Article {slug} not found"),
            Err(e) => self.status_msg = format!("Could not open article: {e}"),
        }
    }

    pub fn close_article(&mut self) {
        self.detail = None;
        self.view = View::Articles;
        self.route = self.articles.route();
    }

    // ── Works editing ──

    /// Start editing the lightbox work, or the highlighted one.
    pub fn begin_edit(&mut self) {
        let work = self.gallery.lightbox_item().or_else(|| self.gallery.highlighted());
        self.edit = work.map(|w| EditDraft {
            id: w.id,
            category: w.category,
            view_category: w.view_category,
        });
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    pub async fn submit_edit(&mut self) {
        let Some(draft) = self.edit.take() else { return };
        match self.gallery.edit(&self.source, draft.id, draft.patch()).await {
            Ok(()) => {
                self.status_msg = format!(
                    "Work {} saved as {} / {}",
                    draft.id,
                    draft.category.metadata().label,
                    draft.view_category.metadata().label
                );
            }
            Err(e) => {
                // keep the draft so the user can retry
                self.edit = Some(draft);
                self.status_msg = e.user_message();
            }
        }
    }

    // ── Works deletion ──

    /// Ask to delete the selected works, or the highlighted one outside
    /// selection mode.
    pub fn request_delete(&mut self) {
        let ids = if self.gallery.selection_mode() {
            self.gallery.selected_ids()
        } else {
            self.gallery
                .lightbox_item()
                .or_else(|| self.gallery.highlighted())
                .map(|w| vec![w.id])
                .unwrap_or_default()
        };
        if ids.is_empty() {
            self.status_msg = "Nothing selected".to_string();
            return;
        }
        self.status_msg = format!("Delete {} work(s)? (y/n)", ids.len());
        self.pending_delete = Some(ids);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.status_msg.clear();
    }

    pub async fn confirm_delete(&mut self) {
        let Some(ids) = self.pending_delete.take() else { return };
        let images: Vec<(WorkId, String)> = ids
            .iter()
            .filter_map(|&id| self.gallery.work(id).map(|w| (id, w.image_ref.clone())))
            .collect();

        self.gallery.close_lightbox();
        let result = match (self.gallery.selection_mode(), ids.first()) {
            (true, _) => self.gallery.bulk_delete(&self.source).await,
            (false, Some(&id)) => self.gallery.delete(&self.source, id).await,
            (false, None) => return,
        };

        match result {
            Ok(outcome) => {
                // works gone from the store lose their images even if the refetch failed
                let removed = self.remove_images(&outcome.report, &images).await;
                let mut msg = delete_message(&outcome.report, removed);
                if let Err(e) = outcome.refetch {
                    msg.push_str(". ");
                    msg.push_str(&e.user_message());
                }
                self.status_msg = msg;
            }
            Err(e) => self.status_msg = e.user_message(),
        }
    }

    async fn remove_images(&self, report: &DeleteReport, images: &[(WorkId, String)]) -> usize {
        let Some(host) = &self.image_host else { return 0 };
        let urls: Vec<String> = images
            .iter()
            .filter(|(id, _)| report.deleted.contains(id))
            .map(|(_, url)| url.clone())
            .collect();
        let removed = upload::remove_images(host, &urls).await;
        info!(removed, requested = urls.len(), "hosted images cleaned up");
        removed
    }
}

impl<S, H> App<S, H> {
    /// Seed the gallery category from a `?category=` value.
    pub fn with_initial_category(mut self, query: Option<&str>) -> Self {
        self.gallery = self.gallery.with_initial_category(query);
        self
    }

    pub fn is_loading(&self) -> bool {
        match self.view {
            View::Works => *self.gallery.state() == LoadState::Loading,
            _ => *self.articles.state() == LoadState::Loading,
        }
    }
}

fn delete_message(report: &DeleteReport, images_removed: usize) -> String {
    let mut msg = format!("Deleted {} work(s)", report.deleted.len());
    if !report.failed.is_empty() {
        msg.push_str(&format!(", {} failed", report.failed.len()));
    }
    if images_removed > 0 {
        msg.push_str(&format!(", {images_removed} image(s) removed"));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::WORKS_CACHE_TTL;
    use crate::filter::GALLERY_PAGE_SIZE;
    use crate::model::Selection;
    use crate::sample;
    use crate::source::memory::MemorySource;
    use crate::upload::fake::RecordingHost;

    fn source() -> MemorySource {
        let source = MemorySource::with_works(sample::works());
        *source.articles.borrow_mut() = sample::articles();
        source
    }

    async fn app(route: &str) -> App<MemorySource, RecordingHost> {
        let mut app = App::new(
            source(),
            Some(RecordingHost::default()),
            GALLERY_PAGE_SIZE,
            WORKS_CACHE_TTL,
            route,
        );
        app.init().await;
        app
    }

    #[test]
    fn test_edit_draft_cycles_wrap() {
        let mut draft = EditDraft {
            id: 1,
            category: WorkCategory::Shop,
            view_category: ViewCategory::Exterior,
        };
        draft.cycle_category(true);
        assert_eq!(draft.category, WorkCategory::Warehouse);
        draft.cycle_view(false);
        assert_eq!(draft.view_category, ViewCategory::Design);
    }

    #[tokio::test]
    async fn test_init_loads_both_views() {
        let app = app("/articles?category=Maintenance").await;
        assert_eq!(app.gallery.total_len(), 24);
        assert_eq!(app.gallery.visible().len(), 8);
        assert_eq!(app.articles.filtered().len(), 1);
        assert_eq!(app.route, "/articles?category=Maintenance");
        assert_eq!(app.status_msg, "24 works, 5 articles loaded");
    }

    #[tokio::test]
    async fn test_returning_to_works_uses_cache() {
        let mut app = app("/articles").await;
        app.show_articles();
        app.show_works().await;
        assert_eq!(app.source.fetches.get(), 2); // one works + one articles fetch
    }

    #[tokio::test]
    async fn test_category_route_follows_settle() {
        let mut app = app("/articles").await;
        app.show_articles();
        app.cycle_article_category(true);
        app.cycle_article_category(true);
        assert!(app.articles.is_updating());
        app.settle();
        assert_eq!(app.route, "/articles?category=Maintenance");
        assert_eq!(app.articles.selected(), &Selection::Only("Maintenance".to_string()));
    }

    #[tokio::test]
    async fn test_edit_flow() {
        let mut app = app("/articles").await;
        app.begin_edit();
        let draft = app.edit.as_mut().unwrap();
        assert_eq!(draft.id, 1);
        draft.category = WorkCategory::Shop;
        app.submit_edit().await;
        assert!(app.edit.is_none());
        assert_eq!(app.gallery.work(1).unwrap().category, WorkCategory::Shop);

        app.source.fail_update.set(true);
        app.begin_edit();
        app.submit_edit().await;
        assert!(app.edit.is_some());
        assert!(app.status_msg.starts_with("Could not update work"));
    }

    #[tokio::test]
    async fn test_bulk_delete_removes_images_of_deleted_works_only() {
        let mut app = app("/articles").await;
        app.source.undeletable.borrow_mut().insert(3);
        app.gallery.toggle_selection_mode();
        app.gallery.toggle_selected(2);
        app.gallery.toggle_selected(3);
        app.request_delete();
        assert_eq!(app.pending_delete.as_deref(), Some(&[2, 3][..]));
        app.confirm_delete().await;

        assert_eq!(app.gallery.total_len(), 23);
        assert!(!app.gallery.selection_mode());
        let host = app.image_host.as_ref().unwrap();
        assert_eq!(*host.removed.borrow(), vec!["sp-warehouse/works/roof-02".to_string()]);
        assert_eq!(app.status_msg, "Deleted 1 work(s), 1 failed, 1 image(s) removed");
    }

    #[tokio::test]
    async fn test_delete_cleans_images_when_refetch_fails() {
        let mut app = app("/articles").await;
        app.request_delete();
        assert_eq!(app.pending_delete.as_deref(), Some(&[1][..]));
        app.source.fail_fetch.set(true);
        app.confirm_delete().await;

        assert!(app.source.works.borrow().iter().all(|w| w.id != 1));
        let host = app.image_host.as_ref().unwrap();
        assert_eq!(host.removed.borrow().len(), 1);
        assert!(matches!(app.gallery.state(), LoadState::Error(_)));
        assert_eq!(
            app.status_msg,
            "Deleted 1 work(s), 1 image(s) removed. Could not load works. Press r to retry."
        );
    }

    #[tokio::test]
    async fn test_cancelled_delete_keeps_works() {
        let mut app = app("/articles").await;
        app.request_delete();
        app.cancel_delete();
        app.confirm_delete().await;
        assert_eq!(app.gallery.total_len(), 24);
    }

    #[tokio::test]
    async fn test_open_article_counts_view_and_opens_related() {
        let mut app = app("/articles").await;
        app.show_articles();
        app.open_article().await;
        assert_eq!(app.view, View::ArticleDetail);
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.article.slug, "choosing-a-warehouse-size");
        assert_eq!(detail.article.view_count, 121);
        assert_eq!(app.route, "/articles/choosing-a-warehouse-size");

        app.detail.as_mut().unwrap().tab = DetailTab::Related;
        app.open_article().await;
        assert_eq!(app.detail.as_ref().unwrap().article.slug, "prefab-versus-concrete");

        app.close_article();
        assert_eq!(app.view, View::Articles);
        assert_eq!(app.route, "/articles");
    }

    #[tokio::test]
    async fn test_fetch_failure_then_retry() {
        let source = source();
        source.fail_fetch.set(true);
        let mut app: App<MemorySource, RecordingHost> =
            App::new(source, None, GALLERY_PAGE_SIZE, WORKS_CACHE_TTL, ARTICLES_PATH);
        app.init().await;
        assert!(matches!(app.gallery.state(), LoadState::Error(_)));

        app.source.fail_fetch.set(false);
        app.retry().await;
        assert_eq!(app.gallery.state(), &LoadState::Loaded);
        assert_eq!(app.status_msg, "24 works loaded");
    }

    #[tokio::test]
    async fn test_works_failure_does_not_block_articles() {
        let source = source();
        source.fail_works_fetch.set(true);
        let mut app: App<MemorySource, RecordingHost> =
            App::new(source, None, GALLERY_PAGE_SIZE, WORKS_CACHE_TTL, "/articles?category=Design");
        app.init().await;

        assert!(matches!(app.gallery.state(), LoadState::Error(_)));
        assert_eq!(app.articles.state(), &LoadState::Loaded);
        assert_eq!(app.articles.articles().len(), 5);
        assert_eq!(app.route, "/articles?category=Design");
        assert_eq!(app.status_msg, "Could not load works. Press r to retry.");
    }

    #[tokio::test]
    async fn test_dismiss_error_clears_both_views() {
        let source = source();
        source.fail_fetch.set(true);
        let mut app: App<MemorySource, RecordingHost> =
            App::new(source, None, GALLERY_PAGE_SIZE, WORKS_CACHE_TTL, ARTICLES_PATH);
        app.init().await;
        assert!(matches!(app.articles.state(), LoadState::Error(_)));

        app.dismiss_error();
        assert_eq!(app.gallery.state(), &LoadState::Idle);
        assert_eq!(app.articles.state(), &LoadState::Idle);
        assert!(app.status_msg.is_empty());
    }
}
