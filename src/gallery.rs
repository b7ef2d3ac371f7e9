use crate::cache::WorksCache;
use crate::filter::{self, FilterState, GridStatus};
use crate::model::{Selection, ViewCategory, WorkCategory, WorkId, WorkItem, WorkPatch};
use crate::source::{DeleteReport, SourceError, WorksSource};
use std::collections::BTreeSet;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Macro state of a fetch-backed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    /// Fetch failed. Data loaded earlier is still shown.
    Error(String),
}

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Could not load works: {0}")]
    Fetch(#[source] SourceError),

    #[error("Could not {action}: {source}")]
    Mutation {
        action: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("Work {0} is not loaded")]
    UnknownWork(WorkId),
}

impl GalleryError {
    pub fn user_message(&self) -> String {
        match self {
            GalleryError::Fetch(_) => "Could not load works. Press r to retry.".to_string(),
            GalleryError::Mutation { action, source } => format!("Could not {action}: {source}"),
            GalleryError::UnknownWork(id) => format!("Work {id} is no longer in the gallery"),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GalleryError::Fetch(_) | GalleryError::Mutation { .. })
    }
}

/// What a delete did in the store, and how the forced refetch went.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub report: DeleteReport,
    pub refetch: Result<(), GalleryError>,
}

/// Handed out when a network fetch starts; results carrying an older ticket
/// are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub(crate) fn new(generation: u64) -> Self {
        Self { generation }
    }

    pub(crate) fn generation(self) -> u64 {
        self.generation
    }
}

/// View model of the works gallery.
pub struct Gallery {
    cache: Rc<WorksCache>,
    page_size: usize,
    state: LoadState,

    // Local shadow of the cached collection; edits patch this copy only.
    works: Vec<WorkItem>,
    filtered: Vec<usize>,
    filter: FilterState,
    pending_filter: Option<FilterState>,
    generation: u64,

    cursor: usize,
    lightbox: Option<usize>,

    selection_mode: bool,
    selected: BTreeSet<WorkId>,
}

impl Gallery {
    pub fn new(cache: Rc<WorksCache>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            cache,
            page_size,
            state: LoadState::Idle,
            works: Vec::new(),
            filtered: Vec::new(),
            filter: FilterState::new(page_size),
            pending_filter: None,
            generation: 0,
            cursor: 0,
            lightbox: None,
            selection_mode: false,
            selected: BTreeSet::new(),
        }
    }

    /// Seed the category from a `?category=` value; unknown values mean all.
    pub fn with_initial_category(mut self, query: Option<&str>) -> Self {
        if let Some(category) = query.and_then(|q| q.parse::<WorkCategory>().ok()) {
            self.filter = self.filter.with_category(Selection::Only(category), self.page_size);
        }
        self
    }

    // ── Loading ──

    /// Enter `Loading`. A fresh cache entry short-circuits straight to
    /// `Loaded` and no ticket is returned.
    pub fn begin_load(&mut self) -> Option<FetchTicket> {
        if let Some(cached) = self.cache.get() {
            debug!(count = cached.len(), "works served from cache");
            self.replace_works(cached.to_vec());
            self.state = LoadState::Loaded;
            return None;
        }
        self.generation += 1;
        self.state = LoadState::Loading;
        Some(FetchTicket {
            generation: self.generation,
        })
    }

    pub fn finish_load(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<WorkItem>, SourceError>,
    ) -> Result<(), GalleryError> {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "dropping superseded works fetch"
            );
            return Ok(());
        }
        match result {
            Ok(items) => {
                info!(count = items.len(), "works fetched");
                self.cache.set(items.clone());
                self.replace_works(items);
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                let err = GalleryError::Fetch(e);
                warn!(error = %err, "works fetch failed");
                self.state = LoadState::Error(err.user_message());
                Err(err)
            }
        }
    }

    /// Mount or manual retry.
    pub async fn load<S: WorksSource>(&mut self, source: &S) -> Result<(), GalleryError> {
        match self.begin_load() {
            None => Ok(()),
            Some(ticket) => {
                let result = source.fetch_active_works().await;
                self.finish_load(ticket, result)
            }
        }
    }

    /// Drop the cache entry and fetch again.
    pub async fn reload<S: WorksSource>(&mut self, source: &S) -> Result<(), GalleryError> {
        self.cache.invalidate();
        self.load(source).await
    }

    /// Hide the error banner; loaded data stays.
    pub fn dismiss_error(&mut self) {
        if let LoadState::Error(_) = self.state {
            self.state = if self.works.is_empty() {
                LoadState::Idle
            } else {
                LoadState::Loaded
            };
        }
    }

    fn replace_works(&mut self, works: Vec<WorkItem>) {
        self.works = works;
        self.selected
            .retain(|id| self.works.iter().any(|w| w.id == *id));
        self.refilter();
    }

    fn refilter(&mut self) {
        let focused = self.lightbox_item().map(|w| w.id);
        self.filtered = filter::matching_indices(&self.works, &self.filter);
        self.lightbox = focused.and_then(|id| self.filtered.iter().position(|&i| self.works[i].id == id));
        self.cursor = self.cursor.min(self.visible_len().saturating_sub(1));
    }

    // ── Filtering ──

    /// Filter the user is asking for, including a not yet applied change.
    pub fn requested_filter(&self) -> &FilterState {
        self.pending_filter.as_ref().unwrap_or(&self.filter)
    }

    pub fn applied_filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn request_category(&mut self, category: Selection<WorkCategory>) {
        self.pending_filter = Some(self.requested_filter().with_category(category, self.page_size));
    }

    pub fn request_view(&mut self, view: Selection<ViewCategory>) {
        self.pending_filter = Some(self.requested_filter().with_view(view, self.page_size));
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let next = self.requested_filter().category.cycle(&WorkCategory::ALL, forward);
        self.request_category(next);
    }

    pub fn cycle_view(&mut self, forward: bool) {
        let next = self.requested_filter().view.cycle(&ViewCategory::ALL, forward);
        self.request_view(next);
    }

    pub fn clear_filters(&mut self) {
        self.pending_filter = Some(FilterState::new(self.page_size));
    }

    /// A filter change is waiting to be applied.
    pub fn is_updating(&self) -> bool {
        self.pending_filter.is_some()
    }

    /// Apply the latest requested filter. Earlier requests in the same burst
    /// are never applied on their own.
    pub fn settle(&mut self) -> bool {
        let Some(next) = self.pending_filter.take() else {
            return false;
        };
        if next != self.filter {
            self.filter = next;
            self.cursor = 0;
            self.lightbox = None;
            self.refilter();
        }
        true
    }

    /// Show one more page of the filtered set. Never fetches.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.filter.visible_count += self.page_size;
        true
    }

    // ── Derived view ──

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_len(&self) -> usize {
        self.works.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    fn visible_len(&self) -> usize {
        filter::page(&self.filtered, self.filter.visible_count).len()
    }

    pub fn visible(&self) -> Vec<&WorkItem> {
        filter::page(&self.filtered, self.filter.visible_count)
            .iter()
            .map(|&i| &self.works[i])
            .collect()
    }

    pub fn has_more(&self) -> bool {
        filter::has_more(self.filtered.len(), self.filter.visible_count)
    }

    pub fn status(&self) -> GridStatus {
        filter::grid_status(self.works.len(), self.filtered.len())
    }

    pub fn work(&self, id: WorkId) -> Option<&WorkItem> {
        self.works.iter().find(|w| w.id == id)
    }

    // ── Cursor and lightbox ──

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_next(&mut self) {
        if self.cursor + 1 < self.visible_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn highlighted(&self) -> Option<&WorkItem> {
        filter::page(&self.filtered, self.filter.visible_count)
            .get(self.cursor)
            .map(|&i| &self.works[i])
    }

    /// Open the lightbox on the highlighted work.
    pub fn open_highlighted(&mut self) -> bool {
        if self.cursor < self.visible_len() {
            self.lightbox = Some(self.cursor);
            true
        } else {
            false
        }
    }

    pub fn close_lightbox(&mut self) {
        self.lightbox = None;
    }

    pub fn lightbox_item(&self) -> Option<&WorkItem> {
        self.lightbox
            .and_then(|pos| self.filtered.get(pos))
            .map(|&i| &self.works[i])
    }

    /// 1-based position of the lightbox within the filtered set, and its size.
    pub fn lightbox_position(&self) -> Option<(usize, usize)> {
        self.lightbox.map(|pos| (pos + 1, self.filtered.len()))
    }

    /// Step through the whole filtered set, wrapping at the ends.
    pub fn lightbox_step(&mut self, forward: bool) {
        let len = self.filtered.len();
        if let Some(pos) = self.lightbox.filter(|_| len > 0) {
            self.lightbox = Some(if forward {
                (pos + 1) % len
            } else {
                (pos + len - 1) % len
            });
        }
    }

    // ── Mutations ──

    /// Persist a new category/view and patch the local copy in place.
    /// The cache is left alone and may be stale until it expires.
    pub async fn edit<S: WorksSource>(
        &mut self,
        source: &S,
        id: WorkId,
        patch: WorkPatch,
    ) -> Result<(), GalleryError> {
        if self.work(id).is_none() {
            return Err(GalleryError::UnknownWork(id));
        }
        source
            .update_work(id, patch)
            .await
            .map_err(|source| GalleryError::Mutation {
                action: "update work",
                source,
            })?;
        if let Some(work) = self.works.iter_mut().find(|w| w.id == id) {
            work.apply(patch);
        }
        info!(id, category = %patch.category, view = %patch.view_category, "work updated");
        self.refilter();
        Ok(())
    }

    pub async fn delete<S: WorksSource>(
        &mut self,
        source: &S,
        id: WorkId,
    ) -> Result<DeleteOutcome, GalleryError> {
        self.delete_ids(source, &[id]).await
    }

    /// Delete every selected work, then leave selection mode.
    pub async fn bulk_delete<S: WorksSource>(
        &mut self,
        source: &S,
    ) -> Result<DeleteOutcome, GalleryError> {
        let ids: Vec<WorkId> = self.selected.iter().copied().collect();
        let result = self.delete_ids(source, &ids).await;
        self.selected.clear();
        self.selection_mode = false;
        result
    }

    /// Deletes are not patched locally: the cache is dropped and the
    /// collection fetched again, whatever the per-item outcome. `Err` means
    /// the store call itself failed; a failed refetch rides in the outcome
    /// so the caller still learns which works are gone.
    async fn delete_ids<S: WorksSource>(
        &mut self,
        source: &S,
        ids: &[WorkId],
    ) -> Result<DeleteOutcome, GalleryError> {
        let outcome = source.delete_works(ids).await;
        match &outcome {
            Ok(report) if report.is_complete() => info!(count = report.deleted.len(), "works deleted"),
            Ok(report) => warn!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "bulk delete partially failed"
            ),
            Err(e) => warn!(error = %e, "delete failed"),
        }
        self.cache.invalidate();
        let refetch = self.load(source).await;

        let report = outcome.map_err(|source| GalleryError::Mutation {
            action: "delete works",
            source,
        })?;
        Ok(DeleteOutcome { report, refetch })
    }

    // ── Selection ──

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    /// Entering or leaving selection mode starts from an empty selection.
    pub fn toggle_selection_mode(&mut self) {
        self.selection_mode = !self.selection_mode;
        self.selected.clear();
    }

    pub fn toggle_selected(&mut self, id: WorkId) {
        if !self.selection_mode || self.work(id).is_none() {
            return;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn is_selected(&self, id: WorkId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<WorkId> {
        self.selected.iter().copied().collect()
    }
}
