use crate::filter::{self, GridStatus};
use crate::gallery::{FetchTicket, LoadState};
use crate::model::{ArticleItem, Selection};
use crate::source::{ArticleSource, SourceError};
use reqwest::Url;
use tracing::{debug, info, warn};

pub const ARTICLES_PATH: &str = "/articles";

// Only used to resolve relative routes; never requested.
const ROUTE_ORIGIN: &str = "http://localhost";

/// Shareable route for a category selection: `/articles` or
/// `/articles?category=<encoded>`.
pub fn articles_route(selection: &Selection<String>) -> String {
    match selection {
        Selection::All => ARTICLES_PATH.to_string(),
        Selection::Only(category) => {
            let mut url = match Url::parse(ROUTE_ORIGIN).and_then(|u| u.join(ARTICLES_PATH)) {
                Ok(url) => url,
                Err(_) => return ARTICLES_PATH.to_string(),
            };
            url.query_pairs_mut().append_pair("category", category);
            match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }
        }
    }
}

/// The non-empty `category` query value of a route, decoded.
pub fn route_category(route: &str) -> Option<String> {
    let url = Url::parse(ROUTE_ORIGIN).ok()?.join(route).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "category")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// View model of the public article grid.
pub struct ArticlesGrid {
    state: LoadState,
    articles: Vec<ArticleItem>,
    categories: Vec<String>,
    selected: Selection<String>,
    pending: Option<Selection<String>>,
    generation: u64,
    cursor: usize,
}

impl ArticlesGrid {
    /// Start from the current route. The category seed is checked against
    /// the real categories once articles arrive.
    pub fn from_route(route: &str) -> Self {
        Self {
            state: LoadState::Idle,
            articles: Vec::new(),
            categories: Vec::new(),
            selected: route_category(route).map_or(Selection::All, Selection::Only),
            pending: None,
            generation: 0,
            cursor: 0,
        }
    }

    pub fn begin_load(&mut self) -> FetchTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        FetchTicket::new(self.generation)
    }

    pub fn finish_load(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<ArticleItem>, SourceError>,
    ) -> Result<(), SourceError> {
        if ticket.generation() != self.generation {
            debug!("dropping superseded articles fetch");
            return Ok(());
        }
        match result {
            Ok(articles) => {
                info!(count = articles.len(), "articles fetched");
                self.categories = filter::article_categories(&articles);
                self.articles = articles;
                if let Selection::Only(c) = &self.selected {
                    if !self.categories.contains(c) {
                        debug!(category = %c, "route category unknown, showing all");
                        self.selected = Selection::All;
                    }
                }
                self.cursor = self.cursor.min(self.filtered().len().saturating_sub(1));
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "articles fetch failed");
                self.state = LoadState::Error("Could not load articles. Press r to retry.".to_string());
                Err(e)
            }
        }
    }

    pub async fn load<S: ArticleSource>(&mut self, source: &S) -> Result<(), SourceError> {
        let ticket = self.begin_load();
        let result = source.fetch_published_articles().await;
        self.finish_load(ticket, result)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Hide the error banner; articles loaded earlier stay.
    pub fn dismiss_error(&mut self) {
        if let LoadState::Error(_) = self.state {
            self.state = if self.articles.is_empty() {
                LoadState::Idle
            } else {
                LoadState::Loaded
            };
        }
    }

    pub fn articles(&self) -> &[ArticleItem] {
        &self.articles
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_count(&self, category: &str) -> usize {
        filter::category_count(&self.articles, category)
    }

    pub fn selected(&self) -> &Selection<String> {
        &self.selected
    }

    pub fn requested(&self) -> &Selection<String> {
        self.pending.as_ref().unwrap_or(&self.selected)
    }

    /// Record a category change and return the route to show for it.
    pub fn request_category(&mut self, selection: Selection<String>) -> String {
        let route = articles_route(&selection);
        self.pending = Some(selection);
        route
    }

    pub fn cycle_category(&mut self, forward: bool) -> String {
        let next = self.requested().cycle(&self.categories, forward);
        self.request_category(next)
    }

    pub fn is_updating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn settle(&mut self) -> bool {
        match self.pending.take() {
            Some(next) => {
                if next != self.selected {
                    self.selected = next;
                    self.cursor = 0;
                }
                true
            }
            None => false,
        }
    }

    /// Route of the selection currently applied.
    pub fn route(&self) -> String {
        articles_route(&self.selected)
    }

    pub fn filtered(&self) -> Vec<&ArticleItem> {
        filter::filter_articles(&self.articles, &self.selected)
    }

    pub fn status(&self) -> GridStatus {
        filter::grid_status(self.articles.len(), self.filtered().len())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_next(&mut self) {
        if self.cursor + 1 < self.filtered().len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn highlighted(&self) -> Option<&ArticleItem> {
        self.filtered().get(self.cursor).copied()
    }
}
