use crate::model::{ArticleItem, Selection, ViewCategory, WorkCategory, WorkItem};

/// Works shown per "load more" step in the gallery.
pub const GALLERY_PAGE_SIZE: usize = 8;

/// Current filter selection of the works gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub category: Selection<WorkCategory>,
    pub view: Selection<ViewCategory>,
    pub visible_count: usize,
}

impl FilterState {
    pub fn new(page_size: usize) -> Self {
        Self {
            category: Selection::All,
            view: Selection::All,
            visible_count: page_size,
        }
    }

    /// Both dimensions must match; `All` matches everything.
    pub fn matches(&self, item: &WorkItem) -> bool {
        self.category.matches(&item.category) && self.view.matches(&item.view_category)
    }

    pub fn is_filtered(&self) -> bool {
        !self.category.is_all() || !self.view.is_all()
    }

    /// New category; the visible window restarts at one page.
    pub fn with_category(&self, category: Selection<WorkCategory>, page_size: usize) -> Self {
        Self {
            category,
            view: self.view.clone(),
            visible_count: page_size,
        }
    }

    /// New view; the visible window restarts at one page.
    pub fn with_view(&self, view: Selection<ViewCategory>, page_size: usize) -> Self {
        Self {
            category: self.category.clone(),
            view,
            visible_count: page_size,
        }
    }
}

/// Which of the mutually exclusive grid states applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStatus {
    /// The collection itself is empty.
    NoItems,
    /// There is data, but nothing passes the current filter.
    NoMatch,
    Populated,
}

pub fn grid_status(total: usize, matched: usize) -> GridStatus {
    match (total, matched) {
        (0, _) => GridStatus::NoItems,
        (_, 0) => GridStatus::NoMatch,
        _ => GridStatus::Populated,
    }
}

/// Positions in `all` of the items matching `state`, in collection order.
pub fn matching_indices(all: &[WorkItem], state: &FilterState) -> Vec<usize> {
    all.iter()
        .enumerate()
        .filter(|(_, item)| state.matches(item))
        .map(|(i, _)| i)
        .collect()
}

pub fn filter_works<'a>(all: &'a [WorkItem], state: &FilterState) -> Vec<&'a WorkItem> {
    all.iter().filter(|item| state.matches(item)).collect()
}

/// Prefix of `filtered` of length `min(visible_count, filtered.len())`.
pub fn page<T>(filtered: &[T], visible_count: usize) -> &[T] {
    &filtered[..visible_count.min(filtered.len())]
}

pub fn has_more(filtered_len: usize, visible_count: usize) -> bool {
    filtered_len > visible_count
}

// ── Articles ──

/// Distinct non-blank categories in order of first appearance.
pub fn article_categories(articles: &[ArticleItem]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for name in articles.iter().filter_map(ArticleItem::category_name) {
        if !categories.iter().any(|c| c == name) {
            categories.push(name.to_string());
        }
    }
    categories
}

pub fn category_count(articles: &[ArticleItem], category: &str) -> usize {
    articles
        .iter()
        .filter(|a| a.category_name() == Some(category))
        .count()
}

pub fn filter_articles<'a>(
    articles: &'a [ArticleItem],
    selection: &Selection<String>,
) -> Vec<&'a ArticleItem> {
    match selection {
        Selection::All => articles.iter().collect(),
        Selection::Only(wanted) => articles
            .iter()
            .filter(|a| a.category_name() == Some(wanted.as_str()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use proptest::prelude::*;

    fn state(cat: Option<WorkCategory>, view: Option<ViewCategory>) -> FilterState {
        FilterState {
            category: cat.map_or(Selection::All, Selection::Only),
            view: view.map_or(Selection::All, Selection::Only),
            visible_count: GALLERY_PAGE_SIZE,
        }
    }

    #[test]
    fn test_identity_filter_returns_everything() {
        let all = sample::works();
        let filtered = filter_works(&all, &FilterState::new(GALLERY_PAGE_SIZE));
        assert_eq!(filtered.len(), all.len());
        assert!(filtered.iter().zip(&all).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_category_and_view_are_and_combined() {
        let all = sample::works();
        let s = state(Some(WorkCategory::Warehouse), Some(ViewCategory::Interior));
        let filtered = filter_works(&all, &s);
        assert!(!filtered.is_empty());
        assert!(filtered.iter().all(|w| {
            w.category == WorkCategory::Warehouse && w.view_category == ViewCategory::Interior
        }));
        let expected = all
            .iter()
            .filter(|w| {
                w.category == WorkCategory::Warehouse && w.view_category == ViewCategory::Interior
            })
            .count();
        assert_eq!(filtered.len(), expected);
    }

    #[test]
    fn test_warehouse_scenario_load_more() {
        let all = sample::works();
        assert_eq!(all.len(), 24);
        let mut s = FilterState::new(GALLERY_PAGE_SIZE)
            .with_category(Selection::Only(WorkCategory::Warehouse), GALLERY_PAGE_SIZE);
        let filtered = filter_works(&all, &s);
        assert_eq!(filtered.len(), 12);
        assert_eq!(page(&filtered, s.visible_count).len(), 8);
        assert!(has_more(filtered.len(), s.visible_count));

        s.visible_count += GALLERY_PAGE_SIZE;
        assert_eq!(page(&filtered, s.visible_count).len(), 12);
        assert!(!has_more(filtered.len(), s.visible_count));
    }

    #[test]
    fn test_changing_filter_resets_visible_count() {
        let mut s = FilterState::new(GALLERY_PAGE_SIZE);
        s.visible_count = 40;
        let s2 = s.with_view(Selection::Only(ViewCategory::Design), GALLERY_PAGE_SIZE);
        assert_eq!(s2.visible_count, GALLERY_PAGE_SIZE);
        let mut s3 = s2.clone();
        s3.visible_count = 24;
        let s4 = s3.with_category(Selection::All, 20);
        assert_eq!(s4.visible_count, 20);
        assert_eq!(s4.view, Selection::Only(ViewCategory::Design));
    }

    #[test]
    fn test_matching_indices_preserve_order() {
        let all = sample::works();
        let s = state(Some(WorkCategory::Shop), None);
        let idx = matching_indices(&all, &s);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        assert!(idx.iter().all(|&i| all[i].category == WorkCategory::Shop));
    }

    #[test]
    fn test_grid_status_distinguishes_empty_states() {
        assert_eq!(grid_status(0, 0), GridStatus::NoItems);
        assert_eq!(grid_status(5, 0), GridStatus::NoMatch);
        assert_eq!(grid_status(5, 2), GridStatus::Populated);

        let empty: Vec<WorkItem> = Vec::new();
        let s = state(Some(WorkCategory::Roof), None);
        assert_eq!(grid_status(empty.len(), filter_works(&empty, &s).len()), GridStatus::NoItems);
    }

    #[test]
    fn test_article_categories_distinct_in_first_appearance_order() {
        let articles = sample::articles();
        let cats = article_categories(&articles);
        assert_eq!(cats, vec!["Buying guide", "Maintenance", "Design"]);
        assert_eq!(category_count(&articles, "Buying guide"), 2);
        assert_eq!(category_count(&articles, "Nope"), 0);
    }

    #[test]
    fn test_filter_articles_single_dimension() {
        let articles = sample::articles();
        let all = filter_articles(&articles, &Selection::All);
        assert_eq!(all.len(), articles.len());
        let design = filter_articles(&articles, &Selection::Only("Design".to_string()));
        assert_eq!(design.len(), 1);
        assert_eq!(design[0].category.as_deref(), Some("Design"));
    }

    fn arb_state() -> impl Strategy<Value = FilterState> {
        (
            proptest::option::of(0usize..4),
            proptest::option::of(0usize..4),
            0usize..40,
        )
            .prop_map(|(c, v, visible_count)| FilterState {
                category: c.map_or(Selection::All, |i| Selection::Only(WorkCategory::ALL[i])),
                view: v.map_or(Selection::All, |i| Selection::Only(ViewCategory::ALL[i])),
                visible_count,
            })
    }

    proptest! {
        #[test]
        fn prop_page_is_bounded(s in arb_state(), take in 0usize..=24) {
            let all: Vec<WorkItem> = sample::works().into_iter().take(take).collect();
            let filtered = filter_works(&all, &s);
            let visible = page(&filtered, s.visible_count);
            prop_assert!(visible.len() <= s.visible_count);
            prop_assert!(visible.len() <= filtered.len());
            prop_assert_eq!(has_more(filtered.len(), s.visible_count), filtered.len() > visible.len());
        }

        #[test]
        fn prop_all_all_is_identity(take in 0usize..=24, visible_count in 0usize..40) {
            let all: Vec<WorkItem> = sample::works().into_iter().take(take).collect();
            let s = FilterState { visible_count, ..FilterState::new(GALLERY_PAGE_SIZE) };
            let filtered: Vec<WorkItem> = filter_works(&all, &s).into_iter().cloned().collect();
            prop_assert_eq!(filtered, all);
        }
    }
}
