use crate::model::ArticleItem;
use crate::source::{ArticleSource, SourceError};
use regex::Regex;
use std::sync::LazyLock;

pub const RELATED_LIMIT: usize = 4;

/// Which tab is selected in the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Content,
    Related,
}

impl DetailTab {
    pub fn next(self) -> Self {
        match self {
            Self::Content => Self::Related,
            Self::Related => Self::Content,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Content => "Article",
            Self::Related => "Related",
        }
    }

    pub const ALL: [DetailTab; 2] = [Self::Content, Self::Related];
}

/// Pick up to `limit` articles to suggest next to `current`.
///
/// Same-category articles come first, most viewed first; the rest is filled
/// with the most viewed articles of any category. Ties go to the newer one.
pub fn pick_related(published: &[ArticleItem], current: &ArticleItem, limit: usize) -> Vec<ArticleItem> {
    let mut candidates: Vec<&ArticleItem> = published
        .iter()
        .filter(|a| a.slug != current.slug)
        .collect();
    candidates.sort_by(|a, b| {
        b.view_count
            .cmp(&a.view_count)
            .then_with(|| b.display_date().cmp(&a.display_date()))
    });

    let category = current.category_name();
    let (same, other): (Vec<&ArticleItem>, Vec<&ArticleItem>) = candidates
        .into_iter()
        .partition(|a| category.is_some() && a.category_name() == category);

    same.into_iter()
        .chain(other)
        .take(limit)
        .cloned()
        .collect()
}

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|ul|ol|blockquote)>").expect("static pattern compiles")
});
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li[^>]*>").expect("static pattern compiles"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static pattern compiles"));
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(\s*\n)+").expect("static pattern compiles"));

/// Render editor HTML as plain text for the terminal.
pub fn html_to_text(html: &str) -> String {
    let text = BLOCK_END.replace_all(html, "\n");
    let text = LIST_ITEM.replace_all(&text, "• ");
    let text = ANY_TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

/// An opened article with its related suggestions.
pub struct ArticleDetail {
    pub article: ArticleItem,
    pub related: Vec<ArticleItem>,
    pub body: String,
    pub tab: DetailTab,
    pub scroll: u16,
    pub related_selected: usize,
}

impl ArticleDetail {
    pub async fn open<S: ArticleSource>(source: &S, slug: &str) -> Result<Option<Self>, SourceError> {
        let Some(article) = source.article_by_slug(slug).await? else {
            return Ok(None);
        };
        let published = source.fetch_published_articles().await?;
        let related = pick_related(&published, &article, RELATED_LIMIT);
        Ok(Some(Self {
            body: html_to_text(&article.content),
            article,
            related,
            tab: DetailTab::Content,
            scroll: 0,
            related_selected: 0,
        }))
    }

    /// Count this view. The local count moves first; the store update is
    /// returned for the caller to log, and a failure is not rolled back.
    pub async fn record_view<S: ArticleSource>(&mut self, source: &S) -> Result<(), SourceError> {
        self.article.view_count += 1;
        source.increment_view_count(self.article.id).await
    }

    pub fn selected_related(&self) -> Option<&ArticleItem> {
        self.related.get(self.related_selected)
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll = self.scroll.saturating_add(20);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(20);
    }

    pub fn related_next(&mut self) {
        if self.related_selected + 1 < self.related.len() {
            self.related_selected += 1;
        }
    }

    pub fn related_prev(&mut self) {
        self.related_selected = self.related_selected.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use crate::source::memory::MemorySource;

    fn published() -> Vec<ArticleItem> {
        sample::articles().into_iter().filter(|a| a.published).collect()
    }

    #[test]
    fn test_related_prefers_same_category_then_popularity() {
        let all = published();
        let current = all.iter().find(|a| a.slug == "choosing-a-warehouse-size").unwrap();
        let related = pick_related(&all, current, RELATED_LIMIT);
        let slugs: Vec<&str> = related.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec![
                "prefab-versus-concrete",
                "planning-a-3d-layout",
                "caring-for-a-steel-roof",
                "company-news"
            ]
        );
    }

    #[test]
    fn test_related_excludes_current_and_respects_limit() {
        let all = published();
        let current = all.iter().find(|a| a.slug == "company-news").unwrap();
        let related = pick_related(&all, current, 2);
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|a| a.slug != current.slug));
        // uncategorised: pure popularity order
        assert_eq!(related[0].slug, "prefab-versus-concrete");
        assert_eq!(related[1].slug, "choosing-a-warehouse-size");
    }

    #[test]
    fn test_related_with_single_article() {
        let all = published();
        let only = vec![all[0].clone()];
        assert!(pick_related(&only, &all[0], RELATED_LIMIT).is_empty());
    }

    #[test]
    fn test_html_to_text() {
        let html = "<h2>Title</h2><p>First &amp; second</p><ul><li>One</li><li>Two</li></ul><p>a<br/>b</p>";
        let text = html_to_text(html);
        assert_eq!(text, "Title\nFirst & second\n• One\n• Two\n\na\nb");
        assert_eq!(html_to_text("<p></p>\n\n\n<p>x</p>"), "x");
    }

    #[tokio::test]
    async fn test_open_and_record_view() {
        let source = MemorySource::with_articles(sample::articles());
        let mut detail = ArticleDetail::open(&source, "caring-for-a-steel-roof")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.related.len(), RELATED_LIMIT);
        assert!(detail.related.iter().all(|a| a.published));
        assert!(detail.body.contains("Measure the site"));

        detail.record_view(&source).await.unwrap();
        assert_eq!(detail.article.view_count, 46);
        assert_eq!(source.articles.borrow()[1].view_count, 46);
    }

    #[tokio::test]
    async fn test_failed_view_count_is_reported_not_swallowed() {
        let source = MemorySource::with_articles(sample::articles());
        source.fail_view_count.set(true);
        let mut detail = ArticleDetail::open(&source, "company-news").await.unwrap().unwrap();
        let result = detail.record_view(&source).await;
        assert!(result.is_err());
        assert_eq!(detail.article.view_count, 11);
    }

    #[tokio::test]
    async fn test_open_missing_slug() {
        let source = MemorySource::with_articles(sample::articles());
        assert!(ArticleDetail::open(&source, "nope").await.unwrap().is_none());
    }
}
