//! Demo content used by `works-explorer seed` and by the tests.

use crate::model::{ArticleItem, ViewCategory, WorkCategory, WorkItem};
use chrono::{DateTime, Duration, TimeZone, Utc};

const IMAGE_BASE: &str = "https://res.cloudinary.com/demo/image/upload/v1718000000/sp-warehouse/works";

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// 24 active works, newest first: 12 warehouses and 4 each of the others.
pub fn works() -> Vec<WorkItem> {
    const OTHERS: [WorkCategory; 3] = [WorkCategory::Roof, WorkCategory::Carport, WorkCategory::Shop];
    (0..24usize)
        .map(|i| {
            let category = if i % 2 == 0 {
                WorkCategory::Warehouse
            } else {
                OTHERS[(i / 2) % 3]
            };
            let view_category = ViewCategory::ALL[(i / 2) % 4];
            WorkItem {
                id: i as i64 + 1,
                image_ref: format!("{IMAGE_BASE}/{}-{:02}.jpg", category.as_str(), i + 1),
                category,
                view_category,
                active: true,
                created_at: base_time() - Duration::hours(i as i64),
            }
        })
        .collect()
}

fn article(
    id: i64,
    title: &str,
    slug: &str,
    category: Option<&str>,
    days_ago: Option<i64>,
    view_count: i64,
) -> ArticleItem {
    let published_at = days_ago.map(|d| base_time() - Duration::days(d));
    ArticleItem {
        id,
        title: title.to_string(),
        slug: slug.to_string(),
        category: category.map(str::to_string),
        excerpt: format!("{title}: what to know before you start."),
        content: format!(
            "<h2>{title}</h2><p>Steel frame warehouses go up in weeks.</p>\
             <ul><li>Measure the site</li><li>Pick a size</li></ul><p>Call us &amp; ask.</p>"
        ),
        image_ref: Some(format!("{IMAGE_BASE}/article-{id}.jpg")),
        author: Some("SP Warehouse".to_string()),
        published: days_ago.is_some(),
        published_at,
        created_at: base_time() - Duration::days(days_ago.unwrap_or(0) + 1),
        view_count,
    }
}

/// Articles ordered by publish date, newest first. The last one is a draft.
pub fn articles() -> Vec<ArticleItem> {
    vec![
        article(1, "Choosing a warehouse size", "choosing-a-warehouse-size", Some("Buying guide"), Some(0), 120),
        article(2, "Caring for a steel roof", "caring-for-a-steel-roof", Some("Maintenance"), Some(12), 45),
        article(3, "Prefab versus concrete", "prefab-versus-concrete", Some("Buying guide"), Some(30), 300),
        article(4, "Company news", "company-news", None, Some(47), 10),
        article(5, "Planning a 3D layout", "planning-a-3d-layout", Some("Design"), Some(92), 75),
        article(6, "Repainting a carport", "repainting-a-carport", Some("Maintenance"), None, 0),
    ]
}
