use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type WorkId = i64;
pub type ArticleId = i64;

/// Presentation data for a category id. The filtering core never looks inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetadata {
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownCategory {
    pub kind: &'static str,
    pub value: String,
}

/// Kind of construction shown in a portfolio image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkCategory {
    Warehouse,
    Roof,
    Carport,
    Shop,
}

impl WorkCategory {
    pub const ALL: [WorkCategory; 4] = [Self::Warehouse, Self::Roof, Self::Carport, Self::Shop];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Roof => "roof",
            Self::Carport => "carport",
            Self::Shop => "shop",
        }
    }

    pub fn metadata(self) -> DisplayMetadata {
        match self {
            Self::Warehouse => DisplayMetadata {
                label: "Prefab warehouse",
                description: "High quality prefabricated warehouses for storage, stock and factories",
                icon: "Warehouse",
            },
            Self::Roof => DisplayMetadata {
                label: "Multi-purpose roof",
                description: "Durable steel-frame roofs against sun and rain",
                icon: "Home",
            },
            Self::Carport => DisplayMetadata {
                label: "Carport",
                description: "Carport roofs designed to fit the site, installed quickly",
                icon: "Car",
            },
            Self::Shop => DisplayMetadata {
                label: "Multi-purpose shop",
                description: "Prefabricated shops ready to open for business",
                icon: "Store",
            },
        }
    }
}

impl fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory {
                kind: "work category",
                value: s.to_string(),
            })
    }
}

/// Photographic perspective of a portfolio image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewCategory {
    Exterior,
    Interior,
    Structure,
    Design,
}

impl ViewCategory {
    pub const ALL: [ViewCategory; 4] = [
        Self::Exterior,
        Self::Interior,
        Self::Structure,
        Self::Design,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exterior => "exterior",
            Self::Interior => "interior",
            Self::Structure => "structure",
            Self::Design => "design",
        }
    }

    pub fn metadata(self) -> DisplayMetadata {
        match self {
            Self::Exterior => DisplayMetadata {
                label: "Exterior",
                description: "Finished warehouses seen from outside",
                icon: "Building2",
            },
            Self::Interior => DisplayMetadata {
                label: "Interior",
                description: "Ready-to-use interiors",
                icon: "Eye",
            },
            Self::Structure => DisplayMetadata {
                label: "Structure",
                description: "Steel structure installation work",
                icon: "Layers",
            },
            Self::Design => DisplayMetadata {
                label: "3D design",
                description: "3D designs prepared for customers",
                icon: "Ruler",
            },
        }
    }
}

impl fmt::Display for ViewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory {
                kind: "view category",
                value: s.to_string(),
            })
    }
}

/// A filter dimension: either everything, or a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T: Clone + PartialEq> Selection<T> {
    /// Step through `All, options[0], .., options[n-1]` and wrap around.
    /// A selection that is no longer among `options` restarts from `All`.
    pub fn cycle(&self, options: &[T], forward: bool) -> Self {
        if options.is_empty() {
            return Self::All;
        }
        let position = match self {
            Self::All => None,
            Self::Only(current) => options.iter().position(|o| o == current),
        };
        let next = match (position, forward) {
            (None, true) => Some(0),
            (None, false) => Some(options.len() - 1),
            (Some(i), true) if i + 1 < options.len() => Some(i + 1),
            (Some(_), true) => None,
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
        };
        match next {
            Some(i) => Self::Only(options[i].clone()),
            None => Self::All,
        }
    }
}

/// One portfolio image from the `works` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkId,
    pub image_ref: String,
    pub category: WorkCategory,
    pub view_category: ViewCategory,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update applied by the admin edit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPatch {
    pub category: WorkCategory,
    pub view_category: ViewCategory,
}

impl WorkItem {
    pub fn apply(&mut self, patch: WorkPatch) {
        self.category = patch.category;
        self.view_category = patch.view_category;
    }
}

/// An article row. `content` is rich HTML written in the admin editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleItem {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    pub category: Option<String>,
    pub excerpt: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub author: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub view_count: i64,
}

impl ArticleItem {
    /// Date shown on cards: publish date, falling back to creation date.
    pub fn display_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    /// Category with blank values treated as uncategorised.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_str() {
        for cat in WorkCategory::ALL {
            assert_eq!(cat.as_str().parse::<WorkCategory>(), Ok(cat));
        }
        for view in ViewCategory::ALL {
            assert_eq!(view.as_str().parse::<ViewCategory>(), Ok(view));
        }
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = "garage".parse::<WorkCategory>().unwrap_err();
        assert_eq!(err.value, "garage");
        assert!(err.to_string().contains("work category"));
        assert!("Exterior".parse::<ViewCategory>().is_err());
    }

    #[test]
    fn test_selection_matches() {
        let all: Selection<WorkCategory> = Selection::All;
        assert!(all.matches(&WorkCategory::Roof));
        let only = Selection::Only(WorkCategory::Shop);
        assert!(only.matches(&WorkCategory::Shop));
        assert!(!only.matches(&WorkCategory::Roof));
    }

    #[test]
    fn test_selection_cycle_wraps_through_all() {
        let options = WorkCategory::ALL;
        let mut sel = Selection::All;
        let mut seen = Vec::new();
        for _ in 0..5 {
            sel = sel.cycle(&options, true);
            seen.push(sel.clone());
        }
        assert_eq!(seen[0], Selection::Only(WorkCategory::Warehouse));
        assert_eq!(seen[3], Selection::Only(WorkCategory::Shop));
        assert_eq!(seen[4], Selection::All);

        assert_eq!(
            Selection::All.cycle(&options, false),
            Selection::Only(WorkCategory::Shop)
        );
        assert_eq!(
            Selection::Only(WorkCategory::Warehouse).cycle(&options, false),
            Selection::All
        );
    }

    #[test]
    fn test_selection_cycle_with_stale_value() {
        let options = vec!["news".to_string(), "tips".to_string()];
        let stale = Selection::Only("gone".to_string());
        assert_eq!(stale.cycle(&options, true), Selection::Only("news".to_string()));
        assert_eq!(stale.cycle(&[], true), Selection::All);
    }

    #[test]
    fn test_article_blank_category_is_uncategorised() {
        let article = ArticleItem {
            id: 1,
            title: "t".into(),
            slug: "t".into(),
            category: Some("  ".into()),
            excerpt: String::new(),
            content: String::new(),
            image_ref: None,
            author: None,
            published: true,
            published_at: None,
            created_at: Utc::now(),
            view_count: 0,
        };
        assert_eq!(article.category_name(), None);
        assert_eq!(article.display_date(), article.created_at);
    }
}
