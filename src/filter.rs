//! # Category Filter
//! Narrows items to the category requested by the query surface. `"all"` is
//! the wildcard; an unknown category key is kept as-is and matches nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::item::{Category, NewsItem};

/// Requested category. Serialized as the plain key string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
    Unknown(String),
}

impl CategoryFilter {
    /// Empty input and `"all"` (any case) select everything.
    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase();
        if key.is_empty() || key == "all" {
            return CategoryFilter::All;
        }
        match Category::parse(&key) {
            Some(c) => CategoryFilter::Only(c),
            None => CategoryFilter::Unknown(key),
        }
    }

    pub fn matches(&self, item: &NewsItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => item.category == *c,
            CategoryFilter::Unknown(_) => false,
        }
    }

    /// True for anything narrower than `All`.
    pub fn is_active(&self) -> bool {
        !matches!(self, CategoryFilter::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(c) => c.as_str(),
            CategoryFilter::Unknown(s) => s,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(s: String) -> Self {
        CategoryFilter::parse(&s)
    }
}

impl From<CategoryFilter> for String {
    fn from(c: CategoryFilter) -> Self {
        c.as_str().to_string()
    }
}

impl From<Category> for CategoryFilter {
    fn from(c: Category) -> Self {
        CategoryFilter::Only(c)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category step of the pipeline. `All` passes the input through untouched.
pub fn filter_by_category<'a>(items: &'a [NewsItem], filter: &CategoryFilter) -> Vec<&'a NewsItem> {
    match filter {
        CategoryFilter::All => items.iter().collect(),
        _ => items.iter().filter(|it| filter.matches(it)).collect(),
    }
}
