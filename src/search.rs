//! # Search
//! Case-insensitive literal substring search over a configurable set of item
//! fields, plus match highlighting for display.

use regex::RegexBuilder;

use crate::item::{Field, FieldValue, NewsItem};

/// Fields searched when the config doesn't name any.
pub const DEFAULT_SEARCH_FIELDS: [Field; 3] = [Field::Title, Field::Summary, Field::Keywords];

/// A normalized query. Blank input is the empty query, which matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    needle: Option<String>,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        let t = raw.trim();
        Self {
            needle: (!t.is_empty()).then(|| t.to_lowercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_none()
    }

    /// Lowercased needle, if any.
    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    /// At least one of `fields` contains the needle. List fields match on any element;
    /// numeric, time and missing fields never match.
    pub fn matches(&self, item: &NewsItem, fields: &[Field]) -> bool {
        let Some(needle) = self.needle.as_deref() else {
            return true;
        };
        fields.iter().any(|f| match f.get(item) {
            FieldValue::Text(s) => contains_ci(s, needle),
            FieldValue::List(list) => list.iter().any(|s| contains_ci(s, needle)),
            FieldValue::Number(_) | FieldValue::Time(_) | FieldValue::Missing => false,
        })
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Search step of the pipeline. An empty query passes the input through.
pub fn search<'a>(items: Vec<&'a NewsItem>, query: &SearchQuery, fields: &[Field]) -> Vec<&'a NewsItem> {
    if query.is_empty() {
        return items;
    }
    items.into_iter().filter(|it| query.matches(it, fields)).collect()
}

/// Wrap every case-insensitive occurrence of `query` in `open`/`close`.
/// Regex metacharacters in the query are matched literally.
pub fn highlight(text: &str, query: &str, open: &str, close: &str) -> String {
    let q = query.trim();
    if q.is_empty() {
        return text.to_string();
    }
    let re = match RegexBuilder::new(&regex::escape(q)).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(target: "search", error = %e, "highlight pattern rejected");
            return text.to_string();
        }
    };
    re.replace_all(text, |caps: &regex::Captures| format!("{open}{}{close}", &caps[0]))
        .into_owned()
}
