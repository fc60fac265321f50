use std::collections::HashSet;

use crate::ingest::types::RawNewsItem;

/// Titles whose normalized Levenshtein similarity exceeds this are duplicates.
pub const TITLE_SIMILARITY: f64 = 0.75;

fn similar_titles(a: &str, b: &str) -> bool {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()) > TITLE_SIMILARITY
}

/// Drop repeated URLs and near-identical titles. Of two similar titles the
/// more important one survives; the first seen wins ties.
pub fn dedup(items: Vec<RawNewsItem>) -> Vec<RawNewsItem> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut unique: Vec<RawNewsItem> = Vec::with_capacity(items.len());

    for item in items {
        if let Some(url) = item.url.as_deref() {
            if seen_urls.contains(url) {
                continue;
            }
        }

        let title = item.title.as_deref().unwrap_or_default();
        if let Some(pos) = unique
            .iter()
            .position(|u| similar_titles(title, u.title.as_deref().unwrap_or_default()))
        {
            let incoming = item.importance.unwrap_or(f64::MIN);
            let existing = unique[pos].importance.unwrap_or(f64::MIN);
            if incoming <= existing {
                continue;
            }
            unique.remove(pos);
        }

        if let Some(url) = item.url.clone() {
            seen_urls.insert(url);
        }
        unique.push(item);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, url: &str, score: f64) -> RawNewsItem {
        RawNewsItem {
            title: Some(title.into()),
            url: Some(url.into()),
            importance: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn same_url_is_dropped() {
        let out = dedup(vec![raw("One", "u1", 5.0), raw("Completely different", "u1", 9.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title.as_deref(), Some("One"));
    }

    #[test]
    fn similar_title_keeps_more_important() {
        let out = dedup(vec![
            raw("OpenAI releases GPT-5 today", "u1", 7.0),
            raw("OpenAI releases GPT-5 today!", "u2", 9.0),
            raw("OpenAI release GPT-5 today", "u3", 6.0),
            raw("Nvidia ships new GPU", "u4", 8.0),
        ]);
        let titles: Vec<_> = out.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, ["OpenAI releases GPT-5 today!", "Nvidia ships new GPU"]);
    }
}
