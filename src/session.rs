//! Persistence of the last {category, query, sort} selection so a restarted
//! session resumes where it left off.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::filter::CategoryFilter;
use crate::pipeline::FilterState;
use crate::sort::SortKey;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedSession {
    pub category: CategoryFilter,
    pub query: String,
    pub sort: SortKey,
}

impl SavedSession {
    pub fn from_state(state: &FilterState) -> Self {
        Self {
            category: state.category.clone(),
            query: state.query.clone(),
            sort: state.sort,
        }
    }

    /// Restored selection on top of `base`, starting again from page 1.
    pub fn apply(&self, base: &FilterState) -> FilterState {
        FilterState {
            category: self.category.clone(),
            query: self.query.clone(),
            sort: self.sort,
            page: 1,
            page_size: base.page_size,
        }
    }
}

/// Missing or unreadable state yields the default session.
pub async fn load(path: &Path) -> SavedSession {
    match fs::read_to_string(path).await {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(target: "session", path = %path.display(), error = %e, "session state unreadable, using defaults");
            SavedSession::default()
        }),
        Err(_) => SavedSession::default(),
    }
}

/// Best effort; failures are logged.
pub async fn save(path: &Path, s: &SavedSession) {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            tracing::warn!(target: "session", "state dir: {e:#}");
        }
    }
    let body = match serde_json::to_vec_pretty(s) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(target: "session", "encode state: {e:#}");
            return;
        }
    };
    if let Err(e) = fs::write(path, body).await {
        tracing::warn!(target: "session", "write state: {e:#}");
    }
}
