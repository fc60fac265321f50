//! # Item Store
//! Holds the current snapshot of loaded items. A load swaps the whole snapshot;
//! readers keep whatever `Arc<Snapshot>` they already hold.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::item::{ItemId, NewsItem};

/// Where a snapshot came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Origin {
    Source(String),
    Mock,
}

impl Origin {
    /// Loaded from a configured source rather than the embedded mock set.
    pub fn is_real(&self) -> bool {
        matches!(self, Origin::Source(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Origin::Source(name) => name,
            Origin::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub items: Vec<NewsItem>,
    pub origin: Origin,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(items: Vec<NewsItem>, origin: Origin, loaded_at: DateTime<Utc>) -> Self {
        Self {
            items,
            origin,
            loaded_at,
        }
    }

    pub fn ids(&self) -> HashSet<&ItemId> {
        self.items.iter().map(|it| &it.id).collect()
    }
}

/// Shared, cloneable handle to the current snapshot.
#[derive(Clone, Default)]
pub struct ItemStore {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
    pending_new: Arc<AtomicUsize>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the snapshot. Clears the pending-update count.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snap = Arc::new(snapshot);
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(snap.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(snap.clone()),
        }
        self.pending_new.store(0, Ordering::Relaxed);
        snap
    }

    pub fn len(&self) -> usize {
        self.current().map_or(0, |s| s.items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items seen upstream but not yet loaded, as reported by the update check.
    pub fn pending_new(&self) -> usize {
        self.pending_new.load(Ordering::Relaxed)
    }

    pub fn set_pending_new(&self, n: usize) {
        self.pending_new.store(n, Ordering::Relaxed);
    }
}
