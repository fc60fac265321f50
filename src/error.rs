use thiserror::Error;

/// Why no item sequence could be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("no data sources configured and mock fallback disabled")]
    NoSources,

    #[error("all {attempted} data sources failed (last: {last})")]
    AllSourcesFailed { attempted: usize, last: String },
}

impl LoadError {
    /// Hint shown next to the failure; every load failure can be retried.
    pub fn retry_hint(&self) -> &'static str {
        "Loading failed, please retry"
    }
}
