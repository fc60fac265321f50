//! Cooperative timing helpers for the interactive feed: a debouncer for search
//! input and a throttle for scroll-driven paging.

pub mod debounce;
pub mod throttle;

pub use debounce::Debouncer;
pub use throttle::Throttle;
