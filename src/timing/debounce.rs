use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Collapses a burst of calls into one callback invocation, `delay` after the
/// last call. Each call supersedes the pending one and only the latest value
/// is delivered. Dropping the debouncer cancels a pending invocation.
///
/// Must be used from within a tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    callback: Callback<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            callback: Arc::new(callback),
            pending: None,
        }
    }

    pub fn call(&mut self, value: T) {
        self.cancel();
        let delay = self.delay;
        let cb = Arc::clone(&self.callback);
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            cb(value);
        }));
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&mut self) {
        if let Some(h) = self.pending.take() {
            h.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(h) = self.pending.take() {
            h.abort();
        }
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
