//! Fixed inter-call delays for sequential provider runs.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// A provider plus the gap to leave after each call to it.
pub struct Paced<S: ?Sized> {
    pub source: Arc<S>,
    pub gap: Duration,
}

impl<S: ?Sized> Paced<S> {
    pub fn new(source: Arc<S>, gap: Duration) -> Self {
        Self { source, gap }
    }

    /// Wait after call `index` of `total`, unless it was the last one.
    pub async fn pause_after(&self, index: usize, total: usize) {
        pause_between(index, total, self.gap).await;
    }
}

impl<S: ?Sized> Clone for Paced<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            gap: self.gap,
        }
    }
}

/// Sleep `gap` after call `index` (0-based) of a run of `total` calls. The gap is paid
/// whether the call succeeded or not; nothing is paid after the last call.
pub async fn pause_between(index: usize, total: usize, gap: Duration) {
    if index + 1 >= total || gap.is_zero() {
        return;
    }
    debug!("Waiting {}ms for rate limit", gap.as_millis());
    sleep(gap).await;
}
