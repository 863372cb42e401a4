//! Aggregate result of one batch-coordinator invocation.

use serde::Serialize;

use crate::pipeline::{ContentItem, ItemStatus};

/// Counters plus the ordered list of terminal items for one run. Created at
/// batch start, mutated only by the coordinator, returned by value once the
/// batch completes.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub published: usize,
    pub failed: usize,
    /// Published without a featured image.
    pub image_skipped: usize,
    /// Published without a social announcement.
    pub tweet_skipped: usize,
    pub items: Vec<ContentItem>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one terminal item into the counters. The per-item record keeps
    /// the full distinction between full, degraded and failed outcomes; the
    /// counters are only the top-line summary.
    pub(crate) fn record(&mut self, item: ContentItem) {
        self.fetched += 1;
        if item.is_published() {
            self.published += 1;
        } else {
            self.failed += 1;
        }
        if item.is_published() && item.image_skipped {
            self.image_skipped += 1;
        }
        if item.is_published() && item.tweet_skipped {
            self.tweet_skipped += 1;
        }
        self.items.push(item);
    }

    /// Items that ended in `Failed(stage)`, with the failing stage.
    pub fn failures(&self) -> impl Iterator<Item = &ContentItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.status, ItemStatus::Failed(_)))
    }

    /// One-line summary for logs and CLI output.
    pub fn summary(&self) -> String {
        format!(
            "fetched {} / published {} / failed {} (no image: {}, no announcement: {})",
            self.fetched, self.published, self.failed, self.image_skipped, self.tweet_skipped
        )
    }
}
