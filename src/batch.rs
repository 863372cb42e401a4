//! Batch coordinator: drives the per-item state machine over one or more
//! topical groups with inter-item and inter-group pacing.
//!
//! Scheduling is single-flight and sequential by design — at most one
//! outstanding call to any external service at a time, with explicit bounded
//! sleeps between items and groups for rate-limit compliance. Items within a
//! group are processed in source order; groups in caller order.
//!
//! A failed item is recorded and the batch moves on; no error originating
//! from one item's processing escapes into the coordinator's control flow.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::contract::{Candidate, CmsClient, ContentSource, Enhancer, ImageSource, SocialClient};
use crate::pipeline::{CategoryCache, ContentItem, ItemPipeline};
use crate::report::RunReport;

/// Mutable state shared across the items of one run: the report, the
/// category cache, and the set of keys already processed.
struct RunState {
    report: RunReport,
    categories: CategoryCache,
    seen: HashSet<String>,
}

impl RunState {
    fn new() -> Self {
        RunState {
            report: RunReport::new(),
            categories: CategoryCache::new(),
            seen: HashSet::new(),
        }
    }
}

/// Owns the adapters and configuration for the lifetime of the process; each
/// `run_*` call is one independent in-memory batch.
pub struct Coordinator<S, I, E, C, X>
where
    S: ContentSource,
    I: ImageSource,
    E: Enhancer,
    C: CmsClient,
    X: SocialClient,
{
    config: BotConfig,
    source: S,
    images: I,
    enhancer: E,
    cms: C,
    social: Option<X>,
}

impl<S, I, E, C, X> Coordinator<S, I, E, C, X>
where
    S: ContentSource,
    I: ImageSource,
    E: Enhancer,
    C: CmsClient,
    X: SocialClient,
{
    pub fn new(
        config: BotConfig,
        source: S,
        images: I,
        enhancer: E,
        cms: C,
        social: Option<X>,
    ) -> Self {
        Coordinator {
            config,
            source,
            images,
            enhancer,
            cms,
            social,
        }
    }

    fn pipeline(&self) -> ItemPipeline<'_, I, E, C, X> {
        ItemPipeline {
            config: &self.config,
            images: &self.images,
            enhancer: &self.enhancer,
            cms: &self.cms,
            social: self.social.as_ref(),
        }
    }

    /// Single-group run: N candidates fetched for one label.
    pub async fn run_group(&self, label: &str, max_articles: usize) -> RunReport {
        info!(group = label, max_articles, "starting single-group run");
        let mut run = RunState::new();
        self.publish_group(label, max_articles, &mut run).await;
        info!(group = label, summary = %run.report.summary(), "single-group run complete");
        run.report
    }

    /// Multi-group run: groups processed sequentially, not interleaved, with
    /// a longer pause at each group boundary. The category cache spans the
    /// whole run.
    pub async fn run_groups(&self, labels: &[String], per_group: usize) -> RunReport {
        info!(groups = labels.len(), per_group, "starting multi-group run");
        let mut run = RunState::new();
        for (idx, label) in labels.iter().enumerate() {
            info!(group = %label, position = idx + 1, total = labels.len(), "starting group");
            self.publish_group(label, per_group, &mut run).await;
            if idx + 1 < labels.len() {
                debug!(
                    secs = self.config.group_delay.as_secs(),
                    "pacing before next group"
                );
                tokio::time::sleep(self.config.group_delay).await;
            }
        }
        info!(summary = %run.report.summary(), "multi-group run complete");
        run.report
    }

    /// Trending run: one unlabeled pool of candidates; the content source
    /// assigns a default group label, which the category cache still keys on.
    pub async fn run_trending(&self, max_articles: usize) -> RunReport {
        info!(max_articles, "starting trending run");
        let mut run = RunState::new();
        let candidates = match self.source.fetch_trending(max_articles).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "trending fetch produced no candidates");
                Vec::new()
            }
        };
        self.publish_candidates(candidates, &mut run).await;
        info!(summary = %run.report.summary(), "trending run complete");
        run.report
    }

    /// Fetch one group's candidates and process them. An empty or failed
    /// fetch contributes zero items and processing continues with the next
    /// group.
    async fn publish_group(&self, label: &str, max_articles: usize, run: &mut RunState) {
        let candidates = match self.source.fetch(label, max_articles).await {
            Ok(candidates) if candidates.is_empty() => {
                warn!(group = label, "content source returned no candidates");
                Vec::new()
            }
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(group = label, error = %e, "fetch failed, group contributes zero items");
                Vec::new()
            }
        };
        info!(group = label, count = candidates.len(), "fetched candidates");
        self.publish_candidates(candidates, run).await;
    }

    /// Drive the state machine over candidates in source order, pacing
    /// between items. Failure isolation lives in the pipeline: `process`
    /// never returns an error.
    async fn publish_candidates(&self, candidates: Vec<Candidate>, run: &mut RunState) {
        let total = candidates.len();
        let pipeline = self.pipeline();
        for (idx, candidate) in candidates.into_iter().enumerate() {
            let mut item = ContentItem::from_candidate(candidate);
            if !run.seen.insert(item.key.clone()) {
                debug!(key = %item.key, "duplicate candidate within run, skipping");
                continue;
            }
            info!(item = idx + 1, total, title = %item.raw_title, "processing candidate");
            pipeline.process(&mut item, &mut run.categories).await;
            run.report.record(item);
            if idx + 1 < total {
                debug!(
                    secs = self.config.item_delay.as_secs(),
                    "pacing before next item"
                );
                tokio::time::sleep(self.config.item_delay).await;
            }
        }
    }
}
