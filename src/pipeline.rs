//! Per-item state machine: drives one candidate from raw text to a
//! published, optionally announced article.
//!
//! Stage order is fixed: resolve image, enhance content, upload media,
//! resolve category, create article, announce. Only two stages are fatal —
//! enhancement (no article without a body) and article creation (the
//! terminal goal). Everything else is best-effort: "published without image"
//! and "published without announcement" are first-class successful outcomes,
//! recorded as skip markers rather than failures.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::BotConfig;
use crate::contract::{
    ArticleDraft, Candidate, CmsClient, EnhanceContext, Enhancer, ImageRef, ImageSource,
    Orientation, PostRef, ServiceError, SocialClient, SocialRef,
};

/// One discrete operation in the per-item pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Image,
    Enhance,
    UploadMedia,
    Category,
    Publish,
    Announce,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Image => "image",
            Stage::Enhance => "enhance",
            Stage::UploadMedia => "upload_media",
            Stage::Category => "category",
            Stage::Publish => "publish",
            Stage::Announce => "announce",
        }
    }
}

/// Forward-only lifecycle states. `Failed` is terminal; skip markers live on
/// the item itself and do not halt progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemStatus {
    Candidate,
    ImageResolved,
    ContentEnhanced,
    MediaUploaded,
    CategoryResolved,
    Published,
    Announced,
    Failed(Stage),
}

/// One recorded stage failure. The list on the item is append-only.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub reason: String,
}

/// One candidate article moving through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    /// Stable key (source URL or generated UUID); prevents reprocessing
    /// within a run.
    pub key: String,
    pub raw_title: String,
    pub raw_body: String,
    pub source_url: Option<String>,
    pub group: String,
    pub image: Option<ImageRef>,
    pub enhanced_body: Option<String>,
    pub excerpt: Option<String>,
    pub media_id: Option<i64>,
    pub category_id: Option<i64>,
    pub post: Option<PostRef>,
    pub social_post: Option<SocialRef>,
    pub status: ItemStatus,
    /// Published without a featured image (resolution or upload degraded).
    pub image_skipped: bool,
    /// Published without a social announcement.
    pub tweet_skipped: bool,
    pub errors: Vec<StageError>,
}

impl ContentItem {
    pub fn from_candidate(candidate: Candidate) -> Self {
        let key = match &candidate.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => Uuid::new_v4().to_string(),
        };
        ContentItem {
            key,
            raw_title: candidate.title,
            raw_body: candidate.body,
            source_url: candidate.url.filter(|u| !u.is_empty()),
            group: candidate.group,
            image: None,
            enhanced_body: None,
            excerpt: None,
            media_id: None,
            category_id: None,
            post: None,
            social_post: None,
            status: ItemStatus::Candidate,
            image_skipped: false,
            tweet_skipped: false,
            errors: Vec::new(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.post.is_some()
    }

    /// Record a fatal stage failure and halt progression.
    fn fail(&mut self, stage: Stage, reason: String) {
        self.errors.push(StageError { stage, reason });
        self.status = ItemStatus::Failed(stage);
    }

    /// Record a non-fatal stage failure; progression continues.
    fn degrade(&mut self, stage: Stage, reason: String) {
        self.errors.push(StageError { stage, reason });
    }
}

/// Per-run category-id cache: at most one resolve-or-create call per
/// distinct group label per batch run.
#[derive(Debug, Default)]
pub struct CategoryCache {
    ids: HashMap<String, i64>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve<C>(&mut self, cms: &C, label: &str) -> Result<i64, ServiceError>
    where
        C: CmsClient + ?Sized,
    {
        if let Some(id) = self.ids.get(label) {
            debug!(label, category_id = id, "category cache hit");
            return Ok(*id);
        }
        let id = cms.resolve_or_create_category(label).await?;
        info!(label, category_id = id, "category resolved");
        self.ids.insert(label.to_string(), id);
        Ok(id)
    }
}

/// Fixed space reserved for the appended link in announcements (short links
/// plus separator).
pub const LINK_BUDGET: usize = 24;

/// Extract up to three significant keywords from a title, dropping stop
/// words and anything shorter than four characters.
pub fn keywords_from_title(title: &str) -> String {
    const STOP_WORDS: &[&str] = &[
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    ];
    title
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 3 && !STOP_WORDS.contains(w))
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Compose the final announcement: draft text plus the article link, never
/// exceeding `max_chars` in total. Enforced here regardless of how long a
/// draft the upstream text service returned.
pub fn compose_announcement(draft: &str, link: &str, max_chars: usize) -> String {
    let available = max_chars.saturating_sub(LINK_BUDGET);
    let text = truncate_with_ellipsis(draft.trim(), available);
    let announcement = format!("{text}\n\n{link}");
    if announcement.chars().count() <= max_chars {
        return announcement;
    }
    // Budget overshoot with the actual link length: keep the link intact and
    // trim the text further.
    let keep = max_chars.saturating_sub(link.chars().count() + 2);
    let text = truncate_with_ellipsis(&text, keep);
    format!("{text}\n\n{link}")
}

/// Fallback excerpt when summarisation is unavailable: leading slice of the
/// raw body.
fn fallback_excerpt(body: &str) -> String {
    if body.chars().count() > 200 {
        let head: String = body.chars().take(200).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

/// The per-item state machine, borrowing the adapters and config for the
/// duration of a batch.
pub struct ItemPipeline<'a, I, E, C, X>
where
    I: ImageSource,
    E: Enhancer,
    C: CmsClient,
    X: SocialClient,
{
    pub config: &'a BotConfig,
    pub images: &'a I,
    pub enhancer: &'a E,
    pub cms: &'a C,
    pub social: Option<&'a X>,
}

impl<'a, I, E, C, X> ItemPipeline<'a, I, E, C, X>
where
    I: ImageSource,
    E: Enhancer,
    C: CmsClient,
    X: SocialClient,
{
    /// Drive one item through all stages. Never returns an error: fatal
    /// stage failures terminate the item, not the batch. Re-running an
    /// already-published item is a no-op.
    pub async fn process(&self, item: &mut ContentItem, categories: &mut CategoryCache) {
        if item.is_published() {
            debug!(key = %item.key, "item already published, nothing to do");
            return;
        }
        if matches!(item.status, ItemStatus::Failed(_)) {
            debug!(key = %item.key, status = ?item.status, "item already terminal");
            return;
        }

        info!(title = %item.raw_title, group = %item.group, "processing item");

        self.resolve_image(item).await;
        if !self.enhance(item).await {
            return;
        }
        self.upload_media(item).await;
        if !self.resolve_category(item, categories).await {
            return;
        }
        if !self.publish(item).await {
            return;
        }
        self.announce(item).await;
    }

    /// Non-fatal: a missing image never discards an otherwise-valid article.
    async fn resolve_image(&self, item: &mut ContentItem) {
        if !self.config.include_images {
            debug!("image inclusion disabled, skipping resolution");
            item.status = ItemStatus::ImageResolved;
            return;
        }

        // Group label first, then significant keywords from the title.
        let mut queries = vec![item.group.clone()];
        let keywords = keywords_from_title(&item.raw_title);
        if !keywords.is_empty() {
            queries.push(keywords);
        }

        for query in &queries {
            match self.images.find(query, Orientation::Landscape).await {
                Ok(Some(image)) => {
                    info!(
                        query = %query,
                        attribution = image.attribution.as_deref().unwrap_or("unknown"),
                        "image resolved"
                    );
                    item.image = Some(image);
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(query = %query, error = %e, "image resolution failed, continuing without image");
                    item.degrade(Stage::Image, e.to_string());
                    break;
                }
            }
        }
        if item.image.is_none() {
            warn!(title = %item.raw_title, "no image found, continuing without image");
            item.image_skipped = true;
        }
        item.status = ItemStatus::ImageResolved;
    }

    /// Fatal: there is no article without an enhanced body.
    async fn enhance(&self, item: &mut ContentItem) -> bool {
        let ctx = EnhanceContext {
            group: Some(item.group.clone()),
            source_url: item.source_url.clone(),
            image_url: item.image.as_ref().map(|i| i.url.clone()),
            word_target: self.config.word_target,
        };
        match self.enhancer.enhance(&item.raw_title, &item.raw_body, &ctx).await {
            Ok(html) => {
                info!(title = %item.raw_title, "content enhanced");
                item.enhanced_body = Some(html);
                item.status = ItemStatus::ContentEnhanced;
                true
            }
            Err(e) => {
                error!(title = %item.raw_title, error = %e, "content enhancement failed, item excluded from publishing");
                item.fail(Stage::Enhance, e.to_string());
                false
            }
        }
    }

    /// Non-fatal: a failed upload leaves the article without a featured
    /// image.
    async fn upload_media(&self, item: &mut ContentItem) {
        if let Some(image) = item.image.clone() {
            match self.cms.upload_media(&image, &item.raw_title).await {
                Ok(media_id) => {
                    info!(media_id, "media uploaded to CMS");
                    item.media_id = Some(media_id);
                }
                Err(e) => {
                    warn!(error = %e, "media upload failed, continuing without featured image");
                    item.degrade(Stage::UploadMedia, e.to_string());
                    item.image_skipped = true;
                }
            }
        }
        item.status = ItemStatus::MediaUploaded;
    }

    /// Fatal: the CMS requires a category.
    async fn resolve_category(&self, item: &mut ContentItem, categories: &mut CategoryCache) -> bool {
        match categories.resolve(self.cms, &item.group).await {
            Ok(category_id) => {
                item.category_id = Some(category_id);
                item.status = ItemStatus::CategoryResolved;
                true
            }
            Err(e) => {
                error!(group = %item.group, error = %e, "category resolution failed");
                item.fail(Stage::Category, e.to_string());
                false
            }
        }
    }

    /// Fatal: article creation is the terminal goal.
    async fn publish(&self, item: &mut ContentItem) -> bool {
        let Some(html_body) = item.enhanced_body.clone() else {
            item.fail(Stage::Publish, "enhanced body missing".to_string());
            return false;
        };

        let excerpt = match self
            .enhancer
            .summarize(&item.raw_body, self.config.excerpt_words)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "excerpt generation failed, using leading body text");
                fallback_excerpt(&item.raw_body)
            }
        };
        item.excerpt = Some(excerpt.clone());

        let draft = ArticleDraft {
            title: item.raw_title.clone(),
            html_body,
            excerpt: Some(excerpt),
            category_id: item.category_id,
            media_id: item.media_id,
            mode: self.config.publish_mode,
        };
        match self.cms.create_article(&draft).await {
            Ok(post) => {
                info!(post_id = post.id, url = %post.url, status = %post.status, "article created");
                item.post = Some(post);
                item.status = ItemStatus::Published;
                true
            }
            Err(e) => {
                error!(title = %item.raw_title, error = %e, "article creation failed");
                item.fail(Stage::Publish, e.to_string());
                false
            }
        }
    }

    /// Non-fatal: a failed announcement never unpublishes the article.
    async fn announce(&self, item: &mut ContentItem) {
        if !self.config.announce {
            return;
        }
        let Some(social) = self.social else {
            debug!("no social client configured, skipping announcement");
            item.tweet_skipped = true;
            return;
        };
        let Some(post) = item.post.clone() else {
            return;
        };

        let limit = self.config.social_char_limit;
        let budget = limit.saturating_sub(LINK_BUDGET);
        let draft = match self
            .enhancer
            .draft_social_post(&item.raw_title, &item.raw_body, budget)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "announcement drafting failed, article remains published");
                item.degrade(Stage::Announce, e.to_string());
                item.tweet_skipped = true;
                return;
            }
        };
        let text = compose_announcement(&draft, &post.url, limit);

        // Attach the image when available; degrade to text-only if its
        // upload fails.
        let media_id = match &item.image {
            Some(image) => match social.upload_media(image).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(error = %e, "social media upload failed, posting text-only");
                    item.degrade(Stage::Announce, e.to_string());
                    None
                }
            },
            None => None,
        };

        match social.post(&text, media_id.as_deref()).await {
            Ok(social_post) => {
                info!(id = %social_post.id, url = %social_post.url, "announcement posted");
                item.social_post = Some(social_post);
                item.status = ItemStatus::Announced;
            }
            Err(e) => {
                warn!(error = %e, "announcement failed, article remains published");
                item.degrade(Stage::Announce, e.to_string());
                item.tweet_skipped = true;
            }
        }
    }
}
