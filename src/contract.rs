//! # contract: capability interfaces for the publishing pipeline
//!
//! This module defines the five adapter traits the pipeline orchestrates —
//! content source, image source, text enhancer, CMS client and social client —
//! together with the plain data types that cross those boundaries and the
//! shared failure taxonomy.
//!
//! ## Interface & Extensibility
//! - Implement a trait to plug in a new backend (different search API,
//!   different CMS, a file-based fake, etc).
//! - All methods are async and return [`ServiceError`] on failure. The
//!   orchestrator never inspects transport details; the implementor owns
//!   timeouts, auth and payload shapes.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests (exported behind the
//!   `test-export-mocks` feature).

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::PublishMode;

/// Failure taxonomy shared by every adapter.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network trouble, 5xx or rate limiting. Eligible for one local retry
    /// with backoff at the adapter boundary.
    #[error("transient service error: {0}")]
    Transient(String),
    /// Auth or validation failure (4xx). Surfaced immediately, never retried.
    #[error("permanent service error: {0}")]
    Permanent(String),
    /// The source had nothing for this label or query. Degrades to zero
    /// items for the group, not a run failure.
    #[error("no content available: {0}")]
    ContentUnavailable(String),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            if status.is_client_error() {
                return ServiceError::Permanent(format!("{status}: {e}"));
            }
        }
        ServiceError::Transient(e.to_string())
    }
}

/// Classify a non-success HTTP status: 429 and 5xx are retryable, the rest
/// of the 4xx range is not.
pub fn status_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    if status.as_u16() == 429 || status.is_server_error() {
        ServiceError::Transient(format!("{status}: {body}"))
    } else {
        ServiceError::Permanent(format!("{status}: {body}"))
    }
}

const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// One local retry with a fixed backoff for transient failures. Permanent
/// failures and empty results surface immediately.
pub async fn with_retry<T, F, Fut>(op: F) -> Result<T, ServiceError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "transient failure, retrying once");
            tokio::time::sleep(RETRY_BACKOFF).await;
            op().await
        }
        other => other,
    }
}

/// One raw fetched candidate, not yet processed by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub title: String,
    pub body: String,
    /// Source URL; `None` for generated content.
    pub url: Option<String>,
    /// Topical bucket used for category resolution and batching.
    pub group: String,
}

/// A resolved supporting image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRef {
    pub url: String,
    /// Photographer or author credit, when the source provides one.
    pub attribution: Option<String>,
    pub attribution_url: Option<String>,
    pub width: u32,
    pub height: u32,
}

/// The created article, as returned by the CMS.
#[derive(Debug, Clone, Serialize)]
pub struct PostRef {
    pub id: i64,
    pub url: String,
    pub status: String,
}

/// The social announcement, once posted.
#[derive(Debug, Clone, Serialize)]
pub struct SocialRef {
    pub id: String,
    pub url: String,
}

/// Context handed to the enhancer alongside the raw title and body.
#[derive(Debug, Clone, Default)]
pub struct EnhanceContext {
    pub group: Option<String>,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    /// Word-count target for the article body.
    pub word_target: u32,
}

/// Everything the CMS needs to create one article.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub title: String,
    pub html_body: String,
    pub excerpt: Option<String>,
    pub category_id: Option<i64>,
    pub media_id: Option<i64>,
    pub mode: PublishMode,
}

/// Requested image orientation for searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

/// Trait for fetching raw article candidates for a topical label.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `max_results` candidates for a group label. Returns
    /// [`ServiceError::ContentUnavailable`] when the source has nothing.
    async fn fetch(&self, label: &str, max_results: usize) -> Result<Vec<Candidate>, ServiceError>;

    /// Fetch trending candidates across all topics. The implementor assigns
    /// a default group label to each candidate.
    async fn fetch_trending(&self, max_results: usize) -> Result<Vec<Candidate>, ServiceError>;
}

/// Trait for finding a supporting image for a set of keywords.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// First matching image, or `None` when nothing matches the keywords.
    async fn find(
        &self,
        keywords: &str,
        orientation: Orientation,
    ) -> Result<Option<ImageRef>, ServiceError>;
}

/// Trait for the text-enhancement service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Expand the raw candidate into publishable HTML.
    async fn enhance(
        &self,
        title: &str,
        body: &str,
        ctx: &EnhanceContext,
    ) -> Result<String, ServiceError>;

    /// Short plain-text summary, bounded by `max_words`. Used for excerpts.
    async fn summarize(&self, body: &str, max_words: u32) -> Result<String, ServiceError>;

    /// Draft the social announcement text against a character budget. The
    /// caller enforces the hard ceiling independently; the budget already
    /// excludes the reserved link space.
    async fn draft_social_post(
        &self,
        title: &str,
        body: &str,
        max_chars: usize,
    ) -> Result<String, ServiceError>;
}

/// Trait for the content-management backend (WordPress-style REST API).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Upload the image to the media library and return its media id.
    async fn upload_media(&self, image: &ImageRef, title: &str) -> Result<i64, ServiceError>;

    /// Look up the category by name (case-insensitive exact match) or
    /// create it, returning its id.
    async fn resolve_or_create_category(&self, label: &str) -> Result<i64, ServiceError>;

    /// Create the article and return its id, URL and status.
    async fn create_article(&self, draft: &ArticleDraft) -> Result<PostRef, ServiceError>;
}

/// Trait for the social network client.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Upload the image for attachment and return the network's media id.
    async fn upload_media(&self, image: &ImageRef) -> Result<String, ServiceError>;

    /// Post the announcement, optionally with an attached media id.
    async fn post<'a>(
        &self,
        text: &str,
        media_id: Option<&'a str>,
    ) -> Result<SocialRef, ServiceError>;
}
