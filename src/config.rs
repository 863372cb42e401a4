use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Requested article status on the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    Draft,
    Live,
}

impl PublishMode {
    pub fn as_cms_status(&self) -> &'static str {
        match self {
            PublishMode::Draft => "draft",
            PublishMode::Live => "publish",
        }
    }
}

/// Base URL plus credential token for one external service.
#[derive(Debug, Clone)]
pub struct ServiceCredentials {
    pub base_url: String,
    pub token: String,
}

/// The fully merged configuration for one bot run. Constructed once (see
/// `load_config`) and passed into the coordinator and adapters by parameter,
/// never read from process-wide state.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub content: ServiceCredentials,
    pub images: ServiceCredentials,
    pub enhancer: ServiceCredentials,
    pub cms: ServiceCredentials,
    /// Absent when announcements are disabled or the token is missing.
    pub social: Option<ServiceCredentials>,
    pub publish_mode: PublishMode,
    pub include_images: bool,
    pub announce: bool,
    /// Pause after each completed item, to stay under per-minute limits of
    /// the slowest external service.
    pub item_delay: Duration,
    /// Longer pause after each group boundary in multi-group runs.
    pub group_delay: Duration,
    /// Word-count target for the enhanced article body.
    pub word_target: u32,
    /// Word budget for the generated excerpt.
    pub excerpt_words: u32,
    /// Hard ceiling for announcement text, inclusive of the appended link.
    pub social_char_limit: usize,
}

impl BotConfig {
    pub fn trace_loaded(&self) {
        info!(
            publish_mode = ?self.publish_mode,
            include_images = self.include_images,
            announce = self.announce,
            social_configured = self.social.is_some(),
            item_delay_secs = self.item_delay.as_secs(),
            group_delay_secs = self.group_delay.as_secs(),
            word_target = self.word_target,
            excerpt_words = self.excerpt_words,
            social_char_limit = self.social_char_limit,
            "Loaded BotConfig"
        );
    }
}
