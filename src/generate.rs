//! Content source that drafts its own candidates with the text model instead
//! of searching the news: a title and a short briefing per candidate, fed
//! into the same publish pipeline.
//!
//! Generated candidates carry no source URL, so they get generated item keys
//! and never collide in the per-run dedupe.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::ServiceCredentials;
use crate::contract::{with_retry, Candidate, ContentSource, ServiceError};
use crate::enhance::GeminiEnhancer;

/// Themes cycled through when no explicit theme is given.
const DEFAULT_THEMES: &[&str] = &["technology", "business", "health", "travel", "lifestyle"];

/// Keyword pool per theme; unknown labels get no keyword hints and the
/// prompts fall back to the label alone.
fn theme_keywords(label: &str) -> &'static [&'static str] {
    match label.to_lowercase().as_str() {
        "travel" => &["destinations", "travel tips", "adventure", "vacation", "road trip"],
        "food" => &["recipes", "cooking tips", "restaurants", "healthy eating", "baking"],
        "technology" => &["AI", "smartphones", "software", "cybersecurity", "gadgets"],
        "health" => &["fitness", "nutrition", "mental health", "wellness", "sleep"],
        "lifestyle" => &["fashion", "home decor", "productivity", "minimalism", "self-care"],
        "business" => &["entrepreneurship", "marketing", "finance", "startups", "leadership"],
        "education" => &["study tips", "online learning", "teaching", "career development"],
        "entertainment" => &["movies", "music", "gaming", "streaming", "podcasts"],
        "sports" => &["training", "athletes", "competitions", "football", "tennis"],
        "parenting" => &["parenting tips", "child development", "family activities", "baby care"],
        _ => &[],
    }
}

/// Rotating three-keyword focus so consecutive candidates for the same theme
/// don't land on identical prompts.
pub fn keyword_focus(label: &str, index: usize) -> Vec<&'static str> {
    let pool = theme_keywords(label);
    if pool.is_empty() {
        return Vec::new();
    }
    (0..pool.len().min(3))
        .map(|offset| pool[(index + offset) % pool.len()])
        .collect()
}

/// Drafts candidates with the same generateContent backend the enhancer
/// uses, one title plus briefing per candidate.
pub struct GeneratedSource {
    model: GeminiEnhancer,
}

impl GeneratedSource {
    pub fn new(creds: &ServiceCredentials) -> Self {
        GeneratedSource {
            model: GeminiEnhancer::new(creds),
        }
    }

    async fn draft_title(&self, label: &str, keywords: &[&str]) -> Result<String, ServiceError> {
        let focus = if keywords.is_empty() {
            String::new()
        } else {
            format!("Focus on these keywords: {}.\n", keywords.join(", "))
        };
        let prompt = format!(
            "Generate a catchy, SEO-friendly blog post title about {label}.\n\
             {focus}\
             Requirements:\n\
             - Engaging and click-worthy\n\
             - Under 60 characters\n\
             - Professional and informative tone\n\
             - Include numbers if relevant (e.g. \"10 Tips...\", \"5 Ways...\")\n\n\
             Return ONLY the title, nothing else."
        );
        let title = with_retry(|| self.model.generate(&prompt)).await?;
        Ok(title.trim_matches(['"', '\'']).to_string())
    }

    async fn draft_briefing(
        &self,
        title: &str,
        label: &str,
        keywords: &[&str],
    ) -> Result<String, ServiceError> {
        let focus = if keywords.is_empty() {
            String::new()
        } else {
            format!(" Touch on: {}.", keywords.join(", "))
        };
        let prompt = format!(
            "Write a short factual briefing of roughly 150 words for an \
             article titled \"{title}\" about {label}.{focus} Plain text, no \
             headings, no markdown. It will be expanded into a full article \
             separately.\n\n\
             Return ONLY the briefing, nothing else."
        );
        with_retry(|| self.model.generate(&prompt)).await
    }

    /// One generated candidate; failures are reported to the caller, which
    /// skips the slot rather than aborting the batch.
    async fn draft_candidate(&self, label: &str, index: usize) -> Result<Candidate, ServiceError> {
        let keywords = keyword_focus(label, index);
        let title = self.draft_title(label, &keywords).await?;
        let body = self.draft_briefing(&title, label, &keywords).await?;
        info!(theme = label, title = %title, "candidate generated");
        Ok(Candidate {
            title,
            body,
            url: None,
            group: label.to_string(),
        })
    }

    async fn draft_many(
        &self,
        themes: impl Iterator<Item = &str>,
        what: &str,
    ) -> Result<Vec<Candidate>, ServiceError> {
        let mut candidates = Vec::new();
        for (index, theme) in themes.enumerate() {
            match self.draft_candidate(theme, index).await {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    warn!(theme, index, error = %e, "candidate generation failed, skipping slot");
                }
            }
        }
        if candidates.is_empty() {
            return Err(ServiceError::ContentUnavailable(format!(
                "generation produced no candidates for {what}"
            )));
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ContentSource for GeneratedSource {
    async fn fetch(&self, label: &str, max_results: usize) -> Result<Vec<Candidate>, ServiceError> {
        info!(theme = label, max_results, "generating candidates");
        self.draft_many(std::iter::repeat(label).take(max_results), label)
            .await
    }

    /// Without a trending signal to follow, cycle through the default themes,
    /// one candidate each; every candidate keeps its theme as group label.
    async fn fetch_trending(&self, max_results: usize) -> Result<Vec<Candidate>, ServiceError> {
        info!(max_results, "generating candidates across default themes");
        self.draft_many(
            DEFAULT_THEMES.iter().copied().cycle().take(max_results),
            "default themes",
        )
        .await
    }
}
