//! Text-enhancement adapter for a Gemini-style generateContent API.
//!
//! Owns the prompt strings for the three operations (article expansion,
//! summarisation, announcement drafting) and the cleanup of model output.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::ServiceCredentials;
use crate::contract::{
    status_error, with_retry, EnhanceContext, Enhancer, ServiceError,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-2.0-flash";

pub struct GeminiEnhancer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Strip leading/trailing markdown code fences the model sometimes wraps
/// HTML output in.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = text.trim();
    for prefix in ["```html", "```"] {
        if let Some(rest) = out.strip_prefix(prefix) {
            out = rest;
            break;
        }
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest;
    }
    out.trim().to_string()
}

impl GeminiEnhancer {
    pub fn new(creds: &ServiceCredentials) -> Self {
        GeminiEnhancer {
            client: reqwest::Client::new(),
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            api_key: creds.token.clone(),
        }
    }

    pub(crate) async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, MODEL
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let data: GenerateResponse = response.json().await?;
        let text = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                ServiceError::Permanent("model response contained no candidates".to_string())
            })?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl Enhancer for GeminiEnhancer {
    async fn enhance(
        &self,
        title: &str,
        body: &str,
        ctx: &EnhanceContext,
    ) -> Result<String, ServiceError> {
        let prompt = format!(
            "You are a professional news content writer. Expand the article \
             summary below into a comprehensive, well-written article of about \
             {word_target} words. Maintain factual accuracy - DO NOT add false \
             information. Structure it with proper paragraphs and generate \
             clean, semantic HTML (h2, p, strong, em tags where appropriate) \
             suitable for a CMS. Include the featured image at the top with \
             attribution if one is given, and a \"Read more at source\" link \
             at the bottom if a source URL is given.\n\n\
             Title: {title}\n\
             Category: {category}\n\
             Original content: {body}\n\
             Source URL: {source}\n\
             Featured image URL: {image}\n\n\
             Return ONLY the HTML content without markdown code blocks or \
             explanations.",
            word_target = ctx.word_target,
            title = title,
            category = ctx.group.as_deref().unwrap_or("General"),
            body = body,
            source = ctx.source_url.as_deref().unwrap_or("none"),
            image = ctx.image_url.as_deref().unwrap_or("no image available"),
        );
        info!(title, "requesting content enhancement");
        let raw = with_retry(|| self.generate(&prompt)).await?;
        Ok(strip_code_fences(&raw))
    }

    async fn summarize(&self, body: &str, max_words: u32) -> Result<String, ServiceError> {
        let prompt = format!(
            "Summarize the following content in {max_words} words or less. \
             Make it concise and informative:\n\n{body}"
        );
        let summary = with_retry(|| self.generate(&prompt)).await?;
        Ok(summary.trim_matches(['"', '\'']).to_string())
    }

    async fn draft_social_post(
        &self,
        title: &str,
        body: &str,
        max_chars: usize,
    ) -> Result<String, ServiceError> {
        // The state machine enforces the real ceiling; this budget already
        // excludes the reserved link space.
        let excerpt: String = body.chars().take(200).collect();
        let prompt = format!(
            "Create an engaging, attention-grabbing social media post about \
             this news article.\n\n\
             Requirements:\n\
             - Maximum {max_chars} characters (STRICT LIMIT)\n\
             - Include 1-2 relevant hashtags\n\
             - Professional tone, compelling and shareable\n\
             - DO NOT include any URL, it will be added automatically\n\n\
             Article title: {title}\n\
             Article summary: {excerpt}\n\n\
             Return ONLY the post text, nothing else."
        );
        let draft = with_retry(|| self.generate(&prompt)).await?;
        Ok(draft.trim_matches(['"', '\'']).to_string())
    }
}
