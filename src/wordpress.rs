//! CMS adapter for the WordPress REST API (wp/v2).

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::config::ServiceCredentials;
use crate::contract::{
    status_error, with_retry, ArticleDraft, CmsClient, ImageRef, PostRef, ServiceError,
};

pub struct WordPressClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

#[derive(Deserialize)]
struct MediaResponse {
    id: i64,
}

#[derive(Deserialize)]
struct CategoryResponse {
    id: i64,
    name: String,
}

#[derive(Deserialize)]
struct PostResponse {
    id: i64,
    link: String,
    status: String,
}

/// Sanitise a title into a URL/filesystem-safe slug, capped at 50 chars.
fn slugify(title: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    static DASHES: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static pattern"));
    let dashes = DASHES.get_or_init(|| Regex::new(r"[-\s]+").expect("static pattern"));
    let lowered = title.to_lowercase();
    let stripped = strip.replace_all(&lowered, "");
    let slug = dashes.replace_all(stripped.trim(), "-").to_string();
    slug.chars().take(50).collect()
}

/// Unique upload filename derived from the title, keeping a recognised
/// image extension from the source URL.
fn media_filename(title: &str, image_url: &str) -> String {
    let ext = image_url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .and_then(|name| name.rsplit('.').next())
        .map(str::to_lowercase)
        .filter(|e| matches!(e.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp"))
        .unwrap_or_else(|| "jpg".to_string());
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let slug = slugify(title);
    if slug.is_empty() {
        format!("image-{timestamp}.{ext}")
    } else {
        format!("{slug}-{timestamp}.{ext}")
    }
}

fn content_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".png") {
        "image/png"
    } else if filename.ends_with(".gif") {
        "image/gif"
    } else if filename.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

impl WordPressClient {
    pub fn new(creds: &ServiceCredentials) -> Self {
        WordPressClient {
            client: reqwest::Client::new(),
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            bearer_token: creds.token.clone(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{}", self.base_url, path)
    }

    async fn download_image(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        info!(url, "downloading image for re-upload");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "image download failed"));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn do_upload_media(&self, image: &ImageRef, title: &str) -> Result<i64, ServiceError> {
        let bytes = self.download_image(&image.url).await?;
        let filename = media_filename(title, &image.url);
        let content_type = content_type_for(&filename);

        info!(filename, content_type, size = bytes.len(), "uploading media to CMS");
        let response = self
            .client
            .post(self.api_url("media"))
            .bearer_auth(&self.bearer_token)
            .header("Content-Type", content_type)
            .header(
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            )
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let media: MediaResponse = response.json().await?;

        // Attribution and alt text are best-effort metadata; failure here
        // never fails the upload.
        if let Err(e) = self.update_media_metadata(media.id, title, image).await {
            warn!(media_id = media.id, error = %e, "failed to update media metadata");
        }
        Ok(media.id)
    }

    async fn update_media_metadata(
        &self,
        media_id: i64,
        title: &str,
        image: &ImageRef,
    ) -> Result<(), ServiceError> {
        let mut payload = json!({
            "title": title,
            "alt_text": title,
        });
        if let Some(attribution) = &image.attribution {
            payload["caption"] = json!(format!("Photo by {attribution}"));
        }
        let response = self
            .client
            .post(self.api_url(&format!("media/{media_id}")))
            .bearer_auth(&self.bearer_token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(())
    }

    async fn do_resolve_or_create_category(&self, label: &str) -> Result<i64, ServiceError> {
        let response = self
            .client
            .get(self.api_url("categories"))
            .bearer_auth(&self.bearer_token)
            .query(&[("search", label)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let categories: Vec<CategoryResponse> = response.json().await?;
        if let Some(existing) = categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(label))
        {
            info!(label, category_id = existing.id, "found existing category");
            return Ok(existing.id);
        }

        info!(label, "creating category");
        let response = self
            .client
            .post(self.api_url("categories"))
            .bearer_auth(&self.bearer_token)
            .json(&json!({ "name": label }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let created: CategoryResponse = response.json().await?;
        Ok(created.id)
    }

    async fn do_create_article(&self, draft: &ArticleDraft) -> Result<PostRef, ServiceError> {
        let mut payload = json!({
            "title": draft.title,
            "content": draft.html_body,
            "status": draft.mode.as_cms_status(),
        });
        if let Some(excerpt) = &draft.excerpt {
            payload["excerpt"] = json!(excerpt);
        }
        if let Some(category_id) = draft.category_id {
            payload["categories"] = json!([category_id]);
        }
        if let Some(media_id) = draft.media_id {
            payload["featured_media"] = json!(media_id);
        }

        info!(title = %draft.title, status = draft.mode.as_cms_status(), "creating article");
        let response = self
            .client
            .post(self.api_url("posts"))
            .bearer_auth(&self.bearer_token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let post: PostResponse = response.json().await?;
        Ok(PostRef {
            id: post.id,
            url: post.link,
            status: post.status,
        })
    }
}

#[async_trait]
impl CmsClient for WordPressClient {
    async fn upload_media(&self, image: &ImageRef, title: &str) -> Result<i64, ServiceError> {
        with_retry(|| self.do_upload_media(image, title)).await
    }

    async fn resolve_or_create_category(&self, label: &str) -> Result<i64, ServiceError> {
        with_retry(|| self.do_resolve_or_create_category(label)).await
    }

    async fn create_article(&self, draft: &ArticleDraft) -> Result<PostRef, ServiceError> {
        // No retry here: a transient failure after the CMS accepted the post
        // would create a duplicate article.
        self.do_create_article(draft).await
    }
}
