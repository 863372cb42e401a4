//! Social adapter for an X-style API: media upload plus tweet creation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::ServiceCredentials;
use crate::contract::{
    status_error, with_retry, ImageRef, ServiceError, SocialClient, SocialRef,
};

pub const DEFAULT_BASE_URL: &str = "https://api.x.com";

pub struct XClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

impl XClient {
    pub fn new(creds: &ServiceCredentials) -> Self {
        XClient {
            client: reqwest::Client::new(),
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            bearer_token: creds.token.clone(),
        }
    }

    async fn do_upload_media(&self, image: &ImageRef) -> Result<String, ServiceError> {
        info!(url = %image.url, "downloading image for social upload");
        let response = self.client.get(&image.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "image download failed"));
        }
        let bytes = response.bytes().await?.to_vec();

        let part = reqwest::multipart::Part::bytes(bytes).file_name("media.jpg");
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .client
            .post(format!("{}/1.1/media/upload.json", self.base_url))
            .bearer_auth(&self.bearer_token)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let media: MediaUploadResponse = response.json().await?;
        info!(media_id = %media.media_id_string, "social media upload complete");
        Ok(media.media_id_string)
    }

    async fn do_post(&self, text: &str, media_id: Option<&str>) -> Result<SocialRef, ServiceError> {
        let mut payload = json!({ "text": text });
        if let Some(media_id) = media_id {
            payload["media"] = json!({ "media_ids": [media_id] });
        }

        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let tweet: TweetResponse = response.json().await?;
        let url = format!("https://x.com/i/web/status/{}", tweet.data.id);
        info!(id = %tweet.data.id, url = %url, "announcement posted");
        Ok(SocialRef {
            id: tweet.data.id,
            url,
        })
    }
}

#[async_trait]
impl SocialClient for XClient {
    async fn upload_media(&self, image: &ImageRef) -> Result<String, ServiceError> {
        with_retry(|| self.do_upload_media(image)).await
    }

    async fn post<'a>(
        &self,
        text: &str,
        media_id: Option<&'a str>,
    ) -> Result<SocialRef, ServiceError> {
        // No retry: retrying a post that may have landed would duplicate the
        // announcement.
        self.do_post(text, media_id).await
    }
}
