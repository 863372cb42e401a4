//! Image source adapter for a Pexels-style photo search API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::ServiceCredentials;
use crate::contract::{
    status_error, with_retry, ImageRef, ImageSource, Orientation, ServiceError,
};

pub const DEFAULT_BASE_URL: &str = "https://api.pexels.com";

pub struct PexelsSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    photographer: Option<String>,
    photographer_url: Option<String>,
    src: PhotoSources,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Deserialize)]
struct PhotoSources {
    large: Option<String>,
    original: Option<String>,
}

impl PexelsSource {
    pub fn new(creds: &ServiceCredentials) -> Self {
        PexelsSource {
            client: reqwest::Client::new(),
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            api_key: creds.token.clone(),
        }
    }

    async fn search(
        &self,
        keywords: &str,
        orientation: Orientation,
    ) -> Result<Option<ImageRef>, ServiceError> {
        info!(keywords, orientation = orientation.as_str(), "searching for image");
        let response = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", keywords),
                ("orientation", orientation.as_str()),
                ("size", "medium"),
                ("per_page", "1"),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let data: SearchResponse = response.json().await?;

        let Some(photo) = data.photos.into_iter().next() else {
            warn!(keywords, "no images found");
            return Ok(None);
        };
        let Some(url) = photo.src.large.or(photo.src.original) else {
            warn!(keywords, "image hit without usable source URL");
            return Ok(None);
        };
        Ok(Some(ImageRef {
            url,
            attribution: photo.photographer,
            attribution_url: photo.photographer_url,
            width: photo.width,
            height: photo.height,
        }))
    }
}

#[async_trait]
impl ImageSource for PexelsSource {
    async fn find(
        &self,
        keywords: &str,
        orientation: Orientation,
    ) -> Result<Option<ImageRef>, ServiceError> {
        with_retry(|| self.search(keywords, orientation)).await
    }
}
