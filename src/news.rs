//! Content source adapter for a Tavily-style search API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::ServiceCredentials;
use crate::contract::{status_error, with_retry, Candidate, ContentSource, ServiceError};

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Group label assigned to candidates from a trending fetch.
pub const TRENDING_GROUP: &str = "Trending";

pub struct TavilySource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

impl TavilySource {
    pub fn new(creds: &ServiceCredentials) -> Self {
        TavilySource {
            client: reqwest::Client::new(),
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            api_key: creds.token.clone(),
        }
    }

    /// Category-specific query phrasing; unknown labels fall through to a
    /// generic pattern.
    fn query_for(label: &str) -> String {
        match label.to_lowercase().as_str() {
            "technology" => "latest technology news and innovations".to_string(),
            "business" => "latest business and finance news".to_string(),
            "sports" => "latest sports news and updates".to_string(),
            "health" => "latest health and medical news".to_string(),
            "science" => "latest science and research news".to_string(),
            "entertainment" => "latest entertainment and celebrity news".to_string(),
            "politics" => "latest political news and updates".to_string(),
            "world" => "latest world news and international updates".to_string(),
            other => format!("latest {other} news"),
        }
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        group: &str,
    ) -> Result<Vec<Candidate>, ServiceError> {
        let payload = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "advanced",
            "max_results": max_results,
            "days": 3,
        });
        info!(query, max_results, "fetching candidates");
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let data: SearchResponse = response.json().await?;

        let candidates: Vec<Candidate> = data
            .results
            .into_iter()
            .map(|result| Candidate {
                title: result.title.unwrap_or_else(|| "Untitled".to_string()),
                body: result.content.unwrap_or_default(),
                url: result.url.filter(|u| !u.is_empty()),
                group: group.to_string(),
            })
            .collect();

        if candidates.is_empty() {
            return Err(ServiceError::ContentUnavailable(query.to_string()));
        }
        info!(count = candidates.len(), query, "fetched candidates");
        Ok(candidates)
    }
}

#[async_trait]
impl ContentSource for TavilySource {
    async fn fetch(&self, label: &str, max_results: usize) -> Result<Vec<Candidate>, ServiceError> {
        let query = Self::query_for(label);
        with_retry(|| self.search(&query, max_results, label)).await
    }

    async fn fetch_trending(&self, max_results: usize) -> Result<Vec<Candidate>, ServiceError> {
        with_retry(|| {
            self.search(
                "latest breaking news and trending topics",
                max_results,
                TRENDING_GROUP,
            )
        })
        .await
    }
}
