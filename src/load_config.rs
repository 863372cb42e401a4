use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{BotConfig, PublishMode, ServiceCredentials};
use crate::{enhance, images, news, social};

#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default = "default_publish_mode")]
    publish_mode: PublishMode,
    #[serde(default = "default_true")]
    include_images: bool,
    #[serde(default = "default_true")]
    announce: bool,
    #[serde(default = "default_item_delay")]
    item_delay_secs: u64,
    #[serde(default = "default_group_delay")]
    group_delay_secs: u64,
    #[serde(default = "default_word_target")]
    word_target: u32,
    #[serde(default = "default_excerpt_words")]
    excerpt_words: u32,
    #[serde(default = "default_social_char_limit")]
    social_char_limit: usize,
    #[serde(default)]
    endpoints: Endpoints,
}

#[derive(Deserialize, Default)]
struct Endpoints {
    content_base_url: Option<String>,
    image_base_url: Option<String>,
    enhancer_base_url: Option<String>,
    cms_base_url: Option<String>,
    social_base_url: Option<String>,
}

fn default_publish_mode() -> PublishMode {
    PublishMode::Live
}
fn default_true() -> bool {
    true
}
fn default_item_delay() -> u64 {
    5
}
fn default_group_delay() -> u64 {
    10
}
fn default_word_target() -> u32 {
    400
}
fn default_excerpt_words() -> u32 {
    50
}
fn default_social_char_limit() -> usize {
    280
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().trim_matches('"').to_string()),
        Ok(_) | Err(_) => {
            error!(var = name, "required environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set"))
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

/// Loads a static YAML config file (no secrets) and injects required env
/// vars for credentials. Returns a fully merged [`BotConfig`] or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let content = ServiceCredentials {
        base_url: static_conf
            .endpoints
            .content_base_url
            .unwrap_or_else(|| news::DEFAULT_BASE_URL.to_string()),
        token: required_env("TAVILY_API_KEY")?,
    };

    let enhancer = ServiceCredentials {
        base_url: static_conf
            .endpoints
            .enhancer_base_url
            .unwrap_or_else(|| enhance::DEFAULT_BASE_URL.to_string()),
        token: required_env("GEMINI_API_KEY")?,
    };

    let cms_base_url = static_conf
        .endpoints
        .cms_base_url
        .or_else(|| optional_env("WORDPRESS_BASE_URL"))
        .ok_or_else(|| {
            error!("no CMS base URL in config or WORDPRESS_BASE_URL env");
            anyhow::anyhow!("CMS base URL not configured")
        })?;
    let cms = ServiceCredentials {
        base_url: cms_base_url,
        token: required_env("BEARER_TOKEN")?,
    };

    // Image and social credentials degrade rather than abort: the pipeline
    // can publish without either.
    let image_base_url = static_conf
        .endpoints
        .image_base_url
        .unwrap_or_else(|| images::DEFAULT_BASE_URL.to_string());
    let (images, include_images) = match optional_env("PEXELS_API_KEY") {
        Some(token) => (
            ServiceCredentials {
                base_url: image_base_url,
                token,
            },
            static_conf.include_images,
        ),
        None => {
            warn!("PEXELS_API_KEY not set, publishing without images");
            (
                ServiceCredentials {
                    base_url: image_base_url,
                    token: String::new(),
                },
                false,
            )
        }
    };

    let social_base_url = static_conf
        .endpoints
        .social_base_url
        .unwrap_or_else(|| social::DEFAULT_BASE_URL.to_string());
    let social_creds = match optional_env("X_BEARER_TOKEN") {
        Some(token) => Some(ServiceCredentials {
            base_url: social_base_url,
            token,
        }),
        None => {
            if static_conf.announce {
                warn!("X_BEARER_TOKEN not set, continuing without announcements");
            }
            None
        }
    };

    let config = BotConfig {
        content,
        images,
        enhancer,
        cms,
        social: social_creds,
        publish_mode: static_conf.publish_mode,
        include_images,
        announce: static_conf.announce,
        item_delay: Duration::from_secs(static_conf.item_delay_secs),
        group_delay: Duration::from_secs(static_conf.group_delay_secs),
        word_target: static_conf.word_target,
        excerpt_words: static_conf.excerpt_words,
        social_char_limit: static_conf.social_char_limit,
    };
    config.trace_loaded();
    Ok(config)
}
