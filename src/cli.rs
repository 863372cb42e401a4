use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::batch::Coordinator;
use crate::config::{BotConfig, PublishMode};
use crate::enhance::GeminiEnhancer;
use crate::generate::GeneratedSource;
use crate::images::PexelsSource;
use crate::load_config::load_config;
use crate::news::TavilySource;
use crate::report::RunReport;
use crate::social::XClient;
use crate::wordpress::WordPressClient;

/// CLI for newsdesk: fetch, enhance and publish news articles.
#[derive(Parser)]
#[clap(
    name = "newsdesk",
    version,
    about = "Fetch news candidates, enhance them with AI, publish to a CMS and announce on X"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish articles for a single category
    Group {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Category label (e.g. technology, business, sports)
        #[clap(long)]
        label: String,
        /// Maximum number of articles to process
        #[clap(long, default_value_t = 3)]
        max_articles: usize,
        /// Create articles as drafts instead of publishing live
        #[clap(long)]
        draft: bool,
    },
    /// Publish articles for several categories, processed sequentially
    Groups {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Comma-separated category labels
        #[clap(long, value_delimiter = ',')]
        labels: Vec<String>,
        /// Articles to process per category
        #[clap(long, default_value_t = 2)]
        per_group: usize,
        /// Create articles as drafts instead of publishing live
        #[clap(long)]
        draft: bool,
    },
    /// Generate original articles for a theme instead of fetching news
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Theme to write about (e.g. travel, food, technology)
        #[clap(long)]
        theme: String,
        /// Number of articles to generate
        #[clap(long, default_value_t = 3)]
        count: usize,
        /// Create articles as drafts instead of publishing live
        #[clap(long)]
        draft: bool,
    },
    /// Publish trending articles across all categories
    Trending {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Maximum number of articles to process
        #[clap(long, default_value_t = 5)]
        max_articles: usize,
        /// Create articles as drafts instead of publishing live
        #[clap(long)]
        draft: bool,
    },
}

fn build_coordinator(
    config: BotConfig,
) -> Coordinator<TavilySource, PexelsSource, GeminiEnhancer, WordPressClient, XClient> {
    let source = TavilySource::new(&config.content);
    let images = PexelsSource::new(&config.images);
    let enhancer = GeminiEnhancer::new(&config.enhancer);
    let cms = WordPressClient::new(&config.cms);
    let social = if config.announce {
        config.social.as_ref().map(XClient::new)
    } else {
        None
    };
    Coordinator::new(config, source, images, enhancer, cms, social)
}

/// Same adapters as [`build_coordinator`] but with generated candidates
/// instead of fetched news.
fn build_generator_coordinator(
    config: BotConfig,
) -> Coordinator<GeneratedSource, PexelsSource, GeminiEnhancer, WordPressClient, XClient> {
    let source = GeneratedSource::new(&config.enhancer);
    let images = PexelsSource::new(&config.images);
    let enhancer = GeminiEnhancer::new(&config.enhancer);
    let cms = WordPressClient::new(&config.cms);
    let social = if config.announce {
        config.social.as_ref().map(XClient::new)
    } else {
        None
    };
    Coordinator::new(config, source, images, enhancer, cms, social)
}

fn render(report: &RunReport) {
    println!("Run complete: {}", report.summary());
    for item in &report.items {
        match &item.post {
            Some(post) => println!("  [{:?}] {} -> {}", item.status, item.raw_title, post.url),
            None => println!("  [{:?}] {}", item.status, item.raw_title),
        }
        for err in &item.errors {
            println!("      {}: {}", err.stage.as_str(), err.reason);
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<()> {
    let report = match cli.command {
        Commands::Group {
            config,
            label,
            max_articles,
            draft,
        } => {
            let mut config = load_config(config)?;
            if draft {
                config.publish_mode = PublishMode::Draft;
            }
            let coordinator = build_coordinator(config);
            coordinator.run_group(&label, max_articles).await
        }
        Commands::Groups {
            config,
            labels,
            per_group,
            draft,
        } => {
            let mut config = load_config(config)?;
            if draft {
                config.publish_mode = PublishMode::Draft;
            }
            let coordinator = build_coordinator(config);
            coordinator.run_groups(&labels, per_group).await
        }
        Commands::Generate {
            config,
            theme,
            count,
            draft,
        } => {
            let mut config = load_config(config)?;
            if draft {
                config.publish_mode = PublishMode::Draft;
            }
            let coordinator = build_generator_coordinator(config);
            coordinator.run_group(&theme, count).await
        }
        Commands::Trending {
            config,
            max_articles,
            draft,
        } => {
            let mut config = load_config(config)?;
            if draft {
                config.publish_mode = PublishMode::Draft;
            }
            let coordinator = build_coordinator(config);
            coordinator.run_trending(max_articles).await
        }
    };

    render(&report);
    Ok(())
}
