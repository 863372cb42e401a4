use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsdesk::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("[ERROR] Run failed: {e}");
            std::process::exit(1);
        }
    }
}
