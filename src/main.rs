use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use wynweather::config::Config;
use wynweather::environment::{default_cache_dir, default_config_dir};
use wynweather::rss::create_http_client;
use wynweather::{logging, pipeline, WatchRequest};

/// Scrapes the weather warning feed given by FEED_URL and, if any current
/// warning mentions SEARCH_STRING, sends a Slack message to NOTIFY_USER.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL of the warning feed, e.g. a BOM state warnings RSS feed
    feed_url: String,

    /// Keyword that triggers the notification, e.g. "Hawthorn"
    search_string: String,

    /// Slack user ID, handle, full name or e-mail of the person to notify
    notify_user: String,

    /// Directory containing config.toml
    #[arg(long, default_value_os_t = default_config_dir())]
    config_path: PathBuf,

    /// Directory for logs
    #[arg(long, default_value_os_t = default_cache_dir())]
    cache_path: PathBuf,
}

fn create_dir(directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        fs::create_dir_all(directory)
            .with_context(|| format!("Failed to create directory {}", directory.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    create_dir(&cli.config_path)?;
    create_dir(&cli.cache_path)?;
    let _log_guard = logging::configure_logging(&cli.cache_path);

    if let Err(err) = run(cli).await {
        error!("Run failed: {:#}", err);
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(&cli.config_path).context("Failed to load configuration")?;
    config.apply_env_overrides();
    let credentials = config.credentials()?;

    let client = create_http_client(config.watch.request_timeout(), &config.watch.user_agent)?;
    let request = WatchRequest {
        feed_url: cli.feed_url,
        keyword: cli.search_string,
        recipient: cli.notify_user,
    };

    let outcome = pipeline::run_with_slack(&client, &request, &config.watch, credentials)
        .await
        .with_context(|| format!("Failed to check {}", request.feed_url))?;

    if outcome.notified {
        info!("Notification sent to {}", request.recipient);
    } else {
        info!("Checked {} warnings, no notification sent", outcome.items);
    }
    Ok(())
}
