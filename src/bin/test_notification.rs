use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use wynweather::config::Config;
use wynweather::environment::default_config_dir;
use wynweather::logging;
use wynweather::rss::create_http_client;
use wynweather::session::NotificationSession;
use wynweather::slack::SlackBackend;

/// Sends a test message through a full Slack notification session.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Slack user ID, handle, full name or e-mail of the person to notify
    notify_user: String,

    /// Message to send
    #[arg(short, long, default_value = "Watch out wyn! (Test Warning: http://example.com/1/2/3)")]
    message: String,

    /// Directory containing config.toml
    #[arg(long, default_value_os_t = default_config_dir())]
    config_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_console_logging();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config_path).context("Failed to load configuration")?;
    config.apply_env_overrides();
    let credentials = config.credentials()?;
    let client = create_http_client(config.watch.request_timeout(), &config.watch.user_agent)?;

    info!("Sending test notification to {}", cli.notify_user);
    NotificationSession::new(
        SlackBackend::new(client, credentials),
        config.watch.settle_delay(),
    )
    .notify(&cli.notify_user, &cli.message)
    .await
    .context("Test notification failed")?;

    info!("Test notification sent");
    Ok(())
}
