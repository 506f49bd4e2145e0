use anyhow::Result;
use colored::Colorize;
use std::env;
use std::process;

use wynweather::config::Config;
use wynweather::environment::default_config_dir;
use wynweather::logging;
use wynweather::rss::{self, HttpFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_console_logging();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        return Ok(());
    }

    let url = &args[1];
    let keyword = args
        .iter()
        .position(|arg| arg == "--keyword")
        .and_then(|i| args.get(i + 1));

    println!("Testing feed: {}", url);

    let watch = Config::load(&default_config_dir())?.watch;
    let fetcher = HttpFetcher::new(rss::create_http_client(
        watch.request_timeout(),
        &watch.user_agent,
    )?);

    let result = rss::test_rss_feed(&fetcher, url).await;

    println!("\n{}", "═".repeat(100).bright_blue());
    println!(
        "{}  {}",
        "FEED DIAGNOSTICS".bright_blue(),
        url.bright_yellow()
    );
    println!("{}", "═".repeat(100).bright_blue());

    let status_str = format!("{:?}", result.status);
    let colored_status = match result.status {
        rss::RssFeedStatus::Success => status_str.bright_green(),
        rss::RssFeedStatus::RequestFailed => status_str.bright_red(),
        _ => status_str.bright_yellow(),
    };
    println!("{}: {}", "Status".bright_blue(), colored_status);

    if let Some(ref content_type) = result.content_type {
        println!("{}: {}", "Content-Type".bright_blue(), content_type);
    } else {
        println!("{}: {}", "Content-Type".bright_blue(), "None".dimmed());
    }

    println!(
        "{}: {}",
        "Items Found".bright_blue(),
        result.entries_found
    );

    if let Some(ref decoded) = result.decoded_preview {
        println!("\n{}", "Content Preview".bright_blue());
        println!("{}", "─".repeat(80).dimmed());
        println!("{}", decoded);
    }

    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings".bright_yellow());
        println!("{}", "─".repeat(80).dimmed());
        for (i, warning) in result.warnings.iter().enumerate() {
            println!("{}. {}", i + 1, warning);
        }
    }

    if !result.errors.is_empty() {
        println!("\n{}", "Errors".bright_red());
        println!("{}", "─".repeat(80).dimmed());
        for (i, error) in result.errors.iter().enumerate() {
            println!("{}. {}", i + 1, error.bright_red());
        }
    }

    if !result.entries.is_empty() {
        println!("\n{}", "Feed Items".bright_green());
        println!("{}", "─".repeat(80).dimmed());
        for (i, entry) in result.entries.iter().enumerate() {
            println!(
                "{}. {}\n   {}",
                i + 1,
                entry.title.bright_white(),
                entry.link.bright_cyan()
            );
        }
    }

    if let (Some(keyword), rss::RssFeedStatus::Success) = (keyword, &result.status) {
        println!("\n{}  {}", "Keyword Scan".bright_blue(), keyword.bright_yellow());
        println!("{}", "─".repeat(80).dimmed());
        match rss::scan_items(&fetcher, result.entries.clone(), keyword).await {
            Ok(outcome) => match outcome.message {
                Some(message) => println!(
                    "{} of {} items matched, would send: {}",
                    outcome.matched,
                    outcome.scanned,
                    message.bright_green()
                ),
                None => println!("No items mention {}", keyword),
            },
            Err(err) => {
                eprintln!("Scan failed: {}", err.to_string().bright_red());
                process::exit(1);
            }
        }
    }

    println!("\n{}", "═".repeat(100).bright_blue());

    match result.status {
        rss::RssFeedStatus::Success => {
            println!(
                "Feed test completed successfully with {} items found",
                result.entries_found
            );
            Ok(())
        }
        _ => {
            eprintln!("Feed test completed with errors: {:?}", result.status);
            process::exit(1);
        }
    }
}

// Print usage instructions
fn print_usage(program_name: &str) {
    println!("Usage: {} <feed_url> [--keyword <word>]", program_name);
    println!("\nOptions:");
    println!("  --keyword <word>    Also fetch each item's page and report which would match");
    println!("\nExamples:");
    println!(
        "  {} http://www.bom.gov.au/fwo/IDZ00059.warnings_vic.xml",
        program_name
    );
    println!(
        "  {} http://www.bom.gov.au/fwo/IDZ00059.warnings_vic.xml --keyword Hawthorn",
        program_name
    );
}
