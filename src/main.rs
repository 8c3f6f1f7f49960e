use clap::Parser;
use menu_finder::{Category, DiscoveryReport, FetchMode, FinderConfig, MenuFinder};
use std::sync::Arc;

mod args;
use args::{Args, convert_fetch_mode};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if config.fetch.mode != FetchMode::Http {
        ::log::info!(
            "Browser rendering uses the WebDriver server at {} (set WEBDRIVER_URL to change it)",
            config.fetch.webdriver_url
        );
    }

    let finder = match MenuFinder::new(config) {
        Ok(finder) => Arc::new(finder),
        Err(e) => {
            ::log::error!("Failed to start menu finder: {}", e);
            std::process::exit(2);
        }
    };

    let start_time = std::time::Instant::now();
    let reports = finder.discover_many(args.urls.clone()).await;

    for report in &reports {
        if args.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{line}"),
                Err(e) => ::log::error!("Failed to serialize report for {}: {}", report.url, e),
            }
        } else {
            print_report(report, args.all);
        }
    }

    let found = reports.iter().filter(|r| r.menu_url().is_some()).count();
    ::log::info!(
        "Discovery complete - menu links found for {} of {} sites in {:.2} seconds",
        found,
        reports.len(),
        start_time.elapsed().as_secs_f64()
    );
}

/// Layers config file, environment and CLI flags, in that order
fn build_config(args: &Args) -> Result<FinderConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => FinderConfig::from_file(path)?,
        None => FinderConfig::default(),
    };

    // Override the WebDriver URL with an environment variable if provided
    if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL")
        && !webdriver_url.is_empty()
    {
        config.fetch.webdriver_url = webdriver_url;
    }

    if let Some(mode) = args.mode {
        config.fetch.mode = convert_fetch_mode(mode);
    }
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err("concurrency must be at least 1".into());
        }
        config.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.fetch.timeout_secs = timeout;
    }

    Ok(config)
}

fn print_report(report: &DiscoveryReport, all: bool) {
    println!("{}", report.url);

    if let Some(error) = &report.error {
        println!("  fetch failed: {error}");
        return;
    }

    match report.menu_url() {
        Some(url) => println!("  menu: {url}"),
        None => println!("  no menu link found"),
    }

    for category in Category::ALL {
        if let Some(link) = report.result.best_for(category) {
            println!("  {:<7} {:>4}  {}", category.as_str(), link.score, link.url());
        }
    }

    if all {
        println!("  candidates:");
        for link in &report.result.ranked {
            println!(
                "    {:>4}  {:<7} {}  {:?}",
                link.score,
                link.category.as_str(),
                link.url(),
                link.link.source_text
            );
        }
    }
}
