use clap::{Parser, ValueEnum};
use menu_finder::FetchMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "menu-finder")]
#[command(about = "Finds and ranks the menu links on restaurant websites")]
#[command(version)]
pub struct Args {
    /// Restaurant website URLs to search for menu links
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// How pages are fetched (overrides the config file)
    #[arg(short, long, value_enum)]
    pub mode: Option<FetchModeArg>,

    /// Number of sites fetched concurrently
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Per-page timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print one JSON report per line instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Also list every ranked candidate, rejects included
    #[arg(long)]
    pub all: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FetchModeArg {
    Http,
    Browser,
    Auto,
}

/// Convert from CLI argument fetch mode to the config fetch mode
pub fn convert_fetch_mode(arg: FetchModeArg) -> FetchMode {
    match arg {
        FetchModeArg::Http => FetchMode::Http,
        FetchModeArg::Browser => FetchMode::Browser,
        FetchModeArg::Auto => FetchMode::Auto,
    }
}
