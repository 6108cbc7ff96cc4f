//! Command-line interface definitions for the BBRadar feed job.
//!
//! Every flag is optional. With no arguments the job runs against the public
//! API and writes `docs/feed.atom`, which is how it is normally scheduled.

use crate::config::{
    Config, DEFAULT_API_BASE, DEFAULT_FEED_TITLE, DEFAULT_OUTPUT_FILE, DEFAULT_PROGRAM_BASE,
    DEFAULT_PROGRAM_LIMIT, DEFAULT_REQUEST_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Command-line arguments for the feed job.
///
/// # Examples
///
/// ```sh
/// # Normal scheduled run
/// bbradar_feed
///
/// # Write somewhere else and keep only the 20 newest programs
/// bbradar_feed -o /srv/www/feed.atom --limit 20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the upstream API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: Url,

    /// Prefix for program links synthesized from `platform:handle`
    #[arg(long, default_value = DEFAULT_PROGRAM_BASE)]
    pub program_base: String,

    /// Path of the Atom file to (over)write
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Number of programs kept after sorting by launch date
    #[arg(short, long, default_value_t = DEFAULT_PROGRAM_LIMIT)]
    pub limit: usize,

    /// Delay in milliseconds before every API request
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    pub delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Feed title
    #[arg(long, default_value = DEFAULT_FEED_TITLE)]
    pub title: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            api_base: cli.api_base,
            program_base: cli.program_base.trim_end_matches('/').to_string(),
            output_file: cli.output,
            program_limit: cli.limit,
            request_delay: Duration::from_millis(cli.delay_ms),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            feed_title: cli.title,
        }
    }
}
