//! Run configuration.
//!
//! Every tunable the job uses lives in a single [`Config`] value that is built
//! once in `main` and handed to the session, fetcher and pipeline by reference.
//! The compiled-in defaults below are what a run uses when no flags are given.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Base URL of the upstream bounty aggregation API.
pub const DEFAULT_API_BASE: &str = "https://bbradar.io/api";
/// Public program page prefix, used when a program carries no link of its own.
pub const DEFAULT_PROGRAM_BASE: &str = "https://bbradar.io/program";
/// Where the Atom document is written, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "docs/feed.atom";
/// How many programs survive the coarse raw-date cut.
pub const DEFAULT_PROGRAM_LIMIT: usize = 100;
/// Pause before every API call.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 200;
/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Feed-level `<title>`.
pub const DEFAULT_FEED_TITLE: &str = "BBRadar Feed";

/// Settings for one run of the feed job.
#[derive(Debug, Clone)]
pub struct Config {
    /// API root; endpoint paths are appended to it.
    pub api_base: Url,
    /// Prefix for synthesized program links (`{program_base}/{pid}`).
    pub program_base: String,
    /// Output path, overwritten on every successful run.
    pub output_file: PathBuf,
    /// Cap applied after the raw `date_launched` sort.
    pub program_limit: usize,
    /// Fixed delay slept before each fetch.
    pub request_delay: Duration,
    /// Timeout for each HTTP request.
    pub request_timeout: Duration,
    /// Feed-level `<title>`.
    pub feed_title: String,
}

impl Config {
    /// Join an endpoint path onto the API base.
    ///
    /// The base is treated as a prefix rather than resolved with URL-join
    /// semantics, so `https://host/api` + `programs` gives
    /// `https://host/api/programs` whether or not the base has a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
            program_base: DEFAULT_PROGRAM_BASE.to_string(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            program_limit: DEFAULT_PROGRAM_LIMIT,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            feed_title: DEFAULT_FEED_TITLE.to_string(),
        }
    }
}
