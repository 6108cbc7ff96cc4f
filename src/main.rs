//! # BBRadar Feed
//!
//! A batch job that polls the BBRadar bug bounty aggregation API and writes an
//! Atom feed of recently launched programs together with their in-scope
//! targets.
//!
//! ## Usage
//!
//! ```sh
//! bbradar_feed                      # writes docs/feed.atom
//! bbradar_feed -o public/feed.atom  # somewhere else
//! ```
//!
//! ## Architecture
//!
//! The run is strictly sequential:
//! 1. **Session**: exchange a frontend token for a CSRF token
//! 2. **Programs**: fetch the program list, sort, cap and filter by launch date
//! 3. **Targets**: fetch each program's scope, one request at a time
//! 4. **Output**: render the Atom document and overwrite the output file

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod session;

use cli::Cli;
use config::Config;
use pipeline::RunOutcome;
use session::Session;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("bbradar_feed starting up");

    let config = Config::from(Cli::parse());
    debug!(?config, "Resolved configuration");

    // Token failures are fatal: nothing is written.
    let session = Session::bootstrap(&config).await?;

    match pipeline::run(&session).await? {
        RunOutcome::Written { path, entries } => {
            info!(path = %path.display(), entries, "Feed written");
        }
        RunOutcome::NoPrograms => {
            warn!("Program list unavailable; feed not updated");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
