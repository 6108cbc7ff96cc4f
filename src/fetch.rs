//! Polite JSON fetching.
//!
//! [`fetch_json`] is the only way the pipeline talks to the API after
//! bootstrap. It sleeps a fixed delay before every request, applies the
//! session timeout, and swallows every failure into `None` after logging it.
//! Callers treat `None` as "no data"; nothing here retries.

use crate::session::Session;
use serde_json::Value;
use std::error::Error;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// GET `url` with `params` as the query string and decode the body as JSON.
///
/// # Returns
///
/// The decoded body, or `None` on a transport error, a non-2xx status or an
/// undecodable body. Each failure is logged with the URL and reason.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_json(session: &Session, url: &str, params: &[(&str, &str)]) -> Option<Value> {
    sleep(session.config.request_delay).await;

    let t0 = Instant::now();
    match try_fetch_json(session, url, params).await {
        Ok(value) => {
            debug!(elapsed_ms = t0.elapsed().as_millis(), "Fetched JSON");
            Some(value)
        }
        Err(e) => {
            warn!(%url, error = %e, "Error fetching");
            None
        }
    }
}

async fn try_fetch_json(
    session: &Session,
    url: &str,
    params: &[(&str, &str)],
) -> Result<Value, Box<dyn Error>> {
    let value = session
        .client
        .get(url)
        .query(params)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await?;
    Ok(value)
}
