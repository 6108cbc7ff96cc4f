//! Session bootstrap for the upstream API.
//!
//! The API refuses requests that do not carry a CSRF token. Getting one is a
//! two step dance:
//!
//! 1. `GET  {base}/frontend-token` returns `{"frontend_token": "..."}`
//! 2. `POST {base}/csrf-token` with that token returns `{"csrf_token": "..."}`
//!
//! The CSRF token is then baked into a browser-like default header set on a
//! single [`reqwest::Client`]. Tokens are fetched once per run and assumed to
//! stay valid until the job exits.

use crate::config::Config;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use serde_json::{Value, json};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, info, instrument};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:146.0) Gecko/20100101 Firefox/146.0";
const BROWSER_REFERER: &str = "https://bbradar.io/";

/// Authenticated client state shared by every fetch in a run.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) client: Client,
    pub(crate) config: Config,
}

impl Session {
    /// Acquire the frontend and CSRF tokens and build the request client.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-2xx status, or response without the expected
    /// string field aborts the bootstrap. There is no retry.
    #[instrument(level = "info", skip_all, fields(api_base = %config.api_base))]
    pub async fn bootstrap(config: &Config) -> Result<Self, Box<dyn Error>> {
        let t0 = Instant::now();
        let bootstrap_client = Client::builder().timeout(config.request_timeout).build()?;

        let frontend: Value = bootstrap_client
            .get(config.endpoint("frontend-token"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let frontend_token = string_field(&frontend, "frontend_token")?;
        debug!("Obtained frontend token");

        let csrf: Value = bootstrap_client
            .post(config.endpoint("csrf-token"))
            .json(&json!({ "frontend_token": frontend_token }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let csrf_token = string_field(&csrf, "csrf_token")?;

        let client = Client::builder()
            .default_headers(default_headers(csrf_token)?)
            .timeout(config.request_timeout)
            .build()?;

        info!(elapsed_ms = t0.elapsed().as_millis(), "Session established");
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Pull a required string field out of a token response.
fn string_field<'a>(body: &'a Value, field: &str) -> Result<&'a str, Box<dyn Error>> {
    body.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("token response has no string field `{field}`").into())
}

/// The fixed header set sent on every API call after bootstrap.
fn default_headers(csrf_token: &str) -> Result<HeaderMap, Box<dyn Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static("x-csrf-token"), HeaderValue::from_str(csrf_token)?);
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(HeaderName::from_static("priority"), HeaderValue::from_static("u=4"));
    Ok(headers)
}
