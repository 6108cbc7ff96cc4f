//! Data models for upstream records and the generated feed.
//!
//! - [`Program`]: one bug bounty program as listed by the API
//! - [`Target`]: one in-scope asset of a program
//! - [`DatedProgram`]: a program paired with its normalized launch time
//! - [`Feed`] / [`Entry`]: the document written to disk
//!
//! Upstream records are read defensively: every field is optional, unknown
//! fields are ignored, and text fields accept any scalar (a numeric `handle`
//! becomes `"12345"`), so a sparse or loosely typed record still deserializes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A bug bounty program as returned by `GET /programs`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Program {
    #[serde(default, deserialize_with = "scalar_string")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    /// Launch date in one of several formats; see [`crate::dates`].
    #[serde(default, deserialize_with = "scalar_string")]
    pub date_launched: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub profile_picture: Option<String>,
    /// Usually a number, occasionally a string or null.
    #[serde(default)]
    pub bounty_min: Option<Value>,
    /// Absent or null means the program has no upper bound.
    #[serde(default)]
    pub bounty_max: Option<Value>,
}

impl Program {
    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// The `platform:handle` key used to look up targets.
    pub fn pid(&self) -> String {
        format!(
            "{}:{}",
            self.platform(),
            self.handle.as_deref().unwrap_or_default()
        )
    }

    /// Upstream link, or `{program_base}/{pid}` when it is missing or empty.
    pub fn link_or(&self, program_base: &str) -> String {
        match self.link.as_deref() {
            Some(link) if !link.is_empty() => link.to_string(),
            _ => format!("{}/{}", program_base, self.pid()),
        }
    }
}

/// One scope item of a program.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Target {
    #[serde(default, deserialize_with = "scalar_string")]
    pub target_type: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub identifier: Option<String>,
}

/// Read a JSON scalar as text: strings as-is, numbers and booleans via their
/// JSON form, null as `None`.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Body of `GET /targets?program_id=...`.
#[derive(Debug, Default, Deserialize)]
pub struct TargetsResponse {
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A program that passed the launch-date filter.
#[derive(Debug, Clone)]
pub struct DatedProgram {
    pub program: Program,
    pub launched: DateTime<Utc>,
}

/// The Atom document for one run.
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub updated: DateTime<Utc>,
    /// Newest launch first.
    pub entries: Vec<Entry>,
}

/// One `<entry>`; `link` doubles as the Atom `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub updated: DateTime<Utc>,
    /// HTML fragment, stored as text inside `<content type="html">`.
    pub content: String,
}
