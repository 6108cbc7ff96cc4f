//! The feed job: programs in, Atom file out.
//!
//! 1. Fetch the program list (`GET /programs`); no list means no output.
//! 2. Sort by the raw `date_launched` string, newest first, and keep the first
//!    `program_limit`.
//! 3. Normalize launch dates and drop anything launched after run start.
//! 4. Re-sort the survivors by normalized timestamp, newest first.
//! 5. For each survivor, one at a time, fetch its targets and build an entry.
//! 6. Write the feed.
//!
//! The cap in step 2 is taken on the raw strings, before normalization, so it
//! can keep a different set of programs than a single normalized sort would.

use crate::dates::parse_date;
use crate::fetch::fetch_json;
use crate::models::{DatedProgram, Entry, Feed, Program, Target, TargetsResponse};
use crate::outputs::{atom, content};
use crate::session::Session;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// How a run ended.
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// The feed was written to `path` with `entries` entries.
    Written { path: PathBuf, entries: usize },
    /// The program list was unavailable or empty; nothing was written.
    NoPrograms,
}

/// Run the whole job once.
///
/// # Errors
///
/// Only a failure to write the output file is an error. Fetch failures are
/// absorbed: a missing program list ends the run with
/// [`RunOutcome::NoPrograms`], a missing target list yields an entry with no
/// scope section.
#[instrument(level = "info", skip_all)]
pub async fn run(session: &Session) -> Result<RunOutcome, Box<dyn Error>> {
    let config = session.config();

    info!("Fetching program list...");
    let Some(programs) = fetch_programs(session).await else {
        warn!("No programs available; leaving existing feed untouched");
        return Ok(RunOutcome::NoPrograms);
    };

    let now = Utc::now();
    let dated = select_programs(programs, config.program_limit, now);

    info!(count = dated.len(), "Processing programs serially...");
    let entries = build_entries(session, &dated).await;

    let feed = Feed {
        title: config.feed_title.clone(),
        updated: now,
        entries,
    };
    atom::write_feed(&feed, &config.output_file).await?;

    info!(path = %config.output_file.display(), "Done.");
    Ok(RunOutcome::Written {
        path: config.output_file.clone(),
        entries: feed.entries.len(),
    })
}

/// `GET /programs`, decoded record by record.
///
/// Returns `None` when the fetch fails, the body is not a list, or the list is
/// empty. Items that are not objects are skipped.
async fn fetch_programs(session: &Session) -> Option<Vec<Program>> {
    let url = session.config().endpoint("programs");
    let items = match fetch_json(session, &url, &[]).await? {
        Value::Array(items) => items,
        other => {
            warn!(kind = %json_kind(&other), "Program list is not an array");
            return None;
        }
    };

    let programs: Vec<Program> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Program>(item) {
            Ok(program) => Some(program),
            Err(e) => {
                warn!(error = %e, "Skipping malformed program record");
                None
            }
        })
        .collect();

    info!(count = programs.len(), "Fetched program list");
    (!programs.is_empty()).then_some(programs)
}

/// Steps 2-4: raw sort and cap, launch-date filter, timestamp sort.
pub fn select_programs(programs: Vec<Program>, limit: usize, now: DateTime<Utc>) -> Vec<DatedProgram> {
    let mut dated: Vec<DatedProgram> = programs
        .into_iter()
        .sorted_by(|a, b| a.date_launched.cmp(&b.date_launched))
        .rev()
        .take(limit)
        .filter_map(|program| {
            let launched = parse_date(program.date_launched.as_deref());
            if launched.is_fallback() {
                debug!(name = %program.name(), ?launched, "Launch date fell back to current time");
            }
            let launched = launched.timestamp();
            (launched <= now).then_some(DatedProgram { program, launched })
        })
        .collect();

    dated.sort_by(|a, b| b.launched.cmp(&a.launched));
    dated
}

/// Step 5: fetch targets and build entries, strictly one program at a time.
async fn build_entries(session: &Session, dated: &[DatedProgram]) -> Vec<Entry> {
    let total = dated.len();
    stream::iter(dated.iter().enumerate())
        .then(|(i, item)| async move {
            info!("[{}/{}] {}", i + 1, total, item.program.name());
            let targets = fetch_targets(session, &item.program).await;
            build_entry(item, &targets, &session.config().program_base)
        })
        .collect()
        .await
}

/// `GET /targets?program_id=<pid>`; any failure yields an empty list.
async fn fetch_targets(session: &Session, program: &Program) -> Vec<Target> {
    let pid = program.pid();
    let url = session.config().endpoint("targets");
    let Some(body) = fetch_json(session, &url, &[("program_id", pid.as_str())]).await else {
        return Vec::new();
    };

    match serde_json::from_value::<TargetsResponse>(body) {
        Ok(resp) => resp.targets,
        Err(e) => {
            warn!(%pid, error = %e, "Unexpected targets payload; treating as empty");
            Vec::new()
        }
    }
}

/// One feed entry; `link` is reused as the Atom id.
pub fn build_entry(item: &DatedProgram, targets: &[Target], program_base: &str) -> Entry {
    let program = &item.program;
    Entry {
        title: format!("[{}] {}", program.platform(), program.name()),
        link: program.link_or(program_base),
        updated: item.launched,
        content: content::content_html(program, targets),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{serve, test_config, token_routes};
    use axum::Json;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::Path;

    fn program(handle: &str, date: &str) -> Program {
        Program {
            platform: Some("h1".to_string()),
            handle: Some(handle.to_string()),
            name: Some(handle.to_uppercase()),
            date_launched: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn handles(dated: &[DatedProgram]) -> Vec<&str> {
        dated
            .iter()
            .map(|d| d.program.handle.as_deref().unwrap())
            .collect()
    }

    /// Positions of `needles` in `haystack`, panicking on any that is absent.
    fn positions(haystack: &str, needles: &[&str]) -> Vec<usize> {
        needles
            .iter()
            .map(|n| haystack.find(n).unwrap_or_else(|| panic!("{n} not in output")))
            .collect()
    }

    async fn start_upstream(programs: Value, failing_pid: Option<&'static str>) -> Session {
        let targets = move |Query(q): Query<HashMap<String, String>>| async move {
            let pid = q.get("program_id").cloned().unwrap_or_default();
            if Some(pid.as_str()) == failing_pid {
                return StatusCode::BAD_GATEWAY.into_response();
            }
            Json(json!({ "targets": [
                { "target_type": "url", "identifier": format!("{pid}.example.com") }
            ]}))
            .into_response()
        };
        let app = token_routes()
            .route(
                "/api/programs",
                get(move || {
                    let programs = programs.clone();
                    async move { Json(programs) }
                }),
            )
            .route("/api/targets", get(targets));
        let addr = serve(app).await;
        Session::bootstrap(&test_config(addr)).await.unwrap()
    }

    fn with_output(mut session: Session, path: &Path) -> Session {
        session.config.output_file = path.to_path_buf();
        session
    }

    #[test]
    fn test_select_filters_future_and_sorts_descending() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let programs = vec![
            program("c", "2024-01-03"),
            program("a", "2024-01-01"),
            program("f", "2030-01-01"),
            program("j", "2024-06-01"),
        ];

        let dated = select_programs(programs, 100, now);
        assert_eq!(handles(&dated), vec!["j", "c", "a"]);
        assert!(dated.iter().all(|d| d.launched <= now));
    }

    #[test]
    fn test_select_launch_exactly_now_is_kept() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let dated = select_programs(vec![program("edge", "2024-01-01")], 10, now);
        assert_eq!(handles(&dated), vec!["edge"]);
    }

    #[test]
    fn test_select_cap_uses_raw_strings_before_normalizing() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        // 'T' sorts above ' ', so both ISO values beat the noon value as raw
        // strings even though noon is the newest instant. The cap keeps the
        // two ISO programs and noon never reaches the timestamp sort.
        let programs = vec![
            program("noon", "2024-05-01 12:00:00"),
            program("midnight", "2024-05-01T00:00:00.000Z"),
            program("one_am", "2024-05-01T01:00:00.000Z"),
        ];

        let dated = select_programs(programs, 2, now);
        assert_eq!(handles(&dated), vec!["one_am", "midnight"]);
    }

    #[test]
    fn test_select_cap_can_drop_newer_normalized_dates() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        // "garbage" sorts above every digit-led date as a raw string, takes the
        // single slot, then falls back to a time after `now` and is filtered.
        let programs = vec![program("dated", "2024-06-01"), program("junk", "garbage")];

        let dated = select_programs(programs, 1, now);
        assert!(dated.is_empty());
    }

    #[test]
    fn test_select_missing_date_is_excluded() {
        let now = Utc::now() - Duration::seconds(1);
        let mut undated = program("none", "");
        undated.date_launched = None;

        let dated = select_programs(vec![undated, program("ok", "2024-01-01")], 10, now);
        assert_eq!(handles(&dated), vec!["ok"]);
    }

    #[test]
    fn test_build_entry_fields() {
        let item = DatedProgram {
            program: Program {
                link: None,
                ..program("acme", "2024-01-01")
            },
            launched: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let entry = build_entry(&item, &[], "https://bbradar.io/program");

        assert_eq!(entry.title, "[h1] ACME");
        assert_eq!(entry.link, "https://bbradar.io/program/h1:acme");
        assert_eq!(entry.updated, item.launched);
        assert!(entry.content.starts_with("<div>"));
    }

    #[tokio::test]
    async fn test_run_end_to_end_orders_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("docs").join("feed.atom");
        let programs = json!([
            { "platform": "h1", "handle": "third", "name": "Third", "date_launched": "2024-01-03" },
            { "platform": "h1", "handle": "first", "name": "First", "date_launched": "2024-01-01" },
            { "platform": "h1", "handle": "june", "name": "June", "date_launched": "2024-06-01" },
            { "platform": "h1", "handle": "future", "name": "Future", "date_launched": "2999-01-01" }
        ]);
        let session = with_output(start_upstream(programs, None).await, &out);

        let outcome = run(&session).await.unwrap();
        assert_eq!(outcome, RunOutcome::Written { path: out.clone(), entries: 3 });

        let xml = std::fs::read_to_string(&out).unwrap();
        assert_eq!(xml.matches("<entry>").count(), 3);
        assert!(!xml.contains("Future"));
        let pos = positions(&xml, &["[h1] June", "[h1] Third", "[h1] First"]);
        assert!(pos[0] < pos[1] && pos[1] < pos[2]);
        assert!(xml.contains("<id>https://bbradar.io/program/h1:june</id>"));
        assert!(xml.contains("h1:june.example.com"));
    }

    #[tokio::test]
    async fn test_run_failed_target_fetch_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.atom");
        let programs = json!([
            { "platform": "h1", "handle": "ok", "name": "Ok", "date_launched": "2024-02-01" },
            { "platform": "h1", "handle": "down", "name": "Down", "date_launched": "2024-01-01",
              "link": "https://hackerone.com/down" }
        ]);
        let session = with_output(start_upstream(programs, Some("h1:down")).await, &out);

        run(&session).await.unwrap();
        let xml = std::fs::read_to_string(&out).unwrap();

        assert_eq!(xml.matches("<entry>").count(), 2);
        let down = &xml[xml.find("[h1] Down").unwrap()..];
        let down = &down[..down.find("</entry>").unwrap()];
        assert!(down.contains("<id>https://hackerone.com/down</id>"));
        assert!(!down.contains("Scope Targets"));
        assert!(!down.contains("&lt;ul&gt;"));

        let ok = &xml[xml.find("[h1] Ok").unwrap()..];
        assert!(ok.contains("[url] h1:ok.example.com"));
    }

    #[tokio::test]
    async fn test_run_unbounded_max_in_content() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.atom");
        let programs = json!([
            { "platform": "bugcrowd", "handle": "acme", "name": "Acme",
              "date_launched": "2024-03-01 10:00:00", "bounty_min": 100 }
        ]);
        let session = with_output(start_upstream(programs, None).await, &out);

        run(&session).await.unwrap();
        let xml = std::fs::read_to_string(&out).unwrap();
        assert!(xml.contains("$100 - $Infinite"));
    }

    #[tokio::test]
    async fn test_run_without_program_list_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.atom");
        std::fs::write(&out, "sentinel").unwrap();

        let app = token_routes().route(
            "/api/programs",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let addr = serve(app).await;
        let session = with_output(Session::bootstrap(&test_config(addr)).await.unwrap(), &out);

        assert_eq!(run(&session).await.unwrap(), RunOutcome::NoPrograms);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "sentinel");
    }

    #[tokio::test]
    async fn test_run_with_empty_or_odd_program_list_writes_nothing() {
        for body in [json!([]), json!({ "programs": [] })] {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("feed.atom");
            let session = with_output(start_upstream(body, None).await, &out);

            assert_eq!(run(&session).await.unwrap(), RunOutcome::NoPrograms);
            assert!(!out.exists());
        }
    }

    #[tokio::test]
    async fn test_run_skips_non_object_records() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.atom");
        let programs = json!([
            "not a program",
            { "platform": "h1", "handle": "real", "name": "Real", "date_launched": "2024-01-01" }
        ]);
        let session = with_output(start_upstream(programs, None).await, &out);

        let outcome = run(&session).await.unwrap();
        assert_eq!(outcome, RunOutcome::Written { path: out, entries: 1 });
    }

    #[tokio::test]
    async fn test_run_numeric_handle_keeps_program() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("feed.atom");
        let programs = json!([
            { "platform": "yeswehack", "handle": 12345, "name": "Numeric",
              "date_launched": "2024-01-01" }
        ]);
        let session = with_output(start_upstream(programs, None).await, &out);

        let outcome = run(&session).await.unwrap();
        assert_eq!(outcome, RunOutcome::Written { path: out.clone(), entries: 1 });

        let xml = std::fs::read_to_string(&out).unwrap();
        assert!(xml.contains("<id>https://bbradar.io/program/yeswehack:12345</id>"));
        assert!(xml.contains("[url] yeswehack:12345.example.com"));
    }
}
