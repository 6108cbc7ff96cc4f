//! Atom 1.0 document rendering and writing.
//!
//! [`render_feed`] turns a [`Feed`] into indented XML text; [`write_feed`]
//! writes that text over the output file. The write is a plain overwrite: a
//! crash in the middle can leave a truncated file behind.

use crate::models::{Entry, Feed};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::error::Error;
use std::io::Cursor;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Serialize `feed` to a UTF-8 Atom document with a 2-space indent.
pub fn render_feed(feed: &Feed) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("feed").with_attributes([("xmlns", ATOM_NS)]),
    ))?;
    text_element(&mut writer, "title", &[], &feed.title)?;
    text_element(&mut writer, "updated", &[], &timestamp(&feed.updated))?;
    for entry in &feed.entries {
        write_entry(&mut writer, entry)?;
    }
    writer.write_event(Event::End(BytesEnd::new("feed")))?;

    let mut xml = String::from_utf8(writer.into_inner().into_inner())?;
    xml.push('\n');
    Ok(xml)
}

fn write_entry(writer: &mut Writer<Cursor<Vec<u8>>>, entry: &Entry) -> Result<(), Box<dyn Error>> {
    writer.write_event(Event::Start(BytesStart::new("entry")))?;
    text_element(writer, "title", &[], &entry.title)?;
    writer.write_event(Event::Empty(
        BytesStart::new("link").with_attributes([("href", entry.link.as_str())]),
    ))?;
    text_element(writer, "id", &[], &entry.link)?;
    text_element(writer, "updated", &[], &timestamp(&entry.updated))?;
    text_element(writer, "content", &[("type", "html")], &entry.content)?;
    writer.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

/// `<name attrs...>text</name>`; the text is escaped by quick-xml.
fn text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<(), Box<dyn Error>> {
    let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// RFC 3339 with an explicit `+00:00` offset.
fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Render `feed` and overwrite `path` with it, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display(), entries = feed.entries.len()))]
pub async fn write_feed(feed: &Feed, path: &Path) -> Result<(), Box<dyn Error>> {
    let xml = render_feed(feed)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, xml.as_bytes()).await?;

    info!(bytes = xml.len(), "Wrote Atom feed");
    Ok(())
}
