//! HTML summary placed in each entry's `<content type="html">`.
//!
//! The fragment shows the program logo, platform and bounty range, followed
//! by the scope target list when there is one. Every interpolated value is
//! HTML-escaped; the surrounding markup is fixed.

use crate::models::{Program, Target};
use html_escape::{encode_single_quoted_attribute, encode_text};
use serde_json::Value;
use std::fmt::Write;

/// Shown in place of a missing upper bound.
pub const UNBOUNDED: &str = "Infinite";

/// Render the content fragment for one program.
///
/// # Output
///
/// ```text
/// <div><img src='LOGO' width='50' style='float:left; margin-right:10px;' />
/// <b>Platform:</b> PLATFORM<br/><b>Bounty:</b> $MIN - $MAX<br/></div><br clear='all'/>
/// <h3>Scope Targets</h3><ul><li>[TYPE] IDENTIFIER</li>...</ul>
/// ```
///
/// (shown wrapped; the real output has no line breaks). The `<img>` is left
/// out when the program has no picture and the target section is left out when
/// `targets` is empty.
pub fn content_html(program: &Program, targets: &[Target]) -> String {
    let mut html = String::from("<div>");

    if let Some(picture) = program.profile_picture.as_deref().filter(|p| !p.is_empty()) {
        let _ = write!(
            html,
            "<img src='{}' width='50' style='float:left; margin-right:10px;' />",
            encode_single_quoted_attribute(picture)
        );
    }

    let _ = write!(
        html,
        "<b>Platform:</b> {}<br/>",
        encode_text(program.platform())
    );
    let _ = write!(
        html,
        "<b>Bounty:</b> ${} - ${}<br/></div><br clear='all'/>",
        encode_text(&bounty_min_text(program.bounty_min.as_ref())),
        encode_text(&bounty_max_text(program.bounty_max.as_ref()))
    );

    if !targets.is_empty() {
        html.push_str("<h3>Scope Targets</h3><ul>");
        for target in targets {
            let _ = write!(
                html,
                "<li>[{}] {}</li>",
                encode_text(target.target_type.as_deref().unwrap_or_default()),
                encode_text(target.identifier.as_deref().unwrap_or_default())
            );
        }
        html.push_str("</ul>");
    }

    html
}

/// Lower bound with thousands separators; missing means `0`.
fn bounty_min_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::Number(n)) => group_thousands(&n.to_string()),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Upper bound as given; missing means [`UNBOUNDED`].
fn bounty_max_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNBOUNDED.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Insert `,` every three digits of the integer part: `12345.5` -> `12,345.5`.
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let digits = int_part.len();
    let mut grouped = String::with_capacity(digits + digits / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped}{frac_part}")
}
