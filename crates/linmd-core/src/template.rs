//! Filename templates.
//!
//! A template is plain text with `${...}` tokens:
//!
//! | token       | expands to                                                 |
//! |-------------|------------------------------------------------------------|
//! | `${title}`  | record title, or `Untitled`                                |
//! | `${id}`     | ticket identifier for issues that have one, else the id   |
//! | `${type}`   | `issue` or `document`                                      |
//! | `${date}`   | today's date in the configured [`DateFormat`]              |
//! | `${ticket}` | same as `${id}`; kept so older templates keep working      |
//!
//! Expansion is a single pass, so text substituted for one token is never
//! expanded again by another.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::LinmdError;
use crate::record::{Record, RecordKind};

/// Extension every synced file carries.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Characters that may not appear in a generated file or directory name.
pub const FORBIDDEN_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

const UNTITLED: &str = "Untitled";

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(title|id|type|date|ticket)\}").expect("valid regex"))
}

/// How `${date}` is rendered. All fields are zero-padded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    #[serde(rename = "ISO")]
    Iso,
    /// `YYMMDD`
    Short,
    /// `YYYYMMDD`
    #[default]
    #[serde(rename = "YMD")]
    Ymd,
    /// `DDMMYYYY`
    #[serde(rename = "DMY")]
    Dmy,
    /// `MMDDYYYY`
    #[serde(rename = "MDY")]
    Mdy,
}

impl DateFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iso => "ISO",
            Self::Short => "Short",
            Self::Ymd => "YMD",
            Self::Dmy => "DMY",
            Self::Mdy => "MDY",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Self::Iso => "%Y-%m-%d",
            Self::Short => "%y%m%d",
            Self::Ymd => "%Y%m%d",
            Self::Dmy => "%d%m%Y",
            Self::Mdy => "%m%d%Y",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFormat {
    type Err = LinmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ISO" => Ok(Self::Iso),
            "Short" => Ok(Self::Short),
            "YMD" => Ok(Self::Ymd),
            "DMY" => Ok(Self::Dmy),
            "MDY" => Ok(Self::Mdy),
            other => Err(LinmdError::Config(format!(
                "unknown date format '{other}': expected one of ISO, Short, YMD, DMY, MDY"
            ))),
        }
    }
}

/// Format a calendar date.
#[must_use]
pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    date.format(format.pattern()).to_string()
}

/// Substitute template tokens for a record. The result is not yet sanitized.
#[must_use]
pub fn expand(
    template: &str,
    record: &Record,
    fallback_id: &str,
    kind: RecordKind,
    today: NaiveDate,
    date_format: DateFormat,
) -> String {
    let title = if record.title.is_empty() {
        UNTITLED
    } else {
        record.title.as_str()
    };
    let id = match kind {
        RecordKind::Issue => record.ticket_identifier().unwrap_or(fallback_id),
        RecordKind::Document => fallback_id,
    };
    let date = format_date(today, date_format);

    token_re()
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "title" => title.to_string(),
            "id" | "ticket" => id.to_string(),
            "type" => kind.as_str().to_string(),
            _ => date.clone(),
        })
        .into_owned()
}

/// Replace every forbidden character with `-`.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Make an expanded template safe to use as a file name.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    ensure_extension(&sanitize_component(raw))
}

/// Append `.md` unless the name already ends with it (case-insensitive).
#[must_use]
pub fn ensure_extension(name: &str) -> String {
    if name.to_lowercase().ends_with(MARKDOWN_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{MARKDOWN_EXTENSION}")
    }
}

/// Flatten a metadata value onto one line so it cannot break the block.
#[must_use]
pub fn single_line(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
