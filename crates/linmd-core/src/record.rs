//! Remote records and their attribute bag.
//!
//! A [`Record`] is a read-through copy of an issue or a document owned by the
//! remote service. Besides its fixed fields it carries an open-ended bag of
//! named attributes (scalars, dates and nested objects) which the frontmatter
//! merger and the path resolver reach into with dotted paths such as
//! `team.name`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LinmdError;

/// Rendering used when an object value has no `name`, no `id` and cannot
/// be written out as structured text.
pub const COMPLEX_OBJECT: &str = "[Complex Object]";

/// The two record variants the remote service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Issue,
    Document,
}

impl RecordKind {
    /// The literal used in identity keys and the `${type}` template token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = LinmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(Self::Issue),
            "document" => Ok(Self::Document),
            other => Err(LinmdError::Serialization(format!(
                "unknown record type '{other}'"
            ))),
        }
    }
}

/// A dynamically typed attribute value.
///
/// Deserialization is untagged: any string that parses as an RFC 3339
/// timestamp becomes a [`Value::Date`], every other string stays a
/// [`Value::String`]. Dates render in UTC with millisecond precision, so a
/// timestamp written with an offset comes back normalized:
/// `2023-04-28T00:00:00+02:00` renders as `2023-04-27T22:00:00.000Z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Render the value as the text of a metadata line.
    ///
    /// Returns `None` for [`Value::Null`], which callers treat as absent.
    /// Objects render their `name`, else their `id`, else a JSON rendering.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(render_number(*n)),
            Self::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::String(s) => Some(s.clone()),
            Self::List(_) => Some(self.structured_text()),
            Self::Object(map) => {
                let named = map
                    .get("name")
                    .and_then(Value::render)
                    .or_else(|| map.get("id").and_then(Value::render));
                Some(named.unwrap_or_else(|| self.structured_text()))
            }
        }
    }

    fn structured_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| COMPLEX_OBJECT.to_string())
    }

    /// Look up a key when this value is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(map) => map.get(key),
            Self::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Dotted-path access into a record's attributes.
pub trait Attributes {
    /// Resolve a single top-level attribute name.
    fn field(&self, name: &str) -> Option<Value>;

    /// Resolve a dot-separated path such as `team.name`.
    ///
    /// A missing segment or a null value anywhere along the way yields `None`.
    fn attribute(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.field(first)?;
        for segment in segments {
            current = current.get(segment)?.clone();
        }
        match current {
            Value::Null => None,
            value => Some(value),
        }
    }
}

/// An issue or document fetched from the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// Stable id used to address updates.
    pub id: String,

    /// Human ticket identifier such as `ABC-12` (issues only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default)]
    pub title: String,

    /// Description for issues, content for documents.
    #[serde(default)]
    pub body: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl Record {
    /// Create an issue with no extra attributes.
    pub fn issue(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Issue,
            id: id.into(),
            identifier: None,
            title: title.into(),
            body: body.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Create a document with no extra attributes.
    pub fn document(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind: RecordKind::Document,
            ..Self::issue(id, title, body)
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The human ticket identifier, only for issues that expose one.
    #[must_use]
    pub fn ticket_identifier(&self) -> Option<&str> {
        match self.kind {
            RecordKind::Issue => self.identifier.as_deref().filter(|s| !s.is_empty()),
            RecordKind::Document => None,
        }
    }

    /// The `name` of a nested object attribute such as `team` or `state`.
    #[must_use]
    pub fn nested_name(&self, attribute: &str) -> Option<String> {
        self.attribute(&format!("{attribute}.name"))
            .and_then(|v| v.render())
            .filter(|s| !s.is_empty())
    }
}

impl Attributes for Record {
    fn field(&self, name: &str) -> Option<Value> {
        match (name, self.kind) {
            ("id", _) => Some(Value::from(self.id.as_str())),
            ("title", _) => Some(Value::from(self.title.as_str())),
            ("identifier", RecordKind::Issue) => self.identifier.as_deref().map(Value::from),
            ("description", RecordKind::Issue) | ("content", RecordKind::Document) => {
                Some(Value::from(self.body.as_str()))
            }
            _ => self.attributes.get(name).cloned(),
        }
    }
}
