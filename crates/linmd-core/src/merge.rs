//! Metadata block regeneration for a pull.
//!
//! The new block is composed in three layers, each skipping keys an earlier
//! layer already emitted:
//!
//! 1. the identity line,
//! 2. one line per configured attribute path that resolves on the record,
//! 3. every remaining line of the existing block, verbatim and in order.

use std::collections::HashSet;

use crate::frontmatter::header_lines;
use crate::identity::{identity_key, identity_line};
use crate::record::{Attributes, Record, RecordKind};
use crate::settings::TemplateConfig;
use crate::template::single_line;

/// Build the inner text of the metadata block for a pulled record.
///
/// Returns an empty string when the configuration suppresses the block.
#[must_use]
pub fn build_header(
    record: &Record,
    id: &str,
    kind: RecordKind,
    existing: Option<&str>,
    config: &TemplateConfig,
) -> String {
    if config.skip_frontmatter {
        return String::new();
    }

    let mut emitted: HashSet<String> = HashSet::new();
    let mut lines = vec![identity_line(kind, id)];
    emitted.insert(identity_key(kind));

    for path in config.extra_fields.iter().map(|p| p.trim()) {
        if path.is_empty() || emitted.contains(path) {
            continue;
        }
        if let Some(text) = record.attribute(path).and_then(|v| v.render()) {
            lines.push(format!("{path}: {}", single_line(&text)));
            emitted.insert(path.to_string());
        }
    }

    if let Some(existing) = existing {
        lines.extend(
            header_lines(existing)
                .filter(|(key, _)| !emitted.contains(*key))
                .map(|(_, line)| line.to_string()),
        );
    }

    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn config(fields: &[&str]) -> TemplateConfig {
        TemplateConfig {
            extra_fields: fields.iter().map(|s| (*s).to_string()).collect(),
            ..TemplateConfig::default()
        }
    }

    fn issue() -> Record {
        let mut team = BTreeMap::new();
        team.insert("name".to_string(), Value::from("Platform"));
        Record::issue("uuid-1", "Hello", "World")
            .with_identifier("ABC-1")
            .with_attribute("priority", 2.0)
            .with_attribute("team", Value::Object(team))
            .with_attribute(
                "dueDate",
                Utc.with_ymd_and_hms(2023, 4, 28, 0, 0, 0).unwrap(),
            )
            .with_attribute("notes", "line one\nline two")
    }

    #[test]
    fn identity_line_comes_first() {
        let header = build_header(&issue(), "ABC-1", RecordKind::Issue, None, &config(&[]));
        assert_eq!(header, "linear-issue-id: ABC-1");
    }

    #[test]
    fn configured_paths_render_in_order() {
        let header = build_header(
            &issue(),
            "ABC-1",
            RecordKind::Issue,
            None,
            &config(&["team.name", "priority", "dueDate", "team", "missing.path"]),
        );
        assert_eq!(
            header,
            "linear-issue-id: ABC-1\n\
             team.name: Platform\n\
             priority: 2\n\
             dueDate: 2023-04-28T00:00:00.000Z\n\
             team: Platform"
        );
    }

    #[test]
    fn multi_line_values_are_flattened() {
        let header = build_header(&issue(), "ABC-1", RecordKind::Issue, None, &config(&["notes"]));
        assert!(header.ends_with("notes: line one line two"));
    }

    #[test]
    fn user_lines_are_carried_over_verbatim() {
        let existing = "linear-issue-id: OLD-9\npriority:   urgent\nreviewer: sam\nfree text line";
        let header = build_header(
            &issue(),
            "ABC-1",
            RecordKind::Issue,
            Some(existing),
            &config(&["priority"]),
        );
        assert_eq!(
            header,
            "linear-issue-id: ABC-1\npriority: 2\nreviewer: sam\nfree text line"
        );
    }

    #[test]
    fn skip_frontmatter_yields_empty_header() {
        let cfg = TemplateConfig {
            skip_frontmatter: true,
            ..config(&["priority"])
        };
        assert_eq!(
            build_header(&issue(), "ABC-1", RecordKind::Issue, Some("a: b"), &cfg),
            ""
        );
    }

    #[test]
    fn document_identity_key() {
        let doc = Record::document("doc-1", "Roadmap", "");
        let header = build_header(&doc, "doc-1", RecordKind::Document, None, &config(&[]));
        assert_eq!(header, "linear-document-id: doc-1");
    }

    proptest! {
        #[test]
        fn rebuilding_keeps_exactly_one_identity_line(
            user_keys in proptest::collection::vec("[a-z]{1,8}", 0..5),
        ) {
            let existing: String = user_keys
                .iter()
                .map(|k| format!("{k}: value"))
                .collect::<Vec<_>>()
                .join("\n");
            let cfg = config(&["priority"]);
            let first = build_header(&issue(), "ABC-1", RecordKind::Issue, Some(&existing), &cfg);
            let second = build_header(&issue(), "ABC-1", RecordKind::Issue, Some(&first), &cfg);
            let count = second
                .lines()
                .filter(|l| l.starts_with("linear-issue-id:"))
                .count();
            prop_assert_eq!(count, 1);
            prop_assert_eq!(first, second);
        }
    }
}
