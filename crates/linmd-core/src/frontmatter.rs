//! Metadata block parsing and writing.
//!
//! Handles the `---` delimited block of `key: value` lines at the top of a
//! synced markdown file. Format:
//! ```markdown
//! ---
//! linear-issue-id: ABC-12
//! team.name: Platform
//! ---
//!
//! ## Body content here
//! ```
//!
//! Values are kept as raw text. The block is never parsed as YAML, so
//! user-authored lines survive a sync byte for byte.

use crate::error::HeaderError;

/// Delimiter line opening and closing the metadata block.
pub const MARKER: &str = "---";

/// A document split into its metadata block and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSplit<'a> {
    /// Inner text of the block, trimmed, without the delimiters.
    pub header: &'a str,
    /// Everything strictly after the closing delimiter line.
    pub body: &'a str,
}

impl<'a> HeaderSplit<'a> {
    /// The body with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed_body(&self) -> &'a str {
        self.body.trim()
    }
}

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

/// Whether `text` opens with a delimiter line and closes it later on.
#[must_use]
pub fn has_header(text: &str) -> bool {
    !matches!(
        split_header(text),
        Err(HeaderError::Missing | HeaderError::Unclosed)
    )
}

/// Split a document into its metadata block and body.
///
/// # Errors
///
/// Returns [`HeaderError::Missing`] if the text does not start with a
/// delimiter line, [`HeaderError::Unclosed`] if no closing delimiter follows,
/// and [`HeaderError::BodyNotFound`] if the closing delimiter is the last
/// thing in the file with no line break after it.
pub fn split_header(text: &str) -> Result<HeaderSplit<'_>, HeaderError> {
    let (header, body_start) = scan(text)?;
    let body_start = body_start.ok_or(HeaderError::BodyNotFound)?;
    Ok(HeaderSplit {
        header,
        body: &text[body_start..],
    })
}

/// Inner text of the metadata block, whether or not anything follows it.
///
/// # Errors
///
/// Returns [`HeaderError::Missing`] or [`HeaderError::Unclosed`] as
/// [`split_header`] does. A block closed at the very end of the file is
/// accepted.
pub fn header_text(text: &str) -> Result<&str, HeaderError> {
    scan(text).map(|(header, _)| header)
}

/// Locate the block: its trimmed inner text and the offset of the body, if
/// a line break follows the closing delimiter.
fn scan(text: &str) -> Result<(&str, Option<usize>), HeaderError> {
    let Some(first_end) = text.find('\n') else {
        return Err(if is_marker(text) {
            HeaderError::Unclosed
        } else {
            HeaderError::Missing
        });
    };
    if !is_marker(&text[..first_end]) {
        return Err(HeaderError::Missing);
    }

    let header_start = first_end + 1;
    let mut offset = header_start;
    loop {
        let rest = &text[offset..];
        let (line, next) = match rest.find('\n') {
            Some(i) => (&rest[..i], Some(offset + i + 1)),
            None => (rest, None),
        };

        if is_marker(line) {
            return Ok((text[header_start..offset].trim(), next));
        }

        match next {
            Some(n) => offset = n,
            None => return Err(HeaderError::Unclosed),
        }
    }
}

/// Assemble a document from block text and body.
///
/// The block is followed by exactly one blank line before the body.
#[must_use]
pub fn wrap(header: &str, body: &str) -> String {
    let header = header.trim();
    let mut output = String::with_capacity(header.len() + body.len() + 10);
    output.push_str(MARKER);
    output.push('\n');
    if !header.is_empty() {
        output.push_str(header);
        output.push('\n');
    }
    output.push_str(MARKER);
    output.push_str("\n\n");
    output.push_str(body);
    output
}

/// Iterate the non-empty lines of a block as `(key, line)` pairs.
///
/// The key is the trimmed text before the first colon; the line is returned
/// verbatim so it can be carried over untouched.
pub fn header_lines(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let key = line.split_once(':').map_or(line, |(k, _)| k).trim();
            (key, line)
        })
}

/// Make sure text ends with exactly the line break it needs to be written.
#[must_use]
pub fn ensure_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
