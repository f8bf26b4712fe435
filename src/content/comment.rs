use std::fmt;
use std::fmt::Formatter;

use chrono::{DateTime, Utc};
use quick_xml::escape::{escape, unescape};

use crate::content::markdown_renderer::Renderer;
use crate::content::ParseError;
use crate::text_utils::{format_time, time_from_nanos};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// File number inside the post's comment directory.
    pub id: u32,
    pub name: String,
    pub email: String,
    pub created: DateTime<Utc>,
    pub body: String,
    pub rendered: String,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, format_time(&self.created.naive_utc()))
    }
}

/// Comment files are named `1`, `2`, `3`...
pub fn comment_id(file_name: &str) -> Option<u32> {
    if file_name.is_empty() || file_name.starts_with('0') || !file_name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    file_name.parse::<u32>().ok()
}

/// Layout of a comment file:
///
/// ```text
/// author
/// email (may be blank)
/// created, in nanoseconds since epoch
/// body...
/// ```
pub fn parse_comment(file_name: &str, bytes: &[u8], renderer: &dyn Renderer) -> Result<Comment, ParseError> {
    let id = comment_id(file_name).ok_or_else(|| ParseError::BadFileName(file_name.to_string()))?;
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::Encoding)?;

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 {
        return Err(ParseError::MissingFields);
    }

    let stamp = lines[2].trim();
    let created = stamp
        .parse::<i64>()
        .ok()
        .and_then(time_from_nanos)
        .ok_or_else(|| ParseError::BadTimestamp(stamp.to_string()))?;

    let body = unescape_field(&lines[3..].join("\n"));
    let rendered = renderer.render(&body)?;

    Ok(Comment {
        id,
        name: unescape_field(lines[0].trim()),
        email: unescape_field(lines[1].trim()),
        created,
        body,
        rendered,
    })
}

/// Records are stored escaped. Hand-edited files with a bare `&` are kept as written.
fn unescape_field(field: &str) -> String {
    match unescape(field) {
        Ok(text) => text.into_owned(),
        Err(_) => field.to_string(),
    }
}

/// Builds the on-disk record. Every field is HTML-escaped; line breaks are kept.
pub fn comment_record(author: &str, email: &str, created_nanos: i64, body: &str) -> String {
    let nanos = created_nanos.to_string();
    [author, email, nanos.as_str(), body].map(|field| escape(field)).join("\n")
}

#[cfg(test)]
mod tests {
    use crate::content::markdown_renderer::MarkdownRenderer;
    use crate::test_data::COMMENT_DATA;

    use super::*;

    fn parse(file_name: &str, content: &str) -> Result<Comment, ParseError> {
        parse_comment(file_name, content.as_bytes(), &MarkdownRenderer::safe())
    }

    #[test]
    fn test_parse_comment() {
        let comment = parse("2", COMMENT_DATA).unwrap();
        assert_eq!(comment.id, 2);
        assert_eq!(comment.name, "Alice");
        assert_eq!(comment.email, "alice@example.org");
        assert_eq!(comment.created, time_from_nanos(1_577_872_800_000_000_000).unwrap());
        assert_eq!(comment.body, "Great read.\n\nThanks for *sharing*.");
        assert!(comment.rendered.contains("<em>sharing</em>"));
        assert_eq!(comment.to_string(), "Alice (01/01/2020 at 10:00am)");
    }

    #[test]
    fn test_blank_email_and_empty_body() {
        let comment = parse("1", "Bob\n\n1577872800000000000").unwrap();
        assert_eq!(comment.email, "");
        assert_eq!(comment.body, "");
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(parse("1", "Bob\n\n"), Err(ParseError::MissingFields));
        assert_eq!(parse("1", ""), Err(ParseError::MissingFields));
    }

    #[test]
    fn test_bad_timestamp() {
        assert_eq!(parse("1", "Bob\n\nyesterday\nbody"), Err(ParseError::BadTimestamp("yesterday".to_string())));
    }

    #[test]
    fn test_bad_file_name() {
        assert_eq!(parse(".tmpA1b2", COMMENT_DATA), Err(ParseError::BadFileName(".tmpA1b2".to_string())));
        assert_eq!(parse("03", COMMENT_DATA), Err(ParseError::BadFileName("03".to_string())));
    }

    #[test]
    fn test_comment_id() {
        assert_eq!(comment_id("1"), Some(1));
        assert_eq!(comment_id("42"), Some(42));
        assert_eq!(comment_id("0"), None);
        assert_eq!(comment_id("+1"), None);
        assert_eq!(comment_id("1.txt"), None);
        assert_eq!(comment_id(""), None);
    }

    #[test]
    fn test_record_is_escaped_and_parses_back() {
        let record = comment_record("<Bob>", "", 1_577_872_800_000_000_000, "I <3 \"this\"\nsecond line");
        assert_eq!(record, "&lt;Bob&gt;\n\n1577872800000000000\nI &lt;3 &quot;this&quot;\nsecond line");

        let comment = parse("3", &record).unwrap();
        assert_eq!(comment.name, "<Bob>");
        assert_eq!(comment.body, "I <3 \"this\"\nsecond line");
        assert!(!comment.rendered.contains("<3"));
        assert!(comment.rendered.contains("I &lt;3"));
    }

    #[test]
    fn test_markdown_renders_over_submitted_text() {
        let record = comment_record("O'Brien", "", 1_577_872_800_000_000_000, "Use `a < b && c`\n\n> quoted");
        let comment = parse("1", &record).unwrap();
        assert_eq!(comment.name, "O'Brien");
        assert!(comment.rendered.contains("<code>a &lt; b &amp;&amp; c</code>"));
        assert!(comment.rendered.contains("<blockquote>"));
    }

    #[test]
    fn test_older_escaped_records_still_parse() {
        let comment = parse("1", "Tom &amp; Jerry\n\n1577872800000000000\n&#34;hi&#34; &#39;there&#39;").unwrap();
        assert_eq!(comment.name, "Tom & Jerry");
        assert_eq!(comment.body, "\"hi\" 'there'");
    }

    #[test]
    fn test_bare_ampersand_is_kept() {
        let comment = parse("1", "Tom & Jerry\n\n1577872800000000000\nfish & chips").unwrap();
        assert_eq!(comment.name, "Tom & Jerry");
        assert_eq!(comment.body, "fish & chips");
    }
}
