use lazy_static::lazy_static;
use regex::Regex;

use crate::content::{ParseError, PostIdent};

/// Splits off the first line, without its line terminator.
/// The remainder is `None` when the text has no newline at all.
pub fn split_line(text: &str) -> (&str, Option<&str>) {
    match text.find('\n') {
        Some(pos) => {
            let line = &text[..pos];
            let line = line.strip_suffix('\r').unwrap_or(line);
            (line, Some(&text[pos + 1..]))
        }
        None => (text.strip_suffix('\r').unwrap_or(text), None),
    }
}

/// First line of a post: `<!-- some-ident -->`
pub fn extract_ident(line: &str) -> Result<PostIdent, ParseError> {
    lazy_static! {
        static ref IDENT_REGEX: Regex = Regex::new(r"^\s*<!--(?P<ident>.*?)-->\s*$").unwrap();
        static ref SLUG_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_.\-]*$").unwrap();
    }

    let ident = IDENT_REGEX
        .captures(line)
        .and_then(|cap| cap.name("ident"))
        .map(|m| m.as_str().trim())
        .ok_or(ParseError::MissingIdent)?;

    if ident.is_empty() {
        return Err(ParseError::MissingIdent);
    }
    if !SLUG_REGEX.is_match(ident) {
        return Err(ParseError::InvalidIdent(ident.to_string()));
    }

    Ok(PostIdent(ident.to_string()))
}

/// Second line of a post, heading markup removed. Blank titles count as absent.
pub fn extract_title(line: &str) -> Option<String> {
    let title = line.trim_matches(|c: char| c == '#' || c.is_whitespace());
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
