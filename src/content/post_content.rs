use std::fmt;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::content::markdown_renderer::Renderer;
use crate::content::parsing_utils::{extract_ident, extract_title, split_line};
use crate::content::{ParseError, PostIdent};
use crate::text_utils::{format_time, parse_post_stamp};

pub const UNTITLED: &str = "N/A";

/// The immutable part of a post, as parsed from its file.
#[derive(Debug, Clone, PartialEq)]
pub struct PostContent {
    pub file_name: PathBuf,
    pub ident: PostIdent,
    pub created: NaiveDateTime,
    pub title: String,
    pub raw: String,
    pub rendered: String,
}

impl fmt::Display for PostContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.title, self.ident, format_time(&self.created))
    }
}

/// Example of post, stored as `2020-01-01-10-00.md`
///
/// ```text
/// <!-- hello-world -->
/// # Hello World
/// Body text.
/// ```
pub fn parse_post(file_name: &Path, bytes: &[u8], untitled: &str, renderer: &dyn Renderer) -> Result<PostContent, ParseError> {
    let stem = file_name
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ParseError::BadFileName(file_name.to_string_lossy().to_string()))?;
    let created = parse_post_stamp(stem).map_err(ParseError::BadTimestamp)?;

    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::Encoding)?;

    let (ident_line, rest) = split_line(text);
    let ident = extract_ident(ident_line)?;

    let (title, raw) = match rest {
        Some(rest) => {
            let (title_line, body) = split_line(rest);
            (extract_title(title_line), body.unwrap_or(""))
        }
        None => (None, ""),
    };
    let title = title.unwrap_or_else(|| untitled.to_string());

    let rendered = renderer.render(raw)?;

    Ok(PostContent {
        file_name: file_name.to_path_buf(),
        ident,
        created,
        title,
        raw: raw.to_string(),
        rendered,
    })
}
