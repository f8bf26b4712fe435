use std::fmt;

use thiserror::Error;

pub mod comment;
pub mod markdown_renderer;
pub mod parsing_utils;
pub mod post_content;

/// Why a single post or comment file was rejected. Never fatal for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("bad timestamp: {0}")]
    BadTimestamp(String),
    #[error("missing ident")]
    MissingIdent,
    #[error("invalid ident '{0}'")]
    InvalidIdent(String),
    #[error("missing fields: expected name, email and timestamp lines")]
    MissingFields,
    #[error("bad file name '{0}'")]
    BadFileName(String),
    #[error("file is not valid UTF-8")]
    Encoding,
    #[error("markdown rendering failed: {0}")]
    Render(String),
}

/// URL slug of a post. Matching is case-insensitive, the original spelling is
/// kept for display and for the comment directory name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PostIdent(pub String);

impl PostIdent {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key: the lower-cased ident.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for PostIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
