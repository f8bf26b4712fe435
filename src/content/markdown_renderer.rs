use markdown::Options;

use crate::content::ParseError;

/// Markdown to HTML. Implementations are shared across threads and must not
/// keep mutable state between calls.
pub trait Renderer: Send + Sync {
    fn render(&self, md_text: &str) -> Result<String, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trust {
    /// Author-written posts: raw HTML, comments included, passes through.
    Author,
    /// Reader-written comments: raw HTML is always escaped.
    Reader,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    trust: Trust,
}

impl MarkdownRenderer {
    pub fn trusted() -> Self {
        Self { trust: Trust::Author }
    }

    pub fn safe() -> Self {
        Self { trust: Trust::Reader }
    }

    fn options(&self) -> Options {
        let mut options = Options::gfm();
        options.compile.allow_dangerous_html = self.trust == Trust::Author;
        options
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, md_text: &str) -> Result<String, ParseError> {
        markdown::to_html_with_options(md_text, &self.options()).map_err(|e| ParseError::Render(e.reason))
    }
}
