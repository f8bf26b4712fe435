use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::comment_store::{CommentError, CommentStore};
use crate::content::comment::Comment;
use crate::content::post_content::PostContent;
use crate::content::PostIdent;

/// A published post: parsed content plus a handle to its comments.
/// The content never changes after a refresh builds it.
pub struct Post {
    pub content: PostContent,
    comments: CommentStore,
}

impl Post {
    pub fn new(content: PostContent, comments: CommentStore) -> Self {
        Self { content, comments }
    }

    pub fn ident(&self) -> &PostIdent {
        &self.content.ident
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    pub fn created(&self) -> NaiveDateTime {
        self.content.created
    }

    /// Newest first.
    pub fn comments(&self) -> Arc<Vec<Comment>> {
        self.comments.comments()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.count()
    }

    pub fn add_comment(&self, author: &str, email: &str, body: &str) -> Result<Comment, CommentError> {
        self.comments.append(author, email, body)
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content && *self.comments() == *other.comments()
    }
}

impl fmt::Debug for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Post")
            .field("content", &self.content)
            .field("comments", &self.comment_count())
            .finish()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.content, f)
    }
}
