use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::content::comment::Comment;
use crate::post::Post;

pub mod notify_handler;
pub mod notify_sender;
pub mod outbox_writer;

/// What the owner hears about a new comment. Built from the stored record read
/// back, so it carries the trimmed text exactly as it will be displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNotice {
    pub post_ident: String,
    pub post_title: String,
    pub comment_id: u32,
    pub author: String,
    pub email: String,
    pub created: DateTime<Utc>,
    pub body: String,
}

impl CommentNotice {
    pub fn new(post: &Post, comment: &Comment) -> Self {
        Self {
            post_ident: post.ident().to_string(),
            post_title: post.title().to_string(),
            comment_id: comment.id,
            author: comment.name.clone(),
            email: comment.email.clone(),
            created: comment.created,
            body: comment.body.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification queue is full")]
    QueueFull,
    #[error("notifier is closed")]
    Closed,
}

/// Best effort and non-blocking. A failure is logged by the caller and never
/// reaches the person who submitted the comment.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: CommentNotice) -> Result<(), NotifyError>;
}

/// Final delivery step, run on the notification task.
pub trait NotifySink: Send + 'static {
    fn deliver(&mut self, notice: &CommentNotice) -> io::Result<()>;
}
