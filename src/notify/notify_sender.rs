use spdlog::trace;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

use crate::notify::{CommentNotice, Notifier, NotifyError};

#[derive(Clone)]
pub struct NotifySender {
    sender_ch: Option<Sender<CommentNotice>>,
}

impl NotifySender {
    pub fn new(sender_ch: Sender<CommentNotice>) -> Self {
        Self {
            sender_ch: Some(sender_ch),
        }
    }

    /// Accepts and drops every notice.
    pub fn no_op() -> Self {
        Self { sender_ch: None }
    }
}

impl Notifier for NotifySender {
    fn notify(&self, notice: CommentNotice) -> Result<(), NotifyError> {
        let Some(ref sender) = self.sender_ch else {
            trace!("Notifications disabled, dropping notice for comment {} on '{}'", notice.comment_id, notice.post_ident);
            return Ok(());
        };

        sender.try_send(notice).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::Closed,
        })
    }
}
