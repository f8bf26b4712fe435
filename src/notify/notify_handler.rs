use spdlog::{debug, error, info};
use tokio::sync::mpsc;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

use crate::notify::notify_sender::NotifySender;
use crate::notify::{CommentNotice, NotifySink};

pub const DEFAULT_QUEUE_SIZE: usize = 64;

/// Runs notification delivery on its own task, fed by a bounded channel.
/// Must be created inside a tokio runtime.
pub struct NotifyHandler {
    receiver_task: JoinHandle<()>,
    sender: Sender<CommentNotice>,
}

impl NotifyHandler {
    pub fn new<S: NotifySink>(mut sink: S, queue_size: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<CommentNotice>(queue_size.max(1));

        let receiver_task = tokio::spawn(async move {
            info!("Starting comment notification receiver");
            while let Some(notice) = rx.recv().await {
                match sink.deliver(&notice) {
                    Ok(()) => debug!("Notification sent for comment {} on '{}'", notice.comment_id, notice.post_ident),
                    Err(e) => error!("Could not send notification for comment {} on '{}': {}", notice.comment_id, notice.post_ident, e),
                }
            }
            info!("Comment notification receiver stopped");
        });

        Self {
            receiver_task,
            sender: tx,
        }
    }

    pub fn new_sender(&self) -> NotifySender {
        NotifySender::new(self.sender.clone())
    }

    /// Waits for queued notices to be delivered. Returns once every sender
    /// handed out by [`NotifyHandler::new_sender`] has been dropped too.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.receiver_task.await {
            error!("Comment notification receiver failed: {}", e);
        }
    }
}
