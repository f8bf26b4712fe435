use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use spdlog::formatter::{pattern, PatternFormatter};
use spdlog::sink::{RotatingFileSink, RotationPolicy, Sink};
use spdlog::{info, Logger};

use crate::notify::{CommentNotice, NotifySink};

#[derive(Serialize)]
struct OutboxEntry<'a> {
    to: &'a [String],
    #[serde(flatten)]
    notice: &'a CommentNotice,
}

/// Appends one JSON object per notice to a daily-rotated outbox file.
/// Mail delivery itself is left to whatever tooling reads the outbox.
pub struct OutboxWriter {
    logger: Arc<Logger>,
    recipients: Vec<String>,
}

impl OutboxWriter {
    pub fn new(base_path: &Path, recipients: Vec<String>) -> spdlog::Result<Self> {
        let daily: Arc<RotatingFileSink> = Arc::new(
            RotatingFileSink::builder()
                .base_path(base_path)
                .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
                .rotate_on_open(false)
                .build()?,
        );
        daily.set_formatter(Box::new(PatternFormatter::new(pattern!("{payload}{eol}"))));

        let logger = Arc::new(Logger::builder().sink(daily).build()?);
        Ok(Self { logger, recipients })
    }
}

impl NotifySink for OutboxWriter {
    fn deliver(&mut self, notice: &CommentNotice) -> io::Result<()> {
        let entry = OutboxEntry {
            to: &self.recipients,
            notice,
        };
        let json = serde_json::to_string(&entry)?;
        info!(logger: self.logger, "{}", &json);
        self.logger.flush();
        Ok(())
    }
}
