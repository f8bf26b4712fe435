use std::collections::HashSet;
use std::fs;
use std::io;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use spdlog::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::content::comment::{comment_id, comment_record, parse_comment, Comment};
use crate::content::markdown_renderer::Renderer;
use crate::content::PostIdent;
use crate::text_utils::{nanos_from, sort_newest_first};
use crate::util::locks::{lock, read, write};

pub const MAX_AUTHOR_CHARS: usize = 256;
pub const MAX_EMAIL_CHARS: usize = 256;
pub const MAX_BODY_CHARS: usize = 200_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a name.")]
    EmptyAuthor,
    #[error("Please shorten your name to 256 characters or less.")]
    AuthorTooLong,
    #[error("Please do not put new lines in your name.")]
    AuthorHasNewline,
    #[error("Please shorten your email address to 256 characters or less.")]
    EmailTooLong,
    #[error("Please do not put new lines in your email.")]
    EmailHasNewline,
    #[error("Please submit a comment.")]
    EmptyBody,
    #[error("There is a 200,000 character limit on comments. If you really need to post something longer, please split it into multiple comments.")]
    BodyTooLong,
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Details are logged, never shown to the submitter.
    #[error("An unknown error occurred when trying to submit your comment. Please try again later.")]
    Storage,
}

/// Expects trimmed input.
pub fn validate_comment(author: &str, email: &str, body: &str) -> Result<(), ValidationError> {
    let has_newline = |s: &str| s.contains('\n') || s.contains('\r');

    if author.is_empty() {
        return Err(ValidationError::EmptyAuthor);
    }
    if has_newline(author) {
        return Err(ValidationError::AuthorHasNewline);
    }
    if author.chars().count() > MAX_AUTHOR_CHARS {
        return Err(ValidationError::AuthorTooLong);
    }
    if has_newline(email) {
        return Err(ValidationError::EmailHasNewline);
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(ValidationError::EmailTooLong);
    }
    if body.is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ValidationError::BodyTooLong);
    }
    Ok(())
}

/// Synchronization state for one post's comments.
#[derive(Default)]
pub struct CommentSlot {
    comments: RwLock<Arc<Vec<Comment>>>,
    // Keeps two loads from publishing out of order.
    load_lock: Mutex<()>,
    // Held for the whole validate, write, reload sequence.
    append_lock: Mutex<()>,
}

/// Per-post slots keyed by lower-cased ident, created on first use.
///
/// Slots outlive any single snapshot, so an append that started against an old
/// snapshot still excludes appends made through the new one.
#[derive(Default)]
pub struct LockTable {
    slots: DashMap<String, Arc<CommentSlot>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, ident: &PostIdent) -> Arc<CommentSlot> {
        Arc::clone(&self.slots.entry(ident.key()).or_default())
    }

    /// Drops slots whose key is not in `live`.
    pub fn retain(&self, live: &HashSet<String>) {
        self.slots.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Handle to one post's comments: its directory on disk plus its slot in the
/// lock table. Cheap to clone.
#[derive(Clone)]
pub struct CommentStore {
    ident: PostIdent,
    dir: PathBuf,
    slot: Arc<CommentSlot>,
    renderer: Arc<dyn Renderer>,
}

impl CommentStore {
    pub fn new(ident: PostIdent, dir: PathBuf, slot: Arc<CommentSlot>, renderer: Arc<dyn Renderer>) -> Self {
        Self { ident, dir, slot, renderer }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current list, newest first.
    pub fn comments(&self) -> Arc<Vec<Comment>> {
        read(&self.slot.comments).clone()
    }

    pub fn count(&self) -> usize {
        read(&self.slot.comments).len()
    }

    /// Re-reads the comment directory, creating it when missing, and replaces
    /// the in-memory list. Malformed files are logged and skipped.
    pub fn load(&self) -> io::Result<usize> {
        let _loading = lock(&self.slot.load_lock);

        let files = self.list_files()?;
        let mut comments = Vec::with_capacity(files.len());
        for (file_name, path) in files {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Could not read comment '{}' of post '{}': {}. Skipping...", file_name, self.ident, e);
                    continue;
                }
            };
            match parse_comment(&file_name, &bytes, self.renderer.as_ref()) {
                Ok(comment) => {
                    trace!("Loaded comment '{}' successfully.", comment);
                    comments.push(comment);
                }
                Err(e) => warn!("Could not load comment '{}' of post '{}': {}. Skipping...", file_name, self.ident, e),
            }
        }
        sort_newest_first(&mut comments, |c| c.created);

        let count = comments.len();
        *write(&self.slot.comments) = Arc::new(comments);
        debug!("Loaded {} comments for post '{}'", count, self.ident);
        Ok(count)
    }

    fn list_files(&self) -> io::Result<Vec<(String, PathBuf)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                match fs::create_dir(&self.dir) {
                    Ok(()) => info!("Created comment directory {}", self.dir.display()),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(e),
                }
                fs::read_dir(&self.dir)?
            }
            Err(e) => return Err(e),
        };

        let mut files = vec![];
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(|s| s.to_string()) else {
                continue;
            };
            // In-flight temp files and strays are not comments
            if comment_id(&file_name).is_none() {
                trace!("Ignoring '{}' in {}", file_name, self.dir.display());
                continue;
            }
            files.push((file_name, entry.path()));
        }
        Ok(files)
    }

    /// The append protocol: trim, validate, write the next numbered file and
    /// reload. Appends to the same post run one at a time; this blocks on disk
    /// I/O.
    pub fn append(&self, author: &str, email: &str, body: &str) -> Result<Comment, CommentError> {
        let author = author.trim();
        let email = email.trim();
        let body = body.trim();

        let _appending = lock(&self.slot.append_lock);
        validate_comment(author, email, body)?;

        let created = Utc::now();
        let nanos = nanos_from(&created).ok_or_else(|| {
            error!("Clock is out of range for a comment timestamp: {}", created);
            CommentError::Storage
        })?;
        let record = comment_record(author, email, nanos, body);

        let next_id = (self.count() as u32).saturating_add(1);
        let id = self.write_record(next_id, &record).map_err(|e| {
            error!("There was an error adding a comment to post '{}' in {}: {}", self.ident, self.dir.display(), e);
            CommentError::Storage
        })?;

        let comment = parse_comment(&id.to_string(), record.as_bytes(), self.renderer.as_ref()).map_err(|e| {
            error!("Comment {} of post '{}' was written but does not parse back: {}", id, self.ident, e);
            CommentError::Storage
        })?;

        // The file is already visible; a failed reload only delays it until the next one.
        if let Err(e) = self.load() {
            error!("Could not reload comments of post '{}' after adding comment {}: {}", self.ident, id, e);
        }

        info!("Added new comment {} by '{}' for post '{}'.", id, author, self.ident);
        Ok(comment)
    }

    /// Publishes `record` as `<id>` with the first free id from `first_id` on.
    /// The content is complete on disk before the name appears, and existing
    /// files are never replaced.
    fn write_record(&self, first_id: u32, record: &str) -> io::Result<u32> {
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(record.as_bytes())?;
        tmp.as_file().sync_all()?;

        let mut id = first_id;
        loop {
            let target = self.dir.join(id.to_string());
            match tmp.persist_noclobber(&target) {
                Ok(_) => return Ok(id),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    warn!("Comment file {} already exists for post '{}', trying the next one", target.display(), self.ident);
                    tmp = e.file;
                    id = id.checked_add(1).ok_or_else(|| io::Error::new(ErrorKind::Other, "comment ids exhausted"))?;
                }
                Err(e) => return Err(e.error),
            }
        }
    }
}
