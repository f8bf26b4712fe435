use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use spdlog::{debug, info, warn};
use thiserror::Error;

use crate::comment_store::{CommentStore, LockTable};
use crate::content::markdown_renderer::{MarkdownRenderer, Renderer};
use crate::content::post_content::{parse_post, PostContent, UNTITLED};
use crate::content::{ParseError, PostIdent};
use crate::post::Post;
use crate::post_cache::PostCache;
use crate::post_list::PostList;
use crate::util::locks::{lock, read, write};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("could not list posts directory {}: {source}", .path.display())]
    ListPosts {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("unreadable: {0}")]
    Unreadable(io::Error),
    #[error(transparent)]
    Malformed(#[from] ParseError),
    #[error("ident '{0}' is already used by an older post")]
    DuplicateIdent(PostIdent),
}

#[derive(Debug)]
pub struct SkippedFile {
    pub file_name: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct RefreshSummary {
    pub loaded: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Owns the post collection. Readers get the current snapshot; a refresh builds
/// a new one off to the side and swaps it in whole.
pub struct PostRepository {
    posts_dir: PathBuf,
    comments_dir: PathBuf,
    extension: String,
    untitled: String,
    post_renderer: Arc<dyn Renderer>,
    comment_renderer: Arc<dyn Renderer>,
    cache: RwLock<Arc<PostCache>>,
    locks: LockTable,
    refresh_lock: Mutex<()>,
}

impl PostRepository {
    /// Starts with an empty snapshot; call [`PostRepository::refresh`] to load.
    pub fn new(posts_dir: PathBuf, comments_dir: PathBuf) -> Self {
        Self {
            posts_dir,
            comments_dir,
            extension: "md".to_string(),
            untitled: UNTITLED.to_string(),
            post_renderer: Arc::new(MarkdownRenderer::trusted()),
            comment_renderer: Arc::new(MarkdownRenderer::safe()),
            cache: RwLock::new(Arc::new(PostCache::default())),
            locks: LockTable::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_untitled(mut self, untitled: &str) -> Self {
        self.untitled = untitled.to_string();
        self
    }

    pub fn with_renderers(mut self, post_renderer: Arc<dyn Renderer>, comment_renderer: Arc<dyn Renderer>) -> Self {
        self.post_renderer = post_renderer;
        self.comment_renderer = comment_renderer;
        self
    }

    /// The current snapshot, newest first.
    pub fn list(&self) -> Arc<PostCache> {
        read(&self.cache).clone()
    }

    pub fn find(&self, ident: &str) -> Option<Arc<Post>> {
        self.list().from_ident(ident).cloned()
    }

    /// Rebuilds every post and its comments from disk, then installs the result.
    ///
    /// Malformed files are skipped and reported in the summary. If the posts
    /// directory cannot be listed the current snapshot stays in place.
    pub fn refresh(&self) -> Result<RefreshSummary, RefreshError> {
        let _refreshing = lock(&self.refresh_lock);

        let post_list = PostList {
            root_dir: self.posts_dir.clone(),
            extension: self.extension.clone(),
        };
        let files = post_list.retrieve_files().map_err(|source| RefreshError::ListPosts {
            path: self.posts_dir.clone(),
            source,
        })?;

        let mut posts = Vec::with_capacity(files.len());
        let mut skipped = vec![];
        let mut live = HashSet::with_capacity(files.len());

        for file_name in files {
            debug!("Trying to update '{}'...", file_name.display());
            let content = match self.read_post(&file_name) {
                Ok(content) => content,
                Err(reason) => {
                    warn!("Could not update '{}': {}. Skipping...", file_name.display(), reason);
                    skipped.push(SkippedFile { file_name, reason });
                    continue;
                }
            };

            // Files come in name order, which is oldest first
            if !live.insert(content.ident.key()) {
                let reason = SkipReason::DuplicateIdent(content.ident.clone());
                warn!("Could not update '{}': {}. Skipping...", file_name.display(), reason);
                skipped.push(SkippedFile { file_name, reason });
                continue;
            }

            let post = self.attach_comments(content);
            info!("Updated '{}' successfully.", post);
            posts.push(Arc::new(post));
        }

        let cache = PostCache::build(posts);
        let loaded = cache.len();
        *write(&self.cache) = Arc::new(cache);
        self.locks.retain(&live);

        info!("Refreshed {} posts from {} ({} skipped)", loaded, self.posts_dir.display(), skipped.len());
        Ok(RefreshSummary { loaded, skipped })
    }

    fn read_post(&self, file_name: &Path) -> Result<PostContent, SkipReason> {
        let bytes = fs::read(file_name).map_err(SkipReason::Unreadable)?;
        let content = parse_post(file_name, &bytes, &self.untitled, self.post_renderer.as_ref())?;
        Ok(content)
    }

    fn attach_comments(&self, content: PostContent) -> Post {
        let ident = content.ident.clone();
        let store = CommentStore::new(
            ident.clone(),
            self.comments_dir.join(ident.as_str()),
            self.locks.slot(&ident),
            self.comment_renderer.clone(),
        );
        // A post whose comments cannot be read is still served, without comments
        if let Err(e) = store.load() {
            warn!("Could not access comment directory for post '{}': {}", ident, e);
        }
        Post::new(content, store)
    }
}
