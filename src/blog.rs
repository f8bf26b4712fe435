use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use spdlog::error;
use thiserror::Error;

use crate::comment_store::CommentError;
use crate::config::Config;
use crate::content::comment::Comment;
use crate::notify::{CommentNotice, Notifier};
use crate::post::Post;
use crate::post_cache::PostCache;
use crate::post_repository::{PostRepository, RefreshError, RefreshSummary};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{name} directory {} is not readable: {source}", .path.display())]
    Unreadable {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{name} path {} is not a directory", .path.display())]
    NotADirectory { name: &'static str, path: PathBuf },
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

fn check_dir(name: &'static str, path: &Path) -> Result<(), StartupError> {
    let unreadable = |source| StartupError::Unreadable {
        name,
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(unreadable)?;
    if !metadata.is_dir() {
        return Err(StartupError::NotADirectory { name, path: path.to_path_buf() });
    }
    fs::read_dir(path).map_err(unreadable)?;
    Ok(())
}

/// What the outer layers (HTTP handlers, CLI) talk to.
pub struct Blog {
    repository: PostRepository,
    notifier: Arc<dyn Notifier>,
}

impl Blog {
    pub fn new(repository: PostRepository, notifier: Arc<dyn Notifier>) -> Self {
        Self { repository, notifier }
    }

    /// Checks both root directories and performs the first refresh. Any error
    /// here means the process should not start.
    pub fn open(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self, StartupError> {
        check_dir("posts", &config.paths.posts_dir)?;
        check_dir("comments", &config.paths.comments_dir)?;

        let mut repository = PostRepository::new(config.paths.posts_dir.clone(), config.paths.comments_dir.clone());
        if let Some(ref extension) = config.defaults.post_extension {
            repository = repository.with_extension(extension);
        }
        if let Some(ref untitled) = config.defaults.untitled {
            repository = repository.with_untitled(untitled);
        }

        let blog = Self::new(repository, notifier);
        blog.refresh()?;
        Ok(blog)
    }

    pub fn list_posts(&self) -> Arc<PostCache> {
        self.repository.list()
    }

    pub fn find_post(&self, ident: &str) -> Option<Arc<Post>> {
        self.repository.find(ident)
    }

    pub fn comments(&self, post: &Post) -> Arc<Vec<Comment>> {
        post.comments()
    }

    /// Blocks for the write and reload. The notification is queued and never
    /// affects the result.
    pub fn submit_comment(&self, post: &Post, author: &str, email: &str, body: &str) -> Result<Comment, CommentError> {
        let comment = post.add_comment(author, email, body)?;

        if let Err(e) = self.notifier.notify(CommentNotice::new(post, &comment)) {
            error!("Could not queue notification for comment {} on '{}': {}", comment.id, post.ident(), e);
        }

        Ok(comment)
    }

    pub fn refresh(&self) -> Result<RefreshSummary, RefreshError> {
        match self.repository.refresh() {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("Refresh failed, keeping the current posts: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use crate::comment_store::ValidationError;
    use crate::config::parse_config;
    use crate::notify::notify_sender::NotifySender;
    use crate::notify::NotifyError;
    use crate::test_data::POST_HELLO_WORLD;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<CommentNotice>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: CommentNotice) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Closed);
            }
            self.notices.lock().unwrap().push(notice);
            Ok(())
        }
    }

    struct Site {
        root: tempfile::TempDir,
    }

    impl Site {
        fn new() -> Site {
            let root = tempfile::tempdir().unwrap();
            fs::create_dir(root.path().join("posts")).unwrap();
            fs::create_dir(root.path().join("comments")).unwrap();
            fs::write(root.path().join("posts").join("2020-01-01-10-00.md"), POST_HELLO_WORLD).unwrap();
            Site { root }
        }

        fn config(&self) -> Config {
            let toml = format!(
                "[paths]\nposts_dir = {:?}\ncomments_dir = {:?}\n",
                self.root.path().join("posts").to_str().unwrap(),
                self.root.path().join("comments").to_str().unwrap(),
            );
            parse_config(&toml).unwrap()
        }

        fn comment_dir(&self) -> PathBuf {
            self.root.path().join("comments").join("hello-world")
        }

        fn open(&self, notifier: Arc<dyn Notifier>) -> Blog {
            Blog::open(&self.config(), notifier).unwrap()
        }
    }

    #[test]
    fn test_open_loads_posts() {
        let site = Site::new();
        let blog = site.open(Arc::new(NotifySender::no_op()));
        assert_eq!(blog.list_posts().len(), 1);
        let post = blog.find_post("Hello-World").unwrap();
        assert_eq!(post.title(), "Hello World");
    }

    #[test]
    fn test_open_fails_without_posts_dir() {
        let site = Site::new();
        fs::remove_dir_all(site.root.path().join("posts")).unwrap();
        let res = Blog::open(&site.config(), Arc::new(NotifySender::no_op()));
        assert!(matches!(res, Err(StartupError::Unreadable { name: "posts", .. })));
    }

    #[test]
    fn test_open_fails_when_comments_is_a_file() {
        let site = Site::new();
        fs::remove_dir_all(site.root.path().join("comments")).unwrap();
        fs::write(site.root.path().join("comments"), "oops").unwrap();
        let res = Blog::open(&site.config(), Arc::new(NotifySender::no_op()));
        assert!(matches!(res, Err(StartupError::NotADirectory { name: "comments", .. })));
    }

    #[test]
    fn test_submit_creates_third_file() {
        let site = Site::new();
        fs::create_dir_all(site.comment_dir()).unwrap();
        fs::write(site.comment_dir().join("1"), "Alice\n\n1000\nFirst!").unwrap();
        fs::write(site.comment_dir().join("2"), "Carol\n\n2000\nSecond!").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let blog = site.open(notifier.clone());

        let post = blog.find_post("hello-world").unwrap();
        assert_eq!(blog.comments(&post).len(), 2);

        let comment = blog.submit_comment(&post, "Bob", "", "Nice post").unwrap();
        assert_eq!(comment.id, 3);
        assert!(site.comment_dir().join("3").is_file());

        let comments = blog.comments(&post);
        assert_eq!(comments.len(), 3);
        assert!(comments.iter().any(|c| c.name == "Bob"));

        let notices = notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].post_ident, "hello-world");
        assert_eq!(notices[0].comment_id, 3);
        assert_eq!(notices[0].body, "Nice post");
    }

    #[test]
    fn test_submit_rejections() {
        let site = Site::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let blog = site.open(notifier.clone());
        let post = blog.find_post("hello-world").unwrap();

        let cases = [
            ("", "", "body", ValidationError::EmptyAuthor),
            ("Bob", "", "   ", ValidationError::EmptyBody),
            ("Bo\nb", "", "body", ValidationError::AuthorHasNewline),
            ("Bob", "bob@\nexample.org", "body", ValidationError::EmailHasNewline),
        ];
        for (author, email, body, expected) in cases {
            match blog.submit_comment(&post, author, email, body) {
                Err(CommentError::Invalid(e)) => assert_eq!(e, expected),
                other => panic!("expected {:?}, got {:?}", expected, other),
            }
        }

        let long_author = "a".repeat(257);
        let res = blog.submit_comment(&post, &long_author, "", "body");
        assert!(matches!(res, Err(CommentError::Invalid(ValidationError::AuthorTooLong))));
        let long_body = "b".repeat(200_001);
        let res = blog.submit_comment(&post, "Bob", "", &long_body);
        assert!(matches!(res, Err(CommentError::Invalid(ValidationError::BodyTooLong))));

        assert!(notifier.notices.lock().unwrap().is_empty());
        assert_eq!(fs::read_dir(site.comment_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_notifier_failure_does_not_fail_submission() {
        let site = Site::new();
        let notifier = Arc::new(RecordingNotifier { fail: true, ..Default::default() });
        let blog = site.open(notifier);
        let post = blog.find_post("hello-world").unwrap();

        assert!(blog.submit_comment(&post, "Bob", "", "Nice post").is_ok());
        assert_eq!(blog.comments(&post).len(), 1);
    }

    #[test]
    fn test_concurrent_submissions_are_serialized() {
        let site = Site::new();
        fs::create_dir_all(site.comment_dir()).unwrap();
        fs::write(site.comment_dir().join("1"), "Alice\n\n1000\nFirst!").unwrap();
        let blog = site.open(Arc::new(NotifySender::no_op()));
        let post = blog.find_post("hello-world").unwrap();

        let (a, b) = thread::scope(|s| {
            let a = s.spawn(|| blog.submit_comment(&post, "Bob", "", "one").unwrap());
            let b = s.spawn(|| blog.submit_comment(&post, "Dan", "", "two").unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });

        let mut ids = [a.id, b.id];
        ids.sort();
        assert_eq!(ids, [2, 3]);

        let comments = blog.comments(&post);
        assert_eq!(comments.len(), 3);
        assert!(comments.windows(2).all(|w| w[0].created >= w[1].created));
        assert_eq!(comments[2].name, "Alice");
    }

    #[test]
    fn test_comments_survive_refresh() {
        let site = Site::new();
        let blog = site.open(Arc::new(NotifySender::no_op()));
        let post = blog.find_post("hello-world").unwrap();
        blog.submit_comment(&post, "Bob", "", "Nice post").unwrap();

        blog.refresh().unwrap();
        let refreshed = blog.find_post("hello-world").unwrap();
        assert_eq!(blog.comments(&refreshed).len(), 1);
        // The old handle shares the same comment slot
        assert_eq!(blog.comments(&post).len(), 1);
    }
}
