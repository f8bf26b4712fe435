use std::collections::HashMap;
use std::sync::Arc;

use crate::post::Post;
use crate::text_utils::sort_newest_first;

/// One immutable snapshot of the post collection, newest first, indexed by
/// lower-cased ident.
#[derive(Default)]
pub struct PostCache {
    posts: Vec<Arc<Post>>,
    ident_to_index: HashMap<String, usize>,
}

impl PostCache {
    /// Idents are expected to be unique already; on a clash the newest post wins the lookup.
    pub fn build(mut posts: Vec<Arc<Post>>) -> PostCache {
        sort_newest_first(&mut posts, |p| p.created());

        let mut ident_to_index = HashMap::with_capacity(posts.len());
        for (index, post) in posts.iter().enumerate() {
            ident_to_index.entry(post.ident().key()).or_insert(index);
        }

        PostCache { posts, ident_to_index }
    }

    pub fn posts(&self) -> &[Arc<Post>] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn from_ident(&self, ident: &str) -> Option<&Arc<Post>> {
        self.ident_to_index
            .get(&ident.to_lowercase())
            .and_then(|index| self.posts.get(*index))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::comment_store::{CommentSlot, CommentStore};
    use crate::content::markdown_renderer::MarkdownRenderer;
    use crate::content::post_content::PostContent;
    use crate::content::PostIdent;
    use crate::text_utils::parse_post_stamp;

    use super::*;

    fn post(stamp: &str, ident: &str) -> Arc<Post> {
        let ident = PostIdent(ident.to_string());
        let comments = CommentStore::new(
            ident.clone(),
            PathBuf::from("comments").join(ident.as_str()),
            Arc::new(CommentSlot::default()),
            Arc::new(MarkdownRenderer::safe()),
        );
        let content = PostContent {
            file_name: PathBuf::from(format!("posts/{}.md", stamp)),
            ident,
            created: parse_post_stamp(stamp).unwrap(),
            title: "Title".to_string(),
            raw: "".to_string(),
            rendered: "".to_string(),
        };
        Arc::new(Post::new(content, comments))
    }

    #[test]
    fn test_build_sorts_newest_first() {
        let cache = PostCache::build(vec![
            post("2020-01-01-10-00", "first"),
            post("2022-04-02-12-05", "third"),
            post("2021-06-15-08-30", "second"),
        ]);
        let idents: Vec<_> = cache.posts().iter().map(|p| p.ident().as_str()).collect();
        assert_eq!(idents, ["third", "second", "first"]);
    }

    #[test]
    fn test_from_ident_ignores_case() {
        let cache = PostCache::build(vec![post("2020-01-01-10-00", "Hello-World"), post("2021-01-01-10-00", "other")]);
        let a = cache.from_ident("Hello-World").unwrap();
        let b = cache.from_ident("hello-world").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(a.ident().as_str(), "Hello-World");
        assert!(cache.from_ident("missing").is_none());
    }

    #[test]
    fn test_empty() {
        let cache = PostCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert!(cache.from_ident("anything").is_none());
    }
}
