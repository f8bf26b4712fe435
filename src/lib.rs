pub mod blog;
pub mod comment_store;
pub mod config;
pub mod content;
pub mod logger;
pub mod notify;
pub mod post;
pub mod post_cache;
pub mod post_repository;
pub mod text_utils;
mod post_list;
#[cfg(test)]
mod test_data;
mod util;
