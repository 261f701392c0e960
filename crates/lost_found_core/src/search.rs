//! crates/lost_found_core/src/search.rs
//!
//! Post filtering and ordering used by the store's search operation.

use crate::domain::{Post, PostKind};

/// Filters `posts` by kind and free-text query and orders the result newest first.
///
/// A blank query (after trimming) matches everything. Otherwise a post matches when
/// its title, description or location contains the lower-cased query. Posts with
/// equal timestamps keep a stable order: the one inserted later comes first.
pub fn search_posts(posts: &[Post], query: &str, kind: Option<PostKind>) -> Vec<Post> {
    let needle = if query.trim().is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    };

    let mut hits: Vec<(usize, &Post)> = posts
        .iter()
        .enumerate()
        .filter(|(_, post)| kind.map_or(true, |k| post.kind == k))
        .filter(|(_, post)| needle.as_deref().map_or(true, |n| matches_query(post, n)))
        .collect();

    hits.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));

    hits.into_iter().map(|(_, post)| post.clone()).collect()
}

fn matches_query(post: &Post, needle: &str) -> bool {
    [&post.title, &post.description, &post.location]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
