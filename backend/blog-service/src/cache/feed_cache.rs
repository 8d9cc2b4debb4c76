use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::PostView;
use crate::metrics::FEED_CACHE_EVENTS;

/// Which feed a cached post list belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedKey {
    Global,
    Group(String),
    Profile(String),
}

impl FeedKey {
    fn label(&self) -> &'static str {
        match self {
            FeedKey::Global => "global",
            FeedKey::Group(_) => "group",
            FeedKey::Profile(_) => "profile",
        }
    }
}

struct CachedFeed {
    posts: Arc<Vec<PostView>>,
    stored_at: Instant,
}

/// In-process cache of ordered feeds keyed by feed type.
///
/// Writers invalidate explicitly and synchronously. Every invalidation bumps
/// a generation counter; a reader may only store a list it computed under
/// the current generation, so a post written while a feed was being loaded
/// never leaves a stale entry behind.
pub struct FeedCache {
    entries: DashMap<FeedKey, CachedFeed>,
    generation: AtomicU64,
    ttl: Duration,
    enabled: bool,
}

impl FeedCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            ttl,
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot to pass back to [`FeedCache::put`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &FeedKey) -> Option<Arc<Vec<PostView>>> {
        if !self.enabled {
            return None;
        }

        let expired = match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                FEED_CACHE_EVENTS
                    .with_label_values(&[key.label(), "hit"])
                    .inc();
                return Some(entry.posts.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        FEED_CACHE_EVENTS
            .with_label_values(&[key.label(), "miss"])
            .inc();
        None
    }

    /// Store `posts` unless an invalidation happened since `generation` was taken.
    pub fn put(&self, key: FeedKey, generation: u64, posts: Vec<PostView>) -> Arc<Vec<PostView>> {
        let posts = Arc::new(posts);
        if !self.enabled || generation != self.generation() {
            return posts;
        }

        self.entries.insert(
            key.clone(),
            CachedFeed {
                posts: posts.clone(),
                stored_at: Instant::now(),
            },
        );

        // An invalidation may have slipped in between the check and the insert.
        if generation != self.generation() {
            self.entries.remove(&key);
        }
        posts
    }

    pub fn invalidate(&self, key: &FeedKey) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.entries.remove(key).is_some() {
            debug!(feed = ?key, "Feed cache entry invalidated");
        }
        FEED_CACHE_EVENTS
            .with_label_values(&[key.label(), "invalidate"])
            .inc();
    }

    /// Drop every feed a post by `author` in the given groups appears in.
    pub fn invalidate_post<I>(&self, author_username: &str, group_slugs: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.invalidate(&FeedKey::Global);
        self.invalidate(&FeedKey::Profile(author_username.to_string()));
        for slug in group_slugs {
            self.invalidate(&FeedKey::Group(slug));
        }
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        debug!("Feed cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
