/// Feed caching with explicit invalidation on writes
pub mod feed_cache;

pub use feed_cache::{FeedCache, FeedKey};
