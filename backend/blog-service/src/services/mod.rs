/// Business logic layer for blog-service
///
/// Services validate forms, enforce authorization and keep the feed cache
/// consistent with every write. Handlers reach the store directly only for the
/// health check.
pub mod authors;
pub mod feed;
pub mod follow;
pub mod groups;
pub mod posts;

pub use authors::AuthorService;
pub use feed::{FeedService, ProfileFeed, ProfileSummary};
pub use follow::FollowService;
pub use groups::GroupService;
pub use posts::{PostDetail, PostService};
