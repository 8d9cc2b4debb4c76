/// HTTP handlers for blog-service
///
/// Thin JSON endpoints over the services:
/// - Feeds: global, group, profile and followed-authors, paged by `?page=N`
/// - Posts: detail, create, edit and comments
/// - Follows, signup and image upload
pub mod auth;
pub mod feed;
pub mod follow;
pub mod health;
pub mod media;
pub mod posts;

pub use auth::signup;
pub use feed::{follow_index, group_posts, index, profile};
pub use follow::{profile_follow, profile_unfollow};
pub use health::health;
pub use media::upload_image;
pub use posts::{add_comment, create_post, edit_post, post_detail};
