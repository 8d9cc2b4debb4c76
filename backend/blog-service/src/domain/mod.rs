pub mod forms;
pub mod identity;
pub mod models;

pub use forms::{FieldError, ValidationErrors};
pub use identity::Identity;
pub use models::{
    Author, AuthorRef, Comment, CommentView, Follow, Group, GroupRef, NewAuthor, NewComment,
    NewGroup, NewPost, Post, PostChanges, PostView,
};
