//! Domain entities - the core business objects.

mod account;
mod post;

pub use account::{Account, AccountChanges, Profile};
pub use post::{AuthorView, Post, PostChanges, PostEdit, PostFilter, SortOrder};
