//! Data models
//!
//! Database entities, input types and the pagination containers used by
//! repositories, services and templates.

mod category;
mod comment;
mod location;
mod pagination;
mod post;
mod session;
mod user;

pub use category::{is_valid_slug, Category, CreateCategoryInput};
pub use comment::{Comment, CommentView};
pub use location::{CreateLocationInput, Location};
pub use pagination::{ListParams, PagedResult, MAX_PER_PAGE};
pub use post::{is_visible, CategoryRef, ImageChange, LocationRef, Post, PostInput, PostView};
pub use session::Session;
pub use user::{UpdateProfileInput, User};
