//! Post model
//!
//! `Post` mirrors the `posts` table. `PostView` is what listings and the detail
//! page render: the post plus its author, category, location and comment count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication date; a post dated in the future stays hidden until then
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    /// Path of the uploaded image relative to the media root
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// The category fields a post card needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

/// The location fields a post card needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRef {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

/// A post joined with everything its card and detail page display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub category: Option<CategoryRef>,
    pub location: Option<LocationRef>,
    pub comment_count: i64,
}

impl PostView {
    /// Whether anonymous visitors may see this post at `now`
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        is_visible(
            self.post.is_published,
            self.post.pub_date,
            self.category.as_ref().map(|c| c.is_published),
            now,
        )
    }
}

/// The public visibility rule for posts.
///
/// A post is visible when it is published, its publication date is not in the
/// future and it belongs to a published category. A post without a category
/// is never visible. Listing queries express the same rule in SQL.
pub fn is_visible(
    is_published: bool,
    pub_date: DateTime<Utc>,
    category_published: Option<bool>,
    now: DateTime<Utc>,
) -> bool {
    is_published && pub_date <= now && category_published == Some(true)
}

/// Validated-by-service input for creating or editing a post
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub is_published: bool,
}

impl PostInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>, pub_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            pub_date,
            category_id: None,
            location_id: None,
            is_published: true,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}

impl From<&Post> for PostInput {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            category_id: post.category_id,
            location_id: post.location_id,
            is_published: post.is_published,
        }
    }
}

/// What to do with a post's image on save
#[derive(Debug, Clone, Default)]
pub enum ImageChange {
    /// Leave the current image as it is
    #[default]
    Keep,
    /// Remove the current image
    Clear,
    /// Store a newly uploaded image
    Upload { content_type: String, data: Vec<u8> },
}
