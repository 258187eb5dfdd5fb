//! Post service
//!
//! Implements the business rules for posts:
//! - The three public listings (home, category, profile) with pagination
//! - Detail access for hidden posts (author only)
//! - Create, edit (author only) and delete (author or staff)
//! - Field validation and image upload handling
//!
//! Every listing shows only visible posts, see [`crate::models::is_visible`],
//! except a user's own profile feed which shows all of their posts.

use crate::db::repositories::{CategoryRepository, LocationRepository, PostRepository, UserRepository};
use crate::models::{Category, ImageChange, ListParams, PagedResult, Post, PostInput, PostView, User};
use crate::services::media::MediaStorage;
use crate::services::validation::{check_text, FieldErrors};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

const TITLE_MAX_LEN: usize = 256;
const TEXT_MAX_LEN: usize = 100_000;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post, category, user or page does not exist (or is hidden from the viewer)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The user may not modify this post
    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    locations: Arc<dyn LocationRepository>,
    users: Arc<dyn UserRepository>,
    media: MediaStorage,
    per_page: u32,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        locations: Arc<dyn LocationRepository>,
        users: Arc<dyn UserRepository>,
        media: MediaStorage,
        per_page: u32,
    ) -> Self {
        Self {
            posts,
            categories,
            locations,
            users,
            media,
            per_page,
        }
    }

    fn page_params(&self, page: u32) -> Result<ListParams, PostServiceError> {
        if page == 0 {
            return Err(PostServiceError::NotFound("page 0".to_string()));
        }
        Ok(ListParams::new(page, self.per_page))
    }

    fn check_range(params: &ListParams, total: i64) -> Result<(), PostServiceError> {
        if params.is_in_range(total) {
            Ok(())
        } else {
            Err(PostServiceError::NotFound(format!("page {}", params.page)))
        }
    }

    /// Visible posts, newest first
    pub async fn home_feed(&self, page: u32) -> Result<PagedResult<PostView>, PostServiceError> {
        let params = self.page_params(page)?;
        let now = Utc::now();

        let total = self
            .posts
            .count_visible(now)
            .await
            .context("Failed to count posts")?;
        Self::check_range(&params, total)?;

        let items = self
            .posts
            .list_visible(now, params.offset(), params.limit())
            .await
            .context("Failed to list posts")?;

        Ok(PagedResult::new(items, total, &params))
    }

    /// Visible posts of a published category
    pub async fn category_feed(
        &self,
        slug: &str,
        page: u32,
    ) -> Result<(Category, PagedResult<PostView>), PostServiceError> {
        let category = self
            .categories
            .get_by_slug(slug)
            .await
            .context("Failed to get category")?
            .filter(|c| c.is_published)
            .ok_or_else(|| PostServiceError::NotFound(format!("category {}", slug)))?;

        let params = self.page_params(page)?;
        let now = Utc::now();

        let total = self
            .posts
            .count_visible_in_category(category.id, now)
            .await
            .context("Failed to count category posts")?;
        Self::check_range(&params, total)?;

        let items = self
            .posts
            .list_visible_in_category(category.id, now, params.offset(), params.limit())
            .await
            .context("Failed to list category posts")?;

        Ok((category, PagedResult::new(items, total, &params)))
    }

    /// A user's posts. The owner sees every post, others only visible ones.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&User>,
        page: u32,
    ) -> Result<(User, PagedResult<PostView>), PostServiceError> {
        let owner = self
            .users
            .get_by_username(username)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| PostServiceError::NotFound(format!("user {}", username)))?;

        let params = self.page_params(page)?;
        let visible_at = match viewer {
            Some(v) if v.id == owner.id => None,
            _ => Some(Utc::now()),
        };

        let total = self
            .posts
            .count_by_author(owner.id, visible_at)
            .await
            .context("Failed to count user posts")?;
        Self::check_range(&params, total)?;

        let items = self
            .posts
            .list_by_author(owner.id, visible_at, params.offset(), params.limit())
            .await
            .context("Failed to list user posts")?;

        Ok((owner, PagedResult::new(items, total, &params)))
    }

    /// A single post as shown on its detail page
    pub async fn detail(&self, id: i64, viewer: Option<&User>) -> Result<PostView, PostServiceError> {
        let view = self
            .posts
            .get_view(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("post {}", id)))?;

        let is_author = viewer.is_some_and(|v| v.id == view.post.author_id);
        if is_author || view.is_visible_at(Utc::now()) {
            Ok(view)
        } else {
            Err(PostServiceError::NotFound(format!("post {}", id)))
        }
    }

    /// Fetch a post for its edit form
    pub async fn get_for_edit(&self, id: i64, user: &User) -> Result<Post, PostServiceError> {
        let post = self.get_existing(id).await?;
        if post.author_id != user.id {
            return Err(PostServiceError::Forbidden);
        }
        Ok(post)
    }

    /// Fetch a post for deletion (author or staff)
    pub async fn get_for_delete(&self, id: i64, user: &User) -> Result<PostView, PostServiceError> {
        let view = self
            .posts
            .get_view(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("post {}", id)))?;
        if !user.can_delete(view.post.author_id) {
            return Err(PostServiceError::Forbidden);
        }
        Ok(view)
    }

    pub async fn create(
        &self,
        author: &User,
        input: PostInput,
        image: ImageChange,
    ) -> Result<Post, PostServiceError> {
        self.validate(&input, &image).await?;

        let stored = match &image {
            ImageChange::Upload { content_type, data } => Some(self.store_image(content_type, data).await?),
            ImageChange::Keep | ImageChange::Clear => None,
        };

        let result = self.posts.create(author.id, &input, stored.as_deref()).await;
        match result {
            Ok(post) => {
                tracing::info!(post_id = post.id, author = %author.username, "Created post");
                Ok(post)
            }
            Err(e) => {
                if let Some(path) = &stored {
                    self.media.remove(path).await;
                }
                Err(PostServiceError::InternalError(e.context("Failed to create post")))
            }
        }
    }

    /// Update a post. Only its author may do this.
    pub async fn update(
        &self,
        id: i64,
        editor: &User,
        input: PostInput,
        image: ImageChange,
    ) -> Result<Post, PostServiceError> {
        let existing = self.get_for_edit(id, editor).await?;
        self.validate(&input, &image).await?;

        let new_image = match &image {
            ImageChange::Keep => existing.image.clone(),
            ImageChange::Clear => None,
            ImageChange::Upload { content_type, data } => Some(self.store_image(content_type, data).await?),
        };

        let updated = match self.posts.update(id, &input, new_image.as_deref()).await {
            Ok(post) => post,
            Err(e) => {
                if let (ImageChange::Upload { .. }, Some(path)) = (&image, &new_image) {
                    self.media.remove(path).await;
                }
                return Err(PostServiceError::InternalError(e.context("Failed to update post")));
            }
        };

        if let Some(old) = &existing.image {
            if new_image.as_ref() != Some(old) {
                self.media.remove(old).await;
            }
        }

        tracing::info!(post_id = id, editor = %editor.username, "Updated post");
        Ok(updated)
    }

    /// Delete a post. Its author or any staff user may do this.
    pub async fn delete(&self, id: i64, user: &User) -> Result<(), PostServiceError> {
        let post = self.get_existing(id).await?;
        if !user.can_delete(post.author_id) {
            return Err(PostServiceError::Forbidden);
        }

        self.posts.delete(id).await.context("Failed to delete post")?;
        if let Some(image) = &post.image {
            self.media.remove(image).await;
        }

        tracing::info!(post_id = id, user = %user.username, "Deleted post");
        Ok(())
    }

    async fn get_existing(&self, id: i64) -> Result<Post, PostServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("post {}", id)))
    }

    async fn store_image(&self, content_type: &str, data: &[u8]) -> Result<String, PostServiceError> {
        self.media
            .save_post_image(content_type, data)
            .await
            .map_err(|e| {
                if e.is_invalid_upload() {
                    PostServiceError::ValidationError(FieldErrors::single("image", e.to_string()))
                } else {
                    PostServiceError::InternalError(
                        anyhow::Error::new(e).context("Failed to store post image"),
                    )
                }
            })
    }

    /// Check a submission without saving anything
    pub async fn validate(&self, input: &PostInput, image: &ImageChange) -> Result<(), PostServiceError> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &input.title, TITLE_MAX_LEN);
        check_text(&mut errors, "text", &input.text, TEXT_MAX_LEN);

        match input.category_id {
            None => errors.add("category", "This field is required."),
            Some(category_id) => {
                let exists = self
                    .categories
                    .get_by_id(category_id)
                    .await
                    .context("Failed to check category")?
                    .is_some();
                if !exists {
                    errors.add(
                        "category",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                }
            }
        }

        if let Some(location_id) = input.location_id {
            let exists = self
                .locations
                .get_by_id(location_id)
                .await
                .context("Failed to check location")?
                .is_some();
            if !exists {
                errors.add(
                    "location",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
            }
        }

        if let ImageChange::Upload { data, .. } = image {
            if let Err(e) = self.media.validate_image(data) {
                errors.add("image", e.to_string());
            }
        }

        errors.into_result().map_err(PostServiceError::ValidationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxLocationRepository, SqlxPostRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateCategoryInput;
    use chrono::Duration;
    use tempfile::TempDir;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct Fixture {
        service: PostService,
        author: User,
        reader: User,
        staff: User,
        travel: i64,
        hidden: i64,
        _media: TempDir,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let author = users
            .create(&User::new("author".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        let reader = users
            .create(&User::new("reader".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        let mut staff = users
            .create(&User::new("staff".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        staff.is_staff = true;
        let staff = users.update(&staff).await.unwrap();

        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let travel = categories
            .create(&CreateCategoryInput::new("Travel", "travel"))
            .await
            .unwrap();
        let hidden = categories
            .create(&CreateCategoryInput::new("Hidden", "hidden").unpublished())
            .await
            .unwrap();

        let media = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(MediaConfig {
            path: media.path().to_path_buf(),
            ..MediaConfig::default()
        });

        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            categories,
            SqlxLocationRepository::boxed(pool.clone()),
            users,
            storage,
            2,
        );

        Fixture {
            service,
            author,
            reader,
            staff,
            travel: travel.id,
            hidden: hidden.id,
            _media: media,
        }
    }

    fn input(f: &Fixture, title: &str) -> PostInput {
        PostInput::new(title, "Some text", Utc::now() - Duration::hours(1)).in_category(f.travel)
    }

    #[tokio::test]
    async fn test_home_feed_hides_invisible_posts() {
        let f = setup().await;
        f.service
            .create(&f.author, input(&f, "Visible"), ImageChange::Keep)
            .await
            .unwrap();
        f.service
            .create(&f.author, input(&f, "Draft").unpublished(), ImageChange::Keep)
            .await
            .unwrap();
        let mut future = input(&f, "Future");
        future.pub_date = Utc::now() + Duration::days(1);
        f.service.create(&f.author, future, ImageChange::Keep).await.unwrap();
        let mut hidden_cat = input(&f, "Hidden category");
        hidden_cat.category_id = Some(f.hidden);
        f.service.create(&f.author, hidden_cat, ImageChange::Keep).await.unwrap();

        let feed = f.service.home_feed(1).await.unwrap();
        assert_eq!(feed.total, 1);
        assert_eq!(feed.items[0].post.title, "Visible");
    }

    #[tokio::test]
    async fn test_pagination_range() {
        let f = setup().await;
        assert!(f.service.home_feed(1).await.unwrap().is_empty());
        assert!(matches!(f.service.home_feed(2).await, Err(PostServiceError::NotFound(_))));
        assert!(matches!(f.service.home_feed(0).await, Err(PostServiceError::NotFound(_))));

        for i in 0..3 {
            f.service
                .create(&f.author, input(&f, &format!("Post {}", i)), ImageChange::Keep)
                .await
                .unwrap();
        }
        let second = f.service.home_feed(2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.total_pages(), 2);
        assert!(matches!(f.service.home_feed(3).await, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_category_feed() {
        let f = setup().await;
        f.service
            .create(&f.author, input(&f, "Trip"), ImageChange::Keep)
            .await
            .unwrap();

        let (category, feed) = f.service.category_feed("travel", 1).await.unwrap();
        assert_eq!(category.slug, "travel");
        assert_eq!(feed.total, 1);

        assert!(matches!(
            f.service.category_feed("hidden", 1).await,
            Err(PostServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.category_feed("nope", 1).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_feed_owner_sees_everything() {
        let f = setup().await;
        f.service
            .create(&f.author, input(&f, "Public"), ImageChange::Keep)
            .await
            .unwrap();
        f.service
            .create(&f.author, input(&f, "Draft").unpublished(), ImageChange::Keep)
            .await
            .unwrap();

        let (_, own) = f.service.profile_feed("author", Some(&f.author), 1).await.unwrap();
        assert_eq!(own.total, 2);

        let (_, other) = f.service.profile_feed("author", Some(&f.reader), 1).await.unwrap();
        assert_eq!(other.total, 1);

        let (_, anonymous) = f.service.profile_feed("author", None, 1).await.unwrap();
        assert_eq!(anonymous.total, 1);

        assert!(matches!(
            f.service.profile_feed("ghost", None, 1).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_detail_of_hidden_post() {
        let f = setup().await;
        let draft = f
            .service
            .create(&f.author, input(&f, "Draft").unpublished(), ImageChange::Keep)
            .await
            .unwrap();

        assert!(f.service.detail(draft.id, Some(&f.author)).await.is_ok());
        assert!(matches!(
            f.service.detail(draft.id, Some(&f.reader)).await,
            Err(PostServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.detail(draft.id, None).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let f = setup().await;
        let mut bad = PostInput::new("", " ", Utc::now());
        bad.location_id = Some(42);
        let image = ImageChange::Upload {
            content_type: "image/png".into(),
            data: b"plain text".to_vec(),
        };

        let Err(PostServiceError::ValidationError(errors)) =
            f.service.create(&f.author, bad, image).await
        else {
            panic!("expected validation error");
        };
        for field in ["title", "text", "category", "location", "image"] {
            assert!(errors.has(field), "missing error for {}", field);
        }

        let long = PostInput::new("x".repeat(257), "text", Utc::now()).in_category(999);
        let Err(PostServiceError::ValidationError(errors)) =
            f.service.create(&f.author, long, ImageChange::Keep).await
        else {
            panic!("expected validation error");
        };
        assert!(errors.has("title"));
        assert!(errors.has("category"));
    }

    #[tokio::test]
    async fn test_only_author_updates() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.author, input(&f, "Original"), ImageChange::Keep)
            .await
            .unwrap();

        assert!(matches!(
            f.service
                .update(post.id, &f.reader, input(&f, "Hijacked"), ImageChange::Keep)
                .await,
            Err(PostServiceError::Forbidden)
        ));
        assert!(matches!(
            f.service
                .update(post.id, &f.staff, input(&f, "Staff edit"), ImageChange::Keep)
                .await,
            Err(PostServiceError::Forbidden)
        ));

        let updated = f
            .service
            .update(post.id, &f.author, input(&f, "Edited"), ImageChange::Keep)
            .await
            .unwrap();
        assert_eq!(updated.title, "Edited");
    }

    #[tokio::test]
    async fn test_image_lifecycle() {
        let f = setup().await;
        let upload = || ImageChange::Upload {
            content_type: "image/png".into(),
            data: PNG.to_vec(),
        };

        let post = f
            .service
            .create(&f.author, input(&f, "With image"), upload())
            .await
            .unwrap();
        let first = post.image.clone().unwrap();
        let first_path = f.service.media.resolve(&first).unwrap();
        assert!(first_path.exists());

        // Keep leaves the file alone
        let kept = f
            .service
            .update(post.id, &f.author, input(&f, "Kept"), ImageChange::Keep)
            .await
            .unwrap();
        assert_eq!(kept.image.as_deref(), Some(first.as_str()));

        // Replacing removes the previous file
        let replaced = f
            .service
            .update(post.id, &f.author, input(&f, "Replaced"), upload())
            .await
            .unwrap();
        let second = replaced.image.clone().unwrap();
        assert_ne!(second, first);
        assert!(!first_path.exists());

        // Clearing removes the file and the reference
        let cleared = f
            .service
            .update(post.id, &f.author, input(&f, "Cleared"), ImageChange::Clear)
            .await
            .unwrap();
        assert!(cleared.image.is_none());
        assert!(!f.service.media.resolve(&second).unwrap().exists());
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.author, input(&f, "One"), ImageChange::Keep)
            .await
            .unwrap();
        let other = f
            .service
            .create(&f.author, input(&f, "Two"), ImageChange::Keep)
            .await
            .unwrap();

        assert!(matches!(
            f.service.delete(post.id, &f.reader).await,
            Err(PostServiceError::Forbidden)
        ));
        f.service.delete(post.id, &f.author).await.unwrap();
        f.service.delete(other.id, &f.staff).await.unwrap();

        assert!(matches!(
            f.service.delete(post.id, &f.author).await,
            Err(PostServiceError::NotFound(_))
        ));
    }
}
