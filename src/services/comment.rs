//! Comment service
//!
//! Comments belong to a post and are addressed through it: a comment ID paired
//! with the wrong post ID is treated as missing. Only the comment's author may
//! edit or delete it.

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, CommentView, User};
use crate::services::validation::{check_text, FieldErrors};
use anyhow::Context;
use std::sync::Arc;

const TEXT_MAX_LEN: usize = 10_000;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Post or comment not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The user is not the comment's author
    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Comments of a post, oldest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, CommentServiceError> {
        Ok(self
            .comments
            .list_for_post(post_id)
            .await
            .context("Failed to list comments")?)
    }

    pub async fn add(&self, post_id: i64, author: &User, text: &str) -> Result<Comment, CommentServiceError> {
        let post = self
            .posts
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?;
        if post.is_none() {
            return Err(CommentServiceError::NotFound(format!("post {}", post_id)));
        }

        validate_text(text)?;

        let comment = self
            .comments
            .create(post_id, author.id, text.trim())
            .await
            .context("Failed to create comment")?;

        tracing::info!(post_id, comment_id = comment.id, author = %author.username, "Added comment");
        Ok(comment)
    }

    /// Fetch a comment for its edit or delete form
    pub async fn get_for_edit(
        &self,
        post_id: i64,
        comment_id: i64,
        user: &User,
    ) -> Result<Comment, CommentServiceError> {
        let comment = self
            .comments
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| CommentServiceError::NotFound(format!("comment {}", comment_id)))?;

        if comment.author_id != user.id {
            return Err(CommentServiceError::Forbidden);
        }
        Ok(comment)
    }

    pub async fn update(
        &self,
        post_id: i64,
        comment_id: i64,
        user: &User,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        let mut comment = self.get_for_edit(post_id, comment_id, user).await?;
        validate_text(text)?;

        self.comments
            .update_text(comment_id, text.trim())
            .await
            .context("Failed to update comment")?;

        comment.text = text.trim().to_string();
        Ok(comment)
    }

    pub async fn delete(&self, post_id: i64, comment_id: i64, user: &User) -> Result<(), CommentServiceError> {
        self.get_for_edit(post_id, comment_id, user).await?;
        self.comments
            .delete(comment_id)
            .await
            .context("Failed to delete comment")?;

        tracing::info!(post_id, comment_id, "Deleted comment");
        Ok(())
    }
}

fn validate_text(text: &str) -> Result<(), CommentServiceError> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "text", text, TEXT_MAX_LEN);
    errors.into_result().map_err(CommentServiceError::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        CategoryRepository, SqlxCategoryRepository, SqlxCommentRepository, SqlxPostRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateCategoryInput, PostInput};
    use chrono::Utc;

    struct Fixture {
        service: CommentService,
        author: User,
        other: User,
        post_id: i64,
        second_post_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("author".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        let other = users
            .create(&User::new("other".into(), String::new(), "hash".into()))
            .await
            .unwrap();

        let category = SqlxCategoryRepository::new(pool.clone())
            .create(&CreateCategoryInput::new("Travel", "travel"))
            .await
            .unwrap();

        let posts = SqlxPostRepository::boxed(pool.clone());
        let input = PostInput::new("Post", "Text", Utc::now()).in_category(category.id);
        let post = posts.create(author.id, &input, None).await.unwrap();
        let second = posts.create(author.id, &input, None).await.unwrap();

        Fixture {
            service: CommentService::new(SqlxCommentRepository::boxed(pool), posts),
            author,
            other,
            post_id: post.id,
            second_post_id: second.id,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let f = setup().await;
        f.service.add(f.post_id, &f.other, "First").await.unwrap();
        f.service.add(f.post_id, &f.author, "  Second  ").await.unwrap();

        let comments = f.service.list_for_post(f.post_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.text, "First");
        assert_eq!(comments[0].author_username, "other");
        assert_eq!(comments[1].comment.text, "Second");

        assert!(matches!(
            f.service.add(999, &f.other, "Lost").await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.add(f.post_id, &f.other, "   ").await,
            Err(CommentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_edits() {
        let f = setup().await;
        let comment = f.service.add(f.post_id, &f.other, "Mine").await.unwrap();

        assert!(matches!(
            f.service.update(f.post_id, comment.id, &f.author, "Theirs").await,
            Err(CommentServiceError::Forbidden)
        ));

        let updated = f
            .service
            .update(f.post_id, comment.id, &f.other, "Edited")
            .await
            .unwrap();
        assert_eq!(updated.text, "Edited");
        assert_eq!(
            f.service.list_for_post(f.post_id).await.unwrap()[0].comment.text,
            "Edited"
        );
    }

    #[tokio::test]
    async fn test_comment_must_belong_to_post() {
        let f = setup().await;
        let comment = f.service.add(f.post_id, &f.other, "Here").await.unwrap();

        assert!(matches!(
            f.service.get_for_edit(f.second_post_id, comment.id, &f.other).await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.delete(f.second_post_id, comment.id, &f.other).await,
            Err(CommentServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_deletes() {
        let f = setup().await;
        let comment = f.service.add(f.post_id, &f.other, "Bye").await.unwrap();

        assert!(matches!(
            f.service.delete(f.post_id, comment.id, &f.author).await,
            Err(CommentServiceError::Forbidden)
        ));
        f.service.delete(f.post_id, comment.id, &f.other).await.unwrap();
        assert!(f.service.list_for_post(f.post_id).await.unwrap().is_empty());
    }
}
