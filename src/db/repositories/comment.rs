//! Comment repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentView};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Add a comment to a post
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a post, oldest first
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>>;

    /// Replace the text of a comment
    async fn update_text(&self, id: i64, text: &str) -> Result<()>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.sqlite()?, post_id, author_id, text).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.mysql()?, post_id, author_id, text).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_comment_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_comment_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_comments_sqlite(self.pool.sqlite()?, post_id).await,
            DatabaseDriver::Mysql => list_comments_mysql(self.pool.mysql()?, post_id).await,
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<()> {
        let sql = "UPDATE comments SET text = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(text)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update comment")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(text)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update comment")?;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM comments WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete comment")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete comment")?;
            }
        }
        Ok(())
    }
}

const INSERT_COMMENT: &str =
    "INSERT INTO comments (text, post_id, author_id, created_at) VALUES (?, ?, ?, ?)";

const SELECT_COMMENT: &str =
    "SELECT id, text, post_id, author_id, created_at FROM comments WHERE id = ?";

const LIST_COMMENTS: &str = r#"
    SELECT cm.id, cm.text, cm.post_id, cm.author_id, cm.created_at,
           u.username AS author_username
    FROM comments cm
    INNER JOIN users u ON u.id = cm.author_id
    WHERE cm.post_id = ?
    ORDER BY cm.created_at ASC, cm.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_COMMENT)
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        text: text.to_string(),
        post_id,
        author_id,
        created_at: now,
    })
}

async fn get_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(SELECT_COMMENT)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")?;
    Ok(row.as_ref().map(row_to_comment_sqlite))
}

async fn list_comments_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<CommentView>> {
    let rows = sqlx::query(LIST_COMMENTS)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentView {
            comment: row_to_comment_sqlite(row),
            author_username: row.get("author_username"),
        })
        .collect())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        text: row.get("text"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(
    pool: &MySqlPool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_COMMENT)
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        text: text.to_string(),
        post_id,
        author_id,
        created_at: now,
    })
}

async fn get_comment_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(SELECT_COMMENT)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")?;
    Ok(row.as_ref().map(row_to_comment_mysql))
}

async fn list_comments_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<CommentView>> {
    let rows = sqlx::query(LIST_COMMENTS)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentView {
            comment: row_to_comment_mysql(row),
            author_username: row.get("author_username"),
        })
        .collect())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        text: row.get("text"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{PostRepository, SqlxPostRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{PostInput, User};

    async fn setup() -> (SqlxCommentRepository, SqlxPostRepository, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new("ann".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        let posts = SqlxPostRepository::new(pool.clone());
        let post = posts
            .create(user.id, &PostInput::new("p", "t", Utc::now()), None)
            .await
            .unwrap();

        (SqlxCommentRepository::new(pool), posts, post.id, user.id)
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let (repo, _, post_id, user_id) = setup().await;
        repo.create(post_id, user_id, "first").await.unwrap();
        repo.create(post_id, user_id, "second").await.unwrap();

        let comments = repo.list_for_post(post_id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(comments[0].author_username, "ann");
    }

    #[tokio::test]
    async fn test_update_and_delete_comment() {
        let (repo, _, post_id, user_id) = setup().await;
        let comment = repo.create(post_id, user_id, "tpyo").await.unwrap();

        repo.update_text(comment.id, "typo").await.unwrap();
        assert_eq!(repo.get_by_id(comment.id).await.unwrap().unwrap().text, "typo");

        repo.delete(comment.id).await.unwrap();
        assert!(repo.get_by_id(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments_removed_with_post() {
        let (repo, posts, post_id, user_id) = setup().await;
        let comment = repo.create(post_id, user_id, "bye").await.unwrap();

        posts.delete(post_id).await.unwrap();
        assert!(repo.get_by_id(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_fails() {
        let (repo, _, _, user_id) = setup().await;
        assert!(repo.create(999, user_id, "orphan").await.is_err());
    }
}
