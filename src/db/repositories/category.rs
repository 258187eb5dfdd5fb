//! Category repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, CreateCategoryInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, input: &CreateCategoryInput) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List categories ordered by title; `published_only` drops hidden ones
    async fn list(&self, published_only: bool) -> Result<Vec<Category>>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, input: &CreateCategoryInput) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_category_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_category_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("{} WHERE id = ?", SELECT_CATEGORY);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get category by ID")?;
                Ok(row.as_ref().map(row_to_category_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get category by ID")?;
                Ok(row.as_ref().map(row_to_category_mysql))
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("{} WHERE slug = ?", SELECT_CATEGORY);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get category by slug")?;
                Ok(row.as_ref().map(row_to_category_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get category by slug")?;
                Ok(row.as_ref().map(row_to_category_mysql))
            }
        }
    }

    async fn list(&self, published_only: bool) -> Result<Vec<Category>> {
        let sql = if published_only {
            format!("{} WHERE is_published = TRUE ORDER BY title", SELECT_CATEGORY)
        } else {
            format!("{} ORDER BY title", SELECT_CATEGORY)
        };
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list categories")?;
                Ok(rows.iter().map(row_to_category_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list categories")?;
                Ok(rows.iter().map(row_to_category_mysql).collect())
            }
        }
    }
}

const SELECT_CATEGORY: &str =
    "SELECT id, title, description, slug, is_published, created_at FROM categories";

const INSERT_CATEGORY: &str = r#"
    INSERT INTO categories (title, description, slug, is_published, created_at)
    VALUES (?, ?, ?, ?, ?)
"#;

fn category_from_input(id: i64, input: &CreateCategoryInput, now: chrono::DateTime<Utc>) -> Category {
    Category {
        id,
        title: input.title.clone(),
        description: input.description.clone(),
        slug: input.slug.clone(),
        is_published: input.is_published,
        created_at: now,
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, input: &CreateCategoryInput) -> Result<Category> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_CATEGORY)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.slug)
        .bind(input.is_published)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create category")?;

    Ok(category_from_input(result.last_insert_rowid(), input, now))
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        slug: row.get("slug"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, input: &CreateCategoryInput) -> Result<Category> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_CATEGORY)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.slug)
        .bind(input.is_published)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create category")?;

    Ok(category_from_input(result.last_insert_id() as i64, input, now))
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        slug: row.get("slug"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxCategoryRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxCategoryRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&CreateCategoryInput::new("Travel", "travel").with_description("Trips"))
            .await
            .unwrap();

        let found = repo.get_by_slug("travel").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.title, "Travel");
        assert_eq!(found.description, "Trips");
        assert!(found.is_published);

        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
        assert!(repo.get_by_id(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&CreateCategoryInput::new("A", "same")).await.unwrap();
        assert!(repo.create(&CreateCategoryInput::new("B", "same")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_published_only() {
        let repo = setup_test_repo().await;
        repo.create(&CreateCategoryInput::new("Travel", "travel")).await.unwrap();
        repo.create(&CreateCategoryInput::new("Drafts", "drafts").unpublished())
            .await
            .unwrap();

        let published = repo.list(true).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "travel");

        let all = repo.list(false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Drafts");
    }
}
