//! Category service
//!
//! Public category lookups and the administrative `create` used by the demo
//! seed. A category that is unknown or unpublished behaves as missing.

use crate::db::repositories::CategoryRepository;
use crate::models::{is_valid_slug, Category, CreateCategoryInput};
use crate::services::validation::{check_text, FieldErrors};
use anyhow::Context;
use std::sync::Arc;

const TITLE_MAX_LEN: usize = 256;
const SLUG_MAX_LEN: usize = 64;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category not found or not published
    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service for blog categories
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Look up a published category by slug
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Category, CategoryServiceError> {
        let category = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category by slug")?;

        match category {
            Some(category) if category.is_published => Ok(category),
            _ => Err(CategoryServiceError::NotFound(slug.to_string())),
        }
    }

    /// Get a category by ID regardless of its published flag
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category by ID")?)
    }

    /// Published categories, for the post form and navigation
    pub async fn list_published(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self
            .repo
            .list(true)
            .await
            .context("Failed to list categories")?)
    }

    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &input.title, TITLE_MAX_LEN);

        if input.slug.len() > SLUG_MAX_LEN {
            errors.add(
                "slug",
                format!("Ensure this value has at most {} characters.", SLUG_MAX_LEN),
            );
        } else if !is_valid_slug(&input.slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        } else if self
            .repo
            .get_by_slug(&input.slug)
            .await
            .context("Failed to check slug uniqueness")?
            .is_some()
        {
            errors.add("slug", "Category with this slug already exists.");
        }

        errors
            .into_result()
            .map_err(CategoryServiceError::ValidationError)?;

        let category = self
            .repo
            .create(&input)
            .await
            .context("Failed to create category")?;

        tracing::info!(slug = %category.slug, "Created category");
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxCategoryRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_service() -> CategoryService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        CategoryService::new(SqlxCategoryRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_get_published_by_slug() {
        let service = setup_service().await;
        service
            .create(CreateCategoryInput::new("Travel", "travel"))
            .await
            .unwrap();
        service
            .create(CreateCategoryInput::new("Drafts", "drafts").unpublished())
            .await
            .unwrap();

        assert_eq!(service.get_published_by_slug("travel").await.unwrap().title, "Travel");
        assert!(matches!(
            service.get_published_by_slug("drafts").await,
            Err(CategoryServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.get_published_by_slug("missing").await,
            Err(CategoryServiceError::NotFound(_))
        ));

        let listed = service.list_published().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = setup_service().await;
        service
            .create(CreateCategoryInput::new("Travel", "travel"))
            .await
            .unwrap();

        let Err(CategoryServiceError::ValidationError(errors)) = service
            .create(CreateCategoryInput::new("", "travel"))
            .await
        else {
            panic!("expected validation error");
        };
        assert!(errors.has("title"));
        assert_eq!(errors.get("slug"), ["Category with this slug already exists.".to_string()]);

        let Err(CategoryServiceError::ValidationError(errors)) = service
            .create(CreateCategoryInput::new("Bad", "not a slug"))
            .await
        else {
            panic!("expected validation error");
        };
        assert!(errors.has("slug"));
        assert!(!errors.has("title"));
    }
}
