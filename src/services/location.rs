//! Location service

use crate::db::repositories::LocationRepository;
use crate::models::{CreateLocationInput, Location};
use crate::services::validation::{check_text, FieldErrors};
use anyhow::Context;
use std::sync::Arc;

const NAME_MAX_LEN: usize = 256;

/// Error types for location service operations
#[derive(Debug, thiserror::Error)]
pub enum LocationServiceError {
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct LocationService {
    repo: Arc<dyn LocationRepository>,
}

impl LocationService {
    pub fn new(repo: Arc<dyn LocationRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_published(&self) -> Result<Vec<Location>, LocationServiceError> {
        Ok(self
            .repo
            .list_published()
            .await
            .context("Failed to list locations")?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Location>, LocationServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get location")?)
    }

    pub async fn create(&self, input: CreateLocationInput) -> Result<Location, LocationServiceError> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", &input.name, NAME_MAX_LEN);
        errors
            .into_result()
            .map_err(LocationServiceError::ValidationError)?;

        let location = self
            .repo
            .create(&input)
            .await
            .context("Failed to create location")?;
        tracing::info!(name = %location.name, "Created location");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxLocationRepository;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = LocationService::new(SqlxLocationRepository::boxed(pool));

        let moscow = service.create(CreateLocationInput::new("Moscow")).await.unwrap();
        let mut hidden = CreateLocationInput::new("Atlantis");
        hidden.is_published = false;
        service.create(hidden).await.unwrap();

        let listed = service.list_published().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, moscow.id);

        assert!(matches!(
            service.create(CreateLocationInput::new("  ")).await,
            Err(LocationServiceError::ValidationError(_))
        ));
    }
}
