//! Location repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateLocationInput, Location};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, input: &CreateLocationInput) -> Result<Location>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>>;

    /// Published locations ordered by name
    async fn list_published(&self) -> Result<Vec<Location>>;
}

pub struct SqlxLocationRepository {
    pool: DynDatabasePool,
}

impl SqlxLocationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LocationRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_LOCATION: &str = "SELECT id, name, is_published, created_at FROM locations";

#[async_trait]
impl LocationRepository for SqlxLocationRepository {
    async fn create(&self, input: &CreateLocationInput) -> Result<Location> {
        let sql = "INSERT INTO locations (name, is_published, created_at) VALUES (?, ?, ?)";
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&input.name)
                .bind(input.is_published)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create location")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&input.name)
                .bind(input.is_published)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create location")?
                .last_insert_id() as i64,
        };

        Ok(Location {
            id,
            name: input.name.clone(),
            is_published: input.is_published,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>> {
        let sql = format!("{} WHERE id = ?", SELECT_LOCATION);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get location")?;
                Ok(row.map(|row| Location {
                    id: row.get("id"),
                    name: row.get("name"),
                    is_published: row.get("is_published"),
                    created_at: row.get("created_at"),
                }))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get location")?;
                Ok(row.map(|row| Location {
                    id: row.get("id"),
                    name: row.get("name"),
                    is_published: row.get("is_published"),
                    created_at: row.get("created_at"),
                }))
            }
        }
    }

    async fn list_published(&self) -> Result<Vec<Location>> {
        let sql = format!("{} WHERE is_published = TRUE ORDER BY name", SELECT_LOCATION);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list locations")?;
                Ok(rows
                    .iter()
                    .map(|row| Location {
                        id: row.get("id"),
                        name: row.get("name"),
                        is_published: row.get("is_published"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list locations")?;
                Ok(rows
                    .iter()
                    .map(|row| Location {
                        id: row.get("id"),
                        name: row.get("name"),
                        is_published: row.get("is_published"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_list_published_locations() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxLocationRepository::new(pool);

        let moscow = repo.create(&CreateLocationInput::new("Moscow")).await.unwrap();
        let mut hidden = CreateLocationInput::new("Atlantis");
        hidden.is_published = false;
        repo.create(&hidden).await.unwrap();

        let listed = repo.list_published().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, moscow.id);

        let stored = repo.get_by_id(moscow.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Moscow");
    }
}
