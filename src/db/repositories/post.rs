//! Post repository
//!
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for SQLite and MySQL
//!
//! Listings return `PostView`s: every post joined with its author's username,
//! its category and location, and the number of comments it has. All listings
//! are ordered newest first (`pub_date DESC`, ties broken by `id DESC`).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CategoryRef, LocationRef, Post, PostInput, PostView};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, author_id: i64, input: &PostInput, image: Option<&str>) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get the display view of a post regardless of visibility
    async fn get_view(&self, id: i64) -> Result<Option<PostView>>;

    /// Overwrite the editable fields of a post, including its image path
    async fn update(&self, id: i64, input: &PostInput, image: Option<&str>) -> Result<Post>;

    /// Delete a post (its comments go with it)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Posts visible to everyone at `now`
    async fn list_visible(&self, now: DateTime<Utc>, offset: i64, limit: i64) -> Result<Vec<PostView>>;

    /// Count posts visible to everyone at `now`
    async fn count_visible(&self, now: DateTime<Utc>) -> Result<i64>;

    /// Visible posts in one category
    async fn list_visible_in_category(
        &self,
        category_id: i64,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>>;

    /// Count visible posts in one category
    async fn count_visible_in_category(&self, category_id: i64, now: DateTime<Utc>) -> Result<i64>;

    /// Posts by one author; with `visible_at` set, only those visible at that time
    async fn list_by_author(
        &self,
        author_id: i64,
        visible_at: Option<DateTime<Utc>>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>>;

    /// Count posts by one author, with the same filter as `list_by_author`
    async fn count_by_author(&self, author_id: i64, visible_at: Option<DateTime<Utc>>) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    async fn list_filtered(&self, filter: PostFilter, offset: i64, limit: i64) -> Result<Vec<PostView>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_posts_sqlite(self.pool.sqlite()?, &filter, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_posts_mysql(self.pool.mysql()?, &filter, offset, limit).await
            }
        }
    }

    async fn count_filtered(&self, filter: PostFilter) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_posts_sqlite(self.pool.sqlite()?, &filter).await,
            DatabaseDriver::Mysql => count_posts_mysql(self.pool.mysql()?, &filter).await,
        }
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, author_id: i64, input: &PostInput, image: Option<&str>) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_post_sqlite(self.pool.sqlite()?, author_id, input, image).await
            }
            DatabaseDriver::Mysql => {
                create_post_mysql(self.pool.mysql()?, author_id, input, image).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_post_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_view(&self, id: i64) -> Result<Option<PostView>> {
        let mut views = self.list_filtered(PostFilter::Id(id), 0, 1).await?;
        Ok(views.pop())
    }

    async fn update(&self, id: i64, input: &PostInput, image: Option<&str>) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_post_sqlite(self.pool.sqlite()?, id, input, image).await?
            }
            DatabaseDriver::Mysql => update_post_mysql(self.pool.mysql()?, id, input, image).await?,
        }

        self.get_by_id(id)
            .await?
            .with_context(|| format!("Post {} disappeared during update", id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete post")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete post")?;
            }
        }
        Ok(())
    }

    async fn list_visible(&self, now: DateTime<Utc>, offset: i64, limit: i64) -> Result<Vec<PostView>> {
        self.list_filtered(PostFilter::Visible { now }, offset, limit).await
    }

    async fn count_visible(&self, now: DateTime<Utc>) -> Result<i64> {
        self.count_filtered(PostFilter::Visible { now }).await
    }

    async fn list_visible_in_category(
        &self,
        category_id: i64,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        self.list_filtered(PostFilter::VisibleInCategory { category_id, now }, offset, limit)
            .await
    }

    async fn count_visible_in_category(&self, category_id: i64, now: DateTime<Utc>) -> Result<i64> {
        self.count_filtered(PostFilter::VisibleInCategory { category_id, now })
            .await
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        visible_at: Option<DateTime<Utc>>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        self.list_filtered(PostFilter::ByAuthor { author_id, visible_at }, offset, limit)
            .await
    }

    async fn count_by_author(&self, author_id: i64, visible_at: Option<DateTime<Utc>>) -> Result<i64> {
        self.count_filtered(PostFilter::ByAuthor { author_id, visible_at })
            .await
    }
}

// ============================================================================
// Query building
// ============================================================================

/// Published, not in the future, and in a published category.
/// A post without a category fails the last test because of the LEFT JOIN.
const VISIBLE_CONDITION: &str =
    "p.is_published = TRUE AND p.pub_date <= ? AND c.is_published = TRUE";

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.author_id, p.category_id, p.location_id,
           p.image, p.is_published, p.created_at,
           u.username AS author_username,
           c.title AS category_title, c.slug AS category_slug,
           c.is_published AS category_is_published,
           l.name AS location_name, l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

const POST_COUNT_SELECT: &str = r#"
    SELECT COUNT(*) AS total
    FROM posts p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

const SELECT_POST: &str = r#"
    SELECT id, title, text, pub_date, author_id, category_id, location_id, image,
           is_published, created_at
    FROM posts
    WHERE id = ?
"#;

const INSERT_POST: &str = r#"
    INSERT INTO posts (title, text, pub_date, author_id, category_id, location_id, image,
                       is_published, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_POST: &str = r#"
    UPDATE posts
    SET title = ?, text = ?, pub_date = ?, category_id = ?, location_id = ?, image = ?,
        is_published = ?
    WHERE id = ?
"#;

/// Which posts a listing query selects
#[derive(Debug, Clone, Copy)]
enum PostFilter {
    Id(i64),
    Visible { now: DateTime<Utc> },
    VisibleInCategory { category_id: i64, now: DateTime<Utc> },
    ByAuthor { author_id: i64, visible_at: Option<DateTime<Utc>> },
}

/// A value bound to a `?` placeholder of a built query
#[derive(Debug, Clone, Copy)]
enum BindValue {
    Int(i64),
    Time(DateTime<Utc>),
}

impl PostFilter {
    /// WHERE clause and the values for its placeholders, in order
    fn where_clause(&self) -> (String, Vec<BindValue>) {
        match *self {
            PostFilter::Id(id) => ("WHERE p.id = ?".to_string(), vec![BindValue::Int(id)]),
            PostFilter::Visible { now } => (
                format!("WHERE {}", VISIBLE_CONDITION),
                vec![BindValue::Time(now)],
            ),
            PostFilter::VisibleInCategory { category_id, now } => (
                format!("WHERE {} AND p.category_id = ?", VISIBLE_CONDITION),
                vec![BindValue::Time(now), BindValue::Int(category_id)],
            ),
            PostFilter::ByAuthor {
                author_id,
                visible_at: Some(now),
            } => (
                format!("WHERE {} AND p.author_id = ?", VISIBLE_CONDITION),
                vec![BindValue::Time(now), BindValue::Int(author_id)],
            ),
            PostFilter::ByAuthor {
                author_id,
                visible_at: None,
            } => (
                "WHERE p.author_id = ?".to_string(),
                vec![BindValue::Int(author_id)],
            ),
        }
    }

    fn list_sql(&self) -> (String, Vec<BindValue>) {
        let (clause, binds) = self.where_clause();
        (
            format!(
                "{} {} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?",
                POST_VIEW_SELECT, clause
            ),
            binds,
        )
    }

    fn count_sql(&self) -> (String, Vec<BindValue>) {
        let (clause, binds) = self.where_clause();
        (format!("{} {}", POST_COUNT_SELECT, clause), binds)
    }
}

fn category_ref(
    id: Option<i64>,
    title: Option<String>,
    slug: Option<String>,
    is_published: Option<bool>,
) -> Option<CategoryRef> {
    Some(CategoryRef {
        id: id?,
        title: title?,
        slug: slug?,
        is_published: is_published?,
    })
}

fn location_ref(id: Option<i64>, name: Option<String>, is_published: Option<bool>) -> Option<LocationRef> {
    Some(LocationRef {
        id: id?,
        name: name?,
        is_published: is_published?,
    })
}

// ============================================================================
// SQLite implementations
// ============================================================================

fn bind_all_sqlite<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    binds: &[BindValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for value in binds {
        query = match *value {
            BindValue::Int(v) => query.bind(v),
            BindValue::Time(t) => query.bind(t),
        };
    }
    query
}

async fn create_post_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    input: &PostInput,
    image: Option<&str>,
) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(author_id)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(image)
        .bind(input.is_published)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(post_from_input(result.last_insert_rowid(), author_id, input, image, now))
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(SELECT_POST)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;
    Ok(row.as_ref().map(row_to_post_sqlite))
}

async fn update_post_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &PostInput,
    image: Option<&str>,
) -> Result<()> {
    sqlx::query(UPDATE_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(image)
        .bind(input.is_published)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update post")?;
    Ok(())
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    filter: &PostFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<PostView>> {
    let (sql, binds) = filter.list_sql();
    let rows = bind_all_sqlite(sqlx::query(&sql), &binds)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    Ok(rows.iter().map(row_to_post_view_sqlite).collect())
}

async fn count_posts_sqlite(pool: &SqlitePool, filter: &PostFilter) -> Result<i64> {
    let (sql, binds) = filter.count_sql();
    let row = bind_all_sqlite(sqlx::query(&sql), &binds)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(row.get("total"))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        location_id: row.get("location_id"),
        image: row.get("image"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

fn row_to_post_view_sqlite(row: &sqlx::sqlite::SqliteRow) -> PostView {
    let post = row_to_post_sqlite(row);
    PostView {
        author_username: row.get("author_username"),
        category: category_ref(
            post.category_id,
            row.get("category_title"),
            row.get("category_slug"),
            row.get("category_is_published"),
        ),
        location: location_ref(
            post.location_id,
            row.get("location_name"),
            row.get("location_is_published"),
        ),
        comment_count: row.get("comment_count"),
        post,
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

fn bind_all_mysql<'q>(
    mut query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    binds: &[BindValue],
) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
    for value in binds {
        query = match *value {
            BindValue::Int(v) => query.bind(v),
            BindValue::Time(t) => query.bind(t),
        };
    }
    query
}

async fn create_post_mysql(
    pool: &MySqlPool,
    author_id: i64,
    input: &PostInput,
    image: Option<&str>,
) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(author_id)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(image)
        .bind(input.is_published)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(post_from_input(result.last_insert_id() as i64, author_id, input, image, now))
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(SELECT_POST)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;
    Ok(row.as_ref().map(row_to_post_mysql))
}

async fn update_post_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &PostInput,
    image: Option<&str>,
) -> Result<()> {
    sqlx::query(UPDATE_POST)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(image)
        .bind(input.is_published)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update post")?;
    Ok(())
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    filter: &PostFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<PostView>> {
    let (sql, binds) = filter.list_sql();
    let rows = bind_all_mysql(sqlx::query(&sql), &binds)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    Ok(rows.iter().map(row_to_post_view_mysql).collect())
}

async fn count_posts_mysql(pool: &MySqlPool, filter: &PostFilter) -> Result<i64> {
    let (sql, binds) = filter.count_sql();
    let row = bind_all_mysql(sqlx::query(&sql), &binds)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(row.get("total"))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        location_id: row.get("location_id"),
        image: row.get("image"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

fn row_to_post_view_mysql(row: &sqlx::mysql::MySqlRow) -> PostView {
    let post = row_to_post_mysql(row);
    PostView {
        author_username: row.get("author_username"),
        category: category_ref(
            post.category_id,
            row.get("category_title"),
            row.get("category_slug"),
            row.get("category_is_published"),
        ),
        location: location_ref(
            post.location_id,
            row.get("location_name"),
            row.get("location_is_published"),
        ),
        comment_count: row.get("comment_count"),
        post,
    }
}

fn post_from_input(
    id: i64,
    author_id: i64,
    input: &PostInput,
    image: Option<&str>,
    created_at: DateTime<Utc>,
) -> Post {
    Post {
        id,
        title: input.title.clone(),
        text: input.text.clone(),
        pub_date: input.pub_date,
        author_id,
        category_id: input.category_id,
        location_id: input.location_id,
        image: image.map(str::to_string),
        is_published: input.is_published,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        CategoryRepository, SqlxCategoryRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateCategoryInput, User};
    use chrono::Duration;

    struct Fixture {
        pool: DynDatabasePool,
        repo: SqlxPostRepository,
        author: i64,
        other: i64,
        published: i64,
        hidden: i64,
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

        let categories = SqlxCategoryRepository::new(pool.clone());
        let published = categories
            .create(&CreateCategoryInput::new("Travel", "travel"))
            .await
            .unwrap();
        let hidden = categories
            .create(&CreateCategoryInput::new("Hidden", "hidden").unpublished())
            .await
            .unwrap();

        Fixture {
            repo: SqlxPostRepository::new(pool.clone()),
            pool,
            author: author.id,
            other: other.id,
            published: published.id,
            hidden: hidden.id,
        }
    }

    fn post(title: &str, pub_date: DateTime<Utc>, category_id: i64) -> PostInput {
        PostInput::new(title, "text", pub_date).in_category(category_id)
    }

    #[tokio::test]
    async fn test_create_and_get_view() {
        let f = setup().await;
        let now = Utc::now();
        let created = f
            .repo
            .create(f.author, &post("Hello", now, f.published), Some("posts_images/a.png"))
            .await
            .unwrap();

        let view = f.repo.get_view(created.id).await.unwrap().unwrap();
        assert_eq!(view.post.title, "Hello");
        assert_eq!(view.author_username, "author");
        assert_eq!(view.post.image.as_deref(), Some("posts_images/a.png"));
        assert_eq!(view.category.as_ref().unwrap().slug, "travel");
        assert!(view.location.is_none());
        assert_eq!(view.comment_count, 0);

        assert!(f.repo.get_view(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_visibility_filter() {
        let f = setup().await;
        let now = Utc::now();
        let past = now - Duration::hours(1);

        f.repo.create(f.author, &post("visible", past, f.published), None).await.unwrap();
        f.repo
            .create(f.author, &post("future", now + Duration::hours(1), f.published), None)
            .await
            .unwrap();
        f.repo
            .create(f.author, &post("draft", past, f.published).unpublished(), None)
            .await
            .unwrap();
        f.repo.create(f.author, &post("hidden-cat", past, f.hidden), None).await.unwrap();
        f.repo
            .create(f.author, &PostInput::new("no-cat", "text", past), None)
            .await
            .unwrap();

        let visible = f.repo.list_visible(now, 0, 10).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].post.title, "visible");
        assert_eq!(f.repo.count_visible(now).await.unwrap(), 1);

        assert_eq!(f.repo.count_by_author(f.author, None).await.unwrap(), 5);
        assert_eq!(f.repo.count_by_author(f.author, Some(now)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ordering_and_paging() {
        let f = setup().await;
        let now = Utc::now();
        for i in 0..5 {
            f.repo
                .create(
                    f.author,
                    &post(&format!("post {}", i), now - Duration::days(5 - i), f.published),
                    None,
                )
                .await
                .unwrap();
        }

        let first = f.repo.list_visible(now, 0, 2).await.unwrap();
        let titles: Vec<_> = first.iter().map(|v| v.post.title.as_str()).collect();
        assert_eq!(titles, vec!["post 4", "post 3"]);

        let last = f.repo.list_visible(now, 4, 2).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].post.title, "post 0");
    }

    #[tokio::test]
    async fn test_category_listing() {
        let f = setup().await;
        let categories = SqlxCategoryRepository::new(f.pool.clone());
        let food = categories
            .create(&CreateCategoryInput::new("Food", "food"))
            .await
            .unwrap();
        let past = Utc::now() - Duration::minutes(5);

        f.repo.create(f.author, &post("trip", past, f.published), None).await.unwrap();
        f.repo.create(f.other, &post("soup", past, food.id), None).await.unwrap();

        let now = Utc::now();
        let travel = f.repo.list_visible_in_category(f.published, now, 0, 10).await.unwrap();
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].post.title, "trip");
        assert_eq!(f.repo.count_visible_in_category(food.id, now).await.unwrap(), 1);
        assert_eq!(f.repo.count_visible_in_category(f.hidden, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_comment_count() {
        let f = setup().await;
        let created = f
            .repo
            .create(f.author, &post("p", Utc::now(), f.published), None)
            .await
            .unwrap();

        let db = f.pool.as_sqlite().unwrap();
        for _ in 0..3 {
            sqlx::query("INSERT INTO comments (text, post_id, author_id) VALUES ('c', ?, ?)")
                .bind(created.id)
                .bind(f.other)
                .execute(db)
                .await
                .unwrap();
        }

        let view = f.repo.get_view(created.id).await.unwrap().unwrap();
        assert_eq!(view.comment_count, 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = setup().await;
        let created = f
            .repo
            .create(f.author, &post("old", Utc::now(), f.published), Some("posts_images/x.png"))
            .await
            .unwrap();

        let mut input = PostInput::from(&created);
        input.title = "new".to_string();
        input.category_id = Some(f.hidden);
        let updated = f.repo.update(created.id, &input, None).await.unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.category_id, Some(f.hidden));
        assert!(updated.image.is_none());

        f.repo.delete(created.id).await.unwrap();
        assert!(f.repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
