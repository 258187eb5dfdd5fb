//! Blogicum - A small multi-author blog

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogicum::{config::Config, db, web};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogicum=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Blogicum...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database migrations completed");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = web::build_state(config, pool)?;

    match state.user_service.cleanup_expired_sessions().await {
        Ok(removed) if removed > 0 => tracing::info!(removed, "Expired sessions removed"),
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to clean up sessions: {}", e),
    }

    #[cfg(feature = "demo")]
    seed_demo_data(&state).await?;

    // Build router
    let app = web::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Demo mode: a staff user plus a category and location to post into
#[cfg(feature = "demo")]
async fn seed_demo_data(state: &web::AppState) -> Result<()> {
    use blogicum::models::{CreateCategoryInput, CreateLocationInput};
    use blogicum::services::RegisterInput;

    if state.user_service.get_by_username("demo").await?.is_none() {
        tracing::info!("Demo mode: Creating staff user (demo/demo-pass-123)");
        let user = state
            .user_service
            .register(RegisterInput::new("demo", "demo@blogicum.local", "demo-pass-123"))
            .await?;
        state.user_service.promote_to_staff(&user).await?;
    }

    if state.category_service.get_published_by_slug("demo").await.is_err() {
        let mut category = CreateCategoryInput::new("Demo", "demo");
        category.description = "Posts created while trying Blogicum out".to_string();
        state.category_service.create(category).await?;
        state
            .location_service
            .create(CreateLocationInput::new("Demo town"))
            .await?;
        tracing::info!("Demo mode: Category and location created");
    }

    Ok(())
}
