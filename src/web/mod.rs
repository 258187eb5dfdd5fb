//! Web layer - HTML pages and routing
//!
//! Every page is server-rendered with Tera. It includes:
//! - Post feeds, detail and the post create/edit/delete forms
//! - Comment forms
//! - Profiles and profile editing
//! - Login, logout and registration
//! - Static pages, uploaded media and the embedded stylesheet

pub mod auth;
pub mod comments;
pub mod common;
pub mod forms;
pub mod middleware;
pub mod pages;
pub mod posts;
pub mod profiles;
pub mod static_files;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::db::repositories::{
    SqlxCategoryRepository, SqlxCommentRepository, SqlxLocationRepository, SqlxPostRepository,
    SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    CategoryService, CommentService, LocationService, MediaStorage, PostService, UserService,
};
use crate::theme::{TemplateEngine, ThemeError};

pub use middleware::{AppState, WebError};

/// Room for the text fields next to the largest allowed image
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Wire repositories, services and templates into the application state
pub fn build_state(config: Config, pool: DynDatabasePool) -> Result<AppState, ThemeError> {
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let location_repo = SqlxLocationRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool);

    let user_service = Arc::new(UserService::with_session_expiration(
        user_repo.clone(),
        session_repo,
        config.blog.session_expiration_days,
    ));
    let post_service = Arc::new(PostService::new(
        post_repo.clone(),
        category_repo.clone(),
        location_repo.clone(),
        user_repo,
        MediaStorage::new(config.media.clone()),
        config.blog.posts_per_page,
    ));
    let comment_service = Arc::new(CommentService::new(comment_repo, post_repo));
    let category_service = Arc::new(CategoryService::new(category_repo));
    let location_service = Arc::new(LocationService::new(location_repo));

    let templates = TemplateEngine::new(config.theme.path.as_deref())?;

    Ok(AppState {
        config: Arc::new(config),
        user_service,
        post_service,
        comment_service,
        category_service,
        location_service,
        templates: Arc::new(templates),
    })
}

/// Routes that need a logged-in user
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile/edit",
            get(profiles::edit_profile_form).post(profiles::edit_profile),
        )
        .route(
            "/posts/create/",
            get(posts::create_post_form).post(posts::create_post),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_post_form).post(posts::edit_post),
        )
        .route(
            "/posts/{post_id}/delete/",
            get(posts::delete_post_form).post(posts::delete_post),
        )
        .route(
            "/posts/{post_id}/comment/",
            get(comments::add_comment_form).post(comments::add_comment),
        )
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(comments::edit_comment_form).post(comments::edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(comments::delete_comment_form).post(comments::delete_comment),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_auth))
}

/// Routes open to everyone
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::index))
        .route("/category/{category_slug}/", get(posts::category_posts))
        .route("/profile/{username}/", get(profiles::profile))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/logout/", get(auth::logout).post(auth::logout))
        .route(
            "/auth/registration/",
            get(auth::registration_form).post(auth::registration),
        )
        .route("/pages/about/", get(pages::about))
        .route("/pages/rules/", get(pages::rules))
        .route("/static/{*path}", get(static_files::serve_static))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.media.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .nest_service("/media", ServeDir::new(&state.config.media.path))
        .fallback(pages::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        // Session lookup runs before error rendering so error pages know the user
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
