//! Web middleware
//!
//! Contains:
//! - Application state shared by every handler
//! - Session cookie authentication
//! - `WebError` and the error page renderer

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::config::Config;
use crate::models::User;
use crate::services::{
    CategoryService, CategoryServiceError, CommentService, CommentServiceError, LocationService,
    LocationServiceError, PostService, PostServiceError, UserService, UserServiceError,
};
use crate::theme::{StandardTemplateVars, TemplateEngine};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub category_service: Arc<CategoryService>,
    pub location_service: Arc<LocationService>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Standard template variables for a request
    pub fn template_vars(&self, path: &str, user: Option<&User>) -> StandardTemplateVars {
        StandardTemplateVars::new(self.config.blog.site_name.clone(), path).with_user(user)
    }
}

/// Logged-in user, required
///
/// Rejects anonymous requests with a redirect to the login page.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Logged-in user if there is one
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| WebError::LoginRequired(next_target(&parts.uri)))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts.extensions.get::<AuthenticatedUser>().map(|u| u.0.clone()),
        ))
    }
}

/// Path and query of a request, used as the `next` target after login
fn next_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Extract the session token from the cookie header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix("session="))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value opening a session
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the session cookie, when present, into an [`AuthenticatedUser`]
pub async fn optional_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Redirect anonymous requests to the login page
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return WebError::LoginRequired(next_target(request.uri())).into_response();
    }
    next.run(request).await
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Not found")]
    NotFound,

    /// The user may not do this; a handler normally redirects instead
    #[error("Forbidden")]
    Forbidden,

    /// Anonymous access to a page that needs a login; holds the `next` target
    #[error("Login required")]
    LoginRequired(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Marker asking [`render_error_pages`] to render a themed page
#[derive(Debug, Clone, Copy)]
struct ErrorPage;

/// 302 redirect
pub fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(_) => {
            response.headers_mut().insert(header::LOCATION, HeaderValue::from_static("/"));
        }
    }
    response
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match self {
            WebError::LoginRequired(next) => {
                return found(&format!("/auth/login/?next={}", urlencoding::encode(&next)));
            }
            WebError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, message).into_response();
            }
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Forbidden => StatusCode::FORBIDDEN,
            WebError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage);
        response
    }
}

impl From<crate::theme::ThemeError> for WebError {
    fn from(e: crate::theme::ThemeError) -> Self {
        WebError::Internal(e.into())
    }
}

impl From<PostServiceError> for WebError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(_) => WebError::NotFound,
            PostServiceError::Forbidden => WebError::Forbidden,
            PostServiceError::ValidationError(errors) => WebError::BadRequest(errors.to_string()),
            PostServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<CommentServiceError> for WebError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound(_) => WebError::NotFound,
            CommentServiceError::Forbidden => WebError::Forbidden,
            CommentServiceError::ValidationError(errors) => WebError::BadRequest(errors.to_string()),
            CommentServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<CategoryServiceError> for WebError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::NotFound(_) => WebError::NotFound,
            CategoryServiceError::ValidationError(errors) => WebError::BadRequest(errors.to_string()),
            CategoryServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<LocationServiceError> for WebError {
    fn from(e: LocationServiceError) -> Self {
        match e {
            LocationServiceError::ValidationError(errors) => WebError::BadRequest(errors.to_string()),
            LocationServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<UserServiceError> for WebError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(message) => WebError::BadRequest(message),
            UserServiceError::ValidationError(errors) => WebError::BadRequest(errors.to_string()),
            UserServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

/// Replace bare error responses from handlers with the themed 404/500 pages
pub async fn render_error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.0.clone());

    let response = next.run(request).await;
    if response.extensions().get::<ErrorPage>().is_none() {
        return response;
    }

    let status = response.status();
    error_page(&state, status, &path, user.as_ref())
}

/// Themed error page for `status`
pub fn error_page(state: &AppState, status: StatusCode, path: &str, user: Option<&User>) -> Response {
    let template = match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => "pages/404.html",
        _ => "pages/500.html",
    };
    let vars = state.template_vars(path, user);
    let html = state
        .templates
        .render_with_fallback(template, &TeraContext::new(), &vars);
    (status, Html(html)).into_response()
}
