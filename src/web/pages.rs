//! Static pages and the not-found fallback

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tera::Context as TeraContext;

use crate::web::common::render;
use crate::web::middleware::{error_page, AppState, MaybeUser, WebError};

/// GET /pages/about/
pub async fn about(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    uri: Uri,
) -> Result<Response, WebError> {
    Ok(render(&state, "pages/about.html", &TeraContext::new(), uri.path(), user.as_ref())?.into_response())
}

/// GET /pages/rules/
pub async fn rules(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    uri: Uri,
) -> Result<Response, WebError> {
    Ok(render(&state, "pages/rules.html", &TeraContext::new(), uri.path(), user.as_ref())?.into_response())
}

/// Any unknown URL
pub async fn not_found(State(state): State<AppState>, MaybeUser(user): MaybeUser, uri: Uri) -> Response {
    error_page(&state, StatusCode::NOT_FOUND, uri.path(), user.as_ref())
}
