//! Common web utilities and shared types
//!
//! This module contains helpers used across several handlers.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::Html,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::models::{PagedResult, User};
use crate::web::middleware::{AppState, WebError};

// ============================================================================
// Path parameters
// ============================================================================

/// Path parameters that must parse, otherwise the page does not exist
///
/// `/posts/abc/` is a 404 like any unknown URL, not a 400.
#[derive(Debug)]
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| IdPath(value))
            .map_err(|_| WebError::NotFound)
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// `?page=N` query parameter
///
/// Kept as a string so a non-numeric value becomes a 404 rather than a 400.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// The requested page, 1 when absent
    pub fn number(&self) -> Result<u32, WebError> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => match raw.parse::<u32>() {
                Ok(page) if page > 0 => Ok(page),
                _ => Err(WebError::NotFound),
            },
        }
    }
}

/// Paginator state for `includes/paginator.html`
#[derive(Debug, Clone, Serialize)]
pub struct Paginator {
    pub page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> From<&PagedResult<T>> for Paginator {
    fn from(result: &PagedResult<T>) -> Self {
        Self {
            page: result.page,
            total_pages: result.total_pages(),
            has_prev: result.has_prev(),
            has_next: result.has_next(),
        }
    }
}

/// Insert a page of results as `page` and its `paginator`
pub fn insert_page<T: Serialize>(context: &mut TeraContext, result: &PagedResult<T>) {
    context.insert("paginator", &Paginator::from(result));
    context.insert("page", result);
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a page template with the standard variables
pub fn render(
    state: &AppState,
    template: &str,
    context: &TeraContext,
    path: &str,
    user: Option<&User>,
) -> Result<Html<String>, WebError> {
    let vars = state.template_vars(path, user);
    let html = state.templates.render_page(template, context, &vars)?;
    Ok(Html(html))
}

/// Only local absolute paths are accepted as redirect targets
///
/// Browsers drop tabs and newlines from URLs, so any control character is
/// refused along with `//host` and backslashes.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
            && !n.chars().any(|c| c.is_control())
    })
}
