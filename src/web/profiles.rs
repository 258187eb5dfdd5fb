//! Profile pages

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::models::UpdateProfileInput;
use crate::services::{FieldErrors, UserServiceError};
use crate::web::common::{insert_page, render, PageQuery};
use crate::web::middleware::{found, AppState, AuthenticatedUser, MaybeUser, WebError};

/// GET /profile/{username}/ - A user's posts
pub async fn profile(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Response, WebError> {
    let (profile, page) = state
        .post_service
        .profile_feed(&username, user.as_ref(), query.number()?)
        .await?;

    let is_owner = user.as_ref().is_some_and(|u| u.id == profile.id);

    let mut context = TeraContext::new();
    context.insert("profile", &profile);
    context.insert("is_owner", &is_owner);
    insert_page(&mut context, &page);

    Ok(render(&state, "blog/profile.html", &context, uri.path(), user.as_ref())?.into_response())
}

/// GET /profile/edit
pub async fn edit_profile_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
) -> Result<Response, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", &UpdateProfileInput::from(&user));
    context.insert("errors", &FieldErrors::new());

    Ok(render(&state, "blog/user.html", &context, uri.path(), Some(&user))?.into_response())
}

/// POST /profile/edit
pub async fn edit_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
    Form(form): Form<UpdateProfileInput>,
) -> Result<Response, WebError> {
    match state.user_service.update_profile(&user, form.clone()).await {
        Ok(updated) => {
            tracing::info!(user_id = updated.id, username = %updated.username, "Profile updated");
            Ok(found(&format!(
                "/profile/{}/",
                urlencoding::encode(&updated.username)
            )))
        }
        Err(UserServiceError::ValidationError(errors)) => {
            let mut context = TeraContext::new();
            context.insert("form", &form);
            context.insert("errors", &errors);
            Ok(render(&state, "blog/user.html", &context, uri.path(), Some(&user))?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}
