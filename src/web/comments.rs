//! Comment pages

use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::models::User;
use crate::services::{CommentServiceError, FieldErrors};
use crate::web::common::{render, IdPath};
use crate::web::forms::CommentForm;
use crate::web::middleware::{found, AppState, AuthenticatedUser, WebError};

fn detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Render `blog/comment.html`
fn render_comment_page(
    state: &AppState,
    user: &User,
    path: &str,
    mode: &str,
    ids: (i64, Option<i64>),
    form: &CommentForm,
    errors: &FieldErrors,
) -> Result<Response, WebError> {
    let (post_id, comment_id) = ids;
    let mut context = TeraContext::new();
    context.insert("mode", mode);
    context.insert("post_id", &post_id);
    context.insert("comment_id", &comment_id);
    context.insert("form", form);
    context.insert("errors", errors);

    Ok(render(state, "blog/comment.html", &context, path, Some(user))?.into_response())
}

/// Post must be viewable by the user before it can be commented on
async fn ensure_post(state: &AppState, post_id: i64, user: &User) -> Result<(), WebError> {
    state.post_service.detail(post_id, Some(user)).await?;
    Ok(())
}

/// GET /posts/{post_id}/comment/
pub async fn add_comment_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    uri: Uri,
) -> Result<Response, WebError> {
    ensure_post(&state, post_id, &user).await?;
    render_comment_page(
        &state,
        &user,
        uri.path(),
        "add",
        (post_id, None),
        &CommentForm::default(),
        &FieldErrors::new(),
    )
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    uri: Uri,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    ensure_post(&state, post_id, &user).await?;

    match state.comment_service.add(post_id, &user, &form.text).await {
        Ok(_) => Ok(found(&detail_url(post_id))),
        Err(CommentServiceError::ValidationError(errors)) => {
            render_comment_page(&state, &user, uri.path(), "add", (post_id, None), &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    uri: Uri,
) -> Result<Response, WebError> {
    let comment = match state.comment_service.get_for_edit(post_id, comment_id, &user).await {
        Ok(comment) => comment,
        Err(CommentServiceError::Forbidden) => return Ok(found(&detail_url(post_id))),
        Err(e) => return Err(e.into()),
    };

    let form = CommentForm { text: comment.text };
    render_comment_page(
        &state,
        &user,
        uri.path(),
        "edit",
        (post_id, Some(comment_id)),
        &form,
        &FieldErrors::new(),
    )
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    uri: Uri,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    match state
        .comment_service
        .update(post_id, comment_id, &user, &form.text)
        .await
    {
        Ok(_) => Ok(found(&detail_url(post_id))),
        Err(CommentServiceError::Forbidden) => Ok(found(&detail_url(post_id))),
        Err(CommentServiceError::ValidationError(errors)) => render_comment_page(
            &state,
            &user,
            uri.path(),
            "edit",
            (post_id, Some(comment_id)),
            &form,
            &errors,
        ),
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/ - Confirmation page
pub async fn delete_comment_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    uri: Uri,
) -> Result<Response, WebError> {
    let comment = match state.comment_service.get_for_edit(post_id, comment_id, &user).await {
        Ok(comment) => comment,
        Err(CommentServiceError::Forbidden) => return Ok(found(&detail_url(post_id))),
        Err(e) => return Err(e.into()),
    };

    let form = CommentForm { text: comment.text };
    render_comment_page(
        &state,
        &user,
        uri.path(),
        "delete",
        (post_id, Some(comment_id)),
        &form,
        &FieldErrors::new(),
    )
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
) -> Result<Response, WebError> {
    match state.comment_service.delete(post_id, comment_id, &user).await {
        Ok(()) => Ok(found(&detail_url(post_id))),
        Err(CommentServiceError::Forbidden) => Ok(found(&detail_url(post_id))),
        Err(e) => Err(e.into()),
    }
}
