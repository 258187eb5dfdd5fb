//! Post pages
//!
//! Listings, the detail page and the create/edit/delete flows.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::Uri,
    response::{IntoResponse, Response},
};
use tera::Context as TeraContext;

use crate::models::{ImageChange, User};
use crate::services::{FieldErrors, PostServiceError};
use crate::web::common::{insert_page, render, IdPath, PageQuery};
use crate::web::forms::PostForm;
use crate::web::middleware::{found, AppState, AuthenticatedUser, MaybeUser, WebError};

fn detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn profile_url(user: &User) -> String {
    format!("/profile/{}/", urlencoding::encode(&user.username))
}

/// GET / - Home feed
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Response, WebError> {
    let page = state.post_service.home_feed(query.number()?).await?;

    let mut context = TeraContext::new();
    context.insert("total_posts", &page.total);
    insert_page(&mut context, &page);

    Ok(render(&state, "blog/index.html", &context, uri.path(), user.as_ref())?.into_response())
}

/// GET /category/{category_slug}/ - Posts of a published category
pub async fn category_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Response, WebError> {
    let (category, page) = state
        .post_service
        .category_feed(&slug, query.number()?)
        .await?;

    let mut context = TeraContext::new();
    context.insert("category", &category);
    insert_page(&mut context, &page);

    Ok(render(&state, "blog/category.html", &context, uri.path(), user.as_ref())?.into_response())
}

/// GET /posts/{post_id}/ - Post with its comments
pub async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    IdPath(post_id): IdPath<i64>,
    uri: Uri,
) -> Result<Response, WebError> {
    let post = state.post_service.detail(post_id, user.as_ref()).await?;
    let comments = state.comment_service.list_for_post(post_id).await?;

    let can_edit = user.as_ref().is_some_and(|u| u.id == post.post.author_id);
    let can_delete = user.as_ref().is_some_and(|u| u.can_delete(post.post.author_id));

    let mut context = TeraContext::new();
    context.insert("post", &post);
    context.insert("comments", &comments);
    context.insert("can_edit", &can_edit);
    context.insert("can_delete", &can_delete);

    Ok(render(&state, "blog/detail.html", &context, uri.path(), user.as_ref())?.into_response())
}

/// Which variant of `blog/create.html` to show
struct FormMode<'a> {
    mode: &'static str,
    post_id: Option<i64>,
    current_image: Option<&'a str>,
}

impl<'a> FormMode<'a> {
    fn create() -> Self {
        Self {
            mode: "create",
            post_id: None,
            current_image: None,
        }
    }

    fn edit(post_id: i64, current_image: Option<&'a str>) -> Self {
        Self {
            mode: "edit",
            post_id: Some(post_id),
            current_image,
        }
    }
}

/// Render `blog/create.html` in create or edit mode
async fn render_post_form(
    state: &AppState,
    user: &User,
    path: &str,
    mode: &FormMode<'_>,
    form: &PostForm,
    errors: &FieldErrors,
) -> Result<Response, WebError> {
    let categories = state.category_service.list_published().await?;
    let locations = state.location_service.list_published().await?;

    let mut context = TeraContext::new();
    context.insert("mode", mode.mode);
    context.insert("post_id", &mode.post_id);
    context.insert("current_image", &mode.current_image);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("categories", &categories);
    context.insert("locations", &locations);

    Ok(render(state, "blog/create.html", &context, path, Some(user))?.into_response())
}

/// Combine form parse errors with the service's own validation
async fn form_errors(
    state: &AppState,
    form: &PostForm,
    image: &ImageChange,
    mut errors: FieldErrors,
) -> Result<FieldErrors, WebError> {
    let (input, parse_errors) = form.to_input();
    errors.merge(parse_errors);
    match state.post_service.validate(&input, image).await {
        Ok(()) => {}
        Err(PostServiceError::ValidationError(more)) => errors.merge(more),
        Err(other) => return Err(other.into()),
    }
    Ok(errors)
}

/// GET /posts/create/
pub async fn create_post_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
) -> Result<Response, WebError> {
    render_post_form(
        &state,
        &user,
        uri.path(),
        &FormMode::create(),
        &PostForm::blank(),
        &FieldErrors::new(),
    )
    .await
}

/// POST /posts/create/
pub async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let (form, image, errors) = PostForm::from_multipart(multipart, state.config.media.max_file_size).await?;
    let (input, parse_errors) = form.to_input();

    if !errors.is_empty() || !parse_errors.is_empty() {
        let errors = form_errors(&state, &form, &image, errors).await?;
        return render_post_form(&state, &user, uri.path(), &FormMode::create(), &form, &errors).await;
    }

    match state.post_service.create(&user, input, image).await {
        Ok(_) => Ok(found(&profile_url(&user))),
        Err(PostServiceError::ValidationError(errors)) => {
            render_post_form(&state, &user, uri.path(), &FormMode::create(), &form, &errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/edit/
pub async fn edit_post_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    uri: Uri,
) -> Result<Response, WebError> {
    let post = match state.post_service.get_for_edit(post_id, &user).await {
        Ok(post) => post,
        Err(PostServiceError::Forbidden) => return Ok(found(&detail_url(post_id))),
        Err(e) => return Err(e.into()),
    };

    render_post_form(
        &state,
        &user,
        uri.path(),
        &FormMode::edit(post_id, post.image.as_deref()),
        &PostForm::from(&post),
        &FieldErrors::new(),
    )
    .await
}

/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    uri: Uri,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let existing = match state.post_service.get_for_edit(post_id, &user).await {
        Ok(post) => post,
        Err(PostServiceError::Forbidden) => return Ok(found(&detail_url(post_id))),
        Err(e) => return Err(e.into()),
    };

    let (form, image, errors) = PostForm::from_multipart(multipart, state.config.media.max_file_size).await?;
    let (input, parse_errors) = form.to_input();
    let mode = FormMode::edit(post_id, existing.image.as_deref());

    if !errors.is_empty() || !parse_errors.is_empty() {
        let errors = form_errors(&state, &form, &image, errors).await?;
        return render_post_form(&state, &user, uri.path(), &mode, &form, &errors).await;
    }

    match state.post_service.update(post_id, &user, input, image).await {
        Ok(_) => Ok(found(&profile_url(&user))),
        Err(PostServiceError::Forbidden) => Ok(found(&detail_url(post_id))),
        Err(PostServiceError::ValidationError(errors)) => {
            render_post_form(&state, &user, uri.path(), &mode, &form, &errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/delete/ - Confirmation page
pub async fn delete_post_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    uri: Uri,
) -> Result<Response, WebError> {
    let post = match state.post_service.get_for_delete(post_id, &user).await {
        Ok(post) => post,
        Err(PostServiceError::Forbidden) => return Ok(found(&detail_url(post_id))),
        Err(e) => return Err(e.into()),
    };

    let mut context = TeraContext::new();
    context.insert("mode", "delete");
    context.insert("post", &post);
    context.insert("errors", &FieldErrors::new());

    Ok(render(&state, "blog/create.html", &context, uri.path(), Some(&user))?.into_response())
}

/// POST /posts/{post_id}/delete/
pub async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
) -> Result<Response, WebError> {
    match state.post_service.delete(post_id, &user).await {
        Ok(()) => Ok(found("/")),
        Err(PostServiceError::Forbidden) => Ok(found(&detail_url(post_id))),
        Err(e) => Err(e.into()),
    }
}
