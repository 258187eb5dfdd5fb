//! Login, logout and registration pages

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Uri},
    response::{IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::services::{FieldErrors, LoginInput, RegisterInput, UserServiceError};
use crate::web::common::{render, safe_next};
use crate::web::forms::{LoginForm, NextQuery, RegistrationForm};
use crate::web::middleware::{
    clear_session_cookie, extract_session_token, found, session_cookie, AppState, MaybeUser, WebError,
};

fn render_login(
    state: &AppState,
    path: &str,
    form: &LoginForm,
    error: Option<&str>,
) -> Result<Response, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("next", form.next.as_deref().unwrap_or(""));
    context.insert("login_error", &error);
    Ok(render(state, "registration/login.html", &context, path, None)?.into_response())
}

/// GET /auth/login/
pub async fn login_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
    uri: Uri,
) -> Result<Response, WebError> {
    if let Some(user) = user {
        let target = safe_next(query.next.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("/profile/{}/", urlencoding::encode(&user.username)));
        return Ok(found(&target));
    }

    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    render_login(&state, uri.path(), &form, None)
}

/// POST /auth/login/
pub async fn login(
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let input = LoginInput::new(form.username.clone(), form.password.clone());

    let (user, session) = match state.user_service.login(input).await {
        Ok(result) => result,
        Err(UserServiceError::AuthenticationError(message)) => {
            return render_login(&state, uri.path(), &form, Some(&message));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    let target = safe_next(form.next.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("/profile/{}/", urlencoding::encode(&user.username)));

    let cookie = session_cookie(&session.id, state.user_service.session_lifetime().num_seconds());
    let mut response = found(&target);
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| WebError::Internal(anyhow::anyhow!("Invalid session cookie: {}", e)))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// GET or POST /auth/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, WebError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let mut response = found("/");
    let value = HeaderValue::from_str(&clear_session_cookie())
        .map_err(|e| WebError::Internal(anyhow::anyhow!("Invalid session cookie: {}", e)))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// GET /auth/registration/
pub async fn registration_form(State(state): State<AppState>, uri: Uri) -> Result<Response, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", &RegistrationForm::default());
    context.insert("errors", &FieldErrors::new());
    Ok(render(&state, "registration/registration_form.html", &context, uri.path(), None)?.into_response())
}

/// POST /auth/registration/
pub async fn registration(
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, WebError> {
    let input = RegisterInput {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password1.clone(),
        password_confirm: form.password2.clone(),
    };

    match state.user_service.register(input).await {
        Ok(_) => Ok(found("/auth/login/")),
        Err(UserServiceError::ValidationError(errors)) => {
            let mut context = TeraContext::new();
            context.insert("form", &form);
            context.insert("errors", &errors);
            Ok(render(
                &state,
                "registration/registration_form.html",
                &context,
                uri.path(),
                None,
            )?
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
