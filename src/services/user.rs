//! User service
//!
//! Registration, login/logout, session validation and profile editing.
//! Sessions are opaque UUID tokens stored in the database; an expired session
//! is deleted the first time it is presented.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, UpdateProfileInput, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

/// Letters, digits and `@.+-_`
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is a valid regex"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Wrong username or password
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Invalid form input
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Session lifetime, used for the cookie `Max-Age`
    pub fn session_lifetime(&self) -> Duration {
        Duration::days(self.session_expiration_days)
    }

    /// Register a new user.
    ///
    /// Every problem with the input is reported at once as `ValidationError`,
    /// including an already taken username.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let mut errors = FieldErrors::new();
        validate_username(&mut errors, &input.username);
        validate_email(&mut errors, &input.email);

        if input.password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN_LEN
                ),
            );
        } else if input.password.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }
        if input.password != input.password_confirm {
            errors.add("password2", "The two password fields didn't match.");
        }

        if !errors.has("username") && self.username_taken(&input.username, None).await? {
            errors.add("username", "A user with that username already exists.");
        }

        errors
            .into_result()
            .map_err(UserServiceError::ValidationError)?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(
            input.username.trim().to_string(),
            input.email.trim().to_string(),
            password_hash,
        );

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let invalid = || {
            UserServiceError::AuthenticationError(
                "Please enter a correct username and password. Note that both fields may be case-sensitive.".to_string(),
            )
        };

        let user = self
            .user_repo
            .get_by_username(input.username.trim())
            .await
            .context("Failed to get user by username")?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::debug!(username = %user.username, "Rejected login with wrong password");
            return Err(invalid());
        }

        let session = Session::new(user.id, self.session_lifetime());
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok((user, session))
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Unknown and expired tokens give `None`; expired sessions are removed.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;
        Ok(user)
    }

    /// Change the caller's own name, username and email
    pub async fn update_profile(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let mut errors = FieldErrors::new();
        validate_username(&mut errors, &input.username);
        validate_email(&mut errors, &input.email);
        if input.first_name.chars().count() > 150 {
            errors.add("first_name", "Ensure this value has at most 150 characters.");
        }
        if input.last_name.chars().count() > 150 {
            errors.add("last_name", "Ensure this value has at most 150 characters.");
        }
        if !errors.has("username") && self.username_taken(&input.username, Some(user.id)).await? {
            errors.add("username", "A user with that username already exists.");
        }
        errors
            .into_result()
            .map_err(UserServiceError::ValidationError)?;

        let updated = User {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            ..user.clone()
        };

        let updated = self
            .user_repo
            .update(&updated)
            .await
            .context("Failed to update user")?;
        Ok(updated)
    }

    /// Grant staff rights to a user
    pub async fn promote_to_staff(&self, user: &User) -> Result<User, UserServiceError> {
        let promoted = User {
            is_staff: true,
            ..user.clone()
        };
        let promoted = self
            .user_repo
            .update(&promoted)
            .await
            .context("Failed to promote user")?;
        Ok(promoted)
    }

    /// Delete expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    async fn username_taken(
        &self,
        username: &str,
        except_id: Option<i64>,
    ) -> Result<bool, UserServiceError> {
        let existing = self
            .user_repo
            .get_by_username(username.trim())
            .await
            .context("Failed to check username")?;
        Ok(matches!(existing, Some(u) if Some(u.id) != except_id))
    }
}

fn validate_username(errors: &mut FieldErrors, username: &str) {
    let username = username.trim();
    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add(
            "username",
            format!("Ensure this value has at most {} characters.", USERNAME_MAX_LEN),
        );
    } else if !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

/// Email is optional, but when given it must look like one
fn validate_email(errors: &mut FieldErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        errors.add("email", "Enter a valid email address.");
    }
}

/// Input for user registration
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterInput {
    /// Registration where both password fields match
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            password_confirm: password.clone(),
            password,
        }
    }
}

/// Input for login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}
