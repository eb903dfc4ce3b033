use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, GoogleAuthRequest, LoginRequest, MeResponse, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google))
        .route("/auth/me", get(me))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or_default();

    if email.is_empty() || password.is_empty() || name.is_empty() {
        warn!("missing registration fields");
        return Err(ApiError::Validation(
            "Email, password, and name are required".into(),
        ));
    }

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict(
            "User already exists with this email".into(),
        ));
    }

    let hash = hash_password(&password)?;
    let user = User::create(&state.db, &email, &hash, &name).await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        warn!("missing login fields");
        return Err(ApiError::Validation(
            "Email and password are required".into(),
        ));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    // OAuth-only accounts have no password to check against.
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "login attempt on passwordless account");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&password, hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn google(
    State(state): State<AppState>,
    Json(payload): Json<GoogleAuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or_default();
    let google_id = payload.google_id.unwrap_or_default();

    if email.is_empty() || name.is_empty() || google_id.is_empty() {
        warn!("missing google identity fields");
        return Err(ApiError::Validation(
            "Google user information is required".into(),
        ));
    }

    let user = match User::find_by_google_id(&state.db, &google_id).await? {
        Some(user) => user,
        None => match User::find_by_email(&state.db, &email).await? {
            Some(existing) => {
                info!(user_id = %existing.id, "linking google account");
                User::link_google(&state.db, existing.id, &google_id, payload.avatar_url.as_deref())
                    .await?
            }
            None => {
                User::create_google(
                    &state.db,
                    &email,
                    &name,
                    &google_id,
                    payload.avatar_url.as_deref(),
                )
                .await?
            }
        },
    };

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "google sign-in");

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(MeResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("cook@example.com"));
        assert!(is_valid_email("first.last@sub.domain.io"));
    }

    #[test]
    fn rejects_implausible_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }
}
