use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
    extractors::AuthUser,
    password::PasswordStore,
    session::SessionStore,
    token::TokenCodec,
};
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::users::repo::UserStore;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_string();
    payload.name = payload.name.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(Error::Validation("Invalid email".into()));
    }
    if payload.name.is_empty() {
        return Err(Error::Validation("Name is required".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(Error::Validation("Password too short".into()));
    }
    if payload.password != payload.confirm_password {
        return Err(Error::Validation("Passwords do not match".into()));
    }

    let users = UserStore::new(state.store.as_ref());

    // The lock keeps two racing signups from both passing the first-user
    // admin check.
    let user = {
        let _guard = state.signup_lock.lock().unwrap_or_else(|e| e.into_inner());
        if users.find_by_email(&payload.email)?.is_some() {
            warn!(email = %payload.email, "email already registered");
            return Err(Error::Conflict("Email already registered".into()));
        }
        users.add(&payload.email, &payload.name)?
    };
    PasswordStore::new(state.store.as_ref()).save_password(&user.id, &payload.password)?;

    let token = TokenCodec::from_config(&state.config).issue(&user)?;
    SessionStore::new(state.store.as_ref()).save(&token)?;

    info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user signed up");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(Error::Validation("Invalid email".into()));
    }

    let users = UserStore::new(state.store.as_ref());
    // Unknown email and wrong password fail the same way.
    let user = match users.find_by_email(&payload.email)? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(Error::Unauthorized("Invalid credentials".into()));
        }
    };

    let ok = PasswordStore::new(state.store.as_ref()).verify(&user.id, &payload.password)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(Error::Unauthorized("Invalid credentials".into()));
    }

    let token = TokenCodec::from_config(&state.config).issue(&user)?;
    SessionStore::new(state.store.as_ref()).save(&token)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    SessionStore::new(state.store.as_ref()).clear()?;
    info!("session cleared");
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Identity of the persisted ambient session, if a valid one exists.
#[instrument(skip(state))]
pub async fn session(State(state): State<AppState>) -> Result<Json<PublicUser>> {
    let token = SessionStore::new(state.store.as_ref())
        .load()?
        .ok_or_else(|| Error::Unauthorized("no session".into()))?;
    let claims = TokenCodec::from_config(&state.config)
        .validate(&token)
        .map_err(|_| Error::Unauthorized("no session".into()))?;
    let user = UserStore::new(state.store.as_ref())
        .find_by_id(&claims.id)?
        .ok_or_else(|| Error::Unauthorized("no session".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>> {
    let user = UserStore::new(state.store.as_ref())
        .find_by_id(&claims.id)?
        .ok_or_else(|| Error::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("first.last@sub.domain.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a @example.com"));
        assert!(!is_valid_email("a@example"));
    }

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: "1700000000000".into(),
            email: "test@example.com".into(),
            name: "Test".into(),
            role: crate::users::repo_types::Role::User,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
