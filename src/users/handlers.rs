use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{DeleteUserReport, UpdateUserRequest, UserSummary};
use super::repo::{UserChanges, UserStore};
use crate::auth::dto::PublicUser;
use crate::auth::extractors::AdminUser;
use crate::auth::handlers::is_valid_email;
use crate::auth::password::PasswordStore;
use crate::error::{Error, Result};
use crate::records::repo::RecordStore;
use crate::records::repo_types::Record;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", patch(update_user).delete(delete_user))
        .route("/users/:id/records", get(list_user_records))
}

/// Every account, with its record count.
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<Vec<UserSummary>>> {
    let users = UserStore::new(state.store.as_ref()).list()?;
    let records = RecordStore::new(state.store.as_ref());

    let mut summaries = Vec::with_capacity(users.len());
    for user in users {
        let count = records.count_by_user(&user.id)?;
        summaries.push(UserSummary {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
            records: count,
        });
    }
    Ok(Json(summaries))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>> {
    let users = UserStore::new(state.store.as_ref());

    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_string();
            if !is_valid_email(&email) {
                return Err(Error::Validation("Invalid email".into()));
            }
            if let Some(existing) = users.find_by_email(&email)? {
                if existing.id != id {
                    warn!(email = %email, "email already registered");
                    return Err(Error::Conflict("Email already registered".into()));
                }
            }
            Some(email)
        }
        None => None,
    };

    let updated = users
        .update(
            &id,
            UserChanges {
                email,
                name: payload.name,
                role: payload.role,
            },
        )?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;

    info!(user_id = %updated.id, admin_id = %claims.id, "user updated");
    Ok(Json(updated.into()))
}

/// Deletes the account and explicitly cascades to its password entry and
/// owned records; neither happens on its own.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteUserReport>> {
    let deleted = UserStore::new(state.store.as_ref()).delete(&id)?;
    if !deleted {
        return Err(Error::NotFound("User not found".into()));
    }

    let records_removed = RecordStore::new(state.store.as_ref()).delete_by_user(&id)?;
    let password_removed = PasswordStore::new(state.store.as_ref()).delete(&id)?;

    info!(
        user_id = %id,
        admin_id = %claims.id,
        records_removed,
        "user deleted"
    );
    Ok(Json(DeleteUserReport {
        deleted,
        records_removed,
        password_removed,
    }))
}

#[instrument(skip(state))]
pub async fn list_user_records(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Record>>> {
    UserStore::new(state.store.as_ref())
        .find_by_id(&id)?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
    let records = RecordStore::new(state.store.as_ref()).list_by_user(&id)?;
    Ok(Json(records))
}
