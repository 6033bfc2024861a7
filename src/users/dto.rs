use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Role;

/// Admin view of an account, with its record count.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub records: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

/// Outcome of an admin delete, including the explicit cascade.
#[derive(Debug, Serialize)]
pub struct DeleteUserReport {
    pub deleted: bool,
    pub records_removed: usize,
    pub password_removed: bool,
}
