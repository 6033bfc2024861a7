use tracing::{info, instrument};

use crate::auth::password::PasswordStore;
use crate::error::Result;
use crate::state::AppState;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

/// App initialization: when the user collection is empty, synthesize the
/// default admin account so a fresh deployment is immediately usable.
/// Returns the created user, or `None` when accounts already exist.
#[instrument(skip(state))]
pub fn initialize(state: &AppState) -> Result<Option<User>> {
    let users = UserStore::new(state.store.as_ref());

    let _guard = state.signup_lock.lock().unwrap_or_else(|e| e.into_inner());
    if !users.list()?.is_empty() {
        return Ok(None);
    }

    let seed = &state.config.seed;
    let admin = users.add(&seed.admin_email, &seed.admin_name)?;
    PasswordStore::new(state.store.as_ref()).save_password(&admin.id, &seed.admin_password)?;

    info!(user_id = %admin.id, email = %admin.email, "seeded default admin account");
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    #[test]
    fn seeds_exactly_once() {
        let state = AppState::in_memory();

        let admin = initialize(&state).unwrap().expect("seeded");
        assert_eq!(admin.email, "admin@example.com");
        assert_eq!(admin.role, Role::Admin);

        // second call is a no-op
        assert!(initialize(&state).unwrap().is_none());
        assert_eq!(
            UserStore::new(state.store.as_ref()).list().unwrap().len(),
            1
        );
    }

    #[test]
    fn seeded_credentials_verify() {
        let state = AppState::in_memory();
        let admin = initialize(&state).unwrap().expect("seeded");

        let passwords = PasswordStore::new(state.store.as_ref());
        assert!(passwords.verify(&admin.id, "admin123").unwrap());
        assert!(!passwords.verify(&admin.id, "wrong").unwrap());
    }
}
