use time::OffsetDateTime;

use super::repo_types::{Role, User};
use crate::error::Result;
use crate::store::{next_id, touch_after, Store, USERS_KEY};

/// Partial update for a user. Absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

/// CRUD over the users collection.
///
/// Every operation reads the whole collection, mutates it in memory and
/// writes it back. Concurrent writers can clobber each other; that matches
/// the storage model and is not guarded here.
pub struct UserStore<'a> {
    store: &'a dyn Store,
}

impl<'a> UserStore<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<User>> {
        match self.store.get(USERS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, users: &[User]) -> Result<()> {
        self.store.set(USERS_KEY, &serde_json::to_string(users)?)
    }

    pub fn list(&self) -> Result<Vec<User>> {
        self.load()
    }

    /// Creates a user. The first account ever added gets the admin role,
    /// every later one the user role.
    pub fn add(&self, email: &str, name: &str) -> Result<User> {
        let mut users = self.load()?;
        let role = if users.is_empty() {
            Role::Admin
        } else {
            Role::User
        };
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: next_id(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        self.save(&users)?;
        Ok(user)
    }

    /// Exact, case-sensitive email lookup.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.load()?.into_iter().find(|u| u.email == email))
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.load()?.into_iter().find(|u| u.id == id))
    }

    /// Partial merge; refreshes `updated_at`. Returns `None` when the id
    /// does not exist.
    pub fn update(&self, id: &str, changes: UserChanges) -> Result<Option<User>> {
        let mut users = self.load()?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = touch_after(user.updated_at);
        let updated = user.clone();
        self.save(&users)?;
        Ok(Some(updated))
    }

    /// Returns `false` when the id does not exist, `true` after removing
    /// exactly one entry. The password entry is not touched; callers that
    /// want a full cascade delete it explicitly.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut users = self.load()?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Ok(false);
        }
        self.save(&users)?;
        Ok(true)
    }
}
