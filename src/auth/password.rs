use std::collections::HashMap;

use base64ct::{Base64, Encoding};

use crate::error::Result;
use crate::store::{Store, PASSWORDS_KEY};

// Demo-grade placeholder, not a real KDF: the encoding is deterministic
// and reversible, so the stored map must never be treated as protected.
const SALT: &str = "datadesk-salt-v1";

pub fn hash_password(plain: &str) -> String {
    Base64::encode_string(format!("{}{}", plain, SALT).as_bytes())
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    hash_password(plain) == hash
}

/// CRUD over the user-id to password-hash map, stored as its own
/// collection with a lifecycle separate from the users collection.
pub struct PasswordStore<'a> {
    store: &'a dyn Store,
}

impl<'a> PasswordStore<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        match self.store.get(PASSWORDS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    fn save(&self, hashes: &HashMap<String, String>) -> Result<()> {
        self.store
            .set(PASSWORDS_KEY, &serde_json::to_string(hashes)?)
    }

    /// Computes the hash and upserts it for the given user id.
    pub fn save_password(&self, user_id: &str, plain: &str) -> Result<()> {
        let mut hashes = self.load()?;
        hashes.insert(user_id.to_string(), hash_password(plain));
        self.save(&hashes)
    }

    /// Recomputes and compares. Missing entries verify as `false`.
    pub fn verify(&self, user_id: &str, plain: &str) -> Result<bool> {
        Ok(self
            .load()?
            .get(user_id)
            .map(|hash| verify_password(plain, hash))
            .unwrap_or(false))
    }

    pub fn delete(&self, user_id: &str) -> Result<bool> {
        let mut hashes = self.load()?;
        let removed = hashes.remove(user_id).is_some();
        if removed {
            self.save(&hashes)?;
        }
        Ok(removed)
    }
}
