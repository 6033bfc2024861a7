use crate::error::Result;
use crate::store::{Store, SESSION_KEY};

/// Persisted ambient session: the raw token of the single active user,
/// written by login/signup and cleared by logout.
pub struct SessionStore<'a> {
    store: &'a dyn Store,
}

impl<'a> SessionStore<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        self.store.set(SESSION_KEY, token)
    }

    pub fn load(&self) -> Result<Option<String>> {
        self.store.get(SESSION_KEY)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn save_load_clear() {
        let store = MemoryStore::new();
        let sessions = SessionStore::new(&store);

        assert_eq!(sessions.load().unwrap(), None);
        sessions.save("tok").unwrap();
        assert_eq!(sessions.load().unwrap().as_deref(), Some("tok"));
        sessions.clear().unwrap();
        assert_eq!(sessions.load().unwrap(), None);
    }
}
