use std::sync::{Arc, Mutex};

use crate::config::{AppConfig, SeedConfig};
use crate::store::{FileStore, MemoryStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    /// Serializes signup and seeding so exactly one account can win the
    /// first-user admin check per process.
    pub signup_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(FileStore::open(&config.data_dir)?) as Arc<dyn Store>;
        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            config,
            signup_lock: Arc::new(Mutex::new(())),
        }
    }

    /// In-memory state for tests.
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig {
            data_dir: "unused".into(),
            token_ttl_hours: 24,
            seed: SeedConfig {
                admin_email: "admin@example.com".into(),
                admin_password: "admin123".into(),
                admin_name: "Administrator".into(),
            },
        });
        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}
