use time::OffsetDateTime;

use super::repo_types::{Record, RecordStatus};
use crate::error::Result;
use crate::store::{next_id, touch_after, Store, RECORDS_KEY};

/// Fields for a new record; id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub title: String,
    pub description: String,
    pub category: String,
    pub value: f64,
    pub status: RecordStatus,
}

/// Partial update for a record. Absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct RecordChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub value: Option<f64>,
    pub status: Option<RecordStatus>,
}

/// CRUD over the data-records collection, scoped by owning user id.
pub struct RecordStore<'a> {
    store: &'a dyn Store,
}

impl<'a> RecordStore<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<Record>> {
        match self.store.get(RECORDS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[Record]) -> Result<()> {
        self.store.set(RECORDS_KEY, &serde_json::to_string(records)?)
    }

    pub fn add(&self, user_id: &str, new: NewRecord) -> Result<Record> {
        let mut records = self.load()?;
        let now = OffsetDateTime::now_utc();
        let record = Record {
            id: next_id(),
            user_id: user_id.to_string(),
            title: new.title,
            description: new.description,
            category: new.category,
            value: new.value,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        self.save(&records)?;
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    pub fn list(&self) -> Result<Vec<Record>> {
        self.load()
    }

    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Record>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect())
    }

    pub fn count_by_user(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .load()?
            .iter()
            .filter(|r| r.user_id == user_id)
            .count())
    }

    /// Partial merge; refreshes `updated_at`. Returns `None` when the id
    /// does not exist.
    pub fn update(&self, id: &str, changes: RecordChanges) -> Result<Option<Record>> {
        let mut records = self.load()?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        if let Some(category) = changes.category {
            record.category = category;
        }
        if let Some(value) = changes.value {
            record.value = value;
        }
        if let Some(status) = changes.status {
            record.status = status;
        }
        record.updated_at = touch_after(record.updated_at);
        let updated = record.clone();
        self.save(&records)?;
        Ok(Some(updated))
    }

    /// Returns `false` when the id does not exist, `true` after removing
    /// exactly one entry.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }

    /// Removes every record owned by `user_id`; used by the admin cascade.
    pub fn delete_by_user(&self, user_id: &str) -> Result<usize> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.user_id != user_id);
        let removed = before - records.len();
        if removed > 0 {
            self.save(&records)?;
        }
        Ok(removed)
    }
}
