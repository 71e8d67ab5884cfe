//! Persistence boundary.
//!
//! The engine only ever exchanges whole [`GameRecord`]s with storage. Writes
//! are last-writer-wins; nothing here locks.
use std::cell::RefCell;
use std::collections::HashMap;

use crate::record::GameRecord;

/// Trait for abstracting save/load of game records.
/// Platform-specific implementations should provide this.
pub trait GameStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert or replace the record stored under `record.host_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be saved.
    fn save_record(&self, record: &GameRecord) -> Result<(), Self::Error>;

    /// Load the record for `host_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn load_record(&self, host_id: &str) -> Result<Option<GameRecord>, Self::Error>;

    /// Delete the record for `host_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    fn delete_record(&self, host_id: &str) -> Result<(), Self::Error>;
}

/// In-process store that keeps each record as serialized JSON, so every load
/// goes through the same parsing a remote backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Raw JSON stored for `host_id`.
    #[must_use]
    pub fn raw(&self, host_id: &str) -> Option<String> {
        self.records.borrow().get(host_id).cloned()
    }

    /// Overwrite the raw JSON for `host_id`, bypassing serialization.
    pub fn put_raw(&self, host_id: &str, json: impl Into<String>) {
        self.records
            .borrow_mut()
            .insert(host_id.to_string(), json.into());
    }
}

impl GameStore for MemoryStore {
    type Error = serde_json::Error;

    fn save_record(&self, record: &GameRecord) -> Result<(), Self::Error> {
        let json = record.to_json()?;
        self.put_raw(&record.host_id, json);
        Ok(())
    }

    fn load_record(&self, host_id: &str) -> Result<Option<GameRecord>, Self::Error> {
        self.records
            .borrow()
            .get(host_id)
            .map(|json| serde_json::from_str(json))
            .transpose()
    }

    fn delete_record(&self, host_id: &str) -> Result<(), Self::Error> {
        self.records.borrow_mut().remove(host_id);
        Ok(())
    }
}
