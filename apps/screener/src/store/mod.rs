//! Persistence engine abstraction.
//!
//! [`RecordStore`] is an opaque key-value store with secondary indexes. It is
//! implemented by [`MemoryRecordStore`] and [`PgRecordStore`]; domain code
//! goes through the typed [`Repository`] instead of touching JSON values.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::models::candidate::upgrade_legacy_notes;
use crate::models::settings::SETTINGS_KEY;
use crate::models::{AppSettings, Candidate, Search};

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    Searches,
    Candidates,
    Settings,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Searches => "searches",
            RecordType::Candidates => "candidates",
            RecordType::Settings => "settings",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexName {
    BySearch,
    ByStatus,
}

impl IndexName {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::BySearch => "by-search",
            IndexName::ByStatus => "by-status",
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as the engine sees it: a primary key, its index entries and an
/// opaque JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub indexes: Vec<(IndexName, String)>,
    pub data: Value,
}

/// The four operations the core requires of a persistence engine, plus a
/// full scan used to list searches.
///
/// `put` replaces any existing record with the same key, including its index
/// entries. Scan order is unspecified; callers sort explicitly.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StoreError>;

    async fn get(&self, record_type: RecordType, key: &str) -> Result<Option<Value>, StoreError>;

    async fn get_all(&self, record_type: RecordType) -> Result<Vec<Value>, StoreError>;

    async fn get_all_by_index(
        &self,
        record_type: RecordType,
        index: IndexName,
        value: &str,
    ) -> Result<Vec<Value>, StoreError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, record_type: RecordType, key: &str) -> Result<(), StoreError>;
}

/// A domain type that can be persisted in a [`RecordStore`].
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const RECORD_TYPE: RecordType;

    fn key(&self) -> String;

    fn index_entries(&self) -> Vec<(IndexName, String)> {
        Vec::new()
    }

    /// Read-time migration of older stored shapes.
    fn upgrade(_value: &mut Value) {}
}

/// Typed access to a [`RecordStore`].
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn RecordStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn put<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let stored = StoredRecord {
            key: record.key(),
            indexes: record.index_entries(),
            data: serde_json::to_value(record)?,
        };
        self.store.put(R::RECORD_TYPE, stored).await
    }

    pub async fn get<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError> {
        match self.store.get(R::RECORD_TYPE, key).await? {
            Some(value) => Ok(Some(decode::<R>(value)?)),
            None => Ok(None),
        }
    }

    pub async fn all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.store
            .get_all(R::RECORD_TYPE)
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect()
    }

    pub async fn by_index<R: Record>(
        &self,
        index: IndexName,
        value: &str,
    ) -> Result<Vec<R>, StoreError> {
        self.store
            .get_all_by_index(R::RECORD_TYPE, index, value)
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect()
    }

    pub async fn delete<R: Record>(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(R::RECORD_TYPE, key).await
    }
}

fn decode<R: Record>(mut value: Value) -> Result<R, StoreError> {
    R::upgrade(&mut value);
    Ok(serde_json::from_value(value)?)
}

// ─── Domain record bindings ──────────────────────────────────────────────────

impl Record for Search {
    const RECORD_TYPE: RecordType = RecordType::Searches;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn index_entries(&self) -> Vec<(IndexName, String)> {
        vec![(IndexName::ByStatus, self.status.as_str().to_string())]
    }
}

impl Record for Candidate {
    const RECORD_TYPE: RecordType = RecordType::Candidates;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn index_entries(&self) -> Vec<(IndexName, String)> {
        vec![
            (IndexName::BySearch, self.search_id.to_string()),
            (IndexName::ByStatus, self.status.as_str().to_string()),
        ]
    }

    fn upgrade(value: &mut Value) {
        upgrade_legacy_notes(value);
    }
}

impl Record for AppSettings {
    const RECORD_TYPE: RecordType = RecordType::Settings;

    fn key(&self) -> String {
        SETTINGS_KEY.to_string()
    }
}
