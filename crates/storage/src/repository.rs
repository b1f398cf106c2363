use async_trait::async_trait;
use chrono::{DateTime, Utc};
use progress_core::model::StudentId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One named property of a student, holding an opaque string value.
///
/// The store never interprets `value`; callers own its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentPropertyRecord {
    pub student_id: StudentId,
    pub property_name: String,
    pub value: Option<String>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl StudentPropertyRecord {
    /// A fresh, not yet persisted property without a value.
    #[must_use]
    pub fn new(student_id: StudentId, property_name: impl Into<String>) -> Self {
        Self {
            student_id,
            property_name: property_name.into(),
            value: None,
            updated_on: None,
        }
    }
}

/// Repository contract for student properties.
#[async_trait]
pub trait StudentPropertyRepository: Send + Sync {
    /// Fetch a property by student and name.
    ///
    /// Returns `Ok(None)` when the property was never stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_property(
        &self,
        student_id: StudentId,
        property_name: &str,
    ) -> Result<Option<StudentPropertyRecord>, StorageError>;

    /// Persist a property, replacing any stored value as a whole.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the property cannot be stored.
    async fn put_property(&self, record: &StudentPropertyRecord) -> Result<(), StorageError>;

    /// All stored properties of a student, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_properties(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<StudentPropertyRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    properties: Arc<Mutex<HashMap<(StudentId, String), StudentPropertyRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentPropertyRepository for InMemoryRepository {
    async fn get_property(
        &self,
        student_id: StudentId,
        property_name: &str,
    ) -> Result<Option<StudentPropertyRecord>, StorageError> {
        let guard = self
            .properties
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(student_id, property_name.to_owned())).cloned())
    }

    async fn put_property(&self, record: &StudentPropertyRecord) -> Result<(), StorageError> {
        let mut guard = self
            .properties
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (record.student_id, record.property_name.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn list_properties(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<StudentPropertyRecord>, StorageError> {
        let guard = self
            .properties
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<StudentPropertyRecord> = guard
            .values()
            .filter(|record| record.student_id == student_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.property_name.cmp(&b.property_name));
        Ok(found)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub properties: Arc<dyn StudentPropertyRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let properties: Arc<dyn StudentPropertyRepository> = Arc::new(InMemoryRepository::new());
        Self { properties }
    }
}
