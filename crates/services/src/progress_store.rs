use std::sync::Arc;

use chrono::{DateTime, Utc};
use progress_core::model::StudentId;
use progress_core::{Clock, PROGRESS_PROPERTY, ProgressRecord};
use storage::repository::{StorageError, StudentPropertyRecord, StudentPropertyRepository};
use tracing::{debug, info};

/// A student's progress together with the stored property it came from.
///
/// Changes made through `progress_mut` stay in memory until
/// `ProgressStore::commit`.
#[derive(Debug, Clone)]
pub struct StudentProgress {
    property: StudentPropertyRecord,
    progress: ProgressRecord,
}

impl StudentProgress {
    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.property.student_id
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressRecord {
        &mut self.progress
    }

    /// When the record was last committed; `None` until the first commit.
    #[must_use]
    pub fn updated_on(&self) -> Option<DateTime<Utc>> {
        self.property.updated_on
    }
}

/// Loads and persists progress records through the property repository.
#[derive(Clone)]
pub struct ProgressStore {
    clock: Clock,
    properties: Arc<dyn StudentPropertyRepository>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(clock: Clock, properties: Arc<dyn StudentPropertyRepository>) -> Self {
        Self { clock, properties }
    }

    /// Fetch the student's progress, creating and persisting an empty record
    /// if the student has none yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository cannot be read or written.
    pub async fn load_or_create(&self, student: StudentId) -> Result<StudentProgress, StorageError> {
        if let Some(property) = self
            .properties
            .get_property(student, PROGRESS_PROPERTY)
            .await?
        {
            let progress = ProgressRecord::decode(property.value.as_deref());
            debug!(%student, entries = progress.len(), "loaded progress");
            return Ok(StudentProgress { property, progress });
        }

        let property = StudentPropertyRecord::new(student, PROGRESS_PROPERTY);
        self.properties.put_property(&property).await?;
        info!(%student, "created progress record");
        Ok(StudentProgress {
            property,
            progress: ProgressRecord::new(),
        })
    }

    /// Encode the in-memory progress, stamp `updated_on` and persist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails, or other
    /// storage errors if the write fails.
    pub async fn commit(&self, record: &mut StudentProgress) -> Result<(), StorageError> {
        let payload = record
            .progress
            .encode()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        record.property.value = Some(payload);
        record.property.updated_on = Some(self.clock.now());
        self.properties.put_property(&record.property).await?;
        debug!(student = %record.student_id(), entries = record.progress.len(), "committed progress");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use progress_core::key::ProgressKey;
    use progress_core::model::{LessonId, UnitId};
    use progress_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn load_or_create_persists_empty_record() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::new(fixed_clock(), Arc::new(repo.clone()));

        let record = store.load_or_create(StudentId::new(3)).await.unwrap();
        assert!(record.progress().is_empty());
        assert_eq!(record.updated_on(), None);

        let stored = repo
            .get_property(StudentId::new(3), PROGRESS_PROPERTY)
            .await
            .unwrap()
            .expect("created on first load");
        assert_eq!(stored.value, None);
    }

    #[tokio::test]
    async fn mutations_are_invisible_until_commit() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::new(fixed_clock(), Arc::new(repo.clone()));
        let key = ProgressKey::video(UnitId::new(1), LessonId::new(1));

        let mut record = store.load_or_create(StudentId::new(1)).await.unwrap();
        record.progress_mut().increment(&key, 1);

        let reloaded = store.load_or_create(StudentId::new(1)).await.unwrap();
        assert_eq!(reloaded.progress().value(&key), None);

        store.commit(&mut record).await.unwrap();
        assert_eq!(record.updated_on(), Some(fixed_now()));

        let reloaded = store.load_or_create(StudentId::new(1)).await.unwrap();
        assert_eq!(reloaded.progress().value(&key), Some(1));
        assert_eq!(reloaded.updated_on(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn corrupt_payload_loads_as_empty() {
        let repo = InMemoryRepository::new();
        let mut property = StudentPropertyRecord::new(StudentId::new(1), PROGRESS_PROPERTY);
        property.value = Some("{broken".into());
        repo.put_property(&property).await.unwrap();

        let store = ProgressStore::new(fixed_clock(), Arc::new(repo));
        let record = store.load_or_create(StudentId::new(1)).await.unwrap();
        assert!(record.progress().is_empty());
    }
}
