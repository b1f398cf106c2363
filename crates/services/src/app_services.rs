use std::sync::Arc;

use progress_core::model::{ActivityReader, CourseOutline, CourseReader};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;

/// Assembles app-facing services for one course outline.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        outline: Arc<CourseOutline>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(storage, clock, outline))
    }

    /// Build services over an existing storage backend.
    #[must_use]
    pub fn with_storage(storage: Storage, clock: Clock, outline: Arc<CourseOutline>) -> Self {
        let course: Arc<dyn CourseReader> = outline.clone();
        let activities: Arc<dyn ActivityReader> = outline;
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.properties),
            course,
            activities,
        ));
        Self { storage, progress }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
