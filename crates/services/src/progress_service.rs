use std::sync::Arc;

use progress_core::model::{
    ActivityReader, AssessmentId, BlockId, CourseReader, LessonId, StudentId, UnitId,
};
use progress_core::query::{self, LessonProgress, UnitProgress};
use progress_core::{Clock, CompletionEngine, EntityKind, ProgressEvent, ProgressKey};
use storage::repository::StudentPropertyRepository;
use tracing::{debug, info};

use crate::error::ProgressServiceError;
use crate::progress_store::{ProgressStore, StudentProgress};

/// Records learner events and answers progress queries for one course.
///
/// Every recorded event costs one load and one commit of the student's
/// progress record; the whole cascade runs in memory in between.
#[derive(Clone)]
pub struct ProgressService {
    store: ProgressStore,
    course: Arc<dyn CourseReader>,
    activities: Arc<dyn ActivityReader>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        properties: Arc<dyn StudentPropertyRepository>,
        course: Arc<dyn CourseReader>,
        activities: Arc<dyn ActivityReader>,
    ) -> Self {
        Self {
            store: ProgressStore::new(clock, properties),
            course,
            activities,
        }
    }

    fn engine(&self) -> CompletionEngine<'_> {
        CompletionEngine::new(self.course.as_ref(), self.activities.as_ref())
    }

    /// Record an event and cascade it to the affected units, lessons and activities.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Content` if activity content needed by
    /// the cascade is missing; nothing is persisted in that case.
    /// Returns `ProgressServiceError::Storage` if loading or committing fails.
    pub async fn record(
        &self,
        student: StudentId,
        event: ProgressEvent,
    ) -> Result<(), ProgressServiceError> {
        let Some(key) = self.engine().resolve(&event)? else {
            debug!(%student, ?event, "activity has interactive blocks, access not recorded");
            return Ok(());
        };
        self.record_key(student, &key).await
    }

    /// Record an event given by entity name and stored key, e.g.
    /// `("block", "u.1.l.2.a.0.b.3")`.
    ///
    /// Unknown entity names are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::MalformedKey` if `key` is not a key of
    /// the named entity, plus the errors of `record`.
    pub async fn record_named(
        &self,
        student: StudentId,
        entity: &str,
        key: &str,
    ) -> Result<(), ProgressServiceError> {
        let Some(kind) = EntityKind::from_name(entity) else {
            debug!(%student, entity, "ignoring unknown event entity");
            return Ok(());
        };
        let key = ProgressKey::parse_as(key, kind)?;
        self.record_key(student, &key).await
    }

    async fn record_key(
        &self,
        student: StudentId,
        key: &ProgressKey,
    ) -> Result<(), ProgressServiceError> {
        let mut record = self.store.load_or_create(student).await?;
        self.engine().record(record.progress_mut(), key)?;
        self.store.commit(&mut record).await?;
        info!(%student, %key, "recorded progress event");
        Ok(())
    }

    /// # Errors
    ///
    /// See `record`.
    pub async fn record_video_completed(
        &self,
        student: StudentId,
        unit: UnitId,
        lesson: LessonId,
    ) -> Result<(), ProgressServiceError> {
        self.record(student, ProgressEvent::VideoCompleted { unit, lesson })
            .await
    }

    /// # Errors
    ///
    /// See `record`.
    pub async fn record_activity_completed(
        &self,
        student: StudentId,
        unit: UnitId,
        lesson: LessonId,
    ) -> Result<(), ProgressServiceError> {
        self.record(student, ProgressEvent::ActivityCompleted { unit, lesson })
            .await
    }

    /// # Errors
    ///
    /// See `record`.
    pub async fn record_block_completed(
        &self,
        student: StudentId,
        unit: UnitId,
        lesson: LessonId,
        block: BlockId,
    ) -> Result<(), ProgressServiceError> {
        self.record(
            student,
            ProgressEvent::BlockCompleted {
                unit,
                lesson,
                block,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See `record`.
    pub async fn record_assessment_completed(
        &self,
        student: StudentId,
        assessment: AssessmentId,
    ) -> Result<(), ProgressServiceError> {
        self.record(student, ProgressEvent::AssessmentCompleted { assessment })
            .await
    }

    /// Completes the activity if it has no interactive blocks; otherwise a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Content` if the activity does not exist,
    /// plus the errors of `record`.
    pub async fn record_activity_accessed(
        &self,
        student: StudentId,
        unit: UnitId,
        lesson: LessonId,
    ) -> Result<(), ProgressServiceError> {
        self.record(student, ProgressEvent::ActivityAccessed { unit, lesson })
            .await
    }

    /// The student's progress record, created if missing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the repository fails.
    pub async fn progress(&self, student: StudentId) -> Result<StudentProgress, ProgressServiceError> {
        Ok(self.store.load_or_create(student).await?)
    }

    /// Status of every unit and assessment, in outline order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the repository fails.
    pub async fn unit_progress(
        &self,
        student: StudentId,
    ) -> Result<Vec<UnitProgress>, ProgressServiceError> {
        let record = self.progress(student).await?;
        Ok(query::unit_progress(self.course.as_ref(), record.progress()))
    }

    /// Status of every lesson in `unit`, in outline order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the repository fails.
    pub async fn lesson_progress(
        &self,
        student: StudentId,
        unit: UnitId,
    ) -> Result<Vec<LessonProgress>, ProgressServiceError> {
        let record = self.progress(student).await?;
        Ok(query::lesson_progress(
            self.course.as_ref(),
            record.progress(),
            unit,
        ))
    }
}
