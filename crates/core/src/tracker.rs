//! Upward propagation of completion events.
//!
//! A leaf event bumps its counter (or, for a directly completed activity,
//! forces the activity to `Completed`), then every ancestor along the
//! `block → activity → lesson → unit` chain is re-derived from its children.
//! All changes land in one in-memory `ProgressRecord`; the caller persists it
//! once after `record` returns.

use tracing::debug;

use crate::event::ProgressEvent;
use crate::key::ProgressKey;
use crate::model::{ActivityReader, BlockId, ContentError, CourseReader, LessonId, UnitId};
use crate::progress::{CompletionState, ProgressRecord};

#[derive(Clone, Copy)]
pub struct CompletionEngine<'a> {
    course: &'a dyn CourseReader,
    activities: &'a dyn ActivityReader,
}

impl<'a> CompletionEngine<'a> {
    #[must_use]
    pub fn new(course: &'a dyn CourseReader, activities: &'a dyn ActivityReader) -> Self {
        Self { course, activities }
    }

    /// Map an event to the key it updates directly.
    ///
    /// Returns `Ok(None)` for an access to an activity that still has
    /// interactive blocks: such an access records nothing.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the accessed activity cannot be read.
    pub fn resolve(&self, event: &ProgressEvent) -> Result<Option<ProgressKey>, ContentError> {
        let key = match event {
            ProgressEvent::VideoCompleted { unit, lesson } => ProgressKey::video(*unit, *lesson),
            ProgressEvent::ActivityCompleted { unit, lesson } => {
                ProgressKey::activity(*unit, *lesson)
            }
            ProgressEvent::ActivityAccessed { unit, lesson } => {
                let blocks = self.activities.blocks(*unit, *lesson)?;
                if blocks.iter().any(|block| block.is_interactive()) {
                    return Ok(None);
                }
                ProgressKey::activity(*unit, *lesson)
            }
            ProgressEvent::BlockCompleted {
                unit,
                lesson,
                block,
            } => ProgressKey::block(*unit, *lesson, *block),
            ProgressEvent::AssessmentCompleted { assessment } => {
                ProgressKey::assessment(assessment.clone())
            }
        };
        debug_assert_eq!(key.kind(), event.entity());
        Ok(Some(key))
    }

    /// Apply a direct update to `key` and re-derive all of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if an ancestor activity's blocks cannot be read.
    /// The record may then hold a partial cascade and must not be persisted.
    pub fn record(&self, progress: &mut ProgressRecord, key: &ProgressKey) -> Result<(), ContentError> {
        if key.kind().is_composite() {
            progress.set_state(key, CompletionState::Completed);
        } else {
            progress.increment(key, 1);
        }
        debug!(%key, value = ?progress.value(key), "direct update");

        let mut next = key.derived_parent();
        while let Some(ancestor) = next {
            self.derive(progress, &ancestor)?;
            debug!(key = %ancestor, state = ?progress.state(&ancestor), "derived update");
            next = ancestor.derived_parent();
        }
        Ok(())
    }

    fn derive(&self, progress: &mut ProgressRecord, key: &ProgressKey) -> Result<(), ContentError> {
        match *key {
            ProgressKey::Unit { unit } => {
                self.derive_unit(progress, unit);
                Ok(())
            }
            ProgressKey::Lesson { unit, lesson } => {
                self.derive_lesson(progress, unit, lesson);
                Ok(())
            }
            ProgressKey::Activity { unit, lesson } => self.derive_activity(progress, unit, lesson),
            ProgressKey::Video { .. } | ProgressKey::Block { .. } | ProgressKey::Assessment { .. } => {
                progress.increment(key, 1);
                Ok(())
            }
        }
    }

    /// Completed once every interactive block has been answered.
    fn derive_activity(
        &self,
        progress: &mut ProgressRecord,
        unit: UnitId,
        lesson: LessonId,
    ) -> Result<(), ContentError> {
        let key = ProgressKey::activity(unit, lesson);
        if progress.state(&key).is_completed() {
            return Ok(());
        }
        progress.set_state(&key, CompletionState::InProgress);

        let blocks = self.activities.blocks(unit, lesson)?;
        let pending = blocks.iter().enumerate().any(|(index, block)| {
            block.is_interactive() && !progress.is_block_completed(unit, lesson, BlockId::new(index))
        });
        if !pending {
            progress.set_state(&key, CompletionState::Completed);
        }
        Ok(())
    }

    /// Completed once the lesson's activity is completed.
    ///
    /// The lesson is looked up by id in its unit's outline; a lesson that is
    /// not found, or has no activity, puts up no requirement.
    fn derive_lesson(&self, progress: &mut ProgressRecord, unit: UnitId, lesson: LessonId) {
        let key = ProgressKey::lesson(unit, lesson);
        if progress.state(&key).is_completed() {
            return;
        }
        progress.set_state(&key, CompletionState::InProgress);

        let blocked = self.course.lessons(unit).iter().any(|candidate| {
            candidate.id == lesson
                && candidate.has_activity
                && !progress.activity_state(unit, lesson).is_completed()
        });
        if !blocked {
            progress.set_state(&key, CompletionState::Completed);
        }
    }

    /// Completed once every lesson that has an activity is completed.
    fn derive_unit(&self, progress: &mut ProgressRecord, unit: UnitId) {
        let key = ProgressKey::unit(unit);
        if progress.state(&key).is_completed() {
            return;
        }
        progress.set_state(&key, CompletionState::InProgress);

        let blocked = self
            .course
            .lessons(unit)
            .iter()
            .filter(|candidate| candidate.has_activity)
            .any(|candidate| !progress.lesson_state(unit, candidate.id).is_completed());
        if !blocked {
            progress.set_state(&key, CompletionState::Completed);
        }
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
