//! Read-only projections of a progress record over the course outline.

use crate::model::{AssessmentId, CourseReader, CourseUnit, LessonId, UnitId};
use crate::progress::{CompletionState, ProgressRecord};

/// Status of one outline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitProgress {
    Unit {
        id: UnitId,
        state: CompletionState,
    },
    Assessment {
        id: AssessmentId,
        completed: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonProgress {
    pub id: LessonId,
    pub state: CompletionState,
}

/// Status of every unit and assessment, in outline order. Links are skipped.
#[must_use]
pub fn unit_progress(course: &dyn CourseReader, progress: &ProgressRecord) -> Vec<UnitProgress> {
    course
        .units()
        .into_iter()
        .filter_map(|unit| match unit {
            CourseUnit::Unit { id, .. } => Some(UnitProgress::Unit {
                id,
                state: progress.unit_state(id),
            }),
            CourseUnit::Assessment { id, .. } => Some(UnitProgress::Assessment {
                completed: progress.is_assessment_completed(&id),
                id,
            }),
            CourseUnit::Link { .. } => None,
        })
        .collect()
}

/// Status of every lesson of `unit`, in outline order.
#[must_use]
pub fn lesson_progress(
    course: &dyn CourseReader,
    progress: &ProgressRecord,
    unit: UnitId,
) -> Vec<LessonProgress> {
    course
        .lessons(unit)
        .into_iter()
        .map(|lesson| LessonProgress {
            id: lesson.id,
            state: progress.lesson_state(unit, lesson.id),
        })
        .collect()
}
