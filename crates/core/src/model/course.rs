use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AssessmentId, LessonId, UnitId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while reading course content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("no activity for unit {unit}, lesson {lesson}")]
    ActivityNotFound { unit: UnitId, lesson: LessonId },
}

//
// ─── COURSE STRUCTURE ─────────────────────────────────────────────────────────
//

/// Discriminates the entries of a course outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// A section containing lessons.
    Unit,
    /// A standalone graded entry.
    Assessment,
    /// An external link; never tracked.
    Link,
}

/// A top-level entry of the course, in outline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CourseUnit {
    Unit {
        id: UnitId,
        title: String,
    },
    Assessment {
        id: AssessmentId,
        title: String,
    },
    Link {
        id: String,
        title: String,
        #[serde(default)]
        href: Option<String>,
    },
}

impl CourseUnit {
    #[must_use]
    pub fn kind(&self) -> UnitKind {
        match self {
            CourseUnit::Unit { .. } => UnitKind::Unit,
            CourseUnit::Assessment { .. } => UnitKind::Assessment,
            CourseUnit::Link { .. } => UnitKind::Link,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            CourseUnit::Unit { title, .. }
            | CourseUnit::Assessment { title, .. }
            | CourseUnit::Link { title, .. } => title,
        }
    }
}

/// A lesson as seen by progress tracking: its id and whether it carries an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLesson {
    pub id: LessonId,
    pub title: String,
    pub has_activity: bool,
}

/// One content block of an activity.
///
/// Only interactive blocks (questions) count towards completing the activity;
/// static blocks (prose, media) are shown but never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBlock {
    interactive: bool,
}

impl ActivityBlock {
    #[must_use]
    pub fn interactive() -> Self {
        Self { interactive: true }
    }

    #[must_use]
    pub fn static_content() -> Self {
        Self { interactive: false }
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

//
// ─── READERS ──────────────────────────────────────────────────────────────────
//

/// Read access to the course outline.
pub trait CourseReader: Send + Sync {
    /// All top-level entries in outline order.
    fn units(&self) -> Vec<CourseUnit>;

    /// Lessons of a unit in outline order. Unknown units have no lessons.
    fn lessons(&self, unit: UnitId) -> Vec<CourseLesson>;
}

/// Read access to activity content.
pub trait ActivityReader: Send + Sync {
    /// Ordered blocks of the activity attached to `(unit, lesson)`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::ActivityNotFound` if the lesson has no activity.
    fn blocks(&self, unit: UnitId, lesson: LessonId) -> Result<Vec<ActivityBlock>, ContentError>;
}
