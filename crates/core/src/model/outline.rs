use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::course::{
    ActivityBlock, ActivityReader, ContentError, CourseLesson, CourseReader, CourseUnit,
};
use crate::model::ids::{AssessmentId, LessonId, UnitId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutlineError {
    #[error("invalid course outline: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate unit id {0}")]
    DuplicateUnit(UnitId),

    #[error("duplicate lesson id {lesson} in unit {unit}")]
    DuplicateLesson { unit: UnitId, lesson: LessonId },
}

//
// ─── OUTLINE ──────────────────────────────────────────────────────────────────
//

/// An in-memory course outline: units, their lessons and activity blocks.
///
/// Serves as both `CourseReader` and `ActivityReader`. The JSON shape is:
///
/// ```json
/// { "units": [
///     { "type": "unit", "id": 1, "title": "Basics", "lessons": [
///         { "id": 1, "title": "Intro", "activity": [ { "interactive": true } ] },
///         { "id": 2, "title": "Reading" } ] },
///     { "type": "assessment", "id": "Mid", "title": "Midterm" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    units: Vec<OutlineUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutlineUnit {
    Unit {
        id: UnitId,
        title: String,
        #[serde(default)]
        lessons: Vec<OutlineLesson>,
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

impl OutlineUnit {
    #[must_use]
    pub fn unit(id: UnitId, title: impl Into<String>, lessons: Vec<OutlineLesson>) -> Self {
        Self::Unit {
            id,
            title: title.into(),
            lessons,
        }
    }

    #[must_use]
    pub fn assessment(id: AssessmentId, title: impl Into<String>) -> Self {
        Self::Assessment {
            id,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn link(id: impl Into<String>, title: impl Into<String>, href: Option<String>) -> Self {
        Self::Link {
            id: id.into(),
            title: title.into(),
            href,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineLesson {
    pub id: LessonId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Vec<ActivityBlock>>,
}

impl OutlineLesson {
    /// A lesson without an activity.
    #[must_use]
    pub fn new(id: LessonId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            activity: None,
        }
    }

    #[must_use]
    pub fn with_activity(
        id: LessonId,
        title: impl Into<String>,
        blocks: Vec<ActivityBlock>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            activity: Some(blocks),
        }
    }
}

impl CourseOutline {
    /// Build an outline from units in display order.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError` if a unit id or a lesson id within a unit repeats.
    pub fn new(units: Vec<OutlineUnit>) -> Result<Self, OutlineError> {
        let outline = Self { units };
        outline.check_ids()?;
        Ok(outline)
    }

    /// Parse and validate an outline from JSON.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError::Json` for malformed input, or a duplicate-id error.
    pub fn from_json(raw: &str) -> Result<Self, OutlineError> {
        let outline: Self = serde_json::from_str(raw)?;
        outline.check_ids()?;
        Ok(outline)
    }

    fn check_ids(&self) -> Result<(), OutlineError> {
        let mut units = HashSet::new();
        for unit in &self.units {
            let OutlineUnit::Unit { id, lessons, .. } = unit else {
                continue;
            };
            if !units.insert(*id) {
                return Err(OutlineError::DuplicateUnit(*id));
            }
            let mut seen = HashSet::new();
            for lesson in lessons {
                if !seen.insert(lesson.id) {
                    return Err(OutlineError::DuplicateLesson {
                        unit: *id,
                        lesson: lesson.id,
                    });
                }
            }
        }
        Ok(())
    }

    fn unit_lessons(&self, unit: UnitId) -> &[OutlineLesson] {
        self.units
            .iter()
            .find_map(|entry| match entry {
                OutlineUnit::Unit { id, lessons, .. } if *id == unit => Some(lessons.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

impl CourseReader for CourseOutline {
    fn units(&self) -> Vec<CourseUnit> {
        self.units
            .iter()
            .map(|unit| match unit {
                OutlineUnit::Unit { id, title, .. } => CourseUnit::Unit {
                    id: *id,
                    title: title.clone(),
                },
                OutlineUnit::Assessment { id, title } => CourseUnit::Assessment {
                    id: id.clone(),
                    title: title.clone(),
                },
                OutlineUnit::Link { id, title, href } => CourseUnit::Link {
                    id: id.clone(),
                    title: title.clone(),
                    href: href.clone(),
                },
            })
            .collect()
    }

    fn lessons(&self, unit: UnitId) -> Vec<CourseLesson> {
        self.unit_lessons(unit)
            .iter()
            .map(|lesson| CourseLesson {
                id: lesson.id,
                title: lesson.title.clone(),
                has_activity: lesson.activity.is_some(),
            })
            .collect()
    }
}

impl ActivityReader for CourseOutline {
    fn blocks(&self, unit: UnitId, lesson: LessonId) -> Result<Vec<ActivityBlock>, ContentError> {
        self.unit_lessons(unit)
            .iter()
            .find(|candidate| candidate.id == lesson)
            .and_then(|candidate| candidate.activity.clone())
            .ok_or(ContentError::ActivityNotFound { unit, lesson })
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
