use crate::key::EntityKind;
use crate::model::{AssessmentId, BlockId, LessonId, UnitId};

/// A learner action reported by the course player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    VideoCompleted {
        unit: UnitId,
        lesson: LessonId,
    },
    ActivityCompleted {
        unit: UnitId,
        lesson: LessonId,
    },
    /// The activity page was opened. Completes the activity only when it has
    /// nothing to answer.
    ActivityAccessed {
        unit: UnitId,
        lesson: LessonId,
    },
    BlockCompleted {
        unit: UnitId,
        lesson: LessonId,
        block: BlockId,
    },
    AssessmentCompleted {
        assessment: AssessmentId,
    },
}

impl ProgressEvent {
    /// Entity whose key the event updates directly.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        match self {
            ProgressEvent::VideoCompleted { .. } => EntityKind::Video,
            ProgressEvent::ActivityCompleted { .. } | ProgressEvent::ActivityAccessed { .. } => {
                EntityKind::Activity
            }
            ProgressEvent::BlockCompleted { .. } => EntityKind::Block,
            ProgressEvent::AssessmentCompleted { .. } => EntityKind::Assessment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_and_completion_target_the_activity() {
        let (unit, lesson) = (UnitId::new(1), LessonId::new(2));
        assert_eq!(
            ProgressEvent::ActivityAccessed { unit, lesson }.entity(),
            ProgressEvent::ActivityCompleted { unit, lesson }.entity(),
        );
        let assessment = AssessmentId::new("Final").unwrap();
        assert_eq!(
            ProgressEvent::AssessmentCompleted { assessment }.entity(),
            EntityKind::Assessment
        );
    }
}
