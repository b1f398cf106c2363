mod course;
mod ids;
mod outline;

pub use course::{
    ActivityBlock, ActivityReader, ContentError, CourseLesson, CourseReader, CourseUnit, UnitKind,
};
pub use ids::{AssessmentId, BlockId, LessonId, ParseIdError, StudentId, UnitId};
pub use outline::{CourseOutline, OutlineError, OutlineLesson, OutlineUnit};
