//! Course progress tracking: typed keys, the per-student progress record and
//! the engine that cascades completion from blocks up to units.

pub mod event;
pub mod key;
pub mod model;
pub mod progress;
pub mod query;
pub mod time;
pub mod tracker;

pub use event::ProgressEvent;
pub use key::{EntityKind, MalformedKeyError, ProgressKey};
pub use progress::{CompletionState, PROGRESS_PROPERTY, ProgressRecord};
pub use query::{LessonProgress, UnitProgress};
pub use time::Clock;
pub use tracker::CompletionEngine;
