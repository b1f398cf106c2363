use std::collections::BTreeMap;

use tracing::warn;

use crate::key::{EntityKind, ProgressKey};
use crate::model::{AssessmentId, BlockId, LessonId, UnitId};

/// Property name under which a student's course progress is stored.
pub const PROGRESS_PROPERTY: &str = "linear-course-progress";

//
// ─── COMPLETION STATE ─────────────────────────────────────────────────────────
//

/// Tri-state stored for composite entities (unit, lesson, activity).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompletionState {
    /// None of the children have been completed.
    #[default]
    NotStarted,
    /// Some, but not all, children have been completed.
    InProgress,
    /// Every counted child has been completed.
    Completed,
}

impl CompletionState {
    /// Stored integer: 0, 1 or 2.
    #[must_use]
    pub fn value(self) -> i64 {
        match self {
            CompletionState::NotStarted => 0,
            CompletionState::InProgress => 1,
            CompletionState::Completed => 2,
        }
    }

    #[must_use]
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::NotStarted),
            1 => Some(Self::InProgress),
            2 => Some(Self::Completed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

//
// ─── PROGRESS RECORD ──────────────────────────────────────────────────────────
//

/// A student's progress: stored key → integer.
///
/// Composite keys hold a `CompletionState` value, leaf keys hold how many
/// times the event fired. A missing key reads as zero / not started.
///
/// Mutations only touch this in-memory mapping; persisting it is the
/// caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    values: BTreeMap<String, i64>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored payload.
    ///
    /// A missing or unreadable payload yields an empty record.
    #[must_use]
    pub fn decode(payload: Option<&str>) -> Self {
        let Some(raw) = payload.filter(|raw| !raw.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<BTreeMap<String, i64>>(raw) {
            Ok(values) => Self { values },
            Err(err) => {
                warn!(error = %err, "unreadable progress payload, starting from empty");
                Self::default()
            }
        }
    }

    /// Encode as the JSON object stored in the property value.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.values)
    }

    #[must_use]
    pub fn value(&self, key: &ProgressKey) -> Option<i64> {
        self.values.get(&key.to_string()).copied()
    }

    pub fn set_value(&mut self, key: &ProgressKey, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    /// Add `delta` to a counter, starting from zero when absent.
    pub fn increment(&mut self, key: &ProgressKey, delta: u32) {
        let slot = self.values.entry(key.to_string()).or_insert(0);
        *slot = slot.saturating_add(i64::from(delta));
    }

    /// Trigger count of a leaf key, zero when absent.
    #[must_use]
    pub fn count(&self, key: &ProgressKey) -> i64 {
        self.value(key).unwrap_or(0)
    }

    /// State of a composite key. Absent or unrecognised values read as not started.
    #[must_use]
    pub fn state(&self, key: &ProgressKey) -> CompletionState {
        self.value(key)
            .and_then(CompletionState::from_value)
            .unwrap_or_default()
    }

    pub fn set_state(&mut self, key: &ProgressKey, state: CompletionState) {
        debug_assert!(key.kind().is_composite(), "{key} is not a composite key");
        self.set_value(key, state.value());
    }

    #[must_use]
    pub fn unit_state(&self, unit: UnitId) -> CompletionState {
        self.state(&ProgressKey::unit(unit))
    }

    #[must_use]
    pub fn lesson_state(&self, unit: UnitId, lesson: LessonId) -> CompletionState {
        self.state(&ProgressKey::lesson(unit, lesson))
    }

    #[must_use]
    pub fn activity_state(&self, unit: UnitId, lesson: LessonId) -> CompletionState {
        self.state(&ProgressKey::activity(unit, lesson))
    }

    #[must_use]
    pub fn is_video_completed(&self, unit: UnitId, lesson: LessonId) -> bool {
        self.count(&ProgressKey::video(unit, lesson)) > 0
    }

    #[must_use]
    pub fn is_block_completed(&self, unit: UnitId, lesson: LessonId, block: BlockId) -> bool {
        self.count(&ProgressKey::block(unit, lesson, block)) > 0
    }

    #[must_use]
    pub fn is_assessment_completed(&self, assessment: &AssessmentId) -> bool {
        self.count(&ProgressKey::assessment(assessment.clone())) > 0
    }

    /// Typed view of every stored entry, in key order.
    ///
    /// Keys this engine could not have written are skipped.
    #[must_use]
    pub fn entries(&self) -> Vec<(ProgressKey, i64)> {
        self.values
            .iter()
            .filter_map(|(raw, value)| match raw.parse::<ProgressKey>() {
                Ok(key) => Some((key, *value)),
                Err(err) => {
                    warn!(key = %raw, error = %err, "skipping unparseable progress key");
                    None
                }
            })
            .collect()
    }

    /// Number of entries of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entries()
            .iter()
            .filter(|(key, _)| key.kind() == kind)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
