//! Compact dotted keys identifying nodes of the progress tree.
//!
//! A key is a path of `(code, id)` pairs from the root to the node, joined by
//! dots: unit 1, lesson 1, its activity, block 4 is `u.1.l.1.a.0.b.4`.
//! Videos and activities occupy a fixed slot `0` because a lesson has at most
//! one of each. Assessments are flat: `s.Mid`.
//!
//! Keys are typed (`ProgressKey`) everywhere inside the engine and only turned
//! into strings at the storage boundary.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{AssessmentId, BlockId, LessonId, UnitId};

const SEPARATOR: char = '.';
const FIXED_SLOT: &str = "0";

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// A key string that the engine could not have produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedKeyError {
    #[error("key `{key}` has {found} segments, expected {expected} for {kind}")]
    SegmentCount {
        key: String,
        kind: EntityKind,
        expected: usize,
        found: usize,
    },

    #[error("key `{key}` uses unknown entity code `{code}`")]
    UnknownCode { key: String, code: String },

    #[error("key `{key}` does not follow the {kind} layout")]
    Layout { key: String, kind: EntityKind },

    #[error("key `{key}` has invalid id `{id}`")]
    InvalidId { key: String, id: String },
}

//
// ─── ENTITY KIND ──────────────────────────────────────────────────────────────
//

/// The closed set of tracked entities.
///
/// Composite kinds (unit, lesson, activity) store a `CompletionState`; leaf
/// kinds (video, block, assessment) store a trigger count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Unit,
    Lesson,
    Activity,
    Video,
    Block,
    Assessment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Unit,
        EntityKind::Lesson,
        EntityKind::Activity,
        EntityKind::Video,
        EntityKind::Block,
        EntityKind::Assessment,
    ];

    /// Single-letter code used in keys.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            EntityKind::Unit => "u",
            EntityKind::Lesson => "l",
            EntityKind::Activity => "a",
            EntityKind::Video => "v",
            EntityKind::Block => "b",
            EntityKind::Assessment => "s",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// External event-entity name (`unit`, `lesson`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Unit => "unit",
            EntityKind::Lesson => "lesson",
            EntityKind::Activity => "activity",
            EntityKind::Video => "video",
            EntityKind::Block => "block",
            EntityKind::Assessment => "assessment",
        }
    }

    /// Resolve an external event-entity name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            EntityKind::Unit | EntityKind::Lesson | EntityKind::Activity
        )
    }

    /// Number of `(code, id)` pairs in a key of this kind.
    #[must_use]
    pub fn depth(self) -> usize {
        match self {
            EntityKind::Unit | EntityKind::Assessment => 1,
            EntityKind::Lesson => 2,
            EntityKind::Activity | EntityKind::Video => 3,
            EntityKind::Block => 4,
        }
    }

    /// The ancestor kind that is re-derived after this kind changes.
    #[must_use]
    pub fn derived_parent(self) -> Option<Self> {
        match self {
            EntityKind::Block => Some(EntityKind::Activity),
            EntityKind::Activity => Some(EntityKind::Lesson),
            EntityKind::Lesson => Some(EntityKind::Unit),
            EntityKind::Unit | EntityKind::Video | EntityKind::Assessment => None,
        }
    }

    fn layout(self) -> &'static [EntityKind] {
        match self {
            EntityKind::Unit => &[EntityKind::Unit],
            EntityKind::Lesson => &[EntityKind::Unit, EntityKind::Lesson],
            EntityKind::Activity => &[EntityKind::Unit, EntityKind::Lesson, EntityKind::Activity],
            EntityKind::Video => &[EntityKind::Unit, EntityKind::Lesson, EntityKind::Video],
            EntityKind::Block => &[
                EntityKind::Unit,
                EntityKind::Lesson,
                EntityKind::Activity,
                EntityKind::Block,
            ],
            EntityKind::Assessment => &[EntityKind::Assessment],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//
// ─── PROGRESS KEY ─────────────────────────────────────────────────────────────
//

/// Typed identifier of a node in the progress tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProgressKey {
    Unit {
        unit: UnitId,
    },
    Lesson {
        unit: UnitId,
        lesson: LessonId,
    },
    Activity {
        unit: UnitId,
        lesson: LessonId,
    },
    Video {
        unit: UnitId,
        lesson: LessonId,
    },
    Block {
        unit: UnitId,
        lesson: LessonId,
        block: BlockId,
    },
    Assessment {
        assessment: AssessmentId,
    },
}

impl ProgressKey {
    #[must_use]
    pub fn unit(unit: UnitId) -> Self {
        Self::Unit { unit }
    }

    #[must_use]
    pub fn lesson(unit: UnitId, lesson: LessonId) -> Self {
        Self::Lesson { unit, lesson }
    }

    #[must_use]
    pub fn activity(unit: UnitId, lesson: LessonId) -> Self {
        Self::Activity { unit, lesson }
    }

    #[must_use]
    pub fn video(unit: UnitId, lesson: LessonId) -> Self {
        Self::Video { unit, lesson }
    }

    #[must_use]
    pub fn block(unit: UnitId, lesson: LessonId, block: BlockId) -> Self {
        Self::Block {
            unit,
            lesson,
            block,
        }
    }

    #[must_use]
    pub fn assessment(assessment: AssessmentId) -> Self {
        Self::Assessment { assessment }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            ProgressKey::Unit { .. } => EntityKind::Unit,
            ProgressKey::Lesson { .. } => EntityKind::Lesson,
            ProgressKey::Activity { .. } => EntityKind::Activity,
            ProgressKey::Video { .. } => EntityKind::Video,
            ProgressKey::Block { .. } => EntityKind::Block,
            ProgressKey::Assessment { .. } => EntityKind::Assessment,
        }
    }

    /// Key of the ancestor re-derived after this node changes.
    ///
    /// Equivalent to dropping the trailing `(code, id)` pair of the encoded key.
    #[must_use]
    pub fn derived_parent(&self) -> Option<ProgressKey> {
        match *self {
            ProgressKey::Block { unit, lesson, .. } => Some(Self::activity(unit, lesson)),
            ProgressKey::Activity { unit, lesson } => Some(Self::lesson(unit, lesson)),
            ProgressKey::Lesson { unit, .. } => Some(Self::unit(unit)),
            ProgressKey::Unit { .. } | ProgressKey::Video { .. } | ProgressKey::Assessment { .. } => {
                None
            }
        }
    }

    /// Ordered `(kind, id)` segments from the root to this node.
    #[must_use]
    pub fn segments(&self) -> Vec<(EntityKind, String)> {
        let slot = || FIXED_SLOT.to_owned();
        match self {
            ProgressKey::Unit { unit } => vec![(EntityKind::Unit, unit.to_string())],
            ProgressKey::Lesson { unit, lesson } => vec![
                (EntityKind::Unit, unit.to_string()),
                (EntityKind::Lesson, lesson.to_string()),
            ],
            ProgressKey::Activity { unit, lesson } => vec![
                (EntityKind::Unit, unit.to_string()),
                (EntityKind::Lesson, lesson.to_string()),
                (EntityKind::Activity, slot()),
            ],
            ProgressKey::Video { unit, lesson } => vec![
                (EntityKind::Unit, unit.to_string()),
                (EntityKind::Lesson, lesson.to_string()),
                (EntityKind::Video, slot()),
            ],
            ProgressKey::Block {
                unit,
                lesson,
                block,
            } => vec![
                (EntityKind::Unit, unit.to_string()),
                (EntityKind::Lesson, lesson.to_string()),
                (EntityKind::Activity, slot()),
                (EntityKind::Block, block.to_string()),
            ],
            ProgressKey::Assessment { assessment } => {
                vec![(EntityKind::Assessment, assessment.to_string())]
            }
        }
    }

    /// Parse a stored key, requiring it to be of `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns `MalformedKeyError` if the segment count, codes or ids do not
    /// match the layout of `expected`.
    pub fn parse_as(raw: &str, expected: EntityKind) -> Result<Self, MalformedKeyError> {
        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        let wanted = 2 * expected.depth();
        if parts.len() != wanted {
            return Err(MalformedKeyError::SegmentCount {
                key: raw.to_owned(),
                kind: expected,
                expected: wanted,
                found: parts.len(),
            });
        }

        let mut ids = Vec::with_capacity(expected.depth());
        for (pair, layout_kind) in parts.chunks_exact(2).zip(expected.layout()) {
            let kind = EntityKind::from_code(pair[0]).ok_or_else(|| {
                MalformedKeyError::UnknownCode {
                    key: raw.to_owned(),
                    code: pair[0].to_owned(),
                }
            })?;
            if kind != *layout_kind {
                return Err(MalformedKeyError::Layout {
                    key: raw.to_owned(),
                    kind: expected,
                });
            }
            ids.push(pair[1]);
        }

        let invalid = |id: &str| MalformedKeyError::InvalidId {
            key: raw.to_owned(),
            id: id.to_owned(),
        };
        let unit_at = |i: usize| ids[i].parse::<UnitId>().map_err(|_| invalid(ids[i]));
        let lesson_at = |i: usize| ids[i].parse::<LessonId>().map_err(|_| invalid(ids[i]));
        let fixed_slot_at = |i: usize| {
            if ids[i] == FIXED_SLOT {
                Ok(())
            } else {
                Err(invalid(ids[i]))
            }
        };

        let key = match expected {
            EntityKind::Unit => Self::unit(unit_at(0)?),
            EntityKind::Lesson => Self::lesson(unit_at(0)?, lesson_at(1)?),
            EntityKind::Activity => {
                fixed_slot_at(2)?;
                Self::activity(unit_at(0)?, lesson_at(1)?)
            }
            EntityKind::Video => {
                fixed_slot_at(2)?;
                Self::video(unit_at(0)?, lesson_at(1)?)
            }
            EntityKind::Block => {
                fixed_slot_at(2)?;
                let block = ids[3].parse::<BlockId>().map_err(|_| invalid(ids[3]))?;
                Self::block(unit_at(0)?, lesson_at(1)?, block)
            }
            EntityKind::Assessment => {
                Self::assessment(ids[0].parse::<AssessmentId>().map_err(|_| invalid(ids[0]))?)
            }
        };
        Ok(key)
    }
}

impl FromStr for ProgressKey {
    type Err = MalformedKeyError;

    /// Parse a stored key, inferring its kind from the trailing code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplit(SEPARATOR);
        let _id = parts.next();
        let code = parts.next().unwrap_or_default();
        let kind = EntityKind::from_code(code).ok_or_else(|| MalformedKeyError::UnknownCode {
            key: s.to_owned(),
            code: code.to_owned(),
        })?;
        Self::parse_as(s, kind)
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (kind, id)) in self.segments().iter().enumerate() {
            if index > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{}{SEPARATOR}{id}", kind.code())?;
        }
        Ok(())
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
