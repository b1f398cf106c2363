use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            #[must_use]
            pub fn new(id: $inner) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn value(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<$inner>().map(Self::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

numeric_id!(
    /// Identifies a student whose progress is tracked.
    StudentId(u64)
);
numeric_id!(
    /// Identifies a regular unit within the course outline.
    UnitId(u64)
);
numeric_id!(
    /// Identifies a lesson within its unit.
    LessonId(u64)
);
numeric_id!(
    /// Position of a block inside its activity, starting at zero.
    BlockId(usize)
);

/// Identifies an assessment, e.g. `Pre`, `Mid` or `Fin`.
///
/// Assessment ids are free-form but must be non-empty and must not contain
/// the key separator `.`, otherwise their progress key cannot be parsed back.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssessmentId(String);

impl AssessmentId {
    /// Creates a new `AssessmentId`.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty or contains `.`.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
        let id = id.into();
        if id.is_empty() || id.contains('.') {
            return Err(ParseIdError {
                kind: "AssessmentId",
            });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssessmentId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssessmentId> for String {
    fn from(value: AssessmentId) -> Self {
        value.0
    }
}

impl FromStr for AssessmentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssessmentId({})", self.0)
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_display_and_parse() {
        let id: UnitId = "12".parse().unwrap();
        assert_eq!(id, UnitId::new(12));
        assert_eq!(id.to_string(), "12");
    }

    #[test]
    fn lesson_id_from_str_invalid() {
        let err = "one".parse::<LessonId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse LessonId from string");
    }

    #[test]
    fn block_id_is_positional() {
        assert_eq!(BlockId::new(3).value(), 3);
        assert_eq!(format!("{:?}", BlockId::new(3)), "BlockId(3)");
    }

    #[test]
    fn assessment_id_rejects_separator_and_empty() {
        assert!(AssessmentId::new("Mid").is_ok());
        assert!(AssessmentId::new("").is_err());
        assert!(AssessmentId::new("a.b").is_err());
    }

    #[test]
    fn assessment_id_deserializes_through_validation() {
        let ok: AssessmentId = serde_json::from_str("\"Fin\"").unwrap();
        assert_eq!(ok.as_str(), "Fin");
        assert!(serde_json::from_str::<AssessmentId>("\"x.y\"").is_err());
    }
}
