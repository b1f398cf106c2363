use progress_core::model::StudentId;
use sqlx::Row;

use crate::repository::{StorageError, StudentPropertyRecord};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn student_id_from_i64(v: i64) -> Result<StudentId, StorageError> {
    u64::try_from(v)
        .map(StudentId::new)
        .map_err(|_| StorageError::Serialization("student_id sign overflow".into()))
}

pub(crate) fn student_id_to_i64(id: StudentId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("student_id overflow".into()))
}

pub(crate) fn map_property_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StudentPropertyRecord, StorageError> {
    Ok(StudentPropertyRecord {
        student_id: student_id_from_i64(row.try_get::<i64, _>("student_id").map_err(ser)?)?,
        property_name: row.try_get("property_name").map_err(ser)?,
        value: row.try_get("value").map_err(ser)?,
        updated_on: row.try_get("updated_on").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_ids_outside_i64_are_rejected() {
        assert!(student_id_to_i64(StudentId::new(u64::MAX)).is_err());
        assert!(student_id_from_i64(-1).is_err());
        assert_eq!(student_id_from_i64(7).unwrap(), StudentId::new(7));
    }
}
