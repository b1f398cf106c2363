use async_trait::async_trait;
use progress_core::model::StudentId;

use super::SqlitePropertyStore;
use super::mapping::{map_property_row, student_id_to_i64};
use crate::repository::{StorageError, StudentPropertyRecord, StudentPropertyRepository};

#[async_trait]
impl StudentPropertyRepository for SqlitePropertyStore {
    async fn get_property(
        &self,
        student_id: StudentId,
        property_name: &str,
    ) -> Result<Option<StudentPropertyRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT student_id, property_name, value, updated_on
            FROM student_properties
            WHERE student_id = ?1 AND property_name = ?2
            ",
        )
        .bind(student_id_to_i64(student_id)?)
        .bind(property_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_property_row).transpose()
    }

    async fn put_property(&self, record: &StudentPropertyRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO student_properties (student_id, property_name, value, updated_on)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(student_id, property_name) DO UPDATE SET
                value = excluded.value,
                updated_on = excluded.updated_on
            ",
        )
        .bind(student_id_to_i64(record.student_id)?)
        .bind(&record.property_name)
        .bind(record.value.as_deref())
        .bind(record.updated_on)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn list_properties(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<StudentPropertyRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT student_id, property_name, value, updated_on
            FROM student_properties
            WHERE student_id = ?1
            ORDER BY property_name
            ",
        )
        .bind(student_id_to_i64(student_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        rows.iter().map(map_property_row).collect()
    }
}
