use async_trait::async_trait;
use chrono::NaiveDate;
use scheduling_engine::ScheduleResult;
use shared::types::{JobStatus, ScheduleJob};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{domain::job::JobRepository, error::SchedulingServiceError};

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[tracing::instrument(skip(self))]
    async fn create_job(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ScheduleJob, SchedulingServiceError> {
        let output = sqlx::query_as!(ScheduleJob,
            r#"
            INSERT INTO schedule_jobs (start_date, end_date, version)
            VALUES ($1, $2, 1)
            RETURNING id, start_date, end_date, version, status AS "status: _", created_at, updated_at
            "#,
            start_date,
            end_date
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleJob>, SchedulingServiceError> {
        let output = sqlx::query_as!(
            ScheduleJob,
            r#"
            SELECT id, start_date, end_date, version, status AS "status: _", created_at, updated_at
            FROM schedule_jobs
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
    ) -> Result<(), SchedulingServiceError> {
        let output = sqlx::query!(
            r#"
            UPDATE schedule_jobs
            SET status = $2, updated_at = now()
            WHERE id = $1
            "#,
            id,
            status as _,
        )
        .execute(&self.pool)
        .await?;

        if output.rows_affected() == 0 {
            return Err(SchedulingServiceError::NotFound(format!(
                "Schedule job {id} not found"
            )));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, result))]
    async fn save_result(
        &self,
        job_id: Uuid,
        result: &ScheduleResult,
    ) -> Result<(), SchedulingServiceError> {
        let payload = serde_json::to_value(result).map_err(|e| {
            SchedulingServiceError::Internal(format!("Failed to serialize schedule result: {e}"))
        })?;

        sqlx::query!(
            r#"
            INSERT INTO schedule_results (job_id, result)
            VALUES ($1, $2)
            ON CONFLICT (job_id) DO UPDATE SET result = EXCLUDED.result
            "#,
            job_id,
            payload
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_result(
        &self,
        job_id: Uuid,
    ) -> Result<Option<ScheduleResult>, SchedulingServiceError> {
        let row = sqlx::query!(
            r#"
            SELECT result
            FROM schedule_results
            WHERE job_id = $1
            "#,
            job_id
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let result = serde_json::from_value(row.result).map_err(|e| {
            SchedulingServiceError::Internal(format!("Failed to deserialize schedule result: {e}"))
        })?;

        Ok(Some(result))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_status(
        &self,
        status: JobStatus,
    ) -> Result<Vec<ScheduleJob>, SchedulingServiceError> {
        let output = sqlx::query_as!(
            ScheduleJob,
            r#"
            SELECT id, start_date, end_date, version, status AS "status: _", created_at, updated_at
            FROM schedule_jobs
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
            status as _,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_result(&self, job_id: Uuid) -> Result<(), SchedulingServiceError> {
        sqlx::query!(
            r#"
            DELETE FROM schedule_results
            WHERE job_id = $1
            "#,
            job_id
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
