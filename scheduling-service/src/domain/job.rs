use async_trait::async_trait;
use chrono::NaiveDate;
use scheduling_engine::ScheduleResult;
use shared::types::{JobStatus, ScheduleJob};
use uuid::Uuid;

use crate::error::SchedulingServiceError;

/// Persistence operations for schedule jobs and their generated results.
///
/// A job's generated schedule (`ScheduleResult`, with its entries, warnings,
/// and coverage summary) is stored and retrieved as a unit rather than
/// decomposed into per-assignment rows — it is already the engine's own
/// nested data model, not a relational shape this service needs to own.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create_job(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ScheduleJob, SchedulingServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleJob>, SchedulingServiceError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
    ) -> Result<(), SchedulingServiceError>;
    async fn save_result(
        &self,
        job_id: Uuid,
        result: &ScheduleResult,
    ) -> Result<(), SchedulingServiceError>;
    async fn get_result(
        &self,
        job_id: Uuid,
    ) -> Result<Option<ScheduleResult>, SchedulingServiceError>;
    async fn find_by_status(
        &self,
        status: JobStatus,
    ) -> Result<Vec<ScheduleJob>, SchedulingServiceError>;
    async fn delete_result(&self, job_id: Uuid) -> Result<(), SchedulingServiceError>;
}
