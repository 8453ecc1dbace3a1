use std::sync::Arc;

use chrono::NaiveDate;
use scheduling_engine::{EngineConfig, Generator, NeverCancelled, ScheduleResult};
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use shared::types::{JobStatus, ScheduleJob};

use crate::domain::client::ResourcesClient;
use crate::domain::config::SchedulingConfig;
use crate::domain::job::JobRepository;
use crate::domain::job_state::PendingJob;
use crate::error::SchedulingServiceError;

/// Orchestrates schedule job lifecycle: submission, processing, status queries,
/// and recovery of stale or retry-waiting jobs.
pub struct SchedulingService {
    job_repo: Arc<dyn JobRepository>,
    resources_client: Arc<dyn ResourcesClient>,
    config: SchedulingConfig,
    task_tracker: TaskTracker,
}

impl SchedulingService {
    /// Creates a new scheduling service with the given repository, resources client, and config.
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        resources_client: Arc<dyn ResourcesClient>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            job_repo,
            resources_client,
            config,
            task_tracker: TaskTracker::new(),
        }
    }

    pub fn task_tracker(&self) -> &TaskTracker {
        &self.task_tracker
    }

    /// Validates the request, creates a new schedule job in the database, and spawns
    /// asynchronous processing. Returns the created job immediately (fire-and-forget).
    #[tracing::instrument(skip(self))]
    pub async fn submit_schedule(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ScheduleJob, SchedulingServiceError> {
        if end_date < start_date {
            return Err(SchedulingServiceError::BadRequest(
                "end_date must not be before start_date".into(),
            ));
        }

        let today = shared::time::today_in(self.config.timezone());
        if start_date < today {
            return Err(SchedulingServiceError::BadRequest(
                "start_date must not be in the past".into(),
            ));
        }

        let job = self.job_repo.create_job(start_date, end_date).await?;

        let pending_job = PendingJob::from_schedule_job(job.clone()).ok_or_else(|| {
            let job_id = job.id;
            let job_status = job.status;
            SchedulingServiceError::Internal(format!(
                "Newly created job {job_id} has unexpected status {job_status:?}"
            ))
        })?;

        self.spawn_process_job(pending_job);

        Ok(job)
    }

    /// Spawns a background task to process the given pending job.
    pub fn spawn_process_job(&self, pending_job: PendingJob) {
        let job_id = pending_job.id();
        let repo = Arc::clone(&self.job_repo);
        let client = Arc::clone(&self.resources_client);
        let engine_config = self.config.engine.clone();

        let span = tracing::info_span!("process_job", %job_id);
        self.task_tracker.spawn(
            async move {
                if let Err(e) = process_job(pending_job, repo, client, engine_config).await {
                    tracing::error!("Job {job_id} failed: {e}");
                }
            }
            .instrument(span),
        );
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_status(&self, job_id: Uuid) -> Result<ScheduleJob, SchedulingServiceError> {
        self.job_repo.find_by_id(job_id).await?.ok_or_else(|| {
            SchedulingServiceError::NotFound(format!("Schedule job {job_id} not found"))
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_result(
        &self,
        job_id: Uuid,
    ) -> Result<ScheduleResult, SchedulingServiceError> {
        let job = self.get_status(job_id).await?;

        if job.status != JobStatus::Completed {
            let status = job.status;
            return Err(SchedulingServiceError::BadRequest(format!(
                "Job is not completed, current status: {status:?}"
            )));
        }

        self.job_repo.get_result(job_id).await?.ok_or_else(|| {
            SchedulingServiceError::Internal(format!(
                "Job {job_id} is completed but has no stored result"
            ))
        })
    }

    /// Recovers jobs left in `Processing` state (e.g., from a previous crash) by resetting
    /// them to `Pending` and re-spawning processing. Also retries any `WaitingForRetry` jobs.
    #[tracing::instrument(skip(self))]
    pub async fn recover_stale_jobs(&self) -> Result<(), SchedulingServiceError> {
        let stale_jobs = self.job_repo.find_by_status(JobStatus::Processing).await?;

        if stale_jobs.is_empty() {
            tracing::info!("No stale jobs to recover");
        } else {
            tracing::info!(count = stale_jobs.len(), "Recovering stale jobs");
            for job in stale_jobs {
                let job_id = job.id;
                tracing::info!(%job_id, "Recovering stale job");

                self.job_repo.delete_result(job_id).await?;
                self.job_repo
                    .update_status(job_id, JobStatus::Pending)
                    .await?;

                self.respawn_as_pending(job_id).await?;
            }
        }

        // Also recover jobs waiting for retry from a previous run
        self.retry_waiting_jobs().await?;

        Ok(())
    }

    /// Resets all `WaitingForRetry` jobs to `Pending` and re-spawns processing.
    /// Called by the health check when the resource service recovers.
    #[tracing::instrument(skip(self))]
    pub async fn retry_waiting_jobs(&self) -> Result<(), SchedulingServiceError> {
        let waiting_jobs = self
            .job_repo
            .find_by_status(JobStatus::WaitingForRetry)
            .await?;

        if waiting_jobs.is_empty() {
            tracing::info!("No waiting-for-retry jobs to retry");
            return Ok(());
        }

        tracing::info!(
            count = waiting_jobs.len(),
            "Retrying waiting-for-retry jobs"
        );

        for job in waiting_jobs {
            let job_id = job.id;
            tracing::info!(%job_id, "Retrying waiting job");

            self.job_repo
                .update_status(job_id, JobStatus::Pending)
                .await?;

            self.respawn_as_pending(job_id).await?;
        }

        Ok(())
    }

    /// Reloads a job from the database and spawns processing if it is in `Pending` status.
    async fn respawn_as_pending(&self, job_id: Uuid) -> Result<(), SchedulingServiceError> {
        let Some(job) = self.job_repo.find_by_id(job_id).await? else {
            return Ok(());
        };
        if let Some(pending) = PendingJob::from_schedule_job(job) {
            self.spawn_process_job(pending);
        } else {
            tracing::warn!(%job_id, "Job no longer in Pending status after reset");
        }
        Ok(())
    }
}

/// Processes a single schedule job: transitions to `Processing`, fetches the resource
/// snapshot from the resource service, runs the engine, and saves the result.
///
/// On resource-service connectivity errors (`CircuitOpen`, `ResourceServiceUnavailable`),
/// the job is moved to `WaitingForRetry` instead of `Failed`.
#[tracing::instrument(skip(pending_job, repo, client, engine_config), fields(job_id = %pending_job.id()))]
async fn process_job(
    pending_job: PendingJob,
    repo: Arc<dyn JobRepository>,
    client: Arc<dyn ResourcesClient>,
    engine_config: EngineConfig,
) -> Result<(), SchedulingServiceError> {
    tracing::info!("Processing job");

    let (processing_job, job_id, status) = pending_job.start_processing();
    repo.update_status(job_id, status).await?;

    let start_date = processing_job.start_date();
    let end_date = processing_job.end_date();
    let version = processing_job.version();

    let snapshot = match client.get_resources(start_date, end_date).await {
        Ok(s) => s,
        Err(
            e @ (SchedulingServiceError::CircuitOpen
            | SchedulingServiceError::ResourceServiceUnavailable(_)),
        ) => {
            let (_waiting, id, status) = processing_job.wait_for_retry();
            if let Err(e) = repo.update_status(id, status).await {
                tracing::error!(%id, "Failed to mark job as waiting for retry: {e}");
            }
            tracing::warn!(%id, "Job marked as waiting for retry due to resource service unavailability");
            return Err(e);
        }
        Err(e) => {
            let (_failed, id, status) = processing_job.fail();
            if let Err(e) = repo.update_status(id, status).await {
                tracing::error!(%id, "Failed to mark job as failed: {e}");
            }
            return Err(e);
        }
    };

    let generator = Generator::new(engine_config);
    let now = chrono::Utc::now();

    match generator.generate(snapshot, start_date, end_date, version as u32, now, &NeverCancelled) {
        Ok(result) => {
            repo.save_result(job_id, &result).await?;
            let (_completed, id, status) = processing_job.complete();
            repo.update_status(id, status).await?;
            tracing::info!(
                entries = result.schedule.entries.len(),
                warnings = result.warnings.len(),
                "Job completed"
            );
        }
        Err(e) => {
            let (_failed, id, status) = processing_job.fail();
            if let Err(update_err) = repo.update_status(id, status).await {
                tracing::error!(%id, "Failed to mark job as failed: {update_err}");
            }
            tracing::error!("Schedule generation failed: {e}");
            return Err(SchedulingServiceError::Engine(e));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::client::MockResourcesClient;
    use crate::domain::job::MockJobRepository;
    use scheduling_engine::ResourceSnapshot;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn make_service(
        job_repo: MockJobRepository,
        resources_client: MockResourcesClient,
    ) -> SchedulingService {
        SchedulingService::new(
            Arc::new(job_repo),
            Arc::new(resources_client),
            SchedulingConfig::default(),
        )
    }

    fn make_job(status: JobStatus) -> ScheduleJob {
        ScheduleJob {
            id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            version: 1,
            status,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn single_employee_snapshot() -> ResourceSnapshot {
        use scheduling_engine::models::{
            CoverageRule, Employee, EmployeeAvailability, EmployeeGroup, ShiftTemplate,
        };

        let mut availabilities = Vec::new();
        for day in 0..5 {
            for hour in 8..20 {
                availabilities.push(EmployeeAvailability {
                    employee_id: 1,
                    day_of_week: day,
                    hour,
                    is_available: true,
                    availability_type: scheduling_engine::models::AvailabilityKind::Available,
                });
            }
        }

        let coverage = (0..5)
            .map(|d| CoverageRule {
                id: 1 + d as i64,
                day_index: d,
                start_time: "08:00".into(),
                end_time: "16:00".into(),
                min_employees: 1,
                max_employees: None,
                employee_types: HashSet::new(),
                allowed_employee_groups: HashSet::new(),
                requires_keyholder: false,
                keyholder_before_minutes: None,
                keyholder_after_minutes: None,
            })
            .collect();

        ResourceSnapshot {
            shifts: vec![ShiftTemplate {
                id: 1,
                start_time: "08:00".into(),
                end_time: "16:00".into(),
                requires_break: true,
                active_days: HashSet::from([0, 1, 2, 3, 4]),
                requires_keyholder: false,
            }],
            employees: vec![Employee {
                id: 1,
                group: EmployeeGroup::FullTime,
                contracted_hours: 40.0,
                is_active: true,
                is_keyholder: true,
                preferences: None,
            }],
            coverage,
            availabilities,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn submit_schedule_rejects_past_start_date() {
        let repo = MockJobRepository::new();
        let client = MockResourcesClient::new();
        let svc = make_service(repo, client);

        let long_ago = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let output = svc.submit_schedule(long_ago, long_ago).await;

        assert!(output.is_err());
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn submit_schedule_rejects_end_before_start() {
        let repo = MockJobRepository::new();
        let client = MockResourcesClient::new();
        let svc = make_service(repo, client);

        let today = shared::time::today_in(chrono_tz::Tz::UTC);
        let output = svc.submit_schedule(today, today - chrono::Duration::days(1)).await;

        assert!(output.is_err());
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn get_status_not_found() {
        let mut repo = MockJobRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let client = MockResourcesClient::new();
        let svc = make_service(repo, client);

        let output = svc.get_status(Uuid::new_v4()).await;

        assert!(output.is_err());
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn get_result_not_completed() {
        let mut repo = MockJobRepository::new();
        let job = make_job(JobStatus::Processing);
        let job_id = job.id;
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(job.clone())));

        let client = MockResourcesClient::new();
        let svc = make_service(repo, client);

        let output = svc.get_result(job_id).await;

        assert!(output.is_err());
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn process_job_happy_path() {
        let job = make_job(JobStatus::Pending);
        let pending = PendingJob::from_schedule_job(job).unwrap();

        let mut repo = MockJobRepository::new();

        let statuses = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        repo.expect_update_status().returning(move |_, status| {
            statuses_clone.lock().unwrap().push(status);
            Ok(())
        });

        let saved = Arc::new(Mutex::new(None));
        let saved_clone = saved.clone();
        repo.expect_save_result().returning(move |_, result| {
            *saved_clone.lock().unwrap() = Some(result.clone());
            Ok(())
        });

        let mut client = MockResourcesClient::new();
        client
            .expect_get_resources()
            .returning(|_, _| Ok(single_employee_snapshot()));

        let output = process_job(
            pending,
            Arc::new(repo),
            Arc::new(client),
            EngineConfig::default(),
        )
        .await;
        assert!(output.is_ok());

        let recorded = statuses.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], JobStatus::Processing);
        assert_eq!(recorded[1], JobStatus::Completed);

        let result = saved.lock().unwrap();
        assert!(result.as_ref().unwrap().schedule.entries.len() > 0);
    }

    #[tokio::test]
    async fn process_job_resource_service_error_marks_failed() {
        let job = make_job(JobStatus::Pending);
        let pending = PendingJob::from_schedule_job(job).unwrap();

        let mut repo = MockJobRepository::new();

        let statuses = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        repo.expect_update_status().returning(move |_, status| {
            statuses_clone.lock().unwrap().push(status);
            Ok(())
        });

        let mut client = MockResourcesClient::new();
        client.expect_get_resources().returning(|_, _| {
            Err(SchedulingServiceError::ResourceService(
                "Connection refused".into(),
            ))
        });

        let output = process_job(
            pending,
            Arc::new(repo),
            Arc::new(client),
            EngineConfig::default(),
        )
        .await;
        assert!(output.is_err());

        let recorded = statuses.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], JobStatus::Processing);
        assert_eq!(recorded[1], JobStatus::Failed);
    }

    #[tokio::test]
    async fn process_job_circuit_open_marks_waiting_for_retry() {
        let job = make_job(JobStatus::Pending);
        let pending = PendingJob::from_schedule_job(job).unwrap();

        let mut repo = MockJobRepository::new();

        let statuses = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        repo.expect_update_status().returning(move |_, status| {
            statuses_clone.lock().unwrap().push(status);
            Ok(())
        });

        let mut client = MockResourcesClient::new();
        client
            .expect_get_resources()
            .returning(|_, _| Err(SchedulingServiceError::CircuitOpen));

        let output = process_job(
            pending,
            Arc::new(repo),
            Arc::new(client),
            EngineConfig::default(),
        )
        .await;
        assert!(output.is_err());
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::CircuitOpen
        ));

        let recorded = statuses.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], JobStatus::Processing);
        assert_eq!(recorded[1], JobStatus::WaitingForRetry);
    }

    #[tokio::test]
    async fn process_job_resource_service_unavailable_marks_waiting_for_retry() {
        let job = make_job(JobStatus::Pending);
        let pending = PendingJob::from_schedule_job(job).unwrap();

        let mut repo = MockJobRepository::new();

        let statuses = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        repo.expect_update_status().returning(move |_, status| {
            statuses_clone.lock().unwrap().push(status);
            Ok(())
        });

        let mut client = MockResourcesClient::new();
        client.expect_get_resources().returning(|_, _| {
            Err(SchedulingServiceError::ResourceServiceUnavailable(
                "connection refused".into(),
            ))
        });

        let output = process_job(
            pending,
            Arc::new(repo),
            Arc::new(client),
            EngineConfig::default(),
        )
        .await;
        assert!(output.is_err());

        let recorded = statuses.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], JobStatus::Processing);
        assert_eq!(recorded[1], JobStatus::WaitingForRetry);
    }
}
