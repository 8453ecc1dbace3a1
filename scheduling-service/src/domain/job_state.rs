use chrono::NaiveDate;
use shared::types::{JobStatus, ScheduleJob};
use uuid::Uuid;

/// wrapper for a job in `Pending` status.
/// consuming `start_processing` into to `ProcessingJob`.
pub struct PendingJob {
    inner: ScheduleJob,
}

/// wrapper for a job in `Processing` status.
/// consuming `complete` or `fail` into to terminal states.
pub struct ProcessingJob {
    inner: ScheduleJob,
}

/// Terminal state: job completed successfully.
pub struct CompletedJob {
    inner: ScheduleJob,
}

/// Terminal state: job failed.
pub struct FailedJob {
    inner: ScheduleJob,
}

/// Job is waiting for the resource service to recover before retrying.
pub struct WaitingForRetryJob {
    inner: ScheduleJob,
}

impl PendingJob {
    pub fn from_schedule_job(job: ScheduleJob) -> Option<Self> {
        if job.status == JobStatus::Pending {
            Some(Self { inner: job })
        } else {
            None
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn inner(&self) -> &ScheduleJob {
        &self.inner
    }

    pub fn start_processing(mut self) -> (ProcessingJob, Uuid, JobStatus) {
        let id = self.inner.id;
        self.inner.status = JobStatus::Processing;
        (
            ProcessingJob { inner: self.inner },
            id,
            JobStatus::Processing,
        )
    }
}

impl ProcessingJob {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.inner.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.inner.end_date
    }

    pub fn version(&self) -> i32 {
        self.inner.version
    }

    pub fn complete(mut self) -> (CompletedJob, Uuid, JobStatus) {
        let id = self.inner.id;
        self.inner.status = JobStatus::Completed;
        (CompletedJob { inner: self.inner }, id, JobStatus::Completed)
    }

    pub fn fail(mut self) -> (FailedJob, Uuid, JobStatus) {
        let id = self.inner.id;
        self.inner.status = JobStatus::Failed;
        (FailedJob { inner: self.inner }, id, JobStatus::Failed)
    }

    pub fn wait_for_retry(mut self) -> (WaitingForRetryJob, Uuid, JobStatus) {
        let id = self.inner.id;
        self.inner.status = JobStatus::WaitingForRetry;
        (
            WaitingForRetryJob { inner: self.inner },
            id,
            JobStatus::WaitingForRetry,
        )
    }
}

impl CompletedJob {
    pub fn into_inner(self) -> ScheduleJob {
        self.inner
    }
}

impl FailedJob {
    pub fn into_inner(self) -> ScheduleJob {
        self.inner
    }
}

impl WaitingForRetryJob {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn into_pending(mut self) -> (PendingJob, Uuid, JobStatus) {
        let id = self.inner.id;
        self.inner.status = JobStatus::Pending;
        (PendingJob { inner: self.inner }, id, JobStatus::Pending)
    }

    pub fn into_inner(self) -> ScheduleJob {
        self.inner
    }
}
