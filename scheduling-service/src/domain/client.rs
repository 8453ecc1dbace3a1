use async_trait::async_trait;
use chrono::NaiveDate;
use scheduling_engine::ResourceSnapshot;

use crate::error::SchedulingServiceError;

/// Fetches the employees/shifts/coverage/absences/availabilities needed to
/// generate a schedule over `[start_date, end_date]`. The engine itself has
/// no knowledge of where this data lives; this service owns that boundary.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ResourcesClient: Send + Sync {
    async fn get_resources(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ResourceSnapshot, SchedulingServiceError>;
}
