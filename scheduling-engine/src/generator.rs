//! Drives the day-by-day assignment pipeline end to end (spec §4.7).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::EngineConfig;
use crate::diagnostics::{CoverageSummary, Issue, IssueKind};
use crate::distribution::DistributionManager;
use crate::error::EngineError;
use crate::models::{IssueSeverity, Schedule, ScheduleStatus};
use crate::resources::{ResourceSnapshot, Resources};
use crate::schedule_state::ScheduleState;
use crate::validator::Validator;
use crate::weekday::day_index;

/// Cooperative cancellation hook checked at date boundaries (spec §5). The
/// generator never spawns threads or awaits; this is a plain polled flag so
/// the engine stays synchronous while still letting a host impose a deadline.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// Default no-op token for callers that never cancel.
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResult {
    pub schedule: Schedule,
    pub warnings: Vec<Issue>,
    pub version: u32,
    pub generation_time: chrono::DateTime<chrono::Utc>,
    pub coverage_summary: Option<CoverageSummary>,
}

pub struct Generator {
    config: EngineConfig,
}

impl Generator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Generates assignments for `[start_date, end_date]` inclusive. `now`
    /// is supplied by the caller rather than read from the system clock, so
    /// the engine stays pure and deterministic (spec §5).
    #[tracing::instrument(skip(self, snapshot, cancellation))]
    pub fn generate(
        &self,
        snapshot: ResourceSnapshot,
        start_date: NaiveDate,
        end_date: NaiveDate,
        version: u32,
        now: chrono::DateTime<chrono::Utc>,
        cancellation: &dyn CancellationToken,
    ) -> Result<ScheduleResult, EngineError> {
        let wall_clock = std::time::Instant::now();
        let resources = Resources::load(snapshot).map_err(EngineError::from)?;

        let mut schedule_state = ScheduleState::new();
        let mut warnings = Vec::new();
        let mut distribution = DistributionManager::new(&self.config);

        let mut cursor = start_date;
        let mut cancelled = false;

        while cursor <= end_date {
            if cancellation.is_cancelled() {
                cancelled = true;
                break;
            }

            if !self.config.is_store_open(day_index(cursor)) {
                cursor += chrono::Duration::days(1);
                continue;
            }

            if resources.get_daily_coverage(cursor).is_empty() {
                warnings.push(Issue::new(
                    IssueKind::NoCoverageForDate,
                    IssueSeverity::Info,
                    format!("no coverage rules for {cursor}"),
                ));
            }

            let active = resources.get_active_employees();
            if active.is_empty() {
                warnings.push(Issue::new(
                    IssueKind::NoAvailableEmployees,
                    IssueSeverity::Warning,
                    format!("no active employees to schedule on {cursor}"),
                ));
                cursor += chrono::Duration::days(1);
                continue;
            }

            let day_issues = distribution
                .assign_day(cursor, &resources, &self.config, &mut schedule_state)
                .map_err(|e| EngineError::wrap_generation(EngineError::from(e)))?;
            warnings.extend(day_issues);

            cursor += chrono::Duration::days(1);
        }

        if cancelled {
            warnings.push(Issue::new(
                IssueKind::Cancelled,
                IssueSeverity::Info,
                format!("generation cancelled at {cursor}"),
            ));
        }

        if self.config.create_empty_schedules && !cancelled {
            self.materialize_empty_entries(&resources, start_date, end_date, &mut schedule_state)?;
        }

        let entries = schedule_state.into_assignments();
        let schedule = Schedule {
            id: 0,
            start_date,
            end_date,
            status: ScheduleStatus::Draft,
            version,
            entries,
        };

        let validator = Validator::new(&self.config);
        let (validation_issues, coverage_summary) = validator
            .validate(&schedule, &resources)
            .map_err(|e| EngineError::wrap_generation(EngineError::from(e)))?;
        warnings.extend(validation_issues);

        let unfilled = warnings
            .iter()
            .filter(|w| w.kind == IssueKind::Understaffing)
            .count();
        tracing::info!(
            start_date = %start_date,
            end_date = %end_date,
            assignments = schedule.entries.iter().filter(|a| !a.is_empty_entry()).count(),
            unfilled_shifts = unfilled,
            warnings = warnings.len(),
            elapsed_ms = wall_clock.elapsed().as_millis() as u64,
            "schedule generation finished"
        );

        Ok(ScheduleResult {
            schedule,
            warnings,
            version,
            generation_time: now,
            coverage_summary: Some(coverage_summary),
        })
    }

    /// For every `(active_employee, date)` pair with no assignment, appends
    /// an EMPTY entry so consumers can render every grid cell (spec §4.7
    /// step 4). Preference is given to a shift whose start hour matches the
    /// earliest hour of the employee's availability that day, when one
    /// exists — this is recorded only as a hint on the empty entry itself,
    /// since an EMPTY assignment carries no `shift_id`.
    fn materialize_empty_entries(
        &self,
        resources: &Resources,
        start_date: NaiveDate,
        end_date: NaiveDate,
        schedule_state: &mut ScheduleState,
    ) -> Result<(), EngineError> {
        let mut cursor = start_date;
        while cursor <= end_date {
            if self.config.is_store_open(day_index(cursor)) {
                for employee in resources.get_active_employees() {
                    if schedule_state.assignment_on(employee.id, cursor).is_none() {
                        let hint = earliest_available_hour(resources, employee.id, cursor)
                            .map(|hour| format!("{hour:02}:00"));
                        schedule_state.record_empty(employee.id, cursor, hint);
                    }
                }
            }
            cursor += chrono::Duration::days(1);
        }
        Ok(())
    }
}

/// The earliest hour on `date` for which `employee_id` has an availability
/// row that isn't `UNAVAILABLE`, or `None` if no such hour exists.
fn earliest_available_hour(resources: &Resources, employee_id: i64, date: NaiveDate) -> Option<u8> {
    resources
        .get_employee_availability(employee_id, day_index(date))
        .iter()
        .filter(|a| a.employee_id == employee_id && a.is_available && a.availability_type != crate::models::AvailabilityKind::Unavailable)
        .map(|a| a.hour)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CoverageRule, Employee, EmployeeAvailability, EmployeeGroup, ShiftTemplate,
    };
    use std::collections::HashSet;

    fn single_employee_resources() -> ResourceSnapshot {
        let mut availabilities = Vec::new();
        for day in 0..5 {
            for hour in 8..20 {
                availabilities.push(EmployeeAvailability {
                    employee_id: 1,
                    day_of_week: day,
                    hour,
                    is_available: true,
                    availability_type: crate::models::AvailabilityKind::Available,
                });
            }
        }

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
            coverage: vec![CoverageRule {
                id: 1,
                day_index: 0,
                start_time: "08:00".into(),
                end_time: "16:00".into(),
                min_employees: 1,
                max_employees: None,
                employee_types: HashSet::new(),
                allowed_employee_groups: HashSet::new(),
                requires_keyholder: true,
                keyholder_before_minutes: None,
                keyholder_after_minutes: None,
            }]
            .into_iter()
            .chain((1..5).map(|d| CoverageRule {
                id: 1 + d as i64,
                day_index: d,
                start_time: "08:00".into(),
                end_time: "16:00".into(),
                min_employees: 1,
                max_employees: None,
                employee_types: HashSet::new(),
                allowed_employee_groups: HashSet::new(),
                requires_keyholder: true,
                keyholder_before_minutes: None,
                keyholder_after_minutes: None,
            }))
            .collect(),
            absences: vec![],
            availabilities,
            ..Default::default()
        }
    }

    #[test]
    fn single_employee_single_shift_week_assigns_every_weekday() {
        let generator = Generator::new(EngineConfig::default());
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 11, 8).unwrap();
        let now = chrono::DateTime::from_timestamp(0, 0).unwrap();

        let result = generator
            .generate(single_employee_resources(), monday, friday, 1, now, &NeverCancelled)
            .unwrap();

        assert_eq!(result.schedule.entries.len(), 5);
        assert!(result
            .schedule
            .entries
            .iter()
            .all(|a| a.employee_id == 1 && a.shift_id == Some(1)));

        assert!(!result
            .warnings
            .iter()
            .any(|w| matches!(w.kind, IssueKind::Understaffing | IssueKind::MissingKeyholder)));
    }

    #[test]
    fn single_day_range_generates_one_day() {
        let generator = Generator::new(EngineConfig::default());
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let now = chrono::DateTime::from_timestamp(0, 0).unwrap();

        let result = generator
            .generate(single_employee_resources(), monday, monday, 1, now, &NeverCancelled)
            .unwrap();

        assert_eq!(result.schedule.entries.len(), 1);
    }

    struct AlreadyCancelled;
    impl CancellationToken for AlreadyCancelled {
        fn is_cancelled(&self) -> bool {
            true
        }
    }

    #[test]
    fn cancellation_aborts_cleanly_with_issue_recorded() {
        let generator = Generator::new(EngineConfig::default());
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 11, 8).unwrap();
        let now = chrono::DateTime::from_timestamp(0, 0).unwrap();

        let result = generator
            .generate(single_employee_resources(), monday, friday, 1, now, &AlreadyCancelled)
            .unwrap();

        assert!(result.schedule.entries.is_empty());
        assert!(result.warnings.iter().any(|w| w.kind == IssueKind::Cancelled));
    }
}
