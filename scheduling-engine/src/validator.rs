//! Re-runs every rule from §4.3–§4.5 over a finished schedule and reports a
//! structured diagnostic list, independent of and reusable after generation
//! (spec §4.8).

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::coverage::CoverageResolver;
use crate::diagnostics::{CoverageSummary, Issue, IssueKind};
use crate::models::{AssignmentStatus, IssueSeverity, Schedule};
use crate::resources::Resources;
use crate::time_math::{self, ParseError};
use crate::weekday::{day_index, week_start};

pub struct Validator<'a> {
    config: &'a EngineConfig,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        schedule: &Schedule,
        resources: &Resources,
    ) -> Result<(Vec<Issue>, CoverageSummary), ParseError> {
        let mut issues = Vec::new();
        let mut summary = CoverageSummary::default();

        if self.config.enforce_min_coverage || self.config.enforce_keyholder {
            self.check_interval_coverage(schedule, resources, &mut issues, &mut summary)?;
        }

        if self.config.enforce_contracted_hours {
            self.check_contracted_hours(schedule, resources, &mut issues)?;
        }

        if self.config.enforce_keyholder {
            self.check_keyholder_per_shift(schedule, resources, &mut issues);
        }

        if self.config.enforce_rest_periods {
            self.check_rest_periods(schedule, &mut issues)?;
        }

        if self.config.enforce_max_shifts || self.config.enforce_max_hours {
            self.check_weekly_caps(schedule, resources, &mut issues)?;
        }

        if self.config.enforce_consecutive_days {
            self.check_consecutive_days(schedule, &mut issues);
        }

        if self.config.enforce_early_late_rules {
            self.check_early_late_sequence(schedule, &mut issues)?;
        }

        if self.config.enforce_break_rules {
            self.check_break_rule(schedule, resources, &mut issues)?;
        }

        if self.config.enforce_weekend_distribution {
            self.check_weekend_distribution(schedule, &mut issues);
        }

        Ok((issues, summary))
    }

    fn check_interval_coverage(
        &self,
        schedule: &Schedule,
        resources: &Resources,
        issues: &mut Vec<Issue>,
        summary: &mut CoverageSummary,
    ) -> Result<(), ParseError> {
        let resolver = CoverageResolver::new(resources);
        let step = self.config.interval_duration_minutes.max(1) as i64;

        let mut date = schedule.start_date;
        while date <= schedule.end_date {
            let mut minute = 0i64;
            while minute < 24 * 60 {
                let interval_start = time_math::minutes_to_time(minute as i32);
                let demand = resolver.required_staffing(date, &interval_start, step as u32)?;

                summary.intervals_checked += 1;

                let active_here: Vec<_> = schedule
                    .entries
                    .iter()
                    .filter(|a| {
                        a.date == date
                            && a.status != AssignmentStatus::Empty
                            && a.status != AssignmentStatus::Cancelled
                            && a.start_time
                                .as_deref()
                                .zip(a.end_time.as_deref())
                                .is_some_and(|(s, e)| interval_contains(s, e, &interval_start))
                    })
                    .collect();

                let actual = active_here.len() as u32;
                if actual >= demand.min_employees {
                    summary.intervals_meeting_min += 1;
                } else if self.config.enforce_min_coverage {
                    issues.push(
                        Issue::new(
                            IssueKind::Understaffing,
                            IssueSeverity::Critical,
                            format!("{date} {interval_start}: {actual}/{} staffed", demand.min_employees),
                        )
                        .with_details(serde_json::json!({ "date": date.to_string(), "interval_start": interval_start })),
                    );
                }

                if demand.requires_keyholder {
                    summary.intervals_needing_keyholder += 1;
                    let has_keyholder = active_here
                        .iter()
                        .any(|a| resources.get_employee(a.employee_id).is_some_and(|e| e.is_keyholder));
                    if has_keyholder {
                        summary.intervals_with_keyholder_met += 1;
                    } else if self.config.enforce_keyholder {
                        issues.push(Issue::new(
                            IssueKind::MissingKeyholder,
                            IssueSeverity::Critical,
                            format!("{date} {interval_start}: no keyholder present"),
                        ));
                    }
                }

                if let Some(types) = demand.employee_types_or_any() {
                    let has_type = active_here
                        .iter()
                        .any(|a| resources.get_employee(a.employee_id).is_some_and(|e| types.contains(&e.group)));
                    if !has_type {
                        issues.push(Issue::new(
                            IssueKind::MissingEmployeeType,
                            IssueSeverity::Warning,
                            format!("{date} {interval_start}: no employee of required type present"),
                        ));
                    }
                }

                minute += step;
            }
            date += chrono::Duration::days(1);
        }

        Ok(())
    }

    fn check_contracted_hours(&self, schedule: &Schedule, resources: &Resources, issues: &mut Vec<Issue>) -> Result<(), ParseError> {
        let mut hours_by_employee_week: HashMap<(i64, NaiveDate), f64> = HashMap::new();

        for assignment in &schedule.entries {
            if let (Some(start), Some(end)) = (&assignment.start_time, &assignment.end_time) {
                let week = week_start(assignment.date);
                *hours_by_employee_week.entry((assignment.employee_id, week)).or_insert(0.0) +=
                    time_math::duration(start, end)?;
            }
        }

        for employee in resources.get_active_employees() {
            let mut weeks: Vec<NaiveDate> = hours_by_employee_week
                .keys()
                .filter(|(id, _)| *id == employee.id)
                .map(|(_, week)| *week)
                .collect();
            weeks.sort();
            weeks.dedup();

            for week in weeks {
                let total = hours_by_employee_week.get(&(employee.id, week)).copied().unwrap_or(0.0);
                if total < 0.75 * employee.contracted_hours {
                    issues.push(Issue::new(
                        IssueKind::ContractedHoursShortfall,
                        IssueSeverity::Warning,
                        format!(
                            "employee {} worked {total:.1}h in week of {week}, below 75% of {}h contracted",
                            employee.id, employee.contracted_hours
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    fn check_keyholder_per_shift(&self, schedule: &Schedule, resources: &Resources, issues: &mut Vec<Issue>) {
        let mut by_shift_instance: HashMap<(i64, NaiveDate), Vec<i64>> = HashMap::new();
        for assignment in &schedule.entries {
            if let Some(shift_id) = assignment.shift_id {
                by_shift_instance
                    .entry((shift_id, assignment.date))
                    .or_default()
                    .push(assignment.employee_id);
            }
        }

        for ((shift_id, date), employee_ids) in by_shift_instance {
            let Some(shift) = resources.get_shift(shift_id) else {
                continue;
            };
            if !shift.requires_keyholder {
                continue;
            }
            let has_keyholder = employee_ids
                .iter()
                .any(|id| resources.get_employee(*id).is_some_and(|e| e.is_keyholder));
            if !has_keyholder {
                issues.push(Issue::new(
                    IssueKind::MissingKeyholder,
                    IssueSeverity::Critical,
                    format!("shift {shift_id} on {date} has no assigned keyholder"),
                ));
            }
        }
    }

    fn check_rest_periods(&self, schedule: &Schedule, issues: &mut Vec<Issue>) -> Result<(), ParseError> {
        let mut by_employee: HashMap<i64, Vec<&crate::models::Assignment>> = HashMap::new();
        for assignment in &schedule.entries {
            if assignment.start_time.is_some() {
                by_employee.entry(assignment.employee_id).or_default().push(assignment);
            }
        }

        for (employee_id, mut assignments) in by_employee {
            assignments.sort_by_key(|a| a.date);
            for pair in assignments.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                if (next.date - prev.date).num_days() != 1 {
                    continue;
                }
                if let (Some(prev_end), Some(next_start)) = (&prev.end_time, &next.start_time) {
                    let rest = time_math::rest_hours(prev_end, next_start)?;
                    if rest < self.config.min_rest_hours {
                        issues.push(Issue::new(
                            IssueKind::RestPeriod,
                            IssueSeverity::Warning,
                            format!(
                                "employee {employee_id}: only {rest:.1}h rest between {} and {}",
                                prev.date, next.date
                            ),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn check_weekly_caps(&self, schedule: &Schedule, resources: &Resources, issues: &mut Vec<Issue>) -> Result<(), ParseError> {
        let mut hours_by_employee_week: HashMap<(i64, NaiveDate), f64> = HashMap::new();
        let mut shifts_by_employee_week: HashMap<(i64, NaiveDate), u32> = HashMap::new();

        for assignment in &schedule.entries {
            if assignment.status == AssignmentStatus::Empty {
                continue;
            }
            let week = week_start(assignment.date);
            *shifts_by_employee_week.entry((assignment.employee_id, week)).or_insert(0) += 1;
            if let (Some(start), Some(end)) = (&assignment.start_time, &assignment.end_time) {
                *hours_by_employee_week.entry((assignment.employee_id, week)).or_insert(0.0) +=
                    time_math::duration(start, end)?;
            }
        }

        for employee in resources.get_active_employees() {
            for ((id, week), hours) in &hours_by_employee_week {
                if *id != employee.id {
                    continue;
                }
                if self.config.enforce_max_hours && *hours > self.config.max_hours_for(employee.group) {
                    issues.push(Issue::new(
                        IssueKind::MaxHours,
                        IssueSeverity::Warning,
                        format!("employee {} exceeded weekly hour cap in week of {week}: {hours:.1}h", employee.id),
                    ));
                }
            }
            for ((id, week), count) in &shifts_by_employee_week {
                if *id != employee.id {
                    continue;
                }
                if self.config.enforce_max_shifts && *count > self.config.max_shifts_for(employee.group) {
                    issues.push(Issue::new(
                        IssueKind::MaxShifts,
                        IssueSeverity::Warning,
                        format!("employee {} exceeded weekly shift cap in week of {week}: {count}", employee.id),
                    ));
                }
            }
        }

        Ok(())
    }

    fn check_consecutive_days(&self, schedule: &Schedule, issues: &mut Vec<Issue>) {
        let mut by_employee: HashMap<i64, Vec<NaiveDate>> = HashMap::new();
        for assignment in &schedule.entries {
            if assignment.status != AssignmentStatus::Empty {
                by_employee.entry(assignment.employee_id).or_default().push(assignment.date);
            }
        }

        for (employee_id, mut dates) in by_employee {
            dates.sort();
            dates.dedup();
            let mut streak = 1u32;
            for pair in dates.windows(2) {
                if (pair[1] - pair[0]).num_days() == 1 {
                    streak += 1;
                    if streak > self.config.max_consecutive_days {
                        issues.push(Issue::new(
                            IssueKind::ConsecutiveDays,
                            IssueSeverity::Warning,
                            format!("employee {employee_id}: {streak} consecutive days ending {}", pair[1]),
                        ));
                    }
                } else {
                    streak = 1;
                }
            }
        }
    }

    fn check_early_late_sequence(&self, schedule: &Schedule, issues: &mut Vec<Issue>) -> Result<(), ParseError> {
        let mut by_employee: HashMap<i64, Vec<&crate::models::Assignment>> = HashMap::new();
        for assignment in &schedule.entries {
            if assignment.start_time.is_some() {
                by_employee.entry(assignment.employee_id).or_default().push(assignment);
            }
        }

        let seventeen = time_math::time_to_minutes("17:00")?;
        let nine = time_math::time_to_minutes("09:00")?;

        for (employee_id, mut assignments) in by_employee {
            assignments.sort_by_key(|a| a.date);
            for pair in assignments.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                if (next.date - prev.date).num_days() != 1 {
                    continue;
                }
                let (Some(prev_end), Some(next_start)) = (&prev.end_time, &next.start_time) else {
                    continue;
                };
                if time_math::time_to_minutes(prev_end)? >= seventeen && time_math::time_to_minutes(next_start)? <= nine {
                    issues.push(Issue::new(
                        IssueKind::EarlyLateSequence,
                        IssueSeverity::Warning,
                        format!("employee {employee_id}: late shift on {} followed by early shift on {}", prev.date, next.date),
                    ));
                }
            }
        }

        Ok(())
    }

    fn check_break_rule(&self, schedule: &Schedule, resources: &Resources, issues: &mut Vec<Issue>) -> Result<(), ParseError> {
        for assignment in &schedule.entries {
            let (Some(start), Some(end)) = (&assignment.start_time, &assignment.end_time) else {
                continue;
            };
            let duration = time_math::duration(start, end)?;
            let requires_break = assignment
                .shift_id
                .and_then(|id| resources.get_shift(id))
                .map(|s| s.requires_break)
                .unwrap_or(false);

            if (duration > 6.0 || requires_break) && (assignment.break_start.is_none() || assignment.break_end.is_none()) {
                issues.push(Issue::new(
                    IssueKind::BreakRule,
                    IssueSeverity::Warning,
                    format!(
                        "employee {}: {duration:.1}h shift on {} missing a break",
                        assignment.employee_id, assignment.date
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Flags employees with disproportionately many weekend shifts: more
    /// than 1.5x the average across employees who worked any weekend shift,
    /// and at least 2 shifts above that average. Mirrors the original's
    /// `_validate_weekend_distribution`.
    fn check_weekend_distribution(&self, schedule: &Schedule, issues: &mut Vec<Issue>) {
        let mut weekend_shifts: HashMap<i64, u32> = HashMap::new();
        for assignment in &schedule.entries {
            if assignment.shift_id.is_none() || assignment.status == AssignmentStatus::Empty {
                continue;
            }
            if crate::weekday::is_weekend(assignment.date) {
                *weekend_shifts.entry(assignment.employee_id).or_insert(0) += 1;
            }
        }

        if weekend_shifts.is_empty() {
            return;
        }

        let total: u32 = weekend_shifts.values().sum();
        let average = total as f64 / weekend_shifts.len() as f64;
        let threshold = average * 1.5;

        let mut employee_ids: Vec<i64> = weekend_shifts.keys().copied().collect();
        employee_ids.sort();

        for employee_id in employee_ids {
            let count = weekend_shifts[&employee_id];
            if count as f64 > threshold && count as f64 - average >= 2.0 {
                issues.push(Issue::new(
                    IssueKind::WeekendDistribution,
                    IssueSeverity::Warning,
                    format!(
                        "employee {employee_id} has {count} weekend shifts (average {average:.1})"
                    ),
                ));
            }
        }
    }
}

/// True if the half-open interval `[start, end)` (overnight-normalized)
/// contains `point`.
fn interval_contains(start: &str, end: &str, point: &str) -> bool {
    match (
        time_math::time_to_minutes(start),
        time_math::time_to_minutes(end),
        time_math::time_to_minutes(point),
    ) {
        (Ok(s), Ok(e), Ok(p)) => {
            let e_norm = if e <= s { e + 24 * 60 } else { e };
            let p_norm = if p < s { p + 24 * 60 } else { p };
            s <= p_norm && p_norm < e_norm
        }
        _ => false,
    }
}
