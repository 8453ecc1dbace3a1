//! Hard labor-rule enforcement applied while assigning, per spec §4.5. Each
//! rule can be disabled independently through [`EngineConfig`]; disabled
//! rules are simply skipped, never evaluated as "pass".

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::models::{AssignmentStatus, Employee, ShiftTemplate};
use crate::schedule_state::ScheduleState;
use crate::time_math::{self, ParseError};
use crate::weekday::{day_index, week_start};

pub struct ConstraintChecker<'a> {
    config: &'a EngineConfig,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// True if assigning `employee` to `shift` on `date` would violate any
    /// enabled rule given the assignments already recorded in `schedule`.
    pub fn exceeds_constraints(
        &self,
        employee: &Employee,
        date: NaiveDate,
        shift: &ShiftTemplate,
        schedule: &ScheduleState,
    ) -> Result<bool, ParseError> {
        if schedule.has_assignment(employee.id, date) {
            return Ok(true);
        }

        if self.config.enforce_rest_periods && self.violates_rest(employee.id, date, shift, schedule)? {
            return Ok(true);
        }

        if self.config.enforce_consecutive_days && self.violates_consecutive_days(employee.id, date, schedule) {
            return Ok(true);
        }

        if self.config.enforce_max_hours && self.violates_weekly_hours(employee, date, shift, schedule)? {
            return Ok(true);
        }

        if self.config.enforce_max_shifts && self.violates_weekly_shift_count(employee, date, schedule) {
            return Ok(true);
        }

        if self.violates_daily_hours(employee, shift)? {
            return Ok(true);
        }

        if self.config.enforce_max_shifts && self.violates_shift_type_cap(employee, date, shift, schedule)? {
            return Ok(true);
        }

        Ok(false)
    }

    fn violates_rest(
        &self,
        employee_id: i64,
        date: NaiveDate,
        shift: &ShiftTemplate,
        schedule: &ScheduleState,
    ) -> Result<bool, ParseError> {
        if let Some(prev) = schedule.assignment_on(employee_id, date - chrono::Duration::days(1)) {
            if let Some(prev_end) = &prev.end_time {
                let rest = time_math::rest_hours(prev_end, &shift.start_time)?;
                if rest < self.config.min_rest_hours {
                    return Ok(true);
                }
            }
        }

        if let Some(next) = schedule.assignment_on(employee_id, date + chrono::Duration::days(1)) {
            if let Some(next_start) = &next.start_time {
                let rest = time_math::rest_hours(&shift.end_time, next_start)?;
                if rest < self.config.min_rest_hours {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn violates_consecutive_days(&self, employee_id: i64, date: NaiveDate, schedule: &ScheduleState) -> bool {
        let mut streak = 0u32;
        let mut cursor = date - chrono::Duration::days(1);
        loop {
            if schedule.has_assignment(employee_id, cursor) {
                streak += 1;
                cursor -= chrono::Duration::days(1);
                if streak >= self.config.max_consecutive_days {
                    return true;
                }
            } else {
                break;
            }
        }
        false
    }

    fn violates_weekly_hours(
        &self,
        employee: &Employee,
        date: NaiveDate,
        shift: &ShiftTemplate,
        schedule: &ScheduleState,
    ) -> Result<bool, ParseError> {
        let week = week_start(date);
        let mut total = shift.duration_hours()?;
        for offset in 0..7 {
            let day = week + chrono::Duration::days(offset);
            if day == date {
                continue;
            }
            if let Some(assignment) = schedule.assignment_on(employee.id, day) {
                if let (Some(start), Some(end)) = (&assignment.start_time, &assignment.end_time) {
                    total += time_math::duration(start, end)?;
                }
            }
        }
        Ok(total > self.config.max_hours_for(employee.group))
    }

    fn violates_weekly_shift_count(&self, employee: &Employee, date: NaiveDate, schedule: &ScheduleState) -> bool {
        let week = week_start(date);
        let count = (0..7)
            .filter(|&offset| {
                let day = week + chrono::Duration::days(offset);
                day != date
                    && schedule
                        .assignment_on(employee.id, day)
                        .is_some_and(|a| a.status != AssignmentStatus::Empty)
            })
            .count() as u32;
        count + 1 > self.config.max_shifts_for(employee.group)
    }

    fn violates_daily_hours(&self, employee: &Employee, shift: &ShiftTemplate) -> Result<bool, ParseError> {
        Ok(shift.duration_hours()? > self.config.max_daily_hours_for(employee.group))
    }

    fn violates_shift_type_cap(
        &self,
        employee: &Employee,
        date: NaiveDate,
        shift: &ShiftTemplate,
        schedule: &ScheduleState,
    ) -> Result<bool, ParseError> {
        let shift_type = shift.shift_type()?;
        let week = week_start(date);
        let mut count = 0u32;
        for offset in 0..7 {
            let day = week + chrono::Duration::days(offset);
            if day == date {
                continue;
            }
            if let Some(existing_shift) = schedule.shift_template_on(employee.id, day) {
                if existing_shift.shift_type()? == shift_type {
                    count += 1;
                }
            }
        }
        Ok(count + 1 > self.config.max_shifts_for_type(shift_type))
    }
}

/// Weekday helper retained for callers computing rest windows outside the
/// checker (e.g. the validator, which re-derives the same rule independently).
pub fn day_of(date: NaiveDate) -> u8 {
    day_index(date)
}
