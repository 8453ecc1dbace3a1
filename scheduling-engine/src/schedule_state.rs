//! The in-progress schedule the generator builds incrementally. Kept
//! separate from [`crate::models::Schedule`] (the finished, owned record
//! handed to callers) because the generator needs fast `(employee, date)`
//! lookups while assigning — spec §3 calls this "owned exclusively by the
//! Generator for the duration of the call".

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Assignment, AssignmentStatus, AvailabilityKind, ShiftTemplate};

#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    by_employee_date: HashMap<(i64, NaiveDate), Assignment>,
    shift_templates: HashMap<(i64, NaiveDate), ShiftTemplate>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_assignment(&self, employee_id: i64, date: NaiveDate) -> bool {
        self.by_employee_date
            .get(&(employee_id, date))
            .is_some_and(|a| !a.is_empty_entry())
    }

    pub fn assignment_on(&self, employee_id: i64, date: NaiveDate) -> Option<&Assignment> {
        self.by_employee_date.get(&(employee_id, date))
    }

    pub fn shift_template_on(&self, employee_id: i64, date: NaiveDate) -> Option<&ShiftTemplate> {
        self.shift_templates.get(&(employee_id, date))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        employee_id: i64,
        date: NaiveDate,
        shift_id: Option<i64>,
        status: AssignmentStatus,
        start_time: Option<String>,
        end_time: Option<String>,
    ) {
        self.by_employee_date.insert(
            (employee_id, date),
            Assignment {
                employee_id,
                shift_id,
                date,
                status,
                version: 1,
                start_time,
                end_time,
                break_start: None,
                break_end: None,
                availability_type: None,
            },
        );
    }

    pub fn record_shift(&mut self, employee_id: i64, date: NaiveDate, shift: ShiftTemplate, kind: AvailabilityKind) {
        self.by_employee_date.insert(
            (employee_id, date),
            Assignment {
                employee_id,
                shift_id: Some(shift.id),
                date,
                status: AssignmentStatus::Assigned,
                version: 1,
                start_time: Some(shift.start_time.clone()),
                end_time: Some(shift.end_time.clone()),
                break_start: None,
                break_end: None,
                availability_type: Some(kind),
            },
        );
        self.shift_templates.insert((employee_id, date), shift);
    }

    /// `start_time_hint` carries the earliest hour the employee is available
    /// that day, when one exists (spec §4.7 step 4). It is a hint only: an
    /// EMPTY entry has no `shift_id`, so this never implies a real shift
    /// window, just where the UI might suggest one.
    pub fn record_empty(&mut self, employee_id: i64, date: NaiveDate, start_time_hint: Option<String>) {
        self.by_employee_date.insert(
            (employee_id, date),
            Assignment {
                employee_id,
                shift_id: None,
                date,
                status: AssignmentStatus::Empty,
                version: 1,
                start_time: start_time_hint,
                end_time: None,
                break_start: None,
                break_end: None,
                availability_type: None,
            },
        );
    }

    pub fn into_assignments(self) -> Vec<Assignment> {
        let mut assignments: Vec<Assignment> = self.by_employee_date.into_values().collect();
        assignments.sort_by(|a, b| a.date.cmp(&b.date).then(a.employee_id.cmp(&b.employee_id)));
        assignments
    }
}
