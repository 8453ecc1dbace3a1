//! Indexed, read-only snapshot of everything a generation run needs: settings,
//! shift templates, employees, coverage, absences, availabilities (spec §4.2).
//!
//! `Resources::load` is the one-shot initializer; after it returns, the
//! snapshot is immutable for the lifetime of the run (spec §5) — all indices
//! below are built once at construction time rather than lazily, so there is
//! no interior mutability to reason about.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LoadError;
use crate::models::{Absence, CoverageRule, Employee, EmployeeAvailability, ShiftTemplate};
use crate::weekday::day_index;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Settings {
    pub store_name: String,
}

/// Raw, unindexed input to [`Resources::load`] — this is the in-memory
/// snapshot the engine consumes; building it from a database or an HTTP call
/// is the caller's concern, not the engine's. Serializable so a resource
/// provider can hand one across a process boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ResourceSnapshot {
    pub settings: Settings,
    pub shifts: Vec<ShiftTemplate>,
    pub employees: Vec<Employee>,
    pub coverage: Vec<CoverageRule>,
    pub absences: Vec<Absence>,
    pub availabilities: Vec<EmployeeAvailability>,
}

pub struct Resources {
    settings: Settings,
    shifts: Vec<ShiftTemplate>,
    employees: Vec<Employee>,
    coverage: Vec<CoverageRule>,
    absences: Vec<Absence>,

    shifts_by_id: HashMap<i64, usize>,
    employees_by_id: HashMap<i64, usize>,
    coverage_by_day: HashMap<u8, Vec<usize>>,
    absences_by_employee: HashMap<i64, Vec<usize>>,
    availability_by_employee_day: HashMap<(i64, u8), Vec<EmployeeAvailability>>,
}

impl Resources {
    /// Builds the indexed snapshot. Fails hard only when there are no shift
    /// templates at all (spec §4.2); missing coverage or active employees are
    /// logged as warnings, not failures, since a caller may be staging a
    /// before-launch config.
    #[tracing::instrument(skip(snapshot))]
    pub fn load(snapshot: ResourceSnapshot) -> Result<Self, LoadError> {
        if snapshot.shifts.is_empty() {
            return Err(LoadError::NoShiftTemplates);
        }

        if snapshot.coverage.is_empty() {
            tracing::warn!("no coverage rules in resource snapshot");
        }

        let active_count = snapshot.employees.iter().filter(|e| e.is_active).count();
        if active_count == 0 {
            tracing::warn!("no active employees in resource snapshot");
        }

        let shifts_by_id = snapshot
            .shifts
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();

        let employees_by_id = snapshot
            .employees
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();

        let mut coverage_by_day: HashMap<u8, Vec<usize>> = HashMap::new();
        for (i, rule) in snapshot.coverage.iter().enumerate() {
            coverage_by_day.entry(rule.day_index).or_default().push(i);
        }

        let mut absences_by_employee: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, absence) in snapshot.absences.iter().enumerate() {
            absences_by_employee
                .entry(absence.employee_id)
                .or_default()
                .push(i);
        }

        let mut availability_by_employee_day: HashMap<(i64, u8), Vec<EmployeeAvailability>> =
            HashMap::new();
        for availability in &snapshot.availabilities {
            availability_by_employee_day
                .entry((availability.employee_id, availability.day_of_week))
                .or_default()
                .push(*availability);
        }

        tracing::info!(
            shifts = snapshot.shifts.len(),
            employees = snapshot.employees.len(),
            active_employees = active_count,
            coverage_rules = snapshot.coverage.len(),
            "loaded schedule resources"
        );

        Ok(Self {
            settings: snapshot.settings,
            shifts: snapshot.shifts,
            employees: snapshot.employees,
            coverage: snapshot.coverage,
            absences: snapshot.absences,
            shifts_by_id,
            employees_by_id,
            coverage_by_day,
            absences_by_employee,
            availability_by_employee_day,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get_employee(&self, id: i64) -> Option<&Employee> {
        self.employees_by_id.get(&id).map(|&i| &self.employees[i])
    }

    pub fn get_shift(&self, id: i64) -> Option<&ShiftTemplate> {
        self.shifts_by_id.get(&id).map(|&i| &self.shifts[i])
    }

    /// All loaded shift templates, unfiltered. The generator uses this to
    /// materialize active instances per date; §4.2 lists the id/active/
    /// keyholder lookups but a full enumeration is implied by §4.6 step 1.
    pub fn all_shifts(&self) -> &[ShiftTemplate] {
        &self.shifts
    }

    /// Active employees sorted by `(group_rank, -contracted_hours, id)`.
    pub fn get_active_employees(&self) -> Vec<&Employee> {
        let mut employees: Vec<&Employee> = self.employees.iter().filter(|e| e.is_active).collect();
        employees.sort_by(|a, b| {
            a.group
                .priority_rank()
                .cmp(&b.group.priority_rank())
                .then(
                    b.contracted_hours
                        .partial_cmp(&a.contracted_hours)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.id.cmp(&b.id))
        });
        employees
    }

    pub fn get_keyholders(&self) -> Vec<&Employee> {
        self.employees.iter().filter(|e| e.is_keyholder).collect()
    }

    pub fn get_daily_coverage(&self, date: NaiveDate) -> Vec<&CoverageRule> {
        let day = day_index(date);
        self.coverage_by_day
            .get(&day)
            .into_iter()
            .flatten()
            .map(|&i| &self.coverage[i])
            .collect()
    }

    pub fn get_employee_availability(&self, employee_id: i64, day_of_week: u8) -> &[EmployeeAvailability] {
        self.availability_by_employee_day
            .get(&(employee_id, day_of_week))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_employee_absences(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<&Absence> {
        self.absences_by_employee
            .get(&employee_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.absences[i])
            .filter(|absence| absence.intersects(start, end))
            .collect()
    }

    /// True if `employee_id` has no absence covering `date` and every hour in
    /// `[start_hour, end_hour)` has a non-UNAVAILABLE availability row.
    pub fn is_employee_available(
        &self,
        employee_id: i64,
        date: NaiveDate,
        start_hour: u8,
        end_hour: u8,
    ) -> bool {
        if self
            .get_employee_absences(employee_id, date, date)
            .iter()
            .any(|a| a.covers(date))
        {
            return false;
        }

        let day = day_index(date);
        let rows = self.get_employee_availability(employee_id, day);

        (start_hour..end_hour).all(|hour| {
            rows.iter().any(|row| {
                row.hour == hour
                    && row.is_available
                    && row.availability_type != crate::models::AvailabilityKind::Unavailable
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, EmployeeGroup, ShiftTemplate};
    use std::collections::HashSet;

    fn shift(id: i64) -> ShiftTemplate {
        ShiftTemplate {
            id,
            start_time: "08:00".into(),
            end_time: "16:00".into(),
            requires_break: true,
            active_days: HashSet::from([0, 1, 2, 3, 4]),
            requires_keyholder: false,
        }
    }

    fn employee(id: i64, group: EmployeeGroup, hours: f64, active: bool) -> Employee {
        Employee {
            id,
            group,
            contracted_hours: hours,
            is_active: active,
            is_keyholder: false,
            preferences: None,
        }
    }

    #[test]
    fn load_fails_without_shift_templates() {
        let snapshot = ResourceSnapshot::default();
        assert!(matches!(
            Resources::load(snapshot),
            Err(LoadError::NoShiftTemplates)
        ));
    }

    #[test]
    fn active_employees_sorted_by_priority_then_hours_then_id() {
        let snapshot = ResourceSnapshot {
            shifts: vec![shift(1)],
            employees: vec![
                employee(3, EmployeeGroup::PartTime, 20.0, true),
                employee(1, EmployeeGroup::FullTime, 40.0, true),
                employee(2, EmployeeGroup::TeamLead, 40.0, true),
                employee(4, EmployeeGroup::FullTime, 40.0, true),
                employee(5, EmployeeGroup::MiniJob, 10.0, false),
            ],
            ..Default::default()
        };

        let resources = Resources::load(snapshot).unwrap();
        let ids: Vec<i64> = resources.get_active_employees().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 4, 3]);
    }

    #[test]
    fn daily_coverage_filters_by_weekday() {
        use crate::models::CoverageRule;

        let monday_rule = CoverageRule {
            id: 1,
            day_index: 0,
            start_time: "08:00".into(),
            end_time: "16:00".into(),
            min_employees: 1,
            max_employees: None,
            employee_types: HashSet::new(),
            allowed_employee_groups: HashSet::new(),
            requires_keyholder: false,
            keyholder_before_minutes: None,
            keyholder_after_minutes: None,
        };

        let snapshot = ResourceSnapshot {
            shifts: vec![shift(1)],
            coverage: vec![monday_rule],
            ..Default::default()
        };

        let resources = Resources::load(snapshot).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();

        assert_eq!(resources.get_daily_coverage(monday).len(), 1);
        assert_eq!(resources.get_daily_coverage(tuesday).len(), 0);
    }
}
