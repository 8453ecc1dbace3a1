//! Folds overlapping [`CoverageRule`]s into a single staffing demand for a
//! given interval (spec §4.3).

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{CoverageRule, EmployeeGroup};
use crate::resources::Resources;
use crate::time_math::{self, ParseError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Demand {
    pub min_employees: u32,
    pub max_employees: Option<u32>,
    pub employee_types: HashSet<EmployeeGroup>,
    pub allowed_employee_groups: HashSet<EmployeeGroup>,
    pub requires_keyholder: bool,
    pub keyholder_before_minutes: Option<u32>,
    pub keyholder_after_minutes: Option<u32>,
}

impl Demand {
    /// An empty `employee_types` set folds from rules is ambiguous between
    /// "no requirement" and "any type"; this engine resolves Open Question 1
    /// by treating it as "any" at the point of use, never inside the fold
    /// itself (the fold's union stays authoritative, per spec §4.3).
    pub fn employee_types_or_any(&self) -> Option<&HashSet<EmployeeGroup>> {
        if self.employee_types.is_empty() {
            None
        } else {
            Some(&self.employee_types)
        }
    }

    pub fn allowed_groups_or_any(&self) -> Option<&HashSet<EmployeeGroup>> {
        if self.allowed_employee_groups.is_empty() {
            None
        } else {
            Some(&self.allowed_employee_groups)
        }
    }
}

pub struct CoverageResolver<'a> {
    resources: &'a Resources,
}

impl<'a> CoverageResolver<'a> {
    pub fn new(resources: &'a Resources) -> Self {
        Self { resources }
    }

    /// Folds every rule applying to `(date, interval_start, interval_duration_minutes)`
    /// into one [`Demand`]. A rule applies when `rule.start_time <= interval_start <
    /// rule.end_time` (half-open on both ends of the check). Never fails; an empty
    /// fold yields a zero `Demand`.
    pub fn required_staffing(
        &self,
        date: NaiveDate,
        interval_start: &str,
        interval_duration_minutes: u32,
    ) -> Result<Demand, ParseError> {
        let _ = interval_duration_minutes;
        let interval_start_minutes = time_math::time_to_minutes(interval_start)?;

        let mut demand = Demand::default();

        for rule in self.resources.get_daily_coverage(date) {
            if self.rule_applies(rule, interval_start_minutes)? {
                fold_rule(&mut demand, rule);
            }
        }

        Ok(demand)
    }

    fn rule_applies(&self, rule: &CoverageRule, interval_start_minutes: i32) -> Result<bool, ParseError> {
        let rule_start = time_math::time_to_minutes(&rule.start_time)?;
        let rule_end = time_math::time_to_minutes(&rule.end_time)?;
        Ok(rule_start <= interval_start_minutes && interval_start_minutes < rule_end)
    }
}

fn fold_rule(demand: &mut Demand, rule: &CoverageRule) {
    demand.min_employees = demand.min_employees.max(rule.min_employees);
    demand.max_employees = match (demand.max_employees, rule.max_employees) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    };
    demand.employee_types.extend(rule.employee_types.iter().copied());
    demand
        .allowed_employee_groups
        .extend(rule.allowed_employee_groups.iter().copied());
    demand.requires_keyholder = demand.requires_keyholder || rule.requires_keyholder;
    demand.keyholder_before_minutes = max_option(demand.keyholder_before_minutes, rule.keyholder_before_minutes);
    demand.keyholder_after_minutes = max_option(demand.keyholder_after_minutes, rule.keyholder_after_minutes);
}

fn max_option(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftTemplate;
    use crate::resources::{ResourceSnapshot, Resources};
    use std::collections::HashSet;

    fn rule(id: i64, day: u8, start: &str, end: &str, min: u32, keyholder: bool) -> CoverageRule {
        CoverageRule {
            id,
            day_index: day,
            start_time: start.into(),
            end_time: end.into(),
            min_employees: min,
            max_employees: None,
            employee_types: HashSet::new(),
            allowed_employee_groups: HashSet::new(),
            requires_keyholder: keyholder,
            keyholder_before_minutes: None,
            keyholder_after_minutes: None,
        }
    }

    fn resources_with(rules: Vec<CoverageRule>) -> Resources {
        let snapshot = ResourceSnapshot {
            shifts: vec![ShiftTemplate {
                id: 1,
                start_time: "08:00".into(),
                end_time: "16:00".into(),
                requires_break: false,
                active_days: HashSet::from([0]),
                requires_keyholder: false,
            }],
            coverage: rules,
            ..Default::default()
        };
        Resources::load(snapshot).unwrap()
    }

    #[test]
    fn overlapping_rules_fold_to_tighter_demand() {
        let resources = resources_with(vec![
            rule(1, 0, "09:00", "12:00", 1, false),
            rule(2, 0, "10:00", "13:00", 2, true),
        ]);
        let resolver = CoverageResolver::new(&resources);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();

        let mid = resolver.required_staffing(monday, "10:30", 60).unwrap();
        assert_eq!(mid.min_employees, 2);
        assert!(mid.requires_keyholder);

        let early = resolver.required_staffing(monday, "09:00", 60).unwrap();
        assert_eq!(early.min_employees, 1);
        assert!(!early.requires_keyholder);

        let late = resolver.required_staffing(monday, "12:00", 60).unwrap();
        assert_eq!(late.min_employees, 2);
        assert!(late.requires_keyholder);
    }

    #[test]
    fn boundary_at_rule_end_does_not_apply() {
        let resources = resources_with(vec![rule(1, 0, "08:00", "12:00", 3, false)]);
        let resolver = CoverageResolver::new(&resources);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();

        let at_end = resolver.required_staffing(monday, "12:00", 60).unwrap();
        assert_eq!(at_end.min_employees, 0);

        let at_start = resolver.required_staffing(monday, "08:00", 60).unwrap();
        assert_eq!(at_start.min_employees, 3);
    }

    #[test]
    fn no_applying_rule_yields_zero_demand() {
        let resources = resources_with(vec![rule(1, 1, "08:00", "12:00", 3, false)]);
        let resolver = CoverageResolver::new(&resources);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();

        let demand = resolver.required_staffing(monday, "09:00", 60).unwrap();
        assert_eq!(demand, Demand::default());
    }
}
